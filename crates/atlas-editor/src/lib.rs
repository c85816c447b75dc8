pub mod action;
pub mod coalesce;
pub mod compound;
pub mod config;
pub mod edit;
pub mod error;
pub mod history;
pub mod lock;
pub mod rebase;
pub mod replay;
pub mod session;

pub use action::{Action, ActionKind, Entry, Outcome, Recorded, Snapshot, Target};
pub use coalesce::CoalescePolicy;
pub use config::{DEFAULT_MAX_DEPTH, HistoryConfig};
pub use edit::Edit;
pub use error::{HistoryError, HistoryResult};
pub use history::History;
pub use lock::{GeometricFields, GeometryPolicy, LockGuard};
pub use rebase::IdentityMap;
pub use session::EditorSession;
