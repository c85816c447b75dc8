use crate::action::ActionKind;
use serde::{Deserialize, Serialize};

/// Default maximum number of undo steps.
pub const DEFAULT_MAX_DEPTH: usize = 100;

/// Configuration for [`History`](crate::History).
///
/// Deserializes with every field optional, so a host settings file only
/// needs to name what it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Maximum undo depth. The oldest entry is dropped past this. Default: **100**.
    pub max_depth: usize,

    /// Action kinds whose consecutive edits coalesce into one entry.
    /// Only move, reshape and waypoints can coalesce; other kinds listed here
    /// are ignored. Default: **move, reshape, waypoints**.
    pub mergeable: Vec<ActionKind>,

    /// Whether rerouting a locked connection is rejected like a reshape.
    /// Default: **true**.
    pub guard_waypoints: bool,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            mergeable: vec![ActionKind::Move, ActionKind::Reshape, ActionKind::Waypoints],
            guard_waypoints: true,
        }
    }
}
