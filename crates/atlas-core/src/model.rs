//! Entity model for Atlas maps.
//!
//! A map is made of five entity kinds: pins (points of interest), zones
//! (polygonal regions), connections (links between two pins), annotations
//! (free text notes) and layers. Each kind has a typed attribute record.
//!
//! Attribute records are generic over the *reference type* `R`. Stores and
//! hosts speak `Attrs<LiveId>`; the history engine keeps `Attrs<SlotId>` so
//! that references survive an entity being deleted and recreated under a new
//! id. [`Attrs::map_refs`] converts between the two.

use crate::id::LiveId;
use kurbo::Point;
use serde::{Deserialize, Serialize};
use std::fmt;

// ─── Colors ──────────────────────────────────────────────────────────────

/// 8-bit RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Parse `#RGB`, `#RRGGBB` or `#RRGGBBAA`. The `#` is optional.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if !hex.is_ascii() {
            return None;
        }
        let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        match hex.len() {
            3 => {
                let mut c = [0u8; 3];
                for (slot, ch) in c.iter_mut().zip(hex.chars()) {
                    let v = ch.to_digit(16)? as u8;
                    *slot = v * 17;
                }
                Some(Self::rgb(c[0], c[1], c[2]))
            }
            6 => Some(Self::rgb(byte(0)?, byte(2)?, byte(4)?)),
            8 => Some(Self::rgba(byte(0)?, byte(2)?, byte(4)?, byte(6)?)),
            _ => None,
        }
    }

    /// Emit as `#RRGGBB`, or `#RRGGBBAA` when not fully opaque.
    pub fn to_hex(&self) -> String {
        if self.a == 255 {
            format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
        } else {
            format!("#{:02X}{:02X}{:02X}{:02X}", self.r, self.g, self.b, self.a)
        }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

// ─── Kinds ───────────────────────────────────────────────────────────────

/// The kinds of entity a map holds. Each kind is served by its own store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Layer,
    Pin,
    Zone,
    Annotation,
    Connection,
}

impl EntityKind {
    /// All kinds, in the order stores are consulted for dependents.
    pub const ALL: [EntityKind; 5] = [
        EntityKind::Layer,
        EntityKind::Pin,
        EntityKind::Zone,
        EntityKind::Annotation,
        EntityKind::Connection,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Layer => "layer",
            EntityKind::Pin => "pin",
            EntityKind::Zone => "zone",
            EntityKind::Annotation => "annotation",
            EntityKind::Connection => "connection",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stroke pattern for connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineStyle {
    #[default]
    Solid,
    Dashed,
    Dotted,
}

// ─── Attribute records ───────────────────────────────────────────────────

/// A point of interest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PinAttrs<R = LiveId> {
    pub name: String,
    pub position: Point,
    pub icon: String,
    pub color: Color,
    pub size: f64,
    pub fogged: bool,
    pub locked: bool,
    pub layer: Option<R>,
}

/// A polygonal region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneAttrs<R = LiveId> {
    pub name: String,
    pub vertices: Vec<Point>,
    pub fill: Color,
    pub opacity: f32,
    pub fogged: bool,
    pub locked: bool,
    pub layer: Option<R>,
}

/// A link between two pins, optionally routed through waypoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionAttrs<R = LiveId> {
    pub from: R,
    pub to: R,
    pub waypoints: Vec<Point>,
    pub label: Option<String>,
    pub color: Color,
    pub style: LineStyle,
    pub locked: bool,
}

/// A free text note, optionally anchored to a pin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationAttrs<R = LiveId> {
    pub text: String,
    pub position: Point,
    pub font_size: f32,
    pub color: Color,
    pub fogged: bool,
    pub locked: bool,
    pub layer: Option<R>,
    pub anchor: Option<R>,
}

/// A drawing layer. Layers reference nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerAttrs {
    pub name: String,
    pub order: i32,
    pub visible: bool,
    pub fogged: bool,
    pub locked: bool,
}

/// Full attribute image of one entity, tagged by kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Attrs<R = LiveId> {
    Layer(LayerAttrs),
    Pin(PinAttrs<R>),
    Zone(ZoneAttrs<R>),
    Annotation(AnnotationAttrs<R>),
    Connection(ConnectionAttrs<R>),
}

impl<R> Attrs<R> {
    pub fn kind(&self) -> EntityKind {
        match self {
            Attrs::Layer(_) => EntityKind::Layer,
            Attrs::Pin(_) => EntityKind::Pin,
            Attrs::Zone(_) => EntityKind::Zone,
            Attrs::Annotation(_) => EntityKind::Annotation,
            Attrs::Connection(_) => EntityKind::Connection,
        }
    }

    pub fn is_locked(&self) -> bool {
        match self {
            Attrs::Layer(a) => a.locked,
            Attrs::Pin(a) => a.locked,
            Attrs::Zone(a) => a.locked,
            Attrs::Annotation(a) => a.locked,
            Attrs::Connection(a) => a.locked,
        }
    }

    pub fn set_locked(&mut self, locked: bool) {
        match self {
            Attrs::Layer(a) => a.locked = locked,
            Attrs::Pin(a) => a.locked = locked,
            Attrs::Zone(a) => a.locked = locked,
            Attrs::Annotation(a) => a.locked = locked,
            Attrs::Connection(a) => a.locked = locked,
        }
    }

    /// Fog-of-war flag. Connections carry none and return `None`.
    pub fn fogged(&self) -> Option<bool> {
        match self {
            Attrs::Layer(a) => Some(a.fogged),
            Attrs::Pin(a) => Some(a.fogged),
            Attrs::Zone(a) => Some(a.fogged),
            Attrs::Annotation(a) => Some(a.fogged),
            Attrs::Connection(_) => None,
        }
    }

    /// Set the fog flag. Returns false if the kind carries no fog flag.
    pub fn set_fogged(&mut self, fogged: bool) -> bool {
        match self {
            Attrs::Layer(a) => a.fogged = fogged,
            Attrs::Pin(a) => a.fogged = fogged,
            Attrs::Zone(a) => a.fogged = fogged,
            Attrs::Annotation(a) => a.fogged = fogged,
            Attrs::Connection(_) => return false,
        }
        true
    }

    pub fn position(&self) -> Option<Point> {
        match self {
            Attrs::Pin(a) => Some(a.position),
            Attrs::Annotation(a) => Some(a.position),
            _ => None,
        }
    }

    /// Move a pin or annotation. Returns false for kinds without a position.
    pub fn set_position(&mut self, to: Point) -> bool {
        match self {
            Attrs::Pin(a) => a.position = to,
            Attrs::Annotation(a) => a.position = to,
            _ => return false,
        }
        true
    }

    /// Replace a zone's outline. Returns false for non-zones.
    pub fn set_vertices(&mut self, vertices: Vec<Point>) -> bool {
        match self {
            Attrs::Zone(a) => {
                a.vertices = vertices;
                true
            }
            _ => false,
        }
    }

    /// Replace a connection's route. Returns false for non-connections.
    pub fn set_waypoints(&mut self, waypoints: Vec<Point>) -> bool {
        match self {
            Attrs::Connection(a) => {
                a.waypoints = waypoints;
                true
            }
            _ => false,
        }
    }

    /// Every reference this record holds, tagged with the referenced kind.
    pub fn refs(&self) -> Vec<(EntityKind, &R)> {
        let mut out = Vec::new();
        match self {
            Attrs::Layer(_) => {}
            Attrs::Pin(a) => out.extend(a.layer.iter().map(|r| (EntityKind::Layer, r))),
            Attrs::Zone(a) => out.extend(a.layer.iter().map(|r| (EntityKind::Layer, r))),
            Attrs::Annotation(a) => {
                out.extend(a.layer.iter().map(|r| (EntityKind::Layer, r)));
                out.extend(a.anchor.iter().map(|r| (EntityKind::Pin, r)));
            }
            Attrs::Connection(a) => {
                out.push((EntityKind::Pin, &a.from));
                out.push((EntityKind::Pin, &a.to));
            }
        }
        out
    }

    /// Whether this record points at `(kind, target)`.
    pub fn references(&self, kind: EntityKind, target: &R) -> bool
    where
        R: PartialEq,
    {
        self.refs().into_iter().any(|(k, r)| k == kind && r == target)
    }

    /// Rewrite every reference through `f`, keeping all other fields.
    ///
    /// Stops at the first error.
    pub fn map_refs<S, E>(
        self,
        mut f: impl FnMut(EntityKind, R) -> Result<S, E>,
    ) -> Result<Attrs<S>, E> {
        Ok(match self {
            Attrs::Layer(a) => Attrs::Layer(a),
            Attrs::Pin(a) => Attrs::Pin(PinAttrs {
                layer: a.layer.map(|r| f(EntityKind::Layer, r)).transpose()?,
                name: a.name,
                position: a.position,
                icon: a.icon,
                color: a.color,
                size: a.size,
                fogged: a.fogged,
                locked: a.locked,
            }),
            Attrs::Zone(a) => Attrs::Zone(ZoneAttrs {
                layer: a.layer.map(|r| f(EntityKind::Layer, r)).transpose()?,
                name: a.name,
                vertices: a.vertices,
                fill: a.fill,
                opacity: a.opacity,
                fogged: a.fogged,
                locked: a.locked,
            }),
            Attrs::Annotation(a) => Attrs::Annotation(AnnotationAttrs {
                layer: a.layer.map(|r| f(EntityKind::Layer, r)).transpose()?,
                anchor: a.anchor.map(|r| f(EntityKind::Pin, r)).transpose()?,
                text: a.text,
                position: a.position,
                font_size: a.font_size,
                color: a.color,
                fogged: a.fogged,
                locked: a.locked,
            }),
            Attrs::Connection(a) => Attrs::Connection(ConnectionAttrs {
                from: f(EntityKind::Pin, a.from)?,
                to: f(EntityKind::Pin, a.to)?,
                waypoints: a.waypoints,
                label: a.label,
                color: a.color,
                style: a.style,
                locked: a.locked,
            }),
        })
    }

    /// Whether two records agree on every geometric field: position,
    /// outline, route and connection endpoints.
    pub fn same_geometry(&self, other: &Attrs<R>) -> bool
    where
        R: PartialEq,
    {
        match (self, other) {
            (Attrs::Pin(a), Attrs::Pin(b)) => a.position == b.position,
            (Attrs::Annotation(a), Attrs::Annotation(b)) => a.position == b.position,
            (Attrs::Zone(a), Attrs::Zone(b)) => a.vertices == b.vertices,
            (Attrs::Connection(a), Attrs::Connection(b)) => {
                a.waypoints == b.waypoints && a.from == b.from && a.to == b.to
            }
            (Attrs::Layer(_), Attrs::Layer(_)) => true,
            _ => false,
        }
    }
}

// ─── Constructors ────────────────────────────────────────────────────────

impl<R> PinAttrs<R> {
    pub fn new(name: impl Into<String>, position: Point) -> Self {
        Self {
            name: name.into(),
            position,
            icon: "marker".into(),
            color: Color::rgb(0xE5, 0x39, 0x35),
            size: 24.0,
            fogged: false,
            locked: false,
            layer: None,
        }
    }
}

impl<R> ZoneAttrs<R> {
    pub fn new(name: impl Into<String>, vertices: Vec<Point>) -> Self {
        Self {
            name: name.into(),
            vertices,
            fill: Color::rgb(0x43, 0xA0, 0x47),
            opacity: 0.35,
            fogged: false,
            locked: false,
            layer: None,
        }
    }
}

impl<R> ConnectionAttrs<R> {
    pub fn new(from: R, to: R) -> Self {
        Self {
            from,
            to,
            waypoints: Vec::new(),
            label: None,
            color: Color::BLACK,
            style: LineStyle::Solid,
            locked: false,
        }
    }
}

impl<R> AnnotationAttrs<R> {
    pub fn new(text: impl Into<String>, position: Point) -> Self {
        Self {
            text: text.into(),
            position,
            font_size: 14.0,
            color: Color::BLACK,
            fogged: false,
            locked: false,
            layer: None,
            anchor: None,
        }
    }
}

impl LayerAttrs {
    pub fn new(name: impl Into<String>, order: i32) -> Self {
        Self {
            name: name.into(),
            order,
            visible: true,
            fogged: false,
            locked: false,
        }
    }
}

// ─── Entities ────────────────────────────────────────────────────────────

/// A live entity as returned by a store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: LiveId,
    pub attrs: Attrs,
}

impl Entity {
    pub fn kind(&self) -> EntityKind {
        self.attrs.kind()
    }
}
