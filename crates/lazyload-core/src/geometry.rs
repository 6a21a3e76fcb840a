//! Geometry provider interface
//!
//! The host runtime owns the node tree. The engine only ever asks it for the
//! rectangles of nodes matching an id selector, optionally scoped to a nested
//! component context.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Scroll axis of a container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    /// Scrolls along y, visibility is decided by `top` against the height
    #[default]
    Vertical,
    /// Scrolls along x, visibility is decided by `left` against the width
    Horizontal,
}

impl Orientation {
    pub fn is_horizontal(self) -> bool {
        matches!(self, Orientation::Horizontal)
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Orientation::Vertical => write!(f, "vertical"),
            Orientation::Horizontal => write!(f, "horizontal"),
        }
    }
}

/// An id selector of the form `#name`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Selector(String);

impl Selector {
    /// Parse a selector that must already carry its leading `#`
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.strip_prefix('#') {
            Some(name) if !name.trim().is_empty() => Ok(Self(raw.to_string())),
            Some(_) => Err(Error::Config(format!(
                "selector '{}' has no id after '#'",
                raw
            ))),
            None => Err(Error::Config(format!(
                "container selector must be an id selector starting with '#', got '{}'",
                raw
            ))),
        }
    }

    /// Build a selector from a bare id, tolerating an existing leading `#`
    pub fn from_id(id: &str) -> Result<Self> {
        let name = id.strip_prefix('#').unwrap_or(id);
        if name.trim().is_empty() {
            return Err(Error::Config("empty id".to_string()));
        }
        Ok(Self(format!("#{}", name)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The id without the leading `#`
    pub fn id(&self) -> &str {
        &self.0[1..]
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Selector {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Selector::parse(&value)
    }
}

impl From<Selector> for String {
    fn from(selector: Selector) -> Self {
        selector.0
    }
}

/// Opaque handle scoping a query to a nested component
///
/// The engine never interprets it; it is handed back to the provider as is.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContextRef(String);

impl ContextRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Rectangle of a node relative to its scroll container
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NodeGeometry {
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,
}

impl NodeGeometry {
    pub fn new(top: f64, left: f64, width: f64, height: f64) -> Self {
        Self {
            top,
            left,
            width,
            height,
        }
    }

    /// Normalize a host node that reports `clientWidth`/`clientHeight` only
    pub fn from_client_size(client_width: f64, client_height: f64) -> Self {
        Self {
            width: client_width,
            height: client_height,
            ..Default::default()
        }
    }

    /// Leading edge along the scroll axis
    pub fn leading_edge(&self, orientation: Orientation) -> f64 {
        match orientation {
            Orientation::Vertical => self.top,
            Orientation::Horizontal => self.left,
        }
    }

    /// Size along the scroll axis
    pub fn extent(&self, orientation: Orientation) -> f64 {
        match orientation {
            Orientation::Vertical => self.height,
            Orientation::Horizontal => self.width,
        }
    }
}

/// Source of node geometry, implemented by the host runtime
///
/// An empty result means no node matched the selector.
#[async_trait::async_trait]
pub trait GeometryProvider: Send + Sync {
    async fn query(
        &self,
        selector: &str,
        context: Option<&ContextRef>,
    ) -> Result<Vec<NodeGeometry>>;
}
