//! Visibility test for a single candidate

use tracing::{debug, warn};

use crate::candidate::Candidate;
use crate::geometry::{GeometryProvider, Orientation};

/// Measured scroll-axis extent of the active container
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Viewport {
    pub extent: f64,
    pub orientation: Orientation,
}

impl Viewport {
    pub fn new(extent: f64, orientation: Orientation) -> Self {
        Self {
            extent,
            orientation,
        }
    }
}

/// `true` when a leading edge lies within `margin` of the visible extent
///
/// Monotonic in `margin`: a larger margin never hides a visible edge.
#[inline]
pub fn edge_within(edge: f64, margin: f64, extent: f64) -> bool {
    edge - margin <= extent
}

/// Ask the provider where the candidate is and test its leading edge
///
/// A node that cannot be found, or a provider that fails, counts as not
/// visible.
pub async fn is_visible(
    provider: &dyn GeometryProvider,
    candidate: &Candidate,
    viewport: Viewport,
    margin: f64,
) -> bool {
    let nodes = match provider
        .query(&candidate.selector(), candidate.context())
        .await
    {
        Ok(nodes) => nodes,
        Err(e) => {
            warn!(node = candidate.node_id(), error = %e, "Geometry query failed");
            return false;
        }
    };

    let Some(node) = nodes.first() else {
        debug!(node = candidate.node_id(), "Candidate node not found");
        return false;
    };

    let edge = node.leading_edge(viewport.orientation);
    edge_within(edge, margin, viewport.extent)
}
