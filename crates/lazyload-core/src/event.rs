use crate::geometry::{Orientation, Selector};

/// Events emitted by the loader to notify the host of progress
#[derive(Debug, Clone, PartialEq)]
pub enum LoaderEvent {
    /// A container was measured and became the active one
    Bound {
        container: Selector,
        extent: f64,
        orientation: Orientation,
    },
    /// A candidate passed the visibility test and its callback succeeded
    Loaded { node_id: String },
    /// A visible candidate's callback failed; it stays at the head of its queue
    Stalled { node_id: String },
    /// The queue was torn down
    Cleared { dropped: usize },
}
