pub mod candidate;
pub mod config;
pub mod error;
pub mod event;
pub mod geometry;
pub mod loader;
pub mod queue;
pub mod throttle;
pub mod timing;
pub mod visibility;

#[cfg(test)]
pub(crate) mod testing;

pub use candidate::{generate_node_id, Candidate, LoadCallback};
pub use config::{AppConfig, ConfigPatch, LoaderConfig};
pub use error::{Error, Result};
pub use event::LoaderEvent;
pub use geometry::{ContextRef, GeometryProvider, NodeGeometry, Orientation, Selector};
pub use loader::{DrainReport, LazyLoader, LoaderBuilder, StopReason};
pub use queue::{LoadQueue, QueueMode};
pub use throttle::Throttle;
pub use visibility::Viewport;
