//! Lazy-load candidates and their load callbacks

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use uuid::Uuid;

use crate::geometry::ContextRef;

/// Performs the actual image swap for a candidate
///
/// Returns `true` when the image loaded; `false` keeps the candidate queued
/// and stops the current drain at it.
#[async_trait::async_trait]
pub trait LoadCallback: Send + Sync {
    async fn load(&self, candidate: &Candidate) -> bool;
}

#[async_trait::async_trait]
impl<F, Fut> LoadCallback for F
where
    F: Fn(&Candidate) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = bool> + Send + 'static,
{
    async fn load(&self, candidate: &Candidate) -> bool {
        (self)(candidate).await
    }
}

/// Generate a fresh node id for hosts that do not name their image nodes
pub fn generate_node_id() -> String {
    format!("lazy-{}", Uuid::new_v4().simple())
}

/// One image awaiting a visibility-gated load
#[derive(Clone)]
pub struct Candidate {
    node_id: String,
    context: Option<ContextRef>,
    callback: Arc<dyn LoadCallback>,
}

impl Candidate {
    /// Create a candidate for the node `#node_id`
    pub fn new(node_id: impl Into<String>, callback: impl LoadCallback + 'static) -> Self {
        let node_id = node_id.into();
        let node_id = match node_id.strip_prefix('#') {
            Some(stripped) => stripped.to_string(),
            None => node_id,
        };
        Self {
            node_id,
            context: None,
            callback: Arc::new(callback),
        }
    }

    /// Scope geometry queries to a nested component
    pub fn with_context(mut self, context: ContextRef) -> Self {
        self.context = Some(context);
        self
    }

    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    /// Selector used to look the node up
    pub fn selector(&self) -> String {
        format!("#{}", self.node_id)
    }

    pub fn context(&self) -> Option<&ContextRef> {
        self.context.as_ref()
    }

    /// Run the load callback
    pub async fn load(&self) -> bool {
        self.callback.load(self).await
    }
}

impl fmt::Debug for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Candidate")
            .field("node_id", &self.node_id)
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}
