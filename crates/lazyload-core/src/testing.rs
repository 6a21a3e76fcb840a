//! Test doubles shared by the unit tests

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::Instant;

use crate::candidate::Candidate;
use crate::geometry::{ContextRef, GeometryProvider, NodeGeometry};
use crate::{Error, Result};

type NodeKey = (Option<String>, String);

/// Geometry provider backed by a table the test edits between drains
///
/// Nodes are scoped by context: a node placed inside a context only answers
/// queries that carry that context.
#[derive(Default)]
pub(crate) struct ScriptedGeometry {
    nodes: Mutex<HashMap<NodeKey, NodeGeometry>>,
    fail: AtomicBool,
    queries: AtomicUsize,
    delay: Mutex<Duration>,
}

impl ScriptedGeometry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place the node `#id` at the given offsets
    pub fn place(&self, id: &str, top: f64, left: f64) {
        self.insert(None, id, NodeGeometry::new(top, left, 100.0, 100.0));
    }

    /// Place the node `#id` inside a nested component
    pub fn place_in(&self, context: &str, id: &str, top: f64, left: f64) {
        self.insert(Some(context), id, NodeGeometry::new(top, left, 100.0, 100.0));
    }

    pub fn place_container(&self, id: &str, width: f64, height: f64) {
        self.insert(None, id, NodeGeometry::new(0.0, 0.0, width, height));
    }

    pub fn place_container_in(&self, context: &str, id: &str, width: f64, height: f64) {
        self.insert(Some(context), id, NodeGeometry::new(0.0, 0.0, width, height));
    }

    fn insert(&self, context: Option<&str>, id: &str, node: NodeGeometry) {
        let key = (context.map(str::to_string), format!("#{}", id));
        self.nodes.lock().unwrap().insert(key, node);
    }

    pub fn fail_queries(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Make every query suspend for `delay` before answering
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = delay;
    }

    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl GeometryProvider for ScriptedGeometry {
    async fn query(
        &self,
        selector: &str,
        context: Option<&ContextRef>,
    ) -> Result<Vec<NodeGeometry>> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        let delay = *self.delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::Provider("scripted failure".to_string()));
        }
        let key = (
            context.map(|ctx| ctx.as_str().to_string()),
            selector.to_string(),
        );
        Ok(self
            .nodes
            .lock()
            .unwrap()
            .get(&key)
            .copied()
            .into_iter()
            .collect())
    }
}

pub(crate) fn ok_candidate(id: &str) -> Candidate {
    Candidate::new(id, |_: &Candidate| async { true })
}

/// Records which candidates loaded, and when
#[derive(Clone, Default)]
pub(crate) struct Recorder {
    loaded: Arc<Mutex<Vec<String>>>,
    times: Arc<Mutex<Vec<Instant>>>,
    failing: Arc<Mutex<HashSet<String>>>,
    attempts: Arc<AtomicUsize>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn candidate(&self, id: &str) -> Candidate {
        let recorder = self.clone();
        Candidate::new(id, move |c: &Candidate| {
            let ok = recorder.attempt(c.node_id());
            async move { ok }
        })
    }

    fn attempt(&self, id: &str) -> bool {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.failing.lock().unwrap().contains(id) {
            return false;
        }
        self.loaded.lock().unwrap().push(id.to_string());
        self.times.lock().unwrap().push(Instant::now());
        true
    }

    pub fn fail(&self, id: &str) {
        self.failing.lock().unwrap().insert(id.to_string());
    }

    pub fn succeed(&self, id: &str) {
        self.failing.lock().unwrap().remove(id);
    }

    pub fn loaded(&self) -> Vec<String> {
        self.loaded.lock().unwrap().clone()
    }

    pub fn load_times(&self) -> Vec<Instant> {
        self.times.lock().unwrap().clone()
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}
