//! The lazy-load engine
//!
//! `LazyLoader` owns the candidate queue, the active container and the
//! configuration. Every admission, container change and throttled scroll
//! ends in a drain: walk the relevant sequence from its head, load each
//! candidate whose leading edge is within the pre-load margin, stop at the
//! first one that is not visible or fails to load, and drop the completed
//! prefix in one step.
//!
//! Drains are serialized per container. A drain requested while another is
//! walking the same sequence only flags a re-run, which the running drain
//! performs before it returns.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::candidate::Candidate;
use crate::config::{ConfigPatch, LoaderConfig};
use crate::event::LoaderEvent;
use crate::geometry::{ContextRef, GeometryProvider, Orientation, Selector};
use crate::queue::{LoadQueue, QueueMode};
use crate::throttle::Throttle;
use crate::visibility::{self, Viewport};
use crate::{Error, Result};

/// Why a drain stopped walking
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// Every queued candidate loaded
    Exhausted,
    /// The head candidate is outside the pre-load zone or its node is missing
    NotVisible { node_id: String },
    /// The head candidate is visible but its callback reported failure
    LoadFailed { node_id: String },
    /// Another drain is walking this sequence; it will re-run on our behalf
    Busy,
    /// No sequence exists for the container
    NoQueue,
    /// The container is not the active one, so it was not scanned
    Inactive,
    /// The queue was torn down while the walk was suspended
    Cleared,
}

/// Outcome of a drain
#[derive(Debug, Clone, PartialEq)]
pub struct DrainReport {
    /// Container whose sequence was drained (`None` in single mode)
    pub container: Option<Selector>,
    /// Candidates loaded and removed
    pub loaded: usize,
    /// Candidates still pending in the sequence
    pub remaining: usize,
    pub stop: StopReason,
}

impl DrainReport {
    fn idle(container: Option<Selector>, remaining: usize, stop: StopReason) -> Self {
        Self {
            container,
            loaded: 0,
            remaining,
            stop,
        }
    }

    /// Whether a candidate is still waiting at the head of the sequence
    pub fn is_blocked(&self) -> bool {
        matches!(
            self.stop,
            StopReason::NotVisible { .. } | StopReason::LoadFailed { .. }
        )
    }
}

#[derive(Debug, Clone, Default)]
struct ContainerState {
    active: Option<Selector>,
    extent: f64,
    orientation: Orientation,
}

struct EngineState {
    config: LoaderConfig,
    container: ContainerState,
    queue: LoadQueue,
    /// Bumped by teardown so suspended drains leave the fresh queue alone
    generation: u64,
    /// Sequences with a drain in flight, and whether a re-run was requested
    running: HashMap<Option<Selector>, bool>,
}

struct Inner {
    provider: Arc<dyn GeometryProvider>,
    state: Mutex<EngineState>,
    throttle: Throttle,
    events: Option<mpsc::UnboundedSender<LoaderEvent>>,
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, EngineState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Claim on a sequence's in-flight slot
///
/// Released on drop, so a drain that is cancelled or unwinds mid-walk does
/// not leave its container marked busy.
struct DrainSlot<'a> {
    inner: &'a Inner,
    key: Option<Selector>,
    held: bool,
}

impl Drop for DrainSlot<'_> {
    fn drop(&mut self) {
        if self.held {
            self.inner.lock().running.remove(&self.key);
        }
    }
}

/// Builder for [`LazyLoader`]
pub struct LoaderBuilder {
    provider: Arc<dyn GeometryProvider>,
    mode: QueueMode,
    config: LoaderConfig,
    events: Option<mpsc::UnboundedSender<LoaderEvent>>,
}

impl LoaderBuilder {
    pub fn mode(mut self, mode: QueueMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn config(mut self, config: LoaderConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the event sender for host notifications
    pub fn event_sender(mut self, tx: mpsc::UnboundedSender<LoaderEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    pub fn build(self) -> LazyLoader {
        LazyLoader {
            inner: Arc::new(Inner {
                provider: self.provider,
                state: Mutex::new(EngineState {
                    config: self.config,
                    container: ContainerState::default(),
                    queue: LoadQueue::new(self.mode),
                    generation: 0,
                    running: HashMap::new(),
                }),
                throttle: Throttle::new(),
                events: self.events,
            }),
        }
    }
}

/// Visibility-gated sequential image loader
///
/// Cloning is cheap and every clone drives the same engine, so one instance
/// can be handed to each place that admits candidates or sees scroll events.
#[derive(Clone)]
pub struct LazyLoader {
    inner: Arc<Inner>,
}

impl LazyLoader {
    pub fn new(provider: Arc<dyn GeometryProvider>, mode: QueueMode) -> Self {
        Self::builder(provider).mode(mode).build()
    }

    pub fn builder(provider: Arc<dyn GeometryProvider>) -> LoaderBuilder {
        LoaderBuilder {
            provider,
            mode: QueueMode::default(),
            config: LoaderConfig::default(),
            events: None,
        }
    }

    pub fn mode(&self) -> QueueMode {
        self.inner.lock().queue.mode()
    }

    /// Measure a container and make it the active one, then drain it
    ///
    /// `selector` must be an id selector (`#name`). Nothing changes when the
    /// selector is malformed or the container cannot be measured.
    pub async fn bind(
        &self,
        selector: &str,
        orientation: Orientation,
        context: Option<&ContextRef>,
    ) -> Result<DrainReport> {
        let container = Selector::parse(selector)?;

        let nodes = self
            .inner
            .provider
            .query(container.as_str(), context)
            .await?;
        let Some(node) = nodes.first() else {
            return Err(Error::GeometryLookup(format!(
                "no node matches container '{}'",
                container
            )));
        };
        let extent = node.extent(orientation);

        {
            let mut state = self.inner.lock();
            state.container = ContainerState {
                active: Some(container.clone()),
                extent,
                orientation,
            };
        }

        info!(container = %container, extent, %orientation, "Container bound");
        self.emit(LoaderEvent::Bound {
            container,
            extent,
            orientation,
        });

        Ok(self.drain_resolved(None).await)
    }

    /// The active container, if one was bound or set
    pub fn container_id(&self) -> Option<Selector> {
        self.inner.lock().container.active.clone()
    }

    /// Replace the active container and drain it
    ///
    /// Accepts `name` or `#name`. The measured extent is kept; call
    /// [`LazyLoader::bind`] to re-measure.
    pub async fn set_container_id(&self, id: &str) -> Result<DrainReport> {
        let container = Selector::from_id(id)?;
        debug!(container = %container, "Active container changed");
        self.inner.lock().container.active = Some(container);
        Ok(self.drain_resolved(None).await)
    }

    /// Measured extent and orientation of the active container
    pub fn viewport(&self) -> Viewport {
        let state = self.inner.lock();
        Viewport::new(state.container.extent, state.container.orientation)
    }

    pub fn config(&self) -> LoaderConfig {
        self.inner.lock().config.clone()
    }

    /// Merge a partial configuration over the current one
    pub fn set_config(&self, patch: ConfigPatch) {
        self.inner.lock().config.merge(patch);
    }

    /// Throttled re-scan of the active container
    ///
    /// The throttle delay is read from the configuration on every call.
    /// Returns the scheduled drain, or `None` when a scheduled drain is
    /// already waiting and this scroll was absorbed into it.
    ///
    /// Must be called from within a tokio runtime.
    pub fn on_scroll(&self) -> Option<JoinHandle<DrainReport>> {
        let delay = self.inner.lock().config.throttle_delay();
        let loader = self.clone();
        self.inner
            .throttle
            .trigger(delay, move || async move { loader.drain_resolved(None).await })
    }

    /// Queue a candidate and drain its container right away
    ///
    /// In single mode `container` must be `None`; in keyed mode it is
    /// required. When a keyed candidate targets a container that is not the
    /// active one, it is queued without a drain and the report says
    /// [`StopReason::Inactive`]. Its sequence drains once that container is
    /// activated with [`LazyLoader::set_container_id`] or
    /// [`LazyLoader::bind`], or on an explicit [`LazyLoader::drain`].
    pub async fn enqueue(
        &self,
        candidate: Candidate,
        container: Option<&str>,
    ) -> Result<DrainReport> {
        let key = container.map(Selector::from_id).transpose()?;

        let inactive = {
            let mut state = self.inner.lock();
            state.queue.push(candidate, key.as_ref())?;
            match &key {
                Some(key) if state.container.active.as_ref() != Some(key) => {
                    Some(state.queue.len_of(Some(key)))
                }
                _ => None,
            }
        };

        if let Some(remaining) = inactive {
            debug!(container = ?key, "Queued for inactive container");
            return Ok(DrainReport::idle(key, remaining, StopReason::Inactive));
        }

        Ok(self.drain_resolved(key).await)
    }

    /// Drain a container now, bypassing the throttle
    ///
    /// `None` drains the active container (or the flat queue in single mode).
    pub async fn drain(&self, container: Option<&str>) -> Result<DrainReport> {
        let container = container.map(Selector::from_id).transpose()?;
        Ok(self.drain_resolved(container).await)
    }

    /// Drop every pending candidate without running its callback
    ///
    /// Drains already suspended mid-walk finish their current candidates but
    /// no longer remove anything. Returns how many candidates were dropped.
    pub fn teardown(&self) -> usize {
        let dropped = {
            let mut state = self.inner.lock();
            let dropped = state.queue.total_len();
            state.queue.clear();
            state.generation += 1;
            dropped
        };

        info!(dropped, "Lazy-load queue cleared");
        self.emit(LoaderEvent::Cleared { dropped });
        dropped
    }

    /// Node ids pending for a container, head first
    pub fn pending(&self, container: Option<&str>) -> Result<Vec<String>> {
        let key = container.map(Selector::from_id).transpose()?;
        let state = self.inner.lock();
        let key = match state.queue.mode() {
            QueueMode::Single => None,
            QueueMode::Keyed => key.or_else(|| state.container.active.clone()),
        };
        Ok(state
            .queue
            .sequence(key.as_ref())
            .unwrap_or_default()
            .iter()
            .map(|c| c.node_id().to_string())
            .collect())
    }

    /// Total number of pending candidates across all containers
    pub fn pending_len(&self) -> usize {
        self.inner.lock().queue.total_len()
    }

    fn emit(&self, event: LoaderEvent) {
        if let Some(ref tx) = self.inner.events {
            if tx.send(event).is_err() {
                warn!("Failed to send loader event: receiver dropped");
            }
        }
    }

    /// Map the requested container onto a queue sequence and drain it
    async fn drain_resolved(&self, container: Option<Selector>) -> DrainReport {
        let key = {
            let state = self.inner.lock();
            match state.queue.mode() {
                QueueMode::Single => None,
                QueueMode::Keyed => match container.or_else(|| state.container.active.clone()) {
                    Some(key) => Some(key),
                    None => return DrainReport::idle(None, 0, StopReason::NoQueue),
                },
            }
        };
        self.drain_sequence(key).await
    }

    async fn drain_sequence(&self, key: Option<Selector>) -> DrainReport {
        let mut slot = {
            let mut state = self.inner.lock();
            if state.queue.sequence(key.as_ref()).is_none() {
                return DrainReport::idle(key, 0, StopReason::NoQueue);
            }
            if let Some(rerun) = state.running.get_mut(&key) {
                *rerun = true;
                let remaining = state.queue.len_of(key.as_ref());
                debug!(container = ?key, "Drain already running, re-run requested");
                return DrainReport::idle(key, remaining, StopReason::Busy);
            }
            state.running.insert(key.clone(), false);
            DrainSlot {
                inner: &self.inner,
                key: key.clone(),
                held: true,
            }
        };

        let mut loaded = 0;
        loop {
            let mut report = self.drain_pass(key.as_ref()).await;
            loaded += report.loaded;

            let finished = {
                let mut state = self.inner.lock();
                match state.running.get_mut(&key) {
                    Some(rerun) if *rerun => {
                        *rerun = false;
                        false
                    }
                    _ => {
                        state.running.remove(&key);
                        slot.held = false;
                        true
                    }
                }
            };

            if finished {
                report.loaded = loaded;
                return report;
            }
            debug!(container = ?key, "Re-running drain for requests made while walking");
        }
    }

    /// One walk over a snapshot of the sequence
    async fn drain_pass(&self, key: Option<&Selector>) -> DrainReport {
        let (snapshot, viewport, margin, stagger, generation) = {
            let state = self.inner.lock();
            let Some(sequence) = state.queue.sequence(key) else {
                return DrainReport::idle(key.cloned(), 0, StopReason::NoQueue);
            };
            (
                sequence.to_vec(),
                Viewport::new(state.container.extent, state.container.orientation),
                state.config.pre_load_margin,
                state.config.inter_item_delay(),
                state.generation,
            )
        };

        let mut completed = 0;
        let mut stop = StopReason::Exhausted;

        for (index, candidate) in snapshot.iter().enumerate() {
            if index > 0 && !stagger.is_zero() {
                tokio::time::sleep(stagger).await;
            }

            let provider = self.inner.provider.as_ref();
            if !visibility::is_visible(provider, candidate, viewport, margin).await {
                stop = StopReason::NotVisible {
                    node_id: candidate.node_id().to_string(),
                };
                break;
            }

            if !candidate.load().await {
                warn!(node = candidate.node_id(), "Load callback failed, keeping at head");
                self.emit(LoaderEvent::Stalled {
                    node_id: candidate.node_id().to_string(),
                });
                stop = StopReason::LoadFailed {
                    node_id: candidate.node_id().to_string(),
                };
                break;
            }

            debug!(node = candidate.node_id(), "Candidate loaded");
            self.emit(LoaderEvent::Loaded {
                node_id: candidate.node_id().to_string(),
            });
            completed += 1;
        }

        let mut state = self.inner.lock();
        if state.generation != generation {
            debug!(container = ?key, completed, "Queue cleared during drain, nothing removed");
            return DrainReport {
                container: key.cloned(),
                loaded: completed,
                remaining: state.queue.len_of(key),
                stop: StopReason::Cleared,
            };
        }

        let removed = state.queue.remove_prefix(key, completed);
        let remaining = state.queue.len_of(key);
        if removed > 0 {
            debug!(container = ?key, removed, remaining, "Drained loaded prefix");
        }

        DrainReport {
            container: key.cloned(),
            loaded: removed,
            remaining,
            stop,
        }
    }
}
