use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info};

use lazyload_core::{
    timing::hold_at_least, AppConfig, Candidate, ConfigPatch, DrainReport, LazyLoader,
    LoaderEvent, StopReason,
};

use crate::scene::{Scene, SceneGeometry, SceneImage};

/// Pause between two simulated scroll events
const SCROLL_FRAME: Duration = Duration::from_millis(16);

pub struct SimulateOptions {
    pub step: f64,
    pub overrides: ConfigPatch,
}

pub async fn run(config: &AppConfig, scene_path: &Path, options: SimulateOptions) -> Result<()> {
    let scene = Scene::load(scene_path)?;
    let geometry = Arc::new(SceneGeometry::new(&scene));

    let mut loader_config = config.loader.clone();
    loader_config.merge(options.overrides);

    let (tx, mut rx) = mpsc::unbounded_channel();
    let loader = LazyLoader::builder(geometry.clone())
        .config(loader_config.clone())
        .event_sender(tx)
        .build();

    println!(
        "Simulating {} images in {} ({} {}px, margin {}px, throttle {}ms, stagger {}ms)\n",
        scene.images.len(),
        scene.selector(),
        scene.container.orientation,
        scene.viewport_extent(),
        loader_config.pre_load_margin,
        loader_config.throttle_delay_ms,
        loader_config.inter_item_delay_ms,
    );

    let start = Instant::now();
    let reporter_geometry = Arc::clone(&geometry);
    let reporter = tokio::spawn(async move {
        let mut loaded = 0u32;
        while let Some(event) = rx.recv().await {
            let at = start.elapsed().as_millis();
            let scroll = reporter_geometry.scroll_position();
            match event {
                LoaderEvent::Bound { container, extent, .. } => {
                    println!("[{:>6}ms] bound {} (extent {}px)", at, container, extent);
                }
                LoaderEvent::Loaded { node_id } => {
                    loaded += 1;
                    println!("[{:>6}ms] loaded {} at scroll {}", at, node_id, scroll);
                }
                LoaderEvent::Stalled { node_id } => {
                    println!("[{:>6}ms] load failed for {}, retrying on next scan", at, node_id);
                }
                LoaderEvent::Cleared { dropped } => {
                    println!("[{:>6}ms] queue cleared, {} dropped", at, dropped);
                }
            }
        }
        loaded
    });

    let min_duration = loader_config.min_animation_duration();
    for image in &scene.images {
        loader.enqueue(image_candidate(image, min_duration), None).await?;
    }

    loader
        .bind(&scene.selector(), scene.container.orientation, None)
        .await?;

    let max_scroll = scene.max_scroll();
    let step = options.step.max(1.0);
    let mut position = 0.0;
    let mut scans = Vec::new();
    while position < max_scroll && loader.pending_len() > 0 {
        position = (position + step).min(max_scroll);
        geometry.scroll_to(position);
        scans.extend(loader.on_scroll());
        tokio::time::sleep(SCROLL_FRAME).await;
    }

    let report = settle(&loader, scans).await?;
    info!(remaining = report.remaining, "Simulation finished");

    let pending = loader.pending(None)?;
    let dropped = loader.teardown();
    drop(loader);
    let loaded = reporter.await?;

    println!(
        "\nSimulation complete. {} loaded, {} still pending.",
        loaded, dropped
    );
    for id in pending {
        println!("  pending: {}", id);
    }

    Ok(())
}

/// Wait for every scheduled scan, then run a final drain once nothing else
/// is walking the queue
async fn settle(loader: &LazyLoader, scans: Vec<JoinHandle<DrainReport>>) -> Result<DrainReport> {
    for scan in scans {
        let report = scan.await?;
        debug!(?report, "Throttled scan finished");
    }

    loop {
        let report = loader.drain(None).await?;
        if report.stop != StopReason::Busy {
            return Ok(report);
        }
        tokio::time::sleep(SCROLL_FRAME).await;
    }
}

fn image_candidate(image: &SceneImage, min_duration: Duration) -> Candidate {
    let failures_left = Arc::new(AtomicU32::new(image.fail_attempts));
    let load_time = Duration::from_millis(image.load_ms);
    let id = image.id.clone().unwrap_or_default();

    Candidate::new(id, move |_: &Candidate| {
        let failures_left = Arc::clone(&failures_left);
        async move {
            hold_at_least(min_duration, async move {
                if !load_time.is_zero() {
                    tokio::time::sleep(load_time).await;
                }
                failures_left
                    .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                    .is_err()
            })
            .await
        }
    })
}
