//! Simulated scroll scene
//!
//! A scene file describes one scroll container and the images laid out in
//! its content. `SceneGeometry` answers geometry queries the way a host
//! runtime would, with every image offset shifted by the current scroll
//! position.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use serde::Deserialize;

use lazyload_core::{generate_node_id, ContextRef, GeometryProvider, NodeGeometry, Orientation};

#[derive(Debug, Clone, Deserialize)]
pub struct Scene {
    pub container: SceneContainer,
    #[serde(default)]
    pub images: Vec<SceneImage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SceneContainer {
    /// Container id, with or without the leading `#`
    pub id: String,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub orientation: Orientation,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SceneImage {
    /// Node id; generated when omitted
    #[serde(default)]
    pub id: Option<String>,
    /// Position of the leading edge in content coordinates
    pub offset: f64,
    /// Size along the scroll axis
    #[serde(default = "default_image_size")]
    pub size: f64,
    /// Number of load attempts that fail before one succeeds
    #[serde(default)]
    pub fail_attempts: u32,
    /// Simulated fetch time
    #[serde(default)]
    pub load_ms: u64,
}

fn default_image_size() -> f64 {
    200.0
}

impl Scene {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read scene {}", path.display()))?;
        let mut scene: Scene = toml::from_str(&content)
            .with_context(|| format!("invalid scene {}", path.display()))?;

        for image in &mut scene.images {
            if image.id.is_none() {
                image.id = Some(generate_node_id());
            }
        }

        Ok(scene)
    }

    pub fn selector(&self) -> String {
        let id = self.container.id.trim_start_matches('#');
        format!("#{}", id)
    }

    /// Visible size of the container along its scroll axis
    pub fn viewport_extent(&self) -> f64 {
        match self.container.orientation {
            Orientation::Vertical => self.container.height,
            Orientation::Horizontal => self.container.width,
        }
    }

    /// Furthest scroll position at which the last image is fully in view
    pub fn max_scroll(&self) -> f64 {
        let content_end = self
            .images
            .iter()
            .map(|image| image.offset + image.size)
            .fold(0.0, f64::max);
        (content_end - self.viewport_extent()).max(0.0)
    }
}

/// Geometry provider over a scene and a movable scroll position
pub struct SceneGeometry {
    container: String,
    orientation: Orientation,
    container_geometry: NodeGeometry,
    images: HashMap<String, (f64, f64)>,
    scroll: Mutex<f64>,
}

impl SceneGeometry {
    pub fn new(scene: &Scene) -> Self {
        let images = scene
            .images
            .iter()
            .filter_map(|image| {
                let id = image.id.as_deref()?;
                Some((format!("#{}", id), (image.offset, image.size)))
            })
            .collect();

        Self {
            container: scene.selector(),
            orientation: scene.container.orientation,
            container_geometry: NodeGeometry::from_client_size(
                scene.container.width,
                scene.container.height,
            ),
            images,
            scroll: Mutex::new(0.0),
        }
    }

    pub fn scroll_to(&self, position: f64) {
        if let Ok(mut scroll) = self.scroll.lock() {
            *scroll = position;
        }
    }

    pub fn scroll_position(&self) -> f64 {
        self.scroll.lock().map(|scroll| *scroll).unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl GeometryProvider for SceneGeometry {
    async fn query(
        &self,
        selector: &str,
        _context: Option<&ContextRef>,
    ) -> lazyload_core::Result<Vec<NodeGeometry>> {
        if selector == self.container {
            return Ok(vec![self.container_geometry]);
        }

        let Some(&(offset, size)) = self.images.get(selector) else {
            return Ok(Vec::new());
        };

        let position = offset - self.scroll_position();
        let cross = match self.orientation {
            Orientation::Vertical => self.container_geometry.width,
            Orientation::Horizontal => self.container_geometry.height,
        };
        let node = match self.orientation {
            Orientation::Vertical => NodeGeometry::new(position, 0.0, cross, size),
            Orientation::Horizontal => NodeGeometry::new(0.0, position, size, cross),
        };
        Ok(vec![node])
    }
}
