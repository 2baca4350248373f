use std::path::Path;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod config;
pub mod search;
pub mod worker;

pub use config::{color_or_default, keys, ConfigError, ConfigSource, ViewerConfig};
pub use search::{SearchController, SearchHandle, SearchRequest, SearchSession, SearchWorker};
pub use worker::{PageSearcher, ThreadedSearchWorker};

pub type DocumentId = Uuid;

static DOCUMENT_NAMESPACE: Lazy<Uuid> = Lazy::new(|| {
    Uuid::parse_str("3f0d6a52-1c4b-5e8e-9a1d-6b2f7c0e4d11").expect("valid namespace UUID")
});

pub fn document_id_for_path(path: &Path) -> DocumentId {
    let resolved = path
        .canonicalize()
        .or_else(|_| {
            if path.is_absolute() {
                Ok(path.to_path_buf())
            } else {
                std::env::current_dir().map(|cwd| cwd.join(path))
            }
        })
        .unwrap_or_else(|_| path.to_path_buf());
    let rendered = resolved.to_string_lossy();
    Uuid::new_v5(&*DOCUMENT_NAMESPACE, rendered.as_bytes())
}

pub const QUAD_FLOATS: usize = 8;

pub type Quad = [f32; QUAD_FLOATS];

/// Axis-aligned rectangle. The same type carries page-local, absolute-document
/// and window (normalized device) coordinates; which one is meant depends on
/// where it came from.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl Rect {
    pub const fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn translate(&self, dx: f32, dy: f32) -> Self {
        Self {
            x0: self.x0 + dx,
            y0: self.y0 + dy,
            x1: self.x1 + dx,
            y1: self.y1 + dy,
        }
    }

    /// Vertex data for a 4-vertex triangle strip covering the rectangle.
    pub fn to_quad(&self) -> Quad {
        [
            self.x0, self.y1, //
            self.x1, self.y1, //
            self.x0, self.y0, //
            self.x1, self.y0,
        ]
    }
}

/// RGB colour with components in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Color(pub [f32; 3]);

impl Color {
    pub const BLACK: Color = Color([0.0, 0.0, 0.0]);

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self([r, g, b])
    }

    pub fn with_alpha(self, alpha: f32) -> [f32; 4] {
        let [r, g, b] = self.0;
        [r, g, b, alpha]
    }

    pub fn is_normalized(&self) -> bool {
        self.0
            .iter()
            .all(|component| component.is_finite() && (0.0..=1.0).contains(component))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Hit bounds in page-local coordinates.
    pub rect: Rect,
    pub page: usize,
}

pub trait Document {
    fn id(&self) -> DocumentId;

    /// Backing file, if the document was loaded from one.
    fn path(&self) -> Option<&Path> {
        None
    }

    fn page_count(&self) -> usize;
    fn page_width(&self, page: usize) -> f32;
    fn page_height(&self, page: usize) -> f32;

    /// Sum of the heights of every page before `page`.
    fn accum_page_height(&self, page: usize) -> f32 {
        (0..page.min(self.page_count()))
            .map(|p| self.page_height(p))
            .sum()
    }

    /// Link rectangles of `page` in page-local coordinates.
    fn page_links(&self, page: usize) -> Vec<Rect>;
}

pub trait DocumentView {
    fn document(&self) -> Option<&dyn Document>;

    /// Indices of the pages intersecting the viewport, in increasing order.
    fn visible_pages(&self) -> Vec<usize>;

    fn document_to_window_rect(&self, page: usize, rect: Rect) -> Rect;
    fn absolute_to_window_rect(&self, rect: Rect) -> Rect;

    fn offset_y(&self) -> f32;
    fn set_offset_y(&mut self, offset_y: f32);

    fn zoom_level(&self) -> f32;
    fn current_page(&self) -> usize;
    fn view_height(&self) -> u32;

    fn on_view_size_change(&mut self, width: u32, height: u32);
}

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct TextureKey {
    pub document: DocumentId,
    pub page_index: usize,
    zoom_milli: u32,
}

impl TextureKey {
    pub fn new(document: DocumentId, page_index: usize, zoom: f32) -> Self {
        Self {
            document,
            page_index,
            zoom_milli: quantize_zoom(zoom),
        }
    }

    pub fn zoom(&self) -> f32 {
        self.zoom_milli as f32 / 1000.0
    }
}

fn quantize_zoom(zoom: f32) -> u32 {
    let scaled = (zoom * 1000.0).round();
    if !scaled.is_finite() || scaled <= 0.0 {
        1
    } else if scaled > u32::MAX as f32 {
        u32::MAX
    } else {
        scaled as u32
    }
}

/// Rasterized page textures. Never blocks: a miss returns `None` and is
/// expected to schedule the page for a later frame.
pub trait TextureSource<T> {
    fn fetch_or_request(&self, key: TextureKey) -> Option<T>;
}
