use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use glpdf_core::{
    document_id_for_path, Document, DocumentId, DocumentView, PageSearcher, Rect, TextureKey,
    TextureSource,
};
use serde::Deserialize;
use tracing::debug;

/// Texture handles handed out for rendered pages are `TEXTURE_HANDLE_BASE + page`.
pub const TEXTURE_HANDLE_BASE: u32 = 1000;

#[derive(Debug, Clone, Deserialize)]
pub struct Scene {
    pub pages: Vec<ScenePage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScenePage {
    pub width: f32,
    pub height: f32,
    #[serde(default)]
    pub links: Vec<Rect>,
    #[serde(default, alias = "text")]
    pub words: Vec<SceneWord>,
    /// Whether a rasterized texture is available for the page.
    #[serde(default = "default_rendered")]
    pub rendered: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SceneWord {
    pub text: String,
    pub rect: Rect,
}

fn default_rendered() -> bool {
    true
}

impl Scene {
    pub fn load(path: &Path) -> Result<Self> {
        let raw =
            fs::read_to_string(path).with_context(|| format!("failed to read scene {:?}", path))?;
        let scene: Scene = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse scene {:?}", path))?;
        if scene.pages.is_empty() {
            bail!("scene {:?} has no pages", path);
        }
        for (index, page) in scene.pages.iter().enumerate() {
            if !(page.width > 0.0 && page.height > 0.0) {
                bail!("page {index} of {:?} has a non-positive size", path);
            }
        }
        Ok(scene)
    }
}

/// In-memory document built from a [`Scene`].
#[derive(Debug)]
pub struct SceneDocument {
    id: DocumentId,
    path: PathBuf,
    pages: Vec<ScenePage>,
}

impl SceneDocument {
    pub fn new(path: PathBuf, scene: Scene) -> Self {
        Self {
            id: document_id_for_path(&path),
            path,
            pages: scene.pages,
        }
    }

    pub fn page(&self, page: usize) -> Option<&ScenePage> {
        self.pages.get(page)
    }
}

impl Document for SceneDocument {
    fn id(&self) -> DocumentId {
        self.id
    }

    fn path(&self) -> Option<&Path> {
        Some(&self.path)
    }

    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_width(&self, page: usize) -> f32 {
        self.page(page).map_or(0.0, |p| p.width)
    }

    fn page_height(&self, page: usize) -> f32 {
        self.page(page).map_or(0.0, |p| p.height)
    }

    fn page_links(&self, page: usize) -> Vec<Rect> {
        self.page(page).map(|p| p.links.clone()).unwrap_or_default()
    }
}

/// Pages stacked top to bottom at a fixed zoom. `offset_y` is the document
/// coordinate shown at the top edge of the window; window rectangles are in
/// normalized device coordinates.
pub struct StackedView {
    document: Arc<SceneDocument>,
    zoom: f32,
    offset_y: f32,
    width: u32,
    height: u32,
}

impl StackedView {
    pub fn new(document: Arc<SceneDocument>, zoom: f32) -> Self {
        Self {
            document,
            zoom,
            offset_y: 0.0,
            width: 1,
            height: 1,
        }
    }

    fn visible_span(&self) -> (f32, f32) {
        let extent = self.height as f32 / self.zoom;
        (self.offset_y, self.offset_y + extent)
    }
}

impl DocumentView for StackedView {
    fn document(&self) -> Option<&dyn Document> {
        Some(self.document.as_ref())
    }

    fn visible_pages(&self) -> Vec<usize> {
        let (top, bottom) = self.visible_span();
        (0..self.document.page_count())
            .filter(|&page| {
                let page_top = self.document.accum_page_height(page);
                let page_bottom = page_top + self.document.page_height(page);
                page_bottom > top && page_top < bottom
            })
            .collect()
    }

    fn document_to_window_rect(&self, page: usize, rect: Rect) -> Rect {
        self.absolute_to_window_rect(rect.translate(0.0, self.document.accum_page_height(page)))
    }

    fn absolute_to_window_rect(&self, rect: Rect) -> Rect {
        let width = self.width.max(1) as f32;
        let height = self.height.max(1) as f32;
        let to_x = |x: f32| 2.0 * x * self.zoom / width - 1.0;
        let to_y = |y: f32| 1.0 - 2.0 * (y - self.offset_y) * self.zoom / height;
        Rect::new(to_x(rect.x0), to_y(rect.y1), to_x(rect.x1), to_y(rect.y0))
    }

    fn offset_y(&self) -> f32 {
        self.offset_y
    }

    fn set_offset_y(&mut self, offset_y: f32) {
        self.offset_y = offset_y;
    }

    fn zoom_level(&self) -> f32 {
        self.zoom
    }

    fn current_page(&self) -> usize {
        (0..self.document.page_count())
            .take_while(|&page| self.document.accum_page_height(page) <= self.offset_y)
            .last()
            .unwrap_or(0)
    }

    fn view_height(&self) -> u32 {
        self.height
    }

    fn on_view_size_change(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }
}

/// Case-insensitive word lookup over the scene text.
pub struct SceneSearcher {
    document: Arc<SceneDocument>,
}

impl SceneSearcher {
    pub fn new(document: Arc<SceneDocument>) -> Self {
        Self { document }
    }
}

impl PageSearcher for SceneSearcher {
    fn page_count(&self, document: DocumentId) -> Option<usize> {
        (document == self.document.id()).then(|| self.document.page_count())
    }

    fn search_page(&self, document: DocumentId, page: usize, query: &str) -> Result<Vec<Rect>> {
        if document != self.document.id() {
            bail!("unknown document {document}");
        }
        let Some(scene_page) = self.document.page(page) else {
            bail!("page {page} out of range");
        };
        let needle = query.to_lowercase();
        Ok(scene_page
            .words
            .iter()
            .filter(|word| word.text.to_lowercase().contains(&needle))
            .map(|word| word.rect)
            .collect())
    }
}

pub struct SceneTextures {
    document: Arc<SceneDocument>,
}

impl SceneTextures {
    pub fn new(document: Arc<SceneDocument>) -> Self {
        Self { document }
    }
}

impl TextureSource<u32> for SceneTextures {
    fn fetch_or_request(&self, key: TextureKey) -> Option<u32> {
        if key.document != self.document.id() {
            return None;
        }
        match self.document.page(key.page_index) {
            Some(page) if page.rendered => u32::try_from(key.page_index)
                .ok()
                .map(|index| TEXTURE_HANDLE_BASE + index),
            _ => {
                debug!(page = key.page_index, "no texture for page");
                None
            }
        }
    }
}
