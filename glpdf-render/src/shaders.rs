use std::borrow::Cow;
use std::fs;
use std::path::Path;

use tracing::error;

pub const VERTEX_FILE: &str = "simple.vertex";
pub const RENDERED_FRAGMENT_FILE: &str = "simple.fragment";
pub const UNRENDERED_FRAGMENT_FILE: &str = "unrendered_page.fragment";
pub const HIGHLIGHT_FRAGMENT_FILE: &str = "highlight.fragment";

/// GLSL for the three page-view programs, which share one vertex shader.
/// A `None` source makes every program that needs it unavailable.
#[derive(Debug, Clone)]
pub struct ShaderSources {
    pub vertex: Option<Cow<'static, str>>,
    pub rendered_fragment: Option<Cow<'static, str>>,
    pub unrendered_fragment: Option<Cow<'static, str>>,
    pub highlight_fragment: Option<Cow<'static, str>>,
}

impl ShaderSources {
    pub fn embedded() -> Self {
        Self {
            vertex: Some(Cow::Borrowed(include_str!("shaders/simple.vertex"))),
            rendered_fragment: Some(Cow::Borrowed(include_str!("shaders/simple.fragment"))),
            unrendered_fragment: Some(Cow::Borrowed(include_str!(
                "shaders/unrendered_page.fragment"
            ))),
            highlight_fragment: Some(Cow::Borrowed(include_str!("shaders/highlight.fragment"))),
        }
    }

    /// Reads the shader files from `dir`. Unreadable files are logged and
    /// left empty; the rest still load.
    pub fn from_dir(dir: &Path) -> Self {
        Self {
            vertex: read_source(dir, VERTEX_FILE),
            rendered_fragment: read_source(dir, RENDERED_FRAGMENT_FILE),
            unrendered_fragment: read_source(dir, UNRENDERED_FRAGMENT_FILE),
            highlight_fragment: read_source(dir, HIGHLIGHT_FRAGMENT_FILE),
        }
    }
}

impl Default for ShaderSources {
    fn default() -> Self {
        Self::embedded()
    }
}

fn read_source(dir: &Path, name: &str) -> Option<Cow<'static, str>> {
    let path = dir.join(name);
    match fs::read_to_string(&path) {
        Ok(source) => Some(Cow::Owned(source)),
        Err(err) => {
            error!(?err, path = %path.display(), "failed to read shader source");
            None
        }
    }
}
