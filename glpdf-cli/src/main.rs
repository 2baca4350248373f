mod scene;

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use directories::ProjectDirs;
use glpdf_core::{
    ConfigSource, Document, PageSearcher, SearchResult, SearchWorker, TextureSource,
    ThreadedSearchWorker, ViewerConfig,
};
use glpdf_render::{DrawCommand, PageViewer, RecordingDevice, ShaderSources, SharedResourceRegistry};
use serde::Serialize;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{prelude::*, EnvFilter};

use crate::scene::{Scene, SceneDocument, SceneSearcher, SceneTextures, StackedView};

const SEARCH_POLL_INTERVAL: Duration = Duration::from_millis(5);

#[derive(Debug, Parser)]
#[command(
    name = "glpdf",
    version,
    about = "Headless driver for the glpdf page viewer: prints the draw list of one frame"
)]
struct Args {
    /// Viewer config file (defaults to glpdf.toml in the platform config dir)
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Text to search for before drawing
    #[arg(short = 's', long = "search")]
    search: Option<String>,

    /// Move this many search results from the first one before drawing
    #[arg(short = 'n', long = "navigate", allow_hyphen_values = true)]
    navigate: Option<i64>,

    /// Outline links on every visible page
    #[arg(long = "highlight-links")]
    highlight_links: bool,

    #[arg(long = "width", default_value_t = 800)]
    width: u32,

    #[arg(long = "height", default_value_t = 600)]
    height: u32,

    /// Scene description (JSON) to load as the document
    scene: PathBuf,
}

#[derive(Debug, Serialize)]
struct FrameReport {
    document: String,
    path: Option<PathBuf>,
    page_count: usize,
    results: Vec<SearchResult>,
    current_index: Option<usize>,
    scroll_offset: Option<f32>,
    setup: Vec<DrawCommand>,
    frame: Vec<DrawCommand>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let project_dirs = ProjectDirs::from("net", "glpdf", "glpdf");
    let _log_guard = init_logging(project_dirs.as_ref())?;

    let config = load_config(&args, project_dirs.as_ref())?;
    let shaders = match &config.shader_dir {
        Some(dir) => ShaderSources::from_dir(dir),
        None => ShaderSources::embedded(),
    };

    let scene = Scene::load(&args.scene)?;
    let document = Arc::new(SceneDocument::new(args.scene.clone(), scene));
    info!(
        document = %document.id(),
        pages = document.page_count(),
        "scene loaded"
    );

    let searcher: Arc<dyn PageSearcher> = Arc::new(SceneSearcher::new(Arc::clone(&document)));
    let worker = Arc::new(ThreadedSearchWorker::new(searcher));
    let textures: Arc<dyn TextureSource<u32>> = Arc::new(SceneTextures::new(Arc::clone(&document)));
    let config: Arc<dyn ConfigSource> = Arc::new(config);

    let device = Rc::new(RecordingDevice::new());
    let registry = Arc::new(SharedResourceRegistry::new(shaders));
    let mut viewer = PageViewer::new(
        Arc::clone(&registry),
        textures,
        config,
        Arc::clone(&worker) as Arc<dyn SearchWorker>,
    );

    viewer.bind_document(Box::new(StackedView::new(Arc::clone(&document), 1.0)));
    viewer.on_context_ready(Rc::clone(&device));
    viewer.on_resize(args.width, args.height);
    if args.highlight_links {
        viewer.toggle_highlight_links();
    }

    if let Some(query) = &args.search {
        viewer.start_search(query);
        while viewer.poll_search_progress().is_some() {
            thread::sleep(SEARCH_POLL_INTERVAL);
        }
        worker.join_all();
        info!(results = viewer.search_result_count(), "search finished");
    }

    let scroll_offset = match args.navigate {
        Some(offset) => {
            let target = viewer.goto_search_result(offset);
            if target.is_none() {
                warn!("nothing to navigate to");
            }
            target
        }
        None => None,
    };

    let setup = device.take_commands();
    viewer.draw_frame();
    let frame = device.take_commands();

    let results = viewer.search().session().results();
    let current_index = (!results.is_empty()).then(|| viewer.search().current_index());
    let report = FrameReport {
        document: document.id().to_string(),
        path: document.path().map(Path::to_path_buf),
        page_count: document.page_count(),
        results,
        current_index,
        scroll_offset,
        setup,
        frame,
    };

    viewer.teardown();
    registry.release(&device);

    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, &report).context("failed to write frame report")?;
    writeln!(stdout)?;
    Ok(())
}

fn load_config(args: &Args, project_dirs: Option<&ProjectDirs>) -> Result<ViewerConfig> {
    let config = match (&args.config, project_dirs) {
        (Some(path), _) => ViewerConfig::load(path)?,
        (None, Some(dirs)) => ViewerConfig::load_or_default(dirs.config_dir())?,
        (None, None) => ViewerConfig::default(),
    };
    Ok(config)
}

fn init_logging(project_dirs: Option<&ProjectDirs>) -> Result<Option<WorkerGuard>> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let mut guard = None;
    let file_layer = project_dirs.and_then(|dirs| {
        let log_dir = dirs.data_local_dir().join("logs");
        if let Err(err) = fs::create_dir_all(&log_dir) {
            eprintln!("file logging disabled: cannot create {:?}: {err}", log_dir);
            return None;
        }
        let file_appender = tracing_appender::rolling::never(log_dir, "glpdf.log");
        let (file_writer, file_guard) = tracing_appender::non_blocking(file_appender);
        guard = Some(file_guard);
        Some(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(file_writer),
        )
    });
    let console_layer = tracing_subscriber::fmt::layer().with_writer(io::stderr);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .map_err(|err| anyhow!(err))?;

    Ok(guard)
}
