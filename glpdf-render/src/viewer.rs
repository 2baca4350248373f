use std::rc::Rc;
use std::sync::Arc;

use glpdf_core::{
    color_or_default, keys, Color, ConfigSource, Document, DocumentView, Rect, SearchController,
    SearchResult, SearchWorker, TextureKey, TextureSource,
};
use tracing::{debug, warn};

use crate::device::GraphicsDevice;
use crate::instance::InstanceDrawState;
use crate::registry::SharedResourceRegistry;

const NO_DOCUMENT_CLEAR: [f32; 4] = [0.0, 0.0, 0.0, 1.0];

/// One on-screen page view: owns its per-instance GPU state, the bound
/// document view, the selection and the search of this view.
///
/// All methods run on the render context that owns the device.
pub struct PageViewer<D: GraphicsDevice> {
    registry: Arc<SharedResourceRegistry<D>>,
    gpu: Option<InstanceDrawState<D>>,
    view: Option<Box<dyn DocumentView>>,
    textures: Arc<dyn TextureSource<D::Texture>>,
    config: Arc<dyn ConfigSource>,
    search: SearchController,
    highlight_links: bool,
    selection: Vec<Rect>,
}

impl<D: GraphicsDevice> PageViewer<D> {
    pub fn new(
        registry: Arc<SharedResourceRegistry<D>>,
        textures: Arc<dyn TextureSource<D::Texture>>,
        config: Arc<dyn ConfigSource>,
        worker: Arc<dyn SearchWorker>,
    ) -> Self {
        Self {
            registry,
            gpu: None,
            view: None,
            textures,
            config,
            search: SearchController::new(worker),
            highlight_links: false,
            selection: Vec::new(),
        }
    }

    pub fn bind_document(&mut self, view: Box<dyn DocumentView>) {
        self.view = Some(view);
    }

    pub fn unbind_document(&mut self) -> Option<Box<dyn DocumentView>> {
        self.view.take()
    }

    pub fn document_view(&self) -> Option<&dyn DocumentView> {
        self.view.as_deref()
    }

    pub fn is_context_ready(&self) -> bool {
        self.gpu.is_some()
    }

    pub fn search(&self) -> &SearchController {
        &self.search
    }


    pub fn on_context_ready(&mut self, device: Rc<D>) {
        if self.gpu.is_some() {
            warn!("context ready reported twice, ignoring");
            return;
        }
        self.gpu = InstanceDrawState::create(&self.registry, device);
        if self.gpu.is_none() {
            warn!("viewer has no usable draw state, frames will be skipped");
        }
    }

    pub fn on_resize(&mut self, width: u32, height: u32) {
        if let Some(gpu) = &self.gpu {
            gpu.device().set_viewport(width, height);
        }
        if let Some(view) = self.view.as_deref_mut() {
            view.on_view_size_change(width, height);
        }
    }

    pub fn teardown(&mut self) {
        if let Some(gpu) = self.gpu.take() {
            gpu.teardown();
        }
    }

    pub fn draw_frame(&self) {
        let Some(gpu) = &self.gpu else {
            debug!("frame requested before context ready");
            return;
        };
        gpu.begin_frame();

        let Some(view) = self.view.as_deref() else {
            gpu.device().clear(NO_DOCUMENT_CLEAR);
            return;
        };
        let Some(document) = view.document() else {
            gpu.device().clear(NO_DOCUMENT_CLEAR);
            return;
        };

        let visible_pages = view.visible_pages();
        let background = self.color(keys::BACKGROUND_COLOR);
        gpu.device().clear(background.with_alpha(1.0));

        for page in visible_pages {
            self.draw_page(gpu, view, document, page);
            if self.highlight_links {
                self.draw_links(gpu, view, document, page);
            }
        }

        let search_color = self.color(keys::SEARCH_HIGHLIGHT_COLOR);
        self.search.session().with_current(|result| {
            self.draw_search_hit(gpu, view, result, search_color);
        });

        if !self.selection.is_empty() {
            let text_color = self.color(keys::TEXT_HIGHLIGHT_COLOR);
            if let Some(program) = gpu.prepare_highlight(text_color) {
                for rect in &self.selection {
                    gpu.draw_highlight(program, view.absolute_to_window_rect(*rect));
                }
            }
        }
    }


    pub fn toggle_highlight_links(&mut self) {
        self.highlight_links = !self.highlight_links;
    }

    pub fn highlight_links(&self) -> bool {
        self.highlight_links
    }

    /// Rectangles are in absolute document coordinates.
    pub fn set_selection(&mut self, rects: Vec<Rect>) {
        self.selection = rects;
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }


    pub fn start_search(&self, query: &str) {
        if let Some(view) = self.view.as_deref() {
            self.search.start_search(view, query);
        }
    }

    pub fn poll_search_progress(&self) -> Option<f32> {
        self.search.poll_progress()
    }

    pub fn cancel_search(&self) {
        self.search.cancel();
    }

    pub fn goto_search_result(&mut self, offset: i64) -> Option<f32> {
        let view = self.view.as_deref_mut()?;
        self.search.navigate(view, offset)
    }

    pub fn search_result_count(&self) -> usize {
        self.search.result_count()
    }

    pub fn current_search_result(&self) -> Option<SearchResult> {
        self.search.current_result()
    }

    fn color(&self, key: &str) -> Color {
        color_or_default(self.config.as_ref(), key)
    }

    fn draw_page(
        &self,
        gpu: &InstanceDrawState<D>,
        view: &dyn DocumentView,
        document: &dyn Document,
        page: usize,
    ) {
        let device = gpu.device();
        let resources = gpu.resources();
        let key = TextureKey::new(document.id(), page, view.zoom_level());

        match (self.textures.fetch_or_request(key), resources.rendered_program) {
            (Some(texture), Some(program)) => {
                device.use_program(program);
                device.bind_texture(texture);
            }
            _ => match resources.unrendered_program {
                Some(program) => device.use_program(program),
                None => {
                    debug!(page, "no program available for page, skipping");
                    return;
                }
            },
        }

        let page_rect = Rect::new(0.0, 0.0, document.page_width(page), document.page_height(page));
        gpu.draw_window_rect(view.document_to_window_rect(page, page_rect));
    }

    fn draw_links(
        &self,
        gpu: &InstanceDrawState<D>,
        view: &dyn DocumentView,
        document: &dyn Document,
        page: usize,
    ) {
        let links = document.page_links(page);
        if links.is_empty() {
            return;
        }
        let Some(program) = gpu.prepare_highlight(self.color(keys::LINK_HIGHLIGHT_COLOR)) else {
            return;
        };
        for link in links {
            gpu.draw_highlight(program, view.document_to_window_rect(page, link));
        }
    }

    fn draw_search_hit(
        &self,
        gpu: &InstanceDrawState<D>,
        view: &dyn DocumentView,
        result: &SearchResult,
        color: Color,
    ) {
        if let Some(program) = gpu.prepare_highlight(color) {
            gpu.draw_highlight(program, view.document_to_window_rect(result.page, result.rect));
        }
    }
}

impl<D: GraphicsDevice> Drop for PageViewer<D> {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::cell::RefCell;

    use glpdf_core::{DocumentId, SearchHandle, SearchRequest, ViewerConfig};
    use parking_lot::Mutex;

    use crate::recording::{DrawCommand, RecordingDevice};
    use crate::shaders::ShaderSources;

    const PAGE_STRIDE: f32 = 1000.0;

    struct FakeDocument {
        heights: Vec<f32>,
        links: Vec<Vec<Rect>>,
    }

    impl Document for FakeDocument {
        fn id(&self) -> DocumentId {
            DocumentId::nil()
        }

        fn page_count(&self) -> usize {
            self.heights.len()
        }

        fn page_width(&self, _page: usize) -> f32 {
            50.0
        }

        fn page_height(&self, page: usize) -> f32 {
            self.heights[page]
        }

        fn page_links(&self, page: usize) -> Vec<Rect> {
            self.links.get(page).cloned().unwrap_or_default()
        }
    }

    /// Page-local rects land at `y + page * PAGE_STRIDE`; absolute rects are
    /// shifted by one so each transform is recognisable in the output.
    struct FakeView {
        document: Option<FakeDocument>,
        visible: Vec<usize>,
        offset_y: f32,
        sizes: Rc<RefCell<Vec<(u32, u32)>>>,
    }

    impl FakeView {
        fn new(heights: Vec<f32>, links: Vec<Vec<Rect>>, visible: Vec<usize>) -> Self {
            Self {
                document: Some(FakeDocument { heights, links }),
                visible,
                offset_y: 0.0,
                sizes: Rc::default(),
            }
        }
    }

    impl DocumentView for FakeView {
        fn document(&self) -> Option<&dyn Document> {
            self.document.as_ref().map(|doc| doc as &dyn Document)
        }

        fn visible_pages(&self) -> Vec<usize> {
            self.visible.clone()
        }

        fn document_to_window_rect(&self, page: usize, rect: Rect) -> Rect {
            rect.translate(0.0, page as f32 * PAGE_STRIDE)
        }

        fn absolute_to_window_rect(&self, rect: Rect) -> Rect {
            rect.translate(1.0, 1.0)
        }

        fn offset_y(&self) -> f32 {
            self.offset_y
        }

        fn set_offset_y(&mut self, offset_y: f32) {
            self.offset_y = offset_y;
        }

        fn zoom_level(&self) -> f32 {
            1.0
        }

        fn current_page(&self) -> usize {
            self.visible.first().copied().unwrap_or(0)
        }

        fn view_height(&self) -> u32 {
            600
        }

        fn on_view_size_change(&mut self, width: u32, height: u32) {
            self.sizes.borrow_mut().push((width, height));
        }
    }

    /// Pages listed here have a texture whose handle is `500 + page`.
    struct FakeTextures {
        rendered: Vec<usize>,
        requests: Mutex<Vec<TextureKey>>,
    }

    impl TextureSource<u32> for FakeTextures {
        fn fetch_or_request(&self, key: TextureKey) -> Option<u32> {
            self.requests.lock().push(key);
            self.rendered
                .contains(&key.page_index)
                .then(|| 500 + key.page_index as u32)
        }
    }

    struct ImmediateWorker(Vec<SearchResult>);

    impl SearchWorker for ImmediateWorker {
        fn run(&self, _request: SearchRequest, handle: SearchHandle) {
            handle.extend_results(self.0.clone());
            handle.finish();
        }
    }

    struct Harness {
        device: Rc<RecordingDevice>,
        registry: Arc<SharedResourceRegistry<RecordingDevice>>,
        textures: Arc<FakeTextures>,
        config: Arc<ViewerConfig>,
    }

    impl Harness {
        fn new(rendered: Vec<usize>) -> Self {
            Self::with_device(RecordingDevice::new(), rendered)
        }

        fn with_device(device: RecordingDevice, rendered: Vec<usize>) -> Self {
            Self {
                device: Rc::new(device),
                registry: Arc::new(SharedResourceRegistry::new(ShaderSources::embedded())),
                textures: Arc::new(FakeTextures {
                    rendered,
                    requests: Mutex::new(Vec::new()),
                }),
                config: Arc::new(ViewerConfig::default()),
            }
        }

        fn viewer(&self, results: Vec<SearchResult>) -> PageViewer<RecordingDevice> {
            let mut viewer = PageViewer::new(
                Arc::clone(&self.registry),
                self.textures.clone(),
                self.config.clone(),
                Arc::new(ImmediateWorker(results)),
            );
            viewer.on_context_ready(Rc::clone(&self.device));
            viewer
        }

        fn frame(&self, viewer: &PageViewer<RecordingDevice>) -> Vec<DrawCommand> {
            self.device.take_commands();
            viewer.draw_frame();
            self.device.take_commands()
        }
    }

    fn position(commands: &[DrawCommand], wanted: &DrawCommand) -> usize {
        commands
            .iter()
            .position(|cmd| cmd == wanted)
            .unwrap_or_else(|| panic!("{wanted:?} not in {commands:?}"))
    }

    fn uploaded_quads(commands: &[DrawCommand]) -> Vec<[f32; 8]> {
        commands
            .iter()
            .filter_map(|cmd| match cmd {
                DrawCommand::UploadQuad { vertices, .. } => Some(*vertices),
                _ => None,
            })
            .collect()
    }

    fn draw_count(commands: &[DrawCommand]) -> usize {
        commands
            .iter()
            .filter(|cmd| **cmd == DrawCommand::DrawQuad)
            .count()
    }

    #[test]
    fn frame_without_document_only_clears() {
        let harness = Harness::new(vec![0]);
        let viewer = harness.viewer(Vec::new());

        let commands = harness.frame(&viewer);

        assert!(commands.contains(&DrawCommand::Clear {
            color: [0.0, 0.0, 0.0, 1.0]
        }));
        assert!(!commands
            .iter()
            .any(|cmd| matches!(cmd, DrawCommand::BindTexture { .. })));
        assert_eq!(draw_count(&commands), 0);
    }

    #[test]
    fn frame_before_context_ready_does_nothing() {
        let harness = Harness::new(vec![0]);
        let mut viewer = PageViewer::new(
            Arc::clone(&harness.registry),
            harness.textures.clone(),
            harness.config.clone(),
            Arc::new(ImmediateWorker(Vec::new())),
        );
        viewer.bind_document(Box::new(FakeView::new(vec![100.0], Vec::new(), vec![0])));

        viewer.draw_frame();

        assert!(harness.device.commands().is_empty());
        assert!(!viewer.is_context_ready());
    }

    #[test]
    fn textured_and_placeholder_pages_use_their_programs() {
        let harness = Harness::new(vec![0]);
        let mut viewer = harness.viewer(Vec::new());
        viewer.bind_document(Box::new(FakeView::new(
            vec![100.0, 200.0],
            Vec::new(),
            vec![0, 1],
        )));
        let resources = harness.registry.ensure_initialized(&harness.device).unwrap();
        let rendered = resources.rendered_program.unwrap();
        let unrendered = resources.unrendered_program.unwrap();

        let commands = harness.frame(&viewer);

        let background = ViewerConfig::default().background_color.with_alpha(1.0);
        let clear = position(&commands, &DrawCommand::Clear { color: background });
        let first = position(&commands, &DrawCommand::UseProgram { program: rendered });
        let texture = position(&commands, &DrawCommand::BindTexture { texture: 500 });
        let second = position(&commands, &DrawCommand::UseProgram { program: unrendered });
        assert!(clear < first && first < texture && texture < second);
        assert_eq!(draw_count(&commands), 2);
        assert_eq!(
            uploaded_quads(&commands),
            vec![
                Rect::new(0.0, 0.0, 50.0, 100.0).to_quad(),
                Rect::new(0.0, 1000.0, 50.0, 1200.0).to_quad(),
            ]
        );

        let requests = harness.textures.requests.lock();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1], TextureKey::new(DocumentId::nil(), 1, 1.0));
    }

    #[test]
    fn every_draw_uploads_its_own_quad() {
        let harness = Harness::new(vec![0, 1]);
        let mut viewer = harness.viewer(vec![SearchResult {
            rect: Rect::new(1.0, 2.0, 3.0, 4.0),
            page: 1,
        }]);
        let links = vec![
            vec![Rect::new(0.0, 0.0, 5.0, 5.0), Rect::new(10.0, 10.0, 15.0, 15.0)],
            vec![Rect::new(20.0, 20.0, 25.0, 25.0)],
        ];
        viewer.bind_document(Box::new(FakeView::new(vec![100.0, 100.0], links, vec![0, 1])));
        viewer.toggle_highlight_links();
        viewer.start_search("q");
        viewer.set_selection(vec![Rect::new(0.0, 0.0, 2.0, 2.0)]);

        let commands = harness.frame(&viewer);

        // 2 pages + 3 links + 1 search hit + 1 selection rect
        assert_eq!(draw_count(&commands), 7);
        for (index, cmd) in commands.iter().enumerate() {
            if *cmd == DrawCommand::DrawQuad {
                assert!(
                    matches!(commands[index - 1], DrawCommand::UploadQuad { .. }),
                    "draw at {index} reused a stale quad"
                );
            }
        }
    }

    #[test]
    fn overlays_follow_all_pages_in_order() {
        let harness = Harness::new(vec![0, 1]);
        let mut viewer = harness.viewer(vec![SearchResult {
            rect: Rect::new(1.0, 2.0, 3.0, 4.0),
            page: 1,
        }]);
        let links = vec![vec![Rect::new(0.0, 0.0, 5.0, 5.0)], Vec::new()];
        viewer.bind_document(Box::new(FakeView::new(vec![100.0, 100.0], links, vec![0, 1])));
        viewer.toggle_highlight_links();
        viewer.start_search("q");
        viewer.set_selection(vec![Rect::new(0.0, 0.0, 2.0, 2.0)]);

        let commands = harness.frame(&viewer);
        let config = ViewerConfig::default();
        let highlight = harness
            .registry
            .ensure_initialized(&harness.device)
            .unwrap()
            .highlight_program
            .unwrap();

        let link_color = position(
            &commands,
            &DrawCommand::UniformColor {
                location: highlight,
                color: config.link_highlight_color.0,
            },
        );
        let search_color = position(
            &commands,
            &DrawCommand::UniformColor {
                location: highlight,
                color: config.search_highlight_color.0,
            },
        );
        let text_color = position(
            &commands,
            &DrawCommand::UniformColor {
                location: highlight,
                color: config.text_highlight_color.0,
            },
        );
        let last_page = position(&commands, &DrawCommand::BindTexture { texture: 501 });
        assert!(link_color < search_color);
        assert!(last_page < search_color);
        assert!(search_color < text_color);

        let quads = uploaded_quads(&commands);
        assert_eq!(quads.len(), 5);
        assert_eq!(quads[3], Rect::new(1.0, 1002.0, 3.0, 1004.0).to_quad());
        assert_eq!(quads[4], Rect::new(1.0, 1.0, 3.0, 3.0).to_quad());
        assert_eq!(commands.last(), Some(&DrawCommand::Blending { enabled: false }));
    }

    #[test]
    fn links_are_skipped_unless_toggled() {
        let harness = Harness::new(vec![0]);
        let mut viewer = harness.viewer(Vec::new());
        let links = vec![vec![Rect::new(0.0, 0.0, 5.0, 5.0)]];
        viewer.bind_document(Box::new(FakeView::new(vec![100.0], links, vec![0])));

        assert_eq!(draw_count(&harness.frame(&viewer)), 1);
        viewer.toggle_highlight_links();
        assert_eq!(draw_count(&harness.frame(&viewer)), 2);
        viewer.toggle_highlight_links();
        assert!(!viewer.highlight_links());
        assert_eq!(draw_count(&harness.frame(&viewer)), 1);
    }

    #[test]
    fn cancelled_search_is_not_drawn() {
        let harness = Harness::new(vec![0]);
        let mut viewer = harness.viewer(vec![SearchResult {
            rect: Rect::new(1.0, 2.0, 3.0, 4.0),
            page: 0,
        }]);
        viewer.bind_document(Box::new(FakeView::new(vec![100.0], Vec::new(), vec![0])));
        viewer.start_search("q");
        assert_eq!(draw_count(&harness.frame(&viewer)), 2);

        viewer.cancel_search();

        assert_eq!(draw_count(&harness.frame(&viewer)), 1);
        assert_eq!(viewer.search_result_count(), 0);
        assert_eq!(viewer.poll_search_progress(), None);
    }

    #[test]
    fn missing_highlight_program_skips_overlays_only() {
        let device = RecordingDevice::new();
        device.fail_fragments_containing("highlight_color");
        let harness = Harness::with_device(device, vec![0]);
        let mut viewer = harness.viewer(vec![SearchResult {
            rect: Rect::new(1.0, 2.0, 3.0, 4.0),
            page: 0,
        }]);
        viewer.bind_document(Box::new(FakeView::new(
            vec![100.0],
            vec![vec![Rect::new(0.0, 0.0, 1.0, 1.0)]],
            vec![0],
        )));
        viewer.toggle_highlight_links();
        viewer.start_search("q");
        viewer.set_selection(vec![Rect::new(0.0, 0.0, 1.0, 1.0)]);

        let commands = harness.frame(&viewer);

        assert_eq!(draw_count(&commands), 1);
        assert!(!commands.contains(&DrawCommand::Blending { enabled: true }));
    }

    #[test]
    fn missing_page_programs_skip_page_draws() {
        let device = RecordingDevice::new();
        device.fail_fragments_containing("page_texture");
        device.fail_fragments_containing("vec4(1.0, 1.0, 1.0, 1.0)");
        let harness = Harness::with_device(device, vec![0]);
        let mut viewer = harness.viewer(Vec::new());
        viewer.bind_document(Box::new(FakeView::new(vec![100.0], Vec::new(), vec![0])));

        let commands = harness.frame(&viewer);

        assert_eq!(draw_count(&commands), 0);
        assert!(commands
            .iter()
            .any(|cmd| matches!(cmd, DrawCommand::Clear { .. })));
    }

    #[test]
    fn textured_page_falls_back_to_placeholder_without_rendered_program() {
        let device = RecordingDevice::new();
        device.fail_fragments_containing("page_texture");
        let harness = Harness::with_device(device, vec![0]);
        let mut viewer = harness.viewer(Vec::new());
        viewer.bind_document(Box::new(FakeView::new(vec![100.0], Vec::new(), vec![0])));

        let commands = harness.frame(&viewer);

        assert_eq!(draw_count(&commands), 1);
        assert!(!commands
            .iter()
            .any(|cmd| matches!(cmd, DrawCommand::BindTexture { .. })));
    }

    #[test]
    fn two_viewers_share_one_program_set() {
        let harness = Harness::new(Vec::new());
        let first = harness.viewer(Vec::new());
        let second = harness.viewer(Vec::new());

        assert!(first.is_context_ready() && second.is_context_ready());
        assert_eq!(harness.device.compile_calls(), 3);
    }

    #[test]
    fn resize_sets_viewport_and_notifies_view() {
        let harness = Harness::new(Vec::new());
        let mut viewer = harness.viewer(Vec::new());
        let view = FakeView::new(vec![100.0], Vec::new(), vec![0]);
        let sizes = Rc::clone(&view.sizes);
        viewer.bind_document(Box::new(view));
        harness.device.take_commands();

        viewer.on_resize(800, 600);

        assert_eq!(
            harness.device.take_commands(),
            vec![DrawCommand::Viewport {
                width: 800,
                height: 600
            }]
        );
        assert_eq!(*sizes.borrow(), vec![(800, 600)]);
    }

    #[test]
    fn goto_search_result_scrolls_bound_view() {
        let harness = Harness::new(Vec::new());
        let mut viewer = harness.viewer(vec![SearchResult {
            rect: Rect::new(0.0, 10.0, 5.0, 20.0),
            page: 1,
        }]);
        viewer.bind_document(Box::new(FakeView::new(
            vec![100.0, 200.0, 150.0],
            Vec::new(),
            vec![0],
        )));
        viewer.start_search("q");

        assert_eq!(viewer.goto_search_result(0), Some(110.0));
        assert_eq!(viewer.document_view().unwrap().offset_y(), 110.0);
    }

    #[test]
    fn search_without_document_is_ignored() {
        let harness = Harness::new(Vec::new());
        let mut viewer = harness.viewer(vec![SearchResult {
            rect: Rect::new(0.0, 10.0, 5.0, 20.0),
            page: 0,
        }]);

        viewer.start_search("q");

        assert_eq!(viewer.search_result_count(), 0);
        assert_eq!(viewer.goto_search_result(1), None);
    }

    #[test]
    fn drop_releases_only_the_private_layout() {
        let harness = Harness::new(Vec::new());
        let viewer = harness.viewer(Vec::new());
        harness.device.take_commands();

        drop(viewer);

        let commands = harness.device.take_commands();
        assert_eq!(commands.len(), 1);
        assert!(matches!(commands[0], DrawCommand::DeleteVertexLayout { .. }));
        assert!(harness.registry.is_initialized());
    }

    #[test]
    fn repeated_context_ready_is_ignored() {
        let harness = Harness::new(Vec::new());
        let mut viewer = harness.viewer(Vec::new());
        harness.device.take_commands();

        viewer.on_context_ready(Rc::clone(&harness.device));

        assert!(harness.device.take_commands().is_empty());
        assert_eq!(harness.device.compile_calls(), 3);
        assert!(viewer.is_context_ready());
    }

    #[test]
    fn unbinding_returns_frames_to_the_black_clear() {
        let harness = Harness::new(vec![0]);
        let mut viewer = harness.viewer(Vec::new());
        viewer.bind_document(Box::new(FakeView::new(vec![100.0], Vec::new(), vec![0])));
        assert_eq!(draw_count(&harness.frame(&viewer)), 1);

        assert!(viewer.unbind_document().is_some());
        let commands = harness.frame(&viewer);

        assert_eq!(draw_count(&commands), 0);
        assert!(commands.contains(&DrawCommand::Clear {
            color: [0.0, 0.0, 0.0, 1.0]
        }));
        assert!(viewer.document_view().is_none());
    }

    #[test]
    fn selection_is_replaced_and_cleared() {
        let harness = Harness::new(vec![0]);
        let mut viewer = harness.viewer(Vec::new());
        viewer.bind_document(Box::new(FakeView::new(vec![100.0], Vec::new(), vec![0])));

        viewer.set_selection(vec![
            Rect::new(0.0, 0.0, 1.0, 1.0),
            Rect::new(2.0, 2.0, 3.0, 3.0),
        ]);
        viewer.set_selection(vec![Rect::new(5.0, 5.0, 6.0, 6.0)]);
        let commands = harness.frame(&viewer);

        let quads = uploaded_quads(&commands);
        assert_eq!(quads.len(), 2);
        assert_eq!(quads[1], Rect::new(6.0, 6.0, 7.0, 7.0).to_quad());

        viewer.clear_selection();
        assert_eq!(draw_count(&harness.frame(&viewer)), 1);
    }
}
