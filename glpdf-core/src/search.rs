use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info};

use crate::{DocumentId, DocumentView, SearchResult};

#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub document: DocumentId,
    pub start_page: usize,
    pub query: String,
}

/// `run` must return promptly; the scan itself belongs on another thread.
pub trait SearchWorker: Send + Sync {
    fn run(&self, request: SearchRequest, handle: SearchHandle);
}

#[derive(Debug, Default)]
struct SearchState {
    results: Vec<SearchResult>,
    current_index: usize,
    progress: f32,
    running: bool,
    generation: u64,
}

impl SearchState {
    fn clamped_index(&self) -> Option<usize> {
        if self.results.is_empty() {
            None
        } else {
            Some(self.current_index.min(self.results.len() - 1))
        }
    }

    fn reset_view(&mut self) {
        self.results.clear();
        self.current_index = 0;
        self.progress = 0.0;
    }
}

/// State shared between the render context and a search worker. Everything
/// but the cancellation flag lives behind one lock.
#[derive(Debug, Default)]
pub struct SearchSession {
    state: Mutex<SearchState>,
    cancelled: AtomicBool,
}

impl SearchSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    pub fn result_count(&self) -> usize {
        self.state.lock().results.len()
    }

    pub fn current_index(&self) -> usize {
        self.state.lock().current_index
    }

    pub fn current_result(&self) -> Option<SearchResult> {
        self.with_current(|result| *result)
    }

    /// Runs `f` on the current result while the session lock is held.
    pub fn with_current<R>(&self, f: impl FnOnce(&SearchResult) -> R) -> Option<R> {
        let state = self.state.lock();
        let index = state.clamped_index()?;
        Some(f(&state.results[index]))
    }

    pub fn results(&self) -> Vec<SearchResult> {
        self.state.lock().results.clone()
    }

    fn begin(&self) -> u64 {
        let mut state = self.state.lock();
        state.reset_view();
        state.generation = state.generation.wrapping_add(1);
        state.running = true;
        state.generation
    }

    fn generation(&self) -> u64 {
        self.state.lock().generation
    }
}

/// Worker-side view of one search. Writes are dropped once the search is
/// cancelled or superseded by a newer `start_search`.
#[derive(Debug, Clone)]
pub struct SearchHandle {
    session: Arc<SearchSession>,
    generation: u64,
}

impl SearchHandle {
    pub fn is_cancelled(&self) -> bool {
        self.session.is_cancelled() || self.session.generation() != self.generation
    }

    pub fn push_result(&self, result: SearchResult) {
        self.extend_results(std::iter::once(result));
    }

    pub fn extend_results(&self, results: impl IntoIterator<Item = SearchResult>) {
        let mut state = self.session.state.lock();
        if self.is_live(&state) {
            state.results.extend(results);
        }
    }

    pub fn set_progress(&self, fraction: f32) {
        let mut state = self.session.state.lock();
        if self.is_live(&state) {
            state.progress = fraction.clamp(0.0, 1.0);
        }
    }

    pub fn finish(&self) {
        let mut state = self.session.state.lock();
        if self.is_live(&state) {
            state.progress = 1.0;
            state.running = false;
        }
    }

    fn is_live(&self, state: &SearchState) -> bool {
        state.generation == self.generation && !self.session.is_cancelled()
    }
}

pub struct SearchController {
    session: Arc<SearchSession>,
    worker: Arc<dyn SearchWorker>,
}

impl SearchController {
    pub fn new(worker: Arc<dyn SearchWorker>) -> Self {
        Self {
            session: Arc::new(SearchSession::new()),
            worker,
        }
    }

    pub fn session(&self) -> &Arc<SearchSession> {
        &self.session
    }

    pub fn start_search(&self, view: &dyn DocumentView, query: &str) {
        let Some(document) = view.document() else {
            return;
        };

        let generation = self.session.begin();
        self.session.cancelled.store(false, Ordering::Release);

        let request = SearchRequest {
            document: document.id(),
            start_page: view.current_page(),
            query: query.to_owned(),
        };
        info!(
            document = %request.document,
            start_page = request.start_page,
            generation,
            "starting search"
        );
        self.worker.run(
            request,
            SearchHandle {
                session: Arc::clone(&self.session),
                generation,
            },
        );
    }

    /// Progress of the running search, or `None` when idle or cancelled.
    pub fn poll_progress(&self) -> Option<f32> {
        if self.session.is_cancelled() {
            return None;
        }
        let state = self.session.state.lock();
        state.running.then_some(state.progress)
    }

    pub fn cancel(&self) {
        self.session.cancelled.store(true, Ordering::Release);
        let mut state = self.session.state.lock();
        state.reset_view();
        state.running = false;
        debug!("search cancelled");
    }

    /// Moves `offset` results forward (negative: backward), wrapping at both
    /// ends, and scrolls the view to the selected hit. Returns the new
    /// vertical offset.
    pub fn navigate(&self, view: &mut dyn DocumentView, offset: i64) -> Option<f32> {
        view.document()?;

        let result = {
            let mut state = self.session.state.lock();
            let count = state.results.len();
            if count == 0 {
                return None;
            }
            let index = wrap_index(state.current_index, offset, count);
            state.current_index = index;
            state.results[index]
        };

        let document = view.document()?;
        let offset_y = result.rect.y0 + document.accum_page_height(result.page);
        view.set_offset_y(offset_y);
        Some(offset_y)
    }

    pub fn result_count(&self) -> usize {
        self.session.result_count()
    }

    pub fn current_index(&self) -> usize {
        self.session.current_index()
    }

    pub fn current_result(&self) -> Option<SearchResult> {
        self.session.current_result()
    }
}

fn wrap_index(current: usize, offset: i64, count: usize) -> usize {
    let count = count as i128;
    (current as i128 + offset as i128).rem_euclid(count) as usize
}
