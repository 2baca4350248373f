use std::sync::Arc;
use std::thread::{self, JoinHandle};

use anyhow::Result;
use parking_lot::Mutex;
use tracing::{debug, instrument, warn};

use crate::search::{SearchHandle, SearchRequest, SearchWorker};
use crate::{DocumentId, Rect, SearchResult};

/// Text lookup for a single page, the unit of work of [`ThreadedSearchWorker`].
pub trait PageSearcher: Send + Sync {
    /// Page count of `document`, `None` if the searcher does not know it.
    fn page_count(&self, document: DocumentId) -> Option<usize>;

    /// Bounds of every match of `query` on `page`, in page-local coordinates.
    fn search_page(&self, document: DocumentId, page: usize, query: &str) -> Result<Vec<Rect>>;
}

/// Runs each search on its own background thread, scanning from the start
/// page to the end of the document and then wrapping around to the pages
/// before it.
pub struct ThreadedSearchWorker {
    searcher: Arc<dyn PageSearcher>,
    threads: Mutex<Vec<JoinHandle<()>>>,
}

impl ThreadedSearchWorker {
    pub fn new(searcher: Arc<dyn PageSearcher>) -> Self {
        Self {
            searcher,
            threads: Mutex::new(Vec::new()),
        }
    }

    /// Blocks until every search spawned so far has returned.
    pub fn join_all(&self) {
        let threads: Vec<_> = self.threads.lock().drain(..).collect();
        for thread in threads {
            if thread.join().is_err() {
                warn!("search thread panicked");
            }
        }
    }
}

impl SearchWorker for ThreadedSearchWorker {
    fn run(&self, request: SearchRequest, handle: SearchHandle) {
        let searcher = Arc::clone(&self.searcher);
        let fallback = handle.clone();
        let spawned = thread::Builder::new()
            .name("glpdf-search".into())
            .spawn(move || {
                let _guard = FinishOnUnwind(&handle);
                scan_document(searcher.as_ref(), &request, &handle);
            });

        match spawned {
            Ok(thread) => {
                let mut threads = self.threads.lock();
                threads.retain(|t| !t.is_finished());
                threads.push(thread);
            }
            Err(err) => {
                warn!(?err, "failed to spawn search thread");
                fallback.finish();
            }
        }
    }
}

/// Finishes the session when a scan unwinds, so the search does not stay
/// running after its thread died.
struct FinishOnUnwind<'a>(&'a SearchHandle);

impl Drop for FinishOnUnwind<'_> {
    fn drop(&mut self) {
        if thread::panicking() {
            warn!("search thread panicked, finishing search");
            self.0.finish();
        }
    }
}

#[instrument(skip(searcher, handle), fields(document = %request.document))]
fn scan_document(searcher: &dyn PageSearcher, request: &SearchRequest, handle: &SearchHandle) {
    let query = request.query.trim();
    if query.is_empty() {
        handle.finish();
        return;
    }

    let Some(page_count) = searcher.page_count(request.document) else {
        warn!("search requested for an unknown document");
        handle.finish();
        return;
    };
    if page_count == 0 {
        handle.finish();
        return;
    }

    let start = request.start_page.min(page_count - 1);
    for step in 0..page_count {
        if handle.is_cancelled() {
            debug!(scanned = step, "search stopped after cancellation");
            return;
        }

        let page = (start + step) % page_count;
        match searcher.search_page(request.document, page, query) {
            Ok(rects) => {
                let results = rects.into_iter().map(|rect| SearchResult { rect, page });
                handle.extend_results(results);
            }
            Err(err) => warn!(?err, page, "failed to search page"),
        }
        handle.set_progress((step + 1) as f32 / page_count as f32);
    }

    handle.finish();
}
