//! Progress-callback trait for per-pair report events.
//!
//! Inject an [`Arc<dyn ReportProgressCallback>`] via
//! [`crate::config::ReportConfigBuilder::progress_callback`] to follow a run
//! as it walks through the citation pairs.
//!
//! Pairs are processed in order, so events arrive in order too.
//!
//! # Example
//!
//! ```rust
//! use citation_report::{ReportConfig, ReportProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct Counter(AtomicUsize);
//!
//! impl ReportProgressCallback for Counter {
//!     fn on_pair_complete(&self, index: usize, total: usize, unavailable: usize) {
//!         self.0.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("pair {index}/{total} done, {unavailable} missing image(s)");
//!     }
//! }
//!
//! let config = ReportConfig::builder()
//!     .progress_callback(Arc::new(Counter(AtomicUsize::new(0))))
//!     .build()
//!     .unwrap();
//! ```

use crate::model::TitleSource;
use std::sync::Arc;

/// Called by the assembler as it processes each citation pair.
///
/// All methods have no-op defaults so callers only override what they need.
/// `index` is always 1-based.
pub trait ReportProgressCallback: Send + Sync {
    /// Called once after pairing, before any PDF is opened.
    fn on_run_start(&self, total_pairs: usize) {
        let _ = total_pairs;
    }

    /// Called before the first render of a pair.
    fn on_pair_start(&self, index: usize, total: usize, name: &str) {
        let _ = (index, total, name);
    }

    /// Called once the section title is known.
    fn on_title_resolved(&self, index: usize, title: &str, source: TitleSource) {
        let _ = (index, title, source);
    }

    /// Called for each image slot that ends up as a placeholder.
    fn on_page_unavailable(&self, index: usize, page: usize, reason: &str) {
        let _ = (index, page, reason);
    }

    /// Called when a pair's section is complete.
    fn on_pair_complete(&self, index: usize, total: usize, unavailable: usize) {
        let _ = (index, total, unavailable);
    }

    /// Called once after every pair has been processed.
    fn on_run_complete(&self, total_pairs: usize, unavailable_pages: usize) {
        let _ = (total_pairs, unavailable_pages);
    }
}

/// A no-op implementation, for callers that need a concrete callback value.
pub struct NoopProgressCallback;

impl ReportProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ReportConfig`].
pub type ProgressCallback = Arc<dyn ReportProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Tracking {
        starts: AtomicUsize,
        completes: AtomicUsize,
        missing: AtomicUsize,
        total: AtomicUsize,
    }

    impl ReportProgressCallback for Tracking {
        fn on_run_start(&self, total_pairs: usize) {
            self.total.store(total_pairs, Ordering::SeqCst);
        }

        fn on_pair_start(&self, _index: usize, _total: usize, _name: &str) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_page_unavailable(&self, _index: usize, _page: usize, _reason: &str) {
            self.missing.fetch_add(1, Ordering::SeqCst);
        }

        fn on_pair_complete(&self, _index: usize, _total: usize, _unavailable: usize) {
            self.completes.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_run_start(2);
        cb.on_pair_start(1, 2, "a");
        cb.on_title_resolved(1, "A", TitleSource::Model);
        cb.on_page_unavailable(1, 3, "out of range");
        cb.on_pair_complete(1, 2, 1);
        cb.on_run_complete(2, 1);
    }

    #[test]
    fn tracking_callback_through_arc_dyn() {
        let tracker = Arc::new(Tracking::default());
        let cb: ProgressCallback = tracker.clone();

        cb.on_run_start(2);
        cb.on_pair_start(1, 2, "a");
        cb.on_page_unavailable(1, 4, "broken");
        cb.on_pair_complete(1, 2, 1);
        cb.on_pair_start(2, 2, "b");
        cb.on_pair_complete(2, 2, 0);

        assert_eq!(tracker.total.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.starts.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.completes.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.missing.load(Ordering::SeqCst), 1);
    }
}
