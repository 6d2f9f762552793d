//! Overlapping search tests.
//!
//! Searches on one identity are not de-duplicated: every call invokes the
//! search operation, the last to settle wins, and the first to settle lowers
//! the loading flag while the other is still in flight. These tests pin that
//! behavior with oneshot gates so the interleaving is deterministic.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta};
use parking_lot::Mutex;
use tokio::sync::oneshot;
use tokio::task::yield_now;

use cachet_cell::CellRegistry;
use cachet_content::{ContentFactory, ContentSearch, SearchContext, SearchError};
use cachet_core_plugins::{Clock, MockClock};

type Outcome = Result<Vec<String>, SearchError>;

/// Search whose calls settle only when the test releases them, in call order
/// of the gates handed in.
#[derive(Clone)]
struct GatedSearch {
    calls: Arc<AtomicUsize>,
    gates: Arc<Mutex<VecDeque<oneshot::Receiver<Outcome>>>>,
}

impl GatedSearch {
    fn new(gates: Vec<oneshot::Receiver<Outcome>>) -> Self {
        Self {
            calls: Arc::new(AtomicUsize::new(0)),
            gates: Arc::new(Mutex::new(gates.into())),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContentSearch<Vec<String>, &'static str> for GatedSearch {
    async fn search(&self, _ctx: &SearchContext, _label: &'static str) -> Outcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.gates.lock().pop_front().expect("more calls than gates");
        gate.await.unwrap_or_else(|_| Err(SearchError::new("gate dropped")))
    }
}

fn gated_factory(gated: &GatedSearch) -> ContentFactory<Vec<String>, &'static str> {
    ContentFactory::new(CellRegistry::new(), gated.clone())
}

fn labels(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

async fn wait_until(condition: impl Fn() -> bool) {
    while !condition() {
        yield_now().await;
    }
}

#[tokio::test]
async fn overlapping_searches_last_settled_wins() {
    let (release_first, first_gate) = oneshot::channel();
    let (release_second, second_gate) = oneshot::channel();
    let gated = GatedSearch::new(vec![first_gate, second_gate]);
    let mock = Arc::new(MockClock::at_millis(1_000));

    let factory = gated_factory(&gated).with_clock(Clock::with_provider(mock.clone()));
    let header = factory.use_content("productList", 0).unwrap();
    let grid = factory.use_content("productList", 0).unwrap();
    let loading = header.loading();
    let content = header.content();
    let stamp = header.cache_timestamp();

    let driver = async {
        wait_until(|| gated.calls() == 2).await;
        assert!(loading.get());

        release_second.send(Ok(labels(&["second"]))).unwrap();
        wait_until(|| !content.get().is_empty()).await;
        assert_eq!(content.get(), labels(&["second"]));
        assert!(
            !loading.get(),
            "the first settle lowers the flag while the other call is pending"
        );

        mock.advance(TimeDelta::milliseconds(500));
        release_first.send(Ok(labels(&["first"]))).unwrap();
    };

    tokio::join!(header.search("first"), grid.search("second"), driver);

    assert_eq!(gated.calls(), 2);
    assert_eq!(content.get(), labels(&["first"]));
    assert_eq!(stamp.get(), DateTime::from_timestamp_millis(1_500));
    assert!(!loading.get());
}

#[tokio::test]
async fn late_failure_overrides_error_but_keeps_content() {
    let (release_first, first_gate) = oneshot::channel();
    let (release_second, second_gate) = oneshot::channel();
    let gated = GatedSearch::new(vec![first_gate, second_gate]);

    let factory = gated_factory(&gated);
    let products = factory.use_content("productList", 0).unwrap();
    let content = products.content();
    let error = products.error();

    let driver = async {
        wait_until(|| gated.calls() == 2).await;
        release_second.send(Ok(labels(&["fresh"]))).unwrap();
        wait_until(|| !content.get().is_empty()).await;
        release_first
            .send(Err(SearchError::new("stale replica")))
            .unwrap();
    };

    tokio::join!(products.search("a"), products.force_search("b"), driver);

    assert_eq!(content.get(), labels(&["fresh"]));
    assert_eq!(error.get().search.unwrap().message(), "stale replica");
    assert!(!products.loading().get());
}

#[tokio::test]
async fn search_started_after_settle_hits_cache() {
    let (release, gate) = oneshot::channel();
    let gated = GatedSearch::new(vec![gate]);

    let factory = gated_factory(&gated);
    let products = factory.use_content("productList", 60_000).unwrap();

    release.send(Ok(labels(&["only"]))).unwrap();
    products.search("a").await;
    products.search("b").await;

    assert_eq!(gated.calls(), 1);
    assert_eq!(products.content().get(), labels(&["only"]));
}

#[tokio::test]
async fn loading_is_shared_across_consumers() {
    let (release, gate) = oneshot::channel();
    let gated = GatedSearch::new(vec![gate]);

    let factory = gated_factory(&gated);
    let header = factory.use_content("productList", 0).unwrap();
    let grid = factory.use_content("productList", 0).unwrap();
    let grid_loading = grid.loading();

    let driver = async {
        wait_until(|| gated.calls() == 1).await;
        assert!(grid_loading.get(), "grid sees the header's fetch in flight");
        release.send(Ok(labels(&["x"]))).unwrap();
    };

    tokio::join!(header.search("a"), driver);

    assert!(!grid_loading.get());
    assert_eq!(grid.content().get(), labels(&["x"]));
}
