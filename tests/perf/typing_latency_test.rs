use std::time::Instant;

use crate::contract::{DisplayItem, Invocation, Mode, SessionHandoff};
use crate::core_service::CoreService;

fn p95_ms(samples: &mut [f64]) -> f64 {
    samples.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let last = samples.len().saturating_sub(1);
    let idx = ((last as f64) * 0.95).round() as usize;
    samples[idx.min(last)]
}

struct UnreachableBackend;

impl crate::backend::SearchBackend for UnreachableBackend {
    fn search(
        &self,
        _query: &str,
        _opts: &crate::backend::SearchOptions,
    ) -> Result<crate::model::BackendResponse, crate::backend::BackendError> {
        panic!("typing path must not reach the backend");
    }
}

struct UnreachableFetcher;

impl crate::favicon::IconFetcher for UnreachableFetcher {
    fn fetch(&self, _domain: &str) -> Result<Vec<u8>, crate::favicon::FetchError> {
        panic!("typing path must not fetch icons");
    }
}

#[test]
fn typing_path_p95_under_5ms() {
    let service = CoreService::with_parts(
        crate::config::Config::default(),
        Box::new(crate::cache_store::MemoryStore::new()),
        Box::new(UnreachableBackend),
        Box::new(UnreachableFetcher),
        Box::new(crate::keyword_sources::StaticSources::default()),
    )
    .unwrap();

    let previous: Vec<DisplayItem> = (0..25)
        .map(|i| DisplayItem {
            title: format!("Result {i}"),
            uid: format!("https://r{i}.example/page"),
            arg: format!("https://r{i}.example/page"),
            ..Default::default()
        })
        .collect();
    let old_results = serde_json::to_string(&previous).unwrap();
    let handoff = SessionHandoff::new(Some("rust borrow checke"), Some(&old_results));
    let invocation = Invocation::new("rust borrow checker", Mode::Default, handoff);

    for _ in 0..30 {
        let _ = service.run(&invocation).unwrap();
    }

    let mut batch_p95 = Vec::with_capacity(5);
    for _ in 0..5 {
        let mut samples = Vec::with_capacity(80);
        for _ in 0..80 {
            let start = Instant::now();
            let _ = service.run(&invocation).unwrap();
            samples.push(start.elapsed().as_secs_f64() * 1000.0);
        }
        batch_p95.push(p95_ms(&mut samples));
    }

    batch_p95.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let median_p95 = batch_p95[batch_p95.len() / 2];

    assert!(
        median_p95 <= 5.0,
        "median batch p95 too high: {median_p95:.3}ms (budget 5.0ms); batches={batch_p95:?}",
    );
}
