pub mod assembler;
pub mod backend;
pub mod cache_store;
pub mod config;
pub mod contract;
pub mod core_service;
pub mod debounce;
pub mod favicon;
pub mod instant_answer;
pub mod keyword_cache;
pub mod keyword_sources;
pub mod logging;
pub mod model;
pub mod response_cache;
pub mod runtime;
pub mod selection;
pub mod suppression;

#[cfg(test)]
mod tests {
    mod typing_latency_test {
        include!(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/../../tests/perf/typing_latency_test.rs"
        ));
    }
}
