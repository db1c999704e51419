//! Shared helpers for the integration tests.

#![allow(dead_code)]

use std::{
    sync::{
        Arc, Once,
        atomic::{AtomicUsize, Ordering},
    },
    thread,
    time::Duration,
};

use tracing_subscriber::EnvFilter;

static INIT_LOGGING: Once = Once::new();

/// Installs a test-writer subscriber once per test binary.
///
/// Honours `RUST_LOG`, defaulting to `once_guard=trace`.
pub fn init_test_logging() {
    INIT_LOGGING.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("once_guard=trace"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_thread_ids(true)
            .with_ansi(false)
            .try_init();
    });
}

/// Counter shared between a test and its actions.
#[derive(Debug, Clone, Default)]
pub struct Hits(Arc<AtomicUsize>);

impl Hits {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hit(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

/// Action sleeping for `delay` and then returning `outcome`.
pub fn delayed(delay: Duration, outcome: bool, hits: &Hits) -> impl Fn() -> bool + Send + Sync + 'static {
    let hits = hits.clone();
    move || {
        thread::sleep(delay);
        hits.hit();
        outcome
    }
}
