use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use actionflow::engine::ActionOutcome;
use actionflow::exec::{ActionRequest, ActionRunner};
use tokio_util::sync::CancellationToken;

/// A fake runner that:
/// - records which actions were executed, and in which wave
/// - reports `Failed(1)` for actions listed via `fail`, `Succeeded` otherwise
/// - optionally sleeps per action, and tracks peak concurrency
/// - blocks actions listed via `hang` until the run is cancelled
#[derive(Clone, Default)]
pub struct FakeRunner {
    failing: Arc<HashSet<String>>,
    hanging: Arc<HashSet<String>>,
    panicking: Arc<HashSet<String>>,
    delay: Option<Duration>,
    executed: Arc<Mutex<Vec<(String, u64)>>>,
    in_flight: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail(mut self, name: &str) -> Self {
        Arc::make_mut(&mut self.failing).insert(name.to_string());
        self
    }

    pub fn hang(mut self, name: &str) -> Self {
        Arc::make_mut(&mut self.hanging).insert(name.to_string());
        self
    }

    pub fn panic_on(mut self, name: &str) -> Self {
        Arc::make_mut(&mut self.panicking).insert(name.to_string());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Names of executed actions, in completion-start order.
    pub fn executed(&self) -> Vec<String> {
        self.executed
            .lock()
            .unwrap()
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Wave number each executed action ran in.
    pub fn waves(&self) -> HashMap<String, u64> {
        self.executed.lock().unwrap().iter().cloned().collect()
    }

    /// Highest number of actions observed running at the same time.
    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

impl ActionRunner for FakeRunner {
    fn execute(
        &self,
        request: ActionRequest,
        cancel: CancellationToken,
    ) -> Pin<Box<dyn Future<Output = ActionOutcome> + Send + '_>> {
        Box::pin(async move {
            {
                let mut guard = self.executed.lock().unwrap();
                guard.push((request.name.clone(), request.wave));
            }

            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);

            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }

            let outcome = if self.panicking.contains(&request.name) {
                self.in_flight.fetch_sub(1, Ordering::SeqCst);
                panic!("fake runner panic for {}", request.name);
            } else if self.hanging.contains(&request.name) {
                cancel.cancelled().await;
                ActionOutcome::Cancelled
            } else if self.failing.contains(&request.name) {
                ActionOutcome::Failed(1)
            } else {
                ActionOutcome::Succeeded
            };

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            outcome
        })
    }
}
