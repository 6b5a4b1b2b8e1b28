//! Background sampling worker and the shared-state protocol.
//!
//! Two threads cooperate: the foreground (input + draw + present) and one
//! background sampler. The view bounds and the sample cache share a single
//! coarse lock: the background's "read bounds, resample" and the
//! foreground's "mutate bounds" critical sections are both short, and one
//! lock rules out ordering bugs between them. The presented surface has
//! its own lock inside [`GraphCanvas`], so presentation never contends
//! with sampling.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread;
use std::time::Duration;

use tracing::{debug, info};

use crate::canvas::GraphCanvas;
use crate::data::samples::{SampleCache, SampleRange};

/// How long the worker sleeps when no recompute is pending.
const IDLE_POLL: Duration = Duration::from_millis(25);

/// One-bit gate the foreground blocks on before drawing, so a frame is
/// never presented before at least one sampling pass has completed. The
/// condition variable wakes the waiter immediately on completion instead
/// of spinning on a flag.
struct ReadySignal {
    flag: Mutex<bool>,
    cond: Condvar,
}

impl ReadySignal {
    fn new() -> Self {
        Self {
            flag: Mutex::new(false),
            cond: Condvar::new(),
        }
    }

    fn clear(&self) {
        *self.flag.lock().expect("ready flag lock") = false;
    }

    fn set(&self) {
        *self.flag.lock().expect("ready flag lock") = true;
        self.cond.notify_all();
    }

    fn wait(&self) {
        let guard = self.flag.lock().expect("ready flag lock");
        let _guard = self
            .cond
            .wait_while(guard, |ready| !*ready)
            .expect("ready flag lock");
    }
}

/// State guarded by the coarse bounds/cache lock.
pub struct GraphState {
    pub canvas: GraphCanvas,
    pub cache: SampleCache,
}

/// Everything the foreground and the sampling worker share.
pub struct PlotShared {
    pub graph: Mutex<GraphState>,
    recompute: AtomicBool,
    cancelled: AtomicBool,
    ready: ReadySignal,
}

impl PlotShared {
    pub fn new(canvas: GraphCanvas, cache: SampleCache) -> Arc<Self> {
        Arc::new(Self {
            graph: Mutex::new(GraphState { canvas, cache }),
            recompute: AtomicBool::new(false),
            cancelled: AtomicBool::new(false),
            ready: ReadySignal::new(),
        })
    }

    /// Ask the worker to run a sampling pass against the current bounds.
    pub fn request_recompute(&self) {
        self.recompute.store(true, Ordering::Release);
    }

    /// Block until the most recent sampling pass has published samples.
    pub fn wait_ready(&self) {
        self.ready.wait();
    }

    /// Ask the worker to exit after its current iteration.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// Start the background sampling loop.
///
/// The worker consumes the recompute request, clears the ready gate,
/// samples the current expression over the bounds read under the shared
/// lock, and re-opens the gate. Samples therefore always reflect bounds
/// read no earlier than the request they answer; staleness is bounded by
/// one idle poll interval.
pub fn spawn_sampler(shared: Arc<PlotShared>) -> thread::JoinHandle<()> {
    thread::Builder::new()
        .name("funcplot-sampler".into())
        .spawn(move || {
            info!("sampling worker started");
            while !shared.is_cancelled() {
                if shared.recompute.swap(false, Ordering::AcqRel) {
                    shared.ready.clear();
                    {
                        let mut graph = shared.graph.lock().expect("graph state lock");
                        let (lo, hi) = graph.canvas.view().x_bounds();
                        let n = graph.cache.sample(SampleRange::new(lo, hi)).len();
                        debug!(lo, hi, samples = n, "sampling pass finished");
                    }
                    shared.ready.set();
                } else {
                    thread::sleep(IDLE_POLL);
                }
            }
            info!("sampling worker stopped");
        })
        .expect("spawn sampling worker")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::samples::DEFAULT_SAMPLE_COUNT;
    use crate::engine::Expression;

    fn shared_with(expr: &str) -> Arc<PlotShared> {
        let canvas = GraphCanvas::new(200, 150, (0.0, 0.0));
        let mut cache = SampleCache::new(DEFAULT_SAMPLE_COUNT);
        cache.set_current(Expression::parse(expr, &["x"]).unwrap());
        PlotShared::new(canvas, cache)
    }

    #[test]
    fn worker_publishes_samples_and_stops_on_cancel() {
        let shared = shared_with("x^2");
        let worker = spawn_sampler(Arc::clone(&shared));

        shared.request_recompute();
        shared.wait_ready();

        {
            let graph = shared.graph.lock().unwrap();
            let samples = graph.cache.samples();
            assert_eq!(samples.len(), DEFAULT_SAMPLE_COUNT);
            assert!(samples.last().unwrap().segment_end);
            let (lo, hi) = graph.canvas.view().x_bounds();
            assert!(samples.first().unwrap().x < lo);
            assert!(samples.last().unwrap().x > hi - 1e-6);
        }

        shared.cancel();
        worker.join().expect("worker exits cleanly");
    }

    #[test]
    fn bounds_mutations_are_picked_up_by_the_next_pass() {
        let shared = shared_with("x");
        let worker = spawn_sampler(Arc::clone(&shared));

        shared.request_recompute();
        shared.wait_ready();
        let first_x = shared.graph.lock().unwrap().cache.samples()[0].x;

        {
            let mut graph = shared.graph.lock().unwrap();
            graph.canvas.view_mut().pan((400.0, 0.0));
        }
        shared.request_recompute();
        // the gate may still be open from the previous pass; poll until
        // the worker has visibly consumed the new bounds
        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        loop {
            shared.wait_ready();
            let now = shared.graph.lock().unwrap().cache.samples()[0].x;
            if (now - first_x).abs() > 1.0 {
                break;
            }
            assert!(
                std::time::Instant::now() < deadline,
                "worker never observed the panned bounds"
            );
            thread::sleep(Duration::from_millis(5));
        }

        shared.cancel();
        worker.join().expect("worker exits cleanly");
    }
}
