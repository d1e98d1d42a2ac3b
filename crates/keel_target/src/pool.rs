//! Fixed-size worker pool with cooperative cancellation.
//!
//! Workers pop cases from a FIFO queue and push results over a channel. A
//! user interrupt flips the cancellation flag: workers finish their in-flight
//! case and stop picking up new work, and the pool is always joined.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc, Mutex};

/// Cancellation flag shared between the interrupt handler and the workers.
#[derive(Clone)]
pub struct CancelFlag {
    cancelled: Arc<AtomicBool>,
}

impl CancelFlag {
    /// A flag that is never set externally; for non-interactive use.
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// A flag wired to Ctrl-C. Installing the process handler can only
    /// happen once; later calls still return a working (if unwired) flag.
    pub fn for_interrupts() -> Self {
        let flag = Self::new();
        let cancelled = flag.cancelled.clone();
        let _ = ctrlc::set_handler(move || cancelled.store(true, Ordering::SeqCst));
        flag
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }
}

impl Default for CancelFlag {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs `work` over `items` on `jobs` worker threads.
///
/// Results arrive in completion order. On cancellation the remaining queue
/// is abandoned, in-flight items complete, and all workers are joined before
/// this returns; the caller decides what cancellation means.
pub fn run_pool<T, R, F>(items: Vec<T>, jobs: usize, cancel: &CancelFlag, work: F) -> Vec<R>
where
    T: Send,
    R: Send,
    F: Fn(T) -> R + Sync,
{
    let jobs = jobs.max(1);
    let queue: Mutex<VecDeque<T>> = Mutex::new(items.into());
    let (tx, rx) = mpsc::channel();
    std::thread::scope(|scope| {
        for _ in 0..jobs {
            let tx = tx.clone();
            let queue = &queue;
            let work = &work;
            let cancel = cancel.clone();
            scope.spawn(move || loop {
                if cancel.is_cancelled() {
                    break;
                }
                let item = {
                    let mut queue = queue.lock().unwrap_or_else(|p| p.into_inner());
                    queue.pop_front()
                };
                let Some(item) = item else { break };
                if tx.send(work(item)).is_err() {
                    break;
                }
            });
        }
        drop(tx);
    });
    rx.into_iter().collect()
}
