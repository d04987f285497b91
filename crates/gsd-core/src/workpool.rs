//! Bounded worker pool for same-kind tasks.
//!
//! One shared work queue, `workers` OS threads draining it, results funneled
//! back over a channel. Both tiers of the download pipeline (items, and
//! assets within an item) and the bench harness run on this; the
//! per-call-site pool boilerplate lives here once.

use std::collections::VecDeque;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{mpsc, Mutex};

use crate::control::CancelFlag;

/// Outcome of one task: the closure's value, or the panic message if it
/// panicked. Panics are confined to the task that raised them.
pub type TaskResult<R> = Result<R, String>;

/// Runs `f` over every task with at most `workers` running concurrently.
///
/// Results are returned as `(original_index, result)` sorted by index; when
/// `cancel` fires, queued tasks are dropped (their indices are absent from
/// the result) while tasks already claimed finish normally.
pub fn run_bounded<T, R, F>(
    tasks: Vec<T>,
    workers: usize,
    cancel: Option<&CancelFlag>,
    f: F,
) -> Vec<(usize, TaskResult<R>)>
where
    T: Send,
    R: Send,
    F: Fn(usize, T) -> R + Sync,
{
    let count = tasks.len();
    if count == 0 {
        return Vec::new();
    }
    let workers = workers.max(1).min(count);
    let work: Mutex<VecDeque<(usize, T)>> = Mutex::new(tasks.into_iter().enumerate().collect());
    let (tx, rx) = mpsc::channel::<(usize, TaskResult<R>)>();

    let mut results: Vec<(usize, TaskResult<R>)> = std::thread::scope(|scope| {
        for _ in 0..workers {
            let tx = tx.clone();
            let work = &work;
            let f = &f;
            scope.spawn(move || loop {
                if cancel.is_some_and(|c| c.is_cancelled()) {
                    break;
                }
                let Some((index, task)) = work.lock().unwrap().pop_front() else {
                    break;
                };
                let outcome = catch_unwind(AssertUnwindSafe(|| f(index, task)))
                    .map_err(|payload| panic_message(payload.as_ref()));
                let _ = tx.send((index, outcome));
            });
        }
        drop(tx);
        rx.iter().collect()
    });

    results.sort_by_key(|(index, _)| *index);
    results
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "task panicked".to_string()
    }
}
