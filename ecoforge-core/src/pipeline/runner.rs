//! Fixed-size worker pool over scoped threads.
//!
//! Tasks are partitioned statically: worker `w` takes tasks `w, w + N, w + 2N, …`.
//! Each worker builds its own state once through the initializer and sends one
//! outcome per task on a shared channel. A panicking task only loses that task; a
//! worker that dies loses the tasks it had not reached yet.

use std::any::Any;
use std::collections::BTreeMap;
use std::num::NonZeroUsize;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc;
use std::thread;
use tracing::{debug, error};

/// Outcome of one task, `Err` holding the panic message of a failed worker.
pub type TaskOutcome<R> = Result<R, String>;

/// `max(available cores − 1, 1)` unless overridden.
pub fn worker_count(requested: Option<usize>) -> usize {
    match requested {
        Some(n) => n.max(1),
        None => thread::available_parallelism()
            .map(NonZeroUsize::get)
            .unwrap_or(1)
            .saturating_sub(1)
            .max(1),
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        String::from("worker panicked")
    }
}

/// Runs `work` over every task and returns the outcomes in task order.
pub fn run_pool<T, S, R, I, W>(tasks: &[T], workers: usize, init: I, work: W) -> Vec<TaskOutcome<R>>
where
    T: Sync,
    R: Send,
    I: Fn() -> S + Sync,
    W: Fn(&mut S, &T) -> R + Sync,
{
    let workers = workers.clamp(1, tasks.len().max(1));
    let (sender, receiver) = mpsc::channel::<(usize, TaskOutcome<R>)>();

    thread::scope(|scope| {
        let handles: Vec<_> = (0..workers)
            .map(|worker| {
                let sender = sender.clone();
                let init = &init;
                let work = &work;
                scope.spawn(move || {
                    let mut state = init();
                    for (index, task) in tasks.iter().enumerate().skip(worker).step_by(workers) {
                        let outcome = panic::catch_unwind(AssertUnwindSafe(|| work(&mut state, task)))
                            .map_err(panic_message);
                        if sender.send((index, outcome)).is_err() {
                            break;
                        }
                    }
                    debug!(worker, "worker done");
                })
            })
            .collect();

        for (worker, handle) in handles.into_iter().enumerate() {
            if let Err(payload) = handle.join() {
                error!(worker, reason = %panic_message(payload), "worker stopped early");
            }
        }
    });
    drop(sender);

    let mut outcomes: BTreeMap<usize, TaskOutcome<R>> = receiver.into_iter().collect();
    (0..tasks.len())
        .map(|index| {
            outcomes
                .remove(&index)
                .unwrap_or_else(|| Err(String::from("worker stopped before reaching this task")))
        })
        .collect()
}
