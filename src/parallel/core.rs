use std::fmt::Display;
use std::panic::{self, AssertUnwindSafe};

use crossbeam::channel::{Receiver, Sender, bounded};

use super::error::RunnerError;
use super::outcome::{TaskFailure, TaskOutcome};
use super::policy::{WorkerCount, WorkerPolicy};

/// Snapshot handed to a progress reporter after each completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
    /// Slot that finished the most recent item.
    pub worker_id: usize,
}

/// Bounded parallel task runner.
///
/// Spawns one scoped thread per worker slot. Each worker pulls the next item
/// as soon as it finishes the current one, so a slow item only ever holds its
/// own slot. Results travel back over a channel to a single collector on the
/// calling thread and are returned in completion order.
#[derive(Debug, Clone)]
pub struct ParallelRunner {
    workers: WorkerCount,
}

/// Per-thread state, kept in one struct to avoid long parameter lists.
struct WorkerContext<'f, T, R, F> {
    worker_id: usize,
    work_rx: Receiver<T>,
    result_tx: Sender<TaskOutcome<T, R>>,
    worker_fn: &'f F,
}

impl ParallelRunner {
    /// Fails with `InvalidConfiguration` when `max_workers` is zero.
    pub fn new(max_workers: usize) -> Result<Self, RunnerError> {
        Ok(Self::with_workers(WorkerCount::new(max_workers)?))
    }

    pub fn with_workers(workers: WorkerCount) -> Self {
        Self { workers }
    }

    pub fn from_policy(policy: &WorkerPolicy) -> Result<Self, RunnerError> {
        Ok(Self::with_workers(policy.resolve()?))
    }

    #[inline]
    pub fn workers(&self) -> usize {
        self.workers.get()
    }

    /// Run `worker_fn` over every item, at most `workers()` at a time.
    ///
    /// Every item comes back exactly once. Errors and panics from `worker_fn`
    /// are recorded on that item's outcome and never stop the batch.
    pub fn run<T, R, E, F>(
        &self,
        items: Vec<T>,
        worker_fn: F,
    ) -> Result<Vec<TaskOutcome<T, R>>, RunnerError>
    where
        T: Send,
        R: Send,
        E: Display,
        F: Fn(&T) -> Result<R, E> + Sync,
    {
        self.run_with_progress(items, worker_fn, None::<fn(Progress)>)
    }

    /// Same as [`run`](Self::run), calling `reporter` on the calling thread
    /// after each completed item.
    pub fn run_with_progress<T, R, E, F, P>(
        &self,
        items: Vec<T>,
        worker_fn: F,
        reporter: Option<P>,
    ) -> Result<Vec<TaskOutcome<T, R>>, RunnerError>
    where
        T: Send,
        R: Send,
        E: Display,
        F: Fn(&T) -> Result<R, E> + Sync,
        P: FnMut(Progress),
    {
        if items.is_empty() {
            return Ok(Vec::new());
        }

        let total_items = items.len();
        let actual_workers = std::cmp::min(self.workers.get(), total_items);
        // Sized by the threads actually spawned; the cap itself is unbounded.
        let buffer_size = actual_workers.saturating_mul(2);
        let (work_tx, work_rx): (Sender<T>, Receiver<T>) = bounded(buffer_size);
        let (result_tx, result_rx): (Sender<TaskOutcome<T, R>>, Receiver<TaskOutcome<T, R>>) =
            bounded(buffer_size);
        let worker_fn = &worker_fn;

        crossbeam::thread::scope(|s| {
            for worker_id in 0..actual_workers {
                let ctx = WorkerContext {
                    worker_id,
                    work_rx: work_rx.clone(),
                    result_tx: result_tx.clone(),
                    worker_fn,
                };
                s.spawn(move |_| worker_thread(ctx));
            }

            // Producer: feeds the bounded work channel, blocking while all slots are busy.
            s.spawn(move |_| {
                for item in items {
                    if work_tx.send(item).is_err() {
                        break;
                    }
                }
            });

            // Only worker clones may keep the channels open.
            drop(work_rx);
            drop(result_tx);

            collect_results(result_rx, total_items, reporter)
        })
        .map_err(|_| RunnerError::WorkerPanicked)
    }
}

fn worker_thread<T, R, E, F>(ctx: WorkerContext<'_, T, R, F>)
where
    E: Display,
    F: Fn(&T) -> Result<R, E>,
{
    while let Ok(item) = ctx.work_rx.recv() {
        let result = match panic::catch_unwind(AssertUnwindSafe(|| (ctx.worker_fn)(&item))) {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(TaskFailure::new(e.to_string())),
            Err(payload) => Err(TaskFailure::from_panic(payload)),
        };

        let outcome = TaskOutcome {
            item,
            worker_id: ctx.worker_id,
            result,
        };
        if ctx.result_tx.send(outcome).is_err() {
            break; // collector gone
        }
    }
}

fn collect_results<T, R, P>(
    result_rx: Receiver<TaskOutcome<T, R>>,
    total_items: usize,
    mut reporter: Option<P>,
) -> Vec<TaskOutcome<T, R>>
where
    P: FnMut(Progress),
{
    let mut results = Vec::with_capacity(total_items);

    while let Ok(outcome) = result_rx.recv() {
        let worker_id = outcome.worker_id;
        results.push(outcome);

        if let Some(report) = reporter.as_mut() {
            report(Progress {
                completed: results.len(),
                total: total_items,
                worker_id,
            });
        }
        if results.len() >= total_items {
            break;
        }
    }

    results
}

/// Run a batch with an optional explicit worker cap.
///
/// `None` resolves the cap with the default [`WorkerPolicy`] (75% of the
/// processing units, at least one). `Some(0)` fails before any task starts.
pub fn run<T, R, E, F>(
    items: Vec<T>,
    worker_fn: F,
    max_workers: Option<usize>,
) -> Result<Vec<TaskOutcome<T, R>>, RunnerError>
where
    T: Send,
    R: Send,
    E: Display,
    F: Fn(&T) -> Result<R, E> + Sync,
{
    let workers = match max_workers {
        Some(count) => WorkerCount::new(count)?,
        None => WorkerPolicy::default().resolve()?,
    };
    ParallelRunner::with_workers(workers).run(items, worker_fn)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam::channel::unbounded;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    fn double(x: &u32) -> Result<u32, String> {
        Ok(x * 2)
    }

    #[test]
    fn empty_input_returns_empty_output() {
        let results = run(Vec::<u32>::new(), double, Some(4)).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn every_item_produces_one_outcome() {
        let items: Vec<u32> = (0..57).collect();
        let results = run(items, |x: &u32| {
            if x % 3 == 0 {
                Err(format!("{x} is divisible by three"))
            } else {
                Ok(*x)
            }
        }, Some(5))
        .unwrap();

        assert_eq!(results.len(), 57);
        let mut seen: Vec<u32> = results.iter().map(|o| o.item).collect();
        seen.sort();
        assert_eq!(seen, (0..57).collect::<Vec<_>>());
        assert_eq!(results.iter().filter(|o| !o.is_success()).count(), 19);
    }

    #[test]
    fn failing_item_is_isolated() {
        let items = vec!["good1", "bad", "good2"];
        let results = run(items, |s: &&str| {
            if *s == "bad" {
                Err("bad input")
            } else {
                Ok(s.len())
            }
        }, Some(2))
        .unwrap();

        let failures: Vec<_> = results.iter().filter(|o| !o.is_success()).collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].item, "bad");
        assert_eq!(failures[0].failure().unwrap().message, "bad input");
        assert_eq!(results.iter().filter(|o| o.is_success()).count(), 2);
    }

    #[test]
    fn panicking_item_is_isolated() {
        let results = run(vec![1_u32, 2, 3], |x: &u32| -> Result<u32, String> {
            if *x == 2 {
                panic!("cannot handle two");
            }
            Ok(*x)
        }, Some(3))
        .unwrap();

        assert_eq!(results.len(), 3);
        let failure = results
            .iter()
            .find(|o| o.item == 2)
            .and_then(|o| o.failure())
            .unwrap();
        assert!(failure.panicked);
        assert!(failure.message.contains("cannot handle two"));
    }

    #[test]
    fn zero_workers_is_rejected_without_running_anything() {
        let calls = AtomicUsize::new(0);
        let result = run(vec![1_u32, 2, 3], |x: &u32| {
            calls.fetch_add(1, Ordering::SeqCst);
            double(x)
        }, Some(0));

        assert!(matches!(result, Err(RunnerError::InvalidConfiguration(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(ParallelRunner::new(0).is_err());
    }

    #[test]
    fn concurrency_never_exceeds_cap() {
        for cap in [1_usize, 2, 3, 7] {
            let active = AtomicUsize::new(0);
            let high_water = AtomicUsize::new(0);

            let results = run((0..40).collect::<Vec<u32>>(), |x: &u32| {
                let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                high_water.fetch_max(now, Ordering::SeqCst);
                thread::sleep(Duration::from_millis(2));
                active.fetch_sub(1, Ordering::SeqCst);
                double(x)
            }, Some(cap))
            .unwrap();

            assert_eq!(results.len(), 40);
            assert!(high_water.load(Ordering::SeqCst) <= cap);
        }
    }

    #[test]
    fn slow_item_does_not_block_other_slots() {
        // Item 0 holds its slot until every other item has finished, which
        // only happens if the second slot keeps refilling meanwhile.
        let (release_tx, release_rx) = unbounded::<()>();
        let finished = AtomicUsize::new(0);
        let mut items = vec![0_u32];
        items.extend(1..=10);

        let runner = ParallelRunner::new(2).unwrap();
        let results = runner
            .run(items, |x: &u32| -> Result<u32, String> {
                if *x == 0 {
                    return release_rx
                        .recv_timeout(Duration::from_secs(30))
                        .map(|_| 0)
                        .map_err(|_| "other slot never drained the queue".to_string());
                }
                if finished.fetch_add(1, Ordering::SeqCst) + 1 == 10 {
                    let _ = release_tx.send(());
                }
                Ok(*x)
            })
            .unwrap();

        assert_eq!(results.len(), 11);
        let slow = results.iter().find(|o| o.item == 0).unwrap();
        assert!(slow.is_success(), "{:?}", slow.failure());
        assert_eq!(finished.load(Ordering::SeqCst), 10);
    }

    #[test]
    fn results_arrive_in_completion_order() {
        // Each gated item is released by the collector only after the
        // previous completion was recorded.
        let (first_done_tx, first_done_rx) = unbounded::<()>();
        let (second_done_tx, second_done_rx) = unbounded::<()>();
        let mut releases = vec![first_done_tx, second_done_tx].into_iter();

        let runner = ParallelRunner::new(3).unwrap();
        let results = runner
            .run_with_progress(
                vec!["third", "first", "second"],
                |name: &&str| -> Result<(), String> {
                    let gate = match *name {
                        "second" => Some(&first_done_rx),
                        "third" => Some(&second_done_rx),
                        _ => None,
                    };
                    if let Some(gate) = gate {
                        gate.recv_timeout(Duration::from_secs(30))
                            .map_err(|e| e.to_string())?;
                    }
                    Ok(())
                },
                Some(|_: Progress| {
                    if let Some(release) = releases.next() {
                        let _ = release.send(());
                    }
                }),
            )
            .unwrap();

        let order: Vec<&str> = results.iter().map(|o| o.item).collect();
        assert_eq!(order, vec!["first", "second", "third"]);
        assert!(results.iter().all(|o| o.is_success()));
    }

    #[test]
    fn huge_worker_cap_is_used_without_preallocating() {
        for cap in [usize::MAX, 1_usize << 40] {
            let results = run(vec![1_u32, 2, 3], double, Some(cap)).unwrap();
            assert_eq!(results.len(), 3);
            assert!(results.iter().all(|o| o.worker_id < 3));
        }
        let runner = ParallelRunner::new(usize::MAX).unwrap();
        assert_eq!(runner.workers(), usize::MAX);
    }

    #[test]
    fn progress_reporter_sees_every_completion() {
        let runner = ParallelRunner::new(4).unwrap();
        let mut seen = Vec::new();
        let results = runner
            .run_with_progress(
                (0..12).collect::<Vec<u32>>(),
                double,
                Some(|p: Progress| seen.push(p)),
            )
            .unwrap();

        assert_eq!(results.len(), 12);
        assert_eq!(seen.len(), 12);
        assert_eq!(seen.last().unwrap().completed, 12);
        assert!(seen.iter().all(|p| p.total == 12 && p.worker_id < 4));
    }

    #[test]
    fn worker_fn_may_borrow_from_caller() {
        let suffix = String::from("-done");
        let results = run(vec!["a".to_string(), "b".to_string()], |s: &String| {
            Ok::<_, String>(format!("{s}{suffix}"))
        }, None)
        .unwrap();

        let mut values: Vec<String> = results.into_iter().filter_map(|o| o.result.ok()).collect();
        values.sort();
        assert_eq!(values, vec!["a-done", "b-done"]);
    }

    #[test]
    fn more_workers_than_items_is_fine() {
        let runner = ParallelRunner::new(32).unwrap();
        let results = runner.run(vec![1_u32, 2], double).unwrap();
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|o| o.worker_id < 2));
    }
}
