//! Task-based background executor: a pool of worker threads consuming a
//! job queue, with per-task completion handles.

use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use std::thread::JoinHandle;
use thiserror::Error;

type Job = Box<dyn FnOnce() + Send + 'static>;

#[derive(Debug, Error)]
pub enum SpawnError {
    #[error("executor is shut down")]
    ExecutorShutDown,

    #[error("failed to spawn thread: {0}")]
    Thread(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum TaskError {
    #[error("task completed without producing a value")]
    Lost,
}

/// Completion handle for one spawned task. Independently awaitable and
/// transfers ownership of the task's return value. Dropping a handle
/// does not block; the task keeps running detached.
pub struct TaskHandle<T> {
    result: Receiver<T>,
}

impl<T> TaskHandle<T> {
    /// Block until the task finishes and take its value. `Lost` means
    /// the task died (panicked) before sending one.
    pub fn wait(self) -> Result<T, TaskError> {
        self.result.recv().map_err(|_| TaskError::Lost)
    }
}

/// Wait for every handle in a batch, discarding nothing: results come
/// back in the batch's original order.
///
/// Completion is awaited in reverse so that by the time the last-launched
/// task is done, most earlier ones already are, and the calling thread
/// sleeps roughly once instead of once per handle.
pub fn wait_all<T>(handles: Vec<TaskHandle<T>>) -> Result<Vec<T>, TaskError> {
    let mut results: Vec<Option<T>> = handles.iter().map(|_| None).collect();
    for (i, handle) in handles.into_iter().enumerate().rev() {
        results[i] = Some(handle.wait()?);
    }
    Ok(results.into_iter().flatten().collect())
}

/// Run a long-blocking function on its own named thread, off the pool,
/// so it cannot starve queued tile work while it waits.
pub fn spawn_thread<T, F>(name: &str, f: F) -> Result<TaskHandle<T>, SpawnError>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    let (tx, rx) = bounded(1);
    std::thread::Builder::new()
        .name(name.to_owned())
        .spawn(move || {
            let _ = tx.send(f());
        })?;
    Ok(TaskHandle { result: rx })
}

/// Fixed pool of worker threads executing queued jobs.
pub struct TaskPool {
    jobs: Option<Sender<Job>>,
    workers: Vec<JoinHandle<()>>,
}

impl TaskPool {
    /// Pool sized to the machine's available parallelism (fallback 4).
    pub fn new() -> Self {
        let workers = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4);
        Self::with_workers(workers)
    }

    pub fn with_workers(worker_count: usize) -> Self {
        assert!(worker_count > 0, "pool needs at least one worker");
        let (tx, rx) = unbounded::<Job>();
        let workers = (0..worker_count)
            .map(|i| {
                let jobs = rx.clone();
                std::thread::Builder::new()
                    .name(format!("tile-worker-{i}"))
                    .spawn(move || worker_loop(jobs))
                    .expect("spawn tile worker thread")
            })
            .collect();
        Self {
            jobs: Some(tx),
            workers,
        }
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Queue a task and return its completion handle.
    pub fn spawn<T, F>(&self, f: F) -> Result<TaskHandle<T>, SpawnError>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        let (tx, rx) = bounded(1);
        let job: Job = Box::new(move || {
            let _ = tx.send(f());
        });
        self.jobs
            .as_ref()
            .and_then(|jobs| jobs.send(job).ok())
            .ok_or(SpawnError::ExecutorShutDown)?;
        Ok(TaskHandle { result: rx })
    }
}

impl Default for TaskPool {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TaskPool {
    fn drop(&mut self) {
        // Closing the queue lets workers drain remaining jobs and exit.
        drop(self.jobs.take());
        for worker in self.workers.drain(..) {
            worker.join().expect("join tile worker thread");
        }
    }
}

fn worker_loop(jobs: Receiver<Job>) {
    while let Ok(job) = jobs.recv() {
        // A panicking task must not take the worker down with it; its
        // handle resolves to `Lost` when the result sender drops.
        if std::panic::catch_unwind(std::panic::AssertUnwindSafe(job)).is_err() {
            log::error!("tile task panicked");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[test]
    fn spawn_returns_the_task_value() {
        let pool = TaskPool::with_workers(2);
        let handle = pool.spawn(|| 6 * 7).expect("spawn");
        assert_eq!(handle.wait().unwrap(), 42);
    }

    #[test]
    fn handles_resolve_independently_of_launch_order() {
        let pool = TaskPool::with_workers(4);
        let handles: Vec<_> = (0..16u32)
            .map(|i| pool.spawn(move || i * i).expect("spawn"))
            .collect();

        let results = wait_all(handles).unwrap();
        assert_eq!(results, (0..16u32).map(|i| i * i).collect::<Vec<_>>());
    }

    #[test]
    fn pool_runs_every_queued_job_before_shutdown() {
        let counter = Arc::new(AtomicU32::new(0));
        {
            let pool = TaskPool::with_workers(2);
            let mut handles = Vec::new();
            for _ in 0..64 {
                let counter = Arc::clone(&counter);
                handles.push(
                    pool.spawn(move || {
                        counter.fetch_add(1, Ordering::Relaxed);
                    })
                    .expect("spawn"),
                );
            }
            wait_all(handles).unwrap();
        }
        assert_eq!(counter.load(Ordering::Relaxed), 64);
    }

    #[test]
    fn dropping_a_handle_does_not_cancel_or_block() {
        let counter = Arc::new(AtomicU32::new(0));
        let pool = TaskPool::with_workers(1);
        {
            let counter = Arc::clone(&counter);
            let _dropped = pool.spawn(move || {
                counter.fetch_add(1, Ordering::Relaxed);
            });
        }
        // A later task on the same single worker proves the dropped one ran.
        let fence = pool.spawn(|| ()).expect("spawn");
        fence.wait().unwrap();
        assert_eq!(counter.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn panicking_task_reports_lost() {
        let pool = TaskPool::with_workers(2);
        let handle: TaskHandle<u32> = pool.spawn(|| panic!("kernel bug")).expect("spawn");
        assert!(matches!(handle.wait(), Err(TaskError::Lost)));
    }

    #[test]
    fn dedicated_thread_runs_outside_the_pool() {
        let handle = spawn_thread("launcher-test", || "done").expect("spawn thread");
        assert_eq!(handle.wait().unwrap(), "done");
    }
}
