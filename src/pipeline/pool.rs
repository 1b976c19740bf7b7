//! Fixed-size worker pool
//!
//! A feeder task pushes items into a bounded work queue; `concurrency`
//! workers share the receiving end and each process one item at a time to
//! completion. Results go out through a bounded channel, so a slow consumer
//! makes finished workers wait instead of piling results up in memory.
//!
//! Every item runs in its own task. If that task panics, the worker stays
//! alive and delivers the caller's fallback result for the item instead, so
//! each submitted item still yields exactly one result.
//!
//! Cancelling the pool's token stops the feeder, which closes the work
//! queue. Workers finish the item they hold, then exit instead of waiting for
//! more work.

use std::future::Future;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Counts reported once every worker has exited
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolReport {
    /// Items handed to the work queue
    pub submitted: usize,

    /// Items whose result was delivered to the result channel
    pub completed: usize,

    /// Items whose task panicked and were answered with the fallback result
    pub panicked: usize,
}

/// A running pool
pub struct PoolRun<R> {
    /// One result per completed item, in completion order
    pub results: mpsc::Receiver<R>,

    /// Cancel to stop handing out new work
    pub shutdown: CancellationToken,

    /// Resolves after the feeder and all workers have exited
    pub join: JoinHandle<PoolReport>,
}

/// Bounded pool of identical workers
#[derive(Debug, Clone)]
pub struct WorkerPool {
    concurrency: usize,
    queue_capacity: usize,
    result_capacity: usize,
}

impl WorkerPool {
    /// Creates a pool with `concurrency` workers (at least one)
    pub fn new(concurrency: usize) -> Self {
        let concurrency = concurrency.max(1);
        Self {
            concurrency,
            queue_capacity: concurrency * 2,
            result_capacity: concurrency * 2,
        }
    }

    /// Overrides the result channel capacity
    pub fn with_result_capacity(mut self, capacity: usize) -> Self {
        self.result_capacity = capacity.max(1);
        self
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Starts processing `items` with `work`
    ///
    /// Must be called from within a Tokio runtime. The returned receiver
    /// closes once every worker has exited.
    ///
    /// # Arguments
    ///
    /// * `items` - Work items, fed to the workers in order
    /// * `work` - Produces the result of one item
    /// * `on_panic` - Produces the result of an item whose `work` panicked
    pub fn run<I, T, R, F, Fut, P>(&self, items: I, work: F, on_panic: P) -> PoolRun<R>
    where
        I: IntoIterator<Item = T> + Send + 'static,
        I::IntoIter: Send,
        T: Clone + Send + 'static,
        R: Send + 'static,
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        P: Fn(T) -> R + Send + Sync + 'static,
    {
        let shutdown = CancellationToken::new();
        let (work_tx, work_rx) = mpsc::channel::<T>(self.queue_capacity);
        let (result_tx, result_rx) = mpsc::channel::<R>(self.result_capacity);

        let feeder = {
            let shutdown = shutdown.clone();
            tokio::spawn(async move {
                let mut submitted = 0usize;
                for item in items {
                    tokio::select! {
                        _ = shutdown.cancelled() => {
                            tracing::debug!("Pool shutdown, stopped feeding after {} items", submitted);
                            break;
                        }
                        sent = work_tx.send(item) => {
                            if sent.is_err() {
                                break;
                            }
                            submitted += 1;
                        }
                    }
                }
                // work_tx is dropped here, closing the queue
                submitted
            })
        };

        let work_rx = Arc::new(Mutex::new(work_rx));
        let work = Arc::new(work);
        let on_panic = Arc::new(on_panic);
        let mut workers = Vec::with_capacity(self.concurrency);

        for worker_id in 0..self.concurrency {
            let work_rx = Arc::clone(&work_rx);
            let result_tx = result_tx.clone();
            let work = Arc::clone(&work);
            let on_panic = Arc::clone(&on_panic);
            let shutdown = shutdown.clone();

            workers.push(tokio::spawn(async move {
                let mut completed = 0usize;
                let mut panicked = 0usize;
                loop {
                    let item = {
                        let mut rx = work_rx.lock().await;
                        tokio::select! {
                            _ = shutdown.cancelled() => {
                                rx.close();
                                None
                            }
                            item = rx.recv() => item,
                        }
                    };

                    let Some(item) = item else {
                        break;
                    };

                    let task = {
                        let work = Arc::clone(&work);
                        let item = item.clone();
                        tokio::spawn(async move { work(item).await })
                    };

                    let result = match task.await {
                        Ok(result) => result,
                        Err(e) => {
                            tracing::error!("Worker {}: item task failed: {}", worker_id, e);
                            panicked += 1;
                            on_panic(item)
                        }
                    };

                    if result_tx.send(result).await.is_err() {
                        tracing::debug!("Worker {}: result receiver dropped", worker_id);
                        break;
                    }
                    completed += 1;
                }
                (completed, panicked)
            }));
        }

        drop(result_tx);

        let join = tokio::spawn(async move {
            let submitted = feeder.await.unwrap_or_else(|e| {
                tracing::error!("Feeder task failed: {}", e);
                0
            });

            let mut completed = 0;
            let mut panicked = 0;
            for worker in workers {
                match worker.await {
                    Ok((done, failed)) => {
                        completed += done;
                        panicked += failed;
                    }
                    Err(e) => tracing::error!("Worker task failed: {}", e),
                }
            }

            PoolReport {
                submitted,
                completed,
                panicked,
            }
        });

        PoolRun {
            results: result_rx,
            shutdown,
            join,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_every_item_yields_one_result() {
        let pool = WorkerPool::new(4);
        let mut run = pool.run(0..100usize, |n| async move { n * 2 }, |_| 0);

        let mut results = Vec::new();
        while let Some(r) = run.results.recv().await {
            results.push(r);
        }
        results.sort_unstable();

        assert_eq!(results, (0..100).map(|n| n * 2).collect::<Vec<_>>());
        let report = run.join.await.unwrap();
        assert_eq!(
            report,
            PoolReport {
                submitted: 100,
                completed: 100,
                panicked: 0
            }
        );
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded() {
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let pool = WorkerPool::new(3);
        let mut run = {
            let active = Arc::clone(&active);
            let peak = Arc::clone(&peak);
            pool.run(
                0..12usize,
                move |_| {
                    let active = Arc::clone(&active);
                    let peak = Arc::clone(&peak);
                    async move {
                        let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                        peak.fetch_max(now, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(20)).await;
                        active.fetch_sub(1, Ordering::SeqCst);
                    }
                },
                |_| (),
            )
        };

        let mut count = 0;
        while run.results.recv().await.is_some() {
            count += 1;
        }

        assert_eq!(count, 12);
        assert!(peak.load(Ordering::SeqCst) <= 3);
    }

    #[tokio::test]
    async fn test_shutdown_lets_idle_workers_exit() {
        let pool = WorkerPool::new(2).with_result_capacity(1);
        let mut run = pool.run(
            0..1000usize,
            |n| async move {
                tokio::time::sleep(Duration::from_millis(5)).await;
                n
            },
            |n| n,
        );

        // Take a couple of results, then stop
        assert!(run.results.recv().await.is_some());
        run.shutdown.cancel();
        while run.results.recv().await.is_some() {}

        let report = tokio::time::timeout(Duration::from_secs(5), run.join)
            .await
            .expect("pool did not shut down")
            .unwrap();
        assert!(report.submitted < 1000);
        assert!(report.completed <= report.submitted);
    }

    #[tokio::test]
    async fn test_panicking_item_yields_fallback_result() {
        let pool = WorkerPool::new(2);
        let mut run = pool.run(
            0..10usize,
            |n| async move {
                if n == 3 {
                    panic!("item {} exploded", n);
                }
                Ok::<usize, usize>(n)
            },
            |n| Err(n),
        );

        let mut ok = Vec::new();
        let mut failed = Vec::new();
        while let Some(result) = run.results.recv().await {
            match result {
                Ok(n) => ok.push(n),
                Err(n) => failed.push(n),
            }
        }
        ok.sort_unstable();

        assert_eq!(failed, vec![3]);
        assert_eq!(ok, vec![0, 1, 2, 4, 5, 6, 7, 8, 9]);

        let report = run.join.await.unwrap();
        assert_eq!(
            report,
            PoolReport {
                submitted: 10,
                completed: 10,
                panicked: 1
            }
        );
    }
}
