use crate::common::error::{PipelineError, PipelineResult};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::debug;

/// Bounded admission queue shared by every request.
///
/// Backed by a tokio [`Semaphore`], which hands out permits in the order they
/// were requested, so admission is first-submitted, first-admitted.
#[derive(Clone, Debug)]
pub struct WorkerPool {
    name: &'static str,
    capacity: usize,
    semaphore: Arc<Semaphore>,
}

impl WorkerPool {
    pub fn new(name: &'static str, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            name,
            capacity,
            semaphore: Arc::new(Semaphore::new(capacity)),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Slots currently held.
    pub fn active(&self) -> usize {
        self.capacity - self.semaphore.available_permits()
    }

    /// Waits for a slot, then runs `task` while holding it.
    pub async fn run<F, T>(&self, task: F) -> PipelineResult<T>
    where
        F: Future<Output = PipelineResult<T>>,
    {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| PipelineError::Internal(format!("{} pool is closed", self.name)))?;

        debug!("{} pool: {}/{} slots busy", self.name, self.active(), self.capacity);

        task.await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn never_exceeds_capacity() {
        let pool = WorkerPool::new("test", 3);
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..20 {
            let pool = pool.clone();
            let running = running.clone();
            let peak = peak.clone();
            handles.push(tokio::spawn(async move {
                pool.run(async {
                    let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    running.fetch_sub(1, Ordering::SeqCst);
                    Ok(())
                })
                .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert!(peak.load(Ordering::SeqCst) <= 3);
        assert_eq!(pool.active(), 0);
    }

    #[tokio::test]
    async fn admits_in_submission_order() {
        let pool = WorkerPool::new("fifo", 1);
        let order = Arc::new(std::sync::Mutex::new(Vec::new()));

        let gate = pool.clone();
        let (release_tx, release_rx) = tokio::sync::oneshot::channel::<()>();
        let holder = tokio::spawn(async move {
            gate.run(async {
                let _ = release_rx.await;
                Ok(())
            })
            .await
        });
        while pool.active() == 0 {
            tokio::task::yield_now().await;
        }

        let mut waiters = Vec::new();
        for i in 0..5 {
            let pool = pool.clone();
            let order = order.clone();
            waiters.push(tokio::spawn(async move {
                pool.run(async {
                    order.lock().unwrap().push(i);
                    Ok(())
                })
                .await
            }));
            // Let each waiter enqueue before the next one is spawned.
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        release_tx.send(()).unwrap();
        holder.await.unwrap().unwrap();
        for waiter in waiters {
            waiter.await.unwrap().unwrap();
        }

        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn task_errors_pass_through_and_release_the_slot() {
        let pool = WorkerPool::new("err", 1);
        let err = pool
            .run(async { Err::<(), _>(PipelineError::Timeout(Duration::from_secs(1))) })
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Timeout(_)));
        assert_eq!(pool.active(), 0);
    }
}
