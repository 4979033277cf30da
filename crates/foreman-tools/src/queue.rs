//! Execution queue bounding concurrent sandbox usage.
//!
//! One queue instance is shared process-wide: every sandboxed run, from any
//! workflow, passes through it. The default concurrency of 1 makes the queue
//! a global mutual-exclusion lock over the sandbox resource.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Semaphore;
use tracing::debug;

/// FIFO queue bounding how many submitted operations run at once.
///
/// Tasks begin execution in submission order: the underlying semaphore is
/// fair, so waiters acquire permits in the order their `submit` calls
/// reached it. A caller suspends until its own task has completed; `submit`
/// never returns early. A failing task cannot stall the queue — its permit
/// is released when the operation future is dropped, errored or not.
pub struct ExecutionQueue {
    semaphore: Arc<Semaphore>,
    concurrency: usize,
}

impl ExecutionQueue {
    /// Create a queue with the given concurrency limit (clamped to at
    /// least 1).
    #[must_use]
    pub fn new(concurrency: usize) -> Self {
        let concurrency = concurrency.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(concurrency)),
            concurrency,
        }
    }

    /// The configured concurrency limit.
    #[must_use]
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Submit an operation and await its completion.
    ///
    /// Suspends the caller until a slot is free and the operation has run to
    /// completion, then returns the operation's output unchanged.
    pub async fn submit<F, T>(&self, operation: F) -> T
    where
        F: Future<Output = T>,
    {
        let enqueued_at = Instant::now();
        // The semaphore is never closed while the queue is alive.
        let permit = self
            .semaphore
            .acquire()
            .await
            .unwrap_or_else(|_| unreachable!("execution queue semaphore closed"));
        debug!(
            wait_ms = enqueued_at.elapsed().as_millis() as u64,
            "execution queue slot acquired"
        );

        let output = operation.await;
        drop(permit);
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;

    /// With concurrency 1, task executions never overlap and finish in
    /// submission order.
    #[tokio::test]
    async fn test_serialized_fifo() {
        let queue = Arc::new(ExecutionQueue::new(1));
        let events: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));

        let mut handles = Vec::new();
        for i in 0..4 {
            let queue = Arc::clone(&queue);
            let events = Arc::clone(&events);
            handles.push(tokio::spawn(async move {
                queue
                    .submit(async {
                        events.lock().unwrap().push(format!("start-{i}"));
                        tokio::time::sleep(Duration::from_millis(20)).await;
                        events.lock().unwrap().push(format!("end-{i}"));
                    })
                    .await;
            }));
            // Give each submission time to reach the semaphore so FIFO
            // order is deterministic.
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let events = events.lock().unwrap();
        assert_eq!(events.len(), 8);
        // Every start is immediately followed by its own end: no overlap.
        for pair in events.chunks(2) {
            assert_eq!(pair[0].replace("start", "end"), pair[1]);
        }
        // And tasks ran in submission order.
        let starts: Vec<&String> = events.iter().filter(|e| e.starts_with("start")).collect();
        assert_eq!(starts, ["start-0", "start-1", "start-2", "start-3"]);
    }

    /// A failing task releases its slot; subsequent tasks still run.
    #[tokio::test]
    async fn test_failure_does_not_poison_queue() {
        let queue = ExecutionQueue::new(1);

        let failed: Result<(), &str> = queue.submit(async { Err("task blew up") }).await;
        assert!(failed.is_err());

        let ok: Result<i32, &str> = queue.submit(async { Ok(7) }).await;
        assert_eq!(ok, Ok(7));
    }

    /// Concurrency above 1 allows overlap.
    #[tokio::test]
    async fn test_concurrency_two_overlaps() {
        let queue = Arc::new(ExecutionQueue::new(2));
        let in_flight = Arc::new(Mutex::new((0usize, 0usize))); // (current, max)

        let mut handles = Vec::new();
        for _ in 0..4 {
            let queue = Arc::clone(&queue);
            let in_flight = Arc::clone(&in_flight);
            handles.push(tokio::spawn(async move {
                queue
                    .submit(async {
                        {
                            let mut guard = in_flight.lock().unwrap();
                            guard.0 += 1;
                            guard.1 = guard.1.max(guard.0);
                        }
                        tokio::time::sleep(Duration::from_millis(30)).await;
                        in_flight.lock().unwrap().0 -= 1;
                    })
                    .await;
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let (_, max) = *in_flight.lock().unwrap();
        assert!(max >= 2, "expected at least 2 tasks in flight, saw {max}");
        assert!(max <= 2, "expected at most 2 tasks in flight, saw {max}");
    }

    #[test]
    fn test_concurrency_clamped_to_one() {
        assert_eq!(ExecutionQueue::new(0).concurrency(), 1);
        assert_eq!(ExecutionQueue::new(3).concurrency(), 3);
    }
}
