use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

/// Number of local writes allowed in flight at once.
pub const WRITE_CONCURRENCY: usize = 4;

/// Runs local-store writes in the background on a bounded pool, so callers
/// are not blocked on the database.
#[derive(Clone)]
pub struct WriteExecutor {
    semaphore: Arc<Semaphore>,
}

impl WriteExecutor {
    pub fn new() -> Self {
        Self::with_concurrency(WRITE_CONCURRENCY)
    }

    pub fn with_concurrency(permits: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(permits)),
        }
    }

    pub fn spawn<F, T>(&self, task: F) -> JoinHandle<Option<T>>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let semaphore = self.semaphore.clone();
        tokio::spawn(async move {
            // Only fails if the semaphore was closed, which never happens here.
            let _permit = match semaphore.acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => {
                    tracing::error!("Write executor closed: {}", e);
                    return None;
                }
            };
            Some(task.await)
        })
    }

    pub fn available_permits(&self) -> usize {
        self.semaphore.available_permits()
    }
}

impl Default for WriteExecutor {
    fn default() -> Self {
        Self::new()
    }
}
