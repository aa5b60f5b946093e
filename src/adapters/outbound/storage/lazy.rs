use futures::future::{BoxFuture, FutureExt};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::OnceCell;

use crate::domain::MediaResult;

/// Builds a backend handle on demand
pub type ClientFactory<C> = Arc<dyn Fn() -> BoxFuture<'static, MediaResult<Arc<C>>> + Send + Sync>;

/// A backend handle constructed on first use, exactly once.
///
/// Concurrent first callers share the same in-flight construction. A failed
/// construction leaves the cell empty so the next call tries again; a built
/// handle is never replaced.
pub struct LazyClient<C: ?Sized> {
    cell: OnceCell<Arc<C>>,
    factory: ClientFactory<C>,
}

impl<C: ?Sized + Send + Sync + 'static> LazyClient<C> {
    pub fn new(factory: ClientFactory<C>) -> Self {
        Self {
            cell: OnceCell::new(),
            factory,
        }
    }

    pub fn from_fn<F, Fut>(factory: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = MediaResult<Arc<C>>> + Send + 'static,
    {
        Self::new(Arc::new(move || factory().boxed()))
    }

    /// Wrap an already constructed handle
    pub fn ready(client: Arc<C>) -> Self {
        let handle = client.clone();
        let factory: ClientFactory<C> = Arc::new(move || -> BoxFuture<'static, MediaResult<Arc<C>>> {
            let handle = handle.clone();
            Box::pin(async move { Ok(handle) })
        });
        Self {
            cell: OnceCell::new_with(Some(client)),
            factory,
        }
    }

    pub async fn get(&self) -> MediaResult<Arc<C>> {
        let factory = &self.factory;
        self.cell
            .get_or_try_init(|| factory())
            .await
            .map(Arc::clone)
    }

    pub fn is_initialized(&self) -> bool {
        self.cell.initialized()
    }
}

impl<C: ?Sized> std::fmt::Debug for LazyClient<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LazyClient")
            .field("initialized", &self.cell.initialized())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ErrorKind, MediaError};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_constructed_once_under_concurrent_first_use() {
        let builds = Arc::new(AtomicUsize::new(0));
        let counter = builds.clone();
        let lazy = Arc::new(LazyClient::<String>::from_fn(move || {
            let counter = counter.clone();
            async move {
                tokio::time::sleep(Duration::from_millis(10)).await;
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(Arc::new("client".to_string()))
            }
        }));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let lazy = lazy.clone();
                tokio::spawn(async move { lazy.get().await })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap().as_str(), "client");
        }

        assert_eq!(builds.load(Ordering::SeqCst), 1);
        assert!(lazy.is_initialized());
    }

    #[tokio::test]
    async fn test_failed_construction_is_retried() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = attempts.clone();
        let lazy = LazyClient::<String>::from_fn(move || {
            let attempt = counter.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt == 0 {
                    Err(MediaError::new(ErrorKind::NetworkError, "test", "unreachable"))
                } else {
                    Ok(Arc::new("client".to_string()))
                }
            }
        });

        assert_eq!(lazy.get().await.unwrap_err().kind(), ErrorKind::NetworkError);
        assert!(!lazy.is_initialized());
        assert!(lazy.get().await.is_ok());
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }
}
