use anyhow::Result;
use async_trait::async_trait;

use crate::task_manager::TaskManager;

/// Base trait for providers that build a component asynchronously.
///
/// # Example
///
/// ```no_run
/// use shroud_ledd::providers::traits::AsyncProvider;
///
/// struct Greeting;
///
/// #[async_trait::async_trait]
/// impl AsyncProvider<String> for Greeting {
///     async fn provide(&self) -> anyhow::Result<String> {
///         Ok("hello".to_string())
///     }
/// }
/// ```
#[async_trait]
pub trait AsyncProvider<T> {
    async fn provide(&self) -> Result<T>;
}

/// Trait for services that are started through the [`TaskManager`].
///
/// Critical services must start for the daemon to run; the others may
/// fail with a warning.
#[async_trait]
pub trait ServiceProvider: Send + Sync {
    /// Spawns the service task in `task_manager`.
    async fn start(&self, task_manager: &mut TaskManager) -> Result<()>;

    /// Returns service name for logging and management.
    fn name(&self) -> &'static str;

    /// Returns startup priority (higher numbers start first).
    fn priority(&self) -> i32 {
        0
    }

    /// Indicates if service is critical for system operation.
    fn is_critical(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    };
    use tokio::time::{Duration, sleep};

    struct RecordingService {
        name: &'static str,
        priority: i32,
        ran: Arc<AtomicBool>,
    }

    #[async_trait]
    impl ServiceProvider for RecordingService {
        async fn start(&self, task_manager: &mut TaskManager) -> Result<()> {
            let ran = self.ran.clone();
            task_manager
                .spawn_task(self.name.to_string(), |token| async move {
                    ran.store(true, Ordering::SeqCst);
                    token.cancelled().await;
                    Ok(())
                })
                .await
        }

        fn name(&self) -> &'static str {
            self.name
        }

        fn priority(&self) -> i32 {
            self.priority
        }
    }

    struct BrokenService;

    #[async_trait]
    impl ServiceProvider for BrokenService {
        async fn start(&self, _task_manager: &mut TaskManager) -> Result<()> {
            Err(anyhow!("hardware went away"))
        }

        fn name(&self) -> &'static str {
            "BrokenService"
        }
    }

    struct FixedProvider(u32);

    #[async_trait]
    impl AsyncProvider<u32> for FixedProvider {
        async fn provide(&self) -> Result<u32> {
            Ok(self.0)
        }
    }

    #[tokio::test]
    async fn async_provider_trait_object() {
        let providers: Vec<Box<dyn AsyncProvider<u32> + Send + Sync>> =
            vec![Box::new(FixedProvider(1)), Box::new(FixedProvider(2))];

        let mut values = Vec::new();
        for provider in &providers {
            values.push(provider.provide().await.unwrap());
        }
        assert_eq!(values, vec![1, 2]);
    }

    #[tokio::test]
    async fn service_defaults() {
        assert_eq!(BrokenService.priority(), 0);
        assert!(!BrokenService.is_critical());
    }

    #[tokio::test]
    async fn service_start_spawns_task() {
        let mut task_manager = TaskManager::new();
        let ran = Arc::new(AtomicBool::new(false));
        let service = RecordingService {
            name: "recording",
            priority: 3,
            ran: ran.clone(),
        };

        service.start(&mut task_manager).await.unwrap();
        sleep(Duration::from_millis(20)).await;

        assert!(ran.load(Ordering::SeqCst));
        assert!(task_manager.is_running("recording"));
        task_manager.shutdown_all().await.unwrap();
    }

    #[tokio::test]
    async fn service_start_failure_is_reported() {
        let mut task_manager = TaskManager::new();
        let err = BrokenService.start(&mut task_manager).await.unwrap_err();
        assert!(err.to_string().contains("hardware went away"));
        assert_eq!(task_manager.active_count(), 0);
    }

    #[test]
    fn services_sort_by_priority() {
        let mut services = [1, 10, 5].map(|priority| RecordingService {
            name: "s",
            priority,
            ran: Arc::new(AtomicBool::new(false)),
        });
        services.sort_by_key(|s| std::cmp::Reverse(s.priority()));
        assert_eq!(services.map(|s| s.priority), [10, 5, 1]);
    }
}
