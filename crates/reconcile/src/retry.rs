//! Reliable submission - bounded, classified retry around one remote mutation.

use crate::context::RemoteClient;
use crate::error::SubmitError;
use crate::executor::Task;
use crate::types::{Action, DesiredItem, ExistingItem, TaskResult};
use log::{debug, error, info, warn};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Decides how many attempts a submission gets and which failures earn
/// another one.
pub trait RetryPolicy: Send + Sync {
    /// Attempt ceiling, including the first attempt
    fn max_attempts(&self) -> u32;

    /// Delay before the attempt following `attempt` (0-indexed)
    fn delay_for_attempt(&self, attempt: u32) -> Duration;

    /// Whether `error` is worth another attempt
    fn is_retryable(&self, error: &SubmitError) -> bool {
        error.is_retryable()
    }
}

/// Retry configuration with exponential backoff
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts
    pub max_attempts: u32,
    /// Base delay between retries
    pub base_delay: Duration,
    /// Multiplier for exponential backoff
    pub backoff_factor: f64,
    /// Maximum delay between retries
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            backoff_factor: 2.0,
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryConfig {
    /// Default backoff with a custom attempt ceiling
    pub fn with_max_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            ..Default::default()
        }
    }
}

impl RetryPolicy for RetryConfig {
    fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let delay = self.base_delay.as_secs_f64() * self.backoff_factor.powi(attempt as i32);
        let capped = delay.min(self.max_delay.as_secs_f64());
        Duration::from_secs_f64(capped)
    }
}

/// Callback trait for retry notifications.
pub trait RetryCallback: Send + Sync {
    /// Called before an operation is retried.
    ///
    /// `attempt` is the 1-indexed attempt that just failed.
    fn on_retry(&self, id: &str, attempt: u32, max_attempts: u32, error: &SubmitError, delay: Duration);
}

/// No-op callback that does nothing.
pub struct NoCallback;

impl RetryCallback for NoCallback {
    fn on_retry(&self, _: &str, _: u32, _: u32, _: &SubmitError, _: Duration) {}
}

/// Callback that logs each retry as a warning.
pub struct LogCallback;

impl RetryCallback for LogCallback {
    fn on_retry(&self, id: &str, attempt: u32, max_attempts: u32, error: &SubmitError, delay: Duration) {
        warn!(
            "Attempt {}/{} for \"{}\" failed: {}. Retrying in {:.1}s",
            attempt,
            max_attempts,
            id,
            error,
            delay.as_secs_f64()
        );
    }
}

/// Execute an operation with retry logic.
///
/// Non-retryable errors return immediately as terminal. Once the attempt
/// ceiling is reached the last retryable error is reported as terminal.
/// The operation is always attempted at least once.
pub fn with_retry<T, F>(
    policy: &dyn RetryPolicy,
    callback: Option<&dyn RetryCallback>,
    id: &str,
    mut operation: F,
) -> Result<T, SubmitError>
where
    F: FnMut() -> Result<T, SubmitError>,
{
    let max_attempts = policy.max_attempts().max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;
        let err = match operation() {
            Ok(result) => return Ok(result),
            Err(e) => e,
        };

        if !policy.is_retryable(&err) {
            return Err(err.into_terminal());
        }
        if attempt >= max_attempts {
            return Err(SubmitError::exhausted(max_attempts, &err));
        }

        let delay = policy.delay_for_attempt(attempt - 1);
        if let Some(cb) = callback {
            cb.on_retry(id, attempt, max_attempts, &err, delay);
        }
        thread::sleep(delay);
    }
}

/// Wraps a [`RemoteClient`] so every add or remove is retried per policy.
///
/// Cheap to clone; clones share the client and policy.
pub struct ReliableSubmitter<C: RemoteClient> {
    client: Arc<C>,
    policy: Arc<dyn RetryPolicy>,
    callback: Arc<dyn RetryCallback>,
}

impl<C: RemoteClient> Clone for ReliableSubmitter<C> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            policy: Arc::clone(&self.policy),
            callback: Arc::clone(&self.callback),
        }
    }
}

impl<C: RemoteClient + 'static> ReliableSubmitter<C> {
    /// Submitter that logs retries
    pub fn new(client: Arc<C>, policy: impl RetryPolicy + 'static) -> Self {
        Self {
            client,
            policy: Arc::new(policy),
            callback: Arc::new(LogCallback),
        }
    }

    /// Replace the retry callback
    pub fn with_callback(mut self, callback: impl RetryCallback + 'static) -> Self {
        self.callback = Arc::new(callback);
        self
    }

    /// Upload one item, returning the identifier it was stored under
    pub fn upload(&self, item: &DesiredItem) -> Result<String, SubmitError> {
        debug!("Attempting to upload \"{}\"", item.id);
        with_retry(
            self.policy.as_ref(),
            Some(self.callback.as_ref()),
            &item.id,
            || self.client.add(item),
        )
    }

    /// Remove one existing item, returning its identifier
    pub fn remove(&self, item: &ExistingItem<C::Handle>) -> Result<String, SubmitError> {
        debug!("Attempting to remove \"{}\"", item.id);
        with_retry(
            self.policy.as_ref(),
            Some(self.callback.as_ref()),
            &item.id,
            || self.client.remove(&item.removal_handle),
        )?;
        Ok(item.id.clone())
    }

    /// Scheduler task uploading `item` and logging the outcome
    pub fn upload_task(&self, item: DesiredItem) -> Task {
        let submitter = self.clone();
        Task::new(item.id.clone(), Action::Add, move || {
            let result = submitter.upload(&item);
            match &result {
                Ok(id) => info!("Uploaded \"{}\" as \"{}\" successfully", item.source_ref, id),
                Err(e) => error!("Uploading \"{}\" failed because of \"{}\"", item.id, e),
            }
            TaskResult::from(result)
        })
    }

    /// Scheduler task removing `item` and logging the outcome
    pub fn remove_task(&self, item: ExistingItem<C::Handle>) -> Task {
        let submitter = self.clone();
        Task::new(item.id.clone(), Action::Remove, move || {
            let result = submitter.remove(&item);
            match &result {
                Ok(id) => info!("Removed \"{id}\""),
                Err(e) => error!("Removing \"{}\" failed because of \"{}\"", item.id, e),
            }
            TaskResult::from(result)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_config(max_attempts: u32) -> RetryConfig {
        RetryConfig {
            max_attempts,
            base_delay: Duration::ZERO,
            backoff_factor: 1.0,
            max_delay: Duration::ZERO,
        }
    }

    #[test]
    fn test_with_retry_success_first_try() {
        let config = RetryConfig::with_max_attempts(1);
        let result = with_retry(&config, None, "a", || Ok::<_, SubmitError>(42));
        assert_eq!(result.unwrap(), 42);
    }

    #[test]
    fn test_with_retry_terminal_error_stops_immediately() {
        let config = fast_config(5);
        let attempts = Cell::new(0);

        let result: Result<(), _> = with_retry(&config, None, "a", || {
            attempts.set(attempts.get() + 1);
            Err(SubmitError::terminal("HTTP 400"))
        });

        assert_eq!(result.unwrap_err(), SubmitError::terminal("HTTP 400"));
        assert_eq!(attempts.get(), 1);
    }

    #[test]
    fn test_with_retry_eventual_success() {
        let config = fast_config(3);
        let attempts = Cell::new(0);

        let result = with_retry(&config, None, "a", || {
            let current = attempts.get();
            attempts.set(current + 1);
            if current < 2 {
                Err(SubmitError::retryable("timed out"))
            } else {
                Ok(42)
            }
        });

        assert_eq!(result.unwrap(), 42);
        assert_eq!(attempts.get(), 3);
    }

    #[test]
    fn test_with_retry_exhaustion_is_terminal() {
        let config = fast_config(3);
        let attempts = Cell::new(0);

        let result: Result<(), _> = with_retry(&config, None, "a", || {
            attempts.set(attempts.get() + 1);
            Err(SubmitError::retryable("HTTP 503"))
        });

        let err = result.unwrap_err();
        assert!(!err.is_retryable());
        assert_eq!(err.reason(), "gave up after 3 attempts: HTTP 503");
        assert_eq!(attempts.get(), 3);
    }

    #[test]
    fn test_with_retry_zero_ceiling_still_attempts_once() {
        let config = fast_config(0);
        let attempts = Cell::new(0);
        let _: Result<(), _> = with_retry(&config, None, "a", || {
            attempts.set(attempts.get() + 1);
            Err(SubmitError::retryable("reset"))
        });
        assert_eq!(attempts.get(), 1);
    }

    #[test]
    fn test_custom_classifier_overrides_error() {
        struct NeverRetry;
        impl RetryPolicy for NeverRetry {
            fn max_attempts(&self) -> u32 {
                10
            }
            fn delay_for_attempt(&self, _: u32) -> Duration {
                Duration::ZERO
            }
            fn is_retryable(&self, _: &SubmitError) -> bool {
                false
            }
        }

        let attempts = Cell::new(0);
        let result: Result<(), _> = with_retry(&NeverRetry, None, "a", || {
            attempts.set(attempts.get() + 1);
            Err(SubmitError::retryable("reset"))
        });
        assert_eq!(result.unwrap_err(), SubmitError::terminal("reset"));
        assert_eq!(attempts.get(), 1);
    }

    #[test]
    fn test_callback_invoked_between_attempts() {
        struct CountingCallback(Arc<AtomicU32>);
        impl RetryCallback for CountingCallback {
            fn on_retry(&self, _: &str, _: u32, _: u32, _: &SubmitError, _: Duration) {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }

        let count = Arc::new(AtomicU32::new(0));
        let callback = CountingCallback(Arc::clone(&count));
        let _: Result<(), _> = with_retry(&fast_config(3), Some(&callback), "a", || {
            Err(SubmitError::retryable("reset"))
        });

        // Not before the first attempt, not after the last
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_delay_for_attempt_backs_off_and_caps() {
        let config = RetryConfig {
            max_attempts: 5,
            base_delay: Duration::from_secs(1),
            backoff_factor: 2.0,
            max_delay: Duration::from_secs(5),
        };
        assert_eq!(config.delay_for_attempt(0), Duration::from_secs(1));
        assert_eq!(config.delay_for_attempt(1), Duration::from_secs(2));
        assert_eq!(config.delay_for_attempt(2), Duration::from_secs(4));
        assert_eq!(config.delay_for_attempt(3), Duration::from_secs(5));
    }

    /// Fails retryably a fixed number of times, then succeeds
    struct FlakyClient {
        failures_left: Mutex<u32>,
        adds: AtomicU32,
        removes: AtomicU32,
    }

    impl FlakyClient {
        fn new(failures: u32) -> Self {
            Self {
                failures_left: Mutex::new(failures),
                adds: AtomicU32::new(0),
                removes: AtomicU32::new(0),
            }
        }

        fn attempt(&self) -> Result<(), SubmitError> {
            let mut left = self.failures_left.lock().unwrap();
            if *left > 0 {
                *left -= 1;
                return Err(SubmitError::from_status(502, "flaky"));
            }
            Ok(())
        }
    }

    impl RemoteClient for FlakyClient {
        type Handle = String;

        fn add(&self, item: &DesiredItem) -> Result<String, SubmitError> {
            self.adds.fetch_add(1, Ordering::SeqCst);
            self.attempt()?;
            Ok(item.id.clone())
        }

        fn remove(&self, _handle: &String) -> Result<(), SubmitError> {
            self.removes.fetch_add(1, Ordering::SeqCst);
            self.attempt()
        }
    }

    fn item(id: &str) -> DesiredItem {
        DesiredItem {
            id: id.to_string(),
            source_ref: format!("{id}.png"),
            position: 1,
        }
    }

    #[test]
    fn test_submitter_upload_retries_until_success() {
        let client = Arc::new(FlakyClient::new(2));
        let submitter = ReliableSubmitter::new(Arc::clone(&client), fast_config(3))
            .with_callback(NoCallback);

        assert_eq!(submitter.upload(&item("party")).unwrap(), "party");
        assert_eq!(client.adds.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_submitter_upload_gives_up_at_ceiling() {
        let client = Arc::new(FlakyClient::new(10));
        let submitter = ReliableSubmitter::new(Arc::clone(&client), fast_config(4))
            .with_callback(NoCallback);

        let task = submitter.upload_task(item("party"));
        let outcome = task.execute();
        assert_eq!(outcome.action, Action::Add);
        assert!(matches!(outcome.result, TaskResult::Failed(SubmitError::Terminal { .. })));
        assert_eq!(client.adds.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_submitter_remove_returns_id() {
        let client = Arc::new(FlakyClient::new(0));
        let submitter = ReliableSubmitter::new(Arc::clone(&client), fast_config(3));
        let existing = ExistingItem {
            id: "party".to_string(),
            removal_handle: "form".to_string(),
        };

        let outcome = submitter.remove_task(existing).execute();
        assert_eq!(outcome.id, "party");
        assert_eq!(outcome.result, TaskResult::Succeeded);
        assert_eq!(client.removes.load(Ordering::SeqCst), 1);
    }
}
