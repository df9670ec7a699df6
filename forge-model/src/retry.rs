use forge_core::{ForgeError, Result};
use std::{future::Future, time::Duration};

/// How the delay grows between attempts.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Backoff {
    /// `initial_delay × multiplier^(attempt-1)`
    Exponential { multiplier: f32 },
    /// `initial_delay × attempt`
    Linear,
}

#[derive(Clone, Debug)]
pub struct RetryConfig {
    pub enabled: bool,
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub backoff: Backoff,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_retries: 3,
            initial_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(5),
            backoff: Backoff::Exponential { multiplier: 2.0 },
        }
    }
}

impl RetryConfig {
    #[must_use]
    pub fn disabled() -> Self {
        Self { enabled: false, ..Self::default() }
    }

    /// `base × attempt`, uncapped in practice: the pipeline's stage retry schedule.
    #[must_use]
    pub fn linear(max_retries: u32, base: Duration) -> Self {
        Self {
            enabled: true,
            max_retries,
            initial_delay: base,
            max_delay: Duration::from_secs(60),
            backoff: Backoff::Linear,
        }
    }

    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    #[must_use]
    pub fn with_initial_delay(mut self, initial_delay: Duration) -> Self {
        self.initial_delay = initial_delay;
        self
    }

    #[must_use]
    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    #[must_use]
    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Delay to wait after failed attempt number `attempt` (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let attempt = attempt.max(1);
        let delay = match self.backoff {
            Backoff::Linear => self.initial_delay.saturating_mul(attempt),
            Backoff::Exponential { multiplier } => {
                let factor = (multiplier.max(1.0) as f64).powi(attempt as i32 - 1);
                Duration::try_from_secs_f64(self.initial_delay.as_secs_f64() * factor)
                    .unwrap_or(self.max_delay)
            }
        };
        delay.min(self.max_delay)
    }
}

#[must_use]
pub fn is_retryable_status_code(status_code: u16) -> bool {
    matches!(status_code, 408 | 429 | 500 | 502 | 503 | 504)
}

#[must_use]
pub fn is_retryable_error_message(message: &str) -> bool {
    let normalized = message.to_ascii_uppercase();
    if normalized.contains("NON-RETRYABLE") {
        return false;
    }
    normalized.contains("RETRYABLE")
        || normalized.contains("RATE LIMIT")
        || normalized.contains("TOO MANY REQUESTS")
        || normalized.contains("OVERLOADED")
        || normalized.contains("UNAVAILABLE")
        || normalized.contains("TIMEOUT")
        || normalized.contains("TIMED OUT")
        || normalized.contains("CONNECTION RESET")
}

/// Transport-level classifier: only provider failures that look transient.
#[must_use]
pub fn is_retryable_provider_error(error: &ForgeError) -> bool {
    match error {
        ForgeError::Provider(message) => is_retryable_error_message(message),
        _ => false,
    }
}

pub async fn execute_with_retry<T, Op, Fut, Classify>(
    retry_config: &RetryConfig,
    classify_error: Classify,
    mut operation: Op,
) -> Result<T>
where
    Op: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
    Classify: Fn(&ForgeError) -> bool,
{
    if !retry_config.enabled {
        return operation().await;
    }

    let mut attempt: u32 = 0;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(error) if attempt < retry_config.max_retries && classify_error(&error) => {
                attempt += 1;
                let delay = retry_config.delay_after(attempt);
                forge_telemetry::warn!(
                    attempt = attempt,
                    max_retries = retry_config.max_retries,
                    delay_ms = delay.as_millis(),
                    error = %error,
                    "Provider request failed with retryable error; retrying"
                );
                tokio::time::sleep(delay).await;
            }
            Err(error) => return Err(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{
        Arc,
        atomic::{AtomicU32, Ordering},
    };

    #[tokio::test]
    async fn execute_with_retry_retries_when_classified_retryable() {
        let retry_config = RetryConfig::default()
            .with_max_retries(2)
            .with_initial_delay(Duration::ZERO)
            .with_max_delay(Duration::ZERO);
        let attempts = Arc::new(AtomicU32::new(0));

        let result = execute_with_retry(&retry_config, is_retryable_provider_error, || {
            let attempts = Arc::clone(&attempts);
            async move {
                let attempt = attempts.fetch_add(1, Ordering::SeqCst);
                if attempt < 2 {
                    return Err(ForgeError::Provider("HTTP 429 rate limit".to_string()));
                }
                Ok("ok")
            }
        })
        .await
        .expect("operation should succeed after retries");

        assert_eq!(result, "ok");
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn execute_with_retry_stops_on_non_retryable_error() {
        let retry_config = RetryConfig::default().with_initial_delay(Duration::ZERO);
        let attempts = Arc::new(AtomicU32::new(0));

        let error = execute_with_retry(&retry_config, is_retryable_provider_error, || {
            let attempts = Arc::clone(&attempts);
            async move {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(ForgeError::Provider(
                    "openai API error (400 Bad Request, non-retryable): bad request".to_string(),
                ))
            }
        })
        .await
        .expect_err("operation should fail without retries");

        assert!(matches!(error, ForgeError::Provider(_)));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn execute_with_retry_respects_disabled_config() {
        let retry_config = RetryConfig::disabled().with_max_retries(10);
        let attempts = Arc::new(AtomicU32::new(0));

        let error = execute_with_retry(&retry_config, is_retryable_provider_error, || {
            let attempts = Arc::clone(&attempts);
            async move {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(ForgeError::Provider("HTTP 429 too many requests".to_string()))
            }
        })
        .await
        .expect_err("disabled retries should return first error");

        assert!(matches!(error, ForgeError::Provider(_)));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn retryable_status_code_matches_transient_errors() {
        assert!(is_retryable_status_code(429));
        assert!(is_retryable_status_code(503));
        assert!(!is_retryable_status_code(400));
    }

    #[test]
    fn linear_backoff_grows_by_attempt() {
        let config = RetryConfig::linear(2, Duration::from_millis(500));
        assert_eq!(config.delay_after(1), Duration::from_millis(500));
        assert_eq!(config.delay_after(2), Duration::from_millis(1000));
        assert_eq!(config.delay_after(3), Duration::from_millis(1500));
    }

    #[test]
    fn exponential_backoff_is_capped() {
        let config = RetryConfig::default()
            .with_initial_delay(Duration::from_millis(100))
            .with_max_delay(Duration::from_millis(350));
        assert_eq!(config.delay_after(1), Duration::from_millis(100));
        assert_eq!(config.delay_after(2), Duration::from_millis(200));
        assert_eq!(config.delay_after(3), Duration::from_millis(350));
    }
}
