use elicit_core::ElicitError;
use std::time::Duration;

/// Retry policy for generative calls. `max_attempts` is the total
/// attempt ceiling shared by transport failures and structurally
/// invalid responses; `overall_timeout` bounds the whole loop, not
/// each attempt.
#[derive(Clone, Debug)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub backoff_multiplier: f32,
    pub overall_timeout: Option<Duration>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(5),
            backoff_multiplier: 2.0,
            overall_timeout: Some(Duration::from_secs(120)),
        }
    }
}

impl RetryConfig {
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
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
    pub fn with_overall_timeout(mut self, overall_timeout: Option<Duration>) -> Self {
        self.overall_timeout = overall_timeout;
        self
    }

    pub(crate) fn next_delay(&self, current: Duration) -> Duration {
        if current >= self.max_delay {
            return self.max_delay;
        }
        let multiplier = f64::from(self.backoff_multiplier.max(1.0));
        Duration::from_secs_f64(current.as_secs_f64() * multiplier).min(self.max_delay)
    }
}

#[must_use]
pub fn is_transient_message(message: &str) -> bool {
    let normalized = message.to_ascii_uppercase();
    normalized.contains("429")
        || normalized.contains("408")
        || normalized.contains("500")
        || normalized.contains("502")
        || normalized.contains("503")
        || normalized.contains("504")
        || normalized.contains("RATE LIMIT")
        || normalized.contains("TOO MANY REQUESTS")
        || normalized.contains("RESOURCE_EXHAUSTED")
        || normalized.contains("UNAVAILABLE")
        || normalized.contains("TIMEOUT")
        || normalized.contains("TIMED OUT")
        || normalized.contains("CONNECTION RESET")
}

/// Transient transport failures are the only errors worth a backoff
/// sleep. A real state conflict or a bad configuration never is.
#[must_use]
pub fn is_transient_error(error: &ElicitError) -> bool {
    match error {
        ElicitError::Model(message) => is_transient_message(message),
        _ => false,
    }
}
