//! Extraction client: one logical request with transport retry
//!
//! Wraps a [`ChatProvider`] so that transient transport failures (timeouts,
//! connection errors, non-2xx answers) are retried with exponential backoff.
//! Content problems are not the client's concern; it returns whatever text
//! the service produced.

use crate::cancel::Cancellation;
use crate::LlmError;
use docmint_domain::traits::{ChatProvider, ChatRequest};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Transport retry policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Maximum attempts per request; `None` retries forever
    #[serde(default = "default_max_attempts")]
    pub max_attempts: Option<u32>,

    /// Delay before the first retry (milliseconds)
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    /// Upper bound for any single delay (milliseconds)
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Growth factor between consecutive delays
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
}

fn default_max_attempts() -> Option<u32> {
    Some(8)
}

fn default_initial_delay_ms() -> u64 {
    1_000
}

fn default_max_delay_ms() -> u64 {
    60_000
}

fn default_multiplier() -> f64 {
    2.0
}

impl Default for RetryPolicy {
    /// Bounded exponential backoff: 8 attempts, 1s doubling up to 60s
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            multiplier: default_multiplier(),
        }
    }
}

impl RetryPolicy {
    /// Retry forever with a fixed delay
    pub fn unbounded(delay: Duration) -> Self {
        let delay_ms = delay.as_millis() as u64;
        Self {
            max_attempts: None,
            initial_delay_ms: delay_ms,
            max_delay_ms: delay_ms,
            multiplier: 1.0,
        }
    }

    /// Delay to wait after the given failed attempt (1-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(63) as i32;
        let delay = self.initial_delay_ms as f64 * self.multiplier.powi(exponent);
        let capped = delay.min(self.max_delay_ms as f64).max(0.0);
        Duration::from_millis(capped as u64)
    }

    /// Validate the policy
    pub fn validate(&self) -> Result<(), String> {
        if self.max_attempts == Some(0) {
            return Err("max_attempts must be greater than 0".to_string());
        }
        if self.multiplier < 1.0 {
            return Err("multiplier must be at least 1.0".to_string());
        }
        if self.initial_delay_ms > self.max_delay_ms {
            return Err("initial_delay_ms cannot exceed max_delay_ms".to_string());
        }
        Ok(())
    }
}

/// Issues single chat requests, retrying transport failures
pub struct ExtractionClient<P> {
    provider: P,
    policy: RetryPolicy,
    cancellation: Cancellation,
}

impl<P> ExtractionClient<P>
where
    P: ChatProvider,
{
    /// Create a new client
    pub fn new(provider: P, policy: RetryPolicy) -> Self {
        Self {
            provider,
            policy,
            cancellation: Cancellation::new(),
        }
    }

    /// Share an existing cancellation signal
    pub fn with_cancellation(mut self, cancellation: Cancellation) -> Self {
        self.cancellation = cancellation;
        self
    }

    /// The cancellation signal observed by this client
    pub fn cancellation(&self) -> &Cancellation {
        &self.cancellation
    }

    /// The wrapped provider
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// The retry policy in use
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Send one request and return the raw response text
    ///
    /// # Errors
    ///
    /// - `LlmError::Cancelled` if cancellation is requested before a response arrives
    /// - `LlmError::RetriesExhausted` once `max_attempts` transport failures happened
    pub async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String, LlmError> {
        let request = ChatRequest::new(system_prompt, user_prompt);
        let mut attempt = 0u32;

        loop {
            if self.cancellation.is_cancelled() {
                return Err(LlmError::Cancelled);
            }
            attempt += 1;

            let outcome = tokio::select! {
                biased;
                _ = self.cancellation.cancelled() => return Err(LlmError::Cancelled),
                outcome = self.provider.complete(&request) => outcome,
            };

            let error = match outcome {
                Ok(text) => {
                    debug!("Model {} answered with {} chars", self.provider.model(), text.len());
                    return Ok(text);
                }
                Err(e) => e,
            };

            if let Some(max_attempts) = self.policy.max_attempts {
                if attempt >= max_attempts {
                    return Err(LlmError::RetriesExhausted {
                        attempts: attempt,
                        last_error: error.to_string(),
                    });
                }
            }

            let delay = self.policy.delay_for(attempt);
            warn!(
                "Model request failed (attempt {}): {}. Retrying in {:?}",
                attempt, error, delay
            );

            tokio::select! {
                biased;
                _ = self.cancellation.cancelled() => return Err(LlmError::Cancelled),
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }
}
