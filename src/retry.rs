//! Polling until a response body settles into an expected shape.

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, warn};

use crate::error::{ClientError, Result};
use crate::response::TestResponse;

/// Repeats an exchange until `query` matches or the attempt budget runs out.
///
/// A body that is not yet well-formed counts as "not matched yet"; transport
/// failures, failed assertions inside the producer and invalid queries stop
/// the loop immediately.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    query: String,
    max_attempts: u32,
    delay: Duration,
}

impl RetryPolicy {
    pub const DEFAULT_ATTEMPTS: u32 = 3;
    pub const DEFAULT_DELAY: Duration = Duration::from_secs(1);

    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            max_attempts: Self::DEFAULT_ATTEMPTS,
            delay: Self::DEFAULT_DELAY,
        }
    }

    /// Total number of exchanges allowed, including the first (at least 1)
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Call `produce` until the wrapper it returns matches the query
    pub async fn apply<F, Fut>(&self, mut produce: F) -> Result<TestResponse>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<TestResponse>>,
    {
        let mut attempt = 1;
        loop {
            let response = produce().await?;
            match response.xpath(&self.query) {
                Ok(matches) if !matches.is_empty() => {
                    debug!(query = %self.query, attempt, "retry query matched");
                    return Ok(response);
                }
                Ok(_) => debug!(query = %self.query, attempt, "retry query not matched yet"),
                Err(ClientError::MalformedContent { details }) => {
                    debug!(query = %self.query, attempt, %details, "response not well-formed yet")
                }
                Err(other) => return Err(other),
            }

            if attempt >= self.max_attempts {
                warn!(query = %self.query, attempts = attempt, "retry budget exhausted");
                return Err(ClientError::RetryExhausted {
                    query: self.query.clone(),
                    attempts: attempt,
                    last: Box::new(response.into_response()),
                });
            }

            attempt += 1;
            sleep(self.delay).await;
        }
    }
}
