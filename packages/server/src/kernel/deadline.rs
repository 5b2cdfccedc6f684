//! Time limits for calls to external collaborators.
//!
//! The database, renderer and storage clients do not guarantee their own
//! timeouts, so every call made while processing a job goes through
//! [`with_deadline`].

use std::future::Future;
use std::time::Duration;

/// Why a deadline-bounded call did not produce a value.
#[derive(Debug)]
pub enum DeadlineError {
    /// The call did not finish within the limit.
    TimedOut(Duration),
    /// The call finished with an error.
    Failed(anyhow::Error),
}

impl std::fmt::Display for DeadlineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeadlineError::TimedOut(limit) => write!(f, "timed out after {}s", limit.as_secs()),
            DeadlineError::Failed(e) => write!(f, "{}", e),
        }
    }
}

/// Run `fut`, giving up after `limit`.
pub async fn with_deadline<T, F>(limit: Duration, fut: F) -> Result<T, DeadlineError>
where
    F: Future<Output = anyhow::Result<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(DeadlineError::Failed(e)),
        Err(_) => Err(DeadlineError::TimedOut(limit)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn passes_through_success() {
        let value = with_deadline(Duration::from_secs(1), async { Ok(42) }).await;
        assert!(matches!(value, Ok(42)));
    }

    #[tokio::test]
    async fn passes_through_failure() {
        let result: Result<(), _> =
            with_deadline(Duration::from_secs(1), async { Err(anyhow::anyhow!("nope")) }).await;
        match result {
            Err(DeadlineError::Failed(e)) => assert_eq!(e.to_string(), "nope"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn slow_call_times_out() {
        let result: Result<(), _> = with_deadline(Duration::from_secs(2), async {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok(())
        })
        .await;
        assert!(matches!(result, Err(DeadlineError::TimedOut(d)) if d == Duration::from_secs(2)));
        assert_eq!(
            result.unwrap_err().to_string(),
            "timed out after 2s"
        );
    }
}
