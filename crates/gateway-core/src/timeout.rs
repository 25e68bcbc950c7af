//! Timeout supervisor
//!
//! Every externally observable call is raced against a deadline. When the
//! timer wins, the operation future is dropped, which closes any provider
//! connection it held open.

use crate::error::{GatewayError, GatewayResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

/// Deadline classes, each with its own per-environment budget
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationClass {
    /// The whole inbound request
    Request,
    /// Looking up and decrypting a provider credential
    CredentialLookup,
    /// A single synchronous or structured generation, or opening a stream
    Generation,
    /// Gap between two reads of a provider stream
    StreamIdle,
}

impl fmt::Display for OperationClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Request => write!(f, "request"),
            Self::CredentialLookup => write!(f, "credential lookup"),
            Self::Generation => write!(f, "generation"),
            Self::StreamIdle => write!(f, "stream idle"),
        }
    }
}

/// Outcome of racing an operation against a timer
#[derive(Debug)]
pub enum Raced<T> {
    Completed(T),
    TimedOut(Duration),
}

/// First of (operation, timer)
pub async fn first_of<F>(future: F, deadline: Duration) -> Raced<F::Output>
where
    F: Future,
{
    let start = Instant::now();
    tokio::select! {
        output = future => Raced::Completed(output),
        _ = tokio::time::sleep(deadline) => Raced::TimedOut(start.elapsed()),
    }
}

/// Race a fallible operation, turning an elapsed deadline into
/// [`GatewayError::Timeout`]
pub async fn race<T, F>(operation: OperationClass, deadline: Duration, future: F) -> GatewayResult<T>
where
    F: Future<Output = GatewayResult<T>>,
{
    match first_of(future, deadline).await {
        Raced::Completed(result) => result,
        Raced::TimedOut(elapsed) => {
            tracing::warn!(
                operation = %operation,
                deadline_ms = deadline.as_millis() as u64,
                "deadline exceeded"
            );
            Err(GatewayError::timeout(operation, elapsed))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureKind;

    #[tokio::test(start_paused = true)]
    async fn test_operation_wins() {
        let result = race(OperationClass::Generation, Duration::from_secs(1), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            Ok::<_, GatewayError>(42)
        })
        .await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_wins() {
        let result: GatewayResult<()> =
            race(OperationClass::CredentialLookup, Duration::from_secs(2), async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(())
            })
            .await;

        let err = result.unwrap_err();
        assert_eq!(err.failure_kind(), FailureKind::Timeout);
        match err {
            GatewayError::Timeout {
                operation, elapsed, ..
            } => {
                assert_eq!(operation, OperationClass::CredentialLookup);
                assert!(elapsed >= Duration::from_secs(2));
                assert!(elapsed < Duration::from_secs(60));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_losing_future_is_dropped() {
        struct DropFlag(std::sync::Arc<std::sync::atomic::AtomicBool>);
        impl Drop for DropFlag {
            fn drop(&mut self) {
                self.0.store(true, std::sync::atomic::Ordering::SeqCst);
            }
        }

        let dropped = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(false));
        let flag = DropFlag(dropped.clone());
        let outcome = first_of(
            async move {
                let _flag = flag;
                tokio::time::sleep(Duration::from_secs(10)).await;
            },
            Duration::from_millis(5),
        )
        .await;

        assert!(matches!(outcome, Raced::TimedOut(_)));
        assert!(dropped.load(std::sync::atomic::Ordering::SeqCst));
    }
}
