//! Client execution logic with reconnection support.

use std::future::Future;

use crate::{error::ClientError, retry::RetryPolicy};

/// Run `attempt` until it succeeds, fails permanently, or the policy gives up
///
/// Retries happen in this loop; an attempt never reconnects by itself.
pub async fn run_with_retry<T, F, Fut>(
    policy: RetryPolicy,
    label: &str,
    mut attempt: F,
) -> Result<T, ClientError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ClientError>>,
{
    let mut failures = 0;

    loop {
        tracing::info!(
            "{} (attempt {}/{})",
            label,
            failures + 1,
            policy.max_attempts
        );

        match attempt().await {
            Ok(value) => return Ok(value),
            Err(e) if !e.is_retryable() => return Err(e),
            Err(e) => {
                failures += 1;
                tracing::warn!("{}", e);

                if !policy.allows_retry(failures) {
                    tracing::error!("Giving up after {} attempts", failures);
                    return Err(e);
                }

                let delay = policy.delay_for(failures);
                tracing::info!("Reconnecting in {:?}...", delay);
                tokio::time::sleep(delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{
            Arc,
            atomic::{AtomicU32, Ordering},
        },
        time::Duration,
    };

    use super::*;

    fn instant_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(max_attempts, Duration::ZERO, Duration::ZERO)
    }

    #[tokio::test]
    async fn test_retries_until_success() {
        // テスト項目: 一時的な失敗の後に成功すれば結果を返す
        // given (前提条件):
        let calls = Arc::new(AtomicU32::new(0));

        // when (操作):
        let counter = calls.clone();
        let result = run_with_retry(instant_policy(5), "connect", move || {
            let counter = counter.clone();
            async move {
                if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(ClientError::ConnectionLost)
                } else {
                    Ok("connected")
                }
            }
        })
        .await;

        // then (期待する結果):
        assert_eq!(result.unwrap(), "connected");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        // テスト項目: 最大試行回数で諦め、最後のエラーを返す
        // given (前提条件):
        let calls = Arc::new(AtomicU32::new(0));

        // when (操作):
        let counter = calls.clone();
        let result: Result<(), ClientError> = run_with_retry(instant_policy(3), "connect", move || {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Err(ClientError::Connection("refused".to_string())) }
        })
        .await;

        // then (期待する結果):
        assert!(matches!(result, Err(ClientError::Connection(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_permanent_error_is_not_retried() {
        // テスト項目: 再試行しても意味のないエラーでは即座に終了する
        // given (前提条件):
        let calls = Arc::new(AtomicU32::new(0));

        // when (操作):
        let counter = calls.clone();
        let result: Result<(), ClientError> = run_with_retry(instant_policy(5), "connect", move || {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Err(ClientError::Rejected(400)) }
        })
        .await;

        // then (期待する結果):
        assert!(matches!(result, Err(ClientError::Rejected(400))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
