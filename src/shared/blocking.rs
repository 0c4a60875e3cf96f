//! Usage: Run blocking work on the tokio blocking pool with a stable label.

use crate::shared::error::{AppError, AppResult};

pub async fn run<T, E>(
    label: &'static str,
    f: impl FnOnce() -> Result<T, E> + Send + 'static,
) -> AppResult<T>
where
    T: Send + 'static,
    E: Into<AppError> + Send + 'static,
{
    match tokio::task::spawn_blocking(f).await {
        Ok(result) => result.map_err(Into::into),
        // Panic payloads can carry credential material, so only the label is reported.
        Err(join_err) if join_err.is_panic() => {
            tracing::error!(label, "blocking task panicked");
            Err(AppError::new("TASK_JOIN", format!("{label}: task panicked")))
        }
        Err(_) => {
            tracing::warn!(label, "blocking task cancelled");
            Err(AppError::new("TASK_JOIN", format!("{label}: task cancelled")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn run_returns_closure_result() {
        let value = run("sum", || Ok::<_, AppError>(2 + 2)).await.expect("value");
        assert_eq!(value, 4);
    }

    #[tokio::test]
    async fn run_converts_string_errors() {
        let err = run("fail", || Err::<(), _>("CREDENTIAL_STORE: nope".to_string()))
            .await
            .expect_err("should fail");
        assert_eq!(err.code(), "CREDENTIAL_STORE");
    }

    #[tokio::test]
    async fn run_reports_panics_without_payload() {
        let err = run("boom", || -> Result<(), AppError> { panic!("secret payload") })
            .await
            .expect_err("should fail");
        assert_eq!(err.code(), "TASK_JOIN");
        assert!(!err.to_string().contains("secret payload"));
    }
}
