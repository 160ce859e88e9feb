//! Retrying operations that lost a serialization race.

use std::fmt::Display;
use std::future::Future;

use leavedesk_shared::AppError;
use sea_orm::DbErr;
use tracing::warn;

use crate::error::{DbFailure, classify};

/// Errors that can tell whether retrying the whole operation may succeed.
pub trait Retryable {
    /// True for serialization failures and deadlocks.
    fn is_retryable(&self) -> bool;
}

impl Retryable for AppError {
    fn is_retryable(&self) -> bool {
        AppError::is_retryable(self)
    }
}

impl Retryable for DbErr {
    fn is_retryable(&self) -> bool {
        classify(self) == DbFailure::SerializationFailure
    }
}

/// Runs `op`, re-running it up to `retries` more times while it fails with a
/// retryable error.
///
/// Each attempt must open its own transaction.
///
/// # Errors
///
/// Returns the first non-retryable error, or the last error once retries are
/// exhausted.
pub async fn with_serialization_retry<T, E, F, Fut>(retries: u32, mut op: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Retryable + Display,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Err(err) if attempt < retries && err.is_retryable() => {
                attempt += 1;
                warn!(attempt, retries, error = %err, "serialization conflict, retrying");
            }
            result => return result,
        }
    }
}
