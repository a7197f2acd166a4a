//! The registration and certification engine.
//!
//! Each service borrows the pooled connection and returns `AppError`.
//! Handlers wrap calls in [`guarded`] so every store operation is bounded
//! by a timeout and transient failures are retried once.

pub mod attendance;
pub mod certificate;
pub mod directory;
pub mod identity;
pub mod ledger;
pub mod verifier;

use std::future::Future;
use std::time::Duration;

use common::RetryPolicy;
use common::retry::retry_transient;

use crate::error::AppError;

pub use attendance::AttendanceTracker;
pub use certificate::CertificateIssuer;
pub use directory::ActivityDirectory;
pub use identity::IdentityTokens;
pub use ledger::EnrollmentLedger;
pub use verifier::CertificateVerifier;

/// Bounds applied to each engine operation.
#[derive(Debug, Clone, Copy)]
pub struct StoreLimits {
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

fn timed_out(limits: StoreLimits) -> AppError {
    AppError::Transient(format!(
        "store operation exceeded {} ms",
        limits.timeout.as_millis()
    ))
}

/// Run a single attempt under the operation timeout, without retrying.
/// For inserts that are not safe to repeat.
pub async fn bounded<T, Fut>(limits: StoreLimits, op: Fut) -> Result<T, AppError>
where
    Fut: Future<Output = Result<T, AppError>>,
{
    tokio::time::timeout(limits.timeout, op)
        .await
        .unwrap_or_else(|_| Err(timed_out(limits)))
}

/// Run `op` under the operation timeout, retrying transient failures.
///
/// A timed-out attempt counts as transient. Its transaction, if any, is
/// dropped and rolled back.
pub async fn guarded<T, F, Fut>(limits: StoreLimits, mut op: F) -> Result<T, AppError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AppError>>,
{
    retry_transient(limits.retry, || {
        let attempt = op();
        async move { bounded(limits, attempt).await }
    })
    .await
}
