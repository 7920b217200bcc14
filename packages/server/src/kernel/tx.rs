//! Serializable transaction helper.
//!
//! Every workflow that reads state used by a later write runs its whole
//! read-validate-write sequence inside one SERIALIZABLE transaction. Postgres
//! aborts one side of a conflicting pair with SQLSTATE 40001 (or 40P01 for
//! deadlocks); those aborts are retryable, so the helper re-runs the entire
//! closure — reads included — up to a fixed attempt cap and only then
//! surfaces `SchedulingError::Conflict`.

use futures::future::BoxFuture;
use sqlx::{PgConnection, PgPool};

use crate::domains::scheduling::SchedulingError;

const MAX_ATTEMPTS: u32 = 3;

/// Runs `body` inside a SERIALIZABLE transaction, retrying serialization
/// failures. The closure must be safe to re-run from scratch: all reads it
/// depends on happen inside it.
pub async fn run_serializable<T, F>(
    pool: &PgPool,
    op: &'static str,
    body: F,
) -> Result<T, SchedulingError>
where
    F: for<'c> Fn(&'c mut PgConnection) -> BoxFuture<'c, Result<T, SchedulingError>>,
{
    let mut attempt = 0u32;
    loop {
        attempt += 1;

        let mut tx = pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE")
            .execute(&mut *tx)
            .await?;

        match body(&mut tx).await {
            Ok(value) => match tx.commit().await {
                Ok(()) => return Ok(value),
                Err(err) if is_serialization_failure(&err) => {
                    if attempt >= MAX_ATTEMPTS {
                        tracing::warn!(op, attempt, "serializable commit retries exhausted");
                        return Err(SchedulingError::Conflict);
                    }
                    tracing::debug!(op, attempt, "serialization failure on commit, retrying");
                }
                Err(err) => return Err(err.into()),
            },
            Err(err) if error_is_retryable(&err) => {
                let _ = tx.rollback().await;
                if attempt >= MAX_ATTEMPTS {
                    tracing::warn!(op, attempt, "serializable retries exhausted");
                    return Err(SchedulingError::Conflict);
                }
                tracing::debug!(op, attempt, "serialization failure, retrying");
            }
            Err(err) => {
                let _ = tx.rollback().await;
                return Err(err);
            }
        }
    }
}

/// Serialization aborts can surface from any statement, so data-access
/// helpers that fold sqlx errors into anyhow are downcast-checked too.
fn error_is_retryable(err: &SchedulingError) -> bool {
    let sqlx_err = match err {
        SchedulingError::Database(e) => Some(e),
        SchedulingError::Internal(e) => e.downcast_ref::<sqlx::Error>(),
        _ => None,
    };
    matches!(sqlx_err, Some(e) if is_serialization_failure(e))
}

fn is_serialization_failure(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => {
            matches!(db.code().as_deref(), Some("40001") | Some("40P01"))
        }
        _ => false,
    }
}
