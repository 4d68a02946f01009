//! Timeout enforcement.
//!
//! # Responsibilities
//! - Wrap backend calls with a deadline
//! - Translate transport errors and expired deadlines into gateway errors
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - Timeout errors are distinct from other errors
//! - Timed-out requests return 504 Gateway Timeout
//! - No retries: every failure produces an immediate response

use std::error::Error as StdError;
use std::future::Future;
use std::time::Duration;

use crate::http::response::GatewayError;

/// Await `call`, failing with [`GatewayError::Timeout`] once `deadline` passes.
pub async fn with_deadline<F, T, E>(deadline: Duration, call: F) -> Result<T, GatewayError>
where
    F: Future<Output = Result<T, E>>,
    E: StdError + 'static,
{
    match tokio::time::timeout(deadline, call).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(GatewayError::upstream(&e)),
        Err(_) => Err(GatewayError::Timeout(deadline)),
    }
}
