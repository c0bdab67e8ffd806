// ── Composite workflows ──
//
// Multi-step orchestrations implemented as inherent methods on
// `ObjectManager`, one file per workflow. Steps are awaited strictly in
// order; each one races the caller's cancellation token so a cancelled
// workflow drops its in-flight request.

mod allocation;
mod drift;
mod ptr;
mod zone_roles;

use std::future::Future;

use tokio_util::sync::CancellationToken;

use crate::error::CoreError;

pub use allocation::{AllocatedResource, IpAllocation};
pub use drift::{Observed, PropertyBag, Snapshot, observe};
pub use zone_roles::{RoleEffect, RoleStep, plan_role_changes};

/// Run one workflow step unless the token fires first.
pub(crate) async fn step<T, F>(
    cancel: &CancellationToken,
    operation: &str,
    fut: F,
) -> Result<T, CoreError>
where
    F: Future<Output = Result<T, CoreError>>,
{
    match cancel.run_until_cancelled(fut).await {
        Some(result) => result,
        None => Err(CoreError::Cancelled {
            operation: operation.to_owned(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn cancelled_step_reports_operation() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result: Result<(), CoreError> =
            step(&cancel, "create host record", std::future::pending()).await;
        assert!(matches!(result, Err(CoreError::Cancelled { .. })));
    }

    #[tokio::test]
    async fn live_step_returns_result() {
        let cancel = CancellationToken::new();
        let result = step(&cancel, "noop", async { Ok::<_, CoreError>(7) }).await;
        assert!(matches!(result, Ok(7)));
    }
}
