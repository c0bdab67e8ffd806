// Zone server-role reconciliation
//
// Brings a zone's deployment roles in line with the desired
// `"ROLE, server_fqdn"` list. Every applied change is recorded on a trace;
// if a later step fails (or the caller cancels), the trace is replayed in
// reverse with inverse operations before the error is returned.

use std::collections::BTreeMap;

use ipam_api::entity::{RoleAssignment, ServerRole};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::step;
use crate::error::{CoreError, RollbackOutcome};
use crate::manager::ObjectManager;

/// One planned change, in execution order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleStep {
    Delete { server: String, role: ServerRole },
    Update {
        server: String,
        from: ServerRole,
        to: ServerRole,
    },
    Create { server: String, role: ServerRole },
}

/// One applied change, with what is needed to undo it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleEffect {
    Created { server: String, role: ServerRole },
    Deleted { server: String, role: ServerRole },
    Updated { server: String, previous: ServerRole },
}

/// Order the changes turning `current` into `desired`.
///
/// Deletions first, then role changes on servers currently holding a
/// primary role, then the remaining role changes, then creations.
pub fn plan_role_changes(
    current: &BTreeMap<String, ServerRole>,
    desired: &BTreeMap<String, ServerRole>,
) -> Vec<RoleStep> {
    let mut steps = Vec::new();

    for (server, &role) in current {
        if !desired.contains_key(server) {
            steps.push(RoleStep::Delete {
                server: server.clone(),
                role,
            });
        }
    }

    let changed: Vec<(&String, ServerRole, ServerRole)> = current
        .iter()
        .filter_map(|(server, &from)| match desired.get(server) {
            Some(&to) if to != from => Some((server, from, to)),
            _ => None,
        })
        .collect();
    let (primary, rest): (Vec<_>, Vec<_>) =
        changed.into_iter().partition(|(_, from, _)| from.is_primary());
    for (server, from, to) in primary.into_iter().chain(rest) {
        steps.push(RoleStep::Update {
            server: server.clone(),
            from,
            to,
        });
    }

    for (server, &role) in desired {
        if !current.contains_key(server) {
            steps.push(RoleStep::Create {
                server: server.clone(),
                role,
            });
        }
    }

    steps
}

impl ObjectManager {
    /// Reconcile the deployment roles of `zone` with `desired`.
    ///
    /// Each entry is `"ROLE, server_fqdn"`; every named server must exist.
    /// Returns the applied effects in order. On failure the error is a
    /// [`CoreError::Workflow`] carrying the rollback outcome.
    pub async fn reconcile_server_roles(
        &self,
        cfg: &str,
        view: &str,
        zone: &str,
        desired: &[String],
        cancel: &CancellationToken,
    ) -> Result<Vec<RoleEffect>, CoreError> {
        let desired = self.validate_role_assignments(cfg, desired, cancel).await?;

        let listed = step(
            cancel,
            "list deployment roles",
            self.list_deployment_roles(cfg, view, zone),
        )
        .await?;
        let mut current = BTreeMap::new();
        for role in &listed {
            current.insert(role.fqdn(), role.server_role()?);
        }

        let steps = plan_role_changes(&current, &desired);
        if steps.is_empty() {
            return Ok(Vec::new());
        }
        info!(zone, changes = steps.len(), "reconciling server roles");

        let mut trace = Vec::with_capacity(steps.len());
        for planned in &steps {
            match self.apply_role_step(cfg, view, zone, planned, cancel).await {
                Ok(effect) => trace.push(effect),
                Err(source) => {
                    let rollback = self.undo_role_effects(cfg, view, zone, &trace).await;
                    return Err(CoreError::Workflow {
                        operation: format!("reconcile server roles of zone {zone}"),
                        source: Box::new(source),
                        rollback,
                    });
                }
            }
        }
        Ok(trace)
    }

    /// Parse each entry and check that its server exists.
    async fn validate_role_assignments(
        &self,
        cfg: &str,
        desired: &[String],
        cancel: &CancellationToken,
    ) -> Result<BTreeMap<String, ServerRole>, CoreError> {
        let mut wanted = BTreeMap::new();
        for raw in desired {
            let assignment: RoleAssignment = raw.parse()?;
            if wanted.contains_key(&assignment.server_fqdn) {
                return Err(CoreError::validation(
                    "server_roles",
                    format!("server {} listed twice", assignment.server_fqdn),
                ));
            }
            step(cancel, "look up server", self.get_server(cfg, &assignment.server_fqdn))
                .await
                .map_err(|e| {
                    if e.is_not_found() {
                        CoreError::validation(
                            "server_roles",
                            format!("server {} does not exist", assignment.server_fqdn),
                        )
                    } else {
                        e
                    }
                })?;
            wanted.insert(assignment.server_fqdn, assignment.role);
        }
        Ok(wanted)
    }

    async fn apply_role_step(
        &self,
        cfg: &str,
        view: &str,
        zone: &str,
        planned: &RoleStep,
        cancel: &CancellationToken,
    ) -> Result<RoleEffect, CoreError> {
        match planned {
            RoleStep::Delete { server, role } => {
                step(
                    cancel,
                    "delete deployment role",
                    self.delete_deployment_role(cfg, view, zone, server),
                )
                .await?;
                Ok(RoleEffect::Deleted {
                    server: server.clone(),
                    role: *role,
                })
            }
            RoleStep::Update { server, from, to } => {
                step(
                    cancel,
                    "update deployment role",
                    self.update_deployment_role(cfg, view, zone, server, *to),
                )
                .await?;
                Ok(RoleEffect::Updated {
                    server: server.clone(),
                    previous: *from,
                })
            }
            RoleStep::Create { server, role } => {
                step(
                    cancel,
                    "create deployment role",
                    self.create_deployment_role(cfg, view, zone, server, *role),
                )
                .await?;
                Ok(RoleEffect::Created {
                    server: server.clone(),
                    role: *role,
                })
            }
        }
    }

    /// Replay `trace` backwards with inverse operations. Not cancellable.
    ///
    /// Every inverse is attempted; the first failure is reported.
    async fn undo_role_effects(
        &self,
        cfg: &str,
        view: &str,
        zone: &str,
        trace: &[RoleEffect],
    ) -> RollbackOutcome {
        if trace.is_empty() {
            return RollbackOutcome::NotAttempted;
        }
        let mut first_failure = None;
        for effect in trace.iter().rev() {
            let undone = match effect {
                RoleEffect::Created { server, .. } => {
                    self.delete_deployment_role(cfg, view, zone, server).await
                }
                RoleEffect::Deleted { server, role } => {
                    self.create_deployment_role(cfg, view, zone, server, *role)
                        .await
                }
                RoleEffect::Updated { server, previous } => {
                    self.update_deployment_role(cfg, view, zone, server, *previous)
                        .await
                }
            };
            if let Err(e) = undone {
                warn!(zone, effect = ?effect, error = %e, "rollback step failed");
                first_failure.get_or_insert(e);
            }
        }
        match first_failure {
            None => {
                warn!(zone, undone = trace.len(), "server role changes rolled back");
                RollbackOutcome::Applied
            }
            Some(e) => RollbackOutcome::Failed(Box::new(e)),
        }
    }
}
