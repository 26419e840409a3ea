//! Publish approval workflow.
//!
//! Widening an investigation's public tier into a new exposure class
//! (see [`TierEquivalence`](crate::service::TierEquivalence)) is held
//! for approval when its projects have gatekeepers and the actor is not
//! one of them. The investigation keeps its previous tier, a
//! `waiting_for_approval` log records the request and every gatekeeper
//! gets one notification through the outbox.

use isahub_core::{Actor, new_id, now_rfc3339};
use isahub_sql::{Statement, Value};

use crate::model::{
    AccessType, Investigation, Notification, NotificationKind, PublishLog, PublishState,
};
use crate::service::{IsaError, IsaService};

/// Outcome of a requested public tier change, not yet persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct PublishPlan {
    /// Public tier to store on the investigation.
    pub applied: AccessType,
    /// The requested tier waits for a gatekeeper.
    pub held: bool,
    pub log: Option<PublishLog>,
    pub notifications: Vec<Notification>,
}

impl PublishPlan {
    fn unchanged(current: AccessType, held: bool) -> Self {
        Self {
            applied: current,
            held,
            log: None,
            notifications: Vec::new(),
        }
    }

    pub fn is_held(&self) -> bool {
        self.held
    }

    /// Statements writing the log and the outbox rows.
    pub(crate) fn statements(&self) -> Result<Vec<Statement>, IsaError> {
        let mut stmts = Vec::new();
        if let Some(ref log) = self.log {
            stmts.push(log_statement(log)?);
        }
        for n in &self.notifications {
            stmts.push(IsaService::insert_statement(
                "outbox",
                &n.id,
                n,
                &[
                    ("kind", Value::Text(n.kind.as_str().to_string())),
                    ("recipient_id", Value::Text(n.recipient_id.clone())),
                    ("investigation_id", Value::Text(n.investigation_id.clone())),
                    ("created_at", Value::Text(n.created_at.clone())),
                ],
            )?);
        }
        Ok(stmts)
    }
}

fn new_log(
    investigation_id: &str,
    state: PublishState,
    requested: AccessType,
    actor: &Actor,
) -> PublishLog {
    PublishLog {
        id: new_id(),
        investigation_id: investigation_id.to_string(),
        state,
        requested_access: requested,
        actor_id: actor.id.clone(),
        created_at: now_rfc3339(),
    }
}

fn log_statement(log: &PublishLog) -> Result<Statement, IsaError> {
    IsaService::insert_statement(
        "publish_logs",
        &log.id,
        log,
        &[
            ("investigation_id", Value::Text(log.investigation_id.clone())),
            ("state", Value::Text(log.state.as_str().to_string())),
            (
                "requested_access",
                Value::Text(log.requested_access.as_str().to_string()),
            ),
            ("actor_id", Value::Text(log.actor_id.clone())),
            ("created_at", Value::Text(log.created_at.clone())),
        ],
    )
}

impl IsaService {
    /// Decide how a change of the public tier from `current` to
    /// `requested` is applied.
    ///
    /// A request already waiting for the same tier stays as it is. Any
    /// other outcome supersedes it: a new log becomes the latest one, and
    /// returning to the current tier writes a `withdrawn` log.
    pub fn plan_publish(
        &self,
        actor: &Actor,
        investigation_id: &str,
        project_ids: &[String],
        current: AccessType,
        requested: AccessType,
    ) -> Result<PublishPlan, IsaError> {
        let pending = self.pending_request(investigation_id)?;
        if let Some(ref p) = pending {
            if p.requested_access == requested {
                return Ok(PublishPlan::unchanged(current, true));
            }
        }

        if requested == current {
            let mut plan = PublishPlan::unchanged(current, false);
            if let Some(p) = pending {
                plan.log = Some(new_log(
                    investigation_id,
                    PublishState::Withdrawn,
                    p.requested_access,
                    actor,
                ));
            }
            return Ok(plan);
        }

        if self.config.tiers.requires_approval(current, requested) {
            let gatekeepers = self.gatekeepers_of(project_ids)?;
            if !gatekeepers.is_empty() && !gatekeepers.contains(&actor.id) {
                let now = now_rfc3339();
                let notifications = gatekeepers
                    .into_iter()
                    .map(|recipient| Notification {
                        id: new_id(),
                        kind: NotificationKind::PublishApprovalRequested,
                        recipient_id: recipient,
                        investigation_id: investigation_id.to_string(),
                        requester_id: actor.id.clone(),
                        created_at: now.clone(),
                        delivered_at: None,
                    })
                    .collect();
                return Ok(PublishPlan {
                    applied: current,
                    held: true,
                    log: Some(new_log(
                        investigation_id,
                        PublishState::WaitingForApproval,
                        requested,
                        actor,
                    )),
                    notifications,
                });
            }
        }

        Ok(PublishPlan {
            applied: requested,
            held: false,
            log: Some(new_log(
                investigation_id,
                PublishState::Published,
                requested,
                actor,
            )),
            notifications: Vec::new(),
        })
    }

    /// Hand committed notifications to the mailer. Failures are logged
    /// and the row stays undelivered.
    pub(crate) fn deliver(&self, notifications: &[Notification]) {
        for n in notifications {
            if let Err(e) = self.mailer.send(n) {
                tracing::warn!(
                    notification = %n.id,
                    recipient = %n.recipient_id,
                    error = %e,
                    "notification delivery failed"
                );
                continue;
            }

            let mut delivered = n.clone();
            delivered.delivered_at = Some(now_rfc3339());
            let marked = IsaService::update_statement(
                "outbox",
                &n.id,
                &delivered,
                &[(
                    "delivered_at",
                    Value::Text(delivered.delivered_at.clone().unwrap_or_default()),
                )],
            )
            .and_then(|stmt| Ok(self.sql.exec(&stmt.sql, &stmt.params)?));
            if let Err(e) = marked {
                tracing::warn!(notification = %n.id, error = %e, "failed to mark notification delivered");
            }
        }
    }

    /// Outbox rows concerning one investigation, oldest first.
    pub fn notifications_for(&self, investigation_id: &str) -> Result<Vec<Notification>, IsaError> {
        self.query_records(
            "SELECT data FROM outbox WHERE investigation_id = ?1 ORDER BY created_at, rowid",
            &[Value::Text(investigation_id.to_string())],
        )
    }

    /// Publish history of an investigation, oldest first.
    pub fn publish_logs(&self, investigation_id: &str) -> Result<Vec<PublishLog>, IsaError> {
        self.query_records(
            "SELECT data FROM publish_logs WHERE investigation_id = ?1 ORDER BY rowid",
            &[Value::Text(investigation_id.to_string())],
        )
    }

    fn latest_log(&self, investigation_id: &str) -> Result<Option<PublishLog>, IsaError> {
        Ok(self
            .query_records::<PublishLog>(
                "SELECT data FROM publish_logs WHERE investigation_id = ?1
                 ORDER BY rowid DESC LIMIT 1",
                &[Value::Text(investigation_id.to_string())],
            )?
            .into_iter()
            .next())
    }

    /// The latest log, when it is still waiting for a decision.
    pub(crate) fn pending_request(&self, investigation_id: &str) -> Result<Option<PublishLog>, IsaError> {
        Ok(self
            .latest_log(investigation_id)?
            .filter(|log| log.state == PublishState::WaitingForApproval))
    }

    /// Requests still waiting for the caller's decision. Administrators
    /// see every waiting request.
    pub fn list_publish_requests(&self, actor: &Actor) -> Result<Vec<PublishLog>, IsaError> {
        let latest_waiting = "l.state = 'waiting_for_approval'
             AND l.rowid = (SELECT MAX(rowid) FROM publish_logs
                            WHERE investigation_id = l.investigation_id)";
        if actor.admin {
            let sql = format!(
                "SELECT l.data FROM publish_logs l WHERE {} ORDER BY l.rowid",
                latest_waiting
            );
            return self.query_records(&sql, &[]);
        }
        let sql = format!(
            "SELECT l.data FROM publish_logs l
             WHERE {}
               AND EXISTS (
                 SELECT 1 FROM investigation_projects ip
                 JOIN memberships m ON m.project_id = ip.project_id
                 WHERE ip.investigation_id = l.investigation_id
                   AND m.account_id = ?1 AND m.role = 'gatekeeper')
             ORDER BY l.rowid",
            latest_waiting
        );
        self.query_records(&sql, &[Value::Text(actor.id.clone())])
    }

    /// Approve or reject the waiting publish request of an investigation.
    pub fn decide_publish(
        &self,
        actor: Option<&Actor>,
        investigation_id: &str,
        approve: bool,
    ) -> Result<Investigation, IsaError> {
        let mut inv = self.get_investigation_record(investigation_id)?;
        let actor = actor.ok_or_else(|| IsaError::Unauthorized("login required".into()))?;

        if !actor.admin {
            let gatekeepers = self.gatekeepers_of(&inv.project_ids)?;
            if !gatekeepers.contains(&actor.id) {
                return Err(IsaError::Forbidden(format!(
                    "{} is not a gatekeeper of investigation '{}'",
                    actor.id, inv.id
                )));
            }
        }

        let Some(pending) = self.pending_request(&inv.id)? else {
            return Err(IsaError::Conflict(format!(
                "investigation '{}' has no publish request waiting",
                inv.id
            )));
        };
        if !self
            .config
            .tiers
            .requires_approval(inv.policy.access_type, pending.requested_access)
        {
            return Err(IsaError::Conflict(format!(
                "publish request for '{}' no longer matches its tier '{}'",
                inv.id,
                inv.policy.access_type.as_str()
            )));
        }

        let mut stmts = Vec::new();
        let state = if approve {
            inv.policy.access_type = pending.requested_access;
            inv.updated_at = now_rfc3339();
            stmts.push(self.investigation_update_statement(&inv)?);
            PublishState::Published
        } else {
            PublishState::Rejected
        };
        stmts.push(log_statement(&new_log(
            &inv.id,
            state,
            pending.requested_access,
            actor,
        ))?);
        self.sql.exec_batch(&stmts)?;

        tracing::info!(
            investigation = %inv.id,
            gatekeeper = %actor.id,
            decision = state.as_str(),
            requested = pending.requested_access.as_str(),
            "publish request decided"
        );
        Ok(inv)
    }
}
