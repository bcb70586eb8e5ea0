//! Trigger reconciliation.
//!
//! Diffs a policy's old and new trigger and issues the minimal set of
//! scheduler operations to make the scheduler match the new declaration:
//! no orphaned jobs, no duplicate schedules. Cron equality is a literal
//! string comparison; any textual difference forces a reschedule even
//! when the two expressions are semantically equivalent.

use std::str::FromStr;
use std::sync::Arc;

use cron::Schedule;
use tracing::debug;

use crate::error::{AppError, Result};
use crate::models::{Policy, Trigger};
use crate::store::Scheduler;

/// Scheduler work implied by a trigger transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerDiff {
    /// No scheduler call; `carry_job_id` is the live handle carried over
    /// when old and new are the identical schedule.
    Noop { carry_job_id: Option<i64> },
    /// Release the old job.
    Unschedule { job_id: i64 },
    /// Register a new job.
    Schedule { cron: String },
    /// Release the old job, then register with the new cron.
    Reschedule { job_id: i64, cron: String },
}

/// Live scheduler handle of a trigger, if it has one.
///
/// A job handle is only meaningful while the trigger type is Scheduled;
/// a stale handle on a manual or event-based trigger is ignored.
fn live_job_id(trigger: Option<&Trigger>) -> Option<i64> {
    trigger
        .filter(|t| t.is_scheduled())
        .and_then(|t| t.settings.job_id)
        .filter(|id| *id > 0)
}

/// Compute the scheduler operations required to move from `old` to `new`.
pub fn diff(old: Option<&Trigger>, new: Option<&Trigger>) -> TriggerDiff {
    let old_job = live_job_id(old);
    let new_scheduled = new.map(Trigger::is_scheduled).unwrap_or(false);

    match (old_job, new_scheduled) {
        (Some(job_id), true) => {
            let old_cron = old.map(Trigger::cron).unwrap_or("");
            let new_cron = new.map(Trigger::cron).unwrap_or("");
            if old_cron == new_cron {
                TriggerDiff::Noop {
                    carry_job_id: Some(job_id),
                }
            } else {
                TriggerDiff::Reschedule {
                    job_id,
                    cron: new_cron.to_string(),
                }
            }
        }
        (Some(job_id), false) => TriggerDiff::Unschedule { job_id },
        (None, true) => TriggerDiff::Schedule {
            cron: new.map(Trigger::cron).unwrap_or("").to_string(),
        },
        (None, false) => TriggerDiff::Noop { carry_job_id: None },
    }
}

/// Validate a cron expression at policy-write time.
///
/// Accepts the common 5-field form by prepending a seconds field before
/// parsing.
pub fn validate_cron(cron: &str) -> Result<()> {
    if cron.trim().is_empty() {
        return Err(AppError::Validation(
            "scheduled trigger requires a cron expression".to_string(),
        ));
    }

    let normalized = if cron.split_whitespace().count() == 5 {
        format!("0 {}", cron)
    } else {
        cron.to_string()
    };

    Schedule::from_str(&normalized)
        .map(|_| ())
        .map_err(|e| AppError::Validation(format!("invalid cron expression '{}': {}", cron, e)))
}

/// Applies trigger diffs against the scheduler and installs the
/// resulting job handle into the policy.
pub struct TriggerReconciler {
    scheduler: Arc<dyn Scheduler>,
}

impl TriggerReconciler {
    pub fn new(scheduler: Arc<dyn Scheduler>) -> Self {
        Self { scheduler }
    }

    /// Reconcile `policy`'s trigger against the previous trigger state.
    ///
    /// Unschedules before scheduling on a cron change, installs the new
    /// job handle (or carries the old one over), and clears the handle
    /// when the policy leaves the scheduled state. Mutates only the
    /// in-memory policy; persisting the result is the caller's job.
    pub async fn reconcile(&self, old: Option<&Trigger>, policy: &mut Policy) -> Result<()> {
        let plan = diff(old, policy.trigger.as_ref());
        debug!(policy_id = policy.id, ?plan, "reconciling policy trigger");

        match plan {
            TriggerDiff::Noop { carry_job_id } => {
                if let Some(trigger) = policy.trigger.as_mut() {
                    trigger.settings.job_id = if trigger.is_scheduled() {
                        carry_job_id
                    } else {
                        None
                    };
                }
            }
            TriggerDiff::Unschedule { job_id } => {
                self.scheduler.unschedule(job_id).await?;
                if let Some(trigger) = policy.trigger.as_mut() {
                    trigger.settings.job_id = None;
                }
            }
            TriggerDiff::Schedule { cron } => {
                validate_cron(&cron)?;
                let job_id = self.scheduler.schedule(policy.id, &cron).await?;
                if let Some(trigger) = policy.trigger.as_mut() {
                    trigger.settings.job_id = Some(job_id);
                }
            }
            TriggerDiff::Reschedule { job_id, cron } => {
                validate_cron(&cron)?;
                self.scheduler.unschedule(job_id).await?;
                // The old handle is dead once released; clear it so a
                // failed re-registration cannot leave it behind.
                if let Some(trigger) = policy.trigger.as_mut() {
                    trigger.settings.job_id = None;
                }
                let new_job_id = self.scheduler.schedule(policy.id, &cron).await?;
                if let Some(trigger) = policy.trigger.as_mut() {
                    trigger.settings.job_id = Some(new_job_id);
                }
            }
        }

        Ok(())
    }

    /// Release a policy's live scheduled job, if any.
    pub async fn release(&self, policy: &Policy) -> Result<()> {
        if let Some(job_id) = live_job_id(policy.trigger.as_ref()) {
            debug!(policy_id = policy.id, job_id, "releasing scheduled job");
            self.scheduler.unschedule(job_id).await?;
        }
        Ok(())
    }
}
