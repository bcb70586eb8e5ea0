//! Preheat controller service.
//!
//! Composition root for the instance and policy lifecycle: validates
//! input, delegates persistence to the instance/policy stores, and
//! orchestrates the trigger reconciler and provider health dispatch
//! around those calls. The service is stateless between calls; all
//! durable state lives in the stores and the scheduler.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::{Instance, Policy};
use crate::provider::{self, DriverMetadata};
use crate::services::trigger_reconciler::{validate_cron, TriggerReconciler};
use crate::store::{InstanceStore, PolicyStore, Query, Scheduler};

pub struct PreheatService {
    instances: Arc<dyn InstanceStore>,
    policies: Arc<dyn PolicyStore>,
    reconciler: TriggerReconciler,
    config: Config,
}

impl PreheatService {
    pub fn new(
        instances: Arc<dyn InstanceStore>,
        policies: Arc<dyn PolicyStore>,
        scheduler: Arc<dyn Scheduler>,
        config: Config,
    ) -> Self {
        Self {
            instances,
            policies,
            reconciler: TriggerReconciler::new(scheduler),
            config,
        }
    }

    // -----------------------------------------------------------------------
    // Providers
    // -----------------------------------------------------------------------

    /// Identity metadata for every compiled-in provider driver.
    pub fn get_available_providers(&self) -> Vec<DriverMetadata> {
        provider::available_providers()
    }

    /// Probe an instance's backend through its vendor driver.
    ///
    /// Reports the verdict only; persisting an updated status is the
    /// caller's choice, a failed probe mutates nothing here.
    pub async fn check_health(&self, instance: Option<&Instance>) -> Result<()> {
        let instance = instance
            .ok_or_else(|| AppError::Validation("instance is required".to_string()))?;
        if instance.endpoint.trim().is_empty() {
            return Err(AppError::Validation(
                "instance endpoint is required".to_string(),
            ));
        }

        let timeout = Duration::from_secs(self.config.health_check_timeout_secs);
        let driver = provider::resolve(instance, timeout)?;
        driver.check_health().await
    }

    // -----------------------------------------------------------------------
    // Instances
    // -----------------------------------------------------------------------

    pub async fn list_instances(&self, query: &Query) -> Result<Vec<Instance>> {
        self.instances.list(query).await
    }

    /// Register a provider instance and return its assigned ID.
    ///
    /// The endpoint must be unique across all instances. The vendor is
    /// recorded as-is: an unregistered vendor is accepted here and only
    /// fails at health-check or dispatch time, so instances may be
    /// created ahead of their driver.
    pub async fn create_instance(&self, mut instance: Instance) -> Result<i64> {
        if instance.endpoint.trim().is_empty() {
            return Err(AppError::Validation(
                "instance endpoint is required".to_string(),
            ));
        }
        if instance.vendor.trim().is_empty() {
            return Err(AppError::Validation(
                "instance vendor is required".to_string(),
            ));
        }

        let existing = self
            .instances
            .count(&Query::with_keyword("endpoint", &instance.endpoint))
            .await?;
        if existing > 0 {
            return Err(AppError::Conflict(format!(
                "instance with endpoint {} already exists",
                instance.endpoint
            )));
        }

        if instance.is_default {
            self.clear_other_defaults(0).await?;
        }

        instance.setup_timestamp = Some(Utc::now());
        let id = self.instances.save(instance).await?;
        info!(instance_id = id, "created provider instance");
        Ok(id)
    }

    pub async fn get_instance(&self, id: i64) -> Result<Instance> {
        self.instances.get(id).await
    }

    /// Partial update restricted to the named properties.
    pub async fn update_instance(&self, instance: &Instance, properties: &[&str]) -> Result<()> {
        if properties.is_empty() {
            return Err(AppError::Validation(
                "no properties provided to update".to_string(),
            ));
        }

        if properties.contains(&"endpoint") {
            let matches = self
                .instances
                .list(&Query::with_keyword("endpoint", &instance.endpoint))
                .await?;
            if matches.iter().any(|other| other.id != instance.id) {
                return Err(AppError::Conflict(format!(
                    "instance with endpoint {} already exists",
                    instance.endpoint
                )));
            }
        }

        if properties.contains(&"default") && instance.is_default {
            self.clear_other_defaults(instance.id).await?;
        }

        self.instances.update(instance, properties).await?;
        info!(instance_id = instance.id, ?properties, "updated provider instance");
        Ok(())
    }

    pub async fn delete_instance(&self, id: i64) -> Result<()> {
        self.instances.delete(id).await?;
        info!(instance_id = id, "deleted provider instance");
        Ok(())
    }

    /// At most one instance may be the default. Clears the flag on every
    /// other instance currently carrying it.
    async fn clear_other_defaults(&self, keep_id: i64) -> Result<()> {
        let defaults = self
            .instances
            .list(&Query::with_keyword("default", "true"))
            .await?;
        for mut other in defaults {
            if other.id == keep_id || !other.is_default {
                continue;
            }
            other.is_default = false;
            self.instances.update(&other, &["default"]).await?;
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Policies
    // -----------------------------------------------------------------------

    pub async fn count_policies(&self, query: &Query) -> Result<i64> {
        self.policies.count(query).await
    }

    pub async fn get_policy(&self, id: i64) -> Result<Policy> {
        let mut policy = self.policies.get(id).await?;
        policy.decode()?;
        Ok(policy)
    }

    pub async fn get_policy_by_name(&self, project_id: i64, name: &str) -> Result<Policy> {
        let mut policy = self.policies.get_by_name(project_id, name).await?;
        policy.decode()?;
        Ok(policy)
    }

    pub async fn list_policies(&self, query: &Query) -> Result<Vec<Policy>> {
        let mut policies = self.policies.list_policies(query).await?;
        for policy in &mut policies {
            policy.decode()?;
        }
        Ok(policies)
    }

    pub async fn list_policies_by_project(
        &self,
        project_id: i64,
        query: &Query,
    ) -> Result<Vec<Policy>> {
        let mut policies = self
            .policies
            .list_policies_by_project(project_id, query)
            .await?;
        for policy in &mut policies {
            policy.decode()?;
        }
        Ok(policies)
    }

    /// Create a policy and, for scheduled triggers, register its job.
    ///
    /// The record is persisted first to obtain an ID, then the job is
    /// registered and the trigger (now holding the job handle) written
    /// back. A failure after the record exists rolls the record back, and
    /// a failure after the job exists releases the job, so no policy is
    /// left in the scheduled state without a live handle and no job
    /// outlives its policy.
    pub async fn create_policy(&self, policy: &mut Policy) -> Result<i64> {
        if policy.name.trim().is_empty() {
            return Err(AppError::Validation("policy name is required".to_string()));
        }
        policy.decode()?;
        if let Some(trigger) = &policy.trigger {
            if trigger.is_scheduled() {
                validate_cron(trigger.cron())?;
            }
        }

        let now = Utc::now();
        policy.created_at = Some(now);
        policy.updated_time = Some(now);
        policy.encode()?;

        let id = self.policies.create(policy).await?;
        policy.id = id;

        if let Err(e) = self.reconciler.reconcile(None, policy).await {
            self.rollback_created_policy(policy).await;
            return Err(e);
        }

        let scheduled = policy
            .trigger
            .as_ref()
            .map(|t| t.is_scheduled())
            .unwrap_or(false);
        if scheduled {
            policy.encode()?;
            if let Err(e) = self.policies.update(policy, &["trigger"]).await {
                if let Err(release_err) = self.reconciler.release(policy).await {
                    warn!(
                        policy_id = id,
                        error = %release_err,
                        "failed to release job while rolling back policy creation"
                    );
                }
                self.rollback_created_policy(policy).await;
                return Err(e);
            }
        }

        info!(policy_id = id, name = %policy.name, "created preheat policy");
        Ok(id)
    }

    /// Best-effort removal of a policy record created earlier in a
    /// sequence that subsequently failed.
    async fn rollback_created_policy(&self, policy: &Policy) {
        if let Err(e) = self.policies.delete(policy.id).await {
            warn!(
                policy_id = policy.id,
                error = %e,
                "failed to roll back created policy record"
            );
        }
    }

    /// Update a policy, reconciling its trigger against the stored one.
    ///
    /// The scheduler sees the minimal set of operations for the
    /// transition; an unchanged schedule carries its job handle over
    /// without any scheduler call.
    pub async fn update_policy(&self, policy: &mut Policy, properties: &[&str]) -> Result<()> {
        let mut old = self.policies.get(policy.id).await?;
        old.decode()?;
        policy.decode()?;

        if let Some(trigger) = &policy.trigger {
            if trigger.is_scheduled() {
                validate_cron(trigger.cron())?;
            }
        }

        self.reconciler
            .reconcile(old.trigger.as_ref(), policy)
            .await?;

        policy.updated_time = Some(Utc::now());
        policy.encode()?;
        self.policies.update(policy, properties).await?;

        info!(policy_id = policy.id, name = %policy.name, "updated preheat policy");
        Ok(())
    }

    /// Delete a policy, releasing its scheduled job first so no job
    /// survives referencing a deleted policy.
    pub async fn delete_policy(&self, id: i64) -> Result<()> {
        let mut policy = self.policies.get(id).await?;
        policy.decode()?;

        self.reconciler.release(&policy).await?;
        self.policies.delete(id).await?;

        info!(policy_id = id, "deleted preheat policy");
        Ok(())
    }
}
