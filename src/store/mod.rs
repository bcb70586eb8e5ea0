//! External collaborator contracts: instance store, policy store, and
//! the job scheduler.
//!
//! The controller owns no durable state; everything lives behind these
//! traits so implementations (and test fakes) can be swapped in. Each
//! collaborator is expected to provide single-record atomicity for its
//! own operations; serializing concurrent read-modify-write sequences
//! against the same policy is the policy store's concern.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Instance, Policy};

/// Keyword query passed to store list/count operations.
#[derive(Debug, Clone, Default)]
pub struct Query {
    /// Exact-match keywords, e.g. `endpoint` or `vendor`.
    pub keywords: HashMap<String, String>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

impl Query {
    /// Build a query matching a single keyword.
    pub fn with_keyword(key: &str, value: &str) -> Self {
        let mut keywords = HashMap::new();
        keywords.insert(key.to_string(), value.to_string());
        Self {
            keywords,
            ..Default::default()
        }
    }
}

/// Persistence contract for provider instances.
#[async_trait]
pub trait InstanceStore: Send + Sync {
    async fn list(&self, query: &Query) -> Result<Vec<Instance>>;

    async fn count(&self, query: &Query) -> Result<i64>;

    /// Persist a new instance and return its assigned ID.
    async fn save(&self, instance: Instance) -> Result<i64>;

    async fn get(&self, id: i64) -> Result<Instance>;

    /// Partial update restricted to the named properties.
    async fn update(&self, instance: &Instance, properties: &[&str]) -> Result<()>;

    async fn delete(&self, id: i64) -> Result<()>;
}

/// Persistence contract for preheat policies.
#[async_trait]
pub trait PolicyStore: Send + Sync {
    /// Persist a new policy and return its assigned ID.
    async fn create(&self, policy: &Policy) -> Result<i64>;

    async fn get(&self, id: i64) -> Result<Policy>;

    async fn get_by_name(&self, project_id: i64, name: &str) -> Result<Policy>;

    /// Partial update; an empty property list updates all fields.
    async fn update(&self, policy: &Policy, properties: &[&str]) -> Result<()>;

    async fn delete(&self, id: i64) -> Result<()>;

    async fn count(&self, query: &Query) -> Result<i64>;

    async fn list_policies(&self, query: &Query) -> Result<Vec<Policy>>;

    async fn list_policies_by_project(&self, project_id: i64, query: &Query)
        -> Result<Vec<Policy>>;
}

/// Time-based job scheduler contract.
///
/// The scheduler owns job-handle lifetime and is the sole source of
/// truth for whether a job is currently registered.
#[async_trait]
pub trait Scheduler: Send + Sync {
    /// Register a cron-scheduled preheat job for the given policy and
    /// return an opaque job handle.
    async fn schedule(&self, policy_id: i64, cron: &str) -> Result<i64>;

    /// Release a previously scheduled job.
    async fn unschedule(&self, job_id: i64) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_with_keyword() {
        let query = Query::with_keyword("endpoint", "http://localhost");
        assert_eq!(
            query.keywords.get("endpoint").map(String::as_str),
            Some("http://localhost")
        );
        assert!(query.page.is_none());
        assert!(query.page_size.is_none());
    }
}
