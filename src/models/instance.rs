//! Provider instance model.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Authentication mode used when talking to a provider instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AuthMode {
    #[default]
    None,
    Basic,
    Custom,
}

impl std::fmt::Display for AuthMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthMode::None => write!(f, "NONE"),
            AuthMode::Basic => write!(f, "BASIC"),
            AuthMode::Custom => write!(f, "CUSTOM"),
        }
    }
}

/// Health status of a provider instance.
///
/// The status is only written by callers of the health-check API; a
/// failed probe by itself never mutates the stored status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstanceStatus {
    Healthy,
    Unhealthy,
    #[default]
    Unknown,
}

impl std::fmt::Display for InstanceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InstanceStatus::Healthy => write!(f, "healthy"),
            InstanceStatus::Unhealthy => write!(f, "unhealthy"),
            InstanceStatus::Unknown => write!(f, "unknown"),
        }
    }
}

/// A registered P2P-distribution backend.
///
/// `vendor` names the provider driver for this instance. It is recorded
/// as-is at creation time; resolution against the driver registry only
/// happens when a health check or preheat dispatch needs the driver, so
/// an instance may reference a vendor whose driver ships later.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Instance {
    /// Numeric ID assigned by the instance store.
    #[serde(default)]
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub vendor: String,
    pub endpoint: String,
    #[serde(default)]
    pub auth_mode: AuthMode,
    /// Opaque, vendor-specific credential payload.
    #[serde(default)]
    pub auth_info: HashMap<String, String>,
    #[serde(default)]
    pub enabled: bool,
    /// At most one instance may be the default; enforced at write time.
    #[serde(default)]
    pub is_default: bool,
    /// Skip TLS verification when probing this instance.
    #[serde(default)]
    pub insecure: bool,
    #[serde(default)]
    pub status: InstanceStatus,
    #[serde(default)]
    pub setup_timestamp: Option<DateTime<Utc>>,
}
