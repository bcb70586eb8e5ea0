//! Provider driver registry.
//!
//! The set of supported P2P-distribution vendors is compiled in. Each
//! driver advertises identity metadata and knows how to probe one
//! instance of its vendor for health. Resolution of a vendor string to
//! a driver happens here; an unknown vendor is a typed error, never a
//! crash.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::Serialize;

use crate::error::{AppError, Result};
use crate::models::{AuthMode, Instance};

pub mod dragonfly;
pub mod kraken;

/// Identity metadata advertised by a compiled-in driver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DriverMetadata {
    /// Vendor ID, the string instances reference in their `vendor` field.
    pub id: &'static str,
    /// Human-readable display name.
    pub name: &'static str,
    pub version: &'static str,
}

/// A vendor-specific provider driver.
#[async_trait]
pub trait Driver: Send + Sync + std::fmt::Debug {
    fn metadata(&self) -> DriverMetadata;

    /// Probe the instance this driver was constructed for. Success means
    /// the vendor's health endpoint answered 2xx; anything else is an
    /// [`AppError::Unhealthy`] wrapping the cause. Single attempt, no
    /// retry.
    async fn check_health(&self) -> Result<()>;
}

/// Every compiled-in driver's identity. Static, always succeeds.
pub fn available_providers() -> Vec<DriverMetadata> {
    vec![dragonfly::METADATA, kraken::METADATA]
}

/// Resolve an instance's vendor to a driver constructed from that
/// instance's endpoint, auth settings, and TLS flags.
pub fn resolve(instance: &Instance, probe_timeout: Duration) -> Result<Box<dyn Driver>> {
    match instance.vendor.as_str() {
        dragonfly::VENDOR => Ok(Box::new(dragonfly::DragonflyDriver::new(
            instance,
            probe_timeout,
        )?)),
        kraken::VENDOR => Ok(Box::new(kraken::KrakenDriver::new(instance, probe_timeout)?)),
        other => Err(AppError::UnsupportedVendor(other.to_string())),
    }
}

/// Build the HTTP client a driver probes with.
fn probe_client(instance: &Instance, timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .danger_accept_invalid_certs(instance.insecure)
        .build()
        .map_err(|e| AppError::Internal(format!("failed to build probe client: {e}")))
}

/// Apply the instance's credentials to an outgoing request.
fn apply_auth(
    builder: RequestBuilder,
    auth_mode: AuthMode,
    auth_info: &HashMap<String, String>,
) -> RequestBuilder {
    match auth_mode {
        AuthMode::None => builder,
        AuthMode::Basic => builder.basic_auth(
            auth_info.get("username").map(String::as_str).unwrap_or(""),
            auth_info.get("password"),
        ),
        // Custom auth sends the opaque credential payload as headers.
        AuthMode::Custom => auth_info
            .iter()
            .fold(builder, |b, (key, value)| b.header(key, value)),
    }
}

/// Issue the probe request and translate the outcome into a verdict.
async fn probe(
    client: &Client,
    endpoint: &str,
    health_path: &str,
    auth_mode: AuthMode,
    auth_info: &HashMap<String, String>,
) -> Result<()> {
    let url = format!("{}{}", endpoint.trim_end_matches('/'), health_path);
    let request = apply_auth(client.get(&url), auth_mode, auth_info);

    match request.send().await {
        Ok(resp) if resp.status().is_success() => Ok(()),
        Ok(resp) => Err(AppError::Unhealthy(
            format!("{} answered HTTP {}", url, resp.status()).into(),
        )),
        Err(e) => Err(AppError::unhealthy(e)),
    }
}
