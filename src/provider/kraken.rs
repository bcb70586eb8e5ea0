//! Kraken provider driver.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use super::{probe, probe_client, Driver, DriverMetadata};
use crate::error::Result;
use crate::models::{AuthMode, Instance};

pub const VENDOR: &str = "kraken";

pub const METADATA: DriverMetadata = DriverMetadata {
    id: VENDOR,
    name: "Kraken",
    version: "0.1.x",
};

/// Kraken exposes its liveness probe at /health.
const HEALTH_PATH: &str = "/health";

#[derive(Debug)]
pub struct KrakenDriver {
    client: Client,
    endpoint: String,
    auth_mode: AuthMode,
    auth_info: HashMap<String, String>,
}

impl KrakenDriver {
    pub fn new(instance: &Instance, probe_timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: probe_client(instance, probe_timeout)?,
            endpoint: instance.endpoint.clone(),
            auth_mode: instance.auth_mode,
            auth_info: instance.auth_info.clone(),
        })
    }
}

#[async_trait]
impl Driver for KrakenDriver {
    fn metadata(&self) -> DriverMetadata {
        METADATA
    }

    async fn check_health(&self) -> Result<()> {
        probe(
            &self.client,
            &self.endpoint,
            HEALTH_PATH,
            self.auth_mode,
            &self.auth_info,
        )
        .await
    }
}
