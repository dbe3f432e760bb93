//! Configuration for the formation orchestrator: the ring order and
//! the drone endpoint table.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Drone ids in ring order. Each drone's right neighbour is the
    /// next entry (wrapping), its left neighbour the previous one.
    pub ring: Vec<u32>,
    /// The drone elected anchor when the ring is formed.
    pub anchor: u32,
    /// Endpoint table for every drone the orchestrator may contact.
    pub drones: Vec<DroneEndpoint>,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DroneEndpoint {
    pub id: u32,
    /// gRPC URI, e.g. "http://10.0.0.12:50061".
    pub address: String,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            ring: Vec::new(),
            anchor: 1,
            drones: Vec::new(),
            request_timeout_secs: 30,
        }
    }
}

impl OrchestratorConfig {
    pub fn load(path: Option<&str>) -> Result<Self> {
        // Start with compile-time defaults as the foundation
        let defaults = config::Config::try_from(&OrchestratorConfig::default())
            .context("Failed to serialize default configuration")?;

        let mut builder = config::Config::builder().add_source(defaults);

        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path));
        } else {
            // Layer config files (overrides defaults)
            let config_paths = vec![
                "/etc/ringform/orchestrator",
                "config/orchestrator",
                "crates/orchestrator/config/orchestrator",
            ];
            for path in config_paths {
                builder = builder.add_source(config::File::with_name(path).required(false));
            }
        }

        // Layer environment variables (overrides everything)
        // Use double underscore for nested keys: ORCHESTRATOR_ANCHOR
        builder = builder.add_source(
            config::Environment::with_prefix("ORCHESTRATOR")
                .separator("__")
                .try_parsing(true),
        );

        builder
            .build()
            .context("Failed to build configuration")?
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Build the id -> endpoint lookup used by the drone client.
    pub fn topology(&self) -> HashMap<u32, String> {
        self.drones
            .iter()
            .map(|d| (d.id, d.address.clone()))
            .collect()
    }

    pub fn validate(&self) -> Result<()> {
        if self.ring.len() < 3 {
            anyhow::bail!(
                "ring must name at least 3 drones (got {})",
                self.ring.len()
            );
        }
        let mut seen = HashSet::new();
        for id in &self.ring {
            if !seen.insert(*id) {
                anyhow::bail!("drone {} appears twice in the ring order", id);
            }
        }
        if !seen.contains(&self.anchor) {
            anyhow::bail!("anchor {} is not part of the ring", self.anchor);
        }
        let topology = self.topology();
        for id in &self.ring {
            if !topology.contains_key(id) {
                anyhow::bail!("ring member {} has no endpoint entry", id);
            }
        }
        let mut endpoints = HashSet::new();
        for drone in &self.drones {
            if drone.address.is_empty() {
                anyhow::bail!("drone {} has an empty address", drone.id);
            }
            if !endpoints.insert(drone.id) {
                anyhow::bail!("duplicate endpoint entry for drone {}", drone.id);
            }
        }
        if self.request_timeout_secs == 0 {
            anyhow::bail!("request_timeout_secs must be > 0");
        }
        Ok(())
    }
}
