//! Model — DroneConfig and the explicit topology table.

use std::collections::HashMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DroneConfig {
    /// Stable integer identity of this drone within the swarm.
    pub id: u32,
    pub bind_address: String,
    /// Number of drones the formation is laid out for. The angular
    /// spacing between neighbours is 360 / (ring_size - 1) degrees.
    pub ring_size: u32,
    /// Current angular position on the formation circle, degrees in [0, 360).
    pub phase_angle: f64,
    /// Distance from the formation centre.
    pub radius: f64,
    /// Explicit id -> endpoint topology table for every peer this
    /// drone may need to reach.
    pub peers: Vec<PeerEntry>,
    pub status_interval_ms: u64,
    pub motion_interval_ms: u64,
    /// Interval between reachability probes while waiting for a peer.
    pub probe_interval_ms: u64,
    /// Per-request timeout applied once a peer channel is established.
    pub request_timeout_secs: u64,
}

/// One row of the topology table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeerEntry {
    pub id: u32,
    /// gRPC URI, e.g. "http://10.0.0.12:50061".
    pub address: String,
}

impl Default for DroneConfig {
    fn default() -> Self {
        Self {
            id: 1,
            bind_address: "0.0.0.0:50061".to_string(),
            ring_size: 4,
            phase_angle: 0.0,
            radius: 1.0,
            peers: Vec::new(),
            status_interval_ms: 500,
            motion_interval_ms: 500,
            probe_interval_ms: 1000,
            request_timeout_secs: 30,
        }
    }
}

impl DroneConfig {
    /// Build the id -> endpoint lookup used by the peer client.
    pub fn topology(&self) -> HashMap<u32, String> {
        self.peers
            .iter()
            .map(|p| (p.id, p.address.clone()))
            .collect()
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), String> {
        if self.bind_address.is_empty() {
            return Err("bind_address must not be empty".to_string());
        }
        if self.ring_size < 3 {
            return Err(format!(
                "ring_size must be >= 3 so the angular spacing stays below 360 degrees (got {})",
                self.ring_size
            ));
        }
        if !(0.0..360.0).contains(&self.phase_angle) {
            return Err(format!(
                "phase_angle must be in [0, 360) degrees (got {})",
                self.phase_angle
            ));
        }
        if self.radius <= 0.0 {
            return Err(format!("radius must be > 0 (got {})", self.radius));
        }
        if self.status_interval_ms == 0 {
            return Err("status_interval_ms must be > 0".to_string());
        }
        if self.motion_interval_ms == 0 {
            return Err("motion_interval_ms must be > 0".to_string());
        }
        if self.probe_interval_ms == 0 {
            return Err("probe_interval_ms must be > 0".to_string());
        }
        if self.request_timeout_secs == 0 {
            return Err("request_timeout_secs must be > 0".to_string());
        }
        let mut seen = std::collections::HashSet::new();
        for peer in &self.peers {
            if peer.address.is_empty() {
                return Err(format!("peer {} has an empty address", peer.id));
            }
            if !seen.insert(peer.id) {
                return Err(format!("duplicate topology entry for peer {}", peer.id));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── DroneConfig Defaults ─────────────────────────────────────

    #[test]
    fn test_drone_config_default_bind_address() {
        let cfg = DroneConfig::default();
        assert_eq!(cfg.bind_address, "0.0.0.0:50061");
    }

    #[test]
    fn test_drone_config_default_ring_size() {
        let cfg = DroneConfig::default();
        assert_eq!(cfg.ring_size, 4);
    }

    #[test]
    fn test_drone_config_default_geometry() {
        let cfg = DroneConfig::default();
        assert_eq!(cfg.phase_angle, 0.0);
        assert_eq!(cfg.radius, 1.0);
    }

    #[test]
    fn test_drone_config_default_intervals() {
        let cfg = DroneConfig::default();
        assert_eq!(cfg.status_interval_ms, 500);
        assert_eq!(cfg.motion_interval_ms, 500);
        assert_eq!(cfg.probe_interval_ms, 1000);
        assert_eq!(cfg.request_timeout_secs, 30);
    }

    // ── Validation ───────────────────────────────────────────────

    #[test]
    fn test_validate_default_passes() {
        assert!(DroneConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_small_ring() {
        let cfg = DroneConfig {
            ring_size: 2,
            ..Default::default()
        };
        let err = cfg.validate().unwrap_err();
        assert!(err.contains("ring_size"), "Error should mention ring_size: {}", err);
    }

    #[test]
    fn test_validate_rejects_phase_angle_out_of_domain() {
        let cfg = DroneConfig {
            phase_angle: 360.0,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());

        let cfg = DroneConfig {
            phase_angle: -1.0,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_non_positive_radius() {
        let cfg = DroneConfig {
            radius: 0.0,
            ..Default::default()
        };
        let err = cfg.validate().unwrap_err();
        assert!(err.contains("radius"), "Error should mention radius: {}", err);
    }

    #[test]
    fn test_validate_rejects_duplicate_peer() {
        let cfg = DroneConfig {
            peers: vec![
                PeerEntry { id: 2, address: "http://a:1".to_string() },
                PeerEntry { id: 2, address: "http://b:1".to_string() },
            ],
            ..Default::default()
        };
        let err = cfg.validate().unwrap_err();
        assert!(err.contains("duplicate"), "Error should mention the duplicate: {}", err);
    }

    #[test]
    fn test_topology_lookup() {
        let cfg = DroneConfig {
            peers: vec![
                PeerEntry { id: 2, address: "http://a:1".to_string() },
                PeerEntry { id: 3, address: "http://b:1".to_string() },
            ],
            ..Default::default()
        };
        let topology = cfg.topology();
        assert_eq!(topology.get(&2).map(String::as_str), Some("http://a:1"));
        assert_eq!(topology.get(&3).map(String::as_str), Some("http://b:1"));
        assert!(topology.get(&4).is_none());
    }

    // ── Serialization ────────────────────────────────────────────

    #[test]
    fn test_drone_config_toml_round_trip() {
        let cfg = DroneConfig::default();
        let toml_str = toml::to_string(&cfg).expect("Should serialize to TOML");
        let deserialized: DroneConfig = toml::from_str(&toml_str).expect("Should deserialize from TOML");
        assert_eq!(deserialized.id, cfg.id);
        assert_eq!(deserialized.ring_size, cfg.ring_size);
        assert_eq!(deserialized.bind_address, cfg.bind_address);
    }

    #[test]
    fn test_drone_config_deserialize_partial_toml() {
        // Only set id and ring_size; rest should use defaults via #[serde(default)]
        let toml_str = r#"
            id = 7
            ring_size = 6

            [[peers]]
            id = 8
            address = "http://127.0.0.1:50068"
        "#;
        let cfg: DroneConfig = toml::from_str(toml_str).expect("Should accept partial TOML");
        assert_eq!(cfg.id, 7);
        assert_eq!(cfg.ring_size, 6);
        assert_eq!(cfg.bind_address, "0.0.0.0:50061"); // default
        assert_eq!(cfg.peers.len(), 1);
        assert_eq!(cfg.peers[0].id, 8);
    }
}
