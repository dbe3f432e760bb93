//! Load — config loading from file and environment variables.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use super::model::DroneConfig;

impl DroneConfig {
    /// Load configuration from file or environment variables
    /// Priority: Environment Variables > Config File > Defaults
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        let config_path = std::env::var("DRONE_CONFIG_FILE")
            .unwrap_or_else(|_| "/etc/ringform/drone.toml".to_string());

        let mut config = if Path::new(&config_path).exists() {
            tracing::info!("Loading configuration from: {}", config_path);
            Self::from_file(&config_path)?
        } else {
            tracing::info!("Config file not found at {}, using environment variables", config_path);
            Self::from_env()
        };

        // Environment variables override file config for critical settings
        if let Ok(id) = std::env::var("DRONE_ID") {
            config.id = id.parse()?;
        }
        if let Ok(bind) = std::env::var("DRONE_BIND_ADDRESS") {
            config.bind_address = bind;
        }
        if let Ok(n) = std::env::var("DRONE_RING_SIZE") {
            config.ring_size = n.parse()?;
        }
        if let Ok(angle) = std::env::var("DRONE_PHASE_ANGLE") {
            config.phase_angle = angle.parse()?;
        }
        if let Ok(radius) = std::env::var("DRONE_RADIUS") {
            config.radius = radius.parse()?;
        }

        Ok(config)
    }

    /// Load configuration from TOML file
    pub fn from_file(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        let config: DroneConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from environment variables with sensible defaults.
    /// The topology table cannot be expressed through the environment;
    /// a file is required for anything beyond a single isolated node.
    pub fn from_env() -> Self {
        let defaults = DroneConfig::default();
        Self {
            id: std::env::var("DRONE_ID")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.id),
            bind_address: std::env::var("DRONE_BIND_ADDRESS")
                .unwrap_or(defaults.bind_address),
            ring_size: std::env::var("DRONE_RING_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.ring_size),
            phase_angle: std::env::var("DRONE_PHASE_ANGLE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.phase_angle),
            radius: std::env::var("DRONE_RADIUS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.radius),
            peers: Vec::new(),
            status_interval_ms: std::env::var("DRONE_STATUS_INTERVAL_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.status_interval_ms),
            motion_interval_ms: std::env::var("DRONE_MOTION_INTERVAL_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.motion_interval_ms),
            probe_interval_ms: std::env::var("DRONE_PROBE_INTERVAL_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.probe_interval_ms),
            request_timeout_secs: std::env::var("DRONE_REQUEST_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.request_timeout_secs),
        }
    }
}
