//! Configuration management for the Rally server.
//!
//! This module handles loading, validation, and conversion of server configuration
//! from TOML files and command-line arguments.

use rally_core::{Coordinates, GameRules, Post, Task};
use rally_server::ServerConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::info;

/// Application configuration loaded from TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Network settings
    pub server: ServerSettings,
    /// Game rules shared by the stores and the engine
    #[serde(default)]
    pub game: GameRules,
    /// Logging configuration settings
    pub logging: LoggingSettings,
    /// Teams allowed to play, seeded into the identity resolver
    #[serde(default)]
    pub teams: Vec<TeamSettings>,
    /// Posts created at startup
    #[serde(default)]
    pub posts: Vec<PostSettings>,
}

/// Server-specific configuration settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Network address to bind the server to (e.g., "127.0.0.1:8080")
    pub bind_address: String,
    /// Maximum number of concurrent client connections
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
    /// Largest accepted request frame in bytes
    #[serde(default = "default_max_message_size")]
    pub max_message_size: usize,
    /// Serve `admin:*` routes on this listener (trusted networks only)
    #[serde(default)]
    pub enable_admin_routes: bool,
}

/// Default for max_connections
fn default_max_connections() -> usize {
    1000
}

fn default_max_message_size() -> usize {
    64 * 1024
}

/// Logging system configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log level filter (trace, debug, info, warn, error)
    pub level: String,
    /// Whether to output logs in JSON format
    #[serde(default)]
    pub json_format: bool,
}

/// One team account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamSettings {
    pub identity: String,
    pub display_name: String,
    pub credential: String,
}

/// One post to create at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostSettings {
    pub id: String,
    pub longitude: f64,
    pub latitude: f64,
    pub task_text: String,
    #[serde(default)]
    pub is_url: bool,
    pub solution: String,
}

impl PostSettings {
    /// Builds the post, validating its coordinates.
    pub fn to_post(&self) -> Result<Post, rally_core::GeoError> {
        Ok(Post {
            id: self.id.clone(),
            coordinates: Coordinates::new(self.longitude, self.latitude)?,
            task: Task {
                text: self.task_text.clone(),
                is_url: self.is_url,
            },
            solution: self.solution.clone(),
        })
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerSettings {
                bind_address: "127.0.0.1:8080".to_string(),
                max_connections: default_max_connections(),
                max_message_size: default_max_message_size(),
                enable_admin_routes: false,
            },
            game: GameRules::default(),
            logging: LoggingSettings {
                level: "info".to_string(),
                json_format: false,
            },
            teams: Vec::new(),
            posts: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from a TOML file.
    ///
    /// If the file doesn't exist, a default configuration file is written at
    /// `path` and the defaults are returned.
    pub async fn load_from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        if path.exists() {
            let content = tokio::fs::read_to_string(path).await?;
            let config: AppConfig = toml::from_str(&content)?;
            Ok(config)
        } else {
            let default_config = AppConfig::default();
            let toml_content = toml::to_string_pretty(&default_config)?;
            tokio::fs::write(path, toml_content).await?;
            info!("Created default configuration file: {}", path.display());
            Ok(default_config)
        }
    }

    /// Converts the network section into the transport's configuration.
    pub fn to_server_config(&self) -> Result<ServerConfig, Box<dyn std::error::Error>> {
        Ok(ServerConfig {
            bind_address: self.server.bind_address.parse()?,
            max_connections: self.server.max_connections,
            max_message_size: self.server.max_message_size,
            enable_admin_routes: self.server.enable_admin_routes,
        })
    }

    /// Validates the configuration settings.
    pub fn validate(&self) -> Result<(), String> {
        if self.server.bind_address.parse::<std::net::SocketAddr>().is_err() {
            return Err(format!(
                "Invalid bind address: {}",
                &self.server.bind_address
            ));
        }
        if self.server.max_connections == 0 {
            return Err("server.max_connections must be greater than 0".to_string());
        }
        if self.server.max_message_size == 0 {
            return Err("server.max_message_size must be greater than 0".to_string());
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(format!(
                "Invalid log level: {}. Must be one of: {valid_levels:?}",
                &self.logging.level
            ));
        }

        if let Err(e) = self.game.eviction_policy() {
            return Err(format!("game.freshness_window_secs: {e}"));
        }
        if !self.game.reach_radius_meters.is_finite() || self.game.reach_radius_meters <= 0.0 {
            return Err(format!(
                "game.reach_radius_meters must be a positive number, got {}",
                self.game.reach_radius_meters
            ));
        }
        if self.game.sweep_interval_ms == 0 {
            return Err("game.sweep_interval_ms must be greater than 0".to_string());
        }
        if self.game.index_shards == 0 {
            return Err("game.index_shards must be greater than 0".to_string());
        }

        let mut identities = HashSet::new();
        for team in &self.teams {
            if team.identity.is_empty() {
                return Err("Team identity cannot be empty".to_string());
            }
            if !identities.insert(team.identity.as_str()) {
                return Err(format!("Duplicate team identity: {}", team.identity));
            }
        }

        let mut post_ids = HashSet::new();
        for post in &self.posts {
            if post.id.is_empty() {
                return Err("Post id cannot be empty".to_string());
            }
            if !post_ids.insert(post.id.as_str()) {
                return Err(format!("Duplicate post id: {}", post.id));
            }
            if let Err(e) = post.to_post() {
                return Err(format!("Post '{}': {e}", post.id));
            }
        }

        Ok(())
    }
}
