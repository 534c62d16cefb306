//! Main application logic and lifecycle management.
//!
//! The `Application` builds the stores and the engine from configuration,
//! seeds teams and posts, runs the WebSocket server and the eviction sweeper,
//! and tears everything down in order on shutdown.

use crate::{
    cli::CliArgs,
    config::AppConfig,
    logging::display_banner,
    signals::{wait_for_shutdown_signal, wait_for_signal_silent},
};
use rally_core::{
    EvictionSweeper, MemoryIdentityResolver, MemoryPositionStore, MemoryPostStore, PositionStore,
    PostStore, ProximityEngine, ShutdownState, SystemClock,
};
use rally_server::GameServer;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// How long shutdown waits for each background task.
const TASK_STOP_TIMEOUT: Duration = Duration::from_secs(8);

/// Main application struct.
pub struct Application {
    /// Loaded application configuration
    config: AppConfig,
    positions: Arc<MemoryPositionStore>,
    posts: Arc<MemoryPostStore>,
    engine: Arc<ProximityEngine>,
    server: Arc<GameServer>,
}

/// Background tasks of a started application.
pub struct RunningTasks {
    server: JoinHandle<()>,
    sweeper: JoinHandle<()>,
}

impl Application {
    /// Loads configuration, applies CLI overrides and builds the application.
    ///
    /// # Process
    ///
    /// 1. Load configuration from file (creating default if missing)
    /// 2. Apply command-line argument overrides
    /// 3. Validate merged configuration
    /// 4. Build stores, engine and server, then seed teams and posts
    pub async fn new(args: CliArgs) -> Result<Self, Box<dyn std::error::Error>> {
        info!("🔧 Loading configuration from: {}", args.config_path.display());
        let mut config = AppConfig::load_from_file(&args.config_path).await?;

        if let Some(bind_address) = args.bind_address {
            config.server.bind_address = bind_address;
        }

        if let Some(log_level) = args.log_level {
            config.logging.level = log_level;
        }

        if args.json_logs {
            config.logging.json_format = true;
        }

        display_banner();
        Self::from_config(config).await
    }

    /// Builds the application from an already merged configuration.
    pub async fn from_config(config: AppConfig) -> Result<Self, Box<dyn std::error::Error>> {
        if let Err(e) = config.validate() {
            return Err(format!("Configuration validation failed: {e}").into());
        }
        info!("✅ Configuration loaded and validated successfully");

        let rules = config.game.clone();
        let positions = Arc::new(MemoryPositionStore::with_shards(
            rules.eviction_policy()?,
            rules.index_shards,
        ));
        let posts = Arc::new(MemoryPostStore::with_shards(rules.index_shards));

        let identities = MemoryIdentityResolver::new();
        for team in &config.teams {
            identities.add_user(&team.identity, &team.display_name, &team.credential);
        }

        let engine = Arc::new(ProximityEngine::new(
            positions.clone(),
            posts.clone(),
            Arc::new(identities),
            Arc::new(SystemClock),
            rules,
        ));

        for post in &config.posts {
            engine.create_post(post.to_post()?).await?;
        }
        info!(
            "🌱 Seeded {} team(s) and {} post(s)",
            config.teams.len(),
            config.posts.len()
        );

        let server = Arc::new(GameServer::new(config.to_server_config()?, engine.clone()));

        Ok(Self {
            config,
            positions,
            posts,
            engine,
            server,
        })
    }

    pub fn engine(&self) -> Arc<ProximityEngine> {
        self.engine.clone()
    }

    /// Runs until SIGINT/SIGTERM or a fatal server error, then shuts down.
    pub async fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        info!("🌟 Starting Rally server");
        self.log_configuration_summary();

        let shutdown_state = ShutdownState::new();
        let tasks = self.start(shutdown_state.clone());

        info!("✅ Rally server is now running!");
        info!("🎮 Ready to accept connections on {}", self.config.server.bind_address);
        info!("🛑 Press Ctrl+C to gracefully shutdown");

        tokio::select! {
            signal = wait_for_shutdown_signal() => {
                signal?;
            }
            _ = shutdown_state.wait() => {
                warn!("⚠️ Server stopped on its own, shutting down");
            }
        }

        // merciless shutdown
        tokio::spawn(async move {
            match wait_for_signal_silent().await {
                Ok(signal) => warn!("{signal} received again! I'll make this quick."),
                Err(e) => {
                    error!("Failed to set up merciless shutdown signal handler: {e}");
                    return;
                }
            }
            std::process::exit(1);
        });

        shutdown_state.initiate_shutdown();
        self.stop(tasks).await;
        Ok(())
    }

    /// Spawns the server and the eviction sweeper.
    pub fn start(&self, shutdown_state: ShutdownState) -> RunningTasks {
        let server = {
            let server = self.server.clone();
            let shutdown_state = shutdown_state.clone();
            tokio::spawn(async move {
                match server.start_with_shutdown_state(shutdown_state.clone()).await {
                    Ok(()) => {
                        info!("✅ Server completed successfully");
                    }
                    Err(e) => {
                        error!("❌ Server error: {}", e);
                        shutdown_state.initiate_shutdown();
                    }
                }
            })
        };

        let sweeper = EvictionSweeper::new(
            self.positions.clone(),
            Arc::new(SystemClock),
            self.config.game.sweep_interval(),
        )
        .spawn(shutdown_state);

        RunningTasks { server, sweeper }
    }

    /// Waits for the background tasks and closes the stores.
    ///
    /// The shutdown state passed to [`start`](Self::start) must already be
    /// triggered.
    pub async fn stop(&self, tasks: RunningTasks) {
        info!("🛑 Beginning graceful shutdown...");

        info!("📡 Phase 1: Waiting for the server to stop accepting...");
        match tokio::time::timeout(TASK_STOP_TIMEOUT, tasks.server).await {
            Ok(_) => info!("✅ Server task completed gracefully"),
            Err(_) => warn!("⏰ Server task did not complete within timeout, proceeding with cleanup"),
        }

        info!("🧹 Phase 2: Stopping eviction sweeper...");
        if tokio::time::timeout(TASK_STOP_TIMEOUT, tasks.sweeper).await.is_err() {
            warn!("⏰ Eviction sweeper did not stop within timeout");
        }

        info!("📦 Phase 3: Closing stores...");
        self.log_final_statistics().await;
        self.positions.close().await;
        self.posts.close().await;

        info!("✅ Rally server shutdown complete");
    }

    fn log_configuration_summary(&self) {
        info!("📋 Configuration Summary:");
        info!("  🌐 Bind address: {}", self.config.server.bind_address);
        info!("  👥 Max connections: {}", self.config.server.max_connections);
        info!("  🔑 Admin routes: {}", if self.config.server.enable_admin_routes { "enabled" } else { "disabled" });
        info!("  ⏱️ Freshness window: {}s", self.config.game.freshness_window_secs);
        info!("  🚩 Reach radius: {}m", self.config.game.reach_radius_meters);
        info!("  🧹 Sweep interval: {}ms", self.config.game.sweep_interval_ms);
    }

    async fn log_final_statistics(&self) {
        info!("📊 Final Statistics:");
        match self.positions.len().await {
            Ok(count) => info!("  - Positions held: {}", count),
            Err(e) => warn!("  - Positions unavailable: {}", e),
        }
        match self.posts.len().await {
            Ok(count) => info!("  - Posts: {}", count),
            Err(e) => warn!("  - Posts unavailable: {}", e),
        }
    }
}
