//! Server Implementation
//!
//! HTTP 服务器与后台任务的启动和管理

use std::time::Duration;
use tokio::net::TcpListener;

use crate::channel::ChannelServer;
use crate::core::{BackgroundTasks, Config, ServerState, TaskKind};
use crate::utils::{AppError, AppResult};

/// KDS 核心服务
pub struct Server {
    config: Config,
    state: Option<ServerState>,
}

impl Server {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            state: None,
        }
    }

    /// Create server with existing state (for tests and embedding)
    pub fn with_state(config: Config, state: ServerState) -> Self {
        Self {
            config,
            state: Some(state),
        }
    }

    pub async fn run(&self) -> AppResult<()> {
        // Create application state if not provided
        let state = match &self.state {
            Some(s) => s.clone(),
            None => ServerState::initialize(&self.config),
        };

        let mut tasks = BackgroundTasks::new();

        // Periodic snapshot refresh: poll the upstream Orders API for every
        // room with live subscribers. The poll is the source of truth; pushed
        // events only reduce latency.
        {
            let refresh_state = state.clone();
            let interval = Duration::from_secs(self.config.snapshot_refresh_seconds.max(1));
            let token = tasks.shutdown_token();
            tasks.spawn("snapshot_refresh", TaskKind::Periodic, async move {
                let mut ticker = tokio::time::interval(interval);
                ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
                loop {
                    tokio::select! {
                        _ = token.cancelled() => break,
                        _ = ticker.tick() => {
                            for room in refresh_state.hub.active_rooms() {
                                if let Err(e) = refresh_state.refresh_room(&room).await {
                                    tracing::warn!(room = %room, error = %e, "Snapshot refresh failed");
                                }
                            }
                        }
                    }
                }
            });
        }

        // TCP event channel
        {
            let channel_addr = format!("0.0.0.0:{}", self.config.channel_tcp_port);
            let channel = ChannelServer::new(channel_addr, state.hub.clone());
            let token = tasks.shutdown_token();
            tasks.spawn("channel_server", TaskKind::Listener, async move {
                if let Err(e) = channel.serve(token).await {
                    tracing::error!("Channel server failed: {}", e);
                }
            });
        }

        tasks.log_summary();

        let addr = std::net::SocketAddr::from(([0, 0, 0, 0], self.config.http_port));
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to bind {}: {}", addr, e)))?;

        tracing::info!("KDS server starting on {}", addr);
        tracing::info!(
            "Event channel listening on tcp://0.0.0.0:{}",
            self.config.channel_tcp_port
        );

        let app = crate::routes::build_app(state.clone());
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = tokio::signal::ctrl_c().await;
                tracing::info!("Shutting down...");
            })
            .await
            .map_err(|e| AppError::Internal(format!("HTTP server error: {}", e)))?;

        tasks.shutdown().await;

        Ok(())
    }
}
