//! KDS Server - 厨房显示系统核心服务
//!
//! # 架构概述
//!
//! 本模块是 KDS 服务端的主入口，提供以下核心功能：
//!
//! - **事件通道** (`channel`): 支持 TCP/Memory 传输的房间级实时事件系统
//! - **订单管线** (`orders`): 快照存储、上游订单服务契约、状态流转引擎
//! - **HTTP API** (`api`): RESTful API 接口
//! - **核心** (`core`): 配置、状态、后台任务
//!
//! # 模块结构
//!
//! ```text
//! kds-server/src/
//! ├── core/          # 配置、状态、服务器、后台任务
//! ├── channel/       # 事件通道 (房间广播 + TCP 前端)
//! ├── orders/        # 快照存储、订单服务契约、流转引擎
//! ├── api/           # HTTP 路由和处理器
//! └── utils/         # 错误、响应封装、日志
//! ```

pub mod api;
pub mod channel;
pub mod core;
pub mod orders;
pub mod routes;
pub mod utils;

// Re-export 公共类型
pub use channel::{ChannelHub, ChannelServer, MemoryTransport, TcpTransport, Transport};
pub use core::{BackgroundTasks, Config, Server, ServerState, TaskKind};
pub use orders::{HttpOrdersApi, OrderSnapshotStore, OrdersApi, TransitionEngine};
pub use utils::{AppError, AppResponse, AppResult};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

/// 设置运行环境 (dotenv + 日志)
pub fn setup_environment() -> Result<(), Box<dyn std::error::Error>> {
    // .env 不存在不是错误
    let _ = dotenv::dotenv();

    let log_level = std::env::var("LOG_LEVEL").ok();
    let log_dir = std::env::var("LOG_DIR").ok();
    init_logger_with_file(log_level.as_deref(), log_dir.as_deref());

    Ok(())
}

pub fn print_banner() {
    println!(
        r#"
    __ __ ____  _____
   / //_// __ \/ ___/
  / ,<  / / / /\__ \
 / /| |/ /_/ /___/ /
/_/ |_/_____//____/
    "#
    );
}
