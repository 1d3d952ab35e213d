//! KDS Display Client - 厨房显示屏客户端
//!
//! 连接 KDS 服务端，维护本地订单看板并驱动状态流转：
//!
//! - **HTTP 网关** (`http`): 快照拉取与状态写入
//! - **事件通道** (`channel`): 房间推送的订阅与转发
//! - **控制器** (`controller`): 轮询对账循环 (轮询为准，推送提速)
//!
//! # 使用示例
//!
//! ```ignore
//! let config = DisplayConfig::new("http://localhost:3000", "localhost:8081", "t1", "disp1");
//! let gateway = Arc::new(OrdersClient::new(config.clone()));
//! let controller = DisplayController::new(config.clone(), gateway, Arc::new(NoopSoundAlert));
//!
//! // The loop connects (and reconnects) through the connector
//! let connector = TcpChannelConnector::from_config(&config);
//! controller.run(&connector).await;
//! ```

pub mod channel;
pub mod config;
pub mod controller;
pub mod error;
pub mod http;
pub mod transport;

// Re-export 公共类型
pub use channel::{ChannelConnection, ChannelConnector, TcpChannelConnector};
pub use config::DisplayConfig;
pub use controller::{DisplayController, NoopSoundAlert, SoundAlert};
pub use error::{ClientError, ClientResult};
pub use http::{OrdersClient, OrdersGateway};
pub use transport::{MemoryTransport, TcpTransport, Transport};
