use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use shared::message::{ChannelMessage, DisplayUpdatePayload, RoomId};

use crate::channel::ChannelHub;
use crate::core::Config;
use crate::orders::{HttpOrdersApi, OrderSnapshotStore, OrdersApi, TransitionEngine};
use crate::utils::AppResult;

/// 服务器状态 - 持有所有组件的单例引用
///
/// ServerState 是 KDS 核心的中枢数据结构，持有所有组件的共享引用。
/// 使用 Arc 实现浅拷贝，克隆成本极低。
///
/// # 组件
///
/// | 字段 | 类型 | 说明 |
/// |------|------|------|
/// | config | Config | 配置项 (不可变) |
/// | store | Arc<OrderSnapshotStore> | 房间级订单快照 |
/// | hub | Arc<ChannelHub> | 房间级事件广播 |
/// | orders_api | Arc<dyn OrdersApi> | 上游订单服务 |
///
/// # 使用示例
///
/// ```ignore
/// // 刷新一个房间的快照并广播
/// state.refresh_room(&room).await?;
///
/// // 执行状态流转
/// state.transition_engine().transition(&room, id, status).await?;
/// ```
#[derive(Clone)]
pub struct ServerState {
    /// 服务器配置
    pub config: Config,
    /// 订单快照存储
    pub store: Arc<OrderSnapshotStore>,
    /// 房间事件广播中心
    pub hub: Arc<ChannelHub>,
    /// 上游订单服务 (Arc 共享所有权)
    pub orders_api: Arc<dyn OrdersApi>,
    /// 启动时间 (用于健康检查 uptime)
    pub started_at: DateTime<Utc>,
}

impl fmt::Debug for ServerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerState")
            .field("config", &self.config)
            .field("store", &self.store)
            .field("hub", &self.hub)
            .field("started_at", &self.started_at)
            .finish_non_exhaustive()
    }
}

impl ServerState {
    /// 初始化服务器状态
    ///
    /// 按顺序初始化：
    /// 1. 订单快照存储
    /// 2. 事件广播中心
    /// 3. 上游订单服务 HTTP 客户端
    pub fn initialize(config: &Config) -> Self {
        let orders_api = Arc::new(HttpOrdersApi::new(
            config.orders_api_url.clone(),
            Duration::from_millis(config.request_timeout_ms),
        ));
        Self::with_orders_api(config, orders_api)
    }

    /// 使用自定义订单服务创建状态
    ///
    /// 常用于测试场景 (注入内存实现)
    pub fn with_orders_api(config: &Config, orders_api: Arc<dyn OrdersApi>) -> Self {
        Self {
            config: config.clone(),
            store: Arc::new(OrderSnapshotStore::new()),
            hub: Arc::new(ChannelHub::new()),
            orders_api,
            started_at: Utc::now(),
        }
    }

    /// 构造状态流转引擎
    pub fn transition_engine(&self) -> TransitionEngine {
        TransitionEngine::new(
            self.store.clone(),
            self.orders_api.clone(),
            self.hub.clone(),
        )
    }

    /// 刷新一个房间的快照并广播 display-update
    ///
    /// 从上游拉取该显示屏的订单，整体替换本地快照，然后向房间内的
    /// 所有连接广播刷新结果。轮询是最终一致性的保证：任何丢失的推送
    /// 都会在下一次刷新时被纠正。
    pub async fn refresh_room(&self, room: &RoomId) -> AppResult<usize> {
        let orders = self
            .orders_api
            .fetch_display_orders(&room.display_id, &room.tenant_id)
            .await?;
        let count = orders.len();
        self.store.replace_all(room, orders);

        let snapshot = self.store.orders(room);
        let delivered = self.hub.publish(
            room,
            ChannelMessage::display_update(&DisplayUpdatePayload { orders: snapshot }),
        );
        tracing::debug!(room = %room, orders = count, delivered, "Room snapshot refreshed");

        Ok(count)
    }

    /// 服务运行时长 (秒)
    pub fn uptime_seconds(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds()
    }
}
