/// 服务器配置 - KDS 核心的所有配置项
///
/// # 环境变量
///
/// 所有配置项都可以通过环境变量覆盖：
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | HTTP_PORT | 3000 | HTTP 服务端口 |
/// | CHANNEL_TCP_PORT | 8081 | TCP 事件通道端口 |
/// | ORDERS_API_URL | http://localhost:3001/api | 上游订单服务地址 |
/// | SNAPSHOT_REFRESH_SECONDS | 5 | 快照轮询间隔(秒) |
/// | ENVIRONMENT | development | 运行环境 |
/// | REQUEST_TIMEOUT_MS | 30000 | 请求超时(毫秒) |
/// | SHUTDOWN_TIMEOUT_MS | 10000 | 关闭超时(毫秒) |
///
/// # 示例
///
/// ```ignore
/// HTTP_PORT=8080 ORDERS_API_URL=http://orders:3001/api cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP API 服务端口
    pub http_port: u16,
    /// TCP 事件通道端口 (显示屏直连)
    pub channel_tcp_port: u16,
    /// 上游订单服务 URL
    pub orders_api_url: String,
    /// 快照轮询间隔 (秒)
    pub snapshot_refresh_seconds: u64,
    /// 运行环境: development | staging | production
    pub environment: String,
    /// 请求超时时间 (毫秒)
    pub request_timeout_ms: u64,
    /// 关闭超时时间 (毫秒)
    pub shutdown_timeout_ms: u64,
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 如果环境变量未设置，使用默认值
    pub fn from_env() -> Self {
        Self {
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            channel_tcp_port: std::env::var("CHANNEL_TCP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8081),
            orders_api_url: std::env::var("ORDERS_API_URL")
                .unwrap_or_else(|_| "http://localhost:3001/api".into()),
            snapshot_refresh_seconds: std::env::var("SNAPSHOT_REFRESH_SECONDS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(5),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            request_timeout_ms: std::env::var("REQUEST_TIMEOUT_MS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(30000),
            shutdown_timeout_ms: std::env::var("SHUTDOWN_TIMEOUT_MS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(10000),
        }
    }

    /// 使用自定义值覆盖部分配置
    ///
    /// 常用于测试场景
    pub fn with_overrides(
        orders_api_url: impl Into<String>,
        http_port: u16,
        channel_tcp_port: u16,
    ) -> Self {
        let mut config = Self::from_env();
        config.orders_api_url = orders_api_url.into();
        config.http_port = http_port;
        config.channel_tcp_port = channel_tcp_port;
        config
    }

    /// 是否生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// 是否开发环境
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
