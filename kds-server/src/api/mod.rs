//! HTTP API 模块
//!
//! # 路由列表
//!
//! | 路径 | 方法 | 说明 |
//! |------|------|------|
//! | /api/health | GET | 健康检查 |
//! | /api/displays/{id}/orders | GET | 显示屏订单快照 |
//! | /api/displays/{id}/orders | POST | 新订单接入 |
//! | /api/displays/{id}/stats | GET | 显示屏统计 |
//! | /api/order-status/{id} | PUT | 订单状态流转 |

pub mod display_orders;
pub mod health;
pub mod order_status;
