// ==========================================
// Kumex 切割车间 - API 层
// ==========================================
// 职责: 提供业务 API 接口, 供命令行 / 外部界面调用
// ==========================================

pub mod error;
pub mod plan_api;
pub mod stock_api;

// 重导出核心类型
pub use error::{ApiError, ApiResult};
pub use plan_api::{read_order_lines, PlanApi, PlanRun};
pub use stock_api::{DeductOutcome, StockApi};
