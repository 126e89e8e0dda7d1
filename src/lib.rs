// ==========================================
// Kumex 切割车间 - 核心库
// ==========================================
// 职责: 下料方案计算 + 材料台账（只追加）+ 月份锁定
// 技术栈: Rust + JSON 文档存储
// 系统定位: 车间内部工具, 单进程单写者
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "en");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 库存文档
pub mod repository;

// 引擎层 - 业务规则
pub mod engine;

// 配置层 - 配置文档与固定常量
pub mod config;

// 报表
pub mod report;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// API 层 - 业务接口
pub mod api;

// 应用层 - 状态组装
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{IssueCode, LedgerOp, Material, QuantityUnit, YearMonth};

// 领域实体
pub use domain::{
    BalanceSheet, Issue, Layer, LedgerEntry, LedgerFilter, MaterialPlan, MonthOrRange,
    OrderItem, PeriodCovered, PlanOutcome, RawOrderLine, ScanResult,
};

// 引擎
pub use engine::{CuttingPlanAllocator, OrderNormalizer};

// API
pub use api::{ApiError, ApiResult, DeductOutcome, PlanApi, StockApi};

// 应用
pub use app::AppState;

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "Kumex 切割车间";
