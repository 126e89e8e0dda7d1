// ==========================================
// Kumex 切割车间 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型
// 红线: 不含文件访问逻辑, 不含引擎规则
// ==========================================

pub mod ledger;
pub mod order;
pub mod plan;
pub mod types;

// 重导出核心类型
pub use ledger::{
    round_m2, BalanceSheet, LedgerEntry, LedgerFilter, MonthOrRange, PeriodCovered,
};
pub use order::{OrderItem, RawOrderLine, ScanResult};
pub use plan::{Issue, Layer, MaterialPlan, PlanOutcome};
pub use types::{IssueCode, LedgerOp, Material, QuantityUnit, YearMonth};
