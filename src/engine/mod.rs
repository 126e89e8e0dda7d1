// ==========================================
// Kumex 切割车间 - 引擎层
// ==========================================
// 职责: 订单规范化 / 下料方案 / 余额折叠 / 月份锁定
// 红线: 引擎不访问文件, 不读写配置文档
// ==========================================

pub mod allocator;
pub mod balance;
pub mod normalizer;
pub mod period_lock;

// 重导出核心引擎
pub use allocator::{pack_first_fit, CuttingPlanAllocator, StripDemand};
pub use normalizer::{extract_dimensions, OrderNormalizer};
