// ==========================================
// Kumex 切割车间 - 下料方案分配引擎
// ==========================================
// 职责: 订单项 → 条带需求 → 层 → 板
// 输入: 单材料订单项 + 锯缝宽度 + 固定常量
// 输出: MaterialPlan + Issue 列表
// ==========================================
// 红线: 纯计算, 无副作用; 同输入同常量结果逐字节一致
// 红线: 单项失败只产生 Issue, 不中断批次
// 注: 只优化宽度方向, 不保证全局最优
// ==========================================

mod core;
mod packing;


pub use self::core::{CuttingPlanAllocator, StripDemand};
pub use packing::pack_first_fit;
