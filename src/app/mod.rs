// ==========================================
// Kumex 切割车间 - 应用层
// ==========================================
// 职责: 组装状态目录、仓储与 API
// ==========================================

pub mod state;

// 重导出
pub use state::AppState;
