// ==========================================
// Kumex 切割车间 - 配置层
// ==========================================
// 职责: 配置文档管理 + 下料固定常量
// 存储: kumex_config.json
// ==========================================

pub mod config_manager;
pub mod error;
pub mod plan_constants;

// 重导出核心配置
pub use config_manager::{default_state_dir, AppConfig, ConfigManager};
pub use error::{ConfigError, ConfigResult};
pub use plan_constants::{mm2_to_m2, PlanConstants};
