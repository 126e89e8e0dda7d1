// ==========================================
// Kumex 切割车间 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// 状态目录: kumex_config.json / kumex_stock.json / reports/
// ==========================================

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::api::{ApiResult, PlanApi, StockApi};
use crate::config::config_manager::{default_state_dir, ConfigManager};
use crate::config::plan_constants::PlanConstants;
use crate::report::ReportWriter;
use crate::repository::{LedgerRepository, StockStore};

/// 应用状态
///
/// 包含所有API实例和共享资源
pub struct AppState {
    /// 状态目录
    pub state_dir: PathBuf,

    /// 配置管理器
    pub config_manager: Arc<ConfigManager>,

    /// 台账仓储
    pub ledger_repo: Arc<LedgerRepository>,

    /// 下料方案API
    pub plan_api: Arc<PlanApi>,

    /// 材料台账API
    pub stock_api: Arc<StockApi>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 参数
    /// - state_dir: 状态目录（不存在时创建）
    /// - constants: 下料固定常量
    ///
    /// # 返回
    /// - Ok(AppState)
    /// - Err(ApiError): 常量无效 / 状态目录或库存文档无法读取
    ///
    /// # 说明
    /// 该方法会：
    /// 1. 初始化配置管理器与台账仓储
    /// 2. 创建所有API实例
    pub fn new(state_dir: impl Into<PathBuf>, constants: PlanConstants) -> ApiResult<Self> {
        let state_dir = state_dir.into();
        tracing::info!("初始化AppState，状态目录: {}", state_dir.display());

        std::fs::create_dir_all(&state_dir)
            .map_err(|e| crate::api::ApiError::StorageError(format!("无法创建状态目录: {}", e)))?;

        // ==========================================
        // 初始化Repository层
        // ==========================================
        let config_manager = Arc::new(ConfigManager::new(&state_dir));
        let ledger_repo = Arc::new(LedgerRepository::open(StockStore::in_dir(&state_dir))?);

        // ==========================================
        // 初始化API层
        // ==========================================
        let plan_api = Arc::new(PlanApi::new(
            constants,
            config_manager.clone(),
            ReportWriter::in_state_dir(&state_dir),
        )?);
        let stock_api = Arc::new(StockApi::new(ledger_repo.clone()));

        tracing::info!("AppState初始化完成");
        Ok(Self {
            state_dir,
            config_manager,
            ledger_repo,
            plan_api,
            stock_api,
        })
    }

    /// 默认状态目录 + 默认常量
    pub fn open_default() -> ApiResult<Self> {
        Self::new(default_state_dir(), PlanConstants::default())
    }

    pub fn state_dir(&self) -> &Path {
        &self.state_dir
    }
}
