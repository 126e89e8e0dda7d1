// ==========================================
// Kumex 切割车间 - 配置管理器
// ==========================================
// 职责: 配置文档加载、默认值、保存
// 存储: <state_dir>/kumex_config.json
// 文档: { pdf_dir, kerf_mm, last_month }
// ==========================================

use crate::config::error::{ConfigError, ConfigResult};
use crate::domain::types::YearMonth;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// 配置文件名
pub const CONFIG_FILE_NAME: &str = "kumex_config.json";

/// 状态目录环境变量（便于调试/测试）
pub const STATE_DIR_ENV: &str = "KUMEX_STATE_DIR";

// ==========================================
// AppConfig - 配置文档
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// 订单 PDF 目录（由外部文件选择协作方使用）
    #[serde(default)]
    pub pdf_dir: String,

    /// 锯缝宽度 (mm)
    #[serde(default)]
    pub kerf_mm: Decimal,

    /// 上次选择的月份
    #[serde(default)]
    pub last_month: Option<YearMonth>,
}

impl AppConfig {
    /// 默认配置
    pub fn default_for(state_dir: &Path) -> Self {
        Self {
            pdf_dir: state_dir.join("input_pdf").to_string_lossy().to_string(),
            kerf_mm: Decimal::ZERO,
            last_month: None,
        }
    }

    /// 锯缝宽度（负值按 0 处理）
    pub fn effective_kerf_mm(&self) -> Decimal {
        if self.kerf_mm.is_sign_negative() {
            Decimal::ZERO
        } else {
            self.kerf_mm
        }
    }
}

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    state_dir: PathBuf,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - state_dir: 状态目录（配置/库存/报表所在目录）
    pub fn new(state_dir: impl Into<PathBuf>) -> Self {
        Self {
            state_dir: state_dir.into(),
        }
    }

    pub fn state_dir(&self) -> &Path {
        &self.state_dir
    }

    pub fn config_path(&self) -> PathBuf {
        self.state_dir.join(CONFIG_FILE_NAME)
    }

    /// 加载配置
    ///
    /// 文件缺失或损坏时回退到默认配置并记录 warn（不中断启动）
    pub fn load(&self) -> AppConfig {
        let path = self.config_path();
        if !path.exists() {
            tracing::info!("配置文件不存在, 使用默认配置: {}", path.display());
            return AppConfig::default_for(&self.state_dir);
        }

        let parsed = fs::read_to_string(&path)
            .map_err(|e| ConfigError::ReadError(e.to_string()))
            .and_then(|raw| {
                serde_json::from_str::<AppConfig>(&raw).map_err(|e| ConfigError::ReadError(e.to_string()))
            });

        match parsed {
            Ok(mut cfg) => {
                if cfg.kerf_mm.is_sign_negative() {
                    tracing::warn!(kerf_mm = %cfg.kerf_mm, "锯缝宽度为负, 按 0 处理");
                    cfg.kerf_mm = Decimal::ZERO;
                }
                if cfg.pdf_dir.trim().is_empty() {
                    cfg.pdf_dir = AppConfig::default_for(&self.state_dir).pdf_dir;
                }
                cfg
            }
            Err(e) => {
                tracing::warn!("配置文件损坏, 使用默认配置 ({}): {}", path.display(), e);
                AppConfig::default_for(&self.state_dir)
            }
        }
    }

    /// 保存配置
    pub fn save(&self, config: &AppConfig) -> ConfigResult<()> {
        fs::create_dir_all(&self.state_dir)?;
        let json = serde_json::to_string_pretty(config)?;
        fs::write(self.config_path(), json).map_err(|e| ConfigError::WriteError(e.to_string()))?;
        tracing::debug!("配置已保存: {}", self.config_path().display());
        Ok(())
    }
}

/// 默认状态目录
///
/// 优先级:
/// 1. 环境变量 KUMEX_STATE_DIR
/// 2. 用户数据目录 /Kumex
/// 3. 当前目录 ./kumex-state
pub fn default_state_dir() -> PathBuf {
    if let Ok(path) = std::env::var(STATE_DIR_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return PathBuf::from(trimmed);
        }
    }

    match dirs::data_dir() {
        Some(data_dir) => data_dir.join("Kumex"),
        None => PathBuf::from("./kumex-state"),
    }
}
