// ==========================================
// Kumex 切割车间 - 库存文档存储
// ==========================================
// 存储: <state_dir>/kumex_stock.json
// 结构: { materials: { 名称: { stock_m2, remain_m2 } }, ledger: [...], closed_months: [...] }
// ==========================================
// 红线: ledger 是唯一权威来源; remain_m2 / closed_months 为缓存投影
// 红线: 文档损坏不崩溃, 改名备份后回退到默认结构, 下次保存修复
// ==========================================

use crate::domain::ledger::{round_m2, BalanceSheet, LedgerEntry};
use crate::domain::types::{Material, YearMonth};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

pub const STOCK_FILE_NAME: &str = "kumex_stock.json";

// ==========================================
// MaterialStock - 单材料缓存视图
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialStock {
    #[serde(default)]
    pub stock_m2: Decimal,
    #[serde(default)]
    pub remain_m2: Decimal,
}

// ==========================================
// StockDocument - 库存文档
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockDocument {
    #[serde(default)]
    pub materials: BTreeMap<Material, MaterialStock>,
    #[serde(default)]
    pub ledger: Vec<LedgerEntry>,
    #[serde(default)]
    pub closed_months: Vec<YearMonth>,
}

impl Default for StockDocument {
    fn default() -> Self {
        Self {
            materials: Material::ALL
                .iter()
                .map(|m| (*m, MaterialStock::default()))
                .collect(),
            ledger: Vec::new(),
            closed_months: Vec::new(),
        }
    }
}

impl StockDocument {
    /// 补齐缺失的跟踪材料
    pub fn ensure_materials(&mut self) {
        for material in Material::ALL {
            self.materials.entry(material).or_default();
        }
    }

    /// 缓存视图是否与重算结果一致
    pub fn projections_match(&self, sheet: &BalanceSheet, locked: &BTreeSet<YearMonth>) -> bool {
        let balances_match = Material::ALL.iter().all(|m| {
            self.materials
                .get(m)
                .map(|s| s.remain_m2 == sheet.rounded(*m))
                .unwrap_or(false)
        });
        let cached: BTreeSet<YearMonth> = self.closed_months.iter().copied().collect();
        balances_match && cached == *locked && cached.len() == self.closed_months.len()
    }

    /// 写入缓存投影（remain_m2 保留 2 位小数, closed_months 升序）
    pub fn refresh_projections(&mut self, sheet: &BalanceSheet, locked: &BTreeSet<YearMonth>) {
        self.ensure_materials();
        for (material, balance) in sheet.iter() {
            let stock = self.materials.entry(*material).or_default();
            stock.remain_m2 = round_m2(*balance);
        }
        self.closed_months = locked.iter().copied().collect();
    }
}

// ==========================================
// StockStore - JSON 文件读写
// ==========================================
#[derive(Debug, Clone)]
pub struct StockStore {
    path: PathBuf,
}

impl StockStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// 状态目录下的默认文档
    pub fn in_dir(state_dir: &Path) -> Self {
        Self::new(state_dir.join(STOCK_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 加载库存文档
    ///
    /// # 返回
    /// - 文件不存在: 默认结构
    /// - 文件损坏: 改名为 `<文件名>.corrupt-<时间戳>` 后返回默认结构（warn）
    /// - Err: 文件存在但无法读取
    pub fn load(&self) -> RepositoryResult<StockDocument> {
        if !self.path.exists() {
            tracing::info!("库存文档不存在, 使用默认结构: {}", self.path.display());
            return Ok(StockDocument::default());
        }

        // 按字节读取: 非 UTF-8 内容与 JSON 错误同样按损坏处理
        let raw = fs::read(&self.path)
            .map_err(|e| RepositoryError::ReadError(format!("{}: {}", self.path.display(), e)))?;

        match serde_json::from_slice::<StockDocument>(&raw) {
            Ok(mut doc) => {
                doc.ensure_materials();
                Ok(doc)
            }
            Err(e) => {
                let backup = self.quarantine()?;
                tracing::warn!(
                    error = %e,
                    backup = %backup.display(),
                    "库存文档损坏, 已备份并回退到默认结构"
                );
                Ok(StockDocument::default())
            }
        }
    }

    /// 保存库存文档（先写临时文件再替换）
    pub fn save(&self, doc: &StockDocument) -> RepositoryResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let json = serde_json::to_string_pretty(doc)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        tracing::debug!(entries = doc.ledger.len(), "库存文档已保存: {}", self.path.display());
        Ok(())
    }

    /// 损坏文档改名备份
    fn quarantine(&self) -> RepositoryResult<PathBuf> {
        let ts = chrono::Local::now().format("%Y%m%d_%H%M%S");
        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| STOCK_FILE_NAME.to_string());

        let mut backup = self.path.with_file_name(format!("{}.corrupt-{}", file_name, ts));
        let mut counter = 1;
        while backup.exists() {
            backup = self
                .path
                .with_file_name(format!("{}.corrupt-{}_{}", file_name, ts, counter));
            counter += 1;
        }

        fs::rename(&self.path, &backup)?;
        Ok(backup)
    }
}
