use crate::domain::ledger::{BalanceSheet, LedgerEntry, LedgerFilter};
use crate::domain::types::{LedgerOp, Material, YearMonth};
use crate::engine::{balance, period_lock};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::stock_store::{MaterialStock, StockDocument, StockStore};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

// ==========================================
// LedgerRepository - 台账仓储
// ==========================================
pub struct LedgerRepository {
    doc: Arc<Mutex<StockDocument>>,
    store: StockStore,
}

impl LedgerRepository {
    /// 打开台账
    ///
    /// 加载后以 ledger 为准重建余额与 closed_months;
    /// 缓存视图不一致时记录 warn, 下次保存时修复
    pub fn open(store: StockStore) -> RepositoryResult<Self> {
        let mut doc = store.load()?;

        let sheet = balance::recompute(&doc.ledger);
        let locked = period_lock::locked_months(&doc.ledger);
        if !doc.projections_match(&sheet, &locked) {
            tracing::warn!(
                path = %store.path().display(),
                cached_closed = doc.closed_months.len(),
                locked = locked.len(),
                "库存文档缓存视图与台账不一致, 已按台账重建"
            );
        }
        doc.refresh_projections(&sheet, &locked);

        tracing::info!(entries = doc.ledger.len(), "台账已加载");
        Ok(Self {
            doc: Arc::new(Mutex::new(doc)),
            store,
        })
    }

    /// 获取文档锁
    fn get_doc(&self) -> RepositoryResult<MutexGuard<'_, StockDocument>> {
        self.doc
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // 写入操作
    // ==========================================

    /// 追加单条记录
    ///
    /// # 返回
    /// - Ok(BalanceSheet): 追加后的余额
    /// - Err(ValidationError): 金额为负（SET 除外）或 entry_id 重复
    pub fn append(&self, entry: LedgerEntry) -> RepositoryResult<BalanceSheet> {
        self.append_many(vec![entry])
    }

    /// 批量追加（全部校验通过才写入）
    pub fn append_many(&self, entries: Vec<LedgerEntry>) -> RepositoryResult<BalanceSheet> {
        self.append_many_guarded(entries, |_| Ok::<(), RepositoryError>(()))
    }

    /// 带前置检查的批量追加
    ///
    /// `guard` 在持有锁期间看到当前台账; 返回 Err 时不做任何变更
    ///
    /// # 参数
    /// - `entries`: 待追加记录
    /// - `guard`: 前置检查（如月份锁定冲突）
    pub fn append_many_guarded<E, G>(&self, entries: Vec<LedgerEntry>, guard: G) -> Result<BalanceSheet, E>
    where
        G: FnOnce(&[LedgerEntry]) -> Result<(), E>,
        E: From<RepositoryError>,
    {
        let mut doc = self.get_doc()?;

        guard(&doc.ledger)?;
        validate_entries(&doc.ledger, &entries)?;

        let snapshot = doc.clone();
        let count = entries.len();
        doc.ledger.extend(entries);

        match self.commit(&mut doc) {
            Ok(sheet) => {
                tracing::info!(appended = count, total = doc.ledger.len(), "台账记录已追加");
                Ok(sheet)
            }
            Err(e) => {
                *doc = snapshot;
                Err(e.into())
            }
        }
    }

    /// 删除满足条件的记录
    ///
    /// # 返回
    /// - Ok(removed_count): 删除条数（0 时不写文件）
    pub fn delete<P>(&self, predicate: P) -> RepositoryResult<usize>
    where
        P: Fn(&LedgerEntry) -> bool,
    {
        let mut doc = self.get_doc()?;

        let before = doc.ledger.len();
        let snapshot = doc.clone();
        doc.ledger.retain(|entry| !predicate(entry));
        let removed = before - doc.ledger.len();

        if removed == 0 {
            return Ok(0);
        }

        match self.commit(&mut doc) {
            Ok(_) => {
                tracing::info!(removed, total = doc.ledger.len(), "台账记录已删除");
                Ok(removed)
            }
            Err(e) => {
                *doc = snapshot;
                Err(e)
            }
        }
    }

    /// 刷新缓存投影并持久化（调用方持有锁）
    fn commit(&self, doc: &mut StockDocument) -> RepositoryResult<BalanceSheet> {
        let sheet = balance::recompute(&doc.ledger);
        let locked = period_lock::locked_months(&doc.ledger);
        doc.refresh_projections(&sheet, &locked);
        self.store.save(doc)?;

        for material in sheet.negatives() {
            tracing::warn!(
                material = %material,
                balance = %sheet.rounded(material),
                "材料余额为负"
            );
        }
        Ok(sheet)
    }

    // ==========================================
    // 查询操作（不触发持久化）
    // ==========================================

    /// 全量重算余额
    pub fn recompute(&self) -> RepositoryResult<BalanceSheet> {
        let doc = self.get_doc()?;
        Ok(balance::recompute(&doc.ledger))
    }

    /// 按条件查询（保持插入顺序）
    pub fn read(&self, filter: &LedgerFilter) -> RepositoryResult<Vec<LedgerEntry>> {
        let doc = self.get_doc()?;
        Ok(doc
            .ledger
            .iter()
            .filter(|entry| filter.matches(entry))
            .cloned()
            .collect())
    }

    /// 全部记录
    pub fn entries(&self) -> RepositoryResult<Vec<LedgerEntry>> {
        let doc = self.get_doc()?;
        Ok(doc.ledger.clone())
    }

    pub fn find_by_id(&self, entry_id: &str) -> RepositoryResult<Option<LedgerEntry>> {
        let doc = self.get_doc()?;
        Ok(doc.ledger.iter().find(|e| e.entry_id == entry_id).cloned())
    }

    /// 已锁定月份（由台账派生）
    pub fn locked_months(&self) -> RepositoryResult<BTreeSet<YearMonth>> {
        let doc = self.get_doc()?;
        Ok(period_lock::locked_months(&doc.ledger))
    }

    /// 缓存的材料视图（stock_m2 / remain_m2）
    pub fn materials(&self) -> RepositoryResult<BTreeMap<Material, MaterialStock>> {
        let doc = self.get_doc()?;
        Ok(doc.materials.clone())
    }

    /// 缓存的 closed_months
    pub fn closed_months(&self) -> RepositoryResult<Vec<YearMonth>> {
        let doc = self.get_doc()?;
        Ok(doc.closed_months.clone())
    }
}

/// 追加前校验
fn validate_entries(existing: &[LedgerEntry], entries: &[LedgerEntry]) -> RepositoryResult<()> {
    let mut ids: HashSet<&str> = existing.iter().map(|e| e.entry_id.as_str()).collect();

    for entry in entries {
        if entry.op != LedgerOp::Set && entry.amount_m2.is_sign_negative() && !entry.amount_m2.is_zero() {
            return Err(RepositoryError::FieldValueError {
                field: "amount_m2".to_string(),
                message: format!("{} 记录金额不能为负: {}", entry.op, entry.amount_m2),
            });
        }
        if entry.entry_id.trim().is_empty() {
            return Err(RepositoryError::ValidationError("entry_id 不能为空".to_string()));
        }
        if !ids.insert(entry.entry_id.as_str()) {
            return Err(RepositoryError::ValidationError(format!(
                "entry_id 重复: {}",
                entry.entry_id
            )));
        }
    }
    Ok(())
}
