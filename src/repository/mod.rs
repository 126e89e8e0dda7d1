// ==========================================
// Kumex 切割车间 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑（锁定冲突判断在 api 层）
// ==========================================
// 职责: 库存文档持久化 + 台账读写
// ==========================================

pub mod error;
pub mod ledger_repo;
pub mod stock_store;

// 重导出核心仓储
pub use error::{RepositoryError, RepositoryResult};
pub use ledger_repo::LedgerRepository;
pub use stock_store::{MaterialStock, StockDocument, StockStore, STOCK_FILE_NAME};
