// ==========================================
// Kumex 切割车间 - 材料台账仓储
// ==========================================
// 存储: kumex_stock.json（StockStore）
// 红线: 只追加, 不改写、不重排已有记录
// 红线: 每次变更后全量重算余额与锁定月份, 刷新缓存投影并持久化
// 红线: 校验失败或保存失败时不留下部分变更
// ==========================================

mod core;


pub use self::core::LedgerRepository;
