// ============================================================================
// 业务层：纯 Rust 核心逻辑
// ✅ 特点：不依赖 `tauri::*`，保持纯净，方便写 #[test]
// ⛔ 禁止：直接返回前端专用的错误格式
// ============================================================================

pub mod aggregator;
pub mod dashboard;
pub mod filter;
pub mod persistence;
pub mod sorter;
pub mod transfer;
