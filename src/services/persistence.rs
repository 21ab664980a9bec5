// ============================================================================
// 持久化适配器：记录集合 ⇄ 键值存储
// 保存失败只记录日志，不向调用方传播；加载失败返回 None 交由调用方使用默认数据
// ============================================================================

use std::collections::HashMap;

use crate::models::record::ProjectRecord;
use crate::utils::error::{AppError, AppResult};

/// 记录集合在存储中的固定键
pub const STORAGE_KEY: &str = "projectDeliveryData";

// ============================================================================
// 存储端口
// ============================================================================

/// 持久化存储端口（键值语义）
pub trait Storage {
    /// 写入 blob，已存在的键被覆盖
    fn put(&mut self, key: &str, blob: &str) -> AppResult<()>;

    /// 读取 blob，键不存在时返回 `Ok(None)`
    fn get(&self, key: &str) -> AppResult<Option<String>>;
}

/// 内存存储，可选字节配额（模拟浏览器存储的配额限制）
#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    entries: HashMap<String, String>,
    quota: Option<usize>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// 单个值超过 `quota` 字节时写入失败
    pub fn with_quota(quota: usize) -> Self {
        MemoryStorage {
            entries: HashMap::new(),
            quota: Some(quota),
        }
    }
}

impl Storage for MemoryStorage {
    fn put(&mut self, key: &str, blob: &str) -> AppResult<()> {
        if let Some(quota) = self.quota {
            if blob.len() > quota {
                return Err(AppError::StorageError(format!(
                    "超出存储配额：需要 {} 字节，上限 {} 字节",
                    blob.len(),
                    quota
                )));
            }
        }
        self.entries.insert(key.to_string(), blob.to_string());
        Ok(())
    }

    fn get(&self, key: &str) -> AppResult<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }
}

// ============================================================================
// 保存 / 加载
// ============================================================================

/// 序列化并写入，失败时返回错误（供需要区分结果的调用方使用）
pub fn try_save(
    storage: &mut dyn Storage,
    key: &str,
    records: &[ProjectRecord],
) -> AppResult<()> {
    let blob = serde_json::to_string(records)?;
    storage.put(key, &blob)
}

/// 保存整个记录集合
///
/// 失败（序列化错误、超出配额等）只记录日志，返回 false，不抛给调用方。
pub fn save(storage: &mut dyn Storage, key: &str, records: &[ProjectRecord]) -> bool {
    match try_save(storage, key, records) {
        Ok(()) => true,
        Err(e) => {
            log::error!("保存数据失败: {}", e);
            false
        }
    }
}

/// 读取并反序列化记录集合
///
/// 缺失的问题数量在反序列化时补为 0。
/// 没有数据或数据无法解析时返回 None。
pub fn load(storage: &dyn Storage, key: &str) -> Option<Vec<ProjectRecord>> {
    let blob = match storage.get(key) {
        Ok(Some(blob)) => blob,
        Ok(None) => return None,
        Err(e) => {
            log::error!("加载数据失败: {}", e);
            return None;
        }
    };

    match serde_json::from_str::<Vec<ProjectRecord>>(&blob) {
        Ok(records) => Some(records),
        Err(e) => {
            log::warn!("加载数据失败：存储内容无法解析: {}", e);
            None
        }
    }
}

// ============================================================================
// 单元测试
// ============================================================================
