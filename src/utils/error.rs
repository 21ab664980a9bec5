// ============================================================================
// 统一错误类型定义
// 使用 thiserror 派生宏，所有模块共用一个错误枚举
// ============================================================================

use thiserror::Error;

/// 应用统一错误枚举
///
/// 覆盖看板核心的所有失败场景。
/// 通过 `impl From<AppError> for String` 保持与 Tauri command 的兼容性
/// （Tauri command 要求返回 `Result<T, String>`）。
#[derive(Debug, Error)]
pub enum AppError {
    /// 手动录入校验失败（如项目名称为空、日期格式错误）
    #[error("验证失败：{0}")]
    ValidationError(String),

    /// 导入数据格式不正确，现有数据保持不变
    #[error("导入失败：{0}")]
    ImportError(String),

    /// 存储端口写入/读取失败（如超出配额）
    #[error("存储失败：{0}")]
    StorageError(String),

    /// JSON 序列化/反序列化错误
    #[error("数据序列化失败：{0}")]
    SerializationError(#[from] serde_json::Error),

    /// 文件系统 IO 错误
    #[error("IO 错误：{0}")]
    IoError(#[from] std::io::Error),

    /// 数据库操作错误
    #[error("{0}")]
    DatabaseError(String),

    /// 视图位置不存在对应的项目
    #[error("未找到项目：视图位置 {0} 超出范围")]
    NotFound(usize),

    /// 当前没有任何记录可导出
    #[error("没有数据可以导出。")]
    NothingToExport,
}

/// 便捷类型别名，统一项目内的 Result 签名
pub type AppResult<T> = Result<T, AppError>;

impl From<AppError> for String {
    fn from(err: AppError) -> Self {
        err.to_string()
    }
}
