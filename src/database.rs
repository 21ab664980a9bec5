// ============================================================================
// 数据库模块：SQLite 持久化层
// 以 settings 键值表实现存储端口，整个记录集合作为一个 JSON 值保存
// ============================================================================

use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

use crate::services::persistence::Storage;
use crate::utils::error::{AppError, AppResult};

/// 数据库文件名
pub const DB_FILE_NAME: &str = "delivery_dashboard.db";

// ============================================================================
// 数据库管理器
// ============================================================================

/// 数据库管理器，封装 rusqlite 连接
pub struct Database {
    conn: Connection,
}

impl Database {
    /// 初始化数据库：在指定目录创建数据库文件并建表
    ///
    /// # 参数
    /// - `app_data_dir`: 应用数据目录路径（Tauri app_data_dir）
    ///
    /// # 返回
    /// - `Ok(Database)`: 初始化成功
    /// - `Err(AppError::DatabaseError)`: 目录或文件无法创建
    pub fn init(app_data_dir: &Path) -> AppResult<Self> {
        std::fs::create_dir_all(app_data_dir).map_err(|e| {
            AppError::DatabaseError(format!(
                "数据库初始化失败：无法创建数据目录 {}: {}",
                app_data_dir.display(),
                e
            ))
        })?;

        let db_path = app_data_dir.join(DB_FILE_NAME);
        let conn = Connection::open(&db_path).map_err(|e| {
            AppError::DatabaseError(format!(
                "数据库初始化失败：无法打开数据库文件 {}: {}",
                db_path.display(),
                e
            ))
        })?;

        Self::create_tables(&conn)?;

        Ok(Database { conn })
    }

    /// 打开内存数据库（无头运行或测试使用）
    pub fn open_in_memory() -> AppResult<Self> {
        let conn = Connection::open_in_memory().map_err(|e| {
            AppError::DatabaseError(format!("数据库初始化失败：无法打开内存数据库: {}", e))
        })?;
        Self::create_tables(&conn)?;
        Ok(Database { conn })
    }

    fn create_tables(conn: &Connection) -> AppResult<()> {
        conn.execute_batch(
            "
            -- 设置表（键值对），记录集合保存在固定键下
            CREATE TABLE IF NOT EXISTS settings (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            ",
        )
        .map_err(|e| {
            AppError::DatabaseError(format!("数据库初始化失败：创建表结构时出错: {}", e))
        })?;

        Ok(())
    }

    /// 获取数据库连接的引用
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// 读取单个设置项，键不存在时返回 None
    pub fn get_setting(&self, key: &str) -> AppResult<Option<String>> {
        self.conn
            .query_row(
                "SELECT value FROM settings WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| AppError::DatabaseError(format!("读取设置失败：{}", e)))
    }

    /// 保存单个设置项（键值对）
    ///
    /// 使用 INSERT OR REPLACE 实现 upsert 语义。
    pub fn save_setting(&self, key: &str, value: &str) -> AppResult<()> {
        self.conn
            .execute(
                "INSERT OR REPLACE INTO settings (key, value) VALUES (?1, ?2)",
                params![key, value],
            )
            .map_err(|e| AppError::DatabaseError(format!("保存设置失败：{}", e)))?;

        Ok(())
    }
}

impl Storage for Database {
    fn put(&mut self, key: &str, blob: &str) -> AppResult<()> {
        self.save_setting(key, blob)
    }

    fn get(&self, key: &str) -> AppResult<Option<String>> {
        self.get_setting(key)
    }
}

// ============================================================================
// 单元测试
// ============================================================================
