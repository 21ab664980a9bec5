// ============================================================================
// 看板 Commands
// 作为前端与看板控制器之间的薄接口层，仅负责：
// 1. 接收前端参数
// 2. 从 Tauri State 获取 Dashboard 实例
// 3. 调用 Dashboard 方法
// 4. 返回最新视图
// ⛔ 禁止：包含业务逻辑
// ============================================================================

use std::sync::Mutex;
use tauri::State;

use crate::database::Database;
use crate::models::dtos::{DashboardView, ExportPlan, ImportSummary, TabularRow};
use crate::models::record::ProjectRecord;
use crate::services::dashboard::{today_utc, Dashboard};
use crate::services::filter::CategoryFilter;
use crate::utils::error::AppError;

/// Tauri managed state 中的看板实例
pub type DashboardState = Mutex<Dashboard<Database>>;

// ============================================================================
// 视图
// ============================================================================

/// 获取当前视图（可见行、统计、图表数据、月度报告）
#[tauri::command]
pub async fn dashboard_view(state: State<'_, DashboardState>) -> Result<DashboardView, String> {
    let dashboard = state
        .lock()
        .map_err(|_| "看板访问失败：无法获取锁".to_string())?;
    Ok(dashboard.view())
}

// ============================================================================
// 记录 CRUD Commands
// ============================================================================

/// 新增项目
#[tauri::command]
pub async fn dashboard_add_project(
    state: State<'_, DashboardState>,
    record: ProjectRecord,
) -> Result<DashboardView, String> {
    let mut dashboard = state
        .lock()
        .map_err(|_| "看板访问失败：无法获取锁".to_string())?;
    dashboard.add(record)?;
    Ok(dashboard.view())
}

/// 编辑当前视图中指定位置的项目
#[tauri::command]
pub async fn dashboard_edit_project(
    state: State<'_, DashboardState>,
    position: usize,
    record: ProjectRecord,
) -> Result<DashboardView, String> {
    let mut dashboard = state
        .lock()
        .map_err(|_| "看板访问失败：无法获取锁".to_string())?;
    dashboard.edit(position, record)?;
    Ok(dashboard.view())
}

/// 删除当前视图中指定位置的项目
#[tauri::command]
pub async fn dashboard_delete_project(
    state: State<'_, DashboardState>,
    position: usize,
) -> Result<DashboardView, String> {
    let mut dashboard = state
        .lock()
        .map_err(|_| "看板访问失败：无法获取锁".to_string())?;
    dashboard.delete(position)?;
    Ok(dashboard.view())
}

/// 清空全部数据
#[tauri::command]
pub async fn dashboard_clear_all(
    state: State<'_, DashboardState>,
) -> Result<DashboardView, String> {
    let mut dashboard = state
        .lock()
        .map_err(|_| "看板访问失败：无法获取锁".to_string())?;
    dashboard.clear_all();
    Ok(dashboard.view())
}

// ============================================================================
// 筛选 Commands
// ============================================================================

/// 设置月份筛选，`month` 为空表示清除
#[tauri::command]
pub async fn dashboard_set_month_filter(
    state: State<'_, DashboardState>,
    month: Option<String>,
) -> Result<DashboardView, String> {
    let mut dashboard = state
        .lock()
        .map_err(|_| "看板访问失败：无法获取锁".to_string())?;
    dashboard.set_month_filter(month.as_deref())?;
    Ok(dashboard.view())
}

/// 切换统计卡片筛选
#[tauri::command]
pub async fn dashboard_set_category_filter(
    state: State<'_, DashboardState>,
    category: CategoryFilter,
) -> Result<DashboardView, String> {
    let mut dashboard = state
        .lock()
        .map_err(|_| "看板访问失败：无法获取锁".to_string())?;
    dashboard.set_category_filter(category);
    Ok(dashboard.view())
}

/// 清除全部筛选
#[tauri::command]
pub async fn dashboard_clear_filter(
    state: State<'_, DashboardState>,
) -> Result<DashboardView, String> {
    let mut dashboard = state
        .lock()
        .map_err(|_| "看板访问失败：无法获取锁".to_string())?;
    dashboard.clear_filter();
    Ok(dashboard.view())
}

// ============================================================================
// 导入 / 导出 Commands
// ============================================================================

/// 从 JSON 文件导入（路径由前端的文件对话框提供）
#[tauri::command]
pub async fn dashboard_import_json(
    state: State<'_, DashboardState>,
    path: String,
) -> Result<ImportSummary, String> {
    let blob = std::fs::read_to_string(&path).map_err(AppError::from)?;
    let mut dashboard = state
        .lock()
        .map_err(|_| "看板访问失败：无法获取锁".to_string())?;
    Ok(dashboard.import_structured(&blob)?)
}

/// 导入前端已解码的表格行（列名 → 单元格值）
#[tauri::command]
pub async fn dashboard_import_rows(
    state: State<'_, DashboardState>,
    rows: Vec<TabularRow>,
) -> Result<ImportSummary, String> {
    let mut dashboard = state
        .lock()
        .map_err(|_| "看板访问失败：无法获取锁".to_string())?;
    Ok(dashboard.import_rows(&rows)?)
}

/// 获取表格导出计划，由前端的表格编解码器写入 xlsx
#[tauri::command]
pub async fn dashboard_export_plan(
    state: State<'_, DashboardState>,
) -> Result<ExportPlan, String> {
    let dashboard = state
        .lock()
        .map_err(|_| "看板访问失败：无法获取锁".to_string())?;
    Ok(dashboard.export_plan(today_utc())?)
}

/// 导出全量集合为 JSON 文本
#[tauri::command]
pub async fn dashboard_export_json(state: State<'_, DashboardState>) -> Result<String, String> {
    let dashboard = state
        .lock()
        .map_err(|_| "看板访问失败：无法获取锁".to_string())?;
    Ok(dashboard.export_structured()?)
}
