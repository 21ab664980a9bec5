// ============================================================================
// [总线] 程序的组装车间
// ✅ 只能做：pub mod 暴露子模块、注册 .invoke_handler()、初始化 State
// ⛔ 禁止：直接实现 command 函数
// ============================================================================

#[cfg(feature = "desktop")]
pub mod commands;
pub mod database;
pub mod models;
pub mod services;
pub mod utils;

// ============================================================================
// 桌面端装配
// ============================================================================

/// 将看板装配到 Tauri Builder 上
///
/// 宿主程序负责提供 `generate_context!()` 并调用 `.run()`：
///
/// ```ignore
/// delivery_dashboard_lib::register(tauri::Builder::default())
///     .run(tauri::generate_context!())
///     .expect("error while running tauri application");
/// ```
#[cfg(feature = "desktop")]
pub fn register<R: tauri::Runtime>(builder: tauri::Builder<R>) -> tauri::Builder<R> {
    use tauri::Manager;

    builder
        .plugin(tauri_plugin_dialog::init())
        .setup(|app| {
            // 获取应用数据目录并初始化数据库
            let app_data_dir = app
                .path()
                .app_data_dir()
                .map_err(|e| format!("获取应用数据目录失败: {}", e))?;
            let db = database::Database::init(&app_data_dir)?;
            let dashboard = services::dashboard::Dashboard::open(
                db,
                services::dashboard::DashboardOptions::default(),
            );
            // 注册看板为 Tauri managed state（使用 Mutex 保证线程安全）
            app.manage(std::sync::Mutex::new(dashboard));
            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            // 视图
            commands::dashboard::dashboard_view,
            // 记录 CRUD
            commands::dashboard::dashboard_add_project,
            commands::dashboard::dashboard_edit_project,
            commands::dashboard::dashboard_delete_project,
            commands::dashboard::dashboard_clear_all,
            // 筛选
            commands::dashboard::dashboard_set_month_filter,
            commands::dashboard::dashboard_set_category_filter,
            commands::dashboard::dashboard_clear_filter,
            // 导入 / 导出
            commands::dashboard::dashboard_import_json,
            commands::dashboard::dashboard_import_rows,
            commands::dashboard::dashboard_export_plan,
            commands::dashboard::dashboard_export_json,
        ])
}
