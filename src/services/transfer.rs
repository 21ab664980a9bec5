// ============================================================================
// 导入/导出映射：内部记录 ⇄ 表格行 / 结构化 JSON
// 表格文件的实际读写交给 TabularCodec 端口，本模块只负责字段映射
// ============================================================================

use serde_json::Value;
use time::macros::format_description;
use time::{Date, OffsetDateTime};

use crate::models::dtos::{CellValue, ExportPlan, ExportRow, TabularRow};
use crate::models::record::{
    count_from_number, count_from_text, is_iso_date, AssetType, DeliveryStatus, ProjectRecord,
};
use crate::utils::error::{AppError, AppResult};

// ============================================================================
// 常量定义
// ============================================================================

pub const COL_NAME: &str = "项目名称";
pub const COL_ASSET_TYPE: &str = "资产类型";
pub const COL_STATUS: &str = "交付状态";
pub const COL_DELIVERY_DATE: &str = "交付时间";
pub const COL_PRIVACY_ISSUES: &str = "隐私合规问题";
pub const COL_SECURITY_ISSUES: &str = "安全漏洞问题";
pub const COL_REMARKS: &str = "备注";

/// 导出工作表名称，同时是导出文件名前缀
pub const SHEET_NAME: &str = "项目交付记录";

/// 导出列宽（字符数），与列顺序一一对应
pub const COLUMN_WIDTHS: [u16; 7] = [25, 15, 15, 15, 18, 18, 30];

/// 电子表格日期序列号 25569 对应 1970-01-01
pub const SPREADSHEET_EPOCH_OFFSET_DAYS: f64 = 25569.0;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

// ============================================================================
// 表格编解码端口
// ============================================================================

/// 表格文件编解码端口（如 xlsx 读写），由外部实现
pub trait TabularCodec {
    /// 将导出行写入表格文件
    fn write_table(
        &mut self,
        rows: &[ExportRow],
        column_widths: &[u16],
        filename: &str,
    ) -> AppResult<()>;

    /// 读取表格文件第一个工作表，每行为 列名 → 单元格值
    fn read_table(&self, data: &[u8]) -> AppResult<Vec<TabularRow>>;
}

// ============================================================================
// 导出
// ============================================================================

pub fn to_export_row(record: &ProjectRecord) -> ExportRow {
    ExportRow {
        name: record.name.clone(),
        asset_type: record.asset_type.label().to_string(),
        status: record.status.label().to_string(),
        delivery_date: record.delivery_date.clone().unwrap_or_default(),
        privacy_issues: record.privacy_issues,
        security_issues: record.security_issues,
        remarks: record.remarks.clone(),
    }
}

/// 日期格式化为 `YYYY-MM-DD`
pub fn format_date(date: Date) -> AppResult<String> {
    date.format(format_description!("[year]-[month]-[day]"))
        .map_err(|e| AppError::ValidationError(format!("日期格式化失败: {}", e)))
}

/// 导出文件名：`项目交付记录_YYYY-MM-DD.xlsx`
pub fn export_filename(today: Date) -> AppResult<String> {
    Ok(format!("{}_{}.xlsx", SHEET_NAME, format_date(today)?))
}

/// 组装导出计划，没有记录时返回 NothingToExport
pub fn build_export_plan<'a, I>(records: I, today: Date) -> AppResult<ExportPlan>
where
    I: IntoIterator<Item = &'a ProjectRecord>,
{
    let rows: Vec<ExportRow> = records.into_iter().map(to_export_row).collect();
    if rows.is_empty() {
        return Err(AppError::NothingToExport);
    }

    Ok(ExportPlan {
        sheet_name: SHEET_NAME.to_string(),
        filename: export_filename(today)?,
        column_widths: COLUMN_WIDTHS.to_vec(),
        rows,
    })
}

/// 结构化导出：内部键的 JSON 数组，可被 `parse_structured` 原样读回
pub fn export_structured<'a, I>(records: I) -> AppResult<String>
where
    I: IntoIterator<Item = &'a ProjectRecord>,
{
    let records: Vec<&ProjectRecord> = records.into_iter().collect();
    Ok(serde_json::to_string_pretty(&records)?)
}

// ============================================================================
// 结构化（JSON）导入
// ============================================================================

/// 解析结构化导入数据
///
/// 顶层必须是数组，数组元素必须是对象；任一条件不满足即整体拒绝。
/// 名称为空的记录被丢弃，返回值第二项为丢弃数量。
pub fn parse_structured(blob: &str) -> AppResult<(Vec<ProjectRecord>, usize)> {
    let value: Value = serde_json::from_str(blob)
        .map_err(|e| AppError::ImportError(format!("无法解析 JSON：{}", e)))?;

    let items = match value {
        Value::Array(items) => items,
        _ => {
            return Err(AppError::ImportError(
                "JSON文件格式不正确。".to_string(),
            ))
        }
    };

    let mut records = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        if !item.is_object() {
            return Err(AppError::ImportError(format!(
                "第 {} 条记录不是对象",
                index + 1
            )));
        }
        let record: ProjectRecord = serde_json::from_value(item).map_err(|e| {
            AppError::ImportError(format!("第 {} 条记录格式不正确：{}", index + 1, e))
        })?;
        records.push(record);
    }

    Ok(drop_unnamed(records))
}

// ============================================================================
// 表格导入
// ============================================================================

fn cell_text(cell: &CellValue) -> String {
    match cell {
        CellValue::Text(text) => text.clone(),
        CellValue::Number(n) if n.is_finite() && n.fract() == 0.0 => format!("{}", *n as i64),
        CellValue::Number(n) => n.to_string(),
        CellValue::Bool(b) => b.to_string(),
        CellValue::Empty => String::new(),
    }
}

/// 电子表格日期转换为 `YYYY-MM-DD`
///
/// - 数值：按日期序列号换算（25569 = 1970-01-01，UTC），四舍五入到毫秒
/// - 文本：仅接受 `YYYY-MM-DD`
/// - 空值、0 及其他格式：视为未排期
pub fn spreadsheet_date_to_iso(cell: Option<&CellValue>) -> Option<String> {
    match cell? {
        CellValue::Text(text) => {
            let text = text.trim();
            is_iso_date(text).then(|| text.to_string())
        }
        CellValue::Number(serial) => {
            if *serial == 0.0 || !serial.is_finite() {
                return None;
            }
            let millis = ((serial - SPREADSHEET_EPOCH_OFFSET_DAYS) * MILLIS_PER_DAY).round();
            let nanos = (millis as i128).checked_mul(1_000_000)?;
            OffsetDateTime::from_unix_timestamp_nanos(nanos)
                .ok()
                .and_then(|dt| format_date(dt.date()).ok())
        }
        CellValue::Bool(_) | CellValue::Empty => None,
    }
}

fn issue_count(cell: Option<&CellValue>) -> u32 {
    match cell {
        Some(CellValue::Number(n)) => count_from_number(*n),
        Some(CellValue::Text(text)) => count_from_text(text),
        Some(CellValue::Bool(_) | CellValue::Empty) | None => 0,
    }
}

/// 表格行 → 记录
///
/// 显示标签反查内部键，无法识别时取默认值（app / initial-test）。
pub fn record_from_row(row: &TabularRow) -> ProjectRecord {
    let text = |column: &str| row.get(column).map(cell_text).unwrap_or_default();

    ProjectRecord {
        name: text(COL_NAME).trim().to_string(),
        asset_type: AssetType::from_label(&text(COL_ASSET_TYPE)),
        status: DeliveryStatus::from_label(&text(COL_STATUS)),
        delivery_date: spreadsheet_date_to_iso(row.get(COL_DELIVERY_DATE)),
        privacy_issues: issue_count(row.get(COL_PRIVACY_ISSUES)),
        security_issues: issue_count(row.get(COL_SECURITY_ISSUES)),
        remarks: text(COL_REMARKS).trim().to_string(),
    }
}

/// 解析表格导入数据
///
/// 空工作表、或所有行都没有项目名称时整体拒绝。
pub fn parse_tabular(rows: &[TabularRow]) -> AppResult<(Vec<ProjectRecord>, usize)> {
    if rows.is_empty() {
        return Err(AppError::ImportError(
            "Excel文件中没有找到数据。".to_string(),
        ));
    }

    let (records, dropped) = drop_unnamed(rows.iter().map(record_from_row).collect());
    if records.is_empty() {
        return Err(AppError::ImportError(
            "Excel文件中没有包含项目名称的记录。".to_string(),
        ));
    }

    Ok((records, dropped))
}

fn drop_unnamed(records: Vec<ProjectRecord>) -> (Vec<ProjectRecord>, usize) {
    let total = records.len();
    let kept: Vec<ProjectRecord> = records
        .into_iter()
        .filter(|r| !r.name.trim().is_empty())
        .collect();
    let dropped = total - kept.len();
    if dropped > 0 {
        log::warn!("导入时丢弃了 {} 条没有项目名称的记录", dropped);
    }
    (kept, dropped)
}

// ============================================================================
// 单元测试
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use time::Month;

    fn row(cells: &[(&str, CellValue)]) -> TabularRow {
        cells
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    #[test]
    fn test_serial_45000_converts_with_epoch_offset() {
        let date = spreadsheet_date_to_iso(Some(&CellValue::Number(45000.0)));
        assert_eq!(date.as_deref(), Some("2023-03-15"));
    }

    #[test]
    fn test_serial_epoch_is_1970() {
        let date = spreadsheet_date_to_iso(Some(&CellValue::Number(25569.0)));
        assert_eq!(date.as_deref(), Some("1970-01-01"));
    }

    #[test]
    fn test_fractional_serial_keeps_day() {
        let date = spreadsheet_date_to_iso(Some(&CellValue::Number(45000.75)));
        assert_eq!(date.as_deref(), Some("2023-03-15"));
    }

    #[test]
    fn test_date_text_and_empty_values() {
        assert_eq!(
            spreadsheet_date_to_iso(Some(&text("2024-03-10"))).as_deref(),
            Some("2024-03-10")
        );
        assert_eq!(spreadsheet_date_to_iso(Some(&text("2024/03/10"))), None);
        assert_eq!(spreadsheet_date_to_iso(Some(&text(""))), None);
        assert_eq!(spreadsheet_date_to_iso(Some(&CellValue::Number(0.0))), None);
        assert_eq!(spreadsheet_date_to_iso(None), None);
    }

    #[test]
    fn test_full_width_date_text_is_unscheduled() {
        assert_eq!(spreadsheet_date_to_iso(Some(&text("２０２４-０３-１０"))), None);
        let r = record_from_row(&row(&[
            (COL_NAME, text("全角日期")),
            (COL_DELIVERY_DATE, text("２０２４-０３-１０")),
        ]));
        assert_eq!(r.delivery_date, None);
    }

    #[test]
    fn test_bool_and_null_cells_deserialize_leniently() {
        let rows: Vec<TabularRow> = serde_json::from_str(
            r#"[{"项目名称": "布尔行", "交付时间": null, "隐私合规问题": true, "备注": false}]"#,
        )
        .unwrap();
        assert_eq!(rows[0].get(COL_DELIVERY_DATE), Some(&CellValue::Empty));
        assert_eq!(rows[0].get(COL_PRIVACY_ISSUES), Some(&CellValue::Bool(true)));

        let (records, dropped) = parse_tabular(&rows).unwrap();
        assert_eq!(dropped, 0);
        assert_eq!(records[0].name, "布尔行");
        assert_eq!(records[0].delivery_date, None);
        assert_eq!(records[0].privacy_issues, 0);
        assert_eq!(records[0].remarks, "false");
    }

    #[test]
    fn test_record_from_row_maps_labels() {
        let r = record_from_row(&row(&[
            (COL_NAME, text("客服小程序")),
            (COL_ASSET_TYPE, text("小程序")),
            (COL_STATUS, text("复测")),
            (COL_DELIVERY_DATE, CellValue::Number(45000.0)),
            (COL_PRIVACY_ISSUES, CellValue::Number(2.0)),
            (COL_SECURITY_ISSUES, text("3")),
            (COL_REMARKS, text("安全问题待修复")),
        ]));
        assert_eq!(r.name, "客服小程序");
        assert_eq!(r.asset_type, AssetType::Miniprogram);
        assert_eq!(r.status, DeliveryStatus::ReTest);
        assert_eq!(r.delivery_date.as_deref(), Some("2023-03-15"));
        assert_eq!(r.privacy_issues, 2);
        assert_eq!(r.security_issues, 3);
        assert_eq!(r.remarks, "安全问题待修复");
    }

    #[test]
    fn test_unrecognized_asset_label_defaults_to_app() {
        let r = record_from_row(&row(&[
            (COL_NAME, text("拼写错误")),
            (COL_ASSET_TYPE, text("小陈序")),
            (COL_STATUS, text("未知")),
        ]));
        assert_eq!(r.asset_type, AssetType::App);
        assert_eq!(r.status, DeliveryStatus::InitialTest);
        assert_eq!(r.privacy_issues, 0);
        assert_eq!(r.delivery_date, None);
    }

    #[test]
    fn test_negative_and_invalid_counts_coerced() {
        let r = record_from_row(&row(&[
            (COL_NAME, text("x")),
            (COL_PRIVACY_ISSUES, CellValue::Number(-2.0)),
            (COL_SECURITY_ISSUES, text("无")),
        ]));
        assert_eq!(r.privacy_issues, 0);
        assert_eq!(r.security_issues, 0);
    }

    #[test]
    fn test_numeric_name_cell_becomes_text() {
        let r = record_from_row(&row(&[(COL_NAME, CellValue::Number(2024.0))]));
        assert_eq!(r.name, "2024");
    }

    #[test]
    fn test_parse_tabular_rejects_empty_sheet() {
        assert!(matches!(parse_tabular(&[]), Err(AppError::ImportError(_))));
    }

    #[test]
    fn test_parse_tabular_drops_unnamed_rows() {
        let rows = vec![
            row(&[(COL_NAME, text("a"))]),
            row(&[(COL_NAME, text("  "))]),
            row(&[(COL_REMARKS, text("只有备注"))]),
        ];
        let (records, dropped) = parse_tabular(&rows).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(dropped, 2);

        let all_blank = vec![row(&[(COL_REMARKS, text("x"))])];
        assert!(parse_tabular(&all_blank).is_err());
    }

    #[test]
    fn test_parse_structured_rejects_non_sequence() {
        assert!(matches!(
            parse_structured(r#"{"name":"x"}"#),
            Err(AppError::ImportError(_))
        ));
        assert!(parse_structured("not json").is_err());
        assert!(parse_structured(r#"[1, 2]"#).is_err());
    }

    #[test]
    fn test_parse_structured_accepts_internal_keys() {
        let (records, dropped) = parse_structured(
            r#"[{"name":"营销H5","assetType":"h5","status":"re-test","deliveryDate":"2024-02-25","privacyIssues":1,"securityIssues":0,"remarks":""}]"#,
        )
        .unwrap();
        assert_eq!(dropped, 0);
        assert_eq!(records[0].asset_type, AssetType::H5);
        assert_eq!(records[0].delivery_date.as_deref(), Some("2024-02-25"));
    }

    #[test]
    fn test_parse_structured_empty_array() {
        assert_eq!(parse_structured("[]").unwrap(), (Vec::new(), 0));
    }

    #[test]
    fn test_export_row_uses_labels() {
        let record = ProjectRecord {
            name: "企业公众号".to_string(),
            asset_type: AssetType::Wechat,
            status: DeliveryStatus::InitialTest,
            delivery_date: None,
            privacy_issues: 0,
            security_issues: 0,
            remarks: "待开始初测".to_string(),
        };
        let exported = to_export_row(&record);
        assert_eq!(exported.asset_type, "公众号");
        assert_eq!(exported.status, "初测");
        assert_eq!(exported.delivery_date, "");

        let json = serde_json::to_value(&exported).unwrap();
        assert_eq!(json[COL_NAME], "企业公众号");
        assert_eq!(json[COL_ASSET_TYPE], "公众号");
    }

    #[test]
    fn test_export_plan() {
        let today = Date::from_calendar_date(2024, Month::March, 5).unwrap();
        let records = vec![ProjectRecord {
            name: "a".to_string(),
            ..Default::default()
        }];
        let plan = build_export_plan(&records, today).unwrap();
        assert_eq!(plan.filename, "项目交付记录_2024-03-05.xlsx");
        assert_eq!(plan.sheet_name, SHEET_NAME);
        assert_eq!(plan.column_widths, vec![25, 15, 15, 15, 18, 18, 30]);
        assert_eq!(plan.rows.len(), 1);

        let empty: Vec<ProjectRecord> = Vec::new();
        assert!(matches!(
            build_export_plan(&empty, today),
            Err(AppError::NothingToExport)
        ));
    }

    #[test]
    fn test_structured_export_reads_back() {
        let records = vec![ProjectRecord {
            name: "电商移动端APP".to_string(),
            asset_type: AssetType::App,
            status: DeliveryStatus::ReTest,
            delivery_date: Some("2024-03-10".to_string()),
            privacy_issues: 2,
            security_issues: 1,
            remarks: "已完成一轮复测".to_string(),
        }];
        let blob = export_structured(&records).unwrap();
        assert_eq!(parse_structured(&blob).unwrap(), (records, 0));
    }

    #[test]
    fn test_tabular_export_then_import_preserves_records() {
        let record = ProjectRecord {
            name: "营销H5".to_string(),
            asset_type: AssetType::H5,
            status: DeliveryStatus::ReTest,
            delivery_date: Some("2024-02-25".to_string()),
            privacy_issues: 1,
            security_issues: 0,
            remarks: String::new(),
        };
        let exported = serde_json::to_value(to_export_row(&record)).unwrap();
        let tabular: TabularRow = serde_json::from_value(exported).unwrap();
        assert_eq!(record_from_row(&tabular), record);
    }
}
