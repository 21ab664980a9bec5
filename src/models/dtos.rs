// ============================================================================
// 数据传输对象（DTO）定义
// 核心交给渲染层/表格编解码器的数据结构，仅包含字段定义和序列化派生
// 交给前端的字段统一使用 camelCase
// ⛔ 禁止：包含复杂的业务逻辑方法
// ============================================================================

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::models::record::{AssetType, IssueLevel, ProjectRecord, RecordId};
use crate::services::filter::FilterState;

// ============================================================================
// 表格编解码端口数据
// ============================================================================

/// 表格单元格的值（电子表格日期以序列号数值出现）
///
/// 布尔单元格按文本处理，`null` 视为空单元格。
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(untagged)]
pub enum CellValue {
    Number(f64),
    Bool(bool),
    Text(String),
    Empty,
}

/// 表格中的一行：本地化列名 → 单元格值
pub type TabularRow = HashMap<String, CellValue>;

/// 导出行，字段序列化为本地化列名，枚举已替换为显示标签
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ExportRow {
    #[serde(rename = "项目名称")]
    pub name: String,
    #[serde(rename = "资产类型")]
    pub asset_type: String,
    #[serde(rename = "交付状态")]
    pub status: String,
    #[serde(rename = "交付时间")]
    pub delivery_date: String,
    #[serde(rename = "隐私合规问题")]
    pub privacy_issues: u32,
    #[serde(rename = "安全漏洞问题")]
    pub security_issues: u32,
    #[serde(rename = "备注")]
    pub remarks: String,
}

/// 一次表格导出的完整描述，交给表格编解码器落盘
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ExportPlan {
    pub sheet_name: String,
    pub filename: String,
    pub column_widths: Vec<u16>,
    pub rows: Vec<ExportRow>,
}

/// 导入结果
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    /// 替换后集合中的记录数
    pub imported: usize,
    /// 因名称为空被丢弃的行数
    pub dropped: usize,
}

// ============================================================================
// 渲染端口数据
// ============================================================================

/// 四张统计卡片的数值（基于全量集合）
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SummaryCounts {
    pub total_projects: usize,
    pub re_test_projects: usize,
    pub privacy_issues: u64,
    pub security_issues: u64,
}

/// 单个资产类型的问题合计（柱状图的一组数据）
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AssetIssueTotal {
    pub asset_type: AssetType,
    pub label: String,
    pub privacy_issues: u64,
    pub security_issues: u64,
}

/// 某项目名称在当月的交付次数
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectTally {
    pub name: String,
    pub count: usize,
}

/// 月度报告中一个资产类型的段落
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MonthlySection {
    pub asset_type: AssetType,
    /// 例如 "2024年03月 APP交付情况 (1 次)："
    pub heading: String,
    pub delivery_count: usize,
    /// 按首次出现顺序排列
    pub projects: Vec<ProjectTally>,
}

/// 月度交付报告
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyReport {
    pub month: String,
    pub sections: Vec<MonthlySection>,
}

/// 表格中可见的一行
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VisibleRow {
    /// 在当前筛选视图中的位置（编辑/删除命令使用）
    pub position: usize,
    pub id: RecordId,
    #[serde(flatten)]
    pub record: ProjectRecord,
    pub highlighted: bool,
    pub privacy_level: IssueLevel,
    pub security_level: IssueLevel,
}

/// 每次状态变更后交给渲染层的完整视图
#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    pub rows: Vec<VisibleRow>,
    pub summary: SummaryCounts,
    pub asset_totals: Vec<AssetIssueTotal>,
    pub monthly_report: Option<MonthlyReport>,
    pub filter: FilterState,
    /// 类别筛选生效时的提示文字，例如 "筛选: 隐私合规问题"
    pub filter_hint: Option<String>,
    /// 最近一次保存失败时为 true，仅作提示，不阻断操作
    pub storage_warning: bool,
}
