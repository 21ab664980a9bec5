// ============================================================================
// 筛选管道：月份筛选 × 卡片类别筛选
// ============================================================================
//
// 筛选状态是一个小型状态机：
//   类别 {total, re-test, privacy, security} × 月份 {已设置, 未设置}
// 转换规则：
//   - 设置月份 → 类别强制回到 total
//   - 设置类别 → 月份保持不变
//   - 清除筛选 → 月份未设置，类别 total
// 筛选顺序固定为先月份、后类别。

use serde::{Deserialize, Serialize};

use crate::models::record::{is_month_key, DeliveryStatus, ProjectRecord, TrackedRecord};
use crate::utils::error::{AppError, AppResult};

/// 统计卡片对应的类别筛选，互斥
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum CategoryFilter {
    /// 不限制类别
    #[default]
    Total,
    ReTest,
    Privacy,
    Security,
}

impl CategoryFilter {
    pub fn accepts(self, record: &ProjectRecord) -> bool {
        match self {
            CategoryFilter::Total => true,
            CategoryFilter::ReTest => record.status == DeliveryStatus::ReTest,
            CategoryFilter::Privacy => record.privacy_issues > 0,
            CategoryFilter::Security => record.security_issues > 0,
        }
    }

    /// 卡片标签，用于 "筛选: xxx" 提示
    pub fn label(self) -> &'static str {
        match self {
            CategoryFilter::Total => "总项目数",
            CategoryFilter::ReTest => "复测项目",
            CategoryFilter::Privacy => "隐私合规问题",
            CategoryFilter::Security => "安全漏洞问题",
        }
    }
}

/// 当前筛选状态
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FilterState {
    /// `YYYY-MM`
    month_filter: Option<String>,
    category_filter: CategoryFilter,
}

impl FilterState {
    pub fn month(&self) -> Option<&str> {
        self.month_filter.as_deref()
    }

    pub fn category(&self) -> CategoryFilter {
        self.category_filter
    }

    /// 设置或清除月份筛选
    ///
    /// 空字符串视为清除。设置月份时类别筛选强制回到 total。
    pub fn set_month(&mut self, month: Option<&str>) -> AppResult<()> {
        match month.map(str::trim) {
            None | Some("") => {
                self.month_filter = None;
            }
            Some(month) if is_month_key(month) => {
                self.month_filter = Some(month.to_string());
                self.category_filter = CategoryFilter::Total;
            }
            Some(month) => {
                return Err(AppError::ValidationError(format!(
                    "月份格式应为 YYYY-MM：{}",
                    month
                )));
            }
        }
        Ok(())
    }

    /// 切换类别筛选，不影响月份筛选
    pub fn set_category(&mut self, category: CategoryFilter) {
        self.category_filter = category;
    }

    pub fn clear(&mut self) {
        self.month_filter = None;
        self.category_filter = CategoryFilter::Total;
    }

    /// 记录是否通过月份与类别两道筛选
    pub fn matches(&self, record: &ProjectRecord) -> bool {
        let in_month = self
            .month_filter
            .as_deref()
            .map_or(true, |month| record.delivered_in(month));
        in_month && self.category_filter.accepts(record)
    }

    /// 行高亮：隐私筛选下有隐私问题，或安全筛选下有安全问题
    pub fn highlights(&self, record: &ProjectRecord) -> bool {
        match self.category_filter {
            CategoryFilter::Privacy => record.privacy_issues > 0,
            CategoryFilter::Security => record.security_issues > 0,
            _ => false,
        }
    }
}

/// 计算可见子集：先按月份前缀过滤，再应用类别谓词，保持集合原有顺序
pub fn apply_filters<'a>(
    records: &'a [TrackedRecord],
    filter: &FilterState,
) -> Vec<&'a TrackedRecord> {
    let month_filtered = records.iter().filter(|r| {
        filter
            .month()
            .map_or(true, |month| r.record.delivered_in(month))
    });

    month_filtered
        .filter(|r| filter.category().accepts(&r.record))
        .collect()
}

// ============================================================================
// 单元测试
// ============================================================================
