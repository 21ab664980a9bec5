// ============================================================================
// 统计聚合：统计卡片、资产类型问题合计、月度交付报告
// 所有统计都基于全量集合，而不是当前可见子集
// ============================================================================

use crate::models::dtos::{
    AssetIssueTotal, MonthlyReport, MonthlySection, ProjectTally, SummaryCounts,
};
use crate::models::record::{AssetType, DeliveryStatus, ProjectRecord};

/// 计算四张统计卡片：总数、复测数、隐私问题总数、安全问题总数
pub fn summarize<'a, I>(records: I) -> SummaryCounts
where
    I: IntoIterator<Item = &'a ProjectRecord>,
{
    records
        .into_iter()
        .fold(SummaryCounts::default(), |mut acc, record| {
            acc.total_projects += 1;
            if record.status == DeliveryStatus::ReTest {
                acc.re_test_projects += 1;
            }
            acc.privacy_issues += u64::from(record.privacy_issues);
            acc.security_issues += u64::from(record.security_issues);
            acc
        })
}

/// 按资产类型分组合计隐私/安全问题，顺序固定为 app, miniprogram, wechat, h5
pub fn issue_totals_by_asset<'a, I>(records: I) -> Vec<AssetIssueTotal>
where
    I: IntoIterator<Item = &'a ProjectRecord>,
{
    let mut totals: Vec<AssetIssueTotal> = AssetType::ALL
        .iter()
        .map(|&asset_type| AssetIssueTotal {
            asset_type,
            label: asset_type.label().to_string(),
            privacy_issues: 0,
            security_issues: 0,
        })
        .collect();

    for record in records {
        if let Some(slot) = totals.iter_mut().find(|t| t.asset_type == record.asset_type) {
            slot.privacy_issues += u64::from(record.privacy_issues);
            slot.security_issues += u64::from(record.security_issues);
        }
    }

    totals
}

/// 月度交付报告
///
/// 对指定月份（`YYYY-MM`）内交付的记录，按资产类型固定顺序分段，
/// 每段统计交付次数并按项目名称计数（按首次出现顺序）。
pub fn monthly_report<'a, I>(records: I, month: &str) -> MonthlyReport
where
    I: IntoIterator<Item = &'a ProjectRecord>,
{
    let in_month: Vec<&ProjectRecord> = records
        .into_iter()
        .filter(|r| r.delivered_in(month))
        .collect();

    let (year, month_num) = month.split_once('-').unwrap_or((month, ""));

    let sections = AssetType::ALL
        .iter()
        .map(|&asset_type| {
            let mut projects: Vec<ProjectTally> = Vec::new();
            let mut delivery_count = 0;
            for record in in_month.iter().filter(|r| r.asset_type == asset_type) {
                delivery_count += 1;
                match projects.iter_mut().find(|t| t.name == record.name) {
                    Some(tally) => tally.count += 1,
                    None => projects.push(ProjectTally {
                        name: record.name.clone(),
                        count: 1,
                    }),
                }
            }

            MonthlySection {
                asset_type,
                heading: format!(
                    "{}年{}月 {}交付情况 ({} 次)：",
                    year,
                    month_num,
                    asset_type.label(),
                    delivery_count
                ),
                delivery_count,
                projects,
            }
        })
        .collect();

    MonthlyReport {
        month: month.to_string(),
        sections,
    }
}

// ============================================================================
// 单元测试
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn record(name: &str, asset_type: AssetType, date: Option<&str>, privacy: u32, security: u32) -> ProjectRecord {
        ProjectRecord {
            name: name.to_string(),
            asset_type,
            delivery_date: date.map(str::to_string),
            privacy_issues: privacy,
            security_issues: security,
            ..Default::default()
        }
    }

    #[test]
    fn test_summarize() {
        let mut records = vec![
            record("a", AssetType::App, Some("2024-03-10"), 2, 1),
            record("b", AssetType::H5, None, 1, 0),
            record("c", AssetType::Wechat, Some("2024-05-20"), 0, 3),
        ];
        records[0].status = DeliveryStatus::ReTest;

        let summary = summarize(&records);
        assert_eq!(
            summary,
            SummaryCounts {
                total_projects: 3,
                re_test_projects: 1,
                privacy_issues: 3,
                security_issues: 4,
            }
        );
    }

    #[test]
    fn test_summarize_empty() {
        assert_eq!(summarize(&Vec::<ProjectRecord>::new()), SummaryCounts::default());
    }

    #[test]
    fn test_issue_totals_fixed_order() {
        let records = vec![
            record("h5", AssetType::H5, None, 1, 0),
            record("app1", AssetType::App, None, 2, 1),
            record("app2", AssetType::App, None, 1, 1),
        ];
        let totals = issue_totals_by_asset(&records);
        let order: Vec<AssetType> = totals.iter().map(|t| t.asset_type).collect();
        assert_eq!(order, AssetType::ALL.to_vec());
        assert_eq!(totals[0].privacy_issues, 3);
        assert_eq!(totals[0].security_issues, 2);
        assert_eq!(totals[1].privacy_issues, 0);
        assert_eq!(totals[3].label, "H5");
        assert_eq!(totals[3].privacy_issues, 1);
    }

    #[test]
    fn test_monthly_report_groups_by_name() {
        let records = vec![
            record("电商APP", AssetType::App, Some("2024-03-01"), 0, 0),
            record("电商APP", AssetType::App, Some("2024-03-15"), 0, 0),
            record("会员APP", AssetType::App, Some("2024-03-20"), 0, 0),
            record("电商APP", AssetType::App, Some("2024-04-01"), 0, 0),
            record("营销H5", AssetType::H5, Some("2024-03-05"), 0, 0),
            record("未排期", AssetType::H5, None, 0, 0),
        ];
        let report = monthly_report(&records, "2024-03");
        assert_eq!(report.month, "2024-03");
        assert_eq!(report.sections.len(), 4);

        let app = &report.sections[0];
        assert_eq!(app.asset_type, AssetType::App);
        assert_eq!(app.delivery_count, 3);
        assert_eq!(
            app.projects,
            vec![
                ProjectTally { name: "电商APP".to_string(), count: 2 },
                ProjectTally { name: "会员APP".to_string(), count: 1 },
            ]
        );
        assert_eq!(app.heading, "2024年03月 APP交付情况 (3 次)：");

        assert_eq!(report.sections[1].delivery_count, 0);
        assert!(report.sections[1].projects.is_empty());
        assert_eq!(report.sections[3].delivery_count, 1);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Property: Aggregation Correctness
        ///
        /// 各资产类型的隐私/安全问题合计之和等于全局合计。
        #[test]
        fn prop_asset_totals_sum_to_global(
            rows in prop::collection::vec((0usize..4, 0u32..100, 0u32..100), 0..40)
        ) {
            let records: Vec<ProjectRecord> = rows
                .iter()
                .map(|&(asset, privacy, security)| {
                    record("p", AssetType::ALL[asset], None, privacy, security)
                })
                .collect();

            let summary = summarize(&records);
            let totals = issue_totals_by_asset(&records);
            prop_assert_eq!(totals.iter().map(|t| t.privacy_issues).sum::<u64>(), summary.privacy_issues);
            prop_assert_eq!(totals.iter().map(|t| t.security_issues).sum::<u64>(), summary.security_issues);
            prop_assert_eq!(summary.total_projects, records.len());
        }

        /// Property: Monthly Report Tallies
        ///
        /// 每段的交付次数等于该段各项目计数之和，各段合计等于当月记录数。
        #[test]
        fn prop_monthly_report_counts_consistent(
            rows in prop::collection::vec((0usize..4, 0usize..3, 1u32..4), 0..30)
        ) {
            let names = ["甲", "乙", "丙"];
            let records: Vec<ProjectRecord> = rows
                .iter()
                .map(|&(asset, name, month)| {
                    let date = format!("2024-0{}-01", month);
                    record(names[name], AssetType::ALL[asset], Some(&date), 0, 0)
                })
                .collect();

            let report = monthly_report(&records, "2024-02");
            let mut total = 0;
            for section in &report.sections {
                prop_assert_eq!(
                    section.delivery_count,
                    section.projects.iter().map(|t| t.count).sum::<usize>()
                );
                total += section.delivery_count;
            }
            let expected = records.iter().filter(|r| r.delivered_in("2024-02")).count();
            prop_assert_eq!(total, expected);
        }
    }
}
