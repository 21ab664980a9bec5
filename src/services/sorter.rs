// ============================================================================
// 排序与规范化：按交付日期升序，未排期的记录排在最后
// ============================================================================

use std::cmp::Ordering;

use crate::models::record::{ProjectRecord, TrackedRecord};

/// 交付日期比较：有日期的记录先于无日期的记录，日期之间按字典序（即时间先后）
pub fn compare_delivery(a: Option<&str>, b: Option<&str>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// 对纯记录列表排序，日期相同时保持原有相对顺序
pub fn sort_records(records: &mut [ProjectRecord]) {
    records.sort_by(|a, b| compare_delivery(a.delivery_date.as_deref(), b.delivery_date.as_deref()));
}

/// 对集合排序，日期相同（或都未排期）时按合成标识即插入顺序排列
pub fn sort_tracked(records: &mut [TrackedRecord]) {
    records.sort_by(|a, b| {
        compare_delivery(
            a.record.delivery_date.as_deref(),
            b.record.delivery_date.as_deref(),
        )
        .then(a.id.cmp(&b.id))
    });
}
