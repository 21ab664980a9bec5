// ============================================================================
// 看板控制器：唯一持有记录集合、筛选状态与存储的应用状态对象
// ============================================================================
//
// 每个变更命令（新增/编辑/删除/导入/清空）都是一个完整事务：
//   修改集合 → 排序 → 持久化
// 之后的视图（可见行、统计、报告）总是从集合重新计算，不单独维护。

use time::macros::format_description;
use time::{Date, OffsetDateTime};

use crate::models::dtos::{DashboardView, ExportPlan, ImportSummary, TabularRow, VisibleRow};
use crate::models::record::{
    issue_level, AssetType, DeliveryStatus, ProjectRecord, RecordId, TrackedRecord,
};
use crate::services::filter::{apply_filters, CategoryFilter, FilterState};
use crate::services::persistence::{self, Storage, STORAGE_KEY};
use crate::services::transfer::{self, TabularCodec};
use crate::services::{aggregator, sorter};
use crate::utils::error::{AppError, AppResult};

// ============================================================================
// 配置
// ============================================================================

/// 看板启动选项
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DashboardOptions {
    /// 记录集合在存储中的键
    pub storage_key: String,
    /// 存储中没有数据（或为空）时写入示例数据
    pub seed_sample_data: bool,
    /// 启动时的月份筛选（`YYYY-MM`），None 表示不筛选
    pub initial_month: Option<String>,
}

impl Default for DashboardOptions {
    fn default() -> Self {
        DashboardOptions {
            storage_key: STORAGE_KEY.to_string(),
            seed_sample_data: true,
            initial_month: current_month(),
        }
    }
}

fn local_now() -> OffsetDateTime {
    OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
}

/// 本地时间的当前月份 `YYYY-MM`
pub fn current_month() -> Option<String> {
    local_now()
        .format(format_description!("[year]-[month]"))
        .ok()
}

/// 导出文件名使用 UTC 日期
pub fn today_utc() -> Date {
    OffsetDateTime::now_utc().date()
}

/// 首次启动时的示例数据
pub fn sample_projects() -> Vec<ProjectRecord> {
    let sample = |name: &str,
                  asset_type: AssetType,
                  status: DeliveryStatus,
                  date: &str,
                  privacy: u32,
                  security: u32,
                  remarks: &str| ProjectRecord {
        name: name.to_string(),
        asset_type,
        status,
        delivery_date: Some(date.to_string()),
        privacy_issues: privacy,
        security_issues: security,
        remarks: remarks.to_string(),
    };

    vec![
        sample("电商移动端APP", AssetType::App, DeliveryStatus::ReTest, "2024-03-10", 2, 1, "已完成一轮复测"),
        sample("客服小程序", AssetType::Miniprogram, DeliveryStatus::InitialTest, "2024-04-15", 0, 3, "安全问题待修复"),
        sample("营销H5", AssetType::H5, DeliveryStatus::ReTest, "2024-02-25", 1, 0, ""),
        sample("企业公众号", AssetType::Wechat, DeliveryStatus::InitialTest, "2024-05-20", 0, 0, "待开始初测"),
    ]
}

// ============================================================================
// 控制器
// ============================================================================

/// 看板应用状态
///
/// 集合始终按交付日期排序；记录的合成标识在进入集合时分配，
/// 编辑/删除通过 "视图位置 → 标识" 定位到集合中的记录。
pub struct Dashboard<S: Storage> {
    storage: S,
    storage_key: String,
    records: Vec<TrackedRecord>,
    filter: FilterState,
    next_id: u64,
    storage_warning: bool,
}

impl<S: Storage> Dashboard<S> {
    /// 打开看板：从存储加载记录，必要时写入示例数据，并应用初始月份筛选
    pub fn open(storage: S, options: DashboardOptions) -> Self {
        let mut dashboard = Dashboard {
            storage,
            storage_key: options.storage_key,
            records: Vec::new(),
            filter: FilterState::default(),
            next_id: 0,
            storage_warning: false,
        };

        let loaded = persistence::load(&dashboard.storage, &dashboard.storage_key)
            .filter(|records| !records.is_empty());

        match loaded {
            Some(records) => {
                dashboard.replace_all(records);
                sorter::sort_tracked(&mut dashboard.records);
            }
            None if options.seed_sample_data => {
                log::info!("未找到已保存的数据，写入示例数据");
                dashboard.replace_all(sample_projects());
                dashboard.commit();
            }
            None => {}
        }

        if let Err(e) = dashboard.filter.set_month(options.initial_month.as_deref()) {
            log::warn!("忽略无效的初始月份: {}", e);
        }

        dashboard
    }

    pub fn records(&self) -> &[TrackedRecord] {
        &self.records
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// 最近一次保存是否失败
    pub fn storage_warning(&self) -> bool {
        self.storage_warning
    }

    /// 当前可见子集
    pub fn visible(&self) -> Vec<&TrackedRecord> {
        apply_filters(&self.records, &self.filter)
    }

    /// 组装交给渲染层的完整视图
    pub fn view(&self) -> DashboardView {
        let rows = self
            .visible()
            .into_iter()
            .enumerate()
            .map(|(position, tracked)| VisibleRow {
                position,
                id: tracked.id,
                record: tracked.record.clone(),
                highlighted: self.filter.highlights(&tracked.record),
                privacy_level: issue_level(tracked.record.privacy_issues),
                security_level: issue_level(tracked.record.security_issues),
            })
            .collect();

        let all = || self.records.iter().map(|t| &t.record);

        DashboardView {
            rows,
            summary: aggregator::summarize(all()),
            asset_totals: aggregator::issue_totals_by_asset(all()),
            monthly_report: self
                .filter
                .month()
                .map(|month| aggregator::monthly_report(all(), month)),
            filter: self.filter.clone(),
            filter_hint: match self.filter.category() {
                CategoryFilter::Total => None,
                category => Some(format!("筛选: {}", category.label())),
            },
            storage_warning: self.storage_warning,
        }
    }

    // ========================================================================
    // 变更命令
    // ========================================================================

    /// 新增记录，名称为空时拒绝
    pub fn add(&mut self, record: ProjectRecord) -> AppResult<RecordId> {
        let record = record.normalized()?;
        let id = self.track(record);
        self.commit();
        Ok(id)
    }

    /// 编辑当前视图中第 `position` 条记录，标识保持不变
    pub fn edit(&mut self, position: usize, record: ProjectRecord) -> AppResult<()> {
        let record = record.normalized()?;
        let id = self.resolve(position)?;
        if let Some(slot) = self.records.iter_mut().find(|t| t.id == id) {
            slot.record = record;
        }
        self.commit();
        Ok(())
    }

    /// 删除当前视图中第 `position` 条记录，返回被删除的记录
    pub fn delete(&mut self, position: usize) -> AppResult<ProjectRecord> {
        let id = self.resolve(position)?;
        let index = self
            .records
            .iter()
            .position(|t| t.id == id)
            .ok_or(AppError::NotFound(position))?;
        let removed = self.records.remove(index);
        self.commit();
        Ok(removed.record)
    }

    /// 清空全部数据，筛选状态保持不变
    pub fn clear_all(&mut self) {
        let count = self.records.len();
        self.records.clear();
        self.commit();
        log::info!("已清空全部数据（{} 条）", count);
    }

    // ========================================================================
    // 筛选命令
    // ========================================================================

    /// 设置月份筛选（None 或空字符串表示清除），设置时类别筛选回到 total
    pub fn set_month_filter(&mut self, month: Option<&str>) -> AppResult<()> {
        self.filter.set_month(month)
    }

    pub fn set_category_filter(&mut self, category: CategoryFilter) {
        self.filter.set_category(category);
    }

    pub fn clear_filter(&mut self) {
        self.filter.clear();
    }

    // ========================================================================
    // 导入 / 导出
    // ========================================================================

    /// 结构化（JSON）导入：整体替换集合，格式不正确时集合保持不变
    pub fn import_structured(&mut self, blob: &str) -> AppResult<ImportSummary> {
        let (records, dropped) = transfer::parse_structured(blob)?;
        Ok(self.finish_import(records, dropped, "JSON"))
    }

    /// 表格导入（已解码的行）：整体替换集合
    pub fn import_rows(&mut self, rows: &[TabularRow]) -> AppResult<ImportSummary> {
        let (records, dropped) = transfer::parse_tabular(rows)?;
        Ok(self.finish_import(records, dropped, "Excel"))
    }

    /// 表格导入：通过编解码器读取文件内容后整体替换集合
    pub fn import_tabular(
        &mut self,
        codec: &dyn TabularCodec,
        data: &[u8],
    ) -> AppResult<ImportSummary> {
        let rows = codec.read_table(data)?;
        self.import_rows(&rows)
    }

    /// 导出计划：可见子集非空时导出可见子集，否则导出全量集合
    pub fn export_plan(&self, today: Date) -> AppResult<ExportPlan> {
        let visible = self.visible();
        if visible.is_empty() {
            transfer::build_export_plan(self.records.iter().map(|t| &t.record), today)
        } else {
            transfer::build_export_plan(visible.into_iter().map(|t| &t.record), today)
        }
    }

    /// 表格导出：组装导出计划并交给编解码器写文件
    pub fn export_tabular(&self, codec: &mut dyn TabularCodec) -> AppResult<ExportPlan> {
        let plan = self.export_plan(today_utc())?;
        codec.write_table(&plan.rows, &plan.column_widths, &plan.filename)?;
        Ok(plan)
    }

    /// 结构化导出全量集合
    pub fn export_structured(&self) -> AppResult<String> {
        transfer::export_structured(self.records.iter().map(|t| &t.record))
    }

    // ========================================================================
    // 内部辅助
    // ========================================================================

    fn track(&mut self, record: ProjectRecord) -> RecordId {
        let id = RecordId(self.next_id);
        self.next_id += 1;
        self.records.push(TrackedRecord { id, record });
        id
    }

    fn replace_all(&mut self, records: Vec<ProjectRecord>) {
        self.records.clear();
        for record in records {
            self.track(record);
        }
    }

    fn finish_import(
        &mut self,
        records: Vec<ProjectRecord>,
        dropped: usize,
        source: &str,
    ) -> ImportSummary {
        self.replace_all(records);
        self.commit();
        self.filter.clear();
        log::info!("{}数据导入成功：{} 条记录", source, self.records.len());
        ImportSummary {
            imported: self.records.len(),
            dropped,
        }
    }

    fn resolve(&self, position: usize) -> AppResult<RecordId> {
        self.visible()
            .get(position)
            .map(|t| t.id)
            .ok_or(AppError::NotFound(position))
    }

    /// 排序并持久化；保存失败只记录告警标记
    fn commit(&mut self) {
        sorter::sort_tracked(&mut self.records);
        let plain: Vec<ProjectRecord> = self.records.iter().map(|t| t.record.clone()).collect();
        self.storage_warning = !persistence::save(&mut self.storage, &self.storage_key, &plain);
    }
}

// ============================================================================
// 单元测试
// ============================================================================
