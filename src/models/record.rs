// ============================================================================
// 项目交付记录模型
// 记录结构、资产类型/交付状态枚举，以及显示标签映射表
// ============================================================================

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::utils::error::{AppError, AppResult};

// ============================================================================
// 枚举定义
// ============================================================================

/// 资产类型
///
/// 声明顺序即统计图表与月度报告中的固定展示顺序。
#[derive(Serialize, Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum AssetType {
    #[default]
    App,
    Miniprogram,
    Wechat,
    H5,
}

impl AssetType {
    /// 固定枚举顺序 {app, miniprogram, wechat, h5}
    pub const ALL: [AssetType; 4] = [
        AssetType::App,
        AssetType::Miniprogram,
        AssetType::Wechat,
        AssetType::H5,
    ];

    /// 内部键（结构化导入导出使用）
    pub fn key(self) -> &'static str {
        match self {
            AssetType::App => "app",
            AssetType::Miniprogram => "miniprogram",
            AssetType::Wechat => "wechat",
            AssetType::H5 => "h5",
        }
    }

    /// 显示标签（表格导出使用）
    pub fn label(self) -> &'static str {
        match self {
            AssetType::App => "APP",
            AssetType::Miniprogram => "小程序",
            AssetType::Wechat => "公众号",
            AssetType::H5 => "H5",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.key() == key)
    }

    /// 显示标签反查内部键，无法识别时回退为 `app`
    pub fn from_label(label: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|t| t.label() == label.trim())
            .unwrap_or_default()
    }
}

/// 交付状态
#[derive(Serialize, Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum DeliveryStatus {
    #[default]
    InitialTest,
    ReTest,
}

impl DeliveryStatus {
    pub const ALL: [DeliveryStatus; 2] = [DeliveryStatus::InitialTest, DeliveryStatus::ReTest];

    pub fn key(self) -> &'static str {
        match self {
            DeliveryStatus::InitialTest => "initial-test",
            DeliveryStatus::ReTest => "re-test",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DeliveryStatus::InitialTest => "初测",
            DeliveryStatus::ReTest => "复测",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.key() == key)
    }

    /// 显示标签反查内部键，无法识别时回退为 `initial-test`
    pub fn from_label(label: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|s| s.label() == label.trim())
            .unwrap_or_default()
    }
}

// 枚举反序列化采用宽松策略：无法识别的键回退为默认值，而不是让整条记录失败
impl<'de> Deserialize<'de> for AssetType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(value
            .as_str()
            .and_then(AssetType::from_key)
            .unwrap_or_default())
    }
}

impl<'de> Deserialize<'de> for DeliveryStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(value
            .as_str()
            .and_then(DeliveryStatus::from_key)
            .unwrap_or_default())
    }
}

// ============================================================================
// 记录结构
// ============================================================================

/// 项目交付记录
///
/// JSON 字段名为内部键（camelCase），与本地存储及结构化导入导出格式一致。
/// `deliveryDate` 为空字符串表示未排期。
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRecord {
    #[serde(default, deserialize_with = "lenient_text")]
    pub name: String,
    #[serde(default)]
    pub asset_type: AssetType,
    #[serde(default)]
    pub status: DeliveryStatus,
    /// `YYYY-MM-DD`，None 表示未排期
    #[serde(
        default,
        serialize_with = "serialize_date",
        deserialize_with = "deserialize_date"
    )]
    pub delivery_date: Option<String>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub privacy_issues: u32,
    #[serde(default, deserialize_with = "lenient_count")]
    pub security_issues: u32,
    #[serde(default, deserialize_with = "lenient_text")]
    pub remarks: String,
}

impl ProjectRecord {
    /// 手动录入的规范化与校验
    ///
    /// 去除名称和备注首尾空白；空日期视为未排期；
    /// 名称为空或日期不是 `YYYY-MM-DD` 时返回 ValidationError。
    pub fn normalized(self) -> AppResult<Self> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::ValidationError("请输入项目名称".to_string()));
        }

        let delivery_date = match self.delivery_date.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(date) if is_iso_date(date) => Some(date.to_string()),
            Some(date) => {
                return Err(AppError::ValidationError(format!(
                    "交付时间格式应为 YYYY-MM-DD：{}",
                    date
                )))
            }
        };

        Ok(ProjectRecord {
            name,
            delivery_date,
            remarks: self.remarks.trim().to_string(),
            ..self
        })
    }

    /// 交付日期是否落在指定月份（`YYYY-MM` 前缀匹配）
    pub fn delivered_in(&self, month: &str) -> bool {
        self.delivery_date
            .as_deref()
            .is_some_and(|date| date.starts_with(month))
    }
}

/// 记录的合成标识
///
/// 记录进入集合（新增、加载、导入）时分配，只存在于内存中，
/// 不写入存储。单调递增，因此同时代表插入顺序。
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RecordId(pub u64);

/// 携带合成标识的记录，排序与筛选都以此为单位传递
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct TrackedRecord {
    pub id: RecordId,
    #[serde(flatten)]
    pub record: ProjectRecord,
}

/// 问题数量等级（表格着色使用）
#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum IssueLevel {
    Low,
    Medium,
    High,
}

pub fn issue_level(count: u32) -> IssueLevel {
    match count {
        0 => IssueLevel::Low,
        1..=2 => IssueLevel::Medium,
        _ => IssueLevel::High,
    }
}

// ============================================================================
// 格式判断与数值强制转换
// ============================================================================

// 数字只接受 ASCII 0-9，全角或其他文字的数字不构成合法日期
fn iso_date_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$").ok())
        .as_ref()
}

fn month_key_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[0-9]{4}-(0[1-9]|1[0-2])$").ok())
        .as_ref()
}

/// 是否为 `YYYY-MM-DD` 格式
pub fn is_iso_date(text: &str) -> bool {
    iso_date_regex().is_some_and(|re| re.is_match(text))
}

/// 是否为 `YYYY-MM` 月份格式
pub fn is_month_key(text: &str) -> bool {
    month_key_regex().is_some_and(|re| re.is_match(text))
}

/// 浮点数转为问题数量：截断小数，负数和非有限值归零
pub fn count_from_number(value: f64) -> u32 {
    if !value.is_finite() || value <= 0.0 {
        return 0;
    }
    value.trunc().min(u32::MAX as f64) as u32
}

/// 文本转为问题数量：取开头的整数部分（"3件" → 3），无法解析或为负数时归零
pub fn count_from_text(text: &str) -> u32 {
    let trimmed = text.trim();
    let (negative, rest) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    if negative || digits.is_empty() {
        return 0;
    }
    digits.parse::<u64>().map_or(u32::MAX, |n| n.min(u32::MAX as u64) as u32)
}

fn count_from_value(value: &Value) -> u32 {
    match value {
        Value::Number(n) => n.as_f64().map(count_from_number).unwrap_or(0),
        Value::String(s) => count_from_text(s),
        _ => 0,
    }
}

fn lenient_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(count_from_value(&value))
}

fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    })
}

fn serialize_date<S: serde::Serializer>(
    date: &Option<String>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(date.as_deref().unwrap_or(""))
}

fn deserialize_date<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    })
}

// ============================================================================
// 单元测试
// ============================================================================
