use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

/// 告警规则类型
pub const KIND_ALERTING: &str = "alerting";

/// 记录规则类型
pub const KIND_RECORDING: &str = "recording";

/// 规则定义（告警规则或记录规则）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    /// 规则名称
    pub name: String,

    /// 规则类型（alerting / recording）
    #[serde(rename = "type")]
    pub kind: String,

    /// PromQL 表达式
    #[serde(default, deserialize_with = "null_as_default")]
    pub query: String,

    /// 持续时间（秒）
    #[serde(default)]
    pub duration: f64,

    #[serde(default, deserialize_with = "null_as_default")]
    pub labels: HashMap<String, String>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub annotations: HashMap<String, String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health: Option<String>,
}

impl Rule {
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            query: String::new(),
            duration: 0.0,
            labels: HashMap::new(),
            annotations: HashMap::new(),
            health: None,
        }
    }

    pub fn alerting(name: impl Into<String>) -> Self {
        Self::new(name, KIND_ALERTING)
    }

    pub fn recording(name: impl Into<String>) -> Self {
        Self::new(name, KIND_RECORDING)
    }

    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotations.insert(key.into(), value.into());
        self
    }

    /// 是否为告警规则（忽略大小写）
    pub fn is_alerting(&self) -> bool {
        self.kind.eq_ignore_ascii_case(KIND_ALERTING)
    }
}

/// 规则分组
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleGroup {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub rules: Vec<Rule>,

    /// 评估间隔（秒）
    #[serde(default)]
    pub interval: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RulesData {
    #[serde(default, deserialize_with = "null_as_default")]
    pub groups: Vec<RuleGroup>,
}

/// 显式的 `null` 与缺失字段一样按默认值处理
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// 规则接口响应文档
///
/// ```json
/// {"status": "success", "data": {"groups": [{"name": "...", "rules": [...], "interval": 30}]}}
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RulesResponse {
    pub status: String,

    #[serde(default)]
    pub data: Option<RulesData>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RulesResponse {
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }

    /// 展开所有分组中的规则，保持文档顺序，丢弃分组名称和间隔
    pub fn into_rules(self) -> Vec<Rule> {
        self.data
            .map(|data| {
                data.groups
                    .into_iter()
                    .flat_map(|group| group.rules)
                    .collect()
            })
            .unwrap_or_default()
    }
}
