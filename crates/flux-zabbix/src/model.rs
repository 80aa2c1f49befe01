use serde::{Deserialize, Serialize};
use std::fmt;

pub const REQUEST_SENDER_DATA: &str = "sender data";

pub const RESPONSE_SUCCESS: &str = "success";

/// 发送给 trapper 的单条数据
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataItem {
    /// 目标主机名
    pub host: String,

    /// 监控项 key
    pub key: String,

    pub value: String,

    /// Unix 时间戳（秒），为空时使用服务端当前时间
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clock: Option<i64>,
}

impl DataItem {
    pub fn new(host: impl Into<String>, key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            key: key.into(),
            value: value.into(),
            clock: None,
        }
    }

    pub fn with_clock(mut self, clock: i64) -> Self {
        self.clock = Some(clock);
        self
    }
}

/// sender 请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SenderRequest {
    pub request: String,
    pub data: Vec<DataItem>,
}

impl SenderRequest {
    pub fn new(data: Vec<DataItem>) -> Self {
        Self {
            request: REQUEST_SENDER_DATA.to_string(),
            data,
        }
    }
}

/// trapper 响应
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SenderResponse {
    pub response: String,

    #[serde(default)]
    pub info: String,
}

impl SenderResponse {
    pub fn is_success(&self) -> bool {
        self.response == RESPONSE_SUCCESS
    }

    /// 解析 info 字段
    pub fn summary(&self) -> Option<SenderSummary> {
        SenderSummary::parse(&self.info)
    }
}

/// info 字段解析结果
///
/// 格式: `processed: 1; failed: 0; total: 1; seconds spent: 0.000055`
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SenderSummary {
    pub processed: u64,
    pub failed: u64,
    pub total: u64,
    pub seconds_spent: f64,
}

impl SenderSummary {
    pub fn parse(info: &str) -> Option<Self> {
        let mut summary = Self::default();
        let mut matched = false;

        for part in info.split(';') {
            let Some((key, value)) = part.split_once(':') else {
                continue;
            };
            let value = value.trim();

            match key.trim() {
                "processed" => summary.processed = value.parse().ok()?,
                "failed" => summary.failed = value.parse().ok()?,
                "total" => summary.total = value.parse().ok()?,
                "seconds spent" => summary.seconds_spent = value.parse().ok()?,
                _ => continue,
            }
            matched = true;
        }

        matched.then_some(summary)
    }
}

impl fmt::Display for SenderSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "processed: {}; failed: {}; total: {}; seconds spent: {:.6}",
            self.processed, self.failed, self.total, self.seconds_spent
        )
    }
}
