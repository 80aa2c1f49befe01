use flux_rules::RuleSourceError;
use flux_zabbix::SenderError;
use thiserror::Error;

/// 发布阶段错误
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("Failed to resolve collector address '{addr}': {reason}")]
    Resolve { addr: String, reason: String },

    #[error("Failed to send discovery batch to {addr}: {source}")]
    Send {
        addr: String,
        #[source]
        source: SenderError,
    },
}

/// 单个轮询周期的错误，只影响当前周期
#[derive(Debug, Error)]
pub enum CycleError {
    #[error("Fetch stage failed: {0}")]
    Fetch(#[from] RuleSourceError),

    #[error("Publish stage failed: {0}")]
    Publish(#[from] PublishError),
}

impl CycleError {
    /// 失败的阶段名称
    pub fn stage(&self) -> &'static str {
        match self {
            CycleError::Fetch(_) => "fetch",
            CycleError::Publish(PublishError::Resolve { .. }) => "resolve",
            CycleError::Publish(PublishError::Send { .. }) => "send",
        }
    }
}

pub type Result<T> = std::result::Result<T, CycleError>;
