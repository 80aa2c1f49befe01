use std::net::SocketAddr;
use thiserror::Error;

/// Trapper 发送错误
#[derive(Debug, Error)]
pub enum SenderError {
    #[error("Failed to connect to {addr}: {source}")]
    Connect {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("{stage} to {addr} timed out after {timeout_ms}ms")]
    Timeout {
        addr: SocketAddr,
        stage: &'static str,
        timeout_ms: u64,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Collector rejected data: response='{response}', info='{info}'")]
    Rejected { response: String, info: String },
}

impl SenderError {
    /// 连接未建立，数据一定没有送达
    pub fn is_connect_failure(&self) -> bool {
        matches!(
            self,
            SenderError::Connect { .. } | SenderError::Timeout { stage: "Connect", .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, SenderError>;
