use crate::error::{Result, SenderError};
use crate::model::{DataItem, SenderRequest, SenderResponse};
use crate::protocol::{read_frame, write_frame};
use async_trait::async_trait;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::debug;

pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_IO_TIMEOUT: Duration = Duration::from_secs(10);

/// trapper 发送接口
#[async_trait]
pub trait TrapperSender: Send + Sync {
    /// 一次连接内批量发送所有数据项
    async fn send(&self, addr: SocketAddr, items: &[DataItem]) -> Result<SenderResponse>;
}

/// Zabbix sender 协议客户端
#[derive(Debug, Clone)]
pub struct ZabbixSender {
    connect_timeout: Duration,
    io_timeout: Duration,
}

impl ZabbixSender {
    pub fn new(connect_timeout: Duration, io_timeout: Duration) -> Self {
        Self {
            connect_timeout,
            io_timeout,
        }
    }

    async fn exchange(stream: &mut TcpStream, payload: &[u8]) -> Result<Vec<u8>> {
        write_frame(stream, payload).await?;
        read_frame(stream).await
    }
}

impl Default for ZabbixSender {
    fn default() -> Self {
        Self::new(DEFAULT_CONNECT_TIMEOUT, DEFAULT_IO_TIMEOUT)
    }
}

#[async_trait]
impl TrapperSender for ZabbixSender {
    async fn send(&self, addr: SocketAddr, items: &[DataItem]) -> Result<SenderResponse> {
        let payload = serde_json::to_vec(&SenderRequest::new(items.to_vec()))?;

        let mut stream = timeout(self.connect_timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| SenderError::Timeout {
                addr,
                stage: "Connect",
                timeout_ms: self.connect_timeout.as_millis() as u64,
            })?
            .map_err(|source| SenderError::Connect { addr, source })?;

        debug!(%addr, items = items.len(), bytes = payload.len(), "Sending trapper batch");

        let reply = timeout(self.io_timeout, Self::exchange(&mut stream, &payload))
            .await
            .map_err(|_| SenderError::Timeout {
                addr,
                stage: "Exchange",
                timeout_ms: self.io_timeout.as_millis() as u64,
            })??;

        let response: SenderResponse = serde_json::from_slice(&reply)?;
        if !response.is_success() {
            return Err(SenderError::Rejected {
                response: response.response,
                info: response.info,
            });
        }

        debug!(%addr, info = %response.info, "Trapper batch accepted");
        Ok(response)
    }
}
