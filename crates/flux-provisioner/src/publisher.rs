use crate::error::PublishError;
use flux_zabbix::{DataItem, SenderResponse, SenderSummary, TrapperSender};
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::lookup_host;
use tracing::{debug, info, warn};

/// 发布结果
#[derive(Debug, Clone, Default)]
pub struct PublishReport {
    /// 本周期发送的数据项数量（每个主机一项）
    pub items: usize,

    /// trapper 响应，批次为空时没有发送
    pub response: Option<SenderResponse>,
}

impl PublishReport {
    pub fn summary(&self) -> Option<SenderSummary> {
        self.response.as_ref().and_then(SenderResponse::summary)
    }
}

/// 发布器：将每个主机的发现文档批量发送到 trapper
pub struct Publisher {
    collector_addr: String,
    discovery_key: String,
    sender: Arc<dyn TrapperSender>,
}

impl Publisher {
    pub fn new(
        collector_addr: impl Into<String>,
        discovery_key: impl Into<String>,
        sender: Arc<dyn TrapperSender>,
    ) -> Self {
        Self {
            collector_addr: collector_addr.into(),
            discovery_key: discovery_key.into(),
            sender,
        }
    }

    pub fn collector_addr(&self) -> &str {
        &self.collector_addr
    }

    pub fn discovery_key(&self) -> &str {
        &self.discovery_key
    }

    /// 构建发送批次，时间戳留空由服务端填充
    pub fn build_batch(&self, documents: &BTreeMap<String, String>) -> Vec<DataItem> {
        documents
            .iter()
            .map(|(host, document)| DataItem::new(host, &self.discovery_key, document))
            .collect()
    }

    /// 解析 trapper 地址，每个周期重新解析
    ///
    /// 返回全部解析结果，IPv4 地址排在前面（trapper 默认只监听 IPv4）。
    pub async fn resolve(&self) -> Result<Vec<SocketAddr>, PublishError> {
        let addrs = lookup_host(self.collector_addr.as_str())
            .await
            .map_err(|e| PublishError::Resolve {
                addr: self.collector_addr.clone(),
                reason: e.to_string(),
            })?;

        let addrs = prefer_ipv4(addrs);
        if addrs.is_empty() {
            return Err(PublishError::Resolve {
                addr: self.collector_addr.clone(),
                reason: "no addresses returned".to_string(),
            });
        }

        Ok(addrs)
    }

    /// 依次尝试每个地址，只有连接失败时才换下一个地址
    async fn send_batch(
        &self,
        addrs: &[SocketAddr],
        batch: &[DataItem],
    ) -> Result<SenderResponse, PublishError> {
        let mut last_error = None;

        for addr in addrs {
            debug!(collector = %addr, items = batch.len(), key = %self.discovery_key, "Publishing discovery batch");

            match self.sender.send(*addr, batch).await {
                Ok(response) => return Ok(response),
                Err(source) if source.is_connect_failure() => {
                    warn!(collector = %addr, error = %source, "Collector address unreachable, trying next");
                    last_error = Some(PublishError::Send {
                        addr: addr.to_string(),
                        source,
                    });
                }
                Err(source) => {
                    return Err(PublishError::Send {
                        addr: addr.to_string(),
                        source,
                    })
                }
            }
        }

        Err(last_error.unwrap_or_else(|| PublishError::Resolve {
            addr: self.collector_addr.clone(),
            reason: "no addresses returned".to_string(),
        }))
    }

    /// 发布所有主机的发现文档
    pub async fn publish(
        &self,
        documents: &BTreeMap<String, String>,
    ) -> Result<PublishReport, PublishError> {
        let batch = self.build_batch(documents);
        if batch.is_empty() {
            info!("No discovery documents to publish, skipping send");
            return Ok(PublishReport::default());
        }

        let addrs = self.resolve().await?;
        let response = self.send_batch(&addrs, &batch).await?;

        Ok(PublishReport {
            items: batch.len(),
            response: Some(response),
        })
    }
}

/// IPv4 地址优先，同族内保持解析顺序
fn prefer_ipv4(addrs: impl IntoIterator<Item = SocketAddr>) -> Vec<SocketAddr> {
    let mut addrs: Vec<SocketAddr> = addrs.into_iter().collect();
    addrs.sort_by_key(|addr| !addr.is_ipv4());
    addrs
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use flux_zabbix::SenderError;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSender {
        batches: Mutex<Vec<(SocketAddr, Vec<DataItem>)>>,
    }

    #[async_trait]
    impl TrapperSender for RecordingSender {
        async fn send(
            &self,
            addr: SocketAddr,
            items: &[DataItem],
        ) -> flux_zabbix::Result<SenderResponse> {
            self.batches.lock().unwrap().push((addr, items.to_vec()));
            Ok(SenderResponse {
                response: "success".to_string(),
                info: format!(
                    "processed: {}; failed: 0; total: {}; seconds spent: 0.000010",
                    items.len(),
                    items.len()
                ),
            })
        }
    }

    struct FailingSender;

    #[async_trait]
    impl TrapperSender for FailingSender {
        async fn send(&self, _: SocketAddr, _: &[DataItem]) -> flux_zabbix::Result<SenderResponse> {
            Err(SenderError::Protocol("boom".to_string()))
        }
    }

    /// 拒绝 IPv6 连接的 trapper，模拟只监听 IPv4 的服务端
    #[derive(Default)]
    struct Ipv4OnlySender {
        attempts: Mutex<Vec<SocketAddr>>,
    }

    #[async_trait]
    impl TrapperSender for Ipv4OnlySender {
        async fn send(&self, addr: SocketAddr, items: &[DataItem]) -> flux_zabbix::Result<SenderResponse> {
            self.attempts.lock().unwrap().push(addr);
            if addr.is_ipv6() {
                return Err(SenderError::Connect {
                    addr,
                    source: std::io::Error::from(std::io::ErrorKind::ConnectionRefused),
                });
            }
            Ok(SenderResponse {
                response: "success".to_string(),
                info: format!(
                    "processed: {}; failed: 0; total: {}; seconds spent: 0.000010",
                    items.len(),
                    items.len()
                ),
            })
        }
    }

    /// 总是拒绝数据的 trapper
    #[derive(Default)]
    struct RejectingSender {
        attempts: Mutex<Vec<SocketAddr>>,
    }

    #[async_trait]
    impl TrapperSender for RejectingSender {
        async fn send(&self, addr: SocketAddr, _: &[DataItem]) -> flux_zabbix::Result<SenderResponse> {
            self.attempts.lock().unwrap().push(addr);
            Err(SenderError::Rejected {
                response: "failed".to_string(),
                info: "processed: 0; failed: 1; total: 1; seconds spent: 0.000010".to_string(),
            })
        }
    }

    fn addr(s: &str) -> SocketAddr {
        s.parse().unwrap()
    }

    fn documents() -> BTreeMap<String, String> {
        let mut documents = BTreeMap::new();
        documents.insert("web01".to_string(), r#"{"data":[]}"#.to_string());
        documents.insert("db01".to_string(), r#"{"data":[]}"#.to_string());
        documents
    }

    #[tokio::test]
    async fn test_publish_sends_single_batch() {
        let sender = Arc::new(RecordingSender::default());
        let publisher = Publisher::new("127.0.0.1:10051", "prom.rules", sender.clone());

        let report = publisher.publish(&documents()).await.unwrap();
        assert_eq!(report.items, 2);
        assert_eq!(report.summary().unwrap().processed, 2);

        let batches = sender.batches.lock().unwrap();
        assert_eq!(batches.len(), 1);

        let (addr, items) = &batches[0];
        assert_eq!(addr.port(), 10051);
        assert_eq!(items[0], DataItem::new("db01", "prom.rules", r#"{"data":[]}"#));
        assert_eq!(items[1].host, "web01");
        assert!(items.iter().all(|item| item.clock.is_none()));
    }

    #[tokio::test]
    async fn test_publish_empty_batch_skips_send() {
        let sender = Arc::new(RecordingSender::default());
        let publisher = Publisher::new("127.0.0.1:10051", "prom.rules", sender.clone());

        let report = publisher.publish(&BTreeMap::new()).await.unwrap();
        assert_eq!(report.items, 0);
        assert!(report.response.is_none());
        assert!(sender.batches.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_publish_resolve_failure() {
        let publisher = Publisher::new("not a socket address", "prom.rules", Arc::new(FailingSender));

        let err = publisher.publish(&documents()).await.unwrap_err();
        assert!(matches!(err, PublishError::Resolve { .. }));
    }

    #[tokio::test]
    async fn test_publish_send_failure() {
        let publisher = Publisher::new("127.0.0.1:10051", "prom.rules", Arc::new(FailingSender));

        let err = publisher.publish(&documents()).await.unwrap_err();
        assert!(matches!(err, PublishError::Send { .. }));
    }

    #[test]
    fn test_prefer_ipv4_keeps_family_order() {
        let ordered = prefer_ipv4(vec![
            addr("[::1]:10051"),
            addr("10.0.0.2:10051"),
            addr("[fe80::1]:10051"),
            addr("10.0.0.1:10051"),
        ]);

        assert_eq!(
            ordered,
            vec![
                addr("10.0.0.2:10051"),
                addr("10.0.0.1:10051"),
                addr("[::1]:10051"),
                addr("[fe80::1]:10051"),
            ]
        );
    }

    #[tokio::test]
    async fn test_send_batch_falls_back_to_next_address() {
        let sender = Arc::new(Ipv4OnlySender::default());
        let publisher = Publisher::new("localhost:10051", "prom.rules", sender.clone());
        let batch = publisher.build_batch(&documents());

        let addrs = [addr("[::1]:10051"), addr("127.0.0.1:10051")];
        let response = publisher.send_batch(&addrs, &batch).await.unwrap();

        assert!(response.is_success());
        assert_eq!(*sender.attempts.lock().unwrap(), addrs.to_vec());
    }

    #[tokio::test]
    async fn test_send_batch_reports_last_unreachable_address() {
        let sender = Arc::new(Ipv4OnlySender::default());
        let publisher = Publisher::new("localhost:10051", "prom.rules", sender.clone());
        let batch = publisher.build_batch(&documents());

        let addrs = [addr("[::1]:10051"), addr("[fe80::1]:10051")];
        let err = publisher.send_batch(&addrs, &batch).await.unwrap_err();

        assert!(matches!(err, PublishError::Send { ref addr, .. } if addr == "[fe80::1]:10051"));
        assert_eq!(sender.attempts.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_send_batch_does_not_retry_rejected_batch() {
        let sender = Arc::new(RejectingSender::default());
        let publisher = Publisher::new("localhost:10051", "prom.rules", sender.clone());
        let batch = publisher.build_batch(&documents());

        let addrs = [addr("127.0.0.1:10051"), addr("127.0.0.2:10051")];
        let err = publisher.send_batch(&addrs, &batch).await.unwrap_err();

        assert!(matches!(
            err,
            PublishError::Send { source: SenderError::Rejected { .. }, .. }
        ));
        assert_eq!(*sender.attempts.lock().unwrap(), vec![addrs[0]]);
    }

    #[tokio::test]
    async fn test_resolve_literal_address() {
        let publisher = Publisher::new("127.0.0.1:10051", "prom.rules", Arc::new(FailingSender));
        assert_eq!(publisher.resolve().await.unwrap(), vec![addr("127.0.0.1:10051")]);
    }
}
