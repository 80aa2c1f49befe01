use crate::config::ProvisionerConfig;
use crate::discovery;
use crate::error::Result;
use crate::publisher::Publisher;
use crate::shutdown::ShutdownListener;
use crate::transformer::RuleTransformer;
use flux_rules::RuleSource;
use flux_zabbix::{SenderSummary, ZabbixSender};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info, warn};

/// 单个周期的执行结果
#[derive(Debug, Clone, Default)]
pub struct CycleReport {
    pub cycle: u64,

    /// 拉取到的规则总数
    pub rules: usize,

    pub alerting_rules: usize,

    /// 产生发现文档的主机数
    pub hosts: usize,

    /// 实际发送的数据项数
    pub items: usize,

    pub summary: Option<SenderSummary>,
}

/// 轮询调度器
///
/// 周期串行执行：拉取 → 转换 → 编码 → 发布 → 休眠。
/// 单个周期的失败只记录日志，不影响下一个周期。
pub struct Scheduler {
    source: Arc<dyn RuleSource>,
    transformer: RuleTransformer,
    publisher: Publisher,
    interval: Duration,
}

impl Scheduler {
    pub fn new(source: Arc<dyn RuleSource>, publisher: Publisher, interval: Duration) -> Self {
        Self {
            source,
            transformer: RuleTransformer::new(),
            publisher,
            interval,
        }
    }

    /// 根据配置创建调度器及其 HTTP / trapper 客户端
    pub fn from_config(config: &ProvisionerConfig) -> anyhow::Result<Self> {
        let source: Arc<dyn RuleSource> = Arc::from(flux_rules::from_location(
            &config.rules_url,
            config.request_timeout(),
        )?);
        let sender = Arc::new(ZabbixSender::new(
            config.connect_timeout(),
            config.io_timeout(),
        ));
        let publisher = Publisher::new(
            &config.zabbix_addr,
            &config.zabbix_discovery_rule_key,
            sender,
        );

        Ok(Self::new(source, publisher, config.polling_interval()))
    }

    /// 执行一个完整周期
    pub async fn run_cycle(&self, cycle: u64) -> Result<CycleReport> {
        let rules = self.source.fetch().await?;
        let alerting_rules = rules.iter().filter(|rule| rule.is_alerting()).count();

        let groups = self.transformer.transform(&rules);
        let documents = discovery::encode_groups(&groups);
        let report = self.publisher.publish(&documents).await?;

        Ok(CycleReport {
            cycle,
            rules: rules.len(),
            alerting_rules,
            hosts: documents.len(),
            items: report.items,
            summary: report.summary(),
        })
    }

    /// 运行调度循环直到收到关闭信号，返回已开始的周期数
    pub async fn run(&self, mut shutdown: ShutdownListener) -> u64 {
        info!(
            source = %self.source.describe(),
            collector = %self.publisher.collector_addr(),
            key = %self.publisher.discovery_key(),
            interval_secs = self.interval.as_secs(),
            "Rules scheduler started"
        );

        let mut cycle: u64 = 0;

        while !shutdown.is_triggered() {
            cycle += 1;
            info!(cycle, "Starting rules sync cycle");

            tokio::select! {
                result = self.run_cycle(cycle) => log_outcome(cycle, result),
                signal = shutdown.wait() => {
                    warn!(cycle, ?signal, "Shutdown requested, abandoning in-flight cycle");
                    break;
                }
            }

            tokio::select! {
                _ = sleep(self.interval) => {}
                signal = shutdown.wait() => {
                    info!(?signal, "Shutdown requested while sleeping");
                    break;
                }
            }
        }

        info!(cycles = cycle, "Rules scheduler stopped");
        cycle
    }
}

fn log_outcome(cycle: u64, result: Result<CycleReport>) {
    match result {
        Ok(report) => {
            let result = report
                .summary
                .map(|summary| summary.to_string())
                .unwrap_or_else(|| "nothing sent".to_string());
            info!(
                cycle,
                rules = report.rules,
                alerting_rules = report.alerting_rules,
                hosts = report.hosts,
                items = report.items,
                result = %result,
                "Rules sync cycle completed"
            );
        }
        Err(e) => {
            error!(cycle, stage = e.stage(), error = %e, "Rules sync cycle failed");
        }
    }
}
