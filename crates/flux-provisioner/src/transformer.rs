use crate::annotations::ZabbixAnnotations;
use crate::discovery::{DiscoveryEntry, HostGroups};
use flux_rules::Rule;
use tracing::debug;

/// 规则转换器：过滤告警规则并按目标主机分组
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleTransformer;

impl RuleTransformer {
    pub fn new() -> Self {
        Self
    }

    /// 由单条规则生成发现条目
    pub fn entry_for(rule: &Rule) -> DiscoveryEntry {
        let annotations = ZabbixAnnotations::of(rule);
        DiscoveryEntry::new(
            rule.name.to_lowercase(),
            annotations.summary().unwrap_or_default(),
        )
    }

    /// 转换规则列表
    ///
    /// 非告警规则被跳过；缺少 `zabbix_host` 的规则不进入任何分组；
    /// 同一规则出现多次时每次都会生成一个条目。
    pub fn transform(&self, rules: &[Rule]) -> HostGroups {
        let mut groups = HostGroups::new();

        for rule in rules {
            if !rule.is_alerting() {
                continue;
            }

            let entry = Self::entry_for(rule);

            match ZabbixAnnotations::of(rule).host_target() {
                Some(host) => groups.entry(host.to_string()).or_default().push(entry),
                None => {
                    debug!(rule = %rule.name, "Alerting rule has no zabbix_host annotation, dropped");
                }
            }
        }

        groups
    }
}
