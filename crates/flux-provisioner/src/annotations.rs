use flux_rules::Rule;
use std::collections::HashMap;

/// 摘要注解 key
pub const ANNOTATION_SUMMARY: &str = "zabbix_summary";

/// 目标主机注解 key
pub const ANNOTATION_HOST: &str = "zabbix_host";

/// 规则注解的类型化视图
///
/// 只按字面 key 匹配，不做别名回退，也不合并多个 key。
#[derive(Debug, Clone, Copy)]
pub struct ZabbixAnnotations<'a> {
    raw: &'a HashMap<String, String>,
}

impl<'a> ZabbixAnnotations<'a> {
    pub fn new(raw: &'a HashMap<String, String>) -> Self {
        Self { raw }
    }

    pub fn of(rule: &'a Rule) -> Self {
        Self::new(&rule.annotations)
    }

    /// 告警摘要
    pub fn summary(&self) -> Option<&'a str> {
        self.raw.get(ANNOTATION_SUMMARY).map(String::as_str)
    }

    /// 发现文档的目标主机
    pub fn host_target(&self) -> Option<&'a str> {
        self.raw.get(ANNOTATION_HOST).map(String::as_str)
    }
}
