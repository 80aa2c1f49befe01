use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

/// 规则名称宏
pub const MACRO_PROM_NAME: &str = "{#PROM_NAME}";

/// 规则摘要宏
pub const MACRO_PROM_SUMMARY: &str = "{#PROM_SUMMARY}";

/// 低级自动发现条目
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DiscoveryEntry {
    #[serde(rename = "{#PROM_NAME}")]
    pub name: String,

    #[serde(rename = "{#PROM_SUMMARY}")]
    pub summary: String,
}

impl DiscoveryEntry {
    pub fn new(name: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            summary: summary.into(),
        }
    }
}

/// 按目标主机分组的发现条目，组内保持追加顺序
pub type HostGroups = BTreeMap<String, Vec<DiscoveryEntry>>;

/// 发现文档：`{"data": [...]}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryDocument {
    pub data: Vec<DiscoveryEntry>,
}

#[derive(Serialize)]
struct DocumentRef<'a> {
    data: &'a [DiscoveryEntry],
}

/// 编码单个主机的发现文档
pub fn encode(entries: &[DiscoveryEntry]) -> serde_json::Result<String> {
    serde_json::to_string(&DocumentRef { data: entries })
}

/// 解码发现文档
pub fn decode(document: &[u8]) -> serde_json::Result<DiscoveryDocument> {
    serde_json::from_slice(document)
}

/// 编码所有主机的发现文档，编码失败的主机被跳过
pub fn encode_groups(groups: &HostGroups) -> BTreeMap<String, String> {
    let mut documents = BTreeMap::new();

    for (host, entries) in groups {
        match encode(entries) {
            Ok(document) => {
                documents.insert(host.clone(), document);
            }
            Err(e) => {
                warn!(host = %host, error = %e, "Failed to encode discovery document, skipping host");
            }
        }
    }

    documents
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_uses_macro_names() {
        let document = encode(&[DiscoveryEntry::new("highcpu", "CPU too high")]).unwrap();

        assert_eq!(
            document,
            r#"{"data":[{"{#PROM_NAME}":"highcpu","{#PROM_SUMMARY}":"CPU too high"}]}"#
        );
    }

    #[test]
    fn test_encode_empty_summary_and_empty_group() {
        assert_eq!(
            encode(&[DiscoveryEntry::new("diskfull", "")]).unwrap(),
            r#"{"data":[{"{#PROM_NAME}":"diskfull","{#PROM_SUMMARY}":""}]}"#
        );
        assert_eq!(encode(&[]).unwrap(), r#"{"data":[]}"#);
    }

    #[test]
    fn test_decode_matches_documented_shape() {
        let entries = vec![
            DiscoveryEntry::new("highcpu", "CPU \"too\" high"),
            DiscoveryEntry::new("diskfull", "Disk ≥ 95%"),
        ];
        let document = encode(&entries).unwrap();

        let value: serde_json::Value = serde_json::from_str(&document).unwrap();
        assert_eq!(value["data"][1][MACRO_PROM_NAME], "diskfull");
        assert_eq!(value["data"][1][MACRO_PROM_SUMMARY], "Disk ≥ 95%");

        let mut decoded = decode(document.as_bytes()).unwrap().data;
        let mut expected = entries;
        decoded.sort();
        expected.sort();
        assert_eq!(decoded, expected);
    }

    #[test]
    fn test_encode_groups_one_document_per_host() {
        let mut groups = HostGroups::new();
        groups.insert("web01".to_string(), vec![DiscoveryEntry::new("a", "")]);
        groups.insert(
            "db01".to_string(),
            vec![DiscoveryEntry::new("b", ""), DiscoveryEntry::new("c", "")],
        );

        let documents = encode_groups(&groups);
        assert_eq!(documents.len(), 2);
        assert_eq!(decode(documents["db01"].as_bytes()).unwrap().data.len(), 2);
    }
}
