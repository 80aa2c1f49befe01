use crate::error::{Result, RuleSourceError};
use crate::model::{Rule, RulesResponse};
use async_trait::async_trait;
use reqwest::header::CONNECTION;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;
use url::Url;

/// 请求规则接口时使用的 User-Agent
pub const USER_AGENT: &str = "prom-rules-scraper";

/// 默认请求超时
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(2);

/// 规则来源接口
#[async_trait]
pub trait RuleSource: Send + Sync {
    /// 拉取当前全部规则（所有分组展开后的顺序序列）
    async fn fetch(&self) -> Result<Vec<Rule>>;

    /// 来源描述，用于日志
    fn describe(&self) -> String;
}

/// 解析规则接口响应文档
pub fn parse_rules(body: &[u8]) -> Result<Vec<Rule>> {
    let response: RulesResponse = serde_json::from_slice(body)?;

    if !response.is_success() {
        return Err(RuleSourceError::Api {
            status: response.status,
            error_type: response.error_type.unwrap_or_default(),
            error: response.error.unwrap_or_default(),
        });
    }

    Ok(response.into_rules())
}

/// 规则来源位置
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleLocation {
    /// http:// 或 https:// 规则接口
    Http(Url),
    /// 本地快照文件
    File(PathBuf),
}

impl RuleLocation {
    /// 解析位置字符串
    ///
    /// 示例:
    /// - https://prometheus:9090/api/v1/rules
    /// - file:///var/lib/provisioner/rules.json
    /// - ./snapshots/rules.json
    pub fn parse(location: &str) -> Result<Self> {
        let location = location.trim();
        if location.is_empty() {
            return Err(RuleSourceError::InvalidLocation {
                location: location.to_string(),
                reason: "empty location".to_string(),
            });
        }

        match Url::parse(location) {
            Ok(url) => match url.scheme().to_string().as_str() {
                "http" | "https" => Ok(Self::Http(url)),
                "file" => url
                    .to_file_path()
                    .map(Self::File)
                    .map_err(|_| RuleSourceError::InvalidLocation {
                        location: location.to_string(),
                        reason: "file URL is not a valid local path".to_string(),
                    }),
                // Windows 盘符，例如 C:\rules.json
                scheme if scheme.len() == 1 => Ok(Self::File(PathBuf::from(location))),
                scheme => Err(RuleSourceError::InvalidLocation {
                    location: location.to_string(),
                    reason: format!("unsupported scheme '{}'", scheme),
                }),
            },
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                Ok(Self::File(PathBuf::from(location)))
            }
            Err(e) => Err(RuleSourceError::InvalidLocation {
                location: location.to_string(),
                reason: e.to_string(),
            }),
        }
    }
}

/// 根据位置创建规则来源
pub fn from_location(location: &str, timeout: Duration) -> Result<Box<dyn RuleSource>> {
    match RuleLocation::parse(location)? {
        RuleLocation::Http(url) => Ok(Box::new(HttpRuleSource::new(url, timeout)?)),
        RuleLocation::File(path) => Ok(Box::new(FileRuleSource::new(path))),
    }
}

/// 通过 HTTP 拉取规则
pub struct HttpRuleSource {
    url: Url,
    timeout: Duration,
    client: reqwest::Client,
}

impl HttpRuleSource {
    pub fn new(url: Url, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .pool_max_idle_per_host(0)
            .build()?;

        Ok(Self {
            url,
            timeout,
            client,
        })
    }

    fn map_error(&self, err: reqwest::Error) -> RuleSourceError {
        if err.is_timeout() {
            RuleSourceError::Timeout {
                url: self.url.to_string(),
                timeout_secs: self.timeout.as_secs(),
            }
        } else {
            RuleSourceError::Http(err)
        }
    }
}

#[async_trait]
impl RuleSource for HttpRuleSource {
    async fn fetch(&self) -> Result<Vec<Rule>> {
        let response = self
            .client
            .get(self.url.clone())
            .header(CONNECTION, "close")
            .send()
            .await
            .map_err(|e| self.map_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RuleSourceError::Status {
                url: self.url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|e| self.map_error(e))?;
        debug!(url = %self.url, bytes = body.len(), "Fetched rules document");

        parse_rules(&body)
    }

    fn describe(&self) -> String {
        self.url.to_string()
    }
}

/// 从本地快照文件读取规则（离线 / 测试模式）
pub struct FileRuleSource {
    path: PathBuf,
}

impl FileRuleSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

#[async_trait]
impl RuleSource for FileRuleSource {
    async fn fetch(&self) -> Result<Vec<Rule>> {
        let body = tokio::fs::read(&self.path).await?;
        debug!(path = ?self.path, bytes = body.len(), "Read rules snapshot");

        parse_rules(&body)
    }

    fn describe(&self) -> String {
        format!("file {}", self.path.display())
    }
}
