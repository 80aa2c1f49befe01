use anyhow::{anyhow, bail, Context, Result};
use config::{Config, Environment, File, FileFormat};
use flux_rules::RuleLocation;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// 环境变量前缀，例如 `PROVISIONER__ZABBIX_ADDR`
pub const ENV_PREFIX: &str = "PROVISIONER";

/// 同步服务配置
///
/// 兼容旧版配置文件中的驼峰 key（`rulesUrl`、`rulesPollingTime` 等）。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvisionerConfig {
    /// 规则接口地址或本地快照路径
    #[serde(default = "default_rules_url", alias = "rulesUrl", alias = "rulesurl")]
    pub rules_url: String,

    /// 轮询间隔（秒）
    #[serde(
        default = "default_rules_polling_interval_secs",
        alias = "rulesPollingTime",
        alias = "rulespollingtime"
    )]
    pub rules_polling_interval_secs: u64,

    /// 规则接口请求超时（秒）
    #[serde(default = "default_rules_request_timeout_secs")]
    pub rules_request_timeout_secs: u64,

    /// trapper 地址 host:port
    #[serde(default = "default_zabbix_addr", alias = "zabbixAddr", alias = "zabbixaddr")]
    pub zabbix_addr: String,

    /// 发现规则 key
    #[serde(
        default = "default_zabbix_discovery_rule_key",
        alias = "zabbixDiscoveryRuleKey",
        alias = "zabbixdiscoveryrulekey"
    )]
    pub zabbix_discovery_rule_key: String,

    #[serde(default = "default_zabbix_connect_timeout_secs")]
    pub zabbix_connect_timeout_secs: u64,

    #[serde(default = "default_zabbix_io_timeout_secs")]
    pub zabbix_io_timeout_secs: u64,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// tracing 过滤指令，设置了 RUST_LOG 时以 RUST_LOG 为准
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 输出 JSON 格式日志
    #[serde(default)]
    pub json: bool,
}

// 默认值函数
fn default_rules_url() -> String {
    "https://127.0.0.1:9090/api/v1/rules".to_string()
}

fn default_rules_polling_interval_secs() -> u64 {
    3600
}

fn default_rules_request_timeout_secs() -> u64 {
    2
}

fn default_zabbix_addr() -> String {
    "127.0.0.1:10051".to_string()
}

fn default_zabbix_discovery_rule_key() -> String {
    "test".to_string()
}

fn default_zabbix_connect_timeout_secs() -> u64 {
    5
}

fn default_zabbix_io_timeout_secs() -> u64 {
    10
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl Default for ProvisionerConfig {
    fn default() -> Self {
        Self {
            rules_url: default_rules_url(),
            rules_polling_interval_secs: default_rules_polling_interval_secs(),
            rules_request_timeout_secs: default_rules_request_timeout_secs(),
            zabbix_addr: default_zabbix_addr(),
            zabbix_discovery_rule_key: default_zabbix_discovery_rule_key(),
            zabbix_connect_timeout_secs: default_zabbix_connect_timeout_secs(),
            zabbix_io_timeout_secs: default_zabbix_io_timeout_secs(),
            logging: LoggingConfig::default(),
        }
    }
}

impl ProvisionerConfig {
    /// 从文件加载配置（TOML / YAML / JSON 按扩展名识别），环境变量覆盖文件中的值
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let format = match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml") | Some("yml") => FileFormat::Yaml,
            Some("json") => FileFormat::Json,
            _ => FileFormat::Toml,
        };

        let settings = Config::builder()
            .add_source(File::new(
                path.to_str().ok_or_else(|| anyhow!("Invalid config path"))?,
                format,
            ))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("can't read the config file {:?}", path))?;

        let config: Self = settings
            .try_deserialize()
            .with_context(|| format!("invalid configuration in {:?}", path))?;
        config.validate()?;

        Ok(config)
    }

    /// 验证配置
    pub fn validate(&self) -> Result<()> {
        if self.rules_polling_interval_secs == 0 {
            bail!("rules_polling_interval_secs must be greater than 0");
        }

        if self.rules_request_timeout_secs == 0 {
            bail!("rules_request_timeout_secs must be greater than 0");
        }

        if self.zabbix_addr.trim().is_empty() {
            bail!("zabbix_addr must not be empty");
        }

        if self.zabbix_discovery_rule_key.trim().is_empty() {
            bail!("zabbix_discovery_rule_key must not be empty");
        }

        RuleLocation::parse(&self.rules_url)
            .with_context(|| format!("invalid rules_url '{}'", self.rules_url))?;

        EnvFilter::try_new(&self.logging.level)
            .with_context(|| format!("invalid logging.level '{}'", self.logging.level))?;

        Ok(())
    }

    pub fn polling_interval(&self) -> Duration {
        Duration::from_secs(self.rules_polling_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.rules_request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.zabbix_connect_timeout_secs)
    }

    pub fn io_timeout(&self) -> Duration {
        Duration::from_secs(self.zabbix_io_timeout_secs)
    }
}
