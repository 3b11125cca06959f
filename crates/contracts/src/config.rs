//! RelayConfig - Config Loader 输出
//!
//! 描述中继服务的完整配置：监听地址、跨域、队列容量、限流、指标导出。

use serde::{Deserialize, Serialize};

/// 配置版本
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// 完整的中继配置
///
/// 所有字段都有默认值，空配置文件即为合法配置。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelayConfig {
    /// 配置版本
    #[serde(default)]
    pub version: ConfigVersion,

    /// HTTP 服务设置
    #[serde(default)]
    pub server: ServerConfig,

    /// 每个 source 的队列设置
    #[serde(default)]
    pub queue: QueueConfig,

    /// 请求限流
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// 可观测性
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// HTTP 服务设置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// 监听地址 (e.g., "0.0.0.0:2110")
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// 跨域策略
    #[serde(default)]
    pub cors: CorsConfig,

    /// 单个请求体上限 (字节)，超出返回 413
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            cors: CorsConfig::default(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

fn default_listen_addr() -> String {
    "0.0.0.0:2110".to_string()
}

/// Default request body limit, 2 MiB
pub const DEFAULT_MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

fn default_max_body_bytes() -> usize {
    DEFAULT_MAX_BODY_BYTES
}

/// 跨域策略
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// 允许的来源，`"*"` 表示任意来源
    #[serde(default = "default_allow_origins")]
    pub allow_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allow_origins: default_allow_origins(),
        }
    }
}

fn default_allow_origins() -> Vec<String> {
    vec!["*".to_string()]
}

/// 队列设置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    /// 每个 source 最多保留的消息数 (C)，必须 > 0
    #[serde(default = "default_capacity")]
    pub capacity: usize,

    /// 拉取接口的响应格式
    #[serde(default)]
    pub drain_format: DrainFormat,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            drain_format: DrainFormat::default(),
        }
    }
}

/// Default per-source capacity
pub const DEFAULT_QUEUE_CAPACITY: usize = 4096;

fn default_capacity() -> usize {
    DEFAULT_QUEUE_CAPACITY
}

/// 拉取响应格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrainFormat {
    /// JSON 字符串数组: `["m1","m2"]`
    #[default]
    Strings,
    /// 消息本身即 JSON 文档，原样拼接: `[m1,m2]`
    Raw,
}

/// 限流设置 (按客户端 IP 的令牌桶)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// 每秒补充的令牌数，必须 > 0
    #[serde(default = "default_max_rps")]
    pub max_requests_per_second: u32,

    /// 桶容量；缺省等于 `max_requests_per_second`
    #[serde(default)]
    pub burst: Option<u32>,

    /// 空闲多久后回收客户端的桶 (秒)
    #[serde(default = "default_expires_in_secs")]
    pub expires_in_secs: u64,
}

impl RateLimitConfig {
    /// Effective bucket size
    pub fn effective_burst(&self) -> u32 {
        self.burst.unwrap_or(self.max_requests_per_second)
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests_per_second: default_max_rps(),
            burst: None,
            expires_in_secs: default_expires_in_secs(),
        }
    }
}

fn default_max_rps() -> u32 {
    10
}

fn default_expires_in_secs() -> u64 {
    180
}

/// 可观测性设置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Prometheus 端口 (None = 禁用)
    #[serde(default)]
    pub metrics_port: Option<u16>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config: RelayConfig = toml::from_str("").unwrap();
        assert_eq!(config.server.listen_addr, "0.0.0.0:2110");
        assert_eq!(config.server.cors.allow_origins, vec!["*"]);
        assert_eq!(config.server.max_body_bytes, DEFAULT_MAX_BODY_BYTES);
        assert_eq!(config.queue.capacity, DEFAULT_QUEUE_CAPACITY);
        assert_eq!(config.queue.drain_format, DrainFormat::Strings);
        assert_eq!(config.rate_limit.max_requests_per_second, 10);
        assert_eq!(config.rate_limit.effective_burst(), 10);
        assert!(config.observability.metrics_port.is_none());
    }

    #[test]
    fn test_partial_sections() {
        let config: RelayConfig = toml::from_str(
            r#"
[queue]
capacity = 2
drain_format = "raw"

[rate_limit]
max_requests_per_second = 50
burst = 100
"#,
        )
        .unwrap();
        assert_eq!(config.queue.capacity, 2);
        assert_eq!(config.queue.drain_format, DrainFormat::Raw);
        assert_eq!(config.rate_limit.effective_burst(), 100);
        assert_eq!(config.rate_limit.expires_in_secs, 180);
    }
}
