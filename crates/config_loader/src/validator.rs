//! 配置校验模块
//!
//! 校验规则：
//! - queue.capacity > 0
//! - server.listen_addr 形如 host:port (主机名在绑定时解析)
//! - server.max_body_bytes > 0
//! - rate_limit 速率、桶容量与过期时间 > 0
//! - cors 来源非空

use std::net::SocketAddr;

use contracts::{ContractError, RelayConfig};

/// 校验 RelayConfig 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(config: &RelayConfig) -> Result<(), ContractError> {
    validate_server(config)?;
    validate_queue(config)?;
    validate_rate_limit(config)?;
    Ok(())
}

/// 校验监听地址与跨域来源
fn validate_server(config: &RelayConfig) -> Result<(), ContractError> {
    let server = &config.server;

    if !is_host_port(&server.listen_addr) {
        return Err(ContractError::config_validation(
            "server.listen_addr",
            format!(
                "'{}' is not a valid listen address (expected host:port)",
                server.listen_addr
            ),
        ));
    }

    if server.max_body_bytes == 0 {
        return Err(ContractError::config_validation(
            "server.max_body_bytes",
            "max_body_bytes must be > 0",
        ));
    }

    for (idx, origin) in server.cors.allow_origins.iter().enumerate() {
        if origin.trim().is_empty() {
            return Err(ContractError::config_validation(
                format!("server.cors.allow_origins[{idx}]"),
                "origin cannot be empty",
            ));
        }
    }

    Ok(())
}

/// 字面地址直接解析；否则要求非空主机名加 u16 端口，不做 DNS 查询
fn is_host_port(addr: &str) -> bool {
    if addr.parse::<SocketAddr>().is_ok() {
        return true;
    }
    match addr.rsplit_once(':') {
        Some((host, port)) => {
            !host.is_empty()
                && !host.contains(|c: char| c.is_whitespace() || c == ':')
                && port.parse::<u16>().is_ok()
        }
        None => false,
    }
}

/// 校验队列容量
fn validate_queue(config: &RelayConfig) -> Result<(), ContractError> {
    if config.queue.capacity == 0 {
        return Err(ContractError::config_validation(
            "queue.capacity",
            "capacity must be > 0",
        ));
    }
    Ok(())
}

/// 校验限流参数
fn validate_rate_limit(config: &RelayConfig) -> Result<(), ContractError> {
    let limit = &config.rate_limit;

    if limit.max_requests_per_second == 0 {
        return Err(ContractError::config_validation(
            "rate_limit.max_requests_per_second",
            "max_requests_per_second must be > 0",
        ));
    }

    if limit.effective_burst() == 0 {
        return Err(ContractError::config_validation(
            "rate_limit.burst",
            "burst must be > 0",
        ));
    }

    if limit.expires_in_secs == 0 {
        return Err(ContractError::config_validation(
            "rate_limit.expires_in_secs",
            "expires_in_secs must be > 0",
        ));
    }

    Ok(())
}
