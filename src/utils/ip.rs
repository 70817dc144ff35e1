//! 客户端 IP 提取
//!
//! 注册请求的 client_ip 会写入 transaction，用于 broker 风控。

use std::net::IpAddr;

use actix_web::HttpRequest;

/// 检查 IP 是否为私有地址或 localhost
pub fn is_private_or_local(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => v4.is_private() || v4.is_loopback(),
        IpAddr::V6(v6) => {
            // fc00::/7 (ULA), fe80::/10 (link-local), ::1 (loopback)
            v6.is_loopback()
                || (v6.segments()[0] & 0xfe00) == 0xfc00
                || (v6.segments()[0] & 0xffc0) == 0xfe80
        }
    }
}

/// 从请求头取第一个转发 IP（X-Forwarded-For 或 X-Real-IP）
fn forwarded_ip(req: &HttpRequest) -> Option<String> {
    if let Some(forwarded) = req
        .headers()
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
    {
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return Some(first.to_string());
            }
        }
    }

    req.headers()
        .get("x-real-ip")
        .and_then(|h| h.to_str().ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// 提取真实客户端 IP
///
/// 连接来自私有地址时视为反向代理，取转发头；
/// 公网直连时使用连接 IP，防止伪造。
pub fn extract_client_ip(req: &HttpRequest) -> Option<String> {
    let peer_ip = req.connection_info().peer_addr()?.to_string();

    let behind_proxy = peer_ip
        .parse::<IpAddr>()
        .map(|ip| is_private_or_local(&ip))
        .unwrap_or(false);

    if behind_proxy {
        if let Some(real_ip) = forwarded_ip(req) {
            return Some(real_ip);
        }
    }

    Some(peer_ip)
}
