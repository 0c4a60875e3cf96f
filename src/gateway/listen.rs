//! Usage: Resolve the socket address the callback server binds to.

use crate::infra::settings::AuthSettings;
use crate::shared::error::AppResult;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ListenTarget {
    pub(crate) host: String,
    pub(crate) port: u16,
}

impl ListenTarget {
    pub(crate) fn to_host_port(&self) -> String {
        format_host_port(&self.host, self.port)
    }
}

pub(crate) fn format_host_port(host: &str, port: u16) -> String {
    if host.contains(':') {
        format!("[{host}]:{port}")
    } else {
        format!("{host}:{port}")
    }
}

/// An explicit `listen_address` wins; otherwise bind where the provider will
/// redirect the browser to.
pub(crate) fn resolve_listen_target(settings: &AuthSettings) -> AppResult<ListenTarget> {
    let redirect = settings.redirect_url()?;
    let redirect_port = redirect.port_or_known_default().unwrap_or(80);
    let redirect_host = match redirect.host_str() {
        Some(host) => host.trim_start_matches('[').trim_end_matches(']').to_string(),
        None => "127.0.0.1".to_string(),
    };

    let raw = settings.listen_address.trim();
    if raw.is_empty() {
        return Ok(ListenTarget {
            host: redirect_host,
            port: redirect_port,
        });
    }

    let (host, port) =
        parse_listen_address(raw).map_err(|e| format!("CONFIG_INVALID: {e}"))?;
    Ok(ListenTarget {
        host,
        port: port.unwrap_or(redirect_port),
    })
}

fn parse_port(raw: &str) -> Result<u16, String> {
    raw.trim()
        .parse::<u16>()
        .map_err(|_| format!("invalid listen port: {raw}"))
}

/// Accepts `host`, `host:port`, `[v6]` or `[v6]:port`.
pub(crate) fn parse_listen_address(input: &str) -> Result<(String, Option<u16>), String> {
    let raw = input.trim();
    if raw.contains("://") || raw.contains('/') {
        return Err("listen address must be host or host:port".to_string());
    }

    if let Some(rest) = raw.strip_prefix('[') {
        let idx = rest
            .find(']')
            .ok_or_else(|| "invalid IPv6 address: missing closing ']'".to_string())?;
        let host = rest[..idx].trim();
        if host.is_empty() {
            return Err("listen address missing host".to_string());
        }
        let tail = rest[idx + 1..].trim();
        if tail.is_empty() {
            return Ok((host.to_string(), None));
        }
        let port_raw = tail
            .strip_prefix(':')
            .ok_or_else(|| "listen address must be [ipv6]:port".to_string())?;
        return Ok((host.to_string(), Some(parse_port(port_raw)?)));
    }

    match raw.split(':').collect::<Vec<_>>().as_slice() {
        [host] => Ok((host.trim().to_string(), None)),
        [host, port] => {
            let host = host.trim();
            if host.is_empty() {
                return Err("listen address missing host".to_string());
            }
            Ok((host.to_string(), Some(parse_port(port)?)))
        }
        _ => Err("IPv6 must use [addr]:port".to_string()),
    }
}
