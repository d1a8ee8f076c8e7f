//! Transport adapters
//!
//! An adapter tells the listener how the remote service reaches this process:
//! which public host name and port go into callback URLs, which local port
//! the HTTP server binds, and whether a path prefix is part of the routes.

use std::path::Path;

use async_trait::async_trait;

use crate::error::AdapterError;

/// Default public HTTPS port
pub const DEFAULT_EXTERNAL_PORT: u16 = 443;

/// Default local port behind a reverse proxy
pub const DEFAULT_PROXY_LISTENER_PORT: u16 = 8080;

/// PEM encoded certificate chain and private key
#[derive(Clone)]
pub struct TlsMaterial {
    pub cert_pem: Vec<u8>,
    pub key_pem: Vec<u8>,
}

impl TlsMaterial {
    pub fn new(cert_pem: impl Into<Vec<u8>>, key_pem: impl Into<Vec<u8>>) -> Self {
        Self {
            cert_pem: cert_pem.into(),
            key_pem: key_pem.into(),
        }
    }

    pub fn from_pem_files(cert: impl AsRef<Path>, key: impl AsRef<Path>) -> Result<Self, AdapterError> {
        let read = |path: &Path| {
            std::fs::read(path).map_err(|e| AdapterError::Tls(format!("{}: {e}", path.display())))
        };
        Ok(Self {
            cert_pem: read(cert.as_ref())?,
            key_pem: read(key.as_ref())?,
        })
    }
}

impl std::fmt::Debug for TlsMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsMaterial")
            .field("cert_pem", &format_args!("{} bytes", self.cert_pem.len()))
            .field("key_pem", &"<redacted>")
            .finish()
    }
}

/// How the remote service reaches the listener.
///
/// Adapters are created by the caller and shared with the listener and the
/// HTTP front-end as `Arc<dyn ConnectionAdapter>`.
#[async_trait]
pub trait ConnectionAdapter: Send + Sync {
    /// Public host name used in callback URLs. May need a network lookup.
    async fn host_name(&self) -> Result<String, AdapterError>;

    /// Path prefix in front of the listener's routes, without slashes.
    fn path_prefix(&self) -> Option<&str> {
        None
    }

    /// Local port the HTTP server binds.
    fn listener_port(&self) -> u16;

    /// Public port used in callback URLs.
    async fn external_port(&self) -> u16 {
        self.listener_port()
    }

    /// Whether the HTTP routes themselves include the path prefix.
    fn use_path_prefix_in_handlers(&self) -> bool {
        false
    }

    /// Certificate material when the listener terminates TLS itself.
    fn tls(&self) -> Option<&TlsMaterial> {
        None
    }
}

fn normalize_prefix(prefix: &str) -> Option<String> {
    let trimmed = prefix.trim_matches('/');
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn require_host(host_name: &str) -> Result<String, AdapterError> {
    if host_name.trim().is_empty() {
        return Err(AdapterError::HostResolution("host name is empty".to_string()));
    }
    Ok(host_name.to_string())
}

/// Listener behind a reverse proxy that terminates TLS.
#[derive(Debug, Clone)]
pub struct ReverseProxyAdapter {
    host_name: String,
    external_port: u16,
    listener_port: u16,
    path_prefix: Option<String>,
    use_path_prefix_in_handlers: bool,
}

impl ReverseProxyAdapter {
    pub fn new(host_name: impl Into<String>) -> Self {
        Self {
            host_name: host_name.into(),
            external_port: DEFAULT_EXTERNAL_PORT,
            listener_port: DEFAULT_PROXY_LISTENER_PORT,
            path_prefix: None,
            use_path_prefix_in_handlers: false,
        }
    }

    pub fn with_external_port(mut self, port: u16) -> Self {
        self.external_port = port;
        self
    }

    pub fn with_listener_port(mut self, port: u16) -> Self {
        self.listener_port = port;
        self
    }

    /// Leading and trailing slashes are ignored.
    pub fn with_path_prefix(mut self, prefix: &str) -> Self {
        self.path_prefix = normalize_prefix(prefix);
        self
    }

    pub fn with_prefix_in_handlers(mut self, enabled: bool) -> Self {
        self.use_path_prefix_in_handlers = enabled;
        self
    }
}

#[async_trait]
impl ConnectionAdapter for ReverseProxyAdapter {
    async fn host_name(&self) -> Result<String, AdapterError> {
        require_host(&self.host_name)
    }

    fn path_prefix(&self) -> Option<&str> {
        self.path_prefix.as_deref()
    }

    fn listener_port(&self) -> u16 {
        self.listener_port
    }

    async fn external_port(&self) -> u16 {
        self.external_port
    }

    fn use_path_prefix_in_handlers(&self) -> bool {
        self.use_path_prefix_in_handlers
    }
}

/// Listener reachable directly, optionally terminating TLS itself.
#[derive(Debug, Clone)]
pub struct DirectConnectionAdapter {
    host_name: String,
    listener_port: u16,
    tls: Option<TlsMaterial>,
}

impl DirectConnectionAdapter {
    pub fn new(host_name: impl Into<String>) -> Self {
        Self {
            host_name: host_name.into(),
            listener_port: DEFAULT_EXTERNAL_PORT,
            tls: None,
        }
    }

    pub fn with_listener_port(mut self, port: u16) -> Self {
        self.listener_port = port;
        self
    }

    pub fn with_tls(mut self, tls: TlsMaterial) -> Self {
        self.tls = Some(tls);
        self
    }
}

#[async_trait]
impl ConnectionAdapter for DirectConnectionAdapter {
    async fn host_name(&self) -> Result<String, AdapterError> {
        require_host(&self.host_name)
    }

    fn listener_port(&self) -> u16 {
        self.listener_port
    }

    fn tls(&self) -> Option<&TlsMaterial> {
        self.tls.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[tokio::test]
    async fn test_reverse_proxy_defaults() {
        let adapter = ReverseProxyAdapter::new("events.example.com");
        assert_eq!(adapter.host_name().await.unwrap(), "events.example.com");
        assert_eq!(adapter.external_port().await, 443);
        assert_eq!(adapter.listener_port(), 8080);
        assert!(adapter.path_prefix().is_none());
        assert!(!adapter.use_path_prefix_in_handlers());
        assert!(adapter.tls().is_none());
    }

    #[rstest]
    #[case("/hooks", Some("hooks"))]
    #[case("hooks/", Some("hooks"))]
    #[case("/a/b/", Some("a/b"))]
    #[case("/", None)]
    #[case("", None)]
    fn test_prefix_normalization(#[case] raw: &str, #[case] expected: Option<&str>) {
        let adapter = ReverseProxyAdapter::new("h").with_path_prefix(raw);
        assert_eq!(adapter.path_prefix(), expected);
    }

    #[tokio::test]
    async fn test_direct_adapter_uses_listener_port_externally() {
        let adapter = DirectConnectionAdapter::new("events.example.com")
            .with_listener_port(8443)
            .with_tls(TlsMaterial::new("cert", "key"));
        assert_eq!(adapter.external_port().await, 8443);
        assert!(adapter.path_prefix().is_none());
        assert_eq!(adapter.tls().unwrap().cert_pem, b"cert".to_vec());
    }

    #[tokio::test]
    async fn test_empty_host_name_fails() {
        let adapter = DirectConnectionAdapter::new("  ");
        assert!(matches!(
            adapter.host_name().await,
            Err(AdapterError::HostResolution(_))
        ));
    }

    #[test]
    fn test_missing_tls_files() {
        let err = TlsMaterial::from_pem_files("/nonexistent/cert.pem", "/nonexistent/key.pem")
            .unwrap_err();
        assert!(matches!(err, AdapterError::Tls(_)));
    }

    #[test]
    fn test_tls_debug_redacts_key() {
        let rendered = format!("{:?}", TlsMaterial::new("cert", "very-private"));
        assert!(!rendered.contains("very-private"));
    }
}
