//! Client configuration: stored defaults, per-call overrides, and the
//! merge that resolves them into the immutable per-call view.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ClientError, ClientResult};

/// Wire transport used to reach the deployment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    #[default]
    Rest,
    Grpc,
}

impl std::fmt::Display for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Transport::Rest => "rest",
            Transport::Grpc => "grpc",
        })
    }
}

/// Ingress topology fronting the deployment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gateway {
    /// Direct ingress routing; no authentication.
    #[default]
    Ambassador,
    /// OAuth-secured broker in front of the deployment.
    Seldon,
}

impl std::fmt::Display for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Gateway::Ambassador => "ambassador",
            Gateway::Seldon => "seldon",
        })
    }
}

fn default_gateway_endpoint() -> String {
    "localhost:8003".to_string()
}

fn default_seldon_rest_endpoint() -> String {
    "localhost:8002".to_string()
}

fn default_seldon_grpc_endpoint() -> String {
    "localhost:8004".to_string()
}

fn default_microservice_endpoint() -> String {
    "localhost:5000".to_string()
}

fn default_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_grpc_max_message_size() -> usize {
    4 * 1024 * 1024
}

/// Client configuration. The values stored on the client are defaults;
/// each call resolves a fresh copy by overlaying [`CallOptions`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Deployment addressed through a gateway. Required for gateway
    /// calls, unused for microservice calls.
    pub deployment_name: Option<String>,
    pub namespace: Option<String>,
    #[serde(default)]
    pub transport: Transport,
    #[serde(default)]
    pub gateway: Gateway,
    /// host:port of the ambassador-style ingress (REST and gRPC).
    #[serde(default = "default_gateway_endpoint")]
    pub gateway_endpoint: String,
    /// Extra URL prefix inserted before the ambassador route.
    pub gateway_prefix: Option<String>,
    /// host:port of the OAuth broker's REST side; also serves the token
    /// endpoint.
    #[serde(default = "default_seldon_rest_endpoint")]
    pub seldon_rest_endpoint: String,
    #[serde(default = "default_seldon_grpc_endpoint")]
    pub seldon_grpc_endpoint: String,
    pub oauth_key: Option<String>,
    pub oauth_secret: Option<String>,
    /// host:port of a directly-addressed pipeline stage.
    #[serde(default = "default_microservice_endpoint")]
    pub microservice_endpoint: String,
    #[serde(default)]
    pub use_ssl: bool,
    #[serde(default = "default_timeout")]
    pub timeout: Duration,
    #[serde(default = "default_grpc_max_message_size")]
    pub grpc_max_message_size: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            deployment_name: None,
            namespace: None,
            transport: Transport::default(),
            gateway: Gateway::default(),
            gateway_endpoint: default_gateway_endpoint(),
            gateway_prefix: None,
            seldon_rest_endpoint: default_seldon_rest_endpoint(),
            seldon_grpc_endpoint: default_seldon_grpc_endpoint(),
            oauth_key: None,
            oauth_secret: None,
            microservice_endpoint: default_microservice_endpoint(),
            use_ssl: false,
            timeout: default_timeout(),
            grpc_max_message_size: default_grpc_max_message_size(),
        }
    }
}

impl ClientConfig {
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::new()
    }

    /// Overlay call-time overrides onto these defaults. The result is
    /// the immutable configuration for one call.
    pub fn resolve(&self, opts: &CallOptions) -> ClientConfig {
        let mut cfg = self.clone();
        if let Some(name) = &opts.deployment_name {
            cfg.deployment_name = Some(name.clone());
        }
        if let Some(namespace) = &opts.namespace {
            cfg.namespace = Some(namespace.clone());
        }
        if let Some(prefix) = &opts.gateway_prefix {
            cfg.gateway_prefix = Some(prefix.clone());
        }
        if let Some(key) = &opts.oauth_key {
            cfg.oauth_key = Some(key.clone());
        }
        if let Some(secret) = &opts.oauth_secret {
            cfg.oauth_secret = Some(secret.clone());
        }
        if let Some(transport) = opts.transport {
            cfg.transport = transport;
        }
        if let Some(gateway) = opts.gateway {
            cfg.gateway = gateway;
        }
        if let Some(endpoint) = &opts.gateway_endpoint {
            cfg.gateway_endpoint = endpoint.clone();
        }
        if let Some(endpoint) = &opts.seldon_rest_endpoint {
            cfg.seldon_rest_endpoint = endpoint.clone();
        }
        if let Some(endpoint) = &opts.seldon_grpc_endpoint {
            cfg.seldon_grpc_endpoint = endpoint.clone();
        }
        if let Some(endpoint) = &opts.microservice_endpoint {
            cfg.microservice_endpoint = endpoint.clone();
        }
        if let Some(use_ssl) = opts.use_ssl {
            cfg.use_ssl = use_ssl;
        }
        if let Some(timeout) = opts.timeout {
            cfg.timeout = timeout;
        }
        if let Some(size) = opts.grpc_max_message_size {
            cfg.grpc_max_message_size = size;
        }
        cfg
    }

    pub fn scheme(&self) -> &'static str {
        if self.use_ssl { "https" } else { "http" }
    }

    /// Gateway calls address a named deployment; a missing name is a
    /// call-site bug, not a runtime condition.
    pub fn require_deployment(&self) -> ClientResult<&str> {
        self.deployment_name.as_deref().ok_or_else(|| ClientError::Config {
            reason: "deployment_name is required for gateway calls".to_string(),
        })
    }
}

/// Per-call overrides; every field defaults to "keep the client value".
#[derive(Debug, Clone, Default)]
pub struct CallOptions {
    pub deployment_name: Option<String>,
    pub namespace: Option<String>,
    pub transport: Option<Transport>,
    pub gateway: Option<Gateway>,
    pub gateway_endpoint: Option<String>,
    pub gateway_prefix: Option<String>,
    pub seldon_rest_endpoint: Option<String>,
    pub seldon_grpc_endpoint: Option<String>,
    pub oauth_key: Option<String>,
    pub oauth_secret: Option<String>,
    pub microservice_endpoint: Option<String>,
    pub use_ssl: Option<bool>,
    pub timeout: Option<Duration>,
    pub grpc_max_message_size: Option<usize>,
}

impl CallOptions {
    pub fn transport(mut self, transport: Transport) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn gateway(mut self, gateway: Gateway) -> Self {
        self.gateway = Some(gateway);
        self
    }

    pub fn gateway_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.gateway_prefix = Some(prefix.into());
        self
    }
}

/// Builder wrapping the config itself, so defaults stay in one place.
#[derive(Debug, Clone, Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn deployment_name(mut self, name: impl Into<String>) -> Self {
        self.config.deployment_name = Some(name.into());
        self
    }

    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.config.namespace = Some(namespace.into());
        self
    }

    pub fn transport(mut self, transport: Transport) -> Self {
        self.config.transport = transport;
        self
    }

    pub fn gateway(mut self, gateway: Gateway) -> Self {
        self.config.gateway = gateway;
        self
    }

    pub fn gateway_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.gateway_endpoint = endpoint.into();
        self
    }

    pub fn gateway_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.gateway_prefix = Some(prefix.into());
        self
    }

    pub fn seldon_rest_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.seldon_rest_endpoint = endpoint.into();
        self
    }

    pub fn seldon_grpc_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.seldon_grpc_endpoint = endpoint.into();
        self
    }

    pub fn oauth_credentials(
        mut self,
        key: impl Into<String>,
        secret: impl Into<String>,
    ) -> Self {
        self.config.oauth_key = Some(key.into());
        self.config.oauth_secret = Some(secret.into());
        self
    }

    pub fn microservice_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.microservice_endpoint = endpoint.into();
        self
    }

    pub fn use_ssl(mut self, use_ssl: bool) -> Self {
        self.config.use_ssl = use_ssl;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    pub fn grpc_max_message_size(mut self, size: usize) -> Self {
        self.config.grpc_max_message_size = size;
        self
    }

    pub fn build(self) -> ClientConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_keeps_defaults_for_empty_options() {
        let cfg = ClientConfig::builder().deployment_name("mymodel").build();
        let resolved = cfg.resolve(&CallOptions::default());
        assert_eq!(resolved.deployment_name.as_deref(), Some("mymodel"));
        assert_eq!(resolved.transport, Transport::Rest);
        assert_eq!(resolved.gateway, Gateway::Ambassador);
        assert_eq!(resolved.gateway_endpoint, "localhost:8003");
    }

    #[test]
    fn test_resolve_applies_overrides() {
        let cfg = ClientConfig::builder().deployment_name("mymodel").build();
        let opts = CallOptions::default()
            .transport(Transport::Grpc)
            .gateway(Gateway::Seldon)
            .gateway_prefix("/mycompany/ml");
        let resolved = cfg.resolve(&opts);
        assert_eq!(resolved.transport, Transport::Grpc);
        assert_eq!(resolved.gateway, Gateway::Seldon);
        assert_eq!(resolved.gateway_prefix.as_deref(), Some("/mycompany/ml"));
        // Untouched fields keep their defaults.
        assert_eq!(resolved.microservice_endpoint, "localhost:5000");
    }

    #[test]
    fn test_require_deployment() {
        let cfg = ClientConfig::default();
        assert!(cfg.require_deployment().is_err());
        let cfg = ClientConfig::builder().deployment_name("m").build();
        assert_eq!(cfg.require_deployment().unwrap(), "m");
    }

    #[test]
    fn test_scheme_follows_ssl_flag() {
        let mut cfg = ClientConfig::default();
        assert_eq!(cfg.scheme(), "http");
        cfg.use_ssl = true;
        assert_eq!(cfg.scheme(), "https");
    }
}
