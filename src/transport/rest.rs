//! REST request assembly and execution.
//!
//! Builders are pure: they produce a [`RestRequest`] (URL, optional
//! bearer token, body) without touching the network. The executor
//! performs exactly one POST; a non-2xx status is a recoverable
//! failure rendered as `{status}:{reason}`, not a raised error.

use std::time::Duration;

use serde_json::Value;
use tracing::{debug, warn};

use super::TransportError;
use crate::config::ClientConfig;
use crate::routing::Operation;

#[derive(Debug, Clone)]
pub struct RestRequest {
    pub url: String,
    pub bearer_token: Option<String>,
    pub body: RestBody,
    pub timeout: Duration,
}

/// Gateway endpoints take a JSON body; microservice endpoints take the
/// message JSON form-encoded under a `json` field. Both shapes are part
/// of the serving protocol and must not be unified.
#[derive(Debug, Clone)]
pub enum RestBody {
    Json(Value),
    Form(Vec<(&'static str, String)>),
}

/// Ambassador-style ingress URL. The namespace segment is omitted when
/// the client has no namespace configured.
pub fn gateway_url(cfg: &ClientConfig, deployment: &str, operation: Operation) -> String {
    let prefix = cfg.gateway_prefix.as_deref().unwrap_or("");
    match &cfg.namespace {
        Some(namespace) => format!(
            "{}://{}{}/seldon/{}/{}/api/v1.0/{}",
            cfg.scheme(),
            cfg.gateway_endpoint,
            prefix,
            namespace,
            deployment,
            operation,
        ),
        None => format!(
            "{}://{}{}/seldon/{}/api/v1.0/{}",
            cfg.scheme(),
            cfg.gateway_endpoint,
            prefix,
            deployment,
            operation,
        ),
    }
}

/// OAuth-brokered gateway URL; the broker resolves the deployment from
/// the token, so neither deployment nor namespace appears in the path.
pub fn oauth_gateway_url(cfg: &ClientConfig, operation: Operation) -> String {
    format!(
        "{}://{}/api/v1.0/{}",
        cfg.scheme(),
        cfg.seldon_rest_endpoint,
        operation,
    )
}

/// Directly-addressed pipeline stage URL.
pub fn microservice_url(cfg: &ClientConfig, operation: Operation) -> String {
    format!(
        "{}://{}/{}",
        cfg.scheme(),
        cfg.microservice_endpoint,
        operation,
    )
}

/// Microservice body: the message JSON form serialized into the `json`
/// form field.
pub fn microservice_form(message_json: &Value) -> RestBody {
    RestBody::Form(vec![("json", message_json.to_string())])
}

/// Thin executor over a shared `reqwest::Client`. One POST per call,
/// no retries.
#[derive(Clone)]
pub struct RestExecutor {
    http: reqwest::Client,
}

impl RestExecutor {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }

    pub async fn execute(&self, request: RestRequest) -> Result<Value, TransportError> {
        debug!("POST {}", request.url);
        let mut builder = self.http.post(&request.url).timeout(request.timeout);
        if let Some(token) = &request.bearer_token {
            builder = builder.bearer_auth(token);
        }
        builder = match &request.body {
            RestBody::Json(body) => builder.json(body),
            RestBody::Form(fields) => builder.form(fields),
        };

        let response = builder.send().await.map_err(|e| {
            warn!("Request to {} failed: {}", request.url, e);
            TransportError::Network(e.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            warn!("{} returned {}", request.url, status);
            return Err(TransportError::HttpStatus {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("").to_string(),
            });
        }

        response
            .json()
            .await
            .map_err(|e| TransportError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfigBuilder;

    #[test]
    fn test_gateway_url_with_namespace_and_prefix() {
        let cfg = ClientConfigBuilder::new()
            .deployment_name("mymodel")
            .namespace("prod")
            .gateway_prefix("/mycompany/ml")
            .build();
        assert_eq!(
            gateway_url(&cfg, "mymodel", Operation::Predict),
            "http://localhost:8003/mycompany/ml/seldon/prod/mymodel/api/v1.0/predict"
        );
    }

    #[test]
    fn test_gateway_url_without_namespace() {
        let cfg = ClientConfigBuilder::new().deployment_name("mymodel").build();
        assert_eq!(
            gateway_url(&cfg, "mymodel", Operation::Explain),
            "http://localhost:8003/seldon/mymodel/api/v1.0/explain"
        );
    }

    #[test]
    fn test_oauth_gateway_url() {
        let cfg = ClientConfigBuilder::new().build();
        assert_eq!(
            oauth_gateway_url(&cfg, Operation::Feedback),
            "http://localhost:8002/api/v1.0/send-feedback"
        );
    }

    #[test]
    fn test_microservice_url_uses_https_when_configured() {
        let cfg = ClientConfigBuilder::new().use_ssl(true).build();
        assert_eq!(
            microservice_url(&cfg, Operation::TransformInput),
            "https://localhost:5000/transform-input"
        );
    }

    #[test]
    fn test_microservice_form_wraps_serialized_message() {
        let body = microservice_form(&serde_json::json!({"strData": "x"}));
        let RestBody::Form(fields) = body else {
            panic!("microservice body must be form-encoded");
        };
        assert_eq!(fields, vec![("json", "{\"strData\":\"x\"}".to_string())]);
    }
}
