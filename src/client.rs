//! Client facade: resolve per-call configuration, route through the
//! static table, dispatch to the matching builder/executor pair, and
//! normalize the outcome into an envelope.
//!
//! Propagation policy: programmer errors (missing deployment name,
//! malformed request payload, unsupported combination) return `Err`;
//! everything the environment can do wrong (unreachable endpoints,
//! non-2xx statuses, RPC faults, token fetches, undecodable responses)
//! is captured into `envelope{success: false, msg}`.

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::auth::{AuthError, TokenKey, TokenManager};
use crate::config::{CallOptions, ClientConfig};
use crate::error::{ClientError, ClientResult};
use crate::payload::{self, Payload};
use crate::proto::{Feedback, SeldonMessage, SeldonMessageList};
use crate::response::{CombineRequest, SeldonClientCombine, SeldonClientPrediction};
use crate::routing::{self, CallTarget, Handler, Operation, RouteKey};
use crate::transport::TransportError;
use crate::transport::grpc::{GrpcBody, GrpcCall, GrpcExecutor, GrpcRoute, TonicExecutor};
use crate::transport::rest::{self, RestBody, RestExecutor, RestRequest};

/// Default payload shape for smoke calls that pass no data.
const DEFAULT_PAYLOAD_SHAPE: [usize; 2] = [1, 1];

/// Unified client for a model-serving deployment.
///
/// One instance may serve many concurrent calls; per-call state lives
/// on the stack and the only shared mutable component is the token
/// cache.
pub struct SeldonClient {
    config: ClientConfig,
    rest: RestExecutor,
    grpc: Arc<dyn GrpcExecutor>,
    tokens: TokenManager,
}

impl SeldonClient {
    pub fn new(config: ClientConfig) -> Self {
        Self::with_grpc_executor(config, Arc::new(TonicExecutor))
    }

    /// Construct with a custom gRPC executor. Production code wants
    /// [`SeldonClient::new`]; tests substitute a fake here.
    pub fn with_grpc_executor(config: ClientConfig, grpc: Arc<dyn GrpcExecutor>) -> Self {
        let http = reqwest::Client::new();
        Self {
            config,
            rest: RestExecutor::new(http.clone()),
            grpc,
            tokens: TokenManager::new(http),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Send a prediction request through the configured gateway.
    ///
    /// With no `payload`, a random 1x1 tensor is sent so smoke calls
    /// need no arguments. `names` labels tensor columns.
    pub async fn predict(
        &self,
        payload: Option<Payload>,
        names: Option<Vec<String>>,
        opts: CallOptions,
    ) -> ClientResult<SeldonClientPrediction> {
        let cfg = self.config.resolve(&opts);
        let deployment = cfg.require_deployment()?.to_string();
        let handler = self.route(&cfg, CallTarget::Gateway(cfg.gateway), Operation::Predict)?;
        let payload = payload.unwrap_or_else(|| Payload::random(&DEFAULT_PAYLOAD_SHAPE));
        let message = payload::encode(&payload, names.as_deref());
        debug!("predict via {:?}", handler);

        match handler {
            Handler::RestGatewayPredict => {
                let url = rest::gateway_url(&cfg, &deployment, Operation::Predict);
                Ok(self.rest_message_call(&cfg, url, None, message, false).await)
            }
            Handler::RestOauthPredict => {
                Ok(self
                    .rest_oauth_message_call(&cfg, Operation::Predict, message, false)
                    .await)
            }
            Handler::GrpcGatewayPredict => {
                let call = self.gateway_grpc_call(
                    &cfg,
                    &deployment,
                    GrpcRoute::SeldonPredict,
                    GrpcBody::Message(message.clone()),
                );
                Ok(self.grpc_message_call(call, message).await)
            }
            Handler::GrpcOauthPredict => {
                Ok(self
                    .grpc_oauth_message_call(
                        &cfg,
                        GrpcRoute::SeldonPredict,
                        GrpcBody::Message(message.clone()),
                        message,
                    )
                    .await)
            }
            _ => Err(self.unsupported(&cfg, CallTarget::Gateway(cfg.gateway), Operation::Predict)),
        }
    }

    /// Ask the deployment's explainer for an explanation of a payload.
    ///
    /// REST-only: the wire schema has no Explain RPC. The response is
    /// not forced through the strict codec; a body that is not a wire
    /// message comes back as a `jsonData` payload.
    pub async fn explain(
        &self,
        payload: Option<Payload>,
        opts: CallOptions,
    ) -> ClientResult<SeldonClientPrediction> {
        let cfg = self.config.resolve(&opts);
        let deployment = cfg.require_deployment()?.to_string();
        let handler = self.route(&cfg, CallTarget::Gateway(cfg.gateway), Operation::Explain)?;
        let payload = payload.unwrap_or_else(|| Payload::random(&DEFAULT_PAYLOAD_SHAPE));
        let message = payload::encode(&payload, None);
        debug!("explain via {:?}", handler);

        match handler {
            Handler::RestGatewayExplain => {
                let url = rest::gateway_url(&cfg, &deployment, Operation::Explain);
                Ok(self.rest_message_call(&cfg, url, None, message, true).await)
            }
            Handler::RestOauthExplain => {
                Ok(self
                    .rest_oauth_message_call(&cfg, Operation::Explain, message, true)
                    .await)
            }
            _ => Err(self.unsupported(&cfg, CallTarget::Gateway(cfg.gateway), Operation::Explain)),
        }
    }

    /// Send reward feedback for a prediction request/response pair
    /// through the configured gateway.
    pub async fn feedback(
        &self,
        request: SeldonMessage,
        response: SeldonMessage,
        reward: f32,
        opts: CallOptions,
    ) -> ClientResult<SeldonClientCombine> {
        let cfg = self.config.resolve(&opts);
        let deployment = cfg.require_deployment()?.to_string();
        let handler = self.route(&cfg, CallTarget::Gateway(cfg.gateway), Operation::Feedback)?;
        let feedback = Feedback {
            request: Some(request),
            response: Some(response),
            reward,
        };
        debug!("feedback via {:?}", handler);

        match handler {
            Handler::RestGatewayFeedback => {
                let url = rest::gateway_url(&cfg, &deployment, Operation::Feedback);
                Ok(self.rest_feedback_call(&cfg, url, None, feedback).await)
            }
            Handler::RestOauthFeedback => {
                let url = rest::oauth_gateway_url(&cfg, Operation::Feedback);
                match self.bearer_token(&cfg).await {
                    Ok(token) => Ok(self.rest_feedback_call(&cfg, url, Some(token), feedback).await),
                    Err(e) => Ok(SeldonClientCombine::fail(
                        Some(CombineRequest::Feedback(feedback)),
                        TransportError::Auth(e).to_string(),
                    )),
                }
            }
            Handler::GrpcGatewayFeedback => {
                let call = self.gateway_grpc_call(
                    &cfg,
                    &deployment,
                    GrpcRoute::SeldonSendFeedback,
                    GrpcBody::Feedback(feedback.clone()),
                );
                Ok(self.grpc_combine_call(call, CombineRequest::Feedback(feedback)).await)
            }
            Handler::GrpcOauthFeedback => match self.bearer_token(&cfg).await {
                Ok(token) => {
                    let call = GrpcCall {
                        endpoint: format!("{}://{}", cfg.scheme(), cfg.seldon_grpc_endpoint),
                        route: GrpcRoute::SeldonSendFeedback,
                        body: GrpcBody::Feedback(feedback.clone()),
                        metadata: vec![("oauth_token", token)],
                        timeout: cfg.timeout,
                        max_message_size: cfg.grpc_max_message_size,
                    };
                    Ok(self.grpc_combine_call(call, CombineRequest::Feedback(feedback)).await)
                }
                Err(e) => Ok(SeldonClientCombine::fail(
                    Some(CombineRequest::Feedback(feedback)),
                    TransportError::Auth(e).to_string(),
                )),
            },
            _ => Err(self.unsupported(&cfg, CallTarget::Gateway(cfg.gateway), Operation::Feedback)),
        }
    }

    /// Call one pipeline stage directly, bypassing the gateway.
    ///
    /// Supported stages: predict, transform-input, transform-output,
    /// route. Aggregate and feedback touch more than one message and
    /// have their own entry points ([`Self::microservice_aggregate`],
    /// [`Self::microservice_feedback`]).
    pub async fn microservice(
        &self,
        method: Operation,
        payload: Option<Payload>,
        names: Option<Vec<String>>,
        opts: CallOptions,
    ) -> ClientResult<SeldonClientPrediction> {
        if !matches!(
            method,
            Operation::Predict
                | Operation::TransformInput
                | Operation::TransformOutput
                | Operation::Route
        ) {
            return Err(ClientError::UnsupportedOperation {
                operation: method.to_string(),
            });
        }
        let cfg = self.config.resolve(&opts);
        let handler = self.route(&cfg, CallTarget::Microservice, method)?;
        let payload = payload.unwrap_or_else(|| Payload::random(&DEFAULT_PAYLOAD_SHAPE));
        let message = payload::encode(&payload, names.as_deref());
        debug!("microservice {} via {:?}", method, handler);

        match handler {
            Handler::RestMicroserviceMessage => {
                let url = rest::microservice_url(&cfg, method);
                let body = rest::microservice_form(&payload::message_to_json(&message));
                Ok(self.rest_prediction(&cfg, url, None, body, message, false).await)
            }
            Handler::GrpcMicroserviceMessage => {
                let route = GrpcRoute::for_microservice(method).ok_or_else(|| {
                    ClientError::UnsupportedOperation {
                        operation: method.to_string(),
                    }
                })?;
                let call = self.microservice_grpc_call(
                    &cfg,
                    route,
                    GrpcBody::Message(message.clone()),
                );
                Ok(self.grpc_message_call(call, message).await)
            }
            _ => Err(self.unsupported(&cfg, CallTarget::Microservice, method)),
        }
    }

    /// Call the aggregation stage with a batch of payloads.
    pub async fn microservice_aggregate(
        &self,
        payloads: Vec<Payload>,
        opts: CallOptions,
    ) -> ClientResult<SeldonClientCombine> {
        let cfg = self.config.resolve(&opts);
        let handler = self.route(&cfg, CallTarget::Microservice, Operation::Aggregate)?;
        let payloads = if payloads.is_empty() {
            vec![Payload::random(&DEFAULT_PAYLOAD_SHAPE)]
        } else {
            payloads
        };
        let list = SeldonMessageList {
            seldon_messages: payloads.iter().map(|p| payload::encode(p, None)).collect(),
        };
        debug!("microservice aggregate via {:?}", handler);

        match handler {
            Handler::RestMicroserviceAggregate => {
                let url = rest::microservice_url(&cfg, Operation::Aggregate);
                let body = rest::microservice_form(&payload::list_to_json(&list));
                let request = RestRequest {
                    url,
                    bearer_token: None,
                    body,
                    timeout: cfg.timeout,
                };
                Ok(match self.execute_rest_message(request, false).await {
                    Ok(response) => SeldonClientCombine::ok(CombineRequest::List(list), response),
                    Err(e) => {
                        SeldonClientCombine::fail(Some(CombineRequest::List(list)), e.to_string())
                    }
                })
            }
            Handler::GrpcMicroserviceAggregate => {
                let call = self.microservice_grpc_call(
                    &cfg,
                    GrpcRoute::GenericAggregate,
                    GrpcBody::List(list.clone()),
                );
                Ok(self.grpc_combine_call(call, CombineRequest::List(list)).await)
            }
            _ => Err(self.unsupported(&cfg, CallTarget::Microservice, Operation::Aggregate)),
        }
    }

    /// Send reward feedback directly to a pipeline stage.
    pub async fn microservice_feedback(
        &self,
        request: SeldonMessage,
        response: SeldonMessage,
        reward: f32,
        opts: CallOptions,
    ) -> ClientResult<SeldonClientCombine> {
        let cfg = self.config.resolve(&opts);
        let handler = self.route(&cfg, CallTarget::Microservice, Operation::Feedback)?;
        let feedback = Feedback {
            request: Some(request),
            response: Some(response),
            reward,
        };
        debug!("microservice feedback via {:?}", handler);

        match handler {
            Handler::RestMicroserviceFeedback => {
                let url = rest::microservice_url(&cfg, Operation::Feedback);
                let body = rest::microservice_form(&payload::feedback_to_json(&feedback));
                let request = RestRequest {
                    url,
                    bearer_token: None,
                    body,
                    timeout: cfg.timeout,
                };
                Ok(match self.execute_rest_message(request, false).await {
                    Ok(resp) => SeldonClientCombine::ok(CombineRequest::Feedback(feedback), resp),
                    Err(e) => SeldonClientCombine::fail(
                        Some(CombineRequest::Feedback(feedback)),
                        e.to_string(),
                    ),
                })
            }
            Handler::GrpcMicroserviceFeedback => {
                let call = self.microservice_grpc_call(
                    &cfg,
                    GrpcRoute::ModelSendFeedback,
                    GrpcBody::Feedback(feedback.clone()),
                );
                Ok(self.grpc_combine_call(call, CombineRequest::Feedback(feedback)).await)
            }
            _ => Err(self.unsupported(&cfg, CallTarget::Microservice, Operation::Feedback)),
        }
    }

    fn route(
        &self,
        cfg: &ClientConfig,
        target: CallTarget,
        operation: Operation,
    ) -> ClientResult<Handler> {
        let key = RouteKey {
            transport: cfg.transport,
            target,
            operation,
        };
        routing::resolve(&key).ok_or_else(|| self.unsupported(cfg, target, operation))
    }

    fn unsupported(
        &self,
        cfg: &ClientConfig,
        target: CallTarget,
        operation: Operation,
    ) -> ClientError {
        ClientError::UnsupportedCombination {
            transport: cfg.transport,
            target,
            operation,
        }
    }

    async fn bearer_token(&self, cfg: &ClientConfig) -> Result<String, AuthError> {
        let key = TokenKey {
            oauth_key: cfg.oauth_key.clone().unwrap_or_default(),
            oauth_secret: cfg.oauth_secret.clone().unwrap_or_default(),
            namespace: cfg.namespace.clone(),
            endpoint: cfg.seldon_rest_endpoint.clone(),
        };
        self.tokens.get_token(&key, cfg.use_ssl, cfg.timeout).await
    }

    /// Ambassador-style gRPC call: the ingress routes on
    /// `seldon`/`namespace` metadata.
    fn gateway_grpc_call(
        &self,
        cfg: &ClientConfig,
        deployment: &str,
        route: GrpcRoute,
        body: GrpcBody,
    ) -> GrpcCall {
        let mut metadata = vec![("seldon", deployment.to_string())];
        if let Some(namespace) = &cfg.namespace {
            metadata.push(("namespace", namespace.clone()));
        }
        GrpcCall {
            endpoint: format!("{}://{}", cfg.scheme(), cfg.gateway_endpoint),
            route,
            body,
            metadata,
            timeout: cfg.timeout,
            max_message_size: cfg.grpc_max_message_size,
        }
    }

    fn microservice_grpc_call(
        &self,
        cfg: &ClientConfig,
        route: GrpcRoute,
        body: GrpcBody,
    ) -> GrpcCall {
        GrpcCall {
            endpoint: format!("{}://{}", cfg.scheme(), cfg.microservice_endpoint),
            route,
            body,
            metadata: Vec::new(),
            timeout: cfg.timeout,
            max_message_size: cfg.grpc_max_message_size,
        }
    }

    /// REST gateway call carrying a message JSON body.
    async fn rest_message_call(
        &self,
        cfg: &ClientConfig,
        url: String,
        bearer_token: Option<String>,
        message: SeldonMessage,
        lenient: bool,
    ) -> SeldonClientPrediction {
        let body = RestBody::Json(payload::message_to_json(&message));
        self.rest_prediction(cfg, url, bearer_token, body, message, lenient).await
    }

    /// OAuth-gateway variant: acquire the bearer token first; a failed
    /// fetch is an environmental failure, not an error.
    async fn rest_oauth_message_call(
        &self,
        cfg: &ClientConfig,
        operation: Operation,
        message: SeldonMessage,
        lenient: bool,
    ) -> SeldonClientPrediction {
        match self.bearer_token(cfg).await {
            Ok(token) => {
                let url = rest::oauth_gateway_url(cfg, operation);
                self.rest_message_call(cfg, url, Some(token), message, lenient).await
            }
            Err(e) => {
                SeldonClientPrediction::fail(Some(message), TransportError::Auth(e).to_string())
            }
        }
    }

    async fn grpc_oauth_message_call(
        &self,
        cfg: &ClientConfig,
        route: GrpcRoute,
        body: GrpcBody,
        message: SeldonMessage,
    ) -> SeldonClientPrediction {
        match self.bearer_token(cfg).await {
            Ok(token) => {
                let call = GrpcCall {
                    endpoint: format!("{}://{}", cfg.scheme(), cfg.seldon_grpc_endpoint),
                    route,
                    body,
                    metadata: vec![("oauth_token", token)],
                    timeout: cfg.timeout,
                    max_message_size: cfg.grpc_max_message_size,
                };
                self.grpc_message_call(call, message).await
            }
            Err(e) => {
                SeldonClientPrediction::fail(Some(message), TransportError::Auth(e).to_string())
            }
        }
    }

    async fn rest_prediction(
        &self,
        cfg: &ClientConfig,
        url: String,
        bearer_token: Option<String>,
        body: RestBody,
        message: SeldonMessage,
        lenient: bool,
    ) -> SeldonClientPrediction {
        let request = RestRequest {
            url,
            bearer_token,
            body,
            timeout: cfg.timeout,
        };
        match self.execute_rest_message(request, lenient).await {
            Ok(response) => SeldonClientPrediction::ok(message, response),
            Err(e) => SeldonClientPrediction::fail(Some(message), e.to_string()),
        }
    }

    async fn rest_feedback_call(
        &self,
        cfg: &ClientConfig,
        url: String,
        bearer_token: Option<String>,
        feedback: Feedback,
    ) -> SeldonClientCombine {
        let request = RestRequest {
            url,
            bearer_token,
            body: RestBody::Json(payload::feedback_to_json(&feedback)),
            timeout: cfg.timeout,
        };
        match self.execute_rest_message(request, false).await {
            Ok(response) => SeldonClientCombine::ok(CombineRequest::Feedback(feedback), response),
            Err(e) => {
                SeldonClientCombine::fail(Some(CombineRequest::Feedback(feedback)), e.to_string())
            }
        }
    }

    /// Execute a REST request and decode the body into a wire message.
    /// Lenient mode wraps non-message bodies as a `jsonData` payload
    /// instead of failing (the explain path).
    async fn execute_rest_message(
        &self,
        request: RestRequest,
        lenient: bool,
    ) -> Result<SeldonMessage, TransportError> {
        let raw: Value = self.rest.execute(request).await?;
        match payload::json_to_message(&raw) {
            Ok(message) => Ok(message),
            Err(_) if lenient => Ok(payload::encode(&Payload::Json(raw), None)),
            Err(e) => Err(TransportError::Decode(e.to_string())),
        }
    }

    async fn grpc_message_call(
        &self,
        call: GrpcCall,
        message: SeldonMessage,
    ) -> SeldonClientPrediction {
        match self.grpc.execute(call).await {
            Ok(response) => SeldonClientPrediction::ok(message, response),
            Err(e) => SeldonClientPrediction::fail(Some(message), e.to_string()),
        }
    }

    async fn grpc_combine_call(
        &self,
        call: GrpcCall,
        request: CombineRequest,
    ) -> SeldonClientCombine {
        match self.grpc.execute(call).await {
            Ok(response) => SeldonClientCombine::ok(request, response),
            Err(e) => SeldonClientCombine::fail(Some(request), e.to_string()),
        }
    }
}
