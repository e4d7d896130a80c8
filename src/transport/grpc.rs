//! gRPC request assembly and execution.
//!
//! The operation-to-stub mapping is static data ([`GrpcRoute`]), so a
//! routing mistake is unrepresentable past the routing stage: each
//! variant names one bound method on one generated stub. The executor
//! sits behind a trait so tests can substitute a recording fake for
//! the real channel.

use std::time::Duration;

use async_trait::async_trait;
use tonic::metadata::{Ascii, MetadataValue};
use tonic::transport::{Channel, ClientTlsConfig};
use tracing::debug;

use super::TransportError;
use crate::proto::{
    Feedback, SeldonMessage, SeldonMessageList, generic_client, model_client, router_client,
    seldon_client,
};
use crate::routing::Operation;

/// One bound stub method. Gateway calls use the `Seldon` stub; each
/// microservice operation selects among the `Model`, `Generic`, and
/// `Router` stubs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrpcRoute {
    SeldonPredict,
    SeldonSendFeedback,
    ModelPredict,
    ModelSendFeedback,
    GenericTransformInput,
    GenericTransformOutput,
    GenericAggregate,
    RouterRoute,
}

impl GrpcRoute {
    /// Stub selection for a directly-addressed pipeline stage.
    pub fn for_microservice(operation: Operation) -> Option<GrpcRoute> {
        match operation {
            Operation::Predict => Some(GrpcRoute::ModelPredict),
            Operation::TransformInput => Some(GrpcRoute::GenericTransformInput),
            Operation::TransformOutput => Some(GrpcRoute::GenericTransformOutput),
            Operation::Route => Some(GrpcRoute::RouterRoute),
            Operation::Aggregate => Some(GrpcRoute::GenericAggregate),
            Operation::Feedback => Some(GrpcRoute::ModelSendFeedback),
            Operation::Explain => None,
        }
    }

    /// Full gRPC method path, as it appears on the wire.
    pub fn path(&self) -> &'static str {
        match self {
            GrpcRoute::SeldonPredict => "/seldon.protos.Seldon/Predict",
            GrpcRoute::SeldonSendFeedback => "/seldon.protos.Seldon/SendFeedback",
            GrpcRoute::ModelPredict => "/seldon.protos.Model/Predict",
            GrpcRoute::ModelSendFeedback => "/seldon.protos.Model/SendFeedback",
            GrpcRoute::GenericTransformInput => "/seldon.protos.Generic/TransformInput",
            GrpcRoute::GenericTransformOutput => "/seldon.protos.Generic/TransformOutput",
            GrpcRoute::GenericAggregate => "/seldon.protos.Generic/Aggregate",
            GrpcRoute::RouterRoute => "/seldon.protos.Router/Route",
        }
    }

    /// The logical operation this route serves.
    pub fn operation(&self) -> Operation {
        match self {
            GrpcRoute::SeldonPredict | GrpcRoute::ModelPredict => Operation::Predict,
            GrpcRoute::SeldonSendFeedback | GrpcRoute::ModelSendFeedback => Operation::Feedback,
            GrpcRoute::GenericTransformInput => Operation::TransformInput,
            GrpcRoute::GenericTransformOutput => Operation::TransformOutput,
            GrpcRoute::GenericAggregate => Operation::Aggregate,
            GrpcRoute::RouterRoute => Operation::Route,
        }
    }
}

/// Request message for one unary call; the variant must match what the
/// route's method accepts.
#[derive(Debug, Clone, PartialEq)]
pub enum GrpcBody {
    Message(SeldonMessage),
    List(SeldonMessageList),
    Feedback(Feedback),
}

/// Fully assembled gRPC call: destination, bound method, message, and
/// request metadata. Pure data; building one performs no I/O.
#[derive(Debug, Clone)]
pub struct GrpcCall {
    /// `http://host:port` or `https://host:port`.
    pub endpoint: String,
    pub route: GrpcRoute,
    pub body: GrpcBody,
    pub metadata: Vec<(&'static str, String)>,
    pub timeout: Duration,
    pub max_message_size: usize,
}

/// Executor seam: one unary round trip per call, no retries.
#[async_trait]
pub trait GrpcExecutor: Send + Sync {
    async fn execute(&self, call: GrpcCall) -> Result<SeldonMessage, TransportError>;
}

/// Production executor driving the generated stubs over a fresh
/// channel per call.
pub struct TonicExecutor;

#[async_trait]
impl GrpcExecutor for TonicExecutor {
    async fn execute(&self, call: GrpcCall) -> Result<SeldonMessage, TransportError> {
        let GrpcCall {
            endpoint,
            route,
            body,
            metadata,
            timeout,
            max_message_size,
        } = call;
        debug!("gRPC {} against {}", route.path(), endpoint);

        let channel = connect(&endpoint, timeout).await?;
        let response = match route {
            GrpcRoute::SeldonPredict => {
                let mut client = seldon_client::SeldonClient::new(channel)
                    .max_decoding_message_size(max_message_size)
                    .max_encoding_message_size(max_message_size);
                client
                    .predict(build_request(expect_message(body)?, &metadata, timeout)?)
                    .await
            }
            GrpcRoute::SeldonSendFeedback => {
                let mut client = seldon_client::SeldonClient::new(channel)
                    .max_decoding_message_size(max_message_size)
                    .max_encoding_message_size(max_message_size);
                client
                    .send_feedback(build_request(expect_feedback(body)?, &metadata, timeout)?)
                    .await
            }
            GrpcRoute::ModelPredict => {
                let mut client = model_client::ModelClient::new(channel)
                    .max_decoding_message_size(max_message_size)
                    .max_encoding_message_size(max_message_size);
                client
                    .predict(build_request(expect_message(body)?, &metadata, timeout)?)
                    .await
            }
            GrpcRoute::ModelSendFeedback => {
                let mut client = model_client::ModelClient::new(channel)
                    .max_decoding_message_size(max_message_size)
                    .max_encoding_message_size(max_message_size);
                client
                    .send_feedback(build_request(expect_feedback(body)?, &metadata, timeout)?)
                    .await
            }
            GrpcRoute::GenericTransformInput => {
                let mut client = generic_client::GenericClient::new(channel)
                    .max_decoding_message_size(max_message_size)
                    .max_encoding_message_size(max_message_size);
                client
                    .transform_input(build_request(expect_message(body)?, &metadata, timeout)?)
                    .await
            }
            GrpcRoute::GenericTransformOutput => {
                let mut client = generic_client::GenericClient::new(channel)
                    .max_decoding_message_size(max_message_size)
                    .max_encoding_message_size(max_message_size);
                client
                    .transform_output(build_request(expect_message(body)?, &metadata, timeout)?)
                    .await
            }
            GrpcRoute::GenericAggregate => {
                let mut client = generic_client::GenericClient::new(channel)
                    .max_decoding_message_size(max_message_size)
                    .max_encoding_message_size(max_message_size);
                client
                    .aggregate(build_request(expect_list(body)?, &metadata, timeout)?)
                    .await
            }
            GrpcRoute::RouterRoute => {
                let mut client = router_client::RouterClient::new(channel)
                    .max_decoding_message_size(max_message_size)
                    .max_encoding_message_size(max_message_size);
                client
                    .route(build_request(expect_message(body)?, &metadata, timeout)?)
                    .await
            }
        };

        response
            .map(tonic::Response::into_inner)
            .map_err(|status| {
                TransportError::Rpc(format!("{:?}: {}", status.code(), status.message()))
            })
    }
}

async fn connect(endpoint: &str, timeout: Duration) -> Result<Channel, TransportError> {
    let mut builder = Channel::from_shared(endpoint.to_string())
        .map_err(|e| TransportError::Network(e.to_string()))?
        .connect_timeout(timeout);
    if endpoint.starts_with("https://") {
        builder = builder
            .tls_config(ClientTlsConfig::new().with_native_roots())
            .map_err(|e| TransportError::Network(e.to_string()))?;
    }
    builder
        .connect()
        .await
        .map_err(|e| TransportError::Network(e.to_string()))
}

fn build_request<T>(
    message: T,
    metadata: &[(&'static str, String)],
    timeout: Duration,
) -> Result<tonic::Request<T>, TransportError> {
    let mut request = tonic::Request::new(message);
    request.set_timeout(timeout);
    for (key, value) in metadata {
        let value: MetadataValue<Ascii> = value.parse().map_err(|_| {
            TransportError::Rpc(format!("metadata value for '{key}' is not valid ASCII"))
        })?;
        request.metadata_mut().insert(*key, value);
    }
    Ok(request)
}

fn expect_message(body: GrpcBody) -> Result<SeldonMessage, TransportError> {
    match body {
        GrpcBody::Message(message) => Ok(message),
        other => Err(TransportError::Rpc(format!(
            "route expects a message body, got {other:?}"
        ))),
    }
}

fn expect_list(body: GrpcBody) -> Result<SeldonMessageList, TransportError> {
    match body {
        GrpcBody::List(list) => Ok(list),
        other => Err(TransportError::Rpc(format!(
            "route expects a message list body, got {other:?}"
        ))),
    }
}

fn expect_feedback(body: GrpcBody) -> Result<Feedback, TransportError> {
    match body {
        GrpcBody::Feedback(feedback) => Ok(feedback),
        other => Err(TransportError::Rpc(format!(
            "route expects a feedback body, got {other:?}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_microservice_stub_selection() {
        assert_eq!(
            GrpcRoute::for_microservice(Operation::Predict),
            Some(GrpcRoute::ModelPredict)
        );
        assert_eq!(
            GrpcRoute::for_microservice(Operation::TransformInput),
            Some(GrpcRoute::GenericTransformInput)
        );
        assert_eq!(
            GrpcRoute::for_microservice(Operation::TransformOutput),
            Some(GrpcRoute::GenericTransformOutput)
        );
        assert_eq!(
            GrpcRoute::for_microservice(Operation::Route),
            Some(GrpcRoute::RouterRoute)
        );
        assert_eq!(
            GrpcRoute::for_microservice(Operation::Aggregate),
            Some(GrpcRoute::GenericAggregate)
        );
        assert_eq!(
            GrpcRoute::for_microservice(Operation::Feedback),
            Some(GrpcRoute::ModelSendFeedback)
        );
        assert_eq!(GrpcRoute::for_microservice(Operation::Explain), None);
    }

    #[test]
    fn test_route_paths_name_service_and_method() {
        assert_eq!(GrpcRoute::ModelPredict.path(), "/seldon.protos.Model/Predict");
        assert_eq!(GrpcRoute::RouterRoute.path(), "/seldon.protos.Router/Route");
        assert_eq!(
            GrpcRoute::GenericAggregate.path(),
            "/seldon.protos.Generic/Aggregate"
        );
    }

    #[test]
    fn test_build_request_attaches_metadata_and_timeout() {
        let metadata = vec![("seldon", "mymodel".to_string()), ("namespace", "prod".to_string())];
        let request = build_request(
            SeldonMessage::default(),
            &metadata,
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(
            request.metadata().get("seldon").unwrap().to_str().unwrap(),
            "mymodel"
        );
        assert_eq!(
            request.metadata().get("namespace").unwrap().to_str().unwrap(),
            "prod"
        );
    }

    #[test]
    fn test_body_mismatch_is_reported() {
        assert!(expect_list(GrpcBody::Message(SeldonMessage::default())).is_err());
        assert!(expect_feedback(GrpcBody::List(SeldonMessageList::default())).is_err());
    }
}
