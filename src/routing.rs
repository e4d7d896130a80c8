//! Static routing table: (transport, target, operation) -> handler.
//!
//! The supported combinations live in one table built at first use, so
//! the routing domain is auditable and testable as data instead of
//! being scattered across conditionals. Lookups outside the table fail
//! before any network activity.

use std::collections::HashMap;
use std::str::FromStr;

use once_cell::sync::Lazy;

use crate::config::{Gateway, Transport};
use crate::error::ClientError;

/// Logical operations the client can perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Predict,
    Explain,
    Feedback,
    TransformInput,
    TransformOutput,
    Route,
    Aggregate,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Predict => "predict",
            Operation::Explain => "explain",
            Operation::Feedback => "send-feedback",
            Operation::TransformInput => "transform-input",
            Operation::TransformOutput => "transform-output",
            Operation::Route => "route",
            Operation::Aggregate => "aggregate",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "predict" => Ok(Operation::Predict),
            "explain" => Ok(Operation::Explain),
            "feedback" | "send-feedback" => Ok(Operation::Feedback),
            "transform-input" => Ok(Operation::TransformInput),
            "transform-output" => Ok(Operation::TransformOutput),
            "route" => Ok(Operation::Route),
            "aggregate" => Ok(Operation::Aggregate),
            other => Err(ClientError::UnsupportedOperation {
                operation: other.to_string(),
            }),
        }
    }
}

/// What a call addresses: a gateway-fronted deployment or one directly
/// addressed pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallTarget {
    Gateway(Gateway),
    Microservice,
}

impl std::fmt::Display for CallTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CallTarget::Gateway(gateway) => gateway.fmt(f),
            CallTarget::Microservice => f.write_str("microservice"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RouteKey {
    pub transport: Transport,
    pub target: CallTarget,
    pub operation: Operation,
}

/// One request-builder/executor pairing. Variant names mirror the wire
/// procedures they drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handler {
    RestGatewayPredict,
    RestOauthPredict,
    GrpcGatewayPredict,
    GrpcOauthPredict,
    RestGatewayExplain,
    RestOauthExplain,
    RestGatewayFeedback,
    RestOauthFeedback,
    GrpcGatewayFeedback,
    GrpcOauthFeedback,
    RestMicroserviceMessage,
    GrpcMicroserviceMessage,
    RestMicroserviceAggregate,
    GrpcMicroserviceAggregate,
    RestMicroserviceFeedback,
    GrpcMicroserviceFeedback,
}

static ROUTES: Lazy<HashMap<RouteKey, Handler>> = Lazy::new(|| {
    use CallTarget::{Gateway as Gw, Microservice as Micro};
    use Gateway::{Ambassador, Seldon};
    use Transport::{Grpc, Rest};

    let mut table = HashMap::new();
    let mut add = |transport, target, operation, handler| {
        table.insert(
            RouteKey {
                transport,
                target,
                operation,
            },
            handler,
        );
    };

    // Gateway-facing API. No Explain RPC exists in the wire schema, so
    // explain is REST-only.
    add(Rest, Gw(Ambassador), Operation::Predict, Handler::RestGatewayPredict);
    add(Rest, Gw(Seldon), Operation::Predict, Handler::RestOauthPredict);
    add(Grpc, Gw(Ambassador), Operation::Predict, Handler::GrpcGatewayPredict);
    add(Grpc, Gw(Seldon), Operation::Predict, Handler::GrpcOauthPredict);
    add(Rest, Gw(Ambassador), Operation::Explain, Handler::RestGatewayExplain);
    add(Rest, Gw(Seldon), Operation::Explain, Handler::RestOauthExplain);
    add(Rest, Gw(Ambassador), Operation::Feedback, Handler::RestGatewayFeedback);
    add(Rest, Gw(Seldon), Operation::Feedback, Handler::RestOauthFeedback);
    add(Grpc, Gw(Ambassador), Operation::Feedback, Handler::GrpcGatewayFeedback);
    add(Grpc, Gw(Seldon), Operation::Feedback, Handler::GrpcOauthFeedback);

    // Microservice-facing API.
    for operation in [
        Operation::Predict,
        Operation::TransformInput,
        Operation::TransformOutput,
        Operation::Route,
    ] {
        add(Rest, Micro, operation, Handler::RestMicroserviceMessage);
        add(Grpc, Micro, operation, Handler::GrpcMicroserviceMessage);
    }
    add(Rest, Micro, Operation::Aggregate, Handler::RestMicroserviceAggregate);
    add(Grpc, Micro, Operation::Aggregate, Handler::GrpcMicroserviceAggregate);
    add(Rest, Micro, Operation::Feedback, Handler::RestMicroserviceFeedback);
    add(Grpc, Micro, Operation::Feedback, Handler::GrpcMicroserviceFeedback);

    table
});

/// Look up the handler for a combination; `None` means the combination
/// is outside the supported domain.
pub fn resolve(key: &RouteKey) -> Option<Handler> {
    ROUTES.get(key).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(transport: Transport, target: CallTarget, operation: Operation) -> RouteKey {
        RouteKey {
            transport,
            target,
            operation,
        }
    }

    #[test]
    fn test_gateway_domain_is_total() {
        for transport in [Transport::Rest, Transport::Grpc] {
            for gateway in [Gateway::Ambassador, Gateway::Seldon] {
                for operation in [Operation::Predict, Operation::Feedback] {
                    let k = key(transport, CallTarget::Gateway(gateway), operation);
                    assert!(resolve(&k).is_some(), "missing route for {k:?}");
                }
            }
        }
        for gateway in [Gateway::Ambassador, Gateway::Seldon] {
            let k = key(Transport::Rest, CallTarget::Gateway(gateway), Operation::Explain);
            assert!(resolve(&k).is_some(), "missing route for {k:?}");
        }
    }

    #[test]
    fn test_microservice_domain_is_total() {
        for transport in [Transport::Rest, Transport::Grpc] {
            for operation in [
                Operation::Predict,
                Operation::TransformInput,
                Operation::TransformOutput,
                Operation::Route,
                Operation::Aggregate,
                Operation::Feedback,
            ] {
                let k = key(transport, CallTarget::Microservice, operation);
                assert!(resolve(&k).is_some(), "missing route for {k:?}");
            }
        }
    }

    #[test]
    fn test_combinations_outside_the_table_miss() {
        // No Explain RPC in the wire schema.
        for gateway in [Gateway::Ambassador, Gateway::Seldon] {
            let k = key(Transport::Grpc, CallTarget::Gateway(gateway), Operation::Explain);
            assert_eq!(resolve(&k), None);
        }
        // Pipeline-stage operations do not route through gateways.
        let k = key(
            Transport::Rest,
            CallTarget::Gateway(Gateway::Ambassador),
            Operation::TransformInput,
        );
        assert_eq!(resolve(&k), None);
        // Explain is not a pipeline stage.
        let k = key(Transport::Rest, CallTarget::Microservice, Operation::Explain);
        assert_eq!(resolve(&k), None);
    }

    #[test]
    fn test_operation_from_str() {
        assert_eq!("transform-input".parse::<Operation>().unwrap(), Operation::TransformInput);
        assert!(matches!(
            "transform".parse::<Operation>(),
            Err(ClientError::UnsupportedOperation { operation }) if operation == "transform"
        ));
    }
}
