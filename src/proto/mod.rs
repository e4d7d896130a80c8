//! Wire schema bindings for the prediction protocol.
//!
//! Hand-maintained prost/tonic bindings for the `seldon.protos` package,
//! checked in so the build does not depend on `protoc`. Message structs
//! follow the prost codegen layout; the client stubs follow the tonic
//! codegen layout for unary calls.

#![allow(clippy::derive_partial_eq_without_eq)]

use std::collections::HashMap;

/// Canonical message exchanged with a deployment. Carries exactly one
/// payload variant (`data_oneof`) plus optional metadata.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SeldonMessage {
    #[prost(message, optional, tag = "2")]
    pub meta: ::core::option::Option<Meta>,
    #[prost(oneof = "seldon_message::DataOneof", tags = "3, 4, 5, 6")]
    pub data_oneof: ::core::option::Option<seldon_message::DataOneof>,
}

pub mod seldon_message {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum DataOneof {
        #[prost(message, tag = "3")]
        Data(super::DefaultData),
        #[prost(bytes = "vec", tag = "4")]
        BinData(::prost::alloc::vec::Vec<u8>),
        #[prost(string, tag = "5")]
        StrData(::prost::alloc::string::String),
        #[prost(message, tag = "6")]
        JsonData(::prost_types::Value),
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DefaultData {
    /// Column labels for the tensor, in column order.
    #[prost(string, repeated, tag = "1")]
    pub names: ::prost::alloc::vec::Vec<::prost::alloc::string::String>,
    #[prost(message, optional, tag = "2")]
    pub tensor: ::core::option::Option<Tensor>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Tensor {
    #[prost(int32, repeated, tag = "1")]
    pub shape: ::prost::alloc::vec::Vec<i32>,
    #[prost(double, repeated, tag = "2")]
    pub values: ::prost::alloc::vec::Vec<f64>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Meta {
    #[prost(string, tag = "1")]
    pub puid: ::prost::alloc::string::String,
    #[prost(map = "string, string", tag = "2")]
    pub tags: HashMap<::prost::alloc::string::String, ::prost::alloc::string::String>,
}

/// Reinforcement signal tying a prediction request/response pair to a
/// numeric reward.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Feedback {
    #[prost(message, optional, tag = "1")]
    pub request: ::core::option::Option<SeldonMessage>,
    #[prost(message, optional, tag = "2")]
    pub response: ::core::option::Option<SeldonMessage>,
    #[prost(float, tag = "3")]
    pub reward: f32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SeldonMessageList {
    #[prost(message, repeated, tag = "1")]
    pub seldon_messages: ::prost::alloc::vec::Vec<SeldonMessage>,
}

/// Client stub for the gateway-facing `Seldon` service.
pub mod seldon_client {
    #![allow(unused_variables, dead_code, missing_docs)]
    use tonic::codegen::*;

    #[derive(Debug, Clone)]
    pub struct SeldonClient<T> {
        inner: tonic::client::Grpc<T>,
    }

    impl SeldonClient<tonic::transport::Channel> {
        pub async fn connect<D>(dst: D) -> Result<Self, tonic::transport::Error>
        where
            D: TryInto<tonic::transport::Endpoint>,
            D::Error: Into<StdError>,
        {
            let conn = tonic::transport::Endpoint::new(dst)?.connect().await?;
            Ok(Self::new(conn))
        }
    }

    impl<T> SeldonClient<T>
    where
        T: tonic::client::GrpcService<tonic::body::BoxBody>,
        T::Error: Into<StdError>,
        T::ResponseBody: Body<Data = Bytes> + std::marker::Send + 'static,
        <T::ResponseBody as Body>::Error: Into<StdError> + std::marker::Send,
    {
        pub fn new(inner: T) -> Self {
            let inner = tonic::client::Grpc::new(inner);
            Self { inner }
        }

        pub fn max_decoding_message_size(mut self, limit: usize) -> Self {
            self.inner = self.inner.max_decoding_message_size(limit);
            self
        }

        pub fn max_encoding_message_size(mut self, limit: usize) -> Self {
            self.inner = self.inner.max_encoding_message_size(limit);
            self
        }

        pub async fn predict(
            &mut self,
            request: impl tonic::IntoRequest<super::SeldonMessage>,
        ) -> std::result::Result<tonic::Response<super::SeldonMessage>, tonic::Status> {
            self.inner.ready().await.map_err(|e| {
                tonic::Status::new(
                    tonic::Code::Unknown,
                    format!("Service was not ready: {}", e.into()),
                )
            })?;
            let codec = tonic::codec::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static("/seldon.protos.Seldon/Predict");
            let mut req = request.into_request();
            req.extensions_mut()
                .insert(GrpcMethod::new("seldon.protos.Seldon", "Predict"));
            self.inner.unary(req, path, codec).await
        }

        pub async fn send_feedback(
            &mut self,
            request: impl tonic::IntoRequest<super::Feedback>,
        ) -> std::result::Result<tonic::Response<super::SeldonMessage>, tonic::Status> {
            self.inner.ready().await.map_err(|e| {
                tonic::Status::new(
                    tonic::Code::Unknown,
                    format!("Service was not ready: {}", e.into()),
                )
            })?;
            let codec = tonic::codec::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static("/seldon.protos.Seldon/SendFeedback");
            let mut req = request.into_request();
            req.extensions_mut()
                .insert(GrpcMethod::new("seldon.protos.Seldon", "SendFeedback"));
            self.inner.unary(req, path, codec).await
        }
    }
}

/// Client stub for the `Model` microservice (prediction stage).
pub mod model_client {
    #![allow(unused_variables, dead_code, missing_docs)]
    use tonic::codegen::*;

    #[derive(Debug, Clone)]
    pub struct ModelClient<T> {
        inner: tonic::client::Grpc<T>,
    }

    impl ModelClient<tonic::transport::Channel> {
        pub async fn connect<D>(dst: D) -> Result<Self, tonic::transport::Error>
        where
            D: TryInto<tonic::transport::Endpoint>,
            D::Error: Into<StdError>,
        {
            let conn = tonic::transport::Endpoint::new(dst)?.connect().await?;
            Ok(Self::new(conn))
        }
    }

    impl<T> ModelClient<T>
    where
        T: tonic::client::GrpcService<tonic::body::BoxBody>,
        T::Error: Into<StdError>,
        T::ResponseBody: Body<Data = Bytes> + std::marker::Send + 'static,
        <T::ResponseBody as Body>::Error: Into<StdError> + std::marker::Send,
    {
        pub fn new(inner: T) -> Self {
            let inner = tonic::client::Grpc::new(inner);
            Self { inner }
        }

        pub fn max_decoding_message_size(mut self, limit: usize) -> Self {
            self.inner = self.inner.max_decoding_message_size(limit);
            self
        }

        pub fn max_encoding_message_size(mut self, limit: usize) -> Self {
            self.inner = self.inner.max_encoding_message_size(limit);
            self
        }

        pub async fn predict(
            &mut self,
            request: impl tonic::IntoRequest<super::SeldonMessage>,
        ) -> std::result::Result<tonic::Response<super::SeldonMessage>, tonic::Status> {
            self.inner.ready().await.map_err(|e| {
                tonic::Status::new(
                    tonic::Code::Unknown,
                    format!("Service was not ready: {}", e.into()),
                )
            })?;
            let codec = tonic::codec::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static("/seldon.protos.Model/Predict");
            let mut req = request.into_request();
            req.extensions_mut()
                .insert(GrpcMethod::new("seldon.protos.Model", "Predict"));
            self.inner.unary(req, path, codec).await
        }

        pub async fn send_feedback(
            &mut self,
            request: impl tonic::IntoRequest<super::Feedback>,
        ) -> std::result::Result<tonic::Response<super::SeldonMessage>, tonic::Status> {
            self.inner.ready().await.map_err(|e| {
                tonic::Status::new(
                    tonic::Code::Unknown,
                    format!("Service was not ready: {}", e.into()),
                )
            })?;
            let codec = tonic::codec::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static("/seldon.protos.Model/SendFeedback");
            let mut req = request.into_request();
            req.extensions_mut()
                .insert(GrpcMethod::new("seldon.protos.Model", "SendFeedback"));
            self.inner.unary(req, path, codec).await
        }
    }
}

/// Client stub for the `Generic` microservice (transform/aggregate stages).
pub mod generic_client {
    #![allow(unused_variables, dead_code, missing_docs)]
    use tonic::codegen::*;

    #[derive(Debug, Clone)]
    pub struct GenericClient<T> {
        inner: tonic::client::Grpc<T>,
    }

    impl GenericClient<tonic::transport::Channel> {
        pub async fn connect<D>(dst: D) -> Result<Self, tonic::transport::Error>
        where
            D: TryInto<tonic::transport::Endpoint>,
            D::Error: Into<StdError>,
        {
            let conn = tonic::transport::Endpoint::new(dst)?.connect().await?;
            Ok(Self::new(conn))
        }
    }

    impl<T> GenericClient<T>
    where
        T: tonic::client::GrpcService<tonic::body::BoxBody>,
        T::Error: Into<StdError>,
        T::ResponseBody: Body<Data = Bytes> + std::marker::Send + 'static,
        <T::ResponseBody as Body>::Error: Into<StdError> + std::marker::Send,
    {
        pub fn new(inner: T) -> Self {
            let inner = tonic::client::Grpc::new(inner);
            Self { inner }
        }

        pub fn max_decoding_message_size(mut self, limit: usize) -> Self {
            self.inner = self.inner.max_decoding_message_size(limit);
            self
        }

        pub fn max_encoding_message_size(mut self, limit: usize) -> Self {
            self.inner = self.inner.max_encoding_message_size(limit);
            self
        }

        pub async fn transform_input(
            &mut self,
            request: impl tonic::IntoRequest<super::SeldonMessage>,
        ) -> std::result::Result<tonic::Response<super::SeldonMessage>, tonic::Status> {
            self.inner.ready().await.map_err(|e| {
                tonic::Status::new(
                    tonic::Code::Unknown,
                    format!("Service was not ready: {}", e.into()),
                )
            })?;
            let codec = tonic::codec::ProstCodec::default();
            let path =
                http::uri::PathAndQuery::from_static("/seldon.protos.Generic/TransformInput");
            let mut req = request.into_request();
            req.extensions_mut()
                .insert(GrpcMethod::new("seldon.protos.Generic", "TransformInput"));
            self.inner.unary(req, path, codec).await
        }

        pub async fn transform_output(
            &mut self,
            request: impl tonic::IntoRequest<super::SeldonMessage>,
        ) -> std::result::Result<tonic::Response<super::SeldonMessage>, tonic::Status> {
            self.inner.ready().await.map_err(|e| {
                tonic::Status::new(
                    tonic::Code::Unknown,
                    format!("Service was not ready: {}", e.into()),
                )
            })?;
            let codec = tonic::codec::ProstCodec::default();
            let path =
                http::uri::PathAndQuery::from_static("/seldon.protos.Generic/TransformOutput");
            let mut req = request.into_request();
            req.extensions_mut()
                .insert(GrpcMethod::new("seldon.protos.Generic", "TransformOutput"));
            self.inner.unary(req, path, codec).await
        }

        pub async fn aggregate(
            &mut self,
            request: impl tonic::IntoRequest<super::SeldonMessageList>,
        ) -> std::result::Result<tonic::Response<super::SeldonMessage>, tonic::Status> {
            self.inner.ready().await.map_err(|e| {
                tonic::Status::new(
                    tonic::Code::Unknown,
                    format!("Service was not ready: {}", e.into()),
                )
            })?;
            let codec = tonic::codec::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static("/seldon.protos.Generic/Aggregate");
            let mut req = request.into_request();
            req.extensions_mut()
                .insert(GrpcMethod::new("seldon.protos.Generic", "Aggregate"));
            self.inner.unary(req, path, codec).await
        }
    }
}

/// Client stub for the `Router` microservice (routing stage).
pub mod router_client {
    #![allow(unused_variables, dead_code, missing_docs)]
    use tonic::codegen::*;

    #[derive(Debug, Clone)]
    pub struct RouterClient<T> {
        inner: tonic::client::Grpc<T>,
    }

    impl RouterClient<tonic::transport::Channel> {
        pub async fn connect<D>(dst: D) -> Result<Self, tonic::transport::Error>
        where
            D: TryInto<tonic::transport::Endpoint>,
            D::Error: Into<StdError>,
        {
            let conn = tonic::transport::Endpoint::new(dst)?.connect().await?;
            Ok(Self::new(conn))
        }
    }

    impl<T> RouterClient<T>
    where
        T: tonic::client::GrpcService<tonic::body::BoxBody>,
        T::Error: Into<StdError>,
        T::ResponseBody: Body<Data = Bytes> + std::marker::Send + 'static,
        <T::ResponseBody as Body>::Error: Into<StdError> + std::marker::Send,
    {
        pub fn new(inner: T) -> Self {
            let inner = tonic::client::Grpc::new(inner);
            Self { inner }
        }

        pub fn max_decoding_message_size(mut self, limit: usize) -> Self {
            self.inner = self.inner.max_decoding_message_size(limit);
            self
        }

        pub fn max_encoding_message_size(mut self, limit: usize) -> Self {
            self.inner = self.inner.max_encoding_message_size(limit);
            self
        }

        pub async fn route(
            &mut self,
            request: impl tonic::IntoRequest<super::SeldonMessage>,
        ) -> std::result::Result<tonic::Response<super::SeldonMessage>, tonic::Status> {
            self.inner.ready().await.map_err(|e| {
                tonic::Status::new(
                    tonic::Code::Unknown,
                    format!("Service was not ready: {}", e.into()),
                )
            })?;
            let codec = tonic::codec::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static("/seldon.protos.Router/Route");
            let mut req = request.into_request();
            req.extensions_mut()
                .insert(GrpcMethod::new("seldon.protos.Router", "Route"));
            self.inner.unary(req, path, codec).await
        }

        pub async fn send_feedback(
            &mut self,
            request: impl tonic::IntoRequest<super::Feedback>,
        ) -> std::result::Result<tonic::Response<super::SeldonMessage>, tonic::Status> {
            self.inner.ready().await.map_err(|e| {
                tonic::Status::new(
                    tonic::Code::Unknown,
                    format!("Service was not ready: {}", e.into()),
                )
            })?;
            let codec = tonic::codec::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static("/seldon.protos.Router/SendFeedback");
            let mut req = request.into_request();
            req.extensions_mut()
                .insert(GrpcMethod::new("seldon.protos.Router", "SendFeedback"));
            self.inner.unary(req, path, codec).await
        }
    }
}
