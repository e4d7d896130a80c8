//! Gateway-facing REST behavior: envelope normalization, body shapes,
//! auth headers, and token caching.

mod common;

use std::sync::Arc;

use common::{MockServer, ResponseSpec, tensor_response, token_response};
use seldon_client::proto::seldon_message::DataOneof;
use seldon_client::{
    CallOptions, ClientConfig, Gateway, Payload, SeldonClient, SeldonClientPrediction,
};
use serde_json::json;

fn ambassador_client(addr: &str) -> SeldonClient {
    SeldonClient::new(
        ClientConfig::builder()
            .deployment_name("mymodel")
            .gateway_endpoint(addr)
            .build(),
    )
}

fn seldon_client_for(addr: &str) -> SeldonClient {
    SeldonClient::new(
        ClientConfig::builder()
            .deployment_name("mymodel")
            .gateway(Gateway::Seldon)
            .seldon_rest_endpoint(addr)
            .oauth_credentials("oauth-key", "oauth-secret")
            .build(),
    )
}

fn tensor_shape(result: &SeldonClientPrediction) -> Vec<i32> {
    let message = result.response.as_ref().expect("response must be present");
    match &message.data_oneof {
        Some(DataOneof::Data(data)) => data.tensor.as_ref().expect("tensor").shape.clone(),
        other => panic!("expected tensor payload, got {other:?}"),
    }
}

#[tokio::test]
async fn test_predict_rest_404_yields_failure_envelope() {
    let server = MockServer::start(vec![(
        "",
        ResponseSpec {
            status: 404,
            body: json!({}),
        },
    )])
    .await;
    let client = ambassador_client(&server.addr);

    let result = client.predict(None, None, CallOptions::default()).await.unwrap();
    assert!(!result.success);
    assert_eq!(result.msg, "404:Not Found");
    assert!(result.response.is_none());
}

#[tokio::test]
async fn test_predict_rest_success_with_default_payload() {
    let server = MockServer::start(vec![("", ResponseSpec::ok(tensor_response()))]).await;
    let client = ambassador_client(&server.addr);

    let result = client.predict(None, None, CallOptions::default()).await.unwrap();
    assert!(result.success);
    assert_eq!(tensor_shape(&result), vec![1, 1]);

    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].path, "/seldon/mymodel/api/v1.0/predict");
    // The default smoke payload is a 1x1 tensor.
    assert_eq!(requests[0].json_body()["data"]["tensor"]["shape"], json!([1, 1]));
}

#[tokio::test]
async fn test_predict_rest_names_reach_the_outbound_body() {
    let server = MockServer::start(vec![("", ResponseSpec::ok(tensor_response()))]).await;
    let client = ambassador_client(&server.addr);

    let payload = Payload::Array(ndarray_payload(&[1, 2], &[0.1, 0.2]));
    let result = client
        .predict(
            Some(payload),
            Some(vec!["a".to_string(), "b".to_string()]),
            CallOptions::default(),
        )
        .await
        .unwrap();
    assert!(result.success);

    let body = server.requests()[0].json_body();
    assert_eq!(body["data"]["names"], json!(["a", "b"]));
}

#[tokio::test]
async fn test_predict_rest_json_data_ambassador() {
    let doc = json!({"test": [0.25, 1.5]});
    let server =
        MockServer::start(vec![("", ResponseSpec::ok(json!({"jsonData": doc.clone()})))]).await;
    let client = ambassador_client(&server.addr);

    let result = client
        .predict(Some(Payload::Json(doc.clone())), None, CallOptions::default())
        .await
        .unwrap();
    assert!(result.success);

    // jsonData rides at the top level of the body, not under data.
    let body = server.requests()[0].json_body();
    assert_eq!(body["jsonData"], doc);
    assert!(body.get("data").is_none());

    let response = result.response.unwrap();
    assert!(matches!(response.data_oneof, Some(DataOneof::JsonData(_))));
}

#[tokio::test]
async fn test_predict_rest_json_data_seldon_gateway_sends_bearer() {
    let doc = json!({"test": [0.25, 1.5]});
    let server = MockServer::start(vec![
        ("/oauth/token", token_response("1234")),
        ("", ResponseSpec::ok(json!({"jsonData": doc.clone()}))),
    ])
    .await;
    let client = seldon_client_for(&server.addr);

    let result = client
        .predict(Some(Payload::Json(doc.clone())), None, CallOptions::default())
        .await
        .unwrap();
    assert!(result.success, "unexpected failure: {}", result.msg);

    assert_eq!(server.requests_to("/oauth/token").len(), 1);
    let calls = server.requests_to("/api/v1.0/predict");
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].header("authorization"), Some("Bearer 1234"));
    assert_eq!(calls[0].json_body()["jsonData"], doc);
}

#[tokio::test]
async fn test_predict_rest_honors_gateway_prefix_override() {
    let server = MockServer::start(vec![("", ResponseSpec::ok(tensor_response()))]).await;
    let client = ambassador_client(&server.addr);

    let result = client
        .predict(
            None,
            None,
            CallOptions::default().gateway_prefix("/mycompany/ml"),
        )
        .await
        .unwrap();
    assert!(result.success);
    assert_eq!(
        server.requests()[0].path,
        "/mycompany/ml/seldon/mymodel/api/v1.0/predict"
    );
}

#[tokio::test]
async fn test_concurrent_predicts_share_one_token_fetch() {
    let server = MockServer::start(vec![
        ("/oauth/token", token_response("1234")),
        ("", ResponseSpec::ok(tensor_response())),
    ])
    .await;
    let client = Arc::new(seldon_client_for(&server.addr));

    let mut handles = Vec::new();
    for _ in 0..8 {
        let client = client.clone();
        handles.push(tokio::spawn(async move {
            client.predict(None, None, CallOptions::default()).await.unwrap()
        }));
    }
    for handle in handles {
        let result = handle.await.unwrap();
        assert!(result.success, "unexpected failure: {}", result.msg);
    }

    assert_eq!(server.requests_to("/oauth/token").len(), 1);
    assert_eq!(server.requests_to("/api/v1.0/predict").len(), 8);
}

#[tokio::test]
async fn test_token_fetch_failure_is_captured_in_envelope() {
    let server = MockServer::start(vec![
        (
            "/oauth/token",
            ResponseSpec {
                status: 500,
                body: json!({}),
            },
        ),
        ("", ResponseSpec::ok(tensor_response())),
    ])
    .await;
    let client = seldon_client_for(&server.addr);

    let result = client.predict(None, None, CallOptions::default()).await.unwrap();
    assert!(!result.success);
    assert!(result.msg.contains("Token endpoint returned 500"), "msg: {}", result.msg);
    // The gateway itself must never have been called.
    assert!(server.requests_to("/api/v1.0/predict").is_empty());
}

#[tokio::test]
async fn test_explain_rest_wraps_non_message_bodies() {
    // Explainers answer arbitrary JSON; the client must not force it
    // through the strict message codec.
    let explanation = json!({"anchors": ["f0 > 0.5"], "coverage": 0.9});
    let server = MockServer::start(vec![("", ResponseSpec::ok(explanation.clone()))]).await;
    let client = ambassador_client(&server.addr);

    let result = client.explain(None, CallOptions::default()).await.unwrap();
    assert!(result.success);
    assert_eq!(server.requests()[0].path, "/seldon/mymodel/api/v1.0/explain");

    let response = result.response.unwrap();
    let Some(DataOneof::JsonData(_)) = &response.data_oneof else {
        panic!("explain response must be carried as jsonData");
    };
    assert_eq!(
        seldon_client::payload::decode(&response).unwrap(),
        Payload::Json(explanation)
    );
}

#[tokio::test]
async fn test_feedback_rest_posts_pair_and_reward() {
    let server = MockServer::start(vec![("", ResponseSpec::ok(tensor_response()))]).await;
    let client = ambassador_client(&server.addr);

    let request = seldon_client::payload::encode(&Payload::Str("in".into()), None);
    let response = seldon_client::payload::encode(&Payload::Str("out".into()), None);
    let result = client
        .feedback(request, response, 1.0, CallOptions::default())
        .await
        .unwrap();
    assert!(result.success);

    let recorded = server.requests();
    assert_eq!(recorded[0].path, "/seldon/mymodel/api/v1.0/send-feedback");
    let body = recorded[0].json_body();
    assert_eq!(body["request"]["strData"], json!("in"));
    assert_eq!(body["response"]["strData"], json!("out"));
    assert_eq!(body["reward"], json!(1.0));
}

#[tokio::test]
async fn test_undecodable_predict_response_fails_the_envelope() {
    let server =
        MockServer::start(vec![("", ResponseSpec::ok(json!({"unexpected": true})))]).await;
    let client = ambassador_client(&server.addr);

    let result = client.predict(None, None, CallOptions::default()).await.unwrap();
    assert!(!result.success);
    assert!(result.msg.contains("Failed to decode response"), "msg: {}", result.msg);
}

fn ndarray_payload(shape: &[usize], values: &[f64]) -> ndarray::ArrayD<f64> {
    ndarray::ArrayD::from_shape_vec(ndarray::IxDyn(shape), values.to_vec()).unwrap()
}
