//! Payload codec: application payloads <-> wire messages <-> wire JSON.
//!
//! Three conversions live here:
//! - [`encode`]/[`decode`] between the application-side [`Payload`] sum
//!   type and the canonical [`SeldonMessage`];
//! - [`message_to_json`]/[`json_to_message`] between a wire message and
//!   its REST JSON form (`data.tensor.{shape,values}` + `data.names`,
//!   top-level `jsonData`/`strData`/`binData`);
//! - the JSON forms of [`Feedback`] and [`SeldonMessageList`] used by
//!   the feedback and aggregate endpoints.
//!
//! Tensor payloads are `ndarray::ArrayD<f64>`, flattened in row-major
//! order. The codec is schema-agnostic for JSON documents and never
//! silently drops data: unrecognized fields in the JSON form are an
//! error, not a skip.

use std::collections::HashMap;

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use ndarray::{ArrayD, IxDyn};
use rand::Rng as _;
use serde_json::{Value, json};

use crate::proto::{
    DefaultData, Feedback, Meta, SeldonMessage, SeldonMessageList, Tensor,
    seldon_message::DataOneof,
};

/// Application-level payload shapes accepted and returned by the client.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// N-dimensional numeric array, IEEE double precision.
    Array(ArrayD<f64>),
    /// Arbitrary JSON document; no schema validation is performed.
    Json(Value),
    Str(String),
    Bytes(Vec<u8>),
}

impl Payload {
    /// Random tensor payload used when a smoke call passes no data.
    pub fn random(shape: &[usize]) -> Self {
        let mut rng = rand::rng();
        let len = shape.iter().product();
        let values: Vec<f64> = (0..len).map(|_| rng.random::<f64>()).collect();
        let array = ArrayD::from_shape_vec(IxDyn(shape), values)
            .expect("generated value count matches shape product");
        Payload::Array(array)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PayloadError {
    #[error("Tensor shape {shape:?} implies {expected} values, got {actual}")]
    ShapeValueMismatch {
        shape: Vec<i64>,
        expected: usize,
        actual: usize,
    },

    #[error("Tensor shape entries must be positive, got {0}")]
    InvalidDimension(i64),

    #[error("Unrecognized field '{0}' in message JSON")]
    UnknownField(String),

    #[error("Message JSON carries no payload field")]
    MissingPayload,

    #[error("Invalid base64 in binData: {0}")]
    InvalidBase64(String),

    #[error("Invalid '{field}' field: {reason}")]
    InvalidField { field: String, reason: String },
}

pub type PayloadResult<T> = Result<T, PayloadError>;

/// Encode an application payload into the canonical wire message.
///
/// Total over all payload shapes. `names` labels tensor columns and is
/// ignored for non-tensor payloads.
pub fn encode(payload: &Payload, names: Option<&[String]>) -> SeldonMessage {
    let data_oneof = match payload {
        Payload::Array(array) => {
            let tensor = Tensor {
                shape: array.shape().iter().map(|&d| d as i32).collect(),
                values: array.iter().copied().collect(),
            };
            DataOneof::Data(DefaultData {
                names: names.map(<[String]>::to_vec).unwrap_or_default(),
                tensor: Some(tensor),
            })
        }
        Payload::Json(value) => DataOneof::JsonData(json_value_to_pb(value)),
        Payload::Str(s) => DataOneof::StrData(s.clone()),
        Payload::Bytes(b) => DataOneof::BinData(b.clone()),
    };
    SeldonMessage {
        meta: None,
        data_oneof: Some(data_oneof),
    }
}

/// Decode a wire message back into an application payload.
///
/// Exact inverse of [`encode`]: `decode(&encode(p, _)) == p` for every
/// payload shape.
pub fn decode(message: &SeldonMessage) -> PayloadResult<Payload> {
    match &message.data_oneof {
        Some(DataOneof::Data(data)) => {
            let tensor = data.tensor.as_ref().ok_or_else(|| PayloadError::InvalidField {
                field: "data".into(),
                reason: "missing tensor".into(),
            })?;
            let shape = checked_shape(tensor.shape.iter().map(|&d| d as i64))?;
            let expected: usize = shape.iter().product();
            if expected != tensor.values.len() {
                return Err(PayloadError::ShapeValueMismatch {
                    shape: shape.iter().map(|&d| d as i64).collect(),
                    expected,
                    actual: tensor.values.len(),
                });
            }
            let array = ArrayD::from_shape_vec(IxDyn(&shape), tensor.values.clone())
                .expect("value count checked against shape product");
            Ok(Payload::Array(array))
        }
        Some(DataOneof::JsonData(value)) => Ok(Payload::Json(pb_value_to_json(value))),
        Some(DataOneof::StrData(s)) => Ok(Payload::Str(s.clone())),
        Some(DataOneof::BinData(b)) => Ok(Payload::Bytes(b.clone())),
        None => Err(PayloadError::MissingPayload),
    }
}

/// Render a wire message as its REST JSON form.
///
/// Tensor payloads nest under `data`; JSON documents sit at the top
/// level as `jsonData`. The serving protocol requires this asymmetry.
pub fn message_to_json(message: &SeldonMessage) -> Value {
    let mut out = serde_json::Map::new();
    if let Some(meta) = &message.meta {
        out.insert("meta".into(), meta_to_json(meta));
    }
    match &message.data_oneof {
        Some(DataOneof::Data(data)) => {
            let mut body = serde_json::Map::new();
            if !data.names.is_empty() {
                body.insert("names".into(), json!(data.names));
            }
            if let Some(tensor) = &data.tensor {
                body.insert(
                    "tensor".into(),
                    json!({"shape": tensor.shape, "values": tensor.values}),
                );
            }
            out.insert("data".into(), Value::Object(body));
        }
        Some(DataOneof::JsonData(value)) => {
            out.insert("jsonData".into(), pb_value_to_json(value));
        }
        Some(DataOneof::StrData(s)) => {
            out.insert("strData".into(), Value::String(s.clone()));
        }
        Some(DataOneof::BinData(b)) => {
            out.insert("binData".into(), Value::String(BASE64.encode(b)));
        }
        None => {}
    }
    Value::Object(out)
}

/// Parse the REST JSON form back into a wire message.
///
/// Recognizes every payload shape [`message_to_json`] can emit; any
/// other field is an error rather than silently dropped.
pub fn json_to_message(value: &Value) -> PayloadResult<SeldonMessage> {
    let obj = value.as_object().ok_or_else(|| PayloadError::InvalidField {
        field: "message".into(),
        reason: "expected a JSON object".into(),
    })?;

    let mut meta = None;
    let mut data_oneof = None;
    for (key, field) in obj {
        let parsed = match key.as_str() {
            "meta" => {
                meta = Some(json_to_meta(field)?);
                continue;
            }
            "data" => DataOneof::Data(json_to_default_data(field)?),
            "jsonData" => DataOneof::JsonData(json_value_to_pb(field)),
            "strData" => DataOneof::StrData(
                field
                    .as_str()
                    .ok_or_else(|| PayloadError::InvalidField {
                        field: "strData".into(),
                        reason: "expected a string".into(),
                    })?
                    .to_string(),
            ),
            "binData" => {
                let encoded = field.as_str().ok_or_else(|| PayloadError::InvalidField {
                    field: "binData".into(),
                    reason: "expected a base64 string".into(),
                })?;
                DataOneof::BinData(
                    BASE64
                        .decode(encoded)
                        .map_err(|e| PayloadError::InvalidBase64(e.to_string()))?,
                )
            }
            other => return Err(PayloadError::UnknownField(other.to_string())),
        };
        if data_oneof.is_some() {
            return Err(PayloadError::InvalidField {
                field: key.clone(),
                reason: "multiple payload fields set; exactly one is allowed".into(),
            });
        }
        data_oneof = Some(parsed);
    }

    if data_oneof.is_none() {
        return Err(PayloadError::MissingPayload);
    }
    Ok(SeldonMessage { meta, data_oneof })
}

/// JSON form of a feedback message: `{"request", "response", "reward"}`.
pub fn feedback_to_json(feedback: &Feedback) -> Value {
    let mut out = serde_json::Map::new();
    if let Some(request) = &feedback.request {
        out.insert("request".into(), message_to_json(request));
    }
    if let Some(response) = &feedback.response {
        out.insert("response".into(), message_to_json(response));
    }
    out.insert("reward".into(), json!(feedback.reward));
    Value::Object(out)
}

pub fn json_to_feedback(value: &Value) -> PayloadResult<Feedback> {
    let obj = value.as_object().ok_or_else(|| PayloadError::InvalidField {
        field: "feedback".into(),
        reason: "expected a JSON object".into(),
    })?;
    let mut feedback = Feedback::default();
    for (key, field) in obj {
        match key.as_str() {
            "request" => feedback.request = Some(json_to_message(field)?),
            "response" => feedback.response = Some(json_to_message(field)?),
            "reward" => {
                feedback.reward =
                    field.as_f64().ok_or_else(|| PayloadError::InvalidField {
                        field: "reward".into(),
                        reason: "expected a number".into(),
                    })? as f32;
            }
            other => return Err(PayloadError::UnknownField(other.to_string())),
        }
    }
    Ok(feedback)
}

/// JSON form of a message list: `{"seldonMessages": [...]}`.
pub fn list_to_json(list: &SeldonMessageList) -> Value {
    json!({
        "seldonMessages": list
            .seldon_messages
            .iter()
            .map(message_to_json)
            .collect::<Vec<_>>(),
    })
}

pub fn json_to_list(value: &Value) -> PayloadResult<SeldonMessageList> {
    let messages = value
        .get("seldonMessages")
        .and_then(Value::as_array)
        .ok_or_else(|| PayloadError::InvalidField {
            field: "seldonMessages".into(),
            reason: "expected an array of messages".into(),
        })?;
    Ok(SeldonMessageList {
        seldon_messages: messages.iter().map(json_to_message).collect::<PayloadResult<_>>()?,
    })
}

fn checked_shape(dims: impl Iterator<Item = i64>) -> PayloadResult<Vec<usize>> {
    dims.map(|d| {
        if d <= 0 {
            Err(PayloadError::InvalidDimension(d))
        } else {
            Ok(d as usize)
        }
    })
    .collect()
}

fn json_to_default_data(value: &Value) -> PayloadResult<DefaultData> {
    let obj = value.as_object().ok_or_else(|| PayloadError::InvalidField {
        field: "data".into(),
        reason: "expected a JSON object".into(),
    })?;

    let mut data = DefaultData::default();
    for (key, field) in obj {
        match key.as_str() {
            "names" => {
                let names = field.as_array().ok_or_else(|| PayloadError::InvalidField {
                    field: "names".into(),
                    reason: "expected an array of strings".into(),
                })?;
                data.names = names
                    .iter()
                    .map(|n| {
                        n.as_str().map(str::to_string).ok_or_else(|| {
                            PayloadError::InvalidField {
                                field: "names".into(),
                                reason: "expected an array of strings".into(),
                            }
                        })
                    })
                    .collect::<PayloadResult<_>>()?;
            }
            "tensor" => {
                let shape = json_number_array(field, "tensor.shape")?;
                let values = json_f64_array(field.get("values"), "tensor.values")?;
                let dims = checked_shape(shape.iter().copied())?;
                let expected: usize = dims.iter().product();
                if expected != values.len() {
                    return Err(PayloadError::ShapeValueMismatch {
                        shape,
                        expected,
                        actual: values.len(),
                    });
                }
                data.tensor = Some(Tensor {
                    shape: dims.iter().map(|&d| d as i32).collect(),
                    values,
                });
            }
            other => return Err(PayloadError::UnknownField(format!("data.{other}"))),
        }
    }

    if data.tensor.is_none() {
        return Err(PayloadError::InvalidField {
            field: "data".into(),
            reason: "missing tensor".into(),
        });
    }
    Ok(data)
}

fn json_number_array(tensor: &Value, field: &str) -> PayloadResult<Vec<i64>> {
    tensor
        .get("shape")
        .and_then(Value::as_array)
        .ok_or_else(|| PayloadError::InvalidField {
            field: field.into(),
            reason: "expected an array of integers".into(),
        })?
        .iter()
        .map(|v| {
            v.as_i64().ok_or_else(|| PayloadError::InvalidField {
                field: field.into(),
                reason: "expected an array of integers".into(),
            })
        })
        .collect()
}

fn json_f64_array(value: Option<&Value>, field: &str) -> PayloadResult<Vec<f64>> {
    value
        .and_then(Value::as_array)
        .ok_or_else(|| PayloadError::InvalidField {
            field: field.into(),
            reason: "expected an array of numbers".into(),
        })?
        .iter()
        .map(|v| {
            v.as_f64().ok_or_else(|| PayloadError::InvalidField {
                field: field.into(),
                reason: "expected an array of numbers".into(),
            })
        })
        .collect()
}

fn meta_to_json(meta: &Meta) -> Value {
    let mut out = serde_json::Map::new();
    if !meta.puid.is_empty() {
        out.insert("puid".into(), Value::String(meta.puid.clone()));
    }
    if !meta.tags.is_empty() {
        out.insert("tags".into(), json!(meta.tags));
    }
    Value::Object(out)
}

fn json_to_meta(value: &Value) -> PayloadResult<Meta> {
    let obj = value.as_object().ok_or_else(|| PayloadError::InvalidField {
        field: "meta".into(),
        reason: "expected a JSON object".into(),
    })?;
    let mut meta = Meta::default();
    for (key, field) in obj {
        match key.as_str() {
            "puid" => {
                meta.puid = field
                    .as_str()
                    .ok_or_else(|| PayloadError::InvalidField {
                        field: "meta.puid".into(),
                        reason: "expected a string".into(),
                    })?
                    .to_string();
            }
            "tags" => {
                let tags = field.as_object().ok_or_else(|| PayloadError::InvalidField {
                    field: "meta.tags".into(),
                    reason: "expected a string map".into(),
                })?;
                meta.tags = tags
                    .iter()
                    .map(|(k, v)| {
                        v.as_str()
                            .map(|s| (k.clone(), s.to_string()))
                            .ok_or_else(|| PayloadError::InvalidField {
                                field: "meta.tags".into(),
                                reason: "expected a string map".into(),
                            })
                    })
                    .collect::<PayloadResult<HashMap<_, _>>>()?;
            }
            other => return Err(PayloadError::UnknownField(format!("meta.{other}"))),
        }
    }
    Ok(meta)
}

/// serde_json -> google.protobuf.Value.
fn json_value_to_pb(value: &Value) -> prost_types::Value {
    use prost_types::value::Kind;
    let kind = match value {
        Value::Null => Kind::NullValue(0),
        Value::Bool(b) => Kind::BoolValue(*b),
        Value::Number(n) => Kind::NumberValue(n.as_f64().unwrap_or(f64::NAN)),
        Value::String(s) => Kind::StringValue(s.clone()),
        Value::Array(items) => Kind::ListValue(prost_types::ListValue {
            values: items.iter().map(json_value_to_pb).collect(),
        }),
        Value::Object(map) => Kind::StructValue(prost_types::Struct {
            fields: map
                .iter()
                .map(|(k, v)| (k.clone(), json_value_to_pb(v)))
                .collect(),
        }),
    };
    prost_types::Value { kind: Some(kind) }
}

/// google.protobuf.Value -> serde_json. Protobuf carries every number as
/// a double, so whole doubles come back as JSON integers.
fn pb_value_to_json(value: &prost_types::Value) -> Value {
    use prost_types::value::Kind;
    match &value.kind {
        None | Some(Kind::NullValue(_)) => Value::Null,
        Some(Kind::BoolValue(b)) => Value::Bool(*b),
        Some(Kind::NumberValue(n)) => {
            if n.is_finite() && n.fract() == 0.0 && n.abs() < 2f64.powi(53) {
                Value::Number((*n as i64).into())
            } else {
                serde_json::Number::from_f64(*n).map(Value::Number).unwrap_or(Value::Null)
            }
        }
        Some(Kind::StringValue(s)) => Value::String(s.clone()),
        Some(Kind::ListValue(list)) => {
            Value::Array(list.values.iter().map(pb_value_to_json).collect())
        }
        Some(Kind::StructValue(st)) => Value::Object(
            st.fields
                .iter()
                .map(|(k, v)| (k.clone(), pb_value_to_json(v)))
                .collect(),
        ),
    }
}
