//! Result envelopes returned to every caller regardless of transport.
//!
//! `success == false` always comes with a diagnostic `msg` and no
//! `response`; network-origin failures land here instead of being
//! raised.

use crate::proto::{Feedback, SeldonMessage, SeldonMessageList};

/// Envelope for single-message calls (predict, explain, microservice
/// stages).
#[derive(Debug, Clone)]
pub struct SeldonClientPrediction {
    pub success: bool,
    pub msg: String,
    /// The wire message that was sent, when one was built.
    pub request: Option<SeldonMessage>,
    /// The decoded response; absent on failure.
    pub response: Option<SeldonMessage>,
}

impl SeldonClientPrediction {
    pub(crate) fn ok(request: SeldonMessage, response: SeldonMessage) -> Self {
        Self {
            success: true,
            msg: String::new(),
            request: Some(request),
            response: Some(response),
        }
    }

    pub(crate) fn fail(request: Option<SeldonMessage>, msg: String) -> Self {
        Self {
            success: false,
            msg,
            request,
            response: None,
        }
    }
}

impl std::fmt::Display for SeldonClientPrediction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Success:{} message:{}\nRequest:\n{:?}\nResponse:\n{:?}",
            self.success, self.msg, self.request, self.response
        )
    }
}

/// What a combine-style call sent: a feedback pair or a message list.
#[derive(Debug, Clone)]
pub enum CombineRequest {
    Feedback(Feedback),
    List(SeldonMessageList),
}

/// Envelope for calls that touch more than one message (feedback,
/// aggregate).
#[derive(Debug, Clone)]
pub struct SeldonClientCombine {
    pub success: bool,
    pub msg: String,
    pub request: Option<CombineRequest>,
    pub response: Option<SeldonMessage>,
}

impl SeldonClientCombine {
    pub(crate) fn ok(request: CombineRequest, response: SeldonMessage) -> Self {
        Self {
            success: true,
            msg: String::new(),
            request: Some(request),
            response: Some(response),
        }
    }

    pub(crate) fn fail(request: Option<CombineRequest>, msg: String) -> Self {
        Self {
            success: false,
            msg,
            request,
            response: None,
        }
    }
}

impl std::fmt::Display for SeldonClientCombine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Success:{} message:{}\nRequest:\n{:?}\nResponse:\n{:?}",
            self.success, self.msg, self.request, self.response
        )
    }
}
