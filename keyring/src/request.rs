// Copyright (c) 2024 The Botho Foundation

//! Signing requests and submission outcomes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The JSON-RPC-shaped signing call carried by a request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SigningRequest {
    /// Signing method name, e.g. `personal_sign`
    pub method: String,

    /// Method parameters, usually a positional array
    #[serde(default)]
    pub params: Value,
}

/// A submitted signing request, pending until approved or rejected.
///
/// A request leaves the queue exactly once, through approve or reject;
/// its id is never reused afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyringRequest {
    /// Opaque unique identifier
    pub id: String,

    /// The requesting context, e.g. the origin of the calling site
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,

    /// The signing call to perform on approval
    pub request: SigningRequest,
}

/// The outcome of submitting a signing request.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Queued for a later explicit approve or reject (asynchronous mode)
    Pending,

    /// Resolved inline with the signing result (synchronous mode)
    Complete(Value),
}

impl SubmitOutcome {
    /// Whether the request was queued rather than resolved inline.
    pub fn is_pending(&self) -> bool {
        matches!(self, SubmitOutcome::Pending)
    }
}
