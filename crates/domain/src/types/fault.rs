//! Structured fault bodies returned on non-success responses
//!
//! ```json
//! {"Fault":{"Error":[{"Message":"Object Not Found","Detail":"...","code":"610","element":""}],"type":"ValidationFault"},"time":"..."}
//! ```
//! Batch items carry the inner `Fault` object without the envelope.

use serde::{Deserialize, Serialize};

use crate::errors::RequestFailure;

/// Top-level error response body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaultEnvelope {
    #[serde(rename = "Fault")]
    pub fault: Fault,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Fault {
    #[serde(rename = "Error", default)]
    pub errors: Vec<FaultError>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub fault_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FaultError {
    #[serde(rename = "Message", default)]
    pub message: String,
    #[serde(rename = "Detail", default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element: Option<String>,
}

impl Fault {
    pub fn first(&self) -> Option<&FaultError> {
        self.errors.first()
    }

    /// Describe this fault as a request failure with the given status.
    ///
    /// Fields come from the first `Error` entry only.
    pub fn to_request_failure(&self, status: u16) -> RequestFailure {
        let first = self.first().cloned().unwrap_or_default();
        RequestFailure {
            status,
            fault_code: first.code,
            element: first.element,
            message: first.message,
            detail: first.detail,
            fault_type: self.fault_type.clone(),
        }
    }
}

impl std::fmt::Display for Fault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self
            .errors
            .iter()
            .map(|e| {
                format!(
                    "{}/{}: {}",
                    e.code.as_deref().unwrap_or_default(),
                    e.element.as_deref().unwrap_or_default(),
                    e.message
                )
            })
            .collect();
        write!(f, "faults: {}", parts.join("; "))
    }
}
