//! JSON rendering of evaluations

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use ocsp_check::Evaluation;
use serde::{Deserialize, Serialize};
use serde_json::ser::PrettyFormatter;
use serde_json::Serializer;

/// Serializable form of an [`Evaluation`].
///
/// Byte fields are standard base64 and `response_time` is a `Debug` rendering
/// of the duration such as `"245.8ms"`. Fields are in alphabetical order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub error: Option<String>,
    pub request_bytes: Option<String>,
    pub responder_url: Option<String>,
    pub response_bytes: Option<String>,
    pub response_time: String,
}

impl From<&Evaluation> for EvaluationReport {
    fn from(evaluation: &Evaluation) -> Self {
        Self {
            error: evaluation.error.as_ref().map(ToString::to_string),
            request_bytes: evaluation.request_bytes.as_ref().map(|b| STANDARD.encode(b)),
            responder_url: evaluation.responder_url.clone(),
            response_bytes: evaluation.response_bytes.as_ref().map(|b| STANDARD.encode(b)),
            response_time: format!("{:?}", evaluation.response_time),
        }
    }
}

impl EvaluationReport {
    /// Tab-indented JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        let mut out = Vec::new();
        let mut serializer = Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(b"\t"));
        self.serialize(&mut serializer)?;
        // serde_json only writes valid UTF-8
        Ok(String::from_utf8_lossy(&out).into_owned())
    }
}
