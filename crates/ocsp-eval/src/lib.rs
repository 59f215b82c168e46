//! OCSP Responder Evaluation Tool
//!
//! Support code for the `ocsp-eval` binary, which reads a PEM certificate
//! chain on stdin, evaluates the leaf's OCSP responder with
//! [`ocsp_check::evaluate`] and prints the result as JSON.
//!
//! ```text
//! $ cat leaf.pem issuer.pem | ocsp-eval --user-agent ocsp-monitor/1.0
//! {
//!     "error": null,
//!     "request_bytes": "MEMwQTA/MD0wOzAJBgUrDgMCGgUABBS...",
//!     "responder_url": "http://ocsp.example.com",
//!     "response_bytes": "MIIB0woBAKCCAcwwggHIBgkrBgEFBQcwAQEEggG5...",
//!     "response_time": "87.512ms"
//! }
//! ```

pub mod chain;
pub mod report;

pub use chain::{read_chain, ChainError, EvaluationInput};
pub use report::EvaluationReport;
