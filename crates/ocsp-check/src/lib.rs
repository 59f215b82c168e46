//! OCSP Revocation Checks
//!
//! This crate asks a certificate's OCSP responder (RFC 6960) whether the
//! certificate is revoked, and evaluates how reliably that responder answers.
//!
//! # Features
//!
//! - OCSP request encoding and signed response validation, including
//!   delegated responders
//! - Precertificate support: only the issuer's subject and key are needed
//! - HTTP POST transport with a 10 second ceiling, caller deadlines and
//!   cancellation
//! - Pluggable HTTP client, with a shared `reqwest` client by default
//! - Evaluation records for responder monitoring
//!
//! # Example
//!
//! ```rust,no_run
//! use ocsp_check::{evaluate, Config, Context};
//!
//! # async fn demo(leaf: &[u8], issuer_subject: &[u8], issuer_spki: &[u8]) {
//! let config = Config::default().with_user_agent("ocsp-monitor/1.0");
//! let evaluation = evaluate(
//!     &Context::background(),
//!     leaf,
//!     issuer_subject,
//!     issuer_spki,
//!     Some(&config),
//! )
//! .await;
//!
//! match &evaluation.error {
//!     None => println!("answered in {:?}", evaluation.response_time),
//!     Some(err) => eprintln!("{} stage failed: {}", err.stage(), err),
//! }
//! # }
//! ```

pub mod cert;
pub mod check;
pub mod codec;
pub mod config;
pub mod context;
pub mod error;
pub mod evaluate;
pub mod http;
pub mod request;
pub mod response;
pub mod transport;

#[cfg(test)]
mod test_support;

pub use cert::{parse_certificate, Certificate, IssuerStub, KeyKind};
pub use check::{check_cert, check_raw_cert};
pub use codec::{CertificateStatus, CodecError, OcspResponseStatus};
pub use config::{ClientSettings, Config, ConfigError};
pub use context::{CancelHandle, Context, ContextError};
pub use error::{BoxError, OcspError, ParseTarget, Stage, TransportError};
pub use evaluate::{evaluate, Evaluation};
pub use http::{default_client, HttpClient, HttpPost, HttpReply, ReqwestHttpClient};
pub use request::{create_request, responder_url, OcspRequest};
pub use response::{check_response, CheckOutcome};
pub use transport::{query, QUERY_TIMEOUT};
