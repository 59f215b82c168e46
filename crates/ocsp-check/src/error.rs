//! Error types for OCSP checks and evaluations

use crate::codec::CodecError;
use reqwest::StatusCode;
use std::fmt;
use thiserror::Error;

/// Boxed error produced by an [`HttpClient`](crate::http::HttpClient) implementation.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// What failed to parse in [`parse_certificate`](crate::cert::parse_certificate).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseTarget {
    /// The (pre)certificate being checked
    Certificate,
    /// The issuer's SubjectPublicKeyInfo
    IssuerPublicKey,
}

impl fmt::Display for ParseTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseTarget::Certificate => f.write_str("certificate"),
            ParseTarget::IssuerPublicKey => f.write_str("issuer public key"),
        }
    }
}

/// Pipeline stage an error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Certificate and issuer key parsing
    Parse,
    /// Responder selection and request encoding
    Request,
    /// HTTP exchange with the responder
    Query,
    /// Response validation and status mapping
    Check,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Parse => "parse",
            Stage::Request => "request",
            Stage::Query => "query",
            Stage::Check => "check",
        };
        f.write_str(name)
    }
}

/// Errors raised while talking to the responder, before any HTTP status is known.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The responder URL could not be parsed
    #[error("invalid OCSP responder URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// A configured header value is not valid in HTTP
    #[error("invalid {name} header value")]
    InvalidHeader { name: &'static str },

    /// The HTTP client failed (DNS, connect, TLS, body read)
    #[error("{0}")]
    Http(#[source] BoxError),

    /// The query deadline elapsed
    #[error("deadline exceeded")]
    DeadlineExceeded,

    /// The caller cancelled the query
    #[error("context cancelled")]
    Cancelled,
}

/// Errors returned by the OCSP pipeline.
#[derive(Debug, Error)]
pub enum OcspError {
    /// Malformed certificate or issuer public key encoding
    #[error("unable to parse {target}: {reason}")]
    Parse { target: ParseTarget, reason: String },

    /// The certificate has no `http://` OCSP responder URL
    #[error("certificate does not contain an HTTP OCSP responder URL")]
    NoResponder,

    /// The certificate is an OCSP responder certificate with the OCSP No Check extension
    #[error("certificate is an OCSP responder certificate with the OCSP No Check extension")]
    NoCheck,

    /// The request could not be encoded for this certificate/issuer pair
    #[error("error creating OCSP request: {0}")]
    RequestEncoding(#[source] CodecError),

    /// Network, timeout or cancellation failure
    #[error("error querying OCSP responder over HTTP: {0}")]
    Transport(#[source] TransportError),

    /// The responder answered with a status other than 200
    #[error("HTTP error from OCSP responder: {status}")]
    ResponderHttp { status: StatusCode },

    /// The responder answered with the wrong Content-Type
    #[error("HTTP response header has invalid Content-Type value {content_type:?}")]
    InvalidContentType { content_type: String },

    /// The response failed structural or signature validation
    #[error("error parsing OCSP response: {0}")]
    ResponseParse(#[source] CodecError),

    /// The responder returned neither good nor revoked
    #[error("OCSP responder does not know this certificate")]
    UnknownStatus,
}

impl OcspError {
    /// Stage of the pipeline that produced this error.
    pub fn stage(&self) -> Stage {
        match self {
            OcspError::Parse { .. } => Stage::Parse,
            OcspError::NoResponder | OcspError::NoCheck | OcspError::RequestEncoding(_) => {
                Stage::Request
            }
            OcspError::Transport(_)
            | OcspError::ResponderHttp { .. }
            | OcspError::InvalidContentType { .. } => Stage::Query,
            OcspError::ResponseParse(_) | OcspError::UnknownStatus => Stage::Check,
        }
    }

    /// Whether repeating the same check later could plausibly succeed.
    ///
    /// Cancellation is not transient: the caller asked to stop.
    pub fn is_transient(&self) -> bool {
        match self {
            OcspError::Transport(TransportError::Cancelled) => false,
            OcspError::Transport(TransportError::InvalidUrl { .. })
            | OcspError::Transport(TransportError::InvalidHeader { .. }) => false,
            OcspError::Transport(_) => true,
            OcspError::ResponderHttp { status } => {
                status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS
            }
            _ => false,
        }
    }
}

impl From<TransportError> for OcspError {
    fn from(err: TransportError) -> Self {
        OcspError::Transport(err)
    }
}
