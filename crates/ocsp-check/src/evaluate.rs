//! Responder reliability evaluation
//!
//! [`evaluate`] runs the whole pipeline for one certificate and records what
//! happened instead of failing: which responder was asked, what was sent,
//! what came back and how long the responder took to answer. The record is
//! meant for monitoring responders, so every field that could be filled in
//! before the first failure is kept.
//!
//! ```text
//! Start -> Parsed -> RequestBuilt -> Queried -> Checked
//!   \________\___________\____________\-------> Failed(stage)
//! ```

use crate::cert::parse_certificate;
use crate::config::Config;
use crate::context::Context;
use crate::error::{OcspError, Stage};
use crate::request::create_request;
use crate::response::check_response;
use crate::transport::query;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Result of evaluating a responder.
///
/// `error` is `None` exactly when the responder URL, request and response
/// are all present. `response_time` covers the HTTP exchange only and stays
/// zero unless a response body was received.
#[derive(Debug, Default)]
pub struct Evaluation {
    pub responder_url: Option<String>,
    pub request_bytes: Option<Vec<u8>>,
    pub response_bytes: Option<Vec<u8>>,
    pub response_time: Duration,
    pub error: Option<OcspError>,
}

impl Evaluation {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Stage that produced the error, if any.
    pub fn failed_stage(&self) -> Option<Stage> {
        self.error.as_ref().map(OcspError::stage)
    }

    fn fail(mut self, err: OcspError) -> Self {
        warn!(
            responder = self.responder_url.as_deref().unwrap_or("-"),
            stage = %err.stage(),
            error = %err,
            "OCSP evaluation failed"
        );
        self.error = Some(err);
        self
    }
}

/// Evaluate the OCSP responder of `cert_der`.
///
/// `issuer_subject` and `issuer_spki` are the raw subject and
/// SubjectPublicKeyInfo of the certificate's issuer. When `cert_der` is a
/// precertificate they must belong to the issuer of the final certificate.
/// With no `config`, the shared default HTTP client is used and no
/// User-Agent is sent.
pub async fn evaluate(
    ctx: &Context,
    cert_der: &[u8],
    issuer_subject: &[u8],
    issuer_spki: &[u8],
    config: Option<&Config>,
) -> Evaluation {
    let default_config;
    let config = match config {
        Some(config) => config,
        None => {
            default_config = Config::default();
            &default_config
        }
    };
    let mut evaluation = Evaluation::default();

    let (cert, issuer) = match parse_certificate(cert_der, issuer_subject, issuer_spki) {
        Ok(parsed) => parsed,
        Err(err) => return evaluation.fail(err),
    };

    let request = match create_request(&cert, &issuer) {
        Ok(request) => request,
        Err(err) => return evaluation.fail(err),
    };
    let (responder_url, request_bytes) = request.into_parts();

    let client = config.http_client();
    let start = Instant::now();
    let result = query(
        ctx,
        &responder_url,
        &request_bytes,
        client.as_ref(),
        config.user_agent(),
    )
    .await;
    let elapsed = start.elapsed();
    evaluation.responder_url = Some(responder_url);
    evaluation.request_bytes = Some(request_bytes);

    let response_bytes = match result {
        Ok(body) => body,
        Err(err) => return evaluation.fail(err),
    };
    evaluation.response_time = elapsed;

    let checked = check_response(&cert, &issuer, &response_bytes);
    evaluation.response_bytes = Some(response_bytes);
    match checked {
        Ok(outcome) => {
            debug!(
                responder = evaluation.responder_url.as_deref().unwrap_or("-"),
                revoked = outcome.is_revoked(),
                response_time = ?evaluation.response_time,
                "OCSP evaluation succeeded"
            );
            evaluation
        }
        Err(err) => evaluation.fail(err),
    }
}
