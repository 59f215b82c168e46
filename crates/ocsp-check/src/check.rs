//! One-shot revocation checks

use crate::cert::{parse_certificate, Certificate, IssuerStub};
use crate::context::Context;
use crate::error::OcspError;
use crate::http::HttpClient;
use crate::request::create_request;
use crate::response::{check_response, CheckOutcome};
use crate::transport::query;

/// Ask the certificate's responder whether `cert` is revoked.
///
/// No User-Agent is sent. Errors from each step are returned unchanged.
pub async fn check_cert(
    ctx: &Context,
    cert: &Certificate<'_>,
    issuer: &IssuerStub<'_>,
    client: &dyn HttpClient,
) -> Result<CheckOutcome, OcspError> {
    let request = create_request(cert, issuer)?;
    let response = query(ctx, request.responder_url(), request.bytes(), client, None).await?;
    check_response(cert, issuer, &response)
}

/// [`check_cert`] on raw certificate bytes and raw issuer subject and key.
pub async fn check_raw_cert(
    ctx: &Context,
    cert_der: &[u8],
    issuer_subject: &[u8],
    issuer_spki: &[u8],
    client: &dyn HttpClient,
) -> Result<CheckOutcome, OcspError> {
    let (cert, issuer) = parse_certificate(cert_der, issuer_subject, issuer_spki)?;
    check_cert(ctx, &cert, &issuer, client).await
}
