//! OCSP request construction

use crate::cert::{Certificate, IssuerStub};
use crate::codec;
use crate::error::OcspError;
use tracing::debug;

/// A DER-encoded OCSP request and the responder it is meant for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OcspRequest {
    responder_url: String,
    bytes: Vec<u8>,
}

impl OcspRequest {
    pub fn responder_url(&self) -> &str {
        &self.responder_url
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_parts(self) -> (String, Vec<u8>) {
        (self.responder_url, self.bytes)
    }
}

/// First `http://` OCSP responder URL of the certificate.
///
/// `https://` responders are skipped: the response is signed, and OCSP is
/// served over plain HTTP.
pub fn responder_url<'c>(cert: &'c Certificate<'_>) -> Option<&'c str> {
    cert.ocsp_responders()
        .into_iter()
        .find(|url| url.starts_with("http://"))
}

/// Build the OCSP request for `cert`.
///
/// Fails with [`OcspError::NoCheck`] for OCSP responder certificates carrying
/// the OCSP No Check extension, and with [`OcspError::NoResponder`] when the
/// certificate has no `http://` responder.
pub fn create_request(cert: &Certificate<'_>, issuer: &IssuerStub<'_>) -> Result<OcspRequest, OcspError> {
    if cert.is_ocsp_responder() && cert.has_ocsp_no_check() {
        return Err(OcspError::NoCheck);
    }
    let responder_url = responder_url(cert).ok_or(OcspError::NoResponder)?;

    let bytes = codec::encode_request(cert, issuer).map_err(OcspError::RequestEncoding)?;
    debug!(
        responder = responder_url,
        serial = %cert.serial_hex(),
        issuer_key = %issuer.key_kind(),
        len = bytes.len(),
        "built OCSP request"
    );

    Ok(OcspRequest {
        responder_url: responder_url.to_string(),
        bytes,
    })
}
