//! Interpretation of OCSP responses

use crate::cert::{Certificate, IssuerStub};
use crate::codec::{self, CertificateStatus};
use crate::error::OcspError;
use chrono::{DateTime, Utc};
use tracing::debug;

/// Revocation state of a certificate according to its responder.
///
/// A revocation time is present exactly when the certificate is revoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckOutcome {
    revoked: bool,
    revocation_time: Option<DateTime<Utc>>,
}

impl CheckOutcome {
    pub fn good() -> Self {
        Self {
            revoked: false,
            revocation_time: None,
        }
    }

    pub fn revoked(at: DateTime<Utc>) -> Self {
        Self {
            revoked: true,
            revocation_time: Some(at),
        }
    }

    pub fn is_revoked(&self) -> bool {
        self.revoked
    }

    pub fn revocation_time(&self) -> Option<DateTime<Utc>> {
        self.revocation_time
    }
}

/// Validate `response` for `cert` and `issuer` and report whether it is revoked.
///
/// A response that is well formed but reports neither good nor revoked is an
/// [`OcspError::UnknownStatus`].
pub fn check_response(
    cert: &Certificate<'_>,
    issuer: &IssuerStub<'_>,
    response: &[u8],
) -> Result<CheckOutcome, OcspError> {
    let parsed = codec::parse_response_for_cert(response, cert, issuer)
        .map_err(OcspError::ResponseParse)?;
    debug!(
        serial = %cert.serial_hex(),
        signer = ?parsed.signer,
        produced_at = %parsed.produced_at,
        status = ?parsed.status,
        "validated OCSP response"
    );

    match parsed.status {
        CertificateStatus::Good => Ok(CheckOutcome::good()),
        CertificateStatus::Revoked {
            revocation_time, ..
        } => Ok(CheckOutcome::revoked(revocation_time)),
        CertificateStatus::Unknown => Err(OcspError::UnknownStatus),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{CodecError, OcspResponseStatus};
    use crate::test_support::{fixture, issuer_parts, pem_der};

    fn check(leaf: &str, issuer: &str, response: &[u8]) -> Result<CheckOutcome, OcspError> {
        let der = pem_der(leaf);
        let (subject, spki) = issuer_parts(issuer);
        let cert = Certificate::from_der(&der).expect("leaf");
        let issuer = IssuerStub::from_parts(&subject, &spki).expect("issuer");
        check_response(&cert, &issuer, response)
    }

    #[test]
    fn test_good() {
        let outcome = check("leaf-good.pem", "ca.pem", &fixture("resp-good.der")).unwrap();
        assert!(!outcome.is_revoked());
        assert_eq!(outcome.revocation_time(), None);
        assert_eq!(outcome, CheckOutcome::good());
    }

    #[test]
    fn test_revoked_carries_time() {
        let outcome = check("leaf-revoked.pem", "ca.pem", &fixture("resp-revoked.der")).unwrap();
        assert!(outcome.is_revoked());
        let at = outcome.revocation_time().expect("revocation time");
        assert_eq!(at.timestamp(), 1_710_504_000);
    }

    #[test]
    fn test_ec_issuer_revoked() {
        let outcome =
            check("ec-leaf.pem", "ec-ca.pem", &fixture("resp-ec-revoked.der")).unwrap();
        assert!(outcome.is_revoked());
        assert_eq!(outcome.revocation_time().map(|t| t.timestamp()), Some(1_735_689_600));
    }

    #[test]
    fn test_unknown_status() {
        let err = check("leaf-unknown.pem", "ca.pem", &fixture("resp-unknown.der")).unwrap_err();
        assert!(matches!(err, OcspError::UnknownStatus));
    }

    #[test]
    fn test_precertificate_good() {
        let outcome = check("precert.pem", "ca.pem", &fixture("resp-precert.der")).unwrap();
        assert!(!outcome.is_revoked());
    }

    #[test]
    fn test_delegated_responder() {
        let outcome = check("leaf-good.pem", "ca.pem", &fixture("resp-delegated.der")).unwrap();
        assert!(!outcome.is_revoked());
    }

    #[test]
    fn test_response_for_other_certificate() {
        let err = check("leaf-revoked.pem", "ca.pem", &fixture("resp-good.der")).unwrap_err();
        assert!(matches!(
            err,
            OcspError::ResponseParse(CodecError::NoMatchingResponse(_))
        ));
    }

    #[test]
    fn test_try_later() {
        // OCSPResponse { responseStatus tryLater }
        let err = check("leaf-good.pem", "ca.pem", &[0x30, 0x03, 0x0a, 0x01, 0x03]).unwrap_err();
        assert!(matches!(
            err,
            OcspError::ResponseParse(CodecError::Responder(OcspResponseStatus::TryLater))
        ));
    }

    #[test]
    fn test_garbage() {
        let err = check("leaf-good.pem", "ca.pem", b"<html>oops</html>").unwrap_err();
        assert!(matches!(err, OcspError::ResponseParse(_)));
        assert_eq!(err.stage(), crate::error::Stage::Check);
    }
}
