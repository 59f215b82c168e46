//! Certificate adapter
//!
//! Parses the (pre)certificate being checked and builds an [`IssuerStub`]
//! from nothing more than the issuer's raw subject and SubjectPublicKeyInfo.
//!
//! The issuer material must belong to the issuer of the *final* certificate.
//! A precertificate may be signed by a dedicated precertificate signing CA,
//! but the responder answers for the final issuer.

use crate::error::{OcspError, ParseTarget};
use der_parser::asn1_rs::{oid, Oid};
use std::fmt;
use x509_parser::extensions::{GeneralName, ParsedExtension};
use x509_parser::prelude::*;
use x509_parser::public_key::PublicKey;

/// id-ad-ocsp access method in the Authority Information Access extension
const OID_AD_OCSP: Oid<'static> = oid!(1.3.6.1.5.5.7.48.1);
/// id-pkix-ocsp-nocheck
const OID_OCSP_NOCHECK: Oid<'static> = oid!(1.3.6.1.5.5.7.48.1.5);

const OID_EC_PUBLIC_KEY: Oid<'static> = oid!(1.2.840.10045.2.1);
const OID_CURVE_P256: Oid<'static> = oid!(1.2.840.10045.3.1.7);
const OID_CURVE_P384: Oid<'static> = oid!(1.3.132.0.34);
const OID_CURVE_P521: Oid<'static> = oid!(1.3.132.0.35);
const OID_ED25519: Oid<'static> = oid!(1.3.101.112);

/// A parsed X.509 certificate or precertificate, borrowed from caller bytes.
pub struct Certificate<'a> {
    der: &'a [u8],
    x509: X509Certificate<'a>,
}

impl<'a> Certificate<'a> {
    /// Parse a DER certificate. Trailing bytes after the certificate are rejected.
    pub fn from_der(der: &'a [u8]) -> Result<Self, OcspError> {
        let (rest, x509) = parse_x509_certificate(der).map_err(|e| OcspError::Parse {
            target: ParseTarget::Certificate,
            reason: e.to_string(),
        })?;
        if !rest.is_empty() {
            return Err(OcspError::Parse {
                target: ParseTarget::Certificate,
                reason: format!("{} bytes of trailing data", rest.len()),
            });
        }
        Ok(Self { der, x509 })
    }

    /// Raw DER encoding
    pub fn as_der(&self) -> &'a [u8] {
        self.der
    }

    /// Content bytes of the serial number INTEGER
    pub fn raw_serial(&self) -> &'a [u8] {
        self.x509.raw_serial()
    }

    /// Serial number as colon-separated hex
    pub fn serial_hex(&self) -> String {
        self.x509.raw_serial_as_string()
    }

    /// OCSP responder URIs from the Authority Information Access extension, in order.
    pub fn ocsp_responders(&self) -> Vec<&str> {
        let mut responders = Vec::new();
        for ext in self.x509.extensions() {
            if let ParsedExtension::AuthorityInfoAccess(aia) = ext.parsed_extension() {
                for desc in &aia.accessdescs {
                    if desc.access_method != OID_AD_OCSP {
                        continue;
                    }
                    if let GeneralName::URI(uri) = &desc.access_location {
                        responders.push(*uri);
                    }
                }
            }
        }
        responders
    }

    /// True when the extended key usage includes OCSPSigning.
    pub fn is_ocsp_responder(&self) -> bool {
        has_ocsp_signing_eku(&self.x509)
    }

    /// True when the certificate carries the OCSP No Check extension.
    pub fn has_ocsp_no_check(&self) -> bool {
        self.x509
            .extensions()
            .iter()
            .any(|ext| ext.oid == OID_OCSP_NOCHECK)
    }

    /// The underlying x509-parser certificate
    pub fn x509(&self) -> &X509Certificate<'a> {
        &self.x509
    }
}

impl fmt::Debug for Certificate<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Certificate")
            .field("subject", &self.x509.subject().to_string())
            .field("serial", &self.serial_hex())
            .finish()
    }
}

pub(crate) fn has_ocsp_signing_eku(x509: &X509Certificate<'_>) -> bool {
    x509.extensions().iter().any(|ext| {
        matches!(
            ext.parsed_extension(),
            ParsedExtension::ExtendedKeyUsage(eku) if eku.ocsp_signing
        )
    })
}

/// Decoded kind of the issuer's public key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    Rsa { bits: usize },
    EcP256,
    EcP384,
    Ed25519,
}

impl fmt::Display for KeyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyKind::Rsa { bits } => write!(f, "RSA-{}", bits),
            KeyKind::EcP256 => f.write_str("ECDSA P-256"),
            KeyKind::EcP384 => f.write_str("ECDSA P-384"),
            KeyKind::Ed25519 => f.write_str("Ed25519"),
        }
    }
}

/// Issuer material for request construction and response validation.
///
/// Only the raw subject, the raw SubjectPublicKeyInfo and the decoded key are
/// present. This is not a certificate: it has no serial, validity or
/// extensions, and its contents are only read inside this crate.
#[derive(Debug, Clone)]
pub struct IssuerStub<'a> {
    subject: &'a [u8],
    spki: SubjectPublicKeyInfo<'a>,
    key_kind: KeyKind,
}

impl<'a> IssuerStub<'a> {
    /// Build a stub from raw subject bytes and a DER SubjectPublicKeyInfo.
    pub fn from_parts(subject: &'a [u8], spki_der: &'a [u8]) -> Result<Self, OcspError> {
        let key_err = |reason: String| OcspError::Parse {
            target: ParseTarget::IssuerPublicKey,
            reason,
        };

        let (rest, spki) =
            SubjectPublicKeyInfo::from_der(spki_der).map_err(|e| key_err(e.to_string()))?;
        if !rest.is_empty() {
            return Err(key_err(format!("{} bytes of trailing data", rest.len())));
        }
        let key_kind = decode_key_kind(&spki).map_err(key_err)?;

        Ok(Self {
            subject,
            spki,
            key_kind,
        })
    }

    /// Build a stub from a full issuer certificate.
    pub fn from_certificate(issuer: &Certificate<'a>) -> Result<Self, OcspError> {
        let tbs = &issuer.x509.tbs_certificate;
        let key_kind = decode_key_kind(&tbs.subject_pki).map_err(|reason| OcspError::Parse {
            target: ParseTarget::IssuerPublicKey,
            reason,
        })?;
        Ok(Self {
            subject: tbs.subject.as_raw(),
            spki: tbs.subject_pki.clone(),
            key_kind,
        })
    }

    pub(crate) fn subject(&self) -> &'a [u8] {
        self.subject
    }

    pub(crate) fn spki(&self) -> &SubjectPublicKeyInfo<'a> {
        &self.spki
    }

    pub(crate) fn spki_der(&self) -> &'a [u8] {
        self.spki.raw
    }

    /// Contents of the subjectPublicKey BIT STRING, the input of the CertID key hash.
    pub(crate) fn public_key_bits(&self) -> &[u8] {
        &self.spki.subject_public_key.data
    }

    pub(crate) fn key_kind(&self) -> KeyKind {
        self.key_kind
    }
}

// Response signatures are checked with ring, which supports neither curve P-521 nor DSA.
const UNVERIFIABLE_P521: &str = "ECDSA P-521 issuer keys cannot verify OCSP responses";
const UNVERIFIABLE_DSA: &str = "DSA issuer keys cannot verify OCSP responses";

fn decode_key_kind(spki: &SubjectPublicKeyInfo<'_>) -> Result<KeyKind, String> {
    let algorithm = &spki.algorithm.algorithm;
    if *algorithm == OID_ED25519 {
        if spki.subject_public_key.data.len() != 32 {
            return Err("invalid Ed25519 public key length".to_string());
        }
        return Ok(KeyKind::Ed25519);
    }

    match spki.parsed().map_err(|e| e.to_string())? {
        PublicKey::RSA(rsa) => Ok(KeyKind::Rsa {
            bits: rsa.key_size(),
        }),
        PublicKey::EC(_) if *algorithm == OID_EC_PUBLIC_KEY => {
            let curve = spki
                .algorithm
                .parameters
                .clone()
                .ok_or_else(|| "missing elliptic curve parameters".to_string())?
                .oid()
                .map_err(|_| "elliptic curve parameters are not a named curve".to_string())?;
            if curve == OID_CURVE_P256 {
                Ok(KeyKind::EcP256)
            } else if curve == OID_CURVE_P384 {
                Ok(KeyKind::EcP384)
            } else if curve == OID_CURVE_P521 {
                Err(UNVERIFIABLE_P521.to_string())
            } else {
                Err(format!("unsupported elliptic curve {}", curve))
            }
        }
        PublicKey::DSA(_) => Err(UNVERIFIABLE_DSA.to_string()),
        _ => Err(format!("unsupported public key algorithm {}", algorithm)),
    }
}

/// Parse the certificate to check and build the issuer stub.
///
/// `cert_der` can be a precertificate; `issuer_subject` and `issuer_spki`
/// must be those of the final certificate's issuer.
pub fn parse_certificate<'a>(
    cert_der: &'a [u8],
    issuer_subject: &'a [u8],
    issuer_spki: &'a [u8],
) -> Result<(Certificate<'a>, IssuerStub<'a>), OcspError> {
    let cert = Certificate::from_der(cert_der)?;
    let issuer = IssuerStub::from_parts(issuer_subject, issuer_spki)?;
    Ok((cert, issuer))
}
