//! OCSP request/response codec - RFC 6960
//!
//! Encodes single-certificate `OCSPRequest`s and decodes `OCSPResponse`s,
//! validating them against one certificate/issuer pair.
//!
//! ## ASN.1 Structures (RFC 6960):
//!
//! ```asn1
//! OCSPRequest ::= SEQUENCE {
//!     tbsRequest          TBSRequest,
//!     optionalSignature   [0] EXPLICIT Signature OPTIONAL
//! }
//!
//! TBSRequest ::= SEQUENCE {
//!     version             [0] EXPLICIT Version DEFAULT v1,
//!     requestorName       [1] EXPLICIT GeneralName OPTIONAL,
//!     requestList         SEQUENCE OF Request,
//!     requestExtensions   [2] EXPLICIT Extensions OPTIONAL
//! }
//!
//! CertID ::= SEQUENCE {
//!     hashAlgorithm       AlgorithmIdentifier,
//!     issuerNameHash      OCTET STRING,
//!     issuerKeyHash       OCTET STRING,
//!     serialNumber        INTEGER
//! }
//!
//! OCSPResponse ::= SEQUENCE {
//!     responseStatus      OCSPResponseStatus,
//!     responseBytes       [0] EXPLICIT ResponseBytes OPTIONAL
//! }
//!
//! BasicOCSPResponse ::= SEQUENCE {
//!     tbsResponseData     ResponseData,
//!     signatureAlgorithm  AlgorithmIdentifier,
//!     signature           BIT STRING,
//!     certs               [0] EXPLICIT SEQUENCE OF Certificate OPTIONAL
//! }
//!
//! ResponseData ::= SEQUENCE {
//!     version             [0] EXPLICIT Version DEFAULT v1,
//!     responderID         ResponderID,
//!     producedAt          GeneralizedTime,
//!     responses           SEQUENCE OF SingleResponse,
//!     responseExtensions  [1] EXPLICIT Extensions OPTIONAL
//! }
//!
//! SingleResponse ::= SEQUENCE {
//!     certID              CertID,
//!     certStatus          CertStatus,
//!     thisUpdate          GeneralizedTime,
//!     nextUpdate          [0] EXPLICIT GeneralizedTime OPTIONAL,
//!     singleExtensions    [1] EXPLICIT Extensions OPTIONAL
//! }
//!
//! CertStatus ::= CHOICE {
//!     good                [0] IMPLICIT NULL,
//!     revoked             [1] IMPLICIT RevokedInfo,
//!     unknown             [2] IMPLICIT UnknownInfo
//! }
//! ```
//!
//! Requests are unsigned, carry no nonce and identify the certificate with a
//! SHA-1 CertID, which is what responders are required to support.

use crate::cert::{has_ocsp_signing_eku, Certificate, IssuerStub};
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use der_parser::asn1_rs::{oid, Any, BitString, Class, FromDer, Oid, Tag};
use sha1::Sha1;
use sha2::{Digest, Sha256, Sha384, Sha512};
use std::fmt;
use thiserror::Error;
use x509_parser::prelude::{parse_x509_certificate, AlgorithmIdentifier, SubjectPublicKeyInfo};
use x509_parser::verify::verify_signature;

/// id-pkix-ocsp-basic
const OID_OCSP_BASIC: Oid<'static> = oid!(1.3.6.1.5.5.7.48.1.1);

const OID_SHA1: Oid<'static> = oid!(1.3.14.3.2.26);
const OID_SHA256: Oid<'static> = oid!(2.16.840.1.101.3.4.2.1);
const OID_SHA384: Oid<'static> = oid!(2.16.840.1.101.3.4.2.2);
const OID_SHA512: Oid<'static> = oid!(2.16.840.1.101.3.4.2.3);

/// Errors from encoding requests or decoding and validating responses.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// A DER element is missing or malformed
    #[error("malformed {0}")]
    Malformed(&'static str),

    /// Extra bytes after a complete structure
    #[error("trailing data after {0}")]
    TrailingData(&'static str),

    /// A GeneralizedTime value could not be parsed
    #[error("invalid {field} time {value:?}")]
    InvalidTime { field: &'static str, value: String },

    /// The responder reported a non-successful response status
    #[error("OCSP responder returned status {0}")]
    Responder(OcspResponseStatus),

    /// The response status code is not defined by RFC 6960
    #[error("unknown OCSP response status {0}")]
    UnknownResponseStatus(u32),

    /// Only id-pkix-ocsp-basic responses are understood
    #[error("unsupported OCSP response type {0}")]
    UnsupportedResponseType(String),

    /// The CertID uses a hash algorithm this codec does not implement
    #[error("unsupported CertID hash algorithm {0}")]
    UnsupportedHashAlgorithm(String),

    /// The certificate has an empty serial number
    #[error("certificate serial number is empty")]
    EmptySerial,

    /// No SingleResponse carries the certificate's serial
    #[error("no response matching the certificate serial {0}")]
    NoMatchingResponse(String),

    /// The CertID issuer hashes do not belong to the issuer
    #[error("response CertID does not match the issuer")]
    IssuerMismatch,

    /// The response signature does not verify
    #[error("bad response signature: {0}")]
    BadSignature(String),

    /// The embedded responder certificate is not valid for this issuer
    #[error("bad responder certificate: {0}")]
    BadSignerCertificate(String),

    /// The embedded responder certificate lacks the OCSPSigning extended key usage
    #[error("responder certificate is not authorized to sign OCSP responses")]
    SignerNotAuthorized,
}

/// OCSP response status (RFC 6960 Section 2.3)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OcspResponseStatus {
    /// Response has valid confirmations
    Successful = 0,
    /// Illegal confirmation request
    MalformedRequest = 1,
    /// Internal error in issuer
    InternalError = 2,
    /// Try again later
    TryLater = 3,
    /// Must sign the request
    SigRequired = 5,
    /// Request unauthorized
    Unauthorized = 6,
}

impl OcspResponseStatus {
    pub fn from_code(value: u32) -> Option<Self> {
        match value {
            0 => Some(Self::Successful),
            1 => Some(Self::MalformedRequest),
            2 => Some(Self::InternalError),
            3 => Some(Self::TryLater),
            5 => Some(Self::SigRequired),
            6 => Some(Self::Unauthorized),
            _ => None,
        }
    }
}

impl fmt::Display for OcspResponseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Successful => "successful",
            Self::MalformedRequest => "malformedRequest",
            Self::InternalError => "internalError",
            Self::TryLater => "tryLater",
            Self::SigRequired => "sigRequired",
            Self::Unauthorized => "unauthorized",
        };
        write!(f, "{} ({})", name, *self as u8)
    }
}

/// Certificate status in a SingleResponse
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CertificateStatus {
    Good,
    Revoked {
        revocation_time: DateTime<Utc>,
        /// CRLReason code, when present
        reason: Option<u32>,
    },
    Unknown,
}

/// Which key produced a valid response signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseSigner {
    /// The issuer signed the response itself
    Issuer,
    /// A responder certificate issued by the issuer signed it
    Delegated,
}

/// A validated response for one certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OcspResponse {
    pub status: CertificateStatus,
    pub produced_at: DateTime<Utc>,
    pub this_update: DateTime<Utc>,
    pub next_update: Option<DateTime<Utc>>,
    pub signer: ResponseSigner,
}

/// Hash algorithm of a CertID.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashAlgorithm {
    Sha1,
    Sha256,
    Sha384,
    Sha512,
}

impl HashAlgorithm {
    fn oid(self) -> Oid<'static> {
        match self {
            HashAlgorithm::Sha1 => OID_SHA1,
            HashAlgorithm::Sha256 => OID_SHA256,
            HashAlgorithm::Sha384 => OID_SHA384,
            HashAlgorithm::Sha512 => OID_SHA512,
        }
    }

    fn from_oid(oid: &Oid<'_>) -> Option<Self> {
        [
            HashAlgorithm::Sha1,
            HashAlgorithm::Sha256,
            HashAlgorithm::Sha384,
            HashAlgorithm::Sha512,
        ]
        .into_iter()
        .find(|alg| alg.oid() == *oid)
    }

    pub fn digest(self, data: &[u8]) -> Vec<u8> {
        match self {
            HashAlgorithm::Sha1 => Sha1::digest(data).to_vec(),
            HashAlgorithm::Sha256 => Sha256::digest(data).to_vec(),
            HashAlgorithm::Sha384 => Sha384::digest(data).to_vec(),
            HashAlgorithm::Sha512 => Sha512::digest(data).to_vec(),
        }
    }
}

/// Identifies one certificate to a responder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertId {
    pub hash_algorithm: HashAlgorithm,
    pub issuer_name_hash: Vec<u8>,
    pub issuer_key_hash: Vec<u8>,
    /// Content bytes of the serial number INTEGER
    pub serial_number: Vec<u8>,
}

impl CertId {
    pub fn new(
        hash_algorithm: HashAlgorithm,
        cert: &Certificate<'_>,
        issuer: &IssuerStub<'_>,
    ) -> Result<Self, CodecError> {
        let serial_number = cert.raw_serial();
        if serial_number.is_empty() {
            return Err(CodecError::EmptySerial);
        }
        Ok(Self {
            hash_algorithm,
            issuer_name_hash: hash_algorithm.digest(issuer.subject()),
            issuer_key_hash: hash_algorithm.digest(issuer.public_key_bits()),
            serial_number: serial_number.to_vec(),
        })
    }

    fn to_der(&self) -> Vec<u8> {
        let mut hash_alg = der_oid(&self.hash_algorithm.oid());
        hash_alg.extend_from_slice(&der_null());

        let mut cert_id = der_sequence(&hash_alg);
        cert_id.extend_from_slice(&der_octet_string(&self.issuer_name_hash));
        cert_id.extend_from_slice(&der_octet_string(&self.issuer_key_hash));
        cert_id.extend_from_slice(&der_tlv(0x02, &self.serial_number));
        der_sequence(&cert_id)
    }
}

/// Encode an unsigned single-certificate OCSP request with a SHA-1 CertID.
pub fn encode_request(cert: &Certificate<'_>, issuer: &IssuerStub<'_>) -> Result<Vec<u8>, CodecError> {
    let cert_id = CertId::new(HashAlgorithm::Sha1, cert, issuer)?;

    // Request ::= SEQUENCE { reqCert CertID }
    let request = der_sequence(&cert_id.to_der());
    // requestList SEQUENCE OF Request
    let request_list = der_sequence(&request);
    let tbs_request = der_sequence(&request_list);
    Ok(der_sequence(&tbs_request))
}

// ============================================================================
// DER Encoding Helpers
// ============================================================================

fn der_sequence(contents: &[u8]) -> Vec<u8> {
    der_tlv(0x30, contents)
}

fn der_octet_string(contents: &[u8]) -> Vec<u8> {
    der_tlv(0x04, contents)
}

fn der_oid(oid: &Oid<'_>) -> Vec<u8> {
    der_tlv(0x06, oid.as_bytes())
}

fn der_null() -> Vec<u8> {
    vec![0x05, 0x00]
}

fn der_tlv(tag: u8, contents: &[u8]) -> Vec<u8> {
    let mut result = vec![tag];
    result.extend_from_slice(&der_length(contents.len()));
    result.extend_from_slice(contents);
    result
}

fn der_length(length: usize) -> Vec<u8> {
    if length < 128 {
        return vec![length as u8];
    }
    let length_bytes: Vec<u8> = length
        .to_be_bytes()
        .into_iter()
        .skip_while(|b| *b == 0)
        .collect();
    let mut result = vec![0x80 | length_bytes.len() as u8];
    result.extend_from_slice(&length_bytes);
    result
}

// ============================================================================
// DER Decoding
// ============================================================================

/// One DER element: its full encoding and the parsed header/content.
struct Element<'a> {
    raw: &'a [u8],
    any: Any<'a>,
}

impl<'a> Element<'a> {
    fn content(&self) -> &'a [u8] {
        self.any.data
    }

    fn is_context(&self, number: u32) -> bool {
        self.any.header.class() == Class::ContextSpecific && self.any.header.tag().0 == number
    }

    fn oid(&self, what: &'static str) -> Result<Oid<'a>, CodecError> {
        self.any.clone().oid().map_err(|_| CodecError::Malformed(what))
    }
}

/// Sequential reader over the contents of a constructed element.
struct DerReader<'a> {
    input: &'a [u8],
}

impl<'a> DerReader<'a> {
    fn new(input: &'a [u8]) -> Self {
        Self { input }
    }

    /// Reader over the contents of the single SEQUENCE that makes up `input`.
    fn sequence(input: &'a [u8], what: &'static str) -> Result<Self, CodecError> {
        let mut outer = DerReader::new(input);
        let seq = outer.expect(Tag::Sequence, what)?;
        if !outer.is_empty() {
            return Err(CodecError::TrailingData(what));
        }
        Ok(DerReader::new(seq.content()))
    }

    fn is_empty(&self) -> bool {
        self.input.is_empty()
    }

    fn next(&mut self, what: &'static str) -> Result<Element<'a>, CodecError> {
        if self.input.is_empty() {
            return Err(CodecError::Malformed(what));
        }
        let (rest, any) = Any::from_der(self.input).map_err(|_| CodecError::Malformed(what))?;
        let raw = &self.input[..self.input.len() - rest.len()];
        self.input = rest;
        Ok(Element { raw, any })
    }

    /// Next element, which must be a universal `tag`.
    fn expect(&mut self, tag: Tag, what: &'static str) -> Result<Element<'a>, CodecError> {
        let element = self.next(what)?;
        if element.any.header.class() != Class::Universal || element.any.header.tag() != tag {
            return Err(CodecError::Malformed(what));
        }
        Ok(element)
    }

    /// Whether the next element is context-specific `[number]`.
    fn peek_context(&self, number: u32) -> bool {
        match Any::from_der(self.input) {
            Ok((_, any)) => {
                any.header.class() == Class::ContextSpecific && any.header.tag().0 == number
            }
            Err(_) => false,
        }
    }
}

/// Small non-negative INTEGER or ENUMERATED content
fn der_small_uint(content: &[u8], what: &'static str) -> Result<u32, CodecError> {
    if content.is_empty() || content[0] & 0x80 != 0 {
        return Err(CodecError::Malformed(what));
    }
    let significant: Vec<u8> = content.iter().copied().skip_while(|b| *b == 0).collect();
    if significant.len() > 4 {
        return Err(CodecError::Malformed(what));
    }
    Ok(significant
        .iter()
        .fold(0u32, |acc, b| (acc << 8) | u32::from(*b)))
}

/// Parse ASN.1 GeneralizedTime content
///
/// Format: YYYYMMDDHHMMSS[.fff]Z
fn parse_generalized_time(content: &[u8], field: &'static str) -> Result<DateTime<Utc>, CodecError> {
    let invalid = || CodecError::InvalidTime {
        field,
        value: String::from_utf8_lossy(content).into_owned(),
    };
    let time_str = std::str::from_utf8(content).map_err(|_| invalid())?;
    let naive = NaiveDateTime::parse_from_str(time_str, "%Y%m%d%H%M%SZ")
        .or_else(|_| NaiveDateTime::parse_from_str(time_str, "%Y%m%d%H%M%S%.fZ"))
        .map_err(|_| invalid())?;
    Ok(Utc.from_utc_datetime(&naive))
}

fn strip_leading_zeros(bytes: &[u8]) -> &[u8] {
    let start = bytes
        .iter()
        .position(|b| *b != 0)
        .unwrap_or(bytes.len().saturating_sub(1));
    &bytes[start..]
}

/// CertID as echoed by the responder
struct ResponseCertId<'a> {
    hash_algorithm: Oid<'a>,
    issuer_name_hash: &'a [u8],
    issuer_key_hash: &'a [u8],
    serial_number: &'a [u8],
}

impl<'a> ResponseCertId<'a> {
    fn parse(content: &'a [u8]) -> Result<Self, CodecError> {
        let mut reader = DerReader::new(content);
        let alg = reader.expect(Tag::Sequence, "CertID hashAlgorithm")?;
        let hash_algorithm = DerReader::new(alg.content())
            .expect(Tag::Oid, "CertID hashAlgorithm")?
            .oid("CertID hashAlgorithm")?;
        let issuer_name_hash = reader.expect(Tag::OctetString, "CertID issuerNameHash")?.content();
        let issuer_key_hash = reader.expect(Tag::OctetString, "CertID issuerKeyHash")?.content();
        let serial_number = reader.expect(Tag::Integer, "CertID serialNumber")?.content();
        Ok(Self {
            hash_algorithm,
            issuer_name_hash,
            issuer_key_hash,
            serial_number,
        })
    }

    fn matches_serial(&self, serial: &[u8]) -> bool {
        strip_leading_zeros(self.serial_number) == strip_leading_zeros(serial)
    }

    fn check_issuer(&self, issuer: &IssuerStub<'_>) -> Result<(), CodecError> {
        let hash = HashAlgorithm::from_oid(&self.hash_algorithm).ok_or_else(|| {
            CodecError::UnsupportedHashAlgorithm(self.hash_algorithm.to_id_string())
        })?;
        if hash.digest(issuer.subject()) != self.issuer_name_hash
            || hash.digest(issuer.public_key_bits()) != self.issuer_key_hash
        {
            return Err(CodecError::IssuerMismatch);
        }
        Ok(())
    }
}

struct SingleResponse<'a> {
    cert_id: ResponseCertId<'a>,
    status: CertificateStatus,
    this_update: DateTime<Utc>,
    next_update: Option<DateTime<Utc>>,
}

fn parse_single_response(content: &[u8]) -> Result<SingleResponse<'_>, CodecError> {
    let mut reader = DerReader::new(content);
    let cert_id = ResponseCertId::parse(reader.expect(Tag::Sequence, "CertID")?.content())?;
    let status = parse_cert_status(&reader.next("certStatus")?)?;
    let this_update = parse_generalized_time(
        reader.expect(Tag::GeneralizedTime, "thisUpdate")?.content(),
        "thisUpdate",
    )?;

    let mut next_update = None;
    if reader.peek_context(0) {
        let wrapper = reader.next("nextUpdate")?;
        let time = DerReader::new(wrapper.content()).expect(Tag::GeneralizedTime, "nextUpdate")?;
        next_update = Some(parse_generalized_time(time.content(), "nextUpdate")?);
    }
    // singleExtensions are not interpreted

    Ok(SingleResponse {
        cert_id,
        status,
        this_update,
        next_update,
    })
}

fn parse_cert_status(element: &Element<'_>) -> Result<CertificateStatus, CodecError> {
    if element.is_context(0) {
        return Ok(CertificateStatus::Good);
    }
    if element.is_context(2) {
        return Ok(CertificateStatus::Unknown);
    }
    if !element.is_context(1) {
        return Err(CodecError::Malformed("certStatus"));
    }

    // RevokedInfo ::= SEQUENCE {
    //     revocationTime    GeneralizedTime,
    //     revocationReason  [0] EXPLICIT CRLReason OPTIONAL
    // }
    let mut info = DerReader::new(element.content());
    let revocation_time = parse_generalized_time(
        info.expect(Tag::GeneralizedTime, "revocationTime")?.content(),
        "revocationTime",
    )?;
    let reason = if info.peek_context(0) {
        let wrapper = info.next("revocationReason")?;
        let value = DerReader::new(wrapper.content()).expect(Tag::Enumerated, "revocationReason")?;
        Some(der_small_uint(value.content(), "revocationReason")?)
    } else {
        None
    };

    Ok(CertificateStatus::Revoked {
        revocation_time,
        reason,
    })
}

/// Parse an OCSP response and validate it for `cert` issued by `issuer`.
///
/// The response must be successful, of the basic type, signed either by the
/// issuer or by a responder certificate the issuer signed with the
/// OCSPSigning extended key usage, and must contain a SingleResponse whose
/// CertID names this certificate and issuer.
///
/// Validity times are returned but not checked against the clock.
pub fn parse_response_for_cert(
    bytes: &[u8],
    cert: &Certificate<'_>,
    issuer: &IssuerStub<'_>,
) -> Result<OcspResponse, CodecError> {
    let mut response = DerReader::sequence(bytes, "OCSPResponse")?;

    let status_element = response.expect(Tag::Enumerated, "responseStatus")?;
    let code = der_small_uint(status_element.content(), "responseStatus")?;
    match OcspResponseStatus::from_code(code) {
        Some(OcspResponseStatus::Successful) => {}
        Some(status) => return Err(CodecError::Responder(status)),
        None => return Err(CodecError::UnknownResponseStatus(code)),
    }

    if !response.peek_context(0) {
        return Err(CodecError::Malformed("responseBytes"));
    }
    let wrapper = response.next("responseBytes")?;
    let mut response_bytes = DerReader::sequence(wrapper.content(), "responseBytes")?;
    let response_type = response_bytes
        .expect(Tag::Oid, "responseType")?
        .oid("responseType")?;
    if response_type != OID_OCSP_BASIC {
        return Err(CodecError::UnsupportedResponseType(
            response_type.to_id_string(),
        ));
    }
    let basic_der = response_bytes.expect(Tag::OctetString, "response")?.content();

    let mut basic = DerReader::sequence(basic_der, "BasicOCSPResponse")?;
    let tbs = basic.expect(Tag::Sequence, "tbsResponseData")?;
    let signature_algorithm = basic.expect(Tag::Sequence, "signatureAlgorithm")?;
    let signature = basic.expect(Tag::BitString, "signature")?;
    let mut certs = Vec::new();
    if basic.peek_context(0) {
        let wrapper = basic.next("certs")?;
        let mut list = DerReader::sequence(wrapper.content(), "certs")?;
        while !list.is_empty() {
            certs.push(list.expect(Tag::Sequence, "certs")?.raw);
        }
    }

    let (_, algorithm) = AlgorithmIdentifier::from_der(signature_algorithm.raw)
        .map_err(|_| CodecError::Malformed("signatureAlgorithm"))?;
    let signature_value = signature
        .any
        .clone()
        .bitstring()
        .map_err(|_| CodecError::Malformed("signature"))?;
    let signer = verify_response_signature(tbs.raw, &algorithm, &signature_value, &certs, issuer)?;

    // ResponseData
    let mut data = DerReader::new(tbs.content());
    if data.peek_context(0) {
        data.next("version")?;
    }
    let responder_id = data.next("responderID")?;
    if !(responder_id.is_context(1) || responder_id.is_context(2)) {
        return Err(CodecError::Malformed("responderID"));
    }
    let produced_at = parse_generalized_time(
        data.expect(Tag::GeneralizedTime, "producedAt")?.content(),
        "producedAt",
    )?;
    let mut responses = DerReader::new(data.expect(Tag::Sequence, "responses")?.content());

    let mut matched = None;
    while !responses.is_empty() {
        let single = parse_single_response(responses.expect(Tag::Sequence, "SingleResponse")?.content())?;
        if matched.is_none() && single.cert_id.matches_serial(cert.raw_serial()) {
            matched = Some(single);
        }
    }
    let single = matched.ok_or_else(|| CodecError::NoMatchingResponse(cert.serial_hex()))?;
    single.cert_id.check_issuer(issuer)?;

    Ok(OcspResponse {
        status: single.status,
        produced_at,
        this_update: single.this_update,
        next_update: single.next_update,
        signer,
    })
}

fn verify_response_signature(
    tbs_raw: &[u8],
    algorithm: &AlgorithmIdentifier<'_>,
    signature: &BitString<'_>,
    certs: &[&[u8]],
    issuer: &IssuerStub<'_>,
) -> Result<ResponseSigner, CodecError> {
    let verify = |key: &SubjectPublicKeyInfo<'_>| {
        verify_signature(key, algorithm, signature, tbs_raw)
            .map_err(|e| CodecError::BadSignature(e.to_string()))
    };

    // Only the first embedded certificate is considered as the signer.
    let Some(signer_der) = certs.first() else {
        verify(issuer.spki())?;
        return Ok(ResponseSigner::Issuer);
    };

    let (_, signer) = parse_x509_certificate(signer_der)
        .map_err(|e| CodecError::BadSignerCertificate(e.to_string()))?;
    verify(signer.public_key())?;

    if signer.public_key().raw == issuer.spki_der() {
        return Ok(ResponseSigner::Issuer);
    }

    signer
        .verify_signature(Some(issuer.spki()))
        .map_err(|e| CodecError::BadSignerCertificate(e.to_string()))?;
    if !has_ocsp_signing_eku(&signer) {
        return Err(CodecError::SignerNotAuthorized);
    }
    Ok(ResponseSigner::Delegated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{fixture, issuer_parts, pem_der};
    use chrono::TimeZone;

    fn check(response: &str, leaf: &str, ca: &str) -> Result<OcspResponse, CodecError> {
        let bytes = fixture(response);
        let leaf = pem_der(leaf);
        let (subject, spki) = issuer_parts(ca);
        let cert = Certificate::from_der(&leaf).expect("leaf");
        let issuer = IssuerStub::from_parts(&subject, &spki).expect("issuer");
        parse_response_for_cert(&bytes, &cert, &issuer)
    }

    #[test]
    fn test_encode_request_matches_openssl() {
        let leaf = pem_der("leaf-good.pem");
        let (subject, spki) = issuer_parts("ca.pem");
        let cert = Certificate::from_der(&leaf).expect("leaf");
        let issuer = IssuerStub::from_parts(&subject, &spki).expect("issuer");

        let request = encode_request(&cert, &issuer).expect("encode");
        assert_eq!(request, fixture("req-good.der"));
    }

    #[test]
    fn test_cert_id_hashes() {
        let leaf = pem_der("leaf-good.pem");
        let (subject, spki) = issuer_parts("ca.pem");
        let cert = Certificate::from_der(&leaf).expect("leaf");
        let issuer = IssuerStub::from_parts(&subject, &spki).expect("issuer");

        let cert_id = CertId::new(HashAlgorithm::Sha1, &cert, &issuer).expect("cert id");
        assert_eq!(cert_id.issuer_name_hash.len(), 20);
        assert_eq!(&cert_id.issuer_name_hash[..4], &[0xF0, 0x6F, 0xAE, 0x38]);
        assert_eq!(&cert_id.issuer_key_hash[..4], &[0x71, 0x29, 0x16, 0xC3]);
        assert_eq!(cert_id.serial_number, vec![0x10, 0x01]);

        let sha256 = CertId::new(HashAlgorithm::Sha256, &cert, &issuer).expect("cert id");
        assert_eq!(sha256.issuer_name_hash.len(), 32);
    }

    #[test]
    fn test_der_length_long_form() {
        assert_eq!(der_length(5), vec![0x05]);
        assert_eq!(der_length(127), vec![0x7F]);
        assert_eq!(der_length(128), vec![0x81, 0x80]);
        assert_eq!(der_length(0x1234), vec![0x82, 0x12, 0x34]);
    }

    #[test]
    fn test_good_response() {
        let response = check("resp-good.der", "leaf-good.pem", "ca.pem").expect("valid");
        assert_eq!(response.status, CertificateStatus::Good);
        assert_eq!(response.signer, ResponseSigner::Issuer);
        assert!(response.next_update > Some(response.this_update));
    }

    #[test]
    fn test_revoked_response() {
        let response = check("resp-revoked.der", "leaf-revoked.pem", "ca.pem").expect("valid");
        assert_eq!(
            response.status,
            CertificateStatus::Revoked {
                revocation_time: Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap(),
                reason: Some(1),
            }
        );
    }

    #[test]
    fn test_unknown_response() {
        let response = check("resp-unknown.der", "leaf-unknown.pem", "ca.pem").expect("valid");
        assert_eq!(response.status, CertificateStatus::Unknown);
    }

    #[test]
    fn test_ecdsa_signed_response() {
        let response = check("resp-ec-revoked.der", "ec-leaf.pem", "ec-ca.pem").expect("valid");
        match response.status {
            CertificateStatus::Revoked {
                revocation_time, ..
            } => assert_eq!(revocation_time.timestamp(), 1_735_689_600),
            other => panic!("unexpected status {:?}", other),
        }
    }

    #[test]
    fn test_delegated_responder() {
        let response = check("resp-delegated.der", "leaf-good.pem", "ca.pem").expect("valid");
        assert_eq!(response.status, CertificateStatus::Good);
        assert_eq!(response.signer, ResponseSigner::Delegated);
    }

    #[test]
    fn test_rogue_delegated_responder_rejected() {
        let err = check("resp-rogue.der", "leaf-good.pem", "ca.pem").unwrap_err();
        assert!(matches!(err, CodecError::BadSignerCertificate(_)), "{err}");
    }

    #[test]
    fn test_wrong_signing_key_rejected() {
        let err = check("resp-wrong-key.der", "leaf-good.pem", "ca.pem").unwrap_err();
        assert!(matches!(err, CodecError::BadSignature(_)), "{err}");
    }

    #[test]
    fn test_response_for_other_certificate() {
        let err = check("resp-good.der", "leaf-revoked.pem", "ca.pem").unwrap_err();
        assert!(matches!(err, CodecError::NoMatchingResponse(_)), "{err}");
    }

    #[test]
    fn test_try_later_status() {
        let leaf = pem_der("leaf-good.pem");
        let (subject, spki) = issuer_parts("ca.pem");
        let cert = Certificate::from_der(&leaf).expect("leaf");
        let issuer = IssuerStub::from_parts(&subject, &spki).expect("issuer");

        let err = parse_response_for_cert(&[0x30, 0x03, 0x0A, 0x01, 0x03], &cert, &issuer).unwrap_err();
        assert_eq!(err, CodecError::Responder(OcspResponseStatus::TryLater));
        assert_eq!(
            err.to_string(),
            "OCSP responder returned status tryLater (3)"
        );

        let err = parse_response_for_cert(&[0x30, 0x03, 0x0A, 0x01, 0x04], &cert, &issuer).unwrap_err();
        assert_eq!(err, CodecError::UnknownResponseStatus(4));
    }

    #[test]
    fn test_garbage_and_trailing_data() {
        let leaf = pem_der("leaf-good.pem");
        let (subject, spki) = issuer_parts("ca.pem");
        let cert = Certificate::from_der(&leaf).expect("leaf");
        let issuer = IssuerStub::from_parts(&subject, &spki).expect("issuer");

        assert!(matches!(
            parse_response_for_cert(b"<html>", &cert, &issuer),
            Err(CodecError::Malformed(_))
        ));

        let mut bytes = fixture("resp-good.der");
        bytes.push(0);
        assert_eq!(
            parse_response_for_cert(&bytes, &cert, &issuer),
            Err(CodecError::TrailingData("OCSPResponse"))
        );
    }

    #[test]
    fn test_successful_status_without_body() {
        let leaf = pem_der("leaf-good.pem");
        let (subject, spki) = issuer_parts("ca.pem");
        let cert = Certificate::from_der(&leaf).expect("leaf");
        let issuer = IssuerStub::from_parts(&subject, &spki).expect("issuer");

        assert_eq!(
            parse_response_for_cert(&[0x30, 0x03, 0x0A, 0x01, 0x00], &cert, &issuer),
            Err(CodecError::Malformed("responseBytes"))
        );
    }

    #[test]
    fn test_generalized_time_formats() {
        let plain = parse_generalized_time(b"20240315120000Z", "t").expect("plain");
        assert_eq!(plain.timestamp(), 1_710_504_000);
        let fractional = parse_generalized_time(b"20240315120000.5Z", "t").expect("fraction");
        assert_eq!(fractional.timestamp(), 1_710_504_000);
        assert!(parse_generalized_time(b"2024031512Z", "t").is_err());
    }

    #[test]
    fn test_small_uint() {
        assert_eq!(der_small_uint(&[0x03], "x"), Ok(3));
        assert_eq!(der_small_uint(&[0x00, 0x80], "x"), Ok(128));
        assert!(der_small_uint(&[], "x").is_err());
        assert!(der_small_uint(&[0xFF], "x").is_err());
    }

    #[test]
    fn test_serial_match_ignores_leading_zeros() {
        let cert_id = ResponseCertId {
            hash_algorithm: OID_SHA1,
            issuer_name_hash: &[],
            issuer_key_hash: &[],
            serial_number: &[0x00, 0x80, 0x01],
        };
        assert!(cert_id.matches_serial(&[0x80, 0x01]));
        assert!(!cert_id.matches_serial(&[0x80, 0x02]));
    }
}
