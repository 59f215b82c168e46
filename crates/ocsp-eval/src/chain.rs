//! PEM certificate chain input

use thiserror::Error;
use x509_parser::prelude::parse_x509_certificate;

#[derive(Debug, Error)]
pub enum ChainError {
    #[error("invalid PEM: {0}")]
    Pem(std::io::Error),

    #[error("certificate {index} is malformed: {reason}")]
    Certificate { index: usize, reason: String },

    #[error("Fewer than 2 certificates provided on stdin")]
    TooFewCertificates(usize),
}

/// Parse every `CERTIFICATE` block of `input`, in order.
///
/// Other PEM sections and text between sections are skipped. Each certificate
/// must be valid DER.
pub fn read_chain(input: &[u8]) -> Result<Vec<Vec<u8>>, ChainError> {
    let mut reader = input;
    let certs = rustls_pemfile::certs(&mut reader)
        .collect::<Result<Vec<_>, _>>()
        .map_err(ChainError::Pem)?;

    let mut chain = Vec::with_capacity(certs.len());
    for (index, cert) in certs.into_iter().enumerate() {
        parse_x509_certificate(cert.as_ref()).map_err(|e| ChainError::Certificate {
            index,
            reason: e.to_string(),
        })?;
        chain.push(cert.to_vec());
    }
    Ok(chain)
}

/// What an evaluation needs from a chain: the leaf, and the raw subject and
/// SubjectPublicKeyInfo of the certificate after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluationInput {
    pub cert: Vec<u8>,
    pub issuer_subject: Vec<u8>,
    pub issuer_spki: Vec<u8>,
}

impl EvaluationInput {
    /// The first certificate may be a precertificate; the second must then
    /// be the issuer of the final certificate.
    pub fn from_chain(chain: &[Vec<u8>]) -> Result<Self, ChainError> {
        let [cert, issuer, ..] = chain else {
            return Err(ChainError::TooFewCertificates(chain.len()));
        };
        let (_, parsed) = parse_x509_certificate(issuer).map_err(|e| ChainError::Certificate {
            index: 1,
            reason: e.to_string(),
        })?;
        Ok(Self {
            cert: cert.clone(),
            issuer_subject: parsed.subject().as_raw().to_vec(),
            issuer_spki: parsed.public_key().raw.to_vec(),
        })
    }
}
