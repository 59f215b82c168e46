//! Fixture loading for unit tests

use std::path::PathBuf;
use x509_parser::pem::parse_x509_pem;
use x509_parser::prelude::parse_x509_certificate;

fn data_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests").join("data")
}

/// Raw bytes of a file under tests/data
pub(crate) fn fixture(name: &str) -> Vec<u8> {
    std::fs::read(data_dir().join(name)).expect("read fixture")
}

/// DER contents of a PEM certificate under tests/data
pub(crate) fn pem_der(name: &str) -> Vec<u8> {
    let pem = fixture(name);
    let (_, block) = parse_x509_pem(&pem).expect("parse PEM fixture");
    block.contents
}

/// Raw subject and SubjectPublicKeyInfo of a PEM certificate under tests/data
pub(crate) fn issuer_parts(name: &str) -> (Vec<u8>, Vec<u8>) {
    let der = pem_der(name);
    let (_, cert) = parse_x509_certificate(&der).expect("parse issuer fixture");
    (
        cert.subject().as_raw().to_vec(),
        cert.public_key().raw.to_vec(),
    )
}
