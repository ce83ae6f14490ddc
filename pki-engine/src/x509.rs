//! X.509 parsing helpers shared by the catalog

use crate::error::PkiError;
use crate::Result;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use x509_parser::prelude::*;

/// The fields of a stored certificate the catalog cares about.
pub(crate) struct ParsedCertificate {
    pub serial_number: String,
    pub issuer_cn: String,
    pub subject_cn: String,
    pub not_before: DateTime<Utc>,
    pub not_after: DateTime<Utc>,
    pub is_ca: bool,
    pub server_auth: bool,
}

pub(crate) fn parse_certificate(pem: &str) -> Result<ParsedCertificate> {
    let (_, parsed_pem) = x509_parser::pem::parse_x509_pem(pem.as_bytes())
        .map_err(|e| PkiError::MalformedCertificate(format!("invalid PEM: {}", e)))?;
    let cert = parsed_pem
        .parse_x509()
        .map_err(|e| PkiError::MalformedCertificate(format!("invalid X.509: {}", e)))?;

    let is_ca = cert
        .basic_constraints()
        .map_err(|e| PkiError::MalformedCertificate(format!("invalid basic constraints: {}", e)))?
        .map(|ext| ext.value.ca)
        .unwrap_or(false);

    let server_auth = cert
        .extended_key_usage()
        .map_err(|e| PkiError::MalformedCertificate(format!("invalid extended key usage: {}", e)))?
        .map(|ext| ext.value.server_auth)
        .unwrap_or(false);

    Ok(ParsedCertificate {
        serial_number: hyphenated_serial(cert.raw_serial()),
        issuer_cn: common_name(cert.issuer()),
        subject_cn: common_name(cert.subject()),
        not_before: to_utc(&cert.validity().not_before)?,
        not_after: to_utc(&cert.validity().not_after)?,
        is_ca,
        server_auth,
    })
}

/// Serial numbers of every entry in a PEM encoded CRL, in the same
/// hyphenated format [`hyphenated_serial`] produces for certificates.
pub(crate) fn revoked_serials(crl_pem: &str) -> Result<HashSet<String>> {
    let (_, parsed_pem) = x509_parser::pem::parse_x509_pem(crl_pem.as_bytes())
        .map_err(|e| PkiError::MalformedCrl(format!("invalid PEM: {}", e)))?;
    let (_, crl) = parse_x509_crl(&parsed_pem.contents)
        .map_err(|e| PkiError::MalformedCrl(format!("invalid CRL: {}", e)))?;

    Ok(crl
        .iter_revoked_certificates()
        .map(|entry| hyphenated_serial(entry.raw_serial()))
        .collect())
}

/// Formats DER serial bytes as lowercase hex octets joined by hyphens.
/// Leading zero octets (the DER sign byte on high serials) are stripped
/// so a serial formats identically whether it came from a certificate or
/// a CRL entry.
pub(crate) fn hyphenated_serial(raw: &[u8]) -> String {
    let first_nonzero = raw.iter().position(|b| *b != 0);
    let stripped = match first_nonzero {
        Some(idx) => &raw[idx..],
        None => &raw[raw.len().saturating_sub(1)..],
    };

    stripped
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join("-")
}

/// Username is the part of the subject CN before the first `@`; a CN
/// without `@` already is a username.
pub(crate) fn username_from_cn(common_name: &str) -> &str {
    common_name.split('@').next().unwrap_or(common_name)
}

fn common_name(name: &X509Name) -> String {
    name.iter_common_name()
        .next()
        .and_then(|attr| attr.as_str().ok())
        .unwrap_or_default()
        .to_string()
}

fn to_utc(time: &ASN1Time) -> Result<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp(time.timestamp(), 0).ok_or_else(|| {
        PkiError::MalformedCertificate("certificate validity outside representable range".to_string())
    })
}
