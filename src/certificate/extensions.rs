//! Extraction of the extension fields the trust engine relies on.
//!
//! Every field keeps the "extension absent" / "extension present" distinction:
//! a Key Usage extension with all bits zero is not the same thing as a missing
//! one, and both `is_ca` and the path-length policy depend on telling them
//! apart.

use const_oid::AssociatedOid;
use der::Decode;
use x509_cert::{
    ext::pkix::{
        name::{DistributionPointName, GeneralName},
        AuthorityKeyIdentifier, BasicConstraints, CrlDistributionPoints, KeyUsage, KeyUsages,
        SubjectKeyIdentifier,
    },
    Certificate,
};

/// Key Usage bits, present only when the extension itself is present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyUsageInfo {
    pub digital_signature: bool,
    pub non_repudiation: bool,
    pub key_encipherment: bool,
    pub data_encipherment: bool,
    pub key_agreement: bool,
    pub key_cert_sign: bool,
    pub crl_sign: bool,
}

/// Basic Constraints, present only when the extension itself is present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BasicConstraintsInfo {
    pub is_ca: bool,
    pub path_len: Option<u8>,
}

/// One-pass snapshot of the extensions the engine cares about.
#[derive(Debug, Clone, Default)]
pub(crate) struct ExtensionSummary {
    pub key_usage: Option<KeyUsageInfo>,
    pub basic_constraints: Option<BasicConstraintsInfo>,
    pub subject_key_id: Option<Vec<u8>>,
    pub authority_key_id: Option<Vec<u8>>,
    pub crl_urls: Vec<String>,
}

pub(crate) fn summarize(certificate: &Certificate) -> ExtensionSummary {
    let mut summary = ExtensionSummary::default();

    for ext in certificate.tbs_certificate.extensions.iter().flatten() {
        let bytes = ext.extn_value.as_bytes();
        if ext.extn_id == KeyUsage::OID {
            match KeyUsage::from_der(bytes) {
                Ok(ku) => summary.key_usage = Some(key_usage_info(&ku)),
                Err(e) => tracing::warn!("failed to parse KeyUsage: {e}"),
            }
        } else if ext.extn_id == BasicConstraints::OID {
            match BasicConstraints::from_der(bytes) {
                Ok(bc) => {
                    summary.basic_constraints = Some(BasicConstraintsInfo {
                        is_ca: bc.ca,
                        path_len: bc.path_len_constraint,
                    })
                }
                Err(e) => tracing::warn!("failed to parse BasicConstraints: {e}"),
            }
        } else if ext.extn_id == SubjectKeyIdentifier::OID {
            match SubjectKeyIdentifier::from_der(bytes) {
                Ok(ski) => summary.subject_key_id = Some(ski.0.as_bytes().to_vec()),
                Err(e) => tracing::warn!("failed to parse SubjectKeyIdentifier: {e}"),
            }
        } else if ext.extn_id == AuthorityKeyIdentifier::OID {
            match AuthorityKeyIdentifier::from_der(bytes) {
                Ok(aki) => {
                    summary.authority_key_id =
                        aki.key_identifier.map(|ki| ki.as_bytes().to_vec())
                }
                Err(e) => tracing::warn!("failed to parse AuthorityKeyIdentifier: {e}"),
            }
        } else if ext.extn_id == CrlDistributionPoints::OID {
            match CrlDistributionPoints::from_der(bytes) {
                Ok(dps) => summary.crl_urls = distribution_point_urls(&dps),
                Err(e) => tracing::warn!("failed to parse CrlDistributionPoints: {e}"),
            }
        }
    }

    summary
}

/// URLs from the CRL Distribution Points extension, in declaration order.
/// An empty list is a legitimate outcome; not every certificate publishes one.
fn distribution_point_urls(dps: &CrlDistributionPoints) -> Vec<String> {
    dps.0
        .iter()
        .filter_map(|dp| dp.distribution_point.as_ref())
        .filter_map(|dpn| match dpn {
            DistributionPointName::FullName(names) => Some(names),
            DistributionPointName::NameRelativeToCRLIssuer(_) => None,
        })
        .flat_map(|names| names.iter())
        .filter_map(|gn| match gn {
            GeneralName::UniformResourceIdentifier(uri) => Some(uri.to_string()),
            _ => None,
        })
        .collect()
}

fn key_usage_info(ku: &KeyUsage) -> KeyUsageInfo {
    KeyUsageInfo {
        digital_signature: ku.0.contains(KeyUsages::DigitalSignature),
        non_repudiation: ku.0.contains(KeyUsages::NonRepudiation),
        key_encipherment: ku.0.contains(KeyUsages::KeyEncipherment),
        data_encipherment: ku.0.contains(KeyUsages::DataEncipherment),
        key_agreement: ku.0.contains(KeyUsages::KeyAgreement),
        key_cert_sign: ku.0.contains(KeyUsages::KeyCertSign),
        crl_sign: ku.0.contains(KeyUsages::CRLSign),
    }
}

/// Render a key identifier as colon-separated uppercase hex.
pub(crate) fn colon_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 3);
    for (i, b) in bytes.iter().enumerate() {
        if i > 0 {
            out.push(':');
        }
        out.push_str(&format!("{b:02X}"));
    }
    out
}
