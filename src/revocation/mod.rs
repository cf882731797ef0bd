//! Revocation checking against the CAs' published CRLs.

pub(crate) mod fetcher;
pub mod http;
#[cfg(feature = "reqwest")]
pub mod reqwest_client;

use x509_cert::{crl::CertificateList, serial_number::SerialNumber};

pub(crate) use fetcher::RefreshHandle;
pub use http::{HttpClient, HttpError};
#[cfg(feature = "reqwest")]
pub use reqwest_client::ReqwestClient;

/// A certificate's status against its issuer's CRL.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RevocationStatus {
    /// No usable CRL has been seen for the issuing CA.
    #[default]
    Unknown,
    NotRevoked,
    Revoked,
}

/// Whether the CRL lists `serial` as revoked.
pub(crate) fn lists_serial(crl: &CertificateList, serial: &SerialNumber) -> bool {
    crl.tbs_cert_list
        .revoked_certificates
        .iter()
        .flatten()
        .any(|entry| &entry.serial_number == serial)
}
