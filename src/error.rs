//! Error taxonomy for trust-chain construction and validation.
//!
//! Path-build failures ([`ValidationError::IssuerNotFound`],
//! [`ValidationError::MaxDepthReached`]) abort a whole `verify_cert` call.
//! All per-hop errors are accumulated; a failed check never suppresses the
//! remaining checks for the same or later hops. Revocation-fetch failures
//! degrade to a [`ValidationWarning`] rather than an error: "we could not
//! determine", not "it is definitely bad".

use crate::revocation::HttpError;

/// Fatal errors from store operations and the codec/transport boundary.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Failed to parse a certificate from DER.
    #[error("failed to parse certificate: {0}")]
    ParseCertificate(#[source] der::Error),

    /// Failed to parse a CRL from DER.
    #[error("failed to parse CRL: {0}")]
    ParseCrl(#[source] der::Error),

    /// Failed to decode PEM framing.
    #[error("failed to decode PEM: {0}")]
    Pem(#[from] pem_rfc7468::Error),

    /// HTTP transport failure.
    #[error(transparent)]
    Http(#[from] HttpError),

    /// The CA bundle could not be read as a zip archive.
    #[error("failed to read CA bundle: {0}")]
    Unzip(#[from] zip::result::ZipError),

    /// An entry of the CA bundle could not be read.
    #[error("failed to read CA bundle entry: {0}")]
    Io(#[from] std::io::Error),
}

/// Per-hop and path-build validation errors.
///
/// A non-empty error list means "do not trust this certificate".
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// No issuer was found in the trust store, neither by authority key
    /// identifier nor by issuer name.
    #[error("no trusted issuer found for '{subject}'")]
    IssuerNotFound { subject: String },

    /// The maximum chain depth was exhausted before reaching a self-signed
    /// root. This is the sole cycle guard of the path builder.
    #[error("maximum path depth reached while resolving the issuer of '{subject}'")]
    MaxDepthReached { subject: String },

    /// The validation instant is not after the certificate's notBefore.
    #[error("certificate '{subject}' is not yet valid")]
    NotBeforeDate { subject: String },

    /// The validation instant is not before the certificate's notAfter.
    #[error("certificate '{subject}' is expired")]
    NotAfterDate { subject: String },

    /// The certificate is not authorized to sign other certificates.
    #[error("'{subject}' is not a certificate authority: {detail}")]
    NotCertificateAuthority { subject: String, detail: String },

    /// The issuer's key did not verify the certificate's signature.
    #[error("signature of '{subject}' could not be verified with the issuer key")]
    BadSignature { subject: String },

    /// The signature algorithm is not one of the supported
    /// RSA PKCS#1 v1.5 / SHA-1/256/384/512 identifiers.
    #[error("unsupported signature algorithm: {oid}")]
    UnknownAlgorithm { oid: String },

    /// A pathLenConstraint of an upstream CA forbids this certificate's
    /// nesting depth (RFC 5280 section 4.2.1.9).
    #[error("'{subject}' exceeds the permitted CA path length")]
    BasicConstraintsPathExceeded { subject: String },

    /// The certificate's serial number appears in the issuer's CRL.
    #[error("certificate '{subject}' (serial {serial}) is revoked")]
    Revoked { subject: String, serial: String },

    /// The issuer's RSA public key could not be decoded from its
    /// SubjectPublicKeyInfo.
    #[error("could not parse RSA public key of '{subject}'")]
    ParseRsaPublicKey { subject: String },

    /// `add_testing_root_ca` was called with a certificate whose subject or
    /// issuer is not the fixed testing-CA name.
    #[error("'{subject}' is not the testing root CA")]
    TestCaImproperName { subject: String },
}

/// Non-fatal per-hop findings, accumulated alongside errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationWarning {
    /// No usable CRL was available for the issuing CA, so the revocation
    /// status of this certificate could not be determined.
    #[error("revocation status of '{subject}' is unknown: {detail}")]
    UnknownRevocationStatus { subject: String, detail: String },
}
