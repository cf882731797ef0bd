//! RSA PKCS#1 v1.5 signature verification over the to-be-signed bytes.
//!
//! The profile pins the algorithm set to sha*WithRSAEncryption; anything else
//! is reported as [`ValidationError::UnknownAlgorithm`] rather than silently
//! skipped. The same core check also accepts or rejects fetched CRLs, so it
//! is exposed to the revocation module with a transport-free error type.

use const_oid::db::rfc5912::{
    SHA_1_WITH_RSA_ENCRYPTION, SHA_256_WITH_RSA_ENCRYPTION, SHA_384_WITH_RSA_ENCRYPTION,
    SHA_512_WITH_RSA_ENCRYPTION,
};
use const_oid::ObjectIdentifier;
use der::referenced::OwnedToRef;
use rsa::pkcs1v15::{Signature, VerifyingKey};
use rsa::RsaPublicKey;
use sha1::Sha1;
use sha2::{Sha256, Sha384, Sha512};
use signature::Verifier;
use x509_cert::spki::SubjectPublicKeyInfoOwned;

use crate::certificate::Cert;
use crate::error::ValidationError;

#[derive(Debug)]
pub(crate) enum VerifyFailure {
    /// The RSA public key could not be decoded from the SPKI.
    Key,
    /// The algorithm identifier is outside the supported set.
    Algorithm(String),
    /// The signature did not verify.
    Signature,
}

impl std::fmt::Display for VerifyFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VerifyFailure::Key => write!(f, "could not parse the RSA public key"),
            VerifyFailure::Algorithm(oid) => write!(f, "unsupported signature algorithm: {oid}"),
            VerifyFailure::Signature => write!(f, "signature verification failed"),
        }
    }
}

/// Verify `signature_bytes` over `message` with the RSA key in `spki`, using
/// the digest named by `algorithm`.
pub(crate) fn verify_with_key(
    spki: &SubjectPublicKeyInfoOwned,
    algorithm: ObjectIdentifier,
    message: &[u8],
    signature_bytes: &[u8],
) -> Result<(), VerifyFailure> {
    let key = RsaPublicKey::try_from(spki.owned_to_ref()).map_err(|_| VerifyFailure::Key)?;
    let signature =
        Signature::try_from(signature_bytes).map_err(|_| VerifyFailure::Signature)?;

    let verified = if algorithm == SHA_1_WITH_RSA_ENCRYPTION {
        VerifyingKey::<Sha1>::new(key).verify(message, &signature)
    } else if algorithm == SHA_256_WITH_RSA_ENCRYPTION {
        VerifyingKey::<Sha256>::new(key).verify(message, &signature)
    } else if algorithm == SHA_384_WITH_RSA_ENCRYPTION {
        VerifyingKey::<Sha384>::new(key).verify(message, &signature)
    } else if algorithm == SHA_512_WITH_RSA_ENCRYPTION {
        VerifyingKey::<Sha512>::new(key).verify(message, &signature)
    } else {
        return Err(VerifyFailure::Algorithm(algorithm.to_string()));
    };
    verified.map_err(|_| VerifyFailure::Signature)
}

/// Verify that `cert` is signed by `issuer`'s RSA public key.
pub(crate) fn verify_signed_by(cert: &Cert, issuer: &Cert) -> Result<(), ValidationError> {
    let message = cert.tbs_der().map_err(|_| ValidationError::BadSignature {
        subject: cert.subject_str().to_string(),
    })?;
    verify_with_key(
        &issuer.certificate().tbs_certificate.subject_public_key_info,
        cert.signature_algorithm_oid(),
        &message,
        cert.signature_bytes(),
    )
    .map_err(|failure| match failure {
        VerifyFailure::Key => ValidationError::ParseRsaPublicKey {
            subject: issuer.subject_str().to_string(),
        },
        VerifyFailure::Algorithm(oid) => ValidationError::UnknownAlgorithm { oid },
        VerifyFailure::Signature => ValidationError::BadSignature {
            subject: cert.subject_str().to_string(),
        },
    })
}
