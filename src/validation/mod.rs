//! Per-hop chain validation.
//!
//! Every certificate in the path is checked against its issuer (the last,
//! self-signed one against itself) and findings are accumulated: a failed
//! check never suppresses the remaining checks, so one pass reports
//! everything wrong with a chain. Errors make the chain untrusted; warnings
//! record findings that do not by themselves deny trust, currently only an
//! undeterminable revocation status.

pub(crate) mod policy;
pub(crate) mod signature;
mod validity;

use std::sync::Arc;

use time::OffsetDateTime;

use crate::certificate::Cert;
use crate::error::{ValidationError, ValidationWarning};
use crate::revocation::{RefreshHandle, RevocationStatus};

/// The accumulated findings of one chain validation.
#[derive(Debug, Default)]
pub struct ValidationOutcome {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationOutcome {
    /// The chain is trusted when no error was found. Warnings alone do not
    /// deny trust.
    pub fn is_trusted(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Validate a leaf-first path ending in a self-signed certificate at the
/// instant `at`. When a `refresh` handle is given, a stale issuer CRL
/// schedules a background fetch; the revocation decision itself always uses
/// the currently cached CRL.
pub(crate) fn verify_path(
    path: &[Arc<Cert>],
    at: OffsetDateTime,
    refresh: Option<&RefreshHandle>,
) -> ValidationOutcome {
    let mut outcome = ValidationOutcome {
        errors: policy::path_len_errors(path),
        warnings: Vec::new(),
    };

    for (i, cert) in path.iter().enumerate() {
        let issuer = path.get(i + 1).unwrap_or(cert);
        tracing::debug!(
            subject = cert.subject_str(),
            issuer = issuer.subject_str(),
            "validating hop"
        );

        outcome.errors.extend(validity::check_validity_period(cert, at));
        outcome.errors.extend(check_signing_authority(issuer));
        if let Err(e) = signature::verify_signed_by(cert, issuer) {
            outcome.errors.push(e);
        }

        // Staleness is a property of the cache, not of the instant under
        // validation: a historical check must not trigger refreshes.
        if issuer.crl_is_stale(OffsetDateTime::now_utc()) {
            if let Some(handle) = refresh {
                handle.schedule(Arc::clone(issuer));
            }
        }
        match cert.check_against_issuer_crl(issuer) {
            RevocationStatus::Revoked => outcome.errors.push(ValidationError::Revoked {
                subject: cert.subject_str().to_string(),
                serial: cert.serial_hex(),
            }),
            RevocationStatus::NotRevoked => {}
            RevocationStatus::Unknown => {
                outcome
                    .warnings
                    .push(ValidationWarning::UnknownRevocationStatus {
                        subject: cert.subject_str().to_string(),
                        detail: issuer
                            .last_fetch_error()
                            .unwrap_or_else(|| "no CRL fetched yet".to_string()),
                    })
            }
        }
    }

    outcome
}

/// The issuer of any hop must carry both CA grants: Key Usage keyCertSign and
/// Basic Constraints cA. Each missing grant is reported separately.
fn check_signing_authority(issuer: &Cert) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let subject = || issuer.subject_str().to_string();

    match issuer.key_usage() {
        None => errors.push(ValidationError::NotCertificateAuthority {
            subject: subject(),
            detail: "no key usage extension".to_string(),
        }),
        Some(ku) if !ku.key_cert_sign => errors.push(ValidationError::NotCertificateAuthority {
            subject: subject(),
            detail: "key usage does not include keyCertSign".to_string(),
        }),
        Some(_) => {}
    }
    match issuer.basic_constraints() {
        None => errors.push(ValidationError::NotCertificateAuthority {
            subject: subject(),
            detail: "no basic constraints extension".to_string(),
        }),
        Some(bc) if !bc.is_ca => errors.push(ValidationError::NotCertificateAuthority {
            subject: subject(),
            detail: "basic constraints does not grant CA".to_string(),
        }),
        Some(_) => {}
    }
    errors
}
