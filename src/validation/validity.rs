//! Validity period check.

use time::OffsetDateTime;

use crate::certificate::Cert;
use crate::error::ValidationError;

/// Check that `at` falls strictly inside the certificate's validity window.
pub(crate) fn check_validity_period(cert: &Cert, at: OffsetDateTime) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    if at <= cert.not_before() {
        errors.push(ValidationError::NotBeforeDate {
            subject: cert.subject_str().to_string(),
        });
    }
    if at >= cert.not_after() {
        errors.push(ValidationError::NotAfterDate {
            subject: cert.subject_str().to_string(),
        });
    }
    errors
}

#[cfg(test)]
mod tests {
    use time::Duration;

    use super::*;
    use crate::testutil::{self, rsa_signing_key};

    #[test]
    fn window_boundaries() {
        let key = rsa_signing_key();
        let cert = testutil::build_root("CN=Raiz,C=BR", 1, &key);

        let now = OffsetDateTime::now_utc();
        assert!(check_validity_period(&cert, now).is_empty());

        let before = check_validity_period(&cert, now - Duration::days(30));
        assert_eq!(
            before,
            vec![ValidationError::NotBeforeDate {
                subject: cert.subject_str().to_string()
            }]
        );

        let after = check_validity_period(&cert, now + Duration::days(365 * 20));
        assert_eq!(
            after,
            vec![ValidationError::NotAfterDate {
                subject: cert.subject_str().to_string()
            }]
        );
    }

    #[test]
    fn window_edges_are_exclusive() {
        let key = rsa_signing_key();
        let cert = testutil::build_root("CN=Raiz,C=BR", 1, &key);

        let at_not_before = check_validity_period(&cert, cert.not_before());
        assert_eq!(
            at_not_before,
            vec![ValidationError::NotBeforeDate {
                subject: cert.subject_str().to_string()
            }]
        );
        let at_not_after = check_validity_period(&cert, cert.not_after());
        assert_eq!(
            at_not_after,
            vec![ValidationError::NotAfterDate {
                subject: cert.subject_str().to_string()
            }]
        );

        let just_inside = check_validity_period(&cert, cert.not_before() + Duration::seconds(1));
        assert!(just_inside.is_empty());
    }
}
