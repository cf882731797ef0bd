//! Path-length policy (RFC 5280 section 4.2.1.9).
//!
//! A CA's pathLenConstraint bounds the number of non-self-issued intermediate
//! CA certificates allowed below it. The walk therefore runs root-first,
//! consuming one unit of the tightest bound seen so far for each intermediate
//! and tightening the bound with each CA's own constraint. The end-entity
//! certificate never consumes a unit.

use std::sync::Arc;

use crate::certificate::Cert;
use crate::error::ValidationError;

/// Report every certificate in the path (leaf-first) whose nesting depth
/// violates an upstream pathLenConstraint.
pub(crate) fn path_len_errors(path: &[Arc<Cert>]) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    // None means unbounded.
    let mut allowed: Option<u8> = None;
    let top = path.len().saturating_sub(1);

    for idx in (0..path.len()).rev() {
        let cert = &path[idx];
        let consumes = idx != top && idx != 0 && cert.is_ca() && !cert.is_self_signed();
        if consumes {
            match allowed {
                // Stay at zero so every deeper violation is reported too.
                Some(0) => errors.push(ValidationError::BasicConstraintsPathExceeded {
                    subject: cert.subject_str().to_string(),
                }),
                Some(n) => allowed = Some(n - 1),
                None => {}
            }
        }
        if let Some(bc) = cert.basic_constraints() {
            if bc.is_ca {
                if let Some(limit) = bc.path_len {
                    allowed = Some(allowed.map_or(limit, |a| a.min(limit)));
                }
            }
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{self, rsa_signing_key};

    /// root(path_len) -> n intermediates -> leaf
    fn chain(root_path_len: Option<u8>, intermediates: usize) -> Vec<Arc<Cert>> {
        let root_key = rsa_signing_key();
        let root = testutil::build_root_with_path_len(
            "CN=Raiz,O=ICP-Brasil,C=BR",
            1,
            &root_key,
            root_path_len,
        );

        let mut path = vec![root];
        let mut signer_key = root_key;
        for i in 0..intermediates {
            let key = rsa_signing_key();
            let ca = testutil::build_ca(
                &format!("CN=AC Nivel {i},O=ICP-Brasil,C=BR"),
                &path[path.len() - 1],
                2 + i as u64,
                &key,
                &signer_key,
            );
            path.push(ca);
            signer_key = key;
        }

        let leaf_key = rsa_signing_key();
        let leaf = testutil::build_leaf(
            "CN=Titular,C=BR",
            &path[path.len() - 1],
            99,
            &leaf_key,
            &signer_key,
        );
        path.push(leaf);

        path.reverse();
        path
    }

    #[test]
    fn unconstrained_chain_passes() {
        assert!(path_len_errors(&chain(None, 3)).is_empty());
    }

    #[test]
    fn leaf_does_not_consume_the_bound() {
        // pathLen 1 permits exactly one intermediate below the root.
        assert!(path_len_errors(&chain(Some(1), 1)).is_empty());
    }

    #[test]
    fn one_intermediate_too_many_is_reported() {
        let errors = path_len_errors(&chain(Some(1), 2));
        assert_eq!(errors.len(), 1);
        assert!(matches!(
            errors[0],
            ValidationError::BasicConstraintsPathExceeded { .. }
        ));
    }

    #[test]
    fn every_excess_intermediate_is_reported() {
        let errors = path_len_errors(&chain(Some(0), 3));
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn root_only_path_passes() {
        let key = rsa_signing_key();
        let root = testutil::build_root_with_path_len("CN=Raiz,C=BR", 1, &key, Some(0));
        assert!(path_len_errors(&[root]).is_empty());
    }
}
