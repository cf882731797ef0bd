//! Trust path construction.
//!
//! The path runs leaf-first and ends at a self-signed certificate. Issuers are
//! resolved exclusively from the trust store, so an attacker-supplied bundle
//! can never splice its own intermediates into a path. The depth bound is the
//! sole cycle guard: a malicious issuer loop in the store simply exhausts the
//! bound instead of hanging the builder.

use std::sync::Arc;

use crate::certificate::Cert;
use crate::error::ValidationError;
use crate::store::TrustStore;

/// Build the path from `leaf` up to a self-signed certificate, resolving
/// every issuer (the self-signed one included) through the store.
///
/// `max_depth` bounds the number of issuer transitions taken, not the path
/// length: a self-signed leaf present in the store builds a one-element path
/// even at depth zero.
pub(crate) fn build_path(
    store: &TrustStore,
    leaf: Arc<Cert>,
    max_depth: usize,
) -> Result<Vec<Arc<Cert>>, ValidationError> {
    let mut path: Vec<Arc<Cert>> = Vec::new();
    let mut current = leaf;

    loop {
        let issuer =
            store
                .find_issuer(&current)
                .ok_or_else(|| ValidationError::IssuerNotFound {
                    subject: current.subject_str().to_string(),
                })?;

        let self_signed = current.is_self_signed();
        if !self_signed && path.len() >= max_depth {
            return Err(ValidationError::MaxDepthReached {
                subject: current.subject_str().to_string(),
            });
        }
        path.push(current);
        if self_signed {
            return Ok(path);
        }
        current = issuer;
    }
}
