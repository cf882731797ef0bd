//! Trust-chain construction and CRL revocation checking for certificates
//! issued under the ICP-Brasil profile.
//!
//! The entry point is [`store::TrustStore`]: it is seeded with the embedded
//! root certificates, can download the bundle of accredited CAs, and verifies
//! leaf certificates on demand. Verification builds the path up to a
//! self-signed root, checks every hop (validity window, CA authority,
//! path-length policy, RSA signature), and consults each issuer's cached CRL
//! for revocation, refreshing stale CRLs in the background.

pub mod certificate;
pub mod error;
mod path;
pub mod revocation;
pub mod store;
pub mod validation;

#[cfg(test)]
mod testutil;

pub use certificate::Cert;
pub use error::{Error, ValidationError, ValidationWarning};
pub use revocation::RevocationStatus;
pub use store::{StoreOptions, TrustStore, Verification};
