//! Parsed certificate view.
//!
//! A [`Cert`] keeps the DER representation alongside the parsed structure for
//! ease of re-serialization, plus a snapshot of the identity and policy fields
//! the trust engine needs on every hop: canonical subject/issuer strings, key
//! identifiers (with the name-string fallback when the extension is absent),
//! Key Usage, Basic Constraints, and CRL distribution point URLs.
//!
//! Each certificate also owns a small mutable revocation cache, written only
//! by the CRL fetcher under the certificate's try-lock. Readers consult the
//! cache without taking the fetch lock; a read may observe slightly stale data
//! while a refresh is in flight.

pub(crate) mod extensions;
pub mod name;

use std::sync::{Arc, PoisonError, RwLock};

use der::{Decode, Encode, Reader, SliceReader};
use time::OffsetDateTime;
use tokio::sync::Mutex;
use x509_cert::{crl::CertificateList, serial_number::SerialNumber, name::Name, Certificate};

use crate::error::Error;
use crate::revocation::{self, RevocationStatus};

pub use extensions::{BasicConstraintsInfo, KeyUsageInfo};

/// An X.509 certificate with derived identity fields and a cached revocation
/// state.
#[derive(Debug)]
pub struct Cert {
    inner: Certificate,
    der: Vec<u8>,

    subject: String,
    issuer: String,
    common_name: Option<String>,
    /// Colon-hex key identifier, or the subject string when the extension is
    /// absent. The same fallback rule feeds path building and store indexing.
    subject_key_id: String,
    /// Colon-hex key identifier, or the issuer string when absent.
    authority_key_id: String,

    key_usage: Option<KeyUsageInfo>,
    basic_constraints: Option<BasicConstraintsInfo>,
    crl_urls: Vec<String>,

    revocation: RevocationState,
}

/// Mutable revocation cache plus the fetch de-duplication lock.
#[derive(Debug, Default)]
struct RevocationState {
    /// Held for the duration of a CRL fetch; `try_lock` failure means a fetch
    /// is already in flight and the caller must not queue behind it.
    fetch_lock: Mutex<()>,
    cache: RwLock<RevocationCache>,
}

#[derive(Debug, Default)]
struct RevocationCache {
    /// The CRL this CA publishes, as last successfully fetched.
    last_crl: Option<CertificateList>,
    /// This certificate's own status against its issuer's CRL.
    status: RevocationStatus,
    last_checked: Option<OffsetDateTime>,
    last_fetch_error: Option<String>,
}

impl Cert {
    /// Parse a certificate from raw DER bytes.
    pub fn from_der(bytes: &[u8]) -> Result<Self, Error> {
        let inner = Certificate::from_der(bytes).map_err(Error::ParseCertificate)?;
        Ok(Self::from_parts(inner, bytes.to_vec()))
    }

    /// Parse a certificate from a single PEM block.
    pub fn from_pem(bytes: &[u8]) -> Result<Self, Error> {
        let (label, der) = pem_rfc7468::decode_vec(bytes)?;
        if label != "CERTIFICATE" {
            return Err(Error::Pem(pem_rfc7468::Error::Label));
        }
        Self::from_der(&der)
    }

    /// Wrap an already-parsed certificate.
    pub fn from_certificate(inner: Certificate) -> Result<Self, Error> {
        let der = inner.to_der().map_err(Error::ParseCertificate)?;
        Ok(Self::from_parts(inner, der))
    }

    /// Parse every certificate in the input, which may be a sequence of PEM
    /// blocks or a trailing stream of raw DER structures.
    pub fn parse_all(bytes: &[u8]) -> Result<Vec<Arc<Self>>, Error> {
        if let Some(text) = as_pem_text(bytes) {
            let mut certs = Vec::new();
            for block in pem_blocks(text) {
                let (label, der) = pem_rfc7468::decode_vec(block.as_bytes())?;
                if label != "CERTIFICATE" {
                    continue;
                }
                certs.push(Arc::new(Self::from_der(&der)?));
            }
            return Ok(certs);
        }

        let mut reader = SliceReader::new(bytes).map_err(Error::ParseCertificate)?;
        let mut certs = Vec::new();
        while !reader.is_finished() {
            let inner: Certificate = reader.decode().map_err(Error::ParseCertificate)?;
            certs.push(Arc::new(Self::from_certificate(inner)?));
        }
        Ok(certs)
    }

    fn from_parts(inner: Certificate, der: Vec<u8>) -> Self {
        let subject = name::canonical_name(&inner.tbs_certificate.subject);
        let issuer = name::canonical_name(&inner.tbs_certificate.issuer);
        let common_name = name::common_name(&inner.tbs_certificate.subject);
        let summary = extensions::summarize(&inner);

        let subject_key_id = summary
            .subject_key_id
            .as_deref()
            .map(extensions::colon_hex)
            .unwrap_or_else(|| subject.clone());
        let authority_key_id = summary
            .authority_key_id
            .as_deref()
            .map(extensions::colon_hex)
            .unwrap_or_else(|| issuer.clone());

        Self {
            inner,
            der,
            subject,
            issuer,
            common_name,
            subject_key_id,
            authority_key_id,
            key_usage: summary.key_usage,
            basic_constraints: summary.basic_constraints,
            crl_urls: summary.crl_urls,
            revocation: RevocationState::default(),
        }
    }

    pub fn certificate(&self) -> &Certificate {
        &self.inner
    }

    pub fn der_bytes(&self) -> &[u8] {
        &self.der
    }

    pub fn serial(&self) -> &SerialNumber {
        &self.inner.tbs_certificate.serial_number
    }

    pub fn serial_hex(&self) -> String {
        hex::encode(self.serial().as_bytes())
    }

    /// Canonical single-line subject string.
    pub fn subject_str(&self) -> &str {
        &self.subject
    }

    /// Canonical single-line issuer string.
    pub fn issuer_str(&self) -> &str {
        &self.issuer
    }

    pub fn subject_name(&self) -> &Name {
        &self.inner.tbs_certificate.subject
    }

    pub fn common_name_or_unknown(&self) -> &str {
        self.common_name.as_deref().unwrap_or("Unknown")
    }

    /// Subject key identifier as colon-hex, or the subject string when the
    /// extension is absent.
    pub fn subject_key_id(&self) -> &str {
        &self.subject_key_id
    }

    /// Authority key identifier as colon-hex, or the issuer string when the
    /// extension is absent.
    pub fn authority_key_id(&self) -> &str {
        &self.authority_key_id
    }

    pub fn key_usage(&self) -> Option<&KeyUsageInfo> {
        self.key_usage.as_ref()
    }

    pub fn basic_constraints(&self) -> Option<&BasicConstraintsInfo> {
        self.basic_constraints.as_ref()
    }

    pub fn crl_distribution_points(&self) -> &[String] {
        &self.crl_urls
    }

    pub fn not_before(&self) -> OffsetDateTime {
        OffsetDateTime::from(self.inner.tbs_certificate.validity.not_before.to_system_time())
    }

    pub fn not_after(&self) -> OffsetDateTime {
        OffsetDateTime::from(self.inner.tbs_certificate.validity.not_after.to_system_time())
    }

    /// A certificate is a CA only when both extensions are present and both
    /// grant the authority: Key Usage keyCertSign and Basic Constraints CA.
    pub fn is_ca(&self) -> bool {
        self.key_usage.map(|ku| ku.key_cert_sign).unwrap_or(false)
            && self.basic_constraints.map(|bc| bc.is_ca).unwrap_or(false)
    }

    /// Self-signed by name equality or by key-identifier equality, with the
    /// fallback rule applied to both identifiers.
    pub fn is_self_signed(&self) -> bool {
        self.subject == self.issuer || self.subject_key_id == self.authority_key_id
    }

    /// The to-be-signed byte range, re-encoded.
    pub fn tbs_der(&self) -> Result<Vec<u8>, der::Error> {
        self.inner.tbs_certificate.to_der()
    }

    /// The signature value over the to-be-signed bytes.
    pub fn signature_bytes(&self) -> &[u8] {
        self.inner.signature.raw_bytes()
    }

    pub fn signature_algorithm_oid(&self) -> const_oid::ObjectIdentifier {
        self.inner.signature_algorithm.oid
    }

    // --- revocation cache ---

    pub(crate) fn fetch_lock(&self) -> &Mutex<()> {
        &self.revocation.fetch_lock
    }

    /// This certificate's own status as last determined against its issuer's
    /// CRL.
    pub fn revocation_status(&self) -> RevocationStatus {
        self.read_cache().status
    }

    /// When the status or the published CRL was last refreshed; equals the
    /// CRL's thisUpdate field.
    pub fn last_checked_at(&self) -> Option<OffsetDateTime> {
        self.read_cache().last_checked
    }

    /// The last CRL fetch failure recorded for this CA, if the most recent
    /// attempt failed.
    pub fn last_fetch_error(&self) -> Option<String> {
        self.read_cache().last_fetch_error.clone()
    }

    /// Whether a fetched CRL for this CA is currently cached.
    pub fn has_cached_crl(&self) -> bool {
        self.read_cache().last_crl.is_some()
    }

    /// The CRL published by this CA, as last successfully fetched.
    pub fn cached_crl(&self) -> Option<CertificateList> {
        self.read_cache().last_crl.clone()
    }

    /// A cached CRL is stale once the current time passes its nextUpdate; a
    /// CA with no fetched CRL yet counts as stale so a refresh gets scheduled
    /// at all. A CRL without nextUpdate never goes stale (RFC 5280).
    pub(crate) fn crl_is_stale(&self, now: OffsetDateTime) -> bool {
        let cache = self.read_cache();
        match &cache.last_crl {
            None => true,
            Some(crl) => match &crl.tbs_cert_list.next_update {
                None => false,
                Some(next) => now > OffsetDateTime::from(next.to_system_time()),
            },
        }
    }

    /// Store a freshly fetched and accepted CRL. Clears any recorded fetch
    /// error; the previous CRL is replaced.
    pub(crate) fn store_crl(&self, crl: CertificateList) {
        let checked = OffsetDateTime::from(crl.tbs_cert_list.this_update.to_system_time());
        let mut cache = self.write_cache();
        cache.last_crl = Some(crl);
        cache.last_checked = Some(checked);
        cache.last_fetch_error = None;
    }

    /// Record a fetch failure. Stale-but-present data is deliberately kept:
    /// an old CRL still beats no CRL.
    pub(crate) fn store_fetch_error(&self, error: String) {
        self.write_cache().last_fetch_error = Some(error);
    }

    /// Determine this certificate's revocation status from the issuer's
    /// cached CRL, updating the cached status and lastCheckedAt (set to the
    /// CRL's thisUpdate). Returns `Unknown` without touching the cache when
    /// the issuer has no usable CRL.
    pub fn check_against_issuer_crl(&self, issuer: &Cert) -> RevocationStatus {
        // The root hop checks against itself; the issuer read guard must be
        // released before writing our own cache.
        let checked = {
            let issuer_cache = issuer.read_cache();
            let Some(crl) = &issuer_cache.last_crl else {
                return RevocationStatus::Unknown;
            };
            let status = if revocation::lists_serial(crl, self.serial()) {
                RevocationStatus::Revoked
            } else {
                RevocationStatus::NotRevoked
            };
            let checked = OffsetDateTime::from(crl.tbs_cert_list.this_update.to_system_time());
            (status, checked)
        };

        let mut cache = self.write_cache();
        cache.status = checked.0;
        cache.last_checked = Some(checked.1);
        checked.0
    }

    fn read_cache(&self) -> std::sync::RwLockReadGuard<'_, RevocationCache> {
        self.revocation
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write_cache(&self) -> std::sync::RwLockWriteGuard<'_, RevocationCache> {
        self.revocation
            .cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

pub(crate) fn as_pem_text(bytes: &[u8]) -> Option<&str> {
    let text = std::str::from_utf8(bytes).ok()?;
    text.contains("-----BEGIN").then_some(text)
}

/// Slice out every PEM block (BEGIN line through the end of the END line).
pub(crate) fn pem_blocks(text: &str) -> Vec<&str> {
    let mut blocks = Vec::new();
    let mut pos = 0;
    while let Some(start_rel) = text[pos..].find("-----BEGIN") {
        let start = pos + start_rel;
        let Some(end_rel) = text[start..].find("-----END") else {
            break;
        };
        let end_marker = start + end_rel;
        let end = match text[end_marker..].find('\n') {
            Some(n) => end_marker + n + 1,
            None => text.len(),
        };
        blocks.push(&text[start..end]);
        pos = end;
    }
    blocks
}
