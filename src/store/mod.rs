//! The trust-anchor store and its high-level verification entry points.
//!
//! The store holds every trusted CA under two key domains that always point
//! at the same record: the subject key identifier (with the name-string
//! fallback) and the canonical subject string. It is seeded with the embedded
//! root certificates at construction; there is no half-initialized state.
//! Both index maps sit behind one `RwLock` so concurrent insertions from
//! overlapping bundle passes or `add_ca` calls serialize cleanly.

pub(crate) mod bundle;
mod roots;

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use time::OffsetDateTime;

use crate::certificate::Cert;
use crate::error::{Error, ValidationError, ValidationWarning};
use crate::path;
use crate::revocation::{HttpClient, RefreshHandle};
use crate::validation;

/// Where the national root authority publishes the zip of every accredited
/// CA certificate.
pub const DEFAULT_BUNDLE_URL: &str =
    "http://acraiz.icpbrasil.gov.br/credenciadas/CertificadosAC-ICP-Brasil/ACcompactado.zip";

/// The only subject (and issuer) accepted by
/// [`TrustStore::add_testing_root_ca`], in canonical rendering.
pub const TESTING_CA_SUBJECT: &str = "C=BR, O=ICP-Brasil, OU=Instituto Nacional de Tecnologia da Informacao - ITI, CN=Autoridade Certificadora Raiz Brasileira de Testes";

#[derive(Debug, Clone)]
pub struct StoreOptions {
    /// Fetch CRLs (and allow bundle downloads) over the network. Off means
    /// revocation statuses stay unknown unless CRLs arrive by other means.
    pub auto_download: bool,
    /// Maximum number of issuer transitions when building a path.
    pub max_depth: usize,
    pub http_timeout: Duration,
    pub bundle_url: String,
    /// Cap on admission passes over the CA bundle.
    pub bundle_pass_limit: usize,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            auto_download: false,
            max_depth: 16,
            http_timeout: Duration::from_secs(5),
            bundle_url: DEFAULT_BUNDLE_URL.to_string(),
            bundle_pass_limit: 8,
        }
    }
}

/// The outcome of one `verify_cert` call: the built path (empty when path
/// building itself failed) and the accumulated findings.
#[derive(Debug)]
pub struct Verification {
    /// Leaf-first, ending in a self-signed certificate.
    pub path: Vec<Arc<Cert>>,
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl Verification {
    /// The chain is trusted when no error was found. Warnings alone do not
    /// deny trust; treating them is the caller's policy decision.
    pub fn is_trusted(&self) -> bool {
        self.errors.is_empty()
    }
}

#[derive(Default)]
struct Index {
    by_key_id: HashMap<String, Arc<Cert>>,
    by_subject: HashMap<String, Arc<Cert>>,
}

pub struct TrustStore {
    index: RwLock<Index>,
    options: StoreOptions,
    http: Arc<dyn HttpClient>,
    refresh: RefreshHandle,
}

impl TrustStore {
    /// Construct a store seeded with the embedded roots, using the default
    /// HTTP transport when `auto_download` is on and the disabled transport
    /// otherwise.
    #[cfg(feature = "reqwest")]
    pub fn new(auto_download: bool) -> anyhow::Result<Self> {
        let options = StoreOptions {
            auto_download,
            ..StoreOptions::default()
        };
        let http: Arc<dyn HttpClient> = if auto_download {
            Arc::new(crate::revocation::ReqwestClient::new(options.http_timeout)?)
        } else {
            Arc::new(())
        };
        Ok(Self::with_http_client(options, http))
    }

    /// Construct a store with an explicit transport, seeded with the embedded
    /// roots.
    pub fn with_http_client(options: StoreOptions, http: Arc<dyn HttpClient>) -> Self {
        let store = Self {
            index: RwLock::new(Index::default()),
            options,
            http: Arc::clone(&http),
            refresh: RefreshHandle::new(http),
        };
        for pem in roots::EMBEDDED_ROOTS {
            match Cert::from_pem(pem) {
                Ok(root) => store.insert(Arc::new(root)),
                Err(e) => tracing::error!("embedded root failed to parse: {e}"),
            }
        }
        store
    }

    /// Upsert under both key domains.
    fn insert(&self, cert: Arc<Cert>) {
        let mut index = self.write_index();
        index
            .by_key_id
            .insert(cert.subject_key_id().to_string(), Arc::clone(&cert));
        index.by_subject.insert(cert.subject_str().to_string(), cert);
    }

    /// Resolve a certificate's issuer, first by authority key identifier and
    /// then by issuer name. Both lookups honor the name-string fallback.
    pub(crate) fn find_issuer(&self, cert: &Cert) -> Option<Arc<Cert>> {
        let index = self.read_index();
        index
            .by_key_id
            .get(cert.authority_key_id())
            .or_else(|| index.by_subject.get(cert.issuer_str()))
            .cloned()
    }

    pub fn get_by_key_id(&self, key_id: &str) -> Option<Arc<Cert>> {
        self.read_index().by_key_id.get(key_id).cloned()
    }

    pub fn get_by_subject(&self, subject: &str) -> Option<Arc<Cert>> {
        self.read_index().by_subject.get(subject).cloned()
    }

    /// Number of distinct trusted certificates.
    pub fn len(&self) -> usize {
        self.read_index().by_subject.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Verify `leaf` at the current time.
    pub fn verify_cert(&self, leaf: Arc<Cert>) -> Verification {
        self.verify_cert_at(leaf, OffsetDateTime::now_utc())
    }

    /// Build the trust path for `leaf` and validate every hop at instant
    /// `at`. A path-build failure aborts the call with that single error and
    /// no per-hop detail.
    pub fn verify_cert_at(&self, leaf: Arc<Cert>, at: OffsetDateTime) -> Verification {
        let path = match path::build_path(self, leaf, self.options.max_depth) {
            Ok(path) => path,
            Err(e) => {
                return Verification {
                    path: Vec::new(),
                    errors: vec![e],
                    warnings: Vec::new(),
                }
            }
        };
        let refresh = self.options.auto_download.then_some(&self.refresh);
        let outcome = validation::verify_path(&path, at, refresh);
        Verification {
            path,
            errors: outcome.errors,
            warnings: outcome.warnings,
        }
    }

    /// Admit a CA: it must carry the CA grants and validate cleanly against
    /// the current trust state at instant `at`. On success it is inserted
    /// under both key domains and exactly one background CRL refresh is
    /// scheduled for it.
    pub fn add_ca(&self, candidate: Arc<Cert>, at: OffsetDateTime) -> Vec<ValidationError> {
        if !candidate.is_ca() {
            return vec![ValidationError::NotCertificateAuthority {
                subject: candidate.subject_str().to_string(),
                detail: "candidate does not carry the CA grants".to_string(),
            }];
        }
        let verification = self.verify_cert_at(Arc::clone(&candidate), at);
        if !verification.errors.is_empty() {
            return verification.errors;
        }

        tracing::info!(subject = candidate.subject_str(), "trusting CA");
        self.insert(Arc::clone(&candidate));
        if self.options.auto_download {
            self.refresh.schedule(candidate);
        }
        Vec::new()
    }

    /// Insert a fixture root, accepted only under the fixed testing-CA name.
    /// Never called from any production-validation path.
    pub fn add_testing_root_ca(&self, candidate: Arc<Cert>) -> Vec<ValidationError> {
        if candidate.subject_str() != TESTING_CA_SUBJECT
            || candidate.issuer_str() != TESTING_CA_SUBJECT
        {
            return vec![ValidationError::TestCaImproperName {
                subject: candidate.subject_str().to_string(),
            }];
        }
        self.insert(candidate);
        Vec::new()
    }

    /// Download the accredited-CA bundle and admit every certificate that
    /// chains to the current trust state. Passes over the bundle repeat
    /// because later entries may depend on CAs admitted in an earlier pass.
    /// Returns the number of CAs admitted.
    pub async fn download_all_cas(&self) -> Result<usize, Error> {
        let body = self.http.get(&self.options.bundle_url).await?;
        let mut pending = bundle::extract_certs(&body)?;
        tracing::info!(certificates = pending.len(), "CA bundle downloaded");

        let mut admitted_total = 0;
        for _ in 0..self.options.bundle_pass_limit {
            let mut remaining = Vec::with_capacity(pending.len());
            let mut admitted = 0;
            let now = OffsetDateTime::now_utc();
            for cert in pending {
                if self.get_by_subject(cert.subject_str()).is_some() {
                    continue;
                }
                if self.add_ca(Arc::clone(&cert), now).is_empty() {
                    admitted += 1;
                } else {
                    remaining.push(cert);
                }
            }
            admitted_total += admitted;
            if admitted == 0 || remaining.is_empty() {
                break;
            }
            pending = remaining;
        }
        Ok(admitted_total)
    }

    /// Join every background CRL refresh started by this store.
    pub async fn wait_downloads(&self) {
        self.refresh.wait().await;
    }

    fn read_index(&self) -> std::sync::RwLockReadGuard<'_, Index> {
        self.index.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_index(&self) -> std::sync::RwLockWriteGuard<'_, Index> {
        self.index.write().unwrap_or_else(PoisonError::into_inner)
    }

    #[cfg(test)]
    pub(crate) fn empty_for_tests() -> Self {
        Self {
            index: RwLock::new(Index::default()),
            options: StoreOptions::default(),
            http: Arc::new(()),
            refresh: RefreshHandle::new(Arc::new(())),
        }
    }

    #[cfg(test)]
    pub(crate) fn insert_for_tests(&self, cert: Arc<Cert>) {
        self.insert(cert);
    }
}
