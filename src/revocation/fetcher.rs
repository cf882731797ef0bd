//! CRL download, acceptance, and background refresh scheduling.
//!
//! A refresh for a given CA is de-duplicated through the CA's own try-lock:
//! whoever fails to take the lock walks away, so at most one download per
//! certificate is ever in flight. Fetched CRLs are accepted only when the
//! issuer name matches the CA, every critical extension is recognized, and
//! the CA's own key verifies the CRL signature. On total failure the last
//! error is recorded and any previously fetched CRL is kept.

use std::sync::{Arc, Mutex, PoisonError};

use const_oid::ObjectIdentifier;
use der::{Decode, Encode, Reader, SliceReader};
use tokio::task::JoinHandle;
use x509_cert::crl::CertificateList;

use crate::certificate::{self, name, Cert};
use crate::error::Error;
use crate::revocation::http::HttpClient;
use crate::validation::signature;

// OIDs for CRL extensions we recognize (RFC 5280 Section 5.2)
const OID_AUTHORITY_KEY_IDENTIFIER: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.29.35");
const OID_ISSUER_ALT_NAME: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.29.18");
const OID_CRL_NUMBER: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.29.20");
const OID_ISSUING_DISTRIBUTION_POINT: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.29.28");
const OID_FRESHEST_CRL: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.29.46");

// OIDs for CRL entry extensions we recognize (RFC 5280 Section 5.3)
const OID_CRL_REASON: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.29.21");
const OID_HOLD_INSTRUCTION_CODE: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.29.23");
const OID_INVALIDITY_DATE: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.29.24");
const OID_CERTIFICATE_ISSUER: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.29.29");

/// A CRL carrying a critical extension outside this list is unusable
/// (RFC 5280 Section 5.2).
const RECOGNIZED_CRL_EXTENSIONS: &[ObjectIdentifier] = &[
    OID_AUTHORITY_KEY_IDENTIFIER,
    OID_ISSUER_ALT_NAME,
    OID_CRL_NUMBER,
    OID_ISSUING_DISTRIBUTION_POINT,
    OID_FRESHEST_CRL,
];

const RECOGNIZED_CRL_ENTRY_EXTENSIONS: &[ObjectIdentifier] = &[
    OID_CRL_REASON,
    OID_HOLD_INSTRUCTION_CODE,
    OID_INVALIDITY_DATE,
    OID_CERTIFICATE_ISSUER,
];

pub(crate) struct CrlFetcher {
    http: Arc<dyn HttpClient>,
}

impl CrlFetcher {
    pub(crate) fn new(http: Arc<dyn HttpClient>) -> Self {
        Self { http }
    }

    /// Refresh the CRL published by `ca`, unless a refresh for it is already
    /// in flight. Distribution points are tried in declaration order; the
    /// first accepted CRL wins.
    pub(crate) async fn try_refresh(&self, ca: Arc<Cert>) {
        let Ok(_guard) = ca.fetch_lock().try_lock() else {
            tracing::debug!(subject = ca.subject_str(), "CRL refresh already in flight");
            return;
        };

        let urls = ca.crl_distribution_points();
        if urls.is_empty() {
            ca.store_fetch_error("no CRL distribution points".to_string());
            return;
        }

        let mut last_error = String::new();
        for url in urls {
            match self.fetch_one(&ca, url).await {
                Ok(crl) => {
                    tracing::info!(subject = ca.subject_str(), url, "CRL refreshed");
                    ca.store_crl(crl);
                    return;
                }
                Err(e) => {
                    tracing::warn!(subject = ca.subject_str(), url, "CRL fetch failed: {e}");
                    last_error = e;
                }
            }
        }
        ca.store_fetch_error(last_error);
    }

    async fn fetch_one(&self, ca: &Cert, url: &str) -> Result<CertificateList, String> {
        let body = self.http.get(url).await.map_err(|e| e.to_string())?;
        let crls =
            parse_crls(&body).map_err(|e| format!("could not parse CRL from '{url}': {e}"))?;
        if crls.is_empty() {
            return Err(format!("'{url}' contained no CRL"));
        }
        let mut last_rejection = String::new();
        for crl in crls {
            match accept_crl(ca, &crl) {
                Ok(()) => return Ok(crl),
                Err(reason) => last_rejection = reason,
            }
        }
        Err(format!("no acceptable CRL at '{url}': {last_rejection}"))
    }
}

/// Parse every CRL in the input, which may be PEM blocks or a trailing DER
/// stream.
pub(crate) fn parse_crls(bytes: &[u8]) -> Result<Vec<CertificateList>, Error> {
    if let Some(text) = certificate::as_pem_text(bytes) {
        let mut crls = Vec::new();
        for block in certificate::pem_blocks(text) {
            let (label, der) = pem_rfc7468::decode_vec(block.as_bytes())?;
            if label != "X509 CRL" {
                continue;
            }
            crls.push(CertificateList::from_der(&der).map_err(Error::ParseCrl)?);
        }
        return Ok(crls);
    }

    let mut reader = SliceReader::new(bytes).map_err(Error::ParseCrl)?;
    let mut crls = Vec::new();
    while !reader.is_finished() {
        crls.push(reader.decode().map_err(Error::ParseCrl)?);
    }
    Ok(crls)
}

/// A CRL is accepted for `ca` when its issuer name is `ca`'s subject, every
/// critical extension is recognized, and `ca`'s key verifies its signature.
pub(crate) fn accept_crl(ca: &Cert, crl: &CertificateList) -> Result<(), String> {
    if crl.tbs_cert_list.issuer != ca.certificate().tbs_certificate.subject {
        let issuer = name::canonical_name(&crl.tbs_cert_list.issuer);
        return Err(format!("CRL issued by '{issuer}'"));
    }

    for ext in crl.tbs_cert_list.crl_extensions.iter().flatten() {
        if ext.critical && !RECOGNIZED_CRL_EXTENSIONS.contains(&ext.extn_id) {
            return Err(format!("unrecognized critical extension {}", ext.extn_id));
        }
    }
    for revoked in crl.tbs_cert_list.revoked_certificates.iter().flatten() {
        for ext in revoked.crl_entry_extensions.iter().flatten() {
            if ext.critical && !RECOGNIZED_CRL_ENTRY_EXTENSIONS.contains(&ext.extn_id) {
                return Err(format!(
                    "unrecognized critical entry extension {}",
                    ext.extn_id
                ));
            }
        }
    }

    let message = crl
        .tbs_cert_list
        .to_der()
        .map_err(|e| format!("could not re-encode CRL: {e}"))?;
    signature::verify_with_key(
        &ca.certificate().tbs_certificate.subject_public_key_info,
        crl.signature_algorithm.oid,
        &message,
        crl.signature.raw_bytes(),
    )
    .map_err(|e| e.to_string())
}

/// Shared scheduler for background CRL refreshes. Spawned tasks are tracked
/// so callers can wait for quiescence.
#[derive(Clone)]
pub(crate) struct RefreshHandle {
    fetcher: Arc<CrlFetcher>,
    tasks: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl RefreshHandle {
    pub(crate) fn new(http: Arc<dyn HttpClient>) -> Self {
        Self {
            fetcher: Arc::new(CrlFetcher::new(http)),
            tasks: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Spawn a background refresh for `ca`. Outside a tokio runtime the
    /// refresh is skipped; the status simply stays unknown until a runtime
    /// is available.
    pub(crate) fn schedule(&self, ca: Arc<Cert>) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!(
                subject = ca.subject_str(),
                "no async runtime, skipping CRL refresh"
            );
            return;
        };
        let fetcher = Arc::clone(&self.fetcher);
        let task = runtime.spawn(async move { fetcher.try_refresh(ca).await });
        self.tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(task);
    }

    /// Wait until every scheduled refresh has finished.
    pub(crate) async fn wait(&self) {
        loop {
            let task = self
                .tasks
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .pop();
            match task {
                Some(task) => {
                    let _ = task.await;
                }
                None => return,
            }
        }
    }
}
