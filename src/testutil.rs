//! Certificate and CRL fixtures for the test suites.
//!
//! Everything is built through the x509-cert builder with a manual profile so
//! each test controls exactly which extensions are present.

use std::str::FromStr;
use std::sync::Arc;
use std::time::SystemTime;

use const_oid::db::rfc5912::SHA_256_WITH_RSA_ENCRYPTION;
use der::asn1::{AnyRef, BitString, Ia5String, OctetString, UtcTime};
use der::{DateTime, Encode};
use rsa::pkcs1v15::SigningKey;
use rsa::RsaPrivateKey;
use sha1::{Digest, Sha1};
use sha2::Sha256;
use signature::{Keypair, SignatureEncoding, Signer};
use time::OffsetDateTime;
use x509_cert::builder::{Builder, CertificateBuilder, Profile};
use x509_cert::crl::{CertificateList, RevokedCert, TbsCertList};
use x509_cert::ext::pkix::crl::dp::DistributionPoint;
use x509_cert::ext::pkix::name::{DistributionPointName, GeneralName};
use x509_cert::ext::pkix::{
    AuthorityKeyIdentifier, BasicConstraints, CrlDistributionPoints, KeyUsage, KeyUsages,
    SubjectKeyIdentifier,
};
use x509_cert::name::Name;
use x509_cert::serial_number::SerialNumber;
use x509_cert::spki::{AlgorithmIdentifierOwned, SubjectPublicKeyInfoOwned};
use x509_cert::time::{Time, Validity};
use x509_cert::Version;

use crate::certificate::Cert;

pub(crate) fn rsa_signing_key() -> SigningKey<Sha256> {
    let mut rng = rand::thread_rng();
    // 1024-bit keys generate quickly
    let key = RsaPrivateKey::new(&mut rng, 1024).unwrap();
    SigningKey::new(key)
}

pub(crate) struct CertParams<'a> {
    pub subject: &'a str,
    pub issuer: &'a str,
    pub serial: u64,
    pub key_usages: KeyUsage,
    /// `None` omits Basic Constraints entirely; `Some(path_len)` asserts a CA
    /// with that constraint.
    pub ca: Option<Option<u8>>,
    pub crl_url: Option<&'a str>,
}

pub(crate) fn build_cert(
    params: CertParams<'_>,
    subject_key: &SigningKey<Sha256>,
    signer_key: &SigningKey<Sha256>,
) -> Arc<Cert> {
    let issuer = Name::from_str(params.issuer).unwrap();
    let bc = params.ca.map(|path_len| BasicConstraints {
        ca: true,
        path_len_constraint: path_len,
    });
    let urls: Vec<&str> = params.crl_url.into_iter().collect();
    issue(
        params.subject,
        issuer,
        params.serial,
        Some(params.key_usages),
        bc,
        &urls,
        true,
        subject_key,
        signer_key,
    )
}

/// A certificate with no extensions at all, signed with its own key.
pub(crate) fn build_bare_cert(
    subject: &str,
    issuer: &str,
    serial: u64,
    key: &SigningKey<Sha256>,
) -> Arc<Cert> {
    let issuer = Name::from_str(issuer).unwrap();
    issue(subject, issuer, serial, None, None, &[], false, key, key)
}

pub(crate) fn build_root(subject: &str, serial: u64, key: &SigningKey<Sha256>) -> Arc<Cert> {
    root_with(subject, serial, key, None, &[])
}

pub(crate) fn build_root_with_path_len(
    subject: &str,
    serial: u64,
    key: &SigningKey<Sha256>,
    path_len: Option<u8>,
) -> Arc<Cert> {
    root_with(subject, serial, key, path_len, &[])
}

pub(crate) fn build_root_with_crl_url(
    subject: &str,
    serial: u64,
    key: &SigningKey<Sha256>,
    url: &str,
) -> Arc<Cert> {
    root_with(subject, serial, key, None, &[url])
}

pub(crate) fn build_root_with_crl_urls(
    subject: &str,
    serial: u64,
    key: &SigningKey<Sha256>,
    urls: &[&str],
) -> Arc<Cert> {
    root_with(subject, serial, key, None, urls)
}

fn root_with(
    subject: &str,
    serial: u64,
    key: &SigningKey<Sha256>,
    path_len: Option<u8>,
    urls: &[&str],
) -> Arc<Cert> {
    issue(
        subject,
        Name::from_str(subject).unwrap(),
        serial,
        Some(KeyUsage(KeyUsages::KeyCertSign | KeyUsages::CRLSign)),
        Some(BasicConstraints {
            ca: true,
            path_len_constraint: path_len,
        }),
        urls,
        true,
        key,
        key,
    )
}

pub(crate) fn build_ca(
    subject: &str,
    issuer: &Cert,
    serial: u64,
    key: &SigningKey<Sha256>,
    signer_key: &SigningKey<Sha256>,
) -> Arc<Cert> {
    issue(
        subject,
        issuer.subject_name().clone(),
        serial,
        Some(KeyUsage(KeyUsages::KeyCertSign | KeyUsages::CRLSign)),
        Some(BasicConstraints {
            ca: true,
            path_len_constraint: None,
        }),
        &[],
        true,
        key,
        signer_key,
    )
}

pub(crate) fn build_ca_with_crl_url(
    subject: &str,
    issuer: &Cert,
    serial: u64,
    key: &SigningKey<Sha256>,
    signer_key: &SigningKey<Sha256>,
    url: &str,
) -> Arc<Cert> {
    issue(
        subject,
        issuer.subject_name().clone(),
        serial,
        Some(KeyUsage(KeyUsages::KeyCertSign | KeyUsages::CRLSign)),
        Some(BasicConstraints {
            ca: true,
            path_len_constraint: None,
        }),
        &[url],
        true,
        key,
        signer_key,
    )
}

pub(crate) fn build_leaf(
    subject: &str,
    issuer: &Cert,
    serial: u64,
    key: &SigningKey<Sha256>,
    signer_key: &SigningKey<Sha256>,
) -> Arc<Cert> {
    issue(
        subject,
        issuer.subject_name().clone(),
        serial,
        Some(KeyUsage(KeyUsages::DigitalSignature | KeyUsages::NonRepudiation)),
        None,
        &[],
        true,
        key,
        signer_key,
    )
}

/// A CA certificate whose issuer is another subject entirely; pairs of these
/// form issuer cycles.
pub(crate) fn build_cross_signed(
    subject: &str,
    issuer: &str,
    serial: u64,
    key: &SigningKey<Sha256>,
    signer_key: &SigningKey<Sha256>,
) -> Arc<Cert> {
    issue(
        subject,
        Name::from_str(issuer).unwrap(),
        serial,
        Some(KeyUsage(KeyUsages::KeyCertSign | KeyUsages::CRLSign)),
        Some(BasicConstraints {
            ca: true,
            path_len_constraint: None,
        }),
        &[],
        true,
        key,
        signer_key,
    )
}

#[allow(clippy::too_many_arguments)]
fn issue(
    subject: &str,
    issuer: Name,
    serial: u64,
    key_usage: Option<KeyUsage>,
    basic_constraints: Option<BasicConstraints>,
    crl_urls: &[&str],
    with_key_ids: bool,
    subject_key: &SigningKey<Sha256>,
    signer_key: &SigningKey<Sha256>,
) -> Arc<Cert> {
    let now = OffsetDateTime::now_utc();
    let validity = Validity {
        not_before: to_time(now - time::Duration::hours(1)),
        not_after: to_time(now + time::Duration::days(3650)),
    };
    let spki = spki_of(subject_key);

    let mut builder = CertificateBuilder::new(
        Profile::Manual {
            issuer: Some(issuer),
        },
        SerialNumber::from(serial),
        validity,
        Name::from_str(subject).unwrap(),
        spki.clone(),
        signer_key,
    )
    .unwrap();

    if let Some(ku) = key_usage {
        builder.add_extension(&ku).unwrap();
    }
    if let Some(bc) = basic_constraints {
        builder.add_extension(&bc).unwrap();
    }
    if with_key_ids {
        builder
            .add_extension(&SubjectKeyIdentifier(
                OctetString::new(key_id(&spki)).unwrap(),
            ))
            .unwrap();
        let signer_spki = spki_of(signer_key);
        builder
            .add_extension(&AuthorityKeyIdentifier {
                key_identifier: Some(OctetString::new(key_id(&signer_spki)).unwrap()),
                authority_cert_issuer: None,
                authority_cert_serial_number: None,
            })
            .unwrap();
    }
    if !crl_urls.is_empty() {
        let points = crl_urls
            .iter()
            .map(|url| DistributionPoint {
                distribution_point: Some(DistributionPointName::FullName(vec![
                    GeneralName::UniformResourceIdentifier(Ia5String::new(url).unwrap()),
                ])),
                reasons: None,
                crl_issuer: None,
            })
            .collect();
        builder
            .add_extension(&CrlDistributionPoints(points))
            .unwrap();
    }

    let tbs = builder.finalize().unwrap();
    let signature: rsa::pkcs1v15::Signature = signer_key.sign(&tbs);
    let cert = builder
        .assemble(BitString::from_bytes(&signature.to_bytes()).unwrap())
        .unwrap();
    Arc::new(Cert::from_certificate(cert).unwrap())
}

pub(crate) fn build_crl(
    issuer: &Cert,
    key: &SigningKey<Sha256>,
    revoked: &[u64],
    this_update: OffsetDateTime,
    next_update: OffsetDateTime,
) -> CertificateList {
    let algorithm = AlgorithmIdentifierOwned {
        oid: SHA_256_WITH_RSA_ENCRYPTION,
        parameters: Some(AnyRef::NULL.into()),
    };
    let revoked_certificates = (!revoked.is_empty()).then(|| {
        revoked
            .iter()
            .map(|serial| RevokedCert {
                serial_number: SerialNumber::from(*serial),
                revocation_date: to_time(this_update),
                crl_entry_extensions: None,
            })
            .collect()
    });
    let tbs_cert_list = TbsCertList {
        version: Version::V2,
        signature: algorithm.clone(),
        issuer: issuer.subject_name().clone(),
        this_update: to_time(this_update),
        next_update: Some(to_time(next_update)),
        revoked_certificates,
        crl_extensions: None,
    };

    let message = tbs_cert_list.to_der().unwrap();
    let signature: rsa::pkcs1v15::Signature = key.sign(&message);
    CertificateList {
        tbs_cert_list,
        signature_algorithm: algorithm,
        signature: BitString::from_bytes(&signature.to_bytes()).unwrap(),
    }
}

pub(crate) fn to_pem(cert: &Cert) -> String {
    pem_rfc7468::encode_string("CERTIFICATE", pem_rfc7468::LineEnding::LF, cert.der_bytes())
        .unwrap()
}

fn spki_of(key: &SigningKey<Sha256>) -> SubjectPublicKeyInfoOwned {
    SubjectPublicKeyInfoOwned::from_key(key.verifying_key()).unwrap()
}

fn key_id(spki: &SubjectPublicKeyInfoOwned) -> Vec<u8> {
    Sha1::digest(spki.subject_public_key.raw_bytes()).to_vec()
}

fn to_time(t: OffsetDateTime) -> Time {
    let dt = DateTime::from_system_time(SystemTime::from(t)).unwrap();
    Time::UtcTime(UtcTime::from_date_time(dt).unwrap())
}
