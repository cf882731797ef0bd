//! Embedded root certificates seeded at store construction.

/// Autoridade Certificadora Raiz Brasileira v2.
pub(crate) const AC_RAIZ_V2: &[u8] = include_bytes!("roots/ac_raiz_v2.pem");

/// Autoridade Certificadora Raiz Brasileira v5.
pub(crate) const AC_RAIZ_V5: &[u8] = include_bytes!("roots/ac_raiz_v5.pem");

pub(crate) const EMBEDDED_ROOTS: &[&[u8]] = &[AC_RAIZ_V2, AC_RAIZ_V5];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::certificate::Cert;

    #[test]
    fn embedded_roots_are_self_signed_cas() {
        for pem in EMBEDDED_ROOTS {
            let root = Cert::from_pem(pem).unwrap();
            assert!(root.is_self_signed(), "{}", root.subject_str());
            assert!(root.is_ca(), "{}", root.subject_str());
        }
    }
}
