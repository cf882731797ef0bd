//! Canonical single-line rendering of X.501 names.
//!
//! The rendering uses a fixed attribute ordering (Country, State, Locality,
//! Organization, OrgUnit, CommonName, Email, then any remaining attributes
//! sorted by OID) so that two encodings of the same name always produce the
//! same string. This string doubles as the fallback identity key for
//! certificates lacking key-identifier extensions, so it must be computed
//! identically everywhere.

use const_oid::ObjectIdentifier;
use der::{
    asn1::{Ia5StringRef, PrintableStringRef, TeletexStringRef, Utf8StringRef},
    Tag, Tagged,
};
use x509_cert::{attr::AttributeValue, name::Name};

const OID_COUNTRY: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.6");
const OID_STATE_OR_PROVINCE: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.8");
const OID_LOCALITY: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.7");
const OID_ORGANIZATION: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.10");
const OID_ORGANIZATIONAL_UNIT: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.11");
const OID_COMMON_NAME: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.3");
const OID_EMAIL_ADDRESS: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.9.1");

/// Attributes rendered first, in this exact order.
const ORDERED_ATTRIBUTES: &[(ObjectIdentifier, &str)] = &[
    (OID_COUNTRY, "C"),
    (OID_STATE_OR_PROVINCE, "ST"),
    (OID_LOCALITY, "L"),
    (OID_ORGANIZATION, "O"),
    (OID_ORGANIZATIONAL_UNIT, "OU"),
    (OID_COMMON_NAME, "CN"),
    (OID_EMAIL_ADDRESS, "E"),
];

/// Render a name as its canonical single-line string.
pub fn canonical_name(name: &Name) -> String {
    let attributes: Vec<(ObjectIdentifier, String)> = name
        .0
        .iter()
        .flat_map(|rdn| rdn.0.iter())
        .map(|atv| (atv.oid, attribute_value_string(&atv.value)))
        .collect();

    let mut parts: Vec<String> = Vec::with_capacity(attributes.len());
    for (oid, label) in ORDERED_ATTRIBUTES {
        for (_, value) in attributes.iter().filter(|(o, _)| o == oid) {
            parts.push(format!("{label}={value}"));
        }
    }

    let mut remaining: Vec<&(ObjectIdentifier, String)> = attributes
        .iter()
        .filter(|(oid, _)| !ORDERED_ATTRIBUTES.iter().any(|(o, _)| o == oid))
        .collect();
    remaining.sort_by_key(|(oid, _)| oid.to_string());
    for (oid, value) in remaining {
        parts.push(format!("{oid}={value}"));
    }

    parts.join(", ")
}

/// Get the first CommonName of a name, if any.
pub fn common_name(name: &Name) -> Option<String> {
    name.0
        .iter()
        .flat_map(|rdn| rdn.0.iter())
        .find(|atv| atv.oid == OID_COMMON_NAME)
        .map(|atv| attribute_value_string(&atv.value))
}

fn attribute_value_string(av: &AttributeValue) -> String {
    attribute_value_to_str(av)
        .map(str::to_string)
        // Non-string attribute values are rare in this profile; keep them
        // stable by falling back to the hex of the raw DER value.
        .unwrap_or_else(|| hex::encode(av.value()))
}

fn attribute_value_to_str(av: &AttributeValue) -> Option<&str> {
    match av.tag() {
        Tag::PrintableString => PrintableStringRef::try_from(av).ok().map(|s| s.as_str()),
        Tag::Utf8String => Utf8StringRef::try_from(av).ok().map(|s| s.as_str()),
        Tag::Ia5String => Ia5StringRef::try_from(av).ok().map(|s| s.as_str()),
        Tag::TeletexString => TeletexStringRef::try_from(av).ok().map(|s| s.as_str()),
        _ => None,
    }
}
