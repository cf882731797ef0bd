//! Extraction of the accredited-CA bundle, a zip of certificate files.

use std::io::{Cursor, Read};
use std::sync::Arc;

use zip::ZipArchive;

use crate::certificate::Cert;
use crate::error::Error;

/// Parse every certificate out of the bundle, in archive order. Entries that
/// do not parse as certificates (readme files and the like) are skipped.
pub(crate) fn extract_certs(bytes: &[u8]) -> Result<Vec<Arc<Cert>>, Error> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    let mut certs = Vec::new();
    for index in 0..archive.len() {
        let mut file = archive.by_index(index)?;
        if file.is_dir() {
            continue;
        }
        let mut data = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut data)?;
        match Cert::parse_all(&data) {
            Ok(parsed) => certs.extend(parsed),
            Err(e) => tracing::warn!(name = file.name(), "skipping bundle entry: {e}"),
        }
    }
    Ok(certs)
}
