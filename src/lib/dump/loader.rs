use std::{io::Read, path::Path};

use flate2::read::GzDecoder;
use serde_json::Value;
use tracing::*;

use super::{
    error::{DumpError, Result},
    format::DumpFormat,
    types::DumpDocument,
};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Read a dump from disk. Gzip input is recognized by its magic bytes and
/// inflated first. With `format` set, sniffing is skipped.
#[instrument(level = "debug")]
pub fn load(path: &Path, format: Option<DumpFormat>) -> Result<DumpDocument> {
    let bytes = std::fs::read(path).map_err(|source| DumpError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    debug!("Read {} bytes", bytes.len());

    parse(&bytes, format)
}

pub fn parse(bytes: &[u8], format: Option<DumpFormat>) -> Result<DumpDocument> {
    let bytes = decompress(bytes)?;
    let document: Value = serde_json::from_slice(&bytes)?;

    match format {
        Some(format) => DumpDocument::from_value_as(&document, format),
        None => DumpDocument::from_value(&document),
    }
}

/// Inflate `bytes` if they are a gzip stream, otherwise return them untouched.
pub fn decompress(bytes: &[u8]) -> Result<std::borrow::Cow<'_, [u8]>> {
    if !bytes.starts_with(&GZIP_MAGIC) {
        return Ok(bytes.into());
    }

    let mut inflated = Vec::with_capacity(bytes.len() * 4);
    GzDecoder::new(bytes)
        .read_to_end(&mut inflated)
        .map_err(DumpError::Decompress)?;
    debug!("Inflated {} gzip bytes into {}", bytes.len(), inflated.len());

    Ok(inflated.into())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use flate2::{write::GzEncoder, Compression};

    use super::*;

    const EVENT_LOG: &str = r#"{"peerConnections": {"pc0": [{"type": "getStats", "value": {}}]}}"#;

    #[test]
    fn plain_json_is_parsed() {
        let document = parse(EVENT_LOG.as_bytes(), None).unwrap();
        assert_eq!(document.format(), DumpFormat::EventLog);
        assert_eq!(document.len(), 1);
    }

    #[test]
    fn gzip_json_is_inflated() {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(EVENT_LOG.as_bytes()).unwrap();
        let compressed = encoder.finish().unwrap();

        let document = parse(&compressed, None).unwrap();
        assert_eq!(document.len(), 1);
    }

    #[test]
    fn truncated_gzip_is_an_error() {
        let error = parse(&[0x1f, 0x8b, 0x08], None).unwrap_err();
        assert!(matches!(error, DumpError::Decompress(_)));
    }

    #[test]
    fn invalid_json_is_an_error() {
        let error = parse(b"{not json", None).unwrap_err();
        assert!(matches!(error, DumpError::Json(_)));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let error = load(Path::new("/nonexistent/dump.json"), None).unwrap_err();
        assert!(matches!(error, DumpError::Io { .. }));
    }
}
