//! Encoding and shape detection for uploaded statement files

use crate::types::{ReconcileError, ReconcileResult};

/// ZIP local-file-header signature; xlsx/ods uploads start with this
const ZIP_SIGNATURE: [u8; 4] = [0x50, 0x4B, 0x03, 0x04];

/// Bytes sampled when estimating the zero-byte fraction
const SNIFF_LEN: usize = 4096;

/// Zero-byte fraction above which the file is treated as UTF-16
const UTF16_ZERO_THRESHOLD: f64 = 0.05;

/// Decode raw uploaded bytes into text.
///
/// Spreadsheet containers are rejected outright with a message telling the
/// user to re-export as delimited text. Files with a high zero-byte fraction
/// in the first 4096 bytes are decoded as UTF-16 (little-endian first, then
/// big-endian); everything else is decoded as UTF-8 with a leading BOM
/// stripped.
pub fn decode_statement_bytes(bytes: &[u8]) -> ReconcileResult<String> {
    if bytes.is_empty() {
        return Err(ReconcileError::EmptyFile);
    }
    if bytes.len() >= 4 && bytes[..4] == ZIP_SIGNATURE {
        return Err(ReconcileError::SpreadsheetUpload);
    }

    let sample = &bytes[..bytes.len().min(SNIFF_LEN)];
    let zero_fraction =
        sample.iter().filter(|b| **b == 0).count() as f64 / sample.len() as f64;

    let text = if zero_fraction > UTF16_ZERO_THRESHOLD {
        tracing::debug!(zero_fraction, "statement looks like UTF-16");
        decode_utf16(bytes)
    } else {
        String::from_utf8_lossy(bytes).into_owned()
    };

    Ok(text.trim_start_matches('\u{feff}').to_string())
}

/// Decode UTF-16 bytes, honouring a BOM when present and otherwise trying
/// little-endian first with a big-endian fallback.
fn decode_utf16(bytes: &[u8]) -> String {
    match bytes {
        [0xFF, 0xFE, rest @ ..] => decode_utf16_units(rest, u16::from_le_bytes)
            .unwrap_or_else(|| lossy_utf16(rest, u16::from_le_bytes)),
        [0xFE, 0xFF, rest @ ..] => decode_utf16_units(rest, u16::from_be_bytes)
            .unwrap_or_else(|| lossy_utf16(rest, u16::from_be_bytes)),
        _ => decode_utf16_units(bytes, u16::from_le_bytes)
            .or_else(|| decode_utf16_units(bytes, u16::from_be_bytes))
            .unwrap_or_else(|| lossy_utf16(bytes, u16::from_le_bytes)),
    }
}

fn collect_units(bytes: &[u8], from_bytes: fn([u8; 2]) -> u16) -> Vec<u16> {
    bytes
        .chunks_exact(2)
        .map(|pair| from_bytes([pair[0], pair[1]]))
        .collect()
}

fn decode_utf16_units(bytes: &[u8], from_bytes: fn([u8; 2]) -> u16) -> Option<String> {
    String::from_utf16(&collect_units(bytes, from_bytes)).ok()
}

fn lossy_utf16(bytes: &[u8], from_bytes: fn([u8; 2]) -> u16) -> String {
    String::from_utf16_lossy(&collect_units(bytes, from_bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zip_signature() {
        let bytes = [0x50, 0x4B, 0x03, 0x04, 0x00, 0x00];
        assert!(matches!(
            decode_statement_bytes(&bytes),
            Err(ReconcileError::SpreadsheetUpload)
        ));
    }

    #[test]
    fn rejects_empty_file() {
        assert!(matches!(
            decode_statement_bytes(&[]),
            Err(ReconcileError::EmptyFile)
        ));
    }

    #[test]
    fn decodes_utf8_and_strips_bom() {
        let bytes = [0xEF, 0xBB, 0xBF, b'd', b'a', b't', b'e'];
        assert_eq!(decode_statement_bytes(&bytes).unwrap(), "date");
    }

    #[test]
    fn decodes_utf16_le_without_bom() {
        let mut bytes = Vec::new();
        for c in "date,amount\n1,2".encode_utf16() {
            bytes.extend_from_slice(&c.to_le_bytes());
        }
        assert_eq!(decode_statement_bytes(&bytes).unwrap(), "date,amount\n1,2");
    }

    #[test]
    fn decodes_utf16_be_with_bom() {
        let mut bytes = vec![0xFE, 0xFF];
        for c in "date,amount".encode_utf16() {
            bytes.extend_from_slice(&c.to_be_bytes());
        }
        assert_eq!(decode_statement_bytes(&bytes).unwrap(), "date,amount");
    }
}
