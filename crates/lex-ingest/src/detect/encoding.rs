//! Charset guessing over a byte sample.

use chardetng::EncodingDetector;
use encoding_rs::{Encoding, UTF_8};
use tracing::debug;

/// Guess the text encoding of `sample`.
///
/// Order of evidence: a byte-order mark, then UTF-8 validity, then the
/// statistical detector. A detector guess that does not beat the other
/// candidates is discarded in favour of UTF-8.
pub fn detect_encoding(sample: &[u8]) -> &'static Encoding {
    if let Some((encoding, _)) = Encoding::for_bom(sample) {
        debug!("Byte-order mark found: {}", encoding.name());
        return encoding;
    }

    if is_utf8_prefix(sample) {
        return UTF_8;
    }

    let mut detector = EncodingDetector::new();
    detector.feed(sample, true);
    let (encoding, confident) = detector.guess_assess(None, false);

    if confident {
        debug!("Charset detector guessed {}", encoding.name());
        encoding
    } else {
        debug!(
            "Charset detector guess {} is not confident, defaulting to UTF-8",
            encoding.name()
        );
        UTF_8
    }
}

/// Valid UTF-8, allowing the sample to end in the middle of a multi-byte sequence.
fn is_utf8_prefix(sample: &[u8]) -> bool {
    match std::str::from_utf8(sample) {
        Ok(_) => true,
        Err(e) => e.error_len().is_none(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use encoding_rs::{UTF_16LE, WINDOWS_1252};

    #[test]
    fn test_ascii_is_utf8() {
        assert_eq!(detect_encoding(b"a|b|c\n1|2|3\n"), UTF_8);
    }

    #[test]
    fn test_empty_sample_is_utf8() {
        assert_eq!(detect_encoding(b""), UTF_8);
    }

    #[test]
    fn test_utf8_with_multibyte() {
        let text = "name|city\nJosé|Zürich\n";
        assert_eq!(detect_encoding(text.as_bytes()), UTF_8);
    }

    #[test]
    fn test_truncated_multibyte_tail_is_utf8() {
        let text = "name|city\nJosé|Zürich";
        let bytes = text.as_bytes();
        // Cut inside the two-byte 'ü'.
        let cut = bytes.iter().position(|&b| b == 0xC3).unwrap() + 1;
        let cut = bytes[cut..].iter().position(|&b| b == 0xC3).unwrap() + cut + 1;
        assert_eq!(detect_encoding(&bytes[..cut]), UTF_8);
    }

    #[test]
    fn test_bom_wins() {
        let mut bytes = vec![0xFF, 0xFE];
        bytes.extend("a|b".encode_utf16().flat_map(|u| u.to_le_bytes()));
        assert_eq!(detect_encoding(&bytes), UTF_16LE);
    }

    #[test]
    fn test_legacy_single_byte_text() {
        let text = "Nom|Ville|Remarque\n\
                    Hélène|Besançon|Très bien, déjà réglé à l'été\n\
                    François|Orléans|Crème brûlée, garçon, façade, élève\n\
                    Amélie|Nîmes|Réclamation reçue après l'échéance prévue\n";
        let (bytes, _, _) = WINDOWS_1252.encode(text);
        let guessed = detect_encoding(&bytes);
        let (decoded, _, had_errors) = guessed.decode(&bytes);
        assert!(!had_errors);
        assert!(decoded.contains("Hélène"));
    }
}
