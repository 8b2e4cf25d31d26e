use chardetng::EncodingDetector;
use encoding_rs::{Encoding, UTF_8};

/// Page text plus the name of the encoding it was read with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedHtml {
    pub html: String,
    pub encoding: &'static str,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("bytes are not valid {encoding}")]
    Malformed { encoding: &'static str },
}

/// Reads an exported page as text: BOM first, then plain UTF-8, then a chardetng guess.
pub fn decode_html(bytes: &[u8]) -> Result<DecodedHtml, DecodeError> {
    let encoding = match Encoding::for_bom(bytes) {
        Some((bom_encoding, _)) => bom_encoding,
        None if std::str::from_utf8(bytes).is_ok() => UTF_8,
        None => {
            let mut detector = EncodingDetector::new();
            detector.feed(bytes, true);
            detector.guess(None, true)
        }
    };

    // `decode` strips a matching BOM itself.
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        return Err(DecodeError::Malformed {
            encoding: encoding.name(),
        });
    }
    Ok(DecodedHtml {
        html: text.into_owned(),
        encoding: encoding.name(),
    })
}
