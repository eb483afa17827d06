use chardetng::EncodingDetector;
use encoding_rs::Encoding;

use crate::types::{FailureKind, RenderError};

/// Decodes a page body to UTF-8.
///
/// Order of precedence: byte-order mark, then the `charset` parameter of the
/// Content-Type header, then a chardetng guess over the whole body.
pub fn decode_body(bytes: &[u8], content_type: Option<&str>) -> Result<String, RenderError> {
    if let Some((encoding, _)) = Encoding::for_bom(bytes) {
        return decode_as(bytes, encoding);
    }

    let declared = content_type
        .and_then(charset_parameter)
        .and_then(|label| Encoding::for_label(label.as_bytes()));
    if let Some(encoding) = declared {
        return decode_as(bytes, encoding);
    }

    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    decode_as(bytes, detector.guess(None, true))
}

fn charset_parameter(content_type: &str) -> Option<String> {
    content_type.split(';').skip(1).find_map(|param| {
        let (name, value) = param.split_once('=')?;
        name.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches(['"', '\'']).to_string())
    })
}

fn decode_as(bytes: &[u8], encoding: &'static Encoding) -> Result<String, RenderError> {
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        return Err(RenderError::new(
            FailureKind::Decode,
            format!("malformed {} body", encoding.name()),
        ));
    }
    Ok(text.into_owned())
}
