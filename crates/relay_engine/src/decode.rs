use chardetng::EncodingDetector;
use encoding_rs::Encoding;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("page bytes are not valid {encoding}")]
    Malformed { encoding: String },
}

/// Decodes a page body to UTF-8.
///
/// Order of precedence: byte order mark, `charset` of the Content-Type header,
/// then a chardetng guess over the whole body.
pub fn decode_page(bytes: &[u8], content_type: Option<&str>) -> Result<String, DecodeError> {
    let encoding = Encoding::for_bom(bytes)
        .map(|(encoding, _)| encoding)
        .or_else(|| {
            content_type
                .and_then(charset_label)
                .and_then(|label| Encoding::for_label(label.as_bytes()))
        })
        .unwrap_or_else(|| {
            let mut detector = EncodingDetector::new();
            detector.feed(bytes, true);
            detector.guess(None, true)
        });

    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        return Err(DecodeError::Malformed {
            encoding: encoding.name().to_string(),
        });
    }
    Ok(text.into_owned())
}

fn charset_label(content_type: &str) -> Option<String> {
    content_type.split(';').find_map(|param| {
        let (key, value) = param.split_once('=')?;
        key.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches(['"', '\'']).to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::decode_page;

    #[test]
    fn header_charset_wins_over_detection() {
        let latin1 = b"caf\xe9";
        let text = decode_page(latin1, Some("text/html; Charset=\"ISO-8859-1\"")).unwrap();
        assert_eq!(text, "café");
    }

    #[test]
    fn bom_overrides_header() {
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice("naïve".as_bytes());
        let text = decode_page(&bytes, Some("text/html; charset=windows-1252")).unwrap();
        assert_eq!(text, "naïve");
    }

    #[test]
    fn plain_ascii_without_hints() {
        assert_eq!(decode_page(b"<p>ok</p>", None).unwrap(), "<p>ok</p>");
    }
}
