//! RFC-2397 `data:` URI grammar, as used to recognize an ESIP-0 create.
//!
//! ```text
//! data-url  = "data:" [ mediatype ] [ ";base64" ] "," payload
//! mediatype = [ type "/" subtype ] *( ";" parameter )
//! ```
//!
//! A missing `mediatype` is equivalent to `text/plain;charset=US-ASCII`.
//! Parsing is byte-exact over the UTF-8 decoding of the input; there is no
//! percent-decoding or whitespace trimming.

use base64::{engine::general_purpose::STANDARD, Engine as _};

/// The maximum mediatype length forwarded downstream; longer mediatypes are
/// clamped rather than rejected.
const MAX_MIMETYPE_LEN: usize = 1000;

/// Result of successfully parsing a `data:` URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri {
    /// `true` if the mediatype parameter list contained `rule=esip6`.
    pub esip6: bool,
    /// The mediatype's length after clamping to [`MAX_MIMETYPE_LEN`].
    pub mimetype_len: usize,
}

/// Parses `input` as a `data:` URI. Returns `None` if it is not valid UTF-8,
/// lacks the `data:` scheme, has no comma separating the header from the
/// payload, or (when `;base64` is present) the payload does not decode.
pub fn parse(input: &[u8]) -> Option<DataUri> {
    let text = core::str::from_utf8(input).ok()?;
    let rest = text.strip_prefix("data:")?;
    let comma_index = rest.find(',')?;
    let (header, payload) = (&rest[..comma_index], &rest[comma_index + 1..]);

    let (media_and_params, is_base64) = match header.strip_suffix(";base64") {
        Some(stripped) => (stripped, true),
        None => (header, false),
    };

    if is_base64 && STANDARD.decode(payload).is_err() {
        return None;
    }

    let mediatype = if media_and_params.is_empty() {
        "text/plain;charset=US-ASCII"
    } else {
        media_and_params
    };
    let esip6 = mediatype.split(';').any(|param| param == "rule=esip6");

    Some(DataUri { esip6, mimetype_len: mediatype.len().min(MAX_MIMETYPE_LEN) })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_text() {
        let uri = parse(b"data:text/plain;charset=utf-8,Hello").unwrap();
        assert!(!uri.esip6);
    }

    #[test]
    fn missing_mediatype_defaults_to_text_plain_us_ascii() {
        let uri = parse(b"data:,Hello").unwrap();
        assert_eq!(uri.mimetype_len, "text/plain;charset=US-ASCII".len());
    }

    #[test]
    fn recognizes_esip6_rule_parameter() {
        let uri = parse(b"data:text/plain;rule=esip6,Hello").unwrap();
        assert!(uri.esip6);
    }

    #[test]
    fn rejects_missing_scheme() {
        assert!(parse(b"not-a-data-uri").is_none());
    }

    #[test]
    fn rejects_missing_comma() {
        assert!(parse(b"data:text/plain").is_none());
    }

    #[test]
    fn rejects_invalid_base64_payload() {
        assert!(parse(b"data:text/plain;base64,not valid base64!!!").is_none());
    }

    #[test]
    fn accepts_valid_base64_payload() {
        assert!(parse(b"data:image/png;base64,aGVsbG8=").is_some());
    }

    #[test]
    fn clamps_oversized_mimetype() {
        let huge = "a".repeat(2000);
        let input = format!("data:{huge},payload");
        let uri = parse(input.as_bytes()).unwrap();
        assert_eq!(uri.mimetype_len, MAX_MIMETYPE_LEN);
    }

    #[test]
    fn rejects_non_utf8_input() {
        assert!(parse(&[0xFF, 0xFE, 0xFD]).is_none());
    }
}
