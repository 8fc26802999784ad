//! `Content-Disposition` filename extraction, used when a URL has no usable path segment.

/// Extracts the filename parameter from a raw `Content-Disposition` value.
///
/// `filename*=UTF-8''...` (RFC 5987, percent-encoded) wins over a plain
/// `filename=`; quoted values are unescaped. Returns `None` when neither
/// parameter carries a non-empty value.
pub fn parse_content_disposition_filename(header_value: &str) -> Option<String> {
    let mut plain: Option<String> = None;

    for param in header_value.split(';') {
        let Some((name, value)) = param.trim().split_once('=') else {
            continue;
        };
        let name = name.trim().to_ascii_lowercase();
        let value = value.trim();

        match name.as_str() {
            "filename*" => {
                if let Some(encoded) = strip_utf8_prefix(value) {
                    let decoded = percent_decode(unquote(encoded).as_str());
                    if !decoded.is_empty() {
                        return Some(decoded);
                    }
                }
            }
            "filename" => {
                let unquoted = unquote(value);
                if !unquoted.is_empty() {
                    plain = Some(unquoted);
                }
            }
            _ => {}
        }
    }

    plain
}

fn strip_utf8_prefix(value: &str) -> Option<&str> {
    let (charset, rest) = value.split_once('\'')?;
    if !charset.eq_ignore_ascii_case("utf-8") {
        return None;
    }
    // Skip the optional language tag between the two quotes.
    rest.split_once('\'').map(|(_, encoded)| encoded)
}

fn unquote(value: &str) -> String {
    let Some(inner) = value
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
    else {
        return value.to_string();
    };

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some(escaped @ ('"' | '\\')) => out.push(escaped),
                Some(other) => {
                    out.push(c);
                    out.push(other);
                }
                None => out.push(c),
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Lossy percent-decoding; malformed escapes are kept verbatim.
pub(crate) fn percent_decode(input: &str) -> String {
    String::from_utf8_lossy(&urlencoding::decode_binary(input.as_bytes())).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quoted_filename() {
        let name = parse_content_disposition_filename("attachment; filename=\"photo.png\"");
        assert_eq!(name.as_deref(), Some("photo.png"));
    }

    #[test]
    fn token_filename() {
        let name = parse_content_disposition_filename("inline; filename=photo.png");
        assert_eq!(name.as_deref(), Some("photo.png"));
    }

    #[test]
    fn escaped_quotes_are_unescaped() {
        let name = parse_content_disposition_filename(r#"attachment; filename="a \"b\".gif""#);
        assert_eq!(name.as_deref(), Some("a \"b\".gif"));
    }

    #[test]
    fn extended_filename_takes_precedence() {
        let name = parse_content_disposition_filename(
            "attachment; filename=\"fallback.jpg\"; filename*=UTF-8''caf%C3%A9%20menu.jpg",
        );
        assert_eq!(name.as_deref(), Some("café menu.jpg"));
    }

    #[test]
    fn extended_filename_with_language_tag() {
        let name = parse_content_disposition_filename("attachment; filename*=utf-8'en'a%2Bb.png");
        assert_eq!(name.as_deref(), Some("a+b.png"));
    }

    #[test]
    fn missing_or_empty_filename() {
        assert_eq!(parse_content_disposition_filename("inline"), None);
        assert_eq!(parse_content_disposition_filename("attachment; filename=\"\""), None);
    }

    #[test]
    fn malformed_escapes_survive_decoding() {
        assert_eq!(percent_decode("100%"), "100%");
        assert_eq!(percent_decode("%zz.png"), "%zz.png");
        assert_eq!(percent_decode("a%2"), "a%2");
    }
}
