//! Masking of credential-like query parameters before URLs reach the logs.

use url::Url;

const SENSITIVE_PARAMS: &[&str] = &[
    "apikey",
    "api_key",
    "key",
    "token",
    "secret",
    "password",
    "access_token",
];

fn is_sensitive(name: &str) -> bool {
    SENSITIVE_PARAMS.iter().any(|p| p.eq_ignore_ascii_case(name))
}

/// Keeps the first four characters of longer values; short values are fully hidden.
fn mask_value(value: &str) -> String {
    if value.chars().count() <= 6 {
        "***".to_string()
    } else {
        let head: String = value.chars().take(4).collect();
        format!("{}***", head)
    }
}

/// Returns `url` as a string with sensitive query values masked.
/// URLs without sensitive parameters are returned unchanged.
pub fn mask_url(url: &Url) -> String {
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    if !pairs.iter().any(|(k, _)| is_sensitive(k)) {
        return url.to_string();
    }

    let mut masked = url.clone();
    {
        let mut query = masked.query_pairs_mut();
        query.clear();
        for (k, v) in &pairs {
            if is_sensitive(k) {
                query.append_pair(k, &mask_value(v));
            } else {
                query.append_pair(k, v);
            }
        }
    }
    masked.to_string()
}

fn ends_value(c: char) -> bool {
    matches!(c, '&' | ';' | '#') || c.is_whitespace()
}

/// Masks `name=value` pairs found anywhere in free text, for input that is not a URL.
fn mask_pairs(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(eq) = rest.find('=') {
        let before = &rest[..eq];
        let after = &rest[eq + 1..];
        let name_len = before
            .bytes()
            .rev()
            .take_while(|b| b.is_ascii_alphanumeric() || *b == b'_')
            .count();
        let name = &before[before.len() - name_len..];
        let end = after.find(ends_value).unwrap_or(after.len());
        let value = &after[..end];

        out.push_str(before);
        out.push('=');
        if !value.is_empty() && is_sensitive(name) {
            out.push_str(&mask_value(value));
        } else {
            out.push_str(value);
        }
        rest = &after[end..];
    }
    out.push_str(rest);
    out
}

/// Masks a raw string that may not parse. Unparseable input has its
/// `name=value` pairs masked and is then shortened.
pub fn mask_raw(raw: &str) -> String {
    match Url::parse(raw) {
        Ok(url) => mask_url(&url),
        Err(_) => {
            let masked = mask_pairs(raw);
            let head: String = masked.chars().take(64).collect();
            if head.len() < masked.len() {
                format!("{}...", head)
            } else {
                head
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mask(s: &str) -> String {
        mask_url(&Url::parse(s).unwrap())
    }

    #[test]
    fn masks_api_key_keeping_prefix() {
        let masked = mask("https://api.example.com/v2/data?q=test&apiKey=secret123456789");
        assert!(!masked.contains("secret123456789"));
        assert!(masked.contains("apiKey=secr***"));
        assert!(masked.contains("q=test"));
    }

    #[test]
    fn masks_underscore_and_token_variants() {
        let masked = mask("https://x.example.com/?api_key=abcdef123456&token=tok999888");
        assert!(masked.contains("api_key=abcd***"));
        assert!(!masked.contains("tok999888"));
    }

    #[test]
    fn short_values_fully_masked() {
        let masked = mask("https://api.example.com/?key=abc");
        assert!(masked.ends_with("key=***"));
    }

    #[test]
    fn url_without_secrets_is_unchanged() {
        let url = "https://api.example.com/data?q=hello&page=1";
        assert_eq!(mask(url), url);
    }

    #[test]
    fn raw_unparseable_is_truncated() {
        let long = "x".repeat(100);
        let out = mask_raw(&long);
        assert!(out.ends_with("..."));
        assert_eq!(out.len(), 67);
        assert_eq!(mask_raw("not a url"), "not a url");
    }

    #[test]
    fn raw_without_scheme_masks_secrets() {
        let out = mask_raw("reuters.com/markets?apiKey=abcdef123456");
        assert_eq!(out, "reuters.com/markets?apiKey=abcd***");

        let out = mask_raw("ft.com/x?page=2&TOKEN=tok999888;key=abc #frag");
        assert!(!out.contains("tok999888"));
        assert!(out.contains("page=2&TOKEN=tok9***;key=*** #frag"));
    }

    #[test]
    fn raw_masking_happens_before_truncation() {
        let raw = format!("{}?access_token=supersecretvalue&q={}", "a".repeat(40), "b".repeat(40));
        let out = mask_raw(&raw);
        assert!(!out.contains("supersecret"));
        assert!(out.contains("access_token=supe***"));
        assert!(out.ends_with("..."));
    }

    #[test]
    fn raw_keeps_non_sensitive_pairs() {
        assert_eq!(mask_raw("x?monkey=banana123&q=1"), "x?monkey=banana123&q=1");
        assert_eq!(mask_raw("x?key="), "x?key=");
    }
}
