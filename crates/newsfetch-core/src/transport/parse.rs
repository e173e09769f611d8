//! Parse HTTP response header lines.

/// The parts of a response head the fetcher acts on.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct ResponseHead {
    pub location: Option<String>,
}

/// Value of a `Content-Length` line, if `line` is one and it parses.
pub(crate) fn content_length(line: &str) -> Option<u64> {
    let (name, value) = line.split_once(':')?;
    if !name.trim().eq_ignore_ascii_case("content-length") {
        return None;
    }
    value.trim().parse::<u64>().ok()
}

/// Parse collected header lines. A status line (`HTTP/...`) starts a new head,
/// so interim `1xx` responses do not leak into the final one.
pub(crate) fn parse_headers(lines: &[String]) -> ResponseHead {
    let mut head = ResponseHead::default();

    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.starts_with("HTTP/") {
            head = ResponseHead::default();
            continue;
        }
        if let Some((name, value)) = line.split_once(':') {
            if name.trim().eq_ignore_ascii_case("location") {
                let value = value.trim();
                if !value.is_empty() {
                    head.location = Some(value.to_string());
                }
            }
        }
    }

    head
}
