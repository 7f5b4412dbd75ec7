//! Minimal multipart/form-data reader for the upload form.
//!
//! Only what the studio posts is handled: one file input and a few text
//! inputs, each part with a `Content-Disposition` header.

/// One form part. `data` borrows from the request body.
#[derive(Debug)]
pub struct Part<'a> {
    pub name:     Option<String>,
    pub filename: Option<String>,
    pub data:     &'a [u8],
}

impl Part<'_> {
    pub fn is_file(&self) -> bool {
        self.filename.is_some()
    }
}

/// Returns the index of the first occurrence of `needle` in `haystack`.
pub fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Splits `haystack` on every occurrence of `needle`, returning the pieces
/// between occurrences (excluding the needle itself).
fn split_on<'a>(haystack: &'a [u8], needle: &[u8]) -> Vec<&'a [u8]> {
    let mut result = Vec::new();
    let mut start = 0;
    while start <= haystack.len() {
        if let Some(pos) = find_subsequence(&haystack[start..], needle) {
            result.push(&haystack[start..start + pos]);
            start += pos + needle.len();
        } else {
            result.push(&haystack[start..]);
            break;
        }
    }
    result
}

/// Extracts the boundary token from a Content-Type header value like
/// `multipart/form-data; boundary=----WebKitFormBoundaryXXX`.
pub fn extract_boundary(content_type: &str) -> Option<String> {
    content_type
        .split(';')
        .map(|s| s.trim())
        .find(|s| s.starts_with("boundary="))
        .map(|s| s["boundary=".len()..].trim_matches('"').to_owned())
}

/// Splits a multipart body into its parts. Preamble, epilogue and parts
/// without a header block are skipped.
pub fn parts<'a>(body: &'a [u8], boundary: &str) -> Vec<Part<'a>> {
    let delimiter = format!("--{}", boundary);
    let sep = b"\r\n\r\n";

    split_on(body, delimiter.as_bytes())
        .into_iter()
        .filter_map(|part| {
            let sep_pos = find_subsequence(part, sep)?;
            let headers = String::from_utf8_lossy(&part[..sep_pos]);
            let raw = &part[sep_pos + sep.len()..];
            Some(Part {
                name:     disposition_param(&headers, "name"),
                filename: disposition_param(&headers, "filename"),
                data:     raw.strip_suffix(b"\r\n").unwrap_or(raw),
            })
        })
        .collect()
}

/// First file part with a non-empty body.
pub fn first_file<'a, 'p>(parts: &'p [Part<'a>]) -> Option<&'p Part<'a>> {
    parts.iter().find(|p| p.is_file() && !p.data.is_empty())
}

/// Value of a named text field.
pub fn text_field(parts: &[Part<'_>], field_name: &str) -> Option<String> {
    parts
        .iter()
        .find(|p| !p.is_file() && p.name.as_deref() == Some(field_name))
        .and_then(|p| String::from_utf8(p.data.to_vec()).ok())
}

/// Reads `key="value"` from a Content-Disposition header block. `name=`
/// inside `filename=` does not count as a match for `name`.
fn disposition_param(headers: &str, key: &str) -> Option<String> {
    let pattern = format!("{}=\"", key);
    let mut search_from = 0;
    while let Some(rel) = headers[search_from..].find(&pattern) {
        let pos = search_from + rel;
        let preceded_ok = headers[..pos]
            .chars()
            .next_back()
            .map_or(true, |c| c == ';' || c.is_whitespace());
        let value_start = pos + pattern.len();
        if preceded_ok {
            let rest = &headers[value_start..];
            let end = rest.find('"')?;
            return Some(rest[..end].to_owned());
        }
        search_from = value_start;
    }
    None
}
