use std::io::{Cursor, Read};
use tiny_http::{Request, Response};
use tracing::{info, warn};

use ferrite_classify::{ClassificationResult, ClassifyError};

use crate::render::{html_escape, render_page};
use crate::state::{RecentResult, SharedState};
use crate::util::multipart::{extract_boundary, first_file, parts, text_field, Part};

/// Uploads larger than this are rejected before decoding.
const MAX_UPLOAD_BYTES: u64 = 32 * 1024 * 1024;

pub fn handle_get(state: SharedState) -> Response<Cursor<Vec<u8>>> {
    crate::routes::html_response(build_page(&state, ""))
}

pub fn handle_post(request: &mut Request, state: SharedState) -> Response<Cursor<Vec<u8>>> {
    let content_type = request.headers().iter()
        .find(|h| h.field.equiv("Content-Type"))
        .map(|h| h.value.as_str().to_owned())
        .unwrap_or_default();

    let result_html = match extract_boundary(&content_type) {
        Some(boundary) if content_type.starts_with("multipart/form-data") => {
            let mut body = Vec::new();
            match request.as_reader().take(MAX_UPLOAD_BYTES + 1).read_to_end(&mut body) {
                Ok(n) if n as u64 > MAX_UPLOAD_BYTES => error_html("The upload is too large."),
                Ok(_) => classify_upload(&state, &body, &boundary),
                Err(e) => error_html(&format!("Could not read the upload: {e}")),
            }
        }
        _ => error_html("Expected a multipart/form-data upload."),
    };

    crate::routes::html_response(build_page(&state, &result_html))
}

fn classify_upload(state: &SharedState, body: &[u8], boundary: &str) -> String {
    let parts = parts(body, boundary);
    let Some(file) = first_file(&parts) else {
        return error_html("No image file was uploaded.");
    };
    let file_name = file.filename.clone().unwrap_or_default();
    let k = requested_top_k(&parts, state.top_k);

    match state.pipeline.classify_encoded_top_k(file.data, k) {
        Ok(ranked) => {
            let Some(best) = ranked.first().cloned() else {
                return error_html("The model produced no prediction.");
            };
            info!(file = %file_name, label = %best.label, confidence = best.confidence, "classified upload");
            state.record(file_name, best);
            format_ranked(&ranked)
        }
        Err(e) => {
            warn!(file = %file_name, "upload rejected: {e}");
            error_html(&describe_error(&e))
        }
    }
}

/// The form's "Classes to show" field, or `default` when it is missing,
/// blank or not a positive number.
fn requested_top_k(parts: &[Part<'_>], default: usize) -> usize {
    text_field(parts, "top_k")
        .and_then(|v| v.trim().parse::<usize>().ok())
        .filter(|&k| k > 0)
        .unwrap_or(default)
}

fn describe_error(e: &ClassifyError) -> String {
    if e.is_input_error() {
        format!("The file could not be used as an image: {e}")
    } else {
        format!("Classification failed: {e}")
    }
}

// ---------------------------------------------------------------------------
// Page builder
// ---------------------------------------------------------------------------

fn build_page(state: &SharedState, result_html: &str) -> String {
    let cfg = state.pipeline.normalizer().config();
    let hint = format!(
        "Images are resized to {}x{} before classification. {} classes known.",
        cfg.target_width,
        cfg.target_height,
        state.pipeline.labels().len()
    );
    let recent_html = format_recent(&state.recent());

    render_page(&state.model_name, |html| {
        html.replace("{{INPUT_HINT}}", &html_escape(&hint))
            .replace("{{TOP_K}}", &state.top_k.to_string())
            .replace("{{RESULT_SECTION}}", result_html)
            .replace("{{RECENT_SECTION}}", &recent_html)
    })
}

/// Hero label plus one probability bar per ranked class. `ranked` is sorted
/// best-first.
fn format_ranked(ranked: &[ClassificationResult]) -> String {
    let Some(best) = ranked.first() else {
        return String::new();
    };

    let rows: String = ranked.iter().enumerate().map(|(i, r)| {
        let p     = r.confidence.clamp(0.0, 1.0);
        let width = (p * 260.0) as u32;
        let dim   = if i != 0 { " dim" } else { "" };
        format!(
            r#"<tr><td style="width:120px;font-weight:600;color:#333">{}</td><td><div class="bar-wrap"><div class="bar-fill{}" style="width:{}px"></div></div></td><td class="prob-pct">{:.1}%</td></tr>"#,
            html_escape(&r.label), dim, width, r.confidence * 100.0
        )
    }).collect();

    format!(
        r#"<div class="card"><h2>Result</h2>
<div class="prediction-hero">{hero}</div>
<div class="prediction-sub">Confidence: {conf:.1}%</div>
<table class="prob-table">
  <thead><tr><th>Class</th><th>Confidence</th><th></th></tr></thead>
  <tbody>{rows}</tbody>
</table></div>"#,
        hero = html_escape(&best.label), conf = best.confidence * 100.0, rows = rows
    )
}

fn format_recent(recent: &[RecentResult]) -> String {
    if recent.is_empty() {
        return String::new();
    }
    let items: String = recent.iter().map(|r| {
        format!(
            r#"<li><strong>{}</strong> {:.1}% <span class="file">{}</span></li>"#,
            html_escape(&r.result.label),
            r.result.confidence * 100.0,
            html_escape(&r.file_name)
        )
    }).collect();
    format!(r#"<div class="card"><h2>Recent</h2><ul class="recent">{items}</ul></div>"#)
}

fn error_html(msg: &str) -> String {
    format!(r#"<div class="card"><div class="error-box">{}</div></div>"#, html_escape(msg))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(label: &str, confidence: f32) -> ClassificationResult {
        ClassificationResult { label: label.to_owned(), confidence, class_index: None }
    }

    #[test]
    fn test_format_ranked_highlights_first_entry() {
        let html = format_ranked(&[result("falldown", 0.75), result("none", 0.25)]);
        assert!(html.contains(r#"<div class="prediction-hero">falldown</div>"#));
        assert!(html.contains("Confidence: 75.0%"));
        assert_eq!(html.matches("bar-fill dim").count(), 1);
        assert!(html.contains("width:195px"));
    }

    #[test]
    fn test_format_ranked_escapes_labels() {
        let html = format_ranked(&[result("<b>", 1.0)]);
        assert!(html.contains("&lt;b&gt;"));
        assert!(!html.contains("<b>"));
    }

    #[test]
    fn test_requested_top_k_reads_the_form_field() {
        let body = b"--B\r\nContent-Disposition: form-data; name=\"top_k\"\r\n\r\n 3 \r\n--B--\r\n";
        assert_eq!(requested_top_k(&parts(body, "B"), 5), 3);

        let body = b"--B\r\nContent-Disposition: form-data; name=\"top_k\"\r\n\r\n0\r\n--B--\r\n";
        assert_eq!(requested_top_k(&parts(body, "B"), 5), 5);
        assert_eq!(requested_top_k(&[], 5), 5);
    }

    #[test]
    fn test_format_ranked_empty() {
        assert_eq!(format_ranked(&[]), "");
    }

    #[test]
    fn test_format_recent() {
        assert_eq!(format_recent(&[]), "");
        let recent = vec![RecentResult { file_name: "a&b.png".into(), result: result("none", 0.5) }];
        let html = format_recent(&recent);
        assert!(html.contains("a&amp;b.png"));
        assert!(html.contains("<strong>none</strong> 50.0%"));
    }
}
