//! Byte-level repair of malformed multipart/related bodies.
//!
//! AWS HealthImaging declares its frame responses as `multipart/related` but
//! does not frame them conformantly: the `boundary` parameter may be
//! unquoted or missing, CRLF sequences around delimiter lines may be absent
//! or doubled, and the terminal delimiter may lack its closing `--` suffix.
//! Standard multipart parsers reject such bodies outright.
//!
//! # Repair Approach
//!
//! 1. Determine the boundary token: from the `Content-Type` header when
//!    present, otherwise inferred from the first dash-dash line in the body.
//! 2. Split the body on every `--{boundary}` occurrence.
//! 3. For each segment, locate the blank-line separator between part headers
//!    and payload, tolerating bare-LF line endings, and strip the framing
//!    CRLF that precedes the next delimiter.
//! 4. Segments with no separator or no payload are skipped; repair fails
//!    only when nothing at all can be recovered, since partial frame data is
//!    more useful to a caller than total failure.
//!
//! The transform is pure (bytes in, ordered part bytes out) and has no HTTP
//! dependencies, so it is testable without a network.

use bytes::Bytes;
use tracing::warn;

use crate::error::MultipartError;

// =============================================================================
// Framing Markers
// =============================================================================

/// Carriage return + line feed, the conformant multipart line terminator.
pub const CRLF: &[u8] = b"\r\n";

/// Header/body separator for conformant parts.
pub const CRLF_CRLF: &[u8] = b"\r\n\r\n";

/// Delimiter prefix (and terminal delimiter suffix).
pub const DASH_DASH: &[u8] = b"--";

// =============================================================================
// Boundary Extraction
// =============================================================================

/// Extract the boundary token from a `Content-Type` header value.
///
/// Tolerates missing or malformed quoting (`boundary=abc`, `boundary="abc"`,
/// `boundary="abc`) and trailing parameters. Returns `None` when no
/// non-empty token is present.
pub fn boundary_from_content_type(content_type: &str) -> Option<String> {
    let lower = content_type.to_ascii_lowercase();
    let start = lower.find("boundary=")? + "boundary=".len();

    let rest = &content_type[start..];
    let end = rest.find(';').unwrap_or(rest.len());
    let token = rest[..end].trim().trim_matches('"').trim();

    if token.is_empty() {
        return None;
    }

    Some(token.to_string())
}

/// Infer the boundary token from the body itself.
///
/// Scans for the first line beginning with `--` and takes the rest of that
/// line as the token. This is the fallback when the HTTP envelope omits the
/// `boundary` parameter entirely.
pub fn infer_boundary(body: &[u8]) -> Option<Vec<u8>> {
    let mut pos = 0;

    while pos + DASH_DASH.len() <= body.len() {
        let at_line_start = pos == 0 || body[pos - 1] == b'\n';

        if at_line_start && body[pos..].starts_with(DASH_DASH) {
            let token_start = pos + DASH_DASH.len();
            let token_end = body[token_start..]
                .iter()
                .position(|&b| b == b'\r' || b == b'\n')
                .map(|i| token_start + i)
                .unwrap_or(body.len());

            let token = &body[token_start..token_end];
            if !token.is_empty() {
                return Some(token.to_vec());
            }
        }

        pos += 1;
    }

    None
}

// =============================================================================
// Part Parsing
// =============================================================================

/// A single recovered part. Internal to the repair pass; only the projected
/// `body` ever leaves this module.
#[derive(Debug, Clone)]
struct MultipartPart {
    /// Lowercased header name/value pairs, in order of appearance
    headers: Vec<(String, String)>,

    /// Payload bytes with all framing stripped
    body: Bytes,
}

/// Parse one inter-delimiter segment into a part.
///
/// A segment is recoverable iff it contains a blank-line header/body
/// separator (CRLF CRLF, or bare LF LF from non-conformant framing) and a
/// non-empty payload once the trailing framing CRLF is stripped.
fn parse_part(segment: &[u8]) -> Option<MultipartPart> {
    // Tolerate extraneous CRLFs between the delimiter line and the headers
    let mut start = 0;
    while start < segment.len() && (segment[start] == b'\r' || segment[start] == b'\n') {
        start += 1;
    }
    let segment = &segment[start..];

    let (header_bytes, body_start) = if let Some(i) = find(segment, CRLF_CRLF) {
        (&segment[..i], i + CRLF_CRLF.len())
    } else if let Some(i) = find(segment, b"\n\n") {
        (&segment[..i], i + 2)
    } else {
        return None;
    };

    let mut body = &segment[body_start..];

    // The CRLF before the next delimiter belongs to the framing, not the
    // payload. Tolerate it being absent or a bare LF.
    if body.ends_with(CRLF) {
        body = &body[..body.len() - CRLF.len()];
    } else if body.ends_with(b"\n") {
        body = &body[..body.len() - 1];
    }

    if body.is_empty() {
        return None;
    }

    Some(MultipartPart {
        headers: parse_headers(header_bytes),
        body: Bytes::copy_from_slice(body),
    })
}

/// Parse a header block leniently: one `name: value` pair per line, names
/// lowercased, lines without a colon ignored.
fn parse_headers(header_bytes: &[u8]) -> Vec<(String, String)> {
    let text = String::from_utf8_lossy(header_bytes);

    text.lines()
        .filter_map(|line| {
            let (name, value) = line.split_once(':')?;
            let name = name.trim().to_ascii_lowercase();
            if name.is_empty() {
                return None;
            }
            Some((name, value.trim().to_string()))
        })
        .collect()
}

// =============================================================================
// Repair
// =============================================================================

/// Repair a declared-multipart body into an ordered sequence of part
/// payloads.
///
/// `boundary` is the token from the `Content-Type` header, if the envelope
/// carried one; otherwise the delimiter is inferred from the body. Part
/// order is preserved, and every framing byte (delimiter lines, part
/// headers, separator CRLFs) is stripped so each element is pure frame
/// payload.
///
/// # Errors
///
/// Returns [`MultipartError::NoPartsRecovered`] only when no valid part can
/// be located at all. Segments that cannot be parsed are skipped, so one
/// corrupted part does not discard its clean siblings.
pub fn repair(body: &[u8], boundary: Option<&str>) -> Result<Vec<Bytes>, MultipartError> {
    let token = match boundary {
        Some(t) if !t.is_empty() => t.as_bytes().to_vec(),
        _ => infer_boundary(body).ok_or(MultipartError::NoPartsRecovered { size: body.len() })?,
    };

    let mut delimiter = Vec::with_capacity(DASH_DASH.len() + token.len());
    delimiter.extend_from_slice(DASH_DASH);
    delimiter.extend_from_slice(&token);

    let mut parts = Vec::new();
    let mut search_from = 0;

    while let Some(rel) = find(&body[search_from..], &delimiter) {
        let delim_start = search_from + rel;
        let segment_start = delim_start + delimiter.len();

        // Terminal delimiter: `--boundary--`. Anything after it is epilogue.
        if body[segment_start..].starts_with(DASH_DASH) {
            break;
        }

        // Segment runs to the next delimiter, or to the end of the body when
        // the terminal delimiter is missing.
        let segment_end = find(&body[segment_start..], &delimiter)
            .map(|i| segment_start + i)
            .unwrap_or(body.len());

        match parse_part(&body[segment_start..segment_end]) {
            Some(part) => parts.push(part),
            None => {
                warn!(
                    offset = delim_start,
                    len = segment_end - segment_start,
                    "skipping unrecoverable multipart segment"
                );
            }
        }

        search_from = segment_end;
        if segment_end == body.len() {
            break;
        }
    }

    if parts.is_empty() {
        return Err(MultipartError::NoPartsRecovered { size: body.len() });
    }

    Ok(parts.into_iter().map(|p| p.body).collect())
}

/// Find the first occurrence of `needle` in `haystack`.
fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // boundary_from_content_type tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_boundary_unquoted() {
        let ct = "multipart/related; type=application/octet-stream; boundary=abc123";
        assert_eq!(boundary_from_content_type(ct).as_deref(), Some("abc123"));
    }

    #[test]
    fn test_boundary_quoted() {
        let ct = "multipart/related; boundary=\"abc123\"";
        assert_eq!(boundary_from_content_type(ct).as_deref(), Some("abc123"));
    }

    #[test]
    fn test_boundary_unbalanced_quote() {
        // AWS omits quotation; some proxies half-fix it
        let ct = "multipart/related; boundary=\"abc123";
        assert_eq!(boundary_from_content_type(ct).as_deref(), Some("abc123"));
    }

    #[test]
    fn test_boundary_with_trailing_parameter() {
        let ct = "multipart/related; boundary=abc123; charset=utf-8";
        assert_eq!(boundary_from_content_type(ct).as_deref(), Some("abc123"));
    }

    #[test]
    fn test_boundary_case_insensitive_parameter() {
        let ct = "multipart/related; BOUNDARY=abc123";
        assert_eq!(boundary_from_content_type(ct).as_deref(), Some("abc123"));
    }

    #[test]
    fn test_boundary_missing() {
        assert_eq!(
            boundary_from_content_type("multipart/related; type=application/octet-stream"),
            None
        );
    }

    #[test]
    fn test_boundary_empty_token() {
        assert_eq!(boundary_from_content_type("multipart/related; boundary="), None);
    }

    // -------------------------------------------------------------------------
    // infer_boundary tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_infer_boundary_at_start() {
        let body = b"--frame-boundary\r\ncontent-type: application/octet-stream\r\n\r\nDATA";
        assert_eq!(infer_boundary(body).as_deref(), Some(&b"frame-boundary"[..]));
    }

    #[test]
    fn test_infer_boundary_after_preamble() {
        let body = b"preamble junk\n--tok123\r\n\r\nDATA";
        assert_eq!(infer_boundary(body).as_deref(), Some(&b"tok123"[..]));
    }

    #[test]
    fn test_infer_boundary_none() {
        assert_eq!(infer_boundary(b"no delimiter lines here"), None);
        assert_eq!(infer_boundary(b""), None);
    }

    // -------------------------------------------------------------------------
    // repair tests
    // -------------------------------------------------------------------------

    fn two_part_body(boundary: &str) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
        body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
        body.extend_from_slice(b"FIRST_FRAME");
        body.extend_from_slice(b"\r\n");
        body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
        body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
        body.extend_from_slice(b"SECOND_FRAME");
        body.extend_from_slice(b"\r\n");
        body.extend_from_slice(format!("--{}--\r\n", boundary).as_bytes());
        body
    }

    #[test]
    fn test_repair_well_formed_two_parts() {
        let body = two_part_body("bnd");
        let parts = repair(&body, Some("bnd")).unwrap();

        assert_eq!(parts.len(), 2);
        assert_eq!(&parts[0][..], b"FIRST_FRAME");
        assert_eq!(&parts[1][..], b"SECOND_FRAME");
    }

    #[test]
    fn test_repair_preserves_payload_bytes_exactly() {
        // Binary payload containing CR, LF, and NUL bytes away from the edges
        let payload: &[u8] = b"\x00\x01\r\nmid\xff\xfe";
        let mut body = Vec::new();
        body.extend_from_slice(b"--b\r\ncontent-type: application/octet-stream\r\n\r\n");
        body.extend_from_slice(payload);
        body.extend_from_slice(b"\r\n--b--\r\n");

        let parts = repair(&body, Some("b")).unwrap();
        assert_eq!(parts.len(), 1);
        assert_eq!(&parts[0][..], payload);
    }

    #[test]
    fn test_repair_missing_terminal_dashes() {
        // Final delimiter without the closing `--` suffix
        let mut body = Vec::new();
        body.extend_from_slice(b"--b\r\nContent-Type: application/octet-stream\r\n\r\nDATA\r\n");
        body.extend_from_slice(b"--b\r\n");

        let parts = repair(&body, Some("b")).unwrap();
        assert_eq!(parts.len(), 1);
        assert_eq!(&parts[0][..], b"DATA");
    }

    #[test]
    fn test_repair_no_terminal_delimiter_at_all() {
        let body = b"--b\r\nContent-Type: application/octet-stream\r\n\r\nDATA";
        let parts = repair(body, Some("b")).unwrap();
        assert_eq!(parts.len(), 1);
        assert_eq!(&parts[0][..], b"DATA");
    }

    #[test]
    fn test_repair_bare_lf_framing() {
        // Non-conformant bare-LF line endings throughout
        let body = b"--b\ncontent-type: application/octet-stream\n\nDATA\n--b--\n";
        let parts = repair(body, Some("b")).unwrap();
        assert_eq!(parts.len(), 1);
        assert_eq!(&parts[0][..], b"DATA");
    }

    #[test]
    fn test_repair_extra_crlf_after_delimiter() {
        let body = b"--b\r\n\r\nContent-Type: x\r\n\r\nDATA\r\n--b--";
        let parts = repair(body, Some("b")).unwrap();
        assert_eq!(parts.len(), 1);
        assert_eq!(&parts[0][..], b"DATA");
    }

    #[test]
    fn test_repair_infers_boundary_when_missing() {
        let body = two_part_body("inferred-tok");
        let parts = repair(&body, None).unwrap();

        assert_eq!(parts.len(), 2);
        assert_eq!(&parts[0][..], b"FIRST_FRAME");
        assert_eq!(&parts[1][..], b"SECOND_FRAME");
    }

    #[test]
    fn test_repair_partial_recovery() {
        // First segment lacks a header/body separator; second is clean
        let mut body = Vec::new();
        body.extend_from_slice(b"--b\r\ngarbage-without-blank-line\r\n");
        body.extend_from_slice(b"--b\r\nContent-Type: application/octet-stream\r\n\r\nCLEAN\r\n");
        body.extend_from_slice(b"--b--\r\n");

        let parts = repair(&body, Some("b")).unwrap();
        assert_eq!(parts.len(), 1);
        assert_eq!(&parts[0][..], b"CLEAN");
    }

    #[test]
    fn test_repair_zero_parts_is_error() {
        let body = b"--b\r\nno separator anywhere\r\n--b--\r\n";
        let err = repair(body, Some("b")).unwrap_err();
        assert!(matches!(err, MultipartError::NoPartsRecovered { .. }));
    }

    #[test]
    fn test_repair_empty_body_is_error() {
        let err = repair(b"", Some("b")).unwrap_err();
        assert!(matches!(err, MultipartError::NoPartsRecovered { size: 0 }));
    }

    #[test]
    fn test_repair_no_boundary_no_inference_is_error() {
        let err = repair(b"just bytes, no delimiters", None).unwrap_err();
        assert!(matches!(err, MultipartError::NoPartsRecovered { .. }));
    }

    #[test]
    fn test_repair_empty_payload_skipped() {
        // A part whose payload is nothing but framing CRLF is not a frame
        let mut body = Vec::new();
        body.extend_from_slice(b"--b\r\nContent-Type: x\r\n\r\n\r\n");
        body.extend_from_slice(b"--b\r\nContent-Type: x\r\n\r\nREAL\r\n");
        body.extend_from_slice(b"--b--\r\n");

        let parts = repair(&body, Some("b")).unwrap();
        assert_eq!(parts.len(), 1);
        assert_eq!(&parts[0][..], b"REAL");
    }

    #[test]
    fn test_repair_order_preserved() {
        let mut body = Vec::new();
        for i in 0..5 {
            body.extend_from_slice(b"--b\r\nContent-Type: x\r\n\r\n");
            body.extend_from_slice(format!("frame-{}", i).as_bytes());
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(b"--b--\r\n");

        let parts = repair(&body, Some("b")).unwrap();
        assert_eq!(parts.len(), 5);
        for (i, part) in parts.iter().enumerate() {
            assert_eq!(&part[..], format!("frame-{}", i).as_bytes());
        }
    }

    // -------------------------------------------------------------------------
    // parse_headers tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_parse_headers_lowercases_names() {
        let headers = parse_headers(b"Content-Type: application/octet-stream\r\nContent-Length: 4");
        assert_eq!(
            headers,
            vec![
                (
                    "content-type".to_string(),
                    "application/octet-stream".to_string()
                ),
                ("content-length".to_string(), "4".to_string()),
            ]
        );
    }

    #[test]
    fn test_parse_headers_skips_lines_without_colon() {
        let headers = parse_headers(b"not a header line\r\nX-Ok: yes");
        assert_eq!(headers, vec![("x-ok".to_string(), "yes".to_string())]);
    }
}
