//! Sum handler
//!
//! Reads the form fields `a` and `b`, adds them and renders the result as an
//! HTML page. Missing fields default to 0; a field that does not parse as a
//! base-10 integer turns into an error page. Either way the response is a
//! 200 with `Content-Type` taken from the http config, so a caller only ever
//! distinguishes success from failure by the page content.

use std::convert::Infallible;
use std::sync::Arc;

use http_body_util::{BodyExt, Full};
use hyper::body::{Buf, Bytes};
use hyper::{Method, Request, Response};

use crate::config::AppState;
use crate::http::{self, form};
use crate::logger;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Main entry point for HTTP request handling.
///
/// Generic over the request body so tests can drive it with `Full<Bytes>`
/// while the server feeds it `hyper::body::Incoming`.
pub async fn handle_request<B>(
    req: Request<B>,
    state: &Arc<AppState>,
) -> Result<Response<Full<Bytes>>, Infallible>
where
    B: hyper::body::Body,
    B::Data: Buf,
    B::Error: std::fmt::Display,
{
    // 1. Method gate: the form accepts GET and POST; HEAD is GET sans body
    match *req.method() {
        Method::GET | Method::HEAD | Method::POST => {}
        Method::OPTIONS => return Ok(http::build_options_response()),
        _ => {
            logger::log_warning(&format!("Method not allowed: {}", req.method()));
            return Ok(http::build_405_response());
        }
    }

    // 2. Body size gate
    if let Some(resp) = check_body_size(&req, state.config.http.max_body_size) {
        return Ok(resp);
    }

    let is_head = *req.method() == Method::HEAD;
    let pairs = extract_fields(req).await;
    let page = render_page(&pairs);

    Ok(http::build_html_response(
        page,
        &state.config.http.content_type,
        &state.config.http.server_name,
        is_head,
    ))
}

/// Validate the Content-Length header and return 413 if it exceeds the limit
fn check_body_size<B>(req: &Request<B>, max_body_size: u64) -> Option<Response<Full<Bytes>>> {
    let content_length = req.headers().get("content-length")?;
    content_length.to_str().map_or_else(
        |_| {
            logger::log_warning("Content-Length header contains non-ASCII characters");
            None
        },
        |size_str| match size_str.parse::<u64>() {
            Ok(size) if size > max_body_size => {
                logger::log_error(&format!(
                    "Request body too large: {size} bytes (max: {max_body_size})"
                ));
                Some(http::build_413_response())
            }
            Err(_) => {
                logger::log_warning(&format!(
                    "Invalid Content-Length value: '{size_str}', skipping size check"
                ));
                None
            }
            _ => None,
        },
    )
}

/// Pull the form fields out of the request.
///
/// GET and HEAD read the query string. POST reads the urlencoded body and
/// appends the query-string fields after it, so a field present in both
/// resolves to the body value under the first-occurrence rule. A POST
/// carrying some other content type contributes no fields at all.
async fn extract_fields<B>(req: Request<B>) -> Vec<(String, String)>
where
    B: hyper::body::Body,
    B::Data: Buf,
    B::Error: std::fmt::Display,
{
    if *req.method() == Method::POST {
        if !has_form_content_type(&req) {
            return Vec::new();
        }
        let query_pairs = req
            .uri()
            .query()
            .map(form::parse_pairs)
            .unwrap_or_default();
        let mut pairs = match req.into_body().collect().await {
            Ok(collected) => {
                form::parse_pairs(&String::from_utf8_lossy(&collected.to_bytes()))
            }
            Err(e) => {
                logger::log_error(&format!("Failed to read request body: {e}"));
                Vec::new()
            }
        };
        // Body fields come first so they win over query-string duplicates
        pairs.extend(query_pairs);
        pairs
    } else {
        req.uri()
            .query()
            .map(form::parse_pairs)
            .unwrap_or_default()
    }
}

/// A missing Content-Type on a POST is treated as a form submission.
fn has_form_content_type<B>(req: &Request<B>) -> bool {
    req.headers().get("content-type").map_or(true, |v| {
        v.to_str()
            .is_ok_and(|ct| ct.trim_start().starts_with(FORM_CONTENT_TYPE))
    })
}

/// Render the HTML page for the given form fields.
fn render_page(pairs: &[(String, String)]) -> String {
    match compute_sum(pairs) {
        Ok((a, b, sum)) => format!("<html><body><h1>{a} + {b} = {sum}</h1></body></html>"),
        Err(message) => format!("<html><body><h1>Error: {message}</h1></body></html>"),
    }
}

/// Parse both fields and add them.
///
/// The operands are 64-bit; the sum is widened so it is always exact.
fn compute_sum(pairs: &[(String, String)]) -> Result<(i64, i64, i128), String> {
    let a = parse_field(pairs, "a")?;
    let b = parse_field(pairs, "b")?;
    Ok((a, b, i128::from(a) + i128::from(b)))
}

/// Parse one field as a base-10 signed integer, defaulting to 0 when absent.
///
/// Surrounding whitespace is tolerated. Operands are bounded to `i64`: a
/// numeric value outside that range is reported as a parse error, the same
/// as any other unparseable input. The error message echoes the raw value,
/// HTML-escaped since it lands in the error page.
fn parse_field(pairs: &[(String, String)], name: &str) -> Result<i64, String> {
    let raw = form::first_value(pairs, name).unwrap_or("0");
    raw.trim().parse::<i64>().map_err(|e| {
        format!(
            "invalid integer for field \"{name}\": \"{}\" ({e})",
            form::escape_html(raw)
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn test_state() -> Arc<AppState> {
        let cfg = Config::load_from("nonexistent-config").expect("defaults should load");
        Arc::new(AppState::new(&cfg))
    }

    fn get_request(uri: &str) -> Request<Full<Bytes>> {
        Request::builder()
            .method(Method::GET)
            .uri(uri)
            .body(Full::new(Bytes::new()))
            .expect("request should build")
    }

    fn post_request(body: &str) -> Request<Full<Bytes>> {
        Request::builder()
            .method(Method::POST)
            .uri("/")
            .header("content-type", FORM_CONTENT_TYPE)
            .body(Full::new(Bytes::from(body.to_string())))
            .expect("request should build")
    }

    async fn body_string(resp: Response<Full<Bytes>>) -> String {
        let bytes = resp
            .into_body()
            .collect()
            .await
            .expect("body should collect")
            .to_bytes();
        String::from_utf8(bytes.to_vec()).expect("body should be utf-8")
    }

    #[tokio::test]
    async fn adds_two_numbers_from_query() {
        let resp = handle_request(get_request("/?a=3&b=4"), &test_state())
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.headers()["content-type"], "text/html");
        assert_eq!(
            body_string(resp).await,
            "<html><body><h1>3 + 4 = 7</h1></body></html>"
        );
    }

    #[tokio::test]
    async fn missing_a_defaults_to_zero() {
        let resp = handle_request(get_request("/?b=5"), &test_state())
            .await
            .unwrap();
        assert!(body_string(resp).await.contains("0 + 5 = 5"));
    }

    #[tokio::test]
    async fn missing_b_defaults_to_zero() {
        let resp = handle_request(get_request("/?a=3"), &test_state())
            .await
            .unwrap();
        assert!(body_string(resp).await.contains("3 + 0 = 3"));
    }

    #[tokio::test]
    async fn missing_both_yields_zero_sum() {
        let resp = handle_request(get_request("/"), &test_state()).await.unwrap();
        assert!(body_string(resp).await.contains("0 + 0 = 0"));
    }

    #[tokio::test]
    async fn non_numeric_input_renders_error_with_200() {
        let resp = handle_request(get_request("/?a=foo&b=2"), &test_state())
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.headers()["content-type"], "text/html");
        let body = body_string(resp).await;
        assert!(body.starts_with("<html><body><h1>Error:"));
        assert!(body.contains("foo"));
    }

    #[tokio::test]
    async fn negative_and_large_values_are_exact() {
        let resp = handle_request(get_request("/?a=-7&b=1000000"), &test_state())
            .await
            .unwrap();
        assert!(body_string(resp).await.contains("-7 + 1000000 = 999993"));
    }

    #[tokio::test]
    async fn sum_of_extremes_does_not_wrap() {
        let uri = format!("/?a={}&b={}", i64::MAX, i64::MAX);
        let resp = handle_request(get_request(&uri), &test_state()).await.unwrap();
        assert!(body_string(resp).await.contains("= 18446744073709551614"));
    }

    #[tokio::test]
    async fn post_body_fields_are_read() {
        let resp = handle_request(post_request("a=10&b=-4"), &test_state())
            .await
            .unwrap();
        assert!(body_string(resp).await.contains("10 + -4 = 6"));
    }

    #[tokio::test]
    async fn post_merges_query_string_fields() {
        let req = Request::builder()
            .method(Method::POST)
            .uri("/?a=1")
            .header("content-type", FORM_CONTENT_TYPE)
            .body(Full::new(Bytes::from_static(b"b=2")))
            .unwrap();
        let resp = handle_request(req, &test_state()).await.unwrap();
        assert!(body_string(resp).await.contains("1 + 2 = 3"));
    }

    #[tokio::test]
    async fn post_body_field_wins_over_query_duplicate() {
        let req = Request::builder()
            .method(Method::POST)
            .uri("/?a=9")
            .header("content-type", FORM_CONTENT_TYPE)
            .body(Full::new(Bytes::from_static(b"a=1&b=2")))
            .unwrap();
        let resp = handle_request(req, &test_state()).await.unwrap();
        assert!(body_string(resp).await.contains("1 + 2 = 3"));
    }

    #[tokio::test]
    async fn value_beyond_64_bits_renders_error() {
        // One past i64::MAX
        let resp = handle_request(get_request("/?a=9223372036854775808&b=0"), &test_state())
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let body = body_string(resp).await;
        assert!(body.starts_with("<html><body><h1>Error:"));
        assert!(body.contains("9223372036854775808"));
    }

    #[tokio::test]
    async fn post_without_form_content_type_uses_defaults() {
        let req = Request::builder()
            .method(Method::POST)
            .uri("/")
            .header("content-type", "application/json")
            .body(Full::new(Bytes::from_static(b"{\"a\":1}")))
            .unwrap();
        let resp = handle_request(req, &test_state()).await.unwrap();
        assert!(body_string(resp).await.contains("0 + 0 = 0"));
    }

    #[tokio::test]
    async fn repeated_field_uses_first_occurrence() {
        let resp = handle_request(get_request("/?a=1&a=9&b=2"), &test_state())
            .await
            .unwrap();
        assert!(body_string(resp).await.contains("1 + 2 = 3"));
    }

    #[tokio::test]
    async fn error_message_is_html_escaped() {
        let resp = handle_request(get_request("/?a=%3Cscript%3E&b=2"), &test_state())
            .await
            .unwrap();
        let body = body_string(resp).await;
        assert!(body.contains("&lt;script&gt;"));
        assert!(!body.contains("<script>"));
    }

    #[tokio::test]
    async fn head_gets_headers_without_body() {
        let req = Request::builder()
            .method(Method::HEAD)
            .uri("/?a=1&b=2")
            .body(Full::new(Bytes::new()))
            .unwrap();
        let resp = handle_request(req, &test_state()).await.unwrap();
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.headers()["content-type"], "text/html");
        assert!(body_string(resp).await.is_empty());
    }

    #[tokio::test]
    async fn delete_is_rejected_with_405() {
        let req = Request::builder()
            .method(Method::DELETE)
            .uri("/")
            .body(Full::new(Bytes::new()))
            .unwrap();
        let resp = handle_request(req, &test_state()).await.unwrap();
        assert_eq!(resp.status(), 405);
    }

    #[tokio::test]
    async fn oversized_body_is_rejected_with_413() {
        let req = Request::builder()
            .method(Method::POST)
            .uri("/")
            .header("content-type", FORM_CONTENT_TYPE)
            .header("content-length", "99999999999")
            .body(Full::new(Bytes::new()))
            .unwrap();
        let resp = handle_request(req, &test_state()).await.unwrap();
        assert_eq!(resp.status(), 413);
    }

    #[test]
    fn whitespace_around_numbers_is_tolerated() {
        let pairs = vec![
            ("a".to_string(), " 3 ".to_string()),
            ("b".to_string(), "4".to_string()),
        ];
        assert!(render_page(&pairs).contains("3 + 4 = 7"));
    }

    #[test]
    fn plus_prefixed_number_prints_parsed_value() {
        let pairs = vec![
            ("a".to_string(), "+3".to_string()),
            ("b".to_string(), "4".to_string()),
        ];
        assert!(render_page(&pairs).contains("3 + 4 = 7"));
    }
}
