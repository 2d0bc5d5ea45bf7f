//! HTTP response building module
//!
//! Provides builders for the responses the server emits. Builder failures
//! are logged and degrade to a bare response instead of panicking.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;

/// Build a 200 HTML response.
///
/// `Content-Length` always reflects the full body; a HEAD request gets the
/// headers with an empty body.
pub fn build_html_response(
    content: String,
    content_type: &str,
    server_name: &str,
    is_head: bool,
) -> Response<Full<Bytes>> {
    let content_length = content.len();
    let body = if is_head {
        Bytes::new()
    } else {
        Bytes::from(content)
    };

    Response::builder()
        .status(200)
        .header("Content-Type", content_type)
        .header("Content-Length", content_length)
        .header("Server", server_name)
        .body(Full::new(body))
        .unwrap_or_else(|e| {
            log_build_error("HTML", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build 405 Method Not Allowed response
pub fn build_405_response() -> Response<Full<Bytes>> {
    Response::builder()
        .status(405)
        .header("Content-Type", "text/plain")
        .header("Allow", "GET, HEAD, POST, OPTIONS")
        .body(Full::new(Bytes::from("405 Method Not Allowed")))
        .unwrap_or_else(|e| {
            log_build_error("405", &e);
            Response::new(Full::new(Bytes::from("405 Method Not Allowed")))
        })
}

/// Build OPTIONS response
pub fn build_options_response() -> Response<Full<Bytes>> {
    Response::builder()
        .status(204)
        .header("Allow", "GET, HEAD, POST, OPTIONS")
        .body(Full::new(Bytes::new()))
        .unwrap_or_else(|e| {
            log_build_error("OPTIONS", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build 413 Payload Too Large response
pub fn build_413_response() -> Response<Full<Bytes>> {
    Response::builder()
        .status(413)
        .header("Content-Type", "text/plain")
        .body(Full::new(Bytes::from("413 Payload Too Large")))
        .unwrap_or_else(|e| {
            log_build_error("413", &e);
            Response::new(Full::new(Bytes::from("413 Payload Too Large")))
        })
}

/// Log response build error
fn log_build_error(status: &str, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn html_response_carries_content_type_and_length() {
        let resp = build_html_response("<h1>hi</h1>".to_string(), "text/html", "addsrv/0.1", false);
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.headers()["content-type"], "text/html");
        assert_eq!(resp.headers()["content-length"], "11");
        assert_eq!(resp.headers()["server"], "addsrv/0.1");
    }

    #[test]
    fn head_response_keeps_length_but_drops_body() {
        use hyper::body::Body;

        let resp = build_html_response("<h1>hi</h1>".to_string(), "text/html", "addsrv/0.1", true);
        assert_eq!(resp.headers()["content-length"], "11");
        assert_eq!(resp.body().size_hint().exact(), Some(0));
    }

    #[test]
    fn method_not_allowed_lists_supported_methods() {
        let resp = build_405_response();
        assert_eq!(resp.status(), 405);
        assert_eq!(resp.headers()["allow"], "GET, HEAD, POST, OPTIONS");
    }

    #[test]
    fn options_is_no_content() {
        let resp = build_options_response();
        assert_eq!(resp.status(), 204);
    }
}
