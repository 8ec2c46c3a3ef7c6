//! Mapping documents to document API requests.

use http::header::{CONTENT_ENCODING, CONTENT_LENGTH, CONTENT_TYPE, USER_AGENT};
use http::{HeaderMap, HeaderName, HeaderValue, Method};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

use crate::transport::TransportRequest;
use crate::{ClientOptions, Document, FeedError, Result};

/// Characters left as-is in a path segment. `/`, `;`, `,` and `?` are escaped.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'$')
    .remove(b'&')
    .remove(b'+')
    .remove(b':')
    .remove(b'=')
    .remove(b'@');

/// Characters left as-is in a query value. Spaces become `+`.
const QUERY_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

fn push_segment(url: &mut String, segment: &str) {
    url.extend(utf8_percent_encode(segment, PATH_SEGMENT));
}

fn query_escape(value: &str) -> String {
    value
        .split(' ')
        .map(|part| utf8_percent_encode(part, QUERY_COMPONENT).to_string())
        .collect::<Vec<_>>()
        .join("+")
}

fn write_query_param(url: &mut String, query_start: usize, key: &str, value: &str) {
    url.push(if url.len() == query_start { '?' } else { '&' });
    url.push_str(key);
    url.push('=');
    url.push_str(&query_escape(value));
}

/// HTTP method and full URL for a document.
///
/// Query parameters always appear in the order `timeout`, `route`,
/// `tracelevel`, `condition`, `create`, and only when set.
pub fn method_and_url(options: &ClientOptions, document: &Document) -> (Method, String) {
    let id = &document.id;
    let mut url = String::with_capacity(options.base_url.len() + 64);

    url.push_str(&options.base_url);
    if !options.base_url.ends_with('/') {
        url.push('/');
    }
    url.push_str("document/v1/");
    push_segment(&mut url, &id.namespace);
    url.push('/');
    push_segment(&mut url, &id.doc_type);
    if let Some(number) = id.number {
        url.push_str("/number/");
        url.push_str(&number.to_string());
    } else if let Some(group) = &id.group {
        url.push_str("/group/");
        push_segment(&mut url, group);
    } else {
        url.push_str("/docid");
    }
    url.push('/');
    push_segment(&mut url, &id.user_specific);

    let query_start = url.len();
    if !options.timeout.is_zero() {
        let millis = format!("{}ms", options.timeout.as_millis());
        write_query_param(&mut url, query_start, "timeout", &millis);
    }
    if let Some(route) = options.route.as_deref().filter(|r| !r.is_empty()) {
        write_query_param(&mut url, query_start, "route", route);
    }
    if let Some(level) = options.trace_level.filter(|l| *l > 0) {
        write_query_param(&mut url, query_start, "tracelevel", &level.to_string());
    }
    if let Some(condition) = document.condition.as_deref().filter(|c| !c.is_empty()) {
        write_query_param(&mut url, query_start, "condition", condition);
    }
    if document.create {
        write_query_param(&mut url, query_start, "create", "true");
    }

    (document.operation.method(), url)
}

/// Headers shared by every request of a client.
pub(crate) fn base_headers(options: &ClientOptions) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
    headers.insert(USER_AGENT, header_value("User-Agent", &options.user_agent)?);

    for (name, value) in &options.default_headers {
        let header_name =
            HeaderName::try_from(name.as_str()).map_err(|e| FeedError::InvalidHeader {
                name: name.clone(),
                message: e.to_string(),
            })?;
        if is_body_header(&header_name) {
            return Err(FeedError::InvalidHeader {
                name: name.clone(),
                message: "set by the client from the request body".to_string(),
            });
        }
        headers.insert(header_name, header_value(name, value)?);
    }

    Ok(headers)
}

/// Headers describing the body. Only the client sets these.
fn is_body_header(name: &HeaderName) -> bool {
    *name == CONTENT_ENCODING || *name == CONTENT_LENGTH || *name == CONTENT_TYPE
}

fn header_value(name: &str, value: &str) -> Result<HeaderValue> {
    HeaderValue::try_from(value).map_err(|e| FeedError::InvalidHeader {
        name: name.to_string(),
        message: e.to_string(),
    })
}

/// Assemble the request handed to a transport.
pub(crate) fn build<'a>(
    method: Method,
    url: &str,
    headers: &HeaderMap,
    authorization: Option<HeaderValue>,
    gzipped: bool,
    body: &'a [u8],
) -> Result<TransportRequest<'a>> {
    let mut request = http::Request::builder()
        .method(method)
        .uri(url)
        .body(body)
        .map_err(|e| FeedError::RequestBuild(e.to_string()))?;

    let request_headers = request.headers_mut();
    request_headers.extend(headers.clone());
    if gzipped {
        request_headers.insert(CONTENT_ENCODING, HeaderValue::from_static("gzip"));
    }
    if let Some(authorization) = authorization {
        request_headers.insert(http::header::AUTHORIZATION, authorization);
    }

    Ok(request)
}
