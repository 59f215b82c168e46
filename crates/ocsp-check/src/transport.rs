//! OCSP over HTTP POST

use crate::context::{Context, ContextError};
use crate::error::{OcspError, TransportError};
use crate::http::{HttpClient, HttpPost};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, USER_AGENT};
use reqwest::{StatusCode, Url};
use std::time::Duration;
use tracing::debug;

/// Longest time a query may take.
///
/// Baseline Requirements section 4.10.2: CAs must provide OCSP response
/// times of ten seconds or less under normal operating conditions.
pub const QUERY_TIMEOUT: Duration = Duration::from_secs(10);

pub const OCSP_REQUEST_CONTENT_TYPE: &str = "application/ocsp-request";
pub const OCSP_RESPONSE_CONTENT_TYPE: &str = "application/ocsp-response";

/// POST `request` to `responder_url` and return the raw response body.
///
/// The query is bounded by [`QUERY_TIMEOUT`] and by `ctx`, whichever ends
/// first. A non-200 status is reported before a wrong Content-Type.
pub async fn query(
    ctx: &Context,
    responder_url: &str,
    request: &[u8],
    client: &dyn HttpClient,
    user_agent: Option<&str>,
) -> Result<Vec<u8>, OcspError> {
    let url = Url::parse(responder_url).map_err(|e| TransportError::InvalidUrl {
        url: responder_url.to_string(),
        reason: e.to_string(),
    })?;

    let mut headers = HeaderMap::new();
    headers.insert(
        CONTENT_TYPE,
        HeaderValue::from_static(OCSP_REQUEST_CONTENT_TYPE),
    );
    if let Some(agent) = user_agent.filter(|agent| !agent.is_empty()) {
        let value = HeaderValue::from_str(agent).map_err(|_| TransportError::InvalidHeader {
            name: "User-Agent",
        })?;
        headers.insert(USER_AGENT, value);
    }

    let post = HttpPost {
        url,
        headers,
        body: request.to_vec(),
        retry_safe: true,
    };

    debug!(responder = responder_url, len = request.len(), "sending OCSP query");
    let reply = match ctx.with_timeout(QUERY_TIMEOUT).run(client.post(post)).await {
        Ok(Ok(reply)) => reply,
        Ok(Err(err)) => return Err(TransportError::Http(err).into()),
        Err(ContextError::DeadlineExceeded) => return Err(TransportError::DeadlineExceeded.into()),
        Err(ContextError::Cancelled) => return Err(TransportError::Cancelled.into()),
    };

    if reply.status != StatusCode::OK {
        return Err(OcspError::ResponderHttp {
            status: reply.status,
        });
    }

    let content_type = reply
        .headers
        .get(CONTENT_TYPE)
        .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned())
        .unwrap_or_default();
    if content_type != OCSP_RESPONSE_CONTENT_TYPE {
        return Err(OcspError::InvalidContentType { content_type });
    }

    debug!(responder = responder_url, len = reply.body.len(), "received OCSP response");
    Ok(reply.body)
}
