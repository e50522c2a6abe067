use bytes::Bytes;
use futures_util::StreamExt;

use crate::error::{ProviderError, ProviderErrorKind};

const MAX_ERROR_BODY_BYTES: usize = 64 * 1024;

pub(crate) async fn response_text_truncated(
    response: reqwest::Response,
    max_bytes: usize,
) -> String {
    let (bytes, truncated) = response_bytes_truncated(response, max_bytes).await;
    let mut body = String::from_utf8_lossy(&bytes).to_string();
    if truncated {
        if !body.is_empty() {
            body.push('\n');
        }
        body.push_str("...(truncated)");
    }
    body
}

async fn response_bytes_truncated(
    response: reqwest::Response,
    max_bytes: usize,
) -> (Vec<u8>, bool) {
    let max_bytes = max_bytes.max(1);
    let mut out = Vec::<u8>::new();
    let mut truncated = false;

    let mut stream = response.bytes_stream();
    while let Some(next) = stream.next().await {
        let Ok(chunk) = next else {
            break;
        };
        let remaining = max_bytes.saturating_sub(out.len());
        if remaining == 0 {
            truncated = true;
            break;
        }
        if chunk.len() <= remaining {
            out.extend_from_slice(chunk.as_ref());
        } else {
            out.extend_from_slice(&chunk.as_ref()[..remaining]);
            truncated = true;
            break;
        }
    }
    (out, truncated)
}

/// Sends the request and normalizes any non-2xx status into a
/// [`ProviderError`], with the error body truncated so a misbehaving
/// provider cannot flood logs.
pub(crate) async fn send_checked(
    req: reqwest::RequestBuilder,
) -> Result<reqwest::Response, ProviderError> {
    let response = req.send().await?;
    let status = response.status();
    if !status.is_success() {
        let body = response_text_truncated(response, MAX_ERROR_BODY_BYTES).await;
        return Err(ProviderError::from_status(status, body));
    }
    Ok(response)
}

/// Reads a binary body (audio, image) with a hard size cap.
pub(crate) async fn read_bytes_bounded(
    response: reqwest::Response,
    max_bytes: usize,
) -> Result<Bytes, ProviderError> {
    let (bytes, truncated) = response_bytes_truncated(response, max_bytes).await;
    if truncated {
        return Err(ProviderError::new(
            ProviderErrorKind::Unknown,
            format!("response exceeded max bytes ({max_bytes})"),
        ));
    }
    Ok(Bytes::from(bytes))
}
