use anyhow::{Context, Result, ensure};
use reqwest::{
    Client, Response, Url,
    header::{CACHE_CONTROL, HeaderMap, HeaderValue, PRAGMA},
};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Headers asking every cache on the way to pass the request through
fn no_cache_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
    headers
}

/// Create the asynchronous client used for page GET requests
pub fn async_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .default_headers(no_cache_headers())
        .build()
        .context("failed to create HTTP client")
}

/// Create the blocking client used for save POST requests
///
/// Must not be created or used from within an async runtime.
pub fn blocking_client(timeout: Duration) -> Result<reqwest::blocking::Client> {
    reqwest::blocking::Client::builder()
        .timeout(timeout)
        .default_headers(no_cache_headers())
        .build()
        .context("failed to create blocking HTTP client")
}

/// Append a `_=<millis>` query parameter so that no cached reply is reused
///
/// # Examples
/// ```
/// use tp2bmc_console::http_client::cache_busted;
///
/// let url = cache_busted("http://bmc/api/bmc?opt=get&type=usb").unwrap();
/// assert!(url.as_str().starts_with("http://bmc/api/bmc?opt=get&type=usb&_="));
/// ```
pub fn cache_busted(url: &str) -> Result<Url> {
    let mut url = Url::parse(url).with_context(|| format!("failed to parse url {url:?}"))?;
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();

    url.query_pairs_mut().append_pair("_", &millis.to_string());
    Ok(url)
}

/// Handle HTTP response by checking status and extracting the body text
///
/// # Arguments
/// * `res` - The HTTP response to handle
/// * `context_msg` - Context message describing the request (e.g., "GET http://bmc/api")
///
/// # Returns
/// * `Ok(String)` - The response body if the status is successful
/// * `Err` - If the status is not successful or reading the body fails
pub async fn handle_http_response(res: Response, context_msg: &str) -> Result<String> {
    let status = res.status();
    let body = res.text().await.context("failed to read response body")?;

    ensure!(
        status.is_success(),
        "{context_msg} failed with status {status} and body: {body}"
    );

    Ok(body)
}

/// Blocking counterpart of [`handle_http_response`]
pub fn handle_blocking_http_response(
    res: reqwest::blocking::Response,
    context_msg: &str,
) -> Result<String> {
    let status = res.status();
    let body = res.text().context("failed to read response body")?;

    ensure!(
        status.is_success(),
        "{context_msg} failed with status {status} and body: {body}"
    );

    Ok(body)
}
