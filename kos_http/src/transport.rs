use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::{
    header::{HeaderValue, CONTENT_TYPE},
    Client, Url,
};

use crate::{
    error::KosError,
    request::{ApiRequest, ApiResponse},
};

/// Moves an [`ApiRequest`] over the wire.
///
/// Every HTTP status is a successful send; only failures to talk to the
/// backend at all come back as `Err`.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, KosError>;
}

#[derive(Clone)]
pub struct ReqwestTransport {
    base_url: String,          // http://localhost:5000/api  (без завершающего /)
    client:   Client,
}

impl ReqwestTransport {
    pub fn new(base_url: impl AsRef<str>, timeout: Duration) -> Result<Self, KosError> {
        let client = Client::builder()
            .user_agent("kos-http/0.1")
            .timeout(timeout)
            .build()?;
        Self::with_client(base_url, client)
    }

    pub fn with_client(base_url: impl AsRef<str>, client: Client) -> Result<Self, KosError> {
        let base_url = base_url.as_ref().trim_end_matches('/').to_owned();
        Url::parse(&base_url)?;
        Ok(Self { base_url, client })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url_for(&self, request: &ApiRequest) -> Result<Url, KosError> {
        let mut raw = self.base_url.clone();
        if !request.path.starts_with('/') {
            raw.push('/');
        }
        raw.push_str(&request.path);
        if request.query.is_empty() {
            Ok(Url::parse(&raw)?)
        } else {
            Ok(Url::parse_with_params(&raw, &request.query)?)
        }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, KosError> {
        let url = self.url_for(&request)?;
        debug!("{} {} [{}]", request.method, url, request.id);

        let mut builder = self
            .client
            .request(request.method.clone(), url)
            .headers(request.headers);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        } else {
            builder = builder.header(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }

        let resp = builder.send().await?;
        let status = resp.status();
        let headers = resp.headers().clone();
        let body = resp.bytes().await?.to_vec();

        Ok(ApiResponse { status, headers, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transport() -> ReqwestTransport {
        ReqwestTransport::new("http://localhost:5000/api/", Duration::from_secs(1)).unwrap()
    }

    #[test]
    fn path_is_joined_with_one_slash() {
        let t = transport();
        assert_eq!(t.base_url(), "http://localhost:5000/api");
        for path in ["/rides/pending", "rides/pending"] {
            let url = t.url_for(&ApiRequest::get(path)).unwrap();
            assert_eq!(url.as_str(), "http://localhost:5000/api/rides/pending");
        }
    }

    #[test]
    fn query_pairs_are_encoded() {
        let url = transport()
            .url_for(&ApiRequest::get("/drivers/me/assigned-rides").query("status", "accepted,in_progress"))
            .unwrap();
        assert_eq!(url.query(), Some("status=accepted%2Cin_progress"));
    }
}
