//! RabbitMQ 관리 API HTTP 클라이언트
//!
//! 타임아웃과 Basic Auth를 지원하는 비동기 HTTP 클라이언트입니다.
//! 재시도는 하지 않습니다: 실패한 호출은 그대로 호출자에게 전달됩니다.

use reqwest::{Client, ClientBuilder, StatusCode};
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

use super::record::{parse_records, CollectResult, EntityRecord};
use super::{EntitySource, Resource};
use crate::error::CollectorError;

/// RabbitMQ 관리 API 클라이언트
#[derive(Clone)]
pub struct ManagementClient {
    client: Client,
    base_url: Url,
    timeout_ms: u64,
    auth: Option<(String, String)>,
}

impl ManagementClient {
    /// 새 클라이언트 생성
    ///
    /// # Arguments
    /// * `protocol` - `http` 또는 `https`
    /// * `host` - 브로커 호스트명
    /// * `port` - 관리 플러그인 포트 (기본 15672)
    /// * `timeout_ms` - 요청 타임아웃 (밀리초)
    ///
    /// # Example
    /// ```ignore
    /// let client = ManagementClient::new("http", "localhost", 15672, 5000)?
    ///     .with_auth("guest", "guest");
    /// ```
    pub fn new(protocol: &str, host: &str, port: u16, timeout_ms: u64) -> CollectResult<Self> {
        let raw = format!("{}://{}:{}/api/", protocol, host, port);
        let base_url = Url::parse(&raw).map_err(|source| CollectorError::InvalidUrl {
            url: raw.clone(),
            source,
        })?;

        let client = ClientBuilder::new()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .map_err(CollectorError::HttpClientInit)?;

        Ok(Self {
            client,
            base_url,
            timeout_ms,
            auth: None,
        })
    }

    /// Basic Auth 설정
    pub fn with_auth(mut self, username: &str, password: &str) -> Self {
        self.auth = Some((username.to_string(), password.to_string()));
        self
    }

    /// 리소스의 전체 URL
    pub fn url_for(&self, resource: Resource) -> CollectResult<Url> {
        self.base_url
            .join(resource.path())
            .map_err(|source| CollectorError::InvalidUrl {
                url: format!("{}{}", self.base_url, resource.path()),
                source,
            })
    }

    /// 단일 GET 요청 후 본문을 레코드로 변환
    #[instrument(skip(self), fields(host = ?self.base_url.host_str()))]
    async fn get(&self, resource: Resource) -> CollectResult<Vec<EntityRecord>> {
        let url = self.url_for(resource)?;
        debug!(path = resource.path(), "Issue a rabbit API call");
        debug!(url = %url, "Full URL");

        let mut req = self.client.get(url);

        if let Some((username, password)) = &self.auth {
            req = req.basic_auth(username, Some(password));
        }

        let response = req.send().await.map_err(|e| {
            if e.is_timeout() {
                CollectorError::timeout_with_duration(self.timeout_ms)
            } else {
                CollectorError::from(e)
            }
        })?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(CollectorError::AuthenticationFailed);
        }
        if !status.is_success() {
            return Err(CollectorError::HttpStatus(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(CollectorError::HttpResponse)?;

        parse_records(&body)
    }
}

impl EntitySource for ManagementClient {
    async fn fetch(&self, resource: Resource) -> CollectResult<Vec<EntityRecord>> {
        self.get(resource).await
    }
}
