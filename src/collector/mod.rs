//! RabbitMQ 상태 수집 모듈
//!
//! 관리 API에서 queue, consumer, node, overview 정보를 가져옵니다.
//!
//! # Example
//!
//! ```ignore
//! use rabbitmq_zabbix::collector::{EntitySource, ManagementClient, Resource};
//!
//! let client = ManagementClient::new("http", "localhost", 15672, 5000)?;
//! let queues = client.fetch(Resource::Queues).await?;
//! ```

mod client;
mod record;

use std::fmt;

pub use client::ManagementClient;
pub use record::{parse_records, CollectResult, EntityRecord, FieldValue};

/// 관리 API 리소스 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    /// `GET /api/queues`
    Queues,
    /// `GET /api/consumers`
    Consumers,
    /// `GET /api/nodes`
    Nodes,
    /// `GET /api/overview`
    Overview,
    /// `GET /api/aliveness-test/%2f` (기본 vhost)
    Aliveness,
}

impl Resource {
    /// `/api/` 아래 상대 경로
    pub fn path(&self) -> &'static str {
        match self {
            Resource::Queues => "queues",
            Resource::Consumers => "consumers",
            Resource::Nodes => "nodes",
            Resource::Overview => "overview",
            Resource::Aliveness => "aliveness-test/%2f",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// 브로커 상태를 레코드 목록으로 돌려주는 데이터 소스
///
/// 배열 리소스는 원소마다 레코드 하나를, `overview`와 `aliveness-test`는
/// 레코드 하나를 반환합니다.
#[allow(async_fn_in_trait)]
pub trait EntitySource {
    /// 리소스 조회
    async fn fetch(&self, resource: Resource) -> CollectResult<Vec<EntityRecord>>;
}
