//! CDN 客户端模块
//!
//! 定义缓存失效所需的 [`CdnClient`] 接口，以及基于 `aws-sdk-cloudfront` 的 [`CloudFrontCdn`] 实现。

use crate::deploy::constants::CALLER_REFERENCE_PREFIX;
use crate::error::CdnError;
use async_trait::async_trait;
use aws_sdk_cloudfront::Client;
use aws_sdk_cloudfront::error::DisplayErrorContext;
use aws_sdk_cloudfront::types::{InvalidationBatch, Paths};
use chrono::Utc;
use std::fmt;

/// 缓存失效的状态
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidationStatus {
    InProgress,
    Completed,
    /// 无法识别的状态，按失败处理
    Unexpected(String),
}

impl InvalidationStatus {
    /// 解析 CloudFront 返回的状态字符串
    pub fn parse(raw: &str) -> Self {
        match raw {
            "InProgress" => InvalidationStatus::InProgress,
            "Completed" => InvalidationStatus::Completed,
            other => InvalidationStatus::Unexpected(other.to_string()),
        }
    }

    /// 是否为终止状态（完成或无法识别）
    pub fn is_terminal(&self) -> bool {
        !matches!(self, InvalidationStatus::InProgress)
    }
}

impl fmt::Display for InvalidationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidationStatus::InProgress => f.write_str("InProgress"),
            InvalidationStatus::Completed => f.write_str("Completed"),
            InvalidationStatus::Unexpected(raw) => f.write_str(raw),
        }
    }
}

/// 一次缓存失效请求
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidationRequest {
    pub distribution_id: String,
    pub paths: Vec<String>,
    /// 幂等令牌，同一令牌重复提交不会产生新的失效批次
    pub caller_reference: String,
}

impl InvalidationRequest {
    /// 使用当前时间戳生成幂等令牌
    pub fn new(distribution_id: impl Into<String>, paths: Vec<String>) -> Self {
        Self {
            distribution_id: distribution_id.into(),
            paths,
            caller_reference: format!("{CALLER_REFERENCE_PREFIX}-{}", Utc::now().timestamp_millis()),
        }
    }
}

/// 服务端分配的失效批次
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidationTicket {
    pub id: String,
    pub status: InvalidationStatus,
}

/// 部署流程需要的 CDN 操作。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CdnClient: Send + Sync {
    /// 创建一个缓存失效批次
    async fn create_invalidation(
        &self,
        request: InvalidationRequest,
    ) -> Result<InvalidationTicket, CdnError>;

    /// 查询缓存失效批次的当前状态
    async fn invalidation_status(
        &self,
        distribution_id: &str,
        invalidation_id: &str,
    ) -> Result<InvalidationStatus, CdnError>;
}

/// 基于 `aws-sdk-cloudfront` 的实现
pub struct CloudFrontCdn {
    client: Client,
}

impl CloudFrontCdn {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CdnClient for CloudFrontCdn {
    async fn create_invalidation(
        &self,
        request: InvalidationRequest,
    ) -> Result<InvalidationTicket, CdnError> {
        let create_error = |message: String| CdnError::Create {
            distribution_id: request.distribution_id.clone(),
            message,
        };

        let paths = Paths::builder()
            .quantity(request.paths.len() as i32)
            .set_items(Some(request.paths.clone()))
            .build()
            .map_err(|e| create_error(e.to_string()))?;

        let batch = InvalidationBatch::builder()
            .paths(paths)
            .caller_reference(&request.caller_reference)
            .build()
            .map_err(|e| create_error(e.to_string()))?;

        let output = self
            .client
            .create_invalidation()
            .distribution_id(&request.distribution_id)
            .invalidation_batch(batch)
            .send()
            .await
            .map_err(|e| create_error(DisplayErrorContext(&e).to_string()))?;

        let invalidation = output
            .invalidation()
            .ok_or(CdnError::MalformedResponse("Invalidation"))?;

        Ok(InvalidationTicket {
            id: invalidation.id().to_string(),
            status: InvalidationStatus::parse(invalidation.status()),
        })
    }

    async fn invalidation_status(
        &self,
        distribution_id: &str,
        invalidation_id: &str,
    ) -> Result<InvalidationStatus, CdnError> {
        let output = self
            .client
            .get_invalidation()
            .distribution_id(distribution_id)
            .id(invalidation_id)
            .send()
            .await
            .map_err(|e| CdnError::Status {
                invalidation_id: invalidation_id.to_string(),
                message: DisplayErrorContext(&e).to_string(),
            })?;

        let invalidation = output
            .invalidation()
            .ok_or(CdnError::MalformedResponse("Invalidation"))?;

        Ok(InvalidationStatus::parse(invalidation.status()))
    }
}
