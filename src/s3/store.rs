//! 对象存储接口模块
//!
//! 部署流程只依赖 [`ObjectStore`] 这一组最小的调用约定，
//! 生产环境使用基于 `aws-sdk-s3` 的 [`S3ObjectStore`]，测试中使用 mock 或内存实现。

use crate::error::StoreError;
use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;

/// 单个对象的上传请求
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectUpload {
    /// 远程对象键
    pub key: String,
    /// 文件内容
    pub body: Vec<u8>,
    /// `Content-Type` 头部
    pub content_type: String,
    /// `Cache-Control` 头部
    pub cache_control: &'static str,
}

/// 一次分页列举请求
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ListRequest {
    /// 键前缀，空字符串表示整个桶
    pub prefix: String,
    /// 为 `true` 时以 `/` 为分隔符，只返回当前层级的对象与子文件夹
    pub delimited: bool,
    /// 上一页返回的续传令牌
    pub continuation_token: Option<String>,
}

/// 一页列举结果
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ListPage {
    /// 当前页中的对象键
    pub keys: Vec<String>,
    /// 分隔列举时的子文件夹前缀（以 `/` 结尾）
    pub folders: Vec<String>,
    /// 下一页的续传令牌，`None` 表示已经到达末尾
    pub next_continuation_token: Option<String>,
}

/// 部署流程需要的对象存储操作。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// 上传单个对象
    async fn put_object(&self, upload: ObjectUpload) -> Result<(), StoreError>;

    /// 列举一页对象
    async fn list_page(&self, request: ListRequest) -> Result<ListPage, StoreError>;

    /// 删除单个对象
    async fn delete_object(&self, key: &str) -> Result<(), StoreError>;
}

/// 基于 `aws-sdk-s3` 的对象存储实现
pub struct S3ObjectStore {
    client: Client,
    bucket: String,
}

impl S3ObjectStore {
    pub fn new(client: Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn put_object(&self, upload: ObjectUpload) -> Result<(), StoreError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&upload.key)
            .body(ByteStream::from(upload.body))
            .content_type(upload.content_type)
            .cache_control(upload.cache_control)
            .send()
            .await
            .map_err(|e| StoreError::Put {
                key: upload.key.clone(),
                message: DisplayErrorContext(&e).to_string(),
            })?;
        Ok(())
    }

    async fn list_page(&self, request: ListRequest) -> Result<ListPage, StoreError> {
        let res = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .set_prefix((!request.prefix.is_empty()).then(|| request.prefix.clone()))
            .set_delimiter(request.delimited.then(|| "/".to_string()))
            .set_continuation_token(request.continuation_token)
            .send()
            .await
            .map_err(|e| StoreError::List {
                prefix: request.prefix.clone(),
                message: DisplayErrorContext(&e).to_string(),
            })?;

        let keys = res
            .contents()
            .iter()
            .filter_map(|object| object.key().map(str::to_string))
            .collect();

        let folders = res
            .common_prefixes()
            .iter()
            .filter_map(|prefix| prefix.prefix().map(str::to_string))
            .collect();

        // 只有在结果被截断时续传令牌才有意义
        let next_continuation_token = if res.is_truncated().unwrap_or(false) {
            res.next_continuation_token().map(str::to_string)
        } else {
            None
        };

        Ok(ListPage {
            keys,
            folders,
            next_continuation_token,
        })
    }

    async fn delete_object(&self, key: &str) -> Result<(), StoreError> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| StoreError::Delete {
                key: key.to_string(),
                message: DisplayErrorContext(&e).to_string(),
            })?;
        Ok(())
    }
}
