//! 部署工具的配置模块。
//!
//! 该模块负责从环境变量读取 AWS 凭据与区域，并据此构建 S3 与 CloudFront 客户端。
//!
//! # 环境变量
//!
//! * `AWS_ACCESS_KEY_ID` - AWS 访问密钥 ID（必需）
//! * `AWS_SECRET_ACCESS_KEY` - AWS 秘密访问密钥（必需）
//! * `AWS_REGION` - AWS 区域（可选，命令行参数优先，默认 us-east-1）
//! * `S3_ENDPOINT` - S3 兼容服务的端点 URL（可选，仅作用于存储客户端）

use crate::deploy::constants::DEFAULT_REGION;
use crate::error::ConfigError;
use aws_config::meta::region::RegionProviderChain;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_sdk_s3::config::Credentials;
use std::env;

pub const ACCESS_KEY_ID_ENV: &str = "AWS_ACCESS_KEY_ID";
pub const SECRET_ACCESS_KEY_ENV: &str = "AWS_SECRET_ACCESS_KEY";
pub const REGION_ENV: &str = "AWS_REGION";
pub const ENDPOINT_ENV: &str = "S3_ENDPOINT";

/// 凭据提供者名称，会出现在 SDK 的调试日志中
const PROVIDER_NAME: &str = "static-deploy-env";

/// 从环境中读取的 AWS 设置
#[derive(Clone)]
pub struct AwsSettings {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub region: Option<String>,
    pub endpoint: Option<String>,
}

impl std::fmt::Debug for AwsSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsSettings")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"***")
            .field("region", &self.region)
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

impl AwsSettings {
    /// 从进程环境变量读取设置。
    ///
    /// 调用前应先通过 `dotenvy` 加载 `.env` 文件。
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// 通过任意查找函数读取设置，空字符串视为未设置。
    ///
    /// # Errors
    ///
    /// 缺少任一凭据变量时返回 [`ConfigError::MissingEnv`]。
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let access_key_id = read(ACCESS_KEY_ID_ENV).ok_or(ConfigError::MissingEnv(ACCESS_KEY_ID_ENV))?;
        let secret_access_key =
            read(SECRET_ACCESS_KEY_ENV).ok_or(ConfigError::MissingEnv(SECRET_ACCESS_KEY_ENV))?;

        Ok(Self {
            access_key_id,
            secret_access_key,
            region: read(REGION_ENV),
            endpoint: read(ENDPOINT_ENV),
        })
    }

    /// 确定最终使用的区域：命令行参数 > `AWS_REGION` > 默认区域
    pub fn resolve_region(&self, cli_region: Option<&str>) -> String {
        cli_region
            .map(str::to_string)
            .or_else(|| self.region.clone())
            .unwrap_or_else(|| DEFAULT_REGION.to_string())
    }

    /// 使用静态凭据构建共享的 SDK 配置。
    ///
    /// 这里不会发起任何网络请求。
    pub async fn load_sdk_config(&self, region: &str) -> SdkConfig {
        let credentials = Credentials::new(
            self.access_key_id.clone(),
            self.secret_access_key.clone(),
            None,
            None,
            PROVIDER_NAME,
        );

        let region_provider = RegionProviderChain::first_try(Some(Region::new(region.to_string())));

        aws_config::defaults(BehaviorVersion::latest())
            .credentials_provider(credentials)
            .region(region_provider)
            .load()
            .await
    }

    /// 创建 S3 客户端，配置了 `S3_ENDPOINT` 时使用路径风格寻址
    pub fn s3_client(&self, sdk_config: &SdkConfig) -> aws_sdk_s3::Client {
        let mut builder = aws_sdk_s3::config::Builder::from(sdk_config);
        if let Some(endpoint) = &self.endpoint {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }
        aws_sdk_s3::Client::from_conf(builder.build())
    }

    /// 创建 CloudFront 客户端
    pub fn cloudfront_client(&self, sdk_config: &SdkConfig) -> aws_sdk_cloudfront::Client {
        aws_sdk_cloudfront::Client::new(sdk_config)
    }
}
