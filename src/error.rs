//! 错误类型模块
//!
//! 按关注点划分的错误枚举：
//! - 配置错误（环境变量缺失）
//! - 对象存储错误（上传、列举、删除）
//! - CDN 错误（创建失效、查询状态）
//! - 部署错误（目录校验、清理失败）

use std::path::PathBuf;
use thiserror::Error;

/// 配置加载错误
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("必须设置环境变量 {0}")]
    MissingEnv(&'static str),
}

/// 对象存储操作错误
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("上传对象 '{key}' 失败: {message}")]
    Put { key: String, message: String },

    #[error("列举前缀 '{prefix}' 失败: {message}")]
    List { prefix: String, message: String },

    #[error("删除对象 '{key}' 失败: {message}")]
    Delete { key: String, message: String },
}

/// 单个文件的上传错误，只会被计数，不会中止部署
#[derive(Error, Debug)]
pub enum UploadError {
    #[error("读取本地文件 {path} 失败: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("遍历目录失败: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("文件路径不是合法的 UTF-8，无法生成远程键: {0}")]
    NonUtf8Path(PathBuf),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// CDN 操作错误
#[derive(Error, Debug)]
pub enum CdnError {
    #[error("为分发 {distribution_id} 创建缓存失效失败: {message}")]
    Create {
        distribution_id: String,
        message: String,
    },

    #[error("查询缓存失效 {invalidation_id} 状态失败: {message}")]
    Status {
        invalidation_id: String,
        message: String,
    },

    #[error("CDN 响应缺少字段: {0}")]
    MalformedResponse(&'static str),
}

/// 部署流程错误
///
/// 这里的错误都是致命的，会直接中止部署。单个文件的上传失败不在此列，
/// 它们只会计入 [`crate::deploy::UploadTally`]。
#[derive(Error, Debug)]
pub enum DeployError {
    #[error("构建目录不存在或不是目录: {0}")]
    NotADirectory(PathBuf),

    #[error("构建目录 {dir} 中缺少 {asset_dir} 与 {pages_dir} 文件夹，至少需要其中一个")]
    MissingKnownFolders {
        dir: PathBuf,
        asset_dir: String,
        pages_dir: String,
    },

    #[error("已知文件夹名称无效: '{0}'")]
    InvalidFolderName(String),

    #[error("读取构建目录失败: {0}")]
    Io(#[from] std::io::Error),

    #[error("清理远程前缀 '{prefix}' 失败")]
    Cleanup {
        prefix: String,
        #[source]
        source: StoreError,
    },
}
