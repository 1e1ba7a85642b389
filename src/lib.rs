//! 静态站点部署工具库
//!
//! 将本地静态站点构建目录上传到 S3 存储桶，主要功能包括：
//! - 按文件类型设置缓存控制头部（HTML 不缓存，资源目录永久缓存）
//! - 上传前删除远程的过期内容
//! - 可选地创建 CloudFront 缓存失效并轮询其状态
//!
//! 存储与 CDN 的调用都通过 [`s3::ObjectStore`] 与 [`cdn::CdnClient`] 两个 trait 完成，
//! 便于在测试中替换。

pub mod cdn;
pub mod cli;
pub mod config;
pub mod deploy;
pub mod error;
pub mod s3;
pub mod utils;
