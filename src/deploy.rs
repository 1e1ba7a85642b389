//! 部署模块
//!
//! 此模块包含了一次部署所需的全部逻辑：
//! - 常量（已知文件夹、缓存头部、轮询时间）
//! - 缓存策略分类
//! - 递归上传
//! - 部署编排

pub mod constants;
pub mod orchestrator;
pub mod policy;
pub mod uploader;

// 重新导出主要的公共接口
pub use orchestrator::{DeployPlan, DeploySummary, deploy};
pub use policy::CachePolicy;
pub use uploader::{TreeUploader, UploadTally};
