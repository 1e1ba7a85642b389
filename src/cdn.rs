//! CDN模块
//!
//! 该模块负责创建 CloudFront 缓存失效请求，并轮询其状态直到完成或超时。

pub mod client;
pub mod monitor;

pub use client::{
    CdnClient, CloudFrontCdn, InvalidationRequest, InvalidationStatus, InvalidationTicket,
};
pub use monitor::{
    InvalidationReport, MonitorOutcome, PollSchedule, invalidate, invalidation_events,
    monitor_invalidation, parse_invalidation_paths,
};
