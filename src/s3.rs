//! S3模块
//!
//! 该模块负责处理与对象存储的交互，包括对象的上传、分页列举和删除，
//! 以及基于这些操作的过期内容清理。

// 声明子模块
pub mod cleaner;
pub mod store;

// 重新导出常用的类型和函数
pub use cleaner::{delete_prefix, sweep_root};
pub use store::{ListPage, ListRequest, ObjectStore, ObjectUpload, S3ObjectStore};
