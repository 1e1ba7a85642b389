//! 缓存策略模块
//!
//! 根据文件扩展名和所在目录决定 `Cache-Control`，并猜测 `Content-Type`。

use crate::deploy::constants::{IMMUTABLE_CACHE_CONTROL, NO_CACHE_CONTROL, NO_CACHE_EXTS};
use crate::utils::path::extension_lowercase;
use std::path::Path;

/// 上传对象使用的缓存策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    /// HTML 页面，每次访问重新验证
    NoCache,
    /// 长期缓存，不再验证
    Immutable,
}

impl CachePolicy {
    /// 确定文件应使用的缓存策略。
    ///
    /// 只取决于两点：文件扩展名，以及文件是否位于永久缓存的资源目录下。
    /// 资源目录下的文件一律永久缓存，即使是 `.html`。
    ///
    /// # 参数
    ///
    /// * `relative` - 相对于构建目录根的文件路径。
    /// * `immutable_dir` - 资源目录名称，为空时没有任何文件位于资源目录下。
    pub fn classify(relative: &Path, immutable_dir: &str) -> Self {
        let under_immutable_dir = !immutable_dir.is_empty()
            && relative.starts_with(immutable_dir)
            && relative != Path::new(immutable_dir);
        if under_immutable_dir {
            return CachePolicy::Immutable;
        }

        if NO_CACHE_EXTS.contains(&extension_lowercase(relative).as_str()) {
            CachePolicy::NoCache
        } else {
            CachePolicy::Immutable
        }
    }

    /// 对应的 `Cache-Control` 头部值
    pub fn header_value(self) -> &'static str {
        match self {
            CachePolicy::NoCache => NO_CACHE_CONTROL,
            CachePolicy::Immutable => IMMUTABLE_CACHE_CONTROL,
        }
    }
}

/// 根据扩展名猜测 `Content-Type`，无法识别时使用 `application/octet-stream`
pub fn content_type_for(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}
