use std::time::Duration;

/// 内容哈希命名的静态资源目录，永久缓存
pub const ASSET_DIR: &str = "assets";

/// 页面目录，按扩展名决定缓存策略
pub const PAGES_DIR: &str = "pages";

/// 不应缓存的文件扩展名。
pub const NO_CACHE_EXTS: &[&str] = &["html", "htm"];

/// HTML 文件的缓存控制头部值，每次访问都需要重新验证
pub const NO_CACHE_CONTROL: &str = "public, max-age=0, must-revalidate";

/// 静态资源的缓存控制头部值（一年，不再验证）
pub const IMMUTABLE_CACHE_CONTROL: &str = "public, max-age=31536000, immutable";

/// 未指定时使用的 AWS 区域
pub const DEFAULT_REGION: &str = "us-east-1";

/// 未指定失效路径时使用的通配路径
pub const DEFAULT_INVALIDATION_PATH: &str = "/*";

/// 缓存失效状态的轮询间隔
pub const POLL_INTERVAL: Duration = Duration::from_secs(10);

/// 缓存失效状态的轮询上限（5 分钟）
pub const POLL_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// 缓存失效请求 caller reference 的前缀
pub const CALLER_REFERENCE_PREFIX: &str = "static-deploy";
