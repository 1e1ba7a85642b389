use std::path::{Component, Path};

/// 从文件路径中获取扩展名，并转换为小写
///
/// # 参数
///
/// * `path` - 文件路径
///
/// # 返回值
///
/// 返回小写的文件扩展名字符串，如果没有扩展名则返回空字符串
///
/// # 示例
///
/// ```
/// use std::path::Path;
/// use static_deploy::utils::path::extension_lowercase;
///
/// assert_eq!(extension_lowercase(Path::new("index.HTML")), "html");
/// assert_eq!(extension_lowercase(Path::new("assets/app.js")), "js");
/// assert_eq!(extension_lowercase(Path::new("noext")), "");
/// assert_eq!(extension_lowercase(Path::new(".hidden")), "");
/// ```
pub fn extension_lowercase(path: &Path) -> String {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
        .unwrap_or_default()
}

/// 使用正斜杠连接多个字符串组件
///
/// 它会自动处理组件前后的斜杠，确保结果中组件之间只有一个正斜杠，
/// 空组件会被忽略。远程对象键都通过它拼接。
///
/// # 示例
///
/// ```
/// use static_deploy::utils::path::join_slash;
///
/// assert_eq!(join_slash(&["site", "assets/app.js"]), "site/assets/app.js");
/// assert_eq!(join_slash(&["site/", "/index.html"]), "site/index.html");
/// assert_eq!(join_slash(&["", "index.html"]), "index.html");
/// ```
pub fn join_slash(components: &[&str]) -> String {
    components
        .iter()
        .map(|s| s.trim_matches('/'))
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

/// 将本地相对路径转换为正斜杠分隔的键片段
///
/// 只保留普通路径组件；`.`、`..` 以及根组件都会被丢弃。
/// 任一组件不是合法的 UTF-8 时返回 `None`，不同文件不会映射到同一个键。
pub fn to_key_segment(relative: &Path) -> Option<String> {
    let mut parts = Vec::new();
    for component in relative.components() {
        if let Component::Normal(part) = component {
            parts.push(part.to_str()?);
        }
    }
    Some(parts.join("/"))
}

/// 远程前缀形式的键：非空时以 `/` 结尾，空时表示桶根
///
/// 带结尾斜杠可以避免 `assets` 误匹配 `assets-old`。
pub fn as_prefix(key: &str) -> String {
    let key = key.trim_matches('/');
    if key.is_empty() {
        String::new()
    } else {
        format!("{key}/")
    }
}
