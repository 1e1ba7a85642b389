//! 过期内容清理模块
//!
//! 部署前删除远程上一版本的内容。每一页列举结果中的删除请求并行发出，
//! 任意一个删除失败都会让整个前缀的清理失败，不做重试。

use crate::error::StoreError;
use crate::s3::store::{ListRequest, ObjectStore};
use futures::future::try_join_all;
use tracing::{debug, info};

/// 删除指定前缀下的全部对象。
///
/// # 参数
///
/// * `store` - 对象存储实现。
/// * `prefix` - 要清空的键前缀，应以 `/` 结尾。
///
/// # 返回值
///
/// 删除的对象数量。
///
/// # Errors
///
/// 列举失败或任意一个删除失败时立即返回错误。
pub async fn delete_prefix<S>(store: &S, prefix: &str) -> Result<usize, StoreError>
where
    S: ObjectStore + ?Sized,
{
    let mut deleted = 0;
    let mut continuation_token = None;

    loop {
        let page = store
            .list_page(ListRequest {
                prefix: prefix.to_string(),
                delimited: false,
                continuation_token,
            })
            .await?;

        // 同一页内的删除并行执行，失败即中止
        try_join_all(page.keys.iter().map(|key| store.delete_object(key))).await?;
        deleted += page.keys.len();
        debug!(prefix, page_size = page.keys.len(), "已删除一页对象");

        match page.next_continuation_token {
            Some(token) => continuation_token = Some(token),
            None => break,
        }
    }

    info!(prefix, deleted, "前缀清理完成");
    Ok(deleted)
}

/// 清理根前缀下的过期内容。
///
/// 删除根层级的所有对象，以及名称不在 `keep` 中的所有子文件夹。
/// `keep` 中的文件夹由调用方单独清理。
///
/// # 参数
///
/// * `store` - 对象存储实现。
/// * `root_prefix` - 根前缀（以 `/` 结尾，或为空表示桶根）。
/// * `keep` - 跳过的子文件夹名称。
///
/// # 返回值
///
/// 删除的对象数量。
pub async fn sweep_root<S>(store: &S, root_prefix: &str, keep: &[&str]) -> Result<usize, StoreError>
where
    S: ObjectStore + ?Sized,
{
    let mut deleted = 0;
    let mut continuation_token = None;

    loop {
        let page = store
            .list_page(ListRequest {
                prefix: root_prefix.to_string(),
                delimited: true,
                continuation_token,
            })
            .await?;

        try_join_all(page.keys.iter().map(|key| store.delete_object(key))).await?;
        deleted += page.keys.len();

        for folder in &page.folders {
            let name = folder
                .strip_prefix(root_prefix)
                .unwrap_or(folder)
                .trim_matches('/');
            if keep.contains(&name) {
                continue;
            }
            info!(folder = %folder, "删除过期文件夹");
            deleted += delete_prefix(store, folder).await?;
        }

        match page.next_continuation_token {
            Some(token) => continuation_token = Some(token),
            None => break,
        }
    }

    info!(root_prefix, deleted, "根目录过期内容清理完成");
    Ok(deleted)
}
