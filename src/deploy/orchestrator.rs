//! 部署编排模块
//!
//! 一次部署的完整顺序：
//! 1. 校验构建目录，至少存在一个已知文件夹；
//! 2. 删除两个已知文件夹对应的远程前缀，以及根目录下的过期内容；
//! 3. 依次上传根目录文件、其他根目录文件夹、资源目录和页面目录。
//!
//! 先删除后上传，上传完成前远程位置是不完整的。

use crate::deploy::constants::{ASSET_DIR, PAGES_DIR};
use crate::deploy::uploader::{TreeUploader, UploadTally};
use crate::error::DeployError;
use crate::s3::cleaner::{delete_prefix, sweep_root};
use crate::s3::store::ObjectStore;
use crate::utils::path::{as_prefix, join_slash};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::info;

/// 一次部署的输入
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployPlan {
    /// 本地构建目录
    pub dist_dir: PathBuf,
    /// 远程键前缀（去掉首尾斜杠，空字符串表示桶根）
    pub remote_prefix: String,
    /// 永久缓存的资源目录名称
    pub asset_dir: String,
    /// 页面目录名称
    pub pages_dir: String,
}

impl DeployPlan {
    pub fn new(dist_dir: impl Into<PathBuf>, remote_prefix: &str) -> Self {
        Self {
            dist_dir: dist_dir.into(),
            remote_prefix: remote_prefix.trim_matches('/').to_string(),
            asset_dir: ASSET_DIR.to_string(),
            pages_dir: PAGES_DIR.to_string(),
        }
    }

    /// 替换两个已知文件夹的名称
    pub fn with_known_dirs(mut self, asset_dir: &str, pages_dir: &str) -> Self {
        self.asset_dir = asset_dir.to_string();
        self.pages_dir = pages_dir.to_string();
        self
    }

    fn known_dirs(&self) -> [&str; 2] {
        [self.asset_dir.as_str(), self.pages_dir.as_str()]
    }
}

/// 部署结果汇总
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploySummary {
    /// 删除的远程对象数
    pub deleted: usize,
    /// 成功上传的文件数
    pub uploaded: usize,
    /// 上传失败的本地文件
    pub failed: Vec<PathBuf>,
    /// 总耗时
    pub elapsed: Duration,
}

impl DeploySummary {
    /// 所有文件都上传成功
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// 构建目录根层级的内容
#[derive(Debug, Default)]
struct RootLayout {
    files: Vec<PathBuf>,
    other_dirs: Vec<PathBuf>,
    asset_dir: Option<PathBuf>,
    pages_dir: Option<PathBuf>,
}

/// 扫描构建目录根层级，不访问网络。
fn scan_root(plan: &DeployPlan) -> Result<RootLayout, DeployError> {
    if !plan.dist_dir.is_dir() {
        return Err(DeployError::NotADirectory(plan.dist_dir.clone()));
    }

    // 空名称会让远程前缀退化为部署根，清理时整个根都会被删除
    for name in plan.known_dirs() {
        if !is_valid_folder_name(name) {
            return Err(DeployError::InvalidFolderName(name.to_string()));
        }
    }

    let known = |name: &str| {
        let path = plan.dist_dir.join(name);
        path.is_dir().then_some(path)
    };

    let mut layout = RootLayout {
        asset_dir: known(&plan.asset_dir),
        pages_dir: known(&plan.pages_dir),
        ..Default::default()
    };

    if layout.asset_dir.is_none() && layout.pages_dir.is_none() {
        return Err(DeployError::MissingKnownFolders {
            dir: plan.dist_dir.clone(),
            asset_dir: plan.asset_dir.clone(),
            pages_dir: plan.pages_dir.clone(),
        });
    }

    let mut entries = fs::read_dir(&plan.dist_dir)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<Vec<_>, _>>()?;
    entries.sort();

    for path in entries {
        if path.is_file() {
            layout.files.push(path);
        } else if path.is_dir() && !is_known_dir(&path, plan) {
            layout.other_dirs.push(path);
        }
    }

    Ok(layout)
}

/// 已知文件夹必须是构建目录根下的单层名称
fn is_valid_folder_name(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\\'])
}

fn is_known_dir(path: &Path, plan: &DeployPlan) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| plan.known_dirs().contains(&name))
}

/// 删除远程上一版本的内容。
///
/// 任何删除失败都会中止部署；而单个文件的上传失败只计数不中止。
/// 两者的处理方式并不一致，这里保持现状。
async fn clean_remote<S>(store: &S, plan: &DeployPlan) -> Result<usize, DeployError>
where
    S: ObjectStore + ?Sized,
{
    let mut deleted = 0;

    for dir in plan.known_dirs() {
        let prefix = as_prefix(&join_slash(&[plan.remote_prefix.as_str(), dir]));
        deleted += delete_prefix(store, &prefix)
            .await
            .map_err(|source| DeployError::Cleanup {
                prefix: prefix.clone(),
                source,
            })?;
    }

    let root = as_prefix(&plan.remote_prefix);
    deleted += sweep_root(store, &root, &plan.known_dirs())
        .await
        .map_err(|source| DeployError::Cleanup {
            prefix: root.clone(),
            source,
        })?;

    Ok(deleted)
}

/// 执行一次完整部署。
///
/// # 参数
///
/// * `store` - 对象存储实现。
/// * `plan` - 部署输入。
///
/// # 返回值
///
/// 部署结果汇总。单个文件上传失败不会返回错误，只会出现在 `failed` 中。
///
/// # Errors
///
/// 构建目录无效（此时不会发起任何网络请求）或清理远程内容失败时返回错误。
pub async fn deploy<S>(store: &S, plan: &DeployPlan) -> Result<DeploySummary, DeployError>
where
    S: ObjectStore + ?Sized,
{
    let started = Instant::now();
    let layout = scan_root(plan)?;
    info!(
        dist = %plan.dist_dir.display(),
        prefix = %plan.remote_prefix,
        root_files = layout.files.len(),
        other_dirs = layout.other_dirs.len(),
        "构建目录校验通过"
    );

    let deleted = clean_remote(store, plan).await?;

    let uploader = TreeUploader::new(store, &plan.dist_dir, &plan.remote_prefix, &plan.asset_dir);

    let mut tally = UploadTally::default();
    tally.merge(uploader.upload_files(&layout.files).await);
    for dir in &layout.other_dirs {
        tally.merge(uploader.upload_tree(dir).await);
    }
    for dir in [&layout.asset_dir, &layout.pages_dir].into_iter().flatten() {
        info!(dir = %dir.display(), "上传已知文件夹");
        tally.merge(uploader.upload_tree(dir).await);
    }

    Ok(DeploySummary {
        deleted,
        uploaded: tally.uploaded,
        failed: tally.failed,
        elapsed: started.elapsed(),
    })
}
