//! 递归上传模块
//!
//! 深度优先遍历本地目录，把每个文件上传到与其相对路径对应的远程键。
//! 上传严格按顺序逐个进行；单个文件失败只会被记录，遍历继续。

use crate::deploy::policy::{CachePolicy, content_type_for};
use crate::error::UploadError;
use crate::s3::store::{ObjectStore, ObjectUpload};
use crate::utils::path::{join_slash, to_key_segment};
use std::path::{Path, PathBuf};
use tracing::{error, info};
use walkdir::WalkDir;

/// 一次上传的统计结果
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct UploadTally {
    /// 成功上传的文件数
    pub uploaded: usize,
    /// 失败的本地路径
    pub failed: Vec<PathBuf>,
}

impl UploadTally {
    /// 合并另一份统计结果
    pub fn merge(&mut self, other: UploadTally) {
        self.uploaded += other.uploaded;
        self.failed.extend(other.failed);
    }

    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }

    fn record(&mut self, path: &Path, result: Result<String, UploadError>) {
        match result {
            Ok(_) => self.uploaded += 1,
            Err(e) => {
                error!(path = %path.display(), error = %e, "文件上传失败");
                self.failed.push(path.to_path_buf());
            }
        }
    }
}

/// 将构建目录中的文件映射到远程键并上传
pub struct TreeUploader<'a, S: ?Sized> {
    store: &'a S,
    root: &'a Path,
    remote_prefix: &'a str,
    immutable_dir: &'a str,
}

impl<'a, S> TreeUploader<'a, S>
where
    S: ObjectStore + ?Sized,
{
    /// # 参数
    ///
    /// * `store` - 对象存储实现。
    /// * `root` - 构建目录根，远程键按相对它的路径生成。
    /// * `remote_prefix` - 远程键前缀，可以为空。
    /// * `immutable_dir` - 永久缓存的资源目录名称。
    pub fn new(store: &'a S, root: &'a Path, remote_prefix: &'a str, immutable_dir: &'a str) -> Self {
        Self {
            store,
            root,
            remote_prefix,
            immutable_dir,
        }
    }

    fn relative<'p>(&self, path: &'p Path) -> &'p Path {
        path.strip_prefix(self.root).unwrap_or(path)
    }

    /// 本地文件对应的远程键：`<prefix>/<相对路径>`
    ///
    /// # Errors
    ///
    /// 相对路径不是合法的 UTF-8 时返回 [`UploadError::NonUtf8Path`]。
    pub fn remote_key(&self, path: &Path) -> Result<String, UploadError> {
        let segment = to_key_segment(self.relative(path))
            .ok_or_else(|| UploadError::NonUtf8Path(path.to_path_buf()))?;
        Ok(join_slash(&[self.remote_prefix, segment.as_str()]))
    }

    /// 上传单个文件。
    ///
    /// # 返回值
    ///
    /// 成功时返回远程键。
    pub async fn upload_file(&self, path: &Path) -> Result<String, UploadError> {
        let relative = self.relative(path);
        let key = self.remote_key(path)?;
        let policy = CachePolicy::classify(relative, self.immutable_dir);

        let body = tokio::fs::read(path).await.map_err(|source| UploadError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let size = body.len();

        self.store
            .put_object(ObjectUpload {
                key: key.clone(),
                body,
                content_type: content_type_for(path),
                cache_control: policy.header_value(),
            })
            .await?;

        info!(key = %key, size, cache_control = policy.header_value(), "已上传");
        Ok(key)
    }

    /// 按给定顺序逐个上传文件
    pub async fn upload_files(&self, files: &[PathBuf]) -> UploadTally {
        let mut tally = UploadTally::default();
        for file in files {
            tally.record(file, self.upload_file(file).await);
        }
        tally
    }

    /// 深度优先上传目录下的所有文件。
    ///
    /// 遍历按文件名排序，跟随符号链接；无法读取的目录项计为失败。
    pub async fn upload_tree(&self, dir: &Path) -> UploadTally {
        let mut tally = UploadTally::default();

        for entry in WalkDir::new(dir).follow_links(true).sort_by_file_name() {
            match entry {
                Ok(entry) if entry.file_type().is_file() => {
                    tally.record(entry.path(), self.upload_file(entry.path()).await);
                }
                Ok(_) => {}
                Err(e) => {
                    let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| dir.to_path_buf());
                    tally.record(&path, Err(UploadError::Walk(e)));
                }
            }
        }

        tally
    }
}
