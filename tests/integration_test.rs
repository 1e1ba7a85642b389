use async_trait::async_trait;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

// 导入部署模块
use static_deploy::deploy::constants::{IMMUTABLE_CACHE_CONTROL, NO_CACHE_CONTROL};
use static_deploy::deploy::{DeployPlan, deploy};
use static_deploy::error::{DeployError, StoreError};
use static_deploy::s3::{ListPage, ListRequest, ObjectStore, ObjectUpload};

/// 内存中的对象存储，记录所有调用
#[derive(Default)]
struct MemoryStore {
    objects: Mutex<BTreeMap<String, ObjectUpload>>,
    puts: Mutex<Vec<String>>,
    deletes: Mutex<Vec<String>>,
    lists: AtomicUsize,
    /// 上传键以此结尾时失败
    fail_put_suffix: Option<&'static str>,
    fail_deletes: bool,
}

/// 每页条目数，足够小以覆盖分页
const PAGE_SIZE: usize = 2;

impl MemoryStore {
    fn seeded(keys: &[&str]) -> Self {
        let store = MemoryStore::default();
        {
            let mut objects = store.objects.lock().unwrap();
            for key in keys {
                objects.insert(
                    key.to_string(),
                    ObjectUpload {
                        key: key.to_string(),
                        body: Vec::new(),
                        content_type: "text/plain".to_string(),
                        cache_control: NO_CACHE_CONTROL,
                    },
                );
            }
        }
        store
    }

    fn total_calls(&self) -> usize {
        self.puts.lock().unwrap().len()
            + self.deletes.lock().unwrap().len()
            + self.lists.load(Ordering::SeqCst)
    }

    fn keys(&self) -> Vec<String> {
        self.objects.lock().unwrap().keys().cloned().collect()
    }

    fn cache_control(&self, key: &str) -> &'static str {
        self.objects.lock().unwrap()[key].cache_control
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn put_object(&self, upload: ObjectUpload) -> Result<(), StoreError> {
        self.puts.lock().unwrap().push(upload.key.clone());
        if self.fail_put_suffix.is_some_and(|suffix| upload.key.ends_with(suffix)) {
            return Err(StoreError::Put {
                key: upload.key,
                message: "InternalError".to_string(),
            });
        }
        self.objects.lock().unwrap().insert(upload.key.clone(), upload);
        Ok(())
    }

    async fn list_page(&self, request: ListRequest) -> Result<ListPage, StoreError> {
        self.lists.fetch_add(1, Ordering::SeqCst);

        // (是否为文件夹, 键或前缀)
        let mut entries: Vec<(bool, String)> = Vec::new();
        for key in self.keys().into_iter().filter(|k| k.starts_with(&request.prefix)) {
            let rest = &key[request.prefix.len()..];
            match rest.find('/') {
                Some(idx) if request.delimited => {
                    let folder = format!("{}{}", request.prefix, &rest[..=idx]);
                    if !entries.contains(&(true, folder.clone())) {
                        entries.push((true, folder));
                    }
                }
                _ => entries.push((false, key)),
            }
        }

        // 续传令牌是上一页最后一个条目，下一页从其后开始
        let start = match request.continuation_token.as_deref() {
            Some(after) => entries
                .iter()
                .position(|(_, entry)| entry.as_str() > after)
                .unwrap_or(entries.len()),
            None => 0,
        };
        let end = (start + PAGE_SIZE).min(entries.len());

        let mut page = ListPage::default();
        for (is_folder, entry) in &entries[start..end] {
            if *is_folder {
                page.folders.push(entry.clone());
            } else {
                page.keys.push(entry.clone());
            }
        }
        page.next_continuation_token = (end < entries.len()).then(|| entries[end - 1].1.clone());
        Ok(page)
    }

    async fn delete_object(&self, key: &str) -> Result<(), StoreError> {
        self.deletes.lock().unwrap().push(key.to_string());
        if self.fail_deletes {
            return Err(StoreError::Delete {
                key: key.to_string(),
                message: "AccessDenied".to_string(),
            });
        }
        self.objects.lock().unwrap().remove(key);
        Ok(())
    }
}

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// 典型的构建目录：3 个根目录文件、1 个其他文件夹、两个已知文件夹
fn build_site(root: &Path) -> Vec<&'static str> {
    let files = vec![
        "index.html",
        "robots.txt",
        "404.htm",
        "images/logo.png",
        "assets/app.js",
        "assets/chunks/vendor.js",
        "assets/embed.html",
        "pages/about.html",
        "pages/blog/post.html",
        "pages/feed.json",
    ];
    for file in &files {
        write(root, file, file);
    }
    files
}

/// 集成测试：两个已知文件夹都不存在时，不发起任何存储调用
#[tokio::test]
async fn test_missing_known_folders_fails_before_network() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "index.html", "<html></html>");
    write(dir.path(), "images/logo.png", "png");

    let store = MemoryStore::seeded(&["site/index.html"]);
    let result = deploy(&store, &DeployPlan::new(dir.path(), "site")).await;

    assert!(matches!(result, Err(DeployError::MissingKnownFolders { .. })));
    assert_eq!(store.total_calls(), 0);
    assert_eq!(store.keys(), vec!["site/index.html".to_string()]);
}

/// 集成测试：N 个文件恰好产生 N 次上传，远程键为 `<s3-path>/<相对路径>`
#[tokio::test]
async fn test_every_file_uploaded_once_with_mirrored_key() {
    let dir = tempfile::tempdir().unwrap();
    let files = build_site(dir.path());

    let store = MemoryStore::default();
    let summary = deploy(&store, &DeployPlan::new(dir.path(), "/site/")).await.unwrap();

    let mut puts = store.puts.lock().unwrap().clone();
    puts.sort();
    let mut expected: Vec<String> = files.iter().map(|f| format!("site/{f}")).collect();
    expected.sort();

    assert_eq!(puts, expected);
    assert_eq!(summary.uploaded, files.len());
    assert!(summary.is_success());
}

/// 集成测试：上传顺序为根目录文件、其他文件夹、资源目录、页面目录
#[tokio::test]
async fn test_upload_order() {
    let dir = tempfile::tempdir().unwrap();
    build_site(dir.path());

    let store = MemoryStore::default();
    deploy(&store, &DeployPlan::new(dir.path(), "site")).await.unwrap();

    let puts = store.puts.lock().unwrap().clone();
    assert_eq!(
        puts,
        vec![
            "site/404.htm",
            "site/index.html",
            "site/robots.txt",
            "site/images/logo.png",
            "site/assets/app.js",
            "site/assets/chunks/vendor.js",
            "site/assets/embed.html",
            "site/pages/about.html",
            "site/pages/blog/post.html",
            "site/pages/feed.json",
        ]
    );
}

/// 集成测试：缓存控制头部只取决于扩展名和是否位于资源目录
#[tokio::test]
async fn test_cache_control_headers() {
    let dir = tempfile::tempdir().unwrap();
    build_site(dir.path());

    let store = MemoryStore::default();
    deploy(&store, &DeployPlan::new(dir.path(), "site")).await.unwrap();

    assert_eq!(store.cache_control("site/index.html"), NO_CACHE_CONTROL);
    assert_eq!(store.cache_control("site/404.htm"), NO_CACHE_CONTROL);
    assert_eq!(store.cache_control("site/pages/about.html"), NO_CACHE_CONTROL);
    assert_eq!(store.cache_control("site/pages/blog/post.html"), NO_CACHE_CONTROL);

    assert_eq!(store.cache_control("site/assets/embed.html"), IMMUTABLE_CACHE_CONTROL);
    assert_eq!(store.cache_control("site/assets/app.js"), IMMUTABLE_CACHE_CONTROL);
    assert_eq!(store.cache_control("site/robots.txt"), IMMUTABLE_CACHE_CONTROL);
    assert_eq!(store.cache_control("site/images/logo.png"), IMMUTABLE_CACHE_CONTROL);
    assert_eq!(store.cache_control("site/pages/feed.json"), IMMUTABLE_CACHE_CONTROL);
}

/// 集成测试：前缀下的过期内容被删除，前缀外的内容保持不变
#[tokio::test]
async fn test_stale_content_removed() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "index.html", "new");
    write(dir.path(), "pages/about.html", "new");

    let store = MemoryStore::seeded(&[
        "site/index.html",
        "site/old.html",
        "site/legacy/a.js",
        "site/legacy/deep/b.js",
        "site/assets/old-1.js",
        "site/assets/old-2.js",
        "site/assets/old-3.js",
        "site/pages/gone.html",
        "other/keep.txt",
    ]);

    let summary = deploy(&store, &DeployPlan::new(dir.path(), "site")).await.unwrap();

    assert_eq!(summary.deleted, 8);
    assert_eq!(
        store.keys(),
        vec![
            "other/keep.txt".to_string(),
            "site/index.html".to_string(),
            "site/pages/about.html".to_string(),
        ]
    );
}

/// 集成测试：前缀为 `/` 时部署到桶根
#[tokio::test]
async fn test_deploy_to_bucket_root() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "index.html", "new");
    write(dir.path(), "assets/app.js", "new");

    let store = MemoryStore::seeded(&["stale.css", "old/x.js"]);
    let summary = deploy(&store, &DeployPlan::new(dir.path(), "/")).await.unwrap();

    assert_eq!(summary.deleted, 2);
    assert_eq!(
        store.keys(),
        vec!["assets/app.js".to_string(), "index.html".to_string()]
    );
}

/// 集成测试：单个文件上传失败不会中止部署
#[tokio::test]
async fn test_upload_failure_is_counted() {
    let dir = tempfile::tempdir().unwrap();
    let files = build_site(dir.path());

    let store = MemoryStore {
        fail_put_suffix: Some("about.html"),
        ..Default::default()
    };
    let summary = deploy(&store, &DeployPlan::new(dir.path(), "site")).await.unwrap();

    assert_eq!(store.puts.lock().unwrap().len(), files.len());
    assert_eq!(summary.uploaded, files.len() - 1);
    assert_eq!(summary.failed, vec![dir.path().join("pages").join("about.html")]);
    assert!(!summary.is_success());
}

/// 集成测试：删除失败是致命的，不会开始上传
#[tokio::test]
async fn test_delete_failure_aborts_before_upload() {
    let dir = tempfile::tempdir().unwrap();
    build_site(dir.path());

    let mut store = MemoryStore::seeded(&["site/assets/old.js"]);
    store.fail_deletes = true;

    let result = deploy(&store, &DeployPlan::new(dir.path(), "site")).await;

    match result {
        Err(DeployError::Cleanup { prefix, .. }) => assert_eq!(prefix, "site/assets/"),
        other => panic!("expected cleanup error, got {other:?}"),
    }
    assert!(store.puts.lock().unwrap().is_empty());
}

/// 集成测试：自定义已知文件夹名称
#[tokio::test]
async fn test_custom_known_dirs() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "_next/static/chunk.html", "x");
    write(dir.path(), "docs/index.html", "x");

    let store = MemoryStore::default();
    let plan = DeployPlan::new(dir.path(), "site").with_known_dirs("_next", "docs");
    let summary = deploy(&store, &plan).await.unwrap();

    assert_eq!(summary.uploaded, 2);
    assert_eq!(store.cache_control("site/_next/static/chunk.html"), IMMUTABLE_CACHE_CONTROL);
    assert_eq!(store.cache_control("site/docs/index.html"), NO_CACHE_CONTROL);
}

/// 集成测试：已知文件夹名称为空时在访问存储之前失败，不会清空部署根
#[tokio::test]
async fn test_empty_known_dir_name_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "pages/index.html", "x");

    let store = MemoryStore::seeded(&["site/index.html", "site/pages/old.html"]);
    let plan = DeployPlan::new(dir.path(), "site").with_known_dirs("", "pages");
    let result = deploy(&store, &plan).await;

    assert!(matches!(result, Err(DeployError::InvalidFolderName(_))));
    assert_eq!(store.total_calls(), 0);
}
