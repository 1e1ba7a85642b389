//! 命令行模块
//!
//! 解析位置参数，并按顺序执行：读取凭据 → 部署 → （可选）缓存失效。

use crate::cdn::{
    CdnClient, CloudFrontCdn, InvalidationReport, MonitorOutcome, PollSchedule, invalidate,
    parse_invalidation_paths,
};
use crate::config::AwsSettings;
use crate::deploy::{DeployPlan, DeploySummary, deploy};
use crate::error::CdnError;
use crate::s3::{ObjectStore, S3ObjectStore};
use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info, warn};

/// 将静态站点构建目录部署到 S3，并可选地刷新 CloudFront 缓存
#[derive(Parser, Debug)]
#[command(name = "static-deploy", version)]
pub struct Cli {
    /// 本地构建目录
    pub dist_path: PathBuf,

    /// 远程键前缀，`/` 表示桶根
    pub s3_path: String,

    /// 目标存储桶
    pub bucket_name: String,

    /// AWS 区域，默认读取 AWS_REGION
    pub region: Option<String>,

    /// CloudFront 分发 ID，不提供则跳过缓存失效
    pub distribution_id: Option<String>,

    /// 逗号分隔的失效路径，默认 /*
    pub invalidation_paths: Option<String>,

    /// 是否等待缓存失效完成（true/false），默认 true
    pub monitor_progress: Option<String>,
}

/// 空字符串视为未提供
fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl Cli {
    pub fn region(&self) -> Option<&str> {
        non_empty(&self.region)
    }

    pub fn distribution_id(&self) -> Option<&str> {
        non_empty(&self.distribution_id)
    }

    pub fn invalidation_paths(&self) -> Option<&str> {
        non_empty(&self.invalidation_paths)
    }

    /// 只有 `false`、`0`、`no`、`off` 会关闭轮询
    pub fn monitor_progress(&self) -> bool {
        match non_empty(&self.monitor_progress) {
            Some(flag) => !matches!(
                flag.to_ascii_lowercase().as_str(),
                "false" | "0" | "no" | "off"
            ),
            None => true,
        }
    }
}

fn report_invalidation(result: Result<InvalidationReport, CdnError>) {
    match result {
        Ok(InvalidationReport::Submitted { id }) => {
            info!(invalidation_id = %id, "缓存失效已提交，未等待完成");
        }
        Ok(InvalidationReport::Monitored { id, outcome }) => match outcome {
            MonitorOutcome::Completed { checks } => {
                info!(invalidation_id = %id, checks, "缓存失效已完成");
            }
            MonitorOutcome::Failed { status, checks } => {
                warn!(invalidation_id = %id, status = %status, checks, "缓存失效返回未知状态");
            }
            MonitorOutcome::TimedOut { checks } => {
                warn!(invalidation_id = %id, checks, "等待缓存失效超时，失效仍会在后台继续");
            }
        },
        Err(e) => warn!(error = %e, "缓存失效失败，部署结果不受影响"),
    }
}

/// 执行一次部署，使用真实的 S3 与 CloudFront 客户端。
///
/// # Errors
///
/// 凭据缺失、构建目录无效或清理远程内容失败时返回错误。
pub async fn run(cli: Cli) -> Result<DeploySummary> {
    let settings = AwsSettings::from_env()?;
    let region = settings.resolve_region(cli.region());
    let sdk_config = settings.load_sdk_config(&region).await;

    let store = S3ObjectStore::new(settings.s3_client(&sdk_config), &cli.bucket_name);
    let cdn = cli
        .distribution_id()
        .map(|_| CloudFrontCdn::new(settings.cloudfront_client(&sdk_config)));
    info!(bucket = store.bucket(), region = %region, "已加载 AWS 配置");

    run_with(
        &store,
        cdn.as_ref(),
        &cli,
        PollSchedule::default(),
        tokio::signal::ctrl_c(),
    )
    .await
}

/// 按顺序执行部署与缓存失效。
///
/// # 参数
///
/// * `store` - 对象存储实现。
/// * `cdn` - CDN 实现，为 `None` 或未提供分发 ID 时跳过缓存失效。
/// * `cli` - 命令行参数。
/// * `schedule` - 轮询间隔与上限。
/// * `interrupt` - 中断信号，返回 `Ok` 时停止等待缓存失效；返回 `Err` 时忽略。
///
/// # 返回值
///
/// 部署结果汇总。有文件上传失败时跳过缓存失效；
/// 缓存失效的任何问题都只记录警告，不影响返回值。
///
/// # Errors
///
/// 构建目录无效或清理远程内容失败时返回错误。
pub async fn run_with<S, C, I>(
    store: &S,
    cdn: Option<&C>,
    cli: &Cli,
    schedule: PollSchedule,
    interrupt: I,
) -> Result<DeploySummary>
where
    S: ObjectStore + ?Sized,
    C: CdnClient + ?Sized,
    I: Future<Output = std::io::Result<()>>,
{
    let plan = DeployPlan::new(&cli.dist_path, &cli.s3_path);
    info!(
        bucket = %cli.bucket_name,
        dist = %cli.dist_path.display(),
        prefix = %plan.remote_prefix,
        "开始部署"
    );

    let summary = deploy(store, &plan)
        .await
        .with_context(|| format!("部署 {} 失败", cli.dist_path.display()))?;

    info!(
        deleted = summary.deleted,
        uploaded = summary.uploaded,
        failed = summary.failed.len(),
        elapsed = ?summary.elapsed,
        "部署完成"
    );

    if !summary.is_success() {
        error!(failed = ?summary.failed, "部分文件上传失败，跳过缓存失效");
        return Ok(summary);
    }

    if let (Some(cdn), Some(distribution_id)) = (cdn, cli.distribution_id()) {
        let paths = parse_invalidation_paths(cli.invalidation_paths());

        // 丢弃轮询 future 即停止查询；信号处理器安装失败时继续等待
        tokio::select! {
            result = invalidate(cdn, distribution_id, paths, cli.monitor_progress(), schedule) => {
                report_invalidation(result);
            }
            Ok(()) = interrupt => {
                warn!("收到中断信号，停止等待缓存失效");
            }
        }
    }

    Ok(summary)
}
