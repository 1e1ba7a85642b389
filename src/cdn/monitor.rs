//! 缓存失效监控模块
//!
//! 轮询被建模为状态事件流：每隔固定间隔查询一次状态并产出，
//! 遇到终止状态或达到次数上限（`timeout / interval`）后结束。
//! 调用方丢弃该流即可取消轮询。

use crate::cdn::client::{CdnClient, InvalidationRequest, InvalidationStatus};
use crate::deploy::constants::{DEFAULT_INVALIDATION_PATH, POLL_INTERVAL, POLL_TIMEOUT};
use crate::error::CdnError;
use async_stream::try_stream;
use futures::{Stream, StreamExt, pin_mut};
use std::time::Duration;
use tracing::info;

/// 轮询间隔与上限
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSchedule {
    pub interval: Duration,
    pub timeout: Duration,
}

impl Default for PollSchedule {
    fn default() -> Self {
        Self {
            interval: POLL_INTERVAL,
            timeout: POLL_TIMEOUT,
        }
    }
}

impl PollSchedule {
    /// 最多查询的次数
    pub fn max_checks(&self) -> u32 {
        let interval = self.interval.as_millis().max(1);
        (self.timeout.as_millis() / interval) as u32
    }
}

/// 轮询的最终结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonitorOutcome {
    Completed { checks: u32 },
    /// 遇到无法识别的状态，停止轮询
    Failed { status: String, checks: u32 },
    TimedOut { checks: u32 },
}

impl MonitorOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, MonitorOutcome::Completed { .. })
    }
}

/// 缓存失效的处理结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidationReport {
    /// 已提交，未轮询
    Submitted { id: String },
    /// 已提交并轮询
    Monitored { id: String, outcome: MonitorOutcome },
}

/// 解析逗号分隔的失效路径。
///
/// 去掉每一项前后的空白并丢弃空项；结果为空时使用 `/*`。
///
/// # 示例
///
/// ```
/// use static_deploy::cdn::parse_invalidation_paths;
///
/// assert_eq!(parse_invalidation_paths(Some(" /index.html, /pages/* ")), vec!["/index.html", "/pages/*"]);
/// assert_eq!(parse_invalidation_paths(None), vec!["/*"]);
/// ```
pub fn parse_invalidation_paths(raw: Option<&str>) -> Vec<String> {
    let paths: Vec<String> = raw
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|path| !path.is_empty())
        .map(str::to_string)
        .collect();

    if paths.is_empty() {
        vec![DEFAULT_INVALIDATION_PATH.to_string()]
    } else {
        paths
    }
}

/// 缓存失效状态事件流。
///
/// 每次先等待 `interval` 再查询；查询出错时产出错误并结束。
pub fn invalidation_events<'a, C>(
    cdn: &'a C,
    distribution_id: &'a str,
    invalidation_id: &'a str,
    schedule: PollSchedule,
) -> impl Stream<Item = Result<InvalidationStatus, CdnError>> + 'a
where
    C: CdnClient + ?Sized,
{
    try_stream! {
        for _ in 0..schedule.max_checks() {
            tokio::time::sleep(schedule.interval).await;
            let status = cdn.invalidation_status(distribution_id, invalidation_id).await?;
            let terminal = status.is_terminal();
            yield status;
            if terminal {
                break;
            }
        }
    }
}

/// 轮询缓存失效状态直到完成、失败或超时。
///
/// # 返回值
///
/// 轮询结果以及实际查询次数。超时不视为错误。
///
/// # Errors
///
/// 查询状态的请求本身失败时返回错误。
pub async fn monitor_invalidation<C>(
    cdn: &C,
    distribution_id: &str,
    invalidation_id: &str,
    schedule: PollSchedule,
) -> Result<MonitorOutcome, CdnError>
where
    C: CdnClient + ?Sized,
{
    let events = invalidation_events(cdn, distribution_id, invalidation_id, schedule);
    pin_mut!(events);

    let mut checks = 0;
    while let Some(status) = events.next().await {
        let status = status?;
        checks += 1;
        match status {
            InvalidationStatus::Completed => return Ok(MonitorOutcome::Completed { checks }),
            InvalidationStatus::InProgress => {
                info!(invalidation_id, checks, "缓存失效仍在进行");
            }
            InvalidationStatus::Unexpected(status) => {
                return Ok(MonitorOutcome::Failed { status, checks });
            }
        }
    }

    Ok(MonitorOutcome::TimedOut { checks })
}

/// 创建缓存失效批次，并在 `monitor` 为 `true` 时轮询到结束。
pub async fn invalidate<C>(
    cdn: &C,
    distribution_id: &str,
    paths: Vec<String>,
    monitor: bool,
    schedule: PollSchedule,
) -> Result<InvalidationReport, CdnError>
where
    C: CdnClient + ?Sized,
{
    let request = InvalidationRequest::new(distribution_id, paths);
    info!(
        distribution_id,
        paths = ?request.paths,
        caller_reference = %request.caller_reference,
        "创建缓存失效"
    );

    let ticket = cdn.create_invalidation(request).await?;
    info!(invalidation_id = %ticket.id, status = %ticket.status, "缓存失效已创建");

    if !monitor {
        return Ok(InvalidationReport::Submitted { id: ticket.id });
    }

    let outcome = monitor_invalidation(cdn, distribution_id, &ticket.id, schedule).await?;
    Ok(InvalidationReport::Monitored {
        id: ticket.id,
        outcome,
    })
}
