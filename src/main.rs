use clap::Parser;
use clap::error::ErrorKind;
use static_deploy::cli::{Cli, run};
use std::process::ExitCode;
use tracing_subscriber::fmt::time::LocalTime;

#[tokio::main]
async fn main() -> ExitCode {
    // 加载 .env 文件
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_timer(LocalTime::rfc_3339())
        .with_target(false)
        .init();

    // 参数不足时打印用法并以 1 退出
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = e.print();
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            let _ = e.print();
            return ExitCode::FAILURE;
        }
    };

    match run(cli).await {
        Ok(summary) if summary.is_success() => ExitCode::SUCCESS,
        Ok(_) => ExitCode::FAILURE,
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "部署中止");
            ExitCode::FAILURE
        }
    }
}
