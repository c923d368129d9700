mod cli;
mod logging;

use anyhow::Result;
use clap::Parser;

use fwscope_app::runtime::Runtime;
use fwscope_app::session::Session;
use fwscope_core::config::FwscopeConfig;
use fwscope_enrich::Classifier;
use fwscope_log_stream::{LineTailer, TailConfig};

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::AppCli::parse();

    // 설정 로드: 파일 -> 환경변수 -> CLI 인자 순으로 덮어쓴다
    let mut config = match &args.config {
        Some(path) => FwscopeConfig::load(path)
            .await
            .map_err(|e| anyhow::anyhow!("failed to load config: {}", e))?,
        None => {
            let mut config = FwscopeConfig::default();
            config.apply_env_overrides();
            config
        }
    };
    if let Some(file) = &args.file {
        config.tail.file = file.display().to_string();
    }
    if args.history {
        config.tail.history = true;
    }
    if let Some(level) = &args.log_level {
        config.general.log_level = level.clone();
    }
    if let Some(format) = &args.log_format {
        config.general.log_format = format.clone();
    }
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("config validation failed: {}", e))?;

    if args.validate {
        println!("configuration OK");
        return Ok(());
    }

    logging::init_tracing(&config.general)?;
    tracing::info!(
        file = %config.tail.file,
        history = config.tail.history,
        "fwscope starting"
    );

    // 테일러 워커 시작 (파일 핸들은 이 태스크가 단독 소유한다)
    let (tailer, line_rx, error_rx) = LineTailer::new(TailConfig::from_core(&config.tail))
        .map_err(|e| anyhow::anyhow!("failed to build tailer: {}", e))?;
    let shutdown = tailer.cancellation_token();
    tailer.spawn();

    // 인터페이스 스냅샷은 시작 시 한 번만 찍는다
    let classifier = Classifier::from_interfaces();
    tracing::info!(subnets = classifier.subnet_count(), "interface snapshot captured");

    let session = Session::new(classifier)
        .map_err(|e| anyhow::anyhow!("failed to build session: {}", e))?;

    Runtime::new(&config, session, line_rx, error_rx, shutdown)
        .run()
        .await;

    tracing::info!("fwscope shut down");
    Ok(())
}
