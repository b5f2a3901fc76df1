use clap::Parser;
use flow_eval::utils::logger::{self, LogFormat};
use flow_eval::utils::validation::Validate;
use flow_eval::CliConfig;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let config = CliConfig::parse();

    let format = if config.log_json {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };
    logger::init_logger(config.verbose, format);

    tracing::info!("Starting flow-eval for model at {}", config.model);
    tracing::debug!("CLI config: {:?}", config);

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Invalid arguments: {}", e);
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());
        return ExitCode::FAILURE;
    }

    match flow_eval::app::run(&config).await {
        Ok(output_path) => {
            tracing::info!("✅ Done");
            println!("📁 Results saved to: {}", output_path);
            ExitCode::SUCCESS
        }
        Err(e) => {
            let severity = e.severity();
            tracing::error!(
                "❌ Evaluation failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                severity
            );
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());
            ExitCode::from(severity.exit_code())
        }
    }
}
