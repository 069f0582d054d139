use clap::Parser;
use kyowear::utils::error::{ErrorSeverity, KyoError};
use kyowear::utils::{logger, validation::Validate};
use kyowear::{start_server, AppState, CliConfig};

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();

    // 載入 TOML 配置
    let config = match cli.load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", cli.config, e);
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };

    logger::init_logger(config.log_format(), cli.verbose, config.log_level());
    tracing::info!("🚀 Starting KyoWear catalog service");
    tracing::info!("📁 Configuration loaded from: {}", cli.config);

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let result = match AppState::from_config(&config) {
        Ok(state) => start_server(&config, state).await,
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        exit_with(e);
    }
}

fn exit_with(e: KyoError) -> ! {
    tracing::error!(
        "❌ Server failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
    eprintln!("❌ {}", e.user_friendly_message());

    // 根據錯誤嚴重程度決定退出碼
    let exit_code = match e.severity() {
        ErrorSeverity::Low | ErrorSeverity::High => 1,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code);
}
