use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::toml_config::LogFormat;

fn fallback_directives(verbose: bool, level: Option<&str>) -> String {
    match (verbose, level) {
        (true, _) => "kyowear=debug,tower_http=debug,info".to_string(),
        // TraceLayer emits request spans at DEBUG
        (false, Some(level)) => format!("kyowear={level},tower_http=debug,warn"),
        (false, None) => "kyowear=info,tower_http=debug,warn".to_string(),
    }
}

fn env_filter(verbose: bool, level: Option<&str>) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(fallback_directives(verbose, level)))
}

pub fn init_logger(format: LogFormat, verbose: bool, level: Option<&str>) {
    let filter = env_filter(verbose, level);
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Compact => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false)
                    .compact(),
            )
            .init(),
        // Container platforms ingest one JSON object per line
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false)
                    .json(),
            )
            .init(),
    }
}
