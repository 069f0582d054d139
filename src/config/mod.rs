pub mod toml_config;

pub use toml_config::{AppConfig, LogFormat, StoreBackend};

#[cfg(feature = "cli")]
use clap::Parser;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "kyowear")]
#[command(about = "KyoWear catalog storefront and admin API")]
pub struct CliConfig {
    #[arg(long, short, default_value = "kyowear.toml")]
    pub config: String,

    #[arg(long, help = "Override server.host")]
    pub host: Option<String>,

    #[arg(long, help = "Override server.port")]
    pub port: Option<u16>,

    #[arg(long, value_enum, help = "Override store.backend")]
    pub store: Option<StoreBackend>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit JSON log lines")]
    pub json_logs: bool,
}

#[cfg(feature = "cli")]
impl CliConfig {
    /// Loads the TOML file and applies the command line overrides on top.
    pub fn load(&self) -> crate::utils::error::Result<AppConfig> {
        let mut config = AppConfig::from_file(&self.config)?;
        self.apply_to(&mut config);
        Ok(config)
    }

    pub fn apply_to(&self, config: &mut AppConfig) {
        let server = config.server.get_or_insert_with(Default::default);
        if let Some(host) = &self.host {
            server.host = Some(host.clone());
        }
        if let Some(port) = self.port {
            server.port = Some(port);
        }
        if let Some(backend) = self.store {
            config.store.get_or_insert_with(Default::default).backend = Some(backend);
        }
        if self.json_logs {
            config.logging.get_or_insert_with(Default::default).format = Some(LogFormat::Json);
        }
    }
}

#[cfg(all(test, feature = "cli"))]
mod tests {
    use super::*;

    #[test]
    fn test_cli_overrides_file_values() {
        let cli = CliConfig::parse_from([
            "kyowear",
            "--port",
            "9090",
            "--store",
            "memory",
            "--json-logs",
        ]);
        let mut config = AppConfig::from_toml_str("[server]\nhost = \"127.0.0.1\"\nport = 3000\n").unwrap();
        cli.apply_to(&mut config);

        assert_eq!(config.bind_address(), "127.0.0.1:9090");
        assert_eq!(config.store_backend(), StoreBackend::Memory);
        assert_eq!(config.log_format(), LogFormat::Json);
        assert_eq!(cli.config, "kyowear.toml");
    }
}
