use anyhow::{Result, anyhow};
use clap::Parser;
use forge_cli::{App, Cli, ForgeConfig, LogFormat};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = ForgeConfig::load(cli.config.as_deref())?;

    match (&config.telemetry.otlp_endpoint, config.telemetry.format) {
        (Some(endpoint), _) => forge_telemetry::init_with_otlp("forge", endpoint),
        (None, LogFormat::Json) => forge_telemetry::init_json_telemetry("forge"),
        (None, LogFormat::Pretty) => forge_telemetry::init_telemetry("forge"),
    }
    .map_err(|e| anyhow!("failed to initialize telemetry: {e}"))?;

    let registry = config.build_registry(|name| std::env::var(name).ok());
    let app = App::new(config, registry);
    let result = app.run(cli.command, &mut std::io::stdout().lock()).await;

    forge_telemetry::shutdown_telemetry();
    result
}
