use std::process::ExitCode;

use alert_portal::cmd::{self, Cli, Command};
use clap::Parser;

#[actix_web::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config_file = match &cli.command {
        Command::Server { config } => config.clone(),
        _ => None,
    };
    let (manager, config) = match cmd::server::load_config(config_file.as_deref()) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = coe::init_tracing(&config.logging_options()) {
        eprintln!("failed to initialise logging: {}", e);
        return ExitCode::FAILURE;
    }
    manager.log_sources_info();

    let result = match cli.command {
        Command::Server { .. } => cmd::server::handle_server_command(config)
            .await
            .map_err(anyhow::Error::from),
        Command::Version => {
            cmd::version::handle_version_command();
            Ok(())
        }
        Command::Preview(args) => {
            cmd::preview::handle_preview_command(args, config.ui.toast_max_visible).await
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "command failed");
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}
