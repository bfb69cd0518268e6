use std::process::ExitCode;

use clap::Parser;

use gestura::app::App;
use gestura::config::{Cli, Config};
use gestura::logging;

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    let config = Config::from_env().apply_cli(&cli);

    let _log_guard = logging::init_tracing(config.log_level(), config.log_dir.as_deref());
    tracing::info!(
        gestures = %config.gestures_path.display(),
        actions = %config.actions_path.display(),
        debug = config.debug,
        "gestura starting"
    );

    match App::new(config).run(shutdown_signal()).await {
        Ok(summary) => {
            tracing::info!(frames = summary.frames, actions = summary.actions, "Graceful shutdown complete");
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!(error = %err, "gestura stopped");
            ExitCode::FAILURE
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        sigterm.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
