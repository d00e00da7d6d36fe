use std::process::ExitCode;

use configs::AppConfig;
use tracing::{error, info};
use uuid::Uuid;

fn install_panic_hook(instance: Uuid) {
    std::panic::set_hook(Box::new(move |panic| {
        error!(%instance, %panic, "rack tracker panicked");
    }));
}

fn build_runtime(cfg: &AppConfig) -> std::io::Result<tokio::runtime::Runtime> {
    let mut builder = tokio::runtime::Builder::new_multi_thread();
    builder.enable_all().thread_name("rack-tracker");
    if let Some(threads) = cfg.server.worker_threads {
        builder.worker_threads(threads);
    }
    builder.build()
}

fn main() -> ExitCode {
    // .env before logging so RUST_LOG / LOG_FORMAT apply
    dotenvy::dotenv().ok();
    common::utils::logging::init_logging_from_env();

    let instance = Uuid::new_v4();
    install_panic_hook(instance);

    let cfg = match server::startup::load_config() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!(error = %e, "invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    let runtime = match build_runtime(&cfg) {
        Ok(rt) => rt,
        Err(e) => {
            error!(error = %e, "failed to build tokio runtime");
            return ExitCode::FAILURE;
        }
    };

    info!(
        %instance,
        version = env!("CARGO_PKG_VERSION"),
        backend = ?cfg.storage.backend,
        document = %cfg.storage.path,
        threads = cfg.server.worker_threads.unwrap_or_default(),
        "starting rack tracker"
    );

    match runtime.block_on(server::run(cfg)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(%instance, error = %e, "rack tracker exited with an error");
            ExitCode::FAILURE
        }
    }
}
