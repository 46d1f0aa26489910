use service_bootstrap::config::{self, LogLevel, ProcessEnv};
use std::{env, process};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt};

fn parse_service_name() -> Option<String> {
    for arg in env::args().skip(1) {
        if let Some(name) = arg.strip_prefix("--service=") {
            return Some(name.to_string());
        }
    }
    None
}

fn init_tracing(log_level: LogLevel) {
    let level = log_level.as_tracing_level();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_string()));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}

fn main() {
    dotenvy::dotenv().ok();

    let Some(service) = parse_service_name() else {
        eprintln!("usage: service-bootstrap --service=NAME");
        process::exit(2);
    };

    // Initialize tracing early so we can see logs from bootstrap
    init_tracing(LogLevel::from_env(&ProcessEnv));

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Failed to start runtime: {}", e);
            process::exit(1);
        }
    };

    let settings = match runtime.block_on(config::bootstrap(&service)) {
        Ok(settings) => settings,
        Err(e) => {
            error!(service = %service, error = %e, "Bootstrap failed");
            eprintln!("Failed to bootstrap {}: {}", service, e);
            process::exit(1);
        }
    };

    let settings = match settings.install() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Failed to install settings: {}", e);
            process::exit(1);
        }
    };

    info!(
        service = %service,
        env = %settings.environment(),
        keys = ?settings.keys(),
        "Service configured"
    );

    for key in settings.keys() {
        if let Some(value) = settings.get(key) {
            println!("{} = {}", key, value);
        }
    }
}
