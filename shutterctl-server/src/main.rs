use std::sync::Arc;

use shutterctl_server::configs::Settings;
use shutterctl_server::run;
use time::UtcOffset;

fn main() {
    let settings = match Settings::new() {
        Ok(settings) => Arc::new(settings),
        Err(e) => {
            eprintln!("Failed to load settings: {e}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            let app_name = env!("CARGO_PKG_NAME").replace('-', "_");
            let level = settings.logger.level.as_str();

            format!("{app_name}={level}").into()
        }))
        .init();

    // Only readable while the process is still single-threaded.
    let offset = UtcOffset::current_local_offset().unwrap_or_else(|e| {
        tracing::warn!("Local time offset unavailable, stamping states in UTC: {}", e);
        UtcOffset::UTC
    });

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            tracing::error!("Failed to start runtime: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = runtime.block_on(run(&settings, offset)) {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}
