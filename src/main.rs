//! jaf - just another file host.
//!
//! This binary loads the configuration, prepares the upload service and
//! starts the HTTP server.

use clap::Parser;
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use jaf::{config::Config, server::create_router, upload::FileNameRegistry, UploadService};

#[tokio::main]
async fn main() -> ExitCode {
    let mut config = Config::parse();

    init_logging(config.verbose);

    if let Some(path) = config.config_file.clone() {
        if let Err(e) = config.apply_config_file(&path) {
            error!("Could not load config file {}: {}", path.display(), e);
            return ExitCode::FAILURE;
        }
    }

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    print_banner();

    info!("Configuration:");
    info!("  File directory: {}", config.file_dir.display());
    info!("  Link prefix: {}", config.link_prefix);
    info!("  Link length: {}", config.link_length);
    info!("  Max upload size: {} bytes", config.max_upload_size);

    if config.scrub_exif {
        info!(
            "  EXIF scrubbing: enabled ({} allowed ids, {} allowed paths, abort on error: {})",
            config.exif_allowed_ids.len(),
            config.exif_allowed_paths.len(),
            config.exif_abort_on_error
        );
    } else {
        warn!("  EXIF scrubbing: DISABLED - uploaded images keep all metadata");
    }

    let registry = match FileNameRegistry::from_dir(&config.file_dir).await {
        Ok(registry) => {
            info!("  Existing files: {}", registry.len());
            registry
        }
        Err(e) => {
            error!(
                "Could not read file directory {}: {}",
                config.file_dir.display(),
                e
            );
            return ExitCode::FAILURE;
        }
    };

    let service = UploadService::new(config.upload_settings(), config.scrubber(), registry);
    let router = create_router(service, config.router_config());

    let addr = config.bind_address();

    info!("");
    info!("────────────────────────────────────────────────────────────────");
    info!("  Server listening on: http://{}", addr);
    info!("");
    info!("  Try these endpoints:");
    info!("    curl http://{}/health", addr);
    info!("    curl -F file=@photo.jpg http://{}/upload", addr);
    info!("────────────────────────────────────────────────────────────────");
    info!("");

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = axum::serve(listener, router).await {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

/// Print the startup banner.
fn print_banner() {
    let version = env!("CARGO_PKG_VERSION");
    info!("");
    info!("     ██╗ █████╗ ███████╗");
    info!("     ██║██╔══██╗██╔════╝");
    info!("     ██║███████║█████╗  ");
    info!("██   ██║██╔══██║██╔══╝  ");
    info!("╚█████╔╝██║  ██║██║     ");
    info!(" ╚════╝ ╚═╝  ╚═╝╚═╝     ");
    info!("");
    info!("  just another file host v{}", version);
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "jaf=debug,tower_http=debug"
    } else {
        "jaf=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
