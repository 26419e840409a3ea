//! `isahubd`: the ISA hub server binary.
//!
//! Usage:
//!   isahubd -c <context-name-or-path> [--listen <addr>]
//!
//! The context name resolves to `/etc/isahub/<name>.toml`.
//! If a path with `/` or `.` is given, it's used directly.

mod bootstrap;
mod config;
mod login;
mod routes;

use std::sync::Arc;

use clap::Parser;
use isahub_core::Module;
use tracing::info;

use config::ServerConfig;
use routes::AppState;

/// ISA hub server.
#[derive(Parser, Debug)]
#[command(name = "isahubd", about = "ISA hub server")]
struct Cli {
    /// Context name or path to config file.
    #[arg(short = 'c', long = "config", required = true)]
    config: String,

    /// Listen address.
    #[arg(long = "listen", default_value = "0.0.0.0:8080")]
    listen: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    let config_path = ServerConfig::resolve_path(&cli.config);
    info!("Loading configuration from {}", config_path.display());
    let server_config = ServerConfig::load(&config_path)?;
    bootstrap::verify_config(&server_config)?;

    let data_dir = std::path::PathBuf::from(&server_config.storage.data_dir);
    std::fs::create_dir_all(&data_dir)?;

    let core_config = isahub_core::ServiceConfig {
        data_dir: Some(data_dir),
        listen: cli.listen.clone(),
        ..Default::default()
    };

    let sql: Arc<dyn isahub_sql::SQLStore> = Arc::new(
        isahub_sql::SqliteStore::open(&core_config.resolve_sqlite_path())
            .map_err(|e| anyhow::anyhow!("failed to open SQL store: {}", e))?,
    );

    let auth_config = auth::service::AuthConfig {
        jwt_secret: server_config.jwt.secret.clone(),
        token_ttl: server_config.jwt.expire_secs as i64,
    };
    let auth_module = auth::AuthModule::new(Arc::clone(&sql), auth_config)?;
    info!("Auth module initialized");

    let isa_config = isa::service::IsaConfig {
        tiers: server_config.publishing.tiers(),
    };
    let isa_module = isa::IsaModule::new(
        Arc::clone(&sql),
        isa_config,
        Arc::new(isa::mailer::LogMailer),
        Some(Arc::new(isa::export::ZipBundleExporter)),
    )?;
    info!("ISA module initialized");

    let module_routes = vec![
        (auth_module.name(), auth_module.routes()),
        (isa_module.name(), isa_module.routes()),
    ];

    let app_state = AppState {
        server_config: Arc::new(server_config),
        auth: auth_module.service().clone(),
    };
    let app = routes::build_router(app_state, module_routes);

    let listener = tokio::net::TcpListener::bind(&core_config.listen).await?;
    info!("isahubd listening on {}", core_config.listen);
    axum::serve(listener, app).await?;

    Ok(())
}
