use std::sync::Arc;

use tracing::{error, info};

use filedrop::web::handlers::AppState;
use filedrop::web::WebServer;
use filedrop::{Config, Database, HandleSigner, LocalBlobStore, SystemClock};

#[tokio::main]
async fn main() {
    let config = match Config::load_with_env("config.toml") {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config.toml: {e}");
            eprintln!("Using default configuration.");
            let mut config = Config::default();
            config.apply_env_overrides();
            config
        }
    };

    if let Err(e) = filedrop::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        filedrop::logging::init_console_only(&config.logging.level);
    }

    if let Err(e) = run(config).await {
        error!("filedrop stopped: {}", e);
        std::process::exit(1);
    }
}

async fn run(config: Config) -> filedrop::Result<()> {
    config.validate()?;

    info!("filedrop - file sharing links");
    info!(
        "Server configured on {}:{}",
        config.server.host, config.server.port
    );

    let db = Database::open(&config.database.path).await?;
    info!("Database opened at {}", config.database.path);

    let signer = HandleSigner::new(&config.web.jwt_secret, &config.server.public_url);
    let blobs = Arc::new(LocalBlobStore::new(&config.storage.path, signer.clone())?);
    info!("Blob storage at {}", config.storage.path);

    let state = AppState::new(db, blobs, signer, Arc::new(SystemClock), &config);
    WebServer::new(&config, state)?.run().await
}
