use gavel::db::load_seed;
use gavel::{api, config::Config, db::init_db, AuctionEngine, EngineOptions, Repository};
use std::net::SocketAddr;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into()),
        )
        .init();

    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let pool = match init_db(&config.database_path).await {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Failed to initialize database: {}", e);
            std::process::exit(1);
        }
    };
    let repo = Repository::new(pool);

    if let Some(path) = &config.seed_path {
        match load_seed(&repo, path).await {
            Ok(code) if code != config.season_code => {
                tracing::warn!(
                    seeded = %code,
                    configured = %config.season_code,
                    "Seed file is for a different season than SEASON_CODE"
                );
            }
            Ok(_) => {}
            Err(e) => {
                eprintln!("Failed to load seed {}: {}", path.display(), e);
                std::process::exit(1);
            }
        }
    }

    match repo.get_season(&config.season_code).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            eprintln!(
                "Season {} not found; load it with SEED_PATH",
                config.season_code
            );
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("Failed to read season: {}", e);
            std::process::exit(1);
        }
    }

    let engine = Arc::new(AuctionEngine::new(
        repo.clone(),
        config.season_code.clone(),
        EngineOptions {
            amount_step: config.amount_step,
            draw_seed: config.draw_seed,
        },
    ));

    let app = api::create_router(api::AppState::new(repo, engine));

    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            eprintln!("Failed to bind to {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    tracing::info!(season = %config.season_code, "Auction server listening on {}", addr);

    if let Err(e) = axum::serve(listener, app).await {
        eprintln!("Server error: {}", e);
        std::process::exit(1);
    }
}
