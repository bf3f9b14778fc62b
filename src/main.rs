use std::sync::Arc;

use clap::Parser;
use serde_json::json;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use license_manager::config::Config;
use license_manager::context::RequestContext;
use license_manager::db::{create_pool, init_db};
use license_manager::handlers;
use license_manager::jwt::TokenIssuer;
use license_manager::models::{CreateApplication, CreateClient, CreateLicense, CreateLicenseType};
use license_manager::repository::SqliteStore;
use license_manager::state::AppState;

#[derive(Parser, Debug)]
#[command(name = "license-manager")]
#[command(about = "Multi-tenant license issuing, validation and usage metering server")]
struct Cli {
    /// Create an application with this name if none exist yet, and print its credentials
    #[arg(long, value_name = "NAME")]
    bootstrap_application: Option<String>,

    /// Seed the database with demo data (dev mode only)
    #[arg(long)]
    seed: bool,
}

/// Log and exit. Startup failures are not recoverable.
fn fatal(context: &str, err: impl std::fmt::Display) -> ! {
    tracing::error!("{}: {}", context, err);
    eprintln!("{}: {}", context, err);
    std::process::exit(1);
}

async fn bootstrap_application(state: &AppState, name: &str) {
    let ctx = RequestContext::new();
    let count = state
        .applications
        .count(&ctx)
        .await
        .unwrap_or_else(|e| fatal("Failed to count applications", e));
    if count > 0 {
        tracing::info!("Applications already exist, skipping bootstrap");
        return;
    }

    let created = state
        .applications
        .create(
            &ctx,
            CreateApplication {
                name: name.to_string(),
                description: "Bootstrap application".to_string(),
                version: String::new(),
            },
        )
        .await
        .unwrap_or_else(|e| fatal("Failed to create bootstrap application", e));

    tracing::info!("============================================");
    tracing::info!("BOOTSTRAP APPLICATION CREATED");
    tracing::info!("Application: {} ({})", created.application.name, created.application.id);
    tracing::info!("API Key: {}", created.application.api_key);
    tracing::info!("API Secret: {}", created.api_secret);
    tracing::info!("============================================");
    tracing::info!("SAVE THE API SECRET - IT WILL NOT BE SHOWN AGAIN");
    tracing::info!("============================================");
}

/// Seeds an application, license type, client and license for local testing.
/// Only runs when the database has no applications.
async fn seed_dev_data(state: &AppState) {
    let ctx = RequestContext::new();
    let count = state
        .applications
        .count(&ctx)
        .await
        .unwrap_or_else(|e| fatal("Failed to count applications", e));
    if count > 0 {
        tracing::info!("Database already has data, skipping seed");
        return;
    }

    tracing::info!("============================================");
    tracing::info!("SEEDING DEV DATA");
    tracing::info!("============================================");

    let created = state
        .applications
        .create(
            &ctx,
            CreateApplication {
                name: "Demo App".to_string(),
                description: "Seeded for local development".to_string(),
                version: "1.0.0".to_string(),
            },
        )
        .await
        .unwrap_or_else(|e| fatal("Failed to create demo application", e));
    let app_id = created.application.id.clone();

    let features = json!({ "seats": 5, "projects": 10, "export": true });
    let license_type = state
        .license_types
        .create(
            &ctx,
            &app_id,
            CreateLicenseType {
                name: "Pro".to_string(),
                description: "30-day pro plan".to_string(),
                duration_days: 30,
                price: 29.0,
                features: features.as_object().cloned().unwrap_or_default(),
                is_active: true,
            },
        )
        .await
        .unwrap_or_else(|e| fatal("Failed to create demo license type", e));

    let client = state
        .clients
        .create(
            &ctx,
            &app_id,
            CreateClient {
                name: "Demo Customer".to_string(),
                email: "customer@example.com".to_string(),
                company: Some("Example Inc".to_string()),
                contact_person: None,
                phone: None,
                metadata: None,
            },
        )
        .await
        .unwrap_or_else(|e| fatal("Failed to create demo client", e));

    let license = state
        .engine
        .create(
            &ctx,
            &app_id,
            CreateLicense {
                license_type_id: license_type.id.clone(),
                client_id: client.id.clone(),
                usage_limits: None,
            },
        )
        .await
        .unwrap_or_else(|e| fatal("Failed to create demo license", e));

    tracing::info!("============================================");
    tracing::info!("DEV DATA SEEDED SUCCESSFULLY");
    tracing::info!("============================================");

    // Copy-paste friendly output, no log formatting
    println!();
    println!("--- COPY FROM HERE ---");
    println!("  application_id: {}", app_id);
    println!("  api_key: {}", created.application.api_key);
    println!("  api_secret: {}", created.api_secret);
    println!("  license_type_id: {}", license_type.id);
    println!("  client_id: {}", client.id);
    println!("  license_id: {}", license.id);
    println!("  license_key: {}", license.license_key);
    println!("--- END COPY ---");
    println!();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "license_manager=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().unwrap_or_else(|e| fatal("Invalid configuration", e));

    if config.dev_mode {
        tracing::info!("Running in DEVELOPMENT mode");
    }

    let pool = create_pool(&config.database_path)
        .unwrap_or_else(|e| fatal("Failed to create database pool", e));
    {
        let conn = pool
            .get()
            .unwrap_or_else(|e| fatal("Failed to get connection", e));
        init_db(&conn).unwrap_or_else(|e| fatal("Failed to initialize database", e));
    }

    let tokens = TokenIssuer::new(config.jwt_secret.as_bytes(), config.jwt_expiration_hours)
        .unwrap_or_else(|e| fatal("Invalid JWT configuration", e));
    let state = AppState::new(
        Arc::new(SqliteStore::new(pool)),
        tokens,
        config.request_timeout,
    );

    if cli.seed {
        if !config.dev_mode {
            tracing::warn!("--seed flag ignored: not in dev mode (set LM_ENV=dev)");
        } else {
            seed_dev_data(&state).await;
        }
    }

    if let Some(ref name) = cli.bootstrap_application {
        bootstrap_application(&state, name).await;
    }

    let app = handlers::app(state);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| fatal("Failed to bind to address", e));

    tracing::info!("License manager listening on {}", addr);

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        fatal("Server error", e);
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to install Ctrl+C handler: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, stopping server...");
}
