use std::{net::SocketAddr, sync::Arc, time::Duration};

use anyhow::Context;
use http::HeaderValue;
use metrics::gauge;
use tokio::signal;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
};
use tracing::{error, info, warn};

use saria_api as api;

/// How often idle chat sessions are swept
const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(300);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Failed to read .env: {}", e);
        }
    }

    let cfg = api::config::load_config()?;
    api::config::init_tracing(cfg.log_level(), cfg.log_json);
    api::handlers::health::init_start_time();

    // Init DB
    let db_pool = api::db::establish_connection_from_app_config(&cfg)
        .await
        .context("failed to connect to the database")?;
    if cfg.auto_migrate {
        api::db::run_migrations(&db_pool).await.map_err(|e| {
            error!("Failed running migrations: {}", e);
            e
        })?;
    }
    let db_arc = Arc::new(db_pool);

    let events: Arc<dyn api::events::EventBus> =
        Arc::new(api::events::InProcessEventBus::new(cfg.sse_client_buffer));

    let auth_cfg = api::auth::AuthConfig::new(
        cfg.jwt_secret.clone(),
        cfg.auth_issuer.clone(),
        Duration::from_secs(cfg.jwt_expiration_secs),
    );
    let auth_service = Arc::new(api::auth::AuthService::new(auth_cfg));

    let services = api::handlers::AppServices::new(
        &cfg,
        db_arc.clone(),
        events.clone(),
        auth_service.clone(),
    )?;

    if cfg.seed_on_boot {
        seed(&cfg, &services).await;
    }

    // Sweep idle chat sessions in the background
    let chat = services.chat.clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(SESSION_SWEEP_INTERVAL);
        loop {
            ticker.tick().await;
            let removed = chat.sessions().purge_expired();
            gauge!("saria_chat.sessions", chat.sessions().len() as f64);
            if removed > 0 {
                info!(removed, "Expired chat sessions purged");
            }
        }
    });

    let app_state = api::AppState {
        db: db_arc.clone(),
        config: cfg.clone(),
        events,
        auth: auth_service,
        services,
    };

    // Build CORS layer from config
    let configured_origins: Option<Vec<HeaderValue>> = cfg
        .cors_allowed_origins
        .as_ref()
        .map(|raw| {
            raw.split(',')
                .filter_map(|origin| {
                    let trimmed = origin.trim();
                    if trimmed.is_empty() {
                        None
                    } else {
                        HeaderValue::from_str(trimmed).ok()
                    }
                })
                .collect::<Vec<_>>()
        })
        .filter(|origins| !origins.is_empty());

    let cors_layer = if let Some(origins) = configured_origins {
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
            .allow_credentials(cfg.cors_allow_credentials)
    } else if cfg.should_allow_permissive_cors() {
        info!(
            "Using permissive CORS because explicit origins were not configured ({})",
            if cfg.is_development() {
                "development environment"
            } else {
                "explicit override enabled"
            }
        );
        CorsLayer::permissive()
    } else {
        error!("Missing CORS configuration detected; set APP__CORS_ALLOWED_ORIGINS or APP__CORS_ALLOW_ANY_ORIGIN=true");
        anyhow::bail!("Missing CORS configuration: set APP__CORS_ALLOWED_ORIGINS or APP__CORS_ALLOW_ANY_ORIGIN=true");
    };

    // Provider calls are bounded by their own timeout; leave room for the rest of the request
    let request_timeout = cfg.provider_timeout() + Duration::from_secs(10);

    let app = api::app_router(app_state)
        .layer(TimeoutLayer::new(request_timeout))
        .layer(CompressionLayer::new())
        .layer(cors_layer);

    let addr: SocketAddr = format!("{}:{}", cfg.host, cfg.port)
        .parse()
        .with_context(|| format!("invalid listen address {}:{}", cfg.host, cfg.port))?;
    info!("saria-api listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("saria-api stopped");
    Ok(())
}

/// Catalog, about page and admin account; failures are logged, not fatal
async fn seed(cfg: &api::config::AppConfig, services: &api::handlers::AppServices) {
    match services.products.seed_if_empty().await {
        Ok(0) => {}
        Ok(count) => info!(count, "Seeded product catalog"),
        Err(e) => warn!(error = %e, "Product seed failed"),
    }
    match services.pages.seed_about_page().await {
        Ok(true) => info!("Seeded about page"),
        Ok(false) => {}
        Err(e) => warn!(error = %e, "About page seed failed"),
    }
    match services
        .users
        .seed_admin(&cfg.admin_name, &cfg.admin_email, cfg.admin_password.as_deref())
        .await
    {
        Ok(true) => info!(email = %cfg.admin_email, "Seeded admin account"),
        Ok(false) => {}
        Err(e) => warn!(error = %e, "Admin seed failed"),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
