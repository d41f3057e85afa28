use std::{
    net::{IpAddr, SocketAddr},
    sync::Arc,
};

use crate::{
    config::{Config, DatabaseConfig},
    domain::events::AppEvent,
    routes::{
        auth::{check_auth, login, logout, signup},
        event::stream,
        health,
        rewards::{list_rewards, redeem_reward},
        user::{get_authenticated_user, get_redemptions, get_referrals},
    },
    store::PgStore,
};
use axum::{
    middleware,
    routing::{get, post},
    Extension, Router,
};
use sqlx::postgres::PgPoolOptions;
use tokio::sync::broadcast;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Clone)]
pub struct AppState {
    store: PgStore,
    tx: broadcast::Sender<AppEvent>,
    pub config: Config,
}

impl AppState {
    pub fn get_store(&self) -> PgStore {
        self.store.clone()
    }

    pub fn get_sender(&self) -> broadcast::Sender<AppEvent> {
        self.tx.clone()
    }
}

pub struct Application;

impl Application {
    pub async fn build(config: Config) -> anyhow::Result<()> {
        Self::setup_tracing(&config.application.debug_mode);

        let store = Self::get_store(&config.database).await;
        let (tx, _rx) = broadcast::channel(100);
        let app_state = Arc::new(AppState {
            store: store.clone(),
            tx,
            config: config.clone(),
        });

        let cors = CorsLayer::permissive();
        let app = Router::new()
            .route("/stream", get(stream))
            .route("/users/me", get(get_authenticated_user))
            .route("/referrals", get(get_referrals))
            .route("/redemptions", get(get_redemptions))
            .route("/rewards/:reward_id/redeem", post(redeem_reward))
            .route("/logout", post(logout))
            .route_layer(middleware::from_fn(check_auth))
            .route("/health", get(health))
            .route("/rewards", get(list_rewards))
            .route("/signup", post(signup))
            .route("/login", post(login))
            .with_state(app_state)
            .layer(Extension(store.clone()))
            .layer(Extension(config.clone()))
            .layer(cors);

        let ip = config.application.host.parse::<IpAddr>()?;
        let addr = SocketAddr::new(ip, config.application.port);
        tracing::info!("listening on {}", addr.port());
        axum::Server::bind(&addr)
            .serve(app.into_make_service())
            .await?;

        Ok(())
    }

    fn setup_tracing(debug_mode: &str) {
        let _ = tracing_log::LogTracer::init();
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| debug_mode.into()),
            )
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    async fn get_store(db_config: &DatabaseConfig) -> PgStore {
        let pool = PgPoolOptions::new()
            .acquire_timeout(std::time::Duration::from_secs(2))
            .connect_lazy_with(db_config.get_connect_options());
        PgStore::new(pool)
    }
}
