use anyhow::{anyhow, Context};
use diesel::prelude::*;
use log::{error, info, warn};
use std::sync::Arc;

use crate::auth::password_codes::LogCodeSender;
use crate::classifier::{Classifier, HttpClassifier};
use crate::core::config::AppConfig;
use crate::core::shared::schema::admins;
use crate::core::shared::state::AppState;
use crate::core::shared::utils::{self, with_conn, DbPool};
use crate::security::JwtManager;
use crate::tickets::assignment::OperatorAssigner;
use crate::tickets::service::TicketService;
use crate::tickets::storage::PgStore;

/// Initialize logging
pub fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .write_style(env_logger::WriteStyle::Always)
        .init();
}

/// Initialize database pool and run migrations
pub async fn init_database(config: &AppConfig) -> anyhow::Result<DbPool> {
    let database_url = config.database_url.clone();
    let pool = tokio::task::spawn_blocking(move || utils::create_conn(&database_url))
        .await
        .context("database pool task failed")?
        .map_err(|e| {
            error!("Failed to create database pool: {}", e);
            anyhow!("Database pool creation failed: {e}")
        })?;

    info!("Running database migrations...");
    let migrate_pool = pool.clone();
    tokio::task::spawn_blocking(move || utils::run_migrations(&migrate_pool))
        .await
        .context("migration task failed")?
        .map_err(|e| anyhow!("Failed to run migrations: {e}"))?;
    info!("Database migrations completed successfully");

    Ok(pool)
}

/// Creates the configured admin account when it does not exist yet.
pub async fn ensure_bootstrap_admin(pool: &DbPool, config: &AppConfig) -> anyhow::Result<()> {
    let Some(email) = config.bootstrap_admin_email.as_ref().map(|e| e.to_lowercase()) else {
        return Ok(());
    };

    let logged = email.clone();
    let inserted = with_conn(pool, move |conn| {
        Ok(diesel::insert_into(admins::table)
            .values(admins::email.eq(&email))
            .on_conflict(admins::email)
            .do_nothing()
            .execute(conn)?)
    })
    .await?;

    if inserted > 0 {
        info!(
            "Bootstrap admin {} created; request a password code to set its password",
            logged
        );
    } else {
        info!("Bootstrap admin {} already exists", logged);
    }
    Ok(())
}

pub fn create_app_state(pool: DbPool, config: AppConfig) -> Arc<AppState> {
    let classifier: Arc<dyn Classifier> = Arc::new(HttpClassifier::new(&config.classifier.api_url));
    let store = PgStore::new(pool.clone());
    let shared_store = Arc::new(store.clone());

    info!("Classifier URL: {}", config.classifier.api_url);
    if config.classifier.timeout.is_zero() {
        warn!("CLASSIFIER_TIMEOUT_SECS is 0, every classification will time out");
    }

    let tickets = TicketService::new(
        classifier.clone(),
        shared_store.clone(),
        shared_store,
        OperatorAssigner::new(),
        config.classifier.timeout,
    );

    Arc::new(AppState {
        conn: pool,
        jwt: JwtManager::new(&config.auth.jwt_secret, config.auth.token_ttl),
        classifier,
        store,
        tickets,
        code_sender: Arc::new(LogCodeSender),
        config,
    })
}
