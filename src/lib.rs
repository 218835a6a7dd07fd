pub mod application;
pub mod config;
pub mod db;
#[macro_use]
pub mod domain;
pub mod errors;
pub mod handlers;
pub mod infrastructure;
pub mod schema;

use std::sync::Arc;

use actix_web::{middleware::Logger, web, App, HttpServer};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::application::notifier::{OrderHistoryRecorder, VendorNotifier};
use crate::application::order_service::OrderService;
use crate::application::payment_service::PaymentService;
use crate::application::settlement_service::SettlementService;
use crate::application::status_service::StatusService;
use crate::config::{AppConfig, Secret};
use crate::domain::errors::DomainError;
use crate::domain::ports::Mailer;
use crate::handlers::{ApiDoc, AppState};
use crate::infrastructure::directory::DieselDirectory;
use crate::infrastructure::mailer::mailer_from_config;
use crate::infrastructure::order_repo::DieselOrderRepository;
use crate::infrastructure::razorpay::RazorpayClient;

pub use db::{create_pool, DbPool};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Run any pending Diesel migrations against the pool's database.
pub fn run_migrations(pool: &DbPool) -> Result<(), DomainError> {
    let mut conn = pool.get()?;
    conn.run_pending_migrations(MIGRATIONS)
        .map_err(|e| DomainError::Internal(format!("migrations failed: {e}")))?;
    Ok(())
}

/// Wires the Postgres, Razorpay and mail adapters into the services.
pub fn build_state(pool: DbPool, config: &AppConfig) -> Result<AppState, DomainError> {
    let orders = Arc::new(DieselOrderRepository::new(pool.clone()));
    let directory = Arc::new(DieselDirectory::new(pool));
    let gateway = Arc::new(RazorpayClient::new(config.razorpay.clone())?);
    let mailer: Arc<dyn Mailer> = Arc::from(mailer_from_config(&config.mail)?);

    let order_service = OrderService::new(orders.clone(), directory.clone(), gateway)
        .with_handler(Arc::new(OrderHistoryRecorder::new(directory.clone())))
        .with_handler(Arc::new(VendorNotifier::new(directory.clone(), mailer)));

    Ok(AppState {
        orders: Arc::new(order_service),
        payments: Arc::new(PaymentService::new(
            orders.clone(),
            config
                .razorpay
                .signing_secret()
                .ok()
                .map(|s| Secret::new(s.to_string())),
        )),
        statuses: Arc::new(StatusService::new(orders.clone(), config.status_policy)),
        settlements: Arc::new(SettlementService::new(orders, directory)),
    })
}

/// Build and return an actix-web `Server` bound to `host:port`.
///
/// The caller is responsible for `.await`-ing (or `tokio::spawn`-ing) the
/// returned server.
pub fn build_server(
    state: AppState,
    host: &str,
    port: u16,
) -> std::io::Result<actix_web::dev::Server> {
    let state = web::Data::new(state);
    let openapi = ApiDoc::openapi();
    Ok(HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(Logger::default())
            .configure(handlers::configure)
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", openapi.clone()),
            )
    })
    .bind((host.to_string(), port))?
    .run())
}
