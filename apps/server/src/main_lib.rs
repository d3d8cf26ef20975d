use std::sync::Arc;

use crate::{config::Config, domain_events::WebDomainEventSink, events::EventBus};
use savings_ledger_core::goals::{GoalService, GoalServiceTrait};
use savings_ledger_storage_sqlite::{db, goals::GoalRepository};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

const EVENT_BUS_CAPACITY: usize = 256;

pub struct AppState {
    pub goal_service: Arc<dyn GoalServiceTrait + Send + Sync>,
    pub event_bus: EventBus,
}

pub fn init_tracing() {
    let log_format = std::env::var("SL_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_current_span(false))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .init();
    }
}

pub async fn build_state(config: &Config) -> anyhow::Result<Arc<AppState>> {
    let db_path = db::init(&config.db_path)?;
    tracing::info!("Database path in use: {}", db_path);

    let pool = db::create_pool(&db_path)?;
    db::run_migrations(&pool)?;
    let writer = db::spawn_writer((*pool).clone());

    let event_bus = EventBus::new(EVENT_BUS_CAPACITY);
    let domain_event_sink = Arc::new(WebDomainEventSink::new(event_bus.clone()));

    let goal_repository = Arc::new(GoalRepository::new(pool.clone(), writer));
    let goal_service: Arc<dyn GoalServiceTrait + Send + Sync> =
        Arc::new(GoalService::new(goal_repository).with_event_sink(domain_event_sink));

    Ok(Arc::new(AppState {
        goal_service,
        event_bus,
    }))
}
