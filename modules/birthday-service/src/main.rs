//! Birthday Bot Service — ingests birthday entries from self-chat messages
//! and greets everyone whose `DD-MM` matches today, once a day at midnight.
//!
//! The WhatsApp session itself lives in an external gateway process; this
//! binary only orchestrates parsing, storage, matching, and dispatch.
//! Default status surface: http://127.0.0.1:8000/

mod config;
mod db;
mod dispatch;
mod gateway;
mod ingest;
mod matcher;
mod parser;
mod routes;
mod scheduler;

use birthday_types::DailyRunSummary;
use routes::AppState;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    env_logger::init();

    let cfg = config::Config::from_env();

    log::info!("[BIRTHDAY_BOT] Opening database at: {}", cfg.db_path);
    let database = Arc::new(db::Db::open(&cfg.db_path).expect("Failed to open database"));

    let gateway_client = Arc::new(gateway::HttpGateway::new(&cfg.gateway_url));

    let last_tick_at: Arc<Mutex<Option<String>>> = Arc::new(Mutex::new(None));
    let last_run: Arc<Mutex<Option<DailyRunSummary>>> = Arc::new(Mutex::new(None));

    let state = Arc::new(AppState {
        db: database.clone(),
        start_time: Instant::now(),
        last_tick_at: last_tick_at.clone(),
        last_run: last_run.clone(),
        poll_interval_secs: cfg.poll_interval_secs,
    });

    // Ingestion poll loop, only when a trusted sender is configured
    match cfg.expected_sender.clone() {
        Some(expected_sender) => {
            let poll_db = database.clone();
            let poll_gateway = gateway_client.clone();
            let poll_tick = last_tick_at.clone();
            let poll_interval_secs = cfg.poll_interval_secs;
            tokio::spawn(async move {
                gateway::run_poll_loop(
                    poll_db,
                    poll_gateway,
                    expected_sender,
                    poll_interval_secs,
                    poll_tick,
                )
                .await;
            });
        }
        None => {
            log::warn!("[BIRTHDAY_BOT] EXPECTED_SENDER not set — ingestion disabled");
        }
    }

    // Daily midnight trigger
    {
        let job_db = database.clone();
        let job_gateway: Arc<dyn gateway::Gateway> = gateway_client.clone();
        let job_last_run = last_run.clone();
        let tz = cfg.tz;
        tokio::spawn(async move {
            scheduler::run_scheduler(job_db, job_gateway, tz, job_last_run).await;
        });
    }

    let cors = tower_http::cors::CorsLayer::permissive();

    let app = axum::Router::new()
        .route("/rpc/status", axum::routing::get(routes::status))
        .route(
            "/rpc/birthdays/list",
            axum::routing::get(routes::birthdays_list),
        )
        .with_state(state)
        .layer(cors);

    let addr = format!("127.0.0.1:{}", cfg.port);
    log::info!("[BIRTHDAY_BOT] Status surface listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind");

    axum::serve(listener, app).await.expect("Server error");
}
