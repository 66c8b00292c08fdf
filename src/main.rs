use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use axum_prometheus::PrometheusMetricLayer;
use clap::{Args, Parser, Subcommand};
use metrics_exporter_prometheus::PrometheusHandle;
use portal_core::config::AppConfig;
use portal_core::error::AppError;
use portal_core::portal::accounts::{account_router, AccountService};
use portal_core::portal::catalog::{CatalogService, SubjectCatalogImporter};
use portal_core::portal::chat::{chat_router, ChatService};
use portal_core::portal::enrollment::{enrollment_router, EnrollmentPolicy, EnrollmentService};
use portal_core::portal::memory::InMemoryPortalGateway;
use portal_core::telemetry;
use serde_json::json;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
struct AppState {
    readiness: Arc<AtomicBool>,
    metrics: PrometheusHandle,
}

#[derive(Parser, Debug)]
#[command(
    name = "Student Portal",
    about = "Run the student/tutor portal service from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Inspect and validate subject catalog data
    Catalog {
        #[command(subcommand)]
        command: CatalogCommand,
    },
}

#[derive(Args, Debug, Default)]
struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    port: Option<u16>,
    /// Subject catalog CSV (Name,Grade) to seed at startup
    #[arg(long)]
    catalog_csv: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum CatalogCommand {
    /// Validate a subject catalog CSV and print what seeding would insert
    Check(CatalogCheckArgs),
}

#[derive(Args, Debug)]
struct CatalogCheckArgs {
    /// Path to the catalog CSV export
    #[arg(long)]
    file: PathBuf,
}

#[tokio::main]
async fn main() {
    if let Err(err) = run_cli().await {
        eprintln!("application error: {err}");
        std::process::exit(1);
    }
}

async fn run_cli() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => run_server(args).await,
        Command::Catalog {
            command: CatalogCommand::Check(args),
        } => run_catalog_check(args),
    }
}

async fn run_server(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(config.environment, &config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let state = AppState {
        readiness: readiness_flag.clone(),
        metrics: prometheus_handle,
    };

    let gateway = Arc::new(InMemoryPortalGateway::new());
    let catalog = CatalogService::new(gateway.clone());

    if let Some(path) = args.catalog_csv.take() {
        let subjects = SubjectCatalogImporter::from_path(&path)?;
        let summary = catalog.seed_subjects(subjects)?;
        info!(
            inserted = summary.inserted,
            skipped = summary.skipped,
            "subject catalog seeded"
        );
    }

    let policy = EnrollmentPolicy::from(&config.portal);
    let accounts = Arc::new(AccountService::new(gateway.clone()));
    let enrollment = Arc::new(EnrollmentService::new(gateway.clone(), policy));
    let chat = Arc::new(ChatService::new(gateway));

    let ops = Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .with_state(state);

    let app = ops
        .merge(account_router(accounts))
        .merge(enrollment_router(enrollment))
        .merge(chat_router(chat))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "student portal ready");

    axum::serve(listener, app).await?;
    Ok(())
}

fn run_catalog_check(args: CatalogCheckArgs) -> Result<(), AppError> {
    let subjects = SubjectCatalogImporter::from_path(&args.file)?;

    println!("Subject catalog check");
    println!("{} distinct subjects parsed", subjects.len());

    let mut per_grade: BTreeMap<u8, usize> = BTreeMap::new();
    for subject in &subjects {
        *per_grade.entry(subject.grade.number()).or_default() += 1;
    }

    println!("\nSubjects by grade");
    for (grade, count) in per_grade {
        println!("- grade {}: {}", grade, count);
    }

    Ok(())
}

async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn readiness_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

async fn metrics_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
