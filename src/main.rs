use std::sync::Arc;

use clap::Parser;
use migration::{Migrator, MigratorTrait};
use sea_orm::Database;

use aeroscan::config::get_config;
use aeroscan::routes::{create_routes, AppState};
use aeroscan::services::analysis_client::{AnalysisClient, HttpAnalysisClient, SimulatedClient};
use aeroscan::services::coordinator::Coordinator;
use aeroscan::services::notifier::LogNotifier;

#[derive(Parser, Debug)]
#[command(name = "aeroscan", about = "Aerial imagery analysis request service")]
struct Args {
    /// Use the in-process simulated analysis service instead of HTTP
    #[arg(long)]
    simulate: bool,

    /// Port to listen on
    #[arg(long, default_value_t = 3000)]
    port: u16,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let args = Args::parse();
    let config = get_config();

    let db = Database::connect(&config.database_url)
        .await
        .expect("Failed to connect to database");
    Migrator::up(&db, None).await.expect("Failed to run migrations");
    let db = Arc::new(db);

    let client: Arc<dyn AnalysisClient> = if args.simulate {
        println!("Aeroscan | using the simulated analysis service");
        Arc::new(SimulatedClient::new(&config.results_dir))
    } else {
        println!("Aeroscan | analysis server at {}", config.analysis_server_url);
        Arc::new(HttpAnalysisClient::new(
            &config.analysis_server_url,
            &config.results_dir,
        ))
    };

    let coordinator = Coordinator::new(
        db.clone(),
        client,
        Arc::new(LogNotifier),
        config.max_file_size,
        config.poll_interval,
        config.poll_max_attempts,
    );

    let app = create_routes(AppState { db, coordinator });

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", args.port))
        .await
        .unwrap();
    println!("Listening on {}", listener.local_addr().unwrap());
    axum::serve(listener, app).await.unwrap();
}
