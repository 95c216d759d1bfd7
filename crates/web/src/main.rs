use std::sync::Arc;

use database::{seed, MemoryDatabase};
use donation::{client::Client, reminder::LogDispatcher};
use web::{start_web_server, WebState};

#[tokio::main]
async fn main() {
    env_logger::init();

    // backing store with demo data
    let database = MemoryDatabase::new();
    seed::example_data(&database)
        .await
        .expect("could not seed example data.");

    let coordination_client = Client::new(database, Arc::new(LogDispatcher));

    let web_future = start_web_server(WebState {
        coordination_client,
    });

    let _ = web_future.await;
}
