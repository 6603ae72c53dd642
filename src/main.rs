#[tokio::main]
async fn main() {
    if let Err(e) = range_sim::run_with_config().await {
        tracing::error!(error = %e, "range run failed");
        std::process::exit(1);
    }
}
