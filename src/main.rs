#[tokio::main]
async fn main() {
    kycvault::init_tracing();

    if let Err(e) = kycvault::run().await {
        tracing::error!("Fatal: {e}");
        std::process::exit(1);
    }
}
