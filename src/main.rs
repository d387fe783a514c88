#[tokio::main]
async fn main() -> std::io::Result<()> {
    // Startup and serve errors are logged before they reach here.
    grav_server::run_with_config().await
}
