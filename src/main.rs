use clap::Parser;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use rover_teleop::config::Config;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let config = Config::parse();

    // Setup logging (set RUST_LOG=info or debug); stdout belongs to the display
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = rover_teleop::runtime::run(config).await {
        eprintln!("Runtime error: {}", e);
        std::process::exit(1);
    }
}
