#[cfg(not(target_arch = "wasm32"))]
fn main() -> Result<(), eframe::Error> {
    // Set up logging; RUST_LOG controls verbosity
    env_logger::init();

    // Background ingestion and export tasks run on this runtime
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            log::error!("Failed to start async runtime: {e}");
            std::process::exit(1);
        }
    };
    let _guard = runtime.enter();

    sentiment_dashboard::run_app()
}

#[cfg(target_arch = "wasm32")]
fn main() {}
