mod cli;

#[tokio::main]
async fn main() {
    let config = match cli::run() {
        cli::RunOutcome::Serve(config) => config,
        cli::RunOutcome::Exit(code) => std::process::exit(code),
    };

    pushkit::logging::init(&config.log_level);
    if let Err(err) = pushkit::serve(config).await {
        tracing::error!("{err}");
        std::process::exit(1);
    }
}
