use cqg_runner::{RunnerConfig, RunnerError};

#[tokio::main]
async fn main() -> Result<(), RunnerError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match std::env::args().nth(1) {
        Some(path) => {
            log::info!("Loading configuration from {}", path);
            RunnerConfig::from_file(path)?
        }
        None => RunnerConfig::default(),
    };

    let report = cqg_runner::run(config).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
