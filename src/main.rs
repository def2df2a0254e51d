use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use forecast_core::{App, AppError, Config};
use forecast_provider::{columns, NoopNotifier, ProviderError, WeatherProvider};

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            eprintln!("error: {:#}", e);
            eprintln!("{}", user_message(e));
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let config = Config::load()?;
    forecast_core::init(&config.logging.filter)?;
    config.ensure_valid()?;

    let mut app = App::with_config(config);
    app.initialize()?;

    let provider = WeatherProvider::open(app.config(), Arc::new(NoopNotifier))?;
    tracing::info!(
        "Serving {} from {}",
        provider.contract().content_uri(),
        app.config().database_path().display()
    );

    let sort = format!("{} ASC", columns::DATE);
    let cursor = provider.query(
        &provider.contract().content_uri(),
        None,
        None,
        &[],
        Some(sort.as_str()),
    )?;

    println!("{} weather rows", cursor.len());
    for row in cursor.rows() {
        println!("{}", serde_json::to_string(&row.to_json())?);
    }

    provider.close()?;
    app.shutdown()?;

    Ok(())
}

fn user_message(err: anyhow::Error) -> &'static str {
    match err.downcast_ref::<ProviderError>() {
        Some(e) => e.user_message(),
        None => AppError::classify(err).user_message(),
    }
}
