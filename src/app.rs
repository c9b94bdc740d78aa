use crate::infrastructure::bootstrap;
use crate::infrastructure::config::Settings;
use crate::interfaces::http;
use tracing::info;

pub async fn run() -> std::io::Result<()> {
    let _ = tracing_subscriber::fmt().with_env_filter("info").try_init();

    let settings = Settings::load().map_err(to_io)?;
    let state = bootstrap::build_state(&settings).await.map_err(to_io)?;
    info!("Startup complete");

    http::start_server(state, &settings.server.host, settings.server.port)?.await
}

fn to_io(err: crate::domain::error::AppError) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::Other, err.to_string())
}
