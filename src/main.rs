use std::sync::Arc;

use log::info;
use mystery_solver::{Config, ModelService, data, http};
use tokio::{net::TcpListener, signal};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = Config::from_env()?;
    let dataset = data::load_or_absent(config.data_path.as_deref());
    let service = Arc::new(ModelService::new(dataset, config.seed)?);

    let addr = config.addr();
    let listener = TcpListener::bind(&addr).await?;
    info!(data_loaded = service.is_ready(); "listening at {addr}");

    tokio::select! {
        ret = http::serve(listener, service) => ret?,
        _ = signal::ctrl_c() => info!("received ctrl-c, shutting down"),
    }

    Ok(())
}
