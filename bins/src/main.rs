use eyre::Context;
use log::info;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let env = env::Env::load()?;
    std::env::set_var("RUST_LOG", env.rust_log());
    pretty_env_logger::init();
    color_eyre::install()?;

    info!("connecting to mongo");
    let storage = storage::Storage::new(env.mongo_url())
        .await
        .context("Failed to create storage")?;

    info!("creating planner");
    let planner = booking::Planner::new(storage);

    info!("starting completion sweeper");
    bg_process::start(planner, env.sweep_interval_min());

    tokio::signal::ctrl_c().await?;
    info!("shutting down");
    Ok(())
}
