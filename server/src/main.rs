use anyhow::Context;
use clap::Parser;
use log::info;
use relay_server::{Config, Server};

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::parse();
    let server = Server::new(config.clone());
    let listener = server
        .bind()
        .with_context(|| format!("Couldn't bind to {}.", config.address()))?;
    info!("Listening on {}.", listener.local_addr()?);

    server.serve(listener);
    Ok(())
}
