use clap::Parser;
use tracing::{debug, info, warn};

mod log;
mod utils;

#[derive(Parser)]
#[command(version)]
struct Args {
    /// Set config file path
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let cfg: transcoder::config::Config = utils::load("livehls".to_string(), args.config);
    cfg.validate()?;

    log::set(format!(
        "livehls={},transcoder={},tower_http={}",
        cfg.log.level, cfg.log.level, cfg.log.level
    ));

    warn!("set log level : {}", cfg.log.level);
    debug!("config : {:?}", cfg);

    let listener = tokio::net::TcpListener::bind(cfg.http.listen).await?;
    info!("Server listening on {}", listener.local_addr()?);

    transcoder::serve(cfg, listener, utils::shutdown_signal()).await;
    info!("Server shutdown");
    Ok(())
}
