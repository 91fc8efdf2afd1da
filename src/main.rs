use std::path::PathBuf;

use clap::Parser;
use minigate::config::Config;
use minigate::gateway::apps;
use minigate::server::Listener;

#[derive(Parser, Debug)]
#[command(version, about = "Single-connection gateway server")]
struct Args {
    /// Application to serve, as module:callable (e.g. demo:hello)
    app: String,

    /// YAML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Address to listen on; overrides the config file and LISTEN
    #[arg(long)]
    listen: Option<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut cfg = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::load(),
    };
    if let Some(listen) = args.listen {
        cfg.listen_addr = listen;
    }

    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .with_max_level(cfg.log_level())
        .init();

    let app = apps::lookup(&args.app)?;
    let listener = Listener::bind(&cfg.listen_addr).await?;
    tracing::info!("Serving HTTP on port {} ...", listener.local_addr().port());

    tokio::select! {
        res = listener.serve(app.as_ref(), cfg.connection_options()) => {
            res?;
        }

        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    Ok(())
}
