use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use topgraph::config::EngineConfig;
use topgraph::graph::{shared, Graph};
use topgraph::http::HttpServer;
use topgraph::persistence::{GraphPersistence, KvStore};
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "topgraph", version, about = "Embedded property graph server")]
struct Args {
    /// YAML configuration file
    #[arg(long, env = "TOPGRAPH_CONFIG")]
    config: Option<PathBuf>,

    /// Database directory, overrides storage.path
    #[arg(long)]
    data_path: Option<PathBuf>,

    /// HTTP port, overrides http.port
    #[arg(long)]
    port: Option<u16>,

    /// Log level, overrides log_level
    #[arg(long)]
    log_level: Option<String>,

    /// Print every stored record and exit
    #[arg(long)]
    dump: bool,
}

fn load_config(args: &Args) -> anyhow::Result<EngineConfig> {
    let mut config = match &args.config {
        Some(path) => EngineConfig::from_yaml_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => EngineConfig::default(),
    };
    if let Some(path) = &args.data_path {
        config.storage.path = path.clone();
    }
    if let Some(port) = args.port {
        config.http.port = port;
    }
    if let Some(level) = &args.log_level {
        config.log_level = level.clone();
    }
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = load_config(&args)?;

    tracing_subscriber::fmt()
        .with_max_level(config.log_level()?)
        .init();

    info!("topgraph v{}", topgraph::version());

    let persistence = GraphPersistence::open(&config.storage)
        .with_context(|| format!("opening store at {}", config.storage.path.display()))?;

    if args.dump {
        for (key, value) in persistence.dump()? {
            println!("{key}\t{value}");
        }
        persistence.close()?;
        return Ok(());
    }

    let graph = shared(persistence.load_graph().context("loading graph")?);

    let server = HttpServer::new(graph.clone(), config.http.clone());
    let served = server
        .start(async {
            // An error here means no signal handler; stop serving either way
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown requested");
        })
        .await;

    let saved = save_on_exit(&persistence, &*graph.read().await, served);
    persistence.close()?;
    saved
}

/// Persist the graph whatever the server outcome, then report that outcome
fn save_on_exit<S: KvStore>(
    persistence: &GraphPersistence<S>,
    graph: &Graph,
    served: std::io::Result<()>,
) -> anyhow::Result<()> {
    let saved = persistence.save_graph(graph).context("saving graph");
    match served {
        Ok(()) => saved.map(|_| ()),
        Err(e) => {
            if let Err(save_err) = saved {
                error!("{:#}", save_err);
            }
            Err(anyhow::Error::new(e).context("serving HTTP"))
        }
    }
}
