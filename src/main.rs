//! Claude Code node CLI binary entry point.

use claude_code_node::cli::{BatchArgs, Cli, Commands, RunArgs};
use claude_code_node::config::NodeConfig;
use claude_code_node::node::{ClaudeCodeNode, Node, NodeOperationError, OutputItem, StaticHost};

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[tokio::main]
async fn main() {
    let cli = Cli::parse_args();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    let default_filter = if cli.debug { "debug" } else { config.log_level.as_str() };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let node = ClaudeCodeNode::from_config(&config);
    let result = match cli.command {
        Commands::Run(args) => handle_run(&node, &args, cli.debug).await,
        Commands::Batch(args) => handle_batch(&node, &args).await,
        Commands::Describe => print_json(&node.description()),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        if let Some(description) = e
            .downcast_ref::<NodeOperationError>()
            .and_then(|op| op.description.as_deref())
        {
            eprintln!("{description}");
        }
        std::process::exit(1);
    }
}

fn load_config(cli: &Cli) -> CliResult<NodeConfig> {
    let config = match &cli.config {
        Some(path) => {
            let _ = dotenvy::dotenv();
            NodeConfig::load_file(path)?.apply_env(|key| std::env::var(key).ok())?
        }
        None => NodeConfig::from_env()?,
    };
    Ok(config)
}

async fn handle_run(node: &ClaudeCodeNode, args: &RunArgs, debug: bool) -> CliResult<()> {
    let host = StaticHost::new(vec![args.to_parameters(debug)]);
    let items = node.execute(&host).await?;
    // One item in, one item out.
    match items.first() {
        Some(OutputItem { json, .. }) => print_json(json),
        None => Ok(()),
    }
}

async fn handle_batch(node: &ClaudeCodeNode, args: &BatchArgs) -> CliResult<()> {
    let raw = std::fs::read_to_string(&args.file)?;
    let host = StaticHost::from_json(serde_json::from_str(&raw)?)?
        .with_continue_on_fail(args.continue_on_fail);
    let items = node.execute(&host).await?;
    print_json(&items)
}

fn print_json<T: serde::Serialize>(value: &T) -> CliResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
