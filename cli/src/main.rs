// visor-cli: control surface client and simulated visor
//
// Every command except `serve` and `config` is one call on the control
// surface of the visor at the configured RPC address.

mod api;
mod config;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use uuid::Uuid;
use visor_core::rpc::httputil::{bool_from_query, split_rpc_addr};
use visor_core::visor::AppState;
use visor_core::{
    HttpChannel, MockVisor, PubKey, RouteId, RoutingRule, RpcClient, RpcGateway, TransportId,
    TransportSummary, VisorApi,
};

#[derive(Parser)]
#[command(name = "visor-cli")]
#[command(about = "Visor control plane client", long_about = None)]
#[command(version)]
struct Cli {
    /// RPC address of the visor (host:port), overrides the config
    #[arg(long, global = true)]
    rpc: Option<String>,

    /// RPC method prefix, overrides the config
    #[arg(long, global = true)]
    prefix: Option<String>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a simulated visor serving its control surface
    Serve {
        #[arg(long)]
        addr: Option<String>,
        #[arg(long)]
        transports: Option<usize>,
        #[arg(long)]
        rules: Option<usize>,
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Show the visor summary
    Summary,
    /// Show the status of external services
    Health,
    /// Show seconds since the visor started
    Uptime,
    /// Manage apps
    App {
        #[command(subcommand)]
        action: AppAction,
    },
    /// Manage transports
    Tp {
        #[command(subcommand)]
        action: TpAction,
    },
    /// Manage routing rules
    Rt {
        #[command(subcommand)]
        action: RtAction,
    },
    /// Configure the socks apps
    Socks {
        #[command(subcommand)]
        action: SocksAction,
    },
    /// Node maintenance
    Node {
        #[command(subcommand)]
        action: NodeAction,
    },
    /// Configure settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum AppAction {
    Ls,
    Start {
        name: String,
    },
    Stop {
        name: String,
    },
    /// Set autostart (on/off)
    Autostart {
        name: String,
        value: String,
    },
    Logs {
        name: String,
        /// Only lines from the last N seconds (0 for all)
        #[arg(long, default_value = "0")]
        since: u64,
    },
}

#[derive(Subcommand)]
enum TpAction {
    Types,
    Ls {
        #[arg(long, value_delimiter = ',')]
        types: Vec<String>,
        #[arg(long, value_delimiter = ',')]
        pks: Vec<String>,
        #[arg(long)]
        logs: bool,
    },
    Get {
        id: String,
    },
    Add {
        remote: String,
        #[arg(long = "type", default_value = "native")]
        tp_type: String,
        #[arg(long)]
        public: bool,
        /// Timeout in seconds
        #[arg(long, default_value = "10")]
        timeout: u64,
    },
    Rm {
        id: String,
    },
    DiscPk {
        pk: String,
    },
    DiscId {
        id: String,
    },
}

#[derive(Subcommand)]
enum RtAction {
    Ls,
    Get {
        id: u32,
    },
    /// Save a rule given as JSON
    Save {
        json: String,
    },
    Rm {
        id: u32,
    },
    Groups,
}

#[derive(Subcommand)]
enum SocksAction {
    Password { password: String },
    ClientPk { pk: String },
}

#[derive(Subcommand)]
enum NodeAction {
    Restart,
    Exec { command: String },
    Update,
    UpdateAvailable,
}

#[derive(Subcommand)]
enum ConfigAction {
    Set { key: String, value: String },
    Get { key: String },
    List,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();

    let mut config = config::Config::load()?;

    match cli.command {
        Commands::Serve {
            addr,
            transports,
            rules,
            seed,
        } => {
            let addr = addr.or(cli.rpc).unwrap_or_else(|| config.rpc_addr.clone());
            let prefix = cli.prefix.unwrap_or_else(|| config.rpc_prefix.clone());
            cmd_serve(
                &addr,
                &prefix,
                transports.unwrap_or(config.mock.transports),
                rules.unwrap_or(config.mock.rules),
                seed.or(config.mock.seed),
            )
        }
        Commands::Config { action } => cmd_config(&mut config, action),
        command => {
            let addr = cli.rpc.unwrap_or_else(|| config.rpc_addr.clone());
            let prefix = cli.prefix.unwrap_or_else(|| config.rpc_prefix.clone());
            let client = connect(&addr, &prefix, config.request_timeout)?;
            run(&client, command)
        }
    }
}

fn connect(addr: &str, prefix: &str, timeout_secs: u64) -> Result<RpcClient<HttpChannel>> {
    split_rpc_addr(addr).context("Invalid RPC address")?;
    let channel = HttpChannel::new(addr, Duration::from_secs(timeout_secs));
    tracing::debug!("using visor RPC at {}", channel.url());
    Ok(RpcClient::new(channel, prefix))
}

fn resolve(addr: &str) -> Result<SocketAddr> {
    let (host, port) = split_rpc_addr(addr).context("Invalid RPC address")?;
    (host.as_str(), port)
        .to_socket_addrs()
        .with_context(|| format!("Failed to resolve {}", addr))?
        .next()
        .with_context(|| format!("No address for {}", addr))
}

fn cmd_serve(
    addr: &str,
    prefix: &str,
    transports: usize,
    rules: usize,
    seed: Option<u64>,
) -> Result<()> {
    let socket_addr = resolve(addr)?;

    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let visor = MockVisor::random(&mut rng, transports, rules)?;
    let summary = visor.summary()?;
    let gateway = Arc::new(RpcGateway::new(prefix, Arc::new(visor)));

    println!("{}", "Simulated visor".bold());
    println!("  Public Key: {}", summary.pub_key.to_string().bright_yellow());
    println!("  Transports: {}", summary.transports.len());
    println!("  Routes:     {}", summary.routes_count);
    println!(
        "  Listening:  {}",
        format!("http://{}/rpc", socket_addr).bright_green()
    );

    let runtime = tokio::runtime::Runtime::new().context("Failed to start runtime")?;
    runtime.block_on(api::serve(socket_addr, gateway))
}

fn run(client: &RpcClient<HttpChannel>, command: Commands) -> Result<()> {
    match command {
        Commands::Summary => {
            let summary = client.summary()?;
            println!("{}", "Visor Summary".bold());
            println!("  Public Key: {}", summary.pub_key.to_string().bright_yellow());
            println!(
                "  Build:      {} ({}, {})",
                summary.build_info.version, summary.build_info.commit, summary.build_info.date
            );
            println!("  Protocol:   {}", summary.app_protocol_version);
            println!("  Routes:     {}", summary.routes_count);
            println!();
            print_apps(&summary.apps);
            println!();
            print_transports(&summary.transports);
        }
        Commands::Health => {
            let health = client.health()?;
            println!("{}", "Health".bold());
            println!("  transport_discovery: {}", health.transport_discovery);
            println!("  route_finder:        {}", health.route_finder);
            println!("  setup_node:          {}", health.setup_node);
        }
        Commands::Uptime => {
            println!("{:.1}s", client.uptime()?);
        }
        Commands::App { action } => cmd_app(client, action)?,
        Commands::Tp { action } => cmd_tp(client, action)?,
        Commands::Rt { action } => cmd_rt(client, action)?,
        Commands::Socks { action } => match action {
            SocksAction::Password { password } => {
                client.set_socks_password(&password)?;
                println!("{} Socks password set", "✓".green());
            }
            SocksAction::ClientPk { pk } => {
                client.set_socks_client_pk(parse_pk(&pk)?)?;
                println!("{} Socks client key set", "✓".green());
            }
        },
        Commands::Node { action } => cmd_node(client, action)?,
        Commands::Serve { .. } | Commands::Config { .. } => {
            anyhow::bail!("Command does not talk to a visor")
        }
    }
    Ok(())
}

fn cmd_app(client: &RpcClient<HttpChannel>, action: AppAction) -> Result<()> {
    match action {
        AppAction::Ls => print_apps(&client.apps()?),
        AppAction::Start { name } => {
            client.start_app(&name)?;
            println!("{} Started {}", "✓".green(), name.bright_cyan());
        }
        AppAction::Stop { name } => {
            client.stop_app(&name)?;
            println!("{} Stopped {}", "✓".green(), name.bright_cyan());
        }
        AppAction::Autostart { name, value } => {
            let auto_start =
                bool_from_query(Some(&value), false).context("Expected on or off")?;
            client.set_auto_start(&name, auto_start)?;
            println!(
                "{} Autostart of {} = {}",
                "✓".green(),
                name.bright_cyan(),
                auto_start
            );
        }
        AppAction::Logs { name, since } => {
            let from = if since == 0 {
                UNIX_EPOCH
            } else {
                SystemTime::now()
                    .checked_sub(Duration::from_secs(since))
                    .unwrap_or(UNIX_EPOCH)
            };
            let lines = client.logs_since(from, &name)?;
            if lines.is_empty() {
                println!("{}", "(no logs)".dimmed());
            }
            for line in lines {
                println!("{}", line);
            }
        }
    }
    Ok(())
}

fn cmd_tp(client: &RpcClient<HttpChannel>, action: TpAction) -> Result<()> {
    match action {
        TpAction::Types => {
            for tp_type in client.transport_types()? {
                println!("{}", tp_type);
            }
        }
        TpAction::Ls { types, pks, logs } => {
            let pks = pks
                .iter()
                .map(|pk| parse_pk(pk))
                .collect::<Result<Vec<_>>>()?;
            print_transports(&client.transports(&types, &pks, logs)?);
        }
        TpAction::Get { id } => print_json(&client.transport(parse_tid(&id)?)?)?,
        TpAction::Add {
            remote,
            tp_type,
            public,
            timeout,
        } => {
            let tp = client.add_transport(
                parse_pk(&remote)?,
                &tp_type,
                public,
                Duration::from_secs(timeout),
            )?;
            println!("{} Transport {}", "✓".green(), tp.id.to_string().bright_cyan());
        }
        TpAction::Rm { id } => {
            client.remove_transport(parse_tid(&id)?)?;
            println!("{} Removed transport {}", "✓".green(), id);
        }
        TpAction::DiscPk { pk } => print_json(&client.discover_transports_by_pk(parse_pk(&pk)?)?)?,
        TpAction::DiscId { id } => print_json(&client.discover_transport_by_id(parse_tid(&id)?)?)?,
    }
    Ok(())
}

fn cmd_rt(client: &RpcClient<HttpChannel>, action: RtAction) -> Result<()> {
    match action {
        RtAction::Ls => {
            let rules = client.routing_rules()?;
            println!("{} ({} total)", "Routing rules".bold(), rules.len());
            for rule in rules {
                println!("  {}", rule);
            }
        }
        RtAction::Get { id } => print_json(&client.routing_rule(RouteId(id))?)?,
        RtAction::Save { json } => {
            let rule: RoutingRule =
                serde_json::from_str(&json).context("Invalid routing rule JSON")?;
            let id = rule.route_id();
            client.save_routing_rule(rule)?;
            println!("{} Saved rule {}", "✓".green(), id);
        }
        RtAction::Rm { id } => {
            client.remove_routing_rule(RouteId(id))?;
            println!("{} Removed rule {}", "✓".green(), id);
        }
        RtAction::Groups => print_json(&client.route_groups()?)?,
    }
    Ok(())
}

fn cmd_node(client: &RpcClient<HttpChannel>, action: NodeAction) -> Result<()> {
    match action {
        NodeAction::Restart => {
            client.restart()?;
            println!("{} Restart requested", "✓".green());
        }
        NodeAction::Exec { command } => {
            let output = client.exec(&command)?;
            println!("{}", String::from_utf8_lossy(&output));
        }
        NodeAction::Update => {
            if client.update()? {
                println!("{} Updated", "✓".green());
            } else {
                println!("{}", "No update performed".dimmed());
            }
        }
        NodeAction::UpdateAvailable => match client.update_available()? {
            Some(version) => println!(
                "Update available: {} {}",
                version.version.bright_green(),
                version.release_url
            ),
            None => println!("{}", "Up to date".dimmed()),
        },
    }
    Ok(())
}

fn cmd_config(config: &mut config::Config, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Set { key, value } => {
            config.set(&key, &value)?;
            config.save()?;
            println!("{} Set {} = {}", "✓".green(), key.bright_cyan(), value);
        }

        ConfigAction::Get { key } => {
            if let Some(value) = config.get(&key) {
                println!("{} = {}", key.bright_cyan(), value);
            } else {
                anyhow::bail!("Unknown or unset config key: {}", key);
            }
        }

        ConfigAction::List => {
            println!("{}", "Configuration".bold());
            println!();
            for (key, value) in config.list() {
                println!("  {:<20} {}", key.bright_cyan(), value);
            }
        }
    }
    Ok(())
}

fn print_apps(apps: &[AppState]) {
    println!("{} ({} total)", "Apps".bold(), apps.len());
    for app in apps {
        println!(
            "  {:<20} {:<8} port {:<5} autostart {}",
            app.name, app.status, app.port, app.auto_start
        );
    }
}

fn print_transports(transports: &[TransportSummary]) {
    println!("{} ({} total)", "Transports".bold(), transports.len());
    if transports.is_empty() {
        println!("  {}", "(none)".dimmed());
    }
    for tp in transports {
        println!("  {}", tp);
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn parse_pk(s: &str) -> Result<PubKey> {
    s.parse::<PubKey>()
        .with_context(|| format!("Invalid public key: {}", s))
}

fn parse_tid(s: &str) -> Result<TransportId> {
    Uuid::parse_str(s).with_context(|| format!("Invalid transport id: {}", s))
}
