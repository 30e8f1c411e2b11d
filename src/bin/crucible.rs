use std::sync::Arc;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use crucible::{
    ConfigStore, ConnectorRegistry, Engine, MemorySink, Overrides, Provisioner,
    DEFAULT_CONFIG_PATH,
};
use serde_json::json;
use tabled::settings::Style;
use tabled::{Table, Tabled};
use tracing::Level;

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
#[clap(propagate_version = true)]
struct Cli {
    /// engine configuration file path, by default dbconfigs/engines.toml is used
    #[clap(short, long)]
    config: Option<String>,

    /// Print debug information
    #[clap(long)]
    debug: bool,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List supported engines and their provisioning strategies
    Engines {
        /// Output as JSON objects
        #[clap(long)]
        json: bool,
    },

    /// Resolve and print the connection string for an engine
    Resolve {
        /// Engine name, e.g. POSTGRESQL
        #[clap(short, long)]
        engine: String,

        /// Target database name
        #[clap(short, long, default_value = "")]
        database: String,

        /// Override the configured host
        #[clap(long)]
        host: Option<String>,

        /// Override the configured port
        #[clap(long)]
        port: Option<u16>,

        /// Override the configured username
        #[clap(short, long)]
        user: Option<String>,

        /// Override the configured password
        #[clap(short, long)]
        password: Option<String>,

        /// Output as JSON
        #[clap(long)]
        json: bool,
    },

    /// Provision a database: connect, reset its schema, report freshness
    Provision {
        /// Engine name, e.g. SQLITE
        #[clap(short, long)]
        engine: String,

        /// Target database name
        #[clap(short, long)]
        database: String,

        /// Override the configured host
        #[clap(long)]
        host: Option<String>,

        /// Override the configured port
        #[clap(long)]
        port: Option<u16>,

        /// Output as JSON
        #[clap(long)]
        json: bool,
    },
}

#[derive(Tabled)]
struct EngineRow {
    #[tabled(rename = "engine")]
    engine: &'static str,
    #[tabled(rename = "connection")]
    connection: String,
    #[tabled(rename = "reset")]
    reset: String,
    #[tabled(rename = "session statements")]
    session_statements: usize,
    #[tabled(rename = "sync")]
    sync: String,
}

fn parse_engine(name: &str) -> Result<Engine> {
    Engine::from_name(name).ok_or_else(|| {
        let supported = Engine::all()
            .iter()
            .map(|e| e.name())
            .collect::<Vec<_>>()
            .join(", ");
        anyhow!("unknown engine '{}'; supported engines: {}", name, supported)
    })
}

fn store_from(config: &Option<String>) -> Arc<ConfigStore> {
    match config {
        Some(path) => Arc::new(ConfigStore::with_path(path)),
        None => Arc::new(ConfigStore::with_path(DEFAULT_CONFIG_PATH)),
    }
}

fn main() -> Result<()> {
    // Load .env before anything reads the environment
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    if cli.debug {
        tracing_subscriber::fmt().with_max_level(Level::DEBUG).init();
    }

    match cli.command {
        Commands::Engines { json } => {
            if json {
                let engines: Vec<_> = Engine::all()
                    .iter()
                    .map(|engine| {
                        let profile = engine.profile();
                        json!({
                            "engine": engine.name(),
                            "connection": profile.connection.to_string(),
                            "reset": profile.reset.to_string(),
                            "session_statements": profile.session_statements,
                            "sync": profile.sync.to_string(),
                        })
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&engines)?);
            } else {
                let rows: Vec<EngineRow> = Engine::all()
                    .iter()
                    .map(|engine| {
                        let profile = engine.profile();
                        EngineRow {
                            engine: engine.name(),
                            connection: profile.connection.to_string(),
                            reset: profile.reset.to_string(),
                            session_statements: profile.session_statements.len(),
                            sync: profile.sync.to_string(),
                        }
                    })
                    .collect();
                println!("{}", Table::new(rows).with(Style::markdown()));
            }
        }

        Commands::Resolve {
            engine,
            database,
            host,
            port,
            user,
            password,
            json,
        } => {
            let engine = parse_engine(&engine)?;
            let store = store_from(&cli.config);
            let provisioner = Provisioner::new(
                store,
                ConnectorRegistry::with_defaults(),
                Arc::new(crucible::NullSink),
            );
            let overrides = Overrides {
                host,
                port,
                username: user,
                password,
            };
            let url = engine
                .profile()
                .connection_string(provisioner.resolver(), &overrides, &database)?;

            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&json!({
                        "engine": engine.name(),
                        "database": database,
                        "url": url,
                    }))?
                );
            } else {
                println!("{url}");
            }
        }

        Commands::Provision {
            engine,
            database,
            host,
            port,
            json,
        } => {
            let engine = parse_engine(&engine)?;
            let store = store_from(&cli.config);
            let sink = Arc::new(MemorySink::new());
            let provisioner =
                Provisioner::new(store, ConnectorRegistry::with_defaults(), sink.clone());
            let overrides = Overrides {
                host,
                port,
                ..Default::default()
            };

            let outcome = provisioner.provision(engine, &database, &overrides)?;
            let statements = sink.statements();

            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&json!({
                        "engine": engine.name(),
                        "database": database,
                        "url": outcome.url,
                        "fresh": outcome.fresh,
                        "statements": statements,
                    }))?
                );
            } else {
                println!("connected:  {}", outcome.url);
                println!(
                    "schema:     {}",
                    if outcome.fresh { "fresh" } else { "recovered" }
                );
                if !statements.is_empty() {
                    println!("statements issued:");
                    for statement in statements {
                        println!("  {statement}");
                    }
                }
            }
        }
    }

    Ok(())
}
