// FICHIER : sqldoc/tools/sqldoc-cli/src/main.rs

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use serde_json::{json, Value};
use std::path::PathBuf;

use sqldoc::utils::config::StoreBackend;
use sqldoc::utils::logger::init_logging;
use sqldoc::{AppConfig, DbConnection};

#[derive(Parser, Debug)]
#[command(
    name = "sqldoc-cli",
    version,
    about = "Exécute des requêtes SQL simples sur le magasin de documents"
)]
struct Cli {
    /// Fichier de configuration JSON
    #[arg(long, env = "SQLDOC_CONFIG")]
    config: Option<PathBuf>,

    /// Dossier racine des données (prioritaire sur la configuration)
    #[arg(long)]
    root: Option<PathBuf>,

    #[arg(short, long)]
    database: Option<String>,

    /// Magasin volatil (utile pour `explain` et les essais)
    #[arg(long)]
    memory: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Crée la base et les collections du pipeline
    Init,
    Read {
        query: String,
        /// Paramètre positionnel, en JSON (`42`, `"texte"`, `null`)
        #[arg(short, long = "param")]
        params: Vec<String>,
    },
    Insert {
        query: String,
        #[arg(short, long = "param")]
        params: Vec<String>,
    },
    Update {
        query: String,
        #[arg(short, long = "param")]
        params: Vec<String>,
    },
    Delete {
        query: String,
        #[arg(short, long = "param")]
        params: Vec<String>,
    },
    /// Affiche le descripteur sans exécuter
    Explain {
        query: String,
        #[arg(short, long = "param")]
        params: Vec<String>,
    },
    /// Calcule le substitut entier d'un identifiant natif
    Surrogate { native_id: String },
}

/// Un argument qui n'est pas du JSON valide est pris comme chaîne brute.
fn parse_params(raw: &[String]) -> Vec<Value> {
    raw.iter()
        .map(|p| serde_json::from_str(p).unwrap_or_else(|_| Value::String(p.clone())))
        .collect()
}

fn build_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = AppConfig::load(cli.config.as_deref()).context("configuration invalide")?;
    if let Some(root) = &cli.root {
        config.data_root = root.clone();
    }
    if let Some(db) = &cli.database {
        config.database = db.clone();
    }
    if cli.memory {
        config.backend = StoreBackend::Memory;
    }
    Ok(config)
}

fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let cli = Cli::parse();

    if let Commands::Surrogate { native_id } = &cli.command {
        let surrogate = sqldoc::json_db::identity::surrogate_of(native_id);
        return print_json(&json!({ "native_id": native_id, "surrogate": surrogate }));
    }

    let config = build_config(&cli)?;
    init_logging(&config);
    tracing::debug!("⚙️ Configuration : {:?}", config);

    let conn = DbConnection::open(config)
        .await
        .context("ouverture du magasin impossible")?;

    match cli.command {
        Commands::Init => {
            let n = conn.init_db().await?;
            println!("✅ {} collection(s) prête(s)", n);
        }
        Commands::Read { query, params } => {
            let rows = conn.read(&query, &parse_params(&params)).await?;
            print_json(&Value::Array(rows.into_iter().map(Value::Object).collect()))?;
        }
        Commands::Insert { query, params } => {
            let id = conn.insert(&query, &parse_params(&params)).await?;
            print_json(&json!({ "id": id }))?;
        }
        Commands::Update { query, params } => {
            let n = conn.update(&query, &parse_params(&params)).await?;
            print_json(&json!({ "affected": n }))?;
        }
        Commands::Delete { query, params } => {
            let n = conn.delete(&query, &parse_params(&params)).await?;
            print_json(&json!({ "deleted": n }))?;
        }
        Commands::Explain { query, params } => {
            let descriptor = conn.explain(&query, &parse_params(&params))?;
            print_json(&serde_json::to_value(descriptor)?)?;
        }
        Commands::Surrogate { .. } => {}
    }

    conn.close().await?;
    Ok(())
}
