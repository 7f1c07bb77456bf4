//! CLI administration tool for customs-docs.
//!
//! Provides commands for managing API tokens, loading the HTS reference
//! table, and enriching documents offline without going through the HTTP API.
//!
//! # Usage
//!
//! ```bash
//! # Create a new API token
//! cargo run --bin admin -- token create
//!
//! # List all tokens
//! cargo run --bin admin -- token list
//!
//! # Revoke a token
//! cargo run --bin admin -- token revoke "acme-imports"
//!
//! # Load the USITC htsdata.json export
//! cargo run --bin admin -- hts import htsdata.json
//!
//! # Resolve a code
//! cargo run --bin admin -- hts lookup 8471.30.0100
//!
//! # Enrich an extracted document file
//! cargo run --bin admin -- enrich invoice.json --output invoice.enriched.json
//!
//! # Check database connection
//! cargo run --bin admin -- db check
//! ```
//!
//! # Environment Variables
//!
//! The same variables as the server; see [`customs_docs::config`].

use customs_docs::application::services::auth_service::hash_token;
use customs_docs::application::services::{DutyCalculator, EnrichmentService, HtsService};
use customs_docs::config::{self, Config};
use customs_docs::domain::entities::{ExtractedDocument, HtsSourceEntry};
use customs_docs::domain::repositories::TokenRepository;
use customs_docs::infrastructure::persistence::{PgHtsRepository, PgTokenRepository};
use customs_docs::server;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::{Confirm, Input};
use serde_json::Value;
use sqlx::PgPool;
use std::path::PathBuf;
use std::sync::Arc;

/// CLI tool for managing customs-docs.
#[derive(Parser)]
#[command(name = "admin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Top-level command groups.
#[derive(Subcommand)]
enum Commands {
    /// Manage API tokens
    Token {
        #[command(subcommand)]
        action: TokenAction,
    },

    /// Manage the HTS reference table
    Hts {
        #[command(subcommand)]
        action: HtsAction,
    },

    /// Enrich an extracted document file with Incoterm details and duties
    Enrich {
        /// JSON file holding the document, flat or under `extractedData`
        file: PathBuf,

        /// Write the enriched document here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Database operations
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
}

/// Token management subcommands.
#[derive(Subcommand)]
enum TokenAction {
    /// Create a new API token
    Create {
        /// Token name; also the owner id of documents stored with it
        #[arg(short, long)]
        name: Option<String>,

        /// Custom token value (optional, auto-generated if not provided)
        #[arg(short, long)]
        token: Option<String>,

        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// List all tokens
    List,

    /// Revoke a token
    Revoke {
        /// Token name or ID to revoke
        name_or_id: String,
    },
}

/// HTS reference subcommands.
#[derive(Subcommand)]
enum HtsAction {
    /// Import a USITC `htsdata.json` export
    Import {
        file: PathBuf,
    },

    /// Resolve an HTS code and show its rates
    Lookup {
        code: String,
    },
}

/// Database operation subcommands.
#[derive(Subcommand)]
enum DbAction {
    /// Check database connection
    Check,

    /// Show database info
    Info,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config = config::load_from_env().context("Invalid configuration")?;
    let pool = server::connect_pool(&config).await?;

    match cli.command {
        Commands::Token { action } => handle_token_action(action, &config, &pool).await?,
        Commands::Hts { action } => handle_hts_action(action, &pool).await?,
        Commands::Enrich { file, output } => enrich_file(&config, &pool, file, output).await?,
        Commands::Db { action } => handle_db_action(action, &pool).await?,
    }

    Ok(())
}

/// Dispatches token management commands.
async fn handle_token_action(action: TokenAction, config: &Config, pool: &PgPool) -> Result<()> {
    let repo = Arc::new(PgTokenRepository::new(Arc::new(pool.clone())));

    match action {
        TokenAction::Create { name, token, yes } => {
            create_token(repo, &config.token_signing_secret, name, token, yes).await?;
        }
        TokenAction::List => {
            list_tokens(repo).await?;
        }
        TokenAction::Revoke { name_or_id } => {
            revoke_token(repo, name_or_id).await?;
        }
    }

    Ok(())
}

/// Creates a new API token with interactive prompts.
///
/// Only the HMAC-SHA256 hash keyed by `TOKEN_SIGNING_SECRET` is stored; the
/// raw token is shown once.
async fn create_token(
    repo: Arc<PgTokenRepository>,
    signing_secret: &str,
    name: Option<String>,
    token: Option<String>,
    skip_confirm: bool,
) -> Result<()> {
    println!("{}", "🔑 Create API Token".bright_blue().bold());
    println!();

    let token_name = match name {
        Some(n) => n,
        None => Input::new()
            .with_prompt("Token name (document owner)")
            .interact_text()?,
    };

    let token_value = match token {
        Some(t) => {
            println!("{}", "⚠️  Using provided token value".yellow());
            t
        }
        None => {
            let generated = generate_token();
            println!("{}", "✨ Generated new token".green());
            generated
        }
    };

    println!();
    println!("{}", "Token details:".bright_white().bold());
    println!("  Name:  {}", token_name.cyan());
    println!("  Token: {}", token_value.bright_yellow().bold());
    println!();
    println!(
        "{}",
        "⚠️  IMPORTANT: Save this token now! You won't be able to see it again."
            .red()
            .bold()
    );
    println!();

    if !skip_confirm {
        let confirmed = Confirm::new()
            .with_prompt("Create this token?")
            .default(true)
            .interact()?;

        if !confirmed {
            println!("{}", "❌ Cancelled".red());
            return Ok(());
        }
    }

    let token_hash = hash_token(signing_secret, &token_value);

    repo.create(&token_name, &token_hash)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create token: {}", e))?;

    println!();
    println!("{}", "✅ Token created successfully!".green().bold());
    println!();
    println!("{}", "Example:".bright_white());
    println!(
        "  curl -H \"Authorization: Bearer {}\" http://localhost:3000/api/incoterms",
        token_value.bright_yellow()
    );
    println!();

    Ok(())
}

/// Lists all API tokens with status indicators.
async fn list_tokens(repo: Arc<PgTokenRepository>) -> Result<()> {
    println!("{}", "📋 API Tokens".bright_blue().bold());
    println!();

    let tokens = repo
        .list()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to list tokens: {}", e))?;

    if tokens.is_empty() {
        println!("{}", "  No tokens found".yellow());
        println!();
        println!(
            "  Create one with: {} admin token create",
            "cargo run --bin".bright_cyan()
        );
        return Ok(());
    }

    println!(
        "  {:<4} {:<30} {:<18} {:<18} {:<8}",
        "ID".bright_white().bold(),
        "Name".bright_white().bold(),
        "Created".bright_white().bold(),
        "Last used".bright_white().bold(),
        "Status".bright_white().bold()
    );
    println!("  {}", "─".repeat(84).bright_black());

    for token in &tokens {
        let status = if token.revoked_at.is_some() {
            "REVOKED".red()
        } else {
            "ACTIVE".green()
        };
        let last_used = token
            .last_used_at
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "never".to_string());

        println!(
            "  {:<4} {:<30} {:<18} {:<18} {}",
            token.id.to_string().bright_black(),
            token.name.cyan(),
            token
                .created_at
                .format("%Y-%m-%d %H:%M")
                .to_string()
                .bright_black(),
            last_used.bright_black(),
            status
        );
    }

    println!();
    println!(
        "  Total: {}",
        tokens.len().to_string().bright_white().bold()
    );
    println!();

    Ok(())
}

/// Revokes a token by name or ID with confirmation prompt.
///
/// Numeric input is looked up as an ID, anything else by exact name.
async fn revoke_token(repo: Arc<PgTokenRepository>, name_or_id: String) -> Result<()> {
    println!("{}", "🔒 Revoke API Token".bright_blue().bold());
    println!();

    let token = match name_or_id.parse::<i64>() {
        Ok(id) => repo.find_by_id(id).await,
        Err(_) => repo.find_by_name(&name_or_id).await,
    }
    .map_err(|e| anyhow::anyhow!("Database error: {}", e))?
    .context("Token not found")?;

    if token.revoked_at.is_some() {
        println!("{}", "⚠️  This token is already revoked".yellow());
        return Ok(());
    }

    println!("  Token: {}", token.name.cyan());
    println!("  ID:    {}", token.id.to_string().bright_black());
    println!();

    let confirmed = Confirm::new()
        .with_prompt("Revoke this token?")
        .default(false)
        .interact()?;

    if !confirmed {
        println!("{}", "❌ Cancelled".red());
        return Ok(());
    }

    repo.revoke(token.id)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to revoke token: {}", e))?;

    println!();
    println!("{}", "✅ Token revoked successfully!".green().bold());
    println!();

    Ok(())
}

/// Dispatches HTS reference commands.
async fn handle_hts_action(action: HtsAction, pool: &PgPool) -> Result<()> {
    let service = HtsService::new(Arc::new(PgHtsRepository::new(Arc::new(pool.clone()))));

    match action {
        HtsAction::Import { file } => {
            println!(
                "{} {}",
                "📥 Importing".bright_blue().bold(),
                file.display().to_string().cyan()
            );

            let raw = tokio::fs::read_to_string(&file)
                .await
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let entries: Vec<HtsSourceEntry> =
                serde_json::from_str(&raw).context("File is not an HTS JSON export")?;

            let total = entries.len();
            let rows: Vec<_> = entries
                .into_iter()
                .filter_map(HtsSourceEntry::into_row)
                .collect();
            println!(
                "  Entries: {}, with HTS number: {}",
                total.to_string().bright_white(),
                rows.len().to_string().bright_white()
            );

            let written = service
                .import(rows)
                .await
                .map_err(|e| anyhow::anyhow!("Import failed: {}", e))?;
            let count = service
                .count()
                .await
                .map_err(|e| anyhow::anyhow!("Database error: {}", e))?;

            println!();
            println!(
                "{} {} rows written, {} codes in table",
                "✅".green(),
                written.to_string().bright_green().bold(),
                count.to_string().bright_white()
            );
        }
        HtsAction::Lookup { code } => {
            let record = service
                .find_hts_code(&code)
                .await
                .map_err(|e| anyhow::anyhow!("Database error: {}", e))?;

            match record {
                Some(record) => {
                    println!("{}", record.hts_number.bright_green().bold());
                    println!("  {}", record.description);
                    println!();
                    let show = |label: &str, rate: &Option<String>| {
                        println!(
                            "  {:<10} {}",
                            label.bright_white(),
                            rate.as_deref().unwrap_or("-")
                        );
                    };
                    show("General", &record.general_rate_of_duty);
                    show("Special", &record.special_rate_of_duty);
                    show("Column 2", &record.column_2_rate_of_duty);
                    show("Additional", &record.additional_duties);
                    println!();
                    println!(
                        "  Selected: {} ({})",
                        record.selected_rate.as_deref().unwrap_or("none").yellow(),
                        record
                            .selected_rate_type
                            .map(|t| t.as_str())
                            .unwrap_or("-")
                    );
                }
                None => println!("{} No HTS record for {}", "❌".red(), code.cyan()),
            }
        }
    }

    Ok(())
}

/// Enriches a document file with the configured interpreter.
async fn enrich_file(
    config: &Config,
    pool: &PgPool,
    file: PathBuf,
    output: Option<PathBuf>,
) -> Result<()> {
    let raw = tokio::fs::read_to_string(&file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let mut payload: Value = serde_json::from_str(&raw).context("File is not JSON")?;

    let nested = payload.get("extractedData").is_some_and(Value::is_object);
    let data = if nested {
        payload["extractedData"].take()
    } else {
        payload.take()
    };
    let mut document: ExtractedDocument =
        serde_json::from_value(data).context("File does not hold an extracted document")?;

    let interpreter = server::build_interpreter(config)?;
    eprintln!(
        "{} with {}",
        "🧮 Enriching".bright_blue().bold(),
        interpreter.name().cyan()
    );

    let hts_service = Arc::new(HtsService::new(Arc::new(PgHtsRepository::new(Arc::new(
        pool.clone(),
    )))));
    let calculator = Arc::new(DutyCalculator::new(interpreter, config.reasoning_timeout()));
    let enrichment = EnrichmentService::new(hts_service, calculator, config.duty_concurrency);

    let report = enrichment
        .enrich(&mut document)
        .await
        .map_err(|e| anyhow::anyhow!("Enrichment failed: {}", e))?;

    eprintln!(
        "  Incoterm: {} ({})",
        report.incoterm_code.bright_white().bold(),
        report.incoterm_source.as_str()
    );
    eprintln!("  Stage:    {}", serde_json::to_string(&report.stage)?);
    eprintln!(
        "  Items:    {} attempted, {} priced, {} failed, {} unmatched",
        report.attempted,
        report.succeeded.to_string().green(),
        report.failed.to_string().red(),
        report.unmatched.to_string().yellow()
    );
    if let Some(total) = &document.total_duties {
        eprintln!("  Total:    {}", serde_json::to_string(total)?.bright_green());
    }

    let enriched = serde_json::to_value(&document)?;
    let result = if nested {
        payload["extractedData"] = enriched;
        payload
    } else {
        enriched
    };
    let text = serde_json::to_string_pretty(&result)?;

    match output {
        Some(path) => {
            tokio::fs::write(&path, text)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!("{} Wrote {}", "✅".green(), path.display());
        }
        None => println!("{text}"),
    }

    Ok(())
}

/// Handles database diagnostic commands.
async fn handle_db_action(action: DbAction, pool: &PgPool) -> Result<()> {
    match action {
        DbAction::Check => {
            println!("{}", "🔍 Checking database connection...".bright_blue());

            sqlx::query("SELECT 1").fetch_one(pool).await?;

            println!("{}", "✅ Database connection OK".green().bold());
        }
        DbAction::Info => {
            println!("{}", "ℹ️  Database Information".bright_blue().bold());
            println!();

            let version: String = sqlx::query_scalar("SELECT version()")
                .fetch_one(pool)
                .await?;
            let hts_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM hts_codes")
                .fetch_one(pool)
                .await?;
            let document_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM documents")
                .fetch_one(pool)
                .await?;
            let token_count: i64 =
                sqlx::query_scalar("SELECT COUNT(*) FROM api_tokens WHERE revoked_at IS NULL")
                    .fetch_one(pool)
                    .await?;

            println!("  PostgreSQL:    {}", version.bright_white());
            println!("  HTS codes:     {}", hts_count.to_string().bright_green());
            println!("  Documents:     {}", document_count.to_string().bright_green());
            println!("  Active tokens: {}", token_count.to_string().bright_green());
            println!();
        }
    }

    Ok(())
}

/// Generates a cryptographically random token.
///
/// 48 alphanumeric characters, about 286 bits of entropy.
fn generate_token() -> String {
    use rand::Rng;
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
    const TOKEN_LEN: usize = 48;

    let mut rng = rand::rng();

    (0..TOKEN_LEN)
        .map(|_| {
            let idx = rng.random_range(0..CHARSET.len());
            CHARSET[idx] as char
        })
        .collect()
}
