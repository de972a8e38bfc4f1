use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "spark-verify",
    version,
    about = "Verify signed Vault Spark notifications"
)]
pub struct Cli {
    /// Certificate store root (overrides SPARK_VERIFY_CERT_DIR)
    #[arg(long, global = true)]
    pub cert_dir: Option<PathBuf>,

    /// Vault host (overrides VAULT_HOSTNAME)
    #[arg(long, global = true)]
    pub host: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print the canonical string-to-verify of a captured request
    Canonicalize(CanonicalizeArgs),
    /// Run the full verification pipeline on a captured request
    Validate(ValidateArgs),
    /// Resolve a signing certificate through the local store
    FetchCert(FetchCertArgs),
}

#[derive(Args, Clone)]
pub struct CanonicalizeArgs {
    /// Request file: {"headers": {...}, "body": "...", "url": "..."}
    pub request: PathBuf,
}

#[derive(Args, Clone)]
pub struct ValidateArgs {
    /// Request file: {"headers": {...}, "body": "...", "url": "..."}
    pub request: PathBuf,

    /// Write verified bodies into this directory
    #[arg(long)]
    pub spool_dir: Option<PathBuf>,
}

#[derive(Args, Clone)]
pub struct FetchCertArgs {
    /// Certificate identifier
    pub id: String,
}
