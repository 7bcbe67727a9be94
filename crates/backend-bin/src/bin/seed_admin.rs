//! Creates the first admin account. Safe to run repeatedly: an existing email
//! is left untouched.
use std::path::PathBuf;

use anyhow::bail;
use backend_lib::{
    auth::{hash_password_secure, validate_password_strength, PasswordRequirements},
    config::Settings,
    logging,
    storage::{AdminStore, NewAdmin, SqliteStore},
    validation::{normalize_email, validate_email},
};
use clap::Parser;
use tracing::{info, warn};
use zeroize::Zeroize;

#[derive(Parser)]
#[command(version, about = "Seed the initial admin account")]
struct Cli {
    /// Config file (defaults to ./config.toml if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Display name
    #[arg(long, env = "SEED_ADMIN_NAME", default_value = "Super Admin")]
    name: String,

    /// Login email
    #[arg(long, env = "SEED_ADMIN_EMAIL", default_value = "admin@vikasanafoundation.org")]
    email: String,

    /// Initial password, change it after first login
    #[arg(
        long,
        env = "SEED_ADMIN_PASSWORD",
        default_value = "ChangeMe@2025",
        hide_default_value = true,
        hide_env_values = true
    )]
    password: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let mut cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => Settings::load_from(path)?,
        None => Settings::load()?,
    };
    logging::init(&settings)?;

    validate_email(&cli.email)?;
    let email = normalize_email(&cli.email);

    if !validate_password_strength(&cli.password, &PasswordRequirements::default()) {
        cli.password.zeroize();
        bail!(
            "seed password must be at least {} characters with upper and lower case letters, a digit and a special character",
            PasswordRequirements::default().min_length
        );
    }

    let store = SqliteStore::connect(&settings.database_url).await?;

    if let Some(existing) = store.find_admin_by_email(&email).await? {
        cli.password.zeroize();
        warn!(id = existing.id, email = %existing.email, "admin already exists, no changes made");
        return Ok(());
    }

    let password_hash = hash_password_secure(&mut cli.password, settings.password_hash)?;
    let admin = store
        .insert_admin(NewAdmin {
            name: cli.name,
            email,
            password_hash,
        })
        .await?;

    info!(id = admin.id, name = %admin.name, email = %admin.email, "admin created");
    println!("Admin created: id={} email={}", admin.id, admin.email);
    println!("Log in with POST /api/auth/login and change the password after first login.");
    Ok(())
}
