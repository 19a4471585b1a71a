//! Admin sign-in and the stored bearer token

use anyhow::{Context, Result, bail};
use chrono::Local;
use clap::Subcommand;
use colored::*;
use dialoguer::Input;

use crate::api::auth::login;
use crate::cli::context::AppContext;

#[derive(Debug, Subcommand)]
pub enum AuthCommands {
    /// Log in and store the admin token
    Login {
        /// Admin username (prompted when omitted)
        #[arg(short, long)]
        username: Option<String>,
    },
    /// Forget the stored token
    Logout,
    /// Show whether a token is stored
    Status,
}

pub async fn handle_auth_command(command: AuthCommands, backend_url: Option<String>) -> Result<()> {
    let ctx = AppContext::init(backend_url).await?;
    match command {
        AuthCommands::Login { username } => login_command(&ctx, username).await,
        AuthCommands::Logout => {
            ctx.session.sign_out().await?;
            println!("{} Logged out", "✓".green());
            Ok(())
        }
        AuthCommands::Status => status_command(&ctx).await,
    }
}

async fn login_command(ctx: &AppContext, username: Option<String>) -> Result<()> {
    let username = match username {
        Some(u) => u,
        None => Input::<String>::new()
            .with_prompt("Username")
            .interact_text()
            .context("Failed to read username")?,
    };
    let password = rpassword::prompt_password("Password: ").context("Failed to read password")?;

    if username.trim().is_empty() || password.is_empty() {
        bail!("Username and password are required");
    }

    let admin_url = ctx.config.admin_url();
    println!("Logging in to {}...", admin_url.dimmed());
    let token = login(&ctx.http, &admin_url, username.trim(), &password).await?;
    ctx.session.sign_in(&token).await?;

    println!("{} Logged in as {}", "✓".green(), username.trim().bold());
    Ok(())
}

async fn status_command(ctx: &AppContext) -> Result<()> {
    if !ctx.session.is_signed_in().await {
        println!("{} Not logged in", "✗".red());
        return Ok(());
    }

    match ctx.credentials.token_updated_at().await? {
        Some(at) => println!(
            "{} Logged in (token stored {})",
            "✓".green(),
            at.with_timezone(&Local).format("%Y-%m-%d %H:%M")
        ),
        None => println!("{} Logged in", "✓".green()),
    }
    Ok(())
}
