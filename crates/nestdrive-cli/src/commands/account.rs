//! Account commands: register, login, logout, whoami.

use clap::Args;

use nestdrive_core::error::AppError;
use nestdrive_core::result::AppResult;

use super::Workspace;
use crate::output::{self, OutputFormat};

/// Email and password, prompted for when omitted
#[derive(Debug, Args)]
pub struct CredentialArgs {
    /// Account email
    #[arg(short, long)]
    pub email: Option<String>,
    /// Account password (prompted when omitted)
    #[arg(short, long)]
    pub password: Option<String>,
}

fn email(args: &CredentialArgs) -> AppResult<String> {
    match &args.email {
        Some(e) => Ok(e.clone()),
        None => dialoguer::Input::new()
            .with_prompt("Email")
            .interact_text()
            .map_err(|e| AppError::internal(format!("Input error: {e}"))),
    }
}

fn password(args: &CredentialArgs, confirm: bool) -> AppResult<String> {
    if let Some(p) = &args.password {
        return Ok(p.clone());
    }
    let mut prompt = dialoguer::Password::new().with_prompt("Password");
    if confirm {
        prompt = prompt.with_confirmation("Confirm password", "Passwords do not match");
    }
    prompt
        .interact()
        .map_err(|e| AppError::internal(format!("Input error: {e}")))
}

/// Create an account and sign in.
pub async fn register(ws: &Workspace, args: &CredentialArgs) -> AppResult<()> {
    let email = email(args)?;
    let password = password(args, true)?;
    let ctx = ws.session.sign_up(&email, &password).await?;
    output::print_success(&format!("Registered and signed in as {email} ({})", ctx.owner_id));
    Ok(())
}

/// Sign in.
pub async fn login(ws: &Workspace, args: &CredentialArgs) -> AppResult<()> {
    let email = email(args)?;
    let password = password(args, false)?;
    let ctx = ws.session.sign_in(&email, &password).await?;
    output::print_success(&format!("Signed in as {email} ({})", ctx.owner_id));
    Ok(())
}

/// Sign out.
pub async fn logout(ws: &Workspace) -> AppResult<()> {
    if ws.session.session().is_none() {
        output::print_warning("Not signed in");
        return Ok(());
    }
    ws.session.sign_out().await?;
    output::print_success("Signed out");
    Ok(())
}

/// Show the signed-in account.
pub fn whoami(ws: &Workspace, format: OutputFormat) -> AppResult<()> {
    let session = ws
        .session
        .session()
        .ok_or_else(|| AppError::authentication("Not signed in"))?;
    match format {
        OutputFormat::Json => output::print_json(&session),
        OutputFormat::Table => {
            output::print_kv("Email", &session.email);
            output::print_kv("User id", session.uid.as_str());
            output::print_kv(
                "Signed in",
                &session.signed_in_at.format("%Y-%m-%d %H:%M").to_string(),
            );
        }
    }
    Ok(())
}
