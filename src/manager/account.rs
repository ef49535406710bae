// Account operations - Login, Logout, Server

use anyhow::{Result, anyhow};

use crate::cli::{LoginArgs, ServerArgs};
use crate::config::Config;
use crate::manager::Session;
use crate::protocol::get_password;
use crate::utils::{OutputStyle, print_success};

pub async fn handle_login(session: &mut Session, args: &LoginArgs) -> Result<()> {
    let password = args
        .password
        .clone()
        .or_else(get_password)
        .ok_or_else(|| anyhow!("No password given. Use --password or set TMC_PASSWORD."))?;

    let accepted = session.core.login(&args.username, &password)?.await?;
    if !accepted {
        return Err(anyhow!("Server rejected the credentials for '{}'", args.username));
    }

    remember_account(&mut session.config, &args.username);
    session.save_config()?;

    print_success(&format!("Logged in as {}", args.username));
    Ok(())
}

pub async fn handle_logout(session: &mut Session) -> Result<()> {
    session.core.logout()?.await?;

    session.config.server.username = None;
    session.config.server.password = None;
    session.save_config()?;

    print_success("Logged out");
    Ok(())
}

pub async fn handle_server(session: &mut Session, args: &ServerArgs) -> Result<()> {
    session.core.select_server(&args.url)?.await?;

    session.config.server.url = args.url.clone();
    session.save_config()?;

    println!("🌐 Server set to {}", OutputStyle::url(&args.url));
    Ok(())
}

/// Keep the username for later runs; the password is never written to disk
fn remember_account(config: &mut Config, username: &str) {
    config.server.username = Some(username.to_string());
    config.server.password = None;
}
