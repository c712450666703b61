use anyhow::Context;
use chrono::{TimeDelta, Utc};
use crew_auth::{SecretKey, TokenIssuer};
use crew_config::CrewConfig;

use crate::cli::{IssueArgs, TokenCommands};

/// Handle `crewd token <subcommand>`.
pub fn handle(action: &TokenCommands, config: &CrewConfig) -> anyhow::Result<()> {
    match action {
        TokenCommands::Issue(args) => issue(args, config),
    }
}

fn issue(args: &IssueArgs, config: &CrewConfig) -> anyhow::Result<()> {
    let ttl = args.ttl_secs.unwrap_or(config.auth.token_ttl_secs);
    if ttl <= 0 {
        anyhow::bail!("--ttl-secs must be positive");
    }
    let ttl = TimeDelta::try_seconds(ttl).context("--ttl-secs is out of range")?;
    let key = SecretKey::from_bytes(&config.auth.secret_key_bytes()?)?;
    let valid_until = Utc::now() + ttl;
    let token = TokenIssuer::new(key)
        .issue(&args.user, &args.name, valid_until)
        .context("failed to issue token")?;
    println!("{}", token.to_wire()?);
    Ok(())
}
