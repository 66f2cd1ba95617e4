//! Identity token commands

use anyhow::{Result, anyhow};
use chrono::Utc;
use colored::Colorize;

use crate::identity::IdentityCodec;

pub fn mint(codec: &IdentityCodec, owner: Option<String>) -> Result<()> {
    let token = match owner {
        Some(owner) => codec.mint(&owner).map_err(|e| anyhow!(e))?,
        None => codec.mint_anonymous(),
    };

    println!("{} {}", "Owner:".bold(), token.owner_id.cyan());
    println!("{} {}", "Token:".bold(), token.value);
    Ok(())
}

pub fn verify(codec: &IdentityCodec, token: &str) -> Result<()> {
    let verified = codec
        .verify(token)
        .map_err(|e| anyhow!("Token rejected: {}", e))?;

    let issued = verified
        .issued_at_datetime()
        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| verified.issued_at.to_string());

    // 签名有效但超过有效期的令牌仍然可解析，只提示过期
    if codec.is_expired(&verified, Utc::now()) {
        println!(
            "{} Expired token for {} (issued {}, max age {} days)",
            "!".bold().yellow(),
            verified.owner_id.cyan(),
            issued.yellow(),
            codec.max_age().num_days()
        );
        return Ok(());
    }

    println!(
        "{} Valid token for {} (issued {})",
        "✓".bold().green(),
        verified.owner_id.cyan(),
        issued.yellow()
    );
    Ok(())
}
