use chrono::{Duration, Utc};
use serde::Serialize;

use crate::auth::TokenGenerator;
use crate::store::Store;
use crate::types::Token;

use super::init_store;
use super::prompt::{confirm_action, format_relative_time};

const LIST_PAGE_SIZE: i32 = 100;

#[derive(Serialize)]
struct TokenOutput {
    id: String,
    lookup: String,
    user_id: Option<String>,
    is_admin: bool,
    created_at: String,
    expires_at: Option<String>,
    last_used_at: Option<String>,
}

impl From<&Token> for TokenOutput {
    fn from(token: &Token) -> Self {
        Self {
            id: token.id.clone(),
            lookup: token.token_lookup.clone(),
            user_id: token.user_id.clone(),
            is_admin: token.is_admin,
            created_at: token.created_at.to_rfc3339(),
            expires_at: token.expires_at.map(|dt| dt.to_rfc3339()),
            last_used_at: token.last_used_at.map(|dt| dt.to_rfc3339()),
        }
    }
}

fn role(token: &Token) -> &str {
    if token.is_admin {
        "operator"
    } else {
        token.user_id.as_deref().unwrap_or("anonymous reader")
    }
}

fn all_tokens(store: &dyn Store) -> anyhow::Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut cursor = String::new();
    loop {
        let page = store.list_tokens(&cursor, LIST_PAGE_SIZE)?;
        let done = page.len() < LIST_PAGE_SIZE as usize;
        if let Some(last) = page.last() {
            cursor = last.id.clone();
        }
        tokens.extend(page);
        if done {
            return Ok(tokens);
        }
    }
}

pub fn run_token_create(
    data_dir: String,
    user_id: Option<String>,
    admin: bool,
    expires_days: Option<i64>,
    json: bool,
) -> anyhow::Result<()> {
    let store = init_store(&data_dir)?;

    let expires_at = match expires_days {
        Some(days) if days <= 0 => anyhow::bail!("--expires-days must be positive"),
        Some(days) => {
            let at = Duration::try_days(days).and_then(|ttl| Utc::now().checked_add_signed(ttl));
            match at {
                Some(at) => Some(at),
                None => anyhow::bail!("--expires-days is out of range"),
            }
        }
        None => None,
    };

    let (token, raw_token) = TokenGenerator::new().issue(admin, user_id, expires_at)?;
    store.create_token(&token)?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "token": raw_token,
                "metadata": TokenOutput::from(&token),
            }))?
        );
        return Ok(());
    }

    println!();
    println!("Token created ({}): {}", role(&token), raw_token);
    println!("  Save this now - it cannot be retrieved later.");
    println!();

    Ok(())
}

pub fn run_token_list(data_dir: String, json: bool) -> anyhow::Result<()> {
    let store = init_store(&data_dir)?;
    let tokens = all_tokens(&store)?;

    if json {
        let output: Vec<TokenOutput> = tokens.iter().map(TokenOutput::from).collect();
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    if tokens.is_empty() {
        println!("No tokens found.");
        return Ok(());
    }

    println!();
    for token in &tokens {
        let last_used = token
            .last_used_at
            .as_ref()
            .map_or_else(|| "never used".to_string(), format_relative_time);
        println!(
            "  {}  herald_{}...  {}  created {}  {}",
            token.id,
            token.token_lookup,
            role(token),
            format_relative_time(&token.created_at),
            last_used
        );
    }
    println!();

    Ok(())
}

pub fn run_token_revoke(
    data_dir: String,
    token_id: String,
    yes: bool,
    non_interactive: bool,
) -> anyhow::Result<()> {
    let store = init_store(&data_dir)?;

    let token = store
        .get_token_by_id(&token_id)?
        .ok_or_else(|| anyhow::anyhow!("Token not found: {}", token_id))?;

    let confirmed = confirm_action(
        &format!(
            "Revoke token herald_{}... ({})?",
            &token.token_lookup,
            role(&token)
        ),
        yes,
        non_interactive,
    )?;

    if !confirmed {
        println!("Cancelled.");
        return Ok(());
    }

    store.delete_token(&token.id)?;

    println!("Token revoked.");

    Ok(())
}
