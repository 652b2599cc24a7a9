//! CLI tool to manage API keys.
//!
//! Usage:
//!   cargo run --bin manage-api-keys -- list
//!   cargo run --bin manage-api-keys -- create --name <name> --user <user-id> [--expires <365d>]
//!   cargo run --bin manage-api-keys -- revoke --id <key-id>

use std::env;

use servicedesk_lib::config::Config;
use servicedesk_lib::db::DbPool;
use servicedesk_lib::models::ApiKeyListItem;
use servicedesk_lib::services::api_key;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_usage();
        std::process::exit(1);
    }

    let command = &args[1];

    if matches!(command.as_str(), "help" | "--help" | "-h") {
        print_usage();
        return;
    }

    // Initialize database
    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            std::process::exit(1);
        }
    };

    let pool = match DbPool::new(&config).await {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error connecting to database: {}", e);
            std::process::exit(1);
        }
    };

    match command.as_str() {
        "list" | "ls" => list_keys(&pool).await,
        "create" => {
            let name = parse_arg(&args, "--name", "-n");
            let user_id = parse_arg(&args, "--user", "-u")
                .parse::<i64>()
                .unwrap_or_else(|_| {
                    eprintln!("Error: --user must be a numeric user id");
                    std::process::exit(1);
                });
            let expires = try_parse_arg(&args, "--expires", "-e");
            create_key(&pool, &name, user_id, expires.as_deref()).await;
        }
        "revoke" => {
            let id = parse_arg(&args, "--id", "-i");
            revoke_key(&pool, &id).await;
        }
        _ => {
            eprintln!("Unknown command: {}", command);
            print_usage();
            std::process::exit(1);
        }
    }
}

fn try_parse_arg(args: &[String], long: &str, short: &str) -> Option<String> {
    let mut i = 2;
    while i < args.len() {
        if (args[i] == long || args[i] == short) && i + 1 < args.len() {
            return Some(args[i + 1].clone());
        }
        i += 1;
    }
    None
}

fn parse_arg(args: &[String], long: &str, short: &str) -> String {
    try_parse_arg(args, long, short).unwrap_or_else(|| {
        eprintln!("Error: {} is required", long);
        std::process::exit(1);
    })
}

async fn create_key(pool: &DbPool, name: &str, user_id: i64, expires_in: Option<&str>) {
    match api_key::create_key(pool, name, user_id, expires_in).await {
        Ok((full_key, key)) => {
            println!();
            println!("API key created:");
            println!("  ID:      {}", key.id);
            println!("  Name:    {}", key.name);
            println!("  User:    {}", key.user_id);
            if let Some(expires_at) = key.expires_at {
                println!("  Expires: {}", expires_at.to_rfc3339());
            }
            println!();
            println!("  Key:     {}", full_key);
            println!();
            println!("Store the key now - it cannot be shown again.");
        }
        Err(e) => {
            eprintln!("Error creating key: {}", e);
            std::process::exit(1);
        }
    }
}

async fn list_keys(pool: &DbPool) {
    let keys = match pool.list_api_keys().await {
        Ok(k) => k,
        Err(e) => {
            eprintln!("Error listing keys: {}", e);
            std::process::exit(1);
        }
    };

    if keys.is_empty() {
        println!("No API keys found.");
        return;
    }

    println!();
    println!(
        "{:<36} {:<12} {:<20} {:<8} {:<10}",
        "ID", "PREFIX", "NAME", "USER", "STATUS"
    );
    println!("{}", "─".repeat(90));

    for key in keys {
        let item = ApiKeyListItem::from(key);
        let status = if item.is_revoked { "revoked" } else { "active" };

        // Truncate name if too long
        let name = if item.name.len() > 18 {
            format!("{}...", &item.name[..15])
        } else {
            item.name.clone()
        };

        println!(
            "{:<36} {:<12} {:<20} {:<8} {:<10}",
            item.id, item.key_prefix, name, item.user_id, status
        );
    }
    println!();
}

async fn revoke_key(pool: &DbPool, id: &str) {
    match pool.revoke_api_key(id).await {
        Ok(true) => {
            println!("API key {} revoked successfully.", id);
        }
        Ok(false) => {
            eprintln!("API key {} not found or already revoked.", id);
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("Error revoking key: {}", e);
            std::process::exit(1);
        }
    }
}

fn print_usage() {
    eprintln!();
    eprintln!("Usage: manage-api-keys <command> [options]");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  list, ls                                    List all API keys");
    eprintln!("  create --name <name> --user <id> [--expires <dur>]  Create a key for a user");
    eprintln!("  revoke --id <id>                            Revoke an API key");
    eprintln!("  help                                        Show this help");
    eprintln!();
    eprintln!("Examples:");
    eprintln!("  manage-api-keys list");
    eprintln!("  manage-api-keys create --name \"Mobile - J. Mertens\" --user 42 --expires 365d");
    eprintln!("  manage-api-keys revoke --id 550e8400-e29b-41d4-a716-446655440000");
    eprintln!();
}
