//! Administrative commands for the guessword database.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

use game_core::WordListParser;
use game_persistence::connection::connect_and_migrate;
use game_persistence::repositories::{UserRepository, WordRepository};
use game_server::auth::AuthService;
use game_server::config::Config;

/// Manage admin accounts and the word list
#[derive(Parser, Debug)]
#[command(name = "word-admin")]
#[command(about = "Administrative tasks for the guessword server", long_about = None)]
struct Cli {
    /// Database URL, overriding DATABASE_URL
    #[arg(long)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create an admin account if it does not exist yet
    CreateAdmin {
        #[arg(long, default_value = "admin")]
        username: String,

        #[arg(long)]
        password: String,
    },

    /// Add words to the repository, skipping ones already stored
    SeedWords {
        /// Newline separated word list; the built-in list when omitted
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Print every stored word
    ListWords,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = Config::new()?;
    let database_url = cli.database_url.unwrap_or(config.database_url.clone());

    let db = connect_and_migrate(&database_url)
        .await
        .with_context(|| format!("Failed to open database at {}", database_url))?;

    match cli.command {
        Command::CreateAdmin { username, password } => {
            let users = Arc::new(UserRepository::new(db));
            if users.find_by_username(&username).await?.is_some() {
                println!("User '{}' already exists", username);
                return Ok(());
            }

            let auth = AuthService::new(
                users,
                &config.jwt_secret,
                chrono::Duration::minutes(config.token_ttl_minutes),
            );
            let admin = auth.create_admin(&username, &password).await?;
            println!("Created admin '{}' ({})", admin.username, admin.id);
        }
        Command::SeedWords { file } => {
            let words = match file {
                Some(path) => {
                    let contents = std::fs::read_to_string(&path)
                        .with_context(|| format!("Failed to read {}", path.display()))?;
                    WordListParser::parse(&contents)
                }
                None => WordListParser::defaults(),
            };

            let inserted = WordRepository::new(db).seed(&words).await?;
            info!(inserted, "Seeding finished");
            println!("Inserted {} of {} words", inserted, words.len());
        }
        Command::ListWords => {
            for word in WordRepository::new(db).list_all().await? {
                println!("{}\t{}", word.id, word.value);
            }
        }
    }

    Ok(())
}
