//! Keystore admin CLI.
//!
//! # Responsibility
//! - Operate the user, token and OAuth config stores from a shell.
//! - Print records as JSON on stdout; diagnostics go to the log file.
//!
//! # Invariants
//! - Private keys and client secrets are redacted unless `--reveal` is set.

use clap::{Parser, Subcommand};
use keystore_core::db::open_db;
use keystore_core::{
    init_logging, CachedOAuthConfigRepository, DirectoryService, DirectoryUser, KeyPair,
    KeystoreConfig, OAuthConfig, OAuthConfigRepository, OAuthConfigService,
    SqliteOAuthConfigRepository, SqliteTokenRepository, SqliteUserRepository, Token,
};
use log::{error, info};
use serde::Serialize;
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

const REDACTED: &str = "<redacted>";

#[derive(Parser)]
#[command(name = "keystore", version, about = "Keystore admin CLI")]
struct Cli {
    /// Database file, overrides KEYSTORE_DB_PATH
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Print private keys and client secrets in clear text
    #[arg(long, global = true)]
    reveal: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Directory users
    #[command(subcommand)]
    Users(UsersCommand),
    /// Per-user key pairs
    #[command(subcommand)]
    Tokens(TokensCommand),
    /// OAuth client credentials
    #[command(subcommand)]
    Oauth(OauthCommand),
}

#[derive(Subcommand)]
enum UsersCommand {
    /// Batch-insert a JSON array of directory users
    Import { file: PathBuf },
    List,
    Count,
    Get { email: String },
    /// Delete a user and every key pair it owns
    Delete { email: String },
}

#[derive(Subcommand)]
enum TokensCommand {
    Add {
        email: String,
        #[arg(long)]
        public_key: String,
        #[arg(long)]
        private_key: String,
    },
    List {
        email: String,
    },
    Get {
        email: String,
        public_key: String,
    },
    Delete {
        email: String,
        public_key: String,
    },
}

#[derive(Subcommand)]
enum OauthCommand {
    Show,
    Set {
        client_id: String,
        client_secret: String,
    },
    /// Restore placeholder credentials
    Reset,
    /// Drop cached credentials
    Flush,
}

#[derive(Serialize)]
struct TokenView<'a> {
    user_id: &'a str,
    token_id: &'a str,
    public_key: &'a str,
    private_key: &'a str,
}

impl<'a> TokenView<'a> {
    fn new(token: &'a Token, reveal: bool) -> Self {
        Self {
            user_id: &token.key.user_id,
            token_id: &token.key.token_id,
            public_key: &token.public_key,
            private_key: if reveal {
                token.private_key.as_str()
            } else {
                REDACTED
            },
        }
    }
}

#[derive(Serialize)]
struct OAuthView<'a> {
    client_id: &'a str,
    client_secret: &'a str,
    configured: bool,
}

impl<'a> OAuthView<'a> {
    fn new(config: &'a OAuthConfig, reveal: bool) -> Self {
        Self {
            client_id: &config.client_id,
            client_secret: if reveal {
                config.client_secret.as_str()
            } else {
                REDACTED
            },
            configured: !config.is_placeholder(),
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("event=cli_command module=cli status=error error={err}");
            eprintln!("keystore: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let mut config = KeystoreConfig::from_env()?;
    if let Some(db) = cli.db {
        config.db_path = db;
    }
    if let Some(log_dir) = config.log_dir.as_deref() {
        init_logging(&config.log_level, log_dir)?;
    }

    let conn = open_db(&config.db_path)?;
    info!("event=cli_command module=cli status=start");

    match cli.command {
        Command::Users(command) => {
            let service = DirectoryService::new(
                SqliteUserRepository::try_new(&conn)?,
                SqliteTokenRepository::try_new(&conn)?,
            );
            run_users(&service, command)
        }
        Command::Tokens(command) => {
            let service = DirectoryService::new(
                SqliteUserRepository::try_new(&conn)?,
                SqliteTokenRepository::try_new(&conn)?,
            );
            run_tokens(&service, command, cli.reveal)
        }
        Command::Oauth(command) => {
            let repo = SqliteOAuthConfigRepository::try_new(&conn)?;
            if config.oauth_cache {
                let service = OAuthConfigService::new(CachedOAuthConfigRepository::new(repo));
                run_oauth(&service, command, cli.reveal)
            } else {
                run_oauth(&OAuthConfigService::new(repo), command, cli.reveal)
            }
        }
    }
}

type Directory<'conn> =
    DirectoryService<SqliteUserRepository<'conn>, SqliteTokenRepository<'conn>>;

fn run_users(service: &Directory<'_>, command: UsersCommand) -> Result<(), Box<dyn Error>> {
    match command {
        UsersCommand::Import { file } => {
            let payload = std::fs::read_to_string(&file)?;
            let users: Vec<DirectoryUser> = serde_json::from_str(&payload)?;
            let written = service.sync_users(&users)?;
            print_json(&serde_json::json!({ "imported": written }))
        }
        UsersCommand::List => print_json(&service.users()?),
        UsersCommand::Count => {
            print_json(&serde_json::json!({ "count": service.user_count()? }))
        }
        UsersCommand::Get { email } => print_json(&service.user(&email)?),
        UsersCommand::Delete { email } => {
            service.offboard_user(&email)?;
            print_json(&serde_json::json!({ "deleted": true }))
        }
    }
}

fn run_tokens(
    service: &Directory<'_>,
    command: TokensCommand,
    reveal: bool,
) -> Result<(), Box<dyn Error>> {
    match command {
        TokensCommand::Add {
            email,
            public_key,
            private_key,
        } => {
            let key = service.issue_key_pair(&email, &KeyPair::new(public_key, private_key))?;
            print_json(&key)
        }
        TokensCommand::List { email } => {
            let tokens = service.key_pairs(&email)?;
            let views: Vec<TokenView<'_>> = tokens
                .iter()
                .map(|token| TokenView::new(token, reveal))
                .collect();
            print_json(&views)
        }
        TokensCommand::Get { email, public_key } => {
            let (user, token) = service.key_pair(&email, &public_key)?;
            print_json(&serde_json::json!({
                "user": user,
                "token": token.as_ref().map(|token| TokenView::new(token, reveal)),
            }))
        }
        TokensCommand::Delete { email, public_key } => {
            service.revoke_key_pair(&email, &public_key)?;
            print_json(&serde_json::json!({ "deleted": true }))
        }
    }
}

fn run_oauth<R: OAuthConfigRepository>(
    service: &OAuthConfigService<R>,
    command: OauthCommand,
    reveal: bool,
) -> Result<(), Box<dyn Error>> {
    match command {
        OauthCommand::Show => {
            let config = service.credentials()?;
            print_json(&OAuthView::new(&config, reveal))
        }
        OauthCommand::Set {
            client_id,
            client_secret,
        } => {
            service.configure(&client_id, &client_secret)?;
            let config = service.credentials()?;
            print_json(&OAuthView::new(&config, reveal))
        }
        OauthCommand::Reset => {
            service.reset()?;
            let config = service.credentials()?;
            print_json(&OAuthView::new(&config, reveal))
        }
        OauthCommand::Flush => {
            service.flush()?;
            print_json(&serde_json::json!({ "flushed": true }))
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), Box<dyn Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
