//! ds-cli - command line interface to the creatordev.io device server
//!
//! Manages organisation access keys. Commands other than `admin-token`
//! authenticate with the key/secret stored in the credentials file, which
//! the hidden `create-org` command writes.

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use secrecy::SecretString;

mod commands;
mod config;
mod credentials;
mod display;

use config::{FileConfig, Settings};

#[derive(Parser, Debug)]
#[command(name = "ds-cli", author, version, about = "CLI interface to creatordev.io deviceserver")]
struct Args {
    /// Device server entry point [default: https://deviceserver.creatordev.io]
    #[arg(short = 'u', long, env = "DEVICESERVER_URL", global = true)]
    deviceserver_url: Option<String>,

    /// Credentials file [default: ~/.ds-cli]
    #[arg(short, long, env = "CREDENTIALS_FILE", global = true)]
    credentials: Option<String>,

    /// Config file [default: ~/.config/ds-cli/config.toml]
    #[arg(long, global = true)]
    config: Option<std::path::PathBuf>,

    /// Log HTTP traffic
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a new key/secret
    #[command(visible_alias = "ck")]
    CreateKey {
        /// Name of the new key
        name: String,
    },

    /// Lists the known access keys
    #[command(visible_alias = "lk")]
    ListKeys,

    /// Delete the specified key
    #[command(visible_alias = "dk")]
    DeleteKey {
        /// The key's "self" URL, as printed by list-keys
        self_url: String,
    },

    /// Uses the PSK to generate a JWT access token for admin purposes
    #[command(hide = true)]
    AdminToken(AdminArgs),

    /// Uses the PSK to create a new organisation key/secret and stores it as
    /// the credentials. An org id of zero allocates a new organisation.
    #[command(hide = true)]
    CreateOrg {
        /// Name of the new key
        name: String,

        #[command(flatten)]
        admin: AdminArgs,
    },
}

#[derive(clap::Args, Debug)]
struct AdminArgs {
    /// Organisation id
    #[arg(long, default_value_t = 0)]
    org_id: i64,

    /// Pre-shared key
    #[arg(long, env = "DEVICESERVER_PSK", hide_env_values = true)]
    psk: String,
}

impl AdminArgs {
    fn psk(&self) -> SecretString {
        SecretString::from(self.psk.clone())
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}

async fn run(args: Args) -> Result<()> {
    let file_path = args.config.clone().or_else(FileConfig::default_path);
    let file = match &file_path {
        Some(path) => FileConfig::load(path)?,
        None => FileConfig::default(),
    };
    let settings = Settings::resolve(args.deviceserver_url, args.credentials, file);
    log::debug!("Using {settings:?}");

    match args.command {
        Command::CreateKey { name } => commands::create_key(&settings, &name).await,
        Command::ListKeys => commands::list_keys(&settings).await,
        Command::DeleteKey { self_url } => commands::delete_key(&settings, &self_url).await,
        Command::AdminToken(admin) => {
            commands::admin_token(&mut std::io::stdout(), &admin.psk(), admin.org_id)
        }
        Command::CreateOrg { name, admin } => {
            commands::create_org(&settings, &name, &admin.psk(), admin.org_id).await
        }
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    if let Err(e) = run(args).await {
        eprintln!("{} {e:#}", "Error:".bright_red());
        std::process::exit(1);
    }
}
