use anyhow::{bail, Context, Result};
use clap::builder::styling::AnsiColor;
use clap::builder::Styles;
use clap::{Parser, Subcommand};
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Table};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::{self, OpenOptions};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info};
use tracing_subscriber::{fmt::writer::BoxMakeWriter, EnvFilter};

mod account;
mod config;
mod icons;
mod theme;
mod tui;
mod unlock;
mod wallet;

use account::store::{AccountProfile, AccountStore};
use account::{Account, AccountState, Address, FixedAccount};
use config::AppConfig;
use icons::Icons;
use tui::UnlockApp;
use unlock::{AccountUnlock, UnlockError, UnlockOutcome};
use wallet::RpcWallet;

#[derive(Parser)]
#[command(name = "account-unlock")]
#[command(author, version)]
#[command(about = "Unlock the active wallet account on your node")]
#[command(long_about = None)]
#[command(after_help = format!("\n{}\n  {} {}\n  {} {}\n  {} {}\n\n{}\n  {}\n  {}\n",
    "GETTING STARTED:".bright_magenta().bold(),
    "1.".bright_cyan(), "account-unlock config --rpc-url http://127.0.0.1:8545".bright_white(),
    "2.".bright_cyan(), "account-unlock account add --name main --address Z20d2...".bright_white(),
    "3.".bright_cyan(), "account-unlock unlock".bright_white(),
    "EXAMPLES:".bright_magenta().bold(),
    "account-unlock unlock --plain        # Prompt in the terminal instead of the card".dimmed(),
    "account-unlock account list          # Show saved accounts".dimmed(),
))]
#[command(styles = cli_styles())]
struct Cli {
    /// Node JSON-RPC endpoint (overrides the configured one)
    #[arg(long)]
    rpc_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the unlock card for the active account
    Unlock {
        /// Unlock this saved account instead of the active one
        #[arg(long, conflicts_with = "address")]
        account: Option<String>,

        /// Unlock this address without saving it
        #[arg(long)]
        address: Option<String>,

        /// Prompt on the terminal instead of opening the card
        #[arg(long)]
        plain: bool,
    },

    /// Manage saved accounts
    Account {
        #[command(subcommand)]
        action: AccountCommand,
    },

    /// Configure node settings
    Config {
        /// Set the node JSON-RPC endpoint
        #[arg(long)]
        rpc_url: Option<String>,

        /// Seconds the node keeps the account unlocked
        #[arg(long)]
        duration: Option<u64>,

        /// Request timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
}

#[derive(Subcommand)]
enum AccountCommand {
    /// Save an account
    Add {
        #[arg(long)]
        name: String,

        /// Account address (`Z` or `0x` followed by 40 hex digits)
        #[arg(long)]
        address: String,

        #[arg(long)]
        description: Option<String>,
    },

    /// Make a saved account active
    Use { name: String },

    /// List saved accounts
    List,

    /// Forget a saved account
    Remove { name: String },

    /// Show the active account
    Show,
}

fn cli_styles() -> Styles {
    let accent = AnsiColor::BrightCyan.on_default();
    Styles::styled()
        .header(accent.bold().underline())
        .usage(accent.bold())
        .literal(AnsiColor::BrightMagenta.on_default().bold())
        .placeholder(AnsiColor::Yellow.on_default())
        .error(AnsiColor::BrightRed.on_default().bold())
}

/// Send tracing output to the log file; the terminal belongs to the UI.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let writer = config::app_dir()
        .and_then(|dir| {
            fs::create_dir_all(&dir)?;
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(dir.join("unlock.log"))?;
            Ok(file)
        })
        .map(|file| BoxMakeWriter::new(Mutex::new(file)))
        .unwrap_or_else(|_| BoxMakeWriter::new(std::io::sink));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .init();
}

fn print_header(title: &str) {
    println!();
    println!("{}", format!("▓▒░ {} ░▒▓", title).on_black().bright_cyan().bold());
    println!("{}", "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━".on_black().bright_magenta());
    println!();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    let mut config = AppConfig::load()?;
    if let Some(url) = cli.rpc_url {
        config.rpc_url = url;
    }
    debug!(rpc_url = %config.rpc_url, "configuration loaded");

    match cli.command {
        Commands::Unlock { account, address, plain } => {
            cmd_unlock(&config, account, address, plain).await?;
        }

        Commands::Account { action } => {
            print_header("ACCOUNTS");
            cmd_account(action)?;
        }

        Commands::Config { rpc_url, duration, timeout, show } => {
            print_header("CONFIGURATION");

            // Reload so a top-level --rpc-url override is not saved
            let mut saved = AppConfig::load()?;
            let changed = rpc_url.is_some() || duration.is_some() || timeout.is_some();

            if let Some(url) = rpc_url {
                saved.rpc_url = url;
            }
            if let Some(secs) = duration {
                saved.unlock_duration_secs = secs;
            }
            if let Some(secs) = timeout {
                saved.request_timeout_secs = secs;
            }

            if changed {
                saved.save()?;
                info!(rpc_url = %saved.rpc_url, "configuration saved");
                println!("{} Configuration saved to {}", "✓".green().bold(),
                    AppConfig::default_path()?.display().to_string().dimmed());
                println!();
            }

            if show || !changed {
                println!("{} {}", "Node RPC:       ".bold(), saved.rpc_url.yellow());
                println!("{} {}s", "Unlock duration:".bold(), saved.unlock_duration_secs);
                println!("{} {}s", "Request timeout:".bold(), saved.request_timeout_secs);
            }
        }
    }

    Ok(())
}

/// Pick the account-state the card reads from.
fn resolve_accounts(account: Option<String>, address: Option<String>) -> Result<Box<dyn AccountState>> {
    if let Some(raw) = address {
        let address: Address = raw.parse().context("Invalid --address")?;
        return Ok(Box::new(FixedAccount(Account::new("command line", address.to_string()))));
    }

    let store = AccountStore::load()?;
    match account {
        Some(name) => {
            let profile = store
                .get_account(&name)
                .with_context(|| format!("Account '{}' does not exist", name))?;
            Ok(Box::new(FixedAccount(Account::new(
                profile.name.clone(),
                profile.address.to_string(),
            ))))
        }
        None => Ok(Box::new(store)),
    }
}

async fn cmd_unlock(
    config: &AppConfig,
    account: Option<String>,
    address: Option<String>,
    plain: bool,
) -> Result<()> {
    let accounts = resolve_accounts(account, address)?;
    let wallet = Arc::new(RpcWallet::new(
        &config.rpc_url,
        config.unlock_duration_secs,
        config.request_timeout(),
    )?);
    info!(rpc_url = %wallet.rpc_url(), plain, "opening unlock");

    let card = match AccountUnlock::new(accounts.as_ref(), wallet) {
        Ok(card) => card,
        Err(UnlockError::NoActiveAccount) => {
            bail!("No active account. Add one with `account-unlock account add --name <NAME> --address <ADDRESS>`")
        }
        Err(e) => return Err(e.into()),
    };

    if plain {
        return unlock_plain(card).await;
    }

    let mut app = UnlockApp::new(card, tokio::runtime::Handle::current());
    let app = tokio::task::spawn_blocking(move || app.run().map(|_| app))
        .await
        .context("Unlock screen crashed")??;

    // Leave the last outcome on the normal screen
    if let Some(outcome) = app.card.last_outcome() {
        print_outcome(outcome, app.card.form().message().unwrap_or_default());
    }

    Ok(())
}

async fn unlock_plain(mut card: AccountUnlock) -> Result<()> {
    print_header(&card.title());
    println!("{} {}", Icons::ACCOUNT.bright_magenta(), card.description().yellow());
    println!();

    let password = inquire::Password::new(unlock::PASSWORD_PLACEHOLDER)
        .with_help_message(unlock::PASSWORD_DESCRIPTION)
        .with_display_mode(inquire::PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()?;
    card.form_mut().set_password(password);

    if !card.can_submit() {
        let validation = unlock::form::validate(card.form().password());
        let reason = validation
            .error_for(unlock::form::Field::Password)
            .unwrap_or("invalid password");
        eprintln!("{} {}", "Error:".red().bold(), reason);
        std::process::exit(1);
    }

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .tick_strings(&Icons::SPINNER)
            .template("{spinner:.magenta} {msg}")?,
    );
    spinner.enable_steady_tick(Duration::from_millis(80));

    // can_submit() was checked above
    let pending = card.begin_submit()?;
    spinner.set_message(card.submit_label().to_string());
    let result = pending.run().await;
    let outcome = card.finish_submit(result).clone();
    spinner.finish_and_clear();

    print_outcome(&outcome, card.form().message().unwrap_or_default());

    if outcome != UnlockOutcome::Unlocked {
        std::process::exit(1);
    }
    Ok(())
}

fn print_outcome(outcome: &UnlockOutcome, message: &str) {
    match outcome {
        UnlockOutcome::Unlocked => println!("{} {}", "✓".bright_green().bold(), message.bright_green()),
        UnlockOutcome::Rejected => println!("{} {}", "✗".bright_red().bold(), message.bright_red()),
        UnlockOutcome::Failed(_) => println!("{} {}", "!".bright_yellow().bold(), message.bright_yellow()),
    }
}

fn cmd_account(action: AccountCommand) -> Result<()> {
    let mut store = AccountStore::load()?;

    match action {
        AccountCommand::Add { name, address, description } => {
            let address: Address = address.parse().context("Invalid address")?;
            store.add_account(AccountProfile::new(name.clone(), address).with_description(description))?;

            println!("{} Saved account {}", "✓".green().bold(), name.bright_white().bold());
            if store.active_account.as_deref() == Some(name.as_str()) {
                println!("  It is now the active account.");
            }
        }

        AccountCommand::Use { name } => {
            store.use_account(&name)?;
            println!("{} Active account: {}", "✓".green().bold(), name.bright_white().bold());
        }

        AccountCommand::List => {
            let accounts = store.list_accounts();
            if accounts.is_empty() {
                println!("No saved accounts.");
                println!("  {}", "account-unlock account add --name <NAME> --address <ADDRESS>".dimmed());
                return Ok(());
            }

            let mut table = Table::new();
            table.load_preset(UTF8_FULL);
            table.set_header(vec![
                "".to_string(),
                "Name".bright_white().to_string(),
                "Address".bright_white().to_string(),
                "Last used".bright_white().to_string(),
            ]);

            for profile in accounts {
                let marker = if store.active_account.as_deref() == Some(profile.name.as_str()) {
                    "*".bright_green().bold().to_string()
                } else {
                    String::new()
                };
                table.add_row(vec![
                    marker,
                    profile.display_name().bright_cyan().to_string(),
                    profile.address.to_string(),
                    profile.last_used.clone().unwrap_or_else(|| "never".to_string()).dimmed().to_string(),
                ]);
            }

            println!("{}", table);
        }

        AccountCommand::Remove { name } => {
            store.remove_account(&name)?;
            println!("{} Removed account {}", "✓".green().bold(), name.bright_white().bold());
            match store.active_account.as_deref() {
                Some(active) => println!("  Active account: {}", active.yellow()),
                None => println!("  No active account. Pick one with {}", "account-unlock account use <NAME>".bright_cyan()),
            }
        }

        AccountCommand::Show => match store.get_active_account() {
            Some(profile) => {
                println!("{} {}", "Name:   ".bold(), profile.display_name().bright_cyan());
                println!("{} {}", "Address:".bold(), profile.address.to_string().yellow());
                println!("{} {}", "Added:  ".bold(), profile.created_at.dimmed());
                println!("{} {}", "Store:  ".bold(), store.path().display().to_string().dimmed());
            }
            None => println!("No active account."),
        },
    }

    Ok(())
}
