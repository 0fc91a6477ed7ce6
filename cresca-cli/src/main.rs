use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use cresca::keys::{Address, RecoveryPhrase};
use cresca::network::HttpGateway;
use cresca::storage::FileCredentialStore;
use cresca::{AppConfig, WalletService};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use zeroize::Zeroizing;

#[derive(Parser)]
#[command(name = "cresca")]
#[command(about = "Self-custodial wallet for the Movement network")]
struct Cli {
    /// Directory holding the wallet's credential files
    #[arg(long, global = true)]
    store_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new wallet and print its recovery phrase
    Create,
    /// Restore a wallet from a recovery phrase
    Import,
    /// Show the stored wallet with its on-chain state
    Show,
    /// Print the balance of the wallet or another address
    Balance { address: Option<String> },
    /// Register the wallet with the payments contract
    Init,
    /// Send coins with a memo
    Send {
        to: String,
        amount: String,
        #[arg(long)]
        memo: Option<String>,
    },
    /// Quick payment without a memo
    Tap { to: String, amount: String },
    /// Pay several recipients in one transaction
    Batch {
        #[arg(long = "to", value_delimiter = ',', required = true)]
        recipients: Vec<String>,
        #[arg(long = "amount", value_delimiter = ',', required = true)]
        amounts: Vec<String>,
    },
    /// Estimate gas for a transfer without submitting it
    Estimate { to: String, amount: String },
    /// Schedule a payment at an RFC 3339 time
    Schedule {
        to: String,
        amount: String,
        #[arg(long)]
        at: DateTime<Utc>,
        /// Repeat interval in seconds
        #[arg(long)]
        interval: Option<u64>,
    },
    /// Execute a scheduled payment by id
    Execute { id: String },
    /// List scheduled payments
    Scheduled {
        /// Only payments that are due now
        #[arg(long)]
        due: bool,
    },
    /// Create an investment basket
    CreateBasket { name: String, initial_value: String },
    /// List baskets
    Baskets,
    /// Show transaction history
    History {
        #[arg(long)]
        limit: Option<u32>,
        #[arg(long)]
        start: Option<u64>,
    },
    /// Show transactions not yet executed
    Pending,
    /// Look up a transaction by hash
    Tx { hash: String },
    /// Print the private key
    ExportKey,
    /// Print the recovery phrase
    RevealPhrase,
    /// Manage the unlock PIN
    Pin {
        #[command(subcommand)]
        action: PinAction,
    },
    /// Remove the wallet from this device
    Delete {
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum PinAction {
    Set,
    Verify,
}

fn prompt_secret(prompt: &str) -> anyhow::Result<Zeroizing<String>> {
    let value = rpassword::prompt_password_stdout(prompt).context("failed to read from terminal")?;
    Ok(Zeroizing::new(value))
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cresca=info,cresca_cli=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load().context("failed to load configuration")?;

    let store = match cli.store_dir.clone().or_else(|| config.storage.dir.clone()) {
        Some(dir) => FileCredentialStore::at(dir)?,
        None => FileCredentialStore::new()?,
    };
    info!(dir = %store.dir().display(), network = %config.network.url, "Using wallet store");

    let gateway = Arc::new(HttpGateway::new(&config.network)?);
    let wallet = WalletService::new(config, Arc::new(store), gateway)?;

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c.cancel();
        }
    });

    run(cli.command, &wallet, &cancel).await
}

async fn run(command: Commands, wallet: &WalletService, cancel: &CancellationToken) -> anyhow::Result<()> {
    match command {
        Commands::Create => {
            let password = new_password()?;
            let created = wallet.create_wallet(&password)?;
            println!("Write down your recovery phrase and keep it offline:\n");
            println!("  {}\n", created.phrase.as_str());
            print_json(&created.account)?;
        }
        Commands::Import => {
            let phrase = RecoveryPhrase::new(&prompt_secret("Recovery phrase: ")?);
            let password = new_password()?;
            let account = wallet.import_wallet(&phrase, &password).await?;
            print_json(&account)?;
        }
        Commands::Show => match wallet.current_wallet().await? {
            Some(account) => print_json(&account)?,
            None => println!("No wallet on this device"),
        },
        Commands::Balance { address } => {
            let address = target(wallet, address)?;
            println!("{}", wallet.balance(&address).await?);
        }
        Commands::Init => {
            let password = prompt_secret("Password: ")?;
            let result = wallet.initialize_on_chain(&password, cancel).await?;
            print_json(&result)?;
        }
        Commands::Send { to, amount, memo } => {
            let to: Address = to.parse()?;
            let password = prompt_secret("Password: ")?;
            let result = wallet
                .send_coins(&password, &to, &amount, memo.as_deref(), cancel)
                .await?;
            print_json(&result)?;
        }
        Commands::Tap { to, amount } => {
            let to: Address = to.parse()?;
            let password = prompt_secret("Password: ")?;
            print_json(&wallet.tap_to_pay(&password, &to, &amount, cancel).await?)?;
        }
        Commands::Batch { recipients, amounts } => {
            let recipients = recipients
                .iter()
                .map(|r| r.parse())
                .collect::<Result<Vec<Address>, _>>()?;
            let password = prompt_secret("Password: ")?;
            print_json(&wallet.batch_send(&password, &recipients, &amounts, cancel).await?)?;
        }
        Commands::Estimate { to, amount } => {
            let to: Address = to.parse()?;
            let password = prompt_secret("Password: ")?;
            let gas = wallet.estimate_transfer_gas(&password, &to, &amount).await?;
            println!("{}", gas);
        }
        Commands::Schedule { to, amount, at, interval } => {
            let to: Address = to.parse()?;
            let password = prompt_secret("Password: ")?;
            let result = wallet
                .schedule_payment(&password, &to, &amount, at, interval, cancel)
                .await?;
            print_json(&result)?;
        }
        Commands::Execute { id } => {
            let password = prompt_secret("Password: ")?;
            print_json(&wallet.execute_scheduled_payment(&password, &id, cancel).await?)?;
        }
        Commands::Scheduled { due } => {
            let address = wallet.address()?;
            let payments = if due {
                wallet.due_payments(&address, Utc::now()).await?
            } else {
                wallet.scheduled_payments(&address).await?
            };
            print_json(&payments)?;
        }
        Commands::CreateBasket { name, initial_value } => {
            let password = prompt_secret("Password: ")?;
            print_json(&wallet.create_basket(&password, &name, &initial_value, cancel).await?)?;
        }
        Commands::Baskets => {
            let address = wallet.address()?;
            print_json(&wallet.baskets(&address).await?)?;
        }
        Commands::History { limit, start } => {
            let address = wallet.address()?;
            print_json(&wallet.transaction_history(&address, limit, start).await?)?;
        }
        Commands::Pending => {
            let address = wallet.address()?;
            print_json(&wallet.pending_transactions(&address).await?)?;
        }
        Commands::Tx { hash } => print_json(&wallet.transaction_by_hash(&hash).await?)?,
        Commands::ExportKey => {
            let password = prompt_secret("Password: ")?;
            println!("{}", wallet.export_private_key(&password)?.as_str());
        }
        Commands::RevealPhrase => {
            let password = prompt_secret("Password: ")?;
            println!("{}", wallet.reveal_phrase(&password)?.as_str());
        }
        Commands::Pin { action } => match action {
            PinAction::Set => {
                let pin = prompt_secret("New PIN: ")?;
                wallet.set_pin(&pin)?;
                println!("PIN updated");
            }
            PinAction::Verify => {
                let pin = prompt_secret("PIN: ")?;
                if wallet.verify_pin(&pin)? {
                    println!("PIN accepted");
                } else {
                    anyhow::bail!("PIN rejected");
                }
            }
        },
        Commands::Delete { yes } => {
            if !yes {
                anyhow::bail!("refusing to delete without --yes; back up your recovery phrase first");
            }
            wallet.delete_wallet()?;
            println!("Wallet removed from this device");
        }
    }
    Ok(())
}

fn new_password() -> anyhow::Result<Zeroizing<String>> {
    let password = prompt_secret("New password: ")?;
    let confirm = prompt_secret("Confirm password: ")?;
    if *password != *confirm {
        anyhow::bail!("passwords do not match");
    }
    Ok(password)
}

fn target(wallet: &WalletService, address: Option<String>) -> anyhow::Result<Address> {
    match address {
        Some(address) => Ok(address.parse()?),
        None => Ok(wallet.address()?),
    }
}
