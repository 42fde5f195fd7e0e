use std::error::Error;

use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use engine::{Currency, Engine, Money};
use migration::MigratorTrait;
use sea_orm::Database;
use uuid::Uuid;

mod settings;

#[derive(Parser, Debug)]
#[command(name = "saldo")]
#[command(about = "Personal finance tracker: wallets, ledger, balance reconciliation")]
struct Cli {
    /// Database connection string (overrides `saldo.toml` defaults).
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    User(User),
    Wallet(Wallet),
    Tx(Tx),
    /// Rebuild every wallet balance of a user from the full ledger.
    Recalculate(Recalculate),
    /// Per-currency totals for a user.
    Stats(Stats),
}

#[derive(Args, Debug)]
struct User {
    #[command(subcommand)]
    command: UserCommand,
}

#[derive(Subcommand, Debug)]
enum UserCommand {
    /// Create a user.
    Create { username: String },
    /// List users.
    List,
}

#[derive(Args, Debug)]
struct Wallet {
    #[command(subcommand)]
    command: WalletCommand,
}

#[derive(Subcommand, Debug)]
enum WalletCommand {
    /// Create a wallet.
    Create {
        #[arg(long)]
        user: String,
        #[arg(long)]
        name: String,
        /// Currency code (EUR, USD, GBP, JPY).
        #[arg(long, default_value = "EUR")]
        currency: String,
        /// Opening balance in major units, recorded as an opening entry.
        #[arg(long, default_value = "0")]
        opening: String,
    },
    /// List wallets.
    List {
        #[arg(long)]
        user: String,
        /// Include archived wallets.
        #[arg(long)]
        all: bool,
    },
    /// Rename a wallet.
    Rename {
        #[arg(long)]
        user: String,
        #[arg(long)]
        id: Uuid,
        #[arg(long)]
        name: String,
    },
    /// Archive (or unarchive) a wallet.
    Archive {
        #[arg(long)]
        user: String,
        #[arg(long)]
        id: Uuid,
        /// Unarchive instead of archiving.
        #[arg(long)]
        undo: bool,
    },
    /// Hard-delete a wallet. Its ledger entries stay behind and will show
    /// up as orphans in the next recalculation.
    Delete {
        #[arg(long)]
        user: String,
        #[arg(long)]
        id: Uuid,
    },
}

#[derive(Args, Debug)]
struct Tx {
    #[command(subcommand)]
    command: TxCommand,
}

#[derive(Subcommand, Debug)]
enum TxCommand {
    /// Record an income on a wallet.
    Income {
        #[arg(long)]
        user: String,
        #[arg(long)]
        wallet: Uuid,
        /// Amount in major units of the wallet currency, e.g. `10.50`.
        #[arg(long)]
        amount: String,
        #[arg(long)]
        note: Option<String>,
        /// RFC 3339 timestamp; defaults to now.
        #[arg(long)]
        date: Option<String>,
    },
    /// Record an outcome on a wallet.
    Outcome {
        #[arg(long)]
        user: String,
        #[arg(long)]
        wallet: Uuid,
        #[arg(long)]
        amount: String,
        #[arg(long)]
        note: Option<String>,
        #[arg(long)]
        date: Option<String>,
    },
    /// Move money between two wallets of the same currency.
    Transfer {
        #[arg(long)]
        user: String,
        #[arg(long)]
        from: Uuid,
        #[arg(long)]
        to: Uuid,
        #[arg(long)]
        amount: String,
        #[arg(long)]
        note: Option<String>,
        #[arg(long)]
        date: Option<String>,
    },
    /// List a wallet's history, newest first.
    List {
        #[arg(long)]
        user: String,
        #[arg(long)]
        wallet: Uuid,
        #[arg(long, default_value_t = 50)]
        limit: usize,
        /// Export the listed entries to a CSV file instead of printing.
        #[arg(long)]
        csv: Option<std::path::PathBuf>,
    },
}

#[derive(Args, Debug)]
struct Recalculate {
    #[arg(long)]
    user: String,
    /// Print the full report as JSON.
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct Stats {
    #[arg(long)]
    user: String,
}

fn kind_label(kind: engine::LedgerEntryKind) -> &'static str {
    use engine::LedgerEntryKind::*;
    match kind {
        Income => "income",
        Outcome => "outcome",
        TransferIn => "transfer_in",
        TransferOut => "transfer_out",
    }
}

fn parse_occurred_at(date: Option<&str>) -> Result<DateTime<Utc>, Box<dyn Error + Send + Sync>> {
    match date {
        Some(raw) => Ok(DateTime::parse_from_rfc3339(raw)?.with_timezone(&Utc)),
        None => Ok(Utc::now()),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();
    let settings = settings::Settings::new()?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "saldo={level},engine={level}",
            level = settings.log_level
        ))
        .init();

    let database_url = cli.database_url.unwrap_or(settings.database_url);
    let db = Database::connect(&database_url).await?;
    migration::Migrator::up(&db, None).await?;
    let engine = Engine::builder().database(db).build().await?;

    match cli.command {
        Command::User(user) => match user.command {
            UserCommand::Create { username } => {
                engine.create_user(&username).await?;
                println!("created user {username}");
            }
            UserCommand::List => {
                for username in engine.list_users().await? {
                    println!("{username}");
                }
            }
        },
        Command::Wallet(wallet) => match wallet.command {
            WalletCommand::Create {
                user,
                name,
                currency,
                opening,
            } => {
                let currency = Currency::try_from(currency.as_str())?;
                let opening = Money::parse(&opening, currency)?;
                let id = engine
                    .new_wallet(&user, &name, currency, opening.minor())
                    .await?;
                println!("created wallet {name} ({id})");
            }
            WalletCommand::List { user, all } => {
                for wallet in engine.list_wallets(&user, all).await? {
                    let flag = if wallet.archived { " [archived]" } else { "" };
                    println!(
                        "{}  {}  {}{}",
                        wallet.id,
                        wallet.name,
                        Money::from_minor(wallet.balance).format(wallet.currency),
                        flag
                    );
                }
            }
            WalletCommand::Rename { user, id, name } => {
                engine.rename_wallet(id, &name, &user).await?;
                println!("renamed wallet {id}");
            }
            WalletCommand::Archive { user, id, undo } => {
                engine.set_wallet_archived(id, !undo, &user).await?;
                println!("{} wallet {id}", if undo { "unarchived" } else { "archived" });
            }
            WalletCommand::Delete { user, id } => {
                engine.delete_wallet(id, &user).await?;
                println!("deleted wallet {id}");
            }
        },
        Command::Tx(tx) => match tx.command {
            TxCommand::Income {
                user,
                wallet,
                amount,
                note,
                date,
            } => {
                let snapshot = engine.wallet(wallet, &user).await?;
                let amount = Money::parse(&amount, snapshot.currency)?;
                let occurred_at = parse_occurred_at(date.as_deref())?;
                let id = engine
                    .income(&user, wallet, amount.minor(), occurred_at, note.as_deref())
                    .await?;
                println!("recorded income {id}");
            }
            TxCommand::Outcome {
                user,
                wallet,
                amount,
                note,
                date,
            } => {
                let snapshot = engine.wallet(wallet, &user).await?;
                let amount = Money::parse(&amount, snapshot.currency)?;
                let occurred_at = parse_occurred_at(date.as_deref())?;
                let id = engine
                    .outcome(&user, wallet, amount.minor(), occurred_at, note.as_deref())
                    .await?;
                println!("recorded outcome {id}");
            }
            TxCommand::Transfer {
                user,
                from,
                to,
                amount,
                note,
                date,
            } => {
                let snapshot = engine.wallet(from, &user).await?;
                let amount = Money::parse(&amount, snapshot.currency)?;
                let occurred_at = parse_occurred_at(date.as_deref())?;
                let id = engine
                    .transfer(&user, from, to, amount.minor(), occurred_at, note.as_deref())
                    .await?;
                println!("recorded transfer {id}");
            }
            TxCommand::List {
                user,
                wallet,
                limit,
                csv,
            } => {
                let entries = engine.list_wallet_entries(&user, wallet, limit).await?;
                match csv {
                    Some(path) => {
                        let mut writer = csv::Writer::from_path(&path)?;
                        writer.write_record([
                            "id",
                            "kind",
                            "amount",
                            "currency",
                            "occurred_at",
                            "note",
                            "counterparty_wallet_id",
                        ])?;
                        for entry in &entries {
                            writer.write_record([
                                entry.id.to_string(),
                                kind_label(entry.kind).to_string(),
                                Money::from_minor(entry.signed_amount_minor)
                                    .format(entry.currency),
                                entry.currency.code().to_string(),
                                entry.occurred_at.to_rfc3339(),
                                entry.note.clone().unwrap_or_default(),
                                entry
                                    .counterparty_wallet_id
                                    .map(|id| id.to_string())
                                    .unwrap_or_default(),
                            ])?;
                        }
                        writer.flush()?;
                        println!("exported {} entries to {}", entries.len(), path.display());
                    }
                    None => {
                        for entry in &entries {
                            println!(
                                "{}  {:<12}  {:>14}  {}",
                                entry.occurred_at.format("%Y-%m-%d %H:%M"),
                                kind_label(entry.kind),
                                Money::from_minor(entry.signed_amount_minor)
                                    .format(entry.currency),
                                entry.note.as_deref().unwrap_or("")
                            );
                        }
                    }
                }
            }
        },
        Command::Recalculate(args) => {
            let report = engine.recalculate(&args.user).await?;

            if args.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                let wallets = engine.list_wallets(&args.user, true).await?;
                for wallet in &wallets {
                    if let Some(balance) = report.balances.get(&wallet.id) {
                        println!(
                            "{}  {}  {}",
                            wallet.id,
                            wallet.name,
                            Money::from_minor(*balance).format(wallet.currency)
                        );
                    }
                }
                if !report.orphans.is_empty() {
                    println!(
                        "warning: {} ledger entries reference deleted wallets",
                        report.orphans.total()
                    );
                }
                if !report.invalid.is_empty() {
                    println!(
                        "warning: {} stored rows failed validation and were skipped",
                        report.invalid.len()
                    );
                }
            }

            if !report.write_failures.is_empty() {
                for failure in &report.write_failures {
                    tracing::error!(
                        wallet_id = %failure.wallet_id,
                        reason = %failure.reason,
                        "balance write failed"
                    );
                }
                eprintln!(
                    "recalculation incomplete: {} balance writes failed",
                    report.write_failures.len()
                );
                std::process::exit(1);
            }
        }
        Command::Stats(args) => {
            for (currency, totals) in engine.user_statistics(&args.user).await? {
                println!(
                    "{currency}: balance {}, income {}, outcome {}",
                    Money::from_minor(totals.balance_minor).format(currency),
                    Money::from_minor(totals.income_minor).format(currency),
                    Money::from_minor(totals.outcome_minor).format(currency),
                );
            }
        }
    }

    Ok(())
}
