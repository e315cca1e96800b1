use std::error::Error;

use clap::{Args, Parser, Subcommand};
use engine::{Engine, EngineError, SetBalanceCmd, UserUpsert};
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection};

#[derive(Parser, Debug)]
#[command(name = "coffer_admin")]
#[command(about = "Admin utilities for Coffer (users, currencies, balances)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite:./coffer.db?mode=rwc")]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    User(User),
    Admin(Admin),
    Currency(Currency),
    Balance(Balance),
    /// Show the newest transactions of a user.
    History(HistoryArgs),
}

#[derive(Args, Debug)]
struct User {
    #[command(subcommand)]
    command: UserCommand,
}

#[derive(Subcommand, Debug)]
enum UserCommand {
    /// Register a user, resurrect a disabled one or rename an active one.
    Create(UserCreateArgs),
    /// Soft-delete a user; balances and history are kept.
    Disable { username: String },
    /// Remove a user with all its accounts and transactions.
    Destroy { username: String },
    /// Every active user with balances.
    List,
}

#[derive(Args, Debug)]
struct UserCreateArgs {
    #[arg(long)]
    identity: i64,
    #[arg(long)]
    username: String,
}

#[derive(Args, Debug)]
struct Admin {
    #[command(subcommand)]
    command: AdminCommand,
}

#[derive(Subcommand, Debug)]
enum AdminCommand {
    Grant { username: String },
    Revoke { username: String },
}

#[derive(Args, Debug)]
struct Currency {
    #[command(subcommand)]
    command: CurrencyCommand,
}

#[derive(Subcommand, Debug)]
enum CurrencyCommand {
    Add(CurrencyAddArgs),
    /// Make a registered currency the default.
    Default { code: String },
    List,
}

#[derive(Args, Debug)]
struct CurrencyAddArgs {
    #[arg(long)]
    code: String,
    #[arg(long)]
    name: String,
    #[arg(long)]
    sign: String,
    #[arg(long, default_value_t = engine::DEFAULT_MINOR_UNITS)]
    minor_units: u8,
}

#[derive(Args, Debug)]
struct Balance {
    #[command(subcommand)]
    command: BalanceCommand,
}

#[derive(Subcommand, Debug)]
enum BalanceCommand {
    /// Set a balance to an exact decimal amount.
    Set(BalanceSetArgs),
}

#[derive(Args, Debug)]
struct BalanceSetArgs {
    /// Identity of the admin performing the change.
    #[arg(long = "as")]
    admin_identity: i64,
    #[arg(long)]
    username: String,
    /// Decimal amount, e.g. `12.50`.
    #[arg(long)]
    amount: String,
    /// Currency code; the default currency when omitted.
    #[arg(long)]
    currency: Option<String>,
}

#[derive(Args, Debug)]
struct HistoryArgs {
    #[arg(long)]
    identity: i64,
    #[arg(long)]
    limit: Option<u64>,
}

async fn connect_db(
    database_url: &str,
) -> Result<DatabaseConnection, Box<dyn Error + Send + Sync>> {
    let db = Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

async fn run(engine: &Engine, command: Command) -> Result<(), EngineError> {
    match command {
        Command::User(User { command }) => match command {
            UserCommand::Create(args) => {
                match engine.create_user(args.identity, &args.username).await? {
                    UserUpsert::Created(user) => println!("created user: {}", user.username),
                    UserUpsert::Resurrected(user) => {
                        println!("resurrected user: {}", user.username);
                    }
                    UserUpsert::Renamed {
                        user,
                        previous_username,
                    } => println!("renamed user: {previous_username} -> {}", user.username),
                }
            }
            UserCommand::Disable { username } => {
                let user = engine.disable_user(&username).await?;
                println!("disabled user: {}", user.username);
            }
            UserCommand::Destroy { username } => {
                let user = engine.destroy_user(&username).await?;
                println!("destroyed user: {} ({})", user.username, user.identity);
            }
            UserCommand::List => {
                for user in engine.list_users_with_balances().await? {
                    let balances: Vec<String> = user
                        .balances
                        .iter()
                        .map(|(code, amount)| format!("{code}={amount}"))
                        .collect();
                    let admin = if user.is_admin { " [admin]" } else { "" };
                    println!(
                        "{}\t{}{admin}\t{}",
                        user.identity,
                        user.username,
                        balances.join(" ")
                    );
                }
            }
        },
        Command::Admin(Admin { command }) => {
            let (username, is_admin) = match command {
                AdminCommand::Grant { username } => (username, true),
                AdminCommand::Revoke { username } => (username, false),
            };
            let user = engine.set_admin_status(&username, is_admin).await?;
            println!("{}: admin = {}", user.username, user.is_admin);
        }
        Command::Currency(Currency { command }) => match command {
            CurrencyCommand::Add(args) => {
                let currency = engine
                    .add_currency_with_minor_units(
                        &args.code,
                        &args.name,
                        &args.sign,
                        args.minor_units,
                    )
                    .await?;
                let default = if currency.is_default { " (default)" } else { "" };
                println!("added currency: {}{default}", currency.code);
            }
            CurrencyCommand::Default { code } => {
                let currency = engine.set_default_currency(&code).await?;
                println!("default currency: {}", currency.code);
            }
            CurrencyCommand::List => {
                for currency in engine.list_currencies().await? {
                    let default = if currency.is_default { "*" } else { " " };
                    println!(
                        "{default} {}\t{}\t{}\t{}",
                        currency.code, currency.sign, currency.minor_units, currency.name
                    );
                }
            }
        },
        Command::Balance(Balance {
            command: BalanceCommand::Set(args),
        }) => {
            let currency = match args.currency.as_deref() {
                Some(code) => engine.currency_by_code(code).await?,
                None => engine.default_currency().await?,
            };
            let amount_minor = currency.parse_amount(&args.amount)?;
            let entry = engine
                .admin_set_balance(SetBalanceCmd::new(
                    args.admin_identity,
                    args.username,
                    amount_minor,
                    currency.code.clone(),
                ))
                .await?;
            println!(
                "{} balance: {} {}",
                entry.to_username,
                currency.money(entry.balance_after_minor),
                currency.code
            );
        }
        Command::History(args) => {
            for tx in engine.transaction_history(args.identity, args.limit).await? {
                println!(
                    "{}\t{:?}\t{}\t{}\t{} -> {}\tbalance {}",
                    tx.occurred_at.to_rfc3339(),
                    tx.kind,
                    tx.amount_minor,
                    tx.currency_code,
                    tx.from_username,
                    tx.to_username,
                    tx.balance_after_minor
                );
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();

    let db = connect_db(&cli.database_url).await?;
    let engine = Engine::builder().database(db).build().await?;

    match run(&engine, cli.command).await {
        Ok(()) => Ok(()),
        Err(EngineError::Database(err)) => Err(err.into()),
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    }
}
