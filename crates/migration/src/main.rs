use sea_orm::Database;
use sea_orm_migration::prelude::*;

const DEFAULT_DB_URL: &str = "sqlite:./saldo.db?mode=rwc";

fn print_usage() {
    eprintln!("saldo schema migrations");
    eprintln!("usage: migration <up | down [steps] | fresh | status>");
    eprintln!("reads DATABASE_URL, defaults to {DEFAULT_DB_URL}");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut args = std::env::args().skip(1);
    let Some(cmd) = args.next() else {
        print_usage();
        std::process::exit(2);
    };

    let db_url = std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DB_URL.to_string());
    let db = Database::connect(&db_url).await?;

    match cmd.as_str() {
        "up" => migration::Migrator::up(&db, None).await?,
        "down" => {
            // Rolls back one migration unless a step count is given.
            let steps = match args.next() {
                Some(raw) => raw.parse::<u32>()?,
                None => 1,
            };
            migration::Migrator::down(&db, Some(steps)).await?;
        }
        "fresh" => migration::Migrator::fresh(&db).await?,
        "status" => migration::Migrator::status(&db).await?,
        other => {
            eprintln!("unknown command: {other}");
            print_usage();
            std::process::exit(2);
        }
    }

    Ok(())
}
