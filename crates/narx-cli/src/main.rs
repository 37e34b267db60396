mod catalog;


use std::str::FromStr;

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use uuid::Uuid;

use narx_core::ProductCategory;

#[derive(Debug, Parser)]
#[command(name = "narx-cli")]
#[command(about = "Narx crowdsourced grocery price catalog")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Database maintenance.
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
    /// Search the catalog, printing pages until the results run out.
    Search {
        query: String,
        /// Restrict to one category label (e.g. "Овощи").
        #[arg(long)]
        category: Option<String>,
        /// Maximum number of load-more pages to print.
        #[arg(long, default_value_t = 1)]
        pages: u32,
    },
    /// Show one product with its price history and aggregates.
    Show { product_id: Uuid },
    /// Submit a price report.
    Report {
        #[arg(long)]
        product_id: Uuid,
        /// Store name; matched case-insensitively, created on first use.
        #[arg(long)]
        store: String,
        #[arg(long)]
        price: Decimal,
        #[arg(long, default_value_t = Decimal::ONE)]
        quantity: Decimal,
        #[arg(long, default_value = "шт")]
        unit: String,
        #[arg(long, default_value = narx_core::BASE_CURRENCY)]
        currency: String,
        #[arg(long)]
        user: Option<Uuid>,
    },
    /// Print the recent-reports feed, one line per product.
    Recent {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Toggle a product in a user's favorites.
    Favorite {
        #[arg(long)]
        user: Uuid,
        #[arg(long)]
        product_id: Uuid,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Verify database connectivity.
    Ping,
    /// Apply pending migrations.
    Migrate,
    /// Load demo stores, products, and price history.
    Seed,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("narx-cli: pass a subcommand, see --help");
        return Ok(());
    };

    let pool = narx_db::connect_pool_from_env().await?;

    match command {
        Commands::Db { command } => match command {
            DbCommands::Ping => {
                narx_db::ping(&pool).await?;
                println!("database ok");
            }
            DbCommands::Migrate => {
                let applied = narx_db::run_migrations(&pool).await?;
                println!("applied {applied} migrations");
            }
            DbCommands::Seed => {
                let products = narx_db::seed_demo_data(&pool).await?;
                println!("seeded {products} products");
            }
        },
        Commands::Search {
            query,
            category,
            pages,
        } => {
            let category = category
                .as_deref()
                .map(|label| {
                    ProductCategory::from_str(label)
                        .map_err(|e| anyhow::anyhow!("{e}"))
                })
                .transpose()?;
            catalog::run_search(&pool, &query, category, pages).await?;
        }
        Commands::Show { product_id } => catalog::run_show(&pool, product_id).await?,
        Commands::Report {
            product_id,
            store,
            price,
            quantity,
            unit,
            currency,
            user,
        } => {
            catalog::run_report(
                &pool,
                catalog::ReportArgs {
                    product_id,
                    store: &store,
                    price,
                    quantity,
                    unit: &unit,
                    currency: &currency,
                    user,
                },
            )
            .await?;
        }
        Commands::Recent { limit } => catalog::run_recent(&pool, limit).await?,
        Commands::Favorite { user, product_id } => {
            catalog::run_favorite(&pool, user, product_id).await?;
        }
    }

    Ok(())
}
