//! # Seed Data Generator
//!
//! Populates the inventory database with sample items for development and
//! prints the resulting list as JSON.
//!
//! ## Usage
//! ```bash
//! # Seed the configured database with 12 items (default)
//! cargo run -p inventory-db --bin seed
//!
//! # Generate custom amount
//! cargo run -p inventory-db --bin seed -- --count 40
//!
//! # Specify database path (":memory:" for a throwaway run)
//! cargo run -p inventory-db --bin seed -- --db ./data/inventory.db
//! ```
//!
//! ## Generated Items
//! Names are `{product} {size}`, walking the product list once per size.
//! Prices and quantities are derived from the item index so runs are
//! reproducible.

use futures_util::StreamExt;
use inventory_core::Item;
use inventory_db::{app_container, InventoryConfig};
use std::env;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Products for sample data
const PRODUCTS: &[&str] = &[
    "Apples",
    "Bananas",
    "Cherries",
    "Dates",
    "Grapes",
    "Kiwis",
    "Lemons",
    "Mangoes",
    "Oranges",
    "Pears",
    "Plums",
    "Strawberries",
];

/// Size variants with a price multiplier
const SIZES: &[(&str, f64)] = &[("Bag", 1.0), ("Crate", 4.5), ("Pallet", 40.0)];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut count: usize = PRODUCTS.len();
    let mut db_path: Option<PathBuf> = None;
    let mut config_path: Option<PathBuf> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(PRODUCTS.len());
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--config" => {
                if i + 1 < args.len() {
                    config_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Inventory Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>      Number of items to generate (default: 12)");
                println!("  -d, --db <PATH>      Database file path (default: from config)");
                println!("      --config <PATH>  Config file path (default: platform config dir)");
                println!("  -h, --help           Show this help message");
                return Ok(());
            }
            other => {
                eprintln!("Ignoring unknown argument: {}", other);
            }
        }
        i += 1;
    }

    let mut config = InventoryConfig::load(config_path)?;
    if db_path.is_some() {
        config.database.path = db_path;
    }
    let db_config = config.to_db_config()?;

    println!("Inventory Seed Data Generator");
    println!("=============================");
    println!("Database: {}", db_config.database_path.display());
    println!("Items:    {}", count);
    println!();

    let container = app_container(&db_config);
    let repo = container.items_repository().await?;

    println!("✓ Connected to database");

    // Check existing items
    let existing = container.database().await?.items().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} items", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
    } else {
        let start = std::time::Instant::now();
        let mut generated = 0;

        for index in 0..count {
            let item = generate_item(index);
            match repo.insert_item(&item).await {
                Ok(Some(_)) => generated += 1,
                Ok(None) => eprintln!("Skipped {}: id already present", item.name),
                Err(e) => eprintln!("Failed to insert {}: {}", item.name, e),
            }
        }

        println!("✓ Generated {} items in {:?}", generated, start.elapsed());
    }

    // First emission of the live list is the current table contents
    let mut all = repo.get_all_items_stream();
    let snapshot = match all.next().await {
        Some(snapshot) => snapshot?,
        None => Vec::new(),
    };
    all.cancel();

    println!();
    println!("{}", serde_json::to_string_pretty(&snapshot)?);

    Ok(())
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=inventory_db=trace` - Show trace for this crate only
/// - Default: INFO level
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,inventory_db=debug,sqlx=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Builds one sample item; the id is left for the database to assign.
fn generate_item(index: usize) -> Item {
    let product = PRODUCTS[index % PRODUCTS.len()];
    let (size, multiplier) = SIZES[(index / PRODUCTS.len()) % SIZES.len()];

    // $0.99 - $8.99 base price, whole cents
    let base_cents = 99 + ((index * 37) % 800) as i64;
    let price = (base_cents as f64 * multiplier).round() / 100.0;

    let quantity = ((index * 13) % 101) as i32;

    Item::new(format!("{} {}", product, size), price, quantity)
}
