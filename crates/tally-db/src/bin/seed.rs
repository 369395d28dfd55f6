//! # Seed Data Generator
//!
//! Populates a database with demo products and customers for development.
//!
//! ## Usage
//! ```bash
//! # 200 products, 5 customers (defaults)
//! cargo run -p tally-db --bin seed
//!
//! # Custom amounts and path
//! cargo run -p tally-db --bin seed -- --products 1000 --customers 20 --db ./data/tally.db
//! ```
//!
//! ## Generated Products
//! Names are `{base} {size}` across five categories. Each product gets:
//! - Barcode `590{category}{seed:09}` (EAN-13 shaped, checksum not valid)
//! - Price: $1.99 - $9.99 plus a size add-on
//! - Cost: 60-80% of price
//! - Stock: 0 - 40 (some products start out of stock on purpose)

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use tally_core::{CustomerDraft, ProductDraft};
use tally_db::{Database, DbConfig};

/// Product base names per category.
const CATEGORIES: &[&[&str]] = &[
    &[
        "Cola", "Lemon Soda", "Orange Soda", "Ginger Ale", "Energy Drink", "Sparkling Water",
        "Still Water", "Apple Juice", "Iced Tea", "Cold Brew",
    ],
    &[
        "Salted Chips", "Tortilla Chips", "Pretzels", "Popcorn", "Chocolate Bar",
        "Peanut Butter Cups", "Gummy Bears", "Trail Mix", "Granola Bar", "Crackers",
    ],
    &[
        "Whole Milk", "Oat Milk", "Cheddar", "Mozzarella", "Greek Yogurt", "Butter",
        "Cream Cheese", "Eggs Dozen", "Sour Cream", "Cottage Cheese",
    ],
    &[
        "Vanilla Ice Cream", "Frozen Pizza", "Frozen Burrito", "Fish Sticks", "Frozen Peas",
        "Waffles", "Popsicles", "Chicken Nuggets", "Frozen Fries", "Sorbet",
    ],
    &[
        "White Bread", "Spaghetti", "Penne", "Basmati Rice", "Canned Beans", "Canned Tomatoes",
        "Oatmeal", "Honey", "Flour", "Sugar",
    ],
];

/// Size variants with their price add-on in cents.
const SIZES: &[(&str, i64)] = &[
    ("Small", 0),
    ("Regular", 100),
    ("Large", 200),
    ("Family", 350),
];

const CUSTOMERS: &[(&str, &str, &str)] = &[
    ("Walk-in", "", ""),
    ("Ana Souza", "ana@example.com", "555-0101"),
    ("Bilal Khan", "bilal@example.com", "555-0102"),
    ("Chen Wei", "", "555-0103"),
    ("Dana Levi", "dana@example.com", ""),
    ("Emeka Obi", "emeka@example.com", "555-0105"),
    ("Fatima Noor", "", "555-0106"),
    ("Gus Lindqvist", "gus@example.com", "555-0107"),
];

#[derive(Debug, Parser)]
#[command(name = "seed", about = "Tally POS seed data generator")]
struct Args {
    /// Database file path
    #[arg(short, long, default_value = "./tally_dev.db")]
    db: String,

    /// Number of products to generate
    #[arg(short, long, default_value_t = 200)]
    products: usize,

    /// Number of customers to generate
    #[arg(short, long, default_value_t = 5)]
    customers: usize,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    info!(db = %args.db, products = args.products, customers = args.customers, "Seeding");

    let db = Database::new(DbConfig::new(&args.db)).await?;

    let existing = db.products().count().await?;
    if existing > 0 {
        warn!(existing, "Database already has products, skipping seed");
        println!("Database already has {existing} products; delete the file to regenerate.");
        return Ok(());
    }

    let start = std::time::Instant::now();
    let mut generated = 0;

    'outer: for (category_idx, names) in CATEGORIES.iter().enumerate() {
        for (name_idx, name) in names.iter().enumerate() {
            for (size_idx, (size, addon)) in SIZES.iter().enumerate() {
                if generated >= args.products {
                    break 'outer;
                }
                let seed = category_idx * 1000 + name_idx * 10 + size_idx;
                let (draft, stock) = generate_product(name, size, *addon, category_idx, seed);

                if let Err(e) = db.products().insert(&draft, stock).await {
                    warn!(name = %draft.name, error = %e, "Failed to insert product");
                    continue;
                }
                generated += 1;
            }
        }
    }

    let mut customers = 0;
    for (name, email, phone) in CUSTOMERS.iter().take(args.customers) {
        let draft = CustomerDraft {
            name: name.to_string(),
            email: non_empty(email),
            phone: non_empty(phone),
        };
        if let Err(e) = db.customers().insert(&draft).await {
            warn!(name = %draft.name, error = %e, "Failed to insert customer");
            continue;
        }
        customers += 1;
    }

    println!(
        "Generated {generated} products and {customers} customers in {:?}",
        start.elapsed()
    );
    println!(
        "  Search 'cola': {} results",
        db.products().search("cola", 10).await?.len()
    );

    db.close().await;
    Ok(())
}

/// One demo product and its opening stock.
fn generate_product(
    name: &str,
    size: &str,
    price_addon: i64,
    category: usize,
    seed: usize,
) -> (ProductDraft, i64) {
    let price_cents = 199 + ((seed * 17) % 800) as i64 + price_addon;
    let cost_pct = 60 + (seed % 20) as i64;

    let draft = ProductDraft {
        name: format!("{name} {size}"),
        barcode: Some(format!("590{category}{seed:09}")),
        price_cents,
        cost_cents: Some(price_cents * cost_pct / 100),
    };

    // Every seventh product starts empty so out-of-stock paths are visible.
    let stock = if seed % 7 == 0 { 0 } else { (seed % 41) as i64 };

    (draft, stock)
}

fn non_empty(s: &str) -> Option<String> {
    (!s.is_empty()).then(|| s.to_string())
}
