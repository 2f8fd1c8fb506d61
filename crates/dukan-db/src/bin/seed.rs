//! # Seed Data Generator
//!
//! Populates the database with a demo shop for development.
//!
//! ## Usage
//! ```bash
//! # Seed ./dukan_dev.db (default)
//! cargo run -p dukan-db --bin seed
//!
//! # Specify database path and number of demo sales
//! cargo run -p dukan-db --bin seed -- --db ./data/dukan.db --sales 40
//! ```
//!
//! ## Generated Data
//! - One Premium demo account (plus an admin account)
//! - A small grocery catalog with Urdu/Pashto names and a few low-stock items
//! - Three coupons (`EID50`, `WELCOME20`, `RAMZAN100`)
//! - A week of expenses
//! - Demo sales posted through the same atomic commit path as the app

use chrono::{Duration, Months, Utc};
use std::env;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use dukan_core::{AccountRole, Cart, CustomerInfo, Expense, Money, PaymentMethod, Product, SubscriptionTier};
use dukan_db::{generate_product_id, Database, DbConfig, NewSale};

/// (English, Urdu, Pashto, buy, sell, quantity, unit)
const CATALOG: &[(&str, &str, &str, i64, i64, i64, &str)] = &[
    ("Basmati Rice 5kg", "باسمتی چاول", "باسمتي وريجې", 1_450, 1_700, 40, "bag"),
    ("Sugar 1kg", "چینی", "بوره", 140, 160, 60, "kg"),
    ("Cooking Oil 1L", "کوکنگ آئل", "د پخلي غوړي", 520, 590, 25, "bottle"),
    ("Tea 950g", "چائے", "چای", 1_200, 1_380, 18, "pack"),
    ("Flour 10kg", "آٹا", "اوړه", 1_100, 1_250, 12, "bag"),
    ("Lentils 1kg", "دال", "دال", 300, 360, 3, "kg"),
    ("Salt 800g", "نمک", "مالګه", 45, 60, 2, "pack"),
    ("Milk Pack 1L", "دودھ", "شیدې", 250, 280, 30, "pack"),
];

/// (description, category, amount in rupees, days ago)
const EXPENSES: &[(&str, &str, i64, i64)] = &[
    ("Shop rent", "rent", 15_000, 6),
    ("Electricity bill", "utilities", 3_200, 4),
    ("Delivery van fuel", "transport", 1_800, 2),
    ("Cleaning supplies", "supplies", 450, 0),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn,dukan_db=info")),
        )
        .init();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut sales: usize = 25;
    let mut db_path = String::from("./dukan_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--sales" | "-s" => {
                if i + 1 < args.len() {
                    sales = args[i + 1].parse().unwrap_or(25);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Dukan Ledger Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -s, --sales <N>    Number of demo sales to post (default: 25)");
                println!("  -d, --db <PATH>    Database file path (default: ./dukan_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Dukan Ledger Seed Data Generator");
    println!("===================================");
    println!("Database: {}", db_path);
    println!("Sales:    {}", sales);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.accounts().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} accounts", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let now = Utc::now();

    // Accounts
    let shop = db.accounts().create("Al-Madina General Store", SubscriptionTier::Free).await?;
    db.accounts()
        .set_subscription(&shop.id, SubscriptionTier::Premium, now.checked_add_months(Months::new(1)))
        .await?;
    let admin = db.accounts().create("Dukan Admin", SubscriptionTier::Free).await?;
    db.accounts().set_role(&admin.id, AccountRole::Admin).await?;
    println!("✓ Created demo account {}", shop.id);
    println!("✓ Created admin account {}", admin.id);

    // Catalog
    let mut products = Vec::with_capacity(CATALOG.len());
    for &(name_en, name_ur, name_ps, buy, sell, quantity, unit) in CATALOG {
        let product = Product {
            id: generate_product_id(),
            account_id: shop.id.clone(),
            name_en: name_en.to_string(),
            name_ur: Some(name_ur.to_string()),
            name_ps: Some(name_ps.to_string()),
            purchase_price_cents: Money::from_major(buy).cents(),
            selling_price_cents: Money::from_major(sell).cents(),
            quantity,
            unit: unit.to_string(),
            category: Some("grocery".to_string()),
            low_stock_threshold: 5,
            created_at: now,
            updated_at: now,
        };
        db.products().insert(&product).await?;
        products.push(product);
    }
    println!("✓ Inserted {} products", products.len());

    // Coupons
    db.coupons().create("EID50", Money::from_major(50), 100, None).await?;
    db.coupons().create("WELCOME20", Money::from_major(20), 500, None).await?;
    db.coupons()
        .create("RAMZAN100", Money::from_major(100), 50, Some(now + Duration::days(30)))
        .await?;
    println!("✓ Created 3 coupons");

    // Expenses
    for &(description, category, amount, days_ago) in EXPENSES {
        db.expenses()
            .insert(&Expense {
                id: Uuid::new_v4().to_string(),
                account_id: shop.id.clone(),
                description: description.to_string(),
                amount_cents: Money::from_major(amount).cents(),
                category: Some(category.to_string()),
                expense_date: (now - Duration::days(days_ago)).date_naive(),
                notes: None,
                created_at: now,
            })
            .await?;
    }
    println!("✓ Recorded {} expenses", EXPENSES.len());

    // Sales, spread over the last week
    println!();
    println!("Posting demo sales...");
    let start = std::time::Instant::now();
    let methods = [PaymentMethod::Cash, PaymentMethod::Card, PaymentMethod::Online];
    let mut posted = 0;

    for n in 0..sales {
        let mut cart = Cart::new();
        for offset in 0..(1 + n % 3) {
            let product = &products[(n + offset * 3) % products.len()];
            let current = db.products().get_by_id(&shop.id, &product.id).await?;
            if let Some(current) = current {
                // Out-of-stock picks are simply skipped
                let _ = cart.add_item(&current, 1 + (n % 2) as i64);
            }
        }
        if cart.is_empty() {
            continue;
        }

        let hours_ago = ((n * 7) % (24 * 7)) as i64;
        let new_sale = NewSale {
            account_id: &shop.id,
            lines: cart.lines(),
            payment_method: methods[n % methods.len()],
            customer: CustomerInfo::default(),
            created_at: now - Duration::hours(hours_ago),
        };

        match db.sales().commit_sale(&new_sale).await {
            Ok(_) => posted += 1,
            Err(e) => eprintln!("Failed to post sale {}: {}", n, e),
        }
    }

    println!("✓ Posted {} sales in {:?}", posted, start.elapsed());

    let low = db.products().low_stock(&shop.id).await?;
    println!("  Low stock products: {}", low.len());

    println!();
    println!("✓ Seed complete!");
    println!("  export DUKAN_ACCOUNT_ID={}", shop.id);

    Ok(())
}
