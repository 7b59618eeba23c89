//! # Seed Data Generator
//!
//! Populates the database with a small, coherent data set for development.
//!
//! ## Usage
//! ```bash
//! # Seed ./stockroom_dev.db (default)
//! cargo run -p stockroom-db --bin seed
//!
//! # Specify database URL
//! cargo run -p stockroom-db --bin seed -- --db sqlite://./data/stockroom.db
//! ```
//!
//! ## Generated Data
//! - Categories with products (some deliberately at low stock)
//! - Clients
//! - A catalog per category and suppliers linked to them
//! - A few sales, created through the stock-checked sale flow

use std::env;

use anyhow::Context;
use chrono::{Duration, Utc};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use stockroom_core::{
    Catalog, CatalogId, Category, Client, ClientId, NewSale, Percentage, Product, ProductId,
    RecordStatus, SaleLineRequest, Supplier, SupplierId,
};
use stockroom_db::{Database, DbConfig};

/// (category, [(name, purchase unit, quantity included, sale unit, purchase cents, sale cents, stock)])
type ProductSeed = (&'static str, &'static str, i64, &'static str, i64, i64, i64);

const CATEGORIES: &[(&str, &[ProductSeed])] = &[
    (
        "Beverages",
        &[
            ("Sparkling Water 500ml", "crate", 24, "bottle", 1_920, 150, 120),
            ("Orange Juice 1L", "crate", 12, "carton", 2_400, 320, 8),
            ("Cola 2L", "crate", 6, "bottle", 1_500, 390, 45),
            ("Iced Tea 500ml", "crate", 24, "bottle", 2_160, 180, 0),
        ],
    ),
    (
        "Cleaning",
        &[
            ("Dish Soap 750ml", "box", 12, "bottle", 2_880, 399, 30),
            ("Floor Cleaner 1L", "box", 10, "bottle", 3_500, 520, 4),
            ("Sponges (3-pack)", "box", 20, "pack", 2_000, 175, 60),
        ],
    ),
    (
        "Dry Goods",
        &[
            ("Rice 1kg", "sack", 10, "bag", 1_800, 260, 80),
            ("Pasta 500g", "box", 20, "pack", 2_200, 170, 10),
            ("Lentils 500g", "box", 20, "pack", 2_600, 210, 25),
        ],
    ),
];

const CLIENTS: &[(&str, &str, &str)] = &[
    ("Corner Deli", "20-30111222-3", "orders@cornerdeli.example"),
    ("Maria Gomez", "27-28999111-4", "maria.gomez@example.com"),
    ("Hotel Plaza", "30-71555666-9", "purchasing@hotelplaza.example"),
];

const SUPPLIERS: &[(&str, &str, &str)] = &[
    ("Northern Beverages", "Carla Ruiz", "30-70000001-1"),
    ("CleanCo Distribution", "Tom Baker", "30-70000002-2"),
    ("Grain Traders", "Ivan Petrov", "30-70000003-3"),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("seed=info,stockroom_db=warn")),
        )
        .init();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();
    let mut db_url = String::from("sqlite://./stockroom_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if let Some(url) = args.get(i + 1) {
                    db_url = url.clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Stockroom Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <URL>     Database URL (default: sqlite://./stockroom_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            other => warn!(arg = other, "Ignoring unknown argument"),
        }
        i += 1;
    }

    let db = Database::new(DbConfig::new(&db_url))
        .await
        .with_context(|| format!("failed to open {db_url}"))?;

    info!(url = %db_url, "Connected, migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 {
        warn!(existing, "Database already has products, skipping seed");
        return Ok(());
    }

    let start = std::time::Instant::now();
    let now = Utc::now();

    // Categories, products and one catalog per category
    let mut catalogs = Vec::new();
    let mut products = Vec::new();

    for (category_name, rows) in CATEGORIES {
        let category = db.categories().insert(&Category::new(*category_name)).await?;
        let mut product_ids = Vec::new();

        for &(name, purchase_unit, quantity_included, sale_unit, purchase, sale, stock) in *rows {
            let product = db
                .products()
                .insert(&Product {
                    id: ProductId::generate(),
                    name: name.to_string(),
                    category_id: category.id.clone(),
                    purchase_unit: purchase_unit.to_string(),
                    quantity_included,
                    sale_unit: sale_unit.to_string(),
                    purchase_price_cents: purchase,
                    sale_price_cents: sale,
                    stock,
                    status: RecordStatus::Active,
                    created_at: now,
                    updated_at: now,
                })
                .await
                .with_context(|| format!("failed to insert product {name}"))?;

            product_ids.push(product.id.clone());
            products.push(product);
        }

        let catalog = db
            .catalogs()
            .insert(&Catalog {
                id: CatalogId::generate(),
                name: format!("{category_name} price list"),
                file_path: format!(
                    "catalogs/{}.pdf",
                    category_name.to_lowercase().replace(' ', "-")
                ),
                product_ids,
                status: RecordStatus::Active,
                created_at: now,
                updated_at: now,
            })
            .await?;
        catalogs.push(catalog);
    }

    info!(products = products.len(), catalogs = catalogs.len(), "Products seeded");

    // Suppliers, one per catalog
    for ((company, contact, id_number), catalog) in SUPPLIERS.iter().zip(&catalogs) {
        db.suppliers()
            .insert(&Supplier {
                id: SupplierId::generate(),
                id_number: id_number.to_string(),
                company: company.to_string(),
                contact_name: contact.to_string(),
                phone: "555-0300".to_string(),
                bank_account: format!("ACCT-{}", &id_number[3..11]),
                bank_name: "Merchant Bank".to_string(),
                catalog_id: Some(catalog.id.clone()),
                status: RecordStatus::Active,
                created_at: now,
                updated_at: now,
            })
            .await?;
    }

    // Clients
    let mut clients = Vec::new();
    for (full_name, tax_id, email) in CLIENTS {
        let client = db
            .clients()
            .insert(&Client {
                id: ClientId::generate(),
                tax_id: tax_id.to_string(),
                full_name: full_name.to_string(),
                address: "Market Street 100".to_string(),
                references: String::new(),
                phone: "555-0100".to_string(),
                email: email.to_string(),
                credit_cents: 50_000,
                status: RecordStatus::Active,
                created_at: now,
                updated_at: now,
            })
            .await?;
        clients.push(client);
    }

    info!(clients = clients.len(), suppliers = SUPPLIERS.len(), "Parties seeded");

    // A few sales over the last days, through the stock-checked flow
    let mut sales = 0;
    for (day, client) in clients.iter().enumerate() {
        let items = products
            .iter()
            .filter(|p| p.stock >= 5)
            .skip(day)
            .step_by(2)
            .take(3)
            .map(|p| SaleLineRequest {
                product_id: p.id.clone(),
                quantity: 1 + day as i64,
                unit_price_cents: None,
            })
            .collect();

        let result = db
            .sales()
            .create(NewSale {
                client_id: client.id.clone(),
                date: now - Duration::days(day as i64),
                notes: None,
                discount: if day == 0 {
                    Percentage::from_bps(500)
                } else {
                    Percentage::zero()
                },
                items,
                adjust_stock: true,
            })
            .await;

        match result {
            Ok(_) => sales += 1,
            Err(e) => warn!(client = %client.full_name, error = %e, "Sale not seeded"),
        }
    }

    info!(sales, elapsed = ?start.elapsed(), "Seed complete");
    Ok(())
}
