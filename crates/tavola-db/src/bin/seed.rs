//! # Seed Data Loader
//!
//! Populates a database with the pub's menu and tables for development.
//!
//! ## Usage
//! ```bash
//! # Seed ./tavola_dev.db
//! cargo run -p tavola-db --bin seed
//!
//! # Specify database path and the public URL printed in QR codes
//! cargo run -p tavola-db --bin seed -- --db ./data/tavola.db --app-url https://order.example.com
//! ```
//!
//! ## Seeded Data
//! - 10 categories, appetizers through soft drinks
//! - 9 menu items (3 appetizers, 3 burgers, 3 beers with abv/origin/style)
//! - Tables 1-10: 1-6 seat four, 7-10 seat six

use std::env;

use anyhow::Context;
use chrono::Utc;
use tavola_core::{Allergen, Category, MenuItem, Table};
use tavola_db::{Database, DbConfig};
use tavola_core::Allergen::{Celery, Dairy, Eggs, Gluten, Soy};
use uuid::Uuid;

/// (slug, name, Italian name, display order)
const CATEGORIES: &[(&str, &str, &str, i64)] = &[
    ("appetizers", "Appetizers", "Stuzzicherie", 1),
    ("burgers", "Burgers", "Hamburger", 2),
    ("sandwiches", "Sandwiches", "Panini", 3),
    ("salads", "Salads", "Insalate", 4),
    ("sides", "Sides", "Contorni", 5),
    ("desserts", "Desserts", "Dolci", 6),
    ("beers", "Beers", "Birre", 7),
    ("wines", "Wines", "Vini", 8),
    ("cocktails", "Cocktails", "Cocktails", 9),
    ("soft-drinks", "Soft Drinks", "Analcolici", 10),
];

struct Dish {
    category: &'static str,
    name: &'static str,
    name_it: &'static str,
    description: &'static str,
    description_it: &'static str,
    price_cents: i64,
    allergens: &'static [Allergen],
    featured: bool,
    /// (abv, origin, style)
    beer: Option<(f64, &'static str, &'static str)>,
}

const DISHES: &[Dish] = &[
    Dish {
        category: "appetizers",
        name: "Nachos Supreme",
        name_it: "Nachos Supremi",
        description: "Crispy tortilla chips with melted cheese, jalapeños, sour cream, and guacamole",
        description_it: "Nachos croccanti con formaggio fuso, jalapeños, panna acida e guacamole",
        price_cents: 850,
        allergens: &[Gluten, Dairy],
        featured: false,
        beer: None,
    },
    Dish {
        category: "appetizers",
        name: "Chicken Wings",
        name_it: "Alette di Pollo",
        description: "Spicy buffalo wings served with blue cheese dip (8 pieces)",
        description_it: "Alette piccanti buffalo con salsa al formaggio blu (8 pezzi)",
        price_cents: 900,
        allergens: &[Dairy, Celery],
        featured: false,
        beer: None,
    },
    Dish {
        category: "appetizers",
        name: "Mozzarella Sticks",
        name_it: "Bastoncini di Mozzarella",
        description: "Deep-fried mozzarella sticks with marinara sauce (6 pieces)",
        description_it: "Bastoncini di mozzarella fritti con salsa marinara (6 pezzi)",
        price_cents: 700,
        allergens: &[Gluten, Dairy, Eggs],
        featured: false,
        beer: None,
    },
    Dish {
        category: "burgers",
        name: "Classic Cheeseburger",
        name_it: "Cheeseburger Classico",
        description: "200g beef patty, cheddar cheese, lettuce, tomato, pickles, special sauce",
        description_it: "Hamburger 200g, cheddar, lattuga, pomodoro, sottaceti, salsa speciale",
        price_cents: 1200,
        allergens: &[Gluten, Dairy, Eggs],
        featured: true,
        beer: None,
    },
    Dish {
        category: "burgers",
        name: "Bacon BBQ Burger",
        name_it: "Burger Bacon BBQ",
        description: "200g beef patty, crispy bacon, BBQ sauce, onion rings, cheddar cheese",
        description_it: "Hamburger 200g, bacon croccante, salsa BBQ, onion rings, cheddar",
        price_cents: 1400,
        allergens: &[Gluten, Dairy, Eggs],
        featured: true,
        beer: None,
    },
    Dish {
        category: "burgers",
        name: "Veggie Burger",
        name_it: "Burger Vegetariano",
        description: "Plant-based patty, lettuce, tomato, avocado, vegan mayo",
        description_it: "Hamburger vegetale, lattuga, pomodoro, avocado, maionese vegana",
        price_cents: 1100,
        allergens: &[Gluten, Soy],
        featured: false,
        beer: None,
    },
    Dish {
        category: "beers",
        name: "Guinness Draught",
        name_it: "Guinness alla Spina",
        description: "Iconic Irish stout with rich, creamy head",
        description_it: "Iconica stout irlandese con schiuma ricca e cremosa",
        price_cents: 600,
        allergens: &[Gluten],
        featured: true,
        beer: Some((4.2, "Ireland", "Stout")),
    },
    Dish {
        category: "beers",
        name: "Peroni Nastro Azzurro",
        name_it: "Peroni Nastro Azzurro",
        description: "Premium Italian lager, crisp and refreshing",
        description_it: "Lager italiana premium, fresca e dissetante",
        price_cents: 500,
        allergens: &[Gluten],
        featured: false,
        beer: Some((5.1, "Italy", "Lager")),
    },
    Dish {
        category: "beers",
        name: "London Pride",
        name_it: "London Pride",
        description: "Classic British ale with balanced malt and hop flavors",
        description_it: "Ale britannica classica con sapori bilanciati di malto e luppolo",
        price_cents: 550,
        allergens: &[Gluten],
        featured: false,
        beer: Some((4.7, "England", "Ale")),
    },
];

const TABLE_COUNT: u32 = 10;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,sqlx=warn".into()),
        )
        .init();

    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./tavola_dev.db");
    let mut app_url = String::from("http://localhost:3000");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--app-url" | "-u" => {
                if i + 1 < args.len() {
                    app_url = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Tavola Seed Data Loader");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>       Database file path (default: ./tavola_dev.db)");
                println!("  -u, --app-url <URL>   Public app URL for table links (default: http://localhost:3000)");
                println!("  -h, --help            Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Tavola Seed Data Loader");
    println!("=======================");
    println!("Database: {}", db_path);
    println!("App URL:  {}", app_url);
    println!();

    let db = Database::new(DbConfig::new(&db_path))
        .await
        .with_context(|| format!("opening {}", db_path))?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.menu().count_items().await?;
    if existing > 0 {
        println!("⚠ Database already has {} menu items", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let menu = db.menu();
    for (slug, name, name_it, display_order) in CATEGORIES {
        menu.insert_category(&Category {
            id: category_id(slug),
            slug: slug.to_string(),
            name: name.to_string(),
            name_it: name_it.to_string(),
            display_order: *display_order,
        })
        .await
        .with_context(|| format!("inserting category {}", slug))?;
    }
    println!("✓ {} categories", CATEGORIES.len());

    for dish in DISHES {
        menu.insert_item(&menu_item(dish))
            .await
            .with_context(|| format!("inserting {}", dish.name))?;
    }
    println!("✓ {} menu items", DISHES.len());

    let tables = db.tables();
    for n in 1..=TABLE_COUNT {
        let id = Uuid::new_v4().to_string();
        tables
            .insert(&Table {
                ordering_url: Some(Table::ordering_url_for(&app_url, &id)),
                id,
                number: n.to_string(),
                capacity: if n <= 6 { 4 } else { 6 },
                active: true,
                created_at: Utc::now(),
            })
            .await
            .with_context(|| format!("inserting table {}", n))?;
    }
    println!("✓ {} tables", TABLE_COUNT);

    println!();
    println!("✓ Seed complete!");

    db.close().await;
    Ok(())
}

fn category_id(slug: &str) -> String {
    format!("cat-{}", slug)
}

fn menu_item(dish: &Dish) -> MenuItem {
    let (abv, origin, style) = match dish.beer {
        Some((abv, origin, style)) => (Some(abv), Some(origin.to_string()), Some(style.to_string())),
        None => (None, None, None),
    };

    MenuItem {
        id: Uuid::new_v4().to_string(),
        category_id: category_id(dish.category),
        name: dish.name.to_string(),
        name_it: dish.name_it.to_string(),
        description: Some(dish.description.to_string()),
        description_it: Some(dish.description_it.to_string()),
        price_cents: dish.price_cents,
        allergens: dish.allergens.to_vec(),
        available: true,
        featured: dish.featured,
        abv,
        origin,
        style,
    }
}
