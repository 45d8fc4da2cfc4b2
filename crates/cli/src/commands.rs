//! Command-line surface: argument parsing and command execution.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};

use stockroom_core::DomainError;
use stockroom_inventory::{
    write_csv, InventoryManager, InventoryStore, SellOutcome, SharedProduct,
};
use stockroom_observability::LogFormat;
use stockroom_products::ProductId;

/// Single-user inventory tracker.
#[derive(Parser, Debug)]
#[command(name = "stockroom")]
#[command(about = "Track product stock, prices and categories in a local file")]
pub struct Cli {
    /// Inventory data file (overrides STOCKROOM_DATA_FILE)
    #[arg(long, global = true)]
    pub data_file: Option<PathBuf>,

    /// Log format: text or json (overrides STOCKROOM_LOG_FORMAT)
    #[arg(long, global = true)]
    pub log_format: Option<LogFormat>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Add a product, replacing any product with the same id
    #[command(allow_negative_numbers = true)]
    Add {
        id: i64,
        name: String,
        quantity: i64,
        threshold: i64,
        #[arg(long)]
        price: Option<f64>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Sell units of a product
    #[command(allow_negative_numbers = true)]
    Sell { id: i64, quantity: i64 },
    /// Add units to a product (negative amounts reduce stock)
    #[command(allow_negative_numbers = true)]
    Restock { id: i64, quantity: i64 },
    /// Delete a product
    Delete { id: i64 },
    /// Update a product's price (negative prices are ignored)
    #[command(allow_negative_numbers = true)]
    Price { id: i64, value: f64 },
    /// Show every field of one product
    Show { id: i64 },
    /// List all products
    List,
    /// Case-insensitive name search; no term lists everything
    Search { term: Option<String> },
    /// List products in a category (exact match)
    Category { name: String },
    /// List distinct categories
    Categories,
    /// List products at or below their low-stock threshold
    LowStock,
    /// Print the total inventory value
    Value,
    /// Export products as CSV, optionally narrowed like `search` and `category`
    Export {
        /// Output file ("-" for stdout)
        #[arg(long, short)]
        output: Option<PathBuf>,
        /// Only products whose name contains this term (case-insensitive)
        #[arg(long)]
        search: Option<String>,
        /// Only products in this category (exact match)
        #[arg(long)]
        category: Option<String>,
    },
}

impl Command {
    /// Whether the command changes the inventory and needs a save afterwards.
    pub fn mutates(&self) -> bool {
        matches!(
            self,
            Command::Add { .. }
                | Command::Sell { .. }
                | Command::Restock { .. }
                | Command::Delete { .. }
                | Command::Price { .. }
        )
    }
}

/// Run one command against `manager`, writing user-facing output to `out`.
///
/// Mutating commands save the inventory afterwards. Validation failures are
/// returned as errors; unknown ids are reported on `out` and are not errors.
pub fn execute<S, W>(
    manager: &mut InventoryManager<S>,
    command: &Command,
    export_file: &Path,
    out: &mut W,
) -> anyhow::Result<()>
where
    S: InventoryStore,
    W: Write,
{
    let Err(err) = run_command(manager, command, export_file, out) else {
        return Ok(());
    };

    let soft = err
        .downcast_ref::<DomainError>()
        .filter(|e| !e.is_hard())
        .map(soft_message);
    match soft {
        Some(message) => {
            tracing::info!(%message, "command had no effect");
            writeln!(out, "{message}")?;
            Ok(())
        }
        None => Err(err),
    }
}

fn soft_message(err: &DomainError) -> String {
    match err {
        DomainError::NotFound(what) => format!("{what} not found"),
        other => other.to_string(),
    }
}

fn run_command<S, W>(
    manager: &mut InventoryManager<S>,
    command: &Command,
    export_file: &Path,
    out: &mut W,
) -> anyhow::Result<()>
where
    S: InventoryStore,
    W: Write,
{
    match command {
        Command::Add {
            id,
            name,
            quantity,
            threshold,
            price,
            category,
            description,
        } => {
            let handle = manager.add_product(name, *quantity, *threshold, ProductId(*id))?;
            {
                let mut product = handle.borrow_mut();
                if let Some(price) = price {
                    product.set_price(*price);
                }
                if category.is_some() {
                    product.set_category(category.clone());
                }
                if description.is_some() {
                    product.set_description(description.clone());
                }
            }
            writeln!(out, "Added {}", handle.borrow())?;
        }
        Command::Sell { id, quantity } => match manager.sell_product(ProductId(*id), *quantity)? {
            SellOutcome::NotFound => writeln!(out, "Product {id} not found")?,
            SellOutcome::Sold {
                remaining,
                low_stock,
            } => {
                writeln!(out, "Sold {quantity} of product {id}; {remaining} left")?;
                if low_stock {
                    writeln!(out, "Low stock: product {id}")?;
                }
            }
        },
        Command::Restock { id, quantity } => {
            if manager.restock_product(ProductId(*id), *quantity) {
                writeln!(out, "Restocked product {id} by {quantity}")?;
            } else {
                writeln!(out, "Product {id} not found")?;
            }
        }
        Command::Delete { id } => {
            if manager.delete_product(ProductId(*id)) {
                writeln!(out, "Deleted product {id}")?;
            } else {
                writeln!(out, "Product {id} not found")?;
            }
        }
        Command::Price { id, value } => match manager.get_product(ProductId(*id)) {
            None => writeln!(out, "Product {id} not found")?,
            Some(handle) => {
                if handle.borrow_mut().update_price(*value) {
                    writeln!(out, "Price of product {id} set to {value:.2}")?;
                } else {
                    writeln!(out, "Ignored invalid price {value} for product {id}")?;
                }
            }
        },
        Command::Show { id } => {
            let handle = manager.require_product(ProductId(*id))?;
            write_details(out, &handle)?;
        }
        Command::List => write_listing(out, &manager.all_products())?,
        Command::Search { term } => {
            write_listing(out, &manager.search_products(term.as_deref()))?
        }
        Command::Category { name } => {
            write_listing(out, &manager.products_by_category(Some(name.as_str())))?
        }
        Command::Categories => {
            for category in manager.categories() {
                writeln!(out, "{category}")?;
            }
        }
        Command::LowStock => {
            writeln!(out, "Low stock items:")?;
            write_listing(out, &manager.low_stock_products())?;
        }
        Command::Value => writeln!(out, "${:.2}", manager.total_inventory_value())?,
        Command::Export {
            output,
            search,
            category,
        } => {
            let mut products = manager.search_products(search.as_deref());
            if let Some(category) = category {
                products.retain(|p| p.borrow().category() == Some(category.as_str()));
            }

            let target = output.as_deref().unwrap_or(export_file);
            if target == Path::new("-") {
                write_csv(&mut *out, &products)?;
            } else {
                let file = File::create(target)
                    .with_context(|| format!("failed to create export file {target:?}"))?;
                write_csv(BufWriter::new(file), &products)
                    .with_context(|| format!("failed to write export file {target:?}"))?;
                writeln!(
                    out,
                    "Exported {} products to {}",
                    products.len(),
                    target.display()
                )?;
            }
        }
    }

    if command.mutates() {
        manager
            .save_inventory()
            .context("error saving inventory")?;
    }
    Ok(())
}

fn write_listing<W: Write>(out: &mut W, products: &[SharedProduct]) -> std::io::Result<()> {
    for product in products {
        writeln!(out, "{}", product.borrow())?;
    }
    Ok(())
}

fn write_details<W: Write>(out: &mut W, handle: &SharedProduct) -> std::io::Result<()> {
    let product = handle.borrow();
    writeln!(out, "ID:          {}", product.id_typed())?;
    writeln!(out, "Name:        {}", product.name())?;
    writeln!(out, "Quantity:    {}", product.quantity())?;
    writeln!(out, "Threshold:   {}", product.quantity_threshold())?;
    writeln!(out, "Price:       ${:.2}", product.price())?;
    writeln!(out, "Category:    {}", product.category().unwrap_or("N/A"))?;
    writeln!(out, "Description: {}", product.description().unwrap_or("N/A"))?;
    writeln!(out, "Total value: ${:.2}", product.total_value())?;
    writeln!(
        out,
        "Low stock:   {}",
        if product.is_low_stock() { "Yes" } else { "No" }
    )?;
    match product.last_updated() {
        Some(at) => writeln!(out, "Updated:     {}", at.to_rfc3339()),
        None => writeln!(out, "Updated:     never"),
    }
}
