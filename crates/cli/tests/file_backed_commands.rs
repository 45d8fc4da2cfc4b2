use std::fs;
use std::path::Path;

use clap::Parser;
use stockroom_cli::{execute, Cli};
use stockroom_inventory::{FileStore, InventoryManager, LoadOutcome};
use stockroom_products::ProductId;

/// Run one CLI invocation the way the binary does: open, execute, drop.
fn invoke(data_file: &Path, export_file: &Path, args: &[&str]) -> anyhow::Result<String> {
    let cli = Cli::try_parse_from(std::iter::once("stockroom").chain(args.iter().copied()))?;
    let (mut manager, _) = InventoryManager::open(FileStore::new(data_file));
    let mut out = Vec::new();
    execute(&mut manager, &cli.command, export_file, &mut out)?;
    Ok(String::from_utf8(out)?)
}

#[test]
fn state_persists_across_invocations() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("inventory.dat");
    let export = dir.path().join("inventory_export.csv");

    invoke(&data, &export, &["add", "1", "Apples", "10", "5", "--price", "0.5"]).unwrap();
    invoke(&data, &export, &["add", "2", "Bananas", "20", "10"]).unwrap();
    invoke(&data, &export, &["sell", "1", "6"]).unwrap();
    invoke(&data, &export, &["restock", "2", "5"]).unwrap();
    invoke(&data, &export, &["delete", "2"]).unwrap();

    let (manager, outcome) = InventoryManager::open(FileStore::new(&data));
    assert_eq!(outcome, LoadOutcome::Loaded { count: 1 });
    let apples = manager.get_product(ProductId(1)).unwrap();
    assert_eq!(apples.borrow().quantity(), 4);
    assert_eq!(apples.borrow().price(), 0.5);
    assert!(!manager.product_exists(ProductId(2)));
}

#[test]
fn export_writes_default_file() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("inventory.dat");
    let export = dir.path().join("inventory_export.csv");

    let add = ["add", "7", "Hammer", "4", "2", "--price", "12.5", "--category", "Tools"];
    invoke(&data, &export, &add).unwrap();
    invoke(&data, &export, &["add", "8", "Apples", "9", "2", "--category", "Fruit"]).unwrap();
    let out = invoke(&data, &export, &["export", "--category", "Tools"]).unwrap();
    assert!(out.starts_with("Exported 1 products to"));

    let csv = fs::read_to_string(&export).unwrap();
    assert_eq!(
        csv,
        "ID,Name,Quantity,Price,Category,Threshold,Low Stock,Total Value\n\
         7,Hammer,4,12.50,Tools,2,No,50.00\n"
    );
}

#[test]
fn show_of_unknown_id_succeeds_with_a_message() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("inventory.dat");
    let export = dir.path().join("inventory_export.csv");

    let out = invoke(&data, &export, &["show", "9"]).unwrap();
    assert_eq!(out, "Product 9 not found\n");
}

#[test]
fn corrupt_data_file_is_replaced_on_next_save() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("inventory.dat");
    let export = dir.path().join("inventory_export.csv");
    fs::write(&data, "garbage").unwrap();

    let out = invoke(&data, &export, &["list"]).unwrap();
    assert!(out.is_empty());

    invoke(&data, &export, &["add", "1", "Apples", "1", "0"]).unwrap();
    let (manager, outcome) = InventoryManager::open(FileStore::new(&data));
    assert_eq!(outcome, LoadOutcome::Loaded { count: 1 });
    assert_eq!(manager.len(), 1);
}

#[test]
fn unknown_subcommand_is_rejected_by_parser() {
    assert!(Cli::try_parse_from(["stockroom", "teleport"]).is_err());
    assert!(Cli::try_parse_from(["stockroom", "sell", "1"]).is_err());
}
