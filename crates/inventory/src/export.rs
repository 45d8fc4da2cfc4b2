//! CSV export of the product list.

use std::borrow::Cow;
use std::io::Write;

use crate::manager::SharedProduct;

/// Default export file, relative to the working directory.
pub const DEFAULT_EXPORT_FILE: &str = "inventory_export.csv";

pub const CSV_HEADER: &str = "ID,Name,Quantity,Price,Category,Threshold,Low Stock,Total Value";

/// Write `products` as CSV: header first, then one row per product.
pub fn write_csv<W: Write>(mut writer: W, products: &[SharedProduct]) -> std::io::Result<()> {
    writeln!(writer, "{CSV_HEADER}")?;
    for handle in products {
        let product = handle.borrow();
        writeln!(
            writer,
            "{},{},{},{:.2},{},{},{},{:.2}",
            product.id_typed(),
            escape(product.name()),
            product.quantity(),
            product.price(),
            escape(product.category().unwrap_or("")),
            product.quantity_threshold(),
            if product.is_low_stock() { "Yes" } else { "No" },
            product.total_value(),
        )?;
    }
    writer.flush()
}

fn escape(field: &str) -> Cow<'_, str> {
    if field.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}
