//! Table and JSON output for the command line

use crate::blob::models::BlobListItem;
use crate::error::{AzstoreError, Result};
use crate::file::models::FileListItem;
use serde::Serialize;
use tabled::{
    settings::{object::Rows, Alignment, Modify, Padding, Style},
    Table, Tabled,
};

/// One row of a blob or file listing
#[derive(Debug, Clone, PartialEq, Tabled)]
pub struct ListingRow {
    #[tabled(rename = "Type")]
    pub kind: &'static str,
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "Size")]
    pub size: String,
    #[tabled(rename = "Modified")]
    pub modified: String,
}

impl From<&BlobListItem> for ListingRow {
    fn from(item: &BlobListItem) -> Self {
        match item {
            BlobListItem::Directory { prefix } => Self {
                kind: "dir",
                name: prefix.clone(),
                size: String::new(),
                modified: String::new(),
            },
            BlobListItem::Blob(info) => Self {
                kind: "blob",
                name: info.name.clone(),
                size: display_size(info.size),
                modified: info.last_modified.format("%Y-%m-%d %H:%M:%S").to_string(),
            },
        }
    }
}

impl From<&FileListItem> for ListingRow {
    fn from(item: &FileListItem) -> Self {
        match item {
            FileListItem::Directory { name } => Self {
                kind: "dir",
                name: format!("{name}/"),
                size: String::new(),
                modified: String::new(),
            },
            FileListItem::File { name, size } => Self {
                kind: "file",
                name: name.clone(),
                size: display_size(*size),
                modified: String::new(),
            },
        }
    }
}

/// Single-column row for plain name listings
#[derive(Debug, Clone, Tabled)]
pub struct NameRow {
    #[tabled(rename = "Name")]
    pub name: String,
}

/// Render rows with the default style.
pub fn format_table<T: Tabled>(rows: &[T]) -> String {
    let mut table = Table::new(rows);
    table
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()))
        .with(Padding::new(1, 1, 0, 0));
    table.to_string()
}

pub fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value)
        .map_err(|e| AzstoreError::serialization(format!("Failed to serialize output: {e}")))
}

/// Print `items` as pretty JSON or, through `row`, as a table.
pub fn print_items<T, R, F>(items: &[T], json: bool, row: F) -> Result<()>
where
    T: Serialize,
    R: Tabled,
    F: Fn(&T) -> R,
{
    if json {
        println!("{}", to_json(items)?);
    } else if items.is_empty() {
        println!("No items found");
    } else {
        let rows: Vec<R> = items.iter().map(row).collect();
        println!("{}", format_table(&rows));
    }
    Ok(())
}

/// Binary-prefixed size for listings, e.g. `1.50 KB`. Bytes stay integral.
pub fn display_size(bytes: u64) -> String {
    const UNITS: [&str; 6] = ["B", "KB", "MB", "GB", "TB", "PB"];

    let exponent = match bytes {
        0 => 0,
        n => ((n.ilog2() / 10) as usize).min(UNITS.len() - 1),
    };

    if exponent == 0 {
        return format!("{bytes} B");
    }

    let scaled = bytes as f64 / (1u64 << (10 * exponent)) as f64;
    format!("{scaled:.2} {}", UNITS[exponent])
}
