//! Bulk upload file parsing.
//!
//! Two formats are accepted:
//!
//! - CSV with a header row: `name,description,price,stock,categories,image`.
//!   Headers are case-insensitive and the Spanish spellings (`nombre`,
//!   `descripcion`, `precio`, `categorias`, `imagen`) are accepted. Fields
//!   are split on bare commas (no quoting) and `categories` is separated by
//!   `;`.
//! - JSON: an array of objects with the same logical fields, or one object.
//!
//! Rows without a name are dropped and reported, never fatal for the file.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::DEFAULT_IMAGE;
use crate::normalize::{count, saturate_u32, to_decimal};
use crate::types::{Price, Slug};

/// Errors that abort parsing of a whole file.
#[derive(thiserror::Error, Debug)]
pub enum ImportError {
    #[error("unsupported file format: {0} (expected .csv or .json)")]
    UnsupportedFormat(String),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed file: {0}")]
    Malformed(String),
}

/// A validated product row from an upload file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportRow {
    pub name: String,
    pub description: String,
    /// `None` when the price is absent or not a number; the catalog rejects
    /// such records individually.
    pub price: Option<Price>,
    pub stock: u32,
    pub categories: Vec<String>,
    pub image: String,
    pub slug: Slug,
}

/// Parsed rows plus the rows that were dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportBatch {
    pub rows: Vec<ImportRow>,
    /// `(line or index, reason)`; CSV lines are 1-indexed including the header.
    pub dropped: Vec<(usize, String)>,
}

impl ImportBatch {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Raw field values before validation.
#[derive(Debug, Default)]
struct RawRow {
    name: Option<String>,
    description: Option<String>,
    price: Option<Value>,
    stock: Option<Value>,
    categories: Vec<String>,
    image: Option<String>,
    slug: Option<String>,
}

impl RawRow {
    fn validate(self) -> Result<ImportRow, String> {
        let name = self
            .name
            .map(|n| n.trim().to_owned())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| "name is required".to_owned())?;
        let slug = match self.slug.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(explicit) => Slug::from_name(explicit),
            None => Slug::from_name(&name),
        }
        .map_err(|e| e.to_string())?;

        Ok(ImportRow {
            description: self.description.unwrap_or_default().trim().to_owned(),
            price: self.price.as_ref().and_then(to_decimal).map(Price::clamped),
            stock: self.stock.as_ref().and_then(count).map_or(0, saturate_u32),
            categories: self.categories,
            image: self
                .image
                .map(|i| i.trim().to_owned())
                .filter(|i| !i.is_empty())
                .unwrap_or_else(|| DEFAULT_IMAGE.to_owned()),
            slug,
            name,
        })
    }
}

/// Parse CSV text.
#[must_use]
pub fn parse_csv(text: &str) -> ImportBatch {
    let mut lines = text.trim().lines().enumerate();
    let Some((_, header)) = lines.next() else {
        return ImportBatch::default();
    };
    let headers: Vec<String> = header
        .split(',')
        .map(|h| h.trim().to_lowercase())
        .collect();

    let mut batch = ImportBatch::default();
    for (index, line) in lines {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let values: Vec<&str> = line.split(',').map(str::trim).collect();
        let mut raw = RawRow::default();
        for (column, header) in headers.iter().enumerate() {
            let value = values.get(column).copied().unwrap_or_default();
            match header.as_str() {
                "name" | "nombre" => raw.name = Some(value.to_owned()),
                "description" | "descripcion" | "descripción" => {
                    raw.description = Some(value.to_owned());
                }
                "price" | "precio" => raw.price = Some(Value::String(value.to_owned())),
                "stock" => raw.stock = Some(Value::String(value.to_owned())),
                "categories" | "categorias" | "categorías" => {
                    raw.categories = split_list(value, ';');
                }
                "image" | "imagen" => raw.image = Some(value.to_owned()),
                "slug" => raw.slug = Some(value.to_owned()),
                _ => {}
            }
        }
        match raw.validate() {
            Ok(row) => batch.rows.push(row),
            Err(reason) => batch.dropped.push((index + 1, reason)),
        }
    }
    batch
}

/// Parse JSON text.
///
/// # Errors
///
/// Returns [`ImportError::Json`] for invalid JSON and
/// [`ImportError::Malformed`] when the top level is neither an array nor an
/// object.
pub fn parse_json(text: &str) -> Result<ImportBatch, ImportError> {
    let value: Value = serde_json::from_str(text)?;
    let items = match value {
        Value::Array(items) => items,
        object @ Value::Object(_) => vec![object],
        other => {
            return Err(ImportError::Malformed(format!(
                "expected an array of products, found {}",
                json_kind(&other)
            )));
        }
    };

    let mut batch = ImportBatch::default();
    for (index, item) in items.into_iter().enumerate() {
        let Value::Object(obj) = item else {
            batch.dropped.push((index, "entry is not an object".to_owned()));
            continue;
        };
        let text_field = |keys: &[&str]| {
            keys.iter()
                .find_map(|key| obj.get(*key).and_then(Value::as_str))
                .map(str::to_owned)
        };
        let raw = RawRow {
            name: text_field(&["name", "nombre"]),
            description: text_field(&["description", "descripcion"]),
            price: obj.get("price").or_else(|| obj.get("precio")).cloned(),
            stock: obj.get("stock").cloned(),
            categories: match obj.get("categories").or_else(|| obj.get("categorias")) {
                Some(Value::Array(names)) => names
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::trim)
                    .filter(|n| !n.is_empty())
                    .map(str::to_owned)
                    .collect(),
                Some(Value::String(names)) => split_list(names, ','),
                _ => Vec::new(),
            },
            image: text_field(&["image", "imagen"]),
            slug: text_field(&["slug"]),
        };
        match raw.validate() {
            Ok(row) => batch.rows.push(row),
            Err(reason) => batch.dropped.push((index, reason)),
        }
    }
    Ok(batch)
}

/// Parse a file's contents, choosing the format from its extension.
///
/// # Errors
///
/// Returns [`ImportError::UnsupportedFormat`] for extensions other than
/// `.csv` and `.json`, or any error from [`parse_json`].
pub fn parse_file(file_name: &str, text: &str) -> Result<ImportBatch, ImportError> {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match extension.as_str() {
        "csv" => Ok(parse_csv(text)),
        "json" => parse_json(text),
        _ => Err(ImportError::UnsupportedFormat(file_name.to_owned())),
    }
}

fn split_list(value: &str, separator: char) -> Vec<String> {
    value
        .split(separator)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
