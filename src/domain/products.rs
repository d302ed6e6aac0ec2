//! Product input rules: creation validation and partial-update merging.

use crate::domain::entities::{Price, ProductRecord};
use crate::domain::error::DomainError;

/// Matches the `VARCHAR(100)` bound of `products.name`.
pub const MAX_NAME_CHARS: usize = 100;

/// Validated fields for a product that does not exist yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: Price,
}

impl NewProduct {
    pub fn new(name: &str, description: &str, price: Price) -> Result<Self, DomainError> {
        let name = name.trim();
        ensure_non_empty(name, "name")?;
        ensure_name_length(name)?;

        let description = description.trim();
        ensure_non_empty(description, "description")?;

        Ok(Self {
            name: name.to_string(),
            description: description.to_string(),
            price,
        })
    }
}

/// Field changes requested by an update. Blank strings and a zero price count
/// as "not provided". Sub-cent amounts never get here as zero:
/// [`Price::from_decimal`] rejects them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Price>,
}

impl ProductPatch {
    pub fn new(
        name: Option<String>,
        description: Option<String>,
        price: Option<Price>,
    ) -> Result<Self, DomainError> {
        let name = non_blank(name);
        if let Some(name) = name.as_deref() {
            ensure_name_length(name)?;
        }

        Ok(Self {
            name,
            description: non_blank(description),
            price: price.filter(|price| !price.is_zero()),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none() && self.price.is_none()
    }

    /// Merge onto the current record, returning the fields to persist.
    pub fn apply(&self, current: &ProductRecord) -> NewProduct {
        NewProduct {
            name: self.name.clone().unwrap_or_else(|| current.name.clone()),
            description: self
                .description
                .clone()
                .unwrap_or_else(|| current.description.clone()),
            price: self.price.unwrap_or(current.price),
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

fn ensure_non_empty(value: &str, field: &'static str) -> Result<(), DomainError> {
    if value.is_empty() {
        return Err(DomainError::validation(format!("{field} must not be empty")));
    }
    Ok(())
}

fn ensure_name_length(name: &str) -> Result<(), DomainError> {
    if name.chars().count() > MAX_NAME_CHARS {
        return Err(DomainError::validation(format!(
            "name must be at most {MAX_NAME_CHARS} characters"
        )));
    }
    Ok(())
}
