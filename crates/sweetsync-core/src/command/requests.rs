// ── Typed request structs for Command payloads ──
//
// Validation lives here and is invoked by callers before a command is
// executed; the session itself forwards whatever it is given.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateItemRequest {
    pub name: String,
    pub category: String,
    pub price: f64,
    pub quantity: u32,
}

impl CreateItemRequest {
    pub fn validate(&self) -> Result<(), CoreError> {
        require_text("name", &self.name)?;
        require_text("category", &self.category)?;
        require_price(self.price)
    }
}

/// Partial update. Unset fields are left untouched by the service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateItemRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u32>,
}

impl UpdateItemRequest {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.category.is_none() && self.price.is_none() && self.quantity.is_none()
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.is_empty() {
            return Err(CoreError::ValidationFailed {
                message: "update must change at least one field".into(),
            });
        }
        if let Some(name) = &self.name {
            require_text("name", name)?;
        }
        if let Some(category) = &self.category {
            require_text("category", category)?;
        }
        if let Some(price) = self.price {
            require_price(price)?;
        }
        Ok(())
    }
}

/// Restock amounts must be at least one unit.
pub fn validate_restock_quantity(quantity: u32) -> Result<(), CoreError> {
    if quantity == 0 {
        return Err(CoreError::ValidationFailed {
            message: "restock quantity must be at least 1".into(),
        });
    }
    Ok(())
}

fn require_text(field: &str, value: &str) -> Result<(), CoreError> {
    if value.trim().is_empty() {
        return Err(CoreError::ValidationFailed {
            message: format!("{field} must not be empty"),
        });
    }
    Ok(())
}

fn require_price(price: f64) -> Result<(), CoreError> {
    if !price.is_finite() || price < 0.0 {
        return Err(CoreError::ValidationFailed {
            message: format!("price must be a non-negative number, got {price}"),
        });
    }
    Ok(())
}
