use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockroom_core::{DomainError, DomainResult, Entity};

/// Product identifier (the inventory's single lookup key).
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub i64);

impl core::fmt::Display for ProductId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Entity: Product.
///
/// Only `quantity`, `price`, `category`, `description` and `last_updated` change
/// after construction. `last_updated` is stamped by [`Product::sell`] and by a
/// successful [`Product::update_price`]; restocking and the plain setters leave
/// it alone.
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    id: ProductId,
    name: String,
    quantity: i64,
    quantity_threshold: i64,
    price: f64,
    category: Option<String>,
    description: Option<String>,
    last_updated: Option<DateTime<Utc>>,
}

impl Product {
    /// Create a product with zero price and no category/description.
    pub fn new(name: &str, quantity: i64, threshold: i64, id: ProductId) -> DomainResult<Self> {
        let name = validated_name(name)?;
        if quantity < 0 {
            return Err(DomainError::validation("quantity cannot be negative"));
        }
        validate_threshold(threshold)?;
        validate_id(id)?;

        Ok(Self {
            id,
            name,
            quantity,
            quantity_threshold: threshold,
            price: 0.0,
            category: None,
            description: None,
            last_updated: None,
        })
    }

    pub fn id_typed(&self) -> ProductId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn quantity(&self) -> i64 {
        self.quantity
    }

    pub fn quantity_threshold(&self) -> i64 {
        self.quantity_threshold
    }

    pub fn price(&self) -> f64 {
        self.price
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.last_updated
    }

    /// Sell `amount` units, stamping `last_updated` with the current time.
    pub fn sell(&mut self, amount: i64) -> DomainResult<()> {
        self.sell_at(amount, Utc::now())
    }

    /// Sell `amount` units, stamping `last_updated` with `at`.
    ///
    /// Requires `0 < amount <= quantity`.
    pub fn sell_at(&mut self, amount: i64, at: DateTime<Utc>) -> DomainResult<()> {
        if amount <= 0 {
            return Err(DomainError::validation("sell amount must be positive"));
        }
        if amount > self.quantity {
            return Err(DomainError::validation(format!(
                "not enough stock to sell {amount} of {} (available: {})",
                self.name, self.quantity
            )));
        }

        self.quantity -= amount;
        self.last_updated = Some(at);
        Ok(())
    }

    /// Add `amount` to the stock level.
    ///
    /// Negative amounts are applied as-is and may drive the quantity below zero.
    /// The result saturates at the `i64` bounds instead of overflowing.
    pub fn restock(&mut self, amount: i64) {
        self.quantity = self.quantity.saturating_add(amount);
    }

    pub fn is_low_stock(&self) -> bool {
        self.quantity <= self.quantity_threshold
    }

    /// Overwrite the price without validation or timestamping.
    pub fn set_price(&mut self, price: f64) {
        self.price = price;
    }

    /// Set the price if `price >= 0`, stamping `last_updated` with the current time.
    ///
    /// Returns whether the price was applied; negative prices are ignored.
    pub fn update_price(&mut self, price: f64) -> bool {
        self.update_price_at(price, Utc::now())
    }

    pub fn update_price_at(&mut self, price: f64, at: DateTime<Utc>) -> bool {
        // NaN compares false here too, so it is ignored along with negatives.
        if price >= 0.0 {
            self.price = price;
            self.last_updated = Some(at);
            true
        } else {
            false
        }
    }

    pub fn set_category(&mut self, category: Option<String>) {
        self.category = category;
    }

    pub fn set_description(&mut self, description: Option<String>) {
        self.description = description;
    }

    /// Stock value at the current price (`price * quantity`).
    pub fn total_value(&self) -> f64 {
        self.price * self.quantity as f64
    }

    /// Plain copy of every field, suitable for persistence.
    pub fn snapshot(&self) -> ProductSnapshot {
        ProductSnapshot {
            id: self.id,
            name: self.name.clone(),
            quantity: self.quantity,
            quantity_threshold: self.quantity_threshold,
            price: self.price,
            category: self.category.clone(),
            description: self.description.clone(),
            last_updated: self.last_updated,
        }
    }

    /// Rehydrate a product from a snapshot.
    ///
    /// Name, threshold and id are re-validated. Quantity is not: a negative
    /// restock can legitimately leave it below zero.
    pub fn restore(snapshot: ProductSnapshot) -> DomainResult<Self> {
        let name = validated_name(&snapshot.name)?;
        validate_threshold(snapshot.quantity_threshold)?;
        validate_id(snapshot.id)?;

        Ok(Self {
            id: snapshot.id,
            name,
            quantity: snapshot.quantity,
            quantity_threshold: snapshot.quantity_threshold,
            price: snapshot.price,
            category: snapshot.category,
            description: snapshot.description,
            last_updated: snapshot.last_updated,
        })
    }
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl core::fmt::Display for Product {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "{}: {} (Low threshold: {}) - {}",
            self.name, self.quantity, self.quantity_threshold, self.id
        )
    }
}

/// Serializable record of a product's full state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductSnapshot {
    pub id: ProductId,
    pub name: String,
    pub quantity: i64,
    pub quantity_threshold: i64,
    #[serde(default, with = "price_repr")]
    pub price: f64,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
}

/// JSON has no NaN or infinities, so non-finite prices are written as the
/// strings `"NaN"`, `"inf"` and `"-inf"`. A `null` price reads back as NaN.
mod price_repr {
    use serde::{Deserialize, Deserializer, Serializer, de};

    pub fn serialize<S: Serializer>(price: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if price.is_finite() {
            serializer.serialize_f64(*price)
        } else if price.is_nan() {
            serializer.serialize_str("NaN")
        } else if price.is_sign_positive() {
            serializer.serialize_str("inf")
        } else {
            serializer.serialize_str("-inf")
        }
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Number(f64),
        Text(String),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        match Option::<Repr>::deserialize(deserializer)? {
            Some(Repr::Number(price)) => Ok(price),
            Some(Repr::Text(text)) => match text.as_str() {
                "NaN" => Ok(f64::NAN),
                "inf" => Ok(f64::INFINITY),
                "-inf" => Ok(f64::NEG_INFINITY),
                other => Err(de::Error::invalid_value(
                    de::Unexpected::Str(other),
                    &"a number, \"NaN\", \"inf\" or \"-inf\"",
                )),
            },
            None => Ok(f64::NAN),
        }
    }
}

fn validated_name(name: &str) -> DomainResult<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation("name cannot be empty"));
    }
    Ok(trimmed.to_string())
}

fn validate_threshold(threshold: i64) -> DomainResult<()> {
    if threshold < 0 {
        return Err(DomainError::validation("quantity threshold cannot be negative"));
    }
    Ok(())
}

fn validate_id(id: ProductId) -> DomainResult<()> {
    if id.0 < 0 {
        return Err(DomainError::validation("product id cannot be negative"));
    }
    Ok(())
}
