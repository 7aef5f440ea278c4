use crate::domain::money::Amount;
use crate::error::{CheckoutError, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Catalog identifier of a product, opaque to checkout.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub String);

impl ProductId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One entry of the client-held cart, with the price cached when it was added.
///
/// Orders keep these lines as supplied, so the product reference is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<ProductId>,
    pub price: Amount,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl CartLine {
    pub fn new(product_id: Option<ProductId>, price: Amount) -> Self {
        Self {
            product_id,
            price,
            name: None,
        }
    }
}

/// A cart that passed shape and price validation.
///
/// Lines keep the order the client supplied them in, duplicates included.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn new(lines: Vec<CartLine>) -> Self {
        Self { lines }
    }

    /// Validates a cart as it arrives from the client.
    ///
    /// The cart must be a JSON array. Every element must be an object with a
    /// finite, non-negative numeric `price`; numbers encoded as strings are
    /// rejected. A product identifier (`_id` or `productId`) is kept when present.
    pub fn from_json(raw: Option<&Value>) -> Result<Self> {
        let items = match raw {
            None | Some(Value::Null) => {
                return Err(CheckoutError::InvalidCart("cart is missing".to_string()));
            }
            Some(Value::Array(items)) => items,
            Some(other) => {
                return Err(CheckoutError::InvalidCart(format!(
                    "cart must be a list, got {}",
                    json_kind(other)
                )));
            }
        };

        let lines = items
            .iter()
            .enumerate()
            .map(|(index, item)| parse_line(index, item))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { lines })
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// The lines as supplied, in cart order, for recording on the order.
    pub fn into_lines(self) -> Vec<CartLine> {
        self.lines
    }
}

fn parse_line(index: usize, item: &Value) -> Result<CartLine> {
    let Value::Object(fields) = item else {
        return Err(CheckoutError::InvalidCart(format!(
            "cart line {index} must be an object, got {}",
            json_kind(item)
        )));
    };

    let product_id = fields
        .get("_id")
        .or_else(|| fields.get("productId"))
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .map(ProductId::new);

    let price = fields
        .get("price")
        .and_then(finite_price)
        .ok_or_else(|| CheckoutError::InvalidPrice {
            index,
            product: product_id.clone(),
        })?;

    let name = fields.get("name").and_then(Value::as_str).map(str::to_owned);

    Ok(CartLine {
        product_id,
        price,
        name,
    })
}

/// Converts a JSON number into an exact, non-negative amount.
fn finite_price(value: &Value) -> Option<Amount> {
    let Value::Number(number) = value else {
        return None;
    };
    let text = number.to_string();
    let decimal = Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()?;
    Amount::new(decimal).ok()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
