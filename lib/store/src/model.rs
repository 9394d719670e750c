//! Stored entities and their creation payloads.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use savannah_core::{ItemId, OrderId, UserId};
use serde::{Deserialize, Serialize};

/// A customer known to the service.
///
/// Users are created explicitly through the API or implicitly on the first
/// successful login for an email address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    /// Subject identifier issued by the identity provider.
    pub code: String,
    /// Email address; the lookup key for provisioning.
    pub email: String,
}

/// Fields required to create a [`User`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    pub code: String,
    pub email: String,
}

impl NewUser {
    #[must_use]
    pub fn new(code: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            email: email.into(),
        }
    }

    pub(crate) fn with_id(self, id: UserId) -> User {
        User {
            id,
            code: self.code,
            email: self.email,
        }
    }
}

/// A catalog item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub price: Decimal,
    pub name: String,
    pub description: String,
}

/// Fields required to create an [`Item`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewItem {
    pub price: Decimal,
    pub name: String,
    pub description: String,
}

impl NewItem {
    pub(crate) fn with_id(self, id: ItemId) -> Item {
        Item {
            id,
            price: self.price,
            name: self.name,
            description: self.description,
        }
    }
}

/// An order placed by a user for a quantity of one item.
///
/// `user_id` and `placed_at` are assigned by the server when the order is
/// created and are never taken from client input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub item_id: ItemId,
    #[serde(rename = "qty")]
    pub quantity: i32,
    pub placed_at: DateTime<Utc>,
    /// Phone number the order confirmation is sent to.
    pub contact: String,
}

/// Fields required to create an [`Order`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub user_id: UserId,
    pub item_id: ItemId,
    pub quantity: i32,
    pub placed_at: DateTime<Utc>,
    pub contact: String,
}

impl NewOrder {
    pub(crate) fn with_id(self, id: OrderId) -> Order {
        Order {
            id,
            user_id: self.user_id,
            item_id: self.item_id,
            quantity: self.quantity,
            placed_at: self.placed_at,
            contact: self.contact,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn order_serializes_quantity_as_qty() {
        let order = NewOrder {
            user_id: UserId::new(7),
            item_id: ItemId::new(2),
            quantity: 3,
            placed_at: Utc::now(),
            contact: "+254700000000".to_string(),
        }
        .with_id(OrderId::new(1));

        let json = serde_json::to_value(&order).expect("serialize");
        assert_eq!(json["qty"], 3);
        assert_eq!(json["user_id"], 7);
        assert!(json.get("quantity").is_none());
    }

    #[test]
    fn item_price_keeps_two_decimals() {
        let item = NewItem {
            price: Decimal::from_str("29.99").expect("decimal"),
            name: "Sample Item".to_string(),
            description: "A sample description".to_string(),
        }
        .with_id(ItemId::new(1));

        assert_eq!(item.price.to_string(), "29.99");
    }
}
