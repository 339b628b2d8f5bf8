//! Catalog product metadata and cart line items.
//!
//! A [`LineItem`] is what the cart stores: the catalog's product fields
//! copied verbatim at add time, plus the quantity in the cart. The serde
//! representation flattens the product, so the persistent mirror holds the
//! same JSON shape the catalog serves with an extra `amount` field.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::ProductId;

/// Product metadata as served by the catalog endpoint.
///
/// Prices arrive as plain JSON numbers, hence the float serde for the
/// `Decimal` field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Catalog product identifier.
    pub id: ProductId,
    /// Display title.
    pub title: String,
    /// Unit price in the store currency.
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    /// Product image URL.
    pub image: String,
}

/// One product entry in the cart with its quantity.
///
/// Invariant: `amount >= 1` for any item present in a cart. An item whose
/// quantity would drop to zero is removed, never stored as zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// Denormalized product fields, flattened into the item.
    #[serde(flatten)]
    pub product: Product,
    /// Quantity of this product in the cart.
    pub amount: u32,
}

impl LineItem {
    /// Create a line item for a product just added to the cart.
    #[must_use]
    pub const fn new(product: Product) -> Self {
        Self { product, amount: 1 }
    }

    /// The product identifier this line refers to.
    #[must_use]
    pub const fn product_id(&self) -> ProductId {
        self.product.id
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample_product() -> Product {
        Product {
            id: ProductId::new(1),
            title: "Trail Runner".to_string(),
            price: Decimal::new(1399, 1), // 139.9
            image: "https://cdn.example.com/trail-runner.jpg".to_string(),
        }
    }

    #[test]
    fn test_line_item_serializes_flattened() {
        let item = LineItem {
            product: sample_product(),
            amount: 2,
        };

        let value = serde_json::to_value(&item).unwrap();

        // Product fields sit next to `amount`, not nested under `product`
        assert_eq!(value["id"], 1);
        assert_eq!(value["title"], "Trail Runner");
        assert_eq!(value["amount"], 2);
        assert!(value.get("product").is_none());
    }

    #[test]
    fn test_line_item_deserializes_catalog_shape() {
        let raw = r#"{"id":7,"title":"Court Classic","price":89.99,"image":"https://cdn.example.com/court.jpg","amount":3}"#;

        let item: LineItem = serde_json::from_str(raw).unwrap();

        assert_eq!(item.product_id(), ProductId::new(7));
        assert_eq!(item.amount, 3);
        assert_eq!(item.product.price, Decimal::new(8999, 2));
    }

    #[test]
    fn test_line_item_round_trip() {
        let items = vec![
            LineItem {
                product: sample_product(),
                amount: 2,
            },
            LineItem {
                product: Product {
                    id: ProductId::new(2),
                    title: "High Top".to_string(),
                    price: Decimal::new(2500, 1),
                    image: "https://cdn.example.com/high-top.jpg".to_string(),
                },
                amount: 1,
            },
        ];

        let raw = serde_json::to_string(&items).unwrap();
        let parsed: Vec<LineItem> = serde_json::from_str(&raw).unwrap();

        assert_eq!(parsed, items);
    }

    #[test]
    fn test_new_line_item_starts_at_one() {
        let item = LineItem::new(sample_product());
        assert_eq!(item.amount, 1);
    }
}
