//! # Cart
//!
//! The checkout flow's in-memory cart.
//!
//! ## Design Notes
//! Each line freezes a snapshot of the product (code, description, price) at
//! the moment it was added, so the cart displays consistent data even if the
//! product row changes underneath it. The stock level seen at add time is
//! only a courtesy ceiling for the operator - the authoritative stock check
//! happens again inside the checkout transaction, where stale cart state
//! cannot oversell.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::Product;
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY};

/// An item in the cart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItem {
    /// Product ID (UUID).
    pub product_id: String,

    /// 8-digit product code at time of adding (frozen).
    pub code: String,

    /// Product description at time of adding (frozen).
    pub description: String,

    /// Price in cents at time of adding (frozen).
    pub unit_price_cents: i64,

    /// Quantity in cart.
    pub quantity: i64,

    /// Stock level seen when the item was added (courtesy ceiling only).
    pub available_stock: i64,
}

impl CartItem {
    /// Creates a new cart item from a product and quantity.
    pub fn from_product(product: &Product, quantity: i64) -> Self {
        CartItem {
            product_id: product.id.clone(),
            code: product.code.clone(),
            description: product.description.clone(),
            unit_price_cents: product.price_cents,
            quantity,
            available_stock: product.stock_quantity,
        }
    }

    /// Calculates the line total (unit price × quantity).
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.unit_price_cents).multiply_quantity(self.quantity)
    }
}

/// The checkout cart.
///
/// ## Invariants
/// - Items are unique by `product_id` (adding the same product again
///   increases quantity)
/// - Quantity is always > 0 (setting it to 0 removes the line)
/// - Quantity never exceeds the stock seen at add time
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Cart {
    pub items: Vec<CartItem>,
}

impl Cart {
    /// Creates a new empty cart.
    pub fn new() -> Self {
        Cart { items: Vec::new() }
    }

    /// Adds a product to the cart or increases quantity if already present.
    pub fn add_item(&mut self, product: &Product, quantity: i64) -> CoreResult<()> {
        if quantity <= 0 || quantity > MAX_ITEM_QUANTITY {
            return Err(CoreError::QuantityTooLarge {
                requested: quantity,
                max: MAX_ITEM_QUANTITY,
            });
        }

        if let Some(item) = self.items.iter_mut().find(|i| i.product_id == product.id) {
            let new_qty = item.quantity + quantity;
            if new_qty > item.available_stock {
                return Err(CoreError::InsufficientStock {
                    code: item.code.clone(),
                    available: item.available_stock,
                    requested: new_qty,
                });
            }
            item.quantity = new_qty;
            return Ok(());
        }

        if quantity > product.stock_quantity {
            return Err(CoreError::InsufficientStock {
                code: product.code.clone(),
                available: product.stock_quantity,
                requested: quantity,
            });
        }

        if self.items.len() >= MAX_CART_ITEMS {
            return Err(CoreError::CartTooLarge {
                max: MAX_CART_ITEMS,
            });
        }

        self.items.push(CartItem::from_product(product, quantity));
        Ok(())
    }

    /// Updates the quantity of a line; 0 removes it.
    pub fn update_quantity(&mut self, product_id: &str, quantity: i64) -> CoreResult<()> {
        if quantity == 0 {
            return self.remove_item(product_id);
        }

        let item = self
            .items
            .iter_mut()
            .find(|i| i.product_id == product_id)
            .ok_or_else(|| CoreError::ProductNotFound(product_id.to_string()))?;

        if quantity < 0 || quantity > MAX_ITEM_QUANTITY {
            return Err(CoreError::QuantityTooLarge {
                requested: quantity,
                max: MAX_ITEM_QUANTITY,
            });
        }
        if quantity > item.available_stock {
            return Err(CoreError::InsufficientStock {
                code: item.code.clone(),
                available: item.available_stock,
                requested: quantity,
            });
        }

        item.quantity = quantity;
        Ok(())
    }

    /// Removes a line by product ID.
    pub fn remove_item(&mut self, product_id: &str) -> CoreResult<()> {
        let initial_len = self.items.len();
        self.items.retain(|i| i.product_id != product_id);

        if self.items.len() == initial_len {
            Err(CoreError::ProductNotFound(product_id.to_string()))
        } else {
            Ok(())
        }
    }

    /// Clears all lines.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Number of unique lines.
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Total quantity across all lines.
    pub fn total_quantity(&self) -> i64 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// The cart total.
    pub fn total(&self) -> Money {
        self.items.iter().map(|i| i.line_total()).sum()
    }

    /// Checks if the cart is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn test_product(id: &str, price_cents: i64, stock: i64) -> Product {
        let now = Utc::now();
        Product {
            id: id.to_string(),
            code: format!("{:08}", 48201900 + id.len() as i64),
            description: format!("Product {}", id),
            category: "rings".to_string(),
            price_cents,
            cost_cents: None,
            stock_quantity: stock,
            image_url: None,
            payable_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_cart_add_item() {
        let mut cart = Cart::new();
        let product = test_product("1", 4990, 10);

        cart.add_item(&product, 2).unwrap();

        assert_eq!(cart.item_count(), 1);
        assert_eq!(cart.total_quantity(), 2);
        assert_eq!(cart.total().cents(), 9980);
    }

    #[test]
    fn test_cart_add_same_product_increases_quantity() {
        let mut cart = Cart::new();
        let product = test_product("1", 4990, 10);

        cart.add_item(&product, 2).unwrap();
        cart.add_item(&product, 3).unwrap();

        assert_eq!(cart.item_count(), 1); // still one line
        assert_eq!(cart.total_quantity(), 5);
    }

    #[test]
    fn test_cart_respects_stock_ceiling() {
        let mut cart = Cart::new();
        let product = test_product("1", 4990, 2);

        cart.add_item(&product, 2).unwrap();
        let err = cart.add_item(&product, 1).unwrap_err();
        assert!(matches!(err, CoreError::InsufficientStock { .. }));

        // Quantity update past the ceiling fails the same way.
        assert!(cart.update_quantity(&product.id, 3).is_err());
        assert!(cart.update_quantity(&product.id, 1).is_ok());
    }

    #[test]
    fn test_cart_update_to_zero_removes_line() {
        let mut cart = Cart::new();
        let product = test_product("1", 4990, 10);

        cart.add_item(&product, 2).unwrap();
        cart.update_quantity(&product.id, 0).unwrap();
        assert!(cart.is_empty());
    }

    #[test]
    fn test_cart_clear() {
        let mut cart = Cart::new();
        let product = test_product("1", 4990, 10);

        cart.add_item(&product, 2).unwrap();
        assert!(!cart.is_empty());

        cart.clear();
        assert!(cart.is_empty());
    }
}
