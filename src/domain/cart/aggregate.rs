use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::money;
use crate::error::ValidationError;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CartItem {
    pub id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    /// Snapshot of the product price at add time
    pub price: Decimal,
}

impl CartItem {
    pub fn new(product_id: Uuid, quantity: i32, price: Decimal) -> Self {
        Self {
            id: Uuid::new_v4(),
            product_id,
            quantity,
            price,
        }
    }

    pub fn line_total(&self) -> Result<Decimal, ValidationError> {
        money::line_total(self.price, self.quantity)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    pub id: Uuid,
    pub user_id: Uuid,
    pub items: Vec<CartItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Cart {
    pub fn new(user_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            items: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Merge into an existing line for the same product, otherwise append.
    ///
    /// A merge whose quantity would overflow leaves the cart untouched.
    pub fn add_item(&mut self, item: CartItem) -> Result<(), ValidationError> {
        match self.find_mut(item.product_id) {
            Some(existing) => {
                existing.quantity = existing
                    .quantity
                    .checked_add(item.quantity)
                    .ok_or(ValidationError::InvalidQuantity(item.quantity))?;
            }
            None => self.items.push(item),
        }
        self.touch();
        Ok(())
    }

    pub fn remove_item(&mut self, product_id: Uuid) -> Result<(), ValidationError> {
        let index = self
            .items
            .iter()
            .position(|item| item.product_id == product_id)
            .ok_or(ValidationError::CartItemNotFound(product_id))?;

        self.items.remove(index);
        self.touch();
        Ok(())
    }

    /// Callers validate `quantity > 0` before calling.
    pub fn update_quantity(&mut self, product_id: Uuid, quantity: i32) -> Result<(), ValidationError> {
        let item = self
            .find_mut(product_id)
            .ok_or(ValidationError::CartItemNotFound(product_id))?;

        item.quantity = quantity;
        self.touch();
        Ok(())
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.touch();
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn total(&self) -> Result<Decimal, ValidationError> {
        money::checked_sum(self.items.iter().map(CartItem::line_total))
    }

    pub fn item_count(&self) -> i64 {
        self.items.iter().map(|item| i64::from(item.quantity)).sum()
    }

    pub fn product_ids(&self) -> Vec<Uuid> {
        self.items.iter().map(|item| item.product_id).collect()
    }

    fn find_mut(&mut self, product_id: Uuid) -> Option<&mut CartItem> {
        self.items.iter_mut().find(|item| item.product_id == product_id)
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn price(cents: i64) -> Decimal {
        Decimal::new(cents, 2)
    }

    #[test]
    fn test_add_same_product_merges_quantity() {
        let mut cart = Cart::new(Uuid::new_v4());
        let product_id = Uuid::new_v4();

        cart.add_item(CartItem::new(product_id, 2, price(1000))).unwrap();
        cart.add_item(CartItem::new(product_id, 3, price(1000))).unwrap();

        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.items[0].quantity, 5);
    }

    #[test]
    fn test_merge_overflow_leaves_line_unchanged() {
        let mut cart = Cart::new(Uuid::new_v4());
        let product_id = Uuid::new_v4();
        cart.add_item(CartItem::new(product_id, i32::MAX, price(100))).unwrap();

        let result = cart.add_item(CartItem::new(product_id, i32::MAX, price(100)));
        assert_eq!(result, Err(ValidationError::InvalidQuantity(i32::MAX)));
        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.items[0].quantity, i32::MAX);
    }

    #[test]
    fn test_total_overflow_is_an_error() {
        let mut cart = Cart::new(Uuid::new_v4());
        cart.add_item(CartItem::new(Uuid::new_v4(), 2, Decimal::MAX)).unwrap();

        assert_eq!(cart.total(), Err(ValidationError::AmountOutOfRange));
    }

    #[test]
    fn test_merge_keeps_original_snapshot_price() {
        let mut cart = Cart::new(Uuid::new_v4());
        let product_id = Uuid::new_v4();

        cart.add_item(CartItem::new(product_id, 1, price(1000))).unwrap();
        cart.add_item(CartItem::new(product_id, 1, price(1200))).unwrap();

        assert_eq!(cart.items[0].price, price(1000));
    }

    #[test]
    fn test_add_distinct_products_appends_in_order() {
        let mut cart = Cart::new(Uuid::new_v4());
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();

        cart.add_item(CartItem::new(first, 1, price(100))).unwrap();
        cart.add_item(CartItem::new(second, 1, price(100))).unwrap();

        assert_eq!(cart.product_ids(), vec![first, second]);
    }

    #[test]
    fn test_add_item_bumps_updated_at() {
        let mut cart = Cart::new(Uuid::new_v4());
        let before = cart.updated_at;

        cart.add_item(CartItem::new(Uuid::new_v4(), 1, price(100))).unwrap();
        assert!(cart.updated_at >= before);
    }

    #[test]
    fn test_remove_item() {
        let mut cart = Cart::new(Uuid::new_v4());
        let product_id = Uuid::new_v4();
        cart.add_item(CartItem::new(product_id, 1, price(100))).unwrap();

        cart.remove_item(product_id).unwrap();
        assert!(cart.is_empty());
    }

    #[test]
    fn test_remove_missing_item_fails() {
        let mut cart = Cart::new(Uuid::new_v4());
        let product_id = Uuid::new_v4();

        let result = cart.remove_item(product_id);
        assert_eq!(result, Err(ValidationError::CartItemNotFound(product_id)));
    }

    #[test]
    fn test_update_quantity() {
        let mut cart = Cart::new(Uuid::new_v4());
        let product_id = Uuid::new_v4();
        cart.add_item(CartItem::new(product_id, 1, price(100))).unwrap();

        cart.update_quantity(product_id, 7).unwrap();
        assert_eq!(cart.items[0].quantity, 7);

        let missing = Uuid::new_v4();
        assert_eq!(
            cart.update_quantity(missing, 2),
            Err(ValidationError::CartItemNotFound(missing))
        );
    }

    #[test]
    fn test_total_and_item_count() {
        let mut cart = Cart::new(Uuid::new_v4());
        cart.add_item(CartItem::new(Uuid::new_v4(), 2, price(1000))).unwrap();
        cart.add_item(CartItem::new(Uuid::new_v4(), 1, price(500))).unwrap();

        assert_eq!(cart.total(), Ok(price(2500)));
        assert_eq!(cart.item_count(), 3);
    }

    #[test]
    fn test_total_is_order_independent() {
        let items = vec![
            CartItem::new(Uuid::new_v4(), 3, price(333)),
            CartItem::new(Uuid::new_v4(), 7, price(10)),
            CartItem::new(Uuid::new_v4(), 1, price(99999)),
        ];

        let mut forward = Cart::new(Uuid::new_v4());
        items.iter().cloned().for_each(|item| forward.add_item(item).unwrap());

        let mut reversed = Cart::new(Uuid::new_v4());
        items.iter().rev().cloned().for_each(|item| reversed.add_item(item).unwrap());

        assert_eq!(forward.total(), reversed.total());
        assert_eq!(forward.total(), Ok(price(999 + 70 + 99999)));
    }

    #[test]
    fn test_clear_empties_items() {
        let mut cart = Cart::new(Uuid::new_v4());
        cart.add_item(CartItem::new(Uuid::new_v4(), 2, price(100))).unwrap();

        cart.clear();
        assert!(cart.is_empty());
        assert_eq!(cart.total(), Ok(Decimal::ZERO));
        assert_eq!(cart.item_count(), 0);
    }
}
