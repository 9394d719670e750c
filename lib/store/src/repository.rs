//! The storage contract shared by every backend.

use crate::error::StoreError;
use crate::model::{Item, NewItem, NewOrder, NewUser, Order, User};
use async_trait::async_trait;
use savannah_core::{ItemId, OrderId, UserId};

/// Storage for users, items and orders.
///
/// Implementations own all entity storage and assign ids on create.
/// Each call is atomic on its own.
#[async_trait]
pub trait Repository: Send + Sync {
    /// Stores a new user and returns it with its assigned id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Conflict`] if a user with the same email exists.
    async fn create_user(&self, user: NewUser) -> Result<User, StoreError>;

    /// Returns the user with the given email, creating it if none exists.
    ///
    /// The lookup and insert happen as one step, so concurrent first logins
    /// for the same email yield a single user. The flag is `true` when the
    /// user was created by this call.
    async fn find_or_create_user(&self, user: NewUser) -> Result<(User, bool), StoreError>;

    async fn find_user(&self, id: UserId) -> Result<User, StoreError>;

    /// Looks up a user by email (exact, case-sensitive match).
    async fn find_user_by_email(&self, email: &str) -> Result<User, StoreError>;

    /// Replaces the stored user with the same id.
    async fn update_user(&self, user: User) -> Result<(), StoreError>;

    async fn delete_user(&self, id: UserId) -> Result<(), StoreError>;

    async fn create_item(&self, item: NewItem) -> Result<Item, StoreError>;

    async fn find_item(&self, id: ItemId) -> Result<Item, StoreError>;

    /// Replaces the stored item with the same id.
    async fn update_item(&self, item: Item) -> Result<(), StoreError>;

    /// Deletes an item. Orders referencing it are left untouched.
    async fn delete_item(&self, id: ItemId) -> Result<(), StoreError>;

    /// Stores a new order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Invalid`] if the quantity is not positive.
    async fn create_order(&self, order: NewOrder) -> Result<Order, StoreError>;

    async fn find_order(&self, id: OrderId) -> Result<Order, StoreError>;

    /// Updates the item, quantity and contact of an order.
    ///
    /// `user_id` and `placed_at` are fixed at creation; the values carried by
    /// `order` for those fields are ignored. A non-positive quantity is
    /// rejected with [`StoreError::Invalid`].
    async fn update_order(&self, order: Order) -> Result<(), StoreError>;

    async fn delete_order(&self, id: OrderId) -> Result<(), StoreError>;
}
