//! Process-local repository.
//!
//! Each entity kind lives in its own map behind its own lock. Id counters
//! belong to the store instance, so two stores never share a sequence.

use crate::error::StoreError;
use crate::model::{Item, NewItem, NewOrder, NewUser, Order, User};
use crate::repository::Repository;
use async_trait::async_trait;
use savannah_core::{ItemId, OrderId, UserId};
use std::collections::HashMap;
use tokio::sync::{Mutex, RwLock};

/// Per-kind id counters. Each starts at 0 and hands out 1, 2, 3...
#[derive(Debug, Default)]
struct IdSequence {
    users: i64,
    items: i64,
    orders: i64,
}

impl IdSequence {
    fn next_user(&mut self) -> UserId {
        self.users += 1;
        UserId::new(self.users)
    }

    fn next_item(&mut self) -> ItemId {
        self.items += 1;
        ItemId::new(self.items)
    }

    fn next_order(&mut self) -> OrderId {
        self.orders += 1;
        OrderId::new(self.orders)
    }
}

/// In-memory [`Repository`] implementation.
///
/// Locks are always taken map first, then the id sequence. An id is only
/// drawn once the write is known to succeed, so failed creates leave no gaps.
#[derive(Debug, Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<UserId, User>>,
    items: RwLock<HashMap<ItemId, Item>>,
    orders: RwLock<HashMap<OrderId, Order>>,
    ids: Mutex<IdSequence>,
}

impl MemoryStore {
    /// Creates an empty store whose counters start at 1.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn email_conflict(email: &str) -> StoreError {
    StoreError::Conflict {
        entity: "user",
        details: format!("email '{email}' is already registered"),
    }
}

#[async_trait]
impl Repository for MemoryStore {
    async fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == user.email) {
            return Err(email_conflict(&user.email));
        }

        let id = self.ids.lock().await.next_user();
        let user = user.with_id(id);
        users.insert(id, user.clone());
        Ok(user)
    }

    async fn find_or_create_user(&self, user: NewUser) -> Result<(User, bool), StoreError> {
        let mut users = self.users.write().await;
        if let Some(existing) = users.values().find(|u| u.email == user.email) {
            return Ok((existing.clone(), false));
        }

        let id = self.ids.lock().await.next_user();
        let user = user.with_id(id);
        users.insert(id, user.clone());
        tracing::debug!(user_id = %id, "provisioned user");
        Ok((user, true))
    }

    async fn find_user(&self, id: UserId) -> Result<User, StoreError> {
        self.users
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("user", id))
    }

    async fn find_user_by_email(&self, email: &str) -> Result<User, StoreError> {
        self.users
            .read()
            .await
            .values()
            .find(|u| u.email == email)
            .cloned()
            .ok_or_else(|| StoreError::not_found("user", email))
    }

    async fn update_user(&self, user: User) -> Result<(), StoreError> {
        let mut users = self.users.write().await;
        if !users.contains_key(&user.id) {
            return Err(StoreError::not_found("user", user.id));
        }
        if users
            .values()
            .any(|u| u.id != user.id && u.email == user.email)
        {
            return Err(email_conflict(&user.email));
        }

        users.insert(user.id, user);
        Ok(())
    }

    async fn delete_user(&self, id: UserId) -> Result<(), StoreError> {
        self.users
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| StoreError::not_found("user", id))
    }

    async fn create_item(&self, item: NewItem) -> Result<Item, StoreError> {
        let mut items = self.items.write().await;
        let id = self.ids.lock().await.next_item();
        let item = item.with_id(id);
        items.insert(id, item.clone());
        Ok(item)
    }

    async fn find_item(&self, id: ItemId) -> Result<Item, StoreError> {
        self.items
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("item", id))
    }

    async fn update_item(&self, item: Item) -> Result<(), StoreError> {
        let mut items = self.items.write().await;
        match items.get_mut(&item.id) {
            Some(slot) => {
                *slot = item;
                Ok(())
            }
            None => Err(StoreError::not_found("item", item.id)),
        }
    }

    async fn delete_item(&self, id: ItemId) -> Result<(), StoreError> {
        self.items
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| StoreError::not_found("item", id))
    }

    async fn create_order(&self, order: NewOrder) -> Result<Order, StoreError> {
        StoreError::check_quantity(order.quantity)?;
        let mut orders = self.orders.write().await;
        let id = self.ids.lock().await.next_order();
        let order = order.with_id(id);
        orders.insert(id, order.clone());
        Ok(order)
    }

    async fn find_order(&self, id: OrderId) -> Result<Order, StoreError> {
        self.orders
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("order", id))
    }

    async fn update_order(&self, order: Order) -> Result<(), StoreError> {
        StoreError::check_quantity(order.quantity)?;
        let mut orders = self.orders.write().await;
        let stored = orders
            .get_mut(&order.id)
            .ok_or_else(|| StoreError::not_found("order", order.id))?;

        stored.item_id = order.item_id;
        stored.quantity = order.quantity;
        stored.contact = order.contact;
        Ok(())
    }

    async fn delete_order(&self, id: OrderId) -> Result<(), StoreError> {
        self.orders
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| StoreError::not_found("order", id))
    }
}
