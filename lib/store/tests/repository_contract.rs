//! Behaviour every `Repository` implementation must share.
//!
//! The PostgreSQL runs need `DATABASE_URL` pointing at a server where the
//! test user may create databases:
//!
//! ```sh
//! DATABASE_URL=postgres://localhost/savannah cargo test -p savannah-store -- --ignored
//! ```

use chrono::{Timelike, Utc};
use rust_decimal::Decimal;
use savannah_core::{ItemId, OrderId, UserId};
use savannah_store::{
    MemoryStore, NewItem, NewOrder, NewUser, PgStore, Repository, StoreError,
};
use sqlx::PgPool;

async fn users_round_trip(repo: &dyn Repository) {
    let user = repo
        .create_user(NewUser::new("123", "user@example.com"))
        .await
        .expect("create user");
    assert_eq!(repo.find_user(user.id).await.expect("find"), user);

    let by_email = repo
        .find_user_by_email("user@example.com")
        .await
        .expect("find by email");
    assert_eq!(by_email.id, user.id);

    let err = repo
        .create_user(NewUser::new("456", "user@example.com"))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Conflict { .. }), "got {err:?}");

    let mut updated = user.clone();
    updated.email = "newemail@example.com".to_string();
    repo.update_user(updated.clone()).await.expect("update");
    assert_eq!(repo.find_user(user.id).await.expect("find"), updated);
    assert!(
        repo.find_user_by_email("user@example.com")
            .await
            .unwrap_err()
            .is_not_found()
    );

    repo.delete_user(user.id).await.expect("delete");
    assert!(repo.find_user(user.id).await.unwrap_err().is_not_found());
    assert!(repo.delete_user(user.id).await.unwrap_err().is_not_found());
}

async fn provisioning_is_idempotent(repo: &dyn Repository) {
    let (first, created) = repo
        .find_or_create_user(NewUser::new("sub-1", "j@x.com"))
        .await
        .expect("provision");
    assert!(created);

    let (again, created) = repo
        .find_or_create_user(NewUser::new("sub-1", "j@x.com"))
        .await
        .expect("provision");
    assert!(!created);
    assert_eq!(again, first);
}

async fn items_round_trip(repo: &dyn Repository) {
    let item = repo
        .create_item(NewItem {
            price: Decimal::new(2999, 2),
            name: "Sample Item".to_string(),
            description: "A sample description".to_string(),
        })
        .await
        .expect("create item");
    assert_eq!(repo.find_item(item.id).await.expect("find"), item);

    let mut updated = item.clone();
    updated.name = "Updated Item".to_string();
    updated.price = Decimal::new(3999, 2);
    repo.update_item(updated.clone()).await.expect("update");
    assert_eq!(repo.find_item(item.id).await.expect("find"), updated);

    repo.delete_item(item.id).await.expect("delete");
    assert!(repo.find_item(item.id).await.unwrap_err().is_not_found());
    assert!(
        repo.find_item(ItemId::new(i64::MAX))
            .await
            .unwrap_err()
            .is_not_found()
    );
}

async fn orders_round_trip(repo: &dyn Repository) {
    // Postgres truncates to microseconds; keep the comparison exact.
    let placed_at = Utc::now()
        .with_nanosecond(0)
        .expect("valid timestamp");
    let order = repo
        .create_order(NewOrder {
            user_id: UserId::new(1),
            item_id: ItemId::new(1),
            quantity: 5,
            placed_at,
            contact: "+254700000000".to_string(),
        })
        .await
        .expect("create order");
    assert_eq!(order.placed_at, placed_at);
    assert_eq!(repo.find_order(order.id).await.expect("find"), order);

    let mut updated = order.clone();
    updated.quantity = 10;
    repo.update_order(updated.clone()).await.expect("update");
    assert_eq!(repo.find_order(order.id).await.expect("find"), updated);

    for quantity in [0, -1] {
        let err = repo
            .create_order(NewOrder {
                user_id: UserId::new(1),
                item_id: ItemId::new(1),
                quantity,
                placed_at,
                contact: "+254700000000".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Invalid { .. }), "got {err:?}");

        let mut rejected = updated.clone();
        rejected.quantity = quantity;
        let err = repo.update_order(rejected).await.unwrap_err();
        assert!(matches!(err, StoreError::Invalid { .. }), "got {err:?}");
    }
    assert_eq!(repo.find_order(order.id).await.expect("find"), updated);

    repo.delete_order(order.id).await.expect("delete");
    assert!(repo.find_order(order.id).await.unwrap_err().is_not_found());
    assert!(
        repo.delete_order(OrderId::new(i64::MAX))
            .await
            .unwrap_err()
            .is_not_found()
    );
}

#[tokio::test]
async fn memory_users() {
    users_round_trip(&MemoryStore::new()).await;
}

#[tokio::test]
async fn memory_provisioning() {
    provisioning_is_idempotent(&MemoryStore::new()).await;
}

#[tokio::test]
async fn memory_items() {
    items_round_trip(&MemoryStore::new()).await;
}

#[tokio::test]
async fn memory_orders() {
    orders_round_trip(&MemoryStore::new()).await;
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn postgres_users(pool: PgPool) {
    users_round_trip(&PgStore::new(pool)).await;
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn postgres_provisioning(pool: PgPool) {
    provisioning_is_idempotent(&PgStore::new(pool)).await;
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn postgres_items(pool: PgPool) {
    items_round_trip(&PgStore::new(pool)).await;
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn postgres_orders(pool: PgPool) {
    orders_round_trip(&PgStore::new(pool)).await;
}
