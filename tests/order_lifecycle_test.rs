mod common;

use anyhow::Result;
use order_store::{
    Address, Item, ItemError, ItemRepository, Member, MemberRepository, OrderError,
    OrderRepository, OrderSearch, OrderService, OrderStatus, Page, ServiceError, StoreError,
};

#[tokio::test]
async fn place_then_cancel_restores_stock_and_status() -> Result<()> {
    let store = common::store().await?;
    let seed = common::seed(&store).await?;
    let service = OrderService::new(store.clone());

    // Placement effects: 1x JPA1 + 2x JPA2 against stocks of 100 each.
    {
        let mut session = store.read_only().await?;
        assert_eq!(common::stock_of(&mut session, seed.jpa1).await?, 99);
        assert_eq!(common::stock_of(&mut session, seed.jpa2).await?, 98);

        let mut order = OrderRepository::find_one(&mut session, seed.order_a)
            .await?
            .expect("seeded order exists");
        assert_eq!(order.status, OrderStatus::Order);
        order.order_items.resolve(&mut session).await?;
        assert_eq!(order.total_price()?, 50000);
    }

    service.cancel_order(seed.order_a).await?;

    let mut session = store.read_only().await?;
    assert_eq!(common::stock_of(&mut session, seed.jpa1).await?, 100);
    assert_eq!(common::stock_of(&mut session, seed.jpa2).await?, 100);
    let order = OrderRepository::find_one(&mut session, seed.order_a)
        .await?
        .expect("order still exists after cancellation");
    assert_eq!(order.status, OrderStatus::Cancel);
    Ok(())
}

#[tokio::test]
async fn place_order_via_service_decrements_stock() -> Result<()> {
    let store = common::store().await?;
    let seed = common::seed(&store).await?;
    let service = OrderService::new(store.clone());

    let order_id = service.place_order(seed.user_a, seed.jpa1, 5).await?;

    let mut session = store.read_only().await?;
    assert_eq!(common::stock_of(&mut session, seed.jpa1).await?, 94);

    let mut order = OrderRepository::find_one(&mut session, order_id)
        .await?
        .expect("placed order exists");
    OrderRepository::resolve_graph(&mut session, &mut order).await?;
    assert_eq!(order.total_price()?, 50000);
    assert_eq!(order.member.get().unwrap().name, "userA");
    // The delivery address was copied from the member at order time.
    assert_eq!(
        order.delivery.get().unwrap().address,
        Address::new("Seoul", "1", "111")
    );
    Ok(())
}

#[tokio::test]
async fn insufficient_stock_rejects_order_and_persists_nothing() -> Result<()> {
    let store = common::store().await?;
    let (member_id, item_id) = {
        let mut session = store.read_write().await?;
        let mut member = Member::new("userC", Address::new("Busan", "9", "999"));
        MemberRepository::save(&mut session, &mut member).await?;
        let mut item = Item::book("LAST COPY", 10000, 1, "kim", "978-9");
        ItemRepository::save(&mut session, &mut item).await?;
        session.commit().await?;
        (member.id.unwrap(), item.id.unwrap())
    };
    let service = OrderService::new(store.clone());

    let result = service.place_order(member_id, item_id, 2).await;

    assert!(matches!(
        result,
        Err(ServiceError::Order(OrderError::Stock(
            ItemError::InsufficientStock {
                requested: 2,
                available: 1
            }
        )))
    ));

    let mut session = store.read_only().await?;
    assert_eq!(common::stock_of(&mut session, item_id).await?, 1);
    let orders =
        OrderRepository::find_all(&mut session, &OrderSearch::default(), Page::all()).await?;
    assert!(orders.is_empty());
    Ok(())
}

#[tokio::test]
async fn cancel_after_completed_delivery_fails_and_changes_nothing() -> Result<()> {
    let store = common::store().await?;
    let seed = common::seed(&store).await?;

    {
        let mut session = store.read_write().await?;
        let mut order = OrderRepository::find_one(&mut session, seed.order_a)
            .await?
            .expect("seeded order exists");
        order.delivery.resolve(&mut session).await?;
        let delivery = order.delivery.get_mut().unwrap();
        delivery.complete();
        OrderRepository::save_delivery_status(&mut session, delivery).await?;
        session.commit().await?;
    }

    let service = OrderService::new(store.clone());
    let result = service.cancel_order(seed.order_a).await;

    assert!(matches!(
        result,
        Err(ServiceError::Order(OrderError::AlreadyDelivered))
    ));

    let mut session = store.read_only().await?;
    assert_eq!(common::stock_of(&mut session, seed.jpa1).await?, 99);
    assert_eq!(common::stock_of(&mut session, seed.jpa2).await?, 98);
    let order = OrderRepository::find_one(&mut session, seed.order_a)
        .await?
        .expect("order unchanged");
    assert_eq!(order.status, OrderStatus::Order);
    Ok(())
}

#[tokio::test]
async fn cancelling_twice_fails_without_double_restock() -> Result<()> {
    let store = common::store().await?;
    let seed = common::seed(&store).await?;
    let service = OrderService::new(store.clone());

    service.cancel_order(seed.order_a).await?;
    let result = service.cancel_order(seed.order_a).await;

    assert!(matches!(
        result,
        Err(ServiceError::Order(OrderError::AlreadyCancelled))
    ));

    let mut session = store.read_only().await?;
    assert_eq!(common::stock_of(&mut session, seed.jpa1).await?, 100);
    assert_eq!(common::stock_of(&mut session, seed.jpa2).await?, 100);
    Ok(())
}

#[tokio::test]
async fn unknown_identities_surface_not_found() -> Result<()> {
    let store = common::store().await?;
    let seed = common::seed(&store).await?;
    let service = OrderService::new(store.clone());

    let result = service.place_order(9999, seed.jpa1, 1).await;
    assert!(matches!(
        result,
        Err(ServiceError::Store(StoreError::NotFound {
            entity: "member",
            id: 9999
        }))
    ));

    let result = service.place_order(seed.user_a, 9999, 1).await;
    assert!(matches!(
        result,
        Err(ServiceError::Store(StoreError::NotFound {
            entity: "item",
            id: 9999
        }))
    ));

    let result = service.cancel_order(9999).await;
    assert!(matches!(
        result,
        Err(ServiceError::Store(StoreError::NotFound {
            entity: "order",
            id: 9999
        }))
    ));
    Ok(())
}

#[tokio::test]
async fn read_only_session_rejects_writes_but_allows_resolution() -> Result<()> {
    let store = common::store().await?;
    let seed = common::seed(&store).await?;

    let mut session = store.read_only().await?;

    // Lazy resolution is reading, and reading is fine.
    let mut order = OrderRepository::find_one(&mut session, seed.order_a)
        .await?
        .expect("seeded order exists");
    order.member.resolve(&mut session).await?;
    assert_eq!(order.member.get().unwrap().name, "userA");

    // Persisting anything is not.
    let mut member = Member::new("intruder", Address::new("Nowhere", "0", "000"));
    let result = MemberRepository::save(&mut session, &mut member).await;
    assert!(matches!(result, Err(StoreError::ReadOnlySession)));
    Ok(())
}

#[tokio::test]
async fn dropped_session_rolls_back_uncommitted_writes() -> Result<()> {
    let store = common::store().await?;

    let ghost_id = {
        let mut session = store.read_write().await?;
        let mut member = Member::new("ghost", Address::new("Seoul", "1", "111"));
        let id = MemberRepository::save(&mut session, &mut member).await?;
        // No commit: dropping the session abandons the unit of work.
        id
    };

    let mut session = store.read_only().await?;
    assert!(MemberRepository::find_one(&mut session, ghost_id)
        .await?
        .is_none());
    Ok(())
}
