#![allow(dead_code)]

use anyhow::Result;
use order_store::{
    Address, Delivery, Item, ItemRepository, Member, MemberRepository, Order, OrderItem,
    OrderRepository, OrderView, Session, Store,
};

/// Best-effort tracing init; repeated calls are fine.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();
}

pub async fn store() -> Result<Store> {
    init_tracing();
    Ok(Store::in_memory().await?)
}

pub struct Seed {
    pub user_a: i64,
    pub user_b: i64,
    pub jpa1: i64,
    pub jpa2: i64,
    pub spring1: i64,
    pub spring2: i64,
    pub order_a: i64,
    pub order_b: i64,
}

/// The canonical data set: two members with one two-line order each.
///
/// userA orders 1x JPA1 BOOK (10000, stock 100) + 2x JPA2 BOOK (20000,
/// stock 100); userB orders 3x SPRING1 BOOK (20000, stock 200) + 4x SPRING2
/// BOOK (40000, stock 300). After seeding the stocks are 99/98/197/296.
pub async fn seed(store: &Store) -> Result<Seed> {
    let mut session = store.read_write().await?;

    let mut user_a = Member::new("userA", Address::new("Seoul", "1", "111"));
    MemberRepository::save(&mut session, &mut user_a).await?;
    let mut jpa1 = Item::book("JPA1 BOOK", 10000, 100, "kim", "978-1");
    ItemRepository::save(&mut session, &mut jpa1).await?;
    let mut jpa2 = Item::book("JPA2 BOOK", 20000, 100, "kim", "978-2");
    ItemRepository::save(&mut session, &mut jpa2).await?;
    let order_a = place(
        &mut session,
        user_a.clone(),
        vec![(jpa1.clone(), 1), (jpa2.clone(), 2)],
    )
    .await?;

    let mut user_b = Member::new("userB", Address::new("Jinju", "2", "222"));
    MemberRepository::save(&mut session, &mut user_b).await?;
    let mut spring1 = Item::book("SPRING1 BOOK", 20000, 200, "lee", "978-3");
    ItemRepository::save(&mut session, &mut spring1).await?;
    let mut spring2 = Item::book("SPRING2 BOOK", 40000, 300, "lee", "978-4");
    ItemRepository::save(&mut session, &mut spring2).await?;
    let order_b = place(
        &mut session,
        user_b.clone(),
        vec![(spring1.clone(), 3), (spring2.clone(), 4)],
    )
    .await?;

    session.commit().await?;

    Ok(Seed {
        user_a: user_a.id.unwrap(),
        user_b: user_b.id.unwrap(),
        jpa1: jpa1.id.unwrap(),
        jpa2: jpa2.id.unwrap(),
        spring1: spring1.id.unwrap(),
        spring2: spring2.id.unwrap(),
        order_a,
        order_b,
    })
}

/// Build and persist one order with the given lines, consuming stock the way
/// the service does.
pub async fn place(
    session: &mut Session,
    member: Member,
    lines: Vec<(Item, i64)>,
) -> Result<i64> {
    let delivery = Delivery::new(member.address.clone());
    let mut order_items = Vec::new();
    for (item, count) in lines {
        let order_price = item.price;
        let line = OrderItem::create_order_item(item, order_price, count)?;
        let stocked = line.item.require("item")?;
        ItemRepository::save_stock(session, stocked).await?;
        order_items.push(line);
    }
    let mut order = Order::create_order(member, delivery, order_items)?;
    let id = OrderRepository::save(session, &mut order).await?;
    Ok(id)
}

/// Flatten fully resolved aggregates into the strategy-agnostic view shape.
pub fn views(orders: &[Order]) -> Result<Vec<OrderView>> {
    let views = orders
        .iter()
        .map(OrderView::from_order)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(views)
}

pub async fn stock_of(session: &mut Session, item_id: i64) -> Result<i64> {
    let item = ItemRepository::find_one(session, item_id)
        .await?
        .expect("seeded item exists");
    Ok(item.stock_quantity)
}
