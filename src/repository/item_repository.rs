use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use crate::domain::item::{Item, ItemId, ItemKind};
use crate::store::{Resolve, Session, StoreError};

// ============================================================================
// Catalog Item Repository
// ============================================================================

pub struct ItemRepository;

impl ItemRepository {
    pub async fn save(session: &mut Session, item: &mut Item) -> Result<ItemId, StoreError> {
        let (author, isbn) = match &item.kind {
            ItemKind::Book { author, isbn } => (author.as_str(), isbn.as_str()),
        };
        let result = sqlx::query(
            "INSERT INTO items (kind, name, price, stock_quantity, author, isbn) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(item.kind.discriminator())
        .bind(&item.name)
        .bind(item.price)
        .bind(item.stock_quantity)
        .bind(author)
        .bind(isbn)
        .execute(session.writer()?)
        .await?;
        let id = result.last_insert_rowid();
        item.id = Some(id);
        Ok(id)
    }

    pub async fn find_one(session: &mut Session, id: ItemId) -> Result<Option<Item>, StoreError> {
        let row = sqlx::query(
            "SELECT item_id, kind, name, price, stock_quantity, author, isbn \
             FROM items WHERE item_id = ?",
        )
        .bind(id)
        .fetch_optional(session.reader())
        .await?;
        row.map(|row| row_to_item(&row)).transpose()
    }

    /// Persist the in-memory stock counter after a domain-side mutation.
    pub async fn save_stock(session: &mut Session, item: &Item) -> Result<(), StoreError> {
        let id = item.id.ok_or(StoreError::NotPersisted("item"))?;
        sqlx::query("UPDATE items SET stock_quantity = ? WHERE item_id = ?")
            .bind(item.stock_quantity)
            .bind(id)
            .execute(session.writer()?)
            .await?;
        Ok(())
    }

    /// Compensating stock restore as a relative update, so one unit of work
    /// restocking the same catalog item through several line items never
    /// loses any of its own additions.
    pub async fn restock(
        session: &mut Session,
        id: ItemId,
        quantity: i64,
    ) -> Result<(), StoreError> {
        let result =
            sqlx::query("UPDATE items SET stock_quantity = stock_quantity + ? WHERE item_id = ?")
                .bind(quantity)
                .bind(id)
                .execute(session.writer()?)
                .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound { entity: "item", id });
        }
        Ok(())
    }
}

fn row_to_item(row: &SqliteRow) -> Result<Item, StoreError> {
    let raw_kind: String = row.try_get("kind")?;
    let kind = ItemKind::from_discriminator(
        &raw_kind,
        row.try_get("author")?,
        row.try_get("isbn")?,
    )
    .ok_or(StoreError::InvalidColumn {
        field: "kind",
        value: raw_kind,
    })?;
    Ok(Item {
        id: Some(row.try_get("item_id")?),
        name: row.try_get("name")?,
        price: row.try_get("price")?,
        stock_quantity: row.try_get("stock_quantity")?,
        kind,
    })
}

#[async_trait]
impl Resolve for Item {
    const ASSOCIATION: &'static str = "item";

    async fn load(session: &mut Session, key: i64) -> Result<Self, StoreError> {
        ItemRepository::find_one(session, key)
            .await?
            .ok_or(StoreError::NotFound {
                entity: "item",
                id: key,
            })
    }
}
