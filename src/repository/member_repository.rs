use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use crate::domain::member::{Member, MemberId};
use crate::domain::value_objects::Address;
use crate::store::{Resolve, Session, StoreError};

// ============================================================================
// Member Repository - boundary persistence
// ============================================================================

/// Plain persistence for members; orders reference them by id and the search
/// strategies join them by name. Nothing else interesting lives here.
pub struct MemberRepository;

impl MemberRepository {
    pub async fn save(session: &mut Session, member: &mut Member) -> Result<MemberId, StoreError> {
        let result =
            sqlx::query("INSERT INTO members (name, city, street, zipcode) VALUES (?, ?, ?, ?)")
                .bind(&member.name)
                .bind(member.address.city())
                .bind(member.address.street())
                .bind(member.address.zipcode())
                .execute(session.writer()?)
                .await?;
        let id = result.last_insert_rowid();
        member.id = Some(id);
        Ok(id)
    }

    pub async fn find_one(
        session: &mut Session,
        id: MemberId,
    ) -> Result<Option<Member>, StoreError> {
        let row = sqlx::query(
            "SELECT member_id, name, city, street, zipcode FROM members WHERE member_id = ?",
        )
        .bind(id)
        .fetch_optional(session.reader())
        .await?;
        row.map(|row| row_to_member(&row)).transpose()
    }
}

fn row_to_member(row: &SqliteRow) -> Result<Member, StoreError> {
    Ok(Member {
        id: Some(row.try_get("member_id")?),
        name: row.try_get("name")?,
        address: Address::new(
            row.try_get::<String, _>("city")?,
            row.try_get::<String, _>("street")?,
            row.try_get::<String, _>("zipcode")?,
        ),
    })
}

#[async_trait]
impl Resolve for Member {
    const ASSOCIATION: &'static str = "member";

    async fn load(session: &mut Session, key: i64) -> Result<Self, StoreError> {
        MemberRepository::find_one(session, key)
            .await?
            .ok_or(StoreError::NotFound {
                entity: "member",
                id: key,
            })
    }
}
