use shared::account::{AccountStatus, Role};
use sqlx::PgPool;

use crate::store::UserRecord;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(sqlx::FromRow)]
struct UserRow {
    id: String,
    company_id: String,
    email: String,
    hashed_password: String,
    role: String,
    status: String,
}

impl TryFrom<UserRow> for UserRecord {
    type Error = BoxError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role = Role::from_db(&row.role)
            .ok_or_else(|| format!("Unknown role for user {}: {}", row.id, row.role))?;
        let status = AccountStatus::from_db(&row.status)
            .ok_or_else(|| format!("Unknown status for user {}: {}", row.id, row.status))?;
        Ok(UserRecord {
            id: row.id,
            company_id: row.company_id,
            email: row.email,
            hashed_password: row.hashed_password,
            role,
            status,
        })
    }
}

pub async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<UserRecord>, BoxError> {
    let row = sqlx::query_as::<_, UserRow>(
        "SELECT id, company_id, email, hashed_password, role, status FROM users WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    row.map(UserRecord::try_from).transpose()
}

pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<UserRecord>, BoxError> {
    let row = sqlx::query_as::<_, UserRow>(
        "SELECT id, company_id, email, hashed_password, role, status FROM users WHERE email = $1",
    )
    .bind(email)
    .fetch_optional(pool)
    .await?;
    row.map(UserRecord::try_from).transpose()
}
