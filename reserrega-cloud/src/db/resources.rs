use shared::billing::ResourceType;
use sqlx::PgPool;

use crate::store::ResourceRecord;

#[derive(sqlx::FromRow)]
struct ResourceRow {
    id: String,
    company_id: String,
    name: String,
    active: bool,
    created_at: i64,
}

pub async fn list(
    pool: &PgPool,
    company_id: &str,
    resource_type: ResourceType,
) -> Result<Vec<ResourceRecord>, sqlx::Error> {
    let rows = sqlx::query_as::<_, ResourceRow>(
        "SELECT id, company_id, name, active, created_at
            FROM company_resources
            WHERE company_id = $1 AND resource_type = $2
            ORDER BY created_at ASC, id ASC",
    )
    .bind(company_id)
    .bind(resource_type.as_db())
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|r| ResourceRecord {
            id: r.id,
            company_id: r.company_id,
            resource_type,
            name: r.name,
            active: r.active,
            created_at: r.created_at,
        })
        .collect())
}

pub async fn create(pool: &PgPool, resource: &ResourceRecord) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO company_resources (id, company_id, resource_type, name, active, created_at)
         VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(&resource.id)
    .bind(&resource.company_id)
    .bind(resource.resource_type.as_db())
    .bind(&resource.name)
    .bind(resource.active)
    .bind(resource.created_at)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn set_active(pool: &PgPool, id: &str, active: bool) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE company_resources SET active = $1 WHERE id = $2")
        .bind(active)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}
