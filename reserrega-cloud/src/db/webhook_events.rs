use sqlx::PgPool;

/// INSERT first and check rows_affected, so concurrent deliveries cannot both win
pub async fn record(
    pool: &PgPool,
    event_id: &str,
    event_type: &str,
    processed_at: i64,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO processed_webhook_events (event_id, event_type, processed_at)
         VALUES ($1, $2, $3) ON CONFLICT DO NOTHING",
    )
    .bind(event_id)
    .bind(event_type)
    .bind(processed_at)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Drop a recorded event so the provider's retry is processed again
pub async fn forget(pool: &PgPool, event_id: &str) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM processed_webhook_events WHERE event_id = $1")
        .bind(event_id)
        .execute(pool)
        .await?;
    Ok(())
}
