//! Claimant aggregate operations.

use crate::domain::{Amount, ClaimantAggregate, ClaimantId, SeasonCode};
use sqlx::sqlite::{SqliteConnection, SqliteRow};
use sqlx::Row;

use super::{decode_amount, parse_amount, Repository};

const CLAIMANT_COLUMNS: &str =
    "id, name, amount_spent, players_held, free_quota_used, rtm_used, rtm_eligible";

fn claimant_from_row(row: &SqliteRow, amount_spent: Amount) -> ClaimantAggregate {
    ClaimantAggregate {
        id: ClaimantId::new(row.get::<String, _>("id")),
        amount_spent,
        name: row.get("name"),
        players_held: row.get("players_held"),
        free_quota_used: row.get("free_quota_used"),
        rtm_used: row.get("rtm_used"),
        rtm_eligible: row.get("rtm_eligible"),
    }
}

/// Read a claimant inside an open transaction. A corrupt `amount_spent`
/// is an error, so the transaction rolls back instead of overwriting it.
pub async fn fetch_claimant(
    conn: &mut SqliteConnection,
    season: &SeasonCode,
    id: &ClaimantId,
) -> Result<Option<ClaimantAggregate>, sqlx::Error> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM claimants WHERE id = ? AND season_code = ?",
        CLAIMANT_COLUMNS
    ))
    .bind(id.as_str())
    .bind(season.as_str())
    .fetch_optional(&mut *conn)
    .await?;

    match row {
        Some(row) => {
            let raw: String = row.get("amount_spent");
            let amount_spent = decode_amount(&raw, "amount_spent")?;
            Ok(Some(claimant_from_row(&row, amount_spent)))
        }
        None => Ok(None),
    }
}

/// Overwrite a claimant's counters with `next`.
pub async fn write_claimant_totals(
    conn: &mut SqliteConnection,
    season: &SeasonCode,
    next: &ClaimantAggregate,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE claimants
        SET amount_spent = ?, players_held = ?, free_quota_used = ?, rtm_used = ?
        WHERE season_code = ? AND id = ?
        "#,
    )
    .bind(next.amount_spent.to_canonical_string())
    .bind(next.players_held)
    .bind(next.free_quota_used)
    .bind(next.rtm_used)
    .bind(season.as_str())
    .bind(next.id.as_str())
    .execute(&mut *conn)
    .await?;

    Ok(())
}

impl Repository {
    /// Insert a claimant or refresh its name and RTM eligibility.
    ///
    /// Counters are only set on first insert; afterwards they belong to the
    /// settlement coordinator.
    ///
    /// # Errors
    /// Returns an error if the write fails.
    pub async fn upsert_claimant(
        &self,
        season: &SeasonCode,
        claimant: &ClaimantAggregate,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO claimants (
                id, season_code, name, amount_spent, players_held,
                free_quota_used, rtm_used, rtm_eligible
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(season_code, id) DO UPDATE SET
                name = excluded.name,
                rtm_eligible = excluded.rtm_eligible
            "#,
        )
        .bind(claimant.id.as_str())
        .bind(season.as_str())
        .bind(&claimant.name)
        .bind(claimant.amount_spent.to_canonical_string())
        .bind(claimant.players_held)
        .bind(claimant.free_quota_used)
        .bind(claimant.rtm_used)
        .bind(claimant.rtm_eligible)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Get a claimant's current totals.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn get_claimant(
        &self,
        season: &SeasonCode,
        id: &ClaimantId,
    ) -> Result<Option<ClaimantAggregate>, sqlx::Error> {
        let mut conn = self.pool.acquire().await?;
        fetch_claimant(&mut *conn, season, id).await
    }

    /// All claimants of a season, ordered by name.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn list_claimants(
        &self,
        season: &SeasonCode,
    ) -> Result<Vec<ClaimantAggregate>, sqlx::Error> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM claimants WHERE season_code = ? ORDER BY name ASC, id ASC",
            CLAIMANT_COLUMNS
        ))
        .bind(season.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| {
                let id: String = row.get("id");
                let raw: String = row.get("amount_spent");
                claimant_from_row(row, parse_amount(&raw, "amount_spent", &id))
            })
            .collect())
    }
}
