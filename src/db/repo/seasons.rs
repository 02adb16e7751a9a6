//! Season limits and completion.

use crate::domain::{Season, SeasonCode, SessionLimits, TimeMs};
use sqlx::sqlite::{SqliteConnection, SqliteRow};
use sqlx::Row;

use super::{parse_amount, Repository};

fn limits_from_row(row: &SqliteRow, code: &str) -> SessionLimits {
    let budget_limit: String = row.get("budget_limit");
    let min_candidate_amount: String = row.get("min_candidate_amount");
    SessionLimits {
        max_claimants: row.get("max_players"),
        max_free_quota: row.get("max_free"),
        max_rtm_quota: row.get("max_rtm"),
        budget_limit: parse_amount(&budget_limit, "budget_limit", code),
        min_candidate_amount: parse_amount(&min_candidate_amount, "min_candidate_amount", code),
    }
}

/// Read a season's limits inside an open transaction.
pub async fn fetch_limits(
    conn: &mut SqliteConnection,
    code: &SeasonCode,
) -> Result<Option<SessionLimits>, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT max_players, max_free, max_rtm, budget_limit, min_candidate_amount
        FROM seasons
        WHERE code = ?
        "#,
    )
    .bind(code.as_str())
    .fetch_optional(&mut *conn)
    .await?;

    Ok(row.map(|r| limits_from_row(&r, code.as_str())))
}

impl Repository {
    /// Create a season or replace its limits. Completion state is untouched.
    ///
    /// # Errors
    /// Returns an error if the write fails.
    pub async fn upsert_season(
        &self,
        code: &SeasonCode,
        limits: &SessionLimits,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO seasons (code, max_players, max_free, max_rtm, budget_limit, min_candidate_amount)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(code) DO UPDATE SET
                max_players = excluded.max_players,
                max_free = excluded.max_free,
                max_rtm = excluded.max_rtm,
                budget_limit = excluded.budget_limit,
                min_candidate_amount = excluded.min_candidate_amount
            "#,
        )
        .bind(code.as_str())
        .bind(limits.max_claimants)
        .bind(limits.max_free_quota)
        .bind(limits.max_rtm_quota)
        .bind(limits.budget_limit.to_canonical_string())
        .bind(limits.min_candidate_amount.to_canonical_string())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Get a season by code.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn get_season(&self, code: &SeasonCode) -> Result<Option<Season>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT max_players, max_free, max_rtm, budget_limit, min_candidate_amount,
                   completed_at, completion_note
            FROM seasons
            WHERE code = ?
            "#,
        )
        .bind(code.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| Season {
            code: code.clone(),
            limits: limits_from_row(&r, code.as_str()),
            completed_at: r.get::<Option<i64>, _>("completed_at").map(TimeMs::new),
            completion_note: r.get("completion_note"),
        }))
    }

    /// Mark a season complete. Returns false if it was already complete or
    /// does not exist.
    ///
    /// # Errors
    /// Returns an error if the update fails.
    pub async fn complete_season(
        &self,
        code: &SeasonCode,
        note: Option<&str>,
        at: TimeMs,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE seasons
            SET completed_at = ?, completion_note = ?
            WHERE code = ? AND completed_at IS NULL
            "#,
        )
        .bind(at.as_ms())
        .bind(note)
        .bind(code.as_str())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
