//! Resolution records, plus the result and squad listings built on them.

use crate::domain::{
    Amount, CandidateId, CandidateSnapshot, ClaimantId, ResolutionRecord, ReversalHandle,
    SeasonCode, TimeMs,
};
use sqlx::sqlite::{SqliteConnection, SqliteRow};
use sqlx::Row;

use super::candidates::snapshot_from_row;
use super::{decode_amount, parse_amount, Repository};

/// A resolution row with its lifecycle markers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredResolution {
    pub season_code: SeasonCode,
    pub record: ResolutionRecord,
    pub reverted_at: Option<TimeMs>,
    /// Set when a later sale of an unsold candidate replaced this record.
    pub superseded_at: Option<TimeMs>,
}

/// One candidate with its live resolution, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultRow {
    pub candidate: CandidateSnapshot,
    pub resolution: Option<ResolutionRecord>,
    pub claimant_name: Option<String>,
}

fn record_from_row(row: &SqliteRow, amount: Amount) -> ResolutionRecord {
    let handle: String = row.get("handle");
    ResolutionRecord {
        candidate_id: CandidateId::new(row.get::<String, _>("candidate_id")),
        claimant_id: row.get::<Option<String>, _>("claimant_id").map(ClaimantId::new),
        amount,
        is_unsold: row.get("is_unsold"),
        rtm_used: row.get("rtm_used"),
        free_tier: row.get("free_tier"),
        reversal_handle: ReversalHandle::from_raw(handle),
        created_at: TimeMs::new(row.get("created_at")),
    }
}

pub async fn insert_resolution(
    conn: &mut SqliteConnection,
    season: &SeasonCode,
    record: &ResolutionRecord,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO resolutions (
            handle, season_code, candidate_id, claimant_id, amount,
            is_unsold, rtm_used, free_tier, created_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(record.reversal_handle.as_str())
    .bind(season.as_str())
    .bind(record.candidate_id.as_str())
    .bind(record.claimant_id.as_ref().map(|c| c.as_str()))
    .bind(record.amount.to_canonical_string())
    .bind(record.is_unsold)
    .bind(record.rtm_used)
    .bind(record.free_tier)
    .bind(record.created_at.as_ms())
    .execute(&mut *conn)
    .await?;

    Ok(())
}

pub async fn find_resolution(
    conn: &mut SqliteConnection,
    handle: &ReversalHandle,
) -> Result<Option<StoredResolution>, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT handle, season_code, candidate_id, claimant_id, amount, is_unsold,
               rtm_used, free_tier, created_at, reverted_at, superseded_at
        FROM resolutions
        WHERE handle = ?
        "#,
    )
    .bind(handle.as_str())
    .fetch_optional(&mut *conn)
    .await?;

    let Some(r) = row else {
        return Ok(None);
    };
    // a reversal refunds this amount, so it must decode exactly
    let raw: String = r.get("amount");
    let amount = decode_amount(&raw, "amount")?;
    Ok(Some(StoredResolution {
        season_code: SeasonCode::new(r.get::<String, _>("season_code")),
        record: record_from_row(&r, amount),
        reverted_at: r.get::<Option<i64>, _>("reverted_at").map(TimeMs::new),
        superseded_at: r.get::<Option<i64>, _>("superseded_at").map(TimeMs::new),
    }))
}

/// Stamp a resolution as reverted. Returns false if it already was.
pub async fn mark_reverted(
    conn: &mut SqliteConnection,
    handle: &ReversalHandle,
    at: TimeMs,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE resolutions SET reverted_at = ? WHERE handle = ? AND reverted_at IS NULL",
    )
    .bind(at.as_ms())
    .bind(handle.as_str())
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Retire the live unsold record of `candidate`, if there is one.
pub async fn supersede_unsold(
    conn: &mut SqliteConnection,
    season: &SeasonCode,
    candidate: &CandidateId,
    at: TimeMs,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE resolutions
        SET superseded_at = ?
        WHERE season_code = ? AND candidate_id = ? AND is_unsold = 1
          AND reverted_at IS NULL AND superseded_at IS NULL
        "#,
    )
    .bind(at.as_ms())
    .bind(season.as_str())
    .bind(candidate.as_str())
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected())
}

impl Repository {
    /// Every candidate of the season with its live resolution, ordered by
    /// level then name.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn list_results(&self, season: &SeasonCode) -> Result<Vec<ResultRow>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT c.id, c.name, c.level_code, c.is_free_tier, c.allows_random_draw,
                   c.base_amount, c.status,
                   r.handle, r.candidate_id, r.claimant_id, r.amount, r.is_unsold,
                   r.rtm_used, r.free_tier, r.created_at,
                   cl.name AS claimant_name
            FROM candidates c
            LEFT JOIN resolutions r
                ON r.season_code = c.season_code
               AND r.candidate_id = c.id
               AND r.reverted_at IS NULL
               AND r.superseded_at IS NULL
            LEFT JOIN claimants cl
                ON cl.season_code = r.season_code
               AND cl.id = r.claimant_id
            WHERE c.season_code = ?
            ORDER BY c.level_code ASC, c.name ASC, c.id ASC
            "#,
        )
        .bind(season.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| {
                let handle: Option<String> = row.get("handle");
                ResultRow {
                    candidate: snapshot_from_row(row),
                    resolution: handle.map(|h| {
                        let raw: String = row.get("amount");
                        record_from_row(row, parse_amount(&raw, "amount", &h))
                    }),
                    claimant_name: row.get("claimant_name"),
                }
            })
            .collect())
    }

    /// Look up a resolution by handle.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn get_resolution(
        &self,
        handle: &ReversalHandle,
    ) -> Result<Option<StoredResolution>, sqlx::Error> {
        let mut conn = self.pool.acquire().await?;
        find_resolution(&mut *conn, handle).await
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;

    fn sale(candidate: &str, claimant: &str) -> ResolutionRecord {
        ResolutionRecord {
            candidate_id: CandidateId::new(candidate),
            claimant_id: Some(ClaimantId::new(claimant)),
            amount: Amount::from_str_canonical("5.5").unwrap(),
            is_unsold: false,
            rtm_used: false,
            free_tier: false,
            reversal_handle: ReversalHandle::mint(false),
            created_at: TimeMs::new(10),
        }
    }

    #[tokio::test]
    async fn test_insert_find_and_revert() {
        let (repo, _temp) = seeded_repo().await;
        let season = SeasonCode::new(SEASON);
        let record = sale("P1", "A");

        let mut tx = repo.pool().begin().await.unwrap();
        insert_resolution(&mut *tx, &season, &record).await.unwrap();
        tx.commit().await.unwrap();

        let stored = repo.get_resolution(&record.reversal_handle).await.unwrap().unwrap();
        assert_eq!(stored.record, record);
        assert_eq!(stored.season_code, season);
        assert_eq!(stored.reverted_at, None);

        let mut tx = repo.pool().begin().await.unwrap();
        assert!(mark_reverted(&mut *tx, &record.reversal_handle, TimeMs::new(20)).await.unwrap());
        assert!(!mark_reverted(&mut *tx, &record.reversal_handle, TimeMs::new(21)).await.unwrap());
        tx.commit().await.unwrap();

        let stored = repo.get_resolution(&record.reversal_handle).await.unwrap().unwrap();
        assert_eq!(stored.reverted_at, Some(TimeMs::new(20)));
    }

    #[tokio::test]
    async fn test_only_one_live_resolution_per_candidate() {
        let (repo, _temp) = seeded_repo().await;
        let season = SeasonCode::new(SEASON);

        let mut tx = repo.pool().begin().await.unwrap();
        insert_resolution(&mut *tx, &season, &sale("P1", "A")).await.unwrap();
        let second = insert_resolution(&mut *tx, &season, &sale("P1", "B")).await;
        assert!(second.is_err());
    }

    #[tokio::test]
    async fn test_results_join_live_resolution() {
        let (repo, _temp) = seeded_repo().await;
        let season = SeasonCode::new(SEASON);
        let record = sale("P2", "B");

        let mut tx = repo.pool().begin().await.unwrap();
        insert_resolution(&mut *tx, &season, &record).await.unwrap();
        tx.commit().await.unwrap();

        let rows = repo.list_results(&season).await.unwrap();
        assert_eq!(rows.len(), 3);

        let p2 = rows
            .iter()
            .find(|r| r.candidate.descriptor.id.as_str() == "P2")
            .unwrap();
        assert_eq!(p2.resolution.as_ref(), Some(&record));
        assert_eq!(p2.claimant_name.as_deref(), Some("Team B"));

        let p1 = rows
            .iter()
            .find(|r| r.candidate.descriptor.id.as_str() == "P1")
            .unwrap();
        assert!(p1.resolution.is_none());
    }

    #[tokio::test]
    async fn test_corrupt_amount_fails_lookup_by_handle() {
        let (repo, _temp) = seeded_repo().await;
        let season = SeasonCode::new(SEASON);
        let record = sale("P1", "A");

        let mut tx = repo.pool().begin().await.unwrap();
        insert_resolution(&mut *tx, &season, &record).await.unwrap();
        tx.commit().await.unwrap();
        sqlx::query("UPDATE resolutions SET amount = 'five' WHERE handle = ?")
            .bind(record.reversal_handle.as_str())
            .execute(repo.pool())
            .await
            .unwrap();

        let err = repo.get_resolution(&record.reversal_handle).await.unwrap_err();
        assert!(matches!(err, sqlx::Error::ColumnDecode { .. }));
    }
}
