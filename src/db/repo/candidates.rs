//! Candidate descriptors and status.

use crate::domain::{CandidateDescriptor, CandidateId, CandidateSnapshot, CandidateStatus, SeasonCode};
use sqlx::sqlite::{SqliteConnection, SqliteRow};
use sqlx::Row;
use tracing::warn;

use super::{parse_amount, Repository};

const CANDIDATE_COLUMNS: &str =
    "id, name, level_code, is_free_tier, allows_random_draw, base_amount, status";

pub(super) fn snapshot_from_row(row: &SqliteRow) -> CandidateSnapshot {
    let id: String = row.get("id");
    let base_amount: Option<String> = row.get("base_amount");
    let status: String = row.get("status");
    let status = status.parse::<CandidateStatus>().unwrap_or_else(|e| {
        warn!(candidate = %id, error = %e, "Unknown candidate status, treating as sold");
        CandidateStatus::Sold
    });

    CandidateSnapshot {
        descriptor: CandidateDescriptor {
            base_amount: base_amount.map(|raw| parse_amount(&raw, "base_amount", &id)),
            id: CandidateId::new(id),
            name: row.get("name"),
            level_code: row.get("level_code"),
            is_free_tier: row.get("is_free_tier"),
            allows_random_draw: row.get("allows_random_draw"),
        },
        status,
    }
}

/// Compare-and-set on a candidate's status.
///
/// Returns false if the candidate is not currently in `expected`. Run as the
/// first write of a settlement transaction so the loser of a race sees zero
/// rows affected.
pub async fn swap_candidate_status(
    conn: &mut SqliteConnection,
    season: &SeasonCode,
    id: &CandidateId,
    expected: CandidateStatus,
    next: CandidateStatus,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE candidates SET status = ? WHERE season_code = ? AND id = ? AND status = ?",
    )
    .bind(next.as_str())
    .bind(season.as_str())
    .bind(id.as_str())
    .bind(expected.as_str())
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Current status of a candidate, read inside an open transaction.
pub async fn fetch_candidate_status(
    conn: &mut SqliteConnection,
    season: &SeasonCode,
    id: &CandidateId,
) -> Result<Option<CandidateStatus>, sqlx::Error> {
    let row = sqlx::query("SELECT status FROM candidates WHERE season_code = ? AND id = ?")
        .bind(season.as_str())
        .bind(id.as_str())
        .fetch_optional(&mut *conn)
        .await?;

    Ok(row.map(|r| {
        let raw: String = r.get("status");
        raw.parse::<CandidateStatus>().unwrap_or(CandidateStatus::Sold)
    }))
}

impl Repository {
    /// Insert a candidate or refresh its descriptor. Status is only set on
    /// first insert.
    ///
    /// # Errors
    /// Returns an error if the write fails.
    pub async fn upsert_candidate(
        &self,
        season: &SeasonCode,
        candidate: &CandidateDescriptor,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO candidates (
                id, season_code, name, level_code, is_free_tier, allows_random_draw, base_amount
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(season_code, id) DO UPDATE SET
                name = excluded.name,
                level_code = excluded.level_code,
                is_free_tier = excluded.is_free_tier,
                allows_random_draw = excluded.allows_random_draw,
                base_amount = excluded.base_amount
            "#,
        )
        .bind(candidate.id.as_str())
        .bind(season.as_str())
        .bind(&candidate.name)
        .bind(&candidate.level_code)
        .bind(candidate.is_free_tier)
        .bind(candidate.allows_random_draw)
        .bind(candidate.base_amount.map(|a| a.to_canonical_string()))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Get a candidate together with its current status.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn get_candidate(
        &self,
        season: &SeasonCode,
        id: &CandidateId,
    ) -> Result<Option<CandidateSnapshot>, sqlx::Error> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM candidates WHERE id = ? AND season_code = ?",
            CANDIDATE_COLUMNS
        ))
        .bind(id.as_str())
        .bind(season.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(snapshot_from_row))
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;

    #[tokio::test]
    async fn test_candidate_roundtrip() {
        let (repo, _temp) = seeded_repo().await;
        let season = SeasonCode::new(SEASON);

        let snap = repo
            .get_candidate(&season, &CandidateId::new("P1"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(snap.descriptor, candidate("P1", false));
        assert_eq!(snap.status, CandidateStatus::Available);

        let free = repo
            .get_candidate(&season, &CandidateId::new("F1"))
            .await
            .unwrap()
            .unwrap();
        assert!(free.descriptor.is_free_tier);
        assert_eq!(free.descriptor.base_amount, None);
    }

    #[tokio::test]
    async fn test_swap_status_only_from_expected() {
        let (repo, _temp) = seeded_repo().await;
        let season = SeasonCode::new(SEASON);
        let id = CandidateId::new("P1");
        let (from, to) = (CandidateStatus::Available, CandidateStatus::Sold);

        let mut tx = repo.pool().begin().await.unwrap();
        assert!(swap_candidate_status(&mut *tx, &season, &id, from, to).await.unwrap());
        assert!(!swap_candidate_status(&mut *tx, &season, &id, from, to).await.unwrap());
        tx.commit().await.unwrap();

        let snap = repo
            .get_candidate(&season, &id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(snap.status, CandidateStatus::Sold);
    }

    #[tokio::test]
    async fn test_status_is_per_season() {
        let (repo, _temp) = seeded_repo().await;
        let first = SeasonCode::new(SEASON);
        let second = SeasonCode::new("S27");
        let id = CandidateId::new("P1");
        repo.upsert_season(&second, &limits()).await.unwrap();
        repo.upsert_candidate(&second, &candidate("P1", false)).await.unwrap();

        let mut tx = repo.pool().begin().await.unwrap();
        assert!(swap_candidate_status(
            &mut *tx,
            &second,
            &id,
            CandidateStatus::Available,
            CandidateStatus::Sold
        )
        .await
        .unwrap());
        tx.commit().await.unwrap();

        let in_first = repo.get_candidate(&first, &id).await.unwrap().unwrap();
        let in_second = repo.get_candidate(&second, &id).await.unwrap().unwrap();
        assert_eq!(in_first.status, CandidateStatus::Available);
        assert_eq!(in_second.status, CandidateStatus::Sold);
    }
}
