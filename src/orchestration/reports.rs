//! Read-only views over claimants and resolutions: the claimant board, a
//! claimant's squad and the season results listing.

use crate::db::repo::ResultRow;
use crate::domain::{
    Amount, CandidateDescriptor, CandidateStatus, ClaimantAggregate, ClaimantId, ReversalHandle,
    SessionLimits,
};
use crate::engine::{evaluate, IneligibleReason};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardEntry {
    #[serde(flatten)]
    pub claimant: ClaimantAggregate,
    /// `None` when no candidate is in play.
    pub eligible: Option<bool>,
    pub reason: Option<IneligibleReason>,
    pub budget_remaining: Amount,
    /// `None` if the ratio does not fit an amount.
    pub budget_used_percent: Option<Amount>,
}

/// One row per claimant with budget usage and, if a candidate is in play,
/// whether the claimant may receive it.
pub fn claimant_board(
    claimants: &[ClaimantAggregate],
    limits: &SessionLimits,
    in_play: Option<&CandidateDescriptor>,
) -> Vec<BoardEntry> {
    claimants
        .iter()
        .map(|c| {
            let verdict = in_play.map(|candidate| evaluate(candidate, c, limits));
            BoardEntry {
                claimant: c.clone(),
                eligible: verdict.as_ref().map(|v| v.is_ok()),
                reason: verdict.and_then(|v| v.err()),
                budget_remaining: limits
                    .budget_limit
                    .checked_sub(c.amount_spent)
                    .unwrap_or_default(),
                budget_used_percent: c.amount_spent.percent_of(limits.budget_limit),
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SquadMember {
    pub candidate: CandidateDescriptor,
    pub amount: Amount,
    pub rtm_used: bool,
    pub reversal_handle: ReversalHandle,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SquadLevel {
    pub level_code: String,
    pub members: Vec<SquadMember>,
    pub count: usize,
    pub total_amount: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Squad {
    pub claimant_id: ClaimantId,
    pub levels: Vec<SquadLevel>,
    pub count: usize,
    pub total_amount: Amount,
}

/// Candidates currently sold to `claimant`, grouped by level code.
pub fn squad(rows: &[ResultRow], claimant: &ClaimantId) -> Squad {
    let mut levels: BTreeMap<&str, Vec<SquadMember>> = BTreeMap::new();
    for row in rows {
        let Some(res) = &row.resolution else { continue };
        if res.is_unsold || res.claimant_id.as_ref() != Some(claimant) {
            continue;
        }
        levels
            .entry(row.candidate.descriptor.level_code.as_str())
            .or_default()
            .push(SquadMember {
                candidate: row.candidate.descriptor.clone(),
                amount: res.amount,
                rtm_used: res.rtm_used,
                reversal_handle: res.reversal_handle.clone(),
            });
    }

    let levels: Vec<SquadLevel> = levels
        .into_iter()
        .map(|(level, members)| SquadLevel {
            level_code: level.to_string(),
            count: members.len(),
            total_amount: members.iter().map(|m| m.amount).sum(),
            members,
        })
        .collect();

    Squad {
        claimant_id: claimant.clone(),
        count: levels.iter().map(|l| l.count).sum(),
        total_amount: levels.iter().map(|l| l.total_amount).sum(),
        levels,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultsFilter {
    pub level_code: Option<String>,
    pub status: Option<CandidateStatus>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultEntry {
    pub candidate: CandidateDescriptor,
    pub status: CandidateStatus,
    pub claimant_id: Option<ClaimantId>,
    pub claimant_name: Option<String>,
    pub amount: Option<Amount>,
    pub rtm_used: bool,
    pub reversal_handle: Option<ReversalHandle>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelCounts {
    pub level_code: String,
    pub sold: usize,
    pub unsold: usize,
    pub available: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultsReport {
    pub entries: Vec<ResultEntry>,
    pub levels: Vec<LevelCounts>,
}

/// The results listing. Level counts honour the level filter but ignore the
/// status filter, so the tabs always show every bucket.
pub fn results(rows: &[ResultRow], filter: &ResultsFilter) -> ResultsReport {
    let in_level = |row: &&ResultRow| {
        filter
            .level_code
            .as_deref()
            .map_or(true, |l| row.candidate.descriptor.level_code == l)
    };

    let mut counts: BTreeMap<&str, LevelCounts> = BTreeMap::new();
    for row in rows.iter().filter(in_level) {
        let level = row.candidate.descriptor.level_code.as_str();
        let entry = counts.entry(level).or_insert_with(|| LevelCounts {
            level_code: level.to_string(),
            ..LevelCounts::default()
        });
        match row.candidate.status {
            CandidateStatus::Sold => entry.sold += 1,
            CandidateStatus::Unsold => entry.unsold += 1,
            CandidateStatus::Available => entry.available += 1,
        }
    }

    let entries = rows
        .iter()
        .filter(in_level)
        .filter(|row| filter.status.map_or(true, |s| row.candidate.status == s))
        .map(|row| {
            let res = row.resolution.as_ref();
            ResultEntry {
                candidate: row.candidate.descriptor.clone(),
                status: row.candidate.status,
                claimant_id: res.and_then(|r| r.claimant_id.clone()),
                claimant_name: row.claimant_name.clone(),
                amount: res.filter(|r| !r.is_unsold).map(|r| r.amount),
                rtm_used: res.map_or(false, |r| r.rtm_used),
                reversal_handle: res.map(|r| r.reversal_handle.clone()),
            }
        })
        .collect();

    ResultsReport {
        entries,
        levels: counts.into_values().collect(),
    }
}
