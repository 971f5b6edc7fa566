use std::collections::HashSet;

use chrono::NaiveDate;

use crate::db::Repository;
use crate::error::Result;
use crate::feed::{FeedVariant, SourceTable};
use crate::models::{MergePolicy, NewFact, NONE_ID};

use super::normalizer::{normalize_row, NormalizedRow};

/// The confirmed table plus its row-aligned sibling tables.
pub struct SourceSet {
    pub confirmed: SourceTable,
    pub deaths: SourceTable,
    pub recovered: Option<SourceTable>,
}

impl SourceSet {
    pub fn load(
        variant: FeedVariant,
        confirmed: &str,
        deaths: &str,
        recovered: Option<&str>,
    ) -> Result<Self> {
        Ok(Self {
            confirmed: SourceTable::load(confirmed, variant)?,
            deaths: SourceTable::load(deaths, variant)?,
            recovered: recovered
                .map(|path| SourceTable::load(path, variant))
                .transpose()?,
        })
    }
}

/// Per-file ingest bookkeeping, for logging and tests.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IngestSummary {
    pub rows_read: usize,
    pub rows_skipped: usize,
    pub facts_written: usize,
    pub facts_skipped: usize,
    pub days_tracked: usize,
}

/// Reconcile one source file into the fact table.
///
/// Days already in the tracked ledger are skipped so overlapping re-runs
/// are no-ops, except synonym-merged rows, which are partial contributions
/// toward a shared key and always sum. When the whole file has been
/// processed its days are marked tracked.
pub async fn ingest(
    repo: &Repository,
    source: &SourceSet,
    policy: MergePolicy,
) -> Result<IngestSummary> {
    let tracked = repo.tracked_dates().await?;
    let mut summary = IngestSummary::default();

    for row in source.confirmed.rows() {
        summary.rows_read += 1;
        let Some(normalized) = normalize_row(
            &source.confirmed,
            row,
            &source.deaths,
            source.recovered.as_ref(),
        )?
        else {
            summary.rows_skipped += 1;
            continue;
        };
        write_row(repo, &normalized, policy, &tracked, &mut summary).await?;
    }

    let days: Vec<NaiveDate> = source.confirmed.dates().iter().map(|&(_, day)| day).collect();
    summary.days_tracked = days.iter().filter(|day| !tracked.contains(day)).count();
    repo.track_dates(days).await?;

    tracing::info!(
        "Ingested {} facts from {} rows ({} facts already tracked, {} rows out of scope, {} new days)",
        summary.facts_written,
        summary.rows_read,
        summary.facts_skipped,
        summary.rows_skipped,
        summary.days_tracked,
    );

    Ok(summary)
}

async fn write_row(
    repo: &Repository,
    row: &NormalizedRow,
    policy: MergePolicy,
    tracked: &HashSet<NaiveDate>,
    summary: &mut IngestSummary,
) -> Result<()> {
    // fully tracked rows are skipped before touching the registry, so a
    // pure re-run creates no geography rows either
    if !row.geography.synonym_merge
        && row.counts.iter().all(|counts| tracked.contains(&counts.day))
    {
        summary.facts_skipped += row.counts.len();
        return Ok(());
    }

    let country = repo.resolve_country(&row.geography.country).await?;
    let subdivision = match &row.geography.subdivision {
        Some(name) => repo.resolve_subdivision(name, country).await?,
        None => NONE_ID,
    };
    let county = match &row.geography.county {
        Some(name) => repo.resolve_county(name, subdivision).await?,
        None => NONE_ID,
    };

    for counts in &row.counts {
        let fact = NewFact {
            day: counts.day,
            country,
            subdivision,
            county,
            positive_cases: counts.positive_cases,
            deaths: counts.deaths,
            recovered: counts.recovered,
        };

        if row.geography.synonym_merge {
            repo.merge_fact(fact).await?;
            summary.facts_written += 1;
        } else if tracked.contains(&counts.day) {
            summary.facts_skipped += 1;
        } else {
            match policy {
                MergePolicy::Replace => repo.insert_fact(fact).await?,
                MergePolicy::Additive => repo.merge_fact(fact).await?,
            }
            summary.facts_written += 1;
        }
    }

    Ok(())
}
