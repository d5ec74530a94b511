use crate::api::rest::{Filter, RestClient};
use crate::dataset::ReferenceData;
use crate::error::SeedError;
use crate::types::{LookupEntry, LookupRow, LookupTable};
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Updated,
}

/// Check-then-insert-or-update keyed on `code`.
///
/// Two round trips, not atomic: a row created by someone else between the
/// GET and the POST surfaces as a conflict status from the server.
pub async fn upsert_entry(
    client: &RestClient,
    table: LookupTable,
    entry: &LookupEntry,
) -> Result<UpsertOutcome, SeedError> {
    let existing: Vec<LookupRow> = client
        .select(table.as_str(), &[Filter::eq("code", &entry.code)])
        .await?;

    match existing.first() {
        Some(row) => {
            let filter = row.update_filter(table)?;
            client.update(table.as_str(), &[filter], entry).await?;
            Ok(UpsertOutcome::Updated)
        }
        None => {
            client.insert(table.as_str(), entry).await?;
            Ok(UpsertOutcome::Created)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableReport {
    pub table: LookupTable,
    pub created: usize,
    pub updated: usize,
    /// Codes whose upsert failed.
    pub failed: Vec<String>,
}

impl TableReport {
    fn new(table: LookupTable) -> Self {
        Self {
            table,
            created: 0,
            updated: 0,
            failed: Vec::new(),
        }
    }

    pub fn succeeded(&self) -> usize {
        self.created + self.updated
    }

    pub fn is_unchanged(&self) -> bool {
        self.succeeded() == 0
    }
}

/// Upsert every entry in order. Failures are logged and skipped.
pub async fn seed_table(
    client: &RestClient,
    table: LookupTable,
    entries: &[LookupEntry],
) -> TableReport {
    info!(%table, count = entries.len(), "seeding table");
    let mut report = TableReport::new(table);

    for entry in entries {
        match upsert_entry(client, table, entry).await {
            Ok(UpsertOutcome::Created) => {
                debug!(%table, code = %entry.code, "created");
                report.created += 1;
            }
            Ok(UpsertOutcome::Updated) => {
                debug!(%table, code = %entry.code, "updated");
                report.updated += 1;
            }
            Err(e) => {
                warn!(
                    %table,
                    code = %entry.code,
                    status = ?e.status(),
                    error = %e,
                    "upsert failed, skipping"
                );
                report.failed.push(entry.code.clone());
            }
        }
    }

    if report.is_unchanged() {
        warn!(%table, failed = report.failed.len(), "no changes");
    } else {
        info!(
            %table,
            created = report.created,
            updated = report.updated,
            failed = report.failed.len(),
            "table seeded"
        );
    }
    report
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub reports: Vec<TableReport>,
}

impl SeedSummary {
    /// Tables with at least one successful upsert.
    pub fn tables_touched(&self) -> usize {
        self.reports.iter().filter(|r| !r.is_unchanged()).count()
    }

    pub fn total_failed(&self) -> usize {
        self.reports.iter().map(|r| r.failed.len()).sum()
    }
}

/// Seed each table of `data` in order, pausing `table_pause` between tables.
pub async fn seed_all(
    client: &RestClient,
    data: &ReferenceData,
    table_pause: Duration,
) -> SeedSummary {
    let mut summary = SeedSummary::default();
    for (idx, (table, entries)) in data.tables().enumerate() {
        if idx > 0 && !table_pause.is_zero() {
            tokio::time::sleep(table_pause).await;
        }
        summary.reports.push(seed_table(client, table, entries).await);
    }
    summary
}
