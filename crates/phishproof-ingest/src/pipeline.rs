//! Fetch → store → parse → activate workflow for ranked domain lists.
//!
//! Two independently scheduled entry points drive a list through its
//! lifecycle: [`IngestPipeline::refresh_list_metadata`] makes sure the
//! freshest available list is downloaded and registered, and
//! [`IngestPipeline::process_pending_list`] loads the newest
//! unprocessed list into the store and flips it active. Both are
//! idempotent, and neither ever mutates the currently active list on
//! failure.

use std::io::BufRead;

use chrono::{Days, NaiveDate};
use phishproof_analysis::extract_features;
use phishproof_db::queries;
use phishproof_types::{unix_now, DomainFeatures, ListMetadata};
use rusqlite::Connection;
use tokio::sync::Mutex;

use crate::object_store::{list_object_key, ObjectStore};
use crate::provider::{DailyListMetadata, ListProvider, ProviderError};
use crate::retry::{with_retry, RetryPolicy};
use crate::IngestError;

/// Pipeline tuning knobs.
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    /// Object-key prefix for stored CSVs.
    pub object_prefix: String,
    /// Rows per bulk insert.
    pub batch_size: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            object_prefix: "tranco-full".to_string(),
            batch_size: 1000,
        }
    }
}

/// Summary of one completed processing pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProcessedList {
    pub list_id: String,
    /// Rows read from the CSV.
    pub record_count: u64,
    /// Rows whose domain failed feature extraction.
    pub skipped: u64,
}

/// The ingestion pipeline against one provider and one object store.
pub struct IngestPipeline<P, S> {
    provider: P,
    objects: S,
    retry: RetryPolicy,
    cfg: PipelineConfig,
}

impl<P: ListProvider, S: ObjectStore> IngestPipeline<P, S> {
    pub fn new(provider: P, objects: S, retry: RetryPolicy, cfg: PipelineConfig) -> Self {
        Self {
            provider,
            objects,
            retry,
            cfg,
        }
    }

    /// Resolve today's list, download its CSV if it is not stored yet,
    /// and make sure list metadata exists for it.
    ///
    /// Re-running for an already-known list re-uploads nothing and
    /// creates no duplicate metadata. A cycle that cannot resolve any
    /// list within the retry budget fails without touching previously
    /// ingested data.
    pub async fn refresh_list_metadata(
        &self,
        db: &Mutex<Connection>,
        today: NaiveDate,
    ) -> Result<ListMetadata, IngestError> {
        let meta = self.resolve_metadata(today).await?;
        let key = list_object_key(&self.cfg.object_prefix, &meta.list_id);

        let size_bytes = if self.objects.exists(&key)? {
            tracing::debug!(list_id = meta.list_id, key, "list object already stored");
            self.objects.len(&key)?
        } else {
            let provider = &self.provider;
            let list_id = meta.list_id.clone();
            let body = with_retry(
                &self.retry,
                "full list download",
                move || {
                    let list_id = list_id.clone();
                    async move { provider.full_list(&list_id).await }
                },
                |e: &ProviderError| !e.steps_date(),
            )
            .await?;
            self.objects.put(&key, &body)?;
            tracing::info!(list_id = meta.list_id, bytes = body.len(), "list downloaded");
            body.len() as u64
        };

        let conn = db.lock().await;
        let created = queries::lists::create(&conn, &meta.list_id, unix_now(), size_bytes)?;
        Ok(created.into_metadata())
    }

    /// Walk back from `today` until the provider serves usable
    /// metadata, bounded by the retry budget.
    async fn resolve_metadata(
        &self,
        today: NaiveDate,
    ) -> Result<DailyListMetadata, IngestError> {
        let mut date = today;
        let mut attempt: u32 = 0;
        loop {
            let error = match self.provider.metadata_for_date(date).await {
                Ok(meta) if meta.is_usable() => return Ok(meta),
                Ok(meta) => {
                    tracing::warn!(
                        %date,
                        list_id = meta.list_id,
                        "provider has no usable list for date"
                    );
                    // Same treatment as a missing date.
                    ProviderError::NotFound
                }
                Err(error) => error,
            };

            attempt += 1;
            if attempt >= self.retry.max_attempts {
                tracing::error!(%error, attempts = attempt, "list metadata resolution exhausted");
                return Err(IngestError::RetriesExhausted {
                    what: "list metadata",
                    attempts: attempt,
                });
            }
            if error.steps_date() {
                date = date.checked_sub_days(Days::new(1)).unwrap_or(date);
                tracing::warn!(%error, next_date = %date, "stepping metadata date back");
            } else {
                tracing::warn!(%error, %date, "metadata fetch failed, retrying same date");
            }
            tokio::time::sleep(self.retry.delay_for(attempt - 1)).await;
        }
    }

    /// Load the newest unprocessed list into the store and activate it.
    ///
    /// Returns `Ok(None)` when nothing is pending. Any rows a partial
    /// earlier run left behind for the same list are purged first, so
    /// reprocessing never duplicates records.
    pub async fn process_pending_list(
        &self,
        db: &Mutex<Connection>,
    ) -> Result<Option<ProcessedList>, IngestError> {
        let pending = {
            let conn = db.lock().await;
            queries::lists::latest_unprocessed(&conn)?
        };
        let Some(pending) = pending else {
            tracing::debug!("no unprocessed list");
            return Ok(None);
        };

        {
            let conn = db.lock().await;
            let stale = queries::domains::purge_by_list(&conn, &pending.list_id)?;
            if stale > 0 {
                tracing::info!(
                    list_id = pending.list_id,
                    stale,
                    "purged leftover rows before reprocessing"
                );
            }
        }

        let key = list_object_key(&self.cfg.object_prefix, &pending.list_id);
        let reader = self.objects.get(&key)?;

        let mut batch: Vec<DomainFeatures> = Vec::with_capacity(self.cfg.batch_size);
        let mut line_number: u64 = 0;
        let mut record_count: u64 = 0;
        let mut skipped: u64 = 0;

        for line in reader.lines() {
            let line = line?;
            line_number += 1;
            let (rank, domain) = parse_row(line_number, &line)?;
            record_count += 1;

            match extract_features(domain, rank) {
                Ok(features) => batch.push(features),
                Err(error) => {
                    skipped += 1;
                    tracing::debug!(%error, line_number, "skipping unextractable domain");
                }
            }

            if batch.len() >= self.cfg.batch_size {
                let conn = db.lock().await;
                queries::domains::insert_batch(&conn, &pending.list_id, &batch)?;
                batch.clear();
            }
        }
        if !batch.is_empty() {
            let conn = db.lock().await;
            queries::domains::insert_batch(&conn, &pending.list_id, &batch)?;
        }

        let conn = db.lock().await;
        queries::lists::mark_processed(&conn, &pending.list_id, record_count)?;
        queries::lists::activate(&conn, &pending.list_id)?;
        tracing::info!(
            list_id = pending.list_id,
            record_count,
            skipped,
            "list processed and activated"
        );

        Ok(Some(ProcessedList {
            list_id: pending.list_id,
            record_count,
            skipped,
        }))
    }

    /// Retention sweep: remove domain rows for superseded lists and
    /// mark their metadata purged.
    pub async fn purge_inactive_lists(&self, db: &Mutex<Connection>) -> Result<u64, IngestError> {
        let conn = db.lock().await;
        let stale = queries::lists::inactive_processed(&conn)?;
        let mut purged = 0u64;
        for list in stale {
            let removed = queries::domains::purge_by_list(&conn, &list.list_id)?;
            queries::lists::mark_purged(&conn, &list.list_id)?;
            tracing::info!(list_id = list.list_id, removed, "purged superseded list");
            purged += 1;
        }
        Ok(purged)
    }
}

/// Split one CSV row into (rank, domain).
///
/// Anything other than exactly two fields with an integer rank aborts
/// the cycle: a malformed row means the source format changed.
fn parse_row(line_number: u64, line: &str) -> Result<(u64, &str), IngestError> {
    let malformed = || IngestError::MalformedRecord {
        line: line_number,
        content: line.to_string(),
    };

    let mut fields = line.split(',');
    let (rank, domain) = match (fields.next(), fields.next(), fields.next()) {
        (Some(rank), Some(domain), None) => (rank, domain),
        _ => return Err(malformed()),
    };
    let rank: u64 = rank.trim().parse().map_err(|_| malformed())?;
    Ok((rank, domain.trim()))
}
