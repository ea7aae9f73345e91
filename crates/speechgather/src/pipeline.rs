use futures::stream::{self, StreamExt};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::client::{ClientError, RecordClient};
use crate::fallback::{FullTextFetcher, FullTextSource, resolve_url};
use crate::filter::DateRange;
use crate::query::{DebatesQuery, HansardQuery};
use crate::truncation::is_truncated;
use crate::types::{CanonicalSpeech, RawRecord, UNKNOWN_SPEAKER};
use crate::{UNAVAILABLE_SPEECH, UNAVAILABLE_URL};

fn detail_link(record: &RawRecord) -> Option<&str> {
    record
        .detail_url
        .as_deref()
        .map(str::trim)
        .filter(|url| !url.is_empty())
}

#[derive(Debug, Clone)]
pub struct Reconciler<S> {
    source: S,
    base_url: Url,
    concurrency: usize,
}

impl<S: FullTextSource> Reconciler<S> {
    pub fn new(source: S, base_url: Url) -> Self {
        Self {
            source,
            base_url,
            concurrency: 1,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn source_url(&self, record: &RawRecord) -> String {
        let Some(raw) = detail_link(record) else {
            return UNAVAILABLE_URL.to_string();
        };
        match resolve_url(&self.base_url, raw) {
            Ok(url) => url.to_string(),
            Err(e) => {
                log::warn!("Record {} has an unusable detail link {:?}: {}", record.id, raw, e);
                UNAVAILABLE_URL.to_string()
            }
        }
    }

    pub async fn reconcile_record(&self, record: RawRecord) -> CanonicalSpeech {
        let source_url = self.source_url(&record);
        let date = record.parsed_date();
        if date.is_none() {
            log::warn!("Record {} has an unparsable date {:?}", record.id, record.date);
        }

        let full_text = if !is_truncated(&record.body) {
            record.body
        } else if let Some(url) = detail_link(&record) {
            log::debug!("Record {} looks truncated, fetching the full text", record.id);
            self.source.fetch_full_text(url).await
        } else {
            log::warn!("Record {} looks truncated but has no detail link", record.id);
            UNAVAILABLE_SPEECH.to_string()
        };

        CanonicalSpeech {
            id: record.id,
            date,
            speaker_name: record
                .speaker_name
                .unwrap_or_else(|| UNKNOWN_SPEAKER.to_string()),
            source_url,
            full_text,
        }
    }

    pub async fn reconcile(&self, records: Vec<RawRecord>) -> Vec<CanonicalSpeech> {
        self.reconcile_until(records, &CancellationToken::new()).await
    }

    /// Like [`Reconciler::reconcile`], but stops once `cancel` fires.
    pub async fn reconcile_until(
        &self,
        records: Vec<RawRecord>,
        cancel: &CancellationToken,
    ) -> Vec<CanonicalSpeech> {
        let total = records.len();
        log::info!(
            "Reconciling {} record(s), {} fetch(es) at a time...",
            total,
            self.concurrency
        );

        let speeches: Vec<CanonicalSpeech> = stream::iter(records)
            .map(|record| self.reconcile_record(record))
            .buffered(self.concurrency)
            .take_until(cancel.cancelled())
            .collect()
            .await;

        if speeches.len() < total {
            log::warn!(
                "Reconciliation cancelled after {} of {} record(s)",
                speeches.len(),
                total
            );
        } else {
            log::info!("Reconciled {} speech(es)", speeches.len());
        }
        speeches
    }
}

#[derive(Debug, Clone)]
pub struct SpeechGatherer {
    client: RecordClient,
    reconciler: Reconciler<FullTextFetcher>,
}

impl SpeechGatherer {
    pub fn new(client: RecordClient, fetcher: FullTextFetcher) -> Self {
        let base_url = fetcher.base_url().clone();
        Self {
            client,
            reconciler: Reconciler::new(fetcher, base_url),
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.reconciler = self.reconciler.with_concurrency(concurrency);
        self
    }

    pub fn client(&self) -> &RecordClient {
        &self.client
    }

    pub async fn gather_hansard(
        &self,
        query: &HansardQuery,
        range: Option<&DateRange>,
        cancel: &CancellationToken,
    ) -> Result<Vec<CanonicalSpeech>, ClientError> {
        let records = self.client.fetch_hansard(query).await?;
        Ok(self.finish(records, range, cancel).await)
    }

    pub async fn gather_debates(
        &self,
        query: &DebatesQuery,
        range: Option<&DateRange>,
        cancel: &CancellationToken,
    ) -> Result<Vec<CanonicalSpeech>, ClientError> {
        let records = self.client.fetch_debates(query).await?;
        Ok(self.finish(records, range, cancel).await)
    }

    async fn finish(
        &self,
        records: Vec<RawRecord>,
        range: Option<&DateRange>,
        cancel: &CancellationToken,
    ) -> Vec<CanonicalSpeech> {
        let records = match range {
            Some(range) => range.apply(records),
            None => records,
        };
        self.reconciler.reconcile_until(records, cancel).await
    }
}
