use chrono::NaiveDate;

use crate::types::{CanonicalSpeech, RawRecord};

#[derive(Debug, thiserror::Error)]
#[error("Start date ({start}) cannot be after end date ({end})")]
pub struct FilterError {
    start: NaiveDate,
    end: NaiveDate,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnparsableDatePolicy {
    /// Compare it as the earliest representable date. It only survives a
    /// range that starts at `NaiveDate::MIN`.
    #[default]
    TreatAsEarliest,
    Include,
    Exclude,
}

pub trait Dated {
    fn record_date(&self) -> Option<NaiveDate>;
}

impl Dated for RawRecord {
    fn record_date(&self) -> Option<NaiveDate> {
        self.parsed_date()
    }
}

impl Dated for CanonicalSpeech {
    fn record_date(&self) -> Option<NaiveDate> {
        self.date
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
    on_unparsable: UnparsableDatePolicy,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, FilterError> {
        if start > end {
            return Err(FilterError { start, end });
        }
        Ok(Self {
            start,
            end,
            on_unparsable: UnparsableDatePolicy::default(),
        })
    }

    pub fn with_policy(mut self, policy: UnparsableDatePolicy) -> Self {
        self.on_unparsable = policy;
        self
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains(&self, date: Option<NaiveDate>) -> bool {
        let date = match (date, self.on_unparsable) {
            (Some(date), _) => date,
            (None, UnparsableDatePolicy::TreatAsEarliest) => NaiveDate::MIN,
            (None, UnparsableDatePolicy::Include) => return true,
            (None, UnparsableDatePolicy::Exclude) => return false,
        };
        self.start <= date && date <= self.end
    }

    pub fn apply<T: Dated>(&self, records: Vec<T>) -> Vec<T> {
        let before = records.len();
        let kept: Vec<T> = records
            .into_iter()
            .filter(|record| {
                let date = record.record_date();
                if date.is_none() {
                    log::warn!(
                        "Record date could not be parsed, applying {:?}",
                        self.on_unparsable
                    );
                }
                self.contains(date)
            })
            .collect();
        log::debug!(
            "Date filter {}..={} kept {} of {} record(s)",
            self.start,
            self.end,
            kept.len(),
            before
        );
        kept
    }
}

pub fn filter_by_date_range<T: Dated>(
    records: Vec<T>,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<T>, FilterError> {
    Ok(DateRange::new(start, end)?.apply(records))
}
