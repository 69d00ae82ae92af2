use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::{
    error::{DiceError, Result},
    history::record::{RecordView, RollRecord, StrippedRecord},
};

/// Which window of a store to report, and whether to keep timestamps.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportOptions {
    /// Number of most recent records; all of them when unset.
    pub limit: Option<usize>,
    pub verbose: bool,
}

impl ReportOptions {
    pub fn verbose() -> Self {
        Self {
            limit: None,
            verbose: true,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// A bounded, insertion-ordered log of roll records.
///
/// Adding past capacity evicts the single oldest record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordStore {
    capacity: usize,
    records: VecDeque<RollRecord>,
}

impl RecordStore {
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity < 1 {
            return Err(DiceError::invalid_argument("record store capacity must be at least 1"));
        }
        Ok(Self {
            capacity,
            records: VecDeque::with_capacity(capacity),
        })
    }

    pub fn add(&mut self, record: RollRecord) -> Result<()> {
        record.validate()?;
        self.records.push_back(record);
        if self.records.len() > self.capacity
            && let Some(evicted) = self.records.pop_front()
        {
            log::trace!("record store full, evicted {:?}", evicted.strip());
        }
        Ok(())
    }

    /// Adds a record arriving as untyped JSON.
    pub fn add_json(&mut self, value: serde_json::Value) -> Result<()> {
        let record = RollRecord::from_json(value)?;
        self.add(record)
    }

    /// The most recent `min(n, len)` records, oldest first.
    pub fn last(&self, n: usize) -> Result<Vec<RollRecord>> {
        if n < 1 {
            return Err(DiceError::invalid_argument("must ask for at least one record"));
        }
        let skip = self.records.len().saturating_sub(n);
        Ok(self.records.iter().skip(skip).copied().collect())
    }

    pub fn full(&self) -> Vec<RollRecord> {
        self.records.iter().copied().collect()
    }

    pub fn all(&self) -> Vec<StrippedRecord> {
        self.records.iter().map(RollRecord::strip).collect()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn report(&self, options: ReportOptions) -> Result<Vec<RecordView>> {
        let window = match options.limit {
            Some(limit) => self.last(limit)?,
            None => self.full(),
        };
        let views = window
            .into_iter()
            .map(|record| {
                if options.verbose {
                    RecordView::Full(record)
                } else {
                    RecordView::Stripped(record.strip())
                }
            })
            .collect();
        Ok(views)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RollRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
