use std::collections::{BTreeMap, BTreeSet, btree_map::Entry};

use strum::{EnumCount, IntoEnumIterator};
use thiserror::Error;
use vigil_common::{Category, EventRecord};

use crate::bucket::{BucketKey, BucketWidth, TimeRange, bucket_of};

#[derive(Debug, Error, PartialEq)]
pub enum AggregateError {
    #[error("no data")]
    EmptyDomain,
}

/// Per-bucket event counts, one counter per category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BucketCounters {
    counts: [u64; Category::COUNT],
}

impl BucketCounters {
    pub fn get(&self, category: Category) -> u64 {
        self.counts[category.index()]
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    fn increment(&mut self, category: Category) {
        self.counts[category.index()] += 1;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeriesPoint {
    pub key: BucketKey,
    pub counters: BucketCounters,
}

/// Keys touched by one merge. A key appears once, in `created` if it did not
/// exist before the merge and in `updated` otherwise.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeriesChangeSet {
    pub created: Vec<BucketKey>,
    pub updated: Vec<BucketKey>,
}

impl SeriesChangeSet {
    pub fn is_empty(&self) -> bool {
        self.created.is_empty() && self.updated.is_empty()
    }

    pub fn len(&self) -> usize {
        self.created.len() + self.updated.len()
    }
}

#[derive(Debug, Clone)]
pub struct Aggregator {
    width: BucketWidth,
    buckets: BTreeMap<BucketKey, BucketCounters>,
    events: u64,
}

impl Aggregator {
    pub fn new(width: BucketWidth) -> Self {
        Self {
            width,
            buckets: BTreeMap::new(),
            events: 0,
        }
    }

    pub fn width(&self) -> BucketWidth {
        self.width
    }

    /// Rebuilds the series from scratch, discarding any previous state.
    pub fn load(&mut self, events: impl IntoIterator<Item = EventRecord>) -> Vec<SeriesPoint> {
        self.buckets.clear();
        self.events = 0;
        for event in events {
            self.record(event);
        }
        self.series()
    }

    /// Folds `events` into the existing buckets. Counters only ever grow.
    /// Feeding the same event twice counts it twice.
    pub fn merge(&mut self, events: impl IntoIterator<Item = EventRecord>) -> SeriesChangeSet {
        let mut created = BTreeSet::new();
        let mut updated = BTreeSet::new();

        for event in events {
            let (key, is_new) = self.record(event);
            if is_new {
                created.insert(key);
            } else if !created.contains(&key) {
                updated.insert(key);
            }
        }

        SeriesChangeSet {
            created: created.into_iter().collect(),
            updated: updated.into_iter().collect(),
        }
    }

    /// Counts one event. Returns its bucket and whether the bucket is new.
    fn record(&mut self, event: EventRecord) -> (BucketKey, bool) {
        let key = bucket_of(event.timestamp, self.width);
        self.events += 1;
        match self.buckets.entry(key) {
            Entry::Occupied(mut bucket) => {
                bucket.get_mut().increment(event.category);
                (key, false)
            }
            Entry::Vacant(slot) => {
                slot.insert(BucketCounters::default())
                    .increment(event.category);
                (key, true)
            }
        }
    }

    pub fn domain(&self) -> Result<TimeRange, AggregateError> {
        let (first, _) = self
            .buckets
            .first_key_value()
            .ok_or(AggregateError::EmptyDomain)?;
        let (last, _) = self
            .buckets
            .last_key_value()
            .ok_or(AggregateError::EmptyDomain)?;
        Ok(TimeRange::new(first.start(), last.end(self.width)))
    }

    /// Largest single-category count across all buckets.
    pub fn max_value(&self, categories: &[Category]) -> u64 {
        self.buckets
            .values()
            .flat_map(|counters| categories.iter().map(|c| counters.get(*c)))
            .max()
            .unwrap_or(0)
    }

    /// Largest per-bucket total across all buckets.
    pub fn max_total(&self) -> u64 {
        self.buckets
            .values()
            .map(BucketCounters::total)
            .max()
            .unwrap_or(0)
    }

    pub fn series(&self) -> Vec<SeriesPoint> {
        self.buckets
            .iter()
            .map(|(key, counters)| SeriesPoint {
                key: *key,
                counters: *counters,
            })
            .collect()
    }

    /// The series split into runs of consecutive buckets. A missing bucket
    /// between two points starts a new run.
    pub fn segments(&self) -> Vec<Vec<SeriesPoint>> {
        let width = self.width;
        self.series()
            .chunk_by(|a, b| a.key.is_followed_by(&b.key, width))
            .map(<[SeriesPoint]>::to_vec)
            .collect()
    }

    pub fn get(&self, key: &BucketKey) -> Option<&BucketCounters> {
        self.buckets.get(key)
    }

    /// Bucket at or immediately before `key`.
    pub fn floor_key(&self, key: &BucketKey) -> Option<BucketKey> {
        self.buckets.range(..=*key).next_back().map(|(k, _)| *k)
    }

    /// Bucket strictly after `key`.
    pub fn next_key(&self, key: &BucketKey) -> Option<BucketKey> {
        use std::ops::Bound::{Excluded, Unbounded};
        self.buckets
            .range((Excluded(*key), Unbounded))
            .next()
            .map(|(k, _)| *k)
    }

    /// Bucket strictly before `key`.
    pub fn prev_key(&self, key: &BucketKey) -> Option<BucketKey> {
        self.buckets.range(..*key).next_back().map(|(k, _)| *k)
    }

    pub fn first_key(&self) -> Option<BucketKey> {
        self.buckets.first_key_value().map(|(k, _)| *k)
    }

    pub fn last_key(&self) -> Option<BucketKey> {
        self.buckets.last_key_value().map(|(k, _)| *k)
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Number of events folded in since the last `load`.
    pub fn event_count(&self) -> u64 {
        self.events
    }

    /// Per-category totals across the whole series.
    pub fn totals(&self) -> Vec<(Category, u64)> {
        Category::iter()
            .map(|c| (c, self.buckets.values().map(|b| b.get(c)).sum()))
            .collect()
    }
}
