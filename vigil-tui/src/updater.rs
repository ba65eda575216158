use log::debug;
use vigil_common::EventRecord;

use crate::{
    aggregator::{Aggregator, SeriesChangeSet},
    chart::ChartVariant,
    viewport::Viewport,
};

/// Folds batches of live events into an existing series and keeps the value
/// axis in step. The returned change set is empty when nothing moved, which
/// is how the chart knows to keep its drawn lines.
#[derive(Debug, Clone, Copy)]
pub struct IncrementalUpdater {
    variant: ChartVariant,
}

impl IncrementalUpdater {
    pub fn new(variant: ChartVariant) -> Self {
        Self { variant }
    }

    pub fn tick(
        &self,
        aggregator: &mut Aggregator,
        viewport: &mut Viewport,
        buffer: Vec<EventRecord>,
    ) -> SeriesChangeSet {
        if buffer.is_empty() {
            return SeriesChangeSet::default();
        }

        let batch = buffer.len();
        let changes = aggregator.merge(buffer);

        let max_value = self.variant.max_value(aggregator);
        if viewport.is_initialized() {
            if viewport.grow_value_range(max_value) {
                debug!("value axis widened for max {max_value}");
            }
        } else if let Ok(domain) = aggregator.domain() {
            viewport.reset_to_domain(domain, max_value);
        }

        debug!(
            "ingested {batch} events: {} new buckets, {} updated",
            changes.created.len(),
            changes.updated.len()
        );

        changes
    }
}
