pub mod event;
pub mod query;
pub mod wire;

pub use event::{Category, EventRecord};
pub use query::EventQuery;
pub use wire::{DecodeError, decode_live_message, decode_record, decode_records, parse_timestamp};

/// Layout of the timestamps emitted by the firewall. The fractional part is
/// optional and may carry any number of digits.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";
