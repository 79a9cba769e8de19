//! Stats module - aggregation of the filtered table

mod aggregate;

pub use aggregate::{AggregateError, Aggregator, MetricKind, VALUE};
