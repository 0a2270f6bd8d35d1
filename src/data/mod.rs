//! Data module - loading, normalization and aggregation

pub mod aggregator;
pub mod loader;
pub mod normalizer;
pub mod states;

pub use aggregator::{AggregateError, AggregateOptions, Aggregator, AgencyTally, BreachTally};
pub use loader::{DataLoader, InputFormat, LoadOptions, LoaderError};
pub use normalizer::{
    AgencyOptions, AgencySource, MissingPolicy, NormalizeOptions, NormalizedFrame,
    NormalizerError, StateNormalizer,
};
