//! Batch - the unit of delivery to the telemetry backend.

use std::vec::Vec;

use crate::{Observation, SchemaVersion};

/// A group of observations collected over one batch period.
///
/// The transport accumulates observations and ships them as one batch per
/// period, so the backend sees a few large writes instead of many small ones.
///
/// # Example
///
/// ```rust
/// use flowvault_types::{Batch, Observation, Tags, Timestamp};
///
/// let batch = Batch::builder()
///     .observation(Observation::integer(Tags::new(), 1, Timestamp::from_nanos(1)))
///     .observation(Observation::text(Tags::new(), "x", Timestamp::from_nanos(2)))
///     .build();
///
/// assert_eq!(batch.len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Batch {
    /// Schema version for forward compatibility.
    pub version: SchemaVersion,

    /// Observations in the order they were sent.
    pub observations: Vec<Observation>,
}

impl Batch {
    /// Create an empty batch at the current schema version.
    pub fn new() -> Self {
        Self {
            version: SchemaVersion::current(),
            observations: Vec::new(),
        }
    }

    /// Create a builder for constructing batches.
    pub fn builder() -> BatchBuilder {
        BatchBuilder::new()
    }

    /// Append an observation.
    pub fn push(&mut self, observation: Observation) {
        self.observations.push(observation);
    }

    /// Check if the batch holds no observations.
    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Number of observations in the batch.
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    /// Iterate over the observations.
    pub fn iter(&self) -> impl Iterator<Item = &Observation> {
        self.observations.iter()
    }

    /// Move the observations out into a new batch, leaving this one empty.
    pub fn take(&mut self) -> Batch {
        Batch {
            version: self.version,
            observations: std::mem::take(&mut self.observations),
        }
    }
}

impl Default for Batch {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for constructing `Batch` instances.
#[derive(Debug, Default)]
pub struct BatchBuilder {
    observations: Vec<Observation>,
}

impl BatchBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an observation.
    pub fn observation(mut self, observation: Observation) -> Self {
        self.observations.push(observation);
        self
    }

    /// Build the batch.
    pub fn build(self) -> Batch {
        Batch {
            version: SchemaVersion::current(),
            observations: self.observations,
        }
    }
}
