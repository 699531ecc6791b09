mod dataset;
mod error;
mod partitioner;
pub mod span;
pub mod split;
pub mod validator;

pub use crate::dataset::{ColumnKind, Dataset, Partition, RowId};
pub use crate::error::{PartitionError, Result};
pub use crate::partitioner::{partition_dataset, Partitioner};
pub use crate::span::{get_spans, Scale, Spans};
pub use crate::split::split;
pub use crate::validator::{
    AnonymizationCriteria, KAnonymity, LDiversity, PartitionValidator,
};
