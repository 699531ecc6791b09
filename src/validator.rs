use crate::{
    dataset::{Dataset, RowId},
    error::{PartitionError, Result},
};
use arrow::{
    array::{Array, StringArray},
    compute::cast,
    datatypes::DataType,
    error::ArrowError,
};
use std::collections::HashSet;

/// Decides whether a group of rows is acceptable as an anonymized group.
pub trait PartitionValidator {
    fn is_valid(
        &self,
        dataset: &Dataset,
        partition: &[RowId],
        sensitive_column: &str,
    ) -> Result<bool>;

    /// Size below which the policy never accepts a group.
    fn min_partition_size(&self) -> usize {
        1
    }

    /// Rejects parameters the policy cannot work with, before any partitioning.
    fn check_parameters(&self) -> Result<()> {
        Ok(())
    }
}

impl<F> PartitionValidator for F
where
    F: Fn(&Dataset, &[RowId], &str) -> Result<bool>,
{
    fn is_valid(
        &self,
        dataset: &Dataset,
        partition: &[RowId],
        sensitive_column: &str,
    ) -> Result<bool> {
        self(dataset, partition, sensitive_column)
    }
}

pub fn is_k_anonymous(partition: &[RowId], k: usize) -> bool {
    partition.len() >= k
}

pub fn is_l_diverse(
    dataset: &Dataset,
    partition: &[RowId],
    sensitive_column: &str,
    l: usize,
) -> Result<bool> {
    let sensitive = dataset.take(partition, &[sensitive_column])?;

    // Compare rendered values so any column type can be sensitive.
    let values = cast(sensitive.column(0).as_ref(), &DataType::Utf8)?;
    let distinct: HashSet<&str> = values
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| {
            ArrowError::CastError(format!("could not render column {}", sensitive_column))
        })?
        .iter()
        .flatten()
        .collect();

    Ok(distinct.len() >= l)
}

/// Every group holds at least `k` rows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KAnonymity {
    k: usize,
}

impl KAnonymity {
    pub fn new(k: usize) -> Result<Self> {
        if k < 1 {
            return Err(PartitionError::InvalidK(k));
        }

        Ok(Self { k })
    }

    pub fn k(&self) -> usize {
        self.k
    }
}

impl PartitionValidator for KAnonymity {
    fn is_valid(
        &self,
        _dataset: &Dataset,
        partition: &[RowId],
        _sensitive_column: &str,
    ) -> Result<bool> {
        Ok(is_k_anonymous(partition, self.k))
    }

    fn min_partition_size(&self) -> usize {
        self.k
    }
}

/// Every group holds at least `l` distinct non-null sensitive values.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LDiversity {
    l: usize,
}

impl LDiversity {
    pub fn new(l: usize) -> Result<Self> {
        if l < 1 {
            return Err(PartitionError::InvalidL(l));
        }

        Ok(Self { l })
    }

    pub fn l(&self) -> usize {
        self.l
    }
}

impl PartitionValidator for LDiversity {
    fn is_valid(
        &self,
        dataset: &Dataset,
        partition: &[RowId],
        sensitive_column: &str,
    ) -> Result<bool> {
        is_l_diverse(dataset, partition, sensitive_column, self.l)
    }

    fn min_partition_size(&self) -> usize {
        self.l
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AnonymizationCriteria {
    KAnonymous { k: usize },
    LDiverse { l: usize },
}

impl AnonymizationCriteria {
    /// Checks the parameters, returning the criterium unchanged when usable.
    pub fn validated(self) -> Result<Self> {
        match self {
            Self::KAnonymous { k } => KAnonymity::new(k).map(|_| self),
            Self::LDiverse { l } => LDiversity::new(l).map(|_| self),
        }
    }
}

impl PartitionValidator for AnonymizationCriteria {
    fn is_valid(
        &self,
        dataset: &Dataset,
        partition: &[RowId],
        sensitive_column: &str,
    ) -> Result<bool> {
        match self {
            Self::KAnonymous { k } => Ok(is_k_anonymous(partition, *k)),
            Self::LDiverse { l } => is_l_diverse(dataset, partition, sensitive_column, *l),
        }
    }

    fn min_partition_size(&self) -> usize {
        match self {
            Self::KAnonymous { k } => *k,
            Self::LDiverse { l } => *l,
        }
    }

    fn check_parameters(&self) -> Result<()> {
        self.clone().validated().map(|_| ())
    }
}

/// All criteria must accept the group.
impl PartitionValidator for [AnonymizationCriteria] {
    fn is_valid(
        &self,
        dataset: &Dataset,
        partition: &[RowId],
        sensitive_column: &str,
    ) -> Result<bool> {
        for criterium in self {
            if !criterium.is_valid(dataset, partition, sensitive_column)? {
                return Ok(false);
            }
        }

        Ok(true)
    }

    fn min_partition_size(&self) -> usize {
        self.iter()
            .map(PartitionValidator::min_partition_size)
            .max()
            .unwrap_or(1)
    }

    fn check_parameters(&self) -> Result<()> {
        self.iter().try_for_each(PartitionValidator::check_parameters)
    }
}
