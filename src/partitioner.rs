use crate::{
    dataset::{Dataset, Partition},
    error::{PartitionError, Result},
    span::{get_spans, Scale},
    split::split,
    validator::PartitionValidator,
};
use rayon::prelude::*;
use std::collections::VecDeque;
use tracing::{debug, info, trace};

enum Outcome {
    Split(Partition, Partition),
    Finished(Partition),
}

/// Greedy Mondrian partitioning of a dataset into groups the validator accepts.
///
/// Pending partitions are processed first in, first out. Each one is split
/// along the first column, by descending span, whose two halves are both
/// valid; a partition without such a column is finished as is. The returned
/// partitions cover every row of the dataset exactly once, in the order they
/// were finished.
///
/// By default the whole dataset is never validated on its own, so a dataset
/// the validator would reject, or an empty list of feature columns, yields a
/// single finished partition. [`Partitioner::strict`] turns both cases into
/// errors.
pub struct Partitioner<'a, V: ?Sized> {
    dataset: &'a Dataset,
    feature_columns: Vec<&'a str>,
    sensitive_column: &'a str,
    scale: &'a Scale,
    validator: &'a V,
    strict: bool,
}

impl<'a, V> Partitioner<'a, V>
where
    V: PartitionValidator + ?Sized,
{
    pub fn new<S: AsRef<str>>(
        dataset: &'a Dataset,
        feature_columns: &'a [S],
        sensitive_column: &'a str,
        scale: &'a Scale,
        validator: &'a V,
    ) -> Self {
        Self {
            dataset,
            feature_columns: feature_columns.iter().map(AsRef::as_ref).collect(),
            sensitive_column,
            scale,
            validator,
            strict: false,
        }
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    fn initial_partitions(&self) -> Result<Vec<Partition>> {
        self.validator.check_parameters()?;
        self.dataset.column(self.sensitive_column)?;

        if self.dataset.num_rows() == 0 {
            return Ok(vec![]);
        }

        let everything = self.dataset.row_ids();

        if self.strict {
            if self.feature_columns.is_empty() {
                return Err(PartitionError::NoFeatureColumns);
            }

            if !self
                .validator
                .is_valid(self.dataset, &everything, self.sensitive_column)?
            {
                let rows = everything.len();
                let required = self.validator.min_partition_size();

                return Err(if rows < required {
                    PartitionError::UnderThreshold { rows, required }
                } else {
                    PartitionError::DatasetRejected { rows }
                });
            }
        }

        Ok(vec![everything])
    }

    fn process(&self, partition: Partition) -> Result<Outcome> {
        let spans = get_spans(self.dataset, &partition, &self.feature_columns, self.scale)?;

        let mut split_accepted = false;
        let mut children = (vec![], vec![]);

        for column in spans.candidates() {
            let (lp, rp) = split(self.dataset, &partition, column)?;

            // A split with an empty side makes no progress.
            if lp.is_empty()
                || rp.is_empty()
                || !self.validator.is_valid(self.dataset, &lp, self.sensitive_column)?
                || !self.validator.is_valid(self.dataset, &rp, self.sensitive_column)?
            {
                trace!(column, left = lp.len(), right = rp.len(), "split rejected");
                continue;
            }

            debug!(column, left = lp.len(), right = rp.len(), "split accepted");
            children = (lp, rp);
            split_accepted = true;
            break;
        }

        if split_accepted {
            Ok(Outcome::Split(children.0, children.1))
        } else {
            debug!(rows = partition.len(), "partition finished");
            Ok(Outcome::Finished(partition))
        }
    }

    pub fn run(&self) -> Result<Vec<Partition>> {
        let mut partitions: VecDeque<Partition> = self.initial_partitions()?.into();
        let mut finished_partitions = vec![];

        while let Some(partition) = partitions.pop_front() {
            match self.process(partition)? {
                Outcome::Split(lp, rp) => {
                    partitions.push_back(lp);
                    partitions.push_back(rp);
                }
                Outcome::Finished(partition) => finished_partitions.push(partition),
            }
        }

        log_summary(&finished_partitions);
        Ok(finished_partitions)
    }

    /// Same result as [`Partitioner::run`], processing each generation of
    /// pending partitions on the rayon thread pool.
    ///
    /// First in, first out processing handles partitions generation by
    /// generation, so merging the outcomes of a generation in their pending
    /// order reproduces the sequential output exactly.
    pub fn run_parallel(&self) -> Result<Vec<Partition>>
    where
        V: Sync,
    {
        let mut generation = self.initial_partitions()?;
        let mut finished_partitions = vec![];

        while !generation.is_empty() {
            let outcomes = generation
                .into_par_iter()
                .map(|partition| self.process(partition))
                .collect::<Result<Vec<Outcome>>>()?;

            let mut next_generation = Vec::with_capacity(outcomes.len() * 2);
            for outcome in outcomes {
                match outcome {
                    Outcome::Split(lp, rp) => {
                        next_generation.push(lp);
                        next_generation.push(rp);
                    }
                    Outcome::Finished(partition) => finished_partitions.push(partition),
                }
            }

            generation = next_generation;
        }

        log_summary(&finished_partitions);
        Ok(finished_partitions)
    }
}

fn log_summary(partitions: &[Partition]) {
    info!(
        partitions = partitions.len(),
        smallest = partitions.iter().map(Vec::len).min().unwrap_or(0),
        largest = partitions.iter().map(Vec::len).max().unwrap_or(0),
        "partitioning finished"
    );
}

/// Partitions `dataset` along `feature_columns` until no valid split remains.
pub fn partition_dataset<S, V>(
    dataset: &Dataset,
    feature_columns: &[S],
    sensitive_column: &str,
    scale: &Scale,
    validator: &V,
) -> Result<Vec<Partition>>
where
    S: AsRef<str>,
    V: PartitionValidator + ?Sized,
{
    Partitioner::new(dataset, feature_columns, sensitive_column, scale, validator).run()
}
