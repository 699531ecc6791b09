use crate::{
    dataset::{ColumnSection, Dataset, Partition, RowId},
    error::Result,
};
use itertools::Itertools;
use std::collections::{BTreeMap, HashSet};

fn median(values: &[f64]) -> Option<f64> {
    let sorted: Vec<f64> = values.iter().copied().sorted_by(|a, b| a.total_cmp(b)).collect();
    let middle = sorted.len() / 2;

    match sorted.len() {
        0 => None,
        n if n % 2 == 0 => Some((sorted[middle - 1] + sorted[middle]) / 2.0),
        _ => Some(sorted[middle]),
    }
}

/// Categories taken, in ascending order, until they hold at least half of
/// the rows. The last category always stays on the right.
fn left_categories<'a>(
    values: impl Iterator<Item = Option<&'a str>>,
    rows: usize,
) -> HashSet<&'a str> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for value in values.flatten() {
        *counts.entry(value).or_insert(0) += 1;
    }

    let mut left = HashSet::new();
    let mut taken = 0;
    for (category, count) in counts.iter().take(counts.len().saturating_sub(1)) {
        if 2 * taken >= rows {
            break;
        }
        left.insert(*category);
        taken += count;
    }

    if left.is_empty() {
        left.extend(counts.keys());
    }

    left
}

/// Splits `partition` in two along `column`.
///
/// Every row ends up in exactly one side and both sides keep the order of
/// `partition`. A side may be empty when the column does not vary.
pub fn split(
    dataset: &Dataset,
    partition: &[RowId],
    column: &str,
) -> Result<(Partition, Partition)> {
    let mut left = vec![];
    let mut right = vec![];

    match dataset.section(partition, column)? {
        ColumnSection::Numeric(values) => {
            let present: Vec<f64> = values.iter().flatten().collect();
            let median = median(&present);

            for (index, value) in partition.iter().zip(values.iter()) {
                match (value, median) {
                    (Some(value), Some(median)) if value <= median => left.push(*index),
                    _ => right.push(*index),
                }
            }
        }
        ColumnSection::Categorical(values) => {
            let lv = left_categories(values.iter(), partition.len());

            for (index, value) in partition.iter().zip(values.iter()) {
                match value {
                    Some(value) if lv.contains(value) => left.push(*index),
                    _ => right.push(*index),
                }
            }
        }
    }

    Ok((left, right))
}
