use crate::{
    dataset::{ColumnSection, Dataset, RowId},
    error::{PartitionError, Result},
};
use std::collections::{BTreeMap, HashSet};

/// Unnormalized spread of a section: value range for numeric columns,
/// distinct count for categorical ones. Nulls are ignored.
fn raw_span(section: &ColumnSection) -> f64 {
    match section {
        ColumnSection::Numeric(values) => {
            let mut bounds: Option<(f64, f64)> = None;
            for value in values.iter().flatten() {
                bounds = Some(match bounds {
                    None => (value, value),
                    Some((min, max)) => (min.min(value), max.max(value)),
                });
            }

            bounds.map_or(0.0, |(min, max)| max - min)
        }
        ColumnSection::Categorical(values) => {
            values.iter().flatten().collect::<HashSet<&str>>().len() as f64
        }
    }
}

/// Per-column normalization divisors.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Scale {
    divisors: BTreeMap<String, f64>,
}

impl Scale {
    /// Spans of `columns` over the whole dataset. Constant columns get a
    /// divisor of 1.
    pub fn from_dataset<S: AsRef<str>>(dataset: &Dataset, columns: &[S]) -> Result<Self> {
        let all_rows = dataset.row_ids();
        let mut divisors = BTreeMap::new();

        for column in columns {
            let column = column.as_ref();
            let span = raw_span(&dataset.section(&all_rows, column)?);
            divisors.insert(column.to_string(), if span > 0.0 { span } else { 1.0 });
        }

        Ok(Self { divisors })
    }

    pub fn from_map<I, S>(divisors: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let mut scale = Self::default();
        for (column, value) in divisors {
            scale.insert(column, value)?;
        }

        Ok(scale)
    }

    pub fn insert<S: Into<String>>(&mut self, column: S, value: f64) -> Result<()> {
        let column = column.into();
        if !value.is_finite() || value <= 0.0 {
            return Err(PartitionError::InvalidScale { column, value });
        }

        self.divisors.insert(column, value);
        Ok(())
    }

    pub fn get(&self, column: &str) -> Result<f64> {
        self.divisors
            .get(column)
            .copied()
            .ok_or_else(|| PartitionError::MissingScale(column.to_string()))
    }

}

/// Normalized spans of a partition, in the order the columns were requested.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Spans(Vec<(String, f64)>);

impl Spans {
    pub fn get(&self, column: &str) -> Option<f64> {
        self.0
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, span)| *span)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(column, span)| (column.as_str(), *span))
    }

    /// Columns by descending span. The sort is stable, so equal spans keep
    /// their requested order.
    pub fn candidates(&self) -> Vec<&str> {
        let mut ordered: Vec<&(String, f64)> = self.0.iter().collect();
        ordered.sort_by(|(_, a), (_, b)| b.total_cmp(a));
        ordered.into_iter().map(|(column, _)| column.as_str()).collect()
    }
}

pub fn get_spans<S: AsRef<str>>(
    dataset: &Dataset,
    partition: &[RowId],
    columns: &[S],
    scale: &Scale,
) -> Result<Spans> {
    let mut spans = vec![];

    for column in columns {
        let column = column.as_ref();
        let span = raw_span(&dataset.section(partition, column)?);
        let divisor = scale.get(column)?;
        spans.push((column.to_string(), span / divisor));
    }

    Ok(Spans(spans))
}
