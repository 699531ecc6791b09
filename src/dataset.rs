use crate::error::{PartitionError, Result};
use arrow::{
    array::{Array, ArrayRef, Float64Array, StringArray, UInt32Array},
    compute::{cast, concat_batches, take},
    csv::{reader::Format, ReaderBuilder},
    datatypes::{DataType, Schema},
    error::ArrowError,
    record_batch::RecordBatch,
};
use std::{fs::File, io::Seek, path::Path, sync::Arc};

const INFER_SCHEMA_RECORDS: usize = 1000;

/// Positional index of a row in a [`Dataset`].
pub type RowId = u32;

/// A group of rows, identified by their positions in the dataset.
pub type Partition = Vec<RowId>;

/// How a column takes part in span computation and splitting.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColumnKind {
    Numeric,
    Categorical,
}

impl ColumnKind {
    pub fn of(column: &str, data_type: &DataType) -> Result<Self> {
        match data_type {
            DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
            | DataType::Date32
            | DataType::Date64
            | DataType::Timestamp(_, _) => Ok(ColumnKind::Numeric),
            DataType::Utf8 | DataType::LargeUtf8 | DataType::Boolean => {
                Ok(ColumnKind::Categorical)
            }
            DataType::Dictionary(_, value_type)
                if matches!(value_type.as_ref(), DataType::Utf8 | DataType::LargeUtf8) =>
            {
                Ok(ColumnKind::Categorical)
            }
            _ => Err(PartitionError::UnsupportedType {
                column: column.to_string(),
                data_type: data_type.clone(),
            }),
        }
    }
}

/// The values of one column restricted to a partition, normalized for comparison.
pub(crate) enum ColumnSection {
    Numeric(Float64Array),
    Categorical(StringArray),
}

fn downcast_failed(column: &str) -> PartitionError {
    ArrowError::CastError(format!("could not normalize column {}", column)).into()
}

/// Immutable tabular data the partitioner reads from.
///
/// Rows are addressed by their position, so a dataset holds at most
/// `u32::MAX` rows.
#[derive(Clone, Debug)]
pub struct Dataset {
    batch: RecordBatch,
}

impl Dataset {
    pub fn new(batch: RecordBatch) -> Self {
        Self { batch }
    }

    pub fn from_csv_path(path: &Path) -> Result<Self> {
        let mut file = File::open(path)?;

        let (schema, _) = Format::default()
            .with_header(true)
            .infer_schema(&mut file, Some(INFER_SCHEMA_RECORDS))?;
        file.rewind()?;

        let schema = Arc::new(schema);
        let reader = ReaderBuilder::new(schema.clone())
            .with_header(true)
            .build(file)?;

        let batches = reader.collect::<std::result::Result<Vec<RecordBatch>, ArrowError>>()?;

        Ok(Self::new(concat_batches(&schema, &batches)?))
    }

    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    pub fn row_ids(&self) -> Partition {
        (0..self.num_rows()).map(|i| i as RowId).collect()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.batch
            .schema()
            .fields()
            .iter()
            .map(|field| field.name().to_string())
            .collect()
    }

    pub fn column(&self, name: &str) -> Result<&ArrayRef> {
        self.batch
            .column_by_name(name)
            .ok_or_else(|| PartitionError::MissingColumn(name.to_string()))
    }

    pub fn column_kind(&self, name: &str) -> Result<ColumnKind> {
        ColumnKind::of(name, self.column(name)?.data_type())
    }

    /// Fails with the first of `names` that is absent or has an unsupported type.
    pub fn require_columns<S: AsRef<str>>(&self, names: &[S]) -> Result<()> {
        for name in names {
            self.column_kind(name.as_ref())?;
        }

        Ok(())
    }

    /// Selects the rows of `partition` (in partition order) and the named columns.
    pub fn take<S: AsRef<str>>(&self, partition: &[RowId], columns: &[S]) -> Result<RecordBatch> {
        let indices = UInt32Array::from(partition.to_vec());
        let schema = self.batch.schema();

        let mut fields = vec![];
        let mut arrays = vec![];
        for name in columns {
            let name = name.as_ref();
            let (index, field) = schema
                .column_with_name(name)
                .ok_or_else(|| PartitionError::MissingColumn(name.to_string()))?;

            fields.push(field.clone());
            arrays.push(take(self.batch.column(index).as_ref(), &indices, None)?);
        }

        Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)?)
    }

    pub(crate) fn section(&self, partition: &[RowId], column: &str) -> Result<ColumnSection> {
        let kind = self.column_kind(column)?;
        let indices = UInt32Array::from(partition.to_vec());
        let values = take(self.column(column)?.as_ref(), &indices, None)?;

        match kind {
            ColumnKind::Numeric => {
                let values = match values.data_type() {
                    DataType::Date32 | DataType::Date64 | DataType::Timestamp(_, _) => {
                        cast(cast(values.as_ref(), &DataType::Int64)?.as_ref(), &DataType::Float64)?
                    }
                    _ => cast(values.as_ref(), &DataType::Float64)?,
                };

                values
                    .as_any()
                    .downcast_ref::<Float64Array>()
                    .cloned()
                    .map(ColumnSection::Numeric)
                    .ok_or_else(|| downcast_failed(column))
            }
            ColumnKind::Categorical => cast(values.as_ref(), &DataType::Utf8)?
                .as_any()
                .downcast_ref::<StringArray>()
                .cloned()
                .map(ColumnSection::Categorical)
                .ok_or_else(|| downcast_failed(column)),
        }
    }
}
