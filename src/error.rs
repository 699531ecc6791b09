use arrow::datatypes::DataType;
use thiserror::Error;

pub type Result<T, E = PartitionError> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum PartitionError {
    #[error("k must be at least 1, got {0}")]
    InvalidK(usize),

    #[error("l must be at least 1, got {0}")]
    InvalidL(usize),

    #[error("no feature columns to split on")]
    NoFeatureColumns,

    #[error("scale for column {column} must be a positive finite number, got {value}")]
    InvalidScale { column: String, value: f64 },

    #[error("no scale for column {0}")]
    MissingScale(String),

    #[error("dataset has {rows} rows, but groups need at least {required}")]
    UnderThreshold { rows: usize, required: usize },

    #[error("validator rejects the whole dataset of {rows} rows")]
    DatasetRejected { rows: usize },

    #[error("column not found: {0}")]
    MissingColumn(String),

    #[error("unsupported type for column {column}: {data_type:?}")]
    UnsupportedType { column: String, data_type: DataType },

    #[error(transparent)]
    Arrow(#[from] arrow::error::ArrowError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PartitionError {
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::InvalidK(_)
                | Self::InvalidL(_)
                | Self::NoFeatureColumns
                | Self::InvalidScale { .. }
                | Self::MissingScale(_)
                | Self::UnderThreshold { .. }
                | Self::DatasetRejected { .. }
        )
    }

    pub fn is_schema(&self) -> bool {
        matches!(self, Self::MissingColumn(_) | Self::UnsupportedType { .. })
    }
}
