use anyhow::{Context, Result};
use arrow::{
    array::UInt32Array,
    datatypes::{DataType, Field, Schema},
    record_batch::RecordBatch,
};
use mondrian::{Dataset, Partition, Partitioner, RowId, Scale};
use std::{io::Write, path::Path, sync::Arc};
use tracing::info;

/// CSV with the partition number of every row, ordered by row.
pub fn render_partitions(partitions: &[Partition]) -> Result<Vec<u8>> {
    let mut assignments: Vec<(RowId, u32)> = partitions
        .iter()
        .enumerate()
        .flat_map(|(number, partition)| partition.iter().map(move |row| (*row, number as u32)))
        .collect();
    assignments.sort_unstable();

    let (row_ids, numbers): (Vec<RowId>, Vec<u32>) = assignments.into_iter().unzip();

    let schema = Schema::new(vec![
        Field::new("row_id", DataType::UInt32, false),
        Field::new("partition", DataType::UInt32, false),
    ]);

    let batch = RecordBatch::try_new(
        Arc::new(schema),
        vec![
            Arc::new(UInt32Array::from(row_ids)),
            Arc::new(UInt32Array::from(numbers)),
        ],
    )?;

    let mut output = vec![];
    {
        let mut writer = arrow::csv::Writer::new(&mut output);
        writer.write(&batch)?;
    }

    Ok(output)
}

pub fn execute(config_file_path: &Path) -> Result<()> {
    let config = crate::config::load_config(config_file_path)
        .with_context(|| format!("failed to load config {}", config_file_path.display()))?;

    let quasi_identifiers = config.quasi_identifiers();
    let sensitive_column = config.sensitive_column()?;
    let criteria = config.criteria()?;

    let dataset = Dataset::from_csv_path(&config.dataset)
        .with_context(|| format!("failed to read dataset {}", config.dataset.display()))?;

    info!(
        rows = dataset.num_rows(),
        quasi_identifiers = quasi_identifiers.len(),
        "dataset loaded"
    );

    dataset.require_columns(&quasi_identifiers)?;
    let scale = Scale::from_dataset(&dataset, &quasi_identifiers)?;

    let partitioner = Partitioner::new(
        &dataset,
        &quasi_identifiers,
        sensitive_column,
        &scale,
        criteria.as_slice(),
    )
    .strict(config.strict);

    let partitions = if config.parallel {
        partitioner.run_parallel()?
    } else {
        partitioner.run()?
    };

    let output = render_partitions(&partitions)?;

    match &config.output {
        Some(path) => std::fs::write(path, output)
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => std::io::stdout().write_all(&output)?,
    }

    Ok(())
}
