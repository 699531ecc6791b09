use anyhow::{Context, Result};
use mondrian::{ColumnKind, Dataset, Scale};
use std::path::Path;

fn describe(dataset: &Dataset, column: &str, role: &str) -> Result<String> {
    let kind = match dataset.column_kind(column)? {
        ColumnKind::Numeric => "numeric",
        ColumnKind::Categorical => "categorical",
    };
    let span = Scale::from_dataset(dataset, &[column])?.get(column)?;

    Ok(format!("{:<24} {:<18} {:<12} {}", column, role, kind, span))
}

pub fn execute(config_file_path: &Path) -> Result<()> {
    let config = crate::config::load_config(config_file_path)
        .with_context(|| format!("failed to load config {}", config_file_path.display()))?;

    let dataset = Dataset::from_csv_path(&config.dataset)
        .with_context(|| format!("failed to read dataset {}", config.dataset.display()))?;

    println!("{} rows", dataset.num_rows());
    println!("{:<24} {:<18} {:<12} {}", "column", "role", "kind", "span");

    for column in config.quasi_identifiers() {
        println!("{}", describe(&dataset, column, "quasi_identifier")?);
    }

    println!(
        "{}",
        describe(&dataset, config.sensitive_column()?, "sensitive")?
    );

    Ok(())
}
