use anyhow::Result;
use arrow::{
    array::{Float64Array, Int32Array, StringArray},
    datatypes::{DataType, Field, Schema},
    record_batch::RecordBatch,
};
use mondrian::{
    partition_dataset, AnonymizationCriteria, Dataset, KAnonymity, LDiversity, Partition,
    PartitionError, PartitionValidator, Partitioner, RowId, Scale,
};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::{collections::HashSet, sync::Arc};

const FEATURES: [&str; 3] = ["age", "zip", "income"];

fn random_dataset(seed: u64, rows: usize) -> Dataset {
    let mut rng = StdRng::seed_from_u64(seed);

    let ages: Vec<i32> = (0..rows).map(|_| rng.gen_range(18..90)).collect();
    let zips: Vec<String> = (0..rows)
        .map(|_| format!("476{:02}", rng.gen_range(0..12)))
        .collect();
    let incomes: Vec<Option<f64>> = (0..rows)
        .map(|_| {
            if rng.gen_bool(0.1) {
                None
            } else {
                Some(rng.gen_range(10_000.0..150_000.0))
            }
        })
        .collect();
    let diseases: Vec<&str> = (0..rows)
        .map(|_| ["flu", "cold", "cancer", "gastritis"][rng.gen_range(0..4)])
        .collect();

    let schema = Schema::new(vec![
        Field::new("age", DataType::Int32, false),
        Field::new("zip", DataType::Utf8, false),
        Field::new("income", DataType::Float64, true),
        Field::new("disease", DataType::Utf8, false),
    ]);

    let batch = RecordBatch::try_new(
        Arc::new(schema),
        vec![
            Arc::new(Int32Array::from(ages)),
            Arc::new(StringArray::from(zips)),
            Arc::new(Float64Array::from(incomes)),
            Arc::new(StringArray::from(diseases)),
        ],
    )
    .unwrap();

    Dataset::new(batch)
}

fn ages_dataset(ages: Vec<i32>) -> Dataset {
    let diseases: Vec<&str> = (0..ages.len()).map(|i| ["flu", "cold"][i % 2]).collect();
    let schema = Schema::new(vec![
        Field::new("age", DataType::Int32, false),
        Field::new("disease", DataType::Utf8, false),
    ]);

    let batch = RecordBatch::try_new(
        Arc::new(schema),
        vec![
            Arc::new(Int32Array::from(ages)),
            Arc::new(StringArray::from(diseases)),
        ],
    )
    .unwrap();

    Dataset::new(batch)
}

fn assert_exact_cover(dataset: &Dataset, partitions: &[Partition]) {
    let mut seen = HashSet::new();
    for partition in partitions {
        for row in partition {
            assert!(seen.insert(*row), "row {} is in two partitions", row);
        }
    }

    let expected: HashSet<RowId> = dataset.row_ids().into_iter().collect();
    assert_eq!(seen, expected);
}

#[test]
fn six_patients_by_age() -> Result<()> {
    let dataset = ages_dataset(vec![20, 25, 30, 22, 28, 35]);
    let scale = Scale::from_map(vec![("age", 15.0)])?;
    let validator = KAnonymity::new(2)?;

    let partitions = partition_dataset(&dataset, &["age"], "disease", &scale, &validator)?;

    assert_eq!(partitions, vec![vec![0, 1, 3], vec![2, 4, 5]]);
    Ok(())
}

#[test]
fn partitions_cover_dataset_exactly_once() -> Result<()> {
    for seed in 0..8 {
        let dataset = random_dataset(seed, 200);
        let scale = Scale::from_dataset(&dataset, &FEATURES)?;
        let validator = KAnonymity::new(5)?;

        let partitions = partition_dataset(&dataset, &FEATURES, "disease", &scale, &validator)?;

        assert!(partitions.len() > 1);
        assert_exact_cover(&dataset, &partitions);
    }

    Ok(())
}

#[test]
fn partitions_reach_minimum_size() -> Result<()> {
    for (seed, k) in [(1, 2), (2, 3), (3, 7), (4, 20)] {
        let dataset = random_dataset(seed, 150);
        let scale = Scale::from_dataset(&dataset, &FEATURES)?;
        let validator = KAnonymity::new(k)?;

        let partitions = partition_dataset(&dataset, &FEATURES, "disease", &scale, &validator)?;

        assert!(partitions.iter().all(|partition| partition.len() >= k));
    }

    Ok(())
}

#[test]
fn partitions_are_l_diverse() -> Result<()> {
    let dataset = random_dataset(11, 300);
    let scale = Scale::from_dataset(&dataset, &FEATURES)?;
    let criteria = vec![
        AnonymizationCriteria::KAnonymous { k: 4 },
        AnonymizationCriteria::LDiverse { l: 2 },
    ];

    let partitions =
        partition_dataset(&dataset, &FEATURES, "disease", &scale, criteria.as_slice())?;

    assert_exact_cover(&dataset, &partitions);
    let l_diversity = LDiversity::new(2)?;
    for partition in &partitions {
        assert!(partition.len() >= 4);
        assert!(l_diversity.is_valid(&dataset, partition, "disease")?);
    }

    Ok(())
}

#[test]
fn partitioning_is_deterministic() -> Result<()> {
    let dataset = random_dataset(42, 250);
    let scale = Scale::from_dataset(&dataset, &FEATURES)?;
    let validator = KAnonymity::new(4)?;

    let first = partition_dataset(&dataset, &FEATURES, "disease", &scale, &validator)?;
    let second = partition_dataset(&dataset, &FEATURES, "disease", &scale, &validator)?;

    assert_eq!(first, second);
    Ok(())
}

#[test]
fn parallel_run_matches_sequential_run() -> Result<()> {
    for seed in [3, 5, 8] {
        let dataset = random_dataset(seed, 400);
        let scale = Scale::from_dataset(&dataset, &FEATURES)?;
        let validator = KAnonymity::new(3)?;

        let partitioner = Partitioner::new(&dataset, &FEATURES, "disease", &scale, &validator);

        assert_eq!(partitioner.run()?, partitioner.run_parallel()?);
    }

    Ok(())
}

#[test]
fn finished_partitions_are_fixed_points() -> Result<()> {
    let dataset = random_dataset(7, 120);
    let scale = Scale::from_dataset(&dataset, &FEATURES)?;
    let validator = KAnonymity::new(3)?;

    let partitions = partition_dataset(&dataset, &FEATURES, "disease", &scale, &validator)?;

    for partition in partitions {
        let group = Dataset::new(dataset.take(&partition, &["age", "zip", "income", "disease"])?);

        let regrouped = partition_dataset(&group, &FEATURES, "disease", &scale, &validator)?;

        assert_eq!(regrouped, vec![group.row_ids()]);
    }

    Ok(())
}

#[test]
fn under_threshold_dataset_in_both_modes() -> Result<()> {
    let dataset = ages_dataset(vec![20, 25]);
    let scale = Scale::from_dataset(&dataset, &["age"])?;
    let validator = KAnonymity::new(3)?;
    let columns = ["age"];

    let lenient = Partitioner::new(&dataset, &columns, "disease", &scale, &validator).run()?;
    assert_eq!(lenient, vec![vec![0, 1]]);

    let strict = Partitioner::new(&dataset, &columns, "disease", &scale, &validator)
        .strict(true)
        .run();
    assert!(matches!(
        strict,
        Err(PartitionError::UnderThreshold {
            rows: 2,
            required: 3
        })
    ));

    Ok(())
}

#[test]
fn strict_mode_accepts_valid_dataset() -> Result<()> {
    let dataset = ages_dataset(vec![20, 25, 30, 22, 28, 35]);
    let scale = Scale::from_dataset(&dataset, &["age"])?;
    let validator = KAnonymity::new(2)?;
    let columns = ["age"];

    let partitions = Partitioner::new(&dataset, &columns, "disease", &scale, &validator)
        .strict(true)
        .run()?;

    assert_eq!(partitions, vec![vec![0, 1, 3], vec![2, 4, 5]]);
    Ok(())
}

#[test]
fn missing_columns_are_schema_errors() -> Result<()> {
    let dataset = random_dataset(0, 20);
    let scale = Scale::from_map(vec![("age", 1.0), ("height", 1.0)])?;
    let validator = KAnonymity::new(2)?;

    let error = partition_dataset(&dataset, &["age", "height"], "disease", &scale, &validator)
        .unwrap_err();
    assert!(error.is_schema());

    let error = partition_dataset(&dataset, &["age"], "diagnosis", &scale, &validator)
        .unwrap_err();
    assert!(error.is_schema());

    Ok(())
}

#[test]
fn parallel_run_reports_errors_like_sequential_run() -> Result<()> {
    let dataset = random_dataset(9, 60);
    let scale = Scale::from_map(vec![("age", 1.0), ("height", 1.0)])?;
    let validator = KAnonymity::new(3)?;
    let columns = ["age", "height"];

    let partitioner = Partitioner::new(&dataset, &columns, "disease", &scale, &validator);

    let error = partitioner.run_parallel().unwrap_err();
    assert!(matches!(error, PartitionError::MissingColumn(ref column) if column == "height"));
    assert!(matches!(
        partitioner.run().unwrap_err(),
        PartitionError::MissingColumn(column) if column == "height"
    ));

    let error = Partitioner::new(&dataset, &["age"], "diagnosis", &scale, &validator)
        .run_parallel()
        .unwrap_err();
    assert!(error.is_schema());

    Ok(())
}

#[test]
fn zero_k_is_a_configuration_error() -> Result<()> {
    let dataset = ages_dataset(vec![30, 30, 30, 30]);
    let scale = Scale::from_dataset(&dataset, &["age"])?;
    let criteria = [AnonymizationCriteria::KAnonymous { k: 0 }];

    let error = partition_dataset(&dataset, &["age"], "disease", &scale, &criteria[..])
        .unwrap_err();
    assert!(error.is_configuration());

    let error = Partitioner::new(&dataset, &["age"], "disease", &scale, &criteria[..])
        .run_parallel()
        .unwrap_err();
    assert!(matches!(error, PartitionError::InvalidK(0)));

    Ok(())
}
