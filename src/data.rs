use std::{fs::File, io::Read, path::Path};

use csv::ReaderBuilder;
use log::{error, info, warn};
use machine_learning::dataset::Dataset;

use crate::{
    classifier::{INPUT_DIM, NUM_CLASSES},
    error::DataErr,
};

/// Columns per row: the id, every feature and the label.
pub const ROW_LEN: usize = 1 + INPUT_DIM + 1;

/// Loads the training CSV at `path`.
///
/// # Errors
/// Returns a `DataErr` if the file can't be read or any row is malformed, in which case nothing
/// of the file is kept.
pub fn load<P: AsRef<Path>>(path: P) -> Result<Dataset, DataErr> {
    let file = File::open(path)?;
    from_reader(file)
}

/// Parses a CSV with a header row where column 0 is an ignored id, the next `INPUT_DIM`
/// columns are the features and the last one is the class label.
pub fn from_reader<R: Read>(reader: R) -> Result<Dataset, DataErr> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut features = Vec::new();
    let mut labels = Vec::new();

    for (row, record) in rdr.records().enumerate() {
        let record = record?;

        if record.len() != ROW_LEN {
            return Err(DataErr::ShapeMismatch {
                row,
                got: record.len(),
                expected: ROW_LEN,
            });
        }

        for (column, value) in record.iter().enumerate().skip(1).take(INPUT_DIM) {
            let x = value.parse::<f32>().map_err(|_| DataErr::InvalidValue {
                row,
                column,
                value: value.to_string(),
            })?;
            features.push(x);
        }

        labels.push(parse_label(row, &record[ROW_LEN - 1])?);
    }

    if labels.is_empty() {
        return Err(DataErr::Empty);
    }

    Ok(Dataset::new(features, labels, INPUT_DIM)?)
}

/// Accepts integral labels in `[0, NUM_CLASSES)`, also when written as floats (`3.0`).
fn parse_label(row: usize, value: &str) -> Result<usize, DataErr> {
    let invalid = || DataErr::InvalidLabel {
        row,
        value: value.to_string(),
    };

    let label = value.parse::<f64>().map_err(|_| invalid())?;

    if label.fract() != 0. || !(0. ..NUM_CLASSES as f64).contains(&label) {
        return Err(invalid());
    }

    Ok(label as usize)
}

/// Loads the dataset if a path was configured, downgrading any failure to an absent dataset so
/// the service stays up.
pub fn load_or_absent(path: Option<&Path>) -> Option<Dataset> {
    let Some(path) = path else {
        warn!("no dataset path configured, training is unavailable");
        return None;
    };

    info!("loading data from {}", path.display());

    match load(path) {
        Ok(dataset) => {
            info!(rows = dataset.len(); "data loaded successfully");
            Some(dataset)
        }
        Err(e) => {
            error!("error loading data from {}: {e}", path.display());
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn header() -> String {
        let features = (0..INPUT_DIM).map(|i| format!("f{i}"));
        std::iter::once("id".to_string())
            .chain(features)
            .chain(std::iter::once("label".to_string()))
            .collect::<Vec<_>>()
            .join(",")
    }

    fn row(id: usize, value: f32, label: &str) -> String {
        let features = (0..INPUT_DIM).map(|_| value.to_string());
        std::iter::once(id.to_string())
            .chain(features)
            .chain(std::iter::once(label.to_string()))
            .collect::<Vec<_>>()
            .join(",")
    }

    fn csv(rows: &[String]) -> String {
        let mut content = header();
        for row in rows {
            content.push('\n');
            content.push_str(row);
        }
        content
    }

    #[test]
    fn parses_rows() {
        let content = csv(&[row(7, 0.5, "4"), row(8, -1.25, "0"), row(9, 2., "3.0")]);

        let dataset = from_reader(content.as_bytes()).unwrap();
        assert_eq!(dataset.len(), 3);
        assert_eq!(dataset.x_size(), INPUT_DIM);
        assert_eq!(dataset.labels(), [4, 0, 3]);
        assert_eq!(dataset.features()[[1, 0]], -1.25);
        assert_eq!(dataset.features()[[2, INPUT_DIM - 1]], 2.);
        assert!(dataset.labels().iter().all(|&l| l < NUM_CLASSES));
    }

    #[test]
    fn rejects_short_rows() {
        let mut short = row(1, 0., "1");
        short.truncate(short.rfind(',').unwrap());
        let content = csv(&[row(0, 0., "1"), short]);

        let err = from_reader(content.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            DataErr::ShapeMismatch { row: 1, got, expected: ROW_LEN } if got == ROW_LEN - 1
        ));
    }

    #[test]
    fn rejects_labels_out_of_range() {
        for label in ["5", "-1", "1.5", "cat"] {
            let content = csv(&[row(0, 0., label)]);
            let err = from_reader(content.as_bytes()).unwrap_err();
            assert!(matches!(err, DataErr::InvalidLabel { row: 0, .. }), "{label}");
        }
    }

    #[test]
    fn rejects_non_numeric_features() {
        let content = csv(&[row(0, 0., "1").replacen(",0,", ",x,", 1)]);

        let err = from_reader(content.as_bytes()).unwrap_err();
        assert!(matches!(err, DataErr::InvalidValue { row: 0, column: 1, .. }));
    }

    #[test]
    fn rejects_empty_file() {
        let err = from_reader(header().as_bytes()).unwrap_err();
        assert!(matches!(err, DataErr::Empty));
    }

    #[test]
    fn missing_file_is_absent() {
        let path = std::env::temp_dir().join("mystery_solver_missing.csv");
        assert!(matches!(load(&path), Err(DataErr::Io(_))));
        assert!(load_or_absent(Some(path.as_path())).is_none());
        assert!(load_or_absent(None).is_none());
    }

    #[test]
    fn loads_from_disk() {
        let path = std::env::temp_dir().join(format!("mystery_solver_{}.csv", std::process::id()));
        let mut file = File::create(&path).unwrap();
        file.write_all(csv(&[row(0, 1., "2"), row(1, 0., "1")]).as_bytes())
            .unwrap();
        drop(file);

        let dataset = load_or_absent(Some(path.as_path())).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.labels(), [2, 1]);
    }
}
