use super::ModelLoadError;
use nalgebra::DMatrix;
use std::path::Path;

/// Reads a dense matrix stored one row per line with tab-separated values.
///
/// Blank lines and lines starting with `#` are skipped; every row must have the same width.
pub fn read_matrix(path: &Path) -> Result<DMatrix<f64>, ModelLoadError> {
    let path_str = path.to_string_lossy().to_string();
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .comment(Some(b'#'))
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| ModelLoadError::Csv {
            path: path_str.clone(),
            source: e,
        })?;

    let mut rows: Vec<Vec<f64>> = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| ModelLoadError::Csv {
            path: path_str.clone(),
            source: e,
        })?;
        let line = record.position().map_or(0, |p| p.line());

        let row = record
            .iter()
            .filter(|field| !field.is_empty())
            .map(|field| {
                field.parse::<f64>().map_err(|_| ModelLoadError::Number {
                    path: path_str.clone(),
                    line,
                    value: field.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        if row.is_empty() {
            continue;
        }
        if let Some(first) = rows.first() {
            if first.len() != row.len() {
                return Err(ModelLoadError::Invalid {
                    path: path_str,
                    reason: format!(
                        "row on line {} has {} values, expected {}",
                        line,
                        row.len(),
                        first.len()
                    ),
                });
            }
        }
        rows.push(row);
    }

    if rows.is_empty() {
        return Err(ModelLoadError::Invalid {
            path: path_str,
            reason: "matrix file contains no rows".to_string(),
        });
    }

    let cols = rows[0].len();
    Ok(DMatrix::from_row_iterator(
        rows.len(),
        cols,
        rows.into_iter().flatten(),
    ))
}

/// Writes a matrix in the format read by [`read_matrix`].
pub fn write_matrix(path: &Path, matrix: &DMatrix<f64>) -> Result<(), ModelLoadError> {
    let path_str = path.to_string_lossy().to_string();
    let to_load_error = |e: csv::Error| ModelLoadError::Csv {
        path: path_str.clone(),
        source: e,
    };

    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .from_path(path)
        .map_err(to_load_error)?;
    for row in matrix.row_iter() {
        writer
            .write_record(row.iter().map(|v| format!("{:.6}", v)))
            .map_err(to_load_error)?;
    }
    writer.flush().map_err(|e| ModelLoadError::Io {
        path: path_str.clone(),
        source: e,
    })
}
