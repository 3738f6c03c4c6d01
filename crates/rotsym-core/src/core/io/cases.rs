use super::ModelLoadError;
use crate::core::models::alignment::{ResidueMapping, RotationGeometry, SelfAlignment};
use crate::core::models::case::BenchmarkCase;
use crate::core::models::order::SymmetryLabel;
use nalgebra::{Matrix4, Point3, Vector3};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CaseFile {
    #[serde(default, rename = "case")]
    cases: Vec<CaseRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct CaseRecord {
    id: String,
    group: Option<String>,
    expected_order: Option<u32>,
    expected_symmetry: Option<String>,
    mapping: Vec<[usize; 2]>,
    coords_a: Vec<[f64; 3]>,
    coords_b: Option<Vec<[f64; 3]>>,
    score: Option<f64>,
    geometry: Option<GeometryRecord>,
    transform: Option<[[f64; 4]; 4]>,
    #[serde(default, rename = "alternative")]
    alternatives: Vec<AlternativeRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct GeometryRecord {
    axis: [f64; 3],
    #[serde(default)]
    origin: [f64; 3],
    angle: f64,
    screw: Option<f64>,
    orthogonal: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct AlternativeRecord {
    mapping: Vec<[usize; 2]>,
}

/// Loads a benchmark case set from a TOML file of `[[case]]` tables.
pub fn load_cases(path: &Path) -> Result<Vec<BenchmarkCase>, ModelLoadError> {
    let path_str = path.to_string_lossy().to_string();
    let content = std::fs::read_to_string(path).map_err(|e| ModelLoadError::Io {
        path: path_str.clone(),
        source: e,
    })?;
    parse_cases(&content, &path_str)
}

/// Parses case-set TOML text; `origin` names the source in error messages.
pub fn parse_cases(content: &str, origin: &str) -> Result<Vec<BenchmarkCase>, ModelLoadError> {
    let file: CaseFile = toml::from_str(content).map_err(|e| ModelLoadError::Toml {
        path: origin.to_string(),
        source: e,
    })?;

    let invalid = |reason: String| ModelLoadError::Invalid {
        path: origin.to_string(),
        reason,
    };

    let mut seen = HashSet::new();
    let mut cases = Vec::with_capacity(file.cases.len());
    for record in file.cases {
        if !seen.insert(record.id.clone()) {
            return Err(invalid(format!("duplicate case id '{}'", record.id)));
        }
        cases.push(convert_record(record).map_err(invalid)?);
    }
    Ok(cases)
}

fn convert_record(record: CaseRecord) -> Result<BenchmarkCase, String> {
    let id = record.id;
    let mapping = to_mapping(&record.mapping).map_err(|r| format!("case '{}': {}", id, r))?;

    let coords_a = to_points(&record.coords_a);
    let coords_b = record
        .coords_b
        .as_deref()
        .map(to_points)
        .unwrap_or_else(|| coords_a.clone());
    if coords_a.len() != coords_b.len() {
        return Err(format!(
            "case '{}': coordinate arrays differ in length ({} vs {})",
            id,
            coords_a.len(),
            coords_b.len()
        ));
    }

    let geometry = match (record.geometry, record.transform) {
        (Some(_), Some(_)) => {
            return Err(format!(
                "case '{}': give either a geometry table or a transform, not both",
                id
            ));
        }
        (Some(g), None) => Some(
            RotationGeometry::new(Vector3::from(g.axis), Point3::from(g.origin), g.angle)
                .ok_or_else(|| format!("case '{}': rotation axis has zero length", id))?
                .with_translations(g.screw, g.orthogonal),
        ),
        (None, Some(rows)) => {
            RotationGeometry::from_transform(&Matrix4::from_fn(|r, c| rows[r][c]))
        }
        (None, None) => None,
    };

    let expected_order = match (record.expected_order, record.expected_symmetry) {
        (order, None) => order,
        (order, Some(label)) => {
            let parsed = label
                .parse::<SymmetryLabel>()
                .map_err(|e| format!("case '{}': {}", id, e))?
                .order();
            if order.is_some_and(|o| o != parsed) {
                return Err(format!(
                    "case '{}': expected-order {} contradicts expected-symmetry '{}'",
                    id,
                    order.unwrap_or_default(),
                    label
                ));
            }
            Some(parsed)
        }
    };

    let alternatives = record
        .alternatives
        .iter()
        .map(|alt| to_mapping(&alt.mapping))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|r| format!("case '{}' alternative: {}", id, r))?;

    let mut alignment = SelfAlignment::new(mapping, coords_a, coords_b);
    alignment.score = record.score;
    alignment.geometry = geometry;

    let mut case = BenchmarkCase::new(id, alignment).with_alternatives(alternatives);
    case.group = record.group;
    case.expected_order = expected_order;
    Ok(case)
}

fn to_mapping(pairs: &[[usize; 2]]) -> Result<ResidueMapping, String> {
    let mut mapping = ResidueMapping::new();
    for &[from, to] in pairs {
        if mapping.insert(from, to).is_some() {
            return Err(format!("residue {} is mapped more than once", from));
        }
    }
    Ok(mapping)
}

fn to_points(coords: &[[f64; 3]]) -> Vec<Point3<f64>> {
    coords.iter().map(|&c| Point3::from(c)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const TOLERANCE: f64 = 1e-9;

    fn f64_approx_equal(a: f64, b: f64) -> bool {
        (a - b).abs() < TOLERANCE
    }

    const TWO_CASES: &str = r#"
        [[case]]
        id = "1abc"
        group = "b.69.8"
        expected-order = 4
        mapping = [[0, 1], [1, 2], [2, 3], [3, 0]]
        coords-a = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [-1.0, 0.0, 0.0], [0.0, -1.0, 0.0]]
        score = 0.85

        [case.geometry]
        axis = [0.0, 0.0, 2.0]
        angle = 1.5707963267948966
        screw = 0.1

        [[case.alternative]]
        mapping = [[0, 2], [1, 3], [2, 0], [3, 1]]

        [[case]]
        id = "2xyz"
        expected-symmetry = "C2"
        mapping = [[0, 1], [1, 0]]
        coords-a = [[1.0, 0.0, 0.0], [-1.0, 0.0, 0.0]]
        coords-b = [[-1.0, 0.0, 0.0], [1.0, 0.0, 0.0]]
        transform = [[-1.0, 0.0, 0.0, 0.0], [0.0, -1.0, 0.0, 0.0], [0.0, 0.0, 1.0, 0.0], [0.0, 0.0, 0.0, 1.0]]
    "#;

    #[test]
    fn parse_cases_reads_geometry_table_and_alternatives() {
        let cases = parse_cases(TWO_CASES, "inline").unwrap();
        assert_eq!(cases.len(), 2);

        let first = &cases[0];
        assert_eq!(first.id, "1abc");
        assert_eq!(first.group.as_deref(), Some("b.69.8"));
        assert_eq!(first.expected_order, Some(4));
        assert_eq!(first.alignment.mapping.get(&3), Some(&0));
        assert_eq!(first.alignment.coords_b, first.alignment.coords_a);
        assert_eq!(first.alignment.score, Some(0.85));
        assert_eq!(first.alternatives.len(), 1);

        let geometry = first.alignment.geometry.as_ref().unwrap();
        assert!(f64_approx_equal(geometry.axis.z, 1.0));
        assert_eq!(geometry.screw_translation, Some(0.1));
        assert_eq!(geometry.orthogonal_translation, None);
    }

    #[test]
    fn parse_cases_derives_geometry_from_transform_and_label() {
        let cases = parse_cases(TWO_CASES, "inline").unwrap();
        let second = &cases[1];

        assert_eq!(second.expected_order, Some(2));
        let geometry = second.alignment.geometry.as_ref().unwrap();
        assert!(f64_approx_equal(geometry.angle, std::f64::consts::PI));
    }

    #[test]
    fn parse_cases_rejects_duplicate_residue_keys() {
        let content = r#"
            [[case]]
            id = "dup"
            mapping = [[0, 1], [0, 2]]
            coords-a = [[0.0, 0.0, 0.0]]
        "#;
        assert!(matches!(
            parse_cases(content, "inline"),
            Err(ModelLoadError::Invalid { .. })
        ));
    }

    #[test]
    fn parse_cases_rejects_duplicate_ids_and_conflicting_expectations() {
        let duplicate = r#"
            [[case]]
            id = "a"
            mapping = []
            coords-a = []
            [[case]]
            id = "a"
            mapping = []
            coords-a = []
        "#;
        assert!(matches!(
            parse_cases(duplicate, "inline"),
            Err(ModelLoadError::Invalid { .. })
        ));

        let conflicting = r#"
            [[case]]
            id = "a"
            expected-order = 3
            expected-symmetry = "C4"
            mapping = []
            coords-a = []
        "#;
        assert!(matches!(
            parse_cases(conflicting, "inline"),
            Err(ModelLoadError::Invalid { .. })
        ));
    }

    #[test]
    fn parse_cases_rejects_unknown_keys() {
        let content = r#"
            [[case]]
            id = "a"
            mapping = []
            coords-a = []
            colour = "red"
        "#;
        assert!(matches!(
            parse_cases(content, "inline"),
            Err(ModelLoadError::Toml { .. })
        ));
    }

    #[test]
    fn load_cases_fails_for_missing_file() {
        let dir = tempdir().unwrap();
        let result = load_cases(&dir.path().join("absent.toml"));
        assert!(matches!(result, Err(ModelLoadError::Io { .. })));
    }

    #[test]
    fn load_cases_reads_file_from_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cases.toml");
        fs::write(&path, TWO_CASES).unwrap();

        let cases = load_cases(&path).unwrap();
        assert_eq!(cases[1].id, "2xyz");
    }
}
