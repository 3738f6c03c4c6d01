use super::error::EngineError;
use crate::core::models::alignment::RotationGeometry;
use nalgebra::Matrix4;

/// The two groups of repeat-unit indices whose superposition produced an axis.
pub type UnitPairing = (Vec<usize>, Vec<usize>);

/// Registry of the symmetry axes discovered for one structure.
///
/// Besides the axis transforms it keeps a table with one row per repeat unit and one column per
/// axis, holding how many times that axis must be applied to bring the unit into the reference
/// frame. Rows always have exactly one entry per registered axis.
///
/// A registry belongs to the single task refining its structure and is not meant to be shared.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SymmetryAxes {
    axes: Vec<Matrix4<f64>>,
    counts: Vec<Vec<u32>>,
    pairings: Vec<UnitPairing>,
}

impl SymmetryAxes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new axis and returns its index.
    ///
    /// `pairing` must hold exactly two groups of equal length; otherwise the registry is left
    /// untouched and [`EngineError::InvalidPairing`] is returned. `counts[unit]` is the number of
    /// applications for each unit; units not listed get 0.
    pub fn add_axis(
        &mut self,
        transform: Matrix4<f64>,
        pairing: Vec<Vec<usize>>,
        counts: &[u32],
    ) -> Result<usize, EngineError> {
        let pairing = validate_pairing(pairing)?;

        let axis_count = self.axes.len();
        for row in &mut self.counts {
            row.push(0);
        }
        while self.counts.len() < counts.len() {
            self.counts.push(vec![0; axis_count + 1]);
        }
        for (row, &count) in self.counts.iter_mut().zip(counts) {
            row[axis_count] = count;
        }

        self.axes.push(transform);
        self.pairings.push(pairing);
        Ok(axis_count)
    }

    /// Replaces the transform of an existing axis, keeping its index and application counts.
    pub fn update_axis(&mut self, index: usize, transform: Matrix4<f64>) -> Result<(), EngineError> {
        let axis = self
            .axes
            .get_mut(index)
            .ok_or(EngineError::AxisNotFound { index })?;
        *axis = transform;
        Ok(())
    }

    /// Cumulative transform mapping `unit` into the reference frame.
    ///
    /// Each axis is raised to the unit's application count and the results are multiplied in
    /// reverse registration order, so for axes `A` then `B` the result is `B^b · A^a`.
    pub fn subunit_transform(&self, unit: usize) -> Matrix4<f64> {
        let mut result = Matrix4::identity();
        for (index, axis) in self.axes.iter().enumerate().rev() {
            let count = self.count(unit, index);
            if count > 0 {
                result *= power(axis, count);
            }
        }
        result
    }

    /// Each axis raised to the number of times it applies to `unit`, in registration order.
    pub fn repeat_transforms(&self, unit: usize) -> Vec<Matrix4<f64>> {
        self.axes
            .iter()
            .enumerate()
            .map(|(index, axis)| power(axis, self.count(unit, index)))
            .collect()
    }

    pub fn axis_geometry(&self, index: usize) -> Result<Option<RotationGeometry>, EngineError> {
        let axis = self.axis(index).ok_or(EngineError::AxisNotFound { index })?;
        Ok(RotationGeometry::from_transform(axis))
    }

    pub fn axis(&self, index: usize) -> Option<&Matrix4<f64>> {
        self.axes.get(index)
    }

    pub fn pairing(&self, index: usize) -> Option<&UnitPairing> {
        self.pairings.get(index)
    }

    /// Application counts of `unit`, one per axis; `None` for units never listed.
    pub fn unit_counts(&self, unit: usize) -> Option<&[u32]> {
        self.counts.get(unit).map(Vec::as_slice)
    }

    pub fn count(&self, unit: usize, axis: usize) -> u32 {
        self.counts
            .get(unit)
            .and_then(|row| row.get(axis))
            .copied()
            .unwrap_or(0)
    }

    pub fn axis_count(&self) -> usize {
        self.axes.len()
    }

    pub fn unit_count(&self) -> usize {
        self.counts.len()
    }
}

/// Application counts for an axis that splits `units` consecutive repeats into cycles of
/// length `division`: unit `u` needs `u mod division` applications.
pub fn counts_from_division(units: usize, division: usize) -> Vec<u32> {
    if division == 0 {
        return vec![0; units];
    }
    (0..units).map(|u| (u % division) as u32).collect()
}

fn validate_pairing(pairing: Vec<Vec<usize>>) -> Result<UnitPairing, EngineError> {
    let [first, second]: [Vec<usize>; 2] =
        pairing
            .try_into()
            .map_err(|groups: Vec<Vec<usize>>| EngineError::InvalidPairing {
                reason: format!("expected two unit groups, got {}", groups.len()),
            })?;
    if first.len() != second.len() {
        return Err(EngineError::InvalidPairing {
            reason: format!(
                "unit groups differ in length ({} vs {})",
                first.len(),
                second.len()
            ),
        });
    }
    Ok((first, second))
}

fn power(transform: &Matrix4<f64>, count: u32) -> Matrix4<f64> {
    (0..count).fold(Matrix4::identity(), |acc, _| acc * transform)
}
