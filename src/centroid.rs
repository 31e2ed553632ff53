//! Label centroids in voxel-index space.
//!
//! All requested labels are accumulated in a single pass over the volume. Only
//! running coordinate sums and a voxel count are kept per label, and the means
//! are rounded with exact integer arithmetic, so the result does not depend on
//! the order in which voxels are visited.

use ndarray::ArrayView3;
use std::collections::HashMap;
use tracing::debug;

use crate::common::{Axis, Centroid, Label};
use crate::error::{CentroidError, Result};

/// Running sums for one label.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LabelSums {
    pub sum: [u64; 3],
    pub count: u64,
}

impl LabelSums {
    pub fn add(&mut self, index: [usize; 3]) {
        for axis in Axis::ALL {
            let a = axis.to_usize();
            self.sum[a] += index[a] as u64;
        }
        self.count += 1;
    }

    /// Rounded mean position, `None` when no voxel was added.
    pub fn centroid(&self) -> Option<Centroid> {
        if self.count == 0 {
            return None;
        }
        let mut coords = [0i64; 3];
        for axis in Axis::ALL {
            let a = axis.to_usize();
            coords[a] = div_round_half_even(self.sum[a], self.count) as i64;
        }
        Some(Centroid(coords))
    }
}

/// `num / den` rounded to the nearest integer, ties to even.
pub fn div_round_half_even(num: u64, den: u64) -> u64 {
    let q = num / den;
    let r = num % den;
    // compare 2r with den without overflowing
    match r.cmp(&(den - r)) {
        std::cmp::Ordering::Less => q,
        std::cmp::Ordering::Greater => q + 1,
        std::cmp::Ordering::Equal => q + (q & 1),
    }
}

/// Accumulates voxel positions for a fixed set of labels.
#[derive(Debug, Clone)]
pub struct CentroidAccumulator {
    labels: Vec<Label>,
    slots: HashMap<u16, usize>,
    sums: Vec<LabelSums>,
}

impl CentroidAccumulator {
    pub fn new(labels: &[Label]) -> Result<Self> {
        let mut slots = HashMap::with_capacity(labels.len());
        for (slot, label) in labels.iter().enumerate() {
            if slots.insert(label.value, slot).is_some() {
                return Err(CentroidError::DuplicateLabel(label.value));
            }
        }
        Ok(Self {
            labels: labels.to_vec(),
            slots,
            sums: vec![LabelSums::default(); labels.len()],
        })
    }

    /// Record one voxel. Values that are not of interest are ignored.
    pub fn observe(&mut self, value: u16, index: [usize; 3]) {
        if let Some(&slot) = self.slots.get(&value) {
            self.sums[slot].add(index);
        }
    }

    /// Visit every voxel of `volume` once.
    pub fn scan(&mut self, volume: ArrayView3<u16>) {
        for ((i, j, k), &value) in volume.indexed_iter() {
            self.observe(value, [i, j, k]);
        }
    }

    #[cfg(test)]
    fn sums(&self, value: u16) -> Option<&LabelSums> {
        self.slots.get(&value).map(|&slot| &self.sums[slot])
    }

    /// Centroids in label order. Fails on the first label without voxels.
    pub fn finish(self) -> Result<Vec<(Label, Centroid)>> {
        self.labels
            .into_iter()
            .zip(self.sums)
            .map(|(label, sums)| {
                debug!("{}: {} voxels", label, sums.count);
                match sums.centroid() {
                    Some(c) => Ok((label, c)),
                    None => Err(CentroidError::EmptyLabel {
                        name: label.name,
                        value: label.value,
                    }),
                }
            })
            .collect()
    }
}

/// Compute the centroid of each label in one traversal of `volume`.
pub fn compute_centroids(volume: ArrayView3<u16>, labels: &[Label]) -> Result<Vec<(Label, Centroid)>> {
    let mut acc = CentroidAccumulator::new(labels)?;
    acc.scan(volume);
    acc.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{LEFT_HIPPOCAMPUS, RIGHT_HIPPOCAMPUS};
    use ndarray::Array3;

    fn left_only() -> Vec<Label> {
        vec![Label::new("LeftHippocampus", LEFT_HIPPOCAMPUS)]
    }

    #[test]
    fn rounding_ties_go_to_even() {
        assert_eq!(div_round_half_even(1, 2), 0);
        assert_eq!(div_round_half_even(3, 2), 2);
        assert_eq!(div_round_half_even(5, 2), 2);
        assert_eq!(div_round_half_even(7, 2), 4);
        assert_eq!(div_round_half_even(4, 3), 1);
        assert_eq!(div_round_half_even(5, 3), 2);
        assert_eq!(div_round_half_even(0, 7), 0);
        assert_eq!(div_round_half_even(u64::MAX, u64::MAX), 1);
    }

    #[test]
    fn single_voxel_is_its_own_centroid() {
        let mut vol = Array3::<u16>::zeros((10, 12, 9));
        vol[[7, 3, 8]] = LEFT_HIPPOCAMPUS;
        let res = compute_centroids(vol.view(), &left_only()).unwrap();
        assert_eq!(res[0].1, Centroid([7, 3, 8]));
    }

    #[test]
    fn symmetric_cube_gives_center() {
        let mut vol = Array3::<u16>::zeros((20, 20, 20));
        let (cx, cy, cz) = (6usize, 11usize, 14usize);
        for i in cx - 2..=cx + 2 {
            for j in cy - 2..=cy + 2 {
                for k in cz - 2..=cz + 2 {
                    vol[[i, j, k]] = LEFT_HIPPOCAMPUS;
                }
            }
        }
        let res = compute_centroids(vol.view(), &left_only()).unwrap();
        assert_eq!(res[0].1, Centroid([cx as i64, cy as i64, cz as i64]));
    }

    #[test]
    fn four_voxel_scenario_rounds_half_to_even() {
        let mut vol = Array3::<u16>::zeros((4, 4, 4));
        for idx in [[0usize, 0, 0], [0, 0, 1], [0, 1, 0], [0, 1, 1]] {
            vol[idx] = LEFT_HIPPOCAMPUS;
        }
        let res = compute_centroids(vol.view(), &left_only()).unwrap();
        // mean is (0, 0.5, 0.5)
        assert_eq!(res[0].1, Centroid([0, 0, 0]));
    }

    #[test]
    fn missing_label_is_an_error() {
        let mut vol = Array3::<u16>::zeros((4, 4, 4));
        vol[[1, 1, 1]] = LEFT_HIPPOCAMPUS;
        let res = compute_centroids(vol.view(), &Label::hippocampi());
        match res {
            Err(CentroidError::EmptyLabel { name, value }) => {
                assert_eq!(name, "RightHippocampus");
                assert_eq!(value, RIGHT_HIPPOCAMPUS);
            }
            other => panic!("expected EmptyLabel, got {:?}", other),
        }
    }

    #[test]
    fn labels_are_reported_in_requested_order() {
        let mut vol = Array3::<u16>::zeros((5, 5, 5));
        vol[[4, 4, 4]] = RIGHT_HIPPOCAMPUS;
        vol[[0, 1, 2]] = LEFT_HIPPOCAMPUS;
        vol[[3, 3, 3]] = 2;
        let res = compute_centroids(vol.view(), &Label::hippocampi()).unwrap();
        assert_eq!(res.len(), 2);
        assert_eq!(res[0].0.value, LEFT_HIPPOCAMPUS);
        assert_eq!(res[0].1, Centroid([0, 1, 2]));
        assert_eq!(res[1].0.value, RIGHT_HIPPOCAMPUS);
        assert_eq!(res[1].1, Centroid([4, 4, 4]));
    }

    #[test]
    fn traversal_order_does_not_matter() {
        let vol = Array3::from_shape_fn((7, 5, 6), |(i, j, k)| {
            match (i * 31 + j * 17 + k * 7) % 5 {
                0 => LEFT_HIPPOCAMPUS,
                1 => RIGHT_HIPPOCAMPUS,
                _ => 0,
            }
        });
        let labels = Label::hippocampi();
        let forward = compute_centroids(vol.view(), &labels).unwrap();

        let mut voxels: Vec<_> = vol.indexed_iter().collect();
        voxels.reverse();
        // interleave halves for a non-monotonic order
        let (a, b) = voxels.split_at(voxels.len() / 2);
        let shuffled = b.iter().zip(a).flat_map(|(x, y)| [*x, *y]).chain(b.iter().skip(a.len()).copied());
        let mut acc = CentroidAccumulator::new(&labels).unwrap();
        let mut seen = 0;
        for ((i, j, k), &value) in shuffled {
            acc.observe(value, [i, j, k]);
            seen += 1;
        }
        assert_eq!(seen, vol.len());
        assert_eq!(acc.finish().unwrap(), forward);

        // a transposed view visits memory in a different order
        let mut acc = CentroidAccumulator::new(&labels).unwrap();
        let transposed = vol.view().reversed_axes();
        for ((k, j, i), &value) in transposed.indexed_iter() {
            acc.observe(value, [i, j, k]);
        }
        assert_eq!(acc.finish().unwrap(), forward);
    }

    #[test]
    fn sums_and_counts_are_tracked() {
        let mut vol = Array3::<u16>::zeros((3, 3, 3));
        vol[[1, 2, 0]] = 9;
        vol[[2, 0, 2]] = 9;
        let mut acc = CentroidAccumulator::new(&[Label::new("Nine", 9)]).unwrap();
        acc.scan(vol.view());
        let sums = acc.sums(9).unwrap();
        assert_eq!(sums.count, 2);
        assert_eq!(sums.sum, [3, 2, 2]);
        assert!(acc.sums(10).is_none());
    }

    #[test]
    fn duplicate_labels_are_rejected() {
        let labels = [Label::new("A", 4), Label::new("B", 4)];
        assert!(matches!(
            CentroidAccumulator::new(&labels),
            Err(CentroidError::DuplicateLabel(4))
        ));
    }
}
