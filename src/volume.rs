//! Loading of labeled segmentation volumes.

use nalgebra::{Matrix4, Point4};
use ndarray::{Array3, ArrayD, Ix3};
use nifti::{IntoNdArray, NiftiHeader, NiftiObject, ReaderOptions};
use std::path::Path;
use tracing::{debug, warn};

use crate::common::{Axis, Centroid};
use crate::error::{CentroidError, Result};
use crate::mgh::{is_mgh_file, MghVolume};

/// A 3D volume of integer labels, indexed `[i, j, k]`.
#[derive(Debug, Clone)]
pub struct LabelVolume {
    pub labels: Array3<u16>,
    /// voxel to world (mm) transform, when the file provides one
    pub affine: Option<Matrix4<f64>>,
    /// kept so that derived NIfTI images land in the same space
    pub nifti_header: Option<NiftiHeader>,
}

impl LabelVolume {
    pub fn new(labels: Array3<u16>) -> Self {
        Self {
            labels,
            affine: None,
            nifti_header: None,
        }
    }

    /// Load a label volume. `.mgh`, `.mgz` and `.mgh.gz` files are read as
    /// FreeSurfer MGH, anything else as NIfTI (plain or gzipped).
    pub fn load<P: AsRef<Path>>(path: P) -> Result<LabelVolume> {
        let path = path.as_ref();
        let volume = if is_mgh_file(path) {
            Self::load_mgh(path)?
        } else {
            Self::load_nifti(path)?
        };
        debug!("Dims: {:?}", volume.dims());
        Ok(volume)
    }

    fn load_nifti(path: &Path) -> Result<LabelVolume> {
        let obj = ReaderOptions::new().read_file(path)?;
        let header = obj.header().clone();
        let img = obj.into_volume().into_ndarray::<f64>()?;
        let img = into_3d(img)?;
        Ok(LabelVolume {
            labels: to_labels(&img)?,
            affine: Some(header.affine::<f64>()),
            nifti_header: Some(header),
        })
    }

    fn load_mgh(path: &Path) -> Result<LabelVolume> {
        let mgh = MghVolume::from_file(path)?;
        Ok(LabelVolume {
            labels: to_labels(&mgh.data)?,
            affine: mgh.header.vox2ras(),
            nifti_header: None,
        })
    }

    pub fn dims(&self) -> [usize; 3] {
        let (w, h, d) = self.labels.dim();
        [w, h, d]
    }

    /// Map a voxel-index centroid to world coordinates.
    pub fn to_world(&self, centroid: &Centroid) -> Option<[f64; 3]> {
        let affine = self.affine?;
        let mut pos = Point4::new(0.0, 0.0, 0.0, 1.0);
        for axis in Axis::ALL {
            pos[axis.to_usize()] = centroid.get(axis) as f64;
        }
        let pos = affine * pos;
        Some([pos[0], pos[1], pos[2]])
    }
}

// accept 3D, and 4D images holding a single volume
fn into_3d(img: ArrayD<f64>) -> Result<Array3<f64>> {
    let ndim = img.ndim();
    let img = match ndim {
        3 => img,
        4 if img.shape()[3] == 1 => {
            warn!("4D image with a single volume, using it as 3D");
            img.index_axis_move(ndarray::Axis(3), 0)
        }
        _ => return Err(CentroidError::NotThreeDimensional { ndim }),
    };
    img.into_dimensionality::<Ix3>()
        .map_err(|_| CentroidError::NotThreeDimensional { ndim })
}

/// Convert raw voxel values to labels. Every value must be a whole number in `0..=65535`.
pub fn to_labels(img: &Array3<f64>) -> Result<Array3<u16>> {
    let mut labels = Vec::with_capacity(img.len());
    for ((i, j, k), &value) in img.indexed_iter() {
        if value.fract() != 0.0 || !(0.0..=u16::MAX as f64).contains(&value) {
            return Err(CentroidError::InvalidLabelValue {
                value,
                index: [i, j, k],
            });
        }
        labels.push(value as u16);
    }
    // indexed_iter walks in logical order, which is the standard layout
    Array3::from_shape_vec(img.raw_dim(), labels).map_err(|_| CentroidError::NotThreeDimensional {
        ndim: img.ndim(),
    })
}
