use nifti::error::NiftiError;
use thiserror::Error;

/// Everything that can stop a centroid run.
#[derive(Debug, Error)]
pub enum CentroidError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Nifti(#[from] NiftiError),

    #[error("Input volume must be 3D, got {ndim} dimensions. Tip: You can use a utility like `fslsplit` to split a 4D file into 3D files.")]
    NotThreeDimensional { ndim: usize },

    #[error("Voxel value {value} at {index:?} is not a valid label")]
    InvalidLabelValue { value: f64, index: [usize; 3] },

    #[error("Invalid MGH file: {0}")]
    InvalidMghFormat(String),

    #[error("Unsupported MGH data type {0}")]
    UnsupportedMghType(i32),

    #[error("MGH file ended after {read} of {expected} voxels")]
    TruncatedMghData { read: usize, expected: usize },

    #[error("No voxels matched label {name} ({value})")]
    EmptyLabel { name: String, value: u16 },

    #[error("Invalid label '{0}', expected NAME=VALUE with VALUE in 0..=65535")]
    InvalidLabelSpec(String),

    #[error("Label value {0} requested more than once")]
    DuplicateLabel(u16),
}

pub type Result<T> = std::result::Result<T, CentroidError>;
