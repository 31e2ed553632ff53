//! Label centroids for segmentation volumes.
//!
//! Loads a labeled 3D image (NIfTI or FreeSurfer MGH), computes the rounded
//! mean voxel index of each requested label in a single pass, and writes one
//! `<name> <x> <y> <z>` line per label. By default the labels are the left and
//! right hippocampus of a FreeSurfer `aseg` segmentation.

pub mod centroid;
pub mod common;
pub mod error;
pub mod logging;
pub mod mgh;
pub mod output;
pub mod volume;

use std::path::Path;
use tracing::info;

pub use crate::centroid::compute_centroids;
pub use crate::common::{Centroid, Label};
pub use crate::error::{CentroidError, Result};
pub use crate::volume::LabelVolume;

/// Load `input` and compute the centroid of every label in `labels`.
pub fn extract_centroids<P: AsRef<Path>>(
    input: P,
    labels: &[Label],
) -> Result<(LabelVolume, Vec<(Label, Centroid)>)> {
    let volume = LabelVolume::load(input)?;
    let centroids = compute_centroids(volume.labels.view(), labels)?;
    for (label, centroid) in &centroids {
        match volume.to_world(centroid) {
            Some([x, y, z]) => info!("{}: {} (world {:.2} {:.2} {:.2})", label, centroid, x, y, z),
            None => info!("{}: {}", label, centroid),
        }
    }
    Ok((volume, centroids))
}
