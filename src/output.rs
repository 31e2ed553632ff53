//! Writing results: the centroid text file and optional label masks.

use ndarray::Array3;
use nifti::writer::WriterOptions;
use nifti::NiftiHeader;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::common::{Centroid, Label};
use crate::error::Result;
use crate::volume::LabelVolume;

const VOLUME_EXTENSIONS: [&str; 5] = [".nii.gz", ".mgh.gz", ".nii", ".mgz", ".mgh"];

/// Write one `<name> <x> <y> <z>` line per label, in the given order.
pub fn write_centroids<W: Write>(out: &mut W, centroids: &[(Label, Centroid)]) -> Result<()> {
    for (label, centroid) in centroids {
        writeln!(out, "{} {}", label.name, centroid)?;
    }
    Ok(())
}

/// Write the centroid file. The file is only created once everything is formatted.
pub fn write_centroids_file<P: AsRef<Path>>(path: P, centroids: &[(Label, Centroid)]) -> Result<()> {
    let mut buf = Vec::new();
    write_centroids(&mut buf, centroids)?;
    fs::write(path.as_ref(), buf)?;
    info!("Output: {}", path.as_ref().display());
    Ok(())
}

/// File name of a volume without its directory and image extension(s).
pub fn volume_basename(path: &Path) -> Option<String> {
    let name = path.file_name()?.to_str()?;
    let stem = VOLUME_EXTENSIONS
        .iter()
        .find_map(|ext| {
            let cut = name.len().checked_sub(ext.len())?;
            name.get(cut..)
                .filter(|tail| tail.eq_ignore_ascii_case(ext))
                .map(|_| &name[..cut])
        })
        .unwrap_or(name);
    if stem.is_empty() {
        None
    } else {
        Some(stem.to_string())
    }
}

/// Binary mask of one label: 1 where the voxel matches, 0 elsewhere.
pub fn label_mask(volume: &LabelVolume, label: &Label) -> Array3<u8> {
    volume.labels.mapv(|v| u8::from(v == label.value))
}

/// Header that places derived images in the volume's space: the input header
/// for NIfTI, or a fresh header carrying the vox2ras transform otherwise.
pub fn reference_header(volume: &LabelVolume) -> Option<NiftiHeader> {
    if let Some(header) = &volume.nifti_header {
        return Some(header.clone());
    }
    let affine = volume.affine?;
    let mut header = NiftiHeader::default();
    header.set_affine(&affine);
    // aligned to scanner anatomy
    header.sform_code = 2;
    Some(header)
}

/// Save a `uint8` NIfTI mask per label as `<dir>/<basename>_<label>_mask.nii`.
///
/// The masks share the input's geometry whenever the input provides one.
pub fn write_label_masks(
    volume: &LabelVolume,
    labels: &[Label],
    save_dir: &Path,
    basename: &str,
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(save_dir)?;
    let reference = reference_header(volume);
    let mut written = Vec::with_capacity(labels.len());
    for label in labels {
        let output_path = save_dir.join(format!("{basename}_{}_mask.nii", label.name));
        let mask = label_mask(volume, label);
        let mut options = WriterOptions::new(&output_path);
        if let Some(header) = &reference {
            options = options.reference_header(header);
        }
        options.write_nifti(&mask)?;
        info!("Mask: {}", output_path.display());
        written.push(output_path);
    }
    Ok(written)
}
