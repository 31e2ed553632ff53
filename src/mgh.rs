//! Reader for FreeSurfer brain volumes stored in binary 'MGH' files.
//!
//! FreeSurfer writes its segmentations (`aseg.mgz`) in this format. An MGZ file
//! is simply a gzip compressed MGH file.

use byteordered::ByteOrdered;
use flate2::read::GzDecoder;
use nalgebra::{Matrix3, Matrix4, Vector3};
use ndarray::{Array3, ShapeBuilder};
use std::fs::File;
use std::io::{self, BufReader, Cursor, Read};
use std::path::Path;

use crate::error::{CentroidError, Result};

pub const MGH_VERSION: i32 = 1;
/// Byte offset at which voxel data starts.
pub const MGH_DATA_START: u64 = 284;

pub const MRI_UCHAR: i32 = 0;
pub const MRI_INT: i32 = 1;
pub const MRI_FLOAT: i32 = 3;
pub const MRI_SHORT: i32 = 4;

// version, 4 dims, type, dof (7 x i32) + goodRASflag (i16) + 15 x f32
const HEADER_FIELDS_LEN: u64 = 7 * 4 + 2 + 15 * 4;

fn lowercase_file_name(path: &Path) -> Option<String> {
    path.file_name()
        .map(|name| name.to_string_lossy().to_lowercase())
}

/// Check whether the file name ends with ".mgz" or ".gz", ignoring case.
pub fn is_gz_file<P: AsRef<Path>>(path: P) -> bool {
    lowercase_file_name(path.as_ref())
        .map(|name| name.ends_with(".mgz") || name.ends_with(".gz"))
        .unwrap_or(false)
}

/// Check whether the file name looks like an MGH or MGZ file, ignoring case.
pub fn is_mgh_file<P: AsRef<Path>>(path: P) -> bool {
    lowercase_file_name(path.as_ref())
        .map(|name| name.ends_with(".mgh") || name.ends_with(".mgz") || name.ends_with(".mgh.gz"))
        .unwrap_or(false)
}

/// The header of an MGH file.
#[derive(Debug, Clone, PartialEq)]
pub struct MghHeader {
    pub version: i32,
    pub width: i32,
    pub height: i32,
    pub depth: i32,
    pub nframes: i32,
    pub dtype: i32,
    pub dof: i32,
    pub is_ras_good: i16,
    /// voxel size in mm
    pub delta: [f32; 3],
    /// direction cosines, x_r x_a x_s y_r y_a y_s z_r z_a z_s
    pub mdc: [f32; 9],
    pub c_ras: [f32; 3],
}

impl Default for MghHeader {
    fn default() -> Self {
        Self {
            version: MGH_VERSION,
            width: 0,
            height: 0,
            depth: 0,
            nframes: 1,
            dtype: MRI_UCHAR,
            dof: 0,
            is_ras_good: 0,
            delta: [1.0; 3],
            mdc: [-1.0, 0.0, 0.0, 0.0, 0.0, -1.0, 0.0, 1.0, 0.0],
            c_ras: [0.0; 3],
        }
    }
}

impl MghHeader {
    /// Read an MGH header from the given byte stream, which must be positioned
    /// at the start of the file. Consumes exactly the header fields.
    pub fn from_reader<S: Read>(input: &mut S) -> Result<MghHeader> {
        let mut input = ByteOrdered::be(input);
        let mut hdr = MghHeader::default();

        hdr.version = input.read_i32()?;
        if hdr.version != MGH_VERSION {
            return Err(CentroidError::InvalidMghFormat(format!(
                "expected version {}, found {}",
                MGH_VERSION, hdr.version
            )));
        }
        hdr.width = input.read_i32()?;
        hdr.height = input.read_i32()?;
        hdr.depth = input.read_i32()?;
        hdr.nframes = input.read_i32()?;
        hdr.dtype = input.read_i32()?;
        hdr.dof = input.read_i32()?;
        hdr.is_ras_good = input.read_i16()?;

        // the geometry block is always present, but only meaningful when flagged good
        let mut delta = [0f32; 3];
        let mut mdc = [0f32; 9];
        let mut c_ras = [0f32; 3];
        for v in delta.iter_mut().chain(mdc.iter_mut()).chain(c_ras.iter_mut()) {
            *v = input.read_f32()?;
        }
        if hdr.is_ras_good == 1 {
            hdr.delta = delta;
            hdr.mdc = mdc;
            hdr.c_ras = c_ras;
        }

        if hdr.width <= 0 || hdr.height <= 0 || hdr.depth <= 0 || hdr.nframes <= 0 {
            return Err(CentroidError::InvalidMghFormat(format!(
                "bad dimensions {}x{}x{}x{}",
                hdr.width, hdr.height, hdr.depth, hdr.nframes
            )));
        }
        Ok(hdr)
    }

    pub fn dims(&self) -> [usize; 3] {
        [self.width as usize, self.height as usize, self.depth as usize]
    }

    fn bytes_per_voxel(&self) -> Result<usize> {
        match self.dtype {
            MRI_UCHAR => Ok(1),
            MRI_SHORT => Ok(2),
            MRI_INT | MRI_FLOAT => Ok(4),
            other => Err(CentroidError::UnsupportedMghType(other)),
        }
    }

    /// Voxel to RAS (scanner world, mm) transform, if the header carries valid geometry.
    pub fn vox2ras(&self) -> Option<Matrix4<f64>> {
        if self.is_ras_good != 1 {
            return None;
        }
        let mdc = Matrix3::from_iterator(self.mdc.iter().map(|&v| v as f64));
        let delta = Matrix3::from_diagonal(&Vector3::from_iterator(
            self.delta.iter().map(|&v| v as f64),
        ));
        let m = mdc * delta;
        let center = Vector3::from_iterator(self.dims().iter().map(|&d| d as f64 / 2.0));
        let c_ras = Vector3::from_iterator(self.c_ras.iter().map(|&v| v as f64));
        let p0 = c_ras - m * center;

        let mut affine = Matrix4::identity();
        affine.fixed_slice_mut::<3, 3>(0, 0).copy_from(&m);
        affine.fixed_slice_mut::<3, 1>(0, 3).copy_from(&p0);
        Some(affine)
    }
}

/// A single frame MGH volume, values widened to f64.
#[derive(Debug, Clone, PartialEq)]
pub struct MghVolume {
    pub header: MghHeader,
    pub data: Array3<f64>,
}

impl MghVolume {
    /// Read an MGH or MGZ file. Files whose name ends in ".mgz" or ".gz" are gunzipped.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<MghVolume> {
        let gz = is_gz_file(&path);
        let file = BufReader::new(File::open(path)?);
        if gz {
            MghVolume::from_reader(GzDecoder::new(file))
        } else {
            MghVolume::from_reader(file)
        }
    }

    /// Read a whole MGH volume from an uncompressed byte stream.
    pub fn from_reader<S: Read>(mut input: S) -> Result<MghVolume> {
        let header = MghHeader::from_reader(&mut input)?;
        if header.nframes != 1 {
            return Err(CentroidError::NotThreeDimensional { ndim: 4 });
        }
        let bytes_per_voxel = header.bytes_per_voxel()?;

        // unused header space up to the data block
        io::copy(
            &mut (&mut input).take(MGH_DATA_START - HEADER_FIELDS_LEN),
            &mut io::sink(),
        )?;

        let [w, h, d] = header.dims();
        let (n_voxels, expected_len) = w
            .checked_mul(h)
            .and_then(|n| n.checked_mul(d))
            .and_then(|n| Some((n, n.checked_mul(bytes_per_voxel)?)))
            .ok_or_else(|| {
                CentroidError::InvalidMghFormat(format!("volume size {}x{}x{} overflows", w, h, d))
            })?;
        // sized by what is actually read, never by the header
        let mut raw = Vec::new();
        input.take(expected_len as u64).read_to_end(&mut raw)?;
        if raw.len() < expected_len {
            return Err(CentroidError::TruncatedMghData {
                read: raw.len() / bytes_per_voxel,
                expected: n_voxels,
            });
        }

        let mut values = ByteOrdered::be(Cursor::new(raw));
        let mut data = Vec::with_capacity(n_voxels);
        for _ in 0..n_voxels {
            let v = match header.dtype {
                MRI_UCHAR => values.read_u8()? as f64,
                MRI_SHORT => values.read_i16()? as f64,
                MRI_INT => values.read_i32()? as f64,
                _ => values.read_f32()? as f64,
            };
            data.push(v);
        }

        // x varies fastest on disk
        let data = Array3::from_shape_vec((w, h, d).f(), data).map_err(|e| {
            CentroidError::InvalidMghFormat(format!("could not shape voxel data: {}", e))
        })?;
        Ok(MghVolume { header, data })
    }
}
