use std::fmt;
use std::str::FromStr;

use crate::error::CentroidError;

/// FreeSurfer aseg value for the left hippocampus.
pub const LEFT_HIPPOCAMPUS: u16 = 17;
/// FreeSurfer aseg value for the right hippocampus.
pub const RIGHT_HIPPOCAMPUS: u16 = 53;

// voxel axes, in array index order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    pub fn to_usize(&self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::X => write!(f, "x"),
            Axis::Y => write!(f, "y"),
            Axis::Z => write!(f, "z"),
        }
    }
}

/// A named label value in a segmentation volume.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    pub name: String,
    pub value: u16,
}

impl Label {
    pub fn new(name: impl Into<String>, value: u16) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }

    /// The two hippocampus labels in output order: left, then right.
    pub fn hippocampi() -> Vec<Label> {
        vec![
            Label::new("LeftHippocampus", LEFT_HIPPOCAMPUS),
            Label::new("RightHippocampus", RIGHT_HIPPOCAMPUS),
        ]
    }
}

/// Parses `NAME=VALUE`, e.g. `LeftAmygdala=18`.
impl FromStr for Label {
    type Err = CentroidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CentroidError::InvalidLabelSpec(s.to_string());
        let (name, value) = s.split_once('=').ok_or_else(invalid)?;
        let name = name.trim();
        // names end up as the first token of an output line
        if name.is_empty() || name.contains(char::is_whitespace) {
            return Err(invalid());
        }
        let value = value.trim().parse::<u16>().map_err(|_| invalid())?;
        Ok(Label::new(name, value))
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.value)
    }
}

/// Rounded mean voxel index of a label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Centroid(pub [i64; 3]);

impl Centroid {
    pub fn get(&self, axis: Axis) -> i64 {
        self.0[axis.to_usize()]
    }
}

impl fmt::Display for Centroid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.0[0], self.0[1], self.0[2])
    }
}
