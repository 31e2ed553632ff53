//! Commandline utility to compute label centroids in a segmentation volume.
//!
//! Reads a labeled volume (NIfTI `.nii`/`.nii.gz` or FreeSurfer `.mgh`/`.mgz`),
//! computes the rounded mean voxel index of each label and writes one line per
//! label to the output file:
//!
//! ```text
//! LeftHippocampus 101 140 97
//! RightHippocampus 154 139 96
//! ```

use clap::Parser;
use std::path::Path;
use tracing::{error, info};

use asegcentroid::error::{CentroidError, Result};
use asegcentroid::logging::init_tracing;
use asegcentroid::output::{volume_basename, write_centroids_file, write_label_masks};
use asegcentroid::{extract_centroids, Label};

// use clap to create commandline interface
#[derive(Parser, Debug)]
#[command(author, about, version, long_about)]
struct Args {
    /// the labeled input volume (.nii, .nii.gz, .mgh or .mgz)
    #[arg(short, long, default_value = "aseg.nii.gz")]
    input: String,

    /// the text file to write the centroids to
    #[arg(short, long, default_value = "hippo_centroids.txt")]
    output: String,

    /// a label to locate, as NAME=VALUE. Repeat for several labels; output
    /// follows the order given. Defaults to LeftHippocampus=17 and
    /// RightHippocampus=53.
    #[arg(short, long = "label", value_name = "NAME=VALUE")]
    labels: Vec<String>,

    /// a directory in which to also save a binary NIfTI mask for each label
    #[arg(short, long)]
    mask_dir: Option<String>,
}

fn parse_labels(specs: &[String]) -> Result<Vec<Label>> {
    if specs.is_empty() {
        return Ok(Label::hippocampi());
    }
    specs.iter().map(|s| s.parse()).collect()
}

fn run(cli: Args) -> Result<()> {
    let input_path = Path::new(&cli.input);
    if !input_path.is_file() {
        return Err(CentroidError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("Did not find input file {}. Use -i to pass an existing file.", cli.input),
        )));
    }
    let labels = parse_labels(&cli.labels)?;
    info!("Input: {}", input_path.display());

    let (volume, centroids) = extract_centroids(input_path, &labels)?;
    write_centroids_file(&cli.output, &centroids)?;

    if let Some(mask_dir) = &cli.mask_dir {
        let basename = volume_basename(input_path).unwrap_or_else(|| "volume".to_string());
        write_label_masks(&volume, &labels, Path::new(mask_dir), &basename)?;
    }
    Ok(())
}

// main function parses commandline arguments and runs the program
fn main() {
    init_tracing();
    let cli = Args::parse();
    if let Err(e) = run(cli) {
        error!("Error! {}", e);
        std::process::exit(-2);
    }
}
