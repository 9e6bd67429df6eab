#![warn(clippy::all)]

use std::path::PathBuf;

use anyhow::{anyhow, Result};
use chronocloud_io::{
    events::{event_footprints, load_collection, write_footprints},
    raster::read_raster_metadata,
};
use clap::{App, Arg};
use log::info;

struct Args {
    pub input_file: PathBuf,
    pub raster_file: PathBuf,
    pub output_file: PathBuf,
}

fn get_args() -> Result<Args> {
    let matches = App::new("chronocloud project_events")
        .version("0.1")
        .about("Maps the hulls of change events into the pixel grid of a projected raster")
        .arg(
            Arg::with_name("INPUT")
                .short("i")
                .takes_value(true)
                .value_name("INPUT")
                .help("Change event file")
                .required(true),
        )
        .arg(
            Arg::with_name("RASTER")
                .short("r")
                .long("raster")
                .takes_value(true)
                .value_name("RASTER")
                .help("Projected raster (PNG with its JSON sidecar)")
                .required(true),
        )
        .arg(
            Arg::with_name("OUTPUT")
                .short("o")
                .takes_value(true)
                .value_name("OUTPUT")
                .help("Output footprint file (JSON). Defaults to <raster>_events.json next to the raster"),
        )
        .get_matches();

    let input_file = matches
        .value_of("INPUT")
        .map(PathBuf::from)
        .ok_or_else(|| anyhow!("No change event file given"))?;
    let raster_file = matches
        .value_of("RASTER")
        .map(PathBuf::from)
        .ok_or_else(|| anyhow!("No raster given"))?;
    let output_file = match matches.value_of("OUTPUT") {
        Some(output) => PathBuf::from(output),
        None => {
            let stem = raster_file
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .ok_or_else(|| anyhow!("Invalid raster path {}", raster_file.display()))?;
            raster_file.with_file_name(format!("{}_events.json", stem))
        }
    };

    Ok(Args {
        input_file,
        raster_file,
        output_file,
    })
}

fn main() -> Result<()> {
    pretty_env_logger::init();

    let args = get_args()?;
    let collection = load_collection(&args.input_file)?;
    let metadata = read_raster_metadata(&args.raster_file)?;
    info!(
        "Projecting {} change events into a {} x {} raster",
        collection.len(),
        metadata.v_img_res,
        metadata.h_img_res
    );

    let footprints = event_footprints(&collection, &metadata);
    write_footprints(&args.output_file, &footprints)?;

    let inside = footprints
        .iter()
        .filter(|footprint| {
            footprint.pixels.iter().any(|[row, col]| {
                *row >= 0
                    && *col >= 0
                    && (*row as usize) < metadata.h_img_res
                    && (*col as usize) < metadata.v_img_res
            })
        })
        .count();
    println!(
        "Wrote {} footprints to {}, {} of them overlap the raster",
        footprints.len(),
        args.output_file.display(),
        inside
    );
    Ok(())
}
