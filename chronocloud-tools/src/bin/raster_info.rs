#![warn(clippy::all)]

use std::{any::Any, path::PathBuf};

use anyhow::{anyhow, Result};
use chronocloud_core::meta::{ImageKind, Metadata};
use chronocloud_io::raster::{read_raster, read_raster_metadata};
use clap::{App, Arg};

struct Args {
    pub input_file: PathBuf,
    pub field: Option<String>,
    pub tags: bool,
}

fn get_args() -> Result<Args> {
    let matches = App::new("chronocloud raster_info")
        .version("0.1")
        .about("Prints the projection metadata of a raster written by project_series")
        .arg(
            Arg::with_name("INPUT")
                .short("i")
                .takes_value(true)
                .value_name("INPUT")
                .help("Projected raster (PNG with its JSON sidecar)")
                .required(true),
        )
        .arg(
            Arg::with_name("FIELD")
                .short("f")
                .long("field")
                .takes_value(true)
                .value_name("FIELD")
                .help("Print only the value of this metadata field, e.g. res or h_img_res"),
        )
        .arg(
            Arg::with_name("TAGS")
                .short("t")
                .long("tags")
                .help("Print the raw tags of the sidecar and check the raster size against them"),
        )
        .get_matches();

    let input_file = matches
        .value_of("INPUT")
        .map(PathBuf::from)
        .ok_or_else(|| anyhow!("No raster given"))?;

    Ok(Args {
        input_file,
        field: matches.value_of("FIELD").map(str::to_owned),
        tags: matches.is_present("TAGS"),
    })
}

fn format_field(value: &dyn Any) -> Option<String> {
    if let Some(value) = value.downcast_ref::<f64>() {
        Some(value.to_string())
    } else if let Some(value) = value.downcast_ref::<usize>() {
        Some(value.to_string())
    } else if let Some(value) = value.downcast_ref::<bool>() {
        Some(value.to_string())
    } else if let Some(value) = value.downcast_ref::<String>() {
        Some(value.clone())
    } else {
        value
            .downcast_ref::<ImageKind>()
            .map(|value| value.to_string())
    }
}

fn main() -> Result<()> {
    pretty_env_logger::init();

    let args = get_args()?;
    if let Some(field) = &args.field {
        let metadata = read_raster_metadata(&args.input_file)?;
        let value = metadata
            .get_named_field(field)
            .ok_or_else(|| anyhow!("Unknown metadata field '{}'", field))?;
        let value = format_field(value.as_ref())
            .ok_or_else(|| anyhow!("Field '{}' has no printable value", field))?;
        println!("{}", value);
        return Ok(());
    }

    if args.tags {
        let raster = read_raster(&args.input_file)?;
        println!("Tags");
        for (key, value) in raster.metadata().tags().iter() {
            println!("\t{:<24}{}", key, value);
        }
        let metadata = raster.metadata();
        if raster.width() != metadata.v_img_res || raster.height() != metadata.h_img_res {
            return Err(anyhow!(
                "Raster is {} x {} pixels but its metadata describes {} x {}",
                raster.width(),
                raster.height(),
                metadata.v_img_res,
                metadata.h_img_res
            ));
        }
        println!(
            "Raster size {} x {} matches the metadata",
            raster.width(),
            raster.height()
        );
        return Ok(());
    }

    let metadata = read_raster_metadata(&args.input_file)?;
    println!("{}", args.input_file.display());
    print!("{}", metadata);
    Ok(())
}
