#![warn(clippy::all)]

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use chronocloud_algorithms::{
    change_events::{parse_epoch, DEFAULT_TEMPORAL_FORMAT},
    config::PipelineConfig,
    projection::Projector,
};
use chronocloud_core::meta::ReferenceFrame;
use chronocloud_io::{
    ascii::read_point_cloud,
    project::{read_config, ProjectLayout},
    raster::write_raster,
};
use clap::{App, Arg};
use log::{error, info, warn};

struct Args {
    pub config: PipelineConfig,
    pub input_files: Vec<PathBuf>,
    pub format: String,
    pub delimiter: String,
}

fn get_args() -> Result<Args> {
    let matches = App::new("chronocloud project_series")
        .version("0.1")
        .about("Projects the epochs of a point cloud time series into aligned rasters. The first epoch that can be read defines the field of view of all later epochs")
        .arg(
            Arg::with_name("CONFIG")
                .short("c")
                .long("config")
                .takes_value(true)
                .value_name("CONFIG")
                .help("Pipeline configuration (JSON)")
                .required(true),
        )
        .arg(
            Arg::with_name("INPUT")
                .short("i")
                .takes_value(true)
                .multiple(true)
                .value_name("INPUT")
                .help("Point cloud files of the epochs, in acquisition order. Defaults to pc_path of the configuration"),
        )
        .arg(
            Arg::with_name("FORMAT")
                .short("f")
                .long("format")
                .takes_value(true)
                .value_name("FORMAT")
                .help("Column format of the point cloud files (x, y, z, R, G, B, s for skip)")
                .default_value("xyzRGB"),
        )
        .arg(
            Arg::with_name("DELIMITER")
                .short("d")
                .long("delimiter")
                .takes_value(true)
                .value_name("DELIMITER")
                .help("Column delimiter, blank for any whitespace")
                .default_value(" "),
        )
        .get_matches();

    let config_path = matches
        .value_of("CONFIG")
        .ok_or_else(|| anyhow!("No configuration given"))?;
    let config = read_config(config_path)?;

    let mut input_files = matches
        .values_of("INPUT")
        .map(|values| values.map(PathBuf::from).collect::<Vec<_>>())
        .unwrap_or_default();
    if input_files.is_empty() && !config.pc_projection.pc_path.is_empty() {
        input_files.push(PathBuf::from(&config.pc_projection.pc_path));
    }
    if input_files.is_empty() {
        return Err(anyhow!("No point cloud files given"));
    }

    Ok(Args {
        config,
        input_files,
        format: matches.value_of("FORMAT").unwrap_or("xyzRGB").to_owned(),
        delimiter: matches.value_of("DELIMITER").unwrap_or(" ").to_owned(),
    })
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "epoch".to_owned())
}

/// Projects one epoch and writes its rasters. Returns the frame the epoch was projected in
fn project_epoch(
    file: &Path,
    args: &Args,
    layout: &ProjectLayout,
    frame: Option<ReferenceFrame>,
) -> Result<ReferenceFrame> {
    let temporal_format = &args.config.project_setting.temporal_format;
    match parse_epoch(&file.to_string_lossy(), temporal_format) {
        Ok(timestamp) => info!("Projecting epoch {} ({})", file.display(), timestamp),
        Err(why) => warn!("{}", why),
    }

    let cloud = read_point_cloud(file, &args.format, &args.delimiter)?;
    let mut parameters = args.config.projection_parameters();
    parameters.source_path = file.to_string_lossy().into_owned();
    let projection = Projector::new(parameters)?.project(&cloud, frame)?;

    for image in projection.images.iter() {
        let path = layout.projected_images().join(format!(
            "{}_{}.png",
            file_stem(file),
            image.metadata().image_kind
        ));
        write_raster(image, &path)?;
        info!("Wrote {}", path.display());
    }
    Ok(projection.frame)
}

fn main() -> Result<()> {
    pretty_env_logger::init();

    let args = get_args()?;
    let timestamp = chrono::Local::now()
        .format(DEFAULT_TEMPORAL_FORMAT)
        .to_string();
    let layout = ProjectLayout::create(
        &args.config.project_setting.output_folder,
        &args.config.project_name(&timestamp),
    )?;
    layout.write_config(&args.config)?;

    let mut frame = None;
    let mut projected = 0;
    for file in args.input_files.iter() {
        match project_epoch(file, &args, &layout, frame) {
            Ok(epoch_frame) => {
                frame.get_or_insert(epoch_frame);
                projected += 1;
            }
            Err(why) => error!("Skipping {}: {:#}", file.display(), why),
        }
    }

    if !args.config.project_setting.silent_mode {
        println!(
            "Projected {} of {} epochs into {}",
            projected,
            args.input_files.len(),
            layout.projected_images().display()
        );
    }
    Ok(())
}
