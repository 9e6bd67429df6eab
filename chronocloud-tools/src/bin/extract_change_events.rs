#![warn(clippy::all)]

use std::path::PathBuf;

use anyhow::{anyhow, Result};
use chronocloud_algorithms::{change_events::DEFAULT_TEMPORAL_FORMAT, config::PipelineConfig};
use chronocloud_io::{
    ascii::read_change_points,
    events::{extract_pair_events, PairExtraction},
    project::{read_config, ProjectLayout},
};
use clap::{App, Arg};

struct Args {
    pub config: PipelineConfig,
    pub input_file: PathBuf,
    pub project: Option<String>,
    pub first_epoch: Option<String>,
    pub second_epoch: Option<String>,
    pub format: String,
    pub delimiter: String,
    pub write_clusters: bool,
}

fn get_args() -> Result<Args> {
    let matches = App::new("chronocloud extract_change_events")
        .version("0.1")
        .about("Clusters the change points of one epoch pair and stores every cluster as a change event of the project")
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
                .value_name("INPUT")
                .help("Change point file (x, y, z, magnitude, epoch)")
                .required(true),
        )
        .arg(
            Arg::with_name("PROJECT")
                .short("p")
                .long("project")
                .takes_value(true)
                .value_name("PROJECT")
                .help("Folder name of an existing project below output_folder. Defaults to the configured project name"),
        )
        .arg(
            Arg::with_name("T1")
                .long("t1")
                .takes_value(true)
                .value_name("T1")
                .help("Identifier (e.g. file name) of the first epoch. Without --t1 and --t2 both timestamps are taken from the input file name"),
        )
        .arg(
            Arg::with_name("T2")
                .long("t2")
                .takes_value(true)
                .value_name("T2")
                .help("Identifier (e.g. file name) of the second epoch"),
        )
        .arg(
            Arg::with_name("FORMAT")
                .short("f")
                .long("format")
                .takes_value(true)
                .value_name("FORMAT")
                .help("Column format of the change point file (x, y, z, m, E, s for skip)")
                .default_value("xyzmE"),
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
        .arg(
            Arg::with_name("WRITE_CLUSTERS")
                .short("w")
                .long("write-clusters")
                .help("Write the points and the hull mesh of every cluster next to the collection"),
        )
        .get_matches();

    let config_path = matches
        .value_of("CONFIG")
        .ok_or_else(|| anyhow!("No configuration given"))?;
    let input_file = matches
        .value_of("INPUT")
        .map(PathBuf::from)
        .ok_or_else(|| anyhow!("No change point file given"))?;

    Ok(Args {
        config: read_config(config_path)?,
        input_file,
        project: matches.value_of("PROJECT").map(str::to_owned),
        first_epoch: matches.value_of("T1").map(str::to_owned),
        second_epoch: matches.value_of("T2").map(str::to_owned),
        format: matches.value_of("FORMAT").unwrap_or("xyzmE").to_owned(),
        delimiter: matches.value_of("DELIMITER").unwrap_or(" ").to_owned(),
        write_clusters: matches.is_present("WRITE_CLUSTERS"),
    })
}

fn main() -> Result<()> {
    pretty_env_logger::init();

    let args = get_args()?;
    let pair_name = args
        .input_file
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .ok_or_else(|| anyhow!("Invalid input file {}", args.input_file.display()))?;

    let project_name = match &args.project {
        Some(project) => project.clone(),
        None => args.config.project_name(
            &chrono::Local::now()
                .format(DEFAULT_TEMPORAL_FORMAT)
                .to_string(),
        ),
    };
    let layout = ProjectLayout::create(&args.config.project_setting.output_folder, &project_name)?;

    let settings = PairExtraction {
        first_epoch: args.first_epoch.clone(),
        second_epoch: args.second_epoch.clone(),
        write_clusters: args.write_clusters,
        ..PairExtraction::new(args.config.project_setting.temporal_format.as_str())
    };
    // Fail before reading the points if the pair has no acquisition times
    settings.epochs(&pair_name)?;

    let points = read_change_points(&args.input_file, &args.format, &args.delimiter)?;
    let outcome = extract_pair_events(
        &layout,
        &pair_name,
        &points,
        &args.config.clusterer()?,
        &settings,
    )?;

    if !args.config.project_setting.silent_mode {
        println!(
            "Added {} change events to {} ({} in total)",
            outcome.added,
            outcome.collection_path.display(),
            outcome.total
        );
    }
    Ok(())
}
