#![warn(clippy::all)]

use std::{collections::BTreeMap, path::PathBuf};

use anyhow::{anyhow, Result};
use chronocloud_algorithms::change_events::ChangeEventCollection;
use chronocloud_io::events::{
    load_collection, merge_from_folder, read_rule, read_rule_set, save_collection,
};
use clap::{App, Arg};
use log::info;

struct Args {
    pub input: PathBuf,
    pub rules_file: Option<PathBuf>,
    pub filter_file: Option<PathBuf>,
    pub output_file: PathBuf,
}

fn get_args() -> Result<Args> {
    let matches = App::new("chronocloud classify_events")
        .version("0.1")
        .about("Filters and labels change events with rules over their features")
        .arg(
            Arg::with_name("INPUT")
                .short("i")
                .takes_value(true)
                .value_name("INPUT")
                .help("A change event file, or a folder whose subfolders contain change event files")
                .required(true),
        )
        .arg(
            Arg::with_name("RULES")
                .short("r")
                .long("rules")
                .takes_value(true)
                .value_name("RULES")
                .help("Labelled rules (JSON). The first matching rule determines the label of an event"),
        )
        .arg(
            Arg::with_name("FILTER")
                .short("f")
                .long("filter")
                .takes_value(true)
                .value_name("FILTER")
                .help("A single rule (JSON). Only events matching it are kept"),
        )
        .arg(
            Arg::with_name("OUTPUT")
                .short("o")
                .takes_value(true)
                .value_name("OUTPUT")
                .help("Output change event file")
                .required(true),
        )
        .get_matches();

    let input = matches
        .value_of("INPUT")
        .map(PathBuf::from)
        .ok_or_else(|| anyhow!("No input given"))?;
    let output_file = matches
        .value_of("OUTPUT")
        .map(PathBuf::from)
        .ok_or_else(|| anyhow!("No output file given"))?;

    Ok(Args {
        input,
        rules_file: matches.value_of("RULES").map(PathBuf::from),
        filter_file: matches.value_of("FILTER").map(PathBuf::from),
        output_file,
    })
}

fn print_label_counts(collection: &ChangeEventCollection) {
    let mut counts = BTreeMap::new();
    for event in collection.iter() {
        *counts.entry(event.event_type()).or_insert(0usize) += 1;
    }
    println!("Event types");
    for (label, count) in counts.iter() {
        println!("\t{:<20}{}", label, count);
    }
}

fn main() -> Result<()> {
    pretty_env_logger::init();

    let args = get_args()?;
    let mut collection = if args.input.is_dir() {
        let mut collection = ChangeEventCollection::new();
        merge_from_folder(&mut collection, &args.input)?;
        collection
    } else {
        load_collection(&args.input)?
    };

    if let Some(filter_file) = &args.filter_file {
        let before = collection.len();
        collection = collection.filter(&read_rule(filter_file)?);
        info!("Filter kept {} of {} events", collection.len(), before);
    }
    if let Some(rules_file) = &args.rules_file {
        let labelled = collection.classify(&read_rule_set(rules_file)?);
        info!("Labelled {} of {} events", labelled, collection.len());
    }

    save_collection(&collection, &args.output_file)?;
    println!(
        "Wrote {} change events to {}",
        collection.len(),
        args.output_file.display()
    );
    print_label_counts(&collection);
    Ok(())
}
