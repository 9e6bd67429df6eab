//! JSON persistence of [ChangeEventCollection]s and export of per-event geometry

use std::{
    fs::{self, File},
    io::{BufReader, BufWriter, Write},
    path::Path,
};

use anyhow::{Context, Result};
use chronocloud_algorithms::change_events::{ChangeEventCollection, Rule, RuleSet};
use log::{debug, info};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::ser::{PrettyFormatter, Serializer};

mod footprints;
pub use self::footprints::*;

mod obj_writer;
pub use self::obj_writer::*;

mod pair_extraction;
pub use self::pair_extraction::*;

/// Name of the collection file inside each change-event folder
pub const CHANGE_EVENTS_FILE_NAME: &str = "change_events.json";

/// Writes `collection` as a pretty-printed JSON array to `path`
pub fn save_collection<P: AsRef<Path>>(collection: &ChangeEventCollection, path: P) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)
        .with_context(|| format!("Could not create change event file {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    let mut serializer = Serializer::with_formatter(&mut writer, PrettyFormatter::with_indent(b"    "));
    collection
        .serialize(&mut serializer)
        .with_context(|| format!("Could not write change events to {}", path.display()))?;
    writer.flush()?;
    info!("Saved {} change events to {}", collection.len(), path.display());
    Ok(())
}

/// Reads the collection stored at `path`. A file that does not exist yields an empty collection
pub fn load_collection<P: AsRef<Path>>(path: P) -> Result<ChangeEventCollection> {
    let path = path.as_ref();
    if !path.exists() {
        debug!("No change event file at {}, starting empty", path.display());
        return Ok(ChangeEventCollection::new());
    }
    let file = File::open(path)
        .with_context(|| format!("Could not open change event file {}", path.display()))?;
    let collection: ChangeEventCollection = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Could not parse change event file {}", path.display()))?;
    debug!("Loaded {} change events from {}", collection.len(), path.display());
    Ok(collection)
}

/// Adds the events stored at `path` that are not yet part of `collection`. Returns the number of events
/// added
pub fn attach_from_file<P: AsRef<Path>>(
    collection: &mut ChangeEventCollection,
    path: P,
) -> Result<usize> {
    let other = load_collection(path)?;
    Ok(collection.merge(other))
}

/// Merges the `change_events.json` files of all direct subfolders of `folder` into `collection`.
/// Subfolders are visited in name order, subfolders without a collection file are skipped. Returns the
/// number of events added
pub fn merge_from_folder<P: AsRef<Path>>(
    collection: &mut ChangeEventCollection,
    folder: P,
) -> Result<usize> {
    let folder = folder.as_ref();
    let mut subfolders = fs::read_dir(folder)
        .with_context(|| format!("Could not list folder {}", folder.display()))?
        .map(|entry| entry.map(|entry| entry.path()))
        .collect::<Result<Vec<_>, _>>()?;
    subfolders.retain(|path| path.is_dir());
    subfolders.sort();

    let mut added = 0;
    for subfolder in subfolders {
        let file_path = subfolder.join(CHANGE_EVENTS_FILE_NAME);
        if file_path.is_file() {
            added += attach_from_file(collection, &file_path)?;
        }
    }
    info!(
        "Merged {} change events from {}, {} in total",
        added,
        folder.display(),
        collection.len()
    );
    Ok(added)
}

fn read_json<T: DeserializeOwned, P: AsRef<Path>>(path: P, what: &str) -> Result<T> {
    let path = path.as_ref();
    let file =
        File::open(path).with_context(|| format!("Could not open {} {}", what, path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Could not parse {} {}", what, path.display()))
}

/// Reads a single filter rule, a JSON object from feature names to conditions
pub fn read_rule<P: AsRef<Path>>(path: P) -> Result<Rule> {
    read_json(path, "rule file")
}

/// Reads labelled classification rules, a JSON object from labels to rules. The order of the labels in the file
/// is kept
pub fn read_rule_set<P: AsRef<Path>>(path: P) -> Result<RuleSet> {
    read_json(path, "rule file")
}
