#![warn(clippy::all)]

//! I/O for chronocloud: delimited-text point clouds and change points, projected rasters with their
//! metadata, change event collections and the folder structure of a project

// Readers for point clouds and change points in delimited text files, writer for change points
pub mod ascii;
// JSON persistence of change event collections, hull meshes and event footprints
pub mod events;
// Folder structure of a project
pub mod project;
// PNG rasters with a JSON tag sidecar
pub mod raster;
