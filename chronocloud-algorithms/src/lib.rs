#![warn(clippy::all)]
//! Algorithms of the chronocloud pipeline.
//!
//! Contains the spherical projection of point clouds into raster images and the extraction of change events
//! from clustered change points.

// Change events, their features, the rule engine and the event collection.
pub mod change_events;
// Summary statistics over the change magnitudes of a cluster.
pub mod change_statistics;
// Density-based clustering of change points.
pub mod clustering;
// Pipeline configuration as read from JSON.
pub mod config;
// Convex hull of a point set with surface area and volume.
pub mod convexhull;
// Spherical projection of point clouds into shaded color and range rasters.
pub mod projection;
// Eigenvalue-based shape descriptors. The definitions follow 'FEATURE RELEVANCE ASSESSMENT FOR THE SEMANTIC INTERPRETATION OF 3D POINT CLOUD DATA' (Martin Weinmann, Boris Jutzi, Clément Mallet, ISPRS Annals of the Photogrammetry, Remote Sensing and Spatial Information Sciences, Volume II-5/W2, 2013)
pub mod structure_measures;
