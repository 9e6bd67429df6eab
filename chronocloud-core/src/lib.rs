#![warn(clippy::all)]

//! Core data structures for multi-epoch point cloud change analysis
//!
//! Chronocloud works on point clouds captured repeatedly from a fixed station ("epochs"). This crate holds
//! the shared vocabulary: the [PointCloud](crate::containers::PointCloud) of a single capture, the
//! [ChangePoint](crate::containers::ChangePoint)s of a pair of captures, projected
//! [RasterImage](crate::containers::RasterImage)s and the metadata that ties a raster back to 3D space.
//! Coordinate conversions used by the projection and by the pixel inversion live in [math].

pub extern crate nalgebra;
extern crate self as chronocloud_core;

/// Point clouds, change points and raster images
pub mod containers;
/// Error types shared by the chronocloud crates
pub mod error;
/// Useful mathematical tools when working with point cloud data
pub mod math;
/// Raster metadata and the reference frame of a projected time series
pub mod meta;
