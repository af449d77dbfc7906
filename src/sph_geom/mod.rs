//! Spherical geometry: 3D vectors, conversion from/to spherical coordinates and distances.

pub mod coo3d;
