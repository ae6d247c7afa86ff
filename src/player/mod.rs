pub mod axis;
pub mod config;
pub mod error;
pub mod geometry;
pub mod loader;
pub mod motion;
pub mod npy;
pub mod playback;
pub mod target;
pub mod topology;

#[cfg(test)]
pub(crate) mod testing;
