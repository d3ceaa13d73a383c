//! S3-triggered thumbnail generator
//!
//! On notification that an image landed in a bucket, downloads it, resizes it
//! to a fixed set of bounding boxes, and uploads each variant to the
//! `<bucket>-thumbs` bucket under `<profile>-<key>`.

pub mod app;
pub mod dispatch;
pub mod error;
pub mod generator;
pub mod image;
pub mod models;
pub mod publisher;
pub mod storage;

pub use error::{Error, Result};
