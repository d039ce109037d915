//! Science Robotics archive scraper.
//!
//! Crawls the yearly archive pages, downloads every issue's pdfs into
//! `downloads/Volume <V> Issue <I>/` and combines them into one pdf per
//! issue plus a single compilation of the whole run.

pub mod combine;
pub mod crawl;
pub mod download;
mod error;
mod macros;
pub mod merge;

pub use error::{Error, Result};

pub const BASE_URL: &str = "https://robotics.sciencemag.org/content/by/year/";
pub const START_YEAR: u32 = 2016;
pub const CURRENT_YEAR: u32 = 2019;
/// Download root, relative to the working directory.
pub const DOWNLOADS_DIR: &str = "downloads";
pub const COMPILATION_FILENAME: &str = "Sci Rob Latest Compilation.pdf";
