//! Image loading, fetching and encoding

pub mod io;

pub use io::ImageIOService;
