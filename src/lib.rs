// Watermark-me Library
// Batch watermarking of pictures with optional remote compression

pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod optimizer;
pub mod retry;
pub mod stats;
pub mod watermark;
