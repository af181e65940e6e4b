pub mod ffmpeg;

pub use ffmpeg::FfmpegConcatenator;
