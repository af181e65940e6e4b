pub mod segment;

pub use segment::{missing_indices, scan_segments, segment_file_name, SegmentFile};
