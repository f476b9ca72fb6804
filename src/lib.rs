//! Decoder and analysis toolkit for proprietary fixed-record racing
//! telemetry captures.
//!
//! Traceline reads completed disk telemetry files: a binary header, a
//! channel descriptor table, an embedded YAML session-metadata document,
//! and a run of fixed-size sample records. On top of the raw decode it
//! reconstructs per-lap point series, computes sector split times, and
//! synthesizes left/right track-boundary meshes for map rendering.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use traceline::{DecodeRequest, DiskTelemetry, FileSource, LapChannels, reconstruct_laps};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let source = FileSource::open("/path/to/capture.tlm").await?;
//!     let telemetry = DiskTelemetry::open(source).await?;
//!
//!     let channels = LapChannels::default();
//!     let request = DecodeRequest::new(channels.request_names());
//!     let batch = telemetry.decode_samples(request).await?;
//!
//!     let laps = reconstruct_laps(&batch, &channels, None)?;
//!     for (key, lap) in &laps.laps {
//!         println!("lap {:?}: {} points", key, lap.point_count());
//!     }
//!     Ok(())
//! }
//! ```

// Core types and error handling
mod error;
mod yaml_utils;

// Disk file decoding
pub mod disk;
pub mod source;

// Analysis on decoded samples
pub mod interp;
pub mod laps;
pub mod sectors;
pub mod session;
pub mod trackmap;

pub use error::{Result, TelemetryError};
pub use yaml_utils::{extract_metadata_text, preprocess_metadata_yaml};

pub use disk::{
    ChannelDescriptor, ChannelTable, ChannelType, ChannelValue, DecodeProgress, DecodeRequest,
    DiskHeader, DiskSubHeader, DiskTelemetry, ResolvedChannels, SampleBatch, SampleRow,
};
pub use interp::interpolate;
pub use laps::{
    CarFilter, LapChannels, LapKey, LapPoint, LapReconstruction, LapSeries, MIN_LAP_POINTS,
    reconstruct_laps,
};
pub use sectors::{SectorTime, compute_sector_times};
pub use session::{SectorBoundary, SessionMetadata};
pub use source::{ByteSource, FileSource, MemorySource};
pub use trackmap::{
    BoundaryPoint, Corner, CornerMarker, DEFAULT_SAMPLE_COUNT, EdgeSample, MESH_VERSION,
    TrackMapInput, TrackMapMesh, build_track_map,
};
