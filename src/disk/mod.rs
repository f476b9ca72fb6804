//! Disk telemetry file decoding: format structures, chunked sample
//! decoding, and the assembled reader.

pub mod decoder;
pub mod format;
pub mod reader;

pub use decoder::{
    ChannelValue, DecodeProgress, DecodeRequest, ResolvedChannels, SampleBatch, SampleRow,
};
pub use format::{ChannelDescriptor, ChannelTable, ChannelType, DiskHeader, DiskSubHeader};
pub use reader::DiskTelemetry;
