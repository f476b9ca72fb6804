//! Chunked sample decoding.
//!
//! Sample records are fixed-length; decoding streams them in bounded chunks
//! so peak memory stays proportional to `chunk_size * buf_len` rather than
//! the file size. Requested channels are resolved case-insensitively once
//! per decode session into positional bindings; rows are fixed-shape value
//! vectors indexed by channel position, never name-keyed maps.
//!
//! The progress callback fires after each chunk with cumulative counts; the
//! cancellation token is polled only between chunks. Once a chunk's decode
//! starts it runs to completion. A read fault aborts the whole decode with
//! no partial rows, since record boundaries cannot be resynchronized after
//! a fault.

use super::format::{
    ChannelDescriptor, ChannelTable, ChannelType, DiskHeader, extract_null_terminated_string,
    parse_f32_le, parse_f64_le, parse_i32_le, parse_u32_le,
};
use crate::source::ByteSource;
use crate::{Result, TelemetryError};
use std::collections::HashMap;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

/// Default number of records decoded per chunk.
pub const DEFAULT_CHUNK_SIZE: u64 = 1024;

/// One decoded channel value.
///
/// Scalars decode directly by type; multi-element channels decode
/// element-wise, except char arrays which decode as a single
/// null-terminated string.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelValue {
    Bool(bool),
    Int(i32),
    Bits(u32),
    Float(f32),
    Double(f64),
    Text(String),
    BoolArray(Vec<bool>),
    IntArray(Vec<i32>),
    BitsArray(Vec<u32>),
    FloatArray(Vec<f32>),
    DoubleArray(Vec<f64>),
}

impl ChannelValue {
    /// Numeric view of a scalar value; `None` for text and arrays.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ChannelValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            ChannelValue::Int(v) => Some(*v as f64),
            ChannelValue::Bits(v) => Some(*v as f64),
            ChannelValue::Float(v) => Some(*v as f64),
            ChannelValue::Double(v) => Some(*v),
            _ => None,
        }
    }

    /// Integer view of a scalar value; `None` for non-integral variants.
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            ChannelValue::Int(v) => Some(*v),
            ChannelValue::Bool(b) => Some(*b as i32),
            _ => None,
        }
    }
}

/// Cumulative decode progress, reported after each chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeProgress {
    pub processed_records: u64,
    pub total_records: u64,
}

/// Progress callback invoked at chunk boundaries.
pub type ProgressFn = Box<dyn FnMut(DecodeProgress) + Send>;

/// Parameters for one sample-decode pass.
pub struct DecodeRequest {
    /// Channels to decode, resolved case-insensitively against the table.
    pub channels: Vec<String>,
    /// First record index of the requested range (inclusive).
    pub start_index: Option<u64>,
    /// End of the requested range (exclusive).
    pub end_index: Option<u64>,
    /// Keep every `stride`-th record, counted from the range start.
    pub stride: u64,
    /// Records decoded per ranged read.
    pub chunk_size: u64,
    /// Advisory progress callback; not part of any persisted state.
    pub on_progress: Option<ProgressFn>,
    /// Cooperative cancellation handle, polled only between chunks.
    pub cancel: Option<CancellationToken>,
}

impl DecodeRequest {
    pub fn new<I, S>(channels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            channels: channels.into_iter().map(Into::into).collect(),
            start_index: None,
            end_index: None,
            stride: 1,
            chunk_size: DEFAULT_CHUNK_SIZE,
            on_progress: None,
            cancel: None,
        }
    }

    pub fn with_range(mut self, start: u64, end: u64) -> Self {
        self.start_index = Some(start);
        self.end_index = Some(end);
        self
    }

    pub fn with_stride(mut self, stride: u64) -> Self {
        self.stride = stride;
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: u64) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn with_progress(mut self, on_progress: ProgressFn) -> Self {
        self.on_progress = Some(on_progress);
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }
}

/// Channel names resolved to row positions for one decode session.
#[derive(Debug, Clone)]
pub struct ResolvedChannels {
    names: Vec<String>,
    positions: HashMap<String, usize>,
}

impl ResolvedChannels {
    /// Canonical channel names in row order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Row position of a channel, case-insensitively.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.positions.get(&name.to_lowercase()).copied()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Decoded values for the requested channels at one record index.
#[derive(Debug, Clone)]
pub struct SampleRow {
    /// Absolute record index within the file.
    pub record_index: u64,
    values: Vec<ChannelValue>,
}

impl SampleRow {
    /// Value at a resolved channel position.
    pub fn value(&self, position: usize) -> &ChannelValue {
        &self.values[position]
    }

    pub fn values(&self) -> &[ChannelValue] {
        &self.values
    }
}

/// All rows retained by one decode pass, with their channel bindings.
#[derive(Debug, Clone)]
pub struct SampleBatch {
    pub channels: ResolvedChannels,
    pub rows: Vec<SampleRow>,
}

impl SampleBatch {
    /// Numeric value of a channel in one row, by name.
    pub fn f64_at(&self, row: &SampleRow, name: &str) -> Option<f64> {
        self.channels.position(name).and_then(|pos| row.value(pos).as_f64())
    }
}

fn resolve_channels<'a>(
    table: &'a ChannelTable,
    requested: &[String],
) -> Result<(Vec<&'a ChannelDescriptor>, ResolvedChannels)> {
    let mut bound = Vec::with_capacity(requested.len());
    let mut names = Vec::with_capacity(requested.len());
    let mut positions = HashMap::with_capacity(requested.len());

    for name in requested {
        let descriptor = table
            .get(name)
            .ok_or_else(|| TelemetryError::UnknownChannel { channel: name.clone() })?;
        if let ChannelType::Unknown(code) = descriptor.channel_type {
            return Err(TelemetryError::parse(
                "Channel resolution",
                format!("Channel '{}' has unsupported type code {}", descriptor.name, code),
            ));
        }
        positions.insert(descriptor.name.to_lowercase(), bound.len());
        names.push(descriptor.name.clone());
        bound.push(descriptor);
    }

    Ok((bound, ResolvedChannels { names, positions }))
}

fn decode_value(record: &[u8], descriptor: &ChannelDescriptor) -> Result<ChannelValue> {
    let base = descriptor.offset;
    let count = descriptor.count;

    match descriptor.channel_type {
        ChannelType::Char => {
            let bytes = record.get(base..base + count).ok_or_else(|| {
                TelemetryError::parse(
                    "Sample decoding",
                    format!("Channel '{}' extends beyond record", descriptor.name),
                )
            })?;
            Ok(ChannelValue::Text(extract_null_terminated_string(bytes)))
        }
        ChannelType::Bool => {
            if count == 1 {
                let byte = record.get(base).ok_or_else(|| out_of_record(descriptor))?;
                Ok(ChannelValue::Bool(*byte != 0))
            } else {
                let bytes = record.get(base..base + count).ok_or_else(|| out_of_record(descriptor))?;
                Ok(ChannelValue::BoolArray(bytes.iter().map(|&b| b != 0).collect()))
            }
        }
        ChannelType::Int32 => {
            if count == 1 {
                Ok(ChannelValue::Int(parse_i32_le(record, base)?))
            } else {
                let mut values = Vec::with_capacity(count);
                for i in 0..count {
                    values.push(parse_i32_le(record, base + i * 4)?);
                }
                Ok(ChannelValue::IntArray(values))
            }
        }
        ChannelType::BitField => {
            if count == 1 {
                Ok(ChannelValue::Bits(parse_u32_le(record, base)?))
            } else {
                let mut values = Vec::with_capacity(count);
                for i in 0..count {
                    values.push(parse_u32_le(record, base + i * 4)?);
                }
                Ok(ChannelValue::BitsArray(values))
            }
        }
        ChannelType::Float32 => {
            if count == 1 {
                Ok(ChannelValue::Float(parse_f32_le(record, base)?))
            } else {
                let mut values = Vec::with_capacity(count);
                for i in 0..count {
                    values.push(parse_f32_le(record, base + i * 4)?);
                }
                Ok(ChannelValue::FloatArray(values))
            }
        }
        ChannelType::Float64 => {
            if count == 1 {
                Ok(ChannelValue::Double(parse_f64_le(record, base)?))
            } else {
                let mut values = Vec::with_capacity(count);
                for i in 0..count {
                    values.push(parse_f64_le(record, base + i * 8)?);
                }
                Ok(ChannelValue::DoubleArray(values))
            }
        }
        ChannelType::Unknown(code) => Err(TelemetryError::parse(
            "Sample decoding",
            format!("Channel '{}' has unsupported type code {}", descriptor.name, code),
        )),
    }
}

fn out_of_record(descriptor: &ChannelDescriptor) -> TelemetryError {
    TelemetryError::parse(
        "Sample decoding",
        format!("Channel '{}' extends beyond record", descriptor.name),
    )
}

/// Decode sample records from `source` into named-channel value rows.
///
/// `data_start` is the byte offset of record 0 and `record_count` the total
/// number of records in the file; both are computed by the reader from the
/// header and, when present, the disk sub-header.
pub async fn decode_samples<S: ByteSource + ?Sized>(
    source: &S,
    header: &DiskHeader,
    table: &ChannelTable,
    data_start: u64,
    record_count: u64,
    mut request: DecodeRequest,
) -> Result<SampleBatch> {
    if header.buf_len <= 0 {
        return Err(TelemetryError::malformed_header(format!(
            "Sample record length must be positive, got {}",
            header.buf_len
        )));
    }
    if request.stride == 0 {
        return Err(TelemetryError::parse("Decode request", "Stride must be at least 1"));
    }
    if request.chunk_size == 0 {
        return Err(TelemetryError::parse("Decode request", "Chunk size must be at least 1"));
    }

    let (bound, resolved) = resolve_channels(table, &request.channels)?;

    let buf_len = header.buf_len as u64;
    let start = request.start_index.unwrap_or(0).min(record_count);
    let end = request.end_index.unwrap_or(record_count).min(record_count).max(start);
    let total = end - start;

    debug!(
        "Decoding records [{}, {}) of {} with stride {} in chunks of {}",
        start, end, record_count, request.stride, request.chunk_size
    );

    let mut rows = Vec::new();
    let mut processed: u64 = 0;
    let mut chunk_start = start;

    while chunk_start < end {
        // The only cooperative cancellation point is between chunks
        if let Some(cancel) = &request.cancel
            && cancel.is_cancelled()
        {
            return Err(TelemetryError::Cancelled { processed_records: processed });
        }

        let chunk_records = request.chunk_size.min(end - chunk_start);
        let chunk_offset = data_start + chunk_start * buf_len;
        let chunk_bytes = source.read_range(chunk_offset, chunk_records * buf_len).await?;

        for k in 0..chunk_records {
            let index = chunk_start + k;
            if (index - start) % request.stride != 0 {
                continue;
            }

            let record = &chunk_bytes[(k * buf_len) as usize..((k + 1) * buf_len) as usize];
            let mut values = Vec::with_capacity(bound.len());
            for descriptor in &bound {
                values.push(decode_value(record, descriptor)?);
            }
            rows.push(SampleRow { record_index: index, values });
        }

        processed += chunk_records;
        chunk_start += chunk_records;

        if let Some(on_progress) = request.on_progress.as_mut() {
            on_progress(DecodeProgress { processed_records: processed, total_records: total });
        }
        trace!("Decoded chunk: {}/{} records, {} rows retained", processed, total, rows.len());
    }

    Ok(SampleBatch { channels: resolved, rows })
}
