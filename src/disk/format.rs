//! Disk telemetry file format structures and parsing.
//!
//! Recorded telemetry files are laid out as:
//!
//! 1. **Primary header** (40 bytes) - format version, tick rate, offsets
//! 2. **Disk sub-header** (optional) - session timestamps and record counts,
//!    present when the span before the variable table is at least 144 bytes
//! 3. **Session metadata** - textual structured document
//! 4. **Channel descriptor table** - array of fixed 144-byte records
//! 5. **Sample records** - sequential fixed-length telemetry samples
//!
//! All multi-byte fields are little-endian. Parsing performs bounds checks
//! on every access and never reads past the supplied buffer.

use crate::{Result, TelemetryError};
use std::collections::HashMap;
use tracing::{debug, trace};

/// Size of the primary header in bytes.
pub const PRIMARY_HEADER_SIZE: usize = 40;
/// Minimum span before the variable table for a disk sub-header to exist.
pub const SUB_HEADER_MIN_SPAN: usize = 144;
/// Size of one channel descriptor record in bytes.
pub const CHANNEL_DESCRIPTOR_SIZE: usize = 144;

const CHANNEL_NAME_SIZE: usize = 32;
const CHANNEL_DESC_SIZE: usize = 64;
const CHANNEL_UNIT_SIZE: usize = 32;

/// Primary file header.
#[derive(Debug, Clone)]
pub struct DiskHeader {
    pub version: i32,
    pub status: i32,
    pub tick_rate: i32,
    pub session_info_update: i32,
    pub session_info_len: i32,
    pub session_info_offset: i32,
    pub num_vars: i32,
    pub var_header_offset: i32,
    pub num_buf: i32,
    pub buf_len: i32,
}

impl DiskHeader {
    /// Parse the primary header from the first 40 bytes of the file.
    pub fn parse(data: &[u8]) -> Result<Self> {
        trace!("Parsing primary header ({} bytes)", PRIMARY_HEADER_SIZE);
        if data.len() < PRIMARY_HEADER_SIZE {
            return Err(TelemetryError::malformed_header(format!(
                "Need {} header bytes, have {}",
                PRIMARY_HEADER_SIZE,
                data.len()
            )));
        }

        let header = Self {
            version: parse_i32_le(data, 0)?,
            status: parse_i32_le(data, 4)?,
            tick_rate: parse_i32_le(data, 8)?,
            session_info_update: parse_i32_le(data, 12)?,
            session_info_len: parse_i32_le(data, 16)?,
            session_info_offset: parse_i32_le(data, 20)?,
            num_vars: parse_i32_le(data, 24)?,
            var_header_offset: parse_i32_le(data, 28)?,
            num_buf: parse_i32_le(data, 32)?,
            buf_len: parse_i32_le(data, 36)?,
        };

        debug!(
            "Parsed header: version={}, tick_rate={}, num_vars={}, buf_len={}",
            header.version, header.tick_rate, header.num_vars, header.buf_len
        );

        Ok(header)
    }

    /// Validate header fields against the total file size.
    pub fn validate(&self, file_size: u64) -> Result<()> {
        if self.var_header_offset <= 0 {
            return Err(TelemetryError::malformed_header(format!(
                "Variable table offset must be positive, got {}",
                self.var_header_offset
            )));
        }

        if self.num_vars < 0 {
            return Err(TelemetryError::malformed_header(
                "Number of channels cannot be negative".to_string(),
            ));
        }

        if self.session_info_offset < 0 || self.session_info_len < 0 {
            return Err(TelemetryError::malformed_header(format!(
                "Session metadata span cannot be negative (offset={}, len={})",
                self.session_info_offset, self.session_info_len
            )));
        }

        let metadata_end = self.session_info_offset as u64 + self.session_info_len as u64;
        if metadata_end > file_size {
            return Err(TelemetryError::malformed_header(format!(
                "Session metadata extends beyond file: {} > {}",
                metadata_end, file_size
            )));
        }

        // Extreme values indicate corruption rather than a big file
        if self.buf_len > 100_000_000 {
            return Err(TelemetryError::malformed_header(
                "Sample record length is unreasonably large".to_string(),
            ));
        }

        if self.num_vars > 10_000 {
            return Err(TelemetryError::malformed_header(
                "Number of channels is unreasonably large".to_string(),
            ));
        }

        Ok(())
    }
}

/// Optional disk sub-header carrying session timestamps and record counts.
///
/// Extracted at fixed offsets within the span `[0, var_header_offset)` when
/// that span is at least 144 bytes; absent otherwise, in which case the
/// record count must be derived from the file size.
#[derive(Debug, Clone)]
pub struct DiskSubHeader {
    /// Session start date as unix epoch seconds.
    pub start_date: i32,
    /// Session start time in seconds.
    pub start_time: f64,
    /// Session end time in seconds.
    pub end_time: f64,
    /// Number of laps completed.
    pub lap_count: i32,
    /// Number of recorded samples.
    pub record_count: i32,
}

impl DiskSubHeader {
    /// Parse the sub-header from the pre-variable-table span, or return
    /// `None` when the span is too short to contain one.
    pub fn parse(head_span: &[u8]) -> Result<Option<Self>> {
        if head_span.len() < SUB_HEADER_MIN_SPAN {
            trace!(
                "No disk sub-header: span is {} bytes (need {})",
                head_span.len(),
                SUB_HEADER_MIN_SPAN
            );
            return Ok(None);
        }

        let sub = Self {
            start_date: parse_i32_le(head_span, 112)?,
            start_time: parse_f64_le(head_span, 120)?,
            end_time: parse_f64_le(head_span, 128)?,
            lap_count: parse_i32_le(head_span, 136)?,
            record_count: parse_i32_le(head_span, 140)?,
        };

        debug!(
            "Parsed disk sub-header: laps={}, records={}",
            sub.lap_count, sub.record_count
        );

        Ok(Some(sub))
    }
}

/// Channel value types, mapped from the on-disk type code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelType {
    /// 8-bit character; multi-element char channels decode as one string.
    Char,
    /// Single-byte boolean.
    Bool,
    /// 32-bit signed integer.
    Int32,
    /// 32-bit bitfield, decoded unsigned.
    BitField,
    /// 32-bit floating point.
    Float32,
    /// 64-bit floating point.
    Float64,
    /// Unrecognized type code, preserved for diagnostics.
    Unknown(i32),
}

impl ChannelType {
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => ChannelType::Char,
            1 => ChannelType::Bool,
            2 => ChannelType::Int32,
            3 => ChannelType::BitField,
            4 => ChannelType::Float32,
            5 => ChannelType::Float64,
            other => ChannelType::Unknown(other),
        }
    }

    /// Size in bytes of one element of this type.
    ///
    /// Unknown types report zero: their payload width is not recoverable
    /// from the type code alone.
    pub const fn size(&self) -> usize {
        match self {
            ChannelType::Char | ChannelType::Bool => 1,
            ChannelType::Int32 | ChannelType::BitField | ChannelType::Float32 => 4,
            ChannelType::Float64 => 8,
            ChannelType::Unknown(_) => 0,
        }
    }
}

/// One telemetry channel's descriptor from the variable table.
#[derive(Debug, Clone)]
pub struct ChannelDescriptor {
    /// Position within the variable table.
    pub index: usize,
    pub name: String,
    pub channel_type: ChannelType,
    /// Byte offset within one sample record.
    pub offset: usize,
    /// Number of elements (1 for scalars).
    pub count: usize,
    /// Whether the simulator treats the element count as elapsed time.
    pub count_as_time: bool,
    pub unit: String,
    pub description: String,
}

/// Ordered channel descriptors with case-insensitive name lookup.
#[derive(Debug, Clone)]
pub struct ChannelTable {
    descriptors: Vec<ChannelDescriptor>,
    by_lower_name: HashMap<String, usize>,
}

impl ChannelTable {
    /// Parse `num_vars` fixed-size descriptor records from the variable
    /// table bytes.
    ///
    /// Descriptors with empty names or layouts that do not fit inside one
    /// sample record are skipped; unknown type codes are preserved.
    pub fn parse(table_bytes: &[u8], header: &DiskHeader) -> Result<Self> {
        let num_vars = usize::try_from(header.num_vars).map_err(|_| {
            TelemetryError::TypeConversion {
                details: format!("Channel count {} does not fit in usize", header.num_vars),
            }
        })?;

        let needed = num_vars * CHANNEL_DESCRIPTOR_SIZE;
        if table_bytes.len() < needed {
            return Err(TelemetryError::parse(
                "Channel table",
                format!("Need {} bytes for {} descriptors, have {}", needed, num_vars, table_bytes.len()),
            ));
        }

        let buf_len = header.buf_len.max(0) as usize;
        let mut descriptors = Vec::with_capacity(num_vars);
        let mut by_lower_name = HashMap::with_capacity(num_vars);

        for i in 0..num_vars {
            let record = &table_bytes[i * CHANNEL_DESCRIPTOR_SIZE..(i + 1) * CHANNEL_DESCRIPTOR_SIZE];

            let type_code = parse_i32_le(record, 0)?;
            let offset = parse_i32_le(record, 4)?;
            let count = parse_i32_le(record, 8)?;
            let count_as_time = parse_i32_le(record, 12)? != 0;

            let name = extract_null_terminated_string(&record[16..16 + CHANNEL_NAME_SIZE]);
            let description = extract_null_terminated_string(&record[48..48 + CHANNEL_DESC_SIZE]);
            let unit = extract_null_terminated_string(&record[112..112 + CHANNEL_UNIT_SIZE]);

            if name.is_empty() || offset < 0 || count <= 0 {
                trace!("Skipping descriptor {} with empty name or invalid layout", i);
                continue;
            }

            let channel_type = ChannelType::from_code(type_code);
            let offset = offset as usize;
            let count = count as usize;

            // Known types must fit inside one sample record
            if !matches!(channel_type, ChannelType::Unknown(_))
                && offset + channel_type.size() * count > buf_len
            {
                return Err(TelemetryError::parse(
                    "Channel table",
                    format!(
                        "Channel '{}' layout (offset {}, {} x {:?}) exceeds record length {}",
                        name, offset, count, channel_type, buf_len
                    ),
                ));
            }

            let position = descriptors.len();
            by_lower_name.insert(name.to_lowercase(), position);
            descriptors.push(ChannelDescriptor {
                index: i,
                name,
                channel_type,
                offset,
                count,
                count_as_time,
                unit,
                description,
            });
        }

        debug!("Parsed channel table: {} descriptors", descriptors.len());
        Ok(Self { descriptors, by_lower_name })
    }

    /// Look up a descriptor by name, case-insensitively.
    pub fn get(&self, name: &str) -> Option<&ChannelDescriptor> {
        self.by_lower_name.get(&name.to_lowercase()).map(|&i| &self.descriptors[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_lower_name.contains_key(&name.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Descriptors in table order.
    pub fn descriptors(&self) -> &[ChannelDescriptor] {
        &self.descriptors
    }
}

/// Safe byte parsing helpers with bounds checking.
pub(crate) fn parse_i32_le(data: &[u8], offset: usize) -> Result<i32> {
    let bytes = data.get(offset..offset + 4).ok_or_else(|| {
        TelemetryError::parse(
            "Integer parsing",
            format!("Insufficient data for i32 at offset {} (have {})", offset, data.len()),
        )
    })?;
    Ok(i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

pub(crate) fn parse_u32_le(data: &[u8], offset: usize) -> Result<u32> {
    let bytes = data.get(offset..offset + 4).ok_or_else(|| {
        TelemetryError::parse(
            "Integer parsing",
            format!("Insufficient data for u32 at offset {} (have {})", offset, data.len()),
        )
    })?;
    Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

pub(crate) fn parse_f32_le(data: &[u8], offset: usize) -> Result<f32> {
    let bytes = data.get(offset..offset + 4).ok_or_else(|| {
        TelemetryError::parse(
            "Float parsing",
            format!("Insufficient data for f32 at offset {} (have {})", offset, data.len()),
        )
    })?;
    Ok(f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

pub(crate) fn parse_f64_le(data: &[u8], offset: usize) -> Result<f64> {
    let bytes = data.get(offset..offset + 8).ok_or_else(|| {
        TelemetryError::parse(
            "Double precision float parsing",
            format!("Insufficient data for f64 at offset {} (have {})", offset, data.len()),
        )
    })?;
    Ok(f64::from_le_bytes([
        bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
    ]))
}

/// Extract a null-terminated string from a byte slice.
pub(crate) fn extract_null_terminated_string(bytes: &[u8]) -> String {
    let null_pos = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..null_pos]).to_string()
}
