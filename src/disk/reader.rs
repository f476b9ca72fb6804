//! Disk telemetry reader.
//!
//! [`DiskTelemetry`] assembles the parsing stages over a [`ByteSource`]:
//! the primary header and optional disk sub-header, the channel descriptor
//! table, and on-demand session metadata, then drives chunked sample
//! decoding. Header, table, and metadata are parsed once per opened source
//! and are immutable thereafter; independent readers over independent
//! sources share no state.

use super::decoder::{DecodeRequest, SampleBatch, decode_samples};
use super::format::{
    CHANNEL_DESCRIPTOR_SIZE, ChannelTable, DiskHeader, DiskSubHeader, PRIMARY_HEADER_SIZE,
};
use crate::session::SessionMetadata;
use crate::source::ByteSource;
use crate::{Result, TelemetryError};
use tracing::{debug, info, warn};

/// Reader over one recorded telemetry file.
#[derive(Debug)]
pub struct DiskTelemetry<S: ByteSource> {
    source: S,
    header: DiskHeader,
    sub_header: Option<DiskSubHeader>,
    channels: ChannelTable,
    file_size: u64,
    data_start: u64,
    record_count: u64,
}

impl<S: ByteSource> DiskTelemetry<S> {
    /// Open a telemetry source: parse and validate the headers and the
    /// channel table.
    pub async fn open(source: S) -> Result<Self> {
        let file_size = source.size();
        if file_size < PRIMARY_HEADER_SIZE as u64 {
            return Err(TelemetryError::malformed_header(format!(
                "File of {} bytes cannot hold a {} byte header",
                file_size, PRIMARY_HEADER_SIZE
            )));
        }

        let header_bytes = source.read_range(0, PRIMARY_HEADER_SIZE as u64).await?;
        let header = DiskHeader::parse(&header_bytes)?;
        header.validate(file_size)?;

        let var_header_offset = header.var_header_offset as u64;
        if var_header_offset > file_size {
            return Err(TelemetryError::malformed_header(format!(
                "Variable table offset {} exceeds file size {}",
                var_header_offset, file_size
            )));
        }

        // Sub-header lives at fixed offsets within the pre-table span,
        // when that span is long enough to hold one
        let head_span = source.read_range(0, var_header_offset).await?;
        let sub_header = DiskSubHeader::parse(&head_span)?;

        let table_len = header.num_vars as u64 * CHANNEL_DESCRIPTOR_SIZE as u64;
        let table_bytes = source.read_range(var_header_offset, table_len).await?;
        let channels = ChannelTable::parse(&table_bytes, &header)?;

        // Sample records start after whichever section ends last
        let table_end = var_header_offset + table_len;
        let metadata_end = header.session_info_offset as u64 + header.session_info_len as u64;
        let data_start = table_end.max(metadata_end);

        let record_count = match &sub_header {
            Some(sub) if sub.record_count > 0 => {
                let derived = derived_record_count(file_size, data_start, header.buf_len);
                if derived != sub.record_count as u64 {
                    warn!(
                        "Record count mismatch: sub-header reports {}, file size implies {}",
                        sub.record_count, derived
                    );
                }
                sub.record_count as u64
            }
            _ => derived_record_count(file_size, data_start, header.buf_len),
        };

        info!(
            "Opened disk telemetry: {} channels, {} records at {}Hz",
            channels.len(),
            record_count,
            header.tick_rate
        );

        Ok(Self { source, header, sub_header, channels, file_size, data_start, record_count })
    }

    pub fn header(&self) -> &DiskHeader {
        &self.header
    }

    /// Disk sub-header, absent when the pre-table span is too short.
    pub fn sub_header(&self) -> Option<&DiskSubHeader> {
        self.sub_header.as_ref()
    }

    pub fn channels(&self) -> &ChannelTable {
        &self.channels
    }

    /// Total number of sample records.
    pub fn record_count(&self) -> u64 {
        self.record_count
    }

    /// Byte offset of record 0.
    pub fn data_start(&self) -> u64 {
        self.data_start
    }

    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    /// Recording frequency, falling back to 60Hz when the header value is
    /// invalid.
    pub fn tick_rate(&self) -> f64 {
        if self.header.tick_rate > 0 { self.header.tick_rate as f64 } else { 60.0 }
    }

    /// Parse the session metadata document.
    ///
    /// Returns `Ok(None)` when the file carries no metadata span or the
    /// span is empty text.
    pub async fn session_metadata(&self) -> Result<Option<SessionMetadata>> {
        if self.header.session_info_len <= 0 || self.header.session_info_offset <= 0 {
            return Ok(None);
        }

        let span = self
            .source
            .read_range(self.header.session_info_offset as u64, self.header.session_info_len as u64)
            .await?;

        let text = crate::yaml_utils::extract_metadata_text(&span);
        if text.trim().is_empty() {
            debug!("Session metadata span is empty text");
            return Ok(None);
        }

        SessionMetadata::parse(&text).map(Some)
    }

    /// Decode sample records into named-channel value rows.
    pub async fn decode_samples(&self, request: DecodeRequest) -> Result<SampleBatch> {
        decode_samples(
            &self.source,
            &self.header,
            &self.channels,
            self.data_start,
            self.record_count,
            request,
        )
        .await
    }

    /// The underlying byte source.
    pub fn source(&self) -> &S {
        &self.source
    }
}

fn derived_record_count(file_size: u64, data_start: u64, buf_len: i32) -> u64 {
    if buf_len <= 0 {
        return 0;
    }
    file_size.saturating_sub(data_start) / buf_len as u64
}
