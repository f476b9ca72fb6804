//! Synthetic disk telemetry file builder for integration tests.

#![allow(dead_code)]

/// Route decode logging into test output when RUST_LOG asks for it.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt::try_init();
}

const PRIMARY_HEADER_SIZE: usize = 40;
const SUB_HEADER_SPAN: usize = 144;
const DESCRIPTOR_SIZE: usize = 144;

pub struct ChannelSpec {
    pub name: &'static str,
    pub type_code: i32,
    pub offset: i32,
    pub count: i32,
}

/// Assembles a complete disk telemetry file in memory: primary header,
/// optional disk sub-header, channel descriptor table, session metadata
/// text, and fixed-length sample records.
pub struct DiskFileBuilder {
    tick_rate: i32,
    buf_len: i32,
    channels: Vec<ChannelSpec>,
    metadata: Option<String>,
    sub_header: Option<(i32, i32)>,
    records: Vec<Vec<u8>>,
}

impl DiskFileBuilder {
    pub fn new(buf_len: i32) -> Self {
        Self {
            tick_rate: 60,
            buf_len,
            channels: Vec::new(),
            metadata: None,
            sub_header: None,
            records: Vec::new(),
        }
    }

    pub fn tick_rate(mut self, tick_rate: i32) -> Self {
        self.tick_rate = tick_rate;
        self
    }

    pub fn channel(mut self, name: &'static str, type_code: i32, offset: i32) -> Self {
        self.channels.push(ChannelSpec { name, type_code, offset, count: 1 });
        self
    }

    pub fn array_channel(
        mut self,
        name: &'static str,
        type_code: i32,
        offset: i32,
        count: i32,
    ) -> Self {
        self.channels.push(ChannelSpec { name, type_code, offset, count });
        self
    }

    pub fn metadata(mut self, text: &str) -> Self {
        self.metadata = Some(text.to_string());
        self
    }

    /// Include a disk sub-header carrying lap and record counts.
    pub fn sub_header(mut self, lap_count: i32, record_count: i32) -> Self {
        self.sub_header = Some((lap_count, record_count));
        self
    }

    pub fn record(mut self, bytes: Vec<u8>) -> Self {
        assert_eq!(bytes.len(), self.buf_len as usize, "record must match buf_len");
        self.records.push(bytes);
        self
    }

    pub fn build(self) -> Vec<u8> {
        let var_header_offset =
            if self.sub_header.is_some() { SUB_HEADER_SPAN } else { PRIMARY_HEADER_SIZE };
        let table_end = var_header_offset + self.channels.len() * DESCRIPTOR_SIZE;
        let metadata_len = self.metadata.as_ref().map(|m| m.len()).unwrap_or(0);
        let (session_info_offset, session_info_len) = if metadata_len > 0 {
            (table_end as i32, metadata_len as i32)
        } else {
            (0, 0)
        };
        let data_start = table_end + metadata_len;

        let mut data = vec![0u8; data_start];

        // Primary header
        data[0..4].copy_from_slice(&2i32.to_le_bytes());
        data[4..8].copy_from_slice(&1i32.to_le_bytes());
        data[8..12].copy_from_slice(&self.tick_rate.to_le_bytes());
        data[12..16].copy_from_slice(&1i32.to_le_bytes());
        data[16..20].copy_from_slice(&session_info_len.to_le_bytes());
        data[20..24].copy_from_slice(&session_info_offset.to_le_bytes());
        data[24..28].copy_from_slice(&(self.channels.len() as i32).to_le_bytes());
        data[28..32].copy_from_slice(&(var_header_offset as i32).to_le_bytes());
        data[32..36].copy_from_slice(&1i32.to_le_bytes());
        data[36..40].copy_from_slice(&self.buf_len.to_le_bytes());

        if let Some((lap_count, record_count)) = self.sub_header {
            data[112..116].copy_from_slice(&1_700_000_000i32.to_le_bytes());
            data[120..128].copy_from_slice(&0.0f64.to_le_bytes());
            data[128..136].copy_from_slice(&((record_count as f64) / 60.0).to_le_bytes());
            data[136..140].copy_from_slice(&lap_count.to_le_bytes());
            data[140..144].copy_from_slice(&record_count.to_le_bytes());
        }

        for (i, channel) in self.channels.iter().enumerate() {
            let base = var_header_offset + i * DESCRIPTOR_SIZE;
            let record = &mut data[base..base + DESCRIPTOR_SIZE];
            record[0..4].copy_from_slice(&channel.type_code.to_le_bytes());
            record[4..8].copy_from_slice(&channel.offset.to_le_bytes());
            record[8..12].copy_from_slice(&channel.count.to_le_bytes());
            record[16..16 + channel.name.len()].copy_from_slice(channel.name.as_bytes());
        }

        if let Some(metadata) = &self.metadata {
            data[table_end..table_end + metadata.len()].copy_from_slice(metadata.as_bytes());
        }

        for record in &self.records {
            data.extend_from_slice(record);
        }

        data
    }
}

/// Little-endian sample record assembler.
#[derive(Default)]
pub struct RecordBuilder {
    bytes: Vec<u8>,
}

impl RecordBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn i32(mut self, v: i32) -> Self {
        self.bytes.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn u32(mut self, v: u32) -> Self {
        self.bytes.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn f32(mut self, v: f32) -> Self {
        self.bytes.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn f64(mut self, v: f64) -> Self {
        self.bytes.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn bool(mut self, v: bool) -> Self {
        self.bytes.push(v as u8);
        self
    }

    pub fn text(mut self, s: &str, width: usize) -> Self {
        assert!(s.len() <= width);
        self.bytes.extend_from_slice(s.as_bytes());
        self.bytes.extend(std::iter::repeat_n(0u8, width - s.len()));
        self
    }

    pub fn pad_to(mut self, len: usize) -> Self {
        assert!(self.bytes.len() <= len);
        self.bytes.resize(len, 0);
        self
    }

    pub fn build(self) -> Vec<u8> {
        self.bytes
    }
}
