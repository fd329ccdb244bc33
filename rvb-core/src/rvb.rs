//! RVB1 raw vertex buffer files.
//!
//! Layout, all little-endian:
//!
//! | Offset | Field | Type |
//! |---|---|---|
//! | 0 | magic `RVB1` | 4 bytes |
//! | 4 | version (1) | u32 |
//! | 8 | vertex count | u32 |
//! | 12 | attribute count (4) | u32 |
//! | 16 | attribute codes | u32 x 4 |
//! | 32 | records | 11 x f32 per vertex |
//!
//! Records are unindexed: every triangle corner is its own record.

use std::io::{Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use nalgebra::{Point2, Point3, Vector3};

use crate::error::{RvbError, RvbResult};

pub const MAGIC: &[u8; 4] = b"RVB1";
pub const VERSION: u32 = 1;
pub const HEADER_SIZE: usize = 16 + 4 * LAYOUT.len();
pub const FLOATS_PER_RECORD: usize = 11;
pub const RECORD_SIZE: usize = FLOATS_PER_RECORD * 4;

/// Attribute descriptor codes.
///
/// The high nibble selects the component class and the low bits the
/// semantic (1 position, 2 normal, 3 uv, 4 color).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum Attribute {
    Position2 = 0x01,
    Normal2 = 0x02,
    Uv2 = 0x03,
    Color3 = 0x04,
    Position3 = 0x11,
    Normal3 = 0x12,
    Uv4 = 0x13,
    Color4 = 0x14,
}

impl Attribute {
    pub fn code(self) -> u32 {
        self as u32
    }

    pub fn from_code(code: u32) -> Option<Self> {
        Some(match code {
            0x01 => Attribute::Position2,
            0x02 => Attribute::Normal2,
            0x03 => Attribute::Uv2,
            0x04 => Attribute::Color3,
            0x11 => Attribute::Position3,
            0x12 => Attribute::Normal3,
            0x13 => Attribute::Uv4,
            0x14 => Attribute::Color4,
            _ => return None,
        })
    }

    pub fn components(self) -> usize {
        match self {
            Attribute::Position2 | Attribute::Normal2 | Attribute::Uv2 => 2,
            Attribute::Color3 | Attribute::Position3 | Attribute::Normal3 => 3,
            Attribute::Uv4 | Attribute::Color4 => 4,
        }
    }
}

/// The attribute layout of every record this crate writes
pub const LAYOUT: [Attribute; 4] = [
    Attribute::Position3,
    Attribute::Normal3,
    Attribute::Uv2,
    Attribute::Color3,
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub version: u32,
    pub vertex_count: u32,
    pub attributes: Vec<Attribute>,
}

impl Header {
    pub fn new(vertex_count: u32) -> Self {
        Self {
            version: VERSION,
            vertex_count,
            attributes: LAYOUT.to_vec(),
        }
    }

    pub fn floats_per_record(&self) -> usize {
        self.attributes.iter().map(|a| a.components()).sum()
    }
}

/// One exported triangle corner
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VertexRecord {
    pub position: Point3<f32>,
    pub normal: Vector3<f32>,
    pub uv: Point2<f32>,
    pub color: [f32; 3],
}

impl VertexRecord {
    pub const WHITE: [f32; 3] = [1.0, 1.0, 1.0];

    pub fn to_floats(&self) -> [f32; FLOATS_PER_RECORD] {
        [
            self.position.x,
            self.position.y,
            self.position.z,
            self.normal.x,
            self.normal.y,
            self.normal.z,
            self.uv.x,
            self.uv.y,
            self.color[0],
            self.color[1],
            self.color[2],
        ]
    }

    pub fn from_floats(f: &[f32; FLOATS_PER_RECORD]) -> Self {
        Self {
            position: Point3::new(f[0], f[1], f[2]),
            normal: Vector3::new(f[3], f[4], f[5]),
            uv: Point2::new(f[6], f[7]),
            color: [f[8], f[9], f[10]],
        }
    }
}

/// Streams RVB1 data into `W`.
///
/// The vertex count is declared up front; [`RvbWriter::finish`] checks that
/// exactly that many records were written.
pub struct RvbWriter<W: Write> {
    w: W,
    declared: u32,
    written: u64,
}

impl<W: Write> RvbWriter<W> {
    /// Write the header for `vertex_count` records.
    pub fn new(mut w: W, vertex_count: u32) -> RvbResult<Self> {
        w.write_all(MAGIC)?;
        w.write_u32::<LittleEndian>(VERSION)?;
        w.write_u32::<LittleEndian>(vertex_count)?;
        w.write_u32::<LittleEndian>(LAYOUT.len() as u32)?;
        for attribute in LAYOUT {
            w.write_u32::<LittleEndian>(attribute.code())?;
        }
        Ok(Self {
            w,
            declared: vertex_count,
            written: 0,
        })
    }

    pub fn write_record(&mut self, record: &VertexRecord) -> RvbResult<()> {
        for value in record.to_floats() {
            self.w.write_f32::<LittleEndian>(value)?;
        }
        self.written += 1;
        Ok(())
    }

    pub fn written(&self) -> u64 {
        self.written
    }

    /// Flush and hand back the inner writer.
    pub fn finish(mut self) -> RvbResult<W> {
        if self.written != u64::from(self.declared) {
            return Err(RvbError::InconsistentState {
                declared: self.declared,
                written: self.written,
            });
        }
        self.w.flush()?;
        Ok(self.w)
    }
}

/// Reads RVB1 data written in the fixed layout.
pub struct RvbReader<R: Read> {
    r: R,
    header: Header,
    count: u32,
}

impl<R: Read> RvbReader<R> {
    pub fn new(mut r: R) -> RvbResult<Self> {
        let mut magic = [0u8; 4];
        r.read_exact(&mut magic).map_err(RvbError::from_read)?;
        if &magic != MAGIC {
            return Err(RvbError::BadMagic(magic));
        }

        let version = r.read_u32::<LittleEndian>().map_err(RvbError::from_read)?;
        if version != VERSION {
            return Err(RvbError::UnsupportedVersion(version));
        }
        let vertex_count = r.read_u32::<LittleEndian>().map_err(RvbError::from_read)?;
        let attrib_count = r.read_u32::<LittleEndian>().map_err(RvbError::from_read)?;

        let mut codes = Vec::with_capacity(LAYOUT.len());
        for _ in 0..attrib_count {
            codes.push(r.read_u32::<LittleEndian>().map_err(RvbError::from_read)?);
            if codes.len() > LAYOUT.len() {
                return Err(RvbError::UnexpectedLayout(codes));
            }
        }
        let attributes = codes
            .iter()
            .map(|&code| Attribute::from_code(code).ok_or(RvbError::UnknownAttribute(code)))
            .collect::<RvbResult<Vec<_>>>()?;
        if attributes != LAYOUT {
            return Err(RvbError::UnexpectedLayout(codes));
        }

        Ok(Self {
            r,
            header: Header {
                version,
                vertex_count,
                attributes,
            },
            count: 0,
        })
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Next record, or `None` once `vertex_count` records have been read.
    pub fn read_record(&mut self) -> RvbResult<Option<VertexRecord>> {
        if self.count >= self.header.vertex_count {
            return Ok(None);
        }
        let mut floats = [0.0f32; FLOATS_PER_RECORD];
        self.r
            .read_f32_into::<LittleEndian>(&mut floats)
            .map_err(RvbError::from_read)?;
        self.count += 1;
        Ok(Some(VertexRecord::from_floats(&floats)))
    }

    pub fn read_all(mut self) -> RvbResult<(Header, Vec<VertexRecord>)> {
        // capped, the header count is unverified until the records are read
        let mut records = Vec::with_capacity((self.header.vertex_count as usize).min(1 << 16));
        while let Some(record) = self.read_record()? {
            records.push(record);
        }
        Ok((self.header, records))
    }
}

impl<R: Read> Iterator for RvbReader<R> {
    type Item = RvbResult<VertexRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_record().transpose()
    }
}

/// Read a whole RVB1 file from disk.
pub fn read_file<P: AsRef<std::path::Path>>(path: P) -> RvbResult<(Header, Vec<VertexRecord>)> {
    let f = std::fs::File::open(&path).map_err(|e| RvbError::IoPath {
        source: e,
        path: path.as_ref().display().to_string(),
    })?;
    RvbReader::new(std::io::BufReader::new(f))?.read_all()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(i: f32) -> VertexRecord {
        VertexRecord {
            position: Point3::new(i, i + 1.0, i + 2.0),
            normal: Vector3::new(0.0, 0.0, 1.0),
            uv: Point2::new(0.5, i),
            color: VertexRecord::WHITE,
        }
    }

    #[test]
    fn test_header_bytes() {
        let buf = RvbWriter::new(Vec::new(), 0).unwrap().finish().unwrap();
        assert_eq!(buf.len(), HEADER_SIZE);
        assert_eq!(&buf[0..4], b"RVB1");
        assert_eq!(u32::from_le_bytes(buf[4..8].try_into().unwrap()), 1);
        assert_eq!(u32::from_le_bytes(buf[8..12].try_into().unwrap()), 0);
        assert_eq!(u32::from_le_bytes(buf[12..16].try_into().unwrap()), 4);
        let codes: Vec<u32> = buf[16..32]
            .chunks_exact(4)
            .map(|c| u32::from_le_bytes(c.try_into().unwrap()))
            .collect();
        assert_eq!(codes, vec![0x11, 0x12, 0x03, 0x04]);
    }

    #[test]
    fn test_record_layout() {
        let mut writer = RvbWriter::new(Vec::new(), 1).unwrap();
        writer.write_record(&record(3.0)).unwrap();
        let buf = writer.finish().unwrap();
        assert_eq!(buf.len(), HEADER_SIZE + RECORD_SIZE);

        let floats: Vec<f32> = buf[HEADER_SIZE..]
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes(c.try_into().unwrap()))
            .collect();
        assert_eq!(
            floats,
            vec![3.0, 4.0, 5.0, 0.0, 0.0, 1.0, 0.5, 3.0, 1.0, 1.0, 1.0]
        );
    }

    #[test]
    fn test_layout_is_eleven_floats() {
        assert_eq!(Header::new(0).floats_per_record(), FLOATS_PER_RECORD);
    }

    #[test]
    fn test_finish_rejects_short_write() {
        let mut writer = RvbWriter::new(Vec::new(), 3).unwrap();
        writer.write_record(&record(0.0)).unwrap();
        assert!(matches!(
            writer.finish(),
            Err(RvbError::InconsistentState {
                declared: 3,
                written: 1
            })
        ));
    }

    #[test]
    fn test_read_back() {
        let mut writer = RvbWriter::new(Vec::new(), 2).unwrap();
        writer.write_record(&record(0.0)).unwrap();
        writer.write_record(&record(1.0)).unwrap();
        let buf = writer.finish().unwrap();

        let (header, records) = RvbReader::new(&buf[..]).unwrap().read_all().unwrap();
        assert_eq!(header, Header::new(2));
        assert_eq!(records, vec![record(0.0), record(1.0)]);
    }

    #[test]
    fn test_bad_magic() {
        let mut buf = RvbWriter::new(Vec::new(), 0).unwrap().finish().unwrap();
        buf[3] = b'2';
        assert!(matches!(
            RvbReader::new(&buf[..]),
            Err(RvbError::BadMagic(m)) if &m == b"RVB2"
        ));
    }

    #[test]
    fn test_unsupported_version() {
        let mut buf = RvbWriter::new(Vec::new(), 0).unwrap().finish().unwrap();
        buf[4..8].copy_from_slice(&2u32.to_le_bytes());
        assert!(matches!(
            RvbReader::new(&buf[..]),
            Err(RvbError::UnsupportedVersion(2))
        ));
    }

    #[test]
    fn test_unknown_attribute() {
        let mut buf = RvbWriter::new(Vec::new(), 0).unwrap().finish().unwrap();
        buf[20..24].copy_from_slice(&0x99u32.to_le_bytes());
        assert!(matches!(
            RvbReader::new(&buf[..]),
            Err(RvbError::UnknownAttribute(0x99))
        ));
    }

    #[test]
    fn test_other_layout_rejected() {
        let mut buf = RvbWriter::new(Vec::new(), 0).unwrap().finish().unwrap();
        buf[24..28].copy_from_slice(&Attribute::Uv4.code().to_le_bytes());
        assert!(matches!(
            RvbReader::new(&buf[..]),
            Err(RvbError::UnexpectedLayout(_))
        ));
    }

    #[test]
    fn test_truncated_records() {
        let mut writer = RvbWriter::new(Vec::new(), 1).unwrap();
        writer.write_record(&record(0.0)).unwrap();
        let buf = writer.finish().unwrap();
        let mut reader = RvbReader::new(&buf[..buf.len() - 4]).unwrap();
        assert!(matches!(
            reader.read_record(),
            Err(RvbError::PrematureFileEnd)
        ));
    }

    #[test]
    fn test_huge_vertex_count_without_records() {
        let mut buf = RvbWriter::new(Vec::new(), 0).unwrap().finish().unwrap();
        buf[8..12].copy_from_slice(&u32::MAX.to_le_bytes());
        let reader = RvbReader::new(&buf[..]).unwrap();
        assert_eq!(reader.header().vertex_count, u32::MAX);
        assert!(matches!(reader.read_all(), Err(RvbError::PrematureFileEnd)));
    }

    #[test]
    fn test_truncated_header() {
        assert!(matches!(
            RvbReader::new(&b"RVB1\x01\x00"[..]),
            Err(RvbError::PrematureFileEnd)
        ));
    }
}
