//! Builder for small GRF fixture archives.
#![allow(dead_code)]

use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::Compression;

pub const HEADER_SIZE: usize = 46;
pub const MAGIC: &[u8; 15] = b"Master of Magic";

/// Filler written into alignment padding so reads that overrun a payload
/// would pick up visible garbage.
const PADDING_FILLER: u8 = 0xAA;

pub fn zlib(data: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

struct FixtureEntry {
    name: Vec<u8>,
    flags: u8,
    /// Bytes written to the payload slot; `None` for an empty slot
    stored: Option<Vec<u8>>,
    uncompressed_size: u32,
}

/// Payload region and uncompressed entry table of a fixture archive.
pub struct Layout {
    pub payload: Vec<u8>,
    pub table: Vec<u8>,
    pub record_count: u32,
}

pub struct GrfBuilder {
    entries: Vec<FixtureEntry>,
    seed: u32,
    version: u32,
}

impl GrfBuilder {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            seed: 0,
            version: 0x200,
        }
    }

    /// The 4-entry archive used by the round-trip scenario.
    pub fn sample() -> Self {
        Self::new()
            .file(br"data\test.txt", b"Hello, GRF!")
            .file(br"data\sprite\npc\novice.spr", &sprite_bytes())
            .file(br"data\texture\Sample.BMP", &[0x42, 0x4D, 0, 0, 0, 0])
            .file(b"data\\\xc0\xaf\xc0\xfa\xc0\xce\xc5\xcd\xc6\xe4\xc0\xcc\xbd\xba.txt", b"legacy")
    }

    pub fn file(self, name: &[u8], data: &[u8]) -> Self {
        self.entry(name, 0x01, Some(zlib(data)), data.len() as u32)
    }

    pub fn directory(self, name: &[u8]) -> Self {
        self.entry(name, 0x00, None, 0)
    }

    /// A file record whose slot is empty (compressed and uncompressed size 0).
    pub fn empty_file(self, name: &[u8]) -> Self {
        self.entry(name, 0x01, None, 0)
    }

    /// A file record with arbitrary stored bytes and declared size.
    pub fn raw_file(self, name: &[u8], flags: u8, stored: Vec<u8>, uncompressed_size: u32) -> Self {
        self.entry(name, flags, Some(stored), uncompressed_size)
    }

    pub fn seed(mut self, seed: u32) -> Self {
        self.seed = seed;
        self
    }

    pub fn version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    fn entry(mut self, name: &[u8], flags: u8, stored: Option<Vec<u8>>, size: u32) -> Self {
        self.entries.push(FixtureEntry {
            name: name.to_vec(),
            flags,
            stored,
            uncompressed_size: size,
        });
        self
    }

    pub fn layout(&self) -> Layout {
        let mut payload = Vec::new();
        let mut table = Vec::new();

        for entry in &self.entries {
            let (offset, compressed, aligned) = match &entry.stored {
                Some(stored) => {
                    let offset = payload.len() as u32;
                    let aligned = (stored.len() + 7) & !7;
                    payload.extend_from_slice(stored);
                    payload.resize(offset as usize + aligned, PADDING_FILLER);
                    (offset, stored.len() as u32, aligned as u32)
                }
                None => (0, 0, 0),
            };

            table.extend_from_slice(&entry.name);
            table.push(0);
            table.extend_from_slice(&compressed.to_le_bytes());
            table.extend_from_slice(&aligned.to_le_bytes());
            table.extend_from_slice(&entry.uncompressed_size.to_le_bytes());
            table.push(entry.flags);
            table.extend_from_slice(&offset.to_le_bytes());
        }

        Layout {
            payload,
            table,
            record_count: self.entries.len() as u32,
        }
    }

    pub fn build(&self) -> Vec<u8> {
        let layout = self.layout();
        let compressed = zlib(&layout.table);
        self.assemble(
            &layout,
            &compressed,
            layout.table.len() as u32,
            layout.record_count,
        )
    }

    /// Write header, payload and table block with explicit table fields.
    pub fn assemble(
        &self,
        layout: &Layout,
        compressed_table: &[u8],
        uncompressed_table_size: u32,
        record_count: u32,
    ) -> Vec<u8> {
        let mut out = Vec::new();

        out.extend_from_slice(MAGIC);
        out.extend_from_slice(&[0u8; 15]);
        out.extend_from_slice(&(layout.payload.len() as u32).to_le_bytes());
        out.extend_from_slice(&self.seed.to_le_bytes());
        out.extend_from_slice(&(record_count + self.seed + 7).to_le_bytes());
        out.extend_from_slice(&self.version.to_le_bytes());
        assert_eq!(out.len(), HEADER_SIZE);

        out.extend_from_slice(&layout.payload);
        out.extend_from_slice(&(compressed_table.len() as u32).to_le_bytes());
        out.extend_from_slice(&uncompressed_table_size.to_le_bytes());
        out.extend_from_slice(compressed_table);

        out
    }
}

/// Something sprite-sized with enough repetition to compress.
pub fn sprite_bytes() -> Vec<u8> {
    let mut data = b"SP\x01\x02".to_vec();
    data.extend((0..2048u32).map(|i| (i % 7) as u8));
    data
}
