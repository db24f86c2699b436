use byteorder::{BigEndian, WriteBytesExt};
use std::io::Write;

/// High-Res Grayscale Fingerprint (Type-4): a fixed 18-byte header followed
/// by raw image bytes. Not a tagged record — no length solver needed, since
/// `LEN` is computed directly as `18 + len(data)` (spec §3, §4.3).
#[derive(Debug, Clone)]
pub struct Type4Record {
    pub idc: u8,
    /// Primary finger position, 1..=14. Determines `imp` (spec §3 table).
    pub fgp: u8,
    /// Image scan resolution; 0 = native.
    pub isr: u8,
    pub hll: u16,
    pub vll: u16,
    /// Compression algorithm: 0=NONE, 1=WSQ, 2=JPEG-baseline, 3=JPEG-lossless, 4=JP2, 5=PNG.
    pub cga: u8,
    pub data: Vec<u8>,
}

impl Type4Record {
    pub fn new(idc: u8, fgp: u8, hll: u16, vll: u16, cga: u8, data: Vec<u8>) -> Self {
        Type4Record {
            idc,
            fgp,
            isr: 0,
            hll,
            vll,
            cga,
            data,
        }
    }

    /// `1` for rolled positions 1..=10, `0` for plain positions 11..=14.
    pub fn imp(&self) -> u8 {
        if (1..=10).contains(&self.fgp) {
            1
        } else {
            0
        }
    }

    pub fn declared_length(&self) -> u32 {
        18 + self.data.len() as u32
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(18 + self.data.len());
        out.write_u32::<BigEndian>(self.declared_length()).unwrap();
        out.write_u8(self.idc).unwrap();
        out.write_u8(self.imp()).unwrap();
        out.write_u8(self.fgp).unwrap();
        out.write_all(&[0xFF; 5]).unwrap();
        out.write_u8(self.isr).unwrap();
        out.write_u16::<BigEndian>(self.hll).unwrap();
        out.write_u16::<BigEndian>(self.vll).unwrap();
        out.write_u8(self.cga).unwrap();
        out.extend_from_slice(&self.data);
        out
    }
}
