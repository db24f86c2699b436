//! Magic-byte sniffing for image payloads (spec §4.5 "Image-type
//! disambiguation"). The declared CGA is a hint; the bytes are the truth.

/// Image codec identified from the leading bytes of a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Wsq,
    Jpeg,
    Jp2,
    Png,
    Unknown,
}

impl ImageFormat {
    /// File extension `extract_images` should use for this format,
    /// regardless of what the record's own CGA field declared.
    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Wsq => "wsq",
            ImageFormat::Jpeg => "jpg",
            ImageFormat::Jp2 => "jp2",
            ImageFormat::Png => "png",
            ImageFormat::Unknown => "bin",
        }
    }
}

/// Identifies the image format from its leading bytes. Disagreement with a
/// record's declared CGA is resolved in the magic bytes' favor (spec §4.5);
/// this function only inspects bytes, leaving the caller to decide whether
/// to surface the mismatch.
pub fn sniff(bytes: &[u8]) -> ImageFormat {
    if bytes.starts_with(&[0xFF, 0xA0]) {
        return ImageFormat::Wsq;
    }
    if bytes.starts_with(&[0xFF, 0xD8]) {
        return ImageFormat::Jpeg;
    }
    if bytes.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
        return ImageFormat::Png;
    }
    if bytes.starts_with(&[0x00, 0x00, 0x00, 0x0C]) || bytes.get(4..8) == Some(b"jP  ".as_slice()) {
        return ImageFormat::Jp2;
    }
    ImageFormat::Unknown
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_wsq() {
        assert_eq!(sniff(&[0xFF, 0xA0, 0x00, 0x00]), ImageFormat::Wsq);
    }

    #[test]
    fn recognizes_jpeg() {
        assert_eq!(sniff(&[0xFF, 0xD8, 0xFF, 0xE0]), ImageFormat::Jpeg);
    }

    #[test]
    fn recognizes_jp2_via_box_header() {
        assert_eq!(sniff(&[0x00, 0x00, 0x00, 0x0C, b'j', b'P', b' ', b' ']), ImageFormat::Jp2);
    }

    #[test]
    fn recognizes_png() {
        let png_magic = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
        assert_eq!(sniff(&png_magic), ImageFormat::Png);
    }

    #[test]
    fn unknown_bytes_fall_back() {
        assert_eq!(sniff(&[0x01, 0x02, 0x03]), ImageFormat::Unknown);
    }

    #[test]
    fn magic_wins_over_declared_cga() {
        // A payload declared as JP2 (elsewhere, in the record's own field)
        // but whose bytes are actually WSQ: sniff must report WSQ.
        let wsq_bytes_mislabeled_as_jp2 = [0xFF, 0xA0, 0x12, 0x34];
        assert_eq!(sniff(&wsq_bytes_mislabeled_as_jp2), ImageFormat::Wsq);
        assert_eq!(sniff(&wsq_bytes_mislabeled_as_jp2).extension(), "wsq");
    }
}
