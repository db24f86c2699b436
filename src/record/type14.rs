use crate::error::EftResult;
use crate::length::solve_length;
use crate::separators::{serialize_fields, FieldMap, FieldValue, RS, US};
use crate::tags::record_type::TYPE14;

/// One finger's bounding box within a slap image (`14.021`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentationEntry {
    pub finger_position: u16,
    pub left: u32,
    pub right: u32,
    pub top: u32,
    pub bottom: u32,
}

impl SegmentationEntry {
    fn format(&self) -> String {
        format!(
            "{}{sep}{}{sep}{}{sep}{}{sep}{}",
            self.finger_position,
            self.left,
            self.right,
            self.top,
            self.bottom,
            sep = US as char
        )
    }
}

/// One finger's NFIQ quality score (`14.023`/`14.024`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualityEntry {
    pub finger_position: u16,
    /// 1 (best) .. 5 (worst), or 255 on scoring failure.
    pub score: u8,
    pub org_id: String,
    pub alg_id: String,
}

impl QualityEntry {
    fn format(&self) -> String {
        format!(
            "{}{sep}{}{sep}{}{sep}{}",
            self.finger_position,
            self.score,
            self.org_id,
            self.alg_id,
            sep = US as char
        )
    }
}

fn join_entries<T>(entries: &[T], format: impl Fn(&T) -> String) -> String {
    entries
        .iter()
        .map(format)
        .collect::<Vec<_>>()
        .join(&(RS as char).to_string())
}

/// Variable-Res Fingerprint (Type-14): tagged record with an image blob
/// under `14.999`.
#[derive(Debug, Clone)]
pub struct Type14Record {
    pub idc: u16,
    /// Impression type (1 = rolled, 0 = plain).
    pub imp: u8,
    pub src: String,
    /// Fingerprint capture date, `YYYYMMDD`.
    pub fcd: String,
    pub hll: u16,
    pub vll: u16,
    /// Scale units (1 = pixels per inch, 2 = pixels per cm).
    pub slc: u8,
    pub thps: u16,
    pub tvps: u16,
    /// Compression algorithm, as text (e.g. `"WSQ20"`, `"JP2"`, `"NONE"`).
    pub cga: String,
    pub bpx: u8,
    pub fgp: u16,
    pub segmentation: Vec<SegmentationEntry>,
    pub quality: Vec<QualityEntry>,
    pub image: Vec<u8>,
    /// Unknown-but-preserved tagged fields encountered on parse.
    pub extra_fields: FieldMap,
}

impl Type14Record {
    pub fn new(idc: u16, fgp: u16) -> Self {
        Type14Record {
            idc,
            imp: if (1..=10).contains(&fgp) { 1 } else { 0 },
            src: String::new(),
            fcd: String::new(),
            hll: 0,
            vll: 0,
            slc: 1,
            thps: 0,
            tvps: 0,
            cga: "NONE".to_string(),
            bpx: 8,
            fgp,
            segmentation: Vec::new(),
            quality: Vec::new(),
            image: Vec::new(),
            extra_fields: FieldMap::new(),
        }
    }

    fn fields_with_len(&self, len: &str) -> FieldMap {
        let mut fields = FieldMap::new();
        fields.insert((TYPE14, 1), FieldValue::text(len));
        fields.insert((TYPE14, 2), FieldValue::text(format!("{:02}", self.idc)));
        fields.insert((TYPE14, 3), FieldValue::text(self.imp.to_string()));
        fields.insert((TYPE14, 4), FieldValue::text(&self.src));
        fields.insert((TYPE14, 5), FieldValue::text(&self.fcd));
        fields.insert((TYPE14, 6), FieldValue::text(self.hll.to_string()));
        fields.insert((TYPE14, 7), FieldValue::text(self.vll.to_string()));
        fields.insert((TYPE14, 8), FieldValue::text(self.slc.to_string()));
        fields.insert((TYPE14, 9), FieldValue::text(self.thps.to_string()));
        fields.insert((TYPE14, 10), FieldValue::text(self.tvps.to_string()));
        fields.insert((TYPE14, 11), FieldValue::text(&self.cga));
        fields.insert((TYPE14, 12), FieldValue::text(self.bpx.to_string()));
        fields.insert((TYPE14, 13), FieldValue::text(self.fgp.to_string()));
        if !self.segmentation.is_empty() {
            fields.insert(
                (TYPE14, 21),
                FieldValue::text(join_entries(&self.segmentation, SegmentationEntry::format)),
            );
        }
        if !self.quality.is_empty() {
            let quality_str = join_entries(&self.quality, QualityEntry::format);
            fields.insert((TYPE14, 23), FieldValue::text(quality_str.clone()));
            fields.insert((TYPE14, 24), FieldValue::text(quality_str));
        }
        for (key, value) in &self.extra_fields {
            fields.insert(*key, value.clone());
        }
        fields.insert((TYPE14, 999), FieldValue::Bytes(self.image.clone()));
        fields
    }

    pub fn serialize(&self, max_iters: usize) -> EftResult<Vec<u8>> {
        let (_, bytes) = solve_length(TYPE14, self.idc, max_iters, |len| {
            serialize_fields(&self.fields_with_len(len))
        })?;
        Ok(bytes)
    }
}
