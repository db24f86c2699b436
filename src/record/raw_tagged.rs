use crate::error::EftResult;
use crate::length::solve_length;
use crate::separators::{serialize_fields, FieldMap, FieldValue};

/// A tagged record of a type this crate doesn't model directly (`7`, `8`,
/// `9`, `10`, `13`, `15`, `16`, `17`, ...). Preserves every field exactly as
/// parsed, including `001`, so it round-trips byte-for-byte.
#[derive(Debug, Clone)]
pub struct RawTaggedRecord {
    pub record_type: u16,
    pub idc: u16,
    pub fields: FieldMap,
}

impl RawTaggedRecord {
    pub fn new(record_type: u16, idc: u16, fields: FieldMap) -> Self {
        RawTaggedRecord {
            record_type,
            idc,
            fields,
        }
    }

    /// Re-solves `001` rather than trusting the parsed value, so edits made
    /// to `fields` after parsing (via the decoder/editor path) still produce
    /// an internally consistent record.
    pub fn serialize(&self, max_iters: usize) -> EftResult<Vec<u8>> {
        let (_, bytes) = solve_length(self.record_type, self.idc, max_iters, |len| {
            let mut fields = self.fields.clone();
            fields.insert((self.record_type, crate::tags::LEN_FIELD), FieldValue::text(len));
            serialize_fields(&fields)
        })?;
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_unmodeled_fields_verbatim() {
        let mut fields = FieldMap::new();
        fields.insert((7, 2), FieldValue::text("00"));
        fields.insert((7, 3), FieldValue::text("some latent data"));
        let rec = RawTaggedRecord::new(7, 0, fields);
        let bytes = rec.serialize(5).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.contains("7.002:00"));
        assert!(text.contains("7.003:some latent data"));
    }

    #[test]
    fn length_field_is_recomputed_not_trusted() {
        let mut fields = FieldMap::new();
        fields.insert((9, 1), FieldValue::text("999"));
        fields.insert((9, 2), FieldValue::text("00"));
        let rec = RawTaggedRecord::new(9, 0, fields);
        let bytes = rec.serialize(5).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let len_field = text.split('\x1d').next().unwrap();
        let declared: usize = len_field.trim_start_matches("9.001:").parse().unwrap();
        assert_eq!(declared, text.len());
    }
}
