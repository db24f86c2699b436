use crate::error::EftResult;
use crate::length::solve_length;
use crate::separators::{serialize_fields, FieldMap, FieldValue};
use crate::tags::record_type::TYPE2;

/// Descriptive Text (Type-2): exactly one per file, biographic fields keyed
/// by tag. Canonical subset per spec §3; anything else round-trips through
/// `extra_fields` unchanged.
#[derive(Debug, Clone, Default)]
pub struct Type2Record {
    pub idc: u16,
    pub ssn: String,
    pub name: String,
    pub alias: String,
    pub pob: String,
    pub ctz: String,
    pub dob: String,
    pub sex: String,
    pub race: String,
    pub height: String,
    pub weight: String,
    pub eye: String,
    pub hair: String,
    pub reason: String,
    pub date_fingerprinted: String,
    pub residence: String,
    pub ori: String,
    pub amp: String,
    /// Unknown-but-preserved tagged fields encountered on parse, keyed by
    /// `(2, field)`. Never contains a key this struct already models.
    pub extra_fields: FieldMap,
}

impl Type2Record {
    pub fn new(idc: u16) -> Self {
        Type2Record {
            idc,
            ..Default::default()
        }
    }

    fn fields_with_len(&self, len: &str) -> FieldMap {
        let mut fields = FieldMap::new();
        fields.insert((TYPE2, 1), FieldValue::text(len));
        fields.insert((TYPE2, 2), FieldValue::text(format!("{:02}", self.idc)));
        fields.insert((TYPE2, 5), FieldValue::text("N"));
        insert_if_present(&mut fields, 16, &self.ssn);
        insert_if_present(&mut fields, 18, &self.name);
        insert_if_present(&mut fields, 19, &self.alias);
        insert_if_present(&mut fields, 20, &self.pob);
        insert_if_present(&mut fields, 21, &self.ctz);
        insert_if_present(&mut fields, 22, &self.dob);
        insert_if_present(&mut fields, 24, &self.sex);
        insert_if_present(&mut fields, 25, &self.race);
        insert_if_present(&mut fields, 27, &self.height);
        insert_if_present(&mut fields, 29, &self.weight);
        insert_if_present(&mut fields, 31, &self.eye);
        insert_if_present(&mut fields, 32, &self.hair);
        insert_if_present(&mut fields, 37, &self.reason);
        insert_if_present(&mut fields, 38, &self.date_fingerprinted);
        insert_if_present(&mut fields, 41, &self.residence);
        insert_if_present(&mut fields, 73, &self.ori);
        insert_if_present(&mut fields, 84, &self.amp);
        for (key, value) in &self.extra_fields {
            fields.insert(*key, value.clone());
        }
        fields
    }

    pub fn serialize(&self, max_iters: usize) -> EftResult<Vec<u8>> {
        let (_, bytes) = solve_length(TYPE2, self.idc, max_iters, |len| {
            serialize_fields(&self.fields_with_len(len))
        })?;
        Ok(bytes)
    }
}

fn insert_if_present(fields: &mut FieldMap, field: u16, value: &str) {
    if !value.is_empty() {
        fields.insert((TYPE2, field), FieldValue::text(value));
    }
}
