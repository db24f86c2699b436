use super::Record;
use crate::error::EftResult;
use crate::length::solve_length;
use crate::separators::{serialize_fields, FieldMap, FieldValue, RS, US};
use crate::tags::record_type::TYPE1;

/// Transaction Header (Type-1): one per file, always first.
#[derive(Debug, Clone)]
pub struct Type1Record {
    pub ver: String,
    pub tot: String,
    pub dat: String,
    pub pry: u8,
    pub dai: String,
    pub ori: String,
    pub tcn: String,
    pub nsr: String,
    pub ntr: String,
    children: Vec<Record>,
}

impl Default for Type1Record {
    fn default() -> Self {
        Type1Record {
            ver: "0200".to_string(),
            tot: "FAUF".to_string(),
            dat: String::new(),
            pry: 5,
            dai: "WVIAFIS0Z".to_string(),
            ori: "WVATF0800".to_string(),
            tcn: String::new(),
            nsr: "00.00".to_string(),
            ntr: "00.00".to_string(),
            children: Vec::new(),
        }
    }
}

impl Type1Record {
    pub fn new(dat: impl Into<String>) -> Self {
        Type1Record {
            dat: dat.into(),
            ..Default::default()
        }
    }

    pub fn add_child(&mut self, record: Record) {
        self.children.push(record);
    }

    pub fn set_tcn(&mut self, tcn: impl Into<String>) {
        self.tcn = tcn.into();
    }

    /// Sets `1.011`/`1.012` to reflect an actual native/transmit resolution
    /// rather than the literal `"00.00"` default (REDESIGN FLAG 1, opt-in).
    pub fn set_resolution(&mut self, nsr: impl Into<String>, ntr: impl Into<String>) {
        self.nsr = nsr.into();
        self.ntr = ntr.into();
    }

    /// Builds the `1.003` CNT directory: `1<US>N<RS>t2<US>idc2<RS>...`.
    fn cnt_string(&self) -> String {
        let mut s = format!("1{}{}", US as char, self.children.len());
        for child in &self.children {
            s.push(RS as char);
            s.push_str(&format!(
                "{}{}{:02}",
                child.record_type(),
                US as char,
                child.idc()
            ));
        }
        s
    }

    fn fields_with_len(&self, len: &str) -> FieldMap {
        let mut fields = FieldMap::new();
        fields.insert((TYPE1, 1), FieldValue::text(len));
        fields.insert((TYPE1, 2), FieldValue::text(&self.ver));
        fields.insert((TYPE1, 3), FieldValue::text(self.cnt_string()));
        fields.insert((TYPE1, 4), FieldValue::text(&self.tot));
        fields.insert((TYPE1, 5), FieldValue::text(&self.dat));
        fields.insert((TYPE1, 6), FieldValue::text(self.pry.to_string()));
        fields.insert((TYPE1, 7), FieldValue::text(&self.dai));
        fields.insert((TYPE1, 8), FieldValue::text(&self.ori));
        fields.insert((TYPE1, 9), FieldValue::text(&self.tcn));
        fields.insert((TYPE1, 11), FieldValue::text(&self.nsr));
        fields.insert((TYPE1, 12), FieldValue::text(&self.ntr));
        fields
    }

    /// Emits the Type-1 header followed by every child record's own bytes,
    /// in insertion order (spec §4.4 step 5). `1.001` solves for the
    /// header's own length only, matching `original_source`'s
    /// `Record.write_to_file`, which writes its own `repr()` and then loops
    /// over `self.cnt` writing each child's `repr()` in turn.
    pub fn serialize(&self, max_iters: usize) -> EftResult<Vec<u8>> {
        let (_, mut bytes) = solve_length(TYPE1, 0, max_iters, |len| {
            serialize_fields(&self.fields_with_len(len))
        })?;
        for child in &self.children {
            bytes.extend(child.serialize(max_iters)?);
        }
        Ok(bytes)
    }
}
