//! Typed representations of Type-1, Type-2, Type-4, and Type-14 records,
//! plus a pass-through variant for any other tagged record type encountered
//! on parse (spec §3 abstract Record, §4.2).

mod raw_tagged;
mod type1;
mod type14;
mod type2;
mod type4;

pub use raw_tagged::RawTaggedRecord;
pub use type1::Type1Record;
pub use type14::{QualityEntry, SegmentationEntry, Type14Record};
pub use type2::Type2Record;
pub use type4::Type4Record;

use crate::error::EftResult;
use crate::length::DEFAULT_MAX_ITERS;

/// A single ANSI/NIST-ITL record, in one of the shapes this crate models
/// directly, or passed through verbatim as [`RawTaggedRecord`].
#[derive(Debug, Clone)]
pub enum Record {
    Type1(Type1Record),
    Type2(Type2Record),
    Type4(Type4Record),
    Type14(Type14Record),
    RawTagged(RawTaggedRecord),
}

impl Record {
    pub fn record_type(&self) -> u16 {
        match self {
            Record::Type1(_) => crate::tags::record_type::TYPE1,
            Record::Type2(_) => crate::tags::record_type::TYPE2,
            Record::Type4(_) => crate::tags::record_type::TYPE4,
            Record::Type14(_) => crate::tags::record_type::TYPE14,
            Record::RawTagged(r) => r.record_type,
        }
    }

    pub fn idc(&self) -> u16 {
        match self {
            Record::Type1(_) => 0,
            Record::Type2(r) => r.idc,
            Record::Type4(r) => r.idc,
            Record::Type14(r) => r.idc,
            Record::RawTagged(r) => r.idc,
        }
    }

    /// Serializes this record to its exact on-the-wire bytes, running the
    /// length solver (spec §4.3) with `max_iters` rounds for every tagged
    /// record. Type-4 computes its length directly (spec §4.5).
    pub fn serialize(&self, max_iters: usize) -> EftResult<Vec<u8>> {
        match self {
            Record::Type1(r) => r.serialize(max_iters),
            Record::Type2(r) => r.serialize(max_iters),
            Record::Type4(r) => Ok(r.serialize()),
            Record::Type14(r) => r.serialize(max_iters),
            Record::RawTagged(r) => r.serialize(max_iters),
        }
    }

    /// Convenience wrapper using [`DEFAULT_MAX_ITERS`].
    pub fn serialize_default(&self) -> EftResult<Vec<u8>> {
        self.serialize(DEFAULT_MAX_ITERS)
    }
}
