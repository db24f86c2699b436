//! Streaming parser: disambiguates tagged vs binary records and recovers
//! typed [`Record`]s from a byte-exact EFT file (spec §4.5).

pub mod image_magic;

use std::path::{Path, PathBuf};

use crate::error::{EftError, EftResult};
use crate::record::{
    QualityEntry, RawTaggedRecord, Record, SegmentationEntry, Type14Record, Type1Record, Type2Record, Type4Record,
};
use crate::scratch::CancellationToken;
use crate::separators::{FieldMap, FieldValue, FS, GS};
use crate::tags::record_type::{TYPE1, TYPE14, TYPE2, TYPE4};
use crate::tags::{parse_tag, IMAGE_FIELD};

/// Bounded look-ahead window for the tagged-record attempt (spec §4.5 P2).
const TAG_LOOKAHEAD: usize = 50;

/// Tolerance added to "remaining bytes" when validating a Type-4 binary
/// length prefix (spec §4.5 P4).
const BINARY_LENGTH_TOLERANCE: usize = 100;

/// Parses a complete EFT byte stream into its ordered records. Fatal on any
/// malformed record — there is no resynchronization past a parse failure
/// (spec §4.5 P5, §7).
pub fn parse(bytes: &[u8], token: &CancellationToken) -> EftResult<Vec<Record>> {
    let mut records = Vec::new();
    let mut offset = 0usize;

    while offset < bytes.len() {
        token.check()?;
        let (consumed, record) = parse_one(bytes, offset)?;
        if offset == 0 && record.record_type() != TYPE1 {
            return Err(EftError::ParseFailure {
                offset: 0,
                reason: "first record must be Type-1".to_string(),
            });
        }
        if consumed == 0 {
            return Err(EftError::ParseFailure {
                offset,
                reason: "parser made no progress".to_string(),
            });
        }
        records.push(record);
        offset += consumed;
    }

    if records.is_empty() {
        return Err(EftError::ParseFailure {
            offset: 0,
            reason: "empty input".to_string(),
        });
    }

    Ok(records)
}

/// Re-assembles a flat, possibly-edited record list (as produced by
/// [`parse`]) back into byte-exact output, recomputing `1.003` and every
/// `*.001` length field from scratch. The first record must be Type-1; the
/// rest are treated as its children in the given order (spec §3 Lifecycle:
/// "edit = parse -> mutate field map -> re-encode").
pub fn reassemble(records: &[Record], max_iters: usize) -> EftResult<Vec<u8>> {
    let Some(Record::Type1(header)) = records.first() else {
        return Err(EftError::InvalidInput("first record must be Type-1 to reassemble".to_string()));
    };
    let mut t1 = Type1Record::default();
    t1.ver = header.ver.clone();
    t1.tot = header.tot.clone();
    t1.dat = header.dat.clone();
    t1.pry = header.pry;
    t1.dai = header.dai.clone();
    t1.ori = header.ori.clone();
    t1.tcn = header.tcn.clone();
    t1.nsr = header.nsr.clone();
    t1.ntr = header.ntr.clone();

    for record in &records[1..] {
        t1.add_child(record.clone());
    }
    t1.serialize(max_iters)
}

fn parse_one(bytes: &[u8], offset: usize) -> EftResult<(usize, Record)> {
    if offset == 0 && bytes[offset..].starts_with(b"1.001:") {
        return parse_type1_fast_path(bytes, offset);
    }
    match parse_tagged_header_length(bytes, offset) {
        Some(length) => parse_tagged_record(bytes, offset, length),
        None => parse_binary_type4(bytes, offset).map(|(consumed, record)| (consumed, Record::Type4(record))),
    }
}

/// Step P1: when the record at offset 0 declares tag `1.001`, the boundary
/// is the first `FS` regardless of what `1.001`'s digits say.
fn parse_type1_fast_path(bytes: &[u8], offset: usize) -> EftResult<(usize, Record)> {
    let fs_rel = bytes[offset..]
        .iter()
        .position(|&b| b == FS)
        .ok_or_else(|| EftError::ParseFailure {
            offset,
            reason: "Type-1 record has no terminating FS".to_string(),
        })?;
    let record_end = offset + fs_rel + 1;
    let fields = parse_tagged_fields(&bytes[offset..record_end])?;
    let t1 = build_type1(fields)?;
    Ok((record_end - offset, Record::Type1(t1)))
}

/// Step P2: peek a bounded window, looking for `tag:digits` before the
/// first `GS`. Returns the declared record length on success.
fn parse_tagged_header_length(bytes: &[u8], offset: usize) -> Option<usize> {
    let end = (offset + TAG_LOOKAHEAD).min(bytes.len());
    let window = &bytes[offset..end];
    let gs_rel = window.iter().position(|&b| b == GS)?;
    let header = std::str::from_utf8(&window[..gs_rel]).ok()?;
    let (tag_part, digits_part) = header.split_once(':')?;
    if digits_part.is_empty() || !digits_part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    parse_tag(tag_part)?;
    digits_part.parse::<usize>().ok()
}

fn parse_tagged_record(bytes: &[u8], offset: usize, length: usize) -> EftResult<(usize, Record)> {
    if offset + length > bytes.len() {
        return Err(EftError::ParseFailure {
            offset,
            reason: format!("declared length {length} exceeds remaining input"),
        });
    }
    let record_bytes = &bytes[offset..offset + length];
    let fields = parse_tagged_fields(record_bytes)?;
    let record_type = fields
        .first()
        .map(|(key, _)| key.0)
        .ok_or_else(|| EftError::ParseFailure {
            offset,
            reason: "tagged record has no fields".to_string(),
        })?;
    let record = match record_type {
        TYPE1 => Record::Type1(build_type1(fields)?),
        TYPE2 => Record::Type2(build_type2(fields)?),
        TYPE14 => Record::Type14(build_type14(fields)?),
        other => Record::RawTagged(build_raw_tagged(other, fields)),
    };
    Ok((length, record))
}

/// Step P3: walks `tag:value` pairs, honoring field `999`'s "consume to
/// end-of-record" rule so embedded separator bytes inside an image payload
/// never split a field early.
fn parse_tagged_fields(record_bytes: &[u8]) -> EftResult<Vec<((u16, u16), FieldValue)>> {
    let mut fields = Vec::new();
    let mut cursor = 0usize;
    loop {
        let colon_rel = record_bytes[cursor..]
            .iter()
            .position(|&b| b == b':')
            .ok_or_else(|| EftError::ParseFailure {
                offset: cursor,
                reason: "missing ':' in tag".to_string(),
            })?;
        let colon_pos = cursor + colon_rel;
        let tag_str = std::str::from_utf8(&record_bytes[cursor..colon_pos]).map_err(|_| EftError::ParseFailure {
            offset: cursor,
            reason: "tag is not valid UTF-8".to_string(),
        })?;
        let (record_type, field) = parse_tag(tag_str).ok_or_else(|| EftError::ParseFailure {
            offset: cursor,
            reason: format!("malformed tag {tag_str:?}"),
        })?;
        let value_start = colon_pos + 1;

        if field == IMAGE_FIELD {
            if record_bytes.last() != Some(&FS) {
                return Err(EftError::ParseFailure {
                    offset: record_bytes.len(),
                    reason: "record missing terminating FS".to_string(),
                });
            }
            let value_end = record_bytes.len() - 1;
            let value = record_bytes[value_start..value_end].to_vec();
            fields.push(((record_type, field), FieldValue::Bytes(value)));
            return Ok(fields);
        }

        let sep_rel = record_bytes[value_start..]
            .iter()
            .position(|&b| b == GS || b == FS)
            .ok_or_else(|| EftError::ParseFailure {
                offset: value_start,
                reason: "missing field terminator".to_string(),
            })?;
        let sep_pos = value_start + sep_rel;
        let value = String::from_utf8(record_bytes[value_start..sep_pos].to_vec()).map_err(|_| {
            EftError::ParseFailure {
                offset: value_start,
                reason: "field value is not valid UTF-8".to_string(),
            }
        })?;
        fields.push(((record_type, field), FieldValue::text(value)));
        if record_bytes[sep_pos] == FS {
            return Ok(fields);
        }
        cursor = sep_pos + 1;
    }
}

/// Step P4: fallback length-prefixed binary Type-4 framing.
fn parse_binary_type4(bytes: &[u8], offset: usize) -> EftResult<(usize, Type4Record)> {
    if offset + 18 > bytes.len() {
        return Err(EftError::ParseFailure {
            offset,
            reason: "truncated Type-4 header".to_string(),
        });
    }
    let declared_len = u32::from_be_bytes(bytes[offset..offset + 4].try_into().unwrap()) as usize;
    let remaining = bytes.len() - offset;
    if declared_len < 18 || declared_len > remaining + BINARY_LENGTH_TOLERANCE {
        return Err(EftError::ParseFailure {
            offset,
            reason: format!("implausible Type-4 length {declared_len}"),
        });
    }
    let consumed = declared_len.min(remaining);

    let idc = bytes[offset + 4];
    let fgp = bytes[offset + 6];
    let isr = bytes[offset + 12];
    let hll = u16::from_be_bytes(bytes[offset + 13..offset + 15].try_into().unwrap());
    let vll = u16::from_be_bytes(bytes[offset + 15..offset + 17].try_into().unwrap());
    let cga = bytes[offset + 17];
    let data = bytes[offset + 18..offset + consumed].to_vec();

    Ok((
        consumed,
        Type4Record {
            idc,
            fgp,
            isr,
            hll,
            vll,
            cga,
            data,
        },
    ))
}

fn field_text(fields: &[((u16, u16), FieldValue)], field: u16) -> Option<String> {
    fields
        .iter()
        .find(|((_, f), _)| *f == field)
        .and_then(|(_, v)| v.as_text())
        .map(str::to_string)
}

fn parse_or_zero<T: std::str::FromStr>(value: Option<String>) -> T
where
    T: Default,
{
    value.and_then(|v| v.parse().ok()).unwrap_or_default()
}

fn build_type1(fields: Vec<((u16, u16), FieldValue)>) -> EftResult<Type1Record> {
    let mut t1 = Type1Record::default();
    t1.ver = field_text(&fields, 2).unwrap_or_default();
    t1.tot = field_text(&fields, 4).unwrap_or_default();
    t1.dat = field_text(&fields, 5).unwrap_or_default();
    t1.pry = parse_or_zero(field_text(&fields, 6));
    t1.dai = field_text(&fields, 7).unwrap_or_default();
    t1.ori = field_text(&fields, 8).unwrap_or_default();
    t1.tcn = field_text(&fields, 9).unwrap_or_default();
    t1.nsr = field_text(&fields, 11).unwrap_or_else(|| "00.00".to_string());
    t1.ntr = field_text(&fields, 12).unwrap_or_else(|| "00.00".to_string());
    Ok(t1)
}

const TYPE2_KNOWN_FIELDS: &[u16] = &[1, 2, 5, 16, 18, 19, 20, 21, 22, 24, 25, 27, 29, 31, 32, 37, 38, 41, 73, 84];

fn build_type2(fields: Vec<((u16, u16), FieldValue)>) -> EftResult<Type2Record> {
    let idc = parse_or_zero(field_text(&fields, 2));
    let mut t2 = Type2Record::new(idc);
    t2.ssn = field_text(&fields, 16).unwrap_or_default();
    t2.name = field_text(&fields, 18).unwrap_or_default();
    t2.alias = field_text(&fields, 19).unwrap_or_default();
    t2.pob = field_text(&fields, 20).unwrap_or_default();
    t2.ctz = field_text(&fields, 21).unwrap_or_default();
    t2.dob = field_text(&fields, 22).unwrap_or_default();
    t2.sex = field_text(&fields, 24).unwrap_or_default();
    t2.race = field_text(&fields, 25).unwrap_or_default();
    t2.height = field_text(&fields, 27).unwrap_or_default();
    t2.weight = field_text(&fields, 29).unwrap_or_default();
    t2.eye = field_text(&fields, 31).unwrap_or_default();
    t2.hair = field_text(&fields, 32).unwrap_or_default();
    t2.reason = field_text(&fields, 37).unwrap_or_default();
    t2.date_fingerprinted = field_text(&fields, 38).unwrap_or_default();
    t2.residence = field_text(&fields, 41).unwrap_or_default();
    t2.ori = field_text(&fields, 73).unwrap_or_default();
    t2.amp = field_text(&fields, 84).unwrap_or_default();
    for (key, value) in fields {
        if !TYPE2_KNOWN_FIELDS.contains(&key.1) {
            t2.extra_fields.insert(key, value);
        }
    }
    Ok(t2)
}

const TYPE14_KNOWN_FIELDS: &[u16] = &[1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 21, 23, 24, 999];

fn build_type14(fields: Vec<((u16, u16), FieldValue)>) -> EftResult<Type14Record> {
    let idc = parse_or_zero(field_text(&fields, 2));
    let fgp = parse_or_zero(field_text(&fields, 13));
    let mut t14 = Type14Record::new(idc, fgp);
    t14.imp = parse_or_zero(field_text(&fields, 3));
    t14.src = field_text(&fields, 4).unwrap_or_default();
    t14.fcd = field_text(&fields, 5).unwrap_or_default();
    t14.hll = parse_or_zero(field_text(&fields, 6));
    t14.vll = parse_or_zero(field_text(&fields, 7));
    t14.slc = parse_or_zero(field_text(&fields, 8));
    t14.thps = parse_or_zero(field_text(&fields, 9));
    t14.tvps = parse_or_zero(field_text(&fields, 10));
    t14.cga = field_text(&fields, 11).unwrap_or_default();
    t14.bpx = parse_or_zero(field_text(&fields, 12));
    if let Some(text) = field_text(&fields, 21) {
        t14.segmentation = parse_segmentation_entries(&text);
    }
    if let Some(text) = field_text(&fields, 23) {
        t14.quality = parse_quality_entries(&text);
    }
    if let Some((_, FieldValue::Bytes(bytes))) = fields.iter().find(|((_, f), _)| *f == IMAGE_FIELD) {
        t14.image = bytes.clone();
    }
    for (key, value) in fields {
        if !TYPE14_KNOWN_FIELDS.contains(&key.1) {
            t14.extra_fields.insert(key, value);
        }
    }
    Ok(t14)
}

fn build_raw_tagged(record_type: u16, fields: Vec<((u16, u16), FieldValue)>) -> RawTaggedRecord {
    let idc = field_text(&fields, 2).and_then(|v| v.parse().ok()).unwrap_or(0);
    let map: FieldMap = fields.into_iter().collect();
    RawTaggedRecord::new(record_type, idc, map)
}

fn parse_segmentation_entries(text: &str) -> Vec<SegmentationEntry> {
    text.split(crate::separators::RS as char)
        .filter_map(|entry| {
            let mut parts = entry.split(crate::separators::US as char);
            Some(SegmentationEntry {
                finger_position: parts.next()?.parse().ok()?,
                left: parts.next()?.parse().ok()?,
                right: parts.next()?.parse().ok()?,
                top: parts.next()?.parse().ok()?,
                bottom: parts.next()?.parse().ok()?,
            })
        })
        .collect()
}

fn parse_quality_entries(text: &str) -> Vec<QualityEntry> {
    text.split(crate::separators::RS as char)
        .filter_map(|entry| {
            let mut parts = entry.split(crate::separators::US as char);
            Some(QualityEntry {
                finger_position: parts.next()?.parse().ok()?,
                score: parts.next()?.parse().ok()?,
                org_id: parts.next()?.to_string(),
                alg_id: parts.next()?.to_string(),
            })
        })
        .collect()
}

/// Writes each Type-4/Type-14 image payload under `outdir`, naming files
/// `<record_type>_<idc>.<ext>` and choosing the extension from the bytes'
/// own magic number rather than the record's declared CGA (spec §4.5, §6).
pub fn extract_images(records: &[Record], outdir: &Path) -> EftResult<Vec<PathBuf>> {
    std::fs::create_dir_all(outdir)?;
    let mut written = Vec::new();
    for record in records {
        let (record_type, idc, image) = match record {
            Record::Type4(r) => (TYPE4, r.idc as u16, r.data.as_slice()),
            Record::Type14(r) => (TYPE14, r.idc, r.image.as_slice()),
            _ => continue,
        };
        let format = image_magic::sniff(image);
        let path = outdir.join(format!("{record_type}_{idc:02}.{}", format.extension()));
        std::fs::write(&path, image)?;
        written.push(path);
    }
    Ok(written)
}
