//! Assembles a complete EFT transaction from biographic input and image
//! assets (spec §4.4).

pub mod biographic;

use std::collections::BTreeMap;

use crate::codec::CodecAdapter;
use crate::config::{Config, Mode};
use crate::error::{EftError, EftResult};
use crate::orchestrator::Rung;
use crate::record::{Record, Type1Record, Type2Record, Type4Record, Type14Record};
use crate::separators::FieldValue;
use crate::tags::record_type::TYPE2;

/// Raw Type-2 biographic input, keyed by field number under record type 2
/// (e.g. `18` for Name). Unknown field numbers round-trip into the Type-2
/// record's `extra_fields` unchanged (spec §6).
#[derive(Debug, Clone, Default)]
pub struct BiographicInput(pub BTreeMap<u16, String>);

impl BiographicInput {
    pub fn new() -> Self {
        BiographicInput(BTreeMap::new())
    }

    pub fn set(&mut self, field: u16, value: impl Into<String>) -> &mut Self {
        self.0.insert(field, value.into());
        self
    }

    fn get(&self, field: u16) -> &str {
        self.0.get(&field).map(String::as_str).unwrap_or("")
    }
}

const SSN: u16 = 16;
const NAME: u16 = 18;
const ALIAS: u16 = 19;
const POB: u16 = 20;
const CTZ: u16 = 21;
const DOB: u16 = 22;
const SEX: u16 = 24;
const RACE: u16 = 25;
const HEIGHT: u16 = 27;
const WEIGHT: u16 = 29;
const EYE: u16 = 31;
const HAIR: u16 = 32;
const REASON: u16 = 37;
const DATE_FINGERPRINTED: u16 = 38;
const RESIDENCE: u16 = 41;
const ORI: u16 = 73;
const AMP: u16 = 84;

const KNOWN_FIELDS: &[u16] = &[
    SSN, NAME, ALIAS, POB, CTZ, DOB, SEX, RACE, HEIGHT, WEIGHT, EYE, HAIR, REASON,
    DATE_FINGERPRINTED, RESIDENCE, ORI, AMP,
];

/// Normalises raw biographic input into a [`Type2Record`] (spec §3 Type-2
/// semantic rules). Rejects an empty Name with `InvalidInput` (spec §8).
pub fn normalize_biographic(input: &BiographicInput, bypass_ssn: bool) -> EftResult<Type2Record> {
    let formatted_name = biographic::format_name(input.get(NAME));
    if formatted_name.is_empty() {
        return Err(EftError::InvalidInput("Type-2 Name must not be empty".to_string()));
    }

    let mut t2 = Type2Record::new(0);
    t2.name = formatted_name;
    t2.ssn = biographic::normalize_ssn(input.get(SSN), bypass_ssn);
    t2.alias = input.get(ALIAS).to_string();
    t2.pob = input.get(POB).to_string();
    t2.ctz = input.get(CTZ).to_string();
    t2.dob = biographic::normalize_dob(input.get(DOB));
    t2.sex = input.get(SEX).to_string();
    t2.race = input.get(RACE).to_string();
    t2.height = biographic::normalize_height(input.get(HEIGHT));
    t2.weight = biographic::normalize_weight(input.get(WEIGHT));
    t2.eye = input.get(EYE).to_string();
    t2.hair = input.get(HAIR).to_string();
    t2.reason = input.get(REASON).to_string();
    t2.date_fingerprinted = input.get(DATE_FINGERPRINTED).to_string();
    t2.residence = input.get(RESIDENCE).to_string();
    t2.ori = input.get(ORI).to_string();
    t2.amp = input.get(AMP).to_string();

    for (&field, value) in &input.0 {
        if !KNOWN_FIELDS.contains(&field) {
            t2.extra_fields.insert((TYPE2, field), FieldValue::text(value.clone()));
        }
    }

    Ok(t2)
}

/// A single finger/slap's source image, prior to whatever compression the
/// orchestrator applies for a given rung.
#[derive(Debug, Clone)]
pub struct ImageAsset {
    pub position: u8,
    pub raw_pixels: Vec<u8>,
    pub width: u16,
    pub height: u16,
    pub bit_depth: u8,
    pub ppi_horizontal: u16,
    pub ppi_vertical: u16,
}

/// Canonical pixel geometry for Type-4 positions (spec §3 Type-4 table).
pub fn canonical_geometry(position: u8) -> Option<(u16, u16)> {
    match position {
        1..=10 => Some((800, 750)),
        11 | 12 => Some((400, 572)),
        13 | 14 => Some((1600, 1000)),
        _ => None,
    }
}

/// Box-filter (area-preserving) resize used when an asset's geometry
/// doesn't match [`canonical_geometry`]. Averages each destination pixel
/// over its corresponding source block rather than nearest-neighbor
/// sampling, so downscaling doesn't alias.
pub fn resize_area_preserving(pixels: &[u8], src_w: u16, src_h: u16, dst_w: u16, dst_h: u16) -> Vec<u8> {
    let (src_w, src_h, dst_w, dst_h) = (src_w as usize, src_h as usize, dst_w as usize, dst_h as usize);
    let mut out = vec![0u8; dst_w * dst_h];
    for dy in 0..dst_h {
        let y0 = dy * src_h / dst_h;
        let y1 = ((dy + 1) * src_h / dst_h).max(y0 + 1).min(src_h);
        for dx in 0..dst_w {
            let x0 = dx * src_w / dst_w;
            let x1 = ((dx + 1) * src_w / dst_w).max(x0 + 1).min(src_w);
            let mut sum: u32 = 0;
            let mut count: u32 = 0;
            for y in y0..y1 {
                for x in x0..x1 {
                    sum += pixels[y * src_w + x] as u32;
                    count += 1;
                }
            }
            out[dy * dst_w + dx] = (sum / count.max(1)) as u8;
        }
    }
    out
}

/// Assembles a complete transaction for one compression rung. Every call
/// performs an independent build from `bio`/`assets`; nothing from a prior
/// rung's output is reused (spec §4.6).
pub struct TransactionBuilder<'a> {
    config: &'a Config,
    codec: &'a dyn CodecAdapter,
}

impl<'a> TransactionBuilder<'a> {
    pub fn new(config: &'a Config, codec: &'a dyn CodecAdapter) -> Self {
        TransactionBuilder { config, codec }
    }

    pub fn build(&self, bio: &BiographicInput, assets: &[ImageAsset], rung: Rung) -> EftResult<Vec<u8>> {
        let t2 = normalize_biographic(bio, self.config.bypass_ssn)?;

        let mut sorted_assets: Vec<&ImageAsset> = assets.iter().collect();
        sorted_assets.sort_by_key(|asset| asset.position);

        let selected: Vec<&ImageAsset> = match self.config.mode {
            Mode::Rolled => sorted_assets.into_iter().filter(|a| (1..=14).contains(&a.position)).collect(),
            Mode::Atf => sorted_assets.into_iter().filter(|a| matches!(a.position, 13 | 14 | 15)).collect(),
        };

        let date = self.config.clock.now();
        let date_yyyymmdd = date.split(':').next().unwrap_or("").to_string();
        let mut t1 = Type1Record::new(date_yyyymmdd.clone());

        let formatted_name = t2.name.clone();
        t1.add_child(Record::Type2(t2));

        let mut native_resolution: Option<(u16, u16)> = None;

        match self.config.mode {
            Mode::Rolled => {
                for asset in selected {
                    let t4 = self.build_type4(asset, rung)?;
                    native_resolution.get_or_insert((asset.ppi_horizontal, asset.ppi_vertical));
                    t1.add_child(Record::Type4(t4));
                }
            }
            Mode::Atf => {
                for (idc, asset) in selected.into_iter().enumerate() {
                    let t14 = self.build_type14(asset, rung, idc as u16 + 1, &date_yyyymmdd)?;
                    t1.add_child(Record::Type14(t14));
                }
            }
        }

        if self.config.nsr_ntr_reflects_type4 {
            if let Some((h, v)) = native_resolution {
                t1.set_resolution(format!("{:02}.{:02}", h / 100, h % 100), format!("{:02}.{:02}", v / 100, v % 100));
            }
        }

        let tcn_seq = self.config.rng.next_sequence();
        let yymmdd = date_yyyymmdd.get(2..8).unwrap_or("000000");
        let initials = biographic::get_initials(&formatted_name);
        t1.set_tcn(format!("{yymmdd}-{initials}-{tcn_seq:02}"));

        t1.serialize(self.config.length_solver_max_iters)
    }

    /// Resizes to [`canonical_geometry`] when the asset's own geometry
    /// doesn't match. Type-4 only: it is the fixed-resolution record (spec
    /// §3). Type-14 is the variable-resolution record and keeps the asset's
    /// own `hll`/`vll` verbatim (`original_source` never resizes a Type-14
    /// image).
    fn prepare_pixels_for_type4(&self, asset: &ImageAsset) -> (Vec<u8>, u16, u16) {
        match canonical_geometry(asset.position) {
            Some((w, h)) if w != asset.width || h != asset.height => {
                let resized = resize_area_preserving(&asset.raw_pixels, asset.width, asset.height, w, h);
                (resized, w, h)
            }
            _ => (asset.raw_pixels.clone(), asset.width, asset.height),
        }
    }

    fn compress(&self, pixels: &[u8], w: u16, h: u16, bpp: u8, ppi: u16, rung: Rung) -> EftResult<(u8, Vec<u8>, &'static str)> {
        match rung {
            Rung::None => Ok((0, pixels.to_vec(), "NONE")),
            Rung::Wsq(bitrate) => {
                let encoded = self.codec.encode_wsq(pixels, w, h, bpp, ppi, bitrate)?;
                Ok((1, encoded, "WSQ20"))
            }
        }
    }

    fn build_type4(&self, asset: &ImageAsset, rung: Rung) -> EftResult<Type4Record> {
        let (pixels, w, h) = self.prepare_pixels_for_type4(asset);
        let (cga, data, _label) = self.compress(&pixels, w, h, asset.bit_depth, asset.ppi_horizontal, rung)?;
        Ok(Type4Record::new(asset.position, asset.position, w, h, cga, data))
    }

    fn build_type14(&self, asset: &ImageAsset, rung: Rung, idc: u16, fcd: &str) -> EftResult<Type14Record> {
        let (w, h) = (asset.width, asset.height);
        let (_cga_byte, data, cga_label) =
            self.compress(&asset.raw_pixels, w, h, asset.bit_depth, asset.ppi_horizontal, rung)?;
        let mut t14 = Type14Record::new(idc, asset.position as u16);
        t14.hll = w;
        t14.vll = h;
        t14.thps = asset.ppi_horizontal;
        t14.tvps = asset.ppi_vertical;
        t14.bpx = asset.bit_depth;
        t14.cga = cga_label.to_string();
        t14.fcd = fcd.to_string();
        t14.image = data;
        Ok(t14)
    }
}
