//! Build a transaction, parse it back, and check the records that come out
//! are the ones that went in: a minimal ATF transaction, a rolled Type-4
//! transaction, and an edit made between parse and re-encode.

use eft_codec::codec::NullCodec;
use eft_codec::config::{Clock, Config, Mode, TcnRng};
use eft_codec::decoder;
use eft_codec::encoder::{BiographicInput, ImageAsset, TransactionBuilder};
use eft_codec::orchestrator::Rung;
use eft_codec::record::Record;
use eft_codec::scratch::CancellationToken;

struct FixedClock;
impl Clock for FixedClock {
    fn now(&self) -> String {
        "20250115:120000".to_string()
    }
}

struct FixedRng(u8);
impl TcnRng for FixedRng {
    fn next_sequence(&self) -> u8 {
        self.0
    }
}

fn config_for(mode: Mode) -> Config {
    let mut config = Config::new(mode);
    config.clock = Box::new(FixedClock);
    config.rng = Box::new(FixedRng(1));
    config
}

fn asset(position: u8, width: u16, height: u16) -> ImageAsset {
    ImageAsset {
        position,
        raw_pixels: vec![100u8; width as usize * height as usize],
        width,
        height,
        bit_depth: 8,
        ppi_horizontal: 500,
        ppi_vertical: 500,
    }
}

fn biographic_input() -> BiographicInput {
    let mut bio = BiographicInput::new();
    bio.set(18, "Doe, Jane").set(22, "19900101").set(16, "123456789");
    bio
}

#[test]
fn minimal_atf_produces_four_records_with_matching_cnt() {
    let config = config_for(Mode::Atf);
    let codec = NullCodec;
    let builder = TransactionBuilder::new(&config, &codec);
    let assets = vec![asset(13, 800, 800), asset(14, 800, 800), asset(15, 800, 800)];

    let bytes = builder.build(&biographic_input(), &assets, Rung::None).unwrap();
    let token = CancellationToken::new();
    let records = decoder::parse(&bytes, &token).unwrap();

    assert_eq!(records.len(), 5); // Type-1 + Type-2 + three Type-14
    assert_eq!(records[0].record_type(), 1);
    assert_eq!(records[1].record_type(), 2);
    for record in &records[2..] {
        assert_eq!(record.record_type(), 14);
    }

    for record in &records {
        let serialized = record.serialize_default().unwrap();
        assert_eq!(serialized.len(), declared_len(&serialized));
    }

    match &records[1] {
        Record::Type2(t2) => assert!(!t2.extra_fields.contains_key(&(2, 19))),
        _ => panic!("expected Type-2"),
    }
    let text = String::from_utf8_lossy(&bytes);
    assert!(!text.contains("2.019:"));
}

fn declared_len(serialized: &[u8]) -> usize {
    let text = String::from_utf8_lossy(serialized);
    let Some(colon) = text.find(':') else { return serialized.len() };
    let Some(sep) = text[colon + 1..].find(|c| c == '\u{1d}' || c == '\u{1c}') else {
        return serialized.len();
    };
    text[colon + 1..colon + 1 + sep].parse().unwrap_or(serialized.len())
}

#[test]
fn rolled_type4_headers_reflect_position_and_impression_type() {
    let config = config_for(Mode::Rolled);
    let codec = NullCodec;
    let builder = TransactionBuilder::new(&config, &codec);
    let mut assets: Vec<ImageAsset> = (1..=10).map(|p| asset(p, 800, 750)).collect();
    assets.push(asset(13, 1600, 1000));

    let bytes = builder.build(&biographic_input(), &assets, Rung::None).unwrap();
    let token = CancellationToken::new();
    let records = decoder::parse(&bytes, &token).unwrap();

    let type4_records: Vec<_> = records
        .iter()
        .filter_map(|r| match r {
            Record::Type4(t4) => Some(t4),
            _ => None,
        })
        .collect();
    assert_eq!(type4_records.len(), 11);

    for t4 in &type4_records {
        if (1..=10).contains(&t4.fgp) {
            assert_eq!(t4.imp(), 1);
        } else {
            assert_eq!(t4.imp(), 0);
        }
        assert_eq!(t4.fgp, t4.idc);
        assert_eq!(t4.declared_length() as usize, 18 + t4.data.len());
    }
}

#[test]
fn editing_a_biographic_field_recomputes_cnt_and_lengths_without_touching_images() {
    let config = config_for(Mode::Atf);
    let codec = NullCodec;
    let builder = TransactionBuilder::new(&config, &codec);
    let assets = vec![asset(13, 800, 800)];
    let original_bytes = builder.build(&biographic_input(), &assets, Rung::None).unwrap();

    let token = CancellationToken::new();
    let mut records = decoder::parse(&original_bytes, &token).unwrap();
    let original_image = match &records[2] {
        Record::Type14(t14) => t14.image.clone(),
        _ => panic!("expected Type-14"),
    };

    if let Record::Type2(t2) = &mut records[1] {
        t2.name = "Smith, John Q".to_string();
    }

    let edited_bytes = decoder::reassemble(&records, 5).unwrap();
    let reparsed = decoder::parse(&edited_bytes, &token).unwrap();

    match &reparsed[1] {
        Record::Type2(t2) => assert_eq!(t2.name, "Smith, John Q"),
        _ => panic!("expected Type-2"),
    }
    match &reparsed[2] {
        Record::Type14(t14) => assert_eq!(t14.image, original_image),
        _ => panic!("expected Type-14"),
    }

    let text = String::from_utf8_lossy(&edited_bytes);
    assert!(text.starts_with("1.001:"));
}
