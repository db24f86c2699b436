//! Compression-ladder fallback and magic-byte disambiguation: the two
//! scenarios that need something the plain encode/decode round trip doesn't
//! exercise, a real `CodecAdapter` and a mismatched declared/actual format.

use eft_codec::codec::{CodecAdapter, DecodedImage, NullCodec};
use eft_codec::config::{Clock, Config, Mode, TcnRng};
use eft_codec::decoder;
use eft_codec::encoder::{BiographicInput, ImageAsset, TransactionBuilder};
use eft_codec::error::{EftError, EftResult};
use eft_codec::orchestrator::{self, Rung};
use eft_codec::record::{Record, Type14Record};
use eft_codec::scratch::CancellationToken;

struct FixedClock;
impl Clock for FixedClock {
    fn now(&self) -> String {
        "20250115:120000".to_string()
    }
}

struct FixedRng;
impl TcnRng for FixedRng {
    fn next_sequence(&self) -> u8 {
        1
    }
}

fn rolled_config() -> Config {
    let mut config = Config::new(Mode::Rolled);
    config.clock = Box::new(FixedClock);
    config.rng = Box::new(FixedRng);
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

/// Fake WSQ codec whose output size is a simple function of bitrate, used
/// to exercise the orchestrator's ladder without a real WSQ binary.
struct ShrinkingCodec;
impl CodecAdapter for ShrinkingCodec {
    fn encode_wsq(&self, raw: &[u8], _w: u16, _h: u16, _bpp: u8, _ppi: u16, bitrate: f32) -> EftResult<Vec<u8>> {
        let fraction = (bitrate / 8.0).min(1.0);
        let size = ((raw.len() as f32) * fraction) as usize;
        Ok(vec![0u8; size.max(1)])
    }

    fn decode_wsq(&self, _bytes: &[u8]) -> EftResult<DecodedImage> {
        Err(EftError::CodecFailure("not needed for this test".to_string()))
    }

    fn encode_jp2(&self, _raw_or_png: &[u8], _ratio: f32) -> EftResult<Vec<u8>> {
        Err(EftError::CodecFailure("not needed for this test".to_string()))
    }

    fn score_nfiq(&self, _image: &[u8]) -> u8 {
        1
    }

    fn validate(&self, _bytes: &[u8]) -> (bool, Option<String>) {
        (true, None)
    }
}

#[test]
fn oversized_input_shrinks_until_it_fits_the_ceiling() {
    let mut config = rolled_config();
    config.size_ceiling_bytes = 2_000_000;
    let codec = ShrinkingCodec;
    let builder = TransactionBuilder::new(&config, &codec);
    let assets: Vec<ImageAsset> = (1..=10).map(|p| asset(p, 1600, 1500)).collect();
    let token = CancellationToken::new();

    let result = orchestrator::run(&config, &token, |rung| builder.build(&biographic_input(), &assets, rung)).unwrap();

    assert!(result.bytes.len() <= config.size_ceiling_bytes);
    assert!(matches!(result.rung, Rung::Wsq(_)));

    let records = decoder::parse(&result.bytes, &token).unwrap();
    for record in &records {
        if let Record::Type4(t4) = record {
            assert_eq!(t4.cga, 1);
        }
    }
}

#[test]
fn ladder_exhaustion_still_returns_the_smallest_attempt_with_a_warning() {
    let mut config = rolled_config();
    config.size_ceiling_bytes = 1; // unreachable, forces exhaustion.
    let codec = ShrinkingCodec;
    let builder = TransactionBuilder::new(&config, &codec);
    let assets = vec![asset(1, 800, 750)];
    let token = CancellationToken::new();

    let result = orchestrator::run(&config, &token, |rung| builder.build(&biographic_input(), &assets, rung)).unwrap();

    assert!(matches!(
        result.warning,
        Some(EftError::SizeBudgetExceeded { .. })
    ));
    // The last rung tried (lowest bitrate) produced the smallest file.
    assert_eq!(result.rung, Rung::Wsq(*config.bitrate_ladder.last().unwrap()));
}

#[test]
fn extract_images_uses_magic_bytes_not_declared_cga() {
    let mut t14 = Type14Record::new(1, 13);
    t14.cga = "JP2".to_string(); // declared, but the bytes below are WSQ.
    t14.image = vec![0xFF, 0xA0, 0x00, 0x01];

    let dir = tempfile::tempdir().unwrap();
    let records = vec![Record::Type14(t14)];
    let paths = decoder::extract_images(&records, dir.path()).unwrap();

    assert_eq!(paths.len(), 1);
    assert_eq!(paths[0].extension().unwrap(), "wsq");
}

#[test]
fn extract_images_names_files_by_record_type_and_idc() {
    let codec = NullCodec;
    let config = rolled_config();
    let builder = TransactionBuilder::new(&config, &codec);
    let assets = vec![asset(1, 800, 750), asset(2, 800, 750)];
    let bytes = builder.build(&biographic_input(), &assets, Rung::None).unwrap();
    let token = CancellationToken::new();
    let records = decoder::parse(&bytes, &token).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let paths = decoder::extract_images(&records, dir.path()).unwrap();
    assert_eq!(paths.len(), 2);
    for path in &paths {
        assert!(path.exists());
    }
}
