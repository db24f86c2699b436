//! Tunables and injectable collaborators (spec §6).

/// Which record type carries fingerprint images.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Type-14 tagged records, positions 13/14/15.
    Atf,
    /// Type-4 binary records, positions 1..14.
    Rolled,
}

/// Returns `YYYYMMDD:HHMMSS`. Implemented by [`SystemClock`] in production;
/// tests inject a fixed value so encoder output stays deterministic.
pub trait Clock: Send + Sync {
    fn now(&self) -> String;
}

/// Supplies the 2-digit TCN sequence number. Implemented by [`ThreadRng`] in
/// production; tests inject a fixed value for determinism.
pub trait TcnRng: Send + Sync {
    fn next_sequence(&self) -> u8;
}

/// Wall-clock [`Clock`] backed by the `time` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> String {
        let now = time::OffsetDateTime::now_utc();
        format!(
            "{:04}{:02}{:02}:{:02}{:02}{:02}",
            now.year(),
            u8::from(now.month()),
            now.day(),
            now.hour(),
            now.minute(),
            now.second()
        )
    }
}

/// [`TcnRng`] backed by `rand`'s thread-local generator.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRng;

impl TcnRng for ThreadRng {
    fn next_sequence(&self) -> u8 {
        rand::Rng::gen_range(&mut rand::thread_rng(), 1..=99)
    }
}

/// Default WSQ bitrate ladder tried in descending order (spec §4.6).
pub const DEFAULT_BITRATE_LADDER: &[f32] = &[3.5, 3.0, 2.5, 2.0, 1.5, 1.0, 0.75];

/// Default size ceiling, ≈ 11.8 MiB (spec §4.6).
pub const DEFAULT_SIZE_CEILING_BYTES: usize = 11_744_051;

pub struct Config {
    pub mode: Mode,
    pub size_ceiling_bytes: usize,
    pub bitrate_ladder: Vec<f32>,
    pub length_solver_max_iters: usize,
    pub bypass_ssn: bool,
    /// REDESIGN FLAG 1: when true, `1.011`/`1.012` reflect the Type-4 asset's
    /// actual NSR/NTR instead of the literal `"00.00"` the source always
    /// emits. Default `false` to match source behavior.
    pub nsr_ntr_reflects_type4: bool,
    pub clock: Box<dyn Clock>,
    pub rng: Box<dyn TcnRng>,
}

impl Config {
    pub fn new(mode: Mode) -> Self {
        Config {
            mode,
            size_ceiling_bytes: DEFAULT_SIZE_CEILING_BYTES,
            bitrate_ladder: DEFAULT_BITRATE_LADDER.to_vec(),
            length_solver_max_iters: crate::length::DEFAULT_MAX_ITERS,
            bypass_ssn: false,
            nsr_ntr_reflects_type4: false,
            clock: Box::new(SystemClock),
            rng: Box::new(ThreadRng),
        }
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("mode", &self.mode)
            .field("size_ceiling_bytes", &self.size_ceiling_bytes)
            .field("bitrate_ladder", &self.bitrate_ladder)
            .field("length_solver_max_iters", &self.length_solver_max_iters)
            .field("bypass_ssn", &self.bypass_ssn)
            .field("nsr_ntr_reflects_type4", &self.nsr_ntr_reflects_type4)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedClock(&'static str);
    impl Clock for FixedClock {
        fn now(&self) -> String {
            self.0.to_string()
        }
    }

    struct FixedRng(u8);
    impl TcnRng for FixedRng {
        fn next_sequence(&self) -> u8 {
            self.0
        }
    }

    #[test]
    fn defaults_match_spec_table() {
        let cfg = Config::new(Mode::Atf);
        assert_eq!(cfg.size_ceiling_bytes, 11_744_051);
        assert_eq!(cfg.length_solver_max_iters, 5);
        assert!(!cfg.bypass_ssn);
        assert!(!cfg.nsr_ntr_reflects_type4);
        assert_eq!(cfg.bitrate_ladder, vec![3.5, 3.0, 2.5, 2.0, 1.5, 1.0, 0.75]);
    }

    #[test]
    fn injected_clock_and_rng_are_used_verbatim() {
        let mut cfg = Config::new(Mode::Rolled);
        cfg.clock = Box::new(FixedClock("20250115:120000"));
        cfg.rng = Box::new(FixedRng(42));
        assert_eq!(cfg.clock.now(), "20250115:120000");
        assert_eq!(cfg.rng.next_sequence(), 42);
    }
}
