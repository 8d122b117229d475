//! Speech model variant registry.
//!
//! A [`ModelVariant`] names a size/accuracy tier of the offline Whisper
//! model. The variant alone determines the canonical cache file name and the
//! remote GGML file the cache downloads.

use std::fmt;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// ModelVariant
// ---------------------------------------------------------------------------

/// Size tier of a Whisper GGML model.
///
/// Larger variants transcribe more accurately and run slower; the download
/// sizes below are approximate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelVariant {
    /// ~75 MB — fastest, lowest accuracy.
    Tiny,
    /// ~142 MB — balanced default.
    Base,
    /// ~466 MB — noticeably better accuracy.
    Small,
    /// ~1.5 GB — highest accuracy of the supported tiers.
    Medium,
}

/// All supported variants, smallest first. Used for CLI help and UIs that
/// list download choices.
pub const ALL_VARIANTS: [ModelVariant; 4] = [
    ModelVariant::Tiny,
    ModelVariant::Base,
    ModelVariant::Small,
    ModelVariant::Medium,
];

impl ModelVariant {
    /// Lowercase identifier used in file names, URLs and the CLI.
    pub fn slug(self) -> &'static str {
        match self {
            ModelVariant::Tiny => "tiny",
            ModelVariant::Base => "base",
            ModelVariant::Small => "small",
            ModelVariant::Medium => "medium",
        }
    }

    /// Canonical file name under the models directory
    /// (`model-<variant>.bin`).
    pub fn file_name(self) -> String {
        format!("model-{}.bin", self.slug())
    }

    /// Human-readable name for status messages.
    pub fn display_name(self) -> &'static str {
        match self {
            ModelVariant::Tiny => "Tiny",
            ModelVariant::Base => "Base",
            ModelVariant::Small => "Small",
            ModelVariant::Medium => "Medium",
        }
    }

    /// Approximate download size in megabytes.
    pub fn approx_size_mb(self) -> u64 {
        match self {
            ModelVariant::Tiny => 75,
            ModelVariant::Base => 142,
            ModelVariant::Small => 466,
            ModelVariant::Medium => 1_500,
        }
    }
}

impl fmt::Display for ModelVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for ModelVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "tiny" => Ok(ModelVariant::Tiny),
            "base" => Ok(ModelVariant::Base),
            "small" => Ok(ModelVariant::Small),
            "medium" => Ok(ModelVariant::Medium),
            other => Err(format!(
                "unknown model variant '{other}' (expected tiny, base, small or medium)"
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_names_are_canonical() {
        assert_eq!(ModelVariant::Tiny.file_name(), "model-tiny.bin");
        assert_eq!(ModelVariant::Base.file_name(), "model-base.bin");
        assert_eq!(ModelVariant::Small.file_name(), "model-small.bin");
        assert_eq!(ModelVariant::Medium.file_name(), "model-medium.bin");
    }

    #[test]
    fn from_str_round_trips_all_variants() {
        for variant in ALL_VARIANTS {
            let parsed: ModelVariant = variant.slug().parse().unwrap();
            assert_eq!(parsed, variant);
        }
    }

    #[test]
    fn from_str_is_case_insensitive() {
        let parsed: ModelVariant = "Base".parse().unwrap();
        assert_eq!(parsed, ModelVariant::Base);
    }

    #[test]
    fn from_str_rejects_unknown() {
        assert!("large-v3".parse::<ModelVariant>().is_err());
    }

    #[test]
    fn sizes_increase_with_tier() {
        let sizes: Vec<u64> = ALL_VARIANTS.iter().map(|v| v.approx_size_mb()).collect();
        assert!(sizes.windows(2).all(|w| w[0] < w[1]));
    }
}
