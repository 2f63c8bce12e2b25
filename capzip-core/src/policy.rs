use crate::error::{CapzipError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroU64;
use std::path::PathBuf;

/// The 4 GiB cap applied by the interactive tool when no ceiling was given, in KiB.
pub const DEFAULT_CEILING_KIB: u64 = 4_194_304;

const KIB: u64 = 1024;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArchiveExt {
    #[default]
    Zip,
    SevenZ,
}

impl ArchiveExt {
    pub fn as_str(self) -> &'static str {
        match self {
            ArchiveExt::Zip => ".zip",
            ArchiveExt::SevenZ => ".7z",
        }
    }

    pub fn parse(input: &str) -> Option<Self> {
        match input.trim() {
            ".zip" => Some(ArchiveExt::Zip),
            ".7z" => Some(ArchiveExt::SevenZ),
            _ => None,
        }
    }

    /// Empty or unknown extensions fall back to `.zip`.
    pub fn parse_or_default(input: &str) -> Self {
        match Self::parse(input) {
            Some(ext) => ext,
            None => {
                if !input.trim().is_empty() {
                    tracing::warn!(input, "unknown archive extension, using .zip");
                }
                ArchiveExt::Zip
            }
        }
    }
}

impl fmt::Display for ArchiveExt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SizeCeiling {
    #[default]
    Unlimited,
    Bytes(NonZeroU64),
}

impl SizeCeiling {
    pub fn from_kib(kib: u64) -> Self {
        match NonZeroU64::new(kib.saturating_mul(KIB)) {
            Some(b) => SizeCeiling::Bytes(b),
            None => SizeCeiling::Unlimited,
        }
    }

    pub fn bytes(self) -> Option<u64> {
        match self {
            SizeCeiling::Unlimited => None,
            SizeCeiling::Bytes(b) => Some(b.get()),
        }
    }

    /// True when a container of `len` bytes must be split.
    pub fn exceeded_by(self, len: u64) -> bool {
        self.bytes().is_some_and(|c| len > c)
    }

    /// Strict parse of a KiB count. Zero, negative and non-numeric input is rejected.
    pub fn parse_kib(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        let invalid = |reason: &str| CapzipError::InvalidSizeCeiling {
            input: input.to_string(),
            reason: reason.to_string(),
        };
        let n: i64 = trimmed.parse().map_err(|_| invalid("not an integer"))?;
        if n <= 0 {
            return Err(invalid("must be positive"));
        }
        Ok(Self::from_kib(n as u64))
    }

    /// Lenient parse: any invalid input resolves to `fallback`.
    pub fn parse_kib_or(input: &str, fallback: FallbackCeiling) -> Self {
        match Self::parse_kib(input) {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!(error = %e, "using fallback ceiling {fallback:?}");
                fallback.ceiling()
            }
        }
    }
}

/// What an absent or invalid ceiling means.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FallbackCeiling {
    /// Never split.
    #[default]
    Unlimited,
    /// Split above [`DEFAULT_CEILING_KIB`].
    Default4GiB,
}

impl FallbackCeiling {
    pub fn ceiling(self) -> SizeCeiling {
        match self {
            FallbackCeiling::Unlimited => SizeCeiling::Unlimited,
            FallbackCeiling::Default4GiB => SizeCeiling::from_kib(DEFAULT_CEILING_KIB),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Directory the fixed output names are resolved against.
    pub work_dir: PathBuf,
    pub base_name: String,
    pub final_base_name: String,
    pub fallback_ceiling: FallbackCeiling,
    /// Deflate level; `None` keeps the codec default.
    pub compression_level: Option<i64>,
    /// When true, zero entry timestamps for reproducible containers.
    pub deterministic: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            work_dir: PathBuf::from("."),
            base_name: "output".to_string(),
            final_base_name: "final_output".to_string(),
            fallback_ceiling: FallbackCeiling::Unlimited,
            compression_level: None,
            deterministic: false,
        }
    }
}

impl PipelineConfig {
    pub fn container_path(&self, ext: ArchiveExt) -> PathBuf {
        self.work_dir.join(format!("{}{}", self.base_name, ext))
    }

    pub fn final_path(&self, ext: ArchiveExt) -> PathBuf {
        self.work_dir.join(format!("{}{}", self.final_base_name, ext))
    }
}
