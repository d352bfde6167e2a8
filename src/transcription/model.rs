use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const MODEL_BASE_URL: &str = "https://huggingface.co/ggerganov/whisper.cpp/resolve/main";

/// Whisper model variants that can be provisioned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub enum Model {
    /// `tiny`
    Tiny,
    /// `tiny.en`
    TinyEn,
    /// `base`
    Base,
    /// `base.en`
    BaseEn,
    /// `small`
    Small,
    /// `small.en`
    SmallEn,
    /// `medium`
    Medium,
    /// `medium.en`
    MediumEn,
    /// `large-v3`
    LargeV3,
    /// `large-v3-turbo`
    LargeV3Turbo,
}

struct ModelInfo {
    id: &'static str,
    size_mb: u32,
}

const ALL_MODELS: [Model; 10] = [
    Model::Tiny,
    Model::TinyEn,
    Model::Base,
    Model::BaseEn,
    Model::Small,
    Model::SmallEn,
    Model::Medium,
    Model::MediumEn,
    Model::LargeV3,
    Model::LargeV3Turbo,
];

/// Unknown model identifier
#[derive(Debug, Error)]
#[error("unknown model `{name}` (available: {available})")]
pub struct ModelParseError {
    name: String,
    available: String,
}

impl Model {
    /// All supported variants, smallest first
    pub fn all() -> impl Iterator<Item = Self> {
        ALL_MODELS.into_iter()
    }

    const fn info(self) -> ModelInfo {
        let (id, size_mb) = match self {
            Self::Tiny => ("tiny", 75),
            Self::TinyEn => ("tiny.en", 75),
            Self::Base => ("base", 142),
            Self::BaseEn => ("base.en", 142),
            Self::Small => ("small", 466),
            Self::SmallEn => ("small.en", 466),
            Self::Medium => ("medium", 1500),
            Self::MediumEn => ("medium.en", 1500),
            Self::LargeV3 => ("large-v3", 2900),
            Self::LargeV3Turbo => ("large-v3-turbo", 1600),
        };
        ModelInfo { id, size_mb }
    }

    /// Identifier as used by whisper.cpp (e.g. `base.en`)
    #[must_use]
    pub const fn id(self) -> &'static str {
        self.info().id
    }

    /// On-disk filename, `ggml-<id>.bin`
    #[must_use]
    pub fn filename(self) -> String {
        format!("ggml-{}.bin", self.id())
    }

    /// Remote download location
    #[must_use]
    pub fn url(self) -> String {
        format!("{MODEL_BASE_URL}/{}", self.filename())
    }

    /// Approximate download size in MB (informational)
    #[must_use]
    pub const fn size_mb(self) -> u32 {
        self.info().size_mb
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Model {
    type Err = ModelParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        Self::all()
            .find(|model| model.id().eq_ignore_ascii_case(name))
            .ok_or_else(|| ModelParseError {
                name: name.to_owned(),
                available: Self::all().map(Self::id).collect::<Vec<_>>().join(", "),
            })
    }
}

impl TryFrom<String> for Model {
    type Error = ModelParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
