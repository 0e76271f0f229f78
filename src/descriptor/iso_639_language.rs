//! Support for the _ISO 639 language descriptor_, which may annotate an audio elementary stream
//! with the language spoken, and a classification of the audio content.

use super::{decode_text, DescriptorError};
use std::borrow::Cow;
use std::fmt;

/// Classification of the audio described by a [`Language`](struct.Language.html) entry.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum AudioType {
    /// The stream gives no indication of its audio type.
    Undefined,
    /// Audio with no language-specific content (e.g. ambient noise).
    CleanEffects,
    /// Audio prepared for the hearing impaired.
    HearingImpaired,
    /// Spoken commentary for visually impaired viewers.
    VisualImpairedCommentary,
    /// A value the spec reserves.
    Reserved(u8),
}
impl From<u8> for AudioType {
    fn from(v: u8) -> Self {
        match v {
            0 => AudioType::Undefined,
            1 => AudioType::CleanEffects,
            2 => AudioType::HearingImpaired,
            3 => AudioType::VisualImpairedCommentary,
            _ => AudioType::Reserved(v),
        }
    }
}

/// One (language, audio-type) entry.
#[derive(PartialEq, Eq, Clone)]
pub struct Language {
    /// Three-character ISO 639-2 language code.
    pub code: [u8; 3],
    /// Classification of the audio content.
    pub audio_type: AudioType,
}

impl Language {
    /// The language code as text.
    pub fn code(&self) -> Cow<'_, str> {
        decode_text(&self.code)
    }
}

impl fmt::Debug for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        f.debug_struct("Language")
            .field("code", &self.code())
            .field("audio_type", &self.audio_type)
            .finish()
    }
}

/// A sequence of (language, audio-type) pairs.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Iso639LanguageDescriptor {
    /// The language entries, in wire order.
    pub languages: Vec<Language>,
}

impl Iso639LanguageDescriptor {
    /// The tag value `0x0a` identifying this descriptor kind.
    pub const TAG: u8 = 0x0a;

    const ENTRY_SIZE: usize = 4;

    /// Decode from descriptor payload bytes; the payload must be a whole number of 4-byte
    /// entries.
    pub fn parse(data: &[u8]) -> Result<Iso639LanguageDescriptor, DescriptorError> {
        if data.len() % Self::ENTRY_SIZE != 0 {
            return Err(DescriptorError::UnevenLength {
                entry_size: Self::ENTRY_SIZE,
                actual: data.len(),
            });
        }
        let languages = data
            .chunks_exact(Self::ENTRY_SIZE)
            .map(|chunk| Language {
                code: [chunk[0], chunk[1], chunk[2]],
                audio_type: AudioType::from(chunk[3]),
            })
            .collect();
        Ok(Iso639LanguageDescriptor { languages })
    }
}
