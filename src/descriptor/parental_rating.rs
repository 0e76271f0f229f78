//! Support for the _parental rating descriptor_, giving a minimum recommended age per country.

use super::{decode_text, DescriptorError};
use std::borrow::Cow;
use std::fmt;

/// Rating of an event for one country.
#[derive(PartialEq, Eq, Clone, Copy)]
pub struct Rating {
    /// Three-character ISO 3166 country code the rating applies in.
    pub country_code: [u8; 3],
    /// Encoded rating: values 0x01..=0x0f mean "minimum age = value + 3"; 0x00 is undefined and
    /// 0x10..=0xff are broadcaster-defined.
    pub rating: u8,
}

impl Rating {
    /// The country code as text.
    pub fn country_code(&self) -> Cow<'_, str> {
        decode_text(&self.country_code)
    }

    /// The minimum recommended viewer age in years, when the encoded rating defines one.
    pub fn minimum_age(&self) -> Option<u8> {
        match self.rating {
            0x01..=0x0f => Some(self.rating + 3),
            _ => None,
        }
    }
}

impl fmt::Debug for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        f.debug_struct("Rating")
            .field("country_code", &self.country_code())
            .field("rating", &self.rating)
            .finish()
    }
}

/// A sequence of per-country ratings.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct ParentalRatingDescriptor {
    /// The rating entries, in wire order.
    pub ratings: Vec<Rating>,
}

impl ParentalRatingDescriptor {
    /// The tag value `0x55` identifying this descriptor kind.
    pub const TAG: u8 = 0x55;

    const ENTRY_SIZE: usize = 4;

    /// Decode from descriptor payload bytes; the payload must be a whole number of 4-byte
    /// entries.
    pub fn parse(data: &[u8]) -> Result<ParentalRatingDescriptor, DescriptorError> {
        if data.len() % Self::ENTRY_SIZE != 0 {
            return Err(DescriptorError::UnevenLength {
                entry_size: Self::ENTRY_SIZE,
                actual: data.len(),
            });
        }
        let ratings = data
            .chunks_exact(Self::ENTRY_SIZE)
            .map(|chunk| Rating {
                country_code: [chunk[0], chunk[1], chunk[2]],
                rating: chunk[3],
            })
            .collect();
        Ok(ParentalRatingDescriptor { ratings })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn parse() {
        let data = b"GBR\x09DEU\x00";
        let desc = ParentalRatingDescriptor::parse(&data[..]).unwrap();
        assert_eq!(desc.ratings.len(), 2);
        assert_eq!(desc.ratings[0].country_code(), "GBR");
        assert_eq!(desc.ratings[0].minimum_age(), Some(12));
        assert_eq!(desc.ratings[1].minimum_age(), None);
    }

    #[test]
    fn uneven_length() {
        assert_matches!(
            ParentalRatingDescriptor::parse(b"GBR"),
            Err(DescriptorError::UnevenLength {
                entry_size: 4,
                actual: 3
            })
        );
    }
}
