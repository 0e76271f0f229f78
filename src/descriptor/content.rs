//! Support for the _content descriptor_, classifying an event by genre.

use super::DescriptorError;

/// One genre classification entry.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct ContentEntry {
    /// First-level genre, per _EN 300 468_ table 28 (e.g. `0x1` movie/drama).
    pub content_nibble_level_1: u8,
    /// Second-level genre, refining the first.
    pub content_nibble_level_2: u8,
    /// A value with broadcaster-defined meaning.
    pub user_byte: u8,
}

/// A sequence of genre classifications for an event.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct ContentDescriptor {
    /// The classification entries, in wire order.
    pub entries: Vec<ContentEntry>,
}

impl ContentDescriptor {
    /// The tag value `0x54` identifying this descriptor kind.
    pub const TAG: u8 = 0x54;

    const ENTRY_SIZE: usize = 2;

    /// Decode from descriptor payload bytes; the payload must be a whole number of 2-byte
    /// entries.
    pub fn parse(data: &[u8]) -> Result<ContentDescriptor, DescriptorError> {
        if data.len() % Self::ENTRY_SIZE != 0 {
            return Err(DescriptorError::UnevenLength {
                entry_size: Self::ENTRY_SIZE,
                actual: data.len(),
            });
        }
        let entries = data
            .chunks_exact(Self::ENTRY_SIZE)
            .map(|chunk| ContentEntry {
                content_nibble_level_1: chunk[0] >> 4,
                content_nibble_level_2: chunk[0] & 0b0000_1111,
                user_byte: chunk[1],
            })
            .collect();
        Ok(ContentDescriptor { entries })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn parse() {
        let data = [0x15, 0x00, 0x43, 0xff];
        let desc = ContentDescriptor::parse(&data[..]).unwrap();
        assert_eq!(desc.entries.len(), 2);
        assert_eq!(desc.entries[0].content_nibble_level_1, 1);
        assert_eq!(desc.entries[0].content_nibble_level_2, 5);
        assert_eq!(desc.entries[1].content_nibble_level_1, 4);
        assert_eq!(desc.entries[1].user_byte, 0xff);
    }

    #[test]
    fn uneven_length() {
        assert_matches!(
            ContentDescriptor::parse(&[0x15]),
            Err(DescriptorError::UnevenLength {
                entry_size: 2,
                actual: 1
            })
        );
    }
}
