//! Support for the _short event descriptor_, giving an EIT event its name and a one-line
//! description in a particular language.

use super::{decode_text, DescriptorError};
use std::borrow::Cow;
use std::fmt;

/// Name and description of an event.
#[derive(PartialEq, Eq, Clone)]
pub struct ShortEventDescriptor {
    /// Three-character ISO 639-2 code for the language of the text fields.
    pub language_code: [u8; 3],
    /// Name of the event.
    pub event_name: Vec<u8>,
    /// Text describing the event.
    pub text: Vec<u8>,
}

impl ShortEventDescriptor {
    /// The tag value `0x4d` identifying this descriptor kind.
    pub const TAG: u8 = 0x4d;

    /// Decode from descriptor payload bytes: a language code followed by two length-prefixed
    /// text fields.
    pub fn parse(data: &[u8]) -> Result<ShortEventDescriptor, DescriptorError> {
        if data.len() < 4 {
            return Err(DescriptorError::NotEnoughData {
                field: "short_event_descriptor",
                expected: 4,
                actual: data.len(),
            });
        }
        let language_code = [data[0], data[1], data[2]];
        let name_len = data[3] as usize;
        if 4 + name_len + 1 > data.len() {
            return Err(DescriptorError::NotEnoughData {
                field: "event_name",
                expected: name_len + 1,
                actual: data.len() - 4,
            });
        }
        let event_name = data[4..4 + name_len].to_vec();
        let text_len = data[4 + name_len] as usize;
        let text_start = 4 + name_len + 1;
        if text_start + text_len > data.len() {
            return Err(DescriptorError::NotEnoughData {
                field: "text",
                expected: text_len,
                actual: data.len() - text_start,
            });
        }
        let text = data[text_start..text_start + text_len].to_vec();
        Ok(ShortEventDescriptor {
            language_code,
            event_name,
            text,
        })
    }

    /// The language code as text.
    pub fn language_code(&self) -> Cow<'_, str> {
        decode_text(&self.language_code)
    }

    /// The event name as text.
    pub fn event_name(&self) -> Cow<'_, str> {
        decode_text(&self.event_name)
    }

    /// The descriptive text as text.
    pub fn text(&self) -> Cow<'_, str> {
        decode_text(&self.text)
    }
}

impl fmt::Debug for ShortEventDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        f.debug_struct("ShortEventDescriptor")
            .field("language_code", &self.language_code())
            .field("event_name", &self.event_name())
            .field("text", &self.text())
            .finish()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn parse() {
        let mut data = b"eng".to_vec();
        data.push(4);
        data.extend_from_slice(b"News");
        data.push(11);
        data.extend_from_slice(b"The news...");
        let desc = ShortEventDescriptor::parse(&data).unwrap();
        assert_eq!(desc.language_code(), "eng");
        assert_eq!(desc.event_name(), "News");
        assert_eq!(desc.text(), "The news...");
    }

    #[test]
    fn truncated_text() {
        let mut data = b"eng".to_vec();
        data.push(4);
        data.extend_from_slice(b"News");
        data.push(90); // text_length overruns
        data.extend_from_slice(b"The");
        assert_matches!(
            ShortEventDescriptor::parse(&data),
            Err(DescriptorError::NotEnoughData { field: "text", .. })
        );
    }
}
