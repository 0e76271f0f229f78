//! Support for the _component descriptor_, describing one component (video format, audio
//! layout, subtitles, …) of the event or service the descriptor is attached to.

use super::{decode_text, DescriptorError};
use std::borrow::Cow;
use std::fmt;

/// Describes a single component of a service or event.
#[derive(PartialEq, Eq, Clone)]
pub struct ComponentDescriptor {
    /// Low four bits of the first byte: the broad category of the component (video, audio, …).
    pub stream_content: u8,
    /// High four bits of the first byte: extension of `stream_content`.
    pub stream_content_ext: u8,
    /// Refines `stream_content` into a concrete format, per _EN 300 468_ table 26.
    pub component_type: u8,
    /// Tag matching a _stream identifier descriptor_ in the service's PMT.
    pub component_tag: u8,
    /// Three-character ISO 639-2 code for the language of the component.
    pub language_code: [u8; 3],
    /// Free text describing the component.
    pub text: Vec<u8>,
}

impl ComponentDescriptor {
    /// The tag value `0x50` identifying this descriptor kind.
    pub const TAG: u8 = 0x50;

    /// Decode from descriptor payload bytes.
    pub fn parse(data: &[u8]) -> Result<ComponentDescriptor, DescriptorError> {
        if data.len() < 6 {
            return Err(DescriptorError::NotEnoughData {
                field: "component_descriptor",
                expected: 6,
                actual: data.len(),
            });
        }
        Ok(ComponentDescriptor {
            stream_content: data[0] & 0b0000_1111,
            stream_content_ext: data[0] >> 4,
            component_type: data[1],
            component_tag: data[2],
            language_code: [data[3], data[4], data[5]],
            text: data[6..].to_vec(),
        })
    }

    /// The language code as text.
    pub fn language_code(&self) -> Cow<'_, str> {
        decode_text(&self.language_code)
    }

    /// The component description as text.
    pub fn text(&self) -> Cow<'_, str> {
        decode_text(&self.text)
    }
}

impl fmt::Debug for ComponentDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        f.debug_struct("ComponentDescriptor")
            .field("stream_content", &self.stream_content)
            .field("stream_content_ext", &self.stream_content_ext)
            .field("component_type", &self.component_type)
            .field("component_tag", &self.component_tag)
            .field("language_code", &self.language_code())
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
        let mut data = vec![0xf1, 0x03, 0x42];
        data.extend_from_slice(b"engVideo 16:9");
        let desc = ComponentDescriptor::parse(&data).unwrap();
        assert_eq!(desc.stream_content, 1);
        assert_eq!(desc.stream_content_ext, 0xf);
        assert_eq!(desc.component_type, 3);
        assert_eq!(desc.component_tag, 0x42);
        assert_eq!(desc.language_code(), "eng");
        assert_eq!(desc.text(), "Video 16:9");
    }

    #[test]
    fn empty_text_allowed() {
        let data = [0x01, 0x01, 0x01, b'd', b'e', b'u'];
        let desc = ComponentDescriptor::parse(&data[..]).unwrap();
        assert_eq!(desc.text(), "");
    }

    #[test]
    fn too_short() {
        assert_matches!(
            ComponentDescriptor::parse(&[0x01, 0x01]),
            Err(DescriptorError::NotEnoughData { .. })
        );
    }
}
