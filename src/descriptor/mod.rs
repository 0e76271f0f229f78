//! Descriptors provide metadata about an element of a Transport Stream.
//!
//! For example, a descriptor may be used to specify the language of an audio track.  Use of
//! specific descriptors is often not mandatory (many streams do not describe the language of
//! their audio).
//!
//! The syntax of specific PSI/SI tables often allows descriptors to be attached to the table
//! itself, or to entries within the table.  Wherever that happens the table's syntax carries a
//! [`DescriptorSet`](struct.DescriptorSet.html): a 12-bit byte-count followed by that many bytes
//! of concatenated tag-length-value descriptors.
//!
//! A closed set of descriptor tags gets typed decoding (the
//! [`DescriptorPayload`](enum.DescriptorPayload.html) variants).  Any other tag, and any
//! recognised tag whose payload turns out to be truncated, is preserved as raw bytes with
//! [`Descriptor::is_parsed()`](struct.Descriptor.html#method.is_parsed) returning `false`.

pub mod ca;
pub mod component;
pub mod content;
pub mod iso_639_language;
pub mod network_name;
pub mod parental_rating;
pub mod service;
pub mod service_list;
pub mod short_event;
pub mod stream_identifier;

use log::debug;
use std::borrow::Cow;
use std::fmt;

/// A problem which prevented descriptor data being parsed.
#[derive(Debug, PartialEq, Eq)]
pub enum DescriptorError {
    /// Fewer bytes were available than the syntax element needs.
    NotEnoughData {
        /// name of the syntax element that could not be read
        field: &'static str,
        /// number of bytes the element needs
        expected: usize,
        /// number of bytes that were actually available
        actual: usize,
    },
    /// A sequence-of-entries descriptor had a length that is not a multiple of its entry size.
    UnevenLength {
        /// size in bytes of one entry of the sequence
        entry_size: usize,
        /// the actual payload length, not a multiple of `entry_size`
        actual: usize,
    },
}

/// Decode the bytes of a DVB text field.
///
/// Text in SI tables defaults to a Latin-1-compatible encoding; bytes that do not decode cleanly
/// are replaced rather than rejected.
pub(crate) fn decode_text(data: &[u8]) -> Cow<'_, str> {
    let (text, _had_errors) = encoding_rs::WINDOWS_1252.decode_without_bom_handling(data);
    text
}

/// The typed payload of a [`Descriptor`](struct.Descriptor.html), selected by tag.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum DescriptorPayload {
    /// Conditional access descriptor, tag `0x09`
    ConditionalAccess(ca::ConditionalAccessDescriptor),
    /// ISO 639 language descriptor, tag `0x0a`
    Iso639Language(iso_639_language::Iso639LanguageDescriptor),
    /// Network name descriptor, tag `0x40`
    NetworkName(network_name::NetworkNameDescriptor),
    /// Service list descriptor, tag `0x41`
    ServiceList(service_list::ServiceListDescriptor),
    /// Short event descriptor, tag `0x4d`
    ShortEvent(short_event::ShortEventDescriptor),
    /// Service descriptor, tag `0x48`
    Service(service::ServiceDescriptor),
    /// Component descriptor, tag `0x50`
    Component(component::ComponentDescriptor),
    /// Stream identifier descriptor, tag `0x52`
    StreamIdentifier(stream_identifier::StreamIdentifierDescriptor),
    /// Content descriptor, tag `0x54`
    Content(content::ContentDescriptor),
    /// Parental rating descriptor, tag `0x55`
    ParentalRating(parental_rating::ParentalRatingDescriptor),
    /// Payload of a tag outside the parsed set, or of a parsed tag whose payload was truncated.
    Raw(Vec<u8>),
}

impl DescriptorPayload {
    fn parse(tag: u8, data: &[u8]) -> Result<DescriptorPayload, DescriptorError> {
        Ok(match tag {
            ca::ConditionalAccessDescriptor::TAG => DescriptorPayload::ConditionalAccess(
                ca::ConditionalAccessDescriptor::parse(data)?,
            ),
            iso_639_language::Iso639LanguageDescriptor::TAG => DescriptorPayload::Iso639Language(
                iso_639_language::Iso639LanguageDescriptor::parse(data)?,
            ),
            network_name::NetworkNameDescriptor::TAG => {
                DescriptorPayload::NetworkName(network_name::NetworkNameDescriptor::parse(data)?)
            }
            service_list::ServiceListDescriptor::TAG => {
                DescriptorPayload::ServiceList(service_list::ServiceListDescriptor::parse(data)?)
            }
            short_event::ShortEventDescriptor::TAG => {
                DescriptorPayload::ShortEvent(short_event::ShortEventDescriptor::parse(data)?)
            }
            service::ServiceDescriptor::TAG => {
                DescriptorPayload::Service(service::ServiceDescriptor::parse(data)?)
            }
            component::ComponentDescriptor::TAG => {
                DescriptorPayload::Component(component::ComponentDescriptor::parse(data)?)
            }
            stream_identifier::StreamIdentifierDescriptor::TAG => DescriptorPayload::StreamIdentifier(
                stream_identifier::StreamIdentifierDescriptor::parse(data)?,
            ),
            content::ContentDescriptor::TAG => {
                DescriptorPayload::Content(content::ContentDescriptor::parse(data)?)
            }
            parental_rating::ParentalRatingDescriptor::TAG => DescriptorPayload::ParentalRating(
                parental_rating::ParentalRatingDescriptor::parse(data)?,
            ),
            _ => DescriptorPayload::Raw(data.to_vec()),
        })
    }
}

/// One tag-length-value element from a descriptor loop.
#[derive(PartialEq, Eq, Clone)]
pub struct Descriptor {
    /// The tag byte identifying the kind of metadata this descriptor carries.
    pub tag: u8,
    /// The typed payload, or the raw bytes when no typed decoding applied.
    pub payload: DescriptorPayload,
}

impl Descriptor {
    /// `false` when the payload is held as raw bytes, either because the tag is outside the
    /// parsed set or because the tag-specific decoder found the payload truncated.
    pub fn is_parsed(&self) -> bool {
        !matches!(self.payload, DescriptorPayload::Raw(_))
    }
}

impl fmt::Debug for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        f.debug_struct("Descriptor")
            .field("tag", &format_args!("{:#04x}", self.tag))
            .field("payload", &self.payload)
            .finish()
    }
}

/// An ordered sequence of descriptors, as found attached to a table or to an entry within one.
///
/// On the wire the sequence starts with a 12-bit byte count (the top 4 bits of the first byte
/// are reserved), followed by that many bytes of concatenated descriptors.
#[derive(Debug, Default, PartialEq, Eq, Clone)]
pub struct DescriptorSet {
    descriptors: Vec<Descriptor>,
}

impl DescriptorSet {
    /// Decode a descriptor set from the front of `buf`, returning the set together with the
    /// total number of bytes consumed (2 length bytes plus the declared loop length).
    pub fn parse(buf: &[u8]) -> Result<(DescriptorSet, usize), DescriptorError> {
        if buf.len() < 2 {
            return Err(DescriptorError::NotEnoughData {
                field: "descriptor_loop_length",
                expected: 2,
                actual: buf.len(),
            });
        }
        let loop_length = (usize::from(buf[0] & 0b0000_1111) << 8) | usize::from(buf[1]);
        if 2 + loop_length > buf.len() {
            return Err(DescriptorError::NotEnoughData {
                field: "descriptor_loop",
                expected: loop_length,
                actual: buf.len() - 2,
            });
        }
        let set = Self::parse_loop(&buf[2..2 + loop_length])?;
        Ok((set, 2 + loop_length))
    }

    /// Decode concatenated descriptors filling the whole of `buf` (no leading length field).
    pub fn parse_loop(mut buf: &[u8]) -> Result<DescriptorSet, DescriptorError> {
        let mut descriptors = Vec::new();
        while !buf.is_empty() {
            if buf.len() < 2 {
                return Err(DescriptorError::NotEnoughData {
                    field: "descriptor_tag",
                    expected: 2,
                    actual: buf.len(),
                });
            }
            let tag = buf[0];
            let len = buf[1] as usize;
            if 2 + len > buf.len() {
                return Err(DescriptorError::NotEnoughData {
                    field: "descriptor_body",
                    expected: len,
                    actual: buf.len() - 2,
                });
            }
            let data = &buf[2..2 + len];
            let payload = match DescriptorPayload::parse(tag, data) {
                Ok(payload) => payload,
                Err(e) => {
                    // a truncated payload spoils only this descriptor, not the loop
                    debug!("descriptor tag {:#04x} left unparsed: {:?}", tag, e);
                    DescriptorPayload::Raw(data.to_vec())
                }
            };
            descriptors.push(Descriptor { tag, payload });
            buf = &buf[2 + len..];
        }
        Ok(DescriptorSet { descriptors })
    }

    /// Move the descriptors of `other` onto the end of this set, as when a table's descriptor
    /// loop continues in a later section.
    pub fn merge(&mut self, other: DescriptorSet) {
        self.descriptors.extend(other.descriptors);
    }

    /// Iterate over the descriptors in wire order.
    pub fn iter(&self) -> std::slice::Iter<'_, Descriptor> {
        self.descriptors.iter()
    }

    /// The number of descriptors in the set.
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// `true` when the set holds no descriptors.
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

impl<'a> IntoIterator for &'a DescriptorSet {
    type Item = &'a Descriptor;
    type IntoIter = std::slice::Iter<'a, Descriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.descriptors.iter()
    }
}
