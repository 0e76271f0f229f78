//! Support for the _stream identifier descriptor_, which labels a PMT entry with a component
//! tag so that other SI tables (e.g. component descriptors in the EIT) can refer to it.

use super::DescriptorError;

/// Associates a component tag with the elementary stream the enclosing PMT entry describes.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct StreamIdentifierDescriptor {
    /// Tag uniquely labelling this component within the service.
    pub component_tag: u8,
}

impl StreamIdentifierDescriptor {
    /// The tag value `0x52` identifying this descriptor kind.
    pub const TAG: u8 = 0x52;

    /// Decode from descriptor payload bytes.
    pub fn parse(data: &[u8]) -> Result<StreamIdentifierDescriptor, DescriptorError> {
        if data.is_empty() {
            return Err(DescriptorError::NotEnoughData {
                field: "component_tag",
                expected: 1,
                actual: 0,
            });
        }
        Ok(StreamIdentifierDescriptor {
            component_tag: data[0],
        })
    }
}
