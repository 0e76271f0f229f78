//! Support for the _network name descriptor_, carried in the NIT's first descriptor loop.

use super::{decode_text, DescriptorError};
use std::borrow::Cow;
use std::fmt;

/// The human-readable name of the delivery network.
#[derive(PartialEq, Eq, Clone)]
pub struct NetworkNameDescriptor {
    /// The name bytes as they appeared on the wire.
    pub name: Vec<u8>,
}

impl NetworkNameDescriptor {
    /// The tag value `0x40` identifying this descriptor kind.
    pub const TAG: u8 = 0x40;

    /// Decode from descriptor payload bytes; any length is accepted.
    pub fn parse(data: &[u8]) -> Result<NetworkNameDescriptor, DescriptorError> {
        Ok(NetworkNameDescriptor {
            name: data.to_vec(),
        })
    }

    /// The network name as text.
    pub fn name(&self) -> Cow<'_, str> {
        decode_text(&self.name)
    }
}

impl fmt::Debug for NetworkNameDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        f.debug_struct("NetworkNameDescriptor")
            .field("name", &self.name())
            .finish()
    }
}
