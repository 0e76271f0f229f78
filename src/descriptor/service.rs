//! Support for the _service descriptor_, attached to SDT entries to name a service and its
//! provider.

use super::{decode_text, DescriptorError};
use std::borrow::Cow;
use std::fmt;

/// read a length-prefixed run of bytes from the front of `*data`, advancing past it
fn take_prefixed<'a>(
    data: &mut &'a [u8],
    field: &'static str,
) -> Result<&'a [u8], DescriptorError> {
    if data.is_empty() {
        return Err(DescriptorError::NotEnoughData {
            field,
            expected: 1,
            actual: 0,
        });
    }
    let len = data[0] as usize;
    if 1 + len > data.len() {
        return Err(DescriptorError::NotEnoughData {
            field,
            expected: len,
            actual: data.len() - 1,
        });
    }
    let s = &data[1..1 + len];
    *data = &data[1 + len..];
    Ok(s)
}

/// Names the service described by the enclosing SDT entry.
#[derive(PartialEq, Eq, Clone)]
pub struct ServiceDescriptor {
    /// The kind of service, per _EN 300 468_ table 87.
    pub service_type: u8,
    /// Name of the company providing the service.
    pub provider_name: Vec<u8>,
    /// Name of the service itself.
    pub service_name: Vec<u8>,
}

impl ServiceDescriptor {
    /// The tag value `0x48` identifying this descriptor kind.
    pub const TAG: u8 = 0x48;

    /// Decode from descriptor payload bytes: a service-type byte followed by two length-prefixed
    /// names.  A name length running past the end of the payload is a parse failure.
    pub fn parse(data: &[u8]) -> Result<ServiceDescriptor, DescriptorError> {
        if data.is_empty() {
            return Err(DescriptorError::NotEnoughData {
                field: "service_type",
                expected: 1,
                actual: 0,
            });
        }
        let service_type = data[0];
        let mut rest = &data[1..];
        let provider_name = take_prefixed(&mut rest, "service_provider_name")?.to_vec();
        let service_name = take_prefixed(&mut rest, "service_name")?.to_vec();
        Ok(ServiceDescriptor {
            service_type,
            provider_name,
            service_name,
        })
    }

    /// The provider name as text.
    pub fn provider_name(&self) -> Cow<'_, str> {
        decode_text(&self.provider_name)
    }

    /// The service name as text.
    pub fn service_name(&self) -> Cow<'_, str> {
        decode_text(&self.service_name)
    }
}

impl fmt::Debug for ServiceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        f.debug_struct("ServiceDescriptor")
            .field("service_type", &self.service_type)
            .field("provider_name", &self.provider_name())
            .field("service_name", &self.service_name())
            .finish()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn parse() {
        let mut data = vec![0x01];
        data.push(3);
        data.extend_from_slice(b"BBC");
        data.push(7);
        data.extend_from_slice(b"BBC ONE");
        let desc = ServiceDescriptor::parse(&data).unwrap();
        assert_eq!(desc.service_type, 1);
        assert_eq!(desc.provider_name(), "BBC");
        assert_eq!(desc.service_name(), "BBC ONE");
    }

    #[test]
    fn provider_name_overruns_descriptor() {
        // provider_name_length of 200 in a payload with only 2 bytes following,
        let data = [0x01, 200, 0xff, 0xff];
        assert_matches!(
            ServiceDescriptor::parse(&data[..]),
            Err(DescriptorError::NotEnoughData {
                field: "service_provider_name",
                ..
            })
        );
    }

    #[test]
    fn empty_names_allowed() {
        let data = [0x02, 0, 0];
        let desc = ServiceDescriptor::parse(&data[..]).unwrap();
        assert_eq!(desc.provider_name(), "");
        assert_eq!(desc.service_name(), "");
    }
}
