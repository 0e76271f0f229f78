//! Support for the _service list descriptor_, which enumerates the services within one transport
//! stream entry of a NIT or BAT.

use super::DescriptorError;

/// One (service id, service type) pair.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct ServiceListEntry {
    /// The service this entry refers to.
    pub service_id: u16,
    /// The kind of service, per _EN 300 468_ table 87 (e.g. `0x01` digital television).
    pub service_type: u8,
}

/// The list of services a transport stream carries.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct ServiceListDescriptor {
    /// The service entries, in wire order.
    pub services: Vec<ServiceListEntry>,
}

impl ServiceListDescriptor {
    /// The tag value `0x41` identifying this descriptor kind.
    pub const TAG: u8 = 0x41;

    const ENTRY_SIZE: usize = 3;

    /// Decode from descriptor payload bytes; the payload must be a whole number of 3-byte
    /// entries.
    pub fn parse(data: &[u8]) -> Result<ServiceListDescriptor, DescriptorError> {
        if data.len() % Self::ENTRY_SIZE != 0 {
            return Err(DescriptorError::UnevenLength {
                entry_size: Self::ENTRY_SIZE,
                actual: data.len(),
            });
        }
        let services = data
            .chunks_exact(Self::ENTRY_SIZE)
            .map(|chunk| ServiceListEntry {
                service_id: u16::from(chunk[0]) << 8 | u16::from(chunk[1]),
                service_type: chunk[2],
            })
            .collect();
        Ok(ServiceListDescriptor { services })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn parse() {
        let data = [0x00, 0x01, 0x01, 0x10, 0x02, 0x02];
        let desc = ServiceListDescriptor::parse(&data[..]).unwrap();
        assert_eq!(desc.services.len(), 2);
        assert_eq!(desc.services[0].service_id, 1);
        assert_eq!(desc.services[0].service_type, 1);
        assert_eq!(desc.services[1].service_id, 0x1002);
        assert_eq!(desc.services[1].service_type, 2);
    }

    #[test]
    fn uneven_length() {
        assert_matches!(
            ServiceListDescriptor::parse(&[0x00, 0x01]),
            Err(DescriptorError::UnevenLength {
                entry_size: 3,
                actual: 2
            })
        );
    }
}
