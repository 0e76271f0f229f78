//! Support for the _CA descriptor_, which announces the PID carrying conditional-access data
//! (EMM streams when it appears in the CAT, ECM streams when attached to a PMT entry).

use super::DescriptorError;
use crate::packet::Pid;

/// Location of conditional-access data for a scrambling system.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct ConditionalAccessDescriptor {
    /// Identifies the conditional-access system in use.
    pub ca_system_id: u16,
    /// The PID on which the system's entitlement data is carried.
    pub ca_pid: Pid,
    /// System-specific bytes following the fixed fields.
    pub private_data: Vec<u8>,
}

impl ConditionalAccessDescriptor {
    /// The tag value `0x09` identifying this descriptor kind.
    pub const TAG: u8 = 0x09;

    /// Decode from descriptor payload bytes.
    pub fn parse(data: &[u8]) -> Result<ConditionalAccessDescriptor, DescriptorError> {
        if data.len() < 4 {
            return Err(DescriptorError::NotEnoughData {
                field: "ca_descriptor",
                expected: 4,
                actual: data.len(),
            });
        }
        Ok(ConditionalAccessDescriptor {
            ca_system_id: u16::from(data[0]) << 8 | u16::from(data[1]),
            ca_pid: Pid::new(u16::from(data[2] & 0b0001_1111) << 8 | u16::from(data[3])),
            private_data: data[4..].to_vec(),
        })
    }
}
