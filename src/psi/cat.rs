//! Types related to the _Conditional Access Table_

use super::TableError;
use crate::descriptor::DescriptorSet;

/// The _Conditional Access Table_ carries descriptors locating the entitlement-management
/// streams of whatever scrambling systems the multiplex uses.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Cat {
    /// The descriptors, accumulated across all sections of the table.
    pub descriptors: DescriptorSet,
}

impl Cat {
    /// Decode one section body (already stripped of its head and trailing CRC bytes).
    pub fn push_section(&mut self, body: &[u8]) -> Result<(), TableError> {
        let (descriptors, _consumed) = DescriptorSet::parse(body)?;
        self.descriptors.merge(descriptors);
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::descriptor::DescriptorPayload;
    use crate::packet::Pid;

    #[test]
    fn ca_descriptor() {
        let body = [
            0xf0, 0x06, // descriptor loop length
            0x09, 0x04, 0x06, 0x04, 0xe0, 0x99, // CA descriptor: system 0x0604, pid 0x99
        ];
        let mut cat = Cat::default();
        cat.push_section(&body[..]).unwrap();
        assert_eq!(cat.descriptors.len(), 1);
        let desc = cat.descriptors.iter().next().unwrap();
        match &desc.payload {
            DescriptorPayload::ConditionalAccess(ca) => {
                assert_eq!(ca.ca_system_id, 0x0604);
                assert_eq!(ca.ca_pid, Pid::new(0x99));
            }
            other => panic!("unexpected descriptor payload {:?}", other),
        }
    }
}
