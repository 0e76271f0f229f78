//! Types related to the _Transport Stream Description Table_

use super::TableError;
use crate::descriptor::DescriptorSet;

/// The _Transport Stream Description Table_ carries descriptors that apply to the multiplex as a
/// whole.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Tsdt {
    /// The descriptors, accumulated across all sections of the table.
    pub descriptors: DescriptorSet,
}

impl Tsdt {
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

    #[test]
    fn unknown_descriptor_kept_raw() {
        let body = [0xf0, 0x03, 0x80, 0x01, 0xaa];
        let mut tsdt = Tsdt::default();
        tsdt.push_section(&body[..]).unwrap();
        assert_eq!(tsdt.descriptors.len(), 1);
        assert!(!tsdt.descriptors.iter().next().unwrap().is_parsed());
    }
}
