//! Types related to the _Bouquet Association Table_

use super::nit::{parse_transport_stream_loop, TransportStreamEntry};
use super::TableError;
use crate::descriptor::DescriptorSet;

/// The _Bouquet Association Table_ groups services into a commercial bouquet.  Its shape on the
/// wire matches the NIT: a descriptor loop for the bouquet itself, then a loop of transport
/// stream entries.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Bat {
    /// Descriptors applying to the bouquet as a whole (typically a bouquet name descriptor).
    pub bouquet_descriptors: DescriptorSet,
    /// The transport streams carrying the bouquet's services, in wire order across all sections
    /// of the table.
    pub transport_streams: Vec<TransportStreamEntry>,
}

impl Bat {
    /// Decode one section body (already stripped of its head and trailing CRC bytes), appending
    /// the entries found to this table.
    pub fn push_section(&mut self, body: &[u8]) -> Result<(), TableError> {
        let (bouquet_descriptors, consumed) = DescriptorSet::parse(body)?;
        self.bouquet_descriptors.merge(bouquet_descriptors);
        parse_transport_stream_loop(&body[consumed..], &mut self.transport_streams)
    }
}
