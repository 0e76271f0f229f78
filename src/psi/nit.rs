//! Types related to the _Network Information Table_

use super::TableError;
use crate::descriptor::DescriptorSet;

/// One transport stream within a network (or bouquet), with the descriptors that describe its
/// delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportStreamEntry {
    /// Identifies the transport stream within the original network.
    pub transport_stream_id: u16,
    /// The network on which the transport stream originated.
    pub original_network_id: u16,
    /// Descriptors for this transport stream (delivery system parameters, service lists, …).
    pub descriptors: DescriptorSet,
}

/// parse the `[12-bit length | entries…]` transport-stream loop shared by the NIT and BAT
pub(super) fn parse_transport_stream_loop(
    buf: &[u8],
    out: &mut Vec<TransportStreamEntry>,
) -> Result<(), TableError> {
    if buf.len() < 2 {
        return Err(TableError::NotEnoughData {
            field: "transport_stream_loop_length",
            expected: 2,
            actual: buf.len(),
        });
    }
    let loop_length = (usize::from(buf[0] & 0b0000_1111) << 8) | usize::from(buf[1]);
    if 2 + loop_length > buf.len() {
        return Err(TableError::NotEnoughData {
            field: "transport_stream_loop",
            expected: loop_length,
            actual: buf.len() - 2,
        });
    }
    let mut rest = &buf[2..2 + loop_length];
    while rest.len() >= 4 {
        let transport_stream_id = u16::from(rest[0]) << 8 | u16::from(rest[1]);
        let original_network_id = u16::from(rest[2]) << 8 | u16::from(rest[3]);
        let (descriptors, consumed) = DescriptorSet::parse(&rest[4..])?;
        out.push(TransportStreamEntry {
            transport_stream_id,
            original_network_id,
            descriptors,
        });
        rest = &rest[4 + consumed..];
    }
    Ok(())
}

/// The _Network Information Table_ describes the physical network carrying the multiplex: its
/// name, and the tuning parameters of each transport stream it delivers.
///
/// Table id `0x40` describes the network this multiplex belongs to; `0x41` describes some other
/// network.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Nit {
    /// Descriptors applying to the network as a whole (typically a network name descriptor).
    pub network_descriptors: DescriptorSet,
    /// The transport streams of the network, in wire order across all sections of the table.
    pub transport_streams: Vec<TransportStreamEntry>,
}

impl Nit {
    /// Decode one section body (already stripped of its head and trailing CRC bytes), appending
    /// the entries found to this table.
    pub fn push_section(&mut self, body: &[u8]) -> Result<(), TableError> {
        let (network_descriptors, consumed) = DescriptorSet::parse(body)?;
        self.network_descriptors.merge(network_descriptors);
        parse_transport_stream_loop(&body[consumed..], &mut self.transport_streams)
    }
}
