//! Types related to the _Running Status Table_, and the _Discontinuity Information_ /
//! _Selection Information_ tables used in partial transport streams.

use super::{RunningStatus, TableError};
use crate::descriptor::DescriptorSet;

/// A change to the running status of a single event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunningStatusEntry {
    /// The transport stream carrying the event's service.
    pub transport_stream_id: u16,
    /// The network on which that transport stream originated.
    pub original_network_id: u16,
    /// The service the event belongs to.
    pub service_id: u16,
    /// The event whose status changed.
    pub event_id: u16,
    /// The new status.
    pub running_status: RunningStatus,
}

/// The _Running Status Table_ announces last-minute schedule changes: it is sent once, at the
/// moment an event's status changes, rather than repeated like the other SI tables.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Rst {
    /// The status-change entries, in wire order.
    pub statuses: Vec<RunningStatusEntry>,
}

impl Rst {
    const ENTRY_SIZE: usize = 9;

    /// Decode one section body, appending the entries found to this table.  Trailing bytes too
    /// short to form an entry are ignored.
    pub fn push_section(&mut self, body: &[u8]) -> Result<(), TableError> {
        self.statuses
            .extend(body.chunks_exact(Self::ENTRY_SIZE).map(|chunk| {
                RunningStatusEntry {
                    transport_stream_id: u16::from(chunk[0]) << 8 | u16::from(chunk[1]),
                    original_network_id: u16::from(chunk[2]) << 8 | u16::from(chunk[3]),
                    service_id: u16::from(chunk[4]) << 8 | u16::from(chunk[5]),
                    event_id: u16::from(chunk[6]) << 8 | u16::from(chunk[7]),
                    running_status: RunningStatus::from(chunk[8] & 0b0000_0111),
                }
            }));
        Ok(())
    }
}

/// The _Discontinuity Information Table_, inserted at splice points of a partial transport
/// stream.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Dit {
    /// `true` when the splice is a transition between source streams.
    pub transition_flag: bool,
}

impl Dit {
    /// Decode one section body.
    pub fn push_section(&mut self, body: &[u8]) -> Result<(), TableError> {
        if body.is_empty() {
            return Err(TableError::NotEnoughData {
                field: "transition_flag",
                expected: 1,
                actual: 0,
            });
        }
        self.transition_flag = body[0] & 0b1000_0000 != 0;
        Ok(())
    }
}

/// One service entry of the _Selection Information Table_.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SitServiceEntry {
    /// The service described.
    pub service_id: u16,
    /// The announced status of the service.
    pub running_status: RunningStatus,
    /// Descriptors for this service.
    pub descriptors: DescriptorSet,
}

/// The _Selection Information Table_, summarising the original SI context of a partial
/// transport stream.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Sit {
    /// Descriptors applying to the whole partial transport stream.
    pub transmission_descriptors: DescriptorSet,
    /// The service entries, in wire order across all sections of the table.
    pub services: Vec<SitServiceEntry>,
}

impl Sit {
    /// Decode one section body (already stripped of its head and trailing CRC bytes), appending
    /// the services found to this table.
    pub fn push_section(&mut self, body: &[u8]) -> Result<(), TableError> {
        let (transmission_descriptors, consumed) = DescriptorSet::parse(body)?;
        self.transmission_descriptors.merge(transmission_descriptors);
        let mut rest = &body[consumed..];
        while rest.len() >= 4 {
            let service_id = u16::from(rest[0]) << 8 | u16::from(rest[1]);
            let running_status = RunningStatus::from((rest[2] >> 4) & 0b0000_0111);
            let (descriptors, svc_consumed) = DescriptorSet::parse(&rest[2..])?;
            self.services.push(SitServiceEntry {
                service_id,
                running_status,
                descriptors,
            });
            rest = &rest[2 + svc_consumed..];
        }
        Ok(())
    }
}
