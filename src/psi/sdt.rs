//! Types related to the _Service Description Table_

use super::{RunningStatus, TableError};
use crate::descriptor::DescriptorSet;

/// Describes one service of the transport stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceEntry {
    /// Identifies the service; the same value appears as `program_number` in the PAT.
    pub service_id: u16,
    /// `true` when EIT schedule information for the service is present in this transport stream.
    pub eit_schedule_flag: bool,
    /// `true` when EIT present/following information for the service is present in this
    /// transport stream.
    pub eit_present_following_flag: bool,
    /// The announced status of the service.
    pub running_status: RunningStatus,
    /// `true` when one or more of the service's streams are under conditional access.
    pub free_ca_mode: bool,
    /// Descriptors for this service (typically a service descriptor naming it).
    pub descriptors: DescriptorSet,
}

/// The _Service Description Table_ carries human-readable metadata about the services in a
/// transport stream.
///
/// Table id `0x42` describes the transport stream this table arrived in; `0x46` describes
/// services of some other transport stream.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Sdt {
    /// The network on which the described transport stream originated.
    pub original_network_id: u16,
    /// The service entries, in wire order across all sections of the table.
    pub services: Vec<ServiceEntry>,
}

impl Sdt {
    const ENTRY_HEADER_SIZE: usize = 3;

    /// Decode one section body (already stripped of its head and trailing CRC bytes), appending
    /// the services found to this table.
    pub fn push_section(&mut self, body: &[u8]) -> Result<(), TableError> {
        if body.len() < 3 {
            return Err(TableError::NotEnoughData {
                field: "original_network_id",
                expected: 3,
                actual: body.len(),
            });
        }
        self.original_network_id = u16::from(body[0]) << 8 | u16::from(body[1]);
        // body[2] is reserved
        let mut rest = &body[3..];
        while rest.len() >= Self::ENTRY_HEADER_SIZE {
            let service_id = u16::from(rest[0]) << 8 | u16::from(rest[1]);
            let eit_schedule_flag = rest[2] & 0b0000_0010 != 0;
            let eit_present_following_flag = rest[2] & 0b0000_0001 != 0;
            if rest.len() < Self::ENTRY_HEADER_SIZE + 2 {
                break;
            }
            let running_status = RunningStatus::from(rest[3] >> 5);
            let free_ca_mode = rest[3] & 0b0001_0000 != 0;
            let (descriptors, consumed) = DescriptorSet::parse(&rest[3..])?;
            self.services.push(ServiceEntry {
                service_id,
                eit_schedule_flag,
                eit_present_following_flag,
                running_status,
                free_ca_mode,
                descriptors,
            });
            rest = &rest[3 + consumed..];
        }
        Ok(())
    }

    /// Find the entry for the given service id.
    pub fn service(&self, service_id: u16) -> Option<&ServiceEntry> {
        self.services.iter().find(|s| s.service_id == service_id)
    }
}
