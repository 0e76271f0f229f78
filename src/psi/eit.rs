//! Types related to the _Event Information Table_
//!
//! Table ids `0x4e`/`0x4f` carry present/following information for the actual/other transport
//! stream; the ranges `0x50..=0x5f` and `0x60..=0x6f` carry schedule information, split across
//! many tables so that a receiver can fetch a limited time span cheaply.

use super::time::{Duration, UtcTime};
use super::{RunningStatus, TableError};
use crate::descriptor::DescriptorSet;

/// First table id of the EIT-schedule range for the actual transport stream.
pub const TABLE_ID_SCHEDULE_FIRST: u8 = 0x50;
/// Last table id of the EIT-schedule range (other transport stream sub-range included).
pub const TABLE_ID_SCHEDULE_LAST: u8 = 0x6f;

/// One event within a service's schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventEntry {
    /// Identifies the event within the service.
    pub event_id: u16,
    /// Start time of the event, or `None` when undefined (all-ones on the wire, used e.g. for
    /// an empty 'following' slot).
    pub start_time: Option<UtcTime>,
    /// Scheduled length of the event.
    pub duration: Duration,
    /// The announced status of the event.
    pub running_status: RunningStatus,
    /// `true` when one or more of the event's streams are under conditional access.
    pub free_ca_mode: bool,
    /// Descriptors for this event (typically a short event descriptor naming it).
    pub descriptors: DescriptorSet,
}

/// The _Event Information Table_ carries per-event schedule and now/next programming metadata
/// for one service (named by the section head's `id` field).
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Eit {
    /// The transport stream carrying the described service.
    pub transport_stream_id: u16,
    /// The network on which that transport stream originated.
    pub original_network_id: u16,
    /// The last section number of this table's segment, allowing receivers to skip to the next
    /// segment without waiting out the gap.
    pub segment_last_section_number: u8,
    /// The last table id in use for this service's schedule.
    pub last_table_id: u8,
    /// The event entries, in wire order across all sections of the table.
    pub events: Vec<EventEntry>,
}

impl Eit {
    const FIXED_SIZE: usize = 6;
    const ENTRY_HEADER_SIZE: usize = 12;

    /// Decode one section body (already stripped of its head and trailing CRC bytes), appending
    /// the events found to this table.
    pub fn push_section(&mut self, body: &[u8]) -> Result<(), TableError> {
        if body.len() < Self::FIXED_SIZE {
            return Err(TableError::NotEnoughData {
                field: "event_information_section",
                expected: Self::FIXED_SIZE,
                actual: body.len(),
            });
        }
        self.transport_stream_id = u16::from(body[0]) << 8 | u16::from(body[1]);
        self.original_network_id = u16::from(body[2]) << 8 | u16::from(body[3]);
        self.segment_last_section_number = body[4];
        self.last_table_id = body[5];
        let mut rest = &body[Self::FIXED_SIZE..];
        while rest.len() >= Self::ENTRY_HEADER_SIZE {
            let event_id = u16::from(rest[0]) << 8 | u16::from(rest[1]);
            let start_time = if rest[2..7] == [0xff; 5] {
                None
            } else {
                Some(UtcTime::from_bytes(&rest[2..7]))
            };
            let duration = Duration::from_bytes(&rest[7..10]);
            let running_status = RunningStatus::from(rest[10] >> 5);
            let free_ca_mode = rest[10] & 0b0001_0000 != 0;
            let (descriptors, consumed) = DescriptorSet::parse(&rest[10..])?;
            self.events.push(EventEntry {
                event_id,
                start_time,
                duration,
                running_status,
                free_ca_mode,
                descriptors,
            });
            rest = &rest[10 + consumed..];
        }
        Ok(())
    }

    /// Find the entry for the given event id.
    pub fn event(&self, event_id: u16) -> Option<&EventEntry> {
        self.events.iter().find(|e| e.event_id == event_id)
    }
}
