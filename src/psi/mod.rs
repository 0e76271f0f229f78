//! Types for processing tables of *Program Specific Information* and DVB *Service Information* in
//! a transport stream.
//!
//! # Concepts
//!
//! * There are multiple standard types of Program Specific Information, like the *Program
//!   Association Table* and *Program Map Table*, and DVB adds *Service Information* tables such
//!   as the *Service Description Table* on top of the same section framing.
//! * A PSI/SI *Table* can split into *Sections*
//! * A Section can be split across a small number of individual transport stream *Packets*, and
//!   conversely several sections may share a packet
//! * Sections are framed by an 8-byte [`SectionHead`](struct.SectionHead.html), whose
//!   `section_length` field drives reassembly
//!
//! # Core types
//!
//! * [`SectionReassembler`](struct.SectionReassembler.html) converts per-PID packet payloads into
//!   complete *Sections*
//! * [`crate::tables::TableStore`](../tables/struct.TableStore.html) converts *Sections* into
//!   *Tables*
//!
//! The specific types of table such as the Program Association Table are defined in the
//! submodules, with only the generic framing functionality here.

pub mod bat;
pub mod cat;
pub mod eit;
pub mod nit;
pub mod pat;
pub mod pmt;
pub mod rst;
pub mod sdt;
pub mod time;
pub mod tsdt;

use crate::descriptor::DescriptorError;
use log::warn;

/// The largest value the 12-bit `section_length` field may legally hold.
pub const MAX_SECTION_LENGTH: u16 = 4093;

/// Initial capacity of a reassembly buffer, the largest payload one packet can carry.
const INITIAL_BUFFER_CAPACITY: usize = 184;

/// An error in the section-level syntax of the stream.
#[derive(Debug, PartialEq, Eq)]
pub enum SectionError {
    /// Fewer bytes were available than the syntax element needs.
    NotEnoughData {
        /// name of the syntax element that could not be read
        field: &'static str,
        /// number of bytes the element needs
        expected: usize,
        /// number of bytes that were actually available
        actual: usize,
    },
    /// The `section_length` field exceeded the legal maximum of 4093.
    SectionTooLong {
        /// the value actually found
        actual: u16,
    },
    /// The `section_length` field was smaller than the 5 bytes of head it must at least cover.
    SectionTooShort {
        /// the value actually found
        actual: u16,
    },
}

/// A problem found while decoding a section body into its table-specific structure.
#[derive(Debug, PartialEq, Eq)]
pub enum TableError {
    /// Fewer bytes were available than the syntax element needs.
    NotEnoughData {
        /// name of the syntax element that could not be read
        field: &'static str,
        /// number of bytes the element needs
        expected: usize,
        /// number of bytes that were actually available
        actual: usize,
    },
    /// A descriptor loop within the body was structurally malformed.
    Descriptor(DescriptorError),
}

impl From<DescriptorError> for TableError {
    fn from(e: DescriptorError) -> TableError {
        TableError::Descriptor(e)
    }
}

/// The announced status of a service or event, per _EN 300 468_ table 6.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum RunningStatus {
    /// No status announced.
    Undefined,
    /// Not running.
    NotRunning,
    /// Starts in a few seconds (e.g. for video recording).
    StartsShortly,
    /// Pausing.
    Pausing,
    /// Running.
    Running,
    /// Service off-air.
    OffAir,
    /// A value the spec reserves.
    Reserved(u8),
}

impl From<u8> for RunningStatus {
    fn from(v: u8) -> RunningStatus {
        match v {
            0 => RunningStatus::Undefined,
            1 => RunningStatus::NotRunning,
            2 => RunningStatus::StartsShortly,
            3 => RunningStatus::Pausing,
            4 => RunningStatus::Running,
            5 => RunningStatus::OffAir,
            _ => RunningStatus::Reserved(v),
        }
    }
}

/// Whether a table is applicable now, or will become applicable at some future time.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum CurrentNext {
    /// The table takes effect immediately.
    Current,
    /// The table is sent ahead of the time at which it takes effect.
    Next,
}

impl CurrentNext {
    fn from(v: u8) -> CurrentNext {
        match v {
            0 => CurrentNext::Next,
            1 => CurrentNext::Current,
            _ => panic!("invalid current_next_indicator value {}", v),
        }
    }
}

/// The 8-byte head at the front of every PSI/SI section.
///
/// The meaning of the `id` field depends on the table the section carries:
/// _13818-1_ refers to it as,
///  - `transport_stream_id` when it appears within a Program Association Section
///  - part of the `reserved` field when it appears within a Conditional Access Section
///  - `program_number` when it appears within a Program Map Section
///  - `table_id_extension` when it appears within a Private Section
///
/// and the DVB SI tables use it for `service_id`, `network_id` or `bouquet_id` as appropriate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionHead {
    /// Identifies the kind of table this section carries.
    pub table_id: u8,
    /// `true` when the section uses the long 'section syntax'.
    pub section_syntax_indicator: bool,
    /// The _private_indicator_ bit.
    pub private_indicator: bool,
    /// Number of bytes following the `section_length` field itself, including the trailing CRC.
    pub section_length: u16,
    /// Table-dependent 16-bit identifier (see type-level docs).
    pub id: u16,
    /// A 5-bit value incremented (mod 32) whenever the content of the table changes.
    pub version: u8,
    /// Is this table applicable now, or does it become applicable at some future time.
    pub current_next_indicator: CurrentNext,
    /// The number of this section, within a potentially multi-section table.
    pub section_number: u8,
    /// Indicates the greatest `section_number` that will appear within the table.
    pub last_section_number: u8,
}

impl SectionHead {
    /// Number of bytes in the head.
    pub const SIZE: usize = 8;

    /// Decode a head from the first 8 bytes of the given slice.
    pub fn parse(buf: &[u8]) -> Result<SectionHead, SectionError> {
        if buf.len() < Self::SIZE {
            return Err(SectionError::NotEnoughData {
                field: "section_head",
                expected: Self::SIZE,
                actual: buf.len(),
            });
        }
        let section_length = u16::from(buf[1] & 0b0000_1111) << 8 | u16::from(buf[2]);
        if section_length > MAX_SECTION_LENGTH {
            return Err(SectionError::SectionTooLong {
                actual: section_length,
            });
        }
        if section_length < 5 {
            return Err(SectionError::SectionTooShort {
                actual: section_length,
            });
        }
        Ok(SectionHead {
            table_id: buf[0],
            section_syntax_indicator: buf[1] & 0b1000_0000 != 0,
            private_indicator: buf[1] & 0b0100_0000 != 0,
            section_length,
            id: u16::from(buf[3]) << 8 | u16::from(buf[4]),
            version: (buf[5] >> 1) & 0b0001_1111,
            current_next_indicator: CurrentNext::from(buf[5] & 1),
            section_number: buf[6],
            last_section_number: buf[7],
        })
    }

    /// Number of section body bytes that follow the head, up to and including the trailing CRC.
    pub fn expected_payload_size(&self) -> usize {
        self.section_length as usize - 5
    }
}

/// A section whose body has been fully reassembled and is ready for table aggregation.
#[derive(Debug, Clone)]
pub struct CompletedSection {
    /// The head that framed the section.
    pub head: SectionHead,
    /// The `head.expected_payload_size()` bytes following the head, including the trailing CRC
    /// bytes (which are not verified by this crate).
    pub body: Vec<u8>,
}

/// Per-PID state machine reassembling PSI/SI sections from packet payloads.
///
/// Bytes are discarded until a packet with _payload_unit_start_indicator_ arrives; the
/// `pointer_field` at the front of that packet's payload splits bytes completing a prior section
/// from the start of the next one.  Once the 8-byte head has been read the `section_length`
/// field determines how many further bytes complete the section.
pub struct SectionReassembler {
    buf: Vec<u8>,
    head: Option<SectionHead>,
    /// a payload-unit start has been seen and the head (once parseable) is ahead of the cursor
    started: bool,
}

impl Default for SectionReassembler {
    fn default() -> SectionReassembler {
        SectionReassembler {
            buf: Vec::with_capacity(INITIAL_BUFFER_CAPACITY),
            head: None,
            started: false,
        }
    }
}

impl SectionReassembler {
    /// `true` when a section head has been parsed and body bytes are still outstanding.
    pub fn has_head(&self) -> bool {
        self.head.is_some()
    }

    /// Number of bytes currently held in the reassembly buffer.
    pub fn accumulated(&self) -> usize {
        self.buf.len()
    }

    /// Feed one packet payload into the state machine.  Any sections completed by this payload
    /// are appended to `completed`.
    pub fn push(
        &mut self,
        pusi: bool,
        payload: &[u8],
        completed: &mut Vec<CompletedSection>,
    ) -> Result<(), SectionError> {
        if payload.is_empty() {
            return Ok(());
        }
        if pusi {
            let pointer = payload[0] as usize;
            let section_data = &payload[1..];
            if pointer > section_data.len() {
                warn!("section pointer_field beyond end of packet payload");
                self.reset();
                return Ok(());
            }
            // bytes up to the pointer complete a section begun in an earlier packet,
            self.buf.extend_from_slice(&section_data[..pointer]);
            self.flush(completed);
            self.buf.extend_from_slice(&section_data[pointer..]);
            self.started = true;
            self.try_parse_head()?;
        } else {
            if !self.started {
                // no start seen yet on this PID; discard until one arrives
                return Ok(());
            }
            self.buf.extend_from_slice(payload);
            if self.head.is_none() {
                // the head itself straddled a packet boundary
                self.try_parse_head()?;
            }
        }
        self.flush_if_complete(completed);
        Ok(())
    }

    /// Dispatch the completed section, if the accumulator holds one.  Called at end-of-input to
    /// drain a section whose final byte coincided with the end of the buffer.
    pub fn flush_pending(&mut self, completed: &mut Vec<CompletedSection>) {
        self.flush_if_complete(completed);
    }

    /// Drop all reassembly state, returning to the initial awaiting-start condition.
    pub fn reset(&mut self) {
        self.buf.clear();
        self.head = None;
        self.started = false;
    }

    fn try_parse_head(&mut self) -> Result<(), SectionError> {
        if self.buf.len() < SectionHead::SIZE {
            return Ok(());
        }
        let head = match SectionHead::parse(&self.buf) {
            Ok(head) => head,
            Err(e) => {
                self.reset();
                return Err(e);
            }
        };
        self.buf.drain(..SectionHead::SIZE);
        self.head = Some(head);
        Ok(())
    }

    /// empty the accumulator, dispatching its contents when they form a complete section
    fn flush(&mut self, completed: &mut Vec<CompletedSection>) {
        if let Some(head) = self.head {
            let expected = head.expected_payload_size();
            if self.buf.len() >= expected {
                completed.push(CompletedSection {
                    head,
                    body: self.buf[..expected].to_vec(),
                });
            } else {
                warn!(
                    "discarding incomplete section: table_id {:#x} had {} of {} body bytes",
                    head.table_id,
                    self.buf.len(),
                    expected
                );
            }
        }
        self.buf.clear();
        self.head = None;
        self.started = false;
    }

    fn flush_if_complete(&mut self, completed: &mut Vec<CompletedSection>) {
        if let Some(head) = self.head {
            let expected = head.expected_payload_size();
            if self.buf.len() >= expected {
                completed.push(CompletedSection {
                    head,
                    body: self.buf[..expected].to_vec(),
                });
                // leftover bytes (stuffing, or the tail the next pointer_field will discard)
                // stay in the buffer
                self.buf.drain(..expected);
                self.head = None;
                self.started = false;
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use assert_matches::assert_matches;

    fn head_bytes(table_id: u8, section_length: u16, version: u8, sect: u8, last: u8) -> [u8; 8] {
        [
            table_id,
            0b1011_0000 | (section_length >> 8) as u8,
            (section_length & 0xff) as u8,
            0x00,
            0x01,
            0b1100_0000 | (version << 1) | 1,
            sect,
            last,
        ]
    }

    #[test]
    fn parse_head() {
        let buf = head_bytes(0x42, 0x11, 3, 0, 1);
        let head = SectionHead::parse(&buf[..]).unwrap();
        assert_eq!(head.table_id, 0x42);
        assert_eq!(head.section_length, 0x11);
        assert_eq!(head.id, 1);
        assert_eq!(head.version, 3);
        assert_eq!(head.current_next_indicator, CurrentNext::Current);
        assert_eq!(head.section_number, 0);
        assert_eq!(head.last_section_number, 1);
        assert_eq!(head.expected_payload_size(), 0x11 - 5);
    }

    #[test]
    fn head_too_long() {
        let buf = head_bytes(0x42, 4094, 0, 0, 0);
        assert_matches!(
            SectionHead::parse(&buf[..]),
            Err(SectionError::SectionTooLong { actual: 4094 })
        );
    }

    #[test]
    fn head_too_short() {
        let buf = head_bytes(0x42, 4, 0, 0, 0);
        assert_matches!(
            SectionHead::parse(&buf[..]),
            Err(SectionError::SectionTooShort { actual: 4 })
        );
    }

    /// payload for a PUSI packet: pointer_field then the given section bytes
    fn pusi_payload(section: &[u8]) -> Vec<u8> {
        let mut payload = vec![0u8];
        payload.extend_from_slice(section);
        payload
    }

    fn section_of_body_len(body_len: usize) -> Vec<u8> {
        let mut sect = head_bytes(0x42, (body_len + 5) as u16, 0, 0, 0).to_vec();
        sect.extend(std::iter::repeat(0xaa).take(body_len));
        sect
    }

    #[test]
    fn single_packet_section() {
        let mut r = SectionReassembler::default();
        let mut completed = Vec::new();
        let sect = section_of_body_len(20);
        r.push(true, &pusi_payload(&sect), &mut completed).unwrap();
        assert_eq!(completed.len(), 1);
        assert_eq!(completed[0].head.table_id, 0x42);
        assert_eq!(completed[0].body.len(), 20);
        assert!(!r.has_head());
    }

    #[test]
    fn section_spanning_packets() {
        let mut r = SectionReassembler::default();
        let mut completed = Vec::new();
        let sect = section_of_body_len(250);
        // first packet carries the head and 175 body bytes,
        r.push(true, &pusi_payload(&sect[..183]), &mut completed)
            .unwrap();
        assert!(completed.is_empty());
        assert!(r.has_head());
        // second packet carries the remaining 75 bytes plus stuffing,
        let mut second = sect[183..].to_vec();
        second.extend(std::iter::repeat(0xff).take(100));
        r.push(false, &second, &mut completed).unwrap();
        assert_eq!(completed.len(), 1);
        assert_eq!(completed[0].body.len(), 250);
        // the stuffing remains but no head is pending,
        assert!(!r.has_head());
        assert!(completed[0].body.len() > r.accumulated());
    }

    #[test]
    fn pointer_field_completes_prior_section() {
        let mut r = SectionReassembler::default();
        let mut completed = Vec::new();
        let first = section_of_body_len(30);
        let second = section_of_body_len(10);
        // head and 20 of the 30 body bytes,
        r.push(true, &pusi_payload(&first[..28]), &mut completed)
            .unwrap();
        assert!(completed.is_empty());
        // next packet: pointer_field=10 finishes the first section, then the second begins
        let mut payload = vec![10u8];
        payload.extend_from_slice(&first[28..]);
        payload.extend_from_slice(&second);
        r.push(true, &payload, &mut completed).unwrap();
        assert_eq!(completed.len(), 2);
        assert_eq!(completed[0].body.len(), 30);
        assert_eq!(completed[1].body.len(), 10);
    }

    #[test]
    fn discards_until_payload_unit_start() {
        let mut r = SectionReassembler::default();
        let mut completed = Vec::new();
        r.push(false, &[0xaa; 184], &mut completed).unwrap();
        assert_eq!(r.accumulated(), 0);
        assert!(completed.is_empty());
    }

    #[test]
    fn head_split_across_packets() {
        let mut r = SectionReassembler::default();
        let mut completed = Vec::new();
        let sect = section_of_body_len(10);
        // only 3 bytes of the head arrive in the starting packet,
        r.push(true, &pusi_payload(&sect[..3]), &mut completed)
            .unwrap();
        assert!(!r.has_head());
        r.push(false, &sect[3..], &mut completed).unwrap();
        assert_eq!(completed.len(), 1);
        assert_eq!(completed[0].body.len(), 10);
    }

    #[test]
    fn pointer_beyond_payload_resets() {
        let mut r = SectionReassembler::default();
        let mut completed = Vec::new();
        let payload = [200u8, 0xff, 0xff];
        r.push(true, &payload, &mut completed).unwrap();
        assert_eq!(r.accumulated(), 0);
        assert!(completed.is_empty());
    }

    #[test]
    fn oversize_section_length_is_error() {
        let mut r = SectionReassembler::default();
        let mut completed = Vec::new();
        let mut sect = head_bytes(0x42, 4094, 0, 0, 0).to_vec();
        sect.extend_from_slice(&[0u8; 20]);
        assert_matches!(
            r.push(true, &pusi_payload(&sect), &mut completed),
            Err(SectionError::SectionTooLong { .. })
        );
        // the error resets the machine,
        assert_eq!(r.accumulated(), 0);
        assert!(!r.has_head());
    }

    #[test]
    fn incomplete_section_dropped_at_next_start() {
        let mut r = SectionReassembler::default();
        let mut completed = Vec::new();
        let lost = section_of_body_len(100);
        // only the head and a few bytes of the section ever arrive,
        r.push(true, &pusi_payload(&lost[..20]), &mut completed)
            .unwrap();
        // ...before the next section starts with pointer_field=0
        let next = section_of_body_len(8);
        r.push(true, &pusi_payload(&next), &mut completed).unwrap();
        assert_eq!(completed.len(), 1);
        assert_eq!(completed[0].body.len(), 8);
    }
}
