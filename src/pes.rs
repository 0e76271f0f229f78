//! Minimal support for _Packetised Elementary Stream_ syntax.
//!
//! The demultiplexer registers PES filters for the elementary streams announced in a PMT, but
//! reconstruction of PES payloads is out of scope for this crate: only the fixed 6-byte PES
//! packet head is decoded (enough to frame the packet), and completed bodies are discarded.
//! The [`Timestamp`](struct.Timestamp.html) type also serves the _seamless_splice_ field within
//! packet adaptation fields.

use std::fmt;

/// Detail about the formatting problem which prevented a [`Timestamp`](struct.Timestamp.html)
/// value being parsed.
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum TimestampError {
    /// Parsing the timestamp failed because a 'marker-bit' value within the timestamp did not
    /// have the expected value
    MarkerBitNotSet {
        /// the bit-index of the bit which should have been 1, but was found to be 0
        bit_number: u8,
    },
}

/// A 33-bit Elementary Stream timestamp, as used to represent PTS and DTS values, and the
/// _DTS_next_AU_ field of the _seamless_splice_ adaptation field extension.
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub struct Timestamp {
    val: u64,
}
impl Timestamp {
    /// The largest representable timestamp value before the timestamp wraps back around to zero.
    pub const MAX: Timestamp = Timestamp {
        val: (1 << 33) - 1,
    };

    /// 90kHz timebase in which timestamp values are measured.
    pub const TIMEBASE: u64 = 90_000;

    fn check_marker_bit(buf: &[u8], bit_number: u8) -> Result<(), TimestampError> {
        let byte_index = bit_number / 8;
        let bit_index = bit_number % 8;
        let bit_mask = 1 << (7 - bit_index);
        if buf[byte_index as usize] & bit_mask != 0 {
            Ok(())
        } else {
            Err(TimestampError::MarkerBitNotSet { bit_number })
        }
    }

    /// Parse a timestamp value from the 5 bytes at the start of the given slice, without checking
    /// the 4-bit prefix for any particular value.
    ///
    /// Panics if fewer than 5 bytes are given
    pub fn from_bytes(buf: &[u8]) -> Result<Timestamp, TimestampError> {
        Timestamp::check_marker_bit(buf, 7)?;
        Timestamp::check_marker_bit(buf, 23)?;
        Timestamp::check_marker_bit(buf, 39)?;
        Ok(Timestamp {
            val: (u64::from(buf[0] & 0b0000_1110) << 29)
                | u64::from(buf[1]) << 22
                | (u64::from(buf[2] & 0b1111_1110) << 14)
                | u64::from(buf[3]) << 7
                | u64::from(buf[4]) >> 1,
        })
    }

    /// Panics if the given val is greater than 2^33-1
    pub fn from_u64(val: u64) -> Timestamp {
        assert!(val < 1 << 33);
        Timestamp { val }
    }

    /// produces the timestamp's value (only the low 33 bits are used)
    pub fn value(self) -> u64 {
        self.val
    }

    /// returns true if timestamps are likely to have wrapped around since `other`, given a current
    /// timestamp of `self`, and given the two timestamp values were taken no more than about
    /// _13.3 hours_ apart (i.e. no more than half the 26.5-ish hours it takes for the wrap around
    /// to occur).
    pub fn likely_wrapped_since(self, other: Self) -> bool {
        other.val > self.val && other.val - self.val > Self::MAX.val / 2
    }
}

/// An error found while reading the fixed head of a PES packet.
#[derive(Debug, PartialEq, Eq)]
pub enum PesError {
    /// Fewer than `PesHeader::SIZE` bytes were available.
    NotEnoughData {
        /// the number of bytes actually available
        actual: usize,
    },
    /// The 24-bit _packet_start_code_prefix_ did not hold the value `0x000001`.
    BadStartCodePrefix {
        /// the prefix value actually found
        actual: u32,
    },
}

/// The fixed 6-byte head of a PES packet: start-code prefix, stream id, and packet length.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct PesHeader {
    /// The _stream_id_ byte identifying the kind of elementary stream data following.
    pub stream_id: u8,
    /// Number of bytes in the PES packet following this field, or `None` when the field held
    /// zero, which marks a PES packet of unbounded length (permitted for video elementary
    /// streams) that is only delimited by the start of the next packet.
    pub packet_length: Option<u16>,
}

impl PesHeader {
    /// Number of bytes in the fixed PES packet head.
    pub const SIZE: usize = 6;

    /// Decode the 6-byte head at the start of the given slice.
    pub fn from_bytes(buf: &[u8]) -> Result<PesHeader, PesError> {
        if buf.len() < Self::SIZE {
            return Err(PesError::NotEnoughData { actual: buf.len() });
        }
        let prefix = u32::from(buf[0]) << 16 | u32::from(buf[1]) << 8 | u32::from(buf[2]);
        if prefix != 0x00_0001 {
            return Err(PesError::BadStartCodePrefix { actual: prefix });
        }
        let len = u16::from(buf[4]) << 8 | u16::from(buf[5]);
        Ok(PesHeader {
            stream_id: buf[3],
            packet_length: if len == 0 { None } else { Some(len) },
        })
    }
}

/// A PES packet whose extent has been fully reassembled.
///
/// The demultiplexer does not reconstruct elementary stream data; these units are surfaced only
/// so the caller of the reassembler can account for (and discard) them.
#[derive(Debug)]
pub struct CompletedPesPacket {
    /// The fixed head that framed the packet.
    pub header: PesHeader,
    /// The bytes following the fixed head.
    pub body: Vec<u8>,
}

/// Per-PID state machine framing PES packets out of transport packet payloads.
///
/// Follows the same shape as
/// [`psi::SectionReassembler`](../psi/struct.SectionReassembler.html), but PES payloads have no
/// `pointer_field`: a _payload_unit_start_indicator_ packet begins the head at payload offset
/// zero, and ends any PES packet of unbounded length begun earlier.
pub struct PesReassembler {
    buf: Vec<u8>,
    head: Option<PesHeader>,
    started: bool,
}

impl Default for PesReassembler {
    fn default() -> PesReassembler {
        PesReassembler {
            buf: Vec::with_capacity(184),
            head: None,
            started: false,
        }
    }
}

impl PesReassembler {
    /// `true` when a PES head has been parsed and body bytes are still outstanding.
    pub fn has_head(&self) -> bool {
        self.head.is_some()
    }

    /// Feed one packet payload into the state machine.  Any PES packets completed by this
    /// payload are appended to `completed`.
    pub fn push(
        &mut self,
        pusi: bool,
        payload: &[u8],
        completed: &mut Vec<CompletedPesPacket>,
    ) {
        if pusi {
            // a start ends any unbounded-length packet in progress,
            self.flush(completed);
            self.buf.extend_from_slice(payload);
            self.started = true;
            self.try_parse_head();
        } else {
            if !self.started {
                return;
            }
            self.buf.extend_from_slice(payload);
            if self.head.is_none() {
                self.try_parse_head();
            }
        }
        self.flush_if_complete(completed);
    }

    /// Drop all reassembly state, returning to the initial awaiting-start condition.
    pub fn reset(&mut self) {
        self.buf.clear();
        self.head = None;
        self.started = false;
    }

    fn try_parse_head(&mut self) {
        if self.buf.len() < PesHeader::SIZE {
            return;
        }
        match PesHeader::from_bytes(&self.buf) {
            Ok(head) => {
                self.buf.drain(..PesHeader::SIZE);
                self.head = Some(head);
            }
            Err(e) => {
                log::warn!("dropping PES data with bad head: {:?}", e);
                self.reset();
            }
        }
    }

    fn flush(&mut self, completed: &mut Vec<CompletedPesPacket>) {
        if let Some(header) = self.head.take() {
            completed.push(CompletedPesPacket {
                header,
                body: std::mem::take(&mut self.buf),
            });
        }
        self.buf.clear();
        self.started = false;
    }

    fn flush_if_complete(&mut self, completed: &mut Vec<CompletedPesPacket>) {
        if let Some(header) = self.head {
            if let Some(len) = header.packet_length {
                let expected = len as usize;
                if self.buf.len() >= expected {
                    completed.push(CompletedPesPacket {
                        header,
                        body: self.buf[..expected].to_vec(),
                    });
                    self.buf.drain(..expected);
                    self.head = None;
                    self.started = false;
                }
            }
            // unbounded length: the packet ends only at the next payload-unit start
        }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.val)
    }
}
