//! A [`Packet`](struct.Packet.html) struct and associated infrastructure to read an MPEG Transport
//! Stream packet

use crate::pes;
use log::{debug, warn};
use std::fmt;

/// the different values indicating whether a `Packet`'s `adaptation_field()` and `payload()`
/// methods will return `Some` or `None`.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum AdaptationControl {
    /// This value is used if the transport stream packet `adaptation_field_control` field uses the
    /// value `0b00`, which is not defined by the spec.
    Reserved,
    /// indicates that this packet contains a payload, but not an adaptation field
    PayloadOnly,
    /// indicates that this packet contains an adaptation field, but not a payload
    AdaptationFieldOnly,
    /// indicates that this packet contains both an adaptation field and a payload
    AdaptationFieldAndPayload,
}

impl AdaptationControl {
    #[inline(always)]
    fn from(val: u8) -> AdaptationControl {
        match val {
            0 => AdaptationControl::Reserved,
            1 => AdaptationControl::PayloadOnly,
            2 => AdaptationControl::AdaptationFieldOnly,
            3 => AdaptationControl::AdaptationFieldAndPayload,
            _ => panic!("invalid value {}", val),
        }
    }

    /// True if this AdaptationControl variant indicates that the packet will have a payload
    #[inline(always)]
    pub fn has_payload(self) -> bool {
        match self {
            AdaptationControl::Reserved | AdaptationControl::AdaptationFieldOnly => false,
            AdaptationControl::PayloadOnly | AdaptationControl::AdaptationFieldAndPayload => true,
        }
    }

    /// True if this AdaptationControl variant indicates that the packet will have an adaptation
    /// field
    #[inline(always)]
    pub fn has_adaptation_field(self) -> bool {
        match self {
            AdaptationControl::Reserved | AdaptationControl::PayloadOnly => false,
            AdaptationControl::AdaptationFieldOnly
            | AdaptationControl::AdaptationFieldAndPayload => true,
        }
    }
}

/// Indicates content scrambling in use, if any.
///
/// Actual content scrambling schemes, indicated through the `u8` value in the `Undefined` variant,
/// are undefined in the main TS spec (left to be described by other specifications).
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum TransportScramblingControl {
    /// The stream is not scrambled.
    NotScrambled,
    /// The stream is scrambled using a scheme not defined in the TS spec.
    Undefined(u8),
}

impl TransportScramblingControl {
    fn from(val: u8) -> TransportScramblingControl {
        match val {
            0 => TransportScramblingControl::NotScrambled,
            1..=3 => TransportScramblingControl::Undefined(val),
            _ => panic!("invalid value {}", val),
        }
    }
}

/// A _Clock Reference_ is used to represent the values of PCR and OPCR fields within the transport
/// stream data.
///
/// A _Clock Reference_ includes a 33-bit, 90kHz `base` component, together with another 9-bit,
/// high-resolution `extension` component (6 reserved bits sit between the two on the wire).
///
/// Together these can be viewed as a 42-bit, 27MHz quantity (e.g. `let full_value: u64 =
/// pcr.into()`).  Since the base is limited to 33 bits, at a rate of 90kHz a continuously
/// increasing clock value will wrap around approximately every 26.5 hours.
#[derive(Copy, Clone, Eq)]
pub struct ClockRef {
    base: u64,
    extension: u16,
}

impl PartialEq for ClockRef {
    fn eq(&self, other: &ClockRef) -> bool {
        self.base == other.base && self.extension == other.extension
    }
}

impl From<ClockRef> for u64 {
    fn from(pcr: ClockRef) -> u64 {
        pcr.base * 300 + u64::from(pcr.extension)
    }
}

impl fmt::Debug for ClockRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        write!(f, "PCR{{{:08x}:{:04x}}}", self.base, self.extension)
    }
}

impl ClockRef {
    /// Number of bytes a clock reference occupies on the wire.
    pub const SIZE: usize = 6;

    /// Panics if `data` is shorter than 6 bytes
    pub fn from_slice(data: &[u8]) -> ClockRef {
        ClockRef {
            base: u64::from(data[0]) << 25
                | u64::from(data[1]) << 17
                | u64::from(data[2]) << 9
                | u64::from(data[3]) << 1
                | u64::from(data[4]) >> 7,
            extension: (u16::from(data[4]) & 0b1) << 8 | u16::from(data[5]),
        }
    }

    /// Panics if the `base` is greater than 2^33-1 or the `extension` is greater than 2^9-1
    pub fn from_parts(base: u64, extension: u16) -> ClockRef {
        assert!(base < (1 << 33));
        assert!(extension < (1 << 9));
        ClockRef { base, extension }
    }

    /// get the 33-bit, 90kHz 'base' component of the timestamp
    pub fn base(&self) -> u64 {
        self.base
    }

    /// get the 9-bit 'extension' component of the timestamp, measured in 300ths of the 90kHz base
    /// clockrate (i.e. 27MHz)
    pub fn extension(&self) -> u16 {
        self.extension
    }
}

/// Some error encountered while parsing packet or adaptation field syntax
#[derive(Debug, PartialEq, Eq)]
pub enum PacketError {
    /// The buffer given to `Packet::new()` was not exactly 188 bytes long.
    UnexpectedLength {
        /// the length of the buffer actually given
        actual: usize,
    },
    /// The first byte of the buffer did not hold the value `0x47`.
    BadSyncByte {
        /// the value actually found in the first byte
        actual: u8,
    },
    /// There is a syntactic problem in the data being parsed, and not enough bytes remain to hold
    /// a component which the flag bits announce to be present.
    NotEnoughData {
        /// name of the syntax element that could not be read
        field: &'static str,
        /// number of bytes the element needs
        expected: usize,
        /// number of bytes that were actually available
        actual: usize,
    },
    /// The `seamless_splice` field's embedded timestamp had bad marker bits.
    SpliceTimestampError(pes::TimestampError),
}

/// Cursor over a byte slice; every read checks the remaining length so that flag-gated optional
/// fields either parse completely or fail with `NotEnoughData`.
struct Cursor<'buf> {
    buf: &'buf [u8],
    pos: usize,
}

impl<'buf> Cursor<'buf> {
    fn new(buf: &'buf [u8]) -> Cursor<'buf> {
        Cursor { buf, pos: 0 }
    }

    fn take(&mut self, field: &'static str, len: usize) -> Result<&'buf [u8], PacketError> {
        if self.pos + len > self.buf.len() {
            return Err(PacketError::NotEnoughData {
                field,
                expected: len,
                actual: self.buf.len() - self.pos,
            });
        }
        let s = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(s)
    }

    fn take_byte(&mut self, field: &'static str) -> Result<u8, PacketError> {
        Ok(self.take(field, 1)?[0])
    }
}

/// Value of the _seamless_splice_ field within an
/// [`AdaptationFieldExtension`](struct.AdaptationFieldExtension.html)
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct SeamlessSplice {
    /// see _ISO/IEC 13818-1_, Table 2-7 through Table 2-16
    pub splice_type: u8,
    /// The DTS of the access unit after the splice-point.
    pub dts_next_au: pes::Timestamp,
}

/// Optional extensions within an [`AdaptationField`](struct.AdaptationField.html).
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct AdaptationFieldExtension {
    /// The 'Legal time window offset', available when the LTW flag was set and the offset marked
    /// valid.
    pub ltw_offset: Option<u16>,
    /// Value of the _piecewise_rate_ field, if present.
    pub piecewise_rate: Option<u32>,
    /// Value of the _seamless_splice_ field, if present.
    pub seamless_splice: Option<SeamlessSplice>,
}

impl AdaptationFieldExtension {
    /// Parse the body of an `adaptation_field_extension()`, the fields of which are present or
    /// absent per the flags in the leading byte.
    pub fn parse(buf: &[u8]) -> Result<AdaptationFieldExtension, PacketError> {
        let mut cur = Cursor::new(buf);
        let flags = cur.take_byte("adaptation_field_extension_flags")?;
        let ltw_flag = flags & 0b1000_0000 != 0;
        let piecewise_rate_flag = flags & 0b0100_0000 != 0;
        let seamless_splice_flag = flags & 0b0010_0000 != 0;
        let af_descriptor_not_present = flags & 0b0001_0000 != 0;
        let ltw_offset = if ltw_flag {
            let dat = cur.take("ltw_offset", 2)?;
            let ltw_valid_flag = dat[0] & 0b1000_0000 != 0;
            if ltw_valid_flag {
                Some(u16::from(dat[0] & 0b0111_1111) << 8 | u16::from(dat[1]))
            } else {
                None
            }
        } else {
            None
        };
        let piecewise_rate = if piecewise_rate_flag {
            let dat = cur.take("piecewise_rate", 3)?;
            Some(u32::from(dat[0] & 0b0011_1111) << 16 | u32::from(dat[1]) << 8 | u32::from(dat[2]))
        } else {
            None
        };
        let seamless_splice = if seamless_splice_flag {
            let dat = cur.take("seamless_splice", 5)?;
            Some(SeamlessSplice {
                splice_type: dat[0] >> 4,
                dts_next_au: pes::Timestamp::from_bytes(dat)
                    .map_err(PacketError::SpliceTimestampError)?,
            })
        } else {
            None
        };
        if !af_descriptor_not_present && cur.pos < buf.len() {
            // the af_descriptor() loop is announced, but there is no support for reading it
            debug!(
                "skipping {} bytes of unsupported af_descriptor() data",
                buf.len() - cur.pos
            );
        }
        Ok(AdaptationFieldExtension {
            ltw_offset,
            piecewise_rate,
            seamless_splice,
        })
    }
}

/// A collection of fields that may optionally appear within the header of a transport stream
/// `Packet`.
///
/// As returned by [`Packet::adaptation_field()`](struct.Packet.html#method.adaptation_field).
/// The flag-gated optional components are parsed eagerly, strictly left-to-right, so any
/// truncation within the field is reported as an error at parse time.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct AdaptationField<'buf> {
    /// Might have been set by some 'upstream' processor on discovering that there was a break in
    /// the data.
    pub discontinuity_indicator: bool,
    /// Value of the _random_access_indicator_ field.
    pub random_access_indicator: bool,
    /// Value of the _elementary_stream_priority_indicator_ field.
    pub elementary_stream_priority_indicator: bool,
    /// The _Program Clock Reference_, if present.
    pub pcr: Option<ClockRef>,
    /// The _Original Program Clock Reference_, if present.
    pub opcr: Option<ClockRef>,
    /// Value of the _splice_countdown_ field, if present.
    pub splice_countdown: Option<i8>,
    /// The _transport_private_data_ bytes, if present (at most 183 bytes).
    pub private_data: Option<&'buf [u8]>,
    /// Extended adaptation fields, if present.
    pub extension: Option<AdaptationFieldExtension>,
}

impl<'buf> AdaptationField<'buf> {
    /// Parse an adaptation field from the given slice, which must hold exactly
    /// `adaptation_field_length` bytes.
    pub fn parse(buf: &'buf [u8]) -> Result<AdaptationField<'buf>, PacketError> {
        let mut cur = Cursor::new(buf);
        let flags = cur.take_byte("adaptation_field_flags")?;
        let pcr = if flags & 0b0001_0000 != 0 {
            Some(ClockRef::from_slice(cur.take("pcr", ClockRef::SIZE)?))
        } else {
            None
        };
        let opcr = if flags & 0b0000_1000 != 0 {
            Some(ClockRef::from_slice(cur.take("opcr", ClockRef::SIZE)?))
        } else {
            None
        };
        let splice_countdown = if flags & 0b0000_0100 != 0 {
            Some(cur.take_byte("splice_countdown")? as i8)
        } else {
            None
        };
        let private_data = if flags & 0b0000_0010 != 0 {
            let len = cur.take_byte("transport_private_data_length")? as usize;
            Some(cur.take("transport_private_data", len)?)
        } else {
            None
        };
        let extension = if flags & 0b0000_0001 != 0 {
            let len = cur.take_byte("adaptation_field_extension_length")? as usize;
            Some(AdaptationFieldExtension::parse(cur.take(
                "adaptation_field_extension",
                len,
            )?)?)
        } else {
            None
        };
        // any remaining bytes are stuffing
        Ok(AdaptationField {
            discontinuity_indicator: flags & 0b1000_0000 != 0,
            random_access_indicator: flags & 0b0100_0000 != 0,
            elementary_stream_priority_indicator: flags & 0b0010_0000 != 0,
            pcr,
            opcr,
            splice_countdown,
            private_data,
            extension,
        })
    }
}

/// A counter value used within a transport stream to detect discontinuities in a sequence of
/// packets.  The continuity counter should increase by one for each packet with a given PID for
/// which `adaptation_control` indicates that a payload should be present.
///
/// See [`Packet::continuity_counter()`](struct.Packet.html#method.continuity_counter)
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub struct ContinuityCounter {
    val: u8,
}

impl From<u8> for ContinuityCounter {
    #[inline]
    fn from(count: u8) -> ContinuityCounter {
        ContinuityCounter::new(count)
    }
}

impl ContinuityCounter {
    /// Panics if the given value is greater than 15.
    #[inline]
    pub fn new(count: u8) -> ContinuityCounter {
        assert!(count < 0b10000);
        ContinuityCounter { val: count }
    }

    /// Returns this counter's value, which will be between 0 and 15 inclusive.
    #[inline]
    pub fn count(self) -> u8 {
        self.val
    }

    /// true iff the given `ContinuityCounter` value follows this one.  Note that the maximum
    /// counter value is 15, and the counter 'wraps around':
    ///
    /// ```rust
    /// # use mpegts_tables::packet::ContinuityCounter;
    /// let a = ContinuityCounter::new(0);
    /// let b = ContinuityCounter::new(15);
    /// assert!(a.follows(b));  // after 15, counter wraps around to 0
    /// ```
    #[inline]
    pub fn follows(self, other: ContinuityCounter) -> bool {
        (other.val + 1) & 0b1111 == self.val
    }
}

/// A Packet Identifier value, between `0x0000` and `0x1fff`.
///
/// PID values identify a particular sub-stream within the overall Transport Stream.
///
/// As returned by the [`Packet::pid()`](struct.Packet.html#method.pid) method for example.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pid(u16);
impl Pid {
    /// The largest possible PID value, `0x1fff`.
    pub const MAX_VALUE: u16 = 0x1fff;

    /// The total number of distinct PID values, `0x2000` (equal to `MAX_VALUE` + 1)
    pub const PID_COUNT: usize = (Self::MAX_VALUE + 1) as usize;

    /// PID `0x0000`, reserved for the Program Association Table.
    pub const PAT: Pid = Pid::new(0x0000);
    /// PID `0x0001`, reserved for the Conditional Access Table.
    pub const CAT: Pid = Pid::new(0x0001);
    /// PID `0x0002`, reserved for the Transport Stream Description Table.
    pub const TSDT: Pid = Pid::new(0x0002);
    /// PID `0x0010`, carrying the Network Information Table.
    pub const NIT: Pid = Pid::new(0x0010);
    /// PID `0x0011`, shared by the Service Description Table and Bouquet Association Table.
    pub const SDT_BAT: Pid = Pid::new(0x0011);
    /// PID `0x0012`, carrying Event Information Tables.
    pub const EIT: Pid = Pid::new(0x0012);
    /// PID `0x0013`, carrying the Running Status Table.
    pub const RST: Pid = Pid::new(0x0013);
    /// PID `0x0014`, shared by the Time-Date Table and Time-Offset Table.
    pub const TDT_TOT: Pid = Pid::new(0x0014);
    /// PID `0x1fff`, whose packets carry no data and exist only to fill the multiplex out to a
    /// constant bitrate.
    pub const NULL: Pid = Pid::new(0x1fff);

    /// Panics if the given value is greater than `Pid::MAX_VALUE`.
    pub const fn new(pid: u16) -> Pid {
        assert!(pid <= 0x1fff);
        Pid(pid)
    }

    /// `true` for the null PID, `0x1fff`.
    #[inline]
    pub fn is_null(self) -> bool {
        self.0 == Self::MAX_VALUE
    }

    /// `true` for PIDs in the dynamically-assignable range `0x0020` to `0x1ffe`, which programs
    /// and SI tables may claim at will.
    #[inline]
    pub fn is_custom(self) -> bool {
        (0x0020..=0x1ffe).contains(&self.0)
    }
}
impl TryFrom<u16> for Pid {
    type Error = ();

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        if value <= Pid::MAX_VALUE {
            Ok(Pid(value))
        } else {
            Err(())
        }
    }
}
impl From<Pid> for u16 {
    #[inline]
    fn from(pid: Pid) -> Self {
        pid.0
    }
}
impl From<Pid> for usize {
    #[inline]
    fn from(pid: Pid) -> Self {
        pid.0 as usize
    }
}
impl fmt::Debug for Pid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        write!(f, "Pid({:04x})", self.0)
    }
}

/// A transport stream `Packet` is a wrapper around a byte slice which allows the bytes to be
/// interpreted as a packet structure per _ISO/IEC 13818-1, Section 2.4.3.3_.
#[derive(Debug)]
pub struct Packet<'buf> {
    buf: &'buf [u8],
}

const FIXED_HEADER_SIZE: usize = 4;
// when AF present, a 1-byte 'length' field precedes the content,
const ADAPTATION_FIELD_OFFSET: usize = FIXED_HEADER_SIZE + 1;

impl<'buf> Packet<'buf> {
    /// The value `0x47`, which must appear in the first byte of every transport stream packet.
    pub const SYNC_BYTE: u8 = 0x47;

    /// The fixed 188 byte size of a transport stream packet.
    pub const SIZE: usize = 188;

    /// The largest payload a packet can carry, `Packet::SIZE` less the fixed header.
    pub const MAX_PAYLOAD_SIZE: usize = Self::SIZE - FIXED_HEADER_SIZE;

    /// returns `true` if the given value is a valid synchronisation byte, the value
    /// `Packet::SYNC_BYTE` (0x47), which must appear at the start of every transport stream
    /// packet.
    #[inline(always)]
    pub fn is_sync_byte(b: u8) -> bool {
        b == Self::SYNC_BYTE
    }

    /// Wrap the given buffer, which must be exactly `Packet::SIZE` (188) bytes long and start
    /// with the value `Packet::SYNC_BYTE` (0x47).
    #[inline(always)]
    pub fn new(buf: &'buf [u8]) -> Result<Packet<'buf>, PacketError> {
        if buf.len() != Self::SIZE {
            return Err(PacketError::UnexpectedLength { actual: buf.len() });
        }
        if !Packet::is_sync_byte(buf[0]) {
            return Err(PacketError::BadSyncByte { actual: buf[0] });
        }
        Ok(Packet { buf })
    }

    /// *May* have been set if some previous processing of this TS data detected at least
    /// 1 uncorrectable bit error in this TS packet.
    #[inline]
    pub fn transport_error_indicator(&self) -> bool {
        self.buf[1] & 0b1000_0000 != 0
    }

    /// a structure larger than a single packet payload needs to be split across multiple packets,
    /// `payload_unit_start_indicator()` indicates if this packet payload contains the start of
    /// the structure.  If `false`, this packet's payload is a continuation of a structure which
    /// began in an earlier packet within the transport stream.
    #[inline]
    pub fn payload_unit_start_indicator(&self) -> bool {
        self.buf[1] & 0b0100_0000 != 0
    }

    /// When `true`, this TS packet has higher priority than other packets of the same PID.
    pub fn transport_priority(&self) -> bool {
        self.buf[1] & 0b0010_0000 != 0
    }

    /// The sub-stream to which a particular packet belongs is indicated by this Packet Identifier
    /// value.
    #[inline]
    pub fn pid(&self) -> Pid {
        Pid(u16::from(self.buf[1] & 0b0001_1111) << 8 | u16::from(self.buf[2]))
    }

    /// Value of the _transport_scrambling_control_ field.
    pub fn transport_scrambling_control(&self) -> TransportScramblingControl {
        TransportScramblingControl::from(self.buf[3] >> 6 & 0b11)
    }

    /// The returned enum value indicates if `adaptation_field()`, `payload()` or both will return
    /// something.
    #[inline]
    pub fn adaptation_control(&self) -> AdaptationControl {
        AdaptationControl::from(self.buf[3] >> 4 & 0b11)
    }

    /// Each packet with a given `pid()` value within a transport stream should have a continuity
    /// counter value which increases by 1 from the last counter value seen.  Unexpected continuity
    /// counter values allow the receiver of the transport stream to detect discontinuities in the
    /// stream (e.g. due to data loss during transmission).
    #[inline]
    pub fn continuity_counter(&self) -> ContinuityCounter {
        ContinuityCounter::new(self.buf[3] & 0b0000_1111)
    }

    fn adaptation_field_length(&self) -> usize {
        self.buf[4] as usize
    }

    /// An `AdaptationField` contains additional packet headers that may be present in the packet.
    ///
    /// Returns `Ok(None)` if `adaptation_control()` indicates no field is present, or if the
    /// field's length is zero (a single stuffing byte).  Returns an error when the announced
    /// `adaptation_field_length` is inconsistent with the space available, or the field's own
    /// syntax is truncated.
    pub fn adaptation_field(&self) -> Result<Option<AdaptationField<'buf>>, PacketError> {
        match self.adaptation_control() {
            AdaptationControl::Reserved | AdaptationControl::PayloadOnly => Ok(None),
            AdaptationControl::AdaptationFieldOnly => {
                let len = self.adaptation_field_length();
                if len != (Self::SIZE - ADAPTATION_FIELD_OFFSET) {
                    warn!(
                        "invalid adaptation_field_length for AdaptationFieldOnly: {}",
                        len
                    );
                    return Err(PacketError::NotEnoughData {
                        field: "adaptation_field",
                        expected: Self::SIZE - ADAPTATION_FIELD_OFFSET,
                        actual: len,
                    });
                }
                self.mk_af(len).map(Some)
            }
            AdaptationControl::AdaptationFieldAndPayload => {
                let len = self.adaptation_field_length();
                if len > 182 {
                    warn!(
                        "invalid adaptation_field_length for AdaptationFieldAndPayload: {}",
                        len
                    );
                    return Err(PacketError::NotEnoughData {
                        field: "adaptation_field",
                        expected: len,
                        actual: 182,
                    });
                }
                if len == 0 {
                    return Ok(None);
                }
                self.mk_af(len).map(Some)
            }
        }
    }

    fn mk_af(&self, len: usize) -> Result<AdaptationField<'buf>, PacketError> {
        AdaptationField::parse(&self.buf[ADAPTATION_FIELD_OFFSET..ADAPTATION_FIELD_OFFSET + len])
    }

    /// The data contained within the packet, not including the packet headers.
    ///
    /// Not all packets have a payload, and `None` is returned if `adaptation_control()` indicates
    /// that no payload is present.  `None` may also be returned if the packet is malformed.
    /// If `Some` payload is returned, it is guaranteed not to be an empty slice.
    #[inline(always)]
    pub fn payload(&self) -> Option<&'buf [u8]> {
        match self.adaptation_control() {
            AdaptationControl::Reserved | AdaptationControl::AdaptationFieldOnly => None,
            AdaptationControl::PayloadOnly | AdaptationControl::AdaptationFieldAndPayload => {
                let offset = self.content_offset();
                if offset >= self.buf.len() {
                    warn!(
                        "adaptation_field_length {} leaves no room for a payload",
                        self.adaptation_field_length()
                    );
                    None
                } else {
                    Some(&self.buf[offset..])
                }
            }
        }
    }

    /// borrow a reference to the underlying buffer of this packet
    pub fn buffer(&self) -> &'buf [u8] {
        self.buf
    }

    #[inline]
    fn content_offset(&self) -> usize {
        match self.adaptation_control() {
            AdaptationControl::Reserved | AdaptationControl::PayloadOnly => FIXED_HEADER_SIZE,
            AdaptationControl::AdaptationFieldOnly
            | AdaptationControl::AdaptationFieldAndPayload => {
                ADAPTATION_FIELD_OFFSET + self.adaptation_field_length()
            }
        }
    }
}

#[cfg(test)]
mod test {
    use crate::packet::*;
    use crate::pes;
    use assert_matches::assert_matches;

    #[test]
    fn pid() {
        assert!(Pid::try_from(0x2000).is_err());
        assert!(Pid::NULL.is_null());
        assert!(!Pid::PAT.is_null());
        assert!(Pid::new(0x0020).is_custom());
        assert!(Pid::new(0x1ffe).is_custom());
        assert!(!Pid::SDT_BAT.is_custom());
        assert!(!Pid::NULL.is_custom());
    }

    #[test]
    fn wrong_length() {
        let buf = [0u8; 0];
        assert_matches!(
            Packet::new(&buf[..]),
            Err(PacketError::UnexpectedLength { actual: 0 })
        );
    }

    #[test]
    fn bad_sync() {
        let buf = [0u8; Packet::SIZE];
        assert_matches!(
            Packet::new(&buf[..]),
            Err(PacketError::BadSyncByte { actual: 0 })
        );
    }

    #[test]
    fn test_xmas_tree() {
        let mut buf = [0xffu8; Packet::SIZE];
        buf[0] = Packet::SYNC_BYTE;
        buf[4] = 28; // adaptation_field_length
        buf[19] = 1; // transport_private_data_length
        buf[21] = 11; // adaptation_field_extension_length
        let pk = Packet::new(&buf[..]).unwrap();
        assert_eq!(u16::from(pk.pid()), 0b1111111111111u16);
        assert!(pk.transport_error_indicator());
        assert!(pk.payload_unit_start_indicator());
        assert!(pk.transport_priority());
        assert_eq!(
            pk.transport_scrambling_control(),
            TransportScramblingControl::Undefined(3)
        );
        assert_eq!(
            pk.adaptation_control(),
            AdaptationControl::AdaptationFieldAndPayload
        );
        assert_eq!(pk.continuity_counter().count(), 0b1111);
        let ad = pk.adaptation_field().unwrap().unwrap();
        assert!(ad.discontinuity_indicator);
        assert_eq!(
            ad.pcr,
            Some(ClockRef::from_parts(
                0b1_1111_1111_1111_1111_1111_1111_1111_1111,
                0b1_1111_1111
            ))
        );
        assert_eq!(1234 * 300 + 56, u64::from(ClockRef::from_parts(1234, 56)));
        assert_eq!(
            ad.opcr,
            Some(ClockRef::from_parts(
                0b1_1111_1111_1111_1111_1111_1111_1111_1111,
                0b1_1111_1111
            ))
        );
        assert_eq!(ad.splice_countdown, Some(-1));
        let expected_data = [0xff];
        assert_eq!(ad.private_data, Some(&expected_data[..]));
        let ext = ad.extension.unwrap();
        assert_eq!(ext.ltw_offset, Some(0b0111_1111_1111_1111));
        assert_eq!(ext.piecewise_rate, Some(0b0011_1111_1111_1111_1111_1111));
        assert_eq!(
            ext.seamless_splice,
            Some(SeamlessSplice {
                splice_type: 0b1111,
                dts_next_au: pes::Timestamp::from_u64(
                    0b1_1111_1111_1111_1111_1111_1111_1111_1111
                )
            })
        );
        assert!(!format!("{:?}", ad).is_empty())
    }

    #[test]
    fn empty_adaptation_field() {
        let mut buf = [0xffu8; Packet::SIZE];
        buf[0] = Packet::SYNC_BYTE;
        buf[4] = 0; // adaptation_field_length
        let pk = Packet::new(&buf[..]).unwrap();
        assert_eq!(
            pk.adaptation_control(),
            AdaptationControl::AdaptationFieldAndPayload
        );
        assert_matches!(pk.adaptation_field(), Ok(None));
    }

    #[test]
    fn truncated_adaptation_field() {
        let mut buf = [0xffu8; Packet::SIZE];
        buf[0] = Packet::SYNC_BYTE;
        buf[3] = 0b0011_0000; // AdaptationFieldAndPayload, cc=0
        buf[4] = 3; // adaptation_field_length
        buf[5] = 0b0001_0000; // pcr_flag, but only 2 bytes of field remain
        let pk = Packet::new(&buf[..]).unwrap();
        assert_matches!(
            pk.adaptation_field(),
            Err(PacketError::NotEnoughData { field: "pcr", .. })
        );
    }

    #[test]
    fn adaptation_only_has_no_payload() {
        let mut buf = [0xffu8; Packet::SIZE];
        buf[0] = Packet::SYNC_BYTE;
        buf[3] = 0b0010_0000; // AdaptationFieldOnly, cc=0
        buf[4] = 183;
        buf[5] = 0; // no optional fields
        let pk = Packet::new(&buf[..]).unwrap();
        assert_eq!(pk.payload(), None);
        assert!(pk.adaptation_field().unwrap().is_some());
    }

    #[test]
    fn header_adaptation_payload_sum_to_packet_size() {
        let mut buf = [0xffu8; Packet::SIZE];
        buf[0] = Packet::SYNC_BYTE;
        buf[3] = 0b0011_0000;
        buf[4] = 50; // adaptation_field_length
        buf[5] = 0;
        let pk = Packet::new(&buf[..]).unwrap();
        let payload_size = pk.payload().map(|p| p.len()).unwrap_or(0);
        // 4 byte header + 1 byte af length + 50 bytes af + payload
        assert_eq!(4 + 1 + 50 + payload_size, Packet::SIZE);
    }

    #[test]
    fn parse_is_repeatable() {
        let mut buf = [0xffu8; Packet::SIZE];
        buf[0] = Packet::SYNC_BYTE;
        buf[4] = 28;
        buf[19] = 1;
        buf[21] = 11;
        let a = Packet::new(&buf[..]).unwrap();
        let b = Packet::new(&buf[..]).unwrap();
        assert_eq!(a.buffer(), b.buffer());
        assert_eq!(a.adaptation_field().unwrap(), b.adaptation_field().unwrap());
    }
}
