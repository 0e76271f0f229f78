//! Detection of the transport packet cadence within a byte stream.
//!
//! Broadcast captures come in three common shapes: bare 188-byte packets, 192-byte packets with a
//! 4-byte timestamp per packet, and 204-byte packets with Reed-Solomon parity attached.  In the
//! larger shapes the extra bytes carry no multiplex data and are skipped; only the stride between
//! sync bytes differs.

/// The packet cadence detected in a byte stream.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum PacketType {
    /// Bare 188-byte transport packets.
    Ts188,
    /// 192-byte units, e.g. M2TS with a 4-byte arrival timestamp per packet.
    Ts192,
    /// 204-byte units with 16 bytes of forward-error-correction parity per packet.
    Ts204,
    /// A sync byte was found, but no candidate stride lined up with any further sync bytes.
    Unknown,
}

impl PacketType {
    /// The distance from one sync byte to the next for this cadence, if known.
    pub fn stride(self) -> Option<usize> {
        match self {
            PacketType::Ts188 => Some(188),
            PacketType::Ts192 => Some(192),
            PacketType::Ts204 => Some(204),
            PacketType::Unknown => None,
        }
    }
}

/// The outcome of probing a byte stream: the detected cadence and the offset of the first sync
/// byte.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Detection {
    /// The winning cadence.
    pub packet_type: PacketType,
    /// Offset of the first sync byte within the probed buffer.
    pub offset: usize,
}

/// The probe looks no further than this into the buffer.
pub const PROBE_WINDOW: usize = 4096;

const CANDIDATE_STRIDES: [(PacketType, usize); 3] = [
    (PacketType::Ts188, 188),
    (PacketType::Ts192, 192),
    (PacketType::Ts204, 204),
];

/// Classify the packet cadence of `buf` by scanning for the first sync byte and testing each
/// candidate stride by the number of further sync bytes that line up with it.
///
/// Only the first [`PROBE_WINDOW`](constant.PROBE_WINDOW.html) bytes are examined.  Returns
/// `None` when the probe window contains no sync byte at all.
pub fn detect(buf: &[u8]) -> Option<Detection> {
    let window = &buf[..buf.len().min(PROBE_WINDOW)];
    let offset = window
        .iter()
        .position(|&b| crate::packet::Packet::is_sync_byte(b))?;
    let mut best = (PacketType::Unknown, 0);
    for (packet_type, stride) in CANDIDATE_STRIDES {
        let count = window[offset..]
            .iter()
            .step_by(stride)
            .skip(1)
            .filter(|&&b| crate::packet::Packet::is_sync_byte(b))
            .count();
        if count > best.1 {
            best = (packet_type, count);
        }
    }
    Some(Detection {
        packet_type: best.0,
        offset,
    })
}
