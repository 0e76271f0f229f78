//! The demultiplexer: routes transport packets to per-PID filters, drives section reassembly,
//! and owns the resulting tables.
//!
//! [`Demultiplex`](struct.Demultiplex.html) is the crate's public surface.  Push bytes at it
//! with [`add_packet()`](struct.Demultiplex.html#method.add_packet),
//! [`add_buffer()`](struct.Demultiplex.html#method.add_buffer) or
//! [`add_file()`](struct.Demultiplex.html#method.add_file), and query the recovered PSI/SI
//! structure with [`table()`](struct.Demultiplex.html#method.table).
//!
//! Section filters for the well-known PSI/SI PIDs are registered at construction time; filters
//! for PMT PIDs and elementary stream PIDs are registered and removed dynamically as PAT and
//! PMT versions are promoted to the current view.

use crate::packet::{ContinuityCounter, Packet, PacketError, Pid};
use crate::pes::{CompletedPesPacket, PesReassembler};
use crate::psi::{CompletedSection, SectionError, SectionReassembler, TableError};
use crate::sync;
use crate::tables::{Promotion, Table, TablePayload, TableStore};
use fixedbitset::FixedBitSet;
use log::{debug, warn};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::Path;

/// The well-known PIDs given a section filter when a demultiplexer is created.
pub const WELL_KNOWN_PIDS: [Pid; 8] = [
    Pid::PAT,
    Pid::CAT,
    Pid::TSDT,
    Pid::NIT,
    Pid::SDT_BAT,
    Pid::EIT,
    Pid::RST,
    Pid::TDT_TOT,
];

/// The ways the bytes being parsed can fail to conform to transport stream syntax.
#[derive(Debug)]
pub enum InvalidDataError {
    /// A problem in packet or adaptation field syntax.
    Packet(PacketError),
    /// A problem in section framing.
    Section(SectionError),
    /// A problem in a table body or descriptor loop.
    Table(TableError),
    /// A buffer contained no sync byte within the probe window.
    NoSyncByte,
    /// A buffer's sync bytes lined up with none of the known packet cadences.
    UnknownPacketType,
}

/// The error type for all demultiplexer operations.
#[derive(Debug)]
pub enum DemuxError {
    /// An I/O problem reading input.
    Io(io::Error),
    /// The bytes being parsed did not conform to the transport stream syntax.  The
    /// demultiplexer remains internally consistent: everything parsed before the error is
    /// retained.
    InvalidData(InvalidDataError),
    /// An argument broke an API contract, e.g. `add_packet()` was given a buffer whose size is
    /// not 188 bytes.
    InvalidArguments {
        /// description of the broken expectation
        expected: &'static str,
        /// the value actually given
        actual: usize,
    },
    /// A packet arrived on a reserved PID that has no assigned meaning and no registered
    /// filter.
    UnknownPidPacket(
        /// the offending PID
        Pid,
    ),
}

impl From<io::Error> for DemuxError {
    fn from(e: io::Error) -> DemuxError {
        DemuxError::Io(e)
    }
}
impl From<SectionError> for DemuxError {
    fn from(e: SectionError) -> DemuxError {
        DemuxError::InvalidData(InvalidDataError::Section(e))
    }
}
impl From<TableError> for DemuxError {
    fn from(e: TableError) -> DemuxError {
        DemuxError::InvalidData(InvalidDataError::Table(e))
    }
}

/// The reassembly machinery of one filter, per the kind of data its PID carries.
enum FilterKind {
    /// PSI/SI sections, feeding the table store.
    Section(SectionReassembler),
    /// PES packets; framed and then discarded (elementary stream reconstruction is out of
    /// scope).
    Pes(PesReassembler),
}

/// Per-PID state: the reassembler, plus continuity tracking.
struct FilterContext {
    kind: FilterKind,
    last_continuity_counter: Option<ContinuityCounter>,
    continuity_error_detected: bool,
}

impl FilterContext {
    fn section() -> FilterContext {
        FilterContext {
            kind: FilterKind::Section(SectionReassembler::default()),
            last_continuity_counter: None,
            continuity_error_detected: false,
        }
    }

    fn pes() -> FilterContext {
        FilterContext {
            kind: FilterKind::Pes(PesReassembler::default()),
            last_continuity_counter: None,
            continuity_error_detected: false,
        }
    }
}

/// The demultiplexer's PID-indexed collection of filter contexts.
struct Filters {
    by_pid: Vec<Option<FilterContext>>,
}

impl Default for Filters {
    fn default() -> Filters {
        Filters { by_pid: Vec::new() }
    }
}

impl Filters {
    fn contains(&self, pid: Pid) -> bool {
        let idx = usize::from(pid);
        idx < self.by_pid.len() && self.by_pid[idx].is_some()
    }

    fn get(&self, pid: Pid) -> Option<&FilterContext> {
        let idx = usize::from(pid);
        if idx >= self.by_pid.len() {
            None
        } else {
            self.by_pid[idx].as_ref()
        }
    }

    fn get_mut(&mut self, pid: Pid) -> Option<&mut FilterContext> {
        let idx = usize::from(pid);
        if idx >= self.by_pid.len() {
            None
        } else {
            self.by_pid[idx].as_mut()
        }
    }

    fn insert(&mut self, pid: Pid, filter: FilterContext) {
        let idx = usize::from(pid);
        if idx >= self.by_pid.len() {
            self.by_pid.resize_with(idx + 1, || None);
        }
        self.by_pid[idx] = Some(filter);
    }

    fn remove(&mut self, pid: Pid) {
        let idx = usize::from(pid);
        if idx < self.by_pid.len() {
            self.by_pid[idx] = None;
        }
    }

    fn pids(&self) -> Vec<Pid> {
        self.by_pid
            .iter()
            .enumerate()
            .filter_map(|(i, e)| e.as_ref().map(|_| Pid::new(i as u16)))
            .collect()
    }

    fn iter_mut<'a>(&'a mut self) -> impl Iterator<Item = (Pid, &'a mut FilterContext)> + 'a {
        self.by_pid
            .iter_mut()
            .enumerate()
            .filter_map(|(i, e)| e.as_mut().map(|ctx| (Pid::new(i as u16), ctx)))
    }
}

/// A push-driven MPEG transport stream demultiplexer and PSI/SI table parser.
///
/// One instance owns all per-PID filter state and all tables recovered from the stream.  It is
/// single-threaded: the `add_*` methods run to completion synchronously, and a table borrowed
/// through [`table()`](#method.table) is valid until the next `add_*` call.
pub struct Demultiplex {
    filters: Filters,
    tables: TableStore,
    store_parsed_packets: bool,
    packet_log: Vec<[u8; Packet::SIZE]>,
    continuity_error_detected: bool,
    ignored_packet_count: u64,
    /// PIDs whose filters exist because the current PAT announced them
    pat_registered: FixedBitSet,
    /// per-PMT-PID record of the elementary PIDs whose filters exist because that PMT announced
    /// them
    pmt_registered: HashMap<Pid, FixedBitSet>,
}

impl Demultiplex {
    /// Create a demultiplexer, with section filters pre-registered on the well-known PSI/SI
    /// PIDs.
    ///
    /// When `store_parsed_packets` is set, a copy of every packet accepted by
    /// [`add_packet()`](#method.add_packet) is kept, and may be retrieved with
    /// [`packets()`](#method.packets).
    pub fn new(store_parsed_packets: bool) -> Demultiplex {
        let mut result = Demultiplex {
            filters: Filters::default(),
            tables: TableStore::default(),
            store_parsed_packets,
            packet_log: Vec::new(),
            continuity_error_detected: false,
            ignored_packet_count: 0,
            pat_registered: FixedBitSet::with_capacity(Pid::PID_COUNT),
            pmt_registered: HashMap::new(),
        };
        for pid in WELL_KNOWN_PIDS {
            result.filters.insert(pid, FilterContext::section());
        }
        result
    }

    /// Parse one 188-byte packet and route it to its PID's filter.
    ///
    /// Null packets are accepted and dropped.  A packet on an unfiltered PID in the
    /// dynamically-assignable range is counted (see
    /// [`ignored_packet_count()`](#method.ignored_packet_count)) and otherwise ignored; a
    /// packet on any other unfiltered PID is an error.
    pub fn add_packet(&mut self, data: &[u8]) -> Result<(), DemuxError> {
        let pk = Packet::new(data).map_err(|e| match e {
            PacketError::UnexpectedLength { actual } => DemuxError::InvalidArguments {
                expected: "a buffer of exactly 188 bytes",
                actual,
            },
            other => DemuxError::InvalidData(InvalidDataError::Packet(other)),
        })?;
        // adaptation field syntax is validated up front; a short read within it fails the
        // whole packet
        pk.adaptation_field()
            .map_err(|e| DemuxError::InvalidData(InvalidDataError::Packet(e)))?;
        if self.store_parsed_packets {
            let mut copy = [0u8; Packet::SIZE];
            copy.copy_from_slice(data);
            self.packet_log.push(copy);
        }
        let pid = pk.pid();
        if pid.is_null() {
            return Ok(());
        }
        if !self.filters.contains(pid) {
            if pid.is_custom() {
                // no filter was ever registered for this PID; on-the-fly registration keyed
                // off payload_unit_start is not attempted
                self.ignored_packet_count += 1;
                return Ok(());
            }
            return Err(DemuxError::UnknownPidPacket(pid));
        }
        self.consume(pid, &pk)
    }

    /// Detect the packet cadence of `data`, then feed every contained packet through
    /// [`add_packet()`](#method.add_packet), realigning on the sync byte as needed.  Trailing
    /// bytes of the 192/204-byte cadences are skipped.  At end of buffer, all filters are
    /// flushed to drain any section whose final byte coincided with the end of the input.
    pub fn add_buffer(&mut self, data: &[u8]) -> Result<(), DemuxError> {
        let detection = sync::detect(data)
            .ok_or(DemuxError::InvalidData(InvalidDataError::NoSyncByte))?;
        let stride = detection
            .packet_type
            .stride()
            .ok_or(DemuxError::InvalidData(InvalidDataError::UnknownPacketType))?;
        let mut i = detection.offset;
        while i + Packet::SIZE <= data.len() {
            if !Packet::is_sync_byte(data[i]) {
                // lost the cadence; hunt for the next sync byte
                match data[i..].iter().position(|&b| Packet::is_sync_byte(b)) {
                    Some(skip) => {
                        warn!("skipping {} bytes to resynchronise", skip);
                        i += skip;
                        continue;
                    }
                    None => break,
                }
            }
            self.add_packet(&data[i..i + Packet::SIZE])?;
            i += stride;
        }
        self.flush()
    }

    /// Read the whole of the named file and process it as one buffer.
    pub fn add_file<P: AsRef<Path>>(&mut self, path: P) -> Result<(), DemuxError> {
        let data = fs::read(path)?;
        self.add_buffer(&data)
    }

    /// Drain any sections already complete in the reassembly buffers, without discarding
    /// partial state (a section straddling two `add_buffer()` calls still reassembles).
    pub fn flush(&mut self) -> Result<(), DemuxError> {
        let mut drained: Vec<(Pid, CompletedSection)> = Vec::new();
        for (pid, ctx) in self.filters.iter_mut() {
            if let FilterKind::Section(reassembler) = &mut ctx.kind {
                let mut completed = Vec::new();
                reassembler.flush_pending(&mut completed);
                drained.extend(completed.into_iter().map(|s| (pid, s)));
            }
        }
        for (pid, sect) in drained {
            self.dispatch_section(pid, &sect)?;
        }
        Ok(())
    }

    /// Borrow the current view of the table with the given id, if a complete version of it has
    /// been received.
    ///
    /// The reference is valid until the next `add_*` call, which may promote a newer version;
    /// callers holding tables across input boundaries must re-fetch.
    pub fn table(&self, table_id: u8) -> Option<&Table> {
        self.tables.current(table_id)
    }

    /// Iterate over the table ids for which a current view exists.
    pub fn table_ids(&self) -> impl Iterator<Item = u8> + '_ {
        self.tables.table_ids()
    }

    /// `true` once any PID has shown a continuity-counter discontinuity.  Discontinuities are
    /// logged and survived, not fatal: broadcast reality ships packets with occasional gaps and
    /// downstream tables survive.
    pub fn continuity_error_detected(&self) -> bool {
        self.continuity_error_detected
    }

    /// `true` once the filter on the given PID has shown a continuity-counter discontinuity.
    /// `false` for PIDs with no registered filter.
    pub fn continuity_error_on(&self, pid: Pid) -> bool {
        self.filters
            .get(pid)
            .map(|ctx| ctx.continuity_error_detected)
            .unwrap_or(false)
    }

    /// Number of packets dropped because they arrived on a dynamically-assignable PID with no
    /// registered filter.  Null packets are not counted.
    pub fn ignored_packet_count(&self) -> u64 {
        self.ignored_packet_count
    }

    /// The packets accepted so far, when packet storage was requested at construction;
    /// otherwise empty.
    pub fn packets(&self) -> &[[u8; Packet::SIZE]] {
        &self.packet_log
    }

    /// The PIDs which currently have a registered filter.
    pub fn filter_pids(&self) -> Vec<Pid> {
        self.filters.pids()
    }

    fn consume(&mut self, pid: Pid, pk: &Packet<'_>) -> Result<(), DemuxError> {
        let mut completed_sections: Vec<CompletedSection> = Vec::new();
        let mut completed_pes: Vec<CompletedPesPacket> = Vec::new();
        let mut continuity_error = false;
        {
            let ctx = match self.filters.get_mut(pid) {
                Some(ctx) => ctx,
                None => return Ok(()),
            };
            if pk.adaptation_control().has_payload() {
                let cc = pk.continuity_counter();
                if let Some(last) = ctx.last_continuity_counter {
                    // a repeat of the previous counter value is a legal duplicate
                    if !cc.follows(last) && cc != last {
                        warn!(
                            "continuity discontinuity on {:?}: counter {} after {}",
                            pid,
                            cc.count(),
                            last.count()
                        );
                        ctx.continuity_error_detected = true;
                        continuity_error = true;
                    }
                }
                ctx.last_continuity_counter = Some(cc);
            }
            if let Some(payload) = pk.payload() {
                let pusi = pk.payload_unit_start_indicator();
                match &mut ctx.kind {
                    FilterKind::Section(reassembler) => {
                        reassembler.push(pusi, payload, &mut completed_sections)?
                    }
                    FilterKind::Pes(reassembler) => {
                        reassembler.push(pusi, payload, &mut completed_pes)
                    }
                }
            }
        }
        if continuity_error {
            self.continuity_error_detected = true;
        }
        for pes in completed_pes {
            // the PES layer stops at framing; reconstructed packets are not delivered anywhere
            debug!(
                "discarding {}-byte PES packet (stream_id {:#04x}) from {:?}",
                pes.body.len(),
                pes.header.stream_id,
                pid
            );
        }
        for sect in completed_sections {
            self.dispatch_section(pid, &sect)?;
        }
        Ok(())
    }

    fn dispatch_section(&mut self, pid: Pid, sect: &CompletedSection) -> Result<(), DemuxError> {
        if let Some(Promotion { table_id }) = self.tables.push_section(sect)? {
            self.apply_fanout(table_id, pid);
        }
        Ok(())
    }

    /// Re-derive downstream filters after a table's current view changed: a new PAT manages the
    /// section filters on the PIDs it announces, and a new PMT manages PES filters on its
    /// elementary PIDs.
    fn apply_fanout(&mut self, table_id: u8, arrival_pid: Pid) {
        match table_id {
            0x00 => {
                let pids: Vec<Pid> = match self.tables.current(table_id).map(|t| &t.payload) {
                    Some(TablePayload::Pat(pat)) => pat.pids().collect(),
                    _ => return,
                };
                let mut seen = FixedBitSet::with_capacity(Pid::PID_COUNT);
                for pid in pids {
                    self.filters.insert(pid, FilterContext::section());
                    seen.insert(usize::from(pid));
                    self.pat_registered.insert(usize::from(pid));
                }
                // drop filters for PIDs the previous PAT announced but this one does not,
                for idx in 0..Pid::PID_COUNT {
                    if self.pat_registered.contains(idx) && !seen.contains(idx) {
                        debug!("removing filter for PID {:#06x} dropped from PAT", idx);
                        self.filters.remove(Pid::new(idx as u16));
                        self.pat_registered.set(idx, false);
                        self.pmt_registered.remove(&Pid::new(idx as u16));
                    }
                }
            }
            0x02 => {
                let pids: Vec<Pid> = match self.tables.current(table_id).map(|t| &t.payload) {
                    Some(TablePayload::Pmt(pmt)) => pmt.elementary_pids().collect(),
                    _ => return,
                };
                let registered = self
                    .pmt_registered
                    .entry(arrival_pid)
                    .or_insert_with(|| FixedBitSet::with_capacity(Pid::PID_COUNT));
                let mut seen = FixedBitSet::with_capacity(Pid::PID_COUNT);
                for pid in pids {
                    self.filters.insert(pid, FilterContext::pes());
                    seen.insert(usize::from(pid));
                    registered.insert(usize::from(pid));
                }
                // drop filters for elementary PIDs this program no longer carries,
                for idx in 0..Pid::PID_COUNT {
                    if registered.contains(idx) && !seen.contains(idx) {
                        debug!(
                            "removing filter for elementary PID {:#06x} dropped from PMT",
                            idx
                        );
                        self.filters.remove(Pid::new(idx as u16));
                        registered.set(idx, false);
                    }
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::psi::RunningStatus;
    use assert_matches::assert_matches;

    /// build one 188-byte transport packet with the given payload and 0xff stuffing
    fn ts_packet(pid: u16, pusi: bool, cc: u8, payload: &[u8]) -> [u8; Packet::SIZE] {
        assert!(payload.len() <= 184);
        let mut buf = [0xffu8; Packet::SIZE];
        buf[0] = Packet::SYNC_BYTE;
        buf[1] = (if pusi { 0b0100_0000 } else { 0 }) | ((pid >> 8) as u8 & 0b0001_1111);
        buf[2] = pid as u8;
        buf[3] = 0b0001_0000 | (cc & 0x0f); // payload only
        buf[4..4 + payload.len()].copy_from_slice(payload);
        buf
    }

    /// a complete single-section PAT mapping program 1 to the given PMT PID
    fn pat_section(version: u8, pmt_pid: u16) -> Vec<u8> {
        vec![
            0x00, // pointer_field
            0x00, // table_id
            0xb0, 0x0d, // section_syntax_indicator, section_length 13
            0x00, 0x01, // transport_stream_id
            0xc0 | (version << 1) | 1, // version, current
            0x00, 0x00, // section 0 of 0
            0x00, 0x01, // program_number 1
            0xe0 | (pmt_pid >> 8) as u8, pmt_pid as u8,
            0x00, 0x00, 0x00, 0x00, // CRC (not verified)
        ]
    }

    #[test]
    fn well_known_filters_preregistered() {
        let demux = Demultiplex::new(false);
        let pids = demux.filter_pids();
        for pid in WELL_KNOWN_PIDS {
            assert!(pids.contains(&pid), "missing filter for {:?}", pid);
        }
    }

    #[test]
    fn single_pat() {
        let mut demux = Demultiplex::new(false);
        demux
            .add_packet(&ts_packet(0x0000, true, 0, &pat_section(0, 0x100)))
            .unwrap();
        let table = demux.table(0x00).expect("PAT should be current");
        match &table.payload {
            TablePayload::Pat(pat) => {
                assert_eq!(pat.programs.len(), 1);
                assert_eq!(pat.pmt_pid(1), Some(Pid::new(0x100)));
            }
            other => panic!("unexpected payload {:?}", other),
        }
        // a section filter was registered on the announced PMT PID,
        assert!(demux.filter_pids().contains(&Pid::new(0x100)));
    }

    #[test]
    fn pat_replacement_migrates_filters() {
        let mut demux = Demultiplex::new(false);
        demux
            .add_packet(&ts_packet(0x0000, true, 0, &pat_section(0, 0x100)))
            .unwrap();
        assert!(demux.filter_pids().contains(&Pid::new(0x100)));
        demux
            .add_packet(&ts_packet(0x0000, true, 1, &pat_section(2, 0x200)))
            .unwrap();
        let pids = demux.filter_pids();
        assert!(!pids.contains(&Pid::new(0x100)), "old PMT filter remains");
        assert!(pids.contains(&Pid::new(0x200)), "new PMT filter missing");
        match &demux.table(0x00).unwrap().payload {
            TablePayload::Pat(pat) => assert_eq!(pat.pmt_pid(1), Some(Pid::new(0x200))),
            other => panic!("unexpected payload {:?}", other),
        }
    }

    /// fill `len` bytes with as many unknown descriptors as it takes
    fn push_filler_descriptors(body: &mut Vec<u8>, len: usize) {
        let mut remaining = len;
        while remaining > 0 {
            assert!(remaining >= 2);
            let payload = (remaining - 2).min(200);
            body.push(0xf7);
            body.push(payload as u8);
            body.extend(std::iter::repeat(0xaa).take(payload));
            remaining -= 2 + payload;
        }
    }

    /// an SDT section with one service and stuffing name bytes, sized to the given body length
    fn big_sdt_section(body_len: usize) -> Vec<u8> {
        let section_length = (body_len + 5) as u16;
        let mut sect = vec![
            0x42, // table_id
            0xb0 | (section_length >> 8) as u8,
            section_length as u8,
            0x04, 0x57, // transport_stream_id
            0xc1, // version 0, current
            0x00, 0x00, // section 0 of 0
        ];
        let mut body = vec![
            0x00, 0x01, 0xff, // original_network_id, reserved
            0x10, 0x01, 0xfc | 0x01, // service 0x1001
        ];
        let desc_loop_len = body_len - body.len() - 2 - 4;
        body.push(0x80 | (desc_loop_len >> 8) as u8);
        body.push(desc_loop_len as u8);
        push_filler_descriptors(&mut body, desc_loop_len);
        body.extend_from_slice(&[0, 0, 0, 0]); // CRC
        assert_eq!(body.len(), body_len);
        sect.extend_from_slice(&body);
        sect
    }

    #[test]
    fn sdt_across_two_packets() {
        // a 250-byte section needs two packets on PID 0x11,
        let sect = big_sdt_section(242);
        assert_eq!(sect.len(), 250);
        let mut first = vec![0x00]; // pointer_field
        first.extend_from_slice(&sect[..183]);
        let mut demux = Demultiplex::new(false);
        demux.add_packet(&ts_packet(0x0011, true, 7, &first)).unwrap();
        assert!(demux.table(0x42).is_none());
        demux
            .add_packet(&ts_packet(0x0011, false, 8, &sect[183..]))
            .unwrap();
        let table = demux.table(0x42).expect("SDT should be current");
        match &table.payload {
            TablePayload::Sdt(sdt) => {
                assert_eq!(sdt.original_network_id, 1);
                assert_eq!(sdt.services.len(), 1);
                assert_eq!(sdt.services[0].service_id, 0x1001);
            }
            other => panic!("unexpected payload {:?}", other),
        }
    }

    /// a PMT section with the given version and one H.264 stream, padded out with program
    /// descriptors to the given body length
    fn big_pmt_section(body_len: usize, elementary_pid: u16) -> Vec<u8> {
        let section_length = (body_len + 5) as u16;
        let mut sect = vec![
            0x02,
            0xb0 | (section_length >> 8) as u8,
            section_length as u8,
            0x00, 0x01, // program_number
            0xc1, // version 0, current
            0x00, 0x00,
        ];
        let desc_loop_len = body_len - 4 - 5 - 4;
        let mut body = vec![0xe1, 0x23]; // pcr_pid
        body.push(0xf0 | (desc_loop_len >> 8) as u8);
        body.push(desc_loop_len as u8);
        push_filler_descriptors(&mut body, desc_loop_len);
        body.extend_from_slice(&[
            0x1b,
            0xe0 | (elementary_pid >> 8) as u8,
            elementary_pid as u8,
            0xf0,
            0x00,
        ]);
        body.extend_from_slice(&[0, 0, 0, 0]); // CRC
        assert_eq!(body.len(), body_len);
        sect.extend_from_slice(&body);
        sect
    }

    #[test]
    fn continuity_error_survives() {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut demux = Demultiplex::new(false);
        demux
            .add_packet(&ts_packet(0x0000, true, 0, &pat_section(0, 0x100)))
            .unwrap();
        // a PMT spanning three packets, with a gap in the continuity counters (3, 5, 6)
        let sect = big_pmt_section(450, 0x0151);
        let mut first = vec![0x00];
        first.extend_from_slice(&sect[..183]);
        demux.add_packet(&ts_packet(0x0100, true, 3, &first)).unwrap();
        demux
            .add_packet(&ts_packet(0x0100, false, 5, &sect[183..367]))
            .unwrap();
        demux
            .add_packet(&ts_packet(0x0100, false, 6, &sect[367..]))
            .unwrap();
        assert!(demux.continuity_error_detected());
        assert!(demux.continuity_error_on(Pid::new(0x100)));
        assert!(!demux.continuity_error_on(Pid::PAT));
        // the table still promotes to current,
        let table = demux.table(0x02).expect("PMT should be current");
        match &table.payload {
            TablePayload::Pmt(pmt) => {
                assert_eq!(pmt.pcr_pid, Pid::new(0x123));
                assert_eq!(pmt.streams.len(), 1);
                assert_eq!(pmt.streams[0].elementary_pid, Pid::new(0x151));
            }
            other => panic!("unexpected payload {:?}", other),
        }
        // and its elementary stream got a PES filter,
        assert!(demux.filter_pids().contains(&Pid::new(0x151)));
    }

    #[test]
    fn duplicate_continuity_counter_is_legal() {
        let mut demux = Demultiplex::new(false);
        let pk = ts_packet(0x0000, true, 0, &pat_section(0, 0x100));
        demux.add_packet(&pk).unwrap();
        demux.add_packet(&pk).unwrap();
        assert!(!demux.continuity_error_detected());
    }

    #[test]
    fn truncated_descriptor_does_not_spoil_sdt() {
        // service descriptor announcing a 200-byte provider name inside a 6-byte descriptor,
        // followed by a parseable stream_identifier descriptor
        let body = [
            0x00, 0x01, 0xff, // original_network_id
            0x10, 0x01, 0xfc, // service 0x1001
            0x80, 0x0b, // running, loop length 11
            0x48, 0x06, 0x01, 0xc8, 0xff, 0xff, 0xff, 0xff, // truncated service descriptor
            0x52, 0x01, 0x07, // stream identifier
        ];
        let section_length = (body.len() + 5 + 4) as u16;
        let mut sect = vec![
            0x00, // pointer_field
            0x42,
            0xb0 | (section_length >> 8) as u8,
            section_length as u8,
            0x04, 0x57,
            0xc1,
            0x00, 0x00,
        ];
        sect.extend_from_slice(&body);
        sect.extend_from_slice(&[0, 0, 0, 0]);
        let mut demux = Demultiplex::new(false);
        demux.add_packet(&ts_packet(0x0011, true, 0, &sect)).unwrap();
        let table = demux.table(0x42).expect("SDT should be current");
        match &table.payload {
            TablePayload::Sdt(sdt) => {
                let svc = &sdt.services[0];
                assert_eq!(svc.running_status, RunningStatus::Running);
                let descs: Vec<_> = svc.descriptors.iter().collect();
                assert_eq!(descs.len(), 2);
                assert!(!descs[0].is_parsed());
                assert!(descs[1].is_parsed());
            }
            other => panic!("unexpected payload {:?}", other),
        }
    }

    #[test]
    fn null_packets_do_not_count_as_ignored() {
        let mut demux = Demultiplex::new(false);
        let null = ts_packet(0x1fff, false, 0, &[]);
        for _ in 0..1000 {
            demux.add_packet(&null).unwrap();
        }
        demux
            .add_packet(&ts_packet(0x0000, true, 0, &pat_section(0, 0x100)))
            .unwrap();
        assert_eq!(demux.ignored_packet_count(), 0);
        assert!(demux.table(0x00).is_some());
    }

    #[test]
    fn unfiltered_custom_pid_counts_as_ignored() {
        let mut demux = Demultiplex::new(false);
        demux
            .add_packet(&ts_packet(0x0100, false, 0, &[0xaa; 10]))
            .unwrap();
        assert_eq!(demux.ignored_packet_count(), 1);
    }

    #[test]
    fn reserved_pid_is_an_error() {
        let mut demux = Demultiplex::new(false);
        assert_matches!(
            demux.add_packet(&ts_packet(0x0005, false, 0, &[0xaa; 10])),
            Err(DemuxError::UnknownPidPacket(pid)) if pid == Pid::new(0x0005)
        );
    }

    #[test]
    fn wrong_buffer_size_is_invalid_arguments() {
        let mut demux = Demultiplex::new(false);
        assert_matches!(
            demux.add_packet(&[0x47; 10]),
            Err(DemuxError::InvalidArguments { actual: 10, .. })
        );
    }

    #[test]
    fn bad_sync_byte_is_invalid_data() {
        let mut demux = Demultiplex::new(false);
        assert_matches!(
            demux.add_packet(&[0x00; Packet::SIZE]),
            Err(DemuxError::InvalidData(InvalidDataError::Packet(
                PacketError::BadSyncByte { actual: 0 }
            )))
        );
    }

    #[test]
    fn truncated_adaptation_field_is_invalid_data() {
        let mut buf = [0xffu8; Packet::SIZE];
        buf[0] = Packet::SYNC_BYTE;
        buf[1] = 0x1f;
        buf[2] = 0xff; // null PID, but the adaptation field is checked first
        buf[3] = 0b0011_0000; // AdaptationFieldAndPayload
        buf[4] = 2; // adaptation_field_length
        buf[5] = 0b0001_0000; // pcr_flag with only 1 byte of field left
        let mut demux = Demultiplex::new(false);
        assert_matches!(
            demux.add_packet(&buf),
            Err(DemuxError::InvalidData(InvalidDataError::Packet(
                PacketError::NotEnoughData { field: "pcr", .. }
            )))
        );
    }

    #[test]
    fn pat_packet_from_capture() {
        // one full packet: a PAT on PID 0x0000 mapping program 1 to PMT PID 0x100, stuffed out
        // to 188 bytes
        let pk = hex_literal::hex!(
            "
            474000100000b00d0001c100000001e1
            005f93e83fffffffffffffffffffffff
            ffffffffffffffffffffffffffffffff
            ffffffffffffffffffffffffffffffff
            ffffffffffffffffffffffffffffffff
            ffffffffffffffffffffffffffffffff
            ffffffffffffffffffffffffffffffff
            ffffffffffffffffffffffffffffffff
            ffffffffffffffffffffffffffffffff
            ffffffffffffffffffffffffffffffff
            ffffffffffffffffffffffffffffffff
            ffffffffffffffffffffffff"
        );
        let mut demux = Demultiplex::new(false);
        demux.add_packet(&pk).unwrap();
        match &demux.table(0x00).unwrap().payload {
            TablePayload::Pat(pat) => assert_eq!(pat.pmt_pid(1), Some(Pid::new(0x100))),
            other => panic!("unexpected payload {:?}", other),
        }
        assert!(demux.filter_pids().contains(&Pid::new(0x100)));
    }

    #[test]
    fn add_buffer_walks_188_cadence() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&ts_packet(0x1fff, false, 0, &[]));
        buf.extend_from_slice(&ts_packet(0x0000, true, 0, &pat_section(0, 0x100)));
        buf.extend_from_slice(&ts_packet(0x1fff, false, 1, &[]));
        let mut demux = Demultiplex::new(false);
        demux.add_buffer(&buf).unwrap();
        assert!(demux.table(0x00).is_some());
    }

    #[test]
    fn add_buffer_skips_m2ts_timestamps() {
        // 192-byte cadence: each packet carries a 4-byte trailer,
        let mut buf = Vec::new();
        for (i, pk) in [
            ts_packet(0x1fff, false, 0, &[]),
            ts_packet(0x0000, true, 0, &pat_section(0, 0x100)),
            ts_packet(0x1fff, false, 1, &[]),
        ]
        .iter()
        .enumerate()
        {
            buf.extend_from_slice(pk);
            buf.extend_from_slice(&[0x30, 0x00, 0x00, i as u8]);
        }
        let mut demux = Demultiplex::new(false);
        demux.add_buffer(&buf).unwrap();
        assert!(demux.table(0x00).is_some());
    }

    #[test]
    fn add_buffer_without_sync_byte_is_invalid_data() {
        let mut demux = Demultiplex::new(false);
        assert_matches!(
            demux.add_buffer(&[0x00; 512]),
            Err(DemuxError::InvalidData(InvalidDataError::NoSyncByte))
        );
    }

    #[test]
    fn add_file_missing_is_io_error() {
        let mut demux = Demultiplex::new(false);
        assert_matches!(
            demux.add_file("/nonexistent/path/to/stream.ts"),
            Err(DemuxError::Io(_))
        );
    }

    #[test]
    fn packet_log_stores_accepted_packets() {
        let mut demux = Demultiplex::new(true);
        let pk = ts_packet(0x0000, true, 0, &pat_section(0, 0x100));
        demux.add_packet(&pk).unwrap();
        demux.add_packet(&ts_packet(0x1fff, false, 0, &[])).unwrap();
        assert_eq!(demux.packets().len(), 2);
        assert_eq!(demux.packets()[0], pk);
    }

    #[test]
    fn pes_packets_are_framed_and_discarded() {
        let mut demux = Demultiplex::new(false);
        demux
            .add_packet(&ts_packet(0x0000, true, 0, &pat_section(0, 0x100)))
            .unwrap();
        // a minimal PMT making PID 0x151 an audio elementary stream,
        let mut pmt = vec![
            0x00, // pointer_field
            0x02, 0xb0, 0x12, // section_length 18
            0x00, 0x01, 0xc1, 0x00, 0x00, // program 1, version 0
            0xe1, 0x23, // pcr_pid
            0xf0, 0x00, // no program descriptors
            0x0f, 0xe1, 0x51, 0xf0, 0x00, // ADTS on pid 0x151
        ];
        pmt.extend_from_slice(&[0, 0, 0, 0]);
        demux.add_packet(&ts_packet(0x0100, true, 0, &pmt)).unwrap();
        assert!(demux.filter_pids().contains(&Pid::new(0x151)));
        // deliver a bounded PES packet on the elementary PID; it is framed and dropped
        // without error,
        let mut pes = vec![0x00, 0x00, 0x01, 0xc0, 0x00, 0x04];
        pes.extend_from_slice(&[0x11, 0x22, 0x33, 0x44]);
        demux.add_packet(&ts_packet(0x0151, true, 0, &pes)).unwrap();
        assert_eq!(demux.ignored_packet_count(), 0);
    }

    #[test]
    fn same_buffer_parses_identically() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&ts_packet(0x0000, true, 0, &pat_section(0, 0x100)));
        buf.extend_from_slice(&ts_packet(0x1fff, false, 0, &[]));
        let mut a = Demultiplex::new(false);
        let mut b = Demultiplex::new(false);
        a.add_buffer(&buf).unwrap();
        b.add_buffer(&buf).unwrap();
        match (&a.table(0x00).unwrap().payload, &b.table(0x00).unwrap().payload) {
            (TablePayload::Pat(pa), TablePayload::Pat(pb)) => assert_eq!(pa, pb),
            other => panic!("unexpected payloads {:?}", other),
        }
    }
}
