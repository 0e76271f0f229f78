//! Aggregation of completed sections into versioned tables, and selection of the current view.
//!
//! Tables are indexed by `table_id`.  For each table id two fixed-size rings are kept, indexed
//! by `version % MAX_VERSIONS`: a *partial* ring holding tables still waiting for sections, and
//! a *parsed* ring holding fully-received versions.  When the last outstanding section of a
//! partial table arrives, the table moves into the parsed ring and the *current* view for its
//! table id is re-selected by the recency-aware
//! [latest-version policy](fn.is_newer_than.html).

use crate::psi::{
    bat::Bat, cat::Cat, eit::Eit, nit::Nit, pat::Pat, pmt::Pmt, rst::Dit, rst::Rst, rst::Sit,
    sdt::Sdt, time::Tdt, time::Tot, tsdt::Tsdt,
};
use crate::psi::{CompletedSection, CurrentNext, SectionHead, TableError};
use fixedbitset::FixedBitSet;
use log::{debug, warn};
use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

/// Capacity of the per-table-id version rings; versions are staged and remembered in slot
/// `version % MAX_VERSIONS`.
pub const MAX_VERSIONS: usize = 8;

/// A newly-completed version only displaces the current view through version-number comparison
/// when the two completed within this many seconds of one another; beyond the window, the more
/// recently completed table wins outright (covering version-number wrap-around between long
/// capture sessions).
pub const RECENCY_DOMINANCE_SECS: u64 = 7200;

/// The `table_id` value `0xff`, which the spec forbids (it marks stuffing bytes after the last
/// section in a packet).
pub const TABLE_ID_FORBIDDEN: u8 = 0xff;

/// The `table_id` of DVB stuffing sections, which carry no data.
pub const TABLE_ID_STUFFING: u8 = 0x72;

fn wall_clock_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// The table-specific structure built from a table's section bodies, selected by `table_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TablePayload {
    /// Program Association Table, table id `0x00`
    Pat(Pat),
    /// Conditional Access Table, table id `0x01`
    Cat(Cat),
    /// Program Map Table, table id `0x02`
    Pmt(Pmt),
    /// Transport Stream Description Table, table id `0x03`
    Tsdt(Tsdt),
    /// Network Information Table, table ids `0x40` (actual) and `0x41` (other)
    Nit(Nit),
    /// Service Description Table, table ids `0x42` (actual) and `0x46` (other)
    Sdt(Sdt),
    /// Bouquet Association Table, table id `0x4a`
    Bat(Bat),
    /// Event Information Table, table ids `0x4e`/`0x4f` and `0x50..=0x6f`
    Eit(Eit),
    /// Time-Date Table, table id `0x70`
    Tdt(Tdt),
    /// Running Status Table, table id `0x71`
    Rst(Rst),
    /// Time-Offset Table, table id `0x73`
    Tot(Tot),
    /// Discontinuity Information Table, table id `0x7e`
    Dit(Dit),
    /// Selection Information Table, table id `0x7f`
    Sit(Sit),
    /// Raw accumulated section bodies of any other table id (user-defined ranges included).
    Metadata(Vec<u8>),
}

impl TablePayload {
    fn new_for(table_id: u8) -> TablePayload {
        match table_id {
            0x00 => TablePayload::Pat(Pat::default()),
            0x01 => TablePayload::Cat(Cat::default()),
            0x02 => TablePayload::Pmt(Pmt::default()),
            0x03 => TablePayload::Tsdt(Tsdt::default()),
            0x40 | 0x41 => TablePayload::Nit(Nit::default()),
            0x42 | 0x46 => TablePayload::Sdt(Sdt::default()),
            0x4a => TablePayload::Bat(Bat::default()),
            0x4e | 0x4f | 0x50..=0x6f => TablePayload::Eit(Eit::default()),
            0x70 => TablePayload::Tdt(Tdt::default()),
            0x71 => TablePayload::Rst(Rst::default()),
            0x73 => TablePayload::Tot(Tot::default()),
            0x7e => TablePayload::Dit(Dit::default()),
            0x7f => TablePayload::Sit(Sit::default()),
            _ => TablePayload::Metadata(Vec::new()),
        }
    }

    /// Decode one section body into this payload.  `body` still carries the trailing 4 bytes
    /// assumed to be the section's CRC, which are trimmed here and never verified.
    fn push_body(&mut self, head: &SectionHead, body: &[u8]) -> Result<(), TableError> {
        let data = &body[..body.len().saturating_sub(4)];
        match self {
            TablePayload::Pat(t) => t.push_section(data),
            TablePayload::Cat(t) => t.push_section(data),
            TablePayload::Pmt(t) => t.push_section(data),
            TablePayload::Tsdt(t) => t.push_section(data),
            TablePayload::Nit(t) => t.push_section(data),
            TablePayload::Sdt(t) => t.push_section(data),
            TablePayload::Bat(t) => t.push_section(data),
            TablePayload::Eit(t) => t.push_section(data),
            TablePayload::Tdt(t) => {
                *t = Tdt::from_head(head);
                Ok(())
            }
            TablePayload::Rst(t) => t.push_section(data),
            TablePayload::Tot(t) => {
                *t = Tot::from_parts(head, data)?;
                Ok(())
            }
            TablePayload::Dit(t) => t.push_section(data),
            TablePayload::Sit(t) => t.push_section(data),
            TablePayload::Metadata(v) => {
                v.extend_from_slice(data);
                Ok(())
            }
        }
    }
}

/// One version of one table, together with the bookkeeping needed to tell when all its sections
/// have been received.
#[derive(Debug, Clone)]
pub struct Table {
    /// Identifies the kind of table.
    pub table_id: u8,
    /// The 5-bit version number this instance was built from.
    pub version: u8,
    /// The section head most recently merged into this table.
    pub head: SectionHead,
    /// Wall-clock second at which the last outstanding section arrived; `None` while the table
    /// is still partial.
    pub completed_at: Option<u64>,
    /// The table-specific decoded structure.
    pub payload: TablePayload,
    sections_present: FixedBitSet,
}

impl Table {
    fn new(head: &SectionHead) -> Table {
        Table {
            table_id: head.table_id,
            version: head.version,
            head: *head,
            completed_at: None,
            payload: TablePayload::new_for(head.table_id),
            sections_present: FixedBitSet::with_capacity(0x100),
        }
    }

    /// `true` when the section with the given number has been received into this table.
    pub fn has_section(&self, section_number: u8) -> bool {
        self.sections_present.contains(usize::from(section_number))
    }

    /// `true` once every section in `0..=last_section_number` has been received.  Short-syntax
    /// tables are complete as soon as their single section is in (their head's section-number
    /// bytes carry table data instead).
    pub fn is_complete(&self) -> bool {
        if !self.head.section_syntax_indicator {
            return self.has_section(0);
        }
        (0..=self.head.last_section_number).all(|n| self.has_section(n))
    }
}

/// `true` when version `a` should displace version `b` as the current view.
///
/// A table completed more than [`RECENCY_DOMINANCE_SECS`](constant.RECENCY_DOMINANCE_SECS.html)
/// after another wins outright; within the window the higher `version_number` wins.
pub fn is_newer_than(a: &Table, b: &Table) -> bool {
    let ta = a.completed_at.unwrap_or(0);
    let tb = b.completed_at.unwrap_or(0);
    if ta > tb && ta - tb > RECENCY_DOMINANCE_SECS {
        true
    } else if tb > ta && tb - ta > RECENCY_DOMINANCE_SECS {
        false
    } else {
        a.version > b.version
    }
}

#[derive(Default)]
struct VersionRing {
    partial: [Option<Box<Table>>; MAX_VERSIONS],
    parsed: [Option<Box<Table>>; MAX_VERSIONS],
    current: Option<usize>,
}

impl VersionRing {
    fn current_table(&self) -> Option<&Table> {
        self.current
            .and_then(|slot| self.parsed[slot].as_deref())
    }

    fn reselect_current(&mut self) {
        let mut best: Option<usize> = None;
        for slot in 0..MAX_VERSIONS {
            if let Some(candidate) = self.parsed[slot].as_deref() {
                best = match best {
                    Some(b) if !is_newer_than(candidate, self.parsed[b].as_deref().unwrap()) => {
                        Some(b)
                    }
                    _ => Some(slot),
                };
            }
        }
        self.current = best;
    }
}

/// Identifies a table whose current view just changed, so the demultiplexer can re-derive any
/// downstream packet filters from the new content.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Promotion {
    /// The table id whose current view changed.
    pub table_id: u8,
}

/// Owner of every table built from the stream, current and superseded, complete and partial.
#[derive(Default)]
pub struct TableStore {
    rings: HashMap<u8, VersionRing>,
}

impl TableStore {
    /// Merge one completed section into the staged table for its `(table_id, version)`.
    ///
    /// Returns `Ok(Some(_))` when this section completed a version which then became the
    /// current view with content differing from the previous current view.
    pub fn push_section(
        &mut self,
        sect: &CompletedSection,
    ) -> Result<Option<Promotion>, TableError> {
        let head = &sect.head;
        if head.table_id == TABLE_ID_FORBIDDEN {
            warn!("discarding section with forbidden table_id 0xff");
            return Ok(None);
        }
        if head.table_id == TABLE_ID_STUFFING {
            return Ok(None);
        }
        // for short-syntax tables (TDT, TOT, RST) the bytes behind the version, current/next
        // and section-number head fields are table data, so none of those fields gate
        // aggregation: each section stands alone as section 0 of a single-section table
        let long_syntax = head.section_syntax_indicator;
        if long_syntax && head.current_next_indicator == CurrentNext::Next {
            // tables sent ahead of their activation time are not aggregated
            debug!(
                "ignoring 'next'-flagged section for table_id {:#x}",
                head.table_id
            );
            return Ok(None);
        }
        let section_number = if long_syntax { head.section_number } else { 0 };
        let ring = self.rings.entry(head.table_id).or_default();
        let slot = usize::from(head.version) % MAX_VERSIONS;

        // evict a staged table of a superseded version before staging this one,
        match &ring.partial[slot] {
            Some(t) if t.version != head.version => {
                debug!(
                    "table_id {:#x}: version {} displaces staged version {}",
                    head.table_id, head.version, t.version
                );
                ring.partial[slot] = Some(Box::new(Table::new(head)));
            }
            Some(_) => {}
            None => ring.partial[slot] = Some(Box::new(Table::new(head))),
        }
        let table = ring.partial[slot].as_mut().unwrap();
        if table.has_section(section_number) {
            // a re-sent section is accepted and ignored
            return Ok(None);
        }
        table
            .sections_present
            .insert(usize::from(section_number));
        table.head = *head;
        table.payload.push_body(head, &sect.body)?;
        if !table.is_complete() {
            return Ok(None);
        }

        // all sections in: stamp, promote into the parsed ring and re-pick the current view
        table.completed_at = Some(wall_clock_secs());
        let promoted = ring.partial[slot].take();
        let previous_payload = ring.current_table().map(|t| t.payload.clone());
        ring.parsed[slot] = promoted;
        ring.reselect_current();
        let changed = match (ring.current_table(), &previous_payload) {
            (Some(now), Some(before)) => now.payload != *before,
            (Some(_), None) => true,
            (None, _) => false,
        };
        Ok(changed.then_some(Promotion {
            table_id: head.table_id,
        }))
    }

    /// The current view for the given table id: the latest fully-received version, if any
    /// version has ever completed.
    pub fn current(&self, table_id: u8) -> Option<&Table> {
        self.rings.get(&table_id).and_then(VersionRing::current_table)
    }

    /// Iterate over the table ids for which a current view exists.
    pub fn table_ids(&self) -> impl Iterator<Item = u8> + '_ {
        let mut ids: Vec<u8> = self
            .rings
            .iter()
            .filter(|(_, ring)| ring.current.is_some())
            .map(|(&id, _)| id)
            .collect();
        ids.sort_unstable();
        ids.into_iter()
    }
}
