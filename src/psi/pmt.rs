//! Types related to the _Program Map Table_

use super::TableError;
use crate::descriptor::DescriptorSet;
use crate::packet::Pid;
use crate::StreamType;

/// Details of a particular elementary stream within a program.
///
///  - `stream_type` gives an indication of the kind of content carried within the stream
///  - the `elementary_pid` property allows us to find Transport Stream packets that belong to
///    the elementary stream
///  - `descriptors` _may_ provide extra metadata describing some of the stream's properties (for
///    example, the stream's 'language' might be given in a descriptor; or it might not)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamEntry {
    /// The type of this stream.
    pub stream_type: StreamType,
    /// The PID that will be used for TS packets containing the data of this stream.
    pub elementary_pid: Pid,
    /// Descriptors attached to this stream.
    pub descriptors: DescriptorSet,
}

/// The _Program Map Table_ lists the elementary streams within a particular program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pmt {
    /// PID of packets that will contain the Program Clock Reference for this program.
    pub pcr_pid: Pid,
    /// Descriptors applying to the program as a whole.
    pub descriptors: DescriptorSet,
    /// The program's elementary streams, in wire order across all sections of the table.
    pub streams: Vec<StreamEntry>,
}

impl Default for Pmt {
    fn default() -> Pmt {
        Pmt {
            pcr_pid: Pid::NULL,
            descriptors: DescriptorSet::default(),
            streams: Vec::new(),
        }
    }
}

impl Pmt {
    const ENTRY_HEADER_SIZE: usize = 5;

    /// Decode one section body (already stripped of its head and trailing CRC bytes), appending
    /// the streams found to this table.
    pub fn push_section(&mut self, body: &[u8]) -> Result<(), TableError> {
        if body.len() < 2 {
            return Err(TableError::NotEnoughData {
                field: "pcr_pid",
                expected: 2,
                actual: body.len(),
            });
        }
        self.pcr_pid = Pid::new(u16::from(body[0] & 0b0001_1111) << 8 | u16::from(body[1]));
        let (program_descriptors, consumed) = DescriptorSet::parse(&body[2..])?;
        self.descriptors.merge(program_descriptors);
        let mut rest = &body[2 + consumed..];
        while rest.len() >= Self::ENTRY_HEADER_SIZE {
            let stream_type = StreamType::from(rest[0]);
            let elementary_pid =
                Pid::new(u16::from(rest[1] & 0b0001_1111) << 8 | u16::from(rest[2]));
            let (descriptors, es_consumed) = DescriptorSet::parse(&rest[3..])?;
            self.streams.push(StreamEntry {
                stream_type,
                elementary_pid,
                descriptors,
            });
            rest = &rest[3 + es_consumed..];
        }
        Ok(())
    }

    /// Iterate over the elementary PIDs announced by this table.
    pub fn elementary_pids(&self) -> impl Iterator<Item = Pid> + '_ {
        self.streams.iter().map(|s| s.elementary_pid)
    }

    /// Find the stream entry for the given elementary PID.
    pub fn stream(&self, pid: Pid) -> Option<&StreamEntry> {
        self.streams.iter().find(|s| s.elementary_pid == pid)
    }
}
