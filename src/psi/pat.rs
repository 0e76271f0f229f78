//! Types related to the _Program Association Table_

use super::TableError;
use crate::packet::Pid;

/// One entry of the _Program Association Table_, mapping a program number to the PID carrying
/// that program's _Program Map Table_.  The special program number zero instead names the
/// network PID.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProgramEntry {
    /// The `program_number` zero entry, which names the PID carrying the Network Information
    /// Table rather than a real program.
    Network {
        /// PID of the network information stream
        pid: Pid,
    },
    /// An ordinary program entry.
    Program {
        /// the number identifying this program within the multiplex
        program_number: u16,
        /// PID on which this program's PMT sections are carried
        pid: Pid,
    },
}

impl ProgramEntry {
    /// panics if fewer than 4 bytes are provided
    fn from_bytes(data: &[u8]) -> ProgramEntry {
        let program_number = u16::from(data[0]) << 8 | u16::from(data[1]);
        let pid = Pid::new(u16::from(data[2] & 0b0001_1111) << 8 | u16::from(data[3]));
        if program_number == 0 {
            ProgramEntry::Network { pid }
        } else {
            ProgramEntry::Program {
                program_number,
                pid,
            }
        }
    }

    /// The PID this entry points at, whichever kind of entry it is.
    pub fn pid(&self) -> Pid {
        match *self {
            ProgramEntry::Network { pid } => pid,
            ProgramEntry::Program { pid, .. } => pid,
        }
    }
}

/// The _Program Association Table_ gives details of the programs within a transport stream.
/// There may be only one program, or in the case of a broadcast multiplex, there may be many.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Pat {
    /// The program entries, in wire order across all sections of the table.
    pub programs: Vec<ProgramEntry>,
}

impl Pat {
    /// Decode one section body (already stripped of its head and trailing CRC bytes), appending
    /// the entries found to this table.  Trailing bytes too short to form an entry are ignored.
    pub fn push_section(&mut self, body: &[u8]) -> Result<(), TableError> {
        self.programs
            .extend(body.chunks_exact(4).map(ProgramEntry::from_bytes));
        Ok(())
    }

    /// Look up the PMT PID for the given program number.
    pub fn pmt_pid(&self, program_number: u16) -> Option<Pid> {
        self.programs.iter().find_map(|entry| match *entry {
            ProgramEntry::Program {
                program_number: pn,
                pid,
            } if pn == program_number => Some(pid),
            _ => None,
        })
    }

    /// Iterate over the PIDs announced by this table, network PID included.
    pub fn pids(&self) -> impl Iterator<Item = Pid> + '_ {
        self.programs.iter().map(ProgramEntry::pid)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn program_and_network_entries() {
        let mut pat = Pat::default();
        let body = [
            0x00, 0x00, 0xe0, 0x10, // network pid 0x10
            0x00, 0x01, 0xe1, 0x00, // program 1, pmt pid 0x100
        ];
        pat.push_section(&body[..]).unwrap();
        assert_eq!(pat.programs.len(), 2);
        assert_eq!(
            pat.programs[0],
            ProgramEntry::Network {
                pid: Pid::new(0x10)
            }
        );
        assert_eq!(
            pat.programs[1],
            ProgramEntry::Program {
                program_number: 1,
                pid: Pid::new(0x100)
            }
        );
        assert_eq!(pat.pmt_pid(1), Some(Pid::new(0x100)));
        assert_eq!(pat.pmt_pid(2), None);
    }

    #[test]
    fn entries_accumulate_across_sections() {
        let mut pat = Pat::default();
        pat.push_section(&[0x00, 0x01, 0xe1, 0x00]).unwrap();
        pat.push_section(&[0x00, 0x02, 0xe2, 0x00]).unwrap();
        assert_eq!(pat.programs.len(), 2);
        assert_eq!(pat.pmt_pid(2), Some(Pid::new(0x200)));
    }

    #[test]
    fn trailing_bytes_ignored() {
        let mut pat = Pat::default();
        pat.push_section(&[0x00, 0x01, 0xe1, 0x00, 0xff, 0xff])
            .unwrap();
        assert_eq!(pat.programs.len(), 1);
    }
}
