//! Structures for demultiplexing MPEG2 Transport Stream data and recovering the PSI/SI tables
//! it carries, per the _ISO/IEC 13818-1_ and _ETSI EN 300 468_ standards.
//!
//! # Design principles
//!
//!  * *Push-driven*.  The caller feeds byte buffers in; all state transitions follow from the
//!    data.  There are no timers, no background work and no callbacks, so the library fits any
//!    I/O arrangement the application prefers.
//!  * *Tables are owned, packets are borrowed*.  The per-packet layer borrows slices of the
//!    caller's buffer and copies nothing it does not have to; the recovered tables are owned by
//!    the demultiplexer and survive from one buffer to the next, so the caller can query the
//!    multiplex structure at any point.
//!  * *Tolerant of broadcast reality*.  Continuity-counter gaps are flagged and survived,
//!    truncated descriptors are preserved raw rather than failing their section, and duplicate
//!    sections are accepted idempotently.
//!  * *Decode the control plane, not the media*.  PSI/SI sections are reassembled and decoded
//!    into typed tables; elementary stream (PES) payloads are framed and discarded.
//!
//! # Getting started
//!
//! ```
//! use mpegts_tables::demultiplex::Demultiplex;
//! use mpegts_tables::tables::TablePayload;
//!
//! # fn main() -> Result<(), mpegts_tables::demultiplex::DemuxError> {
//! let mut demux = Demultiplex::new(false);
//! # let buf: &[u8] = &[];
//! // feed data from wherever; files and raw buffers both work
//! # let _ = |buf: &[u8]| -> Result<(), mpegts_tables::demultiplex::DemuxError> {
//! demux.add_buffer(buf)?;
//! # Ok(())
//! # };
//! if let Some(table) = demux.table(0x00) {
//!     if let TablePayload::Pat(pat) = &table.payload {
//!         for program in &pat.programs {
//!             println!("{:?}", program);
//!         }
//!     }
//! }
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms, future_incompatible, missing_docs)]

pub mod demultiplex;
pub mod descriptor;
pub mod packet;
pub mod pes;
pub mod psi;
pub mod sync;
pub mod tables;

/// The kind of content carried by an elementary stream, per _ISO/IEC 13818-1_ table 2-29.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum StreamType {
    /// ISO/IEC 11172 (MPEG-1) video
    Iso11172Video,
    /// ITU-T H.262 (MPEG-2) video
    H262,
    /// ISO/IEC 11172 (MPEG-1) audio
    Iso11172Audio,
    /// ISO/IEC 13818-3 (MPEG-2) audio
    Iso138183Audio,
    /// private data carried in sections, per H.222.0
    H2220PrivateSections,
    /// private data carried in PES packets, per H.222.0
    H2220PesPrivateData,
    /// ISO/IEC 13522 MHEG
    Mheg,
    /// H.222.0 annex A DSM-CC
    H2220DsmCc,
    /// ITU-T H.222.1
    H2221,
    /// ISO/IEC 13818-6 type A: multiprotocol encapsulation
    Iso138186MultiprotocolEncapsulation,
    /// ISO/IEC 13818-6 type B: DSM-CC U-N messages
    DsmccUnMessages,
    /// ISO/IEC 13818-6 type C: DSM-CC stream descriptors
    DsmccStreamDescriptors,
    /// ISO/IEC 13818-6 type D: DSM-CC sections
    DsmccSections,
    /// H.222.0 auxiliary data
    H2220Auxiliary,
    /// ISO/IEC 13818-7 audio with ADTS transport syntax
    Adts,
    /// ISO/IEC 14496-2 (MPEG-4) visual
    Iso144962Visual,
    /// ISO/IEC 14496-3 audio with LATM transport syntax
    Latm,
    /// ISO/IEC 14496-1 SL-packetized stream carried in PES packets
    FlexMuxPes,
    /// ISO/IEC 14496-1 SL-packetized stream carried in ISO/IEC 14496 sections
    FlexMuxIso14496Sections,
    /// ISO/IEC 13818-6 synchronized download protocol
    SynchronizedDownloadProtocol,
    /// metadata carried in PES packets
    MetadataInPes,
    /// metadata carried in metadata sections
    MetadataInMetadataSections,
    /// metadata carried in ISO/IEC 13818-6 data carousel
    DsmccDataCarouselMetadata,
    /// metadata carried in ISO/IEC 13818-6 object carousel
    DsmccObjectCarouselMetadata,
    /// metadata carried in ISO/IEC 13818-6 synchronized download protocol
    SynchronizedDownloadProtocolMetadata,
    /// IPMP stream, per ISO/IEC 13818-11
    Ipmp,
    /// ITU-T H.264 (MPEG-4 part 10 / AVC) video
    H264,
    /// ITU-T H.265 (HEVC) video
    H265,
    /// Chinese Video Standard
    ChineseVideoStandard,
    /// ATSC A/52 (Dolby Digital) audio
    AtscDolbyDigitalAudio,
    /// ATSC DSM-CC network resources table
    AtscDsmccNetworkResourcesTable,
    /// ATSC DSM-CC synchronous data stream
    AtscDsmccSynchronousData,
    /// A value privately defined outside the core standards (`0x80..=0xff`, less the ATSC
    /// values called out above).
    Private(u8),
    /// A value the core standards reserve.
    Reserved(u8),
}

impl From<u8> for StreamType {
    fn from(val: u8) -> Self {
        match val {
            0x01 => StreamType::Iso11172Video,
            0x02 => StreamType::H262,
            0x03 => StreamType::Iso11172Audio,
            0x04 => StreamType::Iso138183Audio,
            0x05 => StreamType::H2220PrivateSections,
            0x06 => StreamType::H2220PesPrivateData,
            0x07 => StreamType::Mheg,
            0x08 => StreamType::H2220DsmCc,
            0x09 => StreamType::H2221,
            0x0A => StreamType::Iso138186MultiprotocolEncapsulation,
            0x0B => StreamType::DsmccUnMessages,
            0x0C => StreamType::DsmccStreamDescriptors,
            0x0D => StreamType::DsmccSections,
            0x0E => StreamType::H2220Auxiliary,
            0x0F => StreamType::Adts,
            0x10 => StreamType::Iso144962Visual,
            0x11 => StreamType::Latm,
            0x12 => StreamType::FlexMuxPes,
            0x13 => StreamType::FlexMuxIso14496Sections,
            0x14 => StreamType::SynchronizedDownloadProtocol,
            0x15 => StreamType::MetadataInPes,
            0x16 => StreamType::MetadataInMetadataSections,
            0x17 => StreamType::DsmccDataCarouselMetadata,
            0x18 => StreamType::DsmccObjectCarouselMetadata,
            0x19 => StreamType::SynchronizedDownloadProtocolMetadata,
            0x1a => StreamType::Ipmp,
            0x1b => StreamType::H264,
            0x24 => StreamType::H265,
            0x42 => StreamType::ChineseVideoStandard,
            0x81 => StreamType::AtscDolbyDigitalAudio,
            0x95 => StreamType::AtscDsmccNetworkResourcesTable,
            0xc2 => StreamType::AtscDsmccSynchronousData,
            _ => {
                if val >= 0x80 {
                    StreamType::Private(val)
                } else {
                    StreamType::Reserved(val)
                }
            }
        }
    }
}

impl From<StreamType> for u8 {
    fn from(val: StreamType) -> Self {
        match val {
            StreamType::Iso11172Video => 0x01,
            StreamType::H262 => 0x02,
            StreamType::Iso11172Audio => 0x03,
            StreamType::Iso138183Audio => 0x04,
            StreamType::H2220PrivateSections => 0x05,
            StreamType::H2220PesPrivateData => 0x06,
            StreamType::Mheg => 0x07,
            StreamType::H2220DsmCc => 0x08,
            StreamType::H2221 => 0x09,
            StreamType::Iso138186MultiprotocolEncapsulation => 0x0A,
            StreamType::DsmccUnMessages => 0x0B,
            StreamType::DsmccStreamDescriptors => 0x0C,
            StreamType::DsmccSections => 0x0D,
            StreamType::H2220Auxiliary => 0x0E,
            StreamType::Adts => 0x0F,
            StreamType::Iso144962Visual => 0x10,
            StreamType::Latm => 0x11,
            StreamType::FlexMuxPes => 0x12,
            StreamType::FlexMuxIso14496Sections => 0x13,
            StreamType::SynchronizedDownloadProtocol => 0x14,
            StreamType::MetadataInPes => 0x15,
            StreamType::MetadataInMetadataSections => 0x16,
            StreamType::DsmccDataCarouselMetadata => 0x17,
            StreamType::DsmccObjectCarouselMetadata => 0x18,
            StreamType::SynchronizedDownloadProtocolMetadata => 0x19,
            StreamType::Ipmp => 0x1a,
            StreamType::H264 => 0x1b,
            StreamType::H265 => 0x24,
            StreamType::ChineseVideoStandard => 0x42,
            StreamType::AtscDolbyDigitalAudio => 0x81,
            StreamType::AtscDsmccNetworkResourcesTable => 0x95,
            StreamType::AtscDsmccSynchronousData => 0xc2,
            StreamType::Reserved(val) => val,
            StreamType::Private(val) => val,
        }
    }
}

impl StreamType {
    /// `true` for the stream types that carry audio or video media.
    pub fn is_audio_or_video(self) -> bool {
        matches!(
            self,
            StreamType::Iso11172Video
                | StreamType::H262
                | StreamType::Iso11172Audio
                | StreamType::Iso138183Audio
                | StreamType::Adts
                | StreamType::Iso144962Visual
                | StreamType::Latm
                | StreamType::H264
                | StreamType::H265
                | StreamType::AtscDolbyDigitalAudio
        )
    }
}

#[cfg(test)]
mod test {
    use super::StreamType;

    #[test]
    fn stream_type_round_trip() {
        for val in 0..=255u8 {
            let st = StreamType::from(val);
            assert_eq!(u8::from(st), val);
        }
    }

    #[test]
    fn stream_type_classification() {
        assert_eq!(StreamType::from(0x1b), StreamType::H264);
        assert!(StreamType::from(0x1b).is_audio_or_video());
        assert_eq!(StreamType::from(0x20), StreamType::Reserved(0x20));
        assert_eq!(StreamType::from(0x85), StreamType::Private(0x85));
        assert!(!StreamType::from(0x85).is_audio_or_video());
    }
}
