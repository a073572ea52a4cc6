//! Structures for parsing EBU Teletext subtitle data carried within an MPEG Transport Stream,
//! per the _ETSI EN 300 706_ standard.
//!
//! This crate is a companion to the
//! [`mpeg2ts-reader`](https://crates.io/crates/mpeg2ts-reader) crate: that crate demultiplexes
//! Transport Stream packets into Packetised Elementary Stream data, and the
//! [`TeletextParser`](parser/struct.TeletextParser.html) in this crate turns the resulting
//! elementary stream payloads into timed subtitle text samples.
//!
//! # Design principals
//!
//!  * *Push-based*.  The caller hands each elementary stream buffer to
//!    [`parse()`](parser/struct.TeletextParser.html#method.parse) together with its presentation
//!    timestamp; completed subtitle pages are announced through a
//!    [`TeletextConsumer`](parser/trait.TeletextConsumer.html) implementation supplied by the
//!    caller.
//!  * *No rendering*.  Teletext colour, box-drawing and other display attributes are out of
//!    scope; pages are reduced to their text lines, with `&` and `<` escaped so the text can be
//!    embedded into markup downstream.
//!  * *Transport Neutral*.  There is no code here supporting consuming from files or the network.
//!    The APIs accept `&[u8]`, and the caller handles providing the data from wherever.
//!
//! # Scope
//!
//! Only the base subtitling syntax is handled: the page header (packet 0) and the display rows
//! (packets 1 to 25).  Enhancement packets, mixed-mode pages and national character sets other
//! than the default Latin G0 set and its Portuguese/Spanish variant are not supported.

pub mod charset;
pub mod dataunit;
pub mod descriptor;
pub mod hamming;
pub mod parser;

/// Identifies one teletext page within a service: a combination of _magazine number_ (1 to 8)
/// and two-digit _page number_ (00 to 99).
///
/// Several independent subtitle pages (for instance different languages) may be multiplexed on a
/// single PID, and each text sample produced by the parser is tagged with the `PageId` it belongs
/// to so that downstream consumers can route by language.
///
/// The underlying value is `magazine * 100 + page`, the same scheme used to key sub-streams in
/// the _teletext descriptor_.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PageId(u16);
impl PageId {
    /// Combines the given magazine and page numbers.
    ///
    /// A magazine number of `0` denotes magazine 8 by convention, and is remapped here.
    pub fn new(magazine: u8, page: u8) -> PageId {
        let magazine = if magazine == 0 { 8 } else { magazine };
        PageId(u16::from(magazine) * 100 + u16::from(page))
    }
    /// Wraps an already-combined `magazine * 100 + page` value.
    pub const fn from_value(value: u16) -> PageId {
        PageId(value)
    }
    /// The combined `magazine * 100 + page` value.
    pub fn value(self) -> u16 {
        self.0
    }
    /// The magazine number component.
    pub fn magazine(self) -> u8 {
        (self.0 / 100) as u8
    }
    /// The page number component.
    pub fn page(self) -> u8 {
        (self.0 % 100) as u8
    }
}
