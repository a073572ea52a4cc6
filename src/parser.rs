//! The parser proper: accumulates teletext page lines across elementary stream buffers and
//! produces timed text samples as pages complete.
//!
//! A teletext page has no explicit end marker in the bitstream.  A page is considered complete
//! when a new page header (packet 0) arrives for a page index that already has buffered lines,
//! or when the caller signals end-of-stream via
//! [`flush()`](struct.TeletextParser.html#method.flush).  Until then, decoded display rows
//! accumulate against the page index announced by the most recent header.
//!
//! To receive the output, create an implementation of
//! [`TeletextConsumer`](trait.TeletextConsumer.html) and pass it to
//! [`TeletextParser::new()`](struct.TeletextParser.html#method.new).

use crate::charset::Charset;
use crate::dataunit::{DataUnit, DataUnitError, DataUnitId, DataUnitIter};
use crate::descriptor::TeletextDescriptor;
use crate::hamming;
use crate::PageId;
use bitreader::BitReader;
use log::warn;
use mpeg2ts_reader::packet::Pid;
use mpeg2ts_reader::pes::Timestamp;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

/// One piece of a text sample's content.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum TextFragment {
    /// A run of text within one display row.  `&` and `<` appear escaped as `&amp;` and `&lt;`
    /// so that the text can be embedded into markup.
    Text(String),
    /// An explicit break between display rows.
    LineBreak,
}

/// A completed subtitle cue: the text of one teletext page occurrence, spanning the presentation
/// times at which the page appeared and was replaced.
#[derive(Debug, PartialEq, Clone)]
pub struct TextSample {
    /// The page this sample belongs to, for routing by language/channel.
    pub page: PageId,
    /// Presentation time at which the first line of the page was received.
    pub pts: Timestamp,
    /// Presentation time at which the page was replaced or the stream flushed.
    pub end_pts: Timestamp,
    /// The sample content: text runs with a single
    /// [`LineBreak`](enum.TextFragment.html#variant.LineBreak) between rows and none trailing.
    pub fragments: Vec<TextFragment>,
}
impl TextSample {
    /// The sample content as a single string, with rows separated by `\n`.
    pub fn text(&self) -> String {
        let mut text = String::new();
        for fragment in &self.fragments {
            match fragment {
                TextFragment::Text(t) => text.push_str(t),
                TextFragment::LineBreak => text.push('\n'),
            }
        }
        text
    }
}

/// Declaration of one page carried on the stream, taken from the teletext descriptor.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct SubStream {
    /// The page index used to tag samples belonging to this sub-stream.
    pub page: PageId,
    /// ISO 639-2 language code from the descriptor entry.
    pub language: String,
}

/// Announcement of the properties of the text stream a parser will produce, made once before
/// the first sample.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct TeletextStreamInfo {
    /// The PID of the elementary stream being parsed.
    pub pid: Pid,
    /// Timescale in which sample timestamps are expressed (the 90kHz PES timebase).
    pub timescale: u64,
    /// Identifier for the sample encoding; always `"text"`.
    pub codec: &'static str,
    /// One entry per page declared in the teletext descriptor, in increasing page-index order.
    /// Empty if the stream carried no descriptor, or a malformed one.
    pub sub_streams: Vec<SubStream>,
}

/// Trait for types that will receive the text samples extracted from a teletext elementary
/// stream.
///
/// An instance is supplied to [`TeletextParser::new()`](struct.TeletextParser.html#method.new),
/// and both methods are invoked synchronously from within
/// [`parse()`](struct.TeletextParser.html#method.parse) /
/// [`flush()`](struct.TeletextParser.html#method.flush).
pub trait TeletextConsumer {
    /// Called once, during the first `parse()` call after construction or
    /// [`reset()`](struct.TeletextParser.html#method.reset), before any sample is emitted.
    fn stream_info(&mut self, info: &TeletextStreamInfo);
    /// Called each time a page completes.
    fn emit_sample(&mut self, sample: TextSample);
}
impl<C: TeletextConsumer + ?Sized> TeletextConsumer for &mut C {
    fn stream_info(&mut self, info: &TeletextStreamInfo) {
        (**self).stream_info(info)
    }
    fn emit_sample(&mut self, sample: TextSample) {
        (**self).emit_sample(sample)
    }
}

/// Problems which prevented a buffer from being parsed.  Pages already buffered from earlier
/// calls are unaffected and parsing may continue with the next buffer.
#[derive(Debug, PartialEq)]
pub enum ParseError {
    /// The buffer ended before a complete syntax element could be read.
    NotEnoughData {
        /// the name of the syntax element being read
        field: &'static str,
        /// the number of bytes required
        expected: usize,
        /// the number of bytes present
        actual: usize,
    },
    /// A bit-level read failed while decoding a page header.
    Bits(bitreader::BitReaderError),
}
impl From<bitreader::BitReaderError> for ParseError {
    fn from(e: bitreader::BitReaderError) -> Self {
        ParseError::Bits(e)
    }
}

struct PendingPage {
    lines: Vec<String>,
    pts: Timestamp,
}

/// Extracts subtitle pages from the elementary stream payload of one teletext PID.
///
/// One instance owns all parsing state for one PID; callers handling several teletext streams
/// create one parser per PID.  The parser is not thread-safe.
pub struct TeletextParser<C: TeletextConsumer> {
    consumer: C,
    pid: Pid,
    languages: BTreeMap<PageId, String>,
    pending: BTreeMap<PageId, PendingPage>,
    magazine: u8,
    page_number: u8,
    charset: Charset,
    sent_info: bool,
    last_pts: Option<Timestamp>,
}
impl<C: TeletextConsumer> TeletextParser<C> {
    /// Creates a parser for the teletext elementary stream on the given PID.
    ///
    /// `descriptor` holds the teletext descriptor bytes from the stream's PMT entry (including
    /// the tag and length bytes).  If the descriptor is malformed the stream is still parsed,
    /// but the stream-info announcement declares no sub-streams.
    pub fn new(pid: Pid, descriptor: &[u8], consumer: C) -> TeletextParser<C> {
        TeletextParser {
            consumer,
            pid,
            languages: language_map(descriptor),
            pending: BTreeMap::new(),
            magazine: 0,
            page_number: 0,
            charset: Charset::new(),
            sent_info: false,
            last_pts: None,
        }
    }

    /// Processes one elementary stream buffer, tagged with its presentation timestamp.
    ///
    /// `dts` is accepted for symmetry with the demultiplexer interface but does not influence
    /// parsing.  Completed pages are handed to the consumer from within this call.  On error
    /// the remainder of this buffer is abandoned; pages buffered from earlier calls are kept.
    pub fn parse(
        &mut self,
        data: &[u8],
        pts: Timestamp,
        _dts: Option<Timestamp>,
    ) -> Result<(), ParseError> {
        self.last_pts = Some(pts);
        if !self.sent_info {
            self.sent_info = true;
            let info = TeletextStreamInfo {
                pid: self.pid,
                timescale: Timestamp::TIMEBASE,
                codec: "text",
                sub_streams: self
                    .languages
                    .iter()
                    .map(|(&page, language)| SubStream {
                        page,
                        language: language.clone(),
                    })
                    .collect(),
            };
            self.consumer.stream_info(&info);
        }
        self.parse_internal(data, pts)
    }

    /// Emits every page still buffered, closed at the presentation time of the last buffer
    /// given to [`parse()`](#method.parse), in increasing page-index order.
    ///
    /// Call at end-of-stream.  A second call emits nothing further.
    pub fn flush(&mut self) -> Result<(), ParseError> {
        let Some(pts) = self.last_pts else {
            return Ok(());
        };
        let keys: Vec<PageId> = self.pending.keys().copied().collect();
        for key in keys {
            self.send_pending(key, pts);
        }
        Ok(())
    }

    /// Discards all buffered pages and returns the parser to its initial state, ready for use
    /// across a stream discontinuity.  The stream-info announcement will be repeated on the
    /// next call to [`parse()`](#method.parse).
    pub fn reset(&mut self) {
        self.pending.clear();
        self.magazine = 0;
        self.page_number = 0;
        self.sent_info = false;
        self.charset.set_code(0);
    }

    /// Gives access to the consumer supplied at construction.
    pub fn consumer_mut(&mut self) -> &mut C {
        &mut self.consumer
    }

    fn parse_internal(&mut self, data: &[u8], pts: Timestamp) -> Result<(), ParseError> {
        let mut lines = Vec::new();
        for unit in DataUnitIter::new(data).map_err(unit_err)? {
            let unit = match unit {
                Ok(unit) => unit,
                Err(DataUnitError::UnsupportedUnitLength(len)) => {
                    warn!("bad teletext data_unit_length {}, expected 44", len);
                    break;
                }
                Err(e) => return Err(unit_err(e)),
            };
            if unit.data_unit_id() != DataUnitId::EbuTeletextSubtitle {
                continue;
            }
            match unit.packet_number() {
                0 => self.parse_page_header(&unit, pts)?,
                1..=25 => lines.push(self.build_text(unit.payload())),
                // enhancement packets are out of scope
                _ => (),
            }
        }

        if lines.is_empty() {
            return Ok(());
        }
        let id = self.current_page();
        match self.pending.entry(id) {
            Entry::Vacant(entry) => {
                entry.insert(PendingPage { lines, pts });
            }
            Entry::Occupied(mut entry) => entry.get_mut().lines.append(&mut lines),
        }
        Ok(())
    }

    /// Handles a packet-0 page header: completes any previous occurrence of the same page, then
    /// makes the header's page current and re-evaluates the charset designation.
    fn parse_page_header(&mut self, unit: &DataUnit<'_>, pts: Timestamp) -> Result<(), ParseError> {
        let mut reader = BitReader::new(unit.payload());
        let page_units = hamming::decode(reader.read_u8(8)?);
        let page_tens = hamming::decode(reader.read_u8(8)?);
        let page_number = 10 * page_tens + page_units;
        let magazine = unit.magazine();

        self.send_pending(PageId::new(magazine, page_number), pts);
        self.magazine = magazine;
        self.page_number = page_number;
        if page_tens == 0xf && page_units == 0xf {
            // the "no page" marker: the header carries no displayable page
            return Ok(());
        }

        // subcode digits S1-S4 and control bits C1-C6 precede the byte holding C11-C14
        reader.skip(40)?;
        let subcode_c11_c14 = hamming::decode(reader.read_u8(8)?);
        self.charset.set_code(subcode_c11_c14 >> 1);
        Ok(())
    }

    /// The page index that decoded display rows are currently attributed to: the one from the
    /// most recently seen page header.  Before any header has been seen, magazine and page are
    /// both zero and rows accumulate under index 0.
    fn current_page(&self) -> PageId {
        PageId::from_value(u16::from(self.magazine) * 100 + u16::from(self.page_number))
    }

    /// Decodes the 40 payload bytes of one display row.  Teletext transmits each byte least
    /// significant bit first, so bytes are bit-reversed before the 7-bit code point is taken.
    fn build_text(&self, payload: &[u8]) -> String {
        let mut text = String::with_capacity(DataUnit::PAYLOAD_LEN * 2);
        let mut leading_spaces = true;
        for &byte in payload {
            let mut code_point = byte.reverse_bits() & 0x7f;
            if code_point < 0x20 {
                code_point = 0x20;
            }
            if leading_spaces {
                if code_point == 0x20 {
                    continue;
                }
                leading_spaces = false;
            }
            match code_point {
                b'&' => text.push_str("&amp;"),
                b'<' => text.push_str("&lt;"),
                _ => text.push(self.charset.decode(code_point)),
            }
        }
        let trimmed_len = text.trim_end_matches(' ').len();
        text.truncate(trimmed_len);
        text
    }

    /// Emits the buffered lines for the given page, if any, closing the sample at `end_pts`.
    fn send_pending(&mut self, id: PageId, end_pts: Timestamp) {
        match self.pending.get(&id) {
            None => return,
            Some(page) if page.lines.is_empty() => return,
            Some(_) => (),
        }
        if let Some(page) = self.pending.remove(&id) {
            let mut fragments = Vec::with_capacity(page.lines.len() * 2 - 1);
            for (i, line) in page.lines.into_iter().enumerate() {
                if i > 0 {
                    fragments.push(TextFragment::LineBreak);
                }
                fragments.push(TextFragment::Text(line));
            }
            self.consumer.emit_sample(TextSample {
                page: id,
                pts: page.pts,
                end_pts,
                fragments,
            });
        }
    }
}

fn unit_err(e: DataUnitError) -> ParseError {
    match e {
        DataUnitError::NotEnoughData {
            field,
            expected,
            actual,
        } => ParseError::NotEnoughData {
            field,
            expected,
            actual,
        },
        DataUnitError::UnsupportedUnitLength(len) => {
            // handled before conversion; a unit of any other length still ends the buffer
            ParseError::NotEnoughData {
                field: "data_unit_length",
                expected: DataUnit::BLOCK_LEN,
                actual: usize::from(len),
            }
        }
    }
}

/// Builds the page-to-language mapping from the teletext descriptor bytes.  Any malformation
/// yields an empty map: the stream is then treated as a single text stream with no declared
/// sub-languages.
fn language_map(descriptor: &[u8]) -> BTreeMap<PageId, String> {
    let mut map = BTreeMap::new();
    let desc = match TeletextDescriptor::from_bytes(descriptor) {
        Ok(desc) => desc,
        Err(e) => {
            warn!("unable to parse teletext_descriptor: {:?}", e);
            return map;
        }
    };
    for language in desc.languages() {
        match language {
            Ok(language) => {
                map.insert(language.page_id(), language.language().into_owned());
            }
            Err(e) => {
                warn!("teletext_descriptor language loop malformed: {:?}", e);
                map.clear();
                return map;
            }
        }
    }
    map
}
