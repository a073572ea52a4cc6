//! Support for the DVB _teletext descriptor_, which announces the teletext pages carried on an
//! elementary stream and the language of each, per _ETSI EN 300 468_ section 6.2.41.
//!
//! The descriptor is found in the Program Map Table entry for the teletext elementary stream.
//! Extracting it from the PMT is the job of the surrounding demultiplexer (for instance via the
//! descriptor support in the `mpeg2ts-reader` crate); this module parses the descriptor bytes
//! themselves, and [`TeletextParser`](../parser/struct.TeletextParser.html) uses the result to
//! announce one sub-stream per declared page.

use crate::PageId;
use std::borrow::Cow;
use std::fmt;

/// Kinds of teletext page a descriptor entry may declare.
///
/// The parser treats every declared page as a potential subtitle page; the type is exposed for
/// callers that want to filter.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum TeletextType {
    /// `initial teletext page`
    InitialPage,
    /// `teletext subtitle page`
    Subtitles,
    /// `additional information page`
    AdditionalInformation,
    /// `programme schedule page`
    ProgrammeSchedule,
    /// `teletext subtitle page for hearing impaired people`
    HearingImpairedSubtitles,
    /// Encapsulates a type value reserved by _ETSI EN 300 468_
    Reserved(u8),
}
impl From<u8> for TeletextType {
    fn from(v: u8) -> Self {
        match v {
            0x01 => TeletextType::InitialPage,
            0x02 => TeletextType::Subtitles,
            0x03 => TeletextType::AdditionalInformation,
            0x04 => TeletextType::ProgrammeSchedule,
            0x05 => TeletextType::HearingImpairedSubtitles,
            _ => TeletextType::Reserved(v),
        }
    }
}

/// Problems encountered while parsing a teletext descriptor.
#[derive(Debug, PartialEq, Eq)]
pub enum DescriptorError {
    /// The buffer is too short to hold even the descriptor tag and length bytes.
    BufferTooShort {
        /// the actual buffer length
        buflen: usize,
    },
    /// The descriptor's declared length exceeds the bytes actually available.
    TagTooLongForBuffer {
        /// the length declared in the descriptor
        taglen: usize,
        /// the actual buffer length
        buflen: usize,
    },
    /// The descriptor content ended part-way through a five-byte language entry.
    NotEnoughData {
        /// the number of bytes required
        expected: usize,
        /// the number of bytes present
        actual: usize,
    },
}

/// Borrowing wrapper around teletext descriptor bytes (including the leading tag and length
/// bytes), giving access to the per-language page declarations within.
pub struct TeletextDescriptor<'buf> {
    buf: &'buf [u8],
}
impl<'buf> TeletextDescriptor<'buf> {
    /// The descriptor tag allocated to the teletext descriptor.
    pub const TAG: u8 = 0x56;
    /// The tag of the _VBI teletext descriptor_, which shares the teletext descriptor's syntax.
    pub const VBI_TELETEXT_TAG: u8 = 0x46;

    /// Wraps the given descriptor bytes, checking that the declared descriptor length fits
    /// within the buffer.
    pub fn from_bytes(buf: &'buf [u8]) -> Result<TeletextDescriptor<'buf>, DescriptorError> {
        if buf.len() < 2 {
            return Err(DescriptorError::BufferTooShort { buflen: buf.len() });
        }
        let len = buf[1] as usize;
        if len + 2 > buf.len() {
            return Err(DescriptorError::TagTooLongForBuffer {
                taglen: len,
                buflen: buf.len(),
            });
        }
        Ok(TeletextDescriptor { buf })
    }

    /// The descriptor tag value.
    pub fn tag(&self) -> u8 {
        self.buf[0]
    }

    fn payload(&self) -> &'buf [u8] {
        &self.buf[2..2 + self.buf[1] as usize]
    }

    /// Returns an iterator over the language entries of this descriptor.
    pub fn languages(&self) -> TeletextLanguageIter<'buf> {
        TeletextLanguageIter::new(self.payload())
    }
}
impl<'buf> fmt::Debug for TeletextDescriptor<'buf> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        f.debug_struct("TeletextDescriptor")
            .field("tag", &self.tag())
            .field("languages", &LangsDebug(self))
            .finish()
    }
}
struct LangsDebug<'buf>(&'buf TeletextDescriptor<'buf>);
impl<'buf> fmt::Debug for LangsDebug<'buf> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        f.debug_list().entries(self.0.languages()).finish()
    }
}

/// One five-byte language entry of a teletext descriptor, declaring a single page and the
/// language of its content.
pub struct TeletextLanguage<'buf> {
    buf: &'buf [u8],
}
impl<'buf> TeletextLanguage<'buf> {
    const LEN: usize = 5;

    fn new(buf: &'buf [u8]) -> TeletextLanguage<'buf> {
        assert_eq!(buf.len(), Self::LEN);
        TeletextLanguage { buf }
    }

    /// The ISO 639-2 language code, decoded from its ISO 8859-1 representation.
    pub fn language(&self) -> Cow<'buf, str> {
        encoding_rs::mem::decode_latin1(&self.buf[0..3])
    }
    /// The kind of page this entry declares.
    pub fn teletext_type(&self) -> TeletextType {
        TeletextType::from(self.buf[3] >> 3)
    }
    /// The magazine number of the declared page (a declared value of 0 denotes magazine 8).
    pub fn magazine(&self) -> u8 {
        let magazine = self.buf[3] & 0b111;
        if magazine == 0 {
            8
        } else {
            magazine
        }
    }
    /// The page number, assembled from its tens and units digits.
    pub fn page_number(&self) -> u8 {
        (self.buf[4] >> 4) * 10 + (self.buf[4] & 0xf)
    }
    /// The page identifier combining this entry's magazine and page numbers.
    pub fn page_id(&self) -> PageId {
        PageId::new(self.buf[3] & 0b111, self.page_number())
    }
}
impl<'buf> fmt::Debug for TeletextLanguage<'buf> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        f.debug_struct("TeletextLanguage")
            .field("language", &self.language())
            .field("teletext_type", &self.teletext_type())
            .field("page_id", &self.page_id())
            .finish()
    }
}

/// Iterator over the language entries within a
/// [`TeletextDescriptor`](struct.TeletextDescriptor.html).
pub struct TeletextLanguageIter<'buf> {
    buf: &'buf [u8],
}
impl<'buf> TeletextLanguageIter<'buf> {
    fn new(buf: &'buf [u8]) -> TeletextLanguageIter<'buf> {
        TeletextLanguageIter { buf }
    }
}
impl<'buf> Iterator for TeletextLanguageIter<'buf> {
    type Item = Result<TeletextLanguage<'buf>, DescriptorError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.buf.is_empty() {
            return None;
        }
        if self.buf.len() < TeletextLanguage::LEN {
            let actual = self.buf.len();
            // ensure another call to next() will yield None,
            self.buf = &self.buf[0..0];
            return Some(Err(DescriptorError::NotEnoughData {
                expected: TeletextLanguage::LEN,
                actual,
            }));
        }
        let (head, tail) = self.buf.split_at(TeletextLanguage::LEN);
        self.buf = tail;
        Some(Ok(TeletextLanguage::new(head)))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use assert_matches::assert_matches;
    use hex_literal::hex;

    #[test]
    fn one_language() {
        // "eng", teletext_type=2 (subtitles), magazine=1, page 0x56 -> 56
        let data = hex!("5605656e671156");
        let desc = TeletextDescriptor::from_bytes(&data[..]).unwrap();
        assert_eq!(TeletextDescriptor::TAG, desc.tag());
        let mut langs = desc.languages();
        let lang = langs.next().unwrap().unwrap();
        assert_eq!("eng", lang.language());
        assert_eq!(TeletextType::Subtitles, lang.teletext_type());
        assert_eq!(1, lang.magazine());
        assert_eq!(56, lang.page_number());
        assert_eq!(PageId::from_value(156), lang.page_id());
        assert_matches!(langs.next(), None);
    }

    #[test]
    fn two_languages() {
        let data = hex!("560a6465750a10706f721120");
        let desc = TeletextDescriptor::from_bytes(&data[..]).unwrap();
        let entries: Vec<_> = desc.languages().map(Result::unwrap).collect();
        assert_eq!(2, entries.len());
        assert_eq!("deu", entries[0].language());
        assert_eq!(TeletextType::InitialPage, entries[0].teletext_type());
        assert_eq!(PageId::from_value(210), entries[0].page_id());
        assert_eq!("por", entries[1].language());
        assert_eq!(PageId::from_value(120), entries[1].page_id());
    }

    #[test]
    fn magazine_zero_remapped() {
        let data = hex!("56057377651045");
        let desc = TeletextDescriptor::from_bytes(&data[..]).unwrap();
        let lang = desc.languages().next().unwrap().unwrap();
        assert_eq!(8, lang.magazine());
        assert_eq!(PageId::from_value(845), lang.page_id());
    }

    #[test]
    fn declared_length_beyond_buffer() {
        let data = hex!("560a656e671156");
        assert_matches!(
            TeletextDescriptor::from_bytes(&data[..]),
            Err(DescriptorError::TagTooLongForBuffer {
                taglen: 10,
                buflen: 7
            })
        );
    }

    #[test]
    fn buffer_too_short_for_header() {
        assert_matches!(
            TeletextDescriptor::from_bytes(&[0x56][..]),
            Err(DescriptorError::BufferTooShort { buflen: 1 })
        );
    }

    #[test]
    fn truncated_language_entry() {
        let data = hex!("5608656e671156646575");
        let desc = TeletextDescriptor::from_bytes(&data[..]).unwrap();
        let mut langs = desc.languages();
        assert_matches!(langs.next(), Some(Ok(_)));
        assert_matches!(
            langs.next(),
            Some(Err(DescriptorError::NotEnoughData {
                expected: 5,
                actual: 3
            }))
        );
        assert_matches!(langs.next(), None);
    }
}
