//! Mapping of teletext code points to characters.
//!
//! Teletext transmits text using the 96 code points `0x20` to `0x7F` of its _G0_ character set.
//! The default table used here is the Latin G0 set from _ETSI EN 300 706_; a page header may
//! additionally designate a _national option_ sub-set, which replaces thirteen fixed positions
//! of the table with language-specific substitutions.  Of the national variants the standard
//! defines, only the combined Portuguese/Spanish set is currently supported; any other
//! designation leaves the base Latin table in effect.

/// Charset designation code (from control bits C12 to C14 of a page header subcode) selecting
/// the Portuguese/Spanish national option sub-set.
pub const CHARSET_PORTUGUESE_SPANISH: u8 = 5;

#[rustfmt::skip]
const G0_LATIN: [char; 96] = [
    ' ', '!', '"', '£', '$', '%', '&', '\'', '(', ')', '*', '+', ',', '-', '.', '/',
    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', ':', ';', '<', '=', '>', '?',
    '@', 'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J', 'K', 'L', 'M', 'N', 'O',
    'P', 'Q', 'R', 'S', 'T', 'U', 'V', 'W', 'X', 'Y', 'Z', '←', '½', '→', '↑', '#',
    '–', 'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i', 'j', 'k', 'l', 'm', 'n', 'o',
    'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z', '¼', '‖', '¾', '÷', '■',
];

/// Table indexes of the thirteen positions a national option sub-set replaces
/// (code points 0x23, 0x24, 0x40, 0x5B-0x60 and 0x7B-0x7E).
const NATIONAL_POSITIONS: [usize; 13] = [
    0x03, 0x04, 0x20, 0x3b, 0x3c, 0x3d, 0x3e, 0x3f, 0x40, 0x5b, 0x5c, 0x5d, 0x5e,
];

const PORTUGUESE_SPANISH: [char; 13] = [
    'ç', '$', '¡', 'á', 'é', 'í', 'ó', 'ú', '¿', 'ü', 'ñ', 'è', 'à',
];

/// The character table in effect for one elementary stream, rebuilt whenever the page header
/// designates a different charset code.
pub struct Charset {
    code: u8,
    table: [char; 96],
}
impl Charset {
    /// Creates a table with the default Latin G0 set in effect (charset code zero).
    pub fn new() -> Charset {
        Charset {
            code: 0,
            table: G0_LATIN,
        }
    }

    /// The charset designation code currently in effect.
    pub fn code(&self) -> u8 {
        self.code
    }

    /// Switches to the given charset designation code, rebuilding the table if the code differs
    /// from the one already in effect.
    ///
    /// Returns `true` if the table was rebuilt.
    pub fn set_code(&mut self, code: u8) -> bool {
        if code == self.code {
            return false;
        }
        self.code = code;
        self.table = G0_LATIN;
        if code == CHARSET_PORTUGUESE_SPANISH {
            for (i, &position) in NATIONAL_POSITIONS.iter().enumerate() {
                self.table[position] = PORTUGUESE_SPANISH[i];
            }
        }
        true
    }

    /// Maps the teletext code point `0x20..=0x7F` to a character through the table currently in
    /// effect.  Code points outside that range produce a space.
    pub fn decode(&self, code_point: u8) -> char {
        match code_point.checked_sub(0x20) {
            Some(index) if usize::from(index) < self.table.len() => {
                self.table[usize::from(index)]
            }
            _ => ' ',
        }
    }
}
impl Default for Charset {
    fn default() -> Charset {
        Charset::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn latin_default() {
        let charset = Charset::new();
        assert_eq!('A', charset.decode(0x41));
        assert_eq!('£', charset.decode(0x23));
        assert_eq!('¼', charset.decode(0x7b));
        assert_eq!('■', charset.decode(0x7f));
    }

    #[test]
    fn portuguese_spanish_overlay() {
        let mut charset = Charset::new();
        assert!(charset.set_code(CHARSET_PORTUGUESE_SPANISH));
        assert_eq!('ü', charset.decode(0x7b));
        assert_eq!('ç', charset.decode(0x23));
        assert_eq!('¿', charset.decode(0x60));
        // positions outside the national sub-set are untouched
        assert_eq!('A', charset.decode(0x41));
    }

    #[test]
    fn unknown_code_keeps_latin() {
        let mut charset = Charset::new();
        assert!(charset.set_code(2));
        assert_eq!('¼', charset.decode(0x7b));
        assert_eq!('£', charset.decode(0x23));
    }

    #[test]
    fn switching_back_restores_latin() {
        let mut charset = Charset::new();
        charset.set_code(CHARSET_PORTUGUESE_SPANISH);
        charset.set_code(0);
        assert_eq!('¼', charset.decode(0x7b));
    }

    #[test]
    fn same_code_is_a_no_op() {
        let mut charset = Charset::new();
        assert!(!charset.set_code(0));
        charset.set_code(CHARSET_PORTUGUESE_SPANISH);
        assert!(!charset.set_code(CHARSET_PORTUGUESE_SPANISH));
    }

    #[test]
    fn out_of_range_is_space() {
        let charset = Charset::new();
        assert_eq!(' ', charset.decode(0x1f));
        assert_eq!(' ', charset.decode(0x80));
    }
}
