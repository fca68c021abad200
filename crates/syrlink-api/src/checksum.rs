// Request checksum for the SYR Connect command protocol.
//
// Authenticated commands carry a trailing `<cs v="HEX"/>` element whose
// value is computed over the payload before the element is inserted.
// The scheme walks every XML attribute value (attributes named `n` are
// excluded), slices each value's UTF-8 bytes into 5-bit chunks, maps
// the chunks through a fixed 32-character alphabet offset by a keyword
// character, and sums the mapped code points across the document.

use quick_xml::Reader;
use quick_xml::events::Event;

/// Alphabet the 5-bit chunks index into.
const CHECKSUM_ALPHABET: &str = "L8KZG4F5DSM6ANBV3CXY7W2ER1T9H0UP";

/// Keyword whose characters select the per-chunk alphabet offset.
const CHECKSUM_KEYWORD: &str = "KHGK5X29LVNZU56T";

/// Checksum generator for outbound payloads.
#[derive(Debug, Clone)]
pub struct PayloadChecksum {
    alphabet: &'static [u8],
    keyword: &'static [u8],
}

impl Default for PayloadChecksum {
    fn default() -> Self {
        Self {
            alphabet: CHECKSUM_ALPHABET.as_bytes(),
            keyword: CHECKSUM_KEYWORD.as_bytes(),
        }
    }
}

impl PayloadChecksum {
    /// Compute the checksum over an XML document and return it as
    /// uppercase hex (no leading zeros, matching the vendor app).
    ///
    /// A document that fails to parse contributes nothing, so the
    /// result is `"0"`.
    pub fn document_checksum(&self, xml: &str) -> String {
        let mut total: u64 = 0;
        let mut reader = Reader::from_str(xml);

        loop {
            match reader.read_event() {
                Ok(Event::Start(e) | Event::Empty(e)) => {
                    for attr in e.attributes().flatten() {
                        if attr.key.as_ref() == b"n" {
                            continue;
                        }
                        if let Ok(value) = attr.unescape_value() {
                            total += self.value_contribution(&value);
                        }
                    }
                }
                Ok(Event::Eof) => break,
                Err(_) => {
                    total = 0;
                    break;
                }
                _ => {}
            }
        }

        format!("{total:X}")
    }

    /// Insert the checksum element before the closing `</sc>` tag.
    pub fn append(&self, payload: &str) -> String {
        let checksum = self.document_checksum(payload);
        payload.replacen("</sc>", &format!("<cs v=\"{checksum}\"/></sc>"), 1)
    }

    /// One attribute value's contribution to the checksum total.
    ///
    /// The 5-bit walk mirrors the vendor app exactly: the bit offset
    /// advances 5 per chunk, the byte index advances only when the
    /// offset wraps past 8, and offsets above 3 borrow high bits from
    /// the following byte. Out-of-range bytes read as zero.
    fn value_contribution(&self, value: &str) -> u64 {
        let normalized = value.trim();
        if normalized.is_empty() {
            return 0;
        }

        let bytes = normalized.as_bytes();
        let chunk_count = (bytes.len() * 8).div_ceil(5);

        let mut contribution: u64 = 0;
        let mut bit_offset: usize = 0;
        let mut byte_index: usize = 0;

        for chunk_index in 0..chunk_count {
            if bit_offset >= 8 {
                byte_index += 1;
                bit_offset %= 8;
            }

            let current = bytes.get(byte_index).copied().unwrap_or(0);
            let mut shifted = (u32::from(current) << bit_offset) & 0xff;

            if bit_offset > 3 {
                let next = bytes.get(byte_index + 1).copied().unwrap_or(0);
                let shift_amt = 8 - (bit_offset - 3);
                shifted |= ((u32::from(next) >> shift_amt) << 3) & 0xff;
            }

            let five_bit_value = (shifted >> 3) as usize;

            let key_char = self.keyword[chunk_index % self.keyword.len()];
            let offset = self
                .alphabet
                .iter()
                .position(|&c| c == key_char)
                .unwrap_or(0);

            let mut index = five_bit_value + offset;
            if index >= self.alphabet.len() {
                index = index - self.alphabet.len() + 1;
            }

            contribution += u64::from(self.alphabet[index]);
            bit_offset += 5;
        }

        contribution
    }
}
