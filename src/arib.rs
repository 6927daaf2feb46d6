//! ARIB STD-B24 8-unit character decoding to UTF-8.
//!
//! Kanji and kana are mapped through JIS X 0208 using the EUC-JP decoder;
//! gaiji from the additional symbol set (its own G set, or rows 90..=94 of
//! the Kanji set) are rendered as the geta mark.

use encoding_rs::EUC_JP;

const GETA: char = '〓';

/// Kanji set rows 90..=94 carry ARIB additional symbols, not JIS kanji.
const ADDITIONAL_SYMBOL_ROWS: std::ops::RangeInclusive<u8> = 0x7A..=0x7E;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Charset {
    Kanji,
    Alnum,
    Hiragana,
    Katakana,
    JisKatakana,
    Symbols,
    Mosaic,
    Drcs,
}

impl Charset {
    fn width(self) -> usize {
        match self {
            Charset::Kanji | Charset::Symbols => 2,
            _ => 1,
        }
    }

    fn from_final(f: u8, two_byte: bool) -> Charset {
        match (two_byte, f) {
            (true, 0x42) | (true, 0x39) | (true, 0x3A) => Charset::Kanji,
            (true, 0x3B) => Charset::Symbols,
            (true, _) => Charset::Drcs,
            (false, 0x4A) | (false, 0x36) => Charset::Alnum,
            (false, 0x30) | (false, 0x37) => Charset::Hiragana,
            (false, 0x31) | (false, 0x38) => Charset::Katakana,
            (false, 0x49) => Charset::JisKatakana,
            (false, 0x32..=0x35) => Charset::Mosaic,
            _ => Charset::Drcs,
        }
    }
}

/// Kana cells 0x77..=0x7E shared by the hiragana and katakana sets.
const KANA_TAIL: [char; 6] = ['ー', '。', '「', '」', '、', '・'];

struct Decoder<'a> {
    src: &'a [u8],
    pos: usize,
    g: [Charset; 4],
    gl: usize,
    gr: usize,
    out: String,
}

impl<'a> Decoder<'a> {
    fn new(src: &'a [u8]) -> Self {
        Self {
            src,
            pos: 0,
            g: [Charset::Kanji, Charset::Alnum, Charset::Hiragana, Charset::Katakana],
            gl: 0,
            gr: 2,
            out: String::with_capacity(src.len()),
        }
    }

    fn byte(&mut self) -> Option<u8> {
        let b = *self.src.get(self.pos)?;
        self.pos += 1;
        Some(b)
    }

    fn skip(&mut self, n: usize) {
        self.pos = (self.pos + n).min(self.src.len());
    }

    fn run(mut self) -> String {
        while let Some(b) = self.byte() {
            match b {
                0x0D => self.out.push('\n'),
                0x0E => self.gl = 1,
                0x0F => self.gl = 0,
                0x19 => self.single_shift(2),
                0x1D => self.single_shift(3),
                0x1B => self.escape(),
                0x16 => self.skip(1),        // PAPF
                0x1C => self.skip(2),        // APS
                0x20 | 0xA0 => self.out.push(' '),
                0x21..=0x7E => self.put(self.g[self.gl], b),
                0xA1..=0xFE => self.put(self.g[self.gr], b & 0x7F),
                0x90 | 0x92 => {             // COL / CDC, one or two parameters
                    if self.byte() == Some(0x20) {
                        self.skip(1);
                    }
                }
                0x91 | 0x93 | 0x94 | 0x97 | 0x98 => self.skip(1),
                0x95 => {                    // MACRO, terminated by 0x95 0x4F
                    while let Some(c) = self.byte() {
                        if c == 0x95 && self.byte() == Some(0x4F) {
                            break;
                        }
                    }
                }
                0x9B => {                    // CSI, ends on its final byte
                    while let Some(c) = self.byte() {
                        if (0x40..=0x6F).contains(&c) {
                            break;
                        }
                    }
                }
                0x9D => self.skip(2),        // TIME
                _ => {}                      // remaining C0 / C1 controls
            }
        }
        self.out
    }

    fn single_shift(&mut self, set: usize) {
        if let Some(b) = self.byte() {
            self.put(self.g[set], b & 0x7F);
        }
    }

    fn escape(&mut self) {
        let Some(b) = self.byte() else { return };
        match b {
            0x6E => self.gl = 2,
            0x6F => self.gl = 3,
            0x7E => self.gr = 1,
            0x7D => self.gr = 2,
            0x7C => self.gr = 3,
            0x28..=0x2B => self.designate((b - 0x28) as usize, false),
            0x24 => match self.byte() {
                Some(c @ 0x28..=0x2B) => self.designate((c - 0x28) as usize, true),
                Some(f) => self.g[0] = Charset::from_final(f, true),
                None => {}
            },
            _ => {}
        }
    }

    fn designate(&mut self, slot: usize, two_byte: bool) {
        match self.byte() {
            // DRCS: ESC I 0x20 F
            Some(0x20) => {
                self.skip(1);
                self.g[slot] = Charset::Drcs;
            }
            Some(f) => self.g[slot] = Charset::from_final(f, two_byte),
            None => {}
        }
    }

    fn put(&mut self, set: Charset, b: u8) {
        match set {
            Charset::Kanji => {
                let Some(c) = self.byte() else { return };
                if ADDITIONAL_SYMBOL_ROWS.contains(&b) {
                    self.out.push(GETA);
                } else {
                    self.push_jis(b, c & 0x7F);
                }
            }
            Charset::Symbols => {
                self.skip(Charset::Symbols.width() - 1);
                self.out.push(GETA);
            }
            Charset::Alnum => self.out.push(b as char),
            Charset::Hiragana => self.push_kana(0x24, b, 'ゝ', 'ゞ', 0x73),
            Charset::Katakana => self.push_kana(0x25, b, 'ヽ', 'ヾ', 0x76),
            Charset::JisKatakana => {
                if let Some(c) = char::from_u32(0xFF61 + (b as u32).saturating_sub(0x21)) {
                    self.out.push(c);
                }
            }
            Charset::Mosaic | Charset::Drcs => {}
        }
    }

    fn push_kana(&mut self, row: u8, b: u8, iter: char, iter_voiced: char, last: u8) {
        match b {
            0x21..=0x7E if b <= last => self.push_jis(row, b),
            0x77 => self.out.push(iter),
            0x78 => self.out.push(iter_voiced),
            0x79..=0x7E => self.out.push(KANA_TAIL[(b - 0x79) as usize]),
            _ => {}
        }
    }

    fn push_jis(&mut self, row: u8, cell: u8) {
        let euc = [row | 0x80, cell | 0x80];
        let (text, had_errors) = EUC_JP.decode_without_bom_handling(&euc);
        if had_errors {
            self.out.push(GETA);
        } else {
            self.out.push_str(&text);
        }
    }
}

/// Decodes an ARIB 8-unit string.
pub fn decode(bytes: &[u8]) -> String {
    Decoder::new(bytes).run()
}
