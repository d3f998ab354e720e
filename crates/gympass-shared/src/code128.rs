//! Code128 symbology (ISO/IEC 15417), code sets B and C.
//!
//! Text is turned into a sequence of symbol values: a start code, the data
//! values, a modulo-103 check value and the stop code. Printable ASCII goes
//! through code set B; runs of four or more digits are packed two per symbol
//! with code set C, which roughly halves the width of a token's numeric body.
//! Code set A (control characters) is not supported.

use crate::constants::QUIET_ZONE_MODULES;
use crate::error::SymbolError;

/// Bar/space widths for symbol values 0..=105. Each pattern starts with a
/// bar and spans 11 modules.
const PATTERNS: [&str; 106] = [
    "212222", "222122", "222221", "121223", "121322", "131222", "122213", "122312", "132212",
    "221213", "221312", "231212", "112232", "122132", "122231", "113222", "123122", "123221",
    "223211", "221132", "221231", "213212", "223112", "312131", "311222", "321122", "321221",
    "312212", "322112", "322211", "212123", "212321", "232121", "111323", "131123", "131321",
    "112313", "132113", "132311", "211313", "231113", "231311", "112133", "112331", "132131",
    "113123", "113321", "133121", "313121", "211331", "231131", "213113", "213311", "213131",
    "311123", "311321", "331121", "312113", "312311", "332111", "314111", "221411", "431111",
    "111224", "111422", "121124", "121421", "141122", "141221", "112214", "112412", "122114",
    "122411", "142112", "142211", "241211", "221114", "413111", "241112", "134111", "111242",
    "121142", "121241", "114212", "124112", "124211", "411212", "421112", "421211", "212141",
    "214121", "412121", "111143", "111341", "131141", "114113", "114311", "411113", "411311",
    "113141", "114131", "311141", "411131", "211412", "211214", "211232",
];

/// Stop pattern: 7 elements, 13 modules including the termination bar.
const STOP_PATTERN: &str = "2331112";

const SWITCH_TO_C: u8 = 99;
const SWITCH_TO_B: u8 = 100;
const START_B: u8 = 104;
const START_C: u8 = 105;
const STOP: u8 = 106;

/// Shortest digit run worth switching to code set C for.
const MIN_DIGIT_RUN: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CodeSet {
    B,
    C,
}

/// Encode `text` into Code128 symbol values, start and stop codes included.
pub fn encode(text: &str) -> Result<Vec<u8>, SymbolError> {
    if text.is_empty() {
        return Err(SymbolError::Empty);
    }

    let bytes = text.as_bytes();
    if let Some((position, ch)) = text
        .chars()
        .enumerate()
        .find(|(_, c)| !(' '..='\u{7f}').contains(c))
    {
        return Err(SymbolError::UnsupportedCharacter { ch, position });
    }

    let mut values = Vec::with_capacity(bytes.len() + 4);
    let mut set = if digit_run(bytes, 0) >= MIN_DIGIT_RUN {
        values.push(START_C);
        CodeSet::C
    } else {
        values.push(START_B);
        CodeSet::B
    };

    let mut i = 0;
    while i < bytes.len() {
        match set {
            CodeSet::C => {
                if digit_run(bytes, i) >= 2 {
                    values.push((bytes[i] - b'0') * 10 + (bytes[i + 1] - b'0'));
                    i += 2;
                } else {
                    values.push(SWITCH_TO_B);
                    set = CodeSet::B;
                }
            }
            CodeSet::B => {
                let run = digit_run(bytes, i);
                if run >= MIN_DIGIT_RUN {
                    // An odd run keeps its first digit in B so C gets pairs.
                    if run % 2 == 1 {
                        values.push(bytes[i] - b' ');
                        i += 1;
                    }
                    values.push(SWITCH_TO_C);
                    set = CodeSet::C;
                } else {
                    values.push(bytes[i] - b' ');
                    i += 1;
                }
            }
        }
    }

    values.push(checksum(&values));
    values.push(STOP);
    Ok(values)
}

/// Expand `text` into modules (`true` = bar), quiet zones included.
pub fn modules(text: &str) -> Result<Vec<bool>, SymbolError> {
    let values = encode(text)?;

    let mut out = vec![false; QUIET_ZONE_MODULES];
    for value in values {
        let pattern = if value == STOP {
            STOP_PATTERN
        } else {
            PATTERNS[value as usize]
        };
        push_pattern(&mut out, pattern);
    }
    out.extend(std::iter::repeat(false).take(QUIET_ZONE_MODULES));
    Ok(out)
}

/// Modulo-103 weighted sum over the start code and data values.
fn checksum(values: &[u8]) -> u8 {
    let sum: u32 = values
        .iter()
        .enumerate()
        .map(|(i, &v)| u32::from(v) * (i as u32).max(1))
        .sum();
    (sum % 103) as u8
}

fn digit_run(bytes: &[u8], from: usize) -> usize {
    bytes[from..].iter().take_while(|b| b.is_ascii_digit()).count()
}

fn push_pattern(out: &mut Vec<bool>, pattern: &str) {
    for (i, width) in pattern.bytes().enumerate() {
        let bar = i % 2 == 0;
        out.extend(std::iter::repeat(bar).take(usize::from(width - b'0')));
    }
}
