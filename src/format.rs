use std::fmt::Write as _;
use std::str::FromStr;

/// How to render a sequence of cell values for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextFormat {
    #[default]
    Ascii,
    Hexadecimal,
    Decimal,
}

impl FromStr for TextFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ascii" | "a" | "text" => Ok(TextFormat::Ascii),
            "hex" | "x" | "hexadecimal" => Ok(TextFormat::Hexadecimal),
            "dec" | "d" | "decimal" => Ok(TextFormat::Decimal),
            _ => Err(format!("unknown format '{s}', expected ascii, hex or dec")),
        }
    }
}

/// Render `cells` in the given format.
///
/// ASCII maps each value to the char with that code; values that are not
/// valid chars render as U+FFFD. Hex and decimal are space separated.
pub fn format_cells(cells: &[u32], format: TextFormat) -> String {
    match format {
        TextFormat::Ascii => cells
            .iter()
            .map(|&v| char::from_u32(v).unwrap_or(char::REPLACEMENT_CHARACTER))
            .collect(),
        TextFormat::Hexadecimal => join_with(cells, |out, v| write!(out, "{v:x}")),
        TextFormat::Decimal => join_with(cells, |out, v| write!(out, "{v}")),
    }
}

fn join_with<F>(cells: &[u32], mut render: F) -> String
where
    F: FnMut(&mut String, u32) -> std::fmt::Result,
{
    let mut out = String::with_capacity(cells.len() * 3);
    for (i, &v) in cells.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        let _ = render(&mut out, v);
    }
    out
}

/// Printable ASCII as-is, everything else as `\xHH` (or `\u{...}` above a byte).
pub fn escape_cells(cells: &[u32]) -> String {
    let mut out = String::with_capacity(cells.len());
    for &v in cells {
        match v {
            0x20..=0x7E => out.push(v as u8 as char),
            0x0A => out.push_str("\\n"),
            0x0D => out.push_str("\\r"),
            0x09 => out.push_str("\\t"),
            0..=0xFF => {
                let _ = write!(&mut out, "\\x{:02X}", v);
            }
            _ => {
                let _ = write!(&mut out, "\\u{{{:X}}}", v);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_each_format() {
        let cells = [72, 105, 10];
        assert_eq!(format_cells(&cells, TextFormat::Ascii), "Hi\n");
        assert_eq!(format_cells(&cells, TextFormat::Hexadecimal), "48 69 a");
        assert_eq!(format_cells(&cells, TextFormat::Decimal), "72 105 10");
    }

    #[test]
    fn empty_input_renders_empty() {
        assert_eq!(format_cells(&[], TextFormat::Decimal), "");
    }

    #[test]
    fn surrogate_codes_render_as_replacement() {
        assert_eq!(format_cells(&[0xD800], TextFormat::Ascii), "\u{FFFD}");
    }

    #[test]
    fn escapes_non_printables() {
        assert_eq!(escape_cells(&[65, 0, 10, 0x1F600]), "A\\x00\\n\\u{1F600}");
    }

    #[test]
    fn parses_aliases() {
        assert_eq!("HEX".parse::<TextFormat>(), Ok(TextFormat::Hexadecimal));
        assert_eq!("dec".parse::<TextFormat>(), Ok(TextFormat::Decimal));
        assert!("binary".parse::<TextFormat>().is_err());
    }
}
