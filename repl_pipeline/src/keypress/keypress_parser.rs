// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Turn the decoded character stream into [`Keypress`] events.
//!
//! This is a small VT100 input parser, just enough for a line editor:
//!
//! | Input                   | `name`                      | Modifiers            |
//! |-------------------------|-----------------------------|----------------------|
//! | `\r`                    | `return`                    |                      |
//! | `\n`                    | `enter`                     |                      |
//! | `\t`                    | `tab`                       |                      |
//! | `DEL`, `\x08`           | `backspace`                 | `\x08` is `ctrl`     |
//! | `\x01`..`\x1a`          | `a`..`z`                    | `ctrl`               |
//! | `ESC <char>`            | the char's name             | `meta`               |
//! | `ESC [ A`..`D`          | `up` `down` `right` `left`  | from `;<n>` param    |
//! | `ESC [ 200 ~`           | `paste-start`               |                      |
//! | `ESC [ 201 ~`           | `paste-end`                 |                      |
//! | `a`..`z`, `0`..`9`      | itself                      |                      |
//! | `A`..`Z`                | lower case                  | `shift`              |
//! | anything else           | [None]                      |                      |
//!
//! A CSI sequence that is cut off at the end of a chunk is held until the next chunk.
//! A lone `ESC` at the end of a chunk is reported as the `escape` key.

use super::{ANSI_ESC, ASCII_DEL, KeyName, Keypress};

#[derive(Debug, Default)]
pub struct KeypressParser {
    /// Start of an incomplete CSI / SS3 sequence from the previous chunk.
    pending: String,
}

impl KeypressParser {
    #[must_use]
    pub fn new() -> Self { Self::default() }

    pub fn parse(&mut self, text: &str) -> Vec<Keypress> {
        self.pending.push_str(text);
        let chars: Vec<char> = std::mem::take(&mut self.pending).chars().collect();

        let mut acc = Vec::with_capacity(chars.len());
        let mut index = 0;

        while index < chars.len() {
            let ch = chars[index];

            if ch != ANSI_ESC {
                acc.push(decode_char(ch));
                index += 1;
                continue;
            }

            match chars.get(index + 1) {
                None => {
                    acc.push(named(ANSI_ESC.to_string(), KeyName::Escape));
                    index += 1;
                }
                Some(&prefix) if prefix == '[' || prefix == 'O' => {
                    let params_start = index + 2;
                    let mut final_index = params_start;
                    while final_index < chars.len() && is_csi_param(chars[final_index]) {
                        final_index += 1;
                    }
                    if final_index >= chars.len() {
                        self.pending = chars[index..].iter().collect();
                        break;
                    }
                    let params: String = chars[params_start..final_index].iter().collect();
                    let sequence: String = chars[index..=final_index].iter().collect();
                    acc.push(decode_csi(prefix, &params, chars[final_index], sequence));
                    index = final_index + 1;
                }
                Some(&ANSI_ESC) => {
                    acc.push(named(ANSI_ESC.to_string(), KeyName::Escape));
                    index += 1;
                }
                Some(&next) => {
                    let mut key = decode_char(next);
                    key.meta = true;
                    key.sequence = Some(format!("{ANSI_ESC}{next}"));
                    acc.push(key);
                    index += 2;
                }
            }
        }

        acc
    }
}

fn is_csi_param(ch: char) -> bool { ch.is_ascii_digit() || ch == ';' }

fn named(sequence: String, key_name: KeyName) -> Keypress {
    Keypress {
        sequence: Some(sequence),
        name: Some(key_name.to_string()),
        ..Default::default()
    }
}

fn decode_char(ch: char) -> Keypress {
    let sequence = ch.to_string();
    match ch {
        '\r' => named(sequence, KeyName::Return),
        '\n' => named(sequence, KeyName::Enter),
        '\t' => named(sequence, KeyName::Tab),
        ' ' => named(sequence, KeyName::Space),
        ASCII_DEL => named(sequence, KeyName::Backspace),
        '\x08' => Keypress {
            ctrl: true,
            ..named(sequence, KeyName::Backspace)
        },
        '\x01'..='\x1a' => {
            let letter = char::from_u32(u32::from(ch) - 1 + u32::from('a')).unwrap_or(ch);
            Keypress {
                sequence: Some(sequence),
                name: Some(letter.to_string()),
                ctrl: true,
                ..Default::default()
            }
        }
        'a'..='z' | '0'..='9' => Keypress {
            name: Some(sequence.clone()),
            sequence: Some(sequence),
            ..Default::default()
        },
        'A'..='Z' => Keypress {
            name: Some(ch.to_ascii_lowercase().to_string()),
            sequence: Some(sequence),
            shift: true,
            ..Default::default()
        },
        _ => Keypress {
            sequence: Some(sequence),
            ..Default::default()
        },
    }
}

/// `params` is everything between the prefix and the final character, eg: `1;5` in
/// `ESC [ 1 ; 5 C` (ctrl+right).
fn decode_csi(prefix: char, params: &str, final_char: char, sequence: String) -> Keypress {
    let mut parts = params.split(';');
    let first = parts.next().unwrap_or_default();
    // xterm encodes modifiers as 1 + (shift | alt << 1 | ctrl << 2).
    let modifier_bits = parts
        .next()
        .and_then(|it| it.parse::<u8>().ok())
        .map_or(0, |it| it.saturating_sub(1));

    let (key_name, code) = if final_char == '~' {
        let key_name = match first {
            "1" | "7" => Some(KeyName::Home),
            "2" => Some(KeyName::Insert),
            "3" => Some(KeyName::Delete),
            "4" | "8" => Some(KeyName::End),
            "5" => Some(KeyName::PageUp),
            "6" => Some(KeyName::PageDown),
            "200" => Some(KeyName::PasteStart),
            "201" => Some(KeyName::PasteEnd),
            _ => None,
        };
        (key_name, format!("{prefix}{first}~"))
    } else {
        let key_name = match final_char {
            'A' => Some(KeyName::Up),
            'B' => Some(KeyName::Down),
            'C' => Some(KeyName::Right),
            'D' => Some(KeyName::Left),
            'H' => Some(KeyName::Home),
            'F' => Some(KeyName::End),
            'P' => Some(KeyName::F1),
            'Q' => Some(KeyName::F2),
            'R' => Some(KeyName::F3),
            'S' => Some(KeyName::F4),
            'Z' => Some(KeyName::Tab),
            _ => None,
        };
        (key_name, format!("{prefix}{final_char}"))
    };

    Keypress {
        sequence: Some(sequence),
        name: key_name.map(|it| it.to_string()),
        ctrl: modifier_bits & 0b100 != 0,
        meta: modifier_bits & 0b010 != 0,
        shift: modifier_bits & 0b001 != 0 || final_char == 'Z',
        code: Some(code),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    fn names(keys: &[Keypress]) -> Vec<Option<&str>> {
        keys.iter().map(|it| it.name.as_deref()).collect()
    }

    #[test]
    fn test_plain_text() {
        let mut parser = KeypressParser::new();
        let keys = parser.parse("aB1+");
        assert_eq!(names(&keys), vec![Some("a"), Some("b"), Some("1"), None]);
        assert!(keys[1].shift);
        assert_eq!(keys[3].sequence.as_deref(), Some("+"));
    }

    #[test_case("\r", "return" ; "carriage return")]
    #[test_case("\n", "enter" ; "line feed")]
    #[test_case("\t", "tab" ; "tab")]
    #[test_case(" ", "space" ; "space")]
    #[test_case("\x7f", "backspace" ; "delete char")]
    #[test_case("\x1b[A", "up" ; "up arrow")]
    #[test_case("\x1bOB", "down" ; "ss3 down arrow")]
    #[test_case("\x1b[3~", "delete" ; "delete key")]
    #[test_case("\x1b[200~", "paste-start" ; "paste start")]
    #[test_case("\x1b[201~", "paste-end" ; "paste end")]
    fn test_named_keys(input: &str, expected_name: &str) {
        let keys = KeypressParser::new().parse(input);
        assert_eq!(keys.len(), 1);
        assert_eq!(keys[0].name.as_deref(), Some(expected_name));
        assert_eq!(keys[0].sequence.as_deref(), Some(input));
    }

    #[test]
    fn test_ctrl_keys() {
        let keys = KeypressParser::new().parse("\x03\x04\x01");
        assert_eq!(names(&keys), vec![Some("c"), Some("d"), Some("a")]);
        assert!(keys.iter().all(|it| it.ctrl));
    }

    #[test]
    fn test_meta_key() {
        let keys = KeypressParser::new().parse("\x1bb");
        assert_eq!(keys.len(), 1);
        assert!(keys[0].meta);
        assert_eq!(keys[0].name.as_deref(), Some("b"));
        assert_eq!(keys[0].sequence.as_deref(), Some("\x1bb"));
    }

    #[test]
    fn test_csi_code_and_modifiers() {
        let keys = KeypressParser::new().parse("\x1b[D\x1b[1;5C");
        assert_eq!(keys[0].code.as_deref(), Some("[D"));
        assert!(!keys[0].ctrl);
        assert_eq!(keys[1].name.as_deref(), Some("right"));
        assert_eq!(keys[1].code.as_deref(), Some("[C"));
        assert!(keys[1].ctrl);
    }

    #[test]
    fn test_lone_escape_at_end_of_chunk() {
        let keys = KeypressParser::new().parse("a\x1b");
        assert_eq!(names(&keys), vec![Some("a"), Some("escape")]);
    }

    #[test]
    fn test_csi_split_across_chunks() {
        let mut parser = KeypressParser::new();
        let first = parser.parse("x\x1b[20");
        assert_eq!(names(&first), vec![Some("x")]);
        let second = parser.parse("0~y");
        assert_eq!(names(&second), vec![Some("paste-start"), Some("y")]);
    }

    #[test]
    fn test_paste_region_with_cursor_left_inside() {
        let keys = KeypressParser::new().parse("\x1b[200~foo\x1b[Dbar\x1b[201~");
        assert_eq!(
            names(&keys),
            vec![
                Some("paste-start"),
                Some("f"),
                Some("o"),
                Some("o"),
                Some("left"),
                Some("b"),
                Some("a"),
                Some("r"),
                Some("paste-end"),
            ]
        );
    }
}
