// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! The default "is this error recoverable" predicate for the [`crate::EvalScheduler`].
//!
//! An evaluation error is recoverable when the input simply stopped too early, so that
//! the user can fix it by typing more lines. This is decided with a small lexer over
//! C like syntax (brackets, quotes, template literals, comments), not by parsing:
//!
//! | Input ends ...                                   | Result           |
//! |--------------------------------------------------|------------------|
//! | with `(`, `[`, `{` or `${` still open            | incomplete       |
//! | inside a `` ` `` template literal                | incomplete       |
//! | inside a `/* */` comment                         | incomplete       |
//! | inside a quoted string, right after `\` newline  | incomplete       |
//! | right after a binary operator, eg: `1 +`         | incomplete       |
//! | with a plain newline inside a quoted string      | invalid          |
//! | with a closer that does not match its opener     | invalid          |
//!
//! Regular expression literals are not recognized, a bracket inside one is counted.

/// What the lexer concluded about the whole input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputCompleteness {
    Complete,
    /// More input could make this valid.
    Incomplete,
    /// No amount of extra input will fix this.
    Invalid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Nesting {
    Bracket { closer: char },
    Template,
    TemplateExpression,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StringEnd {
    /// Index just past the closing quote.
    Closed(usize),
    /// The input ends with a line continuation inside the string.
    Continued,
    Unterminated,
}

/// Characters that can't end a complete expression.
const TRAILING_OPERATORS: &[char] = &[
    '+', '-', '*', '/', '%', '=', '&', '|', '^', '<', '>', '!', '~', '?', ':', ',', '.',
];

/// Returns `true` if the evaluation of `input` failed only because the input is
/// incomplete. See [`scan_completeness()`].
#[must_use]
pub fn is_incomplete_input(input: &str) -> bool {
    scan_completeness(input) == InputCompleteness::Incomplete
}

#[must_use]
pub fn scan_completeness(input: &str) -> InputCompleteness {
    let chars: Vec<char> = input.chars().collect();
    let mut stack: Vec<Nesting> = vec![];
    let mut last_two_significant: (Option<char>, Option<char>) = (None, None);
    let mut index = 0;

    while index < chars.len() {
        let ch = chars[index];
        let maybe_next = chars.get(index + 1).copied();

        // Inside the text part of a template literal only `\`, `` ` `` and `${` matter.
        if stack.last() == Some(&Nesting::Template) {
            match ch {
                '\\' => index += 2,
                '`' => {
                    stack.pop();
                    last_two_significant = (last_two_significant.1, Some(ch));
                    index += 1;
                }
                '$' if maybe_next == Some('{') => {
                    stack.push(Nesting::TemplateExpression);
                    index += 2;
                }
                _ => index += 1,
            }
            continue;
        }

        match ch {
            '/' if maybe_next == Some('/') => {
                index = find_from(&chars, index + 2, &['\n']).unwrap_or(chars.len());
                continue;
            }
            '/' if maybe_next == Some('*') => match find_block_comment_end(&chars, index + 2) {
                Some(after_comment) => {
                    index = after_comment;
                    continue;
                }
                None => return InputCompleteness::Incomplete,
            },
            '\'' | '"' => match scan_string(&chars, index + 1, ch) {
                StringEnd::Closed(after_string) => {
                    last_two_significant = (last_two_significant.1, Some(ch));
                    index = after_string;
                    continue;
                }
                StringEnd::Continued => return InputCompleteness::Incomplete,
                StringEnd::Unterminated => return InputCompleteness::Invalid,
            },
            '`' => stack.push(Nesting::Template),
            '(' => stack.push(Nesting::Bracket { closer: ')' }),
            '[' => stack.push(Nesting::Bracket { closer: ']' }),
            '{' => stack.push(Nesting::Bracket { closer: '}' }),
            ')' | ']' | '}' => match stack.pop() {
                Some(Nesting::Bracket { closer }) if closer == ch => {}
                Some(Nesting::TemplateExpression) if ch == '}' => {}
                _ => return InputCompleteness::Invalid,
            },
            _ if ch.is_whitespace() => {
                index += 1;
                continue;
            }
            _ => {}
        }

        last_two_significant = (last_two_significant.1, Some(ch));
        index += 1;
    }

    if !stack.is_empty() || ends_with_operator(last_two_significant) {
        InputCompleteness::Incomplete
    } else {
        InputCompleteness::Complete
    }
}

fn ends_with_operator(last_two_significant: (Option<char>, Option<char>)) -> bool {
    match last_two_significant {
        // Postfix increment and decrement complete an expression.
        (Some('+'), Some('+')) | (Some('-'), Some('-')) => false,
        (_, Some(last)) => TRAILING_OPERATORS.contains(&last),
        (_, None) => false,
    }
}

fn find_from(chars: &[char], start: usize, targets: &[char]) -> Option<usize> {
    chars
        .iter()
        .skip(start)
        .position(|it| targets.contains(it))
        .map(|offset| start + offset)
}

/// Returns the index just past the closing `*/`.
fn find_block_comment_end(chars: &[char], start: usize) -> Option<usize> {
    let mut index = start;
    while index + 1 < chars.len() {
        if chars[index] == '*' && chars[index + 1] == '/' {
            return Some(index + 2);
        }
        index += 1;
    }
    None
}

fn is_line_terminator(ch: char) -> bool {
    matches!(ch, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

fn scan_string(chars: &[char], start: usize, quote: char) -> StringEnd {
    let mut index = start;
    while index < chars.len() {
        let ch = chars[index];
        if ch == quote {
            return StringEnd::Closed(index + 1);
        }
        match ch {
            '\\' => {
                let escaped_len = match (chars.get(index + 1), chars.get(index + 2)) {
                    (Some('\r'), Some('\n')) => 2,
                    (Some(&next), _) if is_line_terminator(next) => 1,
                    (Some(_), _) => {
                        index += 2;
                        continue;
                    }
                    (None, _) => return StringEnd::Unterminated,
                };
                let after_continuation = index + 1 + escaped_len;
                if after_continuation >= chars.len() {
                    return StringEnd::Continued;
                }
                index = after_continuation;
            }
            _ if is_line_terminator(ch) => return StringEnd::Unterminated,
            _ => index += 1,
        }
    }
    StringEnd::Unterminated
}
