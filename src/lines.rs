//! Line-mode hashing: collapse each unique line to a single scalar so
//! large line-structured inputs can be diffed over short token strings
//! and rehydrated afterward.
//!
//! Tokens are handed out sequentially from `U+0001` upward, skipping
//! the surrogate gap, which leaves room for well over a million
//! distinct lines. Should a text somehow exhaust that, the remainder is
//! folded into one final token rather than truncated.

use std::collections::HashMap;

use crate::diff::Diff;

/// Distinct line tokens available: every scalar except NUL and the
/// surrogate range.
const TOKEN_SPACE: usize = 0x110000 - 0x800 - 1;

pub(crate) struct Tokenized<'a> {
    pub(crate) old: Vec<char>,
    pub(crate) new: Vec<char>,
    pub(crate) lines: Vec<&'a [char]>,
}

/// Hash both texts against one shared line table.
pub(crate) fn to_tokens<'a>(old: &'a [char], new: &'a [char]) -> Tokenized<'a> {
    let mut lines = Vec::new();
    let mut table = HashMap::new();

    let old = tokenize(old, &mut lines, &mut table);
    let new = tokenize(new, &mut lines, &mut table);

    Tokenized { old, new, lines }
}

/// Replace every token in `diffs` with the line it stands for.
pub(crate) fn from_tokens(diffs: &[Diff], lines: &[&[char]]) -> Vec<Diff> {
    diffs
        .iter()
        .map(|diff| {
            let text = diff
                .chars()
                .iter()
                .flat_map(|&token| lines[token_index(token)].iter().copied())
                .collect::<Vec<_>>();

            Diff::from_chars(diff.op(), &text)
        })
        .collect()
}

fn tokenize<'a>(
    text: &'a [char],
    lines: &mut Vec<&'a [char]>,
    table: &mut HashMap<&'a [char], char>,
) -> Vec<char> {
    let mut tokens = Vec::new();
    let mut cursor = 0;

    for line in text.split_inclusive(|&c| c == '\n') {
        // One slot is held back so an over-full text can still fold its
        // tail into a single line below.
        if !table.contains_key(line) && lines.len() + 1 == TOKEN_SPACE {
            let rest = &text[cursor..];
            tokens.push(intern(rest, lines, table));
            return tokens;
        }

        tokens.push(intern(line, lines, table));
        cursor += line.len();
    }

    tokens
}

fn intern<'a>(
    line: &'a [char],
    lines: &mut Vec<&'a [char]>,
    table: &mut HashMap<&'a [char], char>,
) -> char {
    *table.entry(line).or_insert_with(|| {
        lines.push(line);
        token_for(lines.len() - 1)
    })
}

fn token_for(index: usize) -> char {
    let mut n = index as u32 + 1;
    if n >= 0xD800 {
        n += 0x800;
    }
    // In range by construction: `tokenize` never hands out more than
    // TOKEN_SPACE tokens.
    char::from_u32(n).unwrap_or(char::REPLACEMENT_CHARACTER)
}

fn token_index(token: char) -> usize {
    let n = token as u32;
    let n = if n >= 0xE000 { n - 0x800 } else { n };
    n as usize - 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::Diff;

    fn c(text: &str) -> Vec<char> {
        text.chars().collect()
    }

    #[test]
    fn test_token_mapping_is_invertible() {
        for index in [0, 1, 0xD7FE, 0xD7FF, 0xD800, 100_000, TOKEN_SPACE - 1] {
            let token = token_for(index);
            assert_ne!('\u{FFFD}', token, "index {index} left the scalar range");
            assert_eq!(index, token_index(token));
        }
    }

    #[test]
    fn test_to_tokens() {
        let old = c("alpha\nbeta\nalpha\n");
        let new = c("beta\nalpha\nbeta\n");
        let t = to_tokens(&old, &new);

        assert_eq!(vec![token_for(0), token_for(1), token_for(0)], t.old);
        assert_eq!(vec![token_for(1), token_for(0), token_for(1)], t.new);
        assert_eq!(vec![&c("alpha\n")[..], &c("beta\n")[..]], t.lines);

        // A trailing line without a newline is its own entry.
        let old = c("");
        let new = c("alpha\r\nbeta\r\n\r\n\r\n");
        let t = to_tokens(&old, &new);
        assert!(t.old.is_empty());
        assert_eq!(
            vec![token_for(0), token_for(1), token_for(2), token_for(2)],
            t.new
        );
        assert_eq!(
            vec![&c("alpha\r\n")[..], &c("beta\r\n")[..], &c("\r\n")[..]],
            t.lines
        );

        let old2 = c("a");
        let new2 = c("b");
        let t = to_tokens(&old2, &new2);
        assert_eq!(vec![token_for(0)], t.old);
        assert_eq!(vec![token_for(1)], t.new);
    }

    #[test]
    fn test_roundtrip_over_256_lines() {
        // More than 256 unique lines to reveal any 8-bit limitation.
        const COUNT: usize = 300;
        let text: String = (0..COUNT).map(|i| format!("{i}\n")).collect();
        let old = c(&text);

        let t = to_tokens(&old, &[]);
        assert_eq!(COUNT, t.lines.len());
        assert_eq!(COUNT, t.old.len());
        assert!(t.new.is_empty());

        let diffs = [Diff::from_chars(crate::Op::Delete, &t.old)];
        let rehydrated = from_tokens(&diffs, &t.lines);
        assert_eq!(text, rehydrated[0].text());
    }

    #[test]
    fn test_from_tokens() {
        let lines = [&c("alpha\n")[..], &c("beta\n")[..]];
        let diffs = [
            Diff::from_chars(crate::Op::Equal, &[token_for(0), token_for(1), token_for(0)]),
            Diff::from_chars(crate::Op::Insert, &[token_for(1), token_for(0), token_for(1)]),
        ];

        let rehydrated = from_tokens(&diffs, &lines);
        assert_eq!(
            vec![
                Diff::equal("alpha\nbeta\nalpha\n"),
                Diff::insert("beta\nalpha\nbeta\n"),
            ],
            rehydrated
        );
    }
}
