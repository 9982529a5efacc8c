//! The patch model: a hunk of edits with location metadata and
//! equality context, and its textual wire form.

use std::fmt::Display;

use crate::{errors::Error, uri, Diff, Mend, Op};

/// One hunk: a normalized edit script whose equalities provide context,
/// plus where it applies in the pre- and post-texts and how much of
/// each it covers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Patch {
    pub(crate) diffs: Vec<Diff>,
    pub(crate) start1: usize,
    pub(crate) start2: usize,
    pub(crate) length1: usize,
    pub(crate) length2: usize,
}

impl Patch {
    /// The hunk's edit script, context equalities included.
    pub fn diffs(&self) -> &[Diff] {
        &self.diffs
    }

    /// Start offset in the pre-text, 0-based.
    pub fn start1(&self) -> usize {
        self.start1
    }

    /// Start offset in the post-text, 0-based.
    pub fn start2(&self) -> usize {
        self.start2
    }

    /// Characters of pre-text covered.
    pub fn length1(&self) -> usize {
        self.length1
    }

    /// Characters of post-text covered.
    pub fn length2(&self) -> usize {
        self.length2
    }

    // Header coordinates are 1-based with the comma omitted for
    // single-character spans, like GNU diff; an empty span keeps its
    // 0-based offset.
    fn coords(start: usize, length: usize) -> String {
        match length {
            0 => format!("{start},0"),
            1 => format!("{}", start + 1),
            _ => format!("{},{}", start + 1, length),
        }
    }
}

impl Display for Patch {
    /// The textual hunk form: a `@@ -s1,l1 +s2,l2 @@` header, then one
    /// percent-encoded line per edit signed with ` `, `-` or `+`.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "@@ -{} +{} @@",
            Self::coords(self.start1, self.length1),
            Self::coords(self.start2, self.length2),
        )?;

        for diff in &self.diffs {
            let sign = match diff.op {
                Op::Insert => '+',
                Op::Delete => '-',
                Op::Equal => ' ',
            };
            writeln!(f, "{sign}{}", uri::encode(diff.chars()))?;
        }

        Ok(())
    }
}

/// What to build patches from: two texts, a precomputed script, or the
/// source text plus its script (the cheapest when both are at hand).
pub enum PatchSource<'a> {
    Texts(&'a str, &'a str),
    Diffs(&'a [Diff]),
    TextDiffs(&'a str, &'a [Diff]),
}

impl Mend {
    /// Serialize patches into a block of text resembling the GNU
    /// diff/patch format, fit for storage or transmission.
    pub fn patch_to_text(patches: &[Patch]) -> String {
        patches.iter().map(Patch::to_string).collect()
    }

    /// Parse a block of hunks produced by [`Mend::patch_to_text`].
    ///
    /// # Example
    /// ```
    /// use mend::Mend;
    ///
    /// let text = "@@ -21,18 +22,17 @@\n jump\n-s\n+ed\n  over \n-the\n+a\n %0Alaz\n";
    /// let patches = Mend::patch_from_text(text).unwrap();
    /// assert_eq!(text, Mend::patch_to_text(&patches));
    /// ```
    pub fn patch_from_text(text: &str) -> Result<Vec<Patch>, Error> {
        let mut patches = Vec::new();

        let mut lines = text.split('\n').filter(|line| !line.is_empty()).peekable();

        while let Some(header) = lines.next() {
            let (start1, length1, start2, length2) =
                parse_header(header).ok_or_else(|| Error::MalformedPatch(header.to_string()))?;

            let mut patch = Patch {
                start1,
                start2,
                length1,
                length2,
                ..Default::default()
            };

            while let Some(&line) = lines.peek() {
                // Lines are non-empty by the filter above.
                let sign = line.chars().next().unwrap_or_default();
                let body = &line[sign.len_utf8()..];

                let op = match sign {
                    '+' => Op::Insert,
                    '-' => Op::Delete,
                    ' ' => Op::Equal,
                    // Next hunk.
                    '@' => break,
                    _ => return Err(Error::MalformedPatch(line.to_string())),
                };

                patch.diffs.push(Diff {
                    op,
                    text: uri::decode(body)?,
                });
                lines.next();
            }

            patches.push(patch);
        }

        Ok(patches)
    }
}

// Parse `@@ -s1[,l1] +s2[,l2] @@` back into 0-based offsets and
// lengths, undoing the 1-based single-span shorthand of the writer.
fn parse_header(line: &str) -> Option<(usize, usize, usize, usize)> {
    let body = line.strip_prefix("@@ -")?.strip_suffix(" @@")?;
    let (old, new) = body.split_once(" +")?;

    let (start1, length1) = parse_span(old)?;
    let (start2, length2) = parse_span(new)?;

    Some((start1, length1, start2, length2))
}

fn parse_span(span: &str) -> Option<(usize, usize)> {
    match span.split_once(',') {
        None => {
            let start: usize = span.parse().ok()?;
            Some((start.checked_sub(1)?, 1))
        }
        Some((start, "0")) => {
            let start: usize = start.parse().ok()?;
            Some((start, 0))
        }
        Some((start, length)) => {
            let start: usize = start.parse().ok()?;
            let length: usize = length.parse().ok()?;
            Some((start.checked_sub(1)?, length))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patch_display() {
        let patch = Patch {
            start1: 20,
            start2: 21,
            length1: 18,
            length2: 17,
            diffs: vec![
                Diff::equal("jump"),
                Diff::delete("s"),
                Diff::insert("ed"),
                Diff::equal(" over "),
                Diff::delete("the"),
                Diff::insert("a"),
                Diff::equal("\nlaz"),
            ],
        };
        assert_eq!(
            "@@ -21,18 +22,17 @@\n jump\n-s\n+ed\n  over \n-the\n+a\n %0Alaz\n",
            patch.to_string()
        );
    }

    #[test]
    fn test_parse_header() {
        assert_eq!(Some((20, 4, 20, 10)), parse_header("@@ -21,4 +21,10 @@"));
        assert_eq!(Some((2, 1, 2, 2)), parse_header("@@ -3 +3,2 @@"));
        assert_eq!(Some((0, 0, 0, 4)), parse_header("@@ -0,0 +1,4 @@"));

        // Bad cases.
        assert_eq!(None, parse_header("@@  +3,2 @@"));
        assert_eq!(None, parse_header("@@ 2046 +3,2 @@"));
        assert_eq!(None, parse_header("@@ -x +3,2 @@"));
        assert_eq!(None, parse_header("@@ -3 +3,2"));
    }

    #[test]
    fn test_patch_from_text() {
        assert_eq!(Ok(vec![]), Mend::patch_from_text(""));

        for text in [
            "@@ -21,18 +22,17 @@\n jump\n-s\n+ed\n  over \n-the\n+a\n %0Alaz\n",
            "@@ -1 +1 @@\n-a\n+b\n",
            "@@ -1,3 +0,0 @@\n-abc\n",
            "@@ -0,0 +1,3 @@\n+abc\n",
        ] {
            let patches = Mend::patch_from_text(text).unwrap();
            assert_eq!(text, Mend::patch_to_text(&patches), "{text:?}");
        }
    }

    #[test]
    fn test_patch_from_text_rejects_garbage() {
        assert!(matches!(
            Mend::patch_from_text("Bad\nPatch\n"),
            Err(Error::MalformedPatch(_))
        ));

        // Unknown line sign.
        assert!(Mend::patch_from_text("@@ -1 +1 @@\n*a\n").is_err());

        // Bad escape in a body line.
        assert!(Mend::patch_from_text("@@ -1 +1 @@\n-a\n+%zz\n").is_err());
    }

    #[test]
    fn test_patch_roundtrip_multiple_hunks() {
        let text = "@@ -1,8 +1,7 @@\n Th\n-at\n+e\n  qui\n@@ -21,17 +21,18 @@\n jump\n-ed\n+s\n  over \n-a\n+the\n  laz\n";
        let patches = Mend::patch_from_text(text).unwrap();
        assert_eq!(2, patches.len());
        assert_eq!(text, Mend::patch_to_text(&patches));
    }
}
