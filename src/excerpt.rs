//! Clipping of captured process output for display.
use std::borrow::Cow;

/// Upper bounds on how much captured output is echoed back to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputLimit {
    pub lines: usize,
    pub bytes: usize,
}

impl OutputLimit {
    /// Keep whichever is shorter: the first `lines` lines or the first
    /// `bytes` bytes (rounded down to a char boundary). Clipped output gets a
    /// trailing note with the number of dropped bytes.
    pub fn clip<'a>(&self, text: &'a str) -> Cow<'a, str> {
        let line_end = match self.lines {
            0 => 0,
            n => text
                .match_indices('\n')
                .nth(n - 1)
                .map_or(text.len(), |(idx, _)| idx + 1),
        };
        let mut cut = line_end.min(self.bytes);
        while !text.is_char_boundary(cut) {
            cut -= 1;
        }
        if cut == text.len() {
            return Cow::Borrowed(text);
        }

        let kept = &text[..cut];
        let separator = if kept.is_empty() || kept.ends_with('\n') {
            ""
        } else {
            "\n"
        };
        Cow::Owned(format!(
            "{kept}{separator}[... {} more bytes ...]\n",
            text.len() - cut
        ))
    }
}
