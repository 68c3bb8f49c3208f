//! Emphasis and strong emphasis from `*` and `_` delimiter runs.
//!
//! The scanner works on a masked copy of the source in which code spans,
//! links, raw HTML and backslash escapes have been overwritten with inert
//! characters of the same byte length, so delimiters inside them never pair
//! up with delimiters outside.

use super::scan::{is_punctuation, run_len};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum Emphasis {
    Em,
    Strong,
}

/// How a closing candidate run sits between its neighbours.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Flank {
    Left,
    Right,
    Both,
}

/// Delimiter runs of both kinds in a masked source.
pub(super) struct Closers {
    stars: Runs,
    underscores: Runs,
}

impl Closers {
    pub(super) fn new(masked: &str) -> Self {
        Self {
            stars: Runs::new(masked, '*'),
            underscores: Runs::new(masked, '_'),
        }
    }

    /// Whether an opener of `open` delimiters ending at `from` is closed by
    /// any later run.
    fn close(&self, delimiter: char, from: usize, open: usize) -> bool {
        let runs = if delimiter == '*' {
            &self.stars
        } else {
            &self.underscores
        };
        runs.close(from, open)
    }
}

/// Flanking runs of one delimiter, summarized for closer lookups.
///
/// Walking the runs after an opener, a left-flanking run adds to the open
/// depth and any other run takes from it, except for runs the rule of three
/// keeps out. The opener is closed at the first run that brings the depth to
/// zero, so it has a closer exactly when the lowest prefix sum of those depth
/// changes after it reaches minus its own length.
struct Runs {
    starts: Vec<usize>,
    /// Prefix sums of the depth changes, per opener length modulo 3.
    sums: [Vec<isize>; 3],
    /// `lows[k][j]` is the lowest of `sums[k][j + 1..]`.
    lows: [Vec<isize>; 3],
}

impl Runs {
    fn new(masked: &str, delimiter: char) -> Self {
        let mut starts = Vec::new();
        let mut runs = Vec::new();
        let mut before = None;
        let mut i = 0;
        while let Some(c) = masked[i..].chars().next() {
            if c != delimiter {
                before = Some(c);
                i += c.len_utf8();
                continue;
            }
            let run = run_len(&masked[i..], delimiter);
            let after = masked[i + run..].chars().next();
            if let Some(side) = before.and_then(|b| flank(b, after, delimiter)) {
                starts.push(i);
                runs.push((side, run));
            }
            before = Some(delimiter);
            i += run;
        }

        let sums = [0, 1, 2].map(|class| {
            let mut sums = Vec::with_capacity(runs.len() + 1);
            let mut sum = 0;
            sums.push(sum);
            for &(side, run) in &runs {
                sum += depth_change(side, run, class);
                sums.push(sum);
            }
            sums
        });
        let lows = sums.each_ref().map(|sums| {
            let mut lows = vec![isize::MAX; sums.len()];
            for j in (0..sums.len() - 1).rev() {
                lows[j] = lows[j + 1].min(sums[j + 1]);
            }
            lows
        });
        Self { starts, sums, lows }
    }

    fn close(&self, from: usize, open: usize) -> bool {
        let first = self.starts.partition_point(|&start| start < from);
        let class = open % 3;
        let Ok(open) = isize::try_from(open) else {
            return false;
        };
        self.lows[class][first] <= self.sums[class][first] - open
    }
}

/// Change of the open depth caused by a run, for an opener whose length
/// modulo 3 is `class`.
fn depth_change(side: Flank, run: usize, class: usize) -> isize {
    let len = isize::try_from(run).unwrap_or(isize::MAX);
    match side {
        Flank::Left => len,
        Flank::Both if class != 0 && (class + run) % 3 == 0 => 0,
        _ => -len,
    }
}

/// Try to open emphasis at the start of `src`.
///
/// `masked` is the masked source aligned byte for byte with `src`, which
/// starts at `pos` of the content `closers` was built from; `prev` is the
/// last character of the preceding text token, if any. Returns the kind of
/// emphasis and the byte length of its raw source.
pub(super) fn scan(
    src: &str,
    masked: &str,
    prev: Option<char>,
    closers: &Closers,
    pos: usize,
) -> Option<(Emphasis, usize)> {
    let delimiter = src.chars().next().filter(|c| matches!(c, '*' | '_'))?;
    let open = run_len(src, delimiter);
    let next = src[open..].chars().next()?;
    if next.is_whitespace() {
        return None;
    }

    let next_is_punctuation = is_punctuation(next);
    // `_` never opens inside a word.
    if delimiter == '_' && !next_is_punctuation && prev.is_some_and(char::is_alphanumeric) {
        return None;
    }
    if next_is_punctuation && prev.is_some_and(|p| !is_punctuation_or_space(p)) {
        return None;
    }
    if !closers.close(delimiter, pos + open, open) {
        return None;
    }

    let body = masked.get(open..)?;
    let mut depth = isize::try_from(open).ok()?;
    let mut middle = 0;
    let mut before = None;
    let mut i = 0;

    while let Some(c) = body[i..].chars().next() {
        if c != delimiter {
            before = Some(c);
            i += c.len_utf8();
            continue;
        }

        let run = run_len(&body[i..], delimiter);
        let start = i;
        let after = body[i + run..].chars().next();
        i += run;
        let Some(side) = before.and_then(|b| flank(b, after, delimiter)) else {
            before = Some(delimiter);
            continue;
        };
        before = Some(delimiter);

        let run = isize::try_from(run).ok()?;
        match side {
            Flank::Left => {
                depth += run;
                continue;
            }
            Flank::Both if open % 3 != 0 && (open + run.unsigned_abs()) % 3 == 0 => {
                middle += run;
                continue;
            }
            _ => {}
        }

        depth -= run;
        if depth > 0 {
            continue;
        }
        let close = usize::try_from(run.min(run + depth + middle)).ok()?;
        let kind = if open.min(close) % 2 == 1 {
            Emphasis::Em
        } else {
            Emphasis::Strong
        };
        return Some((kind, open + start + close));
    }
    None
}

fn is_punctuation_or_space(c: char) -> bool {
    c.is_whitespace() || (is_punctuation(c) && c != '*' && c != '_')
}

/// Classify a delimiter run from the characters around it.
///
/// `*` runs between two word characters can both open and close; `_` runs
/// there do neither.
fn flank(before: char, after: Option<char>, delimiter: char) -> Option<Flank> {
    let before_space = before.is_whitespace();
    let before_punct = is_punctuation(before) && before != delimiter;
    let before_word = !before_space && !is_punctuation(before);

    let after_space = after.is_none_or(char::is_whitespace);
    let after_punct = after.is_some_and(is_punctuation);
    let after_word = after.is_some_and(|a| !a.is_whitespace() && !is_punctuation(a));

    if (before_punct && after_space) || (before_word && (after_space || after_punct)) {
        Some(Flank::Right)
    } else if ((before_punct || before_space) && after_word) || (before_space && after_punct) {
        Some(Flank::Left)
    } else if (before_punct && after_punct) || (delimiter == '*' && before_word && after_word) {
        Some(Flank::Both)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan_plain(src: &str) -> Option<(Emphasis, usize)> {
        scan(src, src, None, &Closers::new(src), 0)
    }

    #[test]
    fn test_single_delimiters() {
        assert_eq!(scan_plain("*bold* rest"), Some((Emphasis::Em, 6)));
        assert_eq!(scan_plain("_it_"), Some((Emphasis::Em, 4)));
    }

    #[test]
    fn test_double_delimiters() {
        assert_eq!(scan_plain("**text**"), Some((Emphasis::Strong, 8)));
        assert_eq!(scan_plain("__text__"), Some((Emphasis::Strong, 8)));
    }

    #[test]
    fn test_unbalanced_runs_close_early() {
        assert_eq!(scan_plain("**a*"), None);
        assert_eq!(scan_plain("*a**"), Some((Emphasis::Em, 3)));
    }

    #[test]
    fn test_opener_needs_following_text() {
        assert_eq!(scan_plain("* a*"), None);
        assert_eq!(scan_plain("*"), None);
    }

    #[test]
    fn test_underscore_not_intraword() {
        assert_eq!(scan_plain(" _b_"), None);
        assert_eq!(scan("_b_", "_b_", Some('a'), &Closers::new("_b_"), 0), None);
        assert_eq!(scan_plain("_a_b_"), Some((Emphasis::Em, 5)));
    }

    #[test]
    fn test_star_intraword() {
        let closers = Closers::new("*b*c");
        assert_eq!(scan("*b*c", "*b*c", Some('a'), &closers, 0), Some((Emphasis::Em, 3)));
    }

    #[test]
    fn test_masked_delimiters_are_ignored() {
        // `*` inside a code span does not close.
        let masked = "*a [a] b*";
        assert_eq!(
            scan("*a `*` b*", masked, None, &Closers::new(masked), 0),
            Some((Emphasis::Em, 9))
        );
    }

    #[test]
    fn test_nested() {
        assert_eq!(scan_plain("*a **b** c*"), Some((Emphasis::Em, 11)));
    }

    #[test]
    fn test_closer_lookup() {
        let cases = [
            ("*a* b", true),
            ("*a b", false),
            ("*a **b** c*", true),
            ("**a*", false),
            ("*a**", true),
            ("*a *b *c", false),
            ("*a*b*c*", true),
            ("***a* b**", true),
            ("_a _b", false),
        ];
        for (src, closed) in cases {
            let delimiter = src.chars().next().unwrap();
            let open = run_len(src, delimiter);
            assert_eq!(Closers::new(src).close(delimiter, open, open), closed, "{src}");
            assert_eq!(scan_plain(src).is_some(), closed, "{src}");
        }
    }

    #[test]
    fn test_unmatched_openers_stay_fast() {
        let src = "*a ".repeat(50_000);
        let closers = Closers::new(&src);
        let started = std::time::Instant::now();
        for pos in (0..src.len()).step_by(3) {
            assert_eq!(scan(&src[pos..], &src[pos..], None, &closers, pos), None);
        }
        assert!(started.elapsed().as_secs() < 2);
    }
}
