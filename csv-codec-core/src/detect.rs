use std::cmp;

use memchr::memmem;

use crate::Terminator;

/// Cell delimiters tried by `detect_delimiter`, in priority order.
///
/// The first entry is the fallback when no candidate occurs in a sample.
pub const CELL_DELIMITERS: &[u8] = b",;\t|^";

/// Line terminators tried by `detect_terminator`, in priority order.
///
/// The first entry is the fallback when no candidate occurs in a sample.
pub const LINE_TERMINATORS: &[Terminator] =
    &[Terminator::CRLF, Terminator::Any(b'\r'), Terminator::Any(b'\n')];

/// The smallest window `scan_limit` returns for texts at least that long.
const MIN_SCAN: usize = 4096;

/// The largest window `scan_limit` ever returns.
const MAX_SCAN: usize = 64 * 1024;

/// The number of leading bytes of a text of length `len` that the detector
/// looks at.
///
/// This is a twentieth of the text, but never less than 4KB (so short texts
/// are scanned in full) and never more than 64KB.
pub fn scan_limit(len: usize) -> usize {
    cmp::min(len, cmp::max(MIN_SCAN, cmp::min(len / 20, MAX_SCAN)))
}

/// Count the non-overlapping occurrences of `needle` in `haystack`.
///
/// An empty needle never occurs.
pub fn frequency(haystack: &[u8], needle: &[u8]) -> usize {
    if needle.is_empty() {
        return 0;
    }
    memmem::find_iter(haystack, needle).count()
}

/// Pick the candidate occurring most often in the first `limit` bytes of
/// `sample`.
///
/// Candidates are matched literally. Only a strictly greater count replaces
/// the current best, so on ties the candidate listed first wins. When no
/// candidate occurs at all, the first candidate is returned. `None` is only
/// returned for an empty candidate list.
///
/// ```
/// use csv_codec_core::detect;
///
/// let sample = b"a,b;c,d,e";
/// assert_eq!(detect(sample, &[",", ";"], sample.len()), Some(&","));
/// assert_eq!(detect(sample, &["|", "^"], sample.len()), Some(&"|"));
/// ```
pub fn detect<'c, T: AsRef<[u8]>>(
    sample: &[u8],
    candidates: &'c [T],
    limit: usize,
) -> Option<&'c T> {
    let window = &sample[..cmp::min(limit, sample.len())];
    let mut best = candidates.first()?;
    let mut max = 0;
    for candidate in candidates {
        let count = frequency(window, candidate.as_ref());
        if count > max {
            max = count;
            best = candidate;
        }
    }
    Some(best)
}

/// Guess the cell delimiter of `text` among `CELL_DELIMITERS`.
pub fn detect_delimiter(text: &str) -> u8 {
    detect_delimiter_except(text, &[])
}

/// Guess the cell delimiter of `text` among the `CELL_DELIMITERS` that are
/// not in `reserved`.
///
/// `reserved` holds bytes that already have another meaning, such as the
/// quote. The fallback is the first candidate that is not reserved.
///
/// ```
/// use csv_codec_core::detect_delimiter_except;
///
/// assert_eq!(detect_delimiter_except(";a;,b;", &[b';']), b',');
/// assert_eq!(detect_delimiter_except("abc", &[b',']), b';');
/// ```
pub fn detect_delimiter_except(text: &str, reserved: &[u8]) -> u8 {
    let bytes = text.as_bytes();
    let window = &bytes[..scan_limit(bytes.len())];
    let mut candidates =
        CELL_DELIMITERS.iter().copied().filter(|b| !reserved.contains(b));
    let mut best = match candidates.next() {
        Some(first) => first,
        None => return CELL_DELIMITERS[0],
    };
    let mut max = memchr::memchr_iter(best, window).count();
    for delim in candidates {
        let count = memchr::memchr_iter(delim, window).count();
        if count > max {
            max = count;
            best = delim;
        }
    }
    best
}

/// Guess the line terminator of `text` among `LINE_TERMINATORS`.
///
/// The window always reaches past the first line end, however long the
/// first line is.
pub fn detect_terminator(text: &str) -> Terminator {
    let bytes = text.as_bytes();
    let mut limit = scan_limit(bytes.len());
    if let Some(i) = memchr::memchr2(b'\r', b'\n', bytes) {
        limit = cmp::max(limit, i + 2);
    }
    let terms: Vec<&[u8]> =
        LINE_TERMINATORS.iter().map(|t| t.as_bytes()).collect();
    let found = detect(bytes, &terms, limit);
    found
        .and_then(|&t| LINE_TERMINATORS.iter().find(|c| c.as_bytes() == t))
        .copied()
        .unwrap_or_default()
}
