//! Line diff grouped into hunks with surrounding context.
//!
//! Matching follows the longest-matching-block approach: find the longest
//! run of equal lines, then recurse on both sides of it. This tends to
//! produce hunks that read naturally for source code.

use std::collections::HashMap;

/// What an [`Opcode`] does to turn `a` into `b`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    /// `a[a_start..a_end] == b[b_start..b_end]`.
    Equal,
    /// `a[a_start..a_end]` is replaced by `b[b_start..b_end]`.
    Replace,
    /// `a[a_start..a_end]` is removed.
    Delete,
    /// `b[b_start..b_end]` is inserted.
    Insert,
}

/// One step of an edit script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Opcode {
    /// Kind of edit.
    pub tag: Tag,
    /// Start in `a`.
    pub a_start: usize,
    /// End in `a`, exclusive.
    pub a_end: usize,
    /// Start in `b`.
    pub b_start: usize,
    /// End in `b`, exclusive.
    pub b_end: usize,
}

impl Opcode {
    fn new(tag: Tag, a_start: usize, a_end: usize, b_start: usize, b_end: usize) -> Self {
        Self {
            tag,
            a_start,
            a_end,
            b_start,
            b_end,
        }
    }
}

struct Matcher<'a> {
    a: &'a [&'a str],
    b: &'a [&'a str],
    b_index: HashMap<&'a str, Vec<usize>>,
}

impl<'a> Matcher<'a> {
    fn new(a: &'a [&'a str], b: &'a [&'a str]) -> Self {
        let mut b_index: HashMap<&str, Vec<usize>> = HashMap::new();
        for (j, &line) in b.iter().enumerate() {
            b_index.entry(line).or_default().push(j);
        }

        Self { a, b, b_index }
    }

    /// Longest block with `a[i..i + k] == b[j..j + k]` inside the given
    /// ranges, as `(i, j, k)`. Ties go to the earliest block in `a`, then
    /// in `b`.
    fn longest_match(
        &self,
        a_lo: usize,
        a_hi: usize,
        b_lo: usize,
        b_hi: usize,
    ) -> (usize, usize, usize) {
        let (mut best_i, mut best_j, mut best_k) = (a_lo, b_lo, 0);
        let mut lengths: HashMap<usize, usize> = HashMap::new();

        for i in a_lo..a_hi {
            let mut next_lengths = HashMap::new();

            for &j in self.b_index.get(self.a[i]).map_or(&[][..], Vec::as_slice) {
                if j < b_lo {
                    continue;
                }
                if j >= b_hi {
                    break;
                }

                let k = j
                    .checked_sub(1)
                    .and_then(|p| lengths.get(&p))
                    .copied()
                    .unwrap_or(0)
                    + 1;
                next_lengths.insert(j, k);

                if k > best_k {
                    best_i = i + 1 - k;
                    best_j = j + 1 - k;
                    best_k = k;
                }
            }

            lengths = next_lengths;
        }

        (best_i, best_j, best_k)
    }

    fn matching_blocks(&self) -> Vec<(usize, usize, usize)> {
        let mut queue = vec![(0, self.a.len(), 0, self.b.len())];
        let mut blocks = Vec::new();

        while let Some((a_lo, a_hi, b_lo, b_hi)) = queue.pop() {
            let (i, j, k) = self.longest_match(a_lo, a_hi, b_lo, b_hi);
            if k == 0 {
                continue;
            }

            blocks.push((i, j, k));
            if a_lo < i && b_lo < j {
                queue.push((a_lo, i, b_lo, j));
            }
            if i + k < a_hi && j + k < b_hi {
                queue.push((i + k, a_hi, j + k, b_hi));
            }
        }

        blocks.sort_unstable();

        let mut merged: Vec<(usize, usize, usize)> = Vec::new();
        for (i, j, k) in blocks {
            match merged.last_mut() {
                Some((pi, pj, pk)) if *pi + *pk == i && *pj + *pk == j => *pk += k,
                _ => merged.push((i, j, k)),
            }
        }

        merged.push((self.a.len(), self.b.len(), 0));
        merged
    }
}

/// Computes the edit script turning `a` into `b`.
#[must_use]
pub fn opcodes(a: &[&str], b: &[&str]) -> Vec<Opcode> {
    let matcher = Matcher::new(a, b);
    let (mut i, mut j) = (0, 0);
    let mut codes = Vec::new();

    for (ai, bj, size) in matcher.matching_blocks() {
        let tag = match (i < ai, j < bj) {
            (true, true) => Some(Tag::Replace),
            (true, false) => Some(Tag::Delete),
            (false, true) => Some(Tag::Insert),
            (false, false) => None,
        };
        if let Some(tag) = tag {
            codes.push(Opcode::new(tag, i, ai, j, bj));
        }

        i = ai + size;
        j = bj + size;
        if size > 0 {
            codes.push(Opcode::new(Tag::Equal, ai, i, bj, j));
        }
    }

    codes
}

/// Groups the edit script into hunks with up to `context` equal lines
/// around each change. Identical inputs produce no hunks.
#[must_use]
pub fn grouped_opcodes(a: &[&str], b: &[&str], context: usize) -> Vec<Vec<Opcode>> {
    let mut codes = opcodes(a, b);
    if codes.is_empty() {
        return Vec::new();
    }

    if let Some(first) = codes.first_mut().filter(|c| c.tag == Tag::Equal) {
        first.a_start = first.a_start.max(first.a_end.saturating_sub(context));
        first.b_start = first.b_start.max(first.b_end.saturating_sub(context));
    }
    if let Some(last) = codes.last_mut().filter(|c| c.tag == Tag::Equal) {
        last.a_end = last.a_end.min(last.a_start + context);
        last.b_end = last.b_end.min(last.b_start + context);
    }

    let mut groups = Vec::new();
    let mut group = Vec::new();

    for mut code in codes {
        if code.tag == Tag::Equal && code.a_end - code.a_start > 2 * context {
            group.push(Opcode::new(
                Tag::Equal,
                code.a_start,
                code.a_end.min(code.a_start + context),
                code.b_start,
                code.b_end.min(code.b_start + context),
            ));
            groups.push(std::mem::take(&mut group));
            code.a_start = code.a_start.max(code.a_end.saturating_sub(context));
            code.b_start = code.b_start.max(code.b_end.saturating_sub(context));
        }
        group.push(code);
    }

    if !group.is_empty() && !(group.len() == 1 && group[0].tag == Tag::Equal) {
        groups.push(group);
    }

    groups
}
