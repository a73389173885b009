//! Fuzzy column resolution: guess which spreadsheet header holds each
//! required column. The result is a suggestion for a human to confirm; it is
//! never applied to a dataset directly.

use serde::Serialize;

use crate::error::ReconError;
use crate::model::RequiredColumn;
use crate::schema::ColumnMapping;

/// Minimum similarity for a label to be pre-selected.
pub const DEFAULT_CUTOFF: f64 = 0.5;

/// Best guess for one required column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Suggestion {
    pub column: RequiredColumn,
    /// Pre-selected label, if any candidate reached the cutoff.
    pub label: Option<String>,
    /// Score of `label`, or of the closest rejected candidate when unresolved.
    pub score: f64,
    /// Set when a user replaced the guess.
    pub overridden: bool,
}

/// Per-column suggestions in canonical column order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuggestedMapping {
    entries: Vec<Suggestion>,
}

impl SuggestedMapping {
    pub fn entries(&self) -> &[Suggestion] {
        &self.entries
    }

    pub fn get(&self, column: RequiredColumn) -> Option<&str> {
        self.entry(column).and_then(|e| e.label.as_deref())
    }

    fn entry(&self, column: RequiredColumn) -> Option<&Suggestion> {
        self.entries.iter().find(|e| e.column == column)
    }

    /// Replace (or clear) the label chosen for one column.
    pub fn set(&mut self, column: RequiredColumn, label: Option<String>) {
        if let Some(e) = self.entries.iter_mut().find(|e| e.column == column) {
            e.label = label;
            e.overridden = true;
        }
    }

    pub fn unresolved(&self) -> Vec<RequiredColumn> {
        self.entries
            .iter()
            .filter(|e| e.label.is_none())
            .map(|e| e.column)
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.entries.iter().all(|e| e.label.is_some())
    }

    /// Turn a confirmed suggestion into a final mapping. Fails closed when
    /// any column is still unresolved.
    pub fn finalize(&self) -> Result<ColumnMapping, ReconError> {
        let missing = self.unresolved();
        if !missing.is_empty() {
            let names: Vec<&str> = missing.iter().map(|c| c.as_str()).collect();
            return Err(ReconError::Schema(format!(
                "no column selected for: {}",
                names.join(", ")
            )));
        }
        Ok(ColumnMapping::from_pairs(
            self.entries
                .iter()
                .filter_map(|e| e.label.clone().map(|l| (e.column, l))),
        ))
    }
}

/// Suggest a label for every required column. Candidates scoring at or above
/// `cutoff` are eligible; the highest wins, ties going to the earlier label.
pub fn suggest_mapping(labels: &[String], cutoff: f64) -> SuggestedMapping {
    let entries = RequiredColumn::ALL
        .into_iter()
        .map(|column| {
            let mut best: Option<(&String, f64)> = None;
            let mut closest = 0.0_f64;

            for label in labels {
                let score = similarity(column.as_str(), label);
                closest = closest.max(score);
                if score >= cutoff && best.map_or(true, |(_, s)| score > s) {
                    best = Some((label, score));
                }
            }

            match best {
                Some((label, score)) => Suggestion {
                    column,
                    label: Some(label.clone()),
                    score,
                    overridden: false,
                },
                None => Suggestion {
                    column,
                    label: None,
                    score: closest,
                    overridden: false,
                },
            }
        })
        .collect();

    let mapping = SuggestedMapping { entries };
    log::debug!(
        "suggested mapping for {} labels: {} of {} columns resolved",
        labels.len(),
        RequiredColumn::ALL.len() - mapping.unresolved().len(),
        RequiredColumn::ALL.len()
    );
    mapping
}

/// Sequence-matching ratio in `0.0..=1.0`: twice the number of characters in
/// matching blocks over the combined length. Comparison ignores case and outer
/// whitespace and treats `_` / `-` as spaces. Folding case is deliberate:
/// exported headers such as `Acct Code` score too low against `ACCOUNT CODE`
/// when compared case-sensitively.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = fold(a).chars().collect();
    let b: Vec<char> = fold(b).chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    2.0 * matching_chars(&a, &b) as f64 / total as f64
}

fn fold(s: &str) -> String {
    let spaced: String = s
        .chars()
        .map(|c| if c == '_' || c == '-' { ' ' } else { c })
        .flat_map(char::to_uppercase)
        .collect();
    spaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Total length of the matching blocks found by repeatedly taking the longest
/// common run and recursing on both sides of it.
fn matching_chars(a: &[char], b: &[char]) -> usize {
    let mut total = 0;
    let mut stack = vec![(0, a.len(), 0, b.len())];

    while let Some((alo, ahi, blo, bhi)) = stack.pop() {
        let (i, j, k) = longest_match(a, b, alo, ahi, blo, bhi);
        if k == 0 {
            continue;
        }
        total += k;
        if alo < i && blo < j {
            stack.push((alo, i, blo, j));
        }
        if i + k < ahi && j + k < bhi {
            stack.push((i + k, ahi, j + k, bhi));
        }
    }

    total
}

/// Longest common run in `a[alo..ahi]` and `b[blo..bhi]`; earliest in `a`,
/// then earliest in `b`, on ties.
fn longest_match(
    a: &[char],
    b: &[char],
    alo: usize,
    ahi: usize,
    blo: usize,
    bhi: usize,
) -> (usize, usize, usize) {
    let width = bhi - blo + 1;
    let mut best = (alo, blo, 0);
    let mut prev = vec![0usize; width];

    for i in alo..ahi {
        let mut cur = vec![0usize; width];
        for j in blo..bhi {
            if a[i] == b[j] {
                let k = prev[j - blo] + 1;
                cur[j - blo + 1] = k;
                if k > best.2 {
                    best = (i + 1 - k, j + 1 - k, k);
                }
            }
        }
        prev = cur;
    }

    best
}
