use std::iter::FusedIterator;

use serde::{Deserialize, Serialize};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::types::Task;

/// Leading characters of text and query compared by the edit-distance
/// fallback. Caps the cost of one comparison at 80x80 cells.
pub const EDIT_DISTANCE_WINDOW: usize = 80;

/// Highest normalized edit distance that still counts as a match.
pub const MAX_EDIT_RATIO: f64 = 0.5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    /// Substring, then per-word containment, then edit distance.
    #[default]
    Fuzzy,
    /// Case-insensitive substring only.
    Plain,
}

/// Unicode-aware normalization for search: lowercases, NFD-decomposes, and
/// strips combining marks, so "Café" and "cafe" compare equal.
pub fn normalize(value: &str) -> String {
    value.chars().flat_map(fold_char).collect()
}

fn fold_char(ch: char) -> impl Iterator<Item = char> {
    ch.to_lowercase().nfd().filter(|c| !is_combining_mark(*c))
}

/// Decide whether `query` should surface `text`.
///
/// Tried in order, first success wins:
/// 1. a blank query matches everything
/// 2. the normalized query is a substring of the normalized text
/// 3. every query word is contained in some text word
/// 4. the edit distance between the first [`EDIT_DISTANCE_WINDOW`] characters
///    of each side, over the longer full length, is at most [`MAX_EDIT_RATIO`]
pub fn matches(text: &str, query: &str) -> bool {
    let query = normalize(query);
    if query.trim().is_empty() {
        return true;
    }
    let text = normalize(text);
    if text.contains(&query) {
        return true;
    }

    let words: Vec<&str> = text.split_whitespace().collect();
    if query
        .split_whitespace()
        .all(|q| words.iter().any(|w| w.contains(q)))
    {
        return true;
    }

    within_edit_distance(&text, &query)
}

fn within_edit_distance(text: &str, query: &str) -> bool {
    let longest = text.chars().count().max(query.chars().count());
    if longest == 0 {
        return true;
    }
    let a: Vec<char> = text.chars().take(EDIT_DISTANCE_WINDOW).collect();
    let b: Vec<char> = query.chars().take(EDIT_DISTANCE_WINDOW).collect();
    levenshtein(&a, &b) as f64 / longest as f64 <= MAX_EDIT_RATIO
}

fn levenshtein(a: &[char], b: &[char]) -> usize {
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut row = vec![0; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        row[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            row[j + 1] = (prev[j + 1] + 1).min(row[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut row);
    }
    prev[b.len()]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpanKind {
    Match,
    Text,
}

/// A slice of the highlighted text, tagged as matched or plain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Span<'a> {
    #[serde(rename = "type")]
    pub kind: SpanKind,
    pub value: &'a str,
}

impl<'a> Span<'a> {
    pub fn matched(value: &'a str) -> Self {
        Self {
            kind: SpanKind::Match,
            value,
        }
    }

    pub fn text(value: &'a str) -> Self {
        Self {
            kind: SpanKind::Text,
            value,
        }
    }

    pub fn is_match(&self) -> bool {
        self.kind == SpanKind::Match
    }
}

/// Split `text` into spans marking every occurrence of `query`.
///
/// Occurrences are found by case- and accent-insensitive substring search.
/// Each match span covers as many characters of the original text as the
/// query has, clamped to the end of the text. The span values always
/// concatenate back to `text`.
pub fn highlight<'a>(text: &'a str, query: &str) -> Highlights<'a> {
    Highlights::new(text, query)
}

/// Iterator returned by [`highlight`].
#[derive(Debug, Clone)]
pub struct Highlights<'a> {
    text: &'a str,
    /// Byte offset of each char of `text`, followed by `text.len()`.
    bounds: Vec<usize>,
    /// Normalized form of `text`.
    folded: Vec<char>,
    /// For each folded char, the index of the original char it came from.
    origin: Vec<usize>,
    needle: Vec<char>,
    match_chars: usize,
    cursor: usize,
    queued: Option<Span<'a>>,
    finished: bool,
}

impl<'a> Highlights<'a> {
    fn new(text: &'a str, query: &str) -> Self {
        let needle: Vec<char> = normalize(query).chars().collect();
        if query.trim().is_empty() || needle.is_empty() {
            return Self::whole(text);
        }

        let mut bounds = Vec::with_capacity(text.len() + 1);
        let mut folded = Vec::with_capacity(text.len());
        let mut origin = Vec::with_capacity(text.len());
        for (index, (offset, ch)) in text.char_indices().enumerate() {
            bounds.push(offset);
            for c in fold_char(ch) {
                folded.push(c);
                origin.push(index);
            }
        }
        bounds.push(text.len());

        Self {
            text,
            bounds,
            folded,
            origin,
            needle,
            match_chars: query.chars().count(),
            cursor: 0,
            queued: None,
            finished: false,
        }
    }

    /// A single text span covering everything.
    fn whole(text: &'a str) -> Self {
        Self {
            text,
            bounds: vec![0, text.len()],
            folded: Vec::new(),
            origin: Vec::new(),
            needle: Vec::new(),
            match_chars: 0,
            cursor: 0,
            queued: Some(Span::text(text)),
            finished: true,
        }
    }

    fn char_count(&self) -> usize {
        self.bounds.len() - 1
    }

    fn slice(&self, start: usize, end: usize) -> &'a str {
        let text = self.text;
        &text[self.bounds[start]..self.bounds[end]]
    }

    /// Original char index of the first occurrence at or after `cursor`.
    fn find_from(&self, cursor: usize) -> Option<usize> {
        let n = self.needle.len();
        if self.folded.len() < n {
            return None;
        }
        let from = self.origin.partition_point(|&o| o < cursor);
        (from..=self.folded.len() - n)
            .find(|&k| self.folded[k..k + n] == self.needle[..])
            .map(|k| self.origin[k])
    }
}

impl<'a> Iterator for Highlights<'a> {
    type Item = Span<'a>;

    fn next(&mut self) -> Option<Span<'a>> {
        if let Some(span) = self.queued.take() {
            return Some(span);
        }
        let total = self.char_count();
        if self.finished || self.cursor >= total {
            self.finished = true;
            return None;
        }

        let gap_start = self.cursor;
        match self.find_from(gap_start) {
            Some(start) => {
                let end = (start + self.match_chars).min(total);
                self.cursor = end;
                let matched = Span::matched(self.slice(start, end));
                if start > gap_start {
                    self.queued = Some(matched);
                    Some(Span::text(self.slice(gap_start, start)))
                } else {
                    Some(matched)
                }
            }
            None => {
                self.finished = true;
                Some(Span::text(self.slice(gap_start, total)))
            }
        }
    }
}

impl FusedIterator for Highlights<'_> {}

/// Text a task is searched by: title, description and labels.
pub fn searchable_text(task: &Task) -> String {
    let labels = task.labels.join(" ");
    [task.text.as_str(), task.description.as_str(), labels.as_str()]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// A live search over tasks, as typed into the search box.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    query: String,
    mode: SearchMode,
}

impl TaskFilter {
    pub fn new(query: impl Into<String>, mode: SearchMode) -> Self {
        Self {
            query: query.into(),
            mode,
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn mode(&self) -> SearchMode {
        self.mode
    }

    pub fn is_active(&self) -> bool {
        !self.query.trim().is_empty()
    }

    pub fn accepts(&self, task: &Task) -> bool {
        if !self.is_active() {
            return true;
        }
        let text = searchable_text(task);
        match self.mode {
            SearchMode::Fuzzy => matches(&text, &self.query),
            SearchMode::Plain => text.to_lowercase().contains(&self.query.to_lowercase()),
        }
    }

    /// Keep the tasks this filter accepts, preserving their order.
    pub fn filter<'t, I, T>(&self, tasks: I) -> Vec<&'t T>
    where
        I: IntoIterator<Item = &'t T>,
        T: AsRef<Task> + 't,
    {
        tasks
            .into_iter()
            .filter(|task| self.accepts((*task).as_ref()))
            .collect()
    }

    pub fn highlight<'a>(&self, text: &'a str) -> Highlights<'a> {
        highlight(text, &self.query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn spans<'a>(text: &'a str, query: &str) -> Vec<(SpanKind, &'a str)> {
        highlight(text, query).map(|s| (s.kind, s.value)).collect()
    }

    #[test]
    fn test_normalize_strips_accents() {
        assert_eq!(normalize("Café Crème"), "cafe creme");
        assert_eq!(normalize("ÅNGSTRÖM"), "angstrom");
        assert_eq!(normalize("Cafe\u{301}"), "cafe");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn test_matches_accent_insensitive() {
        assert!(matches("Café Meeting", "cafe"));
        assert!(matches("cafe meeting", "CAFÉ"));
    }

    #[test]
    fn test_matches_blank_query() {
        assert!(matches("anything", ""));
        assert!(matches("anything", "   "));
        assert!(matches("", ""));
    }

    #[test]
    fn test_matches_word_containment_any_order() {
        assert!(matches("quarterly budget review", "review budget"));
        assert!(matches("quarterly budget review", "view quart"));
        assert!(!matches("quarterly budget review", "review banana split"));
    }

    #[test]
    fn test_matches_abbreviation_falls_through_to_distance() {
        // Distance is at least 16 (length gap) over 23 chars.
        assert!(!matches("quarterly budget review", "qtr bgt"));
    }

    #[test]
    fn test_matches_typo_tolerance() {
        assert!(matches("groceries", "grocereis"));
        assert!(matches("meeting", "meetnig"));
        assert!(!matches("meeting", "xyz"));
    }

    #[test]
    fn test_levenshtein() {
        let d = |a: &str, b: &str| {
            let a: Vec<char> = a.chars().collect();
            let b: Vec<char> = b.chars().collect();
            levenshtein(&a, &b)
        };
        assert_eq!(d("kitten", "sitting"), 3);
        assert_eq!(d("", "abc"), 3);
        assert_eq!(d("abc", ""), 3);
        assert_eq!(d("same", "same"), 0);
    }

    #[test]
    fn test_distance_uses_full_length_as_denominator() {
        let long = "z".repeat(200);
        // The 80-char windows differ everywhere except the shared prefix,
        // but the ratio is taken over the full 200 chars.
        assert!(within_edit_distance(&long, "abc"));
        assert!(!within_edit_distance("zzzzzz", "abc"));
    }

    #[test]
    fn test_highlight_keeps_original_accents() {
        assert_eq!(
            spans("Café Meeting", "cafe"),
            vec![(SpanKind::Match, "Café"), (SpanKind::Text, " Meeting")]
        );
    }

    #[test]
    fn test_highlight_blank_query() {
        assert_eq!(spans("Plan", "  "), vec![(SpanKind::Text, "Plan")]);
        assert_eq!(spans("", ""), vec![(SpanKind::Text, "")]);
    }

    #[test]
    fn test_highlight_every_occurrence() {
        assert_eq!(
            spans("a Test, another TEST!", "test"),
            vec![
                (SpanKind::Text, "a "),
                (SpanKind::Match, "Test"),
                (SpanKind::Text, ", another "),
                (SpanKind::Match, "TEST"),
                (SpanKind::Text, "!"),
            ]
        );
    }

    #[test]
    fn test_highlight_no_occurrence() {
        assert_eq!(spans("budget", "qtr"), vec![(SpanKind::Text, "budget")]);
        assert!(spans("", "qtr").is_empty());
    }

    #[test]
    fn test_highlight_decomposed_text() {
        let text = "Cafe\u{301} Meeting";
        let got = spans(text, "cafe");
        assert_eq!(got[0], (SpanKind::Match, "Cafe"));
        let joined: String = got.iter().map(|(_, v)| *v).collect();
        assert_eq!(joined, text);
    }

    #[test]
    fn test_highlight_match_clamped_to_text_end() {
        // The query is two chars but folds to one.
        assert_eq!(
            spans("café", "e\u{301}"),
            vec![(SpanKind::Text, "caf"), (SpanKind::Match, "é")]
        );
    }

    #[test]
    fn test_highlight_is_substring_only() {
        // Fuzzy matching accepts this, highlighting finds nothing to mark.
        assert!(matches("quarterly budget review", "review budget"));
        assert!(highlight("quarterly budget review", "review budget").all(|s| !s.is_match()));
    }

    fn task(text: &str, description: &str, labels: &[&str]) -> Arc<Task> {
        Arc::new(Task {
            id: text.into(),
            column_id: "c1".into(),
            text: text.into(),
            description: description.into(),
            labels: labels.iter().map(|l| l.to_string()).collect(),
            completed: false,
            order: 0,
        })
    }

    #[test]
    fn test_searchable_text() {
        assert_eq!(searchable_text(&task("Title", "", &[])), "Title");
        assert_eq!(
            searchable_text(&task("Title", "Body", &["a", "b"])),
            "Title Body a b"
        );
    }

    #[test]
    fn test_task_filter_modes() {
        let tasks = vec![
            task("Buy groceries", "", &["errand"]),
            task("Café planning", "", &[]),
        ];
        let fuzzy = TaskFilter::new("errand", SearchMode::Fuzzy);
        let hits: Vec<&str> = fuzzy.filter(&tasks).iter().map(|t| t.text.as_str()).collect();
        assert_eq!(hits, vec!["Buy groceries"]);

        let plain = TaskFilter::new("cafe", SearchMode::Plain);
        assert!(plain.filter(&tasks).is_empty());
        let fuzzy = TaskFilter::new("cafe", SearchMode::Fuzzy);
        assert_eq!(fuzzy.filter(&tasks).len(), 1);

        let inactive = TaskFilter::new("  ", SearchMode::Plain);
        assert!(!inactive.is_active());
        assert_eq!(inactive.filter(&tasks).len(), 2);
    }
}
