//! Search-term highlighting.
//!
//! The text is split into literal and matched segments. The term is escaped
//! before the pattern is compiled, so `.` or `(` in a query are matched
//! literally. Matching is case-insensitive and runs on the original text, so
//! segment boundaries always fall on the source's own char boundaries.

use regex::RegexBuilder;
use serde::Serialize;
use tracing::debug;

/// Compiled pattern size cap; a term over it falls back to plain text.
const PATTERN_SIZE_LIMIT: usize = 1 << 20;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "text", rename_all = "snake_case")]
pub enum Segment {
  Literal(String),
  Matched(String),
}

impl Segment {
  pub fn text(&self) -> &str {
    match self {
      Segment::Literal(t) | Segment::Matched(t) => t,
    }
  }

  pub fn is_match(&self) -> bool {
    matches!(self, Segment::Matched(_))
  }
}

/// Split `text` into segments, marking every case-insensitive occurrence of `term`.
///
/// A blank term, a term that never occurs, or any failure to build the
/// pattern returns the text as a single literal segment, even when empty.
pub fn highlight_text(text: &str, term: &str) -> Vec<Segment> {
  let whole = || vec![Segment::Literal(text.to_string())];

  let term = term.trim();
  if term.is_empty() {
    return whole();
  }

  let re = match RegexBuilder::new(&regex::escape(term))
    .case_insensitive(true)
    .size_limit(PATTERN_SIZE_LIMIT)
    .build()
  {
    Ok(re) => re,
    Err(e) => {
      debug!(target: "zirka_backend", error = %e, term_len = term.len(), "highlight pattern rejected; returning plain text");
      return whole();
    }
  };

  let mut out = Vec::new();
  let mut last = 0;
  for m in re.find_iter(text) {
    if m.start() > last {
      out.push(Segment::Literal(text[last..m.start()].to_string()));
    }
    out.push(Segment::Matched(m.as_str().to_string()));
    last = m.end();
  }
  if out.is_empty() {
    return whole();
  }
  if last < text.len() {
    out.push(Segment::Literal(text[last..].to_string()));
  }
  out
}

/// Render segments as HTML, wrapping matches in `<mark>`.
pub fn render_html(segments: &[Segment]) -> String {
  let mut out = String::new();
  for seg in segments {
    match seg {
      Segment::Literal(t) => out.push_str(&escape_html(t)),
      Segment::Matched(t) => {
        out.push_str("<mark>");
        out.push_str(&escape_html(t));
        out.push_str("</mark>");
      }
    }
  }
  out
}

fn escape_html(s: &str) -> String {
  let mut out = String::with_capacity(s.len());
  for ch in s.chars() {
    match ch {
      '&' => out.push_str("&amp;"),
      '<' => out.push_str("&lt;"),
      '>' => out.push_str("&gt;"),
      '"' => out.push_str("&quot;"),
      '\'' => out.push_str("&#39;"),
      _ => out.push(ch),
    }
  }
  out
}

#[cfg(test)]
mod tests {
  use super::*;
  use proptest::prelude::*;

  fn concat(segs: &[Segment]) -> String {
    segs.iter().map(Segment::text).collect()
  }

  #[test]
  fn marks_every_occurrence_ignoring_case() {
    let segs = highlight_text("Color and COLOR and color", "color");
    assert_eq!(segs.iter().filter(|s| s.is_match()).count(), 3);
    assert_eq!(segs[0], Segment::Matched("Color".into()));
    assert_eq!(concat(&segs), "Color and COLOR and color");
  }

  #[test]
  fn blank_term_returns_original_text() {
    assert_eq!(highlight_text("abc", ""), vec![Segment::Literal("abc".into())]);
    assert_eq!(highlight_text("abc", "   \t"), vec![Segment::Literal("abc".into())]);
  }

  #[test]
  fn missing_term_is_one_literal() {
    assert_eq!(
      highlight_text("Тег <p> створює абзац", "div"),
      vec![Segment::Literal("Тег <p> створює абзац".into())]
    );
  }

  #[test]
  fn empty_text_is_one_empty_literal() {
    assert_eq!(highlight_text("", "color"), vec![Segment::Literal(String::new())]);
    assert_eq!(highlight_text("", "  "), vec![Segment::Literal(String::new())]);
  }

  #[test]
  fn metacharacters_are_matched_literally() {
    let segs = highlight_text("a.b axb (c)", "a.b");
    assert_eq!(segs, vec![Segment::Matched("a.b".into()), Segment::Literal(" axb (c)".into())]);
    let segs = highlight_text("f(x) = (c)", "(c)");
    assert_eq!(segs.last(), Some(&Segment::Matched("(c)".into())));
  }

  #[test]
  fn cyrillic_matches_case_insensitively() {
    let segs = highlight_text("Колір тексту та колір фону", "КОЛІР");
    assert_eq!(segs.iter().filter(|s| s.is_match()).count(), 2);
  }

  #[test]
  fn render_escapes_and_marks() {
    let html = render_html(&highlight_text("<b>color</b>", "color"));
    assert_eq!(html, "&lt;b&gt;<mark>color</mark>&lt;/b&gt;");
  }

  proptest! {
    #[test]
    fn segments_concatenate_to_source(text in "\\PC{0,60}", term in "\\PC{0,6}") {
      prop_assert_eq!(concat(&highlight_text(&text, &term)), text);
    }

    #[test]
    fn embedded_term_is_always_found(prefix in "[a-zа-я ]{0,10}", term in "[a-z]{1,5}", suffix in "[a-zа-я ]{0,10}") {
      let text = format!("{prefix}{term}{suffix}");
      let segs = highlight_text(&text, &term);
      prop_assert!(segs.iter().any(Segment::is_match));
      prop_assert_eq!(concat(&segs), text);
    }
  }
}
