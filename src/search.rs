//! Synonym-expanded search over lesson sections and quiz questions.

use serde::Serialize;

use crate::domain::{LessonSection, QuizItem};
use crate::highlight::{highlight_text, render_html, Segment};
use crate::seeds::SYNONYMS;

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HitSource {
  Lesson,
  Quiz,
}

#[derive(Clone, Debug, Serialize)]
pub struct SearchHit {
  pub source: HitSource,
  pub id: String,
  pub title: String,
  /// The term that matched (original query or one of its synonyms).
  pub term: String,
  pub segments: Vec<Segment>,
  /// Segments rendered with `<mark>` around matches.
  pub html: String,
}

fn hit(source: HitSource, id: String, title: String, term: &str, text: &str) -> SearchHit {
  let segments = highlight_text(text, term);
  SearchHit { source, id, title, term: term.to_string(), html: render_html(&segments), segments }
}

/// Synonyms for a single word; empty when the word is unknown.
pub fn synonyms(word: &str) -> &'static [&'static str] {
  let key = word.trim().to_lowercase();
  SYNONYMS
    .iter()
    .find(|(k, _)| *k == key)
    .map(|(_, v)| *v)
    .unwrap_or(&[])
}

/// The trimmed query first, then synonyms of the whole query and of each word.
pub fn expand_query(query: &str) -> Vec<String> {
  let query = query.trim();
  if query.is_empty() {
    return Vec::new();
  }

  let mut out = vec![query.to_string()];
  for s in synonyms(query) {
    push_unique(&mut out, s);
  }
  for word in query.split_whitespace() {
    for s in synonyms(word) {
      push_unique(&mut out, s);
    }
  }
  out
}

/// Append `term` unless an entry equal to it ignoring case (any script) is present.
fn push_unique(out: &mut Vec<String>, term: &str) {
  let lower = term.to_lowercase();
  if !out.iter().any(|o| o.to_lowercase() == lower) {
    out.push(term.to_string());
  }
}

/// First expanded term contained in `haystack` (case-insensitive).
fn first_hit<'a>(haystack: &str, terms: &'a [String]) -> Option<&'a str> {
  let lower = haystack.to_lowercase();
  terms
    .iter()
    .find(|t| lower.contains(&t.to_lowercase()))
    .map(String::as_str)
}

/// The first field containing an expanded term, with that term.
fn first_match<'f, 't>(fields: &[&'f str], terms: &'t [String]) -> Option<(&'f str, &'t str)> {
  fields.iter().find_map(|f| first_hit(f, terms).map(|t| (*f, t)))
}

pub fn search(query: &str, lessons: &[LessonSection], quizzes: &[QuizItem]) -> Vec<SearchHit> {
  let terms = expand_query(query);
  if terms.is_empty() {
    return Vec::new();
  }

  let mut hits = Vec::new();
  for l in lessons {
    if let Some((text, term)) = first_match(&[l.body, l.title], &terms) {
      hits.push(hit(HitSource::Lesson, l.id.to_string(), l.title.to_string(), term, text));
    }
  }
  for q in quizzes {
    let options = q.options.join(", ");
    if let Some((text, term)) = first_match(&[&q.question, &options], &terms) {
      hits.push(hit(HitSource::Quiz, q.id.clone(), q.question.clone(), term, text));
    }
  }
  hits
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::seeds::{lesson_sections, quiz_bank};

  #[test]
  fn expands_known_words_without_duplicates() {
    let terms = expand_query("  Колір ");
    assert_eq!(terms[0], "Колір");
    assert!(terms.contains(&"color".to_string()));
    assert!(terms.contains(&"background-color".to_string()));
    let mut dedup = terms.clone();
    dedup.dedup();
    assert_eq!(dedup.len(), terms.len());
  }

  #[test]
  fn unknown_word_expands_to_itself() {
    assert_eq!(expand_query("flexbox"), vec!["flexbox".to_string()]);
    assert!(expand_query("   ").is_empty());
    assert!(synonyms("flexbox").is_empty());
  }

  #[test]
  fn synonym_finds_english_property_from_ukrainian_query() {
    let hits = search("рамка", &lesson_sections(), &quiz_bank());
    assert!(hits.iter().any(|h| h.id == "css-box"));
    assert!(hits.iter().any(|h| h.id == "css-padding"));
  }

  #[test]
  fn quiz_hits_highlight_the_question() {
    let hits = search("колір", &[], &quiz_bank());
    let hit = hits.iter().find(|h| h.id == "css-text-color").unwrap();
    assert!(hit.segments.iter().any(Segment::is_match));
    let joined: String = hit.segments.iter().map(Segment::text).collect();
    assert_eq!(joined, "Яка CSS-властивість змінює колір тексту?");
    assert!(hit.html.contains("<mark>колір</mark>"));
  }

  #[test]
  fn cyrillic_duplicates_fold_case() {
    let mut terms = vec!["Картинка".to_string()];
    push_unique(&mut terms, "КАРТИНКА");
    push_unique(&mut terms, "картинка");
    push_unique(&mut terms, "<img>");
    assert_eq!(terms, vec!["Картинка".to_string(), "<img>".to_string()]);
  }

  #[test]
  fn every_hit_highlights_the_field_that_matched() {
    let lessons = [LessonSection { id: "flex", topic: "css", title: "Гнучкі блоки", body: "display: flex вмикає розкладку." }];
    let quizzes = [QuizItem {
      id: "q".into(),
      question: "Що центрує текст?".into(),
      options: vec!["text-align".into(), "float".into()],
      answer: "text-align".into(),
    }];

    let hits = search("блоки", &lessons, &[]);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].segments, vec![Segment::Literal("Гнучкі ".into()), Segment::Matched("блоки".into())]);

    let hits = search("float", &[], &quizzes);
    assert!(hits[0].segments.iter().any(Segment::is_match));
    assert_eq!(hits[0].title, "Що центрує текст?");

    for h in search("колір", &lesson_sections(), &quiz_bank()) {
      assert!(h.segments.iter().any(Segment::is_match), "{} has no match", h.id);
    }
  }

  #[test]
  fn empty_query_has_no_hits() {
    assert!(search("", &lesson_sections(), &quiz_bank()).is_empty());
  }
}
