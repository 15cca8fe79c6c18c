//! Built-in content: lesson sections, quiz bank, cosmic-mission stages,
//! the search synonym table and the assistant's cheers.
//!
//! Everything here is static and read-only at runtime.

use crate::domain::{LessonSection, QuizItem};

pub fn lesson_sections() -> Vec<LessonSection> {
  vec![
    LessonSection {
      id: "html-intro",
      topic: "html",
      title: "Що таке HTML?",
      body: "HTML — це мова розмітки, з якої складається кожна вебсторінка. Вона описує, де заголовок, де абзац, а де картинка.",
    },
    LessonSection {
      id: "html-tags",
      topic: "html",
      title: "Теги",
      body: "Тег записують у кутових дужках: <p> відкриває абзац, </p> закриває його. Заголовки позначають тегами <h1>…<h6>.",
    },
    LessonSection {
      id: "html-links",
      topic: "html",
      title: "Посилання та зображення",
      body: "Посилання створює тег <a href=\"...\">, а зображення — тег <img src=\"...\" alt=\"...\">. Атрибут alt описує картинку словами.",
    },
    LessonSection {
      id: "css-intro",
      topic: "css",
      title: "Що таке CSS?",
      body: "CSS додає сторінці стиль: колір, шрифт, відступи. Правило складається із селектора та оголошень у фігурних дужках.",
    },
    LessonSection {
      id: "css-color",
      topic: "css",
      title: "Колір тексту та фону",
      body: "Властивість color змінює колір тексту, а background-color — колір фону. Наприклад: h1 { color: orange; }",
    },
    LessonSection {
      id: "css-text",
      topic: "css",
      title: "Розмір і вирівнювання тексту",
      body: "font-size задає розмір шрифту, text-align вирівнює текст ліворуч, праворуч або по центру (center).",
    },
    LessonSection {
      id: "css-box",
      topic: "css",
      title: "Відступи та рамки",
      body: "margin — зовнішній відступ, padding — внутрішній відступ, border малює рамку навколо елемента.",
    },
  ]
}

pub fn quiz_bank() -> Vec<QuizItem> {
  fn q(id: &str, question: &str, options: &[&str], answer: &str) -> QuizItem {
    QuizItem {
      id: id.into(),
      question: question.into(),
      options: options.iter().map(|o| o.to_string()).collect(),
      answer: answer.into(),
    }
  }

  vec![
    q(
      "css-text-color",
      "Яка CSS-властивість змінює колір тексту?",
      &["background-color", "font-size", "color", "text-align"],
      "color",
    ),
    q(
      "css-bg-color",
      "Яка властивість змінює колір фону?",
      &["color", "background-color", "border", "margin"],
      "background-color",
    ),
    q(
      "html-paragraph",
      "Який тег створює абзац?",
      &["<h1>", "<p>", "<a>", "<img>"],
      "<p>",
    ),
    q(
      "html-link",
      "Який тег створює посилання?",
      &["<link>", "<a>", "<href>", "<nav>"],
      "<a>",
    ),
    q(
      "css-center",
      "Як вирівняти текст по центру?",
      &["text-align: center", "align: middle", "font-size: center", "margin: text"],
      "text-align: center",
    ),
    q(
      "css-padding",
      "Як називається внутрішній відступ елемента?",
      &["margin", "border", "padding", "gap"],
      "padding",
    ),
  ]
}

/// One stage of the cosmic mission. `required` holds `property: value` pairs.
#[derive(Clone, Debug)]
pub struct StageDef {
  pub id: &'static str,
  pub title: &'static str,
  pub briefing: &'static str,
  pub required: &'static [(&'static str, &'static str)],
}

pub const MISSION_STAGES: &[StageDef] = &[
  StageDef {
    id: "launch-pad",
    title: "Стартовий майданчик",
    briefing: "Пофарбуй фон ракети в темно-синій: background-color: navy;",
    required: &[("background-color", "navy")],
  },
  StageDef {
    id: "engine",
    title: "Двигун",
    briefing: "Зроби напис на борту білим і великим: color: white; font-size: 32px;",
    required: &[("color", "white"), ("font-size", "32px")],
  },
  StageDef {
    id: "orbit",
    title: "Орбіта",
    briefing: "Вирівняй позивний по центру: text-align: center;",
    required: &[("text-align", "center")],
  },
  StageDef {
    id: "docking",
    title: "Стикування",
    briefing: "Додай рамку та відступ, щоб модуль пристикувався: border: 2px solid gold; padding: 16px;",
    required: &[("border", "2px solid gold"), ("padding", "16px")],
  },
];

pub const CHEERS: &[&str] = &[
  "Чудово! Енергія зростає!",
  "Так тримати, космонавте!",
  "Ракета летить далі!",
  "Ще один крок до зірок!",
];

/// Search synonyms: a lowercased word maps to related terms.
pub const SYNONYMS: &[(&str, &[&str])] = &[
  ("колір", &["color", "background-color"]),
  ("color", &["колір"]),
  ("фон", &["background-color", "background"]),
  ("background", &["фон"]),
  ("шрифт", &["font-size", "font"]),
  ("розмір", &["font-size"]),
  ("абзац", &["<p>", "paragraph"]),
  ("посилання", &["<a>", "href", "link"]),
  ("link", &["посилання"]),
  ("картинка", &["<img>", "зображення"]),
  ("зображення", &["<img>", "картинка"]),
  ("відступ", &["margin", "padding"]),
  ("рамка", &["border"]),
  ("центр", &["center", "text-align"]),
  ("заголовок", &["<h1>", "heading"]),
];
