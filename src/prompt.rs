//! Builds the instruction payload sent to a provider for one commit.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::RunConfig;
use crate::redact;

/// Hard cap on the diff characters sent to a provider.
pub const MAX_DIFF_CHARS: usize = 8000;

pub const SYSTEM_PROMPT: &str = "You are a helpful assistant that generates clear, conventional git commit messages.";

const DEFAULT_LANGUAGE: &str = "English";

const LANGUAGES: [(&str, &str); 21] = [
  ("en", "English"),
  ("es", "Spanish"),
  ("fr", "French"),
  ("de", "German"),
  ("it", "Italian"),
  ("pt", "Portuguese"),
  ("ru", "Russian"),
  ("ja", "Japanese"),
  ("ko", "Korean"),
  ("zh", "Chinese"),
  ("zh-cn", "Simplified Chinese"),
  ("zh-tw", "Traditional Chinese"),
  ("ar", "Arabic"),
  ("hi", "Hindi"),
  ("nl", "Dutch"),
  ("pl", "Polish"),
  ("tr", "Turkish"),
  ("sv", "Swedish"),
  ("da", "Danish"),
  ("no", "Norwegian"),
  ("fi", "Finnish")
];

static TEMPLATE_SHAPE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(.+?)\s*([:\-])\s+(.+)$").expect("invalid template pattern"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
  pub prompt: String,
  pub system: String
}

/// A template split into the part to copy verbatim and an example subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemplateShape<'a> {
  pub prefix:    &'a str,
  pub separator: &'a str,
  pub example:   &'a str
}

pub fn parse_template(template: &str) -> Option<TemplateShape<'_>> {
  let caps = TEMPLATE_SHAPE.captures(template.trim())?;

  Some(TemplateShape {
    prefix:    caps.get(1)?.as_str(),
    separator: caps.get(2)?.as_str(),
    example:   caps.get(3)?.as_str()
  })
}

/// Maps a language code to its English name. Unknown codes are returned as given.
pub fn language_name(code: &str) -> String {
  let code = code.trim();
  if code.is_empty() {
    return DEFAULT_LANGUAGE.to_string();
  }

  let lower = code.to_lowercase();
  LANGUAGES
    .iter()
    .find(|(key, _)| *key == lower)
    .map(|(_, name)| name.to_string())
    .unwrap_or_else(|| code.to_string())
}

pub fn language_instruction(code: &str) -> String {
  let name = language_name(code);
  if name == DEFAULT_LANGUAGE {
    format!("Write the commit message in {}.", DEFAULT_LANGUAGE)
  } else {
    format!("Write the commit message in {} (keep the type prefix such as feat or fix in English).", name)
  }
}

/// Returns the first `max` characters of `text`.
pub fn truncate(text: &str, max: usize) -> &str {
  match text.char_indices().nth(max) {
    Some((index, _)) => &text[..index],
    None => text
  }
}

pub fn format_instructions(template: Option<&str>) -> String {
  match template {
    Some(template) =>
      match parse_template(template) {
        Some(shape) =>
          format!(
            "Follow this exact format: \"{prefix}{separator} <description>\"\n\
             Example: \"{template}\"\n\
             Keep the prefix \"{prefix}\" and the separator \"{separator}\" exactly as shown and replace \"{example}\" \
             with a description of this commit.",
            prefix = shape.prefix,
            separator = shape.separator,
            example = shape.example,
            template = template.trim()
          ),
        None => format!("Use this template as a guide for the message format: \"{}\"", template.trim())
      },
    None =>
      "Use the Conventional Commits format: <type>(<scope>): <subject>\n\
       - type is one of: feat, fix, docs, style, refactor, test, chore, perf, ci, build, revert\n\
       - scope is optional and names the affected area (e.g. auth, api, parser)\n\
       - subject starts with a lowercase letter\n\
       - subject is at most 72 characters, in present tense, with no trailing period\n\
       - write in English unless instructed otherwise"
        .to_string(),
  }
}

fn file_list(files: &[String]) -> String {
  if files.is_empty() {
    return "(none)".to_string();
  }

  files
    .iter()
    .map(|file| format!("- {}", file))
    .collect::<Vec<_>>()
    .join("\n")
}

/// Composes the request for one commit. The diff is redacted, then truncated.
pub fn compose(diff: &str, files: &[String], old_message: &str, config: &RunConfig) -> GenerationRequest {
  let redacted = redact::redact(diff);
  let diff = truncate(&redacted, MAX_DIFF_CHARS);
  let template = config.template.as_deref();
  let language = language_instruction(&config.language);

  let prompt = match config.custom_prompt.as_deref() {
    Some(custom) => custom_prompt(custom, diff, files, old_message, template, &language),
    None => default_prompt(diff, files, old_message, template, &language)
  };

  GenerationRequest { prompt, system: SYSTEM_PROMPT.to_string() }
}

fn custom_prompt(
  custom: &str, diff: &str, files: &[String], old_message: &str, template: Option<&str>, language: &str
) -> String {
  let template_line = template
    .map(|template| format!("Format template: {}\n", template.trim()))
    .unwrap_or_default();

  format!(
    "{custom}\n\n\
     Original message: \"{old_message}\"\n\n\
     Files changed:\n{files}\n\n\
     Diff:\n{diff}\n\n\
     {template_line}{language}\n\
     Return ONLY the commit message.",
    custom = custom.trim(),
    files = file_list(files)
  )
}

fn default_prompt(diff: &str, files: &[String], old_message: &str, template: Option<&str>, language: &str) -> String {
  format!(
    "Analyze the following git commit and write a better commit message for it.\n\n\
     Original message: \"{old_message}\"\n\n\
     Files changed:\n{files}\n\n\
     Diff:\n{diff}\n\n\
     Format:\n{format}\n\n\
     Rules:\n\
     1. Read the diff carefully and describe what actually changed\n\
     2. Describe the purpose and effect of the change, not the mechanics\n\
     3. Be specific: name the component, function or behavior affected\n\
     4. Avoid generic messages such as \"update files\" or \"fix bug\"\n\
     5. Use present tense and imperative mood (\"add\" not \"added\")\n\
     6. Keep the subject line at most 72 characters\n\
     7. Do not end the subject line with a period\n\
     8. When several things changed, lead with the most significant one\n\
     9. {language}\n\
     10. Return ONLY the commit message, without quotes, explanations or markdown",
    files = file_list(files),
    format = format_instructions(template)
  )
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_language_lookup() {
    assert_eq!(language_name("en"), "English");
    assert_eq!(language_name("ES"), "Spanish");
    assert_eq!(language_name("zh-TW"), "Traditional Chinese");
    assert_eq!(language_name(""), "English");
    assert_eq!(language_name("Klingon"), "Klingon");
  }

  #[test]
  fn test_language_instruction() {
    assert_eq!(language_instruction("en"), "Write the commit message in English.");
    assert!(language_instruction("ja").contains("Japanese"));
  }

  #[test]
  fn test_parse_template() {
    let shape = parse_template("[JIRA-123] - add user login").unwrap();
    assert_eq!(shape.prefix, "[JIRA-123]");
    assert_eq!(shape.separator, "-");
    assert_eq!(shape.example, "add user login");

    let shape = parse_template("feat(ui): add dark mode").unwrap();
    assert_eq!(shape.prefix, "feat(ui)");
    assert_eq!(shape.separator, ":");

    assert!(parse_template("just a sentence").is_none());
  }

  #[test]
  fn test_truncate_counts_characters() {
    assert_eq!(truncate("héllo", 2), "hé");
    assert_eq!(truncate("abc", 10), "abc");
    assert_eq!(truncate("", 0), "");
  }

  #[test]
  fn test_format_instructions() {
    assert!(format_instructions(None).contains("Conventional Commits"));
    assert!(format_instructions(Some("feat: add x")).starts_with("Follow this exact format: \"feat: <description>\""));
    assert!(format_instructions(Some("whatever you like")).starts_with("Use this template as a guide"));
  }

  #[test]
  fn test_default_prompt_contents() {
    let files = vec!["src/lib.rs".to_string()];
    let request = compose("+fn answer() -> u32 { 42 }", &files, "update", &RunConfig::default());

    assert_eq!(request.system, SYSTEM_PROMPT);
    assert!(request.prompt.contains("Original message: \"update\""));
    assert!(request.prompt.contains("- src/lib.rs"));
    assert!(request.prompt.contains("+fn answer() -> u32 { 42 }"));
    assert!(request.prompt.contains("10. Return ONLY the commit message"));
    assert!(request.prompt.contains("9. Write the commit message in English."));
  }

  #[test]
  fn test_custom_prompt_is_shorter() {
    let config = RunConfig {
      custom_prompt: Some("Write a haiku commit message".into()),
      template: Some("JIRA-1: summary".into()),
      ..RunConfig::default()
    };

    let request = compose("+x", &[], "wip", &config);

    assert!(request.prompt.starts_with("Write a haiku commit message"));
    assert!(request.prompt.contains("Format template: JIRA-1: summary"));
    assert!(request.prompt.contains("Files changed:\n(none)"));
    assert!(!request.prompt.contains("Rules:"));
  }
}
