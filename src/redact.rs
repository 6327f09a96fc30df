//! Masks secrets in a unified diff before it is sent to a provider.
//!
//! Two passes run in order. The first hides whole files whose path looks
//! sensitive (`.env`, private keys, credential stores). The second applies a
//! table of token rules to whatever is left. Both passes are pure and the
//! placeholders never match any rule, so redacting twice is a no-op.

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::profile;

const HIDDEN_SUFFIX: &str = "CONTENT COMPLETELY HIDDEN FOR SECURITY";
const DIFF_HEADER: &str = "diff --git ";

/// Length of the base64 token treated as an AWS secret access key.
const AWS_SECRET_LENGTH: usize = 40;

static SENSITIVE_FILES: Lazy<Vec<Regex>> = Lazy::new(|| {
  [
    r"(^|/)\.env(\.[^/]+)?$",
    r"(?i)\.(pem|key|p12|pfx)$",
    r"(^|/)id_(rsa|dsa|ecdsa|ed25519)$",
    r"(?i)(^|/)[^/]*credentials[^/]*$",
    r"(?i)(^|/)secrets\.(json|ya?ml|toml|ini)$"
  ]
  .iter()
  .map(|pattern| Regex::new(pattern).expect("invalid sensitive file pattern"))
  .collect()
});

static RULES: Lazy<Vec<Rule>> = Lazy::new(|| {
  vec![
    Rule::new("openai_key", r"\bsk[-_][A-Za-z0-9]{32,}", Replacement::Fixed("[REDACTED_OPENAI_KEY]")),
    Rule::new("github_token", r"\bgh[pso]_[A-Za-z0-9]{36,}", Replacement::Fixed("[REDACTED_GITHUB_TOKEN]")),
    Rule::new("slack_token", r"\bxox[pboa]-[A-Za-z0-9-]{10,}", Replacement::Fixed("[REDACTED_SLACK_TOKEN]")),
    Rule::new(
      "google_client_id",
      r"\b[0-9]+-[0-9A-Za-z_]{32}\.apps\.googleusercontent\.com",
      Replacement::Fixed("[REDACTED_GOOGLE_CLIENT_ID]")
    ),
    Rule::new("aws_access_key", r"\bAKIA[0-9A-Z]{16}\b", Replacement::Fixed("[REDACTED_AWS_ACCESS_KEY]")),
    Rule::new("stripe_key", r"\b(sk|pk|rk)_(live|test)_[0-9A-Za-z]{16,}", Replacement::Fixed("[REDACTED_STRIPE_KEY]")),
    Rule::new(
      "private_key",
      r"(?s)-----BEGIN [A-Z ]*PRIVATE KEY-----.*?-----END [A-Z ]*PRIVATE KEY-----",
      Replacement::Fixed("[REDACTED_PRIVATE_KEY]")
    ),
    Rule::new(
      "jwt",
      r"\beyJ[A-Za-z0-9_-]+\.[A-Za-z0-9_-]+\.[A-Za-z0-9_-]+",
      Replacement::Fixed("[REDACTED_JWT_TOKEN]")
    ),
    Rule::new(
      "key_value",
      r#"(?i)(password|passwd|pwd|secret|api_key|apikey|auth_token|access_token|private_key)["']?\s*[:=]\s*["']?([^\s"'\[][^\s"',;)}]{7,})["']?"#,
      Replacement::Template("${1}=[REDACTED]")
    ),
    Rule::new(
      "connection_string",
      r"(?i)\b(mongodb(?:\+srv)?|postgres(?:ql)?|mysql|redis)://[^\s:@/]+:[^\s@/]+@[^\s\x22']+",
      Replacement::Template("${1}://[REDACTED_CONNECTION_STRING]")
    ),
    Rule::new("bearer", r"\bBearer\s+[A-Za-z0-9\-._~+/]+=*", Replacement::Fixed("Bearer [REDACTED_TOKEN]")),
    // Broadest rule last so it does not eat pieces of the structured shapes above.
    Rule::new(
      "aws_secret_key",
      r"[A-Za-z0-9/+]+",
      Replacement::ExactLength(AWS_SECRET_LENGTH, "[REDACTED_AWS_SECRET_KEY]")
    ),
  ]
});

#[derive(Debug, Clone, Copy)]
enum Replacement {
  /// Replace every match with a constant.
  Fixed(&'static str),
  /// Replace with a `regex` expansion template (`${1}` etc).
  Template(&'static str),
  /// Replace maximal runs of exactly this many characters; keep others.
  ExactLength(usize, &'static str)
}

#[derive(Debug)]
struct Rule {
  name:        &'static str,
  pattern:     Regex,
  replacement: Replacement
}

impl Rule {
  fn new(name: &'static str, pattern: &str, replacement: Replacement) -> Self {
    Self {
      name,
      pattern: Regex::new(pattern).unwrap_or_else(|e| panic!("invalid redaction rule {name}: {e}")),
      replacement
    }
  }

  fn apply<'a>(&self, text: &'a str) -> Cow<'a, str> {
    match self.replacement {
      Replacement::Fixed(placeholder) => self.pattern.replace_all(text, placeholder),
      Replacement::Template(template) => self.pattern.replace_all(text, template),
      Replacement::ExactLength(length, placeholder) =>
        self.pattern.replace_all(text, |caps: &Captures| {
          let token = &caps[0];
          if token.len() == length {
            placeholder.to_string()
          } else {
            token.to_string()
          }
        }),
    }
  }
}

/// Returns true when a diff of `path` must never leave the machine.
pub fn is_sensitive_path(path: &str) -> bool {
  SENSITIVE_FILES.iter().any(|pattern| pattern.is_match(path))
}

/// Marker line that replaces the body of a hidden file.
pub fn hidden_marker(path: &str) -> String {
  format!("[{} {}]", path.to_uppercase(), HIDDEN_SUFFIX)
}

/// Applies both redaction passes to `diff`.
pub fn redact(diff: &str) -> String {
  profile!("Redact diff");
  redact_tokens(&hide_sensitive_files(diff))
}

/// Replaces the body of every sensitive file section with a marker line.
/// Header lines are kept verbatim.
pub fn hide_sensitive_files(diff: &str) -> String {
  let mut output = String::with_capacity(diff.len());
  let mut hiding = false;

  for line in diff.split_inclusive('\n') {
    if line.starts_with(DIFF_HEADER) {
      output.push_str(line);
      hiding = false;

      if let Some(path) = header_path(line).filter(|path| is_sensitive_path(path)) {
        log::debug!("Hiding sensitive file from diff: {}", path);
        if !line.ends_with('\n') {
          output.push('\n');
        }
        output.push_str(&hidden_marker(path));
        output.push('\n');
        hiding = true;
      }
    } else if !hiding {
      output.push_str(line);
    }
  }

  output
}

/// Applies the token rule table in order.
pub fn redact_tokens(text: &str) -> String {
  RULES.iter().fold(text.to_string(), |acc, rule| {
    let replaced = match rule.apply(&acc) {
      Cow::Borrowed(_) => None,
      Cow::Owned(replaced) => Some(replaced)
    };

    match replaced {
      Some(replaced) => {
        log::trace!("Redaction rule {} matched", rule.name);
        replaced
      }
      None => acc
    }
  })
}

/// Extracts the post-image path from a `diff --git a/<old> b/<new>` line,
/// falling back to the pre-image path.
fn header_path(line: &str) -> Option<&str> {
  let paths = line.strip_prefix(DIFF_HEADER)?.trim_end();

  // Paths with unusual bytes are quoted: "a/<old>" "b/<new>"
  let path = match paths.strip_suffix('"') {
    Some(quoted) => quoted.rsplit_once("\"b/").map(|(_, new)| new),
    None =>
      paths
        .rsplit_once(" b/")
        .map(|(_, new)| new)
        .or_else(|| paths.strip_prefix("a/")),
  };

  path.filter(|path| !path.is_empty())
}
