/*!
Title-match query construction.

Builds the single IPC message sent to the window manager:

    [title="(?i)<search>"] focus

`(?i)` makes the window manager's PCRE match case-insensitive. The search
string is substituted verbatim by default, so it is interpreted as a regex
fragment by the window manager (`Fire*fox` stays `Fire*fox`). `MatchMode::Literal`
escapes regex metacharacters and double quotes first.

Helpers:
  - FocusQuery::new / message()
  - escape_literal()
*/

use std::fmt;

/// Characters with special meaning in a PCRE pattern.
const REGEX_META: &[char] = &[
    '\\', '.', '+', '*', '?', '(', ')', '|', '[', ']', '{', '}', '^', '$',
];

/// How the search string is placed into the criteria.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum MatchMode {
    /// Substitute verbatim (window manager sees a regex fragment)
    #[default]
    Regex,
    /// Escape regex metacharacters and quotes (plain substring match)
    Literal,
}

impl fmt::Display for MatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MatchMode::Regex => "regex",
            MatchMode::Literal => "literal",
        };
        f.write_str(s)
    }
}

/// A focus request for the first window whose title matches `search`.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct FocusQuery {
    search: String,
    mode: MatchMode,
}

impl FocusQuery {
    pub fn new(search: impl Into<String>, mode: MatchMode) -> Self {
        Self {
            search: search.into(),
            mode,
        }
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn mode(&self) -> MatchMode {
        self.mode
    }

    /// The pattern placed between the criteria quotes.
    pub fn pattern(&self) -> String {
        match self.mode {
            MatchMode::Regex => self.search.clone(),
            MatchMode::Literal => escape_literal(&self.search),
        }
    }

    /// Render the full IPC message.
    pub fn message(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for FocusQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[title=\"(?i){}\"] focus", self.pattern())
    }
}

/// Escape `raw` so the window manager matches it as plain text.
///
/// Regex metacharacters get a backslash; `"` becomes `\"` so it cannot close
/// the quoted criteria value.
pub fn escape_literal(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + 8);
    for c in raw.chars() {
        if REGEX_META.contains(&c) || c == '"' {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
