//! Rule line parsing.
//!
//! A rule line has the form
//!
//! ```text
//! <type> <path> <mode> <user> <group> <age> <argument...>
//! ```
//!
//! The first six fields are shell words; the argument is the rest of the
//! line taken verbatim.  Missing trailing fields and fields written as `-`
//! are "unset".
use std::fmt;
use std::path::PathBuf;

use super::attributes::{self, Flag, Flags};
use crate::error::RuleError;
use crate::logging::Log;

/// Number of shell-word fields before the free-form argument.
const FIELD_COUNT: usize = 6;

/// Everything a handler may need from one rule line.
///
/// Created once per line and shared read-only by every path the line's
/// pattern expands to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperationRecord {
    /// Handler and modifier flags, with `OnBoot` and `Glob` already stripped.
    pub flags: Flags,
    /// Octal permission text.
    pub mode: Option<String>,
    /// User name or numeric uid.
    pub user: Option<String>,
    /// Group name or numeric gid.
    pub group: Option<String>,
    /// Age expression for the clean handler.
    pub age: Option<String>,
    /// Trailing free-form text (file content, attribute operation).
    pub argument: String,
}

/// What the path field of a rule refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// A single literal path.
    Path(PathBuf),
    /// A glob pattern expanded before dispatch.
    Pattern(String),
}

impl Target {
    /// The path field as written in the configuration.
    #[must_use]
    pub fn as_str(&self) -> std::borrow::Cow<'_, str> {
        match self {
            Self::Path(p) => p.to_string_lossy(),
            Self::Pattern(p) => std::borrow::Cow::Borrowed(p),
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str())
    }
}

/// A parsed configuration line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    /// The path or pattern the rule applies to.
    pub target: Target,
    /// Flags and fields passed to the handlers.
    pub record: OperationRecord,
    /// Where the rule came from (`file:line`), for messages.
    pub origin: String,
}

impl Rule {
    /// Attach an origin string used in log messages.
    #[must_use]
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = origin.into();
        self
    }
}

/// Result of parsing one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedLine {
    /// A rule to dispatch.
    Rule(Rule),
    /// Blank line, comment, malformed line, or a boot-only rule outside
    /// boot mode.
    Skip,
}

/// Parse one configuration line.
///
/// Unknown type characters and malformed lines are reported through `log`
/// as warnings; they never abort parsing of later lines.  When the type
/// field carries the `!` modifier and `boot` is false the whole line is
/// skipped.
///
/// # Examples
///
/// ```
/// use tmpfiles_cli::config::rules::{parse_line, ParsedLine, Target};
/// use tmpfiles_cli::config::attributes::Flag;
/// use tmpfiles_cli::logging::BufferedLog;
///
/// let log = BufferedLog::new();
/// let ParsedLine::Rule(rule) = parse_line("d /run/app 0755 root root 10d", false, &log) else {
///     panic!("expected a rule");
/// };
/// assert_eq!(rule.target, Target::Path("/run/app".into()));
/// assert!(rule.record.flags.contains(Flag::CreateDir));
/// assert_eq!(rule.record.age.as_deref(), Some("10d"));
/// ```
pub fn parse_line(line: &str, boot: bool, log: &dyn Log) -> ParsedLine {
    let (fields, rest) = match split_fields(line) {
        Ok(split) => split,
        Err(e) => {
            log.warn(&format!("{e}: {}", line.trim_end()));
            return ParsedLine::Skip;
        }
    };

    let mut fields = fields.into_iter();
    let Some(kind) = fields.next() else {
        return ParsedLine::Skip;
    };
    if kind.trim_start().starts_with('#') {
        return ParsedLine::Skip;
    }
    let Some(path) = fields.next() else {
        log.warn(&RuleError::MissingPath { kind }.to_string());
        return ParsedLine::Skip;
    };

    let mut flags = Flags::empty();
    for c in kind.chars() {
        match attributes::lookup(c) {
            Ok(f) => flags |= f,
            Err(e) => log.warn(&format!("{e} in '{kind} {path}'")),
        }
    }

    if flags.contains(Flag::OnBoot) && !boot {
        log.debug(&format!("skipping boot-only rule '{kind} {path}'"));
        return ParsedLine::Skip;
    }

    let target = if flags.contains(Flag::Glob) {
        Target::Pattern(path)
    } else {
        Target::Path(PathBuf::from(path))
    };

    let mut optional = || fields.next().filter(|f| f != "-");
    let record = OperationRecord {
        flags: flags.without(Flag::OnBoot).without(Flag::Glob),
        mode: optional(),
        user: optional(),
        group: optional(),
        age: optional(),
        argument: argument_text(rest),
    };

    ParsedLine::Rule(Rule {
        target,
        record,
        origin: String::new(),
    })
}

/// Strip leading whitespace and at most one trailing newline.
fn argument_text(rest: &str) -> String {
    let rest = rest.trim_start_matches([' ', '\t']);
    rest.strip_suffix('\n').unwrap_or(rest).to_string()
}

/// Split up to [`FIELD_COUNT`] shell words off the front of `line`.
///
/// Returns the unquoted words and the untouched remainder.
fn split_fields(line: &str) -> Result<(Vec<String>, &str), RuleError> {
    let mut fields = Vec::with_capacity(FIELD_COUNT);
    let mut rest = line;
    while fields.len() < FIELD_COUNT {
        let trimmed = rest.trim_start();
        if trimmed.is_empty() {
            return Ok((fields, ""));
        }
        let end = word_end(trimmed);
        let (raw, tail) = trimmed.split_at(end);
        // shell_words treats a leading `#` as a comment, so plain words are
        // taken as-is and only quoted or escaped ones are unquoted.
        if raw.contains(['\'', '"', '\\']) {
            let mut words =
                shell_words::split(raw).map_err(|e| RuleError::Tokenize(e.to_string()))?;
            fields.push(words.pop().unwrap_or_default());
        } else {
            fields.push(raw.to_string());
        }
        rest = tail;
    }
    Ok((fields, rest))
}

/// Byte offset of the first unquoted whitespace in `s`.
fn word_end(s: &str) -> usize {
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for (i, c) in s.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match (quote, c) {
            (Some('\''), '\'') | (Some('"'), '"') => quote = None,
            (Some('"') | None, '\\') => escaped = true,
            (None, '\'' | '"') => quote = Some(c),
            (None, c) if c.is_whitespace() => return i,
            _ => {}
        }
    }
    s.len()
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing, clippy::panic)]
mod tests {
    use super::*;
    use crate::logging::BufferedLog;

    fn rule(line: &str) -> Rule {
        rule_with_boot(line, false)
    }

    fn rule_with_boot(line: &str, boot: bool) -> Rule {
        let log = BufferedLog::new();
        match parse_line(line, boot, &log) {
            ParsedLine::Rule(r) => r,
            ParsedLine::Skip => panic!("expected a rule for {line:?}"),
        }
    }

    #[test]
    fn full_line_is_tokenized() {
        let r = rule("d /run/app 0755 root wheel 10d");
        assert_eq!(r.target, Target::Path(PathBuf::from("/run/app")));
        assert_eq!(r.record.mode.as_deref(), Some("0755"));
        assert_eq!(r.record.user.as_deref(), Some("root"));
        assert_eq!(r.record.group.as_deref(), Some("wheel"));
        assert_eq!(r.record.age.as_deref(), Some("10d"));
        assert_eq!(r.record.argument, "");
    }

    #[test]
    fn missing_fields_are_unset() {
        let r = rule("d /run/app");
        assert_eq!(r.record.mode, None);
        assert_eq!(r.record.user, None);
        assert_eq!(r.record.group, None);
        assert_eq!(r.record.age, None);
    }

    #[test]
    fn dash_fields_are_unset() {
        let r = rule("d /run/app - - - -");
        assert_eq!(r.record.mode, None);
        assert_eq!(r.record.age, None);
    }

    #[test]
    fn argument_is_taken_verbatim() {
        let r = rule("w /proc/sys/kernel/x - - - - hello   world  \"quoted\"\n");
        assert_eq!(r.record.argument, "hello   world  \"quoted\"");
    }

    #[test]
    fn only_one_trailing_newline_is_stripped() {
        let r = rule("w /tmp/x - - - - line\n\n");
        assert_eq!(r.record.argument, "line\n");
    }

    #[test]
    fn quoted_path_is_unquoted() {
        let r = rule("f \"/tmp/with space\" 0644");
        assert_eq!(r.target, Target::Path(PathBuf::from("/tmp/with space")));
        assert_eq!(r.record.mode.as_deref(), Some("0644"));
    }

    #[test]
    fn comment_and_blank_lines_skip() {
        let log = BufferedLog::new();
        assert_eq!(parse_line("# d /tmp/x", false, &log), ParsedLine::Skip);
        assert_eq!(parse_line("   #d /tmp/x", false, &log), ParsedLine::Skip);
        assert_eq!(parse_line("", false, &log), ParsedLine::Skip);
        assert_eq!(parse_line("   \n", false, &log), ParsedLine::Skip);
        assert!(log.warnings().is_empty());
    }

    #[test]
    fn hash_inside_later_field_is_kept() {
        let r = rule("f /tmp/#x 0644");
        assert_eq!(r.target, Target::Path(PathBuf::from("/tmp/#x")));
    }

    #[test]
    fn missing_path_warns_and_skips() {
        let log = BufferedLog::new();
        assert_eq!(parse_line("d", false, &log), ParsedLine::Skip);
        assert!(log.has_warning("missing path"));
    }

    #[test]
    fn unterminated_quote_warns_and_skips() {
        let log = BufferedLog::new();
        assert_eq!(parse_line("f '/tmp/x 0644", false, &log), ParsedLine::Skip);
        assert_eq!(log.warnings().len(), 1);
    }

    #[test]
    fn unknown_type_warns_and_contributes_nothing() {
        let log = BufferedLog::new();
        let ParsedLine::Rule(r) = parse_line("y /tmp/x", false, &log) else {
            panic!("unknown type should still yield a rule");
        };
        assert!(r.record.flags.is_empty());
        assert!(log.has_warning("unknown type character 'y'"));
    }

    #[test]
    fn unknown_character_does_not_mask_known_ones() {
        let log = BufferedLog::new();
        let ParsedLine::Rule(r) = parse_line("dy /tmp/x", false, &log) else {
            panic!("expected a rule");
        };
        assert_eq!(r.record.flags, attributes::lookup('d').unwrap());
        assert_eq!(log.warnings().len(), 1);
    }

    #[test]
    fn boot_only_rule_skipped_outside_boot() {
        let log = BufferedLog::new();
        assert_eq!(parse_line("d! /run/x", false, &log), ParsedLine::Skip);
        assert!(log.warnings().is_empty());
    }

    #[test]
    fn boot_only_rule_kept_in_boot_mode_and_modifier_stripped() {
        let r = rule_with_boot("!d /run/x", true);
        assert!(!r.record.flags.contains(Flag::OnBoot));
        assert!(r.record.flags.contains(Flag::CreateDir));
    }

    #[test]
    fn glob_types_yield_patterns_with_modifier_stripped() {
        let r = rule("r /tmp/*.lock");
        assert_eq!(r.target, Target::Pattern("/tmp/*.lock".to_string()));
        assert!(!r.record.flags.contains(Flag::Glob));
        assert!(r.record.flags.contains(Flag::Remove));
    }

    #[test]
    fn append_modifier_combines_with_write() {
        let r = rule("w+ /tmp/log - - - - more");
        assert!(r.record.flags.contains(Flag::Write));
        assert!(r.record.flags.contains(Flag::Append));
    }

    #[test]
    fn with_origin_sets_origin() {
        let r = rule("x /tmp/keep").with_origin("a.conf:3");
        assert_eq!(r.origin, "a.conf:3");
    }

    #[test]
    fn word_end_respects_quotes() {
        assert_eq!(word_end("abc def"), 3);
        assert_eq!(word_end("'a b' c"), 5);
        assert_eq!(word_end("\"a\\\" b\" c"), 7);
        assert_eq!(word_end("a\\ b c"), 4);
        assert_eq!(word_end("abc"), 3);
    }
}
