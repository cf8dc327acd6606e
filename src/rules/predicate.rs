//! Predicate parsing.
//!
//! A predicate is a tagged string: optional `@` (persistent) and `!`
//! (negation) prefixes, then a body that is classified by its first
//! matching tag prefix. Classification happens after `${VAR}`
//! interpolation, so the body stored here is the raw text.

/// A parsed predicate: prefixes split off, body kept raw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predicate {
    /// Re-evaluate every 2 seconds until the predicate passes (`@` prefix)
    pub persistent: bool,

    /// Invert the outcome (`!` prefix)
    pub negated: bool,

    /// Body text, before interpolation and tag dispatch
    pub body: String,
}

impl Predicate {
    /// Split the `@` / `!` / `@!` / `!@` prefixes off a predicate string.
    pub fn parse(raw: &str) -> Self {
        let (persistent, negated, rest) = if let Some(rest) = raw.strip_prefix("@!") {
            (true, true, rest)
        } else if let Some(rest) = raw.strip_prefix("!@") {
            (true, true, rest)
        } else if let Some(rest) = raw.strip_prefix('@') {
            (true, false, rest)
        } else if let Some(rest) = raw.strip_prefix('!') {
            (false, true, rest)
        } else {
            (false, false, raw)
        };

        Self { persistent, negated, body: rest.to_string() }
    }
}

/// A classified predicate body.
///
/// The first matching tag prefix wins; an integer parse is attempted only
/// when no tag matches; everything else is a substring match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PredicateBody {
    /// `CMD:<name>` - executable resolvable on PATH
    Command(String),

    /// `EXEC:<argv>` - spawn and expect exit 0
    Spawn(String),

    /// `ENV:<name>` - environment variable is set
    EnvSet(String),

    /// `FILE:<path>` - path exists
    FileExists(String),

    /// `DIR:<path>` - path exists and is a directory
    DirExists(String),

    /// `URL:<url>` - HTTP HEAD returns 200
    UrlOk(String),

    /// Bare integer - exit-code comparison
    ExitCode(i32),

    /// Quoted or bare substring - case-insensitive match against the
    /// accumulated output
    Substring(String),
}

impl PredicateBody {
    /// Classify an (already interpolated) predicate body.
    pub fn classify(body: &str) -> Self {
        if let Some(rest) = body.strip_prefix("CMD:") {
            return Self::Command(rest.to_string());
        }
        if let Some(rest) = body.strip_prefix("EXEC:") {
            return Self::Spawn(rest.to_string());
        }
        if let Some(rest) = body.strip_prefix("ENV:") {
            return Self::EnvSet(rest.to_string());
        }
        if let Some(rest) = body.strip_prefix("FILE:") {
            return Self::FileExists(rest.to_string());
        }
        if let Some(rest) = body.strip_prefix("DIR:") {
            return Self::DirExists(rest.to_string());
        }
        if let Some(rest) = body.strip_prefix("URL:") {
            return Self::UrlOk(rest.to_string());
        }
        if let Ok(code) = body.parse::<i32>() {
            return Self::ExitCode(code);
        }

        // Quoted substrings carry their quotes from YAML; strip one layer.
        let needle = body
            .strip_prefix('"')
            .and_then(|b| b.strip_suffix('"'))
            .filter(|_| body.len() >= 2)
            .unwrap_or(body);
        Self::Substring(needle.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_predicate() {
        let p = Predicate::parse("CMD:ls");
        assert!(!p.persistent);
        assert!(!p.negated);
        assert_eq!(p.body, "CMD:ls");
    }

    #[test]
    fn test_persistent_prefix() {
        let p = Predicate::parse("@URL:localhost:8080");
        assert!(p.persistent);
        assert!(!p.negated);
        assert_eq!(p.body, "URL:localhost:8080");
    }

    #[test]
    fn test_negation_prefix() {
        let p = Predicate::parse("!ENV:MISSING");
        assert!(!p.persistent);
        assert!(p.negated);
        assert_eq!(p.body, "ENV:MISSING");
    }

    #[test]
    fn test_combined_prefixes_both_orders() {
        for raw in ["@!FILE:/tmp/x", "!@FILE:/tmp/x"] {
            let p = Predicate::parse(raw);
            assert!(p.persistent, "{raw}");
            assert!(p.negated, "{raw}");
            assert_eq!(p.body, "FILE:/tmp/x");
        }
    }

    #[test]
    fn test_classify_tags() {
        assert_eq!(PredicateBody::classify("CMD:git"), PredicateBody::Command("git".into()));
        assert_eq!(PredicateBody::classify("EXEC:true"), PredicateBody::Spawn("true".into()));
        assert_eq!(PredicateBody::classify("ENV:HOME"), PredicateBody::EnvSet("HOME".into()));
        assert_eq!(PredicateBody::classify("FILE:/etc/hosts"), PredicateBody::FileExists("/etc/hosts".into()));
        assert_eq!(PredicateBody::classify("DIR:/etc"), PredicateBody::DirExists("/etc".into()));
        assert_eq!(PredicateBody::classify("URL:example.com"), PredicateBody::UrlOk("example.com".into()));
    }

    #[test]
    fn test_classify_exit_code() {
        assert_eq!(PredicateBody::classify("0"), PredicateBody::ExitCode(0));
        assert_eq!(PredicateBody::classify("42"), PredicateBody::ExitCode(42));
    }

    #[test]
    fn test_classify_substring() {
        assert_eq!(PredicateBody::classify("hello"), PredicateBody::Substring("hello".into()));
    }

    #[test]
    fn test_classify_quoted_substring_strips_quotes() {
        assert_eq!(PredicateBody::classify("\"hello world\""), PredicateBody::Substring("hello world".into()));
    }

    #[test]
    fn test_tag_wins_over_integer_parse() {
        // A body that starts with a tag is never parsed as a number.
        assert_eq!(PredicateBody::classify("ENV:123"), PredicateBody::EnvSet("123".into()));
    }

    #[test]
    fn test_non_integer_falls_through_to_substring() {
        assert_eq!(PredicateBody::classify("12ab"), PredicateBody::Substring("12ab".into()));
    }
}
