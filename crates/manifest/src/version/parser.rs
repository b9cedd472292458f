//! Range expression parser and npm desugaring.

use semver::{BuildMetadata, Prerelease, Version};

use super::{Comparator, Op, VersionReqError};

const OPERATORS: [&str; 8] = [">=", "<=", "~>", ">", "<", "=", "~", "^"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Prefix {
    Primitive(Op),
    Tilde,
    Caret,
    None,
}

/// A possibly incomplete version such as `1`, `1.2`, `1.x` or `1.2.3-beta`.
#[derive(Debug, Clone)]
struct Partial {
    major: Option<u64>,
    minor: Option<u64>,
    patch: Option<u64>,
    pre: Prerelease,
}

impl Partial {
    fn floor(&self) -> Version {
        Version {
            major: self.major.unwrap_or(0),
            minor: self.minor.unwrap_or(0),
            patch: self.patch.unwrap_or(0),
            pre: self.pre.clone(),
            build: BuildMetadata::EMPTY,
        }
    }

    fn is_full(&self) -> bool {
        self.patch.is_some()
    }
}

pub(super) fn parse_range_set(input: &str) -> Result<Vec<Vec<Comparator>>, VersionReqError> {
    input.split("||").map(parse_range).collect()
}

fn parse_range(range: &str) -> Result<Vec<Comparator>, VersionReqError> {
    let words = merge_operator_words(range)?;

    if words.iter().any(|word| word == "-") {
        return match words.as_slice() {
            [low, dash, high] if dash == "-" => parse_hyphen(low, high),
            _ => Err(VersionReqError::InvalidHyphenRange(range.trim().to_string())),
        };
    }

    let mut comparators = Vec::new();
    for word in &words {
        match desugar(word)? {
            Bounds::Any => {}
            Bounds::Never => return Ok(vec![never()]),
            Bounds::Comparators(found) => comparators.extend(found),
        }
    }
    Ok(comparators)
}

/// Splits on whitespace, gluing a bare operator to the version after it
/// (`>= 1.2.3` becomes `>=1.2.3`).
fn merge_operator_words(range: &str) -> Result<Vec<String>, VersionReqError> {
    let mut words = Vec::new();
    let mut pending: Option<&str> = None;

    for word in range.split_whitespace() {
        if let Some(operator) = pending.take() {
            words.push(format!("{operator}{word}"));
            continue;
        }
        if OPERATORS.contains(&word) {
            pending = Some(word);
        } else {
            words.push(word.to_string());
        }
    }

    if let Some(operator) = pending {
        return Err(VersionReqError::InvalidComparator(operator.to_string()));
    }
    Ok(words)
}

enum Bounds {
    Any,
    Never,
    Comparators(Vec<Comparator>),
}

fn desugar(word: &str) -> Result<Bounds, VersionReqError> {
    let (prefix, rest) = split_prefix(word);
    let partial = parse_partial(rest, word)?;

    match prefix {
        Prefix::Tilde => tilde(&partial, word),
        Prefix::Caret => caret(&partial, word),
        Prefix::Primitive(op) => primitive(op, &partial, word),
        Prefix::None => x_range(&partial, word),
    }
}

fn split_prefix(word: &str) -> (Prefix, &str) {
    for operator in OPERATORS {
        if let Some(rest) = word.strip_prefix(operator) {
            let prefix = match operator {
                ">=" => Prefix::Primitive(Op::GreaterEq),
                "<=" => Prefix::Primitive(Op::LessEq),
                ">" => Prefix::Primitive(Op::Greater),
                "<" => Prefix::Primitive(Op::Less),
                "=" => Prefix::Primitive(Op::Exact),
                "~" | "~>" => Prefix::Tilde,
                _ => Prefix::Caret,
            };
            return (prefix, rest);
        }
    }
    (Prefix::None, word)
}

fn parse_partial(input: &str, word: &str) -> Result<Partial, VersionReqError> {
    let input = input.trim_start_matches('=');
    let input = input
        .strip_prefix('v')
        .or_else(|| input.strip_prefix('V'))
        .unwrap_or(input);
    if input.is_empty() {
        return Err(VersionReqError::InvalidComparator(word.to_string()));
    }

    let (input, _build) = match input.split_once('+') {
        Some((core, build)) => {
            BuildMetadata::new(build)
                .map_err(|_| VersionReqError::InvalidVersion(word.to_string()))?;
            (core, Some(build))
        }
        None => (input, None),
    };
    let (core, pre) = match input.split_once('-') {
        Some((core, pre)) => {
            let pre = Prerelease::new(pre)
                .map_err(|_| VersionReqError::InvalidVersion(word.to_string()))?;
            (core, pre)
        }
        None => (input, Prerelease::EMPTY),
    };

    let parts: Vec<&str> = core.split('.').collect();
    if parts.len() > 3 {
        return Err(VersionReqError::InvalidVersion(word.to_string()));
    }

    let mut components = [None; 3];
    let mut wildcard_seen = false;
    for (index, part) in parts.iter().enumerate() {
        if matches!(*part, "x" | "X" | "*") {
            wildcard_seen = true;
            continue;
        }
        if part.is_empty() || !part.bytes().all(|byte| byte.is_ascii_digit()) {
            return Err(VersionReqError::InvalidVersion(word.to_string()));
        }
        if wildcard_seen {
            // `1.x.3` reads as `1.x`
            continue;
        }
        let number = part
            .parse::<u64>()
            .map_err(|_| VersionReqError::Overflow(word.to_string()))?;
        components[index] = Some(number);
    }

    let partial = Partial {
        major: components[0],
        minor: components[0].and(components[1]),
        patch: components[0].and(components[1]).and(components[2]),
        pre,
    };
    if !partial.pre.is_empty() && !partial.is_full() {
        return Err(VersionReqError::InvalidVersion(word.to_string()));
    }
    Ok(partial)
}

fn parse_hyphen(low: &str, high: &str) -> Result<Vec<Comparator>, VersionReqError> {
    let low_partial = parse_partial(low, low)?;
    let high_partial = parse_partial(high, high)?;

    let mut comparators = Vec::new();
    if low_partial.major.is_some() {
        comparators.push(Comparator::new(Op::GreaterEq, low_partial.floor()));
    }
    match (high_partial.major, high_partial.minor, high_partial.patch) {
        (None, _, _) => {}
        (Some(major), None, _) => {
            comparators.push(Comparator::new(Op::Less, exclusive(bump(major, high)?, 0, 0)))
        }
        (Some(major), Some(minor), None) => {
            comparators.push(Comparator::new(Op::Less, exclusive(major, bump(minor, high)?, 0)))
        }
        (Some(_), Some(_), Some(_)) => {
            comparators.push(Comparator::new(Op::LessEq, high_partial.floor()))
        }
    }
    Ok(comparators)
}

fn tilde(partial: &Partial, word: &str) -> Result<Bounds, VersionReqError> {
    let Some(major) = partial.major else {
        return Ok(Bounds::Any);
    };
    let upper = match partial.minor {
        None => exclusive(bump(major, word)?, 0, 0),
        Some(minor) => exclusive(major, bump(minor, word)?, 0),
    };
    Ok(between(partial.floor(), upper))
}

fn caret(partial: &Partial, word: &str) -> Result<Bounds, VersionReqError> {
    let Some(major) = partial.major else {
        return Ok(Bounds::Any);
    };
    let upper = match (major, partial.minor, partial.patch) {
        (_, None, _) => exclusive(bump(major, word)?, 0, 0),
        (0, Some(minor), None) => exclusive(0, bump(minor, word)?, 0),
        (0, Some(0), Some(patch)) => exclusive(0, 0, bump(patch, word)?),
        (0, Some(minor), Some(_)) => exclusive(0, bump(minor, word)?, 0),
        (_, Some(_), _) => exclusive(bump(major, word)?, 0, 0),
    };
    Ok(between(partial.floor(), upper))
}

fn primitive(op: Op, partial: &Partial, word: &str) -> Result<Bounds, VersionReqError> {
    let Some(major) = partial.major else {
        return Ok(match op {
            Op::Greater | Op::Less => Bounds::Never,
            _ => Bounds::Any,
        });
    };
    if partial.is_full() {
        return Ok(single(op, partial.floor()));
    }

    let bounds = match (op, partial.minor) {
        (Op::Exact, _) => return x_range(partial, word),
        (Op::Greater, None) => single(Op::GreaterEq, Version::new(bump(major, word)?, 0, 0)),
        (Op::Greater, Some(minor)) => {
            single(Op::GreaterEq, Version::new(major, bump(minor, word)?, 0))
        }
        (Op::GreaterEq, _) => single(Op::GreaterEq, partial.floor()),
        (Op::Less, minor) => single(Op::Less, exclusive(major, minor.unwrap_or(0), 0)),
        (Op::LessEq, None) => single(Op::Less, exclusive(bump(major, word)?, 0, 0)),
        (Op::LessEq, Some(minor)) => single(Op::Less, exclusive(major, bump(minor, word)?, 0)),
    };
    Ok(bounds)
}

fn x_range(partial: &Partial, word: &str) -> Result<Bounds, VersionReqError> {
    let Some(major) = partial.major else {
        return Ok(Bounds::Any);
    };
    Ok(match partial.minor {
        None => between(partial.floor(), exclusive(bump(major, word)?, 0, 0)),
        Some(minor) if !partial.is_full() => {
            between(partial.floor(), exclusive(major, bump(minor, word)?, 0))
        }
        Some(_) => single(Op::Exact, partial.floor()),
    })
}

fn single(op: Op, version: Version) -> Bounds {
    Bounds::Comparators(vec![Comparator::new(op, version)])
}

fn between(low: Version, high: Version) -> Bounds {
    Bounds::Comparators(vec![
        Comparator::new(Op::GreaterEq, low),
        Comparator::new(Op::Less, high),
    ])
}

/// A comparator nothing satisfies: no version precedes `0.0.0-0`.
fn never() -> Comparator {
    Comparator::new(Op::Less, exclusive(0, 0, 0))
}

/// `major.minor.patch-0`, the lowest version of that release line, so
/// prereleases of the next line stay outside the range.
fn exclusive(major: u64, minor: u64, patch: u64) -> Version {
    Version {
        major,
        minor,
        patch,
        pre: Prerelease::new("0").unwrap_or(Prerelease::EMPTY),
        build: BuildMetadata::EMPTY,
    }
}

fn bump(component: u64, word: &str) -> Result<u64, VersionReqError> {
    component
        .checked_add(1)
        .ok_or_else(|| VersionReqError::Overflow(word.to_string()))
}
