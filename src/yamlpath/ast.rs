//! Path types addressing nodes inside a YAML tree.

use std::fmt;
use std::ops::Deref;

use crate::error::{Error, Result};

/// One step of a path: a mapping key or a sequence index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Step {
    /// Mapping key (`.property` or `['property']`)
    Key(String),
    /// Sequence index (`[0]`); negative values never address anything
    Index(isize),
}

impl Step {
    /// Name of the step's variant, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Step::Key(_) => "string",
            Step::Index(_) => "integer",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Key(key) => f.write_str(key),
            Step::Index(idx) => write!(f, "[{}]", idx),
        }
    }
}

impl From<&str> for Step {
    fn from(key: &str) -> Self {
        Step::Key(key.to_string())
    }
}

impl From<String> for Step {
    fn from(key: String) -> Self {
        Step::Key(key)
    }
}

impl From<&String> for Step {
    fn from(key: &String) -> Self {
        Step::Key(key.clone())
    }
}

impl From<isize> for Step {
    fn from(idx: isize) -> Self {
        Step::Index(idx)
    }
}

impl From<usize> for Step {
    fn from(idx: usize) -> Self {
        Step::Index(isize::try_from(idx).unwrap_or(isize::MAX))
    }
}

impl From<i32> for Step {
    fn from(idx: i32) -> Self {
        Step::Index(idx as isize)
    }
}

impl From<i64> for Step {
    fn from(idx: i64) -> Self {
        Step::Index(isize::try_from(idx).unwrap_or(if idx < 0 { isize::MIN } else { isize::MAX }))
    }
}

/// An ordered list of steps from some node down to a descendant.
///
/// `Path` dereferences to `[Step]`, so it can be passed anywhere a step
/// slice is expected.
///
/// ```
/// use yamlgraft::path;
/// use yamlgraft::yamlpath::Step;
///
/// let p = path!["foo", 1, "bar"];
/// assert_eq!(p.to_string(), "foo.[1].bar");
/// assert_eq!(p.end(), Some(&Step::Key("bar".into())));
/// assert_eq!(p.parent().to_string(), "foo.[1]");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Path(Vec<Step>);

impl Path {
    /// Creates an empty path, which addresses the node itself.
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Returns a new path with `steps` added after the existing ones.
    pub fn append<I, S>(&self, steps: I) -> Path
    where
        I: IntoIterator<Item = S>,
        S: Into<Step>,
    {
        let mut out = self.0.clone();
        out.extend(steps.into_iter().map(Into::into));
        Path(out)
    }

    /// Returns a new path with `steps` placed before the existing ones.
    pub fn prepend<I, S>(&self, steps: I) -> Path
    where
        I: IntoIterator<Item = S>,
        S: Into<Step>,
    {
        let mut out: Vec<Step> = steps.into_iter().map(Into::into).collect();
        out.extend(self.0.iter().cloned());
        Path(out)
    }

    /// All steps but the last. The parent of an empty path is empty.
    pub fn parent(&self) -> Path {
        match self.0.split_last() {
            Some((_, rest)) => Path(rest.to_vec()),
            None => Path::new(),
        }
    }

    pub fn start(&self) -> Option<&Step> {
        self.0.first()
    }

    pub fn end(&self) -> Option<&Step> {
        self.0.last()
    }

    /// Splits off the first step, returning it and the remaining path.
    pub fn consume(&self) -> (Option<&Step>, Path) {
        match self.0.split_first() {
            Some((head, tail)) => (Some(head), Path(tail.to_vec())),
            None => (None, Path::new()),
        }
    }

    pub fn steps(&self) -> &[Step] {
        &self.0
    }

    pub fn into_steps(self) -> Vec<Step> {
        self.0
    }

    /// Checks every step, reporting all negative indices at once.
    pub fn validate(&self) -> Result<()> {
        validate_steps(&self.0)
    }
}

/// Validates a step slice the same way `Path::validate` does.
pub fn validate_steps(steps: &[Step]) -> Result<()> {
    let problems: Vec<String> = steps
        .iter()
        .filter_map(|step| match step {
            Step::Index(idx) if *idx < 0 => {
                Some(format!("{} is invalid, steps must be >= 0", idx))
            }
            _ => None,
        })
        .collect();

    if problems.is_empty() {
        Ok(())
    } else {
        Err(Error::InvalidPath(problems))
    }
}

impl Deref for Path {
    type Target = [Step];

    fn deref(&self) -> &[Step] {
        &self.0
    }
}

impl AsRef<[Step]> for Path {
    fn as_ref(&self) -> &[Step] {
        &self.0
    }
}

/// True when a key cannot be written as a bare identifier.
fn needs_brackets(key: &str, first: bool) -> bool {
    key.is_empty()
        || (first && key.starts_with('$'))
        || key
            .chars()
            .any(|ch| matches!(ch, '.' | '[' | ']') || ch.is_whitespace())
}

fn write_bracketed_key(f: &mut fmt::Formatter<'_>, key: &str) -> fmt::Result {
    f.write_str("['")?;
    for ch in key.chars() {
        match ch {
            '\\' => f.write_str("\\\\")?,
            '\'' => f.write_str("\\'")?,
            '\n' => f.write_str("\\n")?,
            '\t' => f.write_str("\\t")?,
            '\r' => f.write_str("\\r")?,
            ch => write!(f, "{}", ch)?,
        }
    }
    f.write_str("']")
}

/// Renders the path in the form the path parser reads back. The empty path
/// renders as `$`.
impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("$");
        }
        for (i, step) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            match step {
                Step::Key(key) if needs_brackets(key, i == 0) => write_bracketed_key(f, key)?,
                step => write!(f, "{}", step)?,
            }
        }
        Ok(())
    }
}

impl From<Vec<Step>> for Path {
    fn from(steps: Vec<Step>) -> Self {
        Path(steps)
    }
}

impl From<&[Step]> for Path {
    fn from(steps: &[Step]) -> Self {
        Path(steps.to_vec())
    }
}

impl From<Step> for Path {
    fn from(step: Step) -> Self {
        Path(vec![step])
    }
}

impl<S: Into<Step>> FromIterator<S> for Path {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Path(iter.into_iter().map(Into::into).collect())
    }
}

impl IntoIterator for Path {
    type Item = Step;
    type IntoIter = std::vec::IntoIter<Step>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Path {
    type Item = &'a Step;
    type IntoIter = std::slice::Iter<'a, Step>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Builds a [`Path`] from keys and indices.
///
/// ```
/// use yamlgraft::path;
///
/// let p = path!["spec", "containers", 0, "image"];
/// assert_eq!(p.len(), 4);
/// assert!(path![].is_empty());
/// ```
#[macro_export]
macro_rules! path {
    () => {
        $crate::yamlpath::Path::new()
    };
    ($($step:expr),+ $(,)?) => {
        $crate::yamlpath::Path::from(vec![$($crate::yamlpath::Step::from($step)),+])
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parent_of_empty_path_is_empty() {
        assert!(Path::new().parent().is_empty());
    }

    #[test]
    fn test_end_returns_last_step() {
        let p = path!["a", "b", "c"];
        assert_eq!(p.end(), Some(&Step::from("c")));
        assert_eq!(p.start(), Some(&Step::from("a")));
        assert_eq!(Path::new().end(), None);
    }

    #[test]
    fn test_append_and_prepend_leave_original_untouched() {
        let base = path!["b"];
        let appended = base.append([Step::from(1), Step::from("c")]);
        let prepended = base.prepend(["x", "y"]);

        assert_eq!(base, path!["b"]);
        assert_eq!(appended, path!["b", 1, "c"]);
        assert_eq!(prepended, path!["x", "y", "b"]);
    }

    #[test]
    fn test_consume_splits_head() {
        let p = path!["foo", 2];
        let (head, tail) = p.consume();
        assert_eq!(head, Some(&Step::from("foo")));
        assert_eq!(tail, path![2]);

        let empty = Path::new();
        let (head, tail) = empty.consume();
        assert!(head.is_none());
        assert!(tail.is_empty());
    }

    #[test]
    fn test_display_renders_indices_in_brackets() {
        assert_eq!(path!["foo", 1, "bar"].to_string(), "foo.[1].bar");
        assert_eq!(Path::new().to_string(), "$");
    }

    #[test]
    fn test_display_brackets_keys_the_parser_would_split() {
        assert_eq!(path!["a.b"].to_string(), "['a.b']");
        assert_eq!(path!["x", "c d", 0].to_string(), "x.['c d'].[0]");
        assert_eq!(path!["it's [1]"].to_string(), "['it\\'s [1]']");
        assert_eq!(path!["$ref"].to_string(), "['$ref']");
        assert_eq!(path!["a", "$ref"].to_string(), "a.$ref");
        assert_eq!(path![""].to_string(), "['']");
    }

    #[test]
    fn test_validate_collects_every_negative_index() {
        assert!(path!["a", 0, 3].validate().is_ok());

        let err = path![-1, "a", -2].validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid path: -1 is invalid, steps must be >= 0; -2 is invalid, steps must be >= 0"
        );
    }
}
