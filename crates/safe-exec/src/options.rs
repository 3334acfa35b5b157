//! Execution options and stdout routing.
//!
//! A tool may run auxiliary commands (setup, init, ...) before the command the
//! user actually asked for. Scripts parse the primary command's stdout, so any
//! invocation whose argument list is not literally the primary argument list
//! gets its stdout sent to this process's stderr instead.

use std::path::{Path, PathBuf};

/// Settings shared by every command a caller runs.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExecOptions {
    /// Directory the child starts in; `None` keeps the current directory.
    pub working_dir: Option<PathBuf>,
    /// Arguments of the primary invocation, compared element-wise.
    pub primary_args: Vec<String>,
}

impl ExecOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn with_primary_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.primary_args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn working_dir(&self) -> Option<&Path> {
        self.working_dir.as_deref()
    }

    /// Literal, order-sensitive comparison against `primary_args`.
    pub fn is_primary<S: AsRef<str>>(&self, args: &[S]) -> bool {
        self.primary_args.len() == args.len()
            && self
                .primary_args
                .iter()
                .zip(args)
                .all(|(p, a)| p.as_str() == a.as_ref())
    }
}

/// Where the child's stdout goes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StdoutTarget {
    /// The parent's stdout.
    Inherit,
    /// The parent's stderr.
    Stderr,
}

impl StdoutTarget {
    pub fn for_args<S: AsRef<str>>(options: &ExecOptions, args: &[S]) -> Self {
        if options.is_primary(args) {
            StdoutTarget::Inherit
        } else {
            StdoutTarget::Stderr
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StdoutTarget::Inherit => "stdout",
            StdoutTarget::Stderr => "stderr",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn primary_invocation_keeps_stdout() {
        let opts = ExecOptions::new().with_primary_args(["plan"]);
        assert_eq!(StdoutTarget::for_args(&opts, &["plan"]), StdoutTarget::Inherit);
        assert_eq!(StdoutTarget::for_args(&opts, &["init"]), StdoutTarget::Stderr);
    }

    #[test]
    fn comparison_is_literal_and_ordered() {
        let opts = ExecOptions::new().with_primary_args(["apply", "-auto-approve"]);
        assert!(opts.is_primary(&["apply", "-auto-approve"]));
        assert!(!opts.is_primary(&["-auto-approve", "apply"]));
        assert!(!opts.is_primary(&["apply"]));
        assert!(!opts.is_primary(&["apply", "-auto-approve", "-no-color"]));
        assert!(!opts.is_primary(&["apply", "-auto-approve "]));
    }

    #[test]
    fn empty_lists_match() {
        let opts = ExecOptions::new();
        let none: [&str; 0] = [];
        assert!(opts.is_primary(&none));
        assert_eq!(StdoutTarget::for_args(&opts, &["x"]), StdoutTarget::Stderr);
    }

    #[test]
    fn builder_sets_working_dir() {
        let opts = ExecOptions::new().with_working_dir("/tmp/work");
        assert_eq!(opts.working_dir(), Some(Path::new("/tmp/work")));
        assert_eq!(ExecOptions::new().working_dir(), None);
    }

    proptest! {
        #[test]
        fn stdout_passthrough_iff_args_equal(
            primary in prop::collection::vec("[a-z-]{0,4}", 0..4),
            args in prop::collection::vec("[a-z-]{0,4}", 0..4),
        ) {
            let opts = ExecOptions::new().with_primary_args(primary.clone());
            let expected = if primary == args { StdoutTarget::Inherit } else { StdoutTarget::Stderr };
            prop_assert_eq!(StdoutTarget::for_args(&opts, &args), expected);
            prop_assert_eq!(StdoutTarget::for_args(&opts, &primary), StdoutTarget::Inherit);
        }
    }
}
