//! Provenance guard for hand-maintained model files.
//!
//! A model file records the invocation that created it. Before a later run
//! touches the project, the recorded invocation is compared with the current
//! one. Flag order does not matter: both sides are reduced to a sorted token
//! signature first.

use crate::error::DbmError;
use std::fmt;

/// Marker preceding the recorded invocation inside a model file
pub const PROVENANCE_MARKER: &str = "`dbmgen generate ";

/// Canonical, order-independent form of an invocation
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InvocationSignature(String);

impl InvocationSignature {
    /// Signature text
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InvocationSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Sorts the tokens lexically and joins them with single spaces.
///
/// Empty tokens are dropped.
///
/// # Example
/// ```rust
/// use dbmgen_core::provenance::canonicalize;
///
/// let signature = canonicalize(["User", "--table", "user", "--no-autoCreatedAt"]);
/// assert_eq!(signature.as_str(), "--no-autoCreatedAt --table User user");
/// ```
pub fn canonicalize<I, S>(tokens: I) -> InvocationSignature
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut tokens: Vec<String> = tokens
        .into_iter()
        .map(|token| token.as_ref().trim().to_string())
        .filter(|token| !token.is_empty())
        .collect();
    tokens.sort();
    InvocationSignature(tokens.join(" "))
}

/// Canonicalizes a whitespace separated command line.
pub fn canonicalize_command(command: &str) -> InvocationSignature {
    canonicalize(command.split_whitespace())
}

/// Two invocations are equivalent when their signatures are identical.
pub fn signatures_equal(a: &InvocationSignature, b: &InvocationSignature) -> bool {
    a == b
}

/// A single recorded flag
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlagToken {
    /// `--name value`
    Valued { name: String, value: String },
    /// `--name`
    Enabled(String),
    /// `--no-name`
    Disabled(String),
}

impl FlagToken {
    /// Flag name without dashes or the `no-` prefix
    pub fn name(&self) -> &str {
        match self {
            Self::Valued { name, .. } | Self::Enabled(name) | Self::Disabled(name) => name,
        }
    }

    /// Boolean setting carried by the flag, if it is a switch
    pub fn switch(&self) -> Option<bool> {
        match self {
            Self::Enabled(_) => Some(true),
            Self::Disabled(_) => Some(false),
            Self::Valued { .. } => None,
        }
    }

    /// Value of a valued flag
    pub fn value(&self) -> Option<&str> {
        match self {
            Self::Valued { value, .. } => Some(value),
            _ => None,
        }
    }

    fn push_tokens(&self, tokens: &mut Vec<String>) {
        match self {
            Self::Valued { name, value } => {
                tokens.push(format!("--{}", name));
                tokens.push(value.clone());
            }
            Self::Enabled(name) => tokens.push(format!("--{}", name)),
            Self::Disabled(name) => tokens.push(format!("--no-{}", name)),
        }
    }
}

/// The generate invocation that produced a model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationRecord {
    pub filename: String,
    pub table: String,
    pub flags: Vec<FlagToken>,
}

impl InvocationRecord {
    pub fn new(filename: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            table: table.into(),
            flags: Vec::new(),
        }
    }

    /// Builder method appending a flag.
    pub fn with_flag(mut self, flag: FlagToken) -> Self {
        self.flags.push(flag);
        self
    }

    /// Looks up a recorded flag by name.
    pub fn flag(&self, name: &str) -> Option<&FlagToken> {
        self.flags.iter().find(|flag| flag.name() == name)
    }

    /// Command line tokens: `[filename, "--table", table, ...flags]`
    pub fn tokens(&self) -> Vec<String> {
        let mut tokens = vec![
            self.filename.clone(),
            "--table".to_string(),
            self.table.clone(),
        ];
        for flag in &self.flags {
            flag.push_tokens(&mut tokens);
        }
        tokens
    }

    /// Command line as recorded in the model file
    pub fn command(&self) -> String {
        self.tokens().join(" ")
    }

    /// Canonical signature of this invocation
    pub fn signature(&self) -> InvocationSignature {
        canonicalize(self.tokens())
    }

    /// Line embedded in the model file comment header
    pub fn provenance_line(&self) -> String {
        format!(" * Generated by {}{}`", PROVENANCE_MARKER, self.command())
    }

    /// Rebuilds a record from a recorded command line.
    ///
    /// `--no-x` disables `x`; `--x` followed by another flag or by nothing is
    /// enabled; any other `--x` consumes the next token as its value.
    ///
    /// # Errors
    /// Returns an input error when the filename or `--table` is missing.
    pub fn parse(command: &str) -> crate::Result<Self> {
        let mut tokens = command.split_whitespace().peekable();
        let filename = tokens
            .next()
            .filter(|token| !token.starts_with("--"))
            .ok_or_else(|| {
                DbmError::input(format!("Recorded command '{}' has no model name", command))
            })?;

        let mut table = None;
        let mut flags = Vec::new();
        while let Some(token) = tokens.next() {
            let Some(name) = token.strip_prefix("--") else {
                tracing::debug!("Ignoring stray token '{}' in recorded command", token);
                continue;
            };
            if let Some(disabled) = name.strip_prefix("no-") {
                flags.push(FlagToken::Disabled(disabled.to_string()));
                continue;
            }
            match tokens.next_if(|next| !next.starts_with("--")) {
                Some(value) if name == "table" => table = Some(value.to_string()),
                Some(value) => flags.push(FlagToken::Valued {
                    name: name.to_string(),
                    value: value.to_string(),
                }),
                None => flags.push(FlagToken::Enabled(name.to_string())),
            }
        }

        let table = table.ok_or_else(|| {
            DbmError::input(format!("Recorded command '{}' has no --table", command))
        })?;

        Ok(Self {
            filename: filename.to_string(),
            table,
            flags,
        })
    }
}

/// Returns the invocation recorded in a model document, if any.
///
/// Only the first line containing the marker is considered.
pub fn extract_command(document: &str) -> Option<String> {
    let line = document
        .lines()
        .find(|line| line.contains(PROVENANCE_MARKER))?;
    let start = line.find(PROVENANCE_MARKER)? + PROVENANCE_MARKER.len();
    let rest = &line[start..];
    let command = rest.find('`').map_or(rest, |end| &rest[..end]).trim();
    Some(command.to_string())
}

/// Outcome of comparing a model file with the current invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProvenanceCheck {
    /// Same invocation modulo flag order
    Match,
    /// Different invocation
    Mismatch {
        recorded: InvocationSignature,
        current: InvocationSignature,
    },
    /// No provenance line in the document
    Missing,
}

/// Compares the invocation recorded in `existing_document` with `current`.
pub fn check(existing_document: &str, current: &InvocationRecord) -> ProvenanceCheck {
    let Some(recorded) = extract_command(existing_document) else {
        return ProvenanceCheck::Missing;
    };
    let recorded = canonicalize_command(&recorded);
    let current = current.signature();
    if signatures_equal(&recorded, &current) {
        ProvenanceCheck::Match
    } else {
        ProvenanceCheck::Mismatch { recorded, current }
    }
}
