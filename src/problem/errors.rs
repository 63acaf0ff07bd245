use std::error::Error;
use std::fmt;

/// Errors produced while registering names or adding equations to a problem.
#[derive(Debug, Clone, PartialEq)]
pub enum ProblemError {
    /// a name that is not a valid identifier was offered to the namespace
    InvalidIdentifier(String),
    /// a name collided with an existing namespace entry
    NameConflict(String),
    /// an equation string could not be split into LHS and RHS
    MalformedEquation {
        equation: String,
        index: usize,
        reason: String,
    },
    /// an equation side failed to parse within the problem namespace
    SymbolicParsing {
        equation: String,
        index: usize,
        side: String,
        reason: String,
    },
    /// the parsed equation violates a structural requirement of the
    /// problem variant (linearity, first order couplings, metadata rules)
    UnsupportedEquation { equation: String, reason: String },
    /// a bare-name substitution whose body does not parse
    BadSubstitution { name: String, reason: String },
    /// a metadata assignment that the domain cannot represent
    InvalidMetadata(String),
    /// the namespace was mutated after the solver structures were built
    NamespaceFrozen(String),
}

impl fmt::Display for ProblemError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProblemError::InvalidIdentifier(name) => {
                write!(f, "'{}' is not a valid identifier", name)
            }
            ProblemError::NameConflict(name) => {
                write!(f, "name '{}' is already defined in the problem namespace", name)
            }
            ProblemError::MalformedEquation {
                equation,
                index,
                reason,
            } => {
                write!(f, "malformed entry {} '{}': {}", index, equation, reason)
            }
            ProblemError::SymbolicParsing {
                equation,
                index,
                side,
                reason,
            } => {
                write!(
                    f,
                    "failed to parse {} of entry {} '{}': {}",
                    side, index, equation, reason
                )
            }
            ProblemError::UnsupportedEquation { equation, reason } => {
                write!(f, "unsupported equation '{}': {}", equation, reason)
            }
            ProblemError::BadSubstitution { name, reason } => {
                write!(f, "substitution '{}' failed to parse: {}", name, reason)
            }
            ProblemError::InvalidMetadata(reason) => {
                write!(f, "invalid metadata assignment: {}", reason)
            }
            ProblemError::NamespaceFrozen(what) => {
                write!(
                    f,
                    "cannot {} after the problem namespace has been built",
                    what
                )
            }
        }
    }
}

impl Error for ProblemError {}

impl ProblemError {
    pub fn parsing(equation: &str, index: usize, side: &str, reason: impl Into<String>) -> Self {
        ProblemError::SymbolicParsing {
            equation: equation.to_string(),
            index,
            side: side.to_string(),
            reason: reason.into(),
        }
    }

    pub fn unsupported(equation: &str, reason: impl Into<String>) -> Self {
        ProblemError::UnsupportedEquation {
            equation: equation.to_string(),
            reason: reason.into(),
        }
    }

    pub fn malformed(equation: &str, index: usize, reason: impl Into<String>) -> Self {
        ProblemError::MalformedEquation {
            equation: equation.to_string(),
            index,
            reason: reason.into(),
        }
    }
}
