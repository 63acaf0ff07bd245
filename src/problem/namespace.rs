//! Ordered, conflict-checked symbol table backing equation parsing.
//!
//! Entries keep their insertion order so that substitutions defined in terms
//! of earlier substitutions expand deterministically. Writes are one-shot:
//! redefining a name is an error unless `allow_overwrites` is raised, which
//! only happens inside macro expansion scopes.

use crate::problem::errors::ProblemError;
use crate::symbolic::symbolic_engine::Expr;
use crate::symbolic::utils::is_valid_identifier;

/// Built-in transcendental functions callable from equation strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinFn {
    Sin,
    Cos,
    Exp,
    Ln,
}

/// What a callable namespace entry does to its argument.
#[derive(Debug, Clone, PartialEq)]
pub enum OperatorSpec {
    /// spatial derivative along one axis; separable operators may appear in
    /// boundary conditions
    Differentiate {
        name: String,
        axis: usize,
        separable: bool,
    },
    /// the time derivative of an initial value problem
    TimeDerivative { name: String },
    Builtin(BuiltinFn),
}

/// A user-defined macro. The body is stored as text and parsed at each call
/// site with the parameters bound to the parsed call arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct SubstitutionMacro {
    pub params: Vec<String>,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NamespaceEntry {
    Expression(Expr),
    Operator(OperatorSpec),
    Substitution(SubstitutionMacro),
}

#[derive(Debug, Clone, Default)]
pub struct Namespace {
    entries: Vec<(String, NamespaceEntry)>,
    pub allow_overwrites: bool,
}

impl Namespace {
    pub fn new() -> Self {
        Namespace {
            entries: Vec::new(),
            allow_overwrites: false,
        }
    }

    /// Registers `entry` under `name`. The name must be a valid identifier
    /// and must not already be taken unless overwrites are enabled; on
    /// overwrite the entry keeps its original position.
    pub fn set(&mut self, name: &str, entry: NamespaceEntry) -> Result<(), ProblemError> {
        if !is_valid_identifier(name) {
            return Err(ProblemError::InvalidIdentifier(name.to_string()));
        }
        if let Some(slot) = self.entries.iter_mut().find(|(n, _)| n == name) {
            if !self.allow_overwrites {
                return Err(ProblemError::NameConflict(name.to_string()));
            }
            slot.1 = entry;
            return Ok(());
        }
        self.entries.push((name.to_string(), entry));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&NamespaceEntry> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, e)| e)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    /// Insertion-ordered list of registered names.
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|(n, _)| n.as_str()).collect()
    }

    /// Independent copy with the same entries and overwrite policy.
    pub fn copy(&self) -> Namespace {
        self.clone()
    }

    /// Registers user substitutions. A key with call syntax, `"lap(f)"`,
    /// becomes a late-bound macro; a bare key becomes an ordinary expression
    /// parsed immediately against the entries registered so far.
    pub fn add_substitutions<'a, I>(&mut self, substitutions: I) -> Result<(), ProblemError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        for (signature, body) in substitutions {
            let signature = signature.trim();
            if signature.contains('(') {
                let (name, params) = parse_call_signature(signature)?;
                self.set(
                    &name,
                    NamespaceEntry::Substitution(SubstitutionMacro {
                        params,
                        body: body.trim().to_string(),
                    }),
                )?;
            } else {
                let expr = crate::symbolic::parse_expr::parse_expression(body, self)
                    .map_err(|reason| ProblemError::BadSubstitution {
                        name: signature.to_string(),
                        reason,
                    })?;
                self.set(signature, NamespaceEntry::Expression(expr))?;
            }
        }
        Ok(())
    }
}

/// Splits `"name(p1, p2)"` into the macro name and its parameter names.
pub fn parse_call_signature(signature: &str) -> Result<(String, Vec<String>), ProblemError> {
    let malformed = || ProblemError::InvalidIdentifier(signature.to_string());
    let open = signature.find('(').ok_or_else(malformed)?;
    if !signature.ends_with(')') {
        return Err(malformed());
    }
    let name = signature[..open].trim().to_string();
    if !is_valid_identifier(&name) {
        return Err(ProblemError::InvalidIdentifier(name));
    }
    let inner = &signature[open + 1..signature.len() - 1];
    let mut params = Vec::new();
    if !inner.trim().is_empty() {
        for param in inner.split(',') {
            let param = param.trim();
            if !is_valid_identifier(param) {
                return Err(ProblemError::InvalidIdentifier(param.to_string()));
            }
            params.push(param.to_string());
        }
    }
    Ok((name, params))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbolic::symbolic_metadata::Meta;

    fn field(name: &str) -> NamespaceEntry {
        NamespaceEntry::Expression(Expr::Field {
            name: name.to_string(),
            meta: Meta::for_field(1),
        })
    }

    #[test]
    fn test_set_and_get() {
        let mut ns = Namespace::new();
        ns.set("u", field("u")).unwrap();
        assert!(ns.contains("u"));
        assert!(matches!(ns.get("u"), Some(NamespaceEntry::Expression(_))));
        assert!(ns.get("v").is_none());
    }

    #[test]
    fn test_conflict_rejected() {
        let mut ns = Namespace::new();
        ns.set("u", field("u")).unwrap();
        let err = ns.set("u", field("u")).unwrap_err();
        assert_eq!(err, ProblemError::NameConflict("u".to_string()));
    }

    #[test]
    fn test_overwrite_keeps_position() {
        let mut ns = Namespace::new();
        ns.set("u", field("u")).unwrap();
        ns.set("v", field("v")).unwrap();
        ns.allow_overwrites = true;
        ns.set("u", field("w")).unwrap();
        assert_eq!(ns.names(), vec!["u", "v"]);
    }

    #[test]
    fn test_invalid_identifier_rejected() {
        let mut ns = Namespace::new();
        assert!(ns.set("2u", field("2u")).is_err());
        assert!(ns.set("u v", field("u v")).is_err());
        assert!(ns.set("", field("")).is_err());
        // Unicode letters are fine, perturbation fields rely on this
        assert!(ns.set("δu", field("δu")).is_ok());
    }

    #[test]
    fn test_copy_is_independent() {
        let mut ns = Namespace::new();
        ns.set("u", field("u")).unwrap();
        let mut copy = ns.copy();
        copy.set("v", field("v")).unwrap();
        assert!(!ns.contains("v"));
        assert!(copy.contains("u"));
    }

    #[test]
    fn test_parse_call_signature() {
        let (name, params) = parse_call_signature("lap(f)").unwrap();
        assert_eq!(name, "lap");
        assert_eq!(params, vec!["f".to_string()]);
        let (name, params) = parse_call_signature("mix(f, g)").unwrap();
        assert_eq!(name, "mix");
        assert_eq!(params.len(), 2);
        assert!(parse_call_signature("lap(f").is_err());
        assert!(parse_call_signature("la p(f)").is_err());
        assert!(parse_call_signature("lap(2f)").is_err());
    }

    #[test]
    fn test_bare_substitution_parsed_immediately() {
        let mut ns = Namespace::new();
        ns.set("u", field("u")).unwrap();
        ns.add_substitutions([("twice", "2 * u")]).unwrap();
        match ns.get("twice") {
            Some(NamespaceEntry::Expression(Expr::Mul(_, _))) => {}
            other => panic!("expected parsed expression, got {:?}", other),
        }
    }
}
