//! A small basic graph pattern language evaluated against an in-memory [Graph].
//!
//! Patterns are conjunctions of triple patterns whose predicates are always fixed IRIs. Optional
//! triple patterns are left-joined one by one, so a missing optional value simply leaves its
//! variable unbound.

use oxrdf::{Graph, NamedNode, NamedNodeRef, Term, TripleRef, Variable};
use std::collections::HashMap;
use std::fmt::{Display, Formatter};

/// The subject or object position of a [TriplePattern].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TermPattern {
    Variable(Variable),
    Term(Term),
}

impl TermPattern {
    /// Resolves this position against `solution`, returning the bound term if there is one.
    fn resolve<'a>(&'a self, solution: &'a Solution) -> Option<&'a Term> {
        match self {
            TermPattern::Variable(variable) => solution.get(variable.as_str()),
            TermPattern::Term(term) => Some(term),
        }
    }
}

impl From<Variable> for TermPattern {
    fn from(variable: Variable) -> Self {
        TermPattern::Variable(variable)
    }
}

impl From<Term> for TermPattern {
    fn from(term: Term) -> Self {
        TermPattern::Term(term)
    }
}

impl From<NamedNodeRef<'_>> for TermPattern {
    fn from(node: NamedNodeRef<'_>) -> Self {
        TermPattern::Term(node.into_owned().into())
    }
}

impl Display for TermPattern {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            TermPattern::Variable(variable) => write!(f, "{variable}"),
            TermPattern::Term(term) => write!(f, "{term}"),
        }
    }
}

/// Shorthand for a variable pattern.
pub fn var(name: &str) -> TermPattern {
    TermPattern::Variable(Variable::new_unchecked(name))
}

/// A single triple pattern with a fixed predicate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TriplePattern {
    pub subject: TermPattern,
    pub predicate: NamedNode,
    pub object: TermPattern,
}

impl TriplePattern {
    pub fn new(
        subject: impl Into<TermPattern>,
        predicate: NamedNodeRef<'_>,
        object: impl Into<TermPattern>,
    ) -> Self {
        Self {
            subject: subject.into(),
            predicate: predicate.into_owned(),
            object: object.into(),
        }
    }

    /// Returns every extension of `solution` for which this pattern matches a triple of `graph`.
    fn extend(&self, graph: &Graph, solution: &Solution) -> Vec<Solution> {
        let subject = self.subject.resolve(solution);
        let object = self.object.resolve(solution);

        let candidates: Vec<TripleRef<'_>> = match subject {
            Some(Term::NamedNode(node)) => graph
                .triples_for_subject(node.as_ref())
                .filter(|t| t.predicate == self.predicate.as_ref())
                .collect(),
            Some(Term::BlankNode(node)) => graph
                .triples_for_subject(node.as_ref())
                .filter(|t| t.predicate == self.predicate.as_ref())
                .collect(),
            // Literals never appear in subject position.
            Some(_) => Vec::new(),
            None => graph.triples_for_predicate(self.predicate.as_ref()).collect(),
        };

        candidates
            .into_iter()
            .filter(|t| object.map_or(true, |o| t.object == o.as_ref()))
            .filter_map(|t| {
                let mut extended = solution.clone();
                let subject_term = Term::from(t.subject.into_owned());
                if !extended.bind(&self.subject, subject_term) {
                    return None;
                }
                if !extended.bind(&self.object, t.object.into_owned()) {
                    return None;
                }
                Some(extended)
            })
            .collect()
    }
}

impl Display for TriplePattern {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {} .", self.subject, self.predicate, self.object)
    }
}

/// A named conjunction of required and optional triple patterns.
///
/// The name is reported in errors so that a failing lookup can be traced back to the schema
/// attribute it was meant to resolve.
#[derive(Clone, Debug)]
pub struct GraphPattern {
    name: &'static str,
    required: Vec<TriplePattern>,
    optional: Vec<TriplePattern>,
}

impl GraphPattern {
    /// Creates a new empty pattern.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            required: Vec::new(),
            optional: Vec::new(),
        }
    }

    /// Adds a triple pattern that must match.
    #[must_use]
    pub fn triple(
        mut self,
        subject: impl Into<TermPattern>,
        predicate: NamedNodeRef<'_>,
        object: impl Into<TermPattern>,
    ) -> Self {
        self.required
            .push(TriplePattern::new(subject, predicate, object));
        self
    }

    /// Adds a triple pattern that may be absent.
    #[must_use]
    pub fn optional(
        mut self,
        subject: impl Into<TermPattern>,
        predicate: NamedNodeRef<'_>,
        object: impl Into<TermPattern>,
    ) -> Self {
        self.optional
            .push(TriplePattern::new(subject, predicate, object));
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Evaluates the pattern starting from the bindings in `initial`.
    pub fn evaluate(&self, graph: &Graph, initial: Solution) -> Vec<Solution> {
        let mut solutions = vec![initial];
        for pattern in &self.required {
            solutions = solutions
                .iter()
                .flat_map(|solution| pattern.extend(graph, solution))
                .collect();
            if solutions.is_empty() {
                return solutions;
            }
        }

        for pattern in &self.optional {
            solutions = solutions
                .into_iter()
                .flat_map(|solution| {
                    let extended = pattern.extend(graph, &solution);
                    if extended.is_empty() {
                        vec![solution]
                    } else {
                        extended
                    }
                })
                .collect();
        }

        solutions
    }
}

impl Display for GraphPattern {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{} {{", self.name)?;
        for pattern in &self.required {
            writeln!(f, "  {pattern}")?;
        }
        for pattern in &self.optional {
            writeln!(f, "  OPTIONAL {{ {pattern} }}")?;
        }
        write!(f, "}}")
    }
}

/// One row of bound variables.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Solution {
    bindings: HashMap<String, Term>,
}

impl Solution {
    /// Creates a solution that binds a single variable.
    pub fn with(name: &str, term: Term) -> Self {
        let mut bindings = HashMap::new();
        bindings.insert(name.to_owned(), term);
        Self { bindings }
    }

    /// Returns the term bound to `name`, if any.
    pub fn get(&self, name: &str) -> Option<&Term> {
        self.bindings.get(name)
    }

    /// Binds `term` to the position if it is a variable. Returns false if the variable is
    /// already bound to a different term.
    fn bind(&mut self, position: &TermPattern, term: Term) -> bool {
        let TermPattern::Variable(variable) = position else {
            return true;
        };
        match self.bindings.get(variable.as_str()) {
            Some(existing) => *existing == term,
            None => {
                self.bindings.insert(variable.as_str().to_owned(), term);
                true
            }
        }
    }
}
