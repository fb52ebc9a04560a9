use symgen_core::ModelError;

use crate::{Substitution, Type, TypeArgument, TypeParameters, WildcardBound, CAPTURE_PREFIX};

/// Fresh names for captured wildcards, scoped to a single inference call so results are
/// deterministic.
#[derive(Debug, Default)]
struct Captures {
    next: u32,
}

impl Captures {
    fn fresh(&mut self) -> String {
        self.next += 1;
        format!("{CAPTURE_PREFIX}{}", self.next)
    }
}

impl TypeParameters {
    /// Infer bindings for these parameters such that `formal` with the bindings applied equals
    /// `actual`.
    ///
    /// Only exact structural correspondence unifies: `List<T>` against `List<String>` binds
    /// `T := String`, but `List<T>` against `ArrayList<String>` fails even if `ArrayList`
    /// implements `List`. Callers must pick the matching ancestor first. A parameter bound twice
    /// to different arguments is an error (no backtracking).
    ///
    /// Wildcards on the actual side are captured: every occurrence gets its own pseudo-parameter,
    /// so `Pair<T, T>` does not unify with `Pair<?, ?>`.
    pub fn infer_type_arguments(
        &self,
        formal: &Type,
        actual: &Type,
    ) -> Result<Substitution, ModelError> {
        let mut subst = Substitution::unresolved(self.names());
        let mut captures = Captures::default();
        actual.add_inferred_type_arguments(formal, &mut subst, &mut captures)?;
        Ok(subst)
    }
}

fn mismatch(formal: &Type, actual: &Type, reason: impl Into<String>) -> ModelError {
    ModelError::Unification {
        formal: formal.to_string(),
        actual: actual.to_string(),
        reason: reason.into(),
    }
}

impl Type {
    fn add_inferred_type_arguments(
        &self,
        formal: &Type,
        subst: &mut Substitution,
        captures: &mut Captures,
    ) -> Result<(), ModelError> {
        if subst.contains(&formal.name) {
            if !formal.args.is_empty() {
                return Err(ModelError::ArityMismatch {
                    name: formal.name.clone(),
                    expected: 0,
                    found: formal.args.len(),
                });
            }
            if self.dims < formal.dims {
                return Err(mismatch(formal, self, "not enough array dimensions"));
            }
            let value = TypeArgument::Type(self.with_dims(self.dims - formal.dims));
            return match subst.get(&formal.name) {
                Some(Some(existing)) if *existing != value => Err(mismatch(
                    formal,
                    self,
                    format!("{} is already bound to {existing}", formal.name),
                )),
                Some(Some(_)) => Ok(()),
                _ => {
                    subst.set(&formal.name, value);
                    Ok(())
                }
            };
        }

        if formal.name != self.name {
            return Err(mismatch(formal, self, "different types"));
        }
        if formal.dims != self.dims {
            return Err(mismatch(formal, self, "different array dimensions"));
        }
        if formal.args.len() != self.args.len() {
            return Err(ModelError::ArityMismatch {
                name: self.name.clone(),
                expected: formal.args.len(),
                found: self.args.len(),
            });
        }
        for (formal_arg, actual_arg) in formal.args.iter().zip(self.args.iter()) {
            actual_arg.add_inferred_type_arguments(formal_arg, formal, self, subst, captures)?;
        }
        Ok(())
    }
}

impl TypeArgument {
    fn add_inferred_type_arguments(
        &self,
        formal: &TypeArgument,
        formal_owner: &Type,
        actual_owner: &Type,
        subst: &mut Substitution,
        captures: &mut Captures,
    ) -> Result<(), ModelError> {
        match (formal, self) {
            (TypeArgument::Type(f), TypeArgument::Type(a)) => {
                a.add_inferred_type_arguments(f, subst, captures)
            }
            (TypeArgument::Type(f), TypeArgument::Wildcard(_)) => {
                let capture = captures.fresh();
                subst.set(&capture, self.clone());
                Type::named(capture).add_inferred_type_arguments(f, subst, captures)
            }
            (TypeArgument::Wildcard(fb), TypeArgument::Wildcard(ab)) => match (fb, ab) {
                (WildcardBound::Unbounded, WildcardBound::Unbounded) => Ok(()),
                (WildcardBound::Extends(f), WildcardBound::Extends(a))
                | (WildcardBound::Super(f), WildcardBound::Super(a)) => {
                    a.add_inferred_type_arguments(f, subst, captures)
                }
                _ => Err(mismatch(formal_owner, actual_owner, "different wildcard bounds")),
            },
            (TypeArgument::Wildcard(_), TypeArgument::Type(_)) => Err(mismatch(
                formal_owner,
                actual_owner,
                "a wildcard only unifies with a wildcard",
            )),
        }
    }
}
