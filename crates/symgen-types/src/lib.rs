//! Generic type algebra for symgen.
//!
//! Types are plain structural values: a simple (unqualified) name, type arguments and array
//! dimensions. There is no class table here; anything that needs to know whether a name is a
//! class, an interface or a type parameter asks the model crate.
//!
//! The two interesting operations are substitution ([`Type::replace_params`]) and the
//! deliberately weak unification in [`TypeParameters::infer_type_arguments`].

use std::collections::BTreeMap;
use std::fmt;

use symgen_core::ModelError;

mod infer;
mod parse;

/// The universal top type. Erased type parameters and unbounded wildcards become this.
pub const OBJECT: &str = "Object";

/// The "no value" sentinel.
pub const VOID: &str = "void";

/// Prefix of the pseudo type-parameter names allocated for captured wildcards.
pub const CAPTURE_PREFIX: &str = "capture#";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Type {
    name: String,
    args: TypeArguments,
    dims: u32,
}

impl Type {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: TypeArguments::default(),
            dims: 0,
        }
    }

    pub fn generic(name: impl Into<String>, args: Vec<TypeArgument>) -> Self {
        Self {
            name: name.into(),
            args: TypeArguments(args),
            dims: 0,
        }
    }

    pub fn void() -> Self {
        Self::named(VOID)
    }

    pub fn object() -> Self {
        Self::named(OBJECT)
    }

    /// The same type with `dims` array dimensions (replacing the current ones).
    #[must_use]
    pub fn with_dims(&self, dims: u32) -> Self {
        Self {
            dims,
            ..self.clone()
        }
    }

    #[must_use]
    pub fn array_of(&self, extra_dims: u32) -> Self {
        self.with_dims(self.dims + extra_dims)
    }

    pub fn simple_name(&self) -> &str {
        &self.name
    }

    pub fn type_arguments(&self) -> &TypeArguments {
        &self.args
    }

    pub fn array_dimensions(&self) -> u32 {
        self.dims
    }

    pub fn is_void(&self) -> bool {
        self.name == VOID && self.dims == 0
    }

    pub fn is_array(&self) -> bool {
        self.dims > 0
    }

    /// Erased spelling: type parameters become [`OBJECT`], type arguments are dropped and each
    /// array dimension adds a trailing `[]`.
    pub fn erasure(&self, is_type_param: impl Fn(&str) -> bool) -> String {
        let base = if is_type_param(&self.name) {
            OBJECT
        } else {
            self.name.as_str()
        };
        let mut out = String::with_capacity(base.len() + 2 * self.dims as usize);
        out.push_str(base);
        for _ in 0..self.dims {
            out.push_str("[]");
        }
        out
    }

    /// Rewrite every occurrence of a name bound in `subst`.
    ///
    /// A key bound to `None` is left in place as an unresolved parameter. Wildcards that end up
    /// in a top-level position are converted with [`TypeArgument::to_type`].
    pub fn replace_params(&self, subst: &Substitution) -> Result<Type, ModelError> {
        match subst.lookup(&self.name) {
            Some(binding) => {
                if !self.args.is_empty() {
                    return Err(ModelError::ArityMismatch {
                        name: self.name.clone(),
                        expected: 0,
                        found: self.args.len(),
                    });
                }
                Ok(match binding {
                    None => self.clone(),
                    Some(arg) => arg.to_type().array_of(self.dims),
                })
            }
            None => Ok(Type {
                name: self.name.clone(),
                args: self.args.replace_params(subst)?,
                dims: self.dims,
            }),
        }
    }

    /// Does `name` occur anywhere in this type (including nested arguments)?
    pub fn mentions(&self, name: &str) -> bool {
        self.name == name || self.args.iter().any(|arg| arg.mentions(name))
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.name, self.args)?;
        for _ in 0..self.dims {
            f.write_str("[]")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum WildcardBound {
    Unbounded,
    Extends(Type),
    Super(Type),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TypeArgument {
    Type(Type),
    Wildcard(WildcardBound),
}

impl TypeArgument {
    /// View the argument as a type: `?` and `? super X` become the top type, `? extends X`
    /// becomes `X`.
    pub fn to_type(&self) -> Type {
        match self {
            TypeArgument::Type(ty) => ty.clone(),
            TypeArgument::Wildcard(WildcardBound::Extends(bound)) => bound.clone(),
            TypeArgument::Wildcard(WildcardBound::Unbounded | WildcardBound::Super(_)) => {
                Type::object()
            }
        }
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self, TypeArgument::Wildcard(_))
    }

    pub fn replace_params(&self, subst: &Substitution) -> Result<TypeArgument, ModelError> {
        Ok(match self {
            TypeArgument::Type(ty) => {
                // A bare parameter in argument position takes the bound argument verbatim so
                // wildcards survive (`List<T>` with `T := ?` is `List<?>`).
                if ty.args.is_empty() && ty.dims == 0 {
                    if let Some(Some(bound)) = subst.lookup(&ty.name) {
                        return Ok(bound);
                    }
                }
                TypeArgument::Type(ty.replace_params(subst)?)
            }
            TypeArgument::Wildcard(WildcardBound::Unbounded) => self.clone(),
            TypeArgument::Wildcard(WildcardBound::Extends(bound)) => {
                TypeArgument::Wildcard(WildcardBound::Extends(bound.replace_params(subst)?))
            }
            TypeArgument::Wildcard(WildcardBound::Super(bound)) => {
                TypeArgument::Wildcard(WildcardBound::Super(bound.replace_params(subst)?))
            }
        })
    }

    fn mentions(&self, name: &str) -> bool {
        match self {
            TypeArgument::Type(ty) => ty.mentions(name),
            TypeArgument::Wildcard(WildcardBound::Unbounded) => false,
            TypeArgument::Wildcard(WildcardBound::Extends(b) | WildcardBound::Super(b)) => {
                b.mentions(name)
            }
        }
    }
}

impl From<Type> for TypeArgument {
    fn from(ty: Type) -> Self {
        TypeArgument::Type(ty)
    }
}

impl fmt::Display for TypeArgument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeArgument::Type(ty) => ty.fmt(f),
            TypeArgument::Wildcard(WildcardBound::Unbounded) => f.write_str("?"),
            TypeArgument::Wildcard(WildcardBound::Extends(b)) => write!(f, "? extends {b}"),
            TypeArgument::Wildcard(WildcardBound::Super(b)) => write!(f, "? super {b}"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeArguments(Vec<TypeArgument>);

impl TypeArguments {
    pub fn new(args: Vec<TypeArgument>) -> Self {
        Self(args)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TypeArgument> {
        self.0.iter()
    }

    pub fn get(&self, idx: usize) -> Option<&TypeArgument> {
        self.0.get(idx)
    }

    pub fn replace_params(&self, subst: &Substitution) -> Result<TypeArguments, ModelError> {
        self.0
            .iter()
            .map(|arg| arg.replace_params(subst))
            .collect::<Result<Vec<_>, _>>()
            .map(TypeArguments)
    }
}

impl fmt::Display for TypeArguments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return Ok(());
        }
        f.write_str("<")?;
        for (idx, arg) in self.0.iter().enumerate() {
            if idx > 0 {
                f.write_str(", ")?;
            }
            arg.fmt(f)?;
        }
        f.write_str(">")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeParameter {
    pub name: String,
    pub bounds: Vec<Type>,
}

impl TypeParameter {
    pub fn new(name: impl Into<String>, bounds: Vec<Type>) -> Self {
        Self {
            name: name.into(),
            bounds,
        }
    }

    /// A copy with a different name and the same bounds.
    #[must_use]
    pub fn rename(&self, name: impl Into<String>) -> TypeParameter {
        TypeParameter {
            name: name.into(),
            bounds: self.bounds.clone(),
        }
    }

    pub fn replace_params(&self, subst: &Substitution) -> Result<TypeParameter, ModelError> {
        Ok(TypeParameter {
            name: self.name.clone(),
            bounds: self
                .bounds
                .iter()
                .map(|b| b.replace_params(subst))
                .collect::<Result<_, _>>()?,
        })
    }
}

impl fmt::Display for TypeParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        for (idx, bound) in self.bounds.iter().enumerate() {
            f.write_str(if idx == 0 { " extends " } else { " & " })?;
            bound.fmt(f)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct TypeParameters(Vec<TypeParameter>);

impl TypeParameters {
    pub fn new(params: Vec<TypeParameter>) -> Self {
        Self(params)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TypeParameter> {
        self.0.iter()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|p| p.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|p| p.name.as_str())
    }

    /// The parameters used as arguments, e.g. `<K, V>` becomes `<K, V>` on `Map<K, V>`.
    pub fn as_arguments(&self) -> TypeArguments {
        TypeArguments(
            self.0
                .iter()
                .map(|p| TypeArgument::Type(Type::named(p.name.clone())))
                .collect(),
        )
    }

    /// Bind these parameters positionally to `args`. Raw usage (no arguments) leaves every
    /// parameter unresolved.
    pub fn bind(&self, owner: &str, args: &TypeArguments) -> Result<Substitution, ModelError> {
        let mut subst = Substitution::unresolved(self.names());
        if args.is_empty() {
            return Ok(subst);
        }
        if args.len() != self.0.len() {
            return Err(ModelError::ArityMismatch {
                name: owner.to_string(),
                expected: self.0.len(),
                found: args.len(),
            });
        }
        for (param, arg) in self.0.iter().zip(args.iter()) {
            subst.set(&param.name, arg.clone());
        }
        Ok(subst)
    }

    pub fn replace_params(&self, subst: &Substitution) -> Result<TypeParameters, ModelError> {
        self.0
            .iter()
            .map(|p| p.replace_params(subst))
            .collect::<Result<Vec<_>, _>>()
            .map(TypeParameters)
    }
}

impl FromIterator<TypeParameter> for TypeParameters {
    fn from_iter<I: IntoIterator<Item = TypeParameter>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for TypeParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return Ok(());
        }
        f.write_str("<")?;
        for (idx, param) in self.0.iter().enumerate() {
            if idx > 0 {
                f.write_str(", ")?;
            }
            param.fmt(f)?;
        }
        f.write_str(">")
    }
}

/// A `name -> type argument` mapping. A key mapped to `None` is a known parameter that has not
/// been resolved (yet).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Substitution {
    entries: BTreeMap<String, Option<TypeArgument>>,
}

impl Substitution {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every name in `names` present and unresolved.
    pub fn unresolved<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            entries: names.into_iter().map(|n| (n.to_string(), None)).collect(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn set(&mut self, name: &str, value: TypeArgument) {
        self.entries.insert(name.to_string(), Some(value));
    }

    /// The raw entry for `name`: `None` when absent, `Some(None)` when unresolved.
    pub fn get(&self, name: &str) -> Option<Option<&TypeArgument>> {
        self.entries.get(name).map(Option::as_ref)
    }

    /// Like [`Substitution::get`] but follows a binding to a captured wildcard.
    pub fn lookup(&self, name: &str) -> Option<Option<TypeArgument>> {
        let entry = self.entries.get(name)?;
        let Some(value) = entry else {
            return Some(None);
        };
        if let TypeArgument::Type(ty) = value {
            if ty.name.starts_with(CAPTURE_PREFIX) && ty.args.is_empty() && ty.dims == 0 {
                if let Some(Some(captured)) = self.entries.get(&ty.name) {
                    return Some(Some(captured.clone()));
                }
            }
        }
        Some(Some(value.clone()))
    }

    /// Entries for ordinary parameters (capture pseudo-parameters are skipped).
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&TypeArgument>)> {
        self.entries
            .iter()
            .filter(|(name, _)| !name.starts_with(CAPTURE_PREFIX))
            .map(|(name, value)| (name.as_str(), value.as_ref()))
    }

    pub fn is_fully_resolved(&self) -> bool {
        self.entries.values().all(Option::is_some)
    }
}

impl fmt::Display for Substitution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (idx, (name, value)) in self.entries.iter().enumerate() {
            if idx > 0 {
                f.write_str(", ")?;
            }
            match value {
                Some(value) => write!(f, "{name} := {value}")?,
                None => write!(f, "{name} := _")?,
            }
        }
        f.write_str("}")
    }
}
