//! Methods, formal parameters and the per-kind access policy.

use std::collections::BTreeSet;
use std::fmt;

use symgen_core::{ModelError, SourceRef};
use symgen_types::{Substitution, Type, TypeParameter, TypeParameters};

use crate::{Model, TypeDefinition};

/// Canonical modifier order used when rendering declarations.
const MODIFIER_ORDER: &[&str] = &[
    "abstract",
    "static",
    "final",
    "transient",
    "volatile",
    "synchronized",
    "native",
    "strictfp",
    "default",
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Access {
    Public,
    Protected,
    Private,
    #[default]
    Package,
}

impl Access {
    pub fn from_modifier(modifier: &str) -> Option<Access> {
        match modifier {
            "public" => Some(Access::Public),
            "protected" => Some(Access::Protected),
            "private" => Some(Access::Private),
            _ => None,
        }
    }

    pub fn keyword(self) -> Option<&'static str> {
        match self {
            Access::Public => Some("public"),
            Access::Protected => Some("protected"),
            Access::Private => Some("private"),
            Access::Package => None,
        }
    }
}

/// The three definition variants. The access and abstractness policy of each variant lives
/// here so that methods can apply it without holding a reference to their owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DefinitionKind {
    Interface,
    Class,
    AnonymousClass,
}

impl DefinitionKind {
    /// Access an inherited method takes when materialised on an owner of this kind.
    pub fn inherited_access(self, source: &MethodDefinition) -> Access {
        match self {
            DefinitionKind::Interface => source.access,
            DefinitionKind::Class if source.is_public => Access::Public,
            DefinitionKind::Class => source.access,
            DefinitionKind::AnonymousClass => Access::Public,
        }
    }

    /// Modifiers an inherited method takes when materialised on an owner of this kind.
    pub fn inherited_modifiers(self, source: &MethodDefinition) -> BTreeSet<String> {
        let mut modifiers = source.modifiers.clone();
        match self {
            DefinitionKind::Interface => {}
            DefinitionKind::Class | DefinitionKind::AnonymousClass => {
                modifiers.remove("default");
                if source.is_abstract {
                    modifiers.insert("abstract".to_string());
                }
            }
        }
        modifiers
    }

    pub fn is_abstract(self, modifiers: &BTreeSet<String>) -> bool {
        match self {
            DefinitionKind::Interface => true,
            DefinitionKind::Class | DefinitionKind::AnonymousClass => {
                modifiers.contains("abstract")
            }
        }
    }

    pub fn is_public(self, access: Access) -> bool {
        match self {
            DefinitionKind::Interface | DefinitionKind::AnonymousClass => true,
            DefinitionKind::Class => access == Access::Public,
        }
    }
}

impl fmt::Display for DefinitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DefinitionKind::Interface => "interface",
            DefinitionKind::Class => "class",
            DefinitionKind::AnonymousClass => "anonymous class",
        })
    }
}

/// What a method needs to know about the definition that owns it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OwnerInfo {
    pub name: String,
    pub kind: DefinitionKind,
    pub type_params: Vec<String>,
}

impl OwnerInfo {
    pub fn new(name: impl Into<String>, kind: DefinitionKind) -> Self {
        Self {
            name: name.into(),
            kind,
            type_params: Vec::new(),
        }
    }

    /// The owner's own type, e.g. `Map<K, V>`.
    pub fn self_type(&self) -> Type {
        Type::generic(
            self.name.clone(),
            self.type_params
                .iter()
                .map(|name| Type::named(name.clone()).into())
                .collect(),
        )
    }

    fn type_parameters(&self) -> TypeParameters {
        self.type_params
            .iter()
            .map(|name| TypeParameter::new(name.clone(), Vec::new()))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum MethodState {
    /// Declared in source or synthesized with its final shape.
    #[default]
    Declared,
    /// Inherited stub materialised on a subtype, not declared there.
    Placeholder,
    /// A placeholder surfaced as an abstract declaration of its owner.
    DeclaredAbstract,
    /// A placeholder that received a synthesized body.
    Implemented,
}

impl fmt::Display for MethodState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MethodState::Declared => "declared",
            MethodState::Placeholder => "placeholder",
            MethodState::DeclaredAbstract => "declared-abstract",
            MethodState::Implemented => "implemented",
        })
    }
}

/// A static method that provides the body of an interface method: implementations call
/// `utility.method(this, args...)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Delegate {
    pub utility: String,
    pub method: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormalParameter {
    pub ty: Type,
    pub name: String,
    pub modifiers: BTreeSet<String>,
    pub variadic: bool,
}

impl FormalParameter {
    pub fn new(ty: Type, name: impl Into<String>) -> Self {
        Self {
            ty,
            name: name.into(),
            modifiers: BTreeSet::new(),
            variadic: false,
        }
    }

    #[must_use]
    pub fn with_modifier(mut self, modifier: impl Into<String>) -> Self {
        self.modifiers.insert(modifier.into());
        self
    }

    #[must_use]
    pub fn variadic(mut self) -> Self {
        self.variadic = true;
        self
    }

    /// The parameter's type as seen by callers: variadic parameters are arrays.
    pub fn param_type(&self) -> Type {
        if self.variadic {
            self.ty.array_of(1)
        } else {
            self.ty.clone()
        }
    }

    pub fn replace_params(&self, subst: &Substitution) -> Result<FormalParameter, ModelError> {
        Ok(FormalParameter {
            ty: self.ty.replace_params(subst)?,
            ..self.clone()
        })
    }
}

impl fmt::Display for FormalParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for modifier in &self.modifiers {
            write!(f, "{modifier} ")?;
        }
        write!(f, "{}", self.ty)?;
        if self.variadic {
            f.write_str("...")?;
        }
        write!(f, " {}", self.name)
    }
}

/// Fields and other non-method members, kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtherDeclaration {
    pub comment: String,
    pub text: String,
    pub source: SourceRef,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDefinition {
    /// Documentation text without comment delimiters.
    pub comment: String,
    pub access: Access,
    pub modifiers: BTreeSet<String>,
    pub type_params: TypeParameters,
    pub result_type: Type,
    pub name: String,
    pub params: Vec<FormalParameter>,
    pub throws: BTreeSet<Type>,
    /// Body statements without the enclosing braces.
    pub body: Option<String>,
    pub owner: OwnerInfo,
    /// Name of the definition that originally declared this method.
    pub origin: String,
    pub is_public: bool,
    pub is_abstract: bool,
    pub state: MethodState,
    pub delegate: Option<Delegate>,
    pub source: SourceRef,
}

impl MethodDefinition {
    pub fn new(
        owner: OwnerInfo,
        name: impl Into<String>,
        result_type: Type,
        params: Vec<FormalParameter>,
    ) -> Self {
        let mut method = Self {
            comment: String::new(),
            access: Access::Package,
            modifiers: BTreeSet::new(),
            type_params: TypeParameters::default(),
            result_type,
            name: name.into(),
            params,
            throws: BTreeSet::new(),
            body: None,
            origin: owner.name.clone(),
            owner,
            is_public: false,
            is_abstract: false,
            state: MethodState::Declared,
            delegate: None,
            source: SourceRef::default(),
        };
        method.refresh_policy();
        method
    }

    /// Set the access and the other modifiers from a flat modifier list.
    #[must_use]
    pub fn with_modifiers<'a>(mut self, modifiers: impl IntoIterator<Item = &'a str>) -> Self {
        self.access = Access::Package;
        self.modifiers.clear();
        for modifier in modifiers {
            match Access::from_modifier(modifier) {
                Some(access) => self.access = access,
                None => {
                    self.modifiers.insert(modifier.to_string());
                }
            }
        }
        self.refresh_policy();
        self
    }

    #[must_use]
    pub fn with_type_params(mut self, type_params: TypeParameters) -> Self {
        self.type_params = type_params;
        self
    }

    #[must_use]
    pub fn with_throws(mut self, throws: impl IntoIterator<Item = Type>) -> Self {
        self.throws = throws.into_iter().collect();
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    #[must_use]
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    #[must_use]
    pub fn with_delegate(mut self, delegate: Delegate) -> Self {
        self.delegate = Some(delegate);
        self
    }

    #[must_use]
    pub fn at(mut self, source: SourceRef) -> Self {
        self.source = source;
        self
    }

    /// Move the method to another owner, recomputing the policy flags.
    pub fn reown(&mut self, owner: OwnerInfo) {
        if self.origin == self.owner.name {
            self.origin = owner.name.clone();
        }
        self.owner = owner;
        self.refresh_policy();
    }

    fn refresh_policy(&mut self) {
        self.is_public = self.owner.kind.is_public(self.access);
        self.is_abstract = self.owner.kind.is_abstract(&self.modifiers);
    }

    pub fn is_static(&self) -> bool {
        self.modifiers.contains("static")
    }

    pub fn is_void(&self) -> bool {
        self.result_type.is_void()
    }

    /// An inherited stub that still needs a body or an abstract declaration.
    pub fn is_placeholder_abstract(&self) -> bool {
        self.state == MethodState::Placeholder && self.is_abstract
    }

    fn is_type_param(&self, name: &str) -> bool {
        self.type_params.contains(name) || self.owner.type_params.iter().any(|p| p == name)
    }

    /// `name(Erased1,Erased2)`: type parameters of the method or its owner erase to `Object`.
    pub fn signature(&self) -> String {
        self.signature_from(0)
    }

    /// The signature without the first parameter.
    pub fn reduced_signature(&self) -> String {
        self.signature_from(1)
    }

    fn signature_from(&self, skip: usize) -> String {
        let erased: Vec<String> = self
            .params
            .iter()
            .skip(skip)
            .map(|p| p.param_type().erasure(|name| self.is_type_param(name)))
            .collect();
        format!("{}({})", self.name, erased.join(","))
    }

    /// `Owner.name(Erased..)`, for diagnostics.
    pub fn qualified_signature(&self) -> String {
        format!("{}.{}", self.owner.name, self.signature())
    }

    /// The stub this method becomes when inherited by `target`.
    ///
    /// The owner's type parameters are mapped through `target`'s ancestor type for the owner.
    /// Method type parameters that collide with `target`'s own are renamed.
    pub fn override_for(
        &self,
        target: &TypeDefinition,
        model: &Model,
    ) -> Result<MethodDefinition, ModelError> {
        let ancestor = if target.name == self.owner.name {
            target.self_type()
        } else {
            target
                .find_ancestor(&self.owner.name, model)?
                .ok_or_else(|| ModelError::UnknownType {
                    name: self.owner.name.clone(),
                    context: format!("ancestors of {}", target.name),
                })?
        };

        let owner_params = self.owner.type_parameters();
        let mut subst = if ancestor.type_arguments().is_empty() && !owner_params.is_empty() {
            // Raw inheritance erases the owner's parameters.
            let mut raw = Substitution::unresolved(owner_params.names());
            for name in owner_params.names() {
                raw.set(name, Type::object().into());
            }
            raw
        } else {
            owner_params.infer_type_arguments(&self.owner.self_type(), &ancestor)?
        };

        let mut type_params = Vec::with_capacity(self.type_params.len());
        for param in self.type_params.iter() {
            let name = if target.type_params.contains(&param.name) {
                fresh_name(&param.name, |candidate| {
                    target.type_params.contains(candidate) || self.type_params.contains(candidate)
                })
            } else {
                param.name.clone()
            };
            subst.set(&param.name, Type::named(name.clone()).into());
            type_params.push(param.rename(name));
        }

        let kind = target.kind();
        let access = kind.inherited_access(self);
        let modifiers = kind.inherited_modifiers(self);
        Ok(MethodDefinition {
            comment: self.comment.clone(),
            access,
            is_public: kind.is_public(access),
            is_abstract: kind.is_abstract(&modifiers),
            modifiers,
            type_params: TypeParameters::new(type_params).replace_params(&subst)?,
            result_type: self.result_type.replace_params(&subst)?,
            name: self.name.clone(),
            params: self
                .params
                .iter()
                .map(|p| p.replace_params(&subst))
                .collect::<Result<_, _>>()?,
            throws: self
                .throws
                .iter()
                .map(|t| t.replace_params(&subst))
                .collect::<Result<_, _>>()?,
            body: None,
            owner: target.owner_info(),
            origin: self.origin.clone(),
            state: MethodState::Placeholder,
            delegate: self.delegate.clone(),
            source: self.source.clone(),
        })
    }

    /// Do both methods declare the same contract?
    ///
    /// Signatures must be equal; after renaming `other`'s type parameters onto ours the result,
    /// parameter and thrown types must be equal too. Parameter names do not matter.
    pub fn matches(&self, other: &MethodDefinition) -> bool {
        if self.signature() != other.signature()
            || self.type_params.len() != other.type_params.len()
            || self.params.len() != other.params.len()
            || self.throws.len() != other.throws.len()
        {
            return false;
        }

        let mut rename = Substitution::unresolved(other.type_params.names());
        for (mine, theirs) in self.type_params.iter().zip(other.type_params.iter()) {
            rename.set(&theirs.name, Type::named(mine.name.clone()).into());
        }
        let same = |mine: &Type, theirs: &Type| {
            theirs
                .replace_params(&rename)
                .is_ok_and(|theirs| *mine == theirs)
        };

        same(&self.result_type, &other.result_type)
            && self
                .params
                .iter()
                .zip(&other.params)
                .all(|(a, b)| same(&a.param_type(), &b.param_type()))
            && other.throws.iter().all(|theirs| {
                theirs
                    .replace_params(&rename)
                    .is_ok_and(|theirs| self.throws.contains(&theirs))
            })
    }

    /// Give an abstract placeholder a body.
    pub fn implement(&mut self, body: impl Into<String>) -> Result<(), ModelError> {
        self.check_placeholder("implement")?;
        self.body = Some(body.into());
        self.modifiers.remove("abstract");
        self.is_abstract = false;
        self.state = MethodState::Implemented;
        Ok(())
    }

    /// Surface an abstract placeholder as an abstract declaration of its owner.
    pub fn declare_abstract(&mut self) -> Result<(), ModelError> {
        self.check_placeholder("declare abstract")?;
        if self.owner.kind != DefinitionKind::Interface {
            self.modifiers.insert("abstract".to_string());
        }
        self.state = MethodState::DeclaredAbstract;
        Ok(())
    }

    fn check_placeholder(&self, action: &str) -> Result<(), ModelError> {
        if self.is_placeholder_abstract() {
            return Ok(());
        }
        let what = if self.is_abstract {
            format!("a {} method", self.state)
        } else {
            format!("a concrete {} method", self.state)
        };
        Err(ModelError::IllegalTransition {
            method: self.qualified_signature(),
            reason: format!("cannot {action} {what}"),
        })
    }

    /// `[return ]callee(receiver, args..);` forwarding every parameter of this method.
    pub fn forward(&self, callee: &str, receiver: Option<&str>) -> String {
        let args: Vec<&str> = receiver
            .into_iter()
            .chain(self.params.iter().map(|p| p.name.as_str()))
            .collect();
        let keyword = if self.is_void() { "" } else { "return " };
        format!("{keyword}{callee}({});", args.join(", "))
    }

    /// The declaration line: modifiers, type parameters, result, name, parameters, throws.
    pub fn declaration(&self) -> String {
        let mut words: Vec<String> = Vec::new();
        if let Some(keyword) = self.access.keyword() {
            words.push(keyword.to_string());
        }
        words.extend(ordered_modifiers(&self.modifiers));
        if !self.type_params.is_empty() {
            words.push(self.type_params.to_string());
        }
        words.push(self.result_type.to_string());

        let params: Vec<String> = self.params.iter().map(ToString::to_string).collect();
        let mut out = format!("{} {}({})", words.join(" "), self.name, params.join(", "));
        if !self.throws.is_empty() {
            let throws: Vec<String> = self.throws.iter().map(ToString::to_string).collect();
            out.push_str(" throws ");
            out.push_str(&throws.join(", "));
        }
        out
    }

    /// Documentation, declaration and either `body` in braces or a terminating `;`.
    pub fn render(&self, body: Option<&str>) -> String {
        let mut out = render_doc(&self.comment);
        out.push_str(&self.declaration());
        match body {
            Some(body) => {
                out.push_str(" {\n");
                out.push_str(&indent(body, 4));
                out.push_str("\n}");
            }
            None => out.push(';'),
        }
        out
    }
}

pub(crate) fn ordered_modifiers(modifiers: &BTreeSet<String>) -> Vec<String> {
    let mut out: Vec<String> = MODIFIER_ORDER
        .iter()
        .filter(|m| modifiers.contains(**m))
        .map(|m| m.to_string())
        .collect();
    out.extend(
        modifiers
            .iter()
            .filter(|m| !MODIFIER_ORDER.contains(&m.as_str()))
            .cloned(),
    );
    out
}

/// `/** ... */` block for `comment`, or nothing when it is empty.
pub fn render_doc(comment: &str) -> String {
    if comment.trim().is_empty() {
        return String::new();
    }
    let mut out = String::from("/**\n");
    for line in comment.lines() {
        if line.is_empty() {
            out.push_str(" *\n");
        } else {
            out.push_str(" * ");
            out.push_str(line);
            out.push('\n');
        }
    }
    out.push_str(" */\n");
    out
}

pub(crate) fn indent(text: &str, width: usize) -> String {
    let pad = " ".repeat(width);
    text.lines()
        .map(|line| {
            if line.is_empty() {
                String::new()
            } else {
                format!("{pad}{line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// `base1`, `base2`, ... : the first candidate `taken` rejects.
pub fn fresh_name(base: &str, taken: impl Fn(&str) -> bool) -> String {
    (1..)
        .map(|n| format!("{base}{n}"))
        .find(|candidate| !taken(candidate))
        .unwrap_or_else(|| base.to_string())
}
