use std::collections::{BTreeMap, HashMap};

use indexmap::IndexMap;
use symgen_core::graph::topological_sort;
use symgen_core::ModelError;
use symgen_types::{Type, TypeParameters};

use crate::member::indent;
use crate::{MethodDefinition, TypeDefinition, Variant};

/// A value of shape `from` converts to `to` through `method`, a static method of the utility
/// class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImplicitConversion {
    pub type_params: TypeParameters,
    pub from: Type,
    pub to: Type,
    pub method: MethodDefinition,
}

/// The registry: every definition by name plus the bookkeeping the resolution stages share.
#[derive(Debug, Clone)]
pub struct Model {
    definitions: IndexMap<String, TypeDefinition>,
    /// Upper-cased name -> registered name.
    folded_names: HashMap<String, String>,
    anonymous: IndexMap<String, TypeDefinition>,
    next_anonymous: u32,
    /// `Owner#signature` of a factory method -> the anonymous class it instantiates.
    factories: HashMap<String, String>,
    conversions: Vec<ImplicitConversion>,
    /// Signatures of explicit methods on the utility class, in registration order.
    explicit: Vec<String>,
    /// Reduced signature -> seen exactly once.
    unique: HashMap<String, bool>,
    /// Explicit method signature -> `Owner#name(Types)` of the members generated from it.
    promotions: HashMap<String, Vec<String>>,
    rules: BTreeMap<String, Vec<String>>,
    test_interfaces: Vec<TypeDefinition>,
    utility: String,
}

impl Model {
    /// An empty model whose static methods live on a `public final` class named `utility`.
    pub fn new(utility: impl Into<String>) -> Self {
        let utility = utility.into();
        let mut model = Self {
            definitions: IndexMap::new(),
            folded_names: HashMap::new(),
            anonymous: IndexMap::new(),
            next_anonymous: 0,
            factories: HashMap::new(),
            conversions: Vec::new(),
            explicit: Vec::new(),
            unique: HashMap::new(),
            promotions: HashMap::new(),
            rules: BTreeMap::new(),
            test_interfaces: Vec::new(),
            utility: utility.clone(),
        };
        let class = TypeDefinition::class(utility.clone()).with_modifiers(["public", "final"]);
        model.folded_names.insert(utility.to_uppercase(), utility.clone());
        model.definitions.insert(utility, class);
        model
    }

    /// Register an interface or class. Names must be unique, also when compared without case.
    pub fn add_definition(&mut self, def: TypeDefinition) -> Result<(), ModelError> {
        if matches!(def.variant, Variant::Anonymous(_)) {
            return Err(ModelError::Invalid(format!(
                "anonymous class {} must be registered with its factory",
                def.name
            )));
        }
        if self.definitions.contains_key(&def.name) {
            return Err(ModelError::DuplicateType { name: def.name });
        }
        let folded = def.name.to_uppercase();
        if let Some(existing) = self.folded_names.get(&folded) {
            return Err(ModelError::CaseInsensitiveClash {
                name: def.name,
                existing: existing.clone(),
            });
        }
        tracing::debug!(name = %def.name, kind = %def.kind(), "registered definition");
        self.folded_names.insert(folded, def.name.clone());
        self.definitions.insert(def.name.clone(), def);
        Ok(())
    }

    /// Look a definition up by name, anonymous classes included.
    pub fn get(&self, name: &str) -> Option<&TypeDefinition> {
        self.definitions
            .get(name)
            .or_else(|| self.anonymous.get(name))
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut TypeDefinition> {
        match self.definitions.get_mut(name) {
            Some(def) => Some(def),
            None => self.anonymous.get_mut(name),
        }
    }

    /// Like [`Model::get`], failing with `UnknownType` when `name` is not registered.
    pub fn require(&self, name: &str, context: &str) -> Result<&TypeDefinition, ModelError> {
        self.get(name).ok_or_else(|| ModelError::UnknownType {
            name: name.to_string(),
            context: context.to_string(),
        })
    }

    pub fn require_mut(
        &mut self,
        name: &str,
        context: &str,
    ) -> Result<&mut TypeDefinition, ModelError> {
        self.get_mut(name).ok_or_else(|| ModelError::UnknownType {
            name: name.to_string(),
            context: context.to_string(),
        })
    }

    pub fn definitions(&self) -> impl Iterator<Item = &TypeDefinition> {
        self.definitions.values()
    }

    pub fn interfaces(&self) -> impl Iterator<Item = &TypeDefinition> {
        self.definitions.values().filter(|def| def.is_interface())
    }

    /// Registered classes, the utility class included.
    pub fn classes(&self) -> impl Iterator<Item = &TypeDefinition> {
        self.definitions.values().filter(|def| def.is_class())
    }

    pub fn interface_names(&self) -> Vec<String> {
        self.interfaces().map(|def| def.name.clone()).collect()
    }

    pub fn class_names(&self) -> Vec<String> {
        self.classes().map(|def| def.name.clone()).collect()
    }

    /// Classes ordered so that a class comes after the class it extends. A superclass that is
    /// not a registered class does not constrain the order.
    pub fn get_sorted_classes(&self) -> Result<Vec<&TypeDefinition>, ModelError> {
        let names: Vec<&str> = self.classes().map(|def| def.name.as_str()).collect();
        let sorted = topological_sort(&names, |name| {
            self.definitions
                .get(*name)
                .and_then(TypeDefinition::class_data)
                .and_then(|data| data.extends.as_ref())
                .map(|parent| parent.simple_name())
        })
        .map_err(|members| ModelError::Cycle {
            members: members.into_iter().map(str::to_string).collect(),
        })?;
        Ok(sorted
            .into_iter()
            .filter_map(|name| self.definitions.get(name))
            .collect())
    }

    pub fn utility_name(&self) -> &str {
        &self.utility
    }

    pub fn utility(&self) -> Option<&TypeDefinition> {
        self.definitions.get(&self.utility)
    }

    pub fn utility_mut(&mut self) -> Result<&mut TypeDefinition, ModelError> {
        let name = self.utility.clone();
        self.require_mut(&name, "the model")
    }

    /// A fresh name for an anonymous class.
    pub fn next_anonymous_name(&mut self) -> String {
        self.next_anonymous += 1;
        format!("{}$Anonymous{}", self.utility, self.next_anonymous)
    }

    /// Register the anonymous class instantiated by `factory`.
    pub fn add_anonymous_class(
        &mut self,
        factory: &MethodDefinition,
        def: TypeDefinition,
    ) -> Result<(), ModelError> {
        if self.get(&def.name).is_some() {
            return Err(ModelError::DuplicateType { name: def.name });
        }
        self.factories
            .insert(factory_key(factory), def.name.clone());
        self.anonymous.insert(def.name.clone(), def);
        Ok(())
    }

    pub fn anonymous_classes(&self) -> impl Iterator<Item = &TypeDefinition> {
        self.anonymous.values()
    }

    pub fn anonymous_names(&self) -> Vec<String> {
        self.anonymous.keys().cloned().collect()
    }

    /// The anonymous class a factory method instantiates.
    pub fn anonymous_class_for(&self, factory: &MethodDefinition) -> Option<&TypeDefinition> {
        self.factories
            .get(&factory_key(factory))
            .and_then(|name| self.anonymous.get(name))
    }

    pub fn add_conversion(&mut self, conversion: ImplicitConversion) {
        tracing::debug!(
            from = %conversion.from,
            to = %conversion.to,
            method = %conversion.method.name,
            "registered implicit conversion"
        );
        self.conversions.push(conversion);
    }

    pub fn conversions(&self) -> &[ImplicitConversion] {
        &self.conversions
    }

    /// The signature of `method` without its first parameter.
    pub fn reduced_signature(method: &MethodDefinition) -> String {
        method.reduced_signature()
    }

    /// Declare `method` on the utility class as an explicit delegate candidate.
    ///
    /// The second explicit method with a given reduced signature marks that reduced signature
    /// ambiguous for good.
    pub fn add_explicit_method(&mut self, method: MethodDefinition) -> Result<(), ModelError> {
        let signature = method.signature();
        let reduced = method.reduced_signature();
        self.utility_mut()?.add_method(method)?;
        self.explicit.push(signature);
        self.unique
            .entry(reduced)
            .and_modify(|unique| *unique = false)
            .or_insert(true);
        Ok(())
    }

    /// Explicit methods in registration order.
    pub fn explicit_methods(&self) -> Vec<&MethodDefinition> {
        let Some(utility) = self.utility() else {
            return Vec::new();
        };
        self.explicit
            .iter()
            .filter_map(|signature| utility.method(signature))
            .collect()
    }

    /// Is `method` the only explicit method with its reduced signature?
    pub fn is_unambiguous(&self, method: &MethodDefinition) -> bool {
        self.unique.get(&method.reduced_signature()) == Some(&true)
    }

    /// Explicit methods sharing a reduced signature, grouped by it in registration order.
    pub fn ambiguous_groups(&self) -> IndexMap<String, Vec<&MethodDefinition>> {
        let mut groups: IndexMap<String, Vec<&MethodDefinition>> = IndexMap::new();
        for method in self.explicit_methods() {
            if !self.is_unambiguous(method) {
                groups
                    .entry(method.reduced_signature())
                    .or_default()
                    .push(method);
            }
        }
        groups
    }

    /// Remember that `member` on `owner` was generated from the explicit method `explicit`.
    pub fn record_promotion(
        &mut self,
        explicit: &MethodDefinition,
        owner: &str,
        member: &MethodDefinition,
    ) {
        let params: Vec<String> = member
            .params
            .iter()
            .map(|p| p.param_type().to_string())
            .collect();
        self.promotions
            .entry(explicit.signature())
            .or_default()
            .push(format!("{owner}#{}({})", member.name, params.join(", ")));
    }

    /// Members generated from the explicit method with `signature`.
    pub fn promotions_of(&self, signature: &str) -> &[String] {
        self.promotions
            .get(signature)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn add_rule(&mut self, target: impl Into<String>, text: impl Into<String>) {
        self.rules.entry(target.into()).or_default().push(text.into());
    }

    /// Grammar rules recorded for the type named `target`.
    pub fn rules_for(&self, target: &str) -> &[String] {
        self.rules
            .get(target)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn add_test_interface(&mut self, def: TypeDefinition) {
        self.test_interfaces.push(def);
    }

    pub fn test_interfaces(&self) -> &[TypeDefinition] {
        &self.test_interfaces
    }

    /// The body of `method`: its own, or for a factory the instantiation of its anonymous class
    /// as it currently stands.
    pub fn method_body(&self, method: &MethodDefinition) -> Option<String> {
        if let Some(body) = &method.body {
            return Some(body.clone());
        }
        let anonymous = self.anonymous_class_for(method)?;
        let Variant::Anonymous(data) = &anonymous.variant else {
            return None;
        };
        let members: Vec<String> = anonymous
            .methods()
            .map(|m| indent(&m.render(self.method_body(m).as_deref()), 4))
            .collect();
        Some(format!(
            "return new {}() {{\n{}\n}};",
            data.extends,
            members.join("\n\n")
        ))
    }

    /// Full source text of `method` as declared on its owner.
    pub fn render_method(&self, method: &MethodDefinition) -> String {
        let body = if method.is_abstract {
            None
        } else {
            self.method_body(method)
        };
        method.render(body.as_deref())
    }
}

fn factory_key(method: &MethodDefinition) -> String {
    format!("{}#{}", method.owner.name, method.signature())
}
