use std::collections::BTreeSet;

use indexmap::map::Entry;
use indexmap::{IndexMap, IndexSet};
use symgen_core::{ModelError, SourceRef};
use symgen_types::{Type, TypeParameters};

use crate::member::{ordered_modifiers, render_doc};
use crate::{Access, DefinitionKind, MethodDefinition, Model, OtherDeclaration, OwnerInfo};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InterfaceData {
    pub extends: Vec<Type>,
    /// Archetype kind, when the interface is tagged with one.
    pub archetype: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassData {
    pub extends: Option<Type>,
    pub implements: Vec<Type>,
    /// How interfaces gained through implicit conversions were reached, keyed by interface name.
    pub conversions: IndexMap<String, ConversionPath>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnonymousData {
    pub extends: Type,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Variant {
    Interface(InterfaceData),
    Class(ClassData),
    Anonymous(AnonymousData),
}

/// An interface a class gained through an implicit conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionPath {
    /// The ancestor the conversion was applied to.
    pub via: Type,
    /// The interface gained.
    pub to: Type,
    /// Name of the conversion method on the utility class.
    pub conversion: String,
    /// Number of conversion hops from the class' own interfaces.
    pub distance: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDefinition {
    pub name: String,
    pub access: Access,
    pub modifiers: BTreeSet<String>,
    pub type_params: TypeParameters,
    methods: IndexMap<String, MethodDefinition>,
    pub other_declarations: Vec<OtherDeclaration>,
    pub imports: BTreeSet<String>,
    /// Documentation text without comment delimiters.
    pub comment: String,
    pub source: SourceRef,
    pub variant: Variant,
}

impl TypeDefinition {
    pub fn new(name: impl Into<String>, variant: Variant) -> Self {
        Self {
            name: name.into(),
            access: Access::Package,
            modifiers: BTreeSet::new(),
            type_params: TypeParameters::default(),
            methods: IndexMap::new(),
            other_declarations: Vec::new(),
            imports: BTreeSet::new(),
            comment: String::new(),
            source: SourceRef::default(),
            variant,
        }
    }

    pub fn interface(name: impl Into<String>) -> Self {
        Self::new(name, Variant::Interface(InterfaceData::default()))
    }

    pub fn class(name: impl Into<String>) -> Self {
        Self::new(name, Variant::Class(ClassData::default()))
    }

    pub fn anonymous(name: impl Into<String>, extends: Type) -> Self {
        let mut def = Self::new(name, Variant::Anonymous(AnonymousData { extends }));
        def.access = Access::Public;
        def
    }

    #[must_use]
    pub fn with_type_params(mut self, type_params: TypeParameters) -> Self {
        self.type_params = type_params;
        self
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
        self
    }

    /// Add an extended type: another interface for interfaces, the superclass for classes.
    #[must_use]
    pub fn extending(mut self, ty: Type) -> Self {
        match &mut self.variant {
            Variant::Interface(data) => data.extends.push(ty),
            Variant::Class(data) => data.extends = Some(ty),
            Variant::Anonymous(data) => data.extends = ty,
        }
        self
    }

    /// Add an implemented interface. Interfaces extend it instead.
    #[must_use]
    pub fn implementing(mut self, ty: Type) -> Self {
        match &mut self.variant {
            Variant::Interface(data) => data.extends.push(ty),
            Variant::Class(data) => data.implements.push(ty),
            Variant::Anonymous(data) => data.extends = ty,
        }
        self
    }

    #[must_use]
    pub fn with_archetype(mut self, kind: impl Into<String>) -> Self {
        if let Variant::Interface(data) = &mut self.variant {
            data.archetype = Some(kind.into());
        }
        self
    }

    #[must_use]
    pub fn with_method(mut self, method: MethodDefinition) -> Self {
        let mut method = method;
        method.reown(self.owner_info());
        self.methods.insert(method.signature(), method);
        self
    }

    pub fn kind(&self) -> DefinitionKind {
        match self.variant {
            Variant::Interface(_) => DefinitionKind::Interface,
            Variant::Class(_) => DefinitionKind::Class,
            Variant::Anonymous(_) => DefinitionKind::AnonymousClass,
        }
    }

    pub fn is_interface(&self) -> bool {
        matches!(self.variant, Variant::Interface(_))
    }

    pub fn is_class(&self) -> bool {
        matches!(self.variant, Variant::Class(_))
    }

    pub fn is_abstract(&self) -> bool {
        match self.variant {
            Variant::Interface(_) => true,
            Variant::Class(_) => self.modifiers.contains("abstract"),
            Variant::Anonymous(_) => false,
        }
    }

    pub fn archetype(&self) -> Option<&str> {
        match &self.variant {
            Variant::Interface(data) => data.archetype.as_deref(),
            _ => None,
        }
    }

    pub fn class_data(&self) -> Option<&ClassData> {
        match &self.variant {
            Variant::Class(data) => Some(data),
            _ => None,
        }
    }

    pub fn class_data_mut(&mut self) -> Option<&mut ClassData> {
        match &mut self.variant {
            Variant::Class(data) => Some(data),
            _ => None,
        }
    }

    pub fn owner_info(&self) -> OwnerInfo {
        OwnerInfo {
            name: self.name.clone(),
            kind: self.kind(),
            type_params: self.type_params.names().map(str::to_string).collect(),
        }
    }

    /// The definition's own type, e.g. `Map<K, V>`.
    pub fn self_type(&self) -> Type {
        Type::generic(self.name.clone(), self.type_params.as_arguments().iter().cloned().collect())
    }

    /// Extended class first, then implemented or extended interfaces, in declaration order.
    pub fn direct_supertypes(&self) -> Vec<&Type> {
        match &self.variant {
            Variant::Interface(data) => data.extends.iter().collect(),
            Variant::Class(data) => data.extends.iter().chain(&data.implements).collect(),
            Variant::Anonymous(data) => vec![&data.extends],
        }
    }

    /// Every ancestor type, expressed in this definition's type-parameter frame.
    ///
    /// Fails when an ancestor is not registered in `model` or inheritance is cyclic.
    pub fn get_all_ancestors(&self, model: &Model) -> Result<IndexSet<Type>, ModelError> {
        let mut visiting = vec![self.name.clone()];
        self.collect_ancestors(model, &mut visiting)
    }

    fn collect_ancestors(
        &self,
        model: &Model,
        visiting: &mut Vec<String>,
    ) -> Result<IndexSet<Type>, ModelError> {
        let mut out = IndexSet::new();
        for parent in self.direct_supertypes() {
            let def = model.require(parent.simple_name(), &self.name)?;
            if visiting.contains(&def.name) {
                let mut members = visiting.clone();
                members.push(def.name.clone());
                return Err(ModelError::Cycle { members });
            }
            visiting.push(def.name.clone());
            let inherited = def.collect_ancestors(model, visiting)?;
            visiting.pop();

            let subst = def.type_params.bind(&def.name, parent.type_arguments())?;
            out.insert(parent.clone());
            for ancestor in inherited {
                out.insert(ancestor.replace_params(&subst)?);
            }
        }
        Ok(out)
    }

    /// The ancestor type named `name`, if this definition inherits from it.
    pub fn find_ancestor(&self, name: &str, model: &Model) -> Result<Option<Type>, ModelError> {
        Ok(self
            .get_all_ancestors(model)?
            .into_iter()
            .find(|ancestor| ancestor.simple_name() == name))
    }

    pub fn methods(&self) -> impl Iterator<Item = &MethodDefinition> {
        self.methods.values()
    }

    pub fn method(&self, signature: &str) -> Option<&MethodDefinition> {
        self.methods.get(signature)
    }

    pub fn method_mut(&mut self, signature: &str) -> Option<&mut MethodDefinition> {
        self.methods.get_mut(signature)
    }

    pub fn has_method(&self, signature: &str) -> bool {
        self.methods.contains_key(signature)
    }

    /// Declare `method` on this definition. Signatures are unique per definition.
    pub fn add_method(&mut self, mut method: MethodDefinition) -> Result<(), ModelError> {
        method.reown(self.owner_info());
        match self.methods.entry(method.signature()) {
            Entry::Occupied(slot) => Err(ModelError::DuplicateMethod {
                owner: self.name.clone(),
                signature: slot.key().clone(),
            }),
            Entry::Vacant(slot) => {
                slot.insert(method);
                Ok(())
            }
        }
    }

    /// Declared methods plus stubs for everything inherited, keyed by signature.
    pub fn all_methods(
        &self,
        model: &Model,
    ) -> Result<IndexMap<String, MethodDefinition>, ModelError> {
        let mut map = self.methods.clone();
        for parent in self.direct_supertypes() {
            self.add_inherited_methods_to_map(model, &mut map, parent)?;
        }
        Ok(map)
    }

    /// Add the stubs of every non-private instance method of `parent` that `map` does not
    /// already declare. A method already present under the same signature must match the
    /// inherited one, otherwise the two declarations clash.
    pub fn add_inherited_methods_to_map(
        &self,
        model: &Model,
        map: &mut IndexMap<String, MethodDefinition>,
        parent: &Type,
    ) -> Result<(), ModelError> {
        let def = model.require(parent.simple_name(), &self.name)?;
        for method in def.all_methods(model)?.into_values() {
            if method.access == Access::Private || method.is_static() {
                continue;
            }
            let stub = method.override_for(self, model)?;
            match map.entry(stub.signature()) {
                Entry::Vacant(slot) => {
                    slot.insert(stub);
                }
                Entry::Occupied(slot) => {
                    let existing = slot.get();
                    if !existing.matches(&stub) {
                        return Err(ModelError::NameClash {
                            owner: self.name.clone(),
                            signature: slot.key().clone(),
                            first: format!("{} in {}", existing.declaration(), existing.origin),
                            second: format!("{} in {}", stub.declaration(), stub.origin),
                        });
                    }
                }
            }
        }
        Ok(())
    }

    /// Add an implemented interface to a class. Returns `false` when it is already declared or
    /// this is not a class.
    pub fn add_interface(&mut self, ty: Type) -> bool {
        let Some(data) = self.class_data_mut() else {
            return false;
        };
        if data.implements.iter().any(|t| t.simple_name() == ty.simple_name()) {
            return false;
        }
        data.implements.push(ty);
        true
    }

    /// Directly implemented interfaces that are also inherited through another direct
    /// supertype.
    pub fn redundant_interfaces(&self, model: &Model) -> Result<Vec<Type>, ModelError> {
        let Some(data) = self.class_data() else {
            return Ok(Vec::new());
        };
        let supertypes = self.direct_supertypes();
        let mut reachable: Vec<(usize, IndexSet<String>)> = Vec::with_capacity(supertypes.len());
        for (idx, ty) in supertypes.iter().enumerate() {
            let def = model.require(ty.simple_name(), &self.name)?;
            let names = def
                .get_all_ancestors(model)?
                .iter()
                .map(|t| t.simple_name().to_string())
                .collect();
            reachable.push((idx, names));
        }

        let offset = usize::from(data.extends.is_some());
        Ok(data
            .implements
            .iter()
            .enumerate()
            .filter(|(i, iface)| {
                reachable
                    .iter()
                    .any(|(idx, names)| *idx != i + offset && names.contains(iface.simple_name()))
            })
            .map(|(_, iface)| iface.clone())
            .collect())
    }

    /// Drop directly implemented interfaces by name.
    pub fn remove_interfaces(&mut self, names: &[&str]) {
        if let Some(data) = self.class_data_mut() {
            data.implements.retain(|t| !names.contains(&t.simple_name()));
        }
    }

    pub fn conversion_path(&self, interface: &str) -> Option<&ConversionPath> {
        self.class_data()?.conversions.get(interface)
    }

    /// Conversion hops to reach `interface`; `0` when it is not reached through a conversion.
    pub fn distance_to(&self, interface: &str) -> u32 {
        self.conversion_path(interface).map_or(0, |path| path.distance)
    }

    /// `public abstract class Circle<T> extends Base implements Shape`, without the body.
    pub fn header(&self) -> String {
        let mut words: Vec<String> = Vec::new();
        if let Some(keyword) = self.access.keyword() {
            words.push(keyword.to_string());
        }
        words.extend(ordered_modifiers(&self.modifiers));
        let keyword = if self.is_interface() { "interface" } else { "class" };
        words.push(keyword.to_string());
        words.push(format!("{}{}", self.name, self.type_params));

        let list = |types: &[&Type]| {
            types
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        };
        match &self.variant {
            Variant::Interface(data) if !data.extends.is_empty() => {
                words.push(format!("extends {}", list(&data.extends.iter().collect::<Vec<_>>())));
            }
            Variant::Class(data) => {
                if let Some(parent) = &data.extends {
                    words.push(format!("extends {parent}"));
                }
                if !data.implements.is_empty() {
                    let implements: Vec<&Type> = data.implements.iter().collect();
                    words.push(format!("implements {}", list(&implements)));
                }
            }
            Variant::Anonymous(data) => words.push(format!("extends {}", data.extends)),
            Variant::Interface(_) => {}
        }
        format!("{}{}", render_doc(&self.comment), words.join(" "))
    }
}
