//! The semantic model: methods, type definitions and the registry that owns them.
//!
//! Definitions come in three variants ([`Variant`]): interfaces, classes and the anonymous
//! classes synthesized for production rules. All of them share the method-table machinery in
//! [`TypeDefinition`]; what differs per variant is the small access policy on
//! [`DefinitionKind`].
//!
//! Inherited methods are never stored. [`TypeDefinition::all_methods`] computes them on demand
//! as placeholder stubs, so a definition always reflects the current state of its ancestors.

mod definition;
pub mod lower;
mod member;
mod registry;

pub use definition::{
    AnonymousData, ClassData, ConversionPath, InterfaceData, TypeDefinition, Variant,
};
pub use member::{
    fresh_name, render_doc, Access, DefinitionKind, Delegate, FormalParameter, MethodDefinition,
    MethodState, OtherDeclaration, OwnerInfo,
};
pub use registry::{ImplicitConversion, Model};
