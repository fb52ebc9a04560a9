//! Lowering of syntax trees into model entities.
//!
//! Every node kind has its own function; the unit walker dispatches on [`SyntaxNode::kind`].
//! Missing mandatory children and unsupported shapes are reported as [`GrammarError`]s at the
//! offending node.

use std::collections::BTreeSet;

use symgen_core::{GrammarError, SourceRef};
use symgen_syntax::{kinds, SyntaxNode};
use symgen_types::{Type, TypeArgument, TypeParameter, TypeParameters, WildcardBound};

use crate::{
    DefinitionKind, FormalParameter, MethodDefinition, OtherDeclaration, OwnerInfo,
    TypeDefinition,
};

/// The declarations of one compilation unit, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoweredUnit {
    pub imports: BTreeSet<String>,
    pub declarations: Vec<Declaration>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Declaration {
    Interface(TypeDefinition),
    Class(TypeDefinition),
    Rule(ProductionRule),
    /// A standalone static method, owned by the utility class.
    Method(MethodDefinition),
}

/// `Target ::= symbols...` bound to a factory method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductionRule {
    pub comment: String,
    pub type_params: TypeParameters,
    pub target: Type,
    pub symbols: Vec<RuleSymbol>,
    /// Explicit factory name.
    pub name: Option<String>,
    /// Source text of the rule.
    pub image: String,
    pub source: SourceRef,
}

impl ProductionRule {
    /// The argument symbols, in order.
    pub fn arguments(&self) -> impl Iterator<Item = (&str, &Type)> {
        self.symbols.iter().filter_map(|symbol| match symbol {
            RuleSymbol::Argument { name, ty } => Some((name.as_str(), ty)),
            RuleSymbol::Terminal(_) => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleSymbol {
    Terminal(String),
    Argument { name: String, ty: Type },
}

type Result<T> = std::result::Result<T, GrammarError>;

fn missing<N: SyntaxNode>(node: &N, what: &str) -> GrammarError {
    GrammarError::new(
        node.source_ref(),
        format!("{} is missing {what}", node.kind()),
    )
}

fn required<'a, N: SyntaxNode>(node: &'a N, path: &str) -> Result<&'a str> {
    node.value_of(path)
        .ok_or_else(|| missing(node, &format!("a {path} value")))
}

/// Lower a `Unit` node. Standalone methods are owned by `utility`.
pub fn lower_unit<N: SyntaxNode>(unit: &N, utility: &OwnerInfo) -> Result<LoweredUnit> {
    if unit.kind() != kinds::UNIT {
        return Err(GrammarError::new(
            unit.source_ref(),
            format!("expected a {} node, found {}", kinds::UNIT, unit.kind()),
        ));
    }

    let mut lowered = LoweredUnit {
        imports: BTreeSet::new(),
        declarations: Vec::new(),
    };
    for child in unit.children() {
        match child.kind() {
            kinds::IMPORT => {
                lowered.imports.insert(child.image());
            }
            kinds::INTERFACE => lowered
                .declarations
                .push(Declaration::Interface(lower_interface(child)?)),
            kinds::CLASS => lowered
                .declarations
                .push(Declaration::Class(lower_class(child)?)),
            kinds::RULE => lowered.declarations.push(Declaration::Rule(lower_rule(child)?)),
            kinds::METHOD => lowered
                .declarations
                .push(Declaration::Method(lower_method(child, utility)?)),
            other => {
                return Err(GrammarError::new(
                    child.source_ref(),
                    format!("unexpected {other} in a compilation unit"),
                ))
            }
        }
    }
    for declaration in &mut lowered.declarations {
        if let Declaration::Interface(def) | Declaration::Class(def) = declaration {
            def.imports.extend(lowered.imports.iter().cloned());
        }
    }
    Ok(lowered)
}

pub fn lower_interface<N: SyntaxNode>(node: &N) -> Result<TypeDefinition> {
    let def = TypeDefinition::interface(required(node, kinds::NAME)?);
    let mut def = lower_definition_header(node, def)?;
    for parent in node.find("Extends/Type") {
        def = def.extending(lower_type(parent)?);
    }
    if let Some(archetype) = node.value_of(kinds::ARCHETYPE) {
        def = def.with_archetype(archetype);
    }
    lower_members(node, &mut def)?;
    Ok(def)
}

pub fn lower_class<N: SyntaxNode>(node: &N) -> Result<TypeDefinition> {
    let def = TypeDefinition::class(required(node, kinds::NAME)?);
    let mut def = lower_definition_header(node, def)?;
    let parents = node.find("Extends/Type");
    if parents.len() > 1 {
        return Err(GrammarError::new(
            node.source_ref(),
            format!("class {} may extend only one class", def.name),
        ));
    }
    if let Some(parent) = parents.first() {
        def = def.extending(lower_type(*parent)?);
    }
    for iface in node.find("Implements/Type") {
        def = def.implementing(lower_type(iface)?);
    }
    lower_members(node, &mut def)?;
    Ok(def)
}

fn lower_definition_header<N: SyntaxNode>(node: &N, def: TypeDefinition) -> Result<TypeDefinition> {
    let modifiers = node.find(kinds::MODIFIER);
    let mut def = def
        .with_modifiers(modifiers.iter().filter_map(|m| m.value()))
        .with_type_params(lower_type_parameters(node)?);
    def.comment = lower_comment(node);
    def.source = node.source_ref();
    Ok(def)
}

fn lower_members<N: SyntaxNode>(node: &N, def: &mut TypeDefinition) -> Result<()> {
    let owner = def.owner_info();
    for method in node.find(kinds::METHOD) {
        let lowered = lower_method(method, &owner)?;
        def.add_method(lowered)
            .map_err(|err| GrammarError::at(method.source_ref(), err))?;
    }
    for field in node.find(kinds::FIELD) {
        def.other_declarations.push(OtherDeclaration {
            comment: lower_comment(field),
            text: field.image(),
            source: field.source_ref(),
        });
    }
    Ok(())
}

pub fn lower_method<N: SyntaxNode>(node: &N, owner: &OwnerInfo) -> Result<MethodDefinition> {
    let name = required(node, kinds::NAME)?;
    let result = node
        .find_first("Result/Type")
        .ok_or_else(|| missing(node, "a result type"))?;
    let params = node
        .find(kinds::PARAMETER)
        .into_iter()
        .map(lower_parameter)
        .collect::<Result<Vec<_>>>()?;
    let throws = node
        .find("Throws/Type")
        .into_iter()
        .map(lower_type)
        .collect::<Result<Vec<_>>>()?;

    let modifiers = node.find(kinds::MODIFIER);
    let mut method = MethodDefinition::new(owner.clone(), name, lower_type(result)?, params)
        .with_modifiers(modifiers.iter().filter_map(|m| m.value()))
        .with_type_params(lower_type_parameters(node)?)
        .with_throws(throws)
        .with_comment(lower_comment(node))
        .at(node.source_ref());

    match node.find_first(kinds::BODY) {
        Some(body) => method.body = Some(strip_braces(&body.image())),
        None if owner.kind == DefinitionKind::Class && !method.is_abstract => {
            return Err(GrammarError::new(
                node.source_ref(),
                format!("method {name} needs a body or the abstract modifier"),
            ))
        }
        None => {}
    }
    Ok(method)
}

pub fn lower_parameter<N: SyntaxNode>(node: &N) -> Result<FormalParameter> {
    let ty = node
        .find_first(kinds::TYPE)
        .ok_or_else(|| missing(node, "a type"))?;
    let mut param = FormalParameter::new(lower_type(ty)?, required(node, kinds::NAME)?);
    for modifier in node.find(kinds::MODIFIER) {
        if let Some(value) = modifier.value() {
            param = param.with_modifier(value);
        }
    }
    if node.has(kinds::VARIADIC) {
        param = param.variadic();
    }
    Ok(param)
}

pub fn lower_rule<N: SyntaxNode>(node: &N) -> Result<ProductionRule> {
    let target = node
        .find_first("Target/Type")
        .ok_or_else(|| missing(node, "a target type"))?;
    let symbols = node
        .find(kinds::SYMBOL)
        .into_iter()
        .map(|symbol| -> Result<RuleSymbol> {
            let Some(ty) = symbol.find_first(kinds::TYPE) else {
                return symbol
                    .value()
                    .map(|text| RuleSymbol::Terminal(text.to_string()))
                    .ok_or_else(|| missing(symbol, "a terminal or an argument"));
            };
            Ok(RuleSymbol::Argument {
                name: required(symbol, kinds::NAME)?.to_string(),
                ty: lower_type(ty)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(ProductionRule {
        comment: lower_comment(node),
        type_params: lower_type_parameters(node)?,
        target: lower_type(target)?,
        symbols,
        name: node.value_of(kinds::NAME).map(str::to_string),
        image: node.image(),
        source: node.source_ref(),
    })
}

pub fn lower_type_parameters<N: SyntaxNode>(node: &N) -> Result<TypeParameters> {
    node.find(kinds::TYPE_PARAMETER)
        .into_iter()
        .map(|param| -> Result<TypeParameter> {
            let bounds = param
                .find("Bound/Type")
                .into_iter()
                .map(lower_type)
                .collect::<Result<Vec<_>>>()?;
            Ok(TypeParameter::new(required(param, kinds::NAME)?, bounds))
        })
        .collect()
}

pub fn lower_type<N: SyntaxNode>(node: &N) -> Result<Type> {
    let name = required(node, kinds::NAME)?;
    if name.contains('.') {
        return Err(GrammarError::new(
            node.source_ref(),
            format!("qualified type name {name} is not supported"),
        ));
    }
    let args = node
        .find(kinds::ARGUMENT)
        .into_iter()
        .map(lower_type_argument)
        .collect::<Result<Vec<_>>>()?;
    let dims = u32::try_from(node.find(kinds::DIM).len())
        .map_err(|_| GrammarError::new(node.source_ref(), "too many array dimensions"))?;
    Ok(Type::generic(name, args).with_dims(dims))
}

fn lower_type_argument<N: SyntaxNode>(node: &N) -> Result<TypeArgument> {
    if let Some(ty) = node.find_first(kinds::TYPE) {
        return Ok(TypeArgument::Type(lower_type(ty)?));
    }
    let wildcard = node
        .find_first(kinds::WILDCARD)
        .ok_or_else(|| missing(node, "a type or a wildcard"))?;
    let bound = wildcard.find_first(kinds::TYPE).map(lower_type).transpose()?;
    let bound = match (wildcard.value(), bound) {
        (None, None) => WildcardBound::Unbounded,
        (Some("extends"), Some(bound)) => WildcardBound::Extends(bound),
        (Some("super"), Some(bound)) => WildcardBound::Super(bound),
        _ => {
            return Err(GrammarError::new(
                wildcard.source_ref(),
                "a wildcard bound needs `extends` or `super` and a type",
            ))
        }
    };
    Ok(TypeArgument::Wildcard(bound))
}

/// Documentation text of the node's `Comment` child with the `/** */` delimiters and leading
/// asterisks removed.
fn lower_comment<N: SyntaxNode>(node: &N) -> String {
    let Some(comment) = node.find_first(kinds::COMMENT) else {
        return String::new();
    };
    let text = comment.value().map_or_else(|| comment.image(), str::to_string);
    let text = text.trim();
    let text = text.strip_prefix("/**").unwrap_or(text);
    let text = text.strip_suffix("*/").unwrap_or(text);
    text.lines()
        .map(|line| {
            let line = line.trim();
            line.strip_prefix('*').map_or(line, str::trim_start)
        })
        .skip_while(|line| line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
        .trim_end()
        .to_string()
}

/// The text between the outer braces of a body with the indentation its lines share removed.
/// Code on the line of the opening brace is kept, trimmed.
fn strip_braces(image: &str) -> String {
    let trimmed = image.trim();
    let inner = trimmed
        .strip_prefix('{')
        .and_then(|rest| rest.strip_suffix('}'))
        .unwrap_or(trimmed);

    let mut lines: Vec<&str> = inner.lines().map(str::trim_end).collect();
    let first = match lines.first().copied() {
        Some(line) if !line.trim().is_empty() => Some(line.trim_start()),
        _ => None,
    };
    if !lines.is_empty() {
        lines.remove(0);
    }
    while lines.first().is_some_and(|line| line.is_empty()) {
        lines.remove(0);
    }
    while lines.last().is_some_and(|line| line.is_empty()) {
        lines.pop();
    }

    let indent = lines
        .iter()
        .filter(|line| !line.is_empty())
        .map(|line| line.len() - line.trim_start().len())
        .min()
        .unwrap_or(0);
    first
        .into_iter()
        .chain(
            lines
                .iter()
                .map(|line| line.get(indent..).unwrap_or_else(|| line.trim_start())),
        )
        .collect::<Vec<_>>()
        .join("\n")
}
