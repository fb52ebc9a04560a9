use pretty_assertions::assert_eq;
use symgen_model::lower::Declaration;
use symgen_model::TypeDefinition;

use super::fixtures::{
    abstract_class, conversion, implemented_interfaces, resolve, sql_interface, ty,
};

fn chain(class_implements: &[&str]) -> Vec<Declaration> {
    vec![
        Declaration::Interface(sql_interface("A")),
        Declaration::Interface(sql_interface("B")),
        Declaration::Interface(sql_interface("C")),
        Declaration::Class(abstract_class("Impl", class_implements)),
        Declaration::Rule(conversion("A", "B")),
        Declaration::Rule(conversion("B", "C")),
    ]
}

#[test]
fn conversions_close_transitively_with_distances() {
    let resolved = resolve(chain(&["A"])).expect("resolves");

    assert_eq!(implemented_interfaces(&resolved, "Impl"), ["A", "B", "C"]);
    let class = resolved.model().get("Impl").unwrap();
    assert_eq!(class.distance_to("A"), 0);
    assert_eq!(class.distance_to("B"), 1);
    assert_eq!(class.distance_to("C"), 2);
    let path = class.conversion_path("C").unwrap();
    assert_eq!(path.via.to_string(), "B");
    assert_eq!(path.conversion, "z$C$from$B");
}

#[test]
fn gained_archetype_methods_forward_through_the_conversion() {
    let resolved = resolve(chain(&["A"])).expect("resolves");

    assert_eq!(
        resolved.render_method("Impl", "z$prepare$B(Context)").unwrap(),
        "public void z$prepare$B(Context context) {\n    Symqle.z$B$from$A(this).z$prepare$B(context);\n}"
    );
    assert_eq!(
        resolved.render_method("Impl", "z$prepare$C(Context)").unwrap(),
        "public void z$prepare$C(Context context) {\n    Symqle.z$C$from$B(this).z$prepare$C(context);\n}"
    );
    // The directly implemented archetype method stays abstract on the abstract class.
    assert_eq!(
        resolved.render_method("Impl", "z$prepare$A(Context)").unwrap(),
        "public abstract void z$prepare$A(Context context);"
    );
}

#[test]
fn reachable_ancestors_are_not_added_again() {
    let resolved = resolve(chain(&["A", "C"])).expect("resolves");

    assert_eq!(implemented_interfaces(&resolved, "Impl"), ["A", "C", "B"]);
    let class = resolved.model().get("Impl").unwrap();
    assert_eq!(class.distance_to("C"), 0);
    assert!(class.conversion_path("C").is_none());
}

#[test]
fn redundant_direct_interfaces_are_dropped() {
    let resolved = resolve(vec![
        Declaration::Interface(sql_interface("A")),
        Declaration::Interface(sql_interface("Base")),
        Declaration::Interface(sql_interface("Sub").extending(ty("Base"))),
        Declaration::Class(abstract_class("Impl", &["A", "Base"])),
        Declaration::Rule(conversion("A", "Sub")),
    ])
    .expect("resolves");

    assert_eq!(implemented_interfaces(&resolved, "Impl"), ["A", "Sub"]);
    let class = resolved.model().get("Impl").unwrap();
    assert_eq!(class.distance_to("Sub"), 1);
    assert_eq!(class.distance_to("Base"), 0);
    // Only the method introduced by the gained interface forwards; Base's was already owed.
    assert!(class.method("z$prepare$Sub(Context)").unwrap().body.is_some());
    assert!(class.method("z$prepare$Base(Context)").unwrap().is_abstract);
}

#[test]
fn classes_without_archetyped_interfaces_are_left_alone() {
    let resolved = resolve(vec![
        Declaration::Interface(sql_interface("A")),
        Declaration::Interface(sql_interface("B")),
        Declaration::Interface(TypeDefinition::interface("Plain")),
        Declaration::Class(abstract_class("Impl", &["Plain"])),
        Declaration::Rule(conversion("A", "B")),
    ])
    .expect("resolves");

    assert_eq!(implemented_interfaces(&resolved, "Impl"), ["Plain"]);
}

#[test]
fn plain_supertypes_of_gained_interfaces_are_explored() {
    let resolved = resolve(vec![
        Declaration::Interface(sql_interface("A")),
        Declaration::Interface(TypeDefinition::interface("X")),
        Declaration::Interface(sql_interface("B").extending(ty("X"))),
        Declaration::Interface(sql_interface("D")),
        Declaration::Class(abstract_class("Impl", &["A"])),
        Declaration::Rule(conversion("A", "B")),
        Declaration::Rule(conversion("X", "D")),
    ])
    .expect("resolves");

    assert_eq!(implemented_interfaces(&resolved, "Impl"), ["A", "B", "D"]);
    let class = resolved.model().get("Impl").unwrap();
    assert_eq!(class.distance_to("X"), 1);
    assert_eq!(class.distance_to("D"), 2);
    let path = class.conversion_path("D").unwrap();
    assert_eq!(path.via.to_string(), "X");
    assert_eq!(path.conversion, "z$D$from$X");
    assert_eq!(
        resolved.render_method("Impl", "z$prepare$D(Context)").unwrap(),
        "public void z$prepare$D(Context context) {\n    Symqle.z$D$from$X(this).z$prepare$D(context);\n}"
    );
}
