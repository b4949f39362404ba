use super::*;
use crate::descriptor::{ClassDescriptor, TypeDescriptor, TypeParameterDescriptor};
use crate::types::PrimitiveKind;

fn env() -> TypeEnvironment {
    let env = TypeEnvironment::new();
    env.declare_class(ClassDescriptor::class("zoo.Dog")).unwrap();
    env.declare_class(
        ClassDescriptor::class("java.util.Map")
            .with_type_parameter(TypeParameterDescriptor::new("K"))
            .with_type_parameter(TypeParameterDescriptor::new("V")),
    )
    .unwrap();
    env
}

fn format(env: &TypeEnvironment, descriptor: TypeDescriptor) -> String {
    let ty = env.get_or_create(&descriptor).unwrap();
    TypeFormatter::new(env).format(ty)
}

#[test]
fn test_simple_names_by_default() {
    let env = env();
    let map = TypeDescriptor::parameterized(
        "java.util.Map",
        vec![
            TypeDescriptor::class("zoo.Dog"),
            TypeDescriptor::extends(TypeDescriptor::type_variable("java.util.Map", "V")),
        ],
    );
    assert_eq!(format(&env, map), "Map<Dog, ? extends V>");
    assert_eq!(format(&env, TypeDescriptor::class("java.util.Map")), "Map");
}

#[test]
fn test_qualified_names() {
    let env = env();
    let dog = env.class_type("zoo.Dog").unwrap();
    let formatter = TypeFormatter::new(&env).with_qualified_names(true);
    assert_eq!(formatter.format(dog), "zoo.Dog");
}

#[test]
fn test_arrays_primitives_and_specials() {
    let env = env();
    let int_matrix = TypeDescriptor::array(TypeDescriptor::primitive(PrimitiveKind::Int), 2);
    assert_eq!(format(&env, int_matrix), "int[][]");
    assert_eq!(format(&env, TypeDescriptor::Void), "void");
    assert_eq!(format(&env, TypeDescriptor::Null), "null");
    assert_eq!(
        format(&env, TypeDescriptor::super_of(TypeDescriptor::class("zoo.Dog"))),
        "? super Dog"
    );
    assert_eq!(format(&env, TypeDescriptor::UnboundWildcard), "?");
}

#[test]
fn test_captures_show_their_site() {
    let env = env();
    let capture = TypeDescriptor::capture(TypeDescriptor::extends(TypeDescriptor::class("zoo.Dog")), 3);
    assert_eq!(format(&env, capture), "capture#3 of ? extends Dog");
}
