use super::*;
use crate::descriptor::{ClassDescriptor, TypeDescriptor, TypeParameterDescriptor};

fn list_env() -> TypeEnvironment {
    let env = TypeEnvironment::new();
    env.declare_class(ClassDescriptor::class("zoo.Animal")).unwrap();
    env.declare_class(ClassDescriptor::class("zoo.Dog").extends(TypeDescriptor::class("zoo.Animal")))
        .unwrap();
    env.declare_class(
        ClassDescriptor::interface("java.util.List")
            .with_type_parameter(TypeParameterDescriptor::new("E")),
    )
    .unwrap();
    env
}

#[test]
fn test_get_or_create_is_idempotent() {
    let env = list_env();
    let descriptor = TypeDescriptor::parameterized(
        "java.util.List",
        vec![TypeDescriptor::extends(TypeDescriptor::class("zoo.Animal"))],
    );

    let first = env.get_or_create(&descriptor).unwrap();
    let count = env.type_count();
    let second = env.get_or_create(&descriptor.clone()).unwrap();

    assert_eq!(first, second);
    assert_eq!(env.type_count(), count);
}

#[test]
fn test_intrinsics_are_shared_between_environments() {
    let a = list_env();
    let b = list_env();
    let int = TypeDescriptor::primitive(PrimitiveKind::Int);

    assert_eq!(a.get_or_create(&int).unwrap(), TypeId::INT);
    assert_eq!(b.get_or_create(&int).unwrap(), TypeId::INT);
    assert_eq!(a.get_or_create(&TypeDescriptor::Null).unwrap(), TypeId::NULL);
    assert_eq!(a.lookup(TypeId::UNBOUND_WILDCARD), TypeData::UnboundWildcard);
}

#[test]
#[should_panic(expected = "belongs to another TypeEnvironment")]
fn test_foreign_type_id_lookup_asserts() {
    let a = list_env();
    let b = list_env();
    let dog = a.class_type("zoo.Dog").unwrap();
    let _ = b.lookup(dog);
}

#[test]
fn test_generic_declaration_without_arguments_is_raw() {
    let env = list_env();
    let raw = env.class_type("java.util.List").unwrap();
    assert!(matches!(env.lookup(raw), TypeData::Raw(_)));

    let dog = env.class_type("zoo.Dog").unwrap();
    assert!(matches!(env.lookup(dog), TypeData::Standard(_)));
}

#[test]
fn test_argument_count_mismatch_is_rejected() {
    let env = list_env();
    let count = env.type_count();
    let err = env
        .get_or_create(&TypeDescriptor::parameterized(
            "java.util.List",
            vec![TypeDescriptor::class("zoo.Dog"), TypeDescriptor::class("zoo.Dog")],
        ))
        .unwrap_err();

    assert_eq!(
        err,
        EnvironmentError::ArgumentCountMismatch {
            name: "java.util.List".to_string(),
            expected: 1,
            found: 2,
        }
    );
    // The argument itself was interned, the malformed list type was not.
    let dog = env.class_type("zoo.Dog").unwrap();
    assert!(env.type_count() <= count + 1);
    assert!(!matches!(env.lookup(dog), TypeData::Parameterized { .. }));
}

#[test]
fn test_malformed_descriptors_are_rejected() {
    let env = list_env();

    assert_eq!(
        env.get_or_create(&TypeDescriptor::class("zoo.Unicorn")),
        Err(EnvironmentError::UnknownDeclaration("zoo.Unicorn".to_string()))
    );
    assert_eq!(
        env.get_or_create(&TypeDescriptor::array(TypeDescriptor::class("zoo.Dog"), 0)),
        Err(EnvironmentError::ZeroArrayDimensions)
    );
    assert!(matches!(
        env.get_or_create(&TypeDescriptor::array(TypeDescriptor::Void, 1)),
        Err(EnvironmentError::InvalidArrayElement(_))
    ));
    assert!(matches!(
        env.get_or_create(&TypeDescriptor::parameterized(
            "java.util.List",
            vec![TypeDescriptor::primitive(PrimitiveKind::Int)],
        )),
        Err(EnvironmentError::InvalidTypeArgument { .. })
    ));
    assert!(matches!(
        env.get_or_create(&TypeDescriptor::extends(TypeDescriptor::UnboundWildcard)),
        Err(EnvironmentError::InvalidWildcardBound(_))
    ));
    assert_eq!(
        env.get_or_create(&TypeDescriptor::capture(TypeDescriptor::class("zoo.Dog"), 1)),
        Err(EnvironmentError::CaptureOfNonWildcard)
    );
    assert!(matches!(
        env.get_or_create(&TypeDescriptor::type_variable("java.util.List", "X")),
        Err(EnvironmentError::UnknownTypeVariable { .. })
    ));
}

#[test]
fn test_duplicate_declaration_is_rejected() {
    let env = list_env();
    let err = env.declare_class(ClassDescriptor::class("zoo.Dog")).unwrap_err();
    assert_eq!(err, EnvironmentError::DuplicateDeclaration("zoo.Dog".to_string()));
}

#[test]
fn test_nested_arrays_are_flattened() {
    let env = list_env();
    let dog = TypeDescriptor::class("zoo.Dog");
    let nested = TypeDescriptor::array(TypeDescriptor::array(dog.clone(), 1), 1);
    let flat = TypeDescriptor::array(dog, 2);

    let a = env.get_or_create(&nested).unwrap();
    let b = env.get_or_create(&flat).unwrap();
    assert_eq!(a, b);

    let TypeData::Array {
        element,
        dimensions,
    } = env.lookup(a)
    else {
        panic!("expected an array");
    };
    assert_eq!(dimensions, 2);
    assert_eq!(element, env.class_type("zoo.Dog").unwrap());

    let component = env.component_type(a).unwrap();
    assert_eq!(env.component_type(component), Some(element));
}

#[test]
fn test_named_root_is_interned_with_first_root_class() {
    let env = list_env();
    assert_eq!(env.top_type(), None);

    env.class_type("zoo.Animal").unwrap();
    let top = env.top_type().expect("top type interned");
    assert_eq!(&*env.declaration_name(env.lookup(top).declaration().unwrap()), DEFAULT_ROOT);
    assert_eq!(env.class_type(DEFAULT_ROOT).unwrap(), top);
}

#[test]
fn test_first_seen_root_policy() {
    let env =
        TypeEnvironment::with_config(EnvironmentConfig::default().with_root_policy(RootPolicy::FirstSeen));
    env.declare_class(ClassDescriptor::class("Base")).unwrap();
    env.declare_class(ClassDescriptor::class("Derived").extends(TypeDescriptor::class("Base")))
        .unwrap();

    env.class_type("Derived").unwrap();
    assert_eq!(env.top_type(), None);
    assert_eq!(env.require_top(), None);

    let base = env.class_type("Base").unwrap();
    assert_eq!(env.top_type(), Some(base));
}

#[test]
fn test_erasure_of_unknown_top_is_an_error() {
    let env =
        TypeEnvironment::with_config(EnvironmentConfig::default().with_root_policy(RootPolicy::FirstSeen));
    assert_eq!(
        env.erasure(TypeId::UNBOUND_WILDCARD),
        Err(EnvironmentError::TopTypeUnknown)
    );
}

#[test]
fn test_capture_is_canonical_per_site() {
    let env = list_env();
    let wildcard = TypeDescriptor::extends(TypeDescriptor::class("zoo.Animal"));

    let a = env.get_or_create(&TypeDescriptor::capture(wildcard.clone(), 7)).unwrap();
    let b = env.get_or_create(&TypeDescriptor::capture(wildcard.clone(), 7)).unwrap();
    let c = env.get_or_create(&TypeDescriptor::capture(wildcard, 8)).unwrap();
    assert_eq!(a, b);
    assert_ne!(a, c);

    let TypeData::Capture(id) = env.lookup(a) else {
        panic!("expected a capture");
    };
    let info = env.capture_info(id).unwrap();
    assert_eq!(info.lower_bound, TypeId::NULL);
    assert_eq!(info.upper_bounds.as_slice(), &[env.class_type("zoo.Animal").unwrap()]);
}

#[test]
fn test_super_wildcard_capture_has_lower_bound() {
    let env = list_env();
    let dog = env.class_type("zoo.Dog").unwrap();
    let wildcard = env
        .get_or_create(&TypeDescriptor::super_of(TypeDescriptor::class("zoo.Dog")))
        .unwrap();
    let capture = env.capture(wildcard, 3).unwrap();

    let TypeData::Capture(id) = env.lookup(capture) else {
        panic!("expected a capture");
    };
    assert_eq!(env.capture_info(id).unwrap().lower_bound, dog);
}

#[test]
fn test_forward_references_resolve_lazily() {
    let env = TypeEnvironment::new();
    env.declare_class(ClassDescriptor::class("a.Late").extends(TypeDescriptor::class("a.Early")))
        .unwrap();
    env.declare_class(ClassDescriptor::class("a.Early")).unwrap();

    let late = env.class_type("a.Late").unwrap();
    let early = env.class_type("a.Early").unwrap();
    let decl = env.lookup(late).declaration().unwrap();
    assert_eq!(env.declared_supertypes(decl).unwrap().as_slice(), &[early]);
    assert!(env.resolve_declarations().is_ok());
}

#[test]
fn test_resolve_declarations_reports_unknown_supertype() {
    let env = TypeEnvironment::new();
    env.declare_class(ClassDescriptor::class("a.Orphan").extends(TypeDescriptor::class("a.Missing")))
        .unwrap();
    assert_eq!(
        env.resolve_declarations(),
        Err(EnvironmentError::UnknownDeclaration("a.Missing".to_string()))
    );
}

#[test]
fn test_method_type_parameters() {
    let env = list_env();
    let ids = env
        .declare_type_parameters(
            "zoo.Util#max(1)",
            &[TypeParameterDescriptor::new("T").with_bound(TypeDescriptor::class("zoo.Animal"))],
        )
        .unwrap();
    assert_eq!(ids.len(), 1);

    let t = env
        .get_or_create(&TypeDescriptor::type_variable("zoo.Util#max(1)", "T"))
        .unwrap();
    assert_eq!(env.lookup(t), TypeData::TypeVariable(ids[0]));
    assert_eq!(
        env.type_parameter_bounds(ids[0]).as_slice(),
        &[env.class_type("zoo.Animal").unwrap()]
    );

    let duplicate = env.declare_type_parameters("zoo.Util#max(1)", &[TypeParameterDescriptor::new("T")]);
    assert!(matches!(duplicate, Err(EnvironmentError::DuplicateTypeParameter { .. })));
}

#[test]
fn test_primitive_type_parameter_bound_is_rejected() {
    let env = list_env();
    let ids = env
        .declare_type_parameters(
            "zoo.Util#pick(1)",
            &[TypeParameterDescriptor::new("N")
                .with_bound(TypeDescriptor::primitive(crate::types::PrimitiveKind::Int))],
        )
        .unwrap();

    let err = env.resolve_declarations().unwrap_err();
    assert_eq!(
        err,
        EnvironmentError::InvalidTypeParameterBound {
            name: "N".to_string(),
            reason: "bounds must be reference types",
        }
    );
    assert_eq!(err.to_string(), "invalid bound for type parameter `N`: bounds must be reference types");
    assert!(env.type_parameter_bounds(ids[0]).is_empty());
}

#[test]
fn test_resolved_names_share_the_interned_string() {
    let env = list_env();
    let atom = env.intern_string("zoo.Animal");
    let first = env.resolve_atom(atom);
    let second = env.resolve_atom(atom);
    assert_eq!(&*first, "zoo.Animal");
    assert!(std::sync::Arc::ptr_eq(&first, &second));

    let decl = env.lookup(env.class_type("zoo.Animal").unwrap()).declaration().unwrap();
    assert!(std::sync::Arc::ptr_eq(&env.declaration_name(decl), &first));
}
