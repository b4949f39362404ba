use super::*;
use crate::descriptor::{ClassDescriptor, TypeDescriptor};
use crate::environment::TypeEnvironment;

fn zoo() -> TypeEnvironment {
    let env = TypeEnvironment::new();
    env.declare_class(ClassDescriptor::interface("zoo.Pet")).unwrap();
    env.declare_class(ClassDescriptor::class("zoo.Animal")).unwrap();
    for name in ["zoo.Dog", "zoo.Cat"] {
        env.declare_class(
            ClassDescriptor::class(name)
                .extends(TypeDescriptor::class("zoo.Animal"))
                .implements(TypeDescriptor::class("zoo.Pet")),
        )
        .unwrap();
    }
    env.declare_class(ClassDescriptor::class("garage.Car")).unwrap();
    env
}

fn ty(env: &TypeEnvironment, name: &str) -> TypeId {
    env.class_type(name).unwrap()
}

fn lower(types: &[TypeId]) -> Vec<Bound> {
    types.iter().map(|&t| Bound::new(t, false)).collect()
}

fn unobserved(_: TypeId) -> Option<usize> {
    None
}

#[test]
fn test_candidates_order_by_distance_then_discovery() {
    let env = zoo();
    let relation = CachedAssignability::new(&env);
    let order = candidates(&relation, ty(&env, "zoo.Dog"), unobserved);

    assert_eq!(
        order,
        vec![
            ty(&env, "zoo.Dog"),
            ty(&env, "zoo.Animal"),
            ty(&env, "zoo.Pet"),
            ty(&env, "java.lang.Object"),
        ]
    );
}

#[test]
fn test_candidates_prefer_observed_types_at_equal_distance() {
    let env = zoo();
    let relation = CachedAssignability::new(&env);
    let pet = ty(&env, "zoo.Pet");
    let order = candidates(&relation, ty(&env, "zoo.Dog"), |t| (t == pet).then_some(0));

    assert_eq!(order[1], pet);
    assert_eq!(order[2], ty(&env, "zoo.Animal"));
}

#[test]
fn test_strict_bound_excludes_equality() {
    let env = zoo();
    let mut relation = CachedAssignability::new(&env);
    let dog = ty(&env, "zoo.Dog");
    let animal = ty(&env, "zoo.Animal");

    assert!(satisfies(&mut relation, dog, &[Bound::new(dog, false)], &[]));
    assert!(!satisfies(&mut relation, dog, &[Bound::new(dog, true)], &[]));
    assert!(satisfies(&mut relation, animal, &[Bound::new(dog, true)], &[]));
    assert!(!satisfies(&mut relation, animal, &[], &[Bound::new(animal, true)]));
}

#[test]
fn test_select_least_common_supertype() {
    let env = zoo();
    let mut relation = CachedAssignability::new(&env);
    let bounds = lower(&[ty(&env, "zoo.Dog"), ty(&env, "zoo.Cat")]);

    let chosen = select(&mut relation, None, &bounds, &[], unobserved);
    assert_eq!(chosen, Some(ty(&env, "zoo.Animal")));
}

#[test]
fn test_select_skips_null_as_base() {
    let env = zoo();
    let mut relation = CachedAssignability::new(&env);
    let cat = ty(&env, "zoo.Cat");
    let bounds = lower(&[TypeId::NULL, cat]);

    assert_eq!(select(&mut relation, None, &bounds, &[], unobserved), Some(cat));
}

#[test]
fn test_select_without_bounds_keeps_seed() {
    let env = zoo();
    let mut relation = CachedAssignability::new(&env);
    let dog = ty(&env, "zoo.Dog");

    assert_eq!(select(&mut relation, Some(dog), &[], &[], unobserved), Some(dog));
    assert_eq!(select(&mut relation, None, &[], &[], unobserved), None);
}

#[test]
fn test_select_upper_bound_only() {
    let env = zoo();
    let mut relation = CachedAssignability::new(&env);
    let animal = ty(&env, "zoo.Animal");
    let upper = [Bound::new(animal, false)];

    assert_eq!(select(&mut relation, None, &[], &upper, unobserved), Some(animal));
}

#[test]
fn test_select_falls_back_to_base_when_nothing_fits() {
    let env = zoo();
    let mut relation = CachedAssignability::new(&env);
    let dog = ty(&env, "zoo.Dog");
    let upper = [Bound::new(ty(&env, "garage.Car"), false)];

    let chosen = select(&mut relation, None, &lower(&[dog]), &upper, unobserved);
    assert_eq!(chosen, Some(dog));
}

#[test]
fn test_select_within_stays_in_the_base_closure() {
    let env = zoo();
    let mut relation = CachedAssignability::new(&env);
    let dog = ty(&env, "zoo.Dog");
    let animal = [Bound::new(ty(&env, "zoo.Animal"), false)];
    let car = [Bound::new(ty(&env, "garage.Car"), false)];

    assert_eq!(
        select_within(&mut relation, dog, &animal, &animal, unobserved),
        ty(&env, "zoo.Animal")
    );
    assert_eq!(select_within(&mut relation, dog, &car, &car, unobserved), dog);
}
