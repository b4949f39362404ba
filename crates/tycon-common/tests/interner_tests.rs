use super::*;

#[test]
fn test_interner_deduplicates() {
    let mut interner = Interner::new();

    let a = interner.intern("com.example.Animal");
    let b = interner.intern("com.example.Animal");
    let c = interner.intern("com.example.Dog");

    assert_eq!(a, b);
    assert_ne!(a, c);
    assert_eq!(interner.resolve(a), "com.example.Animal");
}

#[test]
fn test_empty_string_is_none_atom() {
    let mut interner = Interner::new();

    assert!(interner.is_empty());
    assert_eq!(interner.intern(""), Atom::NONE);
    assert!(Atom::NONE.is_none());
}

#[test]
fn test_get_does_not_insert() {
    let mut interner = Interner::new();

    assert_eq!(interner.get("java.util.List"), None);
    let atom = interner.intern("java.util.List");
    assert_eq!(interner.get("java.util.List"), Some(atom));
    assert_eq!(interner.len(), 2);
}

#[test]
fn test_out_of_range_atom_resolves_empty() {
    let interner = Interner::new();

    assert_eq!(interner.resolve(Atom(999)), "");
    assert_eq!(interner.try_resolve(Atom(999)), None);
    assert_eq!(&*interner.resolve_shared(Atom(999)), "");
}

#[test]
fn test_intern_common_prefills_java_names() {
    let mut interner = Interner::new();
    interner.intern_common();

    assert!(interner.get("java.lang.Object").is_some());
    assert!(interner.get("java.io.Serializable").is_some());
    assert!(!interner.is_empty());
}
