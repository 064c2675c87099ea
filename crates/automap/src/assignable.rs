//! Value-to-slot compatibility with boxing.

use automap_model::{ScalarKind, TypeRef};

/// Nearest non-primitive supertype of the boxed form of `kind`.
pub fn boxed_supertype(kind: ScalarKind) -> TypeRef {
    if kind.is_numeric() {
        TypeRef::Number
    } else {
        TypeRef::Boxed(kind)
    }
}

/// True when a value whose runtime type is `from` may be passed to a slot
/// declared as `to`.
///
/// Beyond plain subtyping, a primitive value fits its own boxed form and
/// anything that accepts that boxed form's supertype; a primitive slot only
/// takes its own boxed form.
pub fn is_assignable(from: &TypeRef, to: &TypeRef) -> bool {
    if to.is_assignable_from(from) {
        return true;
    }
    match (from, to) {
        (TypeRef::Primitive(kind), _) => {
            *to == TypeRef::Boxed(*kind) || to.is_assignable_from(&boxed_supertype(*kind))
        }
        (_, TypeRef::Primitive(kind)) => *from == TypeRef::Boxed(*kind),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const KINDS: [ScalarKind; 8] = [
        ScalarKind::Bool,
        ScalarKind::Char,
        ScalarKind::Byte,
        ScalarKind::Short,
        ScalarKind::Int,
        ScalarKind::Long,
        ScalarKind::Float,
        ScalarKind::Double,
    ];

    fn kind() -> impl Strategy<Value = ScalarKind> {
        proptest::sample::select(KINDS.to_vec())
    }

    #[test]
    fn primitives_box_into_wrappers_and_supertypes() {
        let int = TypeRef::Primitive(ScalarKind::Int);
        assert!(is_assignable(&int, &TypeRef::Boxed(ScalarKind::Int)));
        assert!(is_assignable(&int, &TypeRef::Number));
        assert!(is_assignable(&int, &TypeRef::Any));
        assert!(!is_assignable(&int, &TypeRef::Boxed(ScalarKind::Long)));
        assert!(!is_assignable(&int, &TypeRef::Text));
        let flag = TypeRef::Primitive(ScalarKind::Bool);
        assert!(is_assignable(&flag, &TypeRef::Any));
        assert!(!is_assignable(&flag, &TypeRef::Number));
    }

    #[test]
    fn primitive_slots_only_unbox_their_own_wrapper() {
        let slot = TypeRef::Primitive(ScalarKind::Short);
        assert!(is_assignable(&TypeRef::Boxed(ScalarKind::Short), &slot));
        assert!(!is_assignable(&TypeRef::Boxed(ScalarKind::Int), &slot));
        assert!(!is_assignable(&TypeRef::Number, &slot));
        assert!(!is_assignable(&TypeRef::Any, &slot));
    }

    #[test]
    fn void_is_never_assignable() {
        assert!(!is_assignable(&TypeRef::Void, &TypeRef::Any));
        assert!(!is_assignable(&TypeRef::Text, &TypeRef::Void));
    }

    proptest! {
        #[test]
        fn scalar_forms_interchange_only_within_a_kind(from in kind(), to in kind()) {
            let same = from == to;
            prop_assert_eq!(is_assignable(&TypeRef::Primitive(from), &TypeRef::Boxed(to)), same);
            prop_assert_eq!(is_assignable(&TypeRef::Boxed(from), &TypeRef::Primitive(to)), same);
            let primitives = is_assignable(&TypeRef::Primitive(from), &TypeRef::Primitive(to));
            prop_assert_eq!(primitives, same);
        }

        #[test]
        fn every_scalar_fits_an_object_slot(kind in kind()) {
            prop_assert!(is_assignable(&TypeRef::Primitive(kind), &TypeRef::Any));
            prop_assert!(is_assignable(&TypeRef::Boxed(kind), &TypeRef::Any));
        }
    }
}
