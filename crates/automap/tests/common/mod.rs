#![allow(dead_code)]

use std::sync::{Arc, Once};

use automap::{ScalarKind, TypeKind, TypeRef, Value, introspect};
use automap_model::{InvokeError, Operation};

static TRACING: Once = Once::new();

/// Routes engine diagnostics to the test output. Filter with `RUST_LOG`.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

pub const INT: TypeRef = TypeRef::Primitive(ScalarKind::Int);
pub const SHORT: TypeRef = TypeRef::Primitive(ScalarKind::Short);
pub const BOOL: TypeRef = TypeRef::Primitive(ScalarKind::Bool);
pub const BOXED_INT: TypeRef = TypeRef::Boxed(ScalarKind::Int);
pub const BOXED_LONG: TypeRef = TypeRef::Boxed(ScalarKind::Long);
pub const BOXED_SHORT: TypeRef = TypeRef::Boxed(ScalarKind::Short);

pub fn list_type() -> TypeRef {
    TypeRef::opaque::<Vec<String>>()
}

pub fn set_type() -> TypeRef {
    TypeRef::opaque::<std::collections::BTreeSet<String>>()
}

// ---- plain bean with primitive and boxed slots ----

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlainBean {
    pub my_string: Option<String>,
    pub my_int: i32,
    pub my_long: Option<i64>,
    pub my_short: i16,
    pub my_list: Option<Arc<Vec<String>>>,
    pub active: bool,
}

introspect!(PlainBean, |b| b
    .default_constructor()
    .read("getMyString", TypeRef::Text, |p: &PlainBean| p.my_string.clone())
    .write("setMyString", TypeRef::Text, |p: &mut PlainBean, v: Option<String>| p.my_string = v)
    .read("getMyInt", INT, |p: &PlainBean| p.my_int)
    .write("setMyInt", INT, |p: &mut PlainBean, v: i32| p.my_int = v)
    .read("getMyLong", BOXED_LONG, |p: &PlainBean| p.my_long)
    .write("setMyLong", BOXED_LONG, |p: &mut PlainBean, v: Option<i64>| p.my_long = v)
    .read("getMyShort", SHORT, |p: &PlainBean| p.my_short)
    .write("setMyShort", SHORT, |p: &mut PlainBean, v: i16| p.my_short = v)
    .read("getMyList", list_type(), |p: &PlainBean| p.my_list.clone())
    .write("setMyList", list_type(), |p: &mut PlainBean, v: Option<Arc<Vec<String>>>| p.my_list = v)
    .read("isActive", BOOL, |p: &PlainBean| p.active)
    .write("setActive", BOOL, |p: &mut PlainBean, v: bool| p.active = v));

// ---- bean with boxed slots, a collection getter and a builder ----

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoxedBean {
    pub my_string: Option<String>,
    pub my_int: Option<i32>,
    pub my_long: Option<i32>,
    pub my_short: Option<i16>,
    pub my_list: Option<Arc<std::collections::BTreeSet<String>>>,
    pub active: Option<bool>,
}

#[derive(Debug, Default)]
pub struct BoxedBeanBuilder {
    inner: BoxedBean,
}

impl BoxedBeanBuilder {
    pub fn build(&self) -> BoxedBean {
        self.inner.clone()
    }
}

introspect!(BoxedBean, |b| b
    .default_constructor()
    .factory("builder", BoxedBeanBuilder::default)
    .read("getMyString", TypeRef::Text, |l: &BoxedBean| l.my_string.clone())
    .write("setMyString", TypeRef::Text, |l: &mut BoxedBean, v: Option<String>| l.my_string = v)
    .read("getMyInt", BOXED_INT, |l: &BoxedBean| l.my_int)
    .write("setMyInt", BOXED_INT, |l: &mut BoxedBean, v: Option<i32>| l.my_int = v)
    .read("getMyLong", BOXED_INT, |l: &BoxedBean| l.my_long)
    .write("setMyLong", BOXED_INT, |l: &mut BoxedBean, v: Option<i32>| l.my_long = v)
    .read("getMyShort", BOXED_SHORT, |l: &BoxedBean| l.my_short)
    .write("setMyShort", BOXED_SHORT, |l: &mut BoxedBean, v: Option<i16>| l.my_short = v)
    .read("getMyList", set_type(), |l: &BoxedBean| l.my_list.clone())
    .write("setMyList", set_type(), |l: &mut BoxedBean, v: Option<Arc<std::collections::BTreeSet<String>>>| l.my_list = v)
    .read("getActive", TypeRef::Boxed(ScalarKind::Bool), |l: &BoxedBean| l.active)
    .write("setActive", TypeRef::Boxed(ScalarKind::Bool), |l: &mut BoxedBean, v: Option<bool>| l.active = v));

introspect!(BoxedBeanBuilder, |b| b
    .fluent("myString", TypeRef::Text, |b: &mut BoxedBeanBuilder, v: Option<String>| b.inner.my_string = v)
    .fluent("myInt", BOXED_INT, |b: &mut BoxedBeanBuilder, v: Option<i32>| b.inner.my_int = v)
    .fluent("myLong", BOXED_INT, |b: &mut BoxedBeanBuilder, v: Option<i32>| b.inner.my_long = v)
    .fluent("myShort", BOXED_SHORT, |b: &mut BoxedBeanBuilder, v: Option<i16>| b.inner.my_short = v)
    .fluent("active", TypeRef::Boxed(ScalarKind::Bool), |b: &mut BoxedBeanBuilder, v: Option<bool>| b.inner.active = v)
    .operation(Operation::declared("build", Vec::new(), TypeRef::of::<BoxedBean>(), false)));

// ---- override pairs ----

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FromBean {
    pub foo: Option<String>,
    pub shared: Option<String>,
}

introspect!(FromBean, |b| b
    .default_constructor()
    .read("getFoo", TypeRef::Text, |p: &FromBean| p.foo.clone())
    .write("setFoo", TypeRef::Text, |p: &mut FromBean, v: Option<String>| p.foo = v)
    .read("getShared", TypeRef::Text, |p: &FromBean| p.shared.clone())
    .write("setShared", TypeRef::Text, |p: &mut FromBean, v: Option<String>| p.shared = v));

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToBean {
    pub foo: Option<String>,
    pub bar: Option<String>,
    pub shared: Option<String>,
}

introspect!(ToBean, |b| b
    .default_constructor()
    .read("getFoo", TypeRef::Text, |p: &ToBean| p.foo.clone())
    .write("setFoo", TypeRef::Text, |p: &mut ToBean, v: Option<String>| p.foo = v)
    .read("getBar", TypeRef::Text, |p: &ToBean| p.bar.clone())
    .write("setBar", TypeRef::Text, |p: &mut ToBean, v: Option<String>| p.bar = v)
    .read("getShared", TypeRef::Text, |p: &ToBean| p.shared.clone())
    .write("setShared", TypeRef::Text, |p: &mut ToBean, v: Option<String>| p.shared = v));

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToOther {
    pub foo: Option<String>,
    pub bar: Option<String>,
}

introspect!(ToOther, |b| b
    .default_constructor()
    .read("getFoo", TypeRef::Text, |p: &ToOther| p.foo.clone())
    .write("setFoo", TypeRef::Text, |p: &mut ToOther, v: Option<String>| p.foo = v)
    .read("getBar", TypeRef::Text, |p: &ToOther| p.bar.clone())
    .write("setBar", TypeRef::Text, |p: &mut ToOther, v: Option<String>| p.bar = v));

/// Two slots of one type, for mapping an instance onto itself.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pair {
    pub first: Option<String>,
    pub second: Option<String>,
    pub count: i32,
}

introspect!(Pair, |b| b
    .default_constructor()
    .read("getFirst", TypeRef::Text, |p: &Pair| p.first.clone())
    .write("setFirst", TypeRef::Text, |p: &mut Pair, v: Option<String>| p.first = v)
    .read("getSecond", TypeRef::Text, |p: &Pair| p.second.clone())
    .write("setSecond", TypeRef::Text, |p: &mut Pair, v: Option<String>| p.second = v)
    .read("getCount", INT, |p: &Pair| p.count)
    .write("setCount", INT, |p: &mut Pair, v: i32| p.count = v));

// ---- immutable type reachable only through its builder ----

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Point {
    pub x: i32,
    pub y: i32,
    pub label: Option<String>,
}

#[derive(Debug, Default)]
pub struct PointBuilder {
    point: Point,
}

impl PointBuilder {
    pub fn build(&self) -> Point {
        self.point.clone()
    }
}

introspect!(Point, |b| b
    .factory("builder", PointBuilder::default)
    .read("getX", INT, |p: &Point| p.x)
    .read("getY", INT, |p: &Point| p.y)
    .read("getLabel", TypeRef::Text, |p: &Point| p.label.clone()));

introspect!(PointBuilder, |b| b
    .fluent("x", INT, |b: &mut PointBuilder, v: i32| b.point.x = v)
    .fluent("y", INT, |b: &mut PointBuilder, v: i32| b.point.y = v)
    .fluent("label", TypeRef::Text, |b: &mut PointBuilder, v: Option<String>| b.point.label = v)
    .operation(Operation::declared("build", Vec::new(), TypeRef::of::<Point>(), false)));

/// Source carrying the same coordinates under other names.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Coordinates {
    pub x: i32,
    pub y: i32,
    pub name: Option<String>,
}

introspect!(Coordinates, |b| b
    .default_constructor()
    .read("getX", INT, |c: &Coordinates| c.x)
    .read("getY", INT, |c: &Coordinates| c.y)
    .read("getName", TypeRef::Text, |c: &Coordinates| c.name.clone()));

// ---- record type with a setter-style builder behind an unconventional factory ----

pub struct SpecificRecordBase;

introspect!(SpecificRecordBase, |b| b.kind(TypeKind::Abstract));

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordUser {
    pub name: Option<String>,
    pub age: i32,
}

#[derive(Debug, Default)]
pub struct RecordUserBuilder {
    user: RecordUser,
}

impl RecordUserBuilder {
    pub fn build(&self) -> RecordUser {
        self.user.clone()
    }
}

introspect!(RecordUser, |b| b
    .supertype::<SpecificRecordBase>()
    .factory("newBuilder", RecordUserBuilder::default)
    .read("getName", TypeRef::Text, |u: &RecordUser| u.name.clone())
    .read("getAge", INT, |u: &RecordUser| u.age));

introspect!(RecordUserBuilder, |b| b
    .chain("setName", TypeRef::Text, TypeRef::of::<RecordUserBuilder>(), |b: &mut RecordUserBuilder, v: Option<String>| b.user.name = v)
    .chain("setAge", INT, TypeRef::of::<RecordUserBuilder>(), |b: &mut RecordUserBuilder, v: i32| b.user.age = v)
    .operation(Operation::declared("build", Vec::new(), TypeRef::of::<RecordUser>(), false)));

// ---- builder declared through an abstract base ----

pub struct Animal;

introspect!(Animal, |b| b.kind(TypeKind::Abstract));

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dog {
    pub name: Option<String>,
    pub legs: i32,
}

pub struct AnimalBuilder;

introspect!(AnimalBuilder, |b| b.kind(TypeKind::Abstract));

#[derive(Debug, Default)]
pub struct DogBuilderImpl {
    dog: Dog,
}

impl DogBuilderImpl {
    pub fn build(&self) -> Dog {
        self.dog.clone()
    }
}

introspect!(Dog, |b| b
    .supertype::<Animal>()
    .dyn_factory("builder", TypeRef::of::<AnimalBuilder>(), || {
        Ok(Box::new(DogBuilderImpl::default()) as Box<dyn automap::Reflect>)
    })
    .read("getName", TypeRef::Text, |d: &Dog| d.name.clone())
    .read("getLegs", INT, |d: &Dog| d.legs));

introspect!(DogBuilderImpl, |b| b
    .supertype::<AnimalBuilder>()
    .chain("name", TypeRef::Text, TypeRef::of::<AnimalBuilder>(), |b: &mut DogBuilderImpl, v: Option<String>| b.dog.name = v)
    .chain("legs", INT, TypeRef::of::<AnimalBuilder>(), |b: &mut DogBuilderImpl, v: i32| b.dog.legs = v)
    .operation(Operation::declared("build", Vec::new(), TypeRef::of::<Dog>(), false)));

// ---- types that cannot be destinations ----

pub struct Shape;

introspect!(Shape, |b| b.kind(TypeKind::Interface));

pub struct Color;

introspect!(Color, |b| b.kind(TypeKind::Enum));

pub struct NoDefault;

introspect!(NoDefault, |b| b
    .read("getMyString", TypeRef::Text, |_: &NoDefault| None::<String>));

#[derive(Debug, Default)]
pub struct Fragile {
    pub my_string: Option<String>,
}

introspect!(Fragile, |b| b
    .try_constructor(|| Err(InvokeError::failed("constructor rejected")))
    .write("setMyString", TypeRef::Text, |f: &mut Fragile, v: Option<String>| f.my_string = v));

/// A getter that always fails when read.
#[derive(Debug, Default)]
pub struct Vault {
    pub my_string: Option<String>,
}

introspect!(Vault, |b| b
    .default_constructor()
    .read("getMyString", TypeRef::Text, |v: &Vault| v.my_string.clone())
    .write("setSecret", TypeRef::Text, |v: &mut Vault, s: Option<String>| v.my_string = s)
    .operation(Operation::reader(
        "getSecret",
        TypeRef::Text,
        Arc::new(|_: &dyn std::any::Any| -> automap_model::Result<Value> {
            Err(InvokeError::failed("sealed"))
        }),
    )));

pub fn sample_plain() -> PlainBean {
    PlainBean {
        my_string: Some("foo".to_string()),
        my_int: 7,
        my_long: Some(42),
        my_short: 3,
        my_list: Some(Arc::new(vec!["a".to_string(), "b".to_string()])),
        active: true,
    }
}

pub fn sample_boxed() -> BoxedBean {
    BoxedBean {
        my_string: Some("foo".to_string()),
        my_int: Some(7),
        my_long: Some(9),
        my_short: Some(3),
        my_list: Some(Arc::new(["x".to_string()].into_iter().collect())),
        active: Some(true),
    }
}
