//! Constructor selection, parameter overrides and member injection.

use arbor_di::{
    ConfigurationError, Constructor, ContainerBuilder, DiError, Injectable, InjectionPoint, Lifetime, Param,
    Resolver, TypePlan,
};
use std::sync::Arc;

trait Weapon: Send + Sync {
    fn name(&self) -> &'static str;
}

struct Sword;
impl Weapon for Sword {
    fn name(&self) -> &'static str {
        "sword"
    }
}

struct Bow;
impl Weapon for Bow {
    fn name(&self) -> &'static str {
        "bow"
    }
}

struct Armor(u32);

#[derive(Debug, PartialEq)]
enum Built {
    Bare,
    Armed(&'static str),
    Armored(&'static str, u32),
}

struct Knight {
    built: Built,
}

fn knight_plan() -> TypePlan<Knight> {
    TypePlan::new()
        .constructor(Constructor::new("bare", |_| Ok(Knight { built: Built::Bare })))
        .constructor(
            Constructor::new("armed", |args| {
                let weapon = args.take_trait::<dyn Weapon>()?;
                Ok(Knight { built: Built::Armed(weapon.name()) })
            })
            .param(Param::of_trait::<dyn Weapon>("weapon")),
        )
        .constructor(
            Constructor::new("armored", |args| {
                let weapon = args.take_trait::<dyn Weapon>()?;
                let armor = args.take::<Armor>()?;
                Ok(Knight { built: Built::Armored(weapon.name(), armor.0) })
            })
            .param(Param::of_trait::<dyn Weapon>("weapon"))
            .param(Param::of::<Armor>("armor")),
        )
}

impl Injectable for Knight {
    fn plan() -> TypePlan<Self> {
        knight_plan()
    }
}

#[test]
fn widest_satisfiable_constructor_wins() {
    let mut builder = ContainerBuilder::new();
    builder.register::<Knight>(Lifetime::Transient).unwrap();
    let root = builder.build_scope().unwrap();
    assert_eq!(root.get_required::<Knight>().built, Built::Bare);

    let mut builder = ContainerBuilder::new();
    builder.register_trait_instance::<dyn Weapon>(Arc::new(Sword)).unwrap();
    builder.register::<Knight>(Lifetime::Transient).unwrap();
    let root = builder.build_scope().unwrap();
    assert_eq!(root.get_required::<Knight>().built, Built::Armed("sword"));

    let mut builder = ContainerBuilder::new();
    builder.register_trait_instance::<dyn Weapon>(Arc::new(Sword)).unwrap();
    builder.register_instance(Armor(3)).unwrap();
    builder.register::<Knight>(Lifetime::Transient).unwrap();
    let root = builder.build_scope().unwrap();
    assert_eq!(root.get_required::<Knight>().built, Built::Armored("sword", 3));
}

#[test]
fn child_registrations_widen_constructor_choice() {
    let mut builder = ContainerBuilder::new();
    builder.register_trait_instance::<dyn Weapon>(Arc::new(Bow)).unwrap();
    builder.register::<Knight>(Lifetime::Transient).unwrap();
    let root = builder.build_scope().unwrap();

    let child = root
        .create_child_with(|b: &mut ContainerBuilder| -> arbor_di::DiResult<()> {
            b.register_instance(Armor(5))?;
            Ok(())
        })
        .unwrap();

    assert_eq!(root.get_required::<Knight>().built, Built::Armed("bow"));
    assert_eq!(child.get_required::<Knight>().built, Built::Armored("bow", 5));
}

#[test]
fn constructor_hint_overrides_selection() {
    let mut builder = ContainerBuilder::new();
    builder.register_trait_instance::<dyn Weapon>(Arc::new(Sword)).unwrap();
    builder.register_instance(Armor(3)).unwrap();
    builder
        .register::<Knight>(Lifetime::Transient)
        .unwrap()
        .with_constructor("bare");
    let root = builder.build_scope().unwrap();
    assert_eq!(root.get_required::<Knight>().built, Built::Bare);
}

#[test]
fn unknown_constructor_hint_fails_compilation() {
    let mut builder = ContainerBuilder::new();
    builder
        .register::<Knight>(Lifetime::Transient)
        .unwrap()
        .with_constructor("mounted");
    let err = builder.build().unwrap_err();
    assert!(matches!(
        err,
        DiError::Configuration(ConfigurationError::UnknownConstructor { constructor: "mounted", .. })
    ));
}

#[test]
fn marked_constructor_wins_even_when_narrower() {
    let plan = TypePlan::new()
        .constructor(Constructor::new("default", |_| Ok(Knight { built: Built::Bare })).inject())
        .constructor(
            Constructor::new("armed", |args| {
                Ok(Knight { built: Built::Armed(args.take_trait::<dyn Weapon>()?.name()) })
            })
            .param(Param::of_trait::<dyn Weapon>("weapon")),
        );

    let mut builder = ContainerBuilder::new();
    builder.register_trait_instance::<dyn Weapon>(Arc::new(Sword)).unwrap();
    builder.register_plan(plan, Lifetime::Transient).unwrap();
    let root = builder.build_scope().unwrap();
    assert_eq!(root.get_required::<Knight>().built, Built::Bare);
}

#[test]
fn several_marked_constructors_are_rejected() {
    let plan = TypePlan::new()
        .constructor(Constructor::new("a", |_| Ok(Knight { built: Built::Bare })).inject())
        .constructor(Constructor::new("b", |_| Ok(Knight { built: Built::Bare })).inject());

    let mut builder = ContainerBuilder::new();
    builder.register_plan(plan, Lifetime::Transient).unwrap();
    match builder.build() {
        Err(DiError::Configuration(ConfigurationError::MultipleInjectConstructors { constructors, .. })) => {
            assert_eq!(constructors, vec!["a", "b"]);
        }
        other => panic!("expected MultipleInjectConstructors, got {:?}", other.err()),
    }
}

#[test]
fn plan_without_constructors_is_rejected() {
    let mut builder = ContainerBuilder::new();
    builder
        .register_plan(TypePlan::<Knight>::new(), Lifetime::Transient)
        .unwrap();
    assert!(matches!(
        builder.build(),
        Err(DiError::Configuration(ConfigurationError::NoConstructor(_)))
    ));
}

#[test]
fn equally_wide_constructors_are_ambiguous() {
    let plan = TypePlan::new()
        .constructor(
            Constructor::new("with_weapon", |args| {
                Ok(Knight { built: Built::Armed(args.take_trait::<dyn Weapon>()?.name()) })
            })
            .param(Param::of_trait::<dyn Weapon>("weapon")),
        )
        .constructor(
            Constructor::new("with_armor", |args| {
                Ok(Knight { built: Built::Armored("fists", args.take::<Armor>()?.0) })
            })
            .param(Param::of::<Armor>("armor")),
        );

    let mut builder = ContainerBuilder::new();
    builder.register_trait_instance::<dyn Weapon>(Arc::new(Sword)).unwrap();
    builder.register_instance(Armor(1)).unwrap();
    builder.register_plan(plan, Lifetime::Transient).unwrap();
    let root = builder.build_scope().unwrap();

    match root.get::<Knight>() {
        Err(DiError::AmbiguousConstructor { candidates, .. }) => {
            assert_eq!(candidates, vec!["with_weapon", "with_armor"]);
        }
        other => panic!("expected AmbiguousConstructor, got {:?}", other.err()),
    }
}

#[test]
fn overrides_by_name_and_by_contract() {
    let mut builder = ContainerBuilder::new();
    builder.register_trait_instance::<dyn Weapon>(Arc::new(Sword)).unwrap();
    builder
        .register::<Knight>(Lifetime::Transient)
        .unwrap()
        .with_trait_parameter::<dyn Weapon>("weapon", Arc::new(Bow))
        .with_parameter_of(Armor(9));
    let root = builder.build_scope().unwrap();

    // The override makes "armored" satisfiable without a registered Armor
    assert_eq!(root.get_required::<Knight>().built, Built::Armored("bow", 9));
}

#[test]
fn collection_and_optional_parameters() {
    struct Arsenal {
        weapons: Vec<&'static str>,
        armor: Option<u32>,
    }

    let plan = TypePlan::new().constructor(
        Constructor::new("new", |args| {
            let weapons = args.take_all_trait::<dyn Weapon>()?;
            let armor = args.take_optional::<Armor>()?;
            Ok(Arsenal {
                weapons: weapons.iter().map(|w| w.name()).collect(),
                armor: armor.map(|a| a.0),
            })
        })
        .param(Param::all_trait::<dyn Weapon>("weapons"))
        .param(Param::of::<Armor>("armor").optional()),
    );

    let mut builder = ContainerBuilder::new();
    builder.register_trait_instance::<dyn Weapon>(Arc::new(Sword)).unwrap();
    builder.register_trait_instance::<dyn Weapon>(Arc::new(Bow)).unwrap();
    builder.register_plan(plan, Lifetime::Transient).unwrap();
    let root = builder.build_scope().unwrap();

    let arsenal = root.get_required::<Arsenal>();
    assert_eq!(arsenal.weapons, vec!["sword", "bow"]);
    assert_eq!(arsenal.armor, None);
}

#[test]
fn named_parameter_resolves_keyed_registration() {
    struct Gate {
        port: u16,
    }

    let plan = TypePlan::new().constructor(
        Constructor::new("new", |args| Ok(Gate { port: *args.take::<u16>()? }))
            .param(Param::of::<u16>("port").named("admin")),
    );

    let mut builder = ContainerBuilder::new();
    builder.register_instance(80u16).unwrap();
    builder.register_instance(8443u16).unwrap().named("admin");
    builder.register_plan(plan, Lifetime::Transient).unwrap();
    let root = builder.build_scope().unwrap();

    assert_eq!(root.get_required::<Gate>().port, 8443);
}

#[test]
fn members_are_injected_in_declaration_order() {
    struct Hero {
        weapon: Option<Arc<dyn Weapon>>,
        armor: Option<Arc<Armor>>,
        log: Vec<&'static str>,
    }

    let plan = TypePlan::new()
        .constructor(Constructor::new("new", |_| {
            Ok(Hero { weapon: None, armor: None, log: vec!["constructed"] })
        }))
        .member(InjectionPoint::trait_field::<dyn Weapon, _>("weapon", |h: &mut Hero, w| {
            h.weapon = Some(w);
            h.log.push("weapon");
        }))
        .member(
            InjectionPoint::method("equip", |h: &mut Hero, args| {
                h.armor = Some(args.take::<Armor>()?);
                h.log.push("equip");
                Ok(())
            })
            .param(Param::of::<Armor>("armor")),
        );

    let mut builder = ContainerBuilder::new();
    builder.register_trait_instance::<dyn Weapon>(Arc::new(Sword)).unwrap();
    builder.register_instance(Armor(2)).unwrap();
    builder.register_plan(plan, Lifetime::Transient).unwrap();
    let root = builder.build_scope().unwrap();

    let hero = root.get_required::<Hero>();
    assert_eq!(hero.weapon.as_ref().unwrap().name(), "sword");
    assert_eq!(hero.armor.as_ref().unwrap().0, 2);
    assert_eq!(hero.log, vec!["constructed", "weapon", "equip"]);
}

#[test]
fn factory_registrations_accept_injection_points() {
    struct Counter {
        hits: Vec<&'static str>,
    }

    let mut builder = ContainerBuilder::new();
    builder.register_instance(Armor(1)).unwrap();
    builder
        .register_factory(Lifetime::Transient, |_| Ok(Counter { hits: Vec::new() }))
        .unwrap()
        .inject(InjectionPoint::field::<Armor, _>("armor", |c: &mut Counter, _| c.hits.push("armor")))
        .inject(InjectionPoint::method("ready", |c: &mut Counter, _| {
            c.hits.push("ready");
            Ok(())
        }));
    let root = builder.build_scope().unwrap();

    assert_eq!(root.get_required::<Counter>().hits, vec!["armor", "ready"]);
}

#[test]
fn instances_cannot_receive_member_injection() {
    let mut builder = ContainerBuilder::new();
    builder.register_instance(Armor(1)).unwrap();
    builder
        .register_instance(String::from("frozen"))
        .unwrap()
        .inject(InjectionPoint::field::<Armor, _>("armor", |_: &mut String, _| {}));

    assert!(matches!(
        builder.build(),
        Err(DiError::Configuration(ConfigurationError::InjectIntoInstance(_)))
    ));
}
