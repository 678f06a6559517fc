use arbor_di::{
    BoxError, ConfigurationError, Constructor, ContainerBuilder, ContainerOptions, DiError, Dispose, Lifetime,
    Param, Resolver, TypePlan,
};
use std::sync::Arc;

struct Repo;
struct Service {
    _repo: Arc<Repo>,
}

fn service_plan(param: Param) -> TypePlan<Service> {
    TypePlan::new().constructor(Constructor::new("new", |args| Ok(Service { _repo: args.take()? })).param(param))
}

#[test]
fn registering_after_build_is_rejected() {
    let mut builder = ContainerBuilder::new();
    builder.register_instance(1u32).unwrap();
    assert!(!builder.is_frozen());

    builder.build().unwrap();
    assert!(builder.is_frozen());

    let err = builder.register_instance(2u32).err().unwrap();
    assert!(matches!(err, DiError::Configuration(ConfigurationError::Frozen(_))));
    assert_eq!(builder.len(), 1);
}

#[test]
fn failed_build_leaves_builder_open() {
    let mut builder = ContainerBuilder::new();
    builder
        .register_plan(service_plan(Param::of::<Repo>("repo").checked()), Lifetime::Transient)
        .unwrap();
    assert!(builder.build().is_err());
    assert!(!builder.is_frozen());

    builder.register_factory(Lifetime::Singleton, |_| Ok(Repo)).unwrap();
    let root = builder.build_scope().unwrap();
    assert!(root.get::<Service>().is_ok());
}

#[test]
fn checked_parameter_must_be_registered() {
    let mut builder = ContainerBuilder::new();
    builder
        .register_plan(service_plan(Param::of::<Repo>("repo").checked()), Lifetime::Transient)
        .unwrap();

    match builder.build() {
        Err(DiError::Configuration(ConfigurationError::MissingDependency { parameter, contract, .. })) => {
            assert_eq!(parameter, "repo");
            assert!(contract.ends_with("Repo"));
        }
        other => panic!("expected MissingDependency, got {:?}", other.err()),
    }
}

#[test]
fn unchecked_parameters_are_validated_on_demand() {
    let mut builder = ContainerBuilder::new();
    builder
        .register_plan(service_plan(Param::of::<Repo>("repo")), Lifetime::Transient)
        .unwrap();
    // Deferred to resolution by default
    let root = builder.build_scope().unwrap();
    assert!(matches!(root.get::<Service>(), Err(DiError::Unresolved { .. })));

    let mut builder = ContainerBuilder::with_options(ContainerOptions::default().validate_all_dependencies(true));
    builder
        .register_plan(service_plan(Param::of::<Repo>("repo")), Lifetime::Transient)
        .unwrap();
    assert!(matches!(
        builder.build(),
        Err(DiError::Configuration(ConfigurationError::MissingDependency { .. }))
    ));
}

#[test]
fn checked_parameter_can_be_satisfied_by_parent_or_override() {
    let mut root = ContainerBuilder::new();
    root.register_factory(Lifetime::Singleton, |_| Ok(Repo)).unwrap();
    let root = root.build_scope().unwrap();

    let child = root
        .create_child_with(|b: &mut ContainerBuilder| -> arbor_di::DiResult<()> {
            b.register_plan(service_plan(Param::of::<Repo>("repo").checked()), Lifetime::Scoped)?;
            Ok(())
        })
        .unwrap();
    assert!(child.get::<Service>().is_ok());

    let mut builder = ContainerBuilder::new();
    builder
        .register_plan(service_plan(Param::of::<Repo>("repo").checked()), Lifetime::Transient)
        .unwrap()
        .with_parameter("repo", Repo);
    assert!(builder.build().is_ok());
}

#[test]
fn singleton_capturing_scoped_builds_by_default() {
    let mut builder = ContainerBuilder::new();
    builder.register_factory(Lifetime::Scoped, |_| Ok(Repo)).unwrap();
    builder
        .register_plan(service_plan(Param::of::<Repo>("repo")), Lifetime::Singleton)
        .unwrap();

    let root = builder.build_scope().unwrap();
    let child = root.create_child().unwrap();
    assert!(Arc::ptr_eq(&root.get_required::<Service>(), &child.get_required::<Service>()));
}

#[test]
fn singleton_capturing_scoped_is_reported_when_strict() {
    let mut builder = ContainerBuilder::with_options(ContainerOptions::default().reject_captive_scoped(true));
    builder.register_factory(Lifetime::Scoped, |_| Ok(Repo)).unwrap();
    builder
        .register_plan(service_plan(Param::of::<Repo>("repo")), Lifetime::Singleton)
        .unwrap();

    match builder.build() {
        Err(DiError::Configuration(ConfigurationError::CaptiveScoped { implementation, dependency })) => {
            assert!(implementation.ends_with("Service"));
            assert!(dependency.ends_with("Repo"));
        }
        other => panic!("expected CaptiveScoped, got {:?}", other.err()),
    }
}

#[test]
fn singleton_capturing_disposable_transient_is_reported() {
    struct Handle;
    impl Dispose for Handle {
        fn dispose(&self) -> Result<(), BoxError> {
            Ok(())
        }
    }
    struct Owner {
        _handle: Arc<Handle>,
    }

    let plan = TypePlan::new().constructor(
        Constructor::new("new", |args| Ok(Owner { _handle: args.take()? })).param(Param::of::<Handle>("handle")),
    );

    let mut builder = ContainerBuilder::new();
    builder
        .register_factory(Lifetime::Transient, |_| Ok(Handle))
        .unwrap()
        .disposable();
    builder.register_plan(plan, Lifetime::Singleton).unwrap();

    assert!(matches!(
        builder.build(),
        Err(DiError::Configuration(ConfigurationError::CaptiveDisposable { .. }))
    ));
}

#[test]
fn captive_check_can_be_disabled() {
    struct Handle;
    impl Dispose for Handle {
        fn dispose(&self) -> Result<(), BoxError> {
            Ok(())
        }
    }
    struct Owner {
        _handle: Arc<Handle>,
    }

    // Turning the check off also silences the scoped half
    let options = ContainerOptions::default()
        .captive_dependency_check(false)
        .reject_captive_scoped(true);
    let mut builder = ContainerBuilder::with_options(options);
    builder.register_factory(Lifetime::Scoped, |_| Ok(Repo)).unwrap();
    builder
        .register_factory(Lifetime::Transient, |_| Ok(Handle))
        .unwrap()
        .disposable();
    builder
        .register_plan(service_plan(Param::of::<Repo>("repo")), Lifetime::Singleton)
        .unwrap();
    builder
        .register_plan(
            TypePlan::new().constructor(
                Constructor::new("new", |args| Ok(Owner { _handle: args.take()? }))
                    .param(Param::of::<Handle>("handle")),
            ),
            Lifetime::Singleton,
        )
        .unwrap();

    let root = builder.build_scope().unwrap();
    assert!(root.get::<Service>().is_ok());
    assert!(root.get::<Owner>().is_ok());
}

#[test]
fn scoped_and_transient_may_depend_on_anything() {
    let mut builder = ContainerBuilder::new();
    builder.register_factory(Lifetime::Scoped, |_| Ok(Repo)).unwrap();
    builder
        .register_plan(service_plan(Param::of::<Repo>("repo")), Lifetime::Scoped)
        .unwrap();
    assert!(builder.build().is_ok());
}

#[test]
fn descriptors_reflect_registrations() {
    trait Clock: Send + Sync {}
    struct System;
    impl Clock for System {}

    let mut builder = ContainerBuilder::new();
    builder
        .register_factory(Lifetime::Singleton, |_| Ok(System))
        .unwrap()
        .as_trait::<dyn Clock>(|s| s)
        .named("utc");
    builder
        .register_plan(service_plan(Param::of::<Repo>("repo")), Lifetime::Transient)
        .unwrap();

    let descriptors = builder.descriptors();
    assert_eq!(descriptors.len(), 2);
    assert_eq!(descriptors[0].lifetime, Lifetime::Singleton);
    assert_eq!(descriptors[0].service_name(), Some("utc"));
    assert!(descriptors[0].provides(&arbor_di::key_of_trait::<dyn Clock>().with_name("utc")));
    assert_eq!(descriptors[1].constructors, vec!["new"]);
    assert_eq!(descriptors[1].activation, arbor_di::Activation::Plan);

    let container = builder.build().unwrap();
    assert_eq!(container.descriptors().len(), 2);
}
