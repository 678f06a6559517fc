use arbor_di::{ContainerBuilder, DiError, Lifetime, Resolver};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

#[test]
fn test_instance_singleton() {
    let mut builder = ContainerBuilder::new();
    builder.register_instance(42usize).unwrap();
    builder.register_instance("hello".to_string()).unwrap();

    let root = builder.build_scope().unwrap();

    let num1 = root.get_required::<usize>();
    let num2 = root.get_required::<usize>();
    let str1 = root.get_required::<String>();

    assert_eq!(*num1, 42);
    assert_eq!(*str1, "hello");
    assert!(Arc::ptr_eq(&num1, &num2));
}

#[test]
fn test_factory_with_dependencies() {
    struct Config {
        port: u16,
    }

    struct Server {
        config: Arc<Config>,
        name: String,
    }

    let mut builder = ContainerBuilder::new();
    builder.register_instance(Config { port: 8080 }).unwrap();
    builder
        .register_factory(Lifetime::Singleton, |ctx| {
            Ok(Server {
                config: ctx.get::<Config>()?,
                name: "MyServer".to_string(),
            })
        })
        .unwrap();

    let root = builder.build_scope().unwrap();
    let server = root.get_required::<Server>();

    assert_eq!(server.config.port, 8080);
    assert_eq!(server.name, "MyServer");
}

#[test]
fn test_transient_creates_new_instances() {
    let counter = Arc::new(AtomicU32::new(0));
    let c = counter.clone();

    let mut builder = ContainerBuilder::new();
    builder
        .register_factory(Lifetime::Transient, move |_| {
            Ok(format!("instance-{}", c.fetch_add(1, Ordering::SeqCst) + 1))
        })
        .unwrap();

    let root = builder.build_scope().unwrap();
    let s1 = root.get_required::<String>();
    let s2 = root.get_required::<String>();

    assert_eq!(*s1, "instance-1");
    assert_eq!(*s2, "instance-2");
    assert!(!Arc::ptr_eq(&s1, &s2));
}

#[test]
fn test_singleton_factory_runs_once() {
    let counter = Arc::new(AtomicU32::new(0));
    let c = counter.clone();

    let mut builder = ContainerBuilder::new();
    builder
        .register_factory(Lifetime::Singleton, move |_| Ok(c.fetch_add(1, Ordering::SeqCst)))
        .unwrap();

    let root = builder.build_scope().unwrap();
    let child = root.create_child().unwrap();

    let a = root.get_required::<u32>();
    let b = child.get_required::<u32>();
    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(counter.load(Ordering::SeqCst), 1);
}

#[test]
fn test_trait_single_binding() {
    trait Logger: Send + Sync {
        fn log(&self, msg: &str) -> String;
    }

    struct ConsoleLogger;
    impl Logger for ConsoleLogger {
        fn log(&self, msg: &str) -> String {
            format!("Console: {}", msg)
        }
    }

    let mut builder = ContainerBuilder::new();
    builder
        .register_trait_instance::<dyn Logger>(Arc::new(ConsoleLogger))
        .unwrap();

    let root = builder.build_scope().unwrap();
    let logger = root.get_required_trait::<dyn Logger>();
    assert_eq!(logger.log("test"), "Console: test");
}

#[test]
fn test_one_instance_behind_several_contracts() {
    trait Reader: Send + Sync {
        fn read(&self) -> u32;
    }
    trait Writer: Send + Sync {
        fn write(&self, v: u32);
    }

    struct Cell(AtomicU32);
    impl Reader for Cell {
        fn read(&self) -> u32 {
            self.0.load(Ordering::SeqCst)
        }
    }
    impl Writer for Cell {
        fn write(&self, v: u32) {
            self.0.store(v, Ordering::SeqCst)
        }
    }

    let mut builder = ContainerBuilder::new();
    builder
        .register_factory(Lifetime::Scoped, |_| Ok(Cell(AtomicU32::new(0))))
        .unwrap()
        .as_trait::<dyn Reader>(|c| c)
        .as_trait::<dyn Writer>(|c| c);

    let root = builder.build_scope().unwrap();
    root.get_required_trait::<dyn Writer>().write(9);
    assert_eq!(root.get_required_trait::<dyn Reader>().read(), 9);

    // Explicit contracts replace the implicit self contract
    assert!(matches!(root.get::<Cell>(), Err(DiError::Unresolved { .. })));
}

#[test]
fn test_last_registration_wins_and_collections_keep_order() {
    let mut builder = ContainerBuilder::new();
    builder.register_instance(1u8).unwrap();
    builder.register_instance(2u8).unwrap();
    builder.register_instance(3u8).unwrap();

    let root = builder.build_scope().unwrap();
    assert_eq!(*root.get_required::<u8>(), 3);

    let all: Vec<u8> = root.get_all::<u8>().unwrap().iter().map(|v| **v).collect();
    assert_eq!(all, vec![1, 2, 3]);
}

#[test]
fn test_unresolved_versus_empty_collection() {
    let root = ContainerBuilder::new().build_scope().unwrap();

    assert!(matches!(root.get::<String>(), Err(DiError::Unresolved { .. })));
    assert!(root.get_all::<String>().unwrap().is_empty());
}

#[test]
fn test_unresolved_reports_path() {
    struct Needs;

    let mut builder = ContainerBuilder::new();
    builder
        .register_factory(Lifetime::Transient, |ctx| {
            ctx.get::<f64>()?;
            Ok(Needs)
        })
        .unwrap();
    let root = builder.build_scope().unwrap();

    match root.get::<Needs>() {
        Err(DiError::Unresolved { contract, path }) => {
            assert_eq!(contract, "f64");
            assert_eq!(path.len(), 1);
            assert!(path[0].ends_with("Needs"));
        }
        other => panic!("expected Unresolved, got {:?}", other.err()),
    }
}

#[test]
fn test_named_registrations() {
    trait Cache: Send + Sync {
        fn tier(&self) -> &'static str;
    }
    struct Tier(&'static str);
    impl Cache for Tier {
        fn tier(&self) -> &'static str {
            self.0
        }
    }

    let mut builder = ContainerBuilder::new();
    builder
        .register_trait_instance::<dyn Cache>(Arc::new(Tier("hot")))
        .unwrap()
        .named("hot");
    builder
        .register_trait_instance::<dyn Cache>(Arc::new(Tier("cold")))
        .unwrap()
        .named("cold");
    builder.register_instance("primary".to_string()).unwrap().named("db");

    let root = builder.build_scope().unwrap();
    assert_eq!(root.get_named_trait_required::<dyn Cache>("hot").tier(), "hot");
    assert_eq!(root.get_named_trait_required::<dyn Cache>("cold").tier(), "cold");
    assert_eq!(&*root.get_named_required::<String>("db"), "primary");

    // Keyed registrations do not answer the unnamed contract
    assert!(root.get_trait::<dyn Cache>().is_err());
    assert!(root.get_named::<String>("replica").is_err());
}

#[test]
fn test_factory_errors_propagate() {
    struct Flaky;

    let mut builder = ContainerBuilder::new();
    builder
        .register_factory::<Flaky, _>(Lifetime::Transient, |_| {
            Err(DiError::factory("Flaky", "connection refused"))
        })
        .unwrap();
    let root = builder.build_scope().unwrap();

    match root.get::<Flaky>() {
        Err(DiError::Factory { contract, message }) => {
            assert_eq!(contract, "Flaky");
            assert_eq!(message, "connection refused");
        }
        other => panic!("expected Factory error, got {:?}", other.err()),
    }
}

#[test]
fn test_failed_singleton_is_retried() {
    let attempts = Arc::new(AtomicU32::new(0));
    let a = attempts.clone();

    let mut builder = ContainerBuilder::new();
    builder
        .register_factory(Lifetime::Singleton, move |_| {
            if a.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(DiError::factory("u64", "first attempt fails"))
            } else {
                Ok(7u64)
            }
        })
        .unwrap();
    let root = builder.build_scope().unwrap();

    assert!(root.get::<u64>().is_err());
    assert_eq!(*root.get_required::<u64>(), 7);
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
}

#[test]
#[should_panic(expected = "Failed to resolve")]
fn test_get_required_panics_when_missing() {
    let root = ContainerBuilder::new().build_scope().unwrap();
    let _ = root.get_required::<String>();
}
