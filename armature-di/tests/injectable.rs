#[cfg(feature = "derive")]
mod injectable_derive_test {
    use armature_di::binding::{Lifetime, Resolver};
    use armature_di::container::Container;
    use armature_di::injectable::{DependencyType, Injectable, PrimitiveType, TypeReference};
    use armature_di::instance::InstancePtr;
    use armature_di::{ContainerError, Injectable};

    #[cfg(feature = "threadsafe")]
    trait Transport: Send + Sync {
        fn name(&self) -> &'static str;
    }

    #[cfg(not(feature = "threadsafe"))]
    trait Transport {
        fn name(&self) -> &'static str;
    }

    struct Smtp;

    impl Transport for Smtp {
        fn name(&self) -> &'static str {
            "smtp"
        }
    }

    #[derive(Injectable)]
    struct Clock;

    #[derive(Injectable)]
    struct Scheduler {
        clock: InstancePtr<Clock>,
    }

    #[derive(Injectable)]
    struct Mailer {
        scheduler: InstancePtr<Scheduler>,
        clock: InstancePtr<Clock>,
        #[inject(key = "sender")]
        sender: String,
        #[inject(key = "transport")]
        transport: InstancePtr<dyn Transport>,
        #[inject(default)]
        sent: u32,
        #[inject(default = "default_retries")]
        retries: u8,
    }

    fn default_retries() -> u8 {
        3
    }

    #[derive(Injectable)]
    struct Greeter {
        #[inject(key = "greeting", context = "en")]
        greeting: &'static str,
    }

    #[allow(dead_code)]
    #[derive(Injectable)]
    struct Wrapper(InstancePtr<Clock>, #[inject(default)] u8);

    #[derive(Debug, Injectable)]
    struct Port {
        _port: u16,
    }

    #[derive(Injectable)]
    struct Unmarked {
        _name: String,
    }

    fn mailer_container() -> Container {
        let mut container = Container::default();
        container
            .singleton("sender", Resolver::value("noreply@example.com".to_string()))
            .unwrap();

        let transport: InstancePtr<dyn Transport> = InstancePtr::new(Smtp);
        container
            .singleton("transport", Resolver::value(transport))
            .unwrap();

        container
    }

    #[test]
    fn should_record_dependencies_in_field_order() {
        let record = Mailer::capability();

        assert!(record.owner.ends_with("Mailer"));
        assert_eq!(record.dependencies.len(), 4);
        assert!(matches!(
            &record.dependencies[0],
            DependencyType::Type(reference) if *reference == TypeReference::of::<Scheduler>()
        ));
        assert!(matches!(
            &record.dependencies[1],
            DependencyType::Type(reference) if *reference == TypeReference::of::<Clock>()
        ));
        assert!(matches!(
            &record.dependencies[2],
            DependencyType::Binding { key, context: None, .. } if key == "sender"
        ));
        assert!(matches!(
            &record.dependencies[3],
            DependencyType::Binding { key, context: None, .. } if key == "transport"
        ));
    }

    #[test]
    fn should_keep_capability_record_stable() {
        assert!(std::ptr::eq(Mailer::capability(), Mailer::capability()));
        assert!(Clock::capability().dependencies.is_empty());
    }

    #[test]
    fn should_construct_dependency_graph() {
        let mut container = mailer_container();
        let mailer = container.resolve_type::<Mailer>().unwrap();

        assert_eq!(mailer.sender, "noreply@example.com");
        assert_eq!(mailer.transport.name(), "smtp");
        assert_eq!(mailer.sent, 0);
        assert_eq!(mailer.retries, 3);
        assert!(InstancePtr::ptr_eq(&mailer.clock, &mailer.scheduler.clock));
        assert!(container.is_resolved_type::<Scheduler>());
        assert!(container.is_resolved_type::<Clock>());
    }

    #[test]
    fn should_reuse_singleton_on_later_resolution() {
        let mut container = mailer_container();

        let first = container.resolve_type::<Mailer>().unwrap();
        let second = container.resolve_type::<Mailer>().unwrap();

        assert!(InstancePtr::ptr_eq(&first, &second));
    }

    #[test]
    fn should_fail_on_missing_binding() {
        let mut container = Container::default();

        assert!(matches!(
            container.resolve_type::<Mailer>().err(),
            Some(ContainerError::UnboundKey(key)) if key == "sender"
        ));
        assert!(!container.is_resolved_type::<Mailer>());
    }

    #[test]
    fn should_inject_contextual_binding() {
        let mut container = Container::default();
        container
            .context("greeting", "en", Resolver::value("hello"))
            .unwrap();
        container
            .context_with_lifetime("greeting", "de", Resolver::value("hallo"), Lifetime::Transient)
            .unwrap();

        let greeter = container.resolve_type::<Greeter>().unwrap();
        assert_eq!(greeter.greeting, "hello");
    }

    #[test]
    fn should_construct_tuple_structs() {
        let mut container = Container::default();
        let wrapper = container.resolve_type::<Wrapper>().unwrap();

        assert_eq!(wrapper.1, 0);
        assert_eq!(Wrapper::capability().dependencies.len(), 1);
    }

    #[test]
    fn should_reject_primitive_dependencies() {
        let mut container = Container::default();

        assert!(matches!(
            &Port::capability().dependencies[0],
            DependencyType::Primitive(PrimitiveType::Number)
        ));
        match container.resolve_type::<Port>().unwrap_err() {
            ContainerError::UnresolvableDependency {
                index,
                expected,
                owner,
            } => {
                assert_eq!(index, 0);
                assert_eq!(expected, "number");
                assert!(owner.ends_with("Port"));
            }
            error => panic!("unexpected error: {error}"),
        }
    }

    #[test]
    fn should_classify_string_fields() {
        assert!(matches!(
            &Unmarked::capability().dependencies[0],
            DependencyType::Primitive(PrimitiveType::String)
        ));
    }
}
