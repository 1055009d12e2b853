//! Core application framework functionality.
//!
//! [Application] owns the [SharedContainer] for the whole lifetime of the process. Bootstrapping
//! binds application config, instantiates the selected [service providers](crate::provider) and
//! runs all `register` phases before any `boot` phase.

use crate::config::ApplicationConfig;
use crate::config_repository::{ConfigRepository, ConfigRepositoryError, CONFIG_KEY};
use crate::provider::{discovered_providers, ProviderDefinition, ServiceProviderPtr};
use armature_di::binding::Resolver;
use armature_di::container::{ContainerBuilder, SharedContainer};
use armature_di::instance::ErrorPtr;
use armature_di::ContainerError;
use config::ConfigError;
use fxhash::FxHashMap;
use itertools::Itertools;
use std::cmp::Reverse;
use thiserror::Error;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("Error loading application config: {0}")]
    Config(#[from] ConfigError),
    #[error("Error loading config repository: {0}")]
    ConfigRepository(#[from] ConfigRepositoryError),
    #[error("Unknown service provider: {0}")]
    UnknownProvider(String),
    #[error("Error registering service provider '{provider}': {error}")]
    ProviderRegistration { provider: String, error: ErrorPtr },
    #[error("Error booting service provider '{provider}': {error}")]
    ProviderBoot { provider: String, error: ErrorPtr },
    #[error("Container error: {0}")]
    Container(#[from] ContainerError),
    #[error("Application has already been bootstrapped")]
    AlreadyBootstrapped,
}

struct LoadedProvider {
    name: &'static str,
    provider: ServiceProviderPtr,
}

/// Main entrypoint for the application. Bootstraps the container from
/// [ServiceProviders](crate::provider::ServiceProvider).
pub struct Application {
    config: ApplicationConfig,
    container: SharedContainer,
    definitions: Vec<ProviderDefinition>,
    providers: Vec<LoadedProvider>,
    bootstrapped: bool,
}

impl Application {
    pub fn new(config: ApplicationConfig) -> Self {
        Self::with_container(config, ContainerBuilder::new().build().into())
    }

    /// Creates an application bootstrapping given container.
    pub fn with_container(config: ApplicationConfig, container: SharedContainer) -> Self {
        Self {
            config,
            container,
            definitions: vec![],
            providers: vec![],
            bootstrapped: false,
        }
    }

    /// Adds a provider definition besides the discovered ones. Replaces a discovered definition
    /// with the same name.
    pub fn with_provider(mut self, definition: ProviderDefinition) -> Self {
        self.definitions.push(definition);
        self
    }

    #[inline]
    pub fn config(&self) -> &ApplicationConfig {
        &self.config
    }

    #[inline]
    pub fn container(&self) -> &SharedContainer {
        &self.container
    }

    /// Names of instantiated providers, in the order they were run.
    pub fn provider_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.providers.iter().map(|provider| provider.name)
    }

    /// Runs the whole bootstrap sequence and returns the populated container. Can only be called
    /// once, even if a previous call failed.
    pub fn bootstrap(&mut self) -> Result<SharedContainer, ApplicationError> {
        if self.bootstrapped {
            return Err(ApplicationError::AlreadyBootstrapped);
        }

        self.bootstrapped = true;

        if self.config.install_tracing_logger {
            self.install_tracing_logger();
        }

        info!("Loading application config...");
        self.bind_config()?;

        info!("Instantiating service providers...");
        self.providers = self.create_providers()?;

        info!("Registering service providers...");
        for LoadedProvider { name, provider } in &self.providers {
            debug!(provider = name, "Registering provider.");
            provider
                .register()
                .map_err(|error| ApplicationError::ProviderRegistration {
                    provider: name.to_string(),
                    error,
                })?;
        }

        info!("Booting service providers...");
        for LoadedProvider { name, provider } in &self.providers {
            debug!(provider = name, "Booting provider.");
            provider
                .boot()
                .map_err(|error| ApplicationError::ProviderBoot {
                    provider: name.to_string(),
                    error,
                })?;
        }

        Ok(self.container.clone())
    }

    fn install_tracing_logger(&self) {
        if tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .try_init()
            .is_err()
        {
            debug!("Global tracing subscriber already installed.");
        }
    }

    fn bind_config(&self) -> Result<(), ApplicationError> {
        let repository = self
            .config
            .config_directory
            .as_ref()
            .map(ConfigRepository::load)
            .transpose()?
            .unwrap_or_default();

        self.container
            .with(|container| container.singleton(CONFIG_KEY, Resolver::value(repository)))
            .map_err(ApplicationError::Container)
    }

    fn create_providers(&self) -> Result<Vec<LoadedProvider>, ApplicationError> {
        let definitions: FxHashMap<&str, ProviderDefinition> = discovered_providers()
            .copied()
            .chain(self.definitions.iter().copied())
            .map(|definition| (definition.name, definition))
            .collect();

        if let Some(names) = &self.config.providers {
            return names
                .iter()
                .unique()
                .map(|name| {
                    definitions
                        .get(name.as_str())
                        .map(|definition| self.create_provider(definition))
                        .ok_or_else(|| ApplicationError::UnknownProvider(name.clone()))
                })
                .try_collect();
        }

        Ok(definitions
            .values()
            .map(|definition| self.create_provider(definition))
            .sorted_by_key(|provider| (Reverse(provider.provider.priority()), provider.name))
            .collect())
    }

    fn create_provider(&self, definition: &ProviderDefinition) -> LoadedProvider {
        debug!(provider = definition.name, "Creating provider.");
        LoadedProvider {
            name: definition.name,
            provider: (definition.create)(self.container.clone()),
        }
    }
}

/// Creates an [Application] with [ApplicationConfig] loaded from the environment.
pub fn create_default() -> Result<Application, ApplicationError> {
    ApplicationConfig::init_from_environment()
        .map(Application::new)
        .map_err(ApplicationError::Config)
}

#[cfg(test)]
mod tests {
    use crate::application::{Application, ApplicationError};
    use crate::config::ApplicationConfig;
    use crate::config_repository::{ConfigRepository, CONFIG_KEY};
    use crate::provider::{
        FromContainer, MockServiceProvider, ProviderDefinition, ServiceProvider,
        ServiceProviderPtr,
    };
    use armature_di::binding::Resolver;
    use armature_di::container::SharedContainer;
    use armature_di::instance::{error_ptr, ErrorPtr};
    use armature_di::ContainerError;
    use std::sync::Mutex;
    use tempfile::tempdir;

    struct BootCheckProvider {
        container: SharedContainer,
    }

    impl FromContainer for BootCheckProvider {
        fn from_container(container: SharedContainer) -> Self {
            Self { container }
        }
    }

    impl ServiceProvider for BootCheckProvider {
        fn register(&self) -> Result<(), ErrorPtr> {
            self.container
                .with(|container| container.singleton("boot_check.value", Resolver::value(7_u8)))
                .map_err(error_ptr)
        }

        fn boot(&self) -> Result<(), ErrorPtr> {
            let value = self
                .container
                .with(|container| container.resolve_typed::<u8>("boot_check.value"))
                .map_err(error_ptr)?;

            self.container
                .with(|container| {
                    container.singleton("boot_check.booted", Resolver::value(*value + 1))
                })
                .map_err(error_ptr)
        }
    }

    crate::register_provider!("boot_check", BootCheckProvider);

    fn config() -> ApplicationConfig {
        ApplicationConfig::default().with_tracing_logger(false)
    }

    fn logging_provider(
        log: &'static Mutex<Vec<String>>,
        name: &'static str,
        priority: i8,
    ) -> ServiceProviderPtr {
        let mut provider = MockServiceProvider::new();
        provider.expect_register().times(1).returning(move || {
            log.lock().unwrap().push(format!("{name}.register"));
            Ok(())
        });
        provider.expect_boot().times(1).returning(move || {
            log.lock().unwrap().push(format!("{name}.boot"));
            Ok(())
        });
        provider.expect_priority().return_const(priority);

        Box::new(provider)
    }

    #[test]
    fn should_register_all_before_booting() {
        static LOG: Mutex<Vec<String>> = Mutex::new(Vec::new());

        fn high(_container: SharedContainer) -> ServiceProviderPtr {
            logging_provider(&LOG, "high", 10)
        }

        fn low(_container: SharedContainer) -> ServiceProviderPtr {
            logging_provider(&LOG, "low", -10)
        }

        let mut application = Application::new(config())
            .with_provider(ProviderDefinition::new("low", low))
            .with_provider(ProviderDefinition::new("high", high));
        application.bootstrap().unwrap();

        assert_eq!(
            *LOG.lock().unwrap(),
            vec!["high.register", "low.register", "high.boot", "low.boot"]
        );
        assert_eq!(
            application.provider_names().collect::<Vec<_>>(),
            vec!["high", "boot_check", "counting", "low"]
        );
    }

    #[test]
    fn should_run_configured_providers_in_order() {
        static LOG: Mutex<Vec<String>> = Mutex::new(Vec::new());

        fn first(_container: SharedContainer) -> ServiceProviderPtr {
            logging_provider(&LOG, "first", -10)
        }

        fn second(_container: SharedContainer) -> ServiceProviderPtr {
            logging_provider(&LOG, "second", 10)
        }

        let mut application = Application::new(config().with_providers(&["first", "second"]))
            .with_provider(ProviderDefinition::new("second", second))
            .with_provider(ProviderDefinition::new("first", first));
        let container = application.bootstrap().unwrap();

        assert_eq!(
            *LOG.lock().unwrap(),
            vec!["first.register", "second.register", "first.boot", "second.boot"]
        );
        assert!(!container.with(|container| container.has("boot_check.value")));
    }

    #[test]
    fn should_give_providers_the_container() {
        let mut application = Application::new(config().with_providers(&["boot_check"]));
        let container = application.bootstrap().unwrap();

        assert_eq!(
            *container
                .with(|container| container.resolve_typed::<u8>("boot_check.booted"))
                .unwrap(),
            8
        );
    }

    #[test]
    fn should_bind_config_repository() {
        let mut application = Application::new(config().with_providers::<&str>(&[]));
        let container = application.bootstrap().unwrap();

        let repository = container
            .with(|container| container.resolve_typed::<ConfigRepository>(CONFIG_KEY))
            .unwrap();
        assert!(repository.is_empty());
    }

    #[test]
    fn should_fail_on_unknown_provider() {
        let mut application = Application::new(config().with_providers(&["missing"]));

        assert!(matches!(
            application.bootstrap().unwrap_err(),
            ApplicationError::UnknownProvider(name) if name == "missing"
        ));
    }

    #[test]
    fn should_fail_on_missing_config_directory() {
        let directory = tempdir().unwrap();
        let mut application = Application::new(
            config().with_config_directory(directory.path().join("missing").display()),
        );

        assert!(matches!(
            application.bootstrap().unwrap_err(),
            ApplicationError::ConfigRepository(_)
        ));
    }

    #[test]
    fn should_return_registration_error() {
        fn failing(_container: SharedContainer) -> ServiceProviderPtr {
            let mut provider = MockServiceProvider::new();
            provider
                .expect_register()
                .returning(|| Err(error_ptr(ContainerError::UnboundKey("a".to_string()))));
            provider.expect_boot().never();

            Box::new(provider)
        }

        let mut application = Application::new(config().with_providers(&["failing"]))
            .with_provider(ProviderDefinition::new("failing", failing));

        assert!(matches!(
            application.bootstrap().unwrap_err(),
            ApplicationError::ProviderRegistration { provider, .. } if provider == "failing"
        ));
    }

    #[test]
    fn should_return_boot_error() {
        fn failing(_container: SharedContainer) -> ServiceProviderPtr {
            let mut provider = MockServiceProvider::new();
            provider.expect_register().returning(|| Ok(()));
            provider
                .expect_boot()
                .returning(|| Err(error_ptr(ContainerError::UnboundKey("a".to_string()))));

            Box::new(provider)
        }

        let mut application = Application::new(config().with_providers(&["failing"]))
            .with_provider(ProviderDefinition::new("failing", failing));

        assert!(matches!(
            application.bootstrap().unwrap_err(),
            ApplicationError::ProviderBoot { provider, .. } if provider == "failing"
        ));
    }

    #[test]
    fn should_bootstrap_only_once() {
        let mut application = Application::new(config().with_providers::<&str>(&[]));
        application.bootstrap().unwrap();

        assert!(matches!(
            application.bootstrap().unwrap_err(),
            ApplicationError::AlreadyBootstrapped
        ));
    }

    #[test]
    fn should_reject_second_config_binding() {
        let container = SharedContainer::default();
        container
            .with(|container| container.context(CONFIG_KEY, "default", Resolver::value(0_u8)))
            .unwrap();

        let mut application =
            Application::with_container(config().with_providers::<&str>(&[]), container);

        assert!(matches!(
            application.bootstrap().unwrap_err(),
            ApplicationError::Container(ContainerError::BindingCollision { .. })
        ));
    }
}
