use armature::application;
use armature::provider::{FromContainer, ServiceProvider};
use armature::register_provider;
use armature_di::binding::Resolver;
use armature_di::container::SharedContainer;
use armature_di::instance::{error_ptr, ErrorPtr};

struct Greeter {
    greeting: &'static str,
}

// this is a service provider, which will be discovered and run when the application bootstraps
struct GreeterProvider {
    container: SharedContainer,
}

// providers get the shared container when created
impl FromContainer for GreeterProvider {
    fn from_container(container: SharedContainer) -> Self {
        Self { container }
    }
}

impl ServiceProvider for GreeterProvider {
    // register is called first on all providers and should only install bindings
    fn register(&self) -> Result<(), ErrorPtr> {
        self.container
            .with(|container| {
                container.singleton(
                    "greeter",
                    Resolver::factory(|| Greeter {
                        greeting: "Hello world!",
                    }),
                )
            })
            .map_err(error_ptr)
    }

    // boot is called after all providers have registered, so everything can be resolved
    fn boot(&self) -> Result<(), ErrorPtr> {
        let greeter = self
            .container
            .with(|container| container.resolve_typed::<Greeter>("greeter"))
            .map_err(error_ptr)?;

        println!("{}", greeter.greeting);
        Ok(())
    }
}

// make the provider discoverable under a name
register_provider!("greeter", GreeterProvider);

// note: for the sake of simplicity, errors are unwrapped, rather than gracefully handled
fn main() {
    // create our application, which will detect all providers
    let mut application =
        application::create_default().expect("unable to create default application");

    // prints "Hello world!"
    application
        .bootstrap()
        .expect("error bootstrapping application");
}
