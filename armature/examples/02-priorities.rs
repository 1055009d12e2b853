// note: this example assumes you've analyzed the previous one

use armature::application;
use armature::provider::{FromContainer, ServiceProvider};
use armature::register_provider;
use armature_di::container::SharedContainer;
use armature_di::instance::ErrorPtr;

struct PrintHelloProvider;

impl FromContainer for PrintHelloProvider {
    fn from_container(_container: SharedContainer) -> Self {
        Self
    }
}

impl ServiceProvider for PrintHelloProvider {
    fn register(&self) -> Result<(), ErrorPtr> {
        print!("Hello ");
        Ok(())
    }

    // for ordered registration of providers, priorities can be used
    fn priority(&self) -> i8 {
        2
    }
}

struct PrintWorldProvider;

impl FromContainer for PrintWorldProvider {
    fn from_container(_container: SharedContainer) -> Self {
        Self
    }
}

impl ServiceProvider for PrintWorldProvider {
    fn register(&self) -> Result<(), ErrorPtr> {
        print!("world");
        Ok(())
    }

    fn priority(&self) -> i8 {
        1
    }

    // boot always runs after every provider has registered
    fn boot(&self) -> Result<(), ErrorPtr> {
        println!("!");
        Ok(())
    }
}

register_provider!("print_hello", PrintHelloProvider);
register_provider!("print_world", PrintWorldProvider);

// note: setting ARMATURE_PROVIDERS=print_world,print_hello runs the providers in the given order
fn main() {
    let mut application =
        application::create_default().expect("unable to create default application");

    // prints "Hello world!"
    application
        .bootstrap()
        .expect("error bootstrapping application");
}
