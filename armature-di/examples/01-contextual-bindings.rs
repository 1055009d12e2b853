// note: this example assumes you've analyzed the previous one

use armature_di::binding::{Lifetime, Resolver};
use armature_di::container::Container;

struct Connection {
    url: &'static str,
}

fn main() {
    let mut container = Container::default();

    // a single key can hold multiple implementations selected by a context key
    container
        .context(
            "database",
            "primary",
            Resolver::factory(|| Connection {
                url: "postgres://primary",
            }),
        )
        .expect("error binding primary database");

    // contextual entries can have their own lifetime
    container
        .context_with_lifetime(
            "database",
            "replica",
            Resolver::factory(|| Connection {
                url: "postgres://replica",
            }),
            Lifetime::Transient,
        )
        .expect("error binding replica database");

    let replica = container
        .resolve_contextual_typed::<Connection>("database", "replica")
        .expect("error resolving replica database");

    // prints "Using: postgres://replica"
    println!("Using: {}", replica.url);

    // a contextual key cannot be resolved without a context
    if let Err(error) = container.resolve("database") {
        // prints "Context key required to resolve contextual binding: database"
        println!("{error}");
    }

    // plain and contextual bindings cannot be mixed under one key
    assert!(container
        .singleton("database", Resolver::value("oops"))
        .is_err());
}
