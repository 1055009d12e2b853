use armature_di::binding::Resolver;
use armature_di::container::Container;
use armature_di::instance::InstancePtr;

// this is a simple service we would like to share across the application
#[derive(Default)]
struct Email {
    sent: u32,
}

fn main() {
    let mut container = Container::default();

    // singletons are constructed once, on first resolution, and then reused
    container
        .singleton("email", Resolver::factory(Email::default))
        .expect("error binding email");

    // transient bindings produce a new instance on every resolution
    container
        .transient("id", Resolver::factory(|| 42_u64))
        .expect("error binding id");

    let first = container
        .resolve_typed::<Email>("email")
        .expect("error resolving email");
    let second = container
        .resolve_typed::<Email>("email")
        .expect("error resolving email");

    // prints "Same email: true, sent: 0"
    println!(
        "Same email: {}, sent: {}",
        InstancePtr::ptr_eq(&first, &second),
        first.sent
    );

    // prints "Has email: true, has missing: false"
    println!(
        "Has email: {}, has missing: {}",
        container.has("email"),
        container.has("missing")
    );
}
