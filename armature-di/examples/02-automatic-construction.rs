// note: this example assumes you've analyzed the previous one

use armature_di::binding::Resolver;
use armature_di::container::Container;
use armature_di::instance::InstancePtr;
use armature_di::Injectable;

// injectable types can be constructed by the container without any binding
#[derive(Injectable)]
struct Clock;

impl Clock {
    fn now(&self) -> &'static str {
        "12:00"
    }
}

#[derive(Injectable)]
struct Newsletter {
    // dependencies on other injectable types are constructed recursively
    clock: InstancePtr<Clock>,
    // primitives cannot be constructed, so they need an explicit binding
    #[inject(key = "sender")]
    sender: String,
    // some fields are not dependencies at all
    #[inject(default)]
    issues: u32,
}

impl Newsletter {
    fn send(&self) {
        println!(
            "Sending issue {} from {} at {}",
            self.issues + 1,
            self.sender,
            self.clock.now()
        );
    }
}

#[derive(Injectable)]
struct Unbound {
    _port: u16,
}

fn main() {
    let mut container = Container::default();
    container
        .singleton("sender", Resolver::value("news@example.com".to_string()))
        .expect("error binding sender");

    let newsletter = container
        .resolve_type::<Newsletter>()
        .expect("error constructing Newsletter");

    // prints "Sending issue 1 from news@example.com at 12:00"
    newsletter.send();

    // fields without a binding fail with an actionable error
    if let Err(error) = container.resolve_type::<Unbound>() {
        // prints "Cannot resolve parameter #0 of type number for ..."
        println!("{error}");
    }
}
