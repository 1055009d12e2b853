// note: this example assumes you've analyzed the previous one

use armature::application::Application;
use armature::config::ApplicationConfig;
use armature::config_repository::{ConfigRepository, CONFIG_KEY};
use armature::provider::{FromContainer, ServiceProvider};
use armature::register_provider;
use armature_di::container::SharedContainer;
use armature_di::instance::{error_ptr, ErrorPtr};
use serde::Deserialize;
use std::fs;

#[derive(Deserialize)]
struct ServerConfig {
    port: u16,
}

struct ServerProvider {
    container: SharedContainer,
}

impl FromContainer for ServerProvider {
    fn from_container(container: SharedContainer) -> Self {
        Self { container }
    }
}

impl ServiceProvider for ServerProvider {
    fn register(&self) -> Result<(), ErrorPtr> {
        Ok(())
    }

    // application config files are available as a single repository bound under CONFIG_KEY
    fn boot(&self) -> Result<(), ErrorPtr> {
        let config = self
            .container
            .with(|container| container.resolve_typed::<ConfigRepository>(CONFIG_KEY))
            .map_err(error_ptr)?;

        let server = config.get::<ServerConfig>("server").map_err(error_ptr)?;
        println!("Listening on port: {}", server.port);
        Ok(())
    }
}

register_provider!("server", ServerProvider);

fn main() {
    // every file in the config directory becomes a section named after the file
    let directory = tempfile::tempdir().expect("error creating config directory");
    fs::write(directory.path().join("server.json"), r#"{ "port": 8080 }"#)
        .expect("error writing config file");

    // application config is usually loaded from armature.json and ARMATURE_ environment
    // variables, but can also be created manually
    let config = ApplicationConfig::default()
        .with_tracing_logger(false)
        .with_config_directory(directory.path().display());

    // prints "Listening on port: 8080"
    Application::new(config)
        .bootstrap()
        .expect("error bootstrapping application");
}
