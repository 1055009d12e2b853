//! Application bootstrapping based on [armature_di] dependency injection.
//!
//! Applications are assembled from [service providers](provider::ServiceProvider), each
//! contributing bindings to a single shared container. The [Application](application::Application)
//! runs the providers in two phases - every provider registers its bindings first, then every
//! provider boots - and configures supporting infrastructure, e.g. logging and application
//! config.
//!
//! ### Features
//!
//! * `threadsafe` - use threadsafe pointers and `Send + Sync` trait bounds

pub mod application;
pub mod config;
pub mod config_repository;
pub mod provider;
