//! Registry trait for self-registering implementations.
//!
//! Every pluggable backend (storage, payment) declares the name it is
//! configured under and the factory that builds it.

/// Base trait for implementation registries.
///
/// Each implementation module must provide a Registry struct that implements
/// this trait, so the builder can map configuration names to factories.
pub trait ImplementationRegistry {
	/// The name used in configuration files to reference this implementation.
	///
	/// This should match the key used in the TOML configuration, for example
	/// "memory" for `storage.implementations.memory` or "http" for
	/// `payment.implementations.http`.
	const NAME: &'static str;

	/// The factory function type this implementation provides.
	type Factory;

	/// Get the factory function for this implementation.
	fn factory() -> Self::Factory;
}
