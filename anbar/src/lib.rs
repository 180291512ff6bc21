//! # Anbar: dependency resolution and field injection for Rust
//!
//! Keys name contracts and classes by their fully-qualified path. A
//! [`Container`] resolves them through an ordered chain of factories,
//! caches singletons, and activates classes in two phases: declared fields
//! are injected before the class finishes construction.
//!
//! ```rust
//! use anbar::prelude::*;
//!
//! #[derive(Injectable)]
//! struct Logger;
//!
//! #[derive(Injectable)]
//! #[injectable(construct = "Greeter::init")]
//! struct Greeter {
//!     #[inject]
//!     logger: Inject<Logger>,
//!     greeting: String,
//! }
//!
//! impl Greeter {
//!     fn init(&mut self, args: &Args) -> Result<()> {
//!         self.logger.get()?;
//!         self.greeting = args.cloned::<String>(0)?;
//!         Ok(())
//!     }
//! }
//!
//! let container = Container::builder().build().expect("container");
//! let greeter: Greeter = container.create(Args::new().with(String::from("hi"))).expect("greeter");
//! assert_eq!(greeter.greeting, "hi");
//! ```

extern crate self as anbar;

pub use anbar_container::*;
pub use anbar_macros::Injectable;
pub use anbar_support::rendering;

#[doc(hidden)]
pub use inventory;

/// Everything needed to declare and resolve dependencies.
pub mod prelude {
    pub use anbar_container::prelude::*;
    pub use anbar_macros::Injectable;
}
