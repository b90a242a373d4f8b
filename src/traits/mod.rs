pub mod executor;
pub mod module;

pub use executor::EventExecutor;
pub use module::Module;
