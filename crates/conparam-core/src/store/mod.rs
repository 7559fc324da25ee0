// # Parameter Store
//
// The only shared mutable state of the client: parameter name -> value.

pub mod memory;

pub use memory::ParameterStore;
