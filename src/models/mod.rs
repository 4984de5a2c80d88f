pub mod deployment;
pub mod forecast;
pub mod recommendation;
pub mod report;
pub mod types;
pub mod usage;

pub use deployment::*;
pub use forecast::*;
pub use recommendation::*;
pub use report::*;
pub use types::*;
pub use usage::*;
