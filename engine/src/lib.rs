pub mod address;
pub mod check;
pub mod error;
pub mod eval;
pub mod overlay;
pub mod pass;
pub mod scheduler;
pub mod scope;
pub mod sum;

pub use address::Address;
pub use error::{EngineError, EvalError};
pub use overlay::{OverlayRule, Theme};
pub use scheduler::{DocumentSource, HostEvent, OverlaySink, Scheduler};
pub use scope::{Scope, ScopeChain};
