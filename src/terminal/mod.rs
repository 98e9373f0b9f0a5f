//! Remote terminal-multiplexer session and command scripting.

pub mod script;
pub mod session;

pub use script::{CommandStep, StepReport, run_script};
pub use session::TerminalSession;
