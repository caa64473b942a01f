//! Command intent parsing, privilege sessions, and the pre-execution security gate.

pub mod config;
pub mod error;
pub mod executor;
pub mod gate;
pub mod intent;
pub mod session;

pub use config::{FeaturesConfig, SecurityConfig};
pub use error::{SessionError, ToolError};
pub use executor::{CommandExecutor, DryRunExecutor};
pub use gate::{Authorization, CommandSecurityGate};
pub use intent::{CommandIntent, CommandIntentParser, IntentType};
pub use session::{ActivationParse, PrivilegeSessionManager, SecurityInfo, SessionStatus};
