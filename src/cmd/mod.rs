//! CLI command implementations.
//!
//! Each submodule owns one or more related `Commands` variants:
//!
//! | Module      | Commands handled    |
//! |-------------|---------------------|
//! | `interview` | `Start`, `Chat`     |
//! | `status`    | `Status`, `List`    |
//! | `export`    | `Export`            |
//! | `config`    | `Config`            |

pub mod config;
pub mod export;
pub mod interview;
pub mod status;

pub use config::cmd_config;
pub use export::cmd_export;
pub use interview::{cmd_chat, cmd_start};
pub use status::{cmd_list, cmd_status};
