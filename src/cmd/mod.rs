//! CLI command implementations.
//!
//! | Module    | Commands handled |
//! |-----------|------------------|
//! | `serve`   | `Serve`          |
//! | `update`  | `Update`         |
//! | `locate`  | `Locate`         |
//! | `config`  | `Config`         |

pub mod config;
pub mod locate;
pub mod serve;
pub mod update;

pub use config::cmd_config;
pub use locate::cmd_locate;
pub use serve::cmd_serve;
pub use update::cmd_update;
