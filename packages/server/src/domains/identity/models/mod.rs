pub mod account;
pub mod admin_session;
pub mod challenge;

pub use account::{Account, NewAccount};
pub use admin_session::{AdminSession, NewAdminSession};
pub use challenge::{Challenge, ChallengeStatus, Channel};
