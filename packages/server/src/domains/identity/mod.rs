// Identity domain: encrypted identity storage, OTP challenges, tenant
// signup/sign-in, and the two-factor operator login.

pub mod admin;
pub mod challenges;
pub mod cipher;
pub mod data;
pub mod jwt;
pub mod models;
pub mod resolver;
pub mod signup;

pub use admin::{AdminAuthService, AdminPolicy};
pub use challenges::ChallengeService;
pub use cipher::CipherStore;
pub use jwt::JwtService;
pub use resolver::IdentityResolver;
pub use signup::{AuthFlow, SignupRequest};
