//! Mingle client — verification and onboarding flow core.

pub mod config;
pub mod draft;
pub mod error;
pub mod flow;
pub mod identity;
pub mod phone;
pub mod session;
