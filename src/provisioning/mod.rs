pub mod constructs;
pub mod domain;
pub mod policies;
pub mod services;
pub mod template;
