//! User and company records managed by the admin backend.

pub mod company;
pub mod statistics;
pub mod user;
pub mod validate;

pub use company::{Company, CompanyChanges, NewCompany};
pub use statistics::{CompanyStatistics, UserStatistics};
pub use user::{NewUser, User, UserChanges};
