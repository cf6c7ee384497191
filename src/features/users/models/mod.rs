mod user;

pub use user::{EmergencyContact, User, UserTable};
