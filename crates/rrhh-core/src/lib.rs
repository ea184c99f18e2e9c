//! Rules shared by every part of the employee records application: field
//! validation, the admin privilege check, fixed choice lists and password
//! hashing. Nothing in here touches the network or the database.

pub mod access;
pub mod choices;
pub mod password;
pub mod validation;
