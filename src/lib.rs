//! Roster-verified certificate issuance.
//!
//! A participant submits name, roll number and email; if all three match a
//! row of the event roster, their name is stamped onto the certificate
//! template and the PDF is returned.

pub mod config;
pub mod error;
pub mod issue;
pub mod pdf;
pub mod roster;
pub mod routes;
pub mod state;
pub mod verify;
