use tracing::{info, warn};

use crate::roster::Participant;

/// Trim, lowercase and collapse runs of whitespace to a single space.
pub fn normalize_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn normalize_rollno(rollno: &str) -> String {
    rollno.trim().to_lowercase()
}

/// Check a submitted name/roll number/email triple against the roster.
///
/// All three fields have to match the same record after normalization. The
/// first matching record wins. Near misses are logged for whoever runs the
/// event; nothing about which field failed ever leaves this function.
pub fn verify_participant(name: &str, rollno: &str, email: &str, roster: &[Participant]) -> bool {
    let name_key = normalize_name(name);
    let rollno_key = normalize_rollno(rollno);
    let email_key = normalize_email(email);

    let found = roster.iter().find(|p| {
        let name_matches = normalize_name(&p.name) == name_key;
        let rollno_matches = normalize_rollno(&p.rollno) == rollno_key;
        let email_matches = normalize_email(&p.email) == email_key;

        if name_matches && rollno_matches && !email_matches {
            warn!(
                roster_email = %p.email,
                input_email = %email,
                "Name and roll number match but email doesn't"
            );
        }

        name_matches && rollno_matches && email_matches
    });

    match found {
        Some(p) => {
            info!(name = %p.name, rollno = %p.rollno, email = %p.email, "Participant verified");
            true
        }
        None => {
            info!(%name, %rollno, %email, "No matching participant found");
            false
        }
    }
}
