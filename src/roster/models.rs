use serde::{Deserialize, Serialize};

/// One registered participant, as read from the roster sheet.
///
/// Only the three identifying columns are kept; anything else in the sheet
/// is dropped at load time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub name: String,
    pub rollno: String,
    pub email: String,
}

impl Participant {
    pub fn new(
        name: impl Into<String>,
        rollno: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            rollno: rollno.into(),
            email: email.into(),
        }
    }
}

/// Positions of the identifying columns within a roster header row.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Columns {
    pub name: Option<usize>,
    pub rollno: Option<usize>,
    pub email: Option<usize>,
}

impl Columns {
    /// Locate `name`, `rollno` and `email` by trimmed, case-insensitive header text.
    /// The first column carrying a given header wins.
    pub fn from_headers<'a, I>(headers: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut columns = Self::default();
        for (idx, header) in headers.into_iter().enumerate() {
            let slot = match header.trim().to_lowercase().as_str() {
                "name" => &mut columns.name,
                "rollno" => &mut columns.rollno,
                "email" => &mut columns.email,
                _ => continue,
            };
            slot.get_or_insert(idx);
        }
        columns
    }

    pub fn missing(&self) -> Vec<&'static str> {
        [
            ("name", self.name),
            ("rollno", self.rollno),
            ("email", self.email),
        ]
        .into_iter()
        .filter_map(|(label, idx)| idx.is_none().then_some(label))
        .collect()
    }

    /// Build a participant from a row of already-stringified cells.
    /// Absent columns and short rows yield empty fields.
    pub fn participant(&self, cells: &[String]) -> Participant {
        let cell = |idx: Option<usize>| {
            idx.and_then(|i| cells.get(i))
                .cloned()
                .unwrap_or_default()
        };
        Participant {
            name: cell(self.name),
            rollno: cell(self.rollno),
            email: cell(self.email),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headers_are_matched_loosely_and_extra_columns_ignored() {
        let columns = Columns::from_headers([" Team", "EMAIL ", "Name", "rollno", "name"]);
        assert_eq!(columns.name, Some(2));
        assert_eq!(columns.rollno, Some(3));
        assert_eq!(columns.email, Some(1));
        assert!(columns.missing().is_empty());
    }

    #[test]
    fn missing_columns_produce_empty_fields() {
        let columns = Columns::from_headers(["name", "institution"]);
        assert_eq!(columns.missing(), vec!["rollno", "email"]);

        let row = vec!["Jane Smith".to_string(), "University B".to_string()];
        assert_eq!(
            columns.participant(&row),
            Participant::new("Jane Smith", "", "")
        );
    }

    #[test]
    fn short_rows_do_not_panic() {
        let columns = Columns::from_headers(["name", "rollno", "email"]);
        let row = vec!["Alex Johnson".to_string()];
        assert_eq!(
            columns.participant(&row),
            Participant::new("Alex Johnson", "", "")
        );
    }
}
