/// Statement kind, decided by the leading keyword only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    /// Result is the full row set.
    Select,
    /// Result is the id of the last inserted row.
    Insert,
    /// Result is the number of affected rows.
    Other,
}

impl StatementKind {
    /// Classify SQL text by its leading keyword, ignoring case and surrounding whitespace.
    #[must_use]
    pub fn classify(sql: &str) -> Self {
        let head = sql.trim_start();
        if starts_with_ignore_case(head, "SELECT") {
            StatementKind::Select
        } else if starts_with_ignore_case(head, "INSERT") {
            StatementKind::Insert
        } else {
            StatementKind::Other
        }
    }
}

fn starts_with_ignore_case(text: &str, keyword: &str) -> bool {
    text.get(..keyword.len())
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(keyword))
}
