use serde::{Deserialize, Serialize};

/// The three ways a user can mark someone else's idea.
/// Each one is a separate join table keyed on (username, idea_id).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdeaMark {
    Support,
    Save,
    Question,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marks_parse_from_path_segments() {
        let mark: IdeaMark = serde_json::from_str("\"question\"").unwrap();
        assert_eq!(mark, IdeaMark::Question);
        assert!(serde_json::from_str::<IdeaMark>("\"like\"").is_err());
    }
}
