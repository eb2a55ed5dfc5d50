//! Review Model

use serde::{Deserialize, Serialize};

/// Guest review: rating plus free text. Store-and-retrieve only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub user_id: i64,
    /// 1..=5
    pub rating: u8,
    pub text: String,
}
