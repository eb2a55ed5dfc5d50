//! Contact Profile Model

use serde::{Deserialize, Serialize};

/// Saved name/contact pair for a returning guest.
///
/// Written only with explicit guest consent, read at dialog start to offer
/// skipping the contact steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactProfile {
    pub user_id: i64,
    pub name: String,
    pub contact: String,
}
