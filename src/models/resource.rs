use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceDescriptor {
    pub name: String,
    pub desc: String,
    pub version: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ResourceDescriptor {
    pub fn new(name: impl Into<String>, desc: impl Into<String>, version: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            name: name.into(),
            desc: desc.into(),
            version: version.into(),
            created_at: now,
            updated_at: now,
        }
    }
}
