use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::{AlumniId, IndustryId, SkillId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Industry {
    pub id: IndustryId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skill {
    pub id: SkillId,
    pub name: String,
}

/// Directory entry for one graduate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alumni {
    pub id: AlumniId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub graduation_year: i32,
    pub degree: String,
    pub company: Option<String>,
    pub position: Option<String>,
    pub location: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub linkedin_url: Option<String>,
    pub industry: Option<Industry>,
    /// Unordered; never holds the same skill twice
    pub skills: Vec<Skill>,
    pub is_active: bool,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Alumni {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn industry_name(&self) -> Option<&str> {
        self.industry.as_ref().map(|i| i.name.as_str())
    }

    pub fn has_skill(&self, name: &str) -> bool {
        self.skills.iter().any(|s| s.name.eq_ignore_ascii_case(name))
    }
}
