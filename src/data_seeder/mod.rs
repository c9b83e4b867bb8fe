// Seed dataset - the static directory, reference data and events loaded at startup

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::{debug, info};

use crate::core::{AlumniId, IndustryId, SkillId};
use crate::error::{AppError, AppResult};
use crate::models::{Alumni, AnalyticsSnapshot, Event, Industry, Skill};

const BUILTIN_SEED: &str = include_str!("../../data/seed.json");

/// Graduation years outside this range are treated as data entry mistakes
pub const GRADUATION_YEARS: std::ops::RangeInclusive<i32> = 1900..=2100;

static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern compiles"));

/// Alumni row as stored in the seed file, with industry and skills by reference
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedAlumni {
    pub id: AlumniId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub graduation_year: i32,
    pub degree: String,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub linkedin_url: Option<String>,
    #[serde(default)]
    pub industry_id: Option<IndustryId>,
    #[serde(default)]
    pub skill_ids: Vec<SkillId>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_active() -> bool {
    true
}

/// On-disk layout of a seed file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeedFile {
    #[serde(default)]
    pub industries: Vec<Industry>,
    #[serde(default)]
    pub skills: Vec<Skill>,
    #[serde(default)]
    pub alumni: Vec<SeedAlumni>,
    #[serde(default)]
    pub events: Vec<Event>,
    #[serde(default)]
    pub baseline_analytics: Option<AnalyticsSnapshot>,
}

/// Validated dataset with every reference resolved
#[derive(Debug, Clone, Default)]
pub struct SeedDataset {
    pub industries: Vec<Industry>,
    pub skills: Vec<Skill>,
    pub alumni: Vec<Alumni>,
    pub events: Vec<Event>,
    pub baseline_analytics: Option<AnalyticsSnapshot>,
}

impl SeedDataset {
    /// Dataset compiled into the crate
    pub fn builtin() -> AppResult<Self> {
        Self::from_json_str(BUILTIN_SEED)
    }

    pub fn from_json_str(raw: &str) -> AppResult<Self> {
        let file: SeedFile = serde_json::from_str(raw)?;
        Self::from_file(file)
    }

    pub async fn from_path(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
            AppError::ConfigurationError(format!("cannot read seed file {}: {}", path.display(), e))
        })?;
        let dataset = Self::from_json_str(&raw)?;
        info!(
            "Loaded seed file {} ({} alumni, {} events)",
            path.display(),
            dataset.alumni.len(),
            dataset.events.len()
        );
        Ok(dataset)
    }

    pub fn from_file(file: SeedFile) -> AppResult<Self> {
        ensure_unique("industry", file.industries.iter().map(|i| i.id.as_str()))?;
        ensure_unique("skill", file.skills.iter().map(|s| s.id.as_str()))?;
        ensure_unique("alumni", file.alumni.iter().map(|a| a.id.as_str()))?;
        ensure_unique("event", file.events.iter().map(|e| e.id.as_str()))?;

        let industries: HashMap<&IndustryId, &Industry> =
            file.industries.iter().map(|i| (&i.id, i)).collect();
        let skills: HashMap<&SkillId, &Skill> = file.skills.iter().map(|s| (&s.id, s)).collect();

        let mut alumni = Vec::with_capacity(file.alumni.len());
        for row in &file.alumni {
            alumni.push(resolve_alumni(row, &industries, &skills)?);
        }

        for event in &file.events {
            if !event.registration_fee.is_finite() || event.registration_fee < 0.0 {
                return Err(AppError::Validation(format!(
                    "event {} has a negative registration fee",
                    event.id
                )));
            }
        }

        debug!(
            "Seed validated: {} industries, {} skills, {} alumni, {} events",
            file.industries.len(),
            file.skills.len(),
            alumni.len(),
            file.events.len()
        );

        Ok(Self {
            industries: file.industries.clone(),
            skills: file.skills.clone(),
            alumni,
            events: file.events,
            baseline_analytics: file.baseline_analytics,
        })
    }
}

fn resolve_alumni(
    row: &SeedAlumni,
    industries: &HashMap<&IndustryId, &Industry>,
    skills: &HashMap<&SkillId, &Skill>,
) -> AppResult<Alumni> {
    if !GRADUATION_YEARS.contains(&row.graduation_year) {
        return Err(AppError::Validation(format!(
            "alumni {} has implausible graduation year {}",
            row.id, row.graduation_year
        )));
    }
    if !EMAIL_PATTERN.is_match(&row.email) {
        return Err(AppError::Validation(format!(
            "alumni {} has invalid email '{}'",
            row.id, row.email
        )));
    }

    let industry = match &row.industry_id {
        Some(id) => Some((*industries.get(id).ok_or_else(|| {
            AppError::Validation(format!("alumni {} references unknown industry {}", row.id, id))
        })?)
        .clone()),
        None => None,
    };

    let mut seen = HashSet::new();
    let mut resolved_skills = Vec::new();
    for skill_id in &row.skill_ids {
        if !seen.insert(skill_id) {
            continue;
        }
        let skill = skills.get(skill_id).ok_or_else(|| {
            AppError::Validation(format!("alumni {} references unknown skill {}", row.id, skill_id))
        })?;
        resolved_skills.push((*skill).clone());
    }

    Ok(Alumni {
        id: row.id.clone(),
        email: row.email.clone(),
        first_name: row.first_name.clone(),
        last_name: row.last_name.clone(),
        graduation_year: row.graduation_year,
        degree: row.degree.clone(),
        company: row.company.clone(),
        position: row.position.clone(),
        location: row.location.clone(),
        bio: row.bio.clone(),
        avatar_url: row.avatar_url.clone(),
        linkedin_url: row.linkedin_url.clone(),
        industry,
        skills: resolved_skills,
        is_active: row.is_active,
        is_admin: row.is_admin,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

fn ensure_unique<'a>(kind: &str, ids: impl Iterator<Item = &'a str>) -> AppResult<()> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(AppError::Validation(format!("duplicate {} id {}", kind, id)));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_builtin_seed_loads() {
        let seed = SeedDataset::builtin().unwrap();
        assert_eq!(seed.alumni.len(), 4);
        assert_eq!(seed.events.len(), 3);
        assert!(seed.baseline_analytics.is_some());

        let arjun = &seed.alumni[0];
        assert_eq!(arjun.industry_name(), Some("Technology"));
        assert!(arjun.has_skill("react"));
    }

    fn minimal(alumni_json: &str) -> String {
        format!(
            r#"{{
                "industries": [{{"id": "1", "name": "Technology"}}],
                "skills": [{{"id": "1", "name": "Rust"}}],
                "alumni": [{}]
            }}"#,
            alumni_json
        )
    }

    fn alumni_row(id: &str, year: i32, email: &str) -> String {
        format!(
            r#"{{"id": "{}", "email": "{}", "first_name": "A", "last_name": "B",
                "graduation_year": {}, "degree": "CS", "industry_id": "1",
                "skill_ids": ["1", "1"],
                "created_at": "2024-01-01T00:00:00Z", "updated_at": "2024-01-01T00:00:00Z"}}"#,
            id, email, year
        )
    }

    #[test]
    fn test_duplicate_skills_collapse() {
        let seed = SeedDataset::from_json_str(&minimal(&alumni_row("1", 2015, "a@b.io"))).unwrap();
        assert_eq!(seed.alumni[0].skills.len(), 1);
        assert!(seed.alumni[0].is_active);
    }

    #[test]
    fn test_rejects_bad_rows() {
        let rows = format!(
            "{},{}",
            alumni_row("1", 2015, "a@b.io"),
            alumni_row("1", 2016, "c@d.io")
        );
        assert!(matches!(
            SeedDataset::from_json_str(&minimal(&rows)),
            Err(AppError::Validation(_))
        ));

        assert!(SeedDataset::from_json_str(&minimal(&alumni_row("1", 15, "a@b.io"))).is_err());
        assert!(SeedDataset::from_json_str(&minimal(&alumni_row("1", 2015, "nope"))).is_err());
    }

    #[tokio::test]
    async fn test_load_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(minimal(&alumni_row("7", 2010, "x@y.org")).as_bytes())
            .unwrap();

        let seed = SeedDataset::from_path(file.path()).await.unwrap();
        assert_eq!(seed.alumni[0].id, AlumniId::from("7"));

        let missing = SeedDataset::from_path("/definitely/not/here.json").await;
        assert!(matches!(missing, Err(AppError::ConfigurationError(_))));
    }
}
