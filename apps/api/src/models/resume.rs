use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A labeled section: label → free-text content. Keys are unique, order is irrelevant.
pub type Section = BTreeMap<String, String>;

/// Key used when a section is written with the plain-text shorthand.
pub const TEXT_SECTION_KEY: &str = "content";

/// An owned resume document. Sections are always present, possibly empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resume {
    pub id: Uuid,
    pub owner_id: Uuid,
    /// Unique per owner.
    pub name: String,
    pub about_me: String,
    pub is_public: bool,
    pub skills: Section,
    pub experience: Section,
    pub projects: Section,
    pub education: Section,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Resume {
    /// A fresh private resume with every section empty.
    pub fn new(id: Uuid, owner_id: Uuid, name: &str, now: DateTime<Utc>) -> Self {
        Self {
            id,
            owner_id,
            name: name.to_string(),
            about_me: String::new(),
            is_public: false,
            skills: Section::new(),
            experience: Section::new(),
            projects: Section::new(),
            education: Section::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Replaces only the fields present in `patch`.
    ///
    /// Section fields are replaced wholesale in both shapes: a text value becomes
    /// `{"content": text}`, a mapping becomes the new section. Entries are never
    /// merged key-by-key.
    pub fn apply(&mut self, patch: ResumePatch) {
        let ResumePatch {
            about_me,
            name,
            is_public,
            skills,
            experience,
            projects,
            education,
        } = patch;

        if let Some(about_me) = about_me {
            self.about_me = about_me;
        }
        if let Some(name) = name {
            self.name = name;
        }
        if let Some(is_public) = is_public {
            self.is_public = is_public;
        }
        replace_section(&mut self.skills, skills);
        replace_section(&mut self.experience, experience);
        replace_section(&mut self.projects, projects);
        replace_section(&mut self.education, education);
    }
}

fn replace_section(section: &mut Section, patch: Option<SectionPatch>) {
    if let Some(patch) = patch {
        *section = patch.into_section();
    }
}

/// The two accepted shapes of a section value in a patch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SectionPatch {
    /// Unstructured blob, stored under [`TEXT_SECTION_KEY`].
    Text(String),
    /// Structured labeled entries.
    Entries(Section),
}

impl SectionPatch {
    pub fn into_section(self) -> Section {
        match self {
            SectionPatch::Text(text) => Section::from([(TEXT_SECTION_KEY.to_string(), text)]),
            SectionPatch::Entries(entries) => entries,
        }
    }
}

/// Partial update of a resume. `null` and absent fields both mean "leave unchanged".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub about_me: Option<String>,
    #[serde(default, alias = "resumeName", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_public: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skills: Option<SectionPatch>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experience: Option<SectionPatch>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub projects: Option<SectionPatch>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub education: Option<SectionPatch>,
}

impl ResumePatch {
    /// Placeholder content offered to clients seeding a new resume.
    pub fn default_template() -> Self {
        let text = |s: &str| Some(SectionPatch::Text(s.to_string()));
        Self {
            about_me: Some(
                "Welcome to your interactive resume! Click edit to personalize this content."
                    .to_string(),
            ),
            name: None,
            is_public: None,
            skills: text("Add your skills here - programming languages, frameworks, tools, etc."),
            experience: text(
                "Describe your work experience, internships, and professional achievements.",
            ),
            projects: text(
                "Showcase your projects, including technologies used and outcomes achieved.",
            ),
            education: text(
                "List your educational background, degrees, certifications, and relevant coursework.",
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn resume() -> Resume {
        Resume::new(Uuid::new_v4(), Uuid::new_v4(), "Main", Utc::now())
    }

    fn section(pairs: &[(&str, &str)]) -> Section {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_new_resume_is_private_and_empty() {
        let r = resume();
        assert!(!r.is_public);
        assert!(r.about_me.is_empty());
        assert!(r.skills.is_empty() && r.experience.is_empty());
        assert!(r.projects.is_empty() && r.education.is_empty());
    }

    #[test]
    fn test_text_shorthand_replaces_section_wholesale() {
        let mut r = resume();
        r.skills = section(&[("a", "1")]);
        r.apply(ResumePatch {
            skills: Some(SectionPatch::Text("go".into())),
            ..Default::default()
        });
        assert_eq!(r.skills, section(&[("content", "go")]));
    }

    #[test]
    fn test_structured_patch_replaces_section_wholesale() {
        let mut r = resume();
        r.skills = section(&[("a", "1")]);
        r.apply(ResumePatch {
            skills: Some(SectionPatch::Entries(section(&[("b", "2")]))),
            ..Default::default()
        });
        assert_eq!(r.skills, section(&[("b", "2")]));
    }

    #[test]
    fn test_absent_fields_untouched() {
        let mut r = resume();
        r.about_me = "hello".into();
        r.education = section(&[("uni", "BSc")]);
        r.apply(ResumePatch {
            is_public: Some(true),
            ..Default::default()
        });
        assert!(r.is_public);
        assert_eq!(r.about_me, "hello");
        assert_eq!(r.name, "Main");
        assert_eq!(r.education, section(&[("uni", "BSc")]));
    }

    #[test]
    fn test_patch_deserializes_both_section_shapes() {
        let patch: ResumePatch = serde_json::from_value(json!({
            "aboutMe": "x",
            "skills": "rust, go",
            "experience": {"Acme": "Engineer", "Initech": "Intern"},
            "isPublic": true
        }))
        .unwrap();
        assert_eq!(patch.about_me.as_deref(), Some("x"));
        assert_eq!(patch.skills, Some(SectionPatch::Text("rust, go".into())));
        assert_eq!(
            patch.experience,
            Some(SectionPatch::Entries(section(&[
                ("Acme", "Engineer"),
                ("Initech", "Intern")
            ])))
        );
        assert_eq!(patch.is_public, Some(true));
        assert!(patch.projects.is_none());
    }

    #[test]
    fn test_patch_accepts_resume_name_alias() {
        let a: ResumePatch = serde_json::from_value(json!({"resumeName": "CV"})).unwrap();
        let b: ResumePatch = serde_json::from_value(json!({"name": "CV"})).unwrap();
        assert_eq!(a.name.as_deref(), Some("CV"));
        assert_eq!(a, b);
    }

    #[test]
    fn test_patch_null_means_absent() {
        let patch: ResumePatch =
            serde_json::from_value(json!({"aboutMe": null, "skills": null})).unwrap();
        assert_eq!(patch, ResumePatch::default());
    }

    #[test]
    fn test_patch_rejects_non_string_section_values() {
        let result = serde_json::from_value::<ResumePatch>(json!({"skills": {"a": 1}}));
        assert!(result.is_err());
    }

    #[test]
    fn test_default_template_uses_text_shorthand() {
        let mut r = resume();
        r.apply(ResumePatch::default_template());
        assert_eq!(r.skills.len(), 1);
        assert!(r.skills.contains_key(TEXT_SECTION_KEY));
        assert!(!r.about_me.is_empty());
        assert_eq!(r.name, "Main");
    }

    #[test]
    fn test_resume_serializes_camel_case() {
        let json = serde_json::to_value(resume()).unwrap();
        assert!(json.get("ownerId").is_some());
        assert!(json.get("isPublic").is_some());
        assert!(json.get("aboutMe").is_some());
    }
}
