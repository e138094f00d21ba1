use serde::{Deserialize, Serialize};

use super::unit::{Field, FieldKind, Overlay, Translatable, UnitKind};

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct AboutPage {
    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub paragraphs: Vec<String>,
}

impl Translatable for AboutPage {
    const KIND: UnitKind = UnitKind::About;

    fn fields(&self) -> Vec<Field> {
        let mut fields = vec![Field::new("TITLE", "Title", FieldKind::Line, &self.title)];
        for (i, p) in self.paragraphs.iter().enumerate() {
            let n = i + 1;
            fields.push(Field::new(
                format!("P{n}"),
                format!("Paragraph {n}"),
                FieldKind::Block,
                p,
            ));
        }
        fields
    }

    fn apply(&self, overlay: &Overlay) -> Self {
        let mut out = self.clone();
        overlay.apply_text("TITLE", &mut out.title);
        for (i, p) in out.paragraphs.iter_mut().enumerate() {
            overlay.apply_text(&format!("P{}", i + 1), p);
        }
        out
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct CvExperience {
    #[serde(default)]
    pub period: String,

    /// Job title; kept in the original language.
    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub company: String,

    #[serde(default)]
    pub location: String,

    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct SkillGroup {
    #[serde(default)]
    pub category: String,

    /// Skill names are never translated.
    #[serde(default)]
    pub items: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct CvContact {
    #[serde(default)]
    pub github: String,

    #[serde(default)]
    pub linkedin: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct Cv {
    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub tagline: String,

    #[serde(default)]
    pub experience: Vec<CvExperience>,

    #[serde(default)]
    pub skills: Vec<SkillGroup>,

    #[serde(default)]
    pub education: String,

    #[serde(default)]
    pub contact: CvContact,
}

impl Translatable for Cv {
    const KIND: UnitKind = UnitKind::Cv;

    fn fields(&self) -> Vec<Field> {
        let mut fields = vec![
            Field::new("TITLE", "Title", FieldKind::Line, &self.title),
            Field::new("TAGLINE", "Tagline", FieldKind::Line, &self.tagline),
            Field::new("EDUCATION", "Education", FieldKind::Line, &self.education),
        ];

        for (i, exp) in self.experience.iter().enumerate() {
            let n = i + 1;
            let role = format!("{} at {}", exp.title, exp.company);
            fields.push(Field::new(
                format!("PERIOD_{n}"),
                format!("Period {n} ({role})"),
                FieldKind::Line,
                &exp.period,
            ));
            fields.push(Field::new(
                format!("DESCRIPTION_{n}"),
                format!("Description {n} ({role})"),
                FieldKind::Block,
                &exp.description,
            ));
        }

        for (i, group) in self.skills.iter().enumerate() {
            let n = i + 1;
            fields.push(Field::new(
                format!("CATEGORY_{n}"),
                format!("Skill category {n}"),
                FieldKind::Line,
                &group.category,
            ));
        }

        fields
    }

    fn apply(&self, overlay: &Overlay) -> Self {
        let mut out = self.clone();
        overlay.apply_text("TITLE", &mut out.title);
        overlay.apply_text("TAGLINE", &mut out.tagline);
        overlay.apply_text("EDUCATION", &mut out.education);

        for (i, exp) in out.experience.iter_mut().enumerate() {
            let n = i + 1;
            overlay.apply_text(&format!("PERIOD_{n}"), &mut exp.period);
            overlay.apply_text(&format!("DESCRIPTION_{n}"), &mut exp.description);
        }

        for (i, group) in out.skills.iter_mut().enumerate() {
            overlay.apply_text(&format!("CATEGORY_{}", i + 1), &mut group.category);
        }

        out
    }
}
