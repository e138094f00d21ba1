pub mod pages;
pub mod post;
pub mod unit;

pub use pages::{AboutPage, Cv, CvContact, CvExperience, SkillGroup};
pub use post::{Post, PostFields};
pub use unit::{Field, FieldKind, Overlay, Translatable, UnitKind};
