//! facegen-swap - FaceGen template matching and provisioning
//!
//! Gives every eligible male NPC the face of a female template NPC of a
//! compatible race, stages the template's FaceGen mesh and tint for the
//! NPC, and writes the edited records as overrides.

pub mod config;
pub mod copier;
pub mod facegen;
pub mod matcher;
pub mod paths;
pub mod patcher;
pub mod races;
pub mod records;
pub mod report;
pub mod voices;
