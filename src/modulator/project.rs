//! Projects in scope for a query.

use serde::{Deserialize, Serialize};

/// A project the query may reference, used as lookup context by value
/// transforms.
///
/// `name` falls back to the slug when omitted, in JSON as in [`Project::new`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "RawProject")]
pub struct Project {
    pub id: u64,
    pub slug: String,
    pub name: String,
}

#[derive(Deserialize)]
struct RawProject {
    id: u64,
    slug: String,
    #[serde(default)]
    name: Option<String>,
}

impl From<RawProject> for Project {
    fn from(raw: RawProject) -> Self {
        let name = raw.name.unwrap_or_else(|| raw.slug.clone());
        Self {
            id: raw.id,
            slug: raw.slug,
            name,
        }
    }
}

impl Project {
    pub fn new(id: u64, slug: impl Into<String>) -> Self {
        let slug = slug.into();
        Self {
            id,
            name: slug.clone(),
            slug,
        }
    }
}

/// First project with the given slug.
pub fn find_by_slug<'a>(projects: &'a [Project], slug: &str) -> Option<&'a Project> {
    projects.iter().find(|p| p.slug == slug)
}

/// First project with the given id.
pub fn find_by_id(projects: &[Project], id: u64) -> Option<&Project> {
    projects.iter().find(|p| p.id == id)
}
