//! Static project gallery

use super::ProjectContext;
use std::sync::LazyLock;

static GALLERY: LazyLock<Vec<ProjectContext>> = LazyLock::new(|| {
    vec![
        project(
            "play2",
            "PL@Y2",
            "An interactive playground installation that turns children's movement into light and music.",
            "play2-cover.jpg",
            &["Unity", "C#", "Arduino", "Kinect"],
            2023,
            "interactive installation",
        ),
        project(
            "ledgerly",
            "Ledgerly",
            "A shared budgeting app for households that split bills, chores and groceries.",
            "ledgerly-cover.png",
            &["Rust", "Axum", "React", "PostgreSQL"],
            2022,
            "web application",
        ),
        project(
            "driftwood",
            "Driftwood",
            "A procedurally generated sailing game about charting an archipelago that changes every night.",
            "driftwood-cover.png",
            &["Rust", "Bevy", "WGSL"],
            2021,
            "game development",
        ),
    ]
});

fn project(
    id: &str,
    title: &str,
    description: &str,
    image_url: &str,
    tags: &[&str],
    year: u16,
    category: &str,
) -> ProjectContext {
    ProjectContext {
        id: id.to_string(),
        title: title.to_string(),
        description: description.to_string(),
        image_url: image_url.to_string(),
        tags: tags.iter().map(ToString::to_string).collect(),
        year,
        category: category.to_string(),
    }
}

/// All projects shown in the gallery, in display order
pub fn gallery() -> &'static [ProjectContext] {
    &GALLERY
}

pub fn find_project(id: &str) -> Option<ProjectContext> {
    GALLERY.iter().find(|p| p.id == id).cloned()
}
