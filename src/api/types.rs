//! Wire types for the portfolio backend.
//!
//! Every endpoint wraps its payload in an [`Envelope`] of `{message, data}`.
//! Record ids are assigned by the backend; an empty id is skipped during
//! serialization so create payloads never carry one.

use serde::{Deserialize, Serialize};

/// Uniform response wrapper returned by every endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
  #[serde(default)]
  pub message: String,
  pub data: T,
}

fn first_page() -> u32 {
  1
}

// ============================================================================
// Blogs
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlogStatus {
  #[default]
  Draft,
  Published,
}

impl BlogStatus {
  pub const ALL: [BlogStatus; 2] = [BlogStatus::Draft, BlogStatus::Published];

  pub fn label(self) -> &'static str {
    match self {
      BlogStatus::Draft => "draft",
      BlogStatus::Published => "published",
    }
  }

  pub fn from_label(label: &str) -> Option<Self> {
    Self::ALL.into_iter().find(|s| s.label() == label)
  }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoverImage {
  pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPost {
  #[serde(rename = "_id", default, skip_serializing_if = "String::is_empty")]
  pub id: String,
  #[serde(default)]
  pub title: String,
  #[serde(default)]
  pub slug: String,
  #[serde(default)]
  pub excerpt: String,
  #[serde(default)]
  pub content: String,
  #[serde(default)]
  pub category: String,
  #[serde(default)]
  pub tags: Vec<String>,
  #[serde(default)]
  pub status: BlogStatus,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub cover_image: Option<CoverImage>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPage {
  #[serde(default)]
  pub blogs: Vec<BlogPost>,
  #[serde(default = "first_page")]
  pub total_pages: u32,
}

// ============================================================================
// Projects
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectCategory {
  #[default]
  Frontend,
  Backend,
  #[serde(rename = "Full Stack")]
  FullStack,
}

impl ProjectCategory {
  pub const ALL: [ProjectCategory; 3] = [
    ProjectCategory::Frontend,
    ProjectCategory::Backend,
    ProjectCategory::FullStack,
  ];

  pub fn label(self) -> &'static str {
    match self {
      ProjectCategory::Frontend => "Frontend",
      ProjectCategory::Backend => "Backend",
      ProjectCategory::FullStack => "Full Stack",
    }
  }

  pub fn from_label(label: &str) -> Option<Self> {
    Self::ALL.into_iter().find(|c| c.label() == label)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
  Image,
  Video,
  Youtube,
}

impl MediaType {
  pub fn label(self) -> &'static str {
    match self {
      MediaType::Image => "image",
      MediaType::Video => "video",
      MediaType::Youtube => "youtube",
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaItem {
  #[serde(rename = "type")]
  pub kind: MediaType,
  pub url: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub video_id: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub thumbnail: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectLinks {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub live: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub client: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub server: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub github: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
  #[serde(rename = "_id", default, skip_serializing_if = "String::is_empty")]
  pub id: String,
  #[serde(default)]
  pub title: String,
  #[serde(default)]
  pub description: String,
  #[serde(default)]
  pub long_description: String,
  #[serde(default)]
  pub category: ProjectCategory,
  #[serde(default)]
  pub technologies: Vec<String>,
  /// Thumbnail URL
  #[serde(default)]
  pub image: String,
  #[serde(default)]
  pub repo: String,
  #[serde(default)]
  pub username: String,
  #[serde(default)]
  pub links: ProjectLinks,
  #[serde(default)]
  pub media: Vec<MediaItem>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectPage {
  #[serde(default)]
  pub projects: Vec<Project>,
  #[serde(default = "first_page")]
  pub total_pages: u32,
}

// ============================================================================
// Experience / Education
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Experience {
  #[serde(rename = "_id", default, skip_serializing_if = "String::is_empty")]
  pub id: String,
  #[serde(default)]
  pub title: String,
  #[serde(default)]
  pub company: String,
  #[serde(default)]
  pub period: String,
  #[serde(default)]
  pub description: String,
  #[serde(default)]
  pub achievements: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperiencePage {
  /// The backend names this list field in the singular.
  #[serde(default)]
  pub experience: Vec<Experience>,
  #[serde(default = "first_page")]
  pub total_pages: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Education {
  #[serde(rename = "_id", default, skip_serializing_if = "String::is_empty")]
  pub id: String,
  #[serde(default)]
  pub degree: String,
  #[serde(default)]
  pub institution: String,
  #[serde(default)]
  pub period: String,
  #[serde(default)]
  pub result: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EducationPage {
  #[serde(default)]
  pub education: Vec<Education>,
  #[serde(default = "first_page")]
  pub total_pages: u32,
}

// ============================================================================
// About page
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AboutSection {
  #[serde(default)]
  pub title: String,
  #[serde(default)]
  pub description: String,
  #[serde(default)]
  pub items: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Skill {
  #[serde(default)]
  pub name: String,
  #[serde(default)]
  pub level: String,
  #[serde(default)]
  pub experience: String,
  #[serde(default)]
  pub details: String,
  #[serde(default)]
  pub projects: Vec<String>,
  #[serde(default)]
  pub keywords: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SkillGroups {
  #[serde(default)]
  pub frontend: Vec<Skill>,
  #[serde(default)]
  pub backend: Vec<Skill>,
  #[serde(default)]
  pub tools: Vec<Skill>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AboutContent {
  #[serde(default)]
  pub current_focus: AboutSection,
  #[serde(default)]
  pub learning: AboutSection,
  #[serde(default)]
  pub interests: AboutSection,
  #[serde(default)]
  pub skills: SkillGroups,
}

/// Section slugs as they appear in `PUT /about/section/{name}`.
pub const SECTION_KEYS: [&str; 3] = ["currentFocus", "learning", "interests"];

/// Skill category slugs as they appear in `PUT /about/skills/{category}`.
pub const SKILL_CATEGORIES: [&str; 3] = ["frontend", "backend", "tools"];

// ============================================================================
// Auth
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
  pub user: String,
  pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginData {
  pub token: String,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_create_payload_omits_empty_id() {
    let blog = BlogPost {
      title: "Hello".to_string(),
      ..Default::default()
    };
    let json = serde_json::to_value(&blog).unwrap();
    assert!(json.get("_id").is_none());

    let existing = BlogPost {
      id: "abc123".to_string(),
      ..Default::default()
    };
    let json = serde_json::to_value(&existing).unwrap();
    assert_eq!(json["_id"], "abc123");
  }

  #[test]
  fn test_blog_page_decodes_wire_shape() {
    let raw = serde_json::json!({
      "blogs": [{
        "_id": "b1",
        "title": "Post",
        "slug": "post",
        "excerpt": "short",
        "content": "<p>body</p>",
        "category": "Technology",
        "tags": ["rust", "tui"],
        "status": "published",
        "coverImage": {"url": "https://cdn.example/c.png"}
      }],
      "totalPages": 3
    });
    let page: BlogPage = serde_json::from_value(raw).unwrap();
    assert_eq!(page.total_pages, 3);
    assert_eq!(page.blogs[0].status, BlogStatus::Published);
    assert_eq!(
      page.blogs[0].cover_image.as_ref().unwrap().url,
      "https://cdn.example/c.png"
    );
  }

  #[test]
  fn test_project_category_wire_names() {
    let cat: ProjectCategory = serde_json::from_value(serde_json::json!("Full Stack")).unwrap();
    assert_eq!(cat, ProjectCategory::FullStack);
    assert_eq!(
      serde_json::to_value(ProjectCategory::FullStack).unwrap(),
      serde_json::json!("Full Stack")
    );
    assert_eq!(ProjectCategory::from_label("Backend"), Some(ProjectCategory::Backend));
    assert_eq!(ProjectCategory::from_label("nope"), None);
  }

  #[test]
  fn test_media_item_type_field() {
    let item = MediaItem {
      kind: MediaType::Youtube,
      url: "https://youtu.be/dQw4w9WgXcQ".to_string(),
      video_id: Some("dQw4w9WgXcQ".to_string()),
      thumbnail: None,
    };
    let json = serde_json::to_value(&item).unwrap();
    assert_eq!(json["type"], "youtube");
    assert_eq!(json["videoId"], "dQw4w9WgXcQ");
    assert!(json.get("thumbnail").is_none());
  }

  #[test]
  fn test_experience_page_singular_field() {
    let raw = serde_json::json!({
      "experience": [{"_id": "e1", "title": "Dev", "company": "Acme",
                      "period": "2023", "description": "", "achievements": []}],
      "totalPages": 1
    });
    let page: ExperiencePage = serde_json::from_value(raw).unwrap();
    assert_eq!(page.experience.len(), 1);
  }

  #[test]
  fn test_envelope() {
    let raw = serde_json::json!({"message": "ok", "data": {"token": "abc"}});
    let envelope: Envelope<LoginData> = serde_json::from_value(raw).unwrap();
    assert_eq!(envelope.message, "ok");
    assert_eq!(envelope.data.token, "abc");
  }
}
