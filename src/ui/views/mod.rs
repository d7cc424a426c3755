mod about;
mod blogs;
mod education;
mod experience;
mod login;
mod projects;

pub use about::AboutView;
pub use blogs::BlogsView;
pub use education::EducationView;
pub use experience::ExperienceView;
pub use login::LoginView;
pub use projects::ProjectsView;

use crate::api::{ApiClient, Uploader};
use crate::query::QueryClient;

/// Shared handles every content view needs. Cheap to clone.
#[derive(Clone)]
pub struct ViewContext {
  pub api: ApiClient,
  pub queries: QueryClient,
  pub uploader: Option<Uploader>,
}
