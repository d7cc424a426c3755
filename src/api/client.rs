use std::sync::{Arc, RwLock};

use color_eyre::eyre::{eyre, Result};
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::api::types::*;

/// Records per list page, matching what the site's own dashboard requests.
pub const PAGE_SIZE: u32 = 5;

/// Thin wrapper over the portfolio REST API.
///
/// Cloning is cheap and every clone shares the bearer token, so a token
/// obtained by the login view is immediately visible to in-flight fetchers.
#[derive(Clone)]
pub struct ApiClient {
  http: reqwest::Client,
  base_url: String,
  token: Arc<RwLock<Option<String>>>,
}

impl ApiClient {
  pub fn new(base_url: impl Into<String>) -> Self {
    let base_url: String = base_url.into();
    Self {
      http: reqwest::Client::new(),
      base_url: base_url.trim_end_matches('/').to_string(),
      token: Arc::new(RwLock::new(None)),
    }
  }

  pub fn set_token(&self, token: impl Into<String>) {
    if let Ok(mut guard) = self.token.write() {
      *guard = Some(token.into());
    }
  }

  pub fn clear_token(&self) {
    if let Ok(mut guard) = self.token.write() {
      *guard = None;
    }
  }

  pub fn token(&self) -> Option<String> {
    self.token.read().ok().and_then(|guard| guard.clone())
  }

  fn request(&self, method: Method, path: &str) -> RequestBuilder {
    let url = format!("{}{}", self.base_url, path);
    let builder = self.http.request(method, url);
    match self.token() {
      Some(token) => builder.bearer_auth(token),
      None => builder,
    }
  }

  /// Unwraps the `{message, data}` envelope, turning non-2xx responses into
  /// errors carrying the backend's own message when it sends one.
  async fn unwrap<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    if status.is_success() {
      let envelope: Envelope<T> = response.json().await?;
      return Ok(envelope.data);
    }
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<serde_json::Value>(&body)
      .ok()
      .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(String::from))
      .unwrap_or_else(|| format!("request failed with status {status}"));
    Err(eyre!(message))
  }

  async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
    debug!(path, "GET");
    Self::unwrap(self.request(Method::GET, path).send().await?).await
  }

  async fn send_json<B: Serialize, T: DeserializeOwned>(
    &self,
    method: Method,
    path: &str,
    body: &B,
  ) -> Result<T> {
    debug!(path, method = %method, "request");
    Self::unwrap(self.request(method, path).json(body).send().await?).await
  }

  async fn delete(&self, path: &str) -> Result<()> {
    debug!(path, "DELETE");
    let response = self.request(Method::DELETE, path).send().await?;
    let status = response.status();
    if status.is_success() {
      return Ok(());
    }
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<serde_json::Value>(&body)
      .ok()
      .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(String::from))
      .unwrap_or_else(|| format!("request failed with status {status}"));
    Err(eyre!(message))
  }

  // ==========================================================================
  // Auth
  // ==========================================================================

  /// Exchanges credentials for a bearer token and installs it on this client.
  pub async fn login(&self, user: &str, password: &str) -> Result<String> {
    let body = LoginRequest {
      user: user.to_string(),
      password: password.to_string(),
    };
    let data: LoginData = self.send_json(Method::POST, "/auth/login", &body).await?;
    self.set_token(&data.token);
    Ok(data.token)
  }

  // ==========================================================================
  // Blogs
  // ==========================================================================

  pub async fn blogs(&self, page: u32) -> Result<BlogPage> {
    self.get(&format!("/blogs?page={page}&limit={PAGE_SIZE}")).await
  }

  pub async fn create_blog(&self, blog: &BlogPost) -> Result<BlogPost> {
    self.send_json(Method::POST, "/blogs", blog).await
  }

  pub async fn update_blog(&self, blog: &BlogPost) -> Result<BlogPost> {
    self.send_json(Method::PUT, &format!("/blogs/{}", blog.id), blog).await
  }

  pub async fn delete_blog(&self, id: &str) -> Result<()> {
    self.delete(&format!("/blogs/{id}")).await
  }

  // ==========================================================================
  // Projects
  // ==========================================================================

  pub async fn projects(&self, page: u32) -> Result<ProjectPage> {
    self.get(&format!("/projects?page={page}&limit={PAGE_SIZE}")).await
  }

  pub async fn create_project(&self, project: &Project) -> Result<Project> {
    self.send_json(Method::POST, "/projects", project).await
  }

  pub async fn update_project(&self, project: &Project) -> Result<Project> {
    self
      .send_json(Method::PUT, &format!("/projects/{}", project.id), project)
      .await
  }

  pub async fn delete_project(&self, id: &str) -> Result<()> {
    self.delete(&format!("/projects/{id}")).await
  }

  // ==========================================================================
  // Experience
  // ==========================================================================

  pub async fn experience(&self, page: u32) -> Result<ExperiencePage> {
    self.get(&format!("/experiences?page={page}&limit={PAGE_SIZE}")).await
  }

  pub async fn create_experience(&self, entry: &Experience) -> Result<Experience> {
    self.send_json(Method::POST, "/experiences", entry).await
  }

  pub async fn update_experience(&self, entry: &Experience) -> Result<Experience> {
    self
      .send_json(Method::PUT, &format!("/experiences/{}", entry.id), entry)
      .await
  }

  pub async fn delete_experience(&self, id: &str) -> Result<()> {
    self.delete(&format!("/experiences/{id}")).await
  }

  // ==========================================================================
  // Education
  // ==========================================================================

  pub async fn education(&self, page: u32) -> Result<EducationPage> {
    self.get(&format!("/educations?page={page}&limit={PAGE_SIZE}")).await
  }

  pub async fn create_education(&self, entry: &Education) -> Result<Education> {
    self.send_json(Method::POST, "/educations", entry).await
  }

  pub async fn update_education(&self, entry: &Education) -> Result<Education> {
    self
      .send_json(Method::PUT, &format!("/educations/{}", entry.id), entry)
      .await
  }

  pub async fn delete_education(&self, id: &str) -> Result<()> {
    self.delete(&format!("/educations/{id}")).await
  }

  // ==========================================================================
  // About
  // ==========================================================================

  pub async fn about(&self) -> Result<AboutContent> {
    self.get("/about").await
  }

  /// `section` is one of [`SECTION_KEYS`].
  pub async fn update_about_section(
    &self,
    section: &str,
    data: &AboutSection,
  ) -> Result<AboutContent> {
    self
      .send_json(Method::PUT, &format!("/about/section/{section}"), data)
      .await
  }

  /// `category` is one of [`SKILL_CATEGORIES`]. The body is the full
  /// replacement list for that category.
  pub async fn update_skills(&self, category: &str, skills: &[Skill]) -> Result<AboutContent> {
    self
      .send_json(Method::PUT, &format!("/about/skills/{category}"), &skills)
      .await
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use wiremock::matchers::{body_json, header, method, path, query_param};
  use wiremock::{Mock, MockServer, ResponseTemplate};

  fn envelope(data: serde_json::Value) -> serde_json::Value {
    serde_json::json!({"message": "ok", "data": data})
  }

  #[tokio::test]
  async fn test_login_installs_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/auth/login"))
      .and(body_json(serde_json::json!({"user": "admin", "password": "hunter2"})))
      .respond_with(ResponseTemplate::new(200).set_body_json(envelope(
        serde_json::json!({"token": "jwt-token"}),
      )))
      .mount(&server)
      .await;

    let client = ApiClient::new(server.uri());
    let token = client.login("admin", "hunter2").await.unwrap();
    assert_eq!(token, "jwt-token");
    assert_eq!(client.token().as_deref(), Some("jwt-token"));
  }

  #[tokio::test]
  async fn test_list_request_sends_page_and_bearer() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/blogs"))
      .and(query_param("page", "2"))
      .and(query_param("limit", "5"))
      .and(header("authorization", "Bearer tok"))
      .respond_with(ResponseTemplate::new(200).set_body_json(envelope(
        serde_json::json!({"blogs": [{"_id": "b1", "title": "Post"}], "totalPages": 4}),
      )))
      .mount(&server)
      .await;

    let client = ApiClient::new(server.uri());
    client.set_token("tok");
    let page = client.blogs(2).await.unwrap();
    assert_eq!(page.total_pages, 4);
    assert_eq!(page.blogs[0].id, "b1");
  }

  #[tokio::test]
  async fn test_backend_message_surfaces_in_error() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
      .and(path("/projects/p1"))
      .respond_with(
        ResponseTemplate::new(401).set_body_json(serde_json::json!({"message": "jwt expired"})),
      )
      .mount(&server)
      .await;

    let client = ApiClient::new(server.uri());
    let err = client.delete_project("p1").await.unwrap_err();
    assert_eq!(err.to_string(), "jwt expired");
  }

  #[tokio::test]
  async fn test_non_json_error_falls_back_to_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/about"))
      .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
      .mount(&server)
      .await;

    let client = ApiClient::new(server.uri());
    let err = client.about().await.unwrap_err();
    assert!(err.to_string().contains("502"));
  }

  #[tokio::test]
  async fn test_update_skills_sends_bare_list() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
      .and(path("/about/skills/frontend"))
      .and(body_json(serde_json::json!([{
        "name": "React", "level": "Expert", "experience": "4 years",
        "details": "", "projects": [], "keywords": []
      }])))
      .respond_with(ResponseTemplate::new(200).set_body_json(envelope(serde_json::json!({}))))
      .mount(&server)
      .await;

    let client = ApiClient::new(server.uri());
    let skills = vec![Skill {
      name: "React".to_string(),
      level: "Expert".to_string(),
      experience: "4 years".to_string(),
      ..Default::default()
    }];
    client.update_skills("frontend", &skills).await.unwrap();
  }
}
