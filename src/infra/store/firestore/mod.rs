//! Firestore REST adapter for the post collection.

pub mod document;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use tracing::{debug, warn};
use url::Url;

use crate::application::repos::{
    CreatePostParams, PostsRepo, PostsWriteRepo, RepoError, UpdatePostParams,
};
use crate::config::FirestoreSettings;
use crate::domain::posts::Post;
use crate::infra::error::InfraError;

use self::document::{Document, DocumentError, RunQueryItem, encode_fields, list_query, slug_query};

pub struct FirestorePostStore {
    client: Client,
    documents_url: Url,
    collection: String,
    api_key: Option<String>,
    bearer_token: Option<String>,
}

impl FirestorePostStore {
    pub fn new(settings: &FirestoreSettings) -> Result<Self, InfraError> {
        let client = Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|err| InfraError::store(format!("failed to build HTTP client: {err}")))?;

        let mut documents_url = settings.base_url.clone();
        documents_url
            .path_segments_mut()
            .map_err(|_| InfraError::store("firestore base URL cannot carry a path"))?
            .pop_if_empty()
            .extend([
                "projects",
                settings.project_id.as_str(),
                "databases",
                settings.database.as_str(),
                "documents",
            ]);

        Ok(Self {
            client,
            documents_url,
            collection: settings.collection.clone(),
            api_key: settings.api_key.clone(),
            bearer_token: settings.bearer_token.clone(),
        })
    }

    fn run_query_url(&self) -> Result<Url, RepoError> {
        Url::parse(&format!("{}:runQuery", self.documents_url)).map_err(invalid_url)
    }

    fn collection_url(&self) -> Result<Url, RepoError> {
        self.documents_url_with(&[self.collection.as_str()])
    }

    fn document_url(&self, id: &str) -> Result<Url, RepoError> {
        let mut url = self.documents_url_with(&[self.collection.as_str(), id])?;
        url.query_pairs_mut()
            .append_pair("currentDocument.exists", "true");
        Ok(url)
    }

    fn documents_url_with(&self, segments: &[&str]) -> Result<Url, RepoError> {
        let mut url = self.documents_url.clone();
        url.path_segments_mut()
            .map_err(|_| invalid_url("firestore URL cannot carry a path"))?
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, mut url: Url) -> RequestBuilder {
        if let Some(key) = self.api_key.as_deref() {
            url.query_pairs_mut().append_pair("key", key);
        }
        let builder = self.client.request(method, url);
        match self.bearer_token.as_deref() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, RepoError> {
        let response = builder.send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(err) => {
                debug!(
                    target = "studio_blog::store::firestore",
                    status = status.as_u16(),
                    error = %err,
                    "failed to read error response body"
                );
                String::new()
            }
        };
        Err(map_status(status, body))
    }

    async fn run_query(&self, query: serde_json::Value) -> Result<Vec<Document>, RepoError> {
        let request = self
            .request(Method::POST, self.run_query_url()?)
            .json(&query);
        let items: Vec<RunQueryItem> = self
            .send(request)
            .await?
            .json()
            .await
            .map_err(map_reqwest_error)?;

        Ok(items.into_iter().filter_map(|item| item.document).collect())
    }

    async fn ensure_slug_free(&self, slug: &str, owner: Option<&str>) -> Result<(), RepoError> {
        match self.find_post_by_slug(slug).await? {
            Some(existing) if existing.id.as_deref() != owner => Err(RepoError::duplicate_slug()),
            _ => Ok(()),
        }
    }

    async fn write_document(&self, method: Method, url: Url, post: &Post) -> Result<Post, RepoError> {
        let body = encode_fields(post).map_err(|err| RepoError::InvalidInput {
            message: err.to_string(),
        })?;
        let document: Document = self
            .send(self.request(method, url).json(&body))
            .await?
            .json()
            .await
            .map_err(map_reqwest_error)?;

        document.to_post().map_err(document_error)
    }
}

#[async_trait]
impl PostsRepo for FirestorePostStore {
    async fn list_posts(&self) -> Result<Vec<Post>, RepoError> {
        let documents = self.run_query(list_query(&self.collection)).await?;

        let mut posts = Vec::with_capacity(documents.len());
        for document in documents {
            match document.to_post() {
                Ok(post) => posts.push(post),
                Err(err) => warn!(
                    target = "studio_blog::store::firestore",
                    document = %document.name,
                    error = %err,
                    "skipping malformed post document"
                ),
            }
        }

        debug!(
            target = "studio_blog::store::firestore",
            count = posts.len(),
            "listed posts"
        );
        Ok(posts)
    }

    async fn find_post_by_slug(&self, slug: &str) -> Result<Option<Post>, RepoError> {
        let documents = self.run_query(slug_query(&self.collection, slug)).await?;
        documents
            .first()
            .map(|document| document.to_post().map_err(document_error))
            .transpose()
    }
}

#[async_trait]
impl PostsWriteRepo for FirestorePostStore {
    async fn create_post(&self, params: CreatePostParams) -> Result<Post, RepoError> {
        self.ensure_slug_free(&params.slug, None).await?;

        let post = params.into_post(None);
        self.write_document(Method::POST, self.collection_url()?, &post)
            .await
    }

    async fn update_post(&self, params: UpdatePostParams) -> Result<Post, RepoError> {
        self.ensure_slug_free(&params.slug, Some(params.id.as_str()))
            .await?;

        let url = self.document_url(&params.id)?;
        let post = params.into_post();
        self.write_document(Method::PATCH, url, &post).await
    }

    async fn delete_post(&self, id: &str) -> Result<(), RepoError> {
        let url = self.document_url(id)?;
        self.send(self.request(Method::DELETE, url)).await?;
        Ok(())
    }
}

fn map_reqwest_error(err: reqwest::Error) -> RepoError {
    if err.is_timeout() {
        RepoError::Timeout
    } else {
        RepoError::from_persistence(err)
    }
}

fn map_status(status: StatusCode, body: String) -> RepoError {
    match status {
        StatusCode::NOT_FOUND => RepoError::NotFound,
        StatusCode::CONFLICT => RepoError::Duplicate {
            constraint: "firestore.document".to_string(),
        },
        StatusCode::BAD_REQUEST => RepoError::InvalidInput { message: body },
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => RepoError::Timeout,
        _ => RepoError::Persistence(format!("firestore responded with {status}: {body}")),
    }
}

fn document_error(err: DocumentError) -> RepoError {
    RepoError::integrity(err.to_string())
}

fn invalid_url(err: impl std::fmt::Display) -> RepoError {
    RepoError::InvalidInput {
        message: format!("invalid firestore URL: {err}"),
    }
}
