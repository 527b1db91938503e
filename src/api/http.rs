use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use super::ImageApi;
use crate::config::ApiConfig;
use crate::error::{ClientError, ClientResult};
use crate::models::{
    AdminStats, Comment, Credentials, Image, LoginResponse, NewComment, NewImage, User,
    VoteDirection, VoteRequest,
};

/// `reqwest`-backed client for the image API.
#[derive(Clone)]
pub struct HttpApi {
    client: Client,
    base: Url,
}

#[derive(Deserialize)]
struct ErrorBody {
    detail: Option<Value>,
}

impl HttpApi {
    pub fn new(config: &ApiConfig) -> anyhow::Result<Self> {
        let base = Url::parse(&config.base_url)?;
        if base.cannot_be_a_base() {
            anyhow::bail!("API base URL {} cannot carry a path", config.base_url);
        }
        let client = Client::builder().timeout(config.timeout()).build()?;
        Ok(Self { client, base })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn request(&self, method: Method, segments: &[&str], token: Option<&str>) -> RequestBuilder {
        let request = self.client.request(method, self.endpoint(segments));
        match token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> ClientResult<T> {
        let status = response.status();
        if status.is_success() {
            response.json::<T>().await.map_err(|e| {
                if e.is_decode() {
                    ClientError::Decode {
                        status: status.as_u16(),
                        source: e,
                    }
                } else {
                    ClientError::Network(e)
                }
            })
        } else {
            Err(Self::failure(response).await)
        }
    }

    async fn expect_ok(response: Response) -> ClientResult<()> {
        if response.status().is_success() {
            Ok(())
        } else {
            Err(Self::failure(response).await)
        }
    }

    async fn failure(response: Response) -> ClientError {
        let status = response.status();
        let detail = read_detail(response).await;
        tracing::debug!(%status, ?detail, "API request rejected");
        classify(status, detail)
    }
}

async fn read_detail(response: Response) -> Option<String> {
    let body = response.json::<ErrorBody>().await.ok()?;
    detail_message(body.detail?)
}

/// `detail` is either a plain string or a list of validation entries with `msg`.
fn detail_message(detail: Value) -> Option<String> {
    match detail {
        Value::String(msg) => Some(msg),
        Value::Array(items) => items.into_iter().find_map(|item| {
            item.get("msg")
                .and_then(Value::as_str)
                .map(str::to_string)
        }),
        _ => None,
    }
}

pub(crate) fn classify(status: StatusCode, detail: Option<String>) -> ClientError {
    match status {
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            ClientError::Validation(detail.unwrap_or_else(|| "Invalid request".to_string()))
        }
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ClientError::Auth(detail),
        StatusCode::NOT_FOUND => ClientError::NotFound(detail),
        StatusCode::CONFLICT => ClientError::Conflict(detail),
        other => ClientError::Server {
            status: other.as_u16(),
            detail,
        },
    }
}

#[async_trait]
impl ImageApi for HttpApi {
    async fn health(&self) -> ClientResult<()> {
        let response = self.request(Method::GET, &[""], None).send().await?;
        Self::expect_ok(response).await
    }

    async fn login(&self, credentials: &Credentials) -> ClientResult<LoginResponse> {
        let response = self
            .request(Method::POST, &["login"], None)
            .json(credentials)
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn register(&self, credentials: &Credentials) -> ClientResult<User> {
        let response = self
            .request(Method::POST, &["register"], None)
            .json(credentials)
            .send()
            .await?;
        // The backend signals a taken email with 400.
        if matches!(
            response.status(),
            StatusCode::BAD_REQUEST | StatusCode::CONFLICT
        ) {
            return Err(ClientError::Conflict(read_detail(response).await));
        }
        Self::decode(response).await
    }

    async fn me(&self, token: &str) -> ClientResult<User> {
        let response = self.request(Method::GET, &["me"], Some(token)).send().await?;
        Self::decode(response).await
    }

    async fn list_images(&self) -> ClientResult<Vec<Image>> {
        let response = self.request(Method::GET, &["images"], None).send().await?;
        Self::decode(response).await
    }

    async fn upload_image(&self, token: &str, image: &NewImage) -> ClientResult<Image> {
        let response = self
            .request(Method::POST, &["images"], Some(token))
            .json(image)
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn delete_image(&self, token: &str, image_id: &str) -> ClientResult<()> {
        let response = self
            .request(Method::DELETE, &["images", image_id], Some(token))
            .send()
            .await?;
        Self::expect_ok(response).await
    }

    async fn vote(&self, token: &str, image_id: &str, direction: VoteDirection) -> ClientResult<()> {
        let response = self
            .request(Method::POST, &["images", image_id, "vote"], Some(token))
            .json(&VoteRequest {
                vote_type: direction,
            })
            .send()
            .await?;
        Self::expect_ok(response).await
    }

    async fn like(&self, token: &str, image_id: &str) -> ClientResult<()> {
        let response = self
            .request(Method::POST, &["images", image_id, "like"], Some(token))
            .send()
            .await?;
        Self::expect_ok(response).await
    }

    async fn list_comments(&self, image_id: &str) -> ClientResult<Vec<Comment>> {
        let response = self
            .request(Method::GET, &["images", image_id, "comments"], None)
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn post_comment(&self, token: &str, image_id: &str, content: &str) -> ClientResult<Comment> {
        let response = self
            .request(Method::POST, &["images", image_id, "comments"], Some(token))
            .json(&NewComment {
                content: content.to_string(),
            })
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn delete_comment(&self, token: &str, comment_id: &str) -> ClientResult<()> {
        let response = self
            .request(Method::DELETE, &["comments", comment_id], Some(token))
            .send()
            .await?;
        Self::expect_ok(response).await
    }

    async fn admin_stats(&self, token: &str) -> ClientResult<AdminStats> {
        let response = self
            .request(Method::GET, &["admin", "stats"], Some(token))
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn admin_users(&self, token: &str) -> ClientResult<Vec<User>> {
        let response = self
            .request(Method::GET, &["admin", "users"], Some(token))
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn ban_user(&self, token: &str, user_id: &str) -> ClientResult<()> {
        let response = self
            .request(Method::POST, &["admin", "users", user_id, "ban"], Some(token))
            .send()
            .await?;
        Self::expect_ok(response).await
    }

    async fn unban_user(&self, token: &str, user_id: &str) -> ClientResult<()> {
        let response = self
            .request(Method::POST, &["admin", "users", user_id, "unban"], Some(token))
            .send()
            .await?;
        Self::expect_ok(response).await
    }
}
