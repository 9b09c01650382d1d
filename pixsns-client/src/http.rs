use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use url::Url;

use crate::{
    api::{
        self, AuthToken, Comment, CommentId, CommentUpdate, LoginRequest, LoginResponse,
        NewComment, PostId, Profile, Session,
    },
    CommentApi, Error, ImageStore, OptimizedImage,
};

pub const DEFAULT_AUTH_SCHEME: &str = "Token";
pub const DEFAULT_STORAGE_BASE: &str = "https://firebasestorage.googleapis.com";

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ClientConfig {
    /// Base of the REST API, eg. `https://example.org/api`
    pub api_base: String,

    /// Scheme put in front of the token in the `Authorization` header
    pub auth_scheme: String,

    pub storage: Option<StorageConfig>,
}

impl ClientConfig {
    pub fn new(api_base: String) -> ClientConfig {
        ClientConfig {
            api_base: api_base.trim_end_matches('/').to_string(),
            auth_scheme: String::from(DEFAULT_AUTH_SCHEME),
            storage: None,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.api_base.trim_end_matches('/'), path)
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StorageConfig {
    pub base: String,
    pub bucket: String,

    /// Prefix of the object names of uploaded images
    pub folder: String,
}

impl StorageConfig {
    pub fn new(bucket: String) -> StorageConfig {
        StorageConfig {
            base: String::from(DEFAULT_STORAGE_BASE),
            bucket,
            folder: String::from("comments"),
        }
    }

    fn objects_url(&self) -> Result<Url, Error> {
        let mut url = Url::parse(&self.base)
            .map_err(|e| Error::Transport(format!("invalid storage url {:?}: {e}", self.base)))?;
        url.path_segments_mut()
            .map_err(|()| Error::Transport(format!("storage url {:?} has no path", self.base)))?
            .pop_if_empty()
            .extend(["v0", "b", self.bucket.as_str(), "o"]);
        Ok(url)
    }
}

async fn read_json<R>(resp: reqwest::Response) -> Result<R, Error>
where
    R: for<'de> serde::Deserialize<'de>,
{
    let body = check_status(resp).await?;
    Ok(serde_json::from_slice(&body)?)
}

async fn check_status(resp: reqwest::Response) -> Result<Vec<u8>, Error> {
    let status = resp.status();
    let body = resp.bytes().await?;
    if !status.is_success() {
        let err = api::Error::parse(status, &body);
        tracing::debug!(?status, ?err, "server rejected request");
        return Err(Error::Rejected(err));
    }
    Ok(body.to_vec())
}

/// Talks to the REST API on behalf of one logged-in user
#[derive(Clone, Debug)]
pub struct HttpApi {
    client: reqwest::Client,
    config: Arc<ClientConfig>,
    token: AuthToken,
}

impl HttpApi {
    pub fn new(config: ClientConfig, session: &Session) -> HttpApi {
        HttpApi {
            client: reqwest::Client::new(),
            config: Arc::new(config),
            token: session.token.clone(),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub async fn login(config: &ClientConfig, req: &LoginRequest) -> Result<LoginResponse, Error> {
        req.validate()?;
        let resp = reqwest::Client::new()
            .post(config.url("login/"))
            .json(req)
            .send()
            .await?;
        read_json(resp).await
    }

    /// Image store matching the storage configuration, if there is one
    pub fn image_store(&self) -> Option<FirebaseStorage> {
        self.config.storage.clone().map(|config| FirebaseStorage {
            client: self.client.clone(),
            config,
        })
    }

    fn authorization(&self) -> String {
        format!("{} {}", self.config.auth_scheme, self.token.0)
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let url = self.config.url(path);
        tracing::debug!(%method, %url, "api request");
        self.client
            .request(method, url)
            .header(AUTHORIZATION, self.authorization())
    }
}

#[async_trait(?Send)]
impl CommentApi for HttpApi {
    async fn fetch_comments(&self, post: PostId) -> Result<Vec<Comment>, Error> {
        let resp = self
            .request(reqwest::Method::GET, &format!("posts/{post}/comments/"))
            .send()
            .await?;
        read_json(resp).await
    }

    async fn create_comment(&self, post: PostId, c: &NewComment) -> Result<Comment, Error> {
        c.validate()?;
        let resp = self
            .request(reqwest::Method::POST, &format!("posts/{post}/comments/"))
            .json(c)
            .send()
            .await?;
        read_json(resp).await
    }

    async fn update_comment(&self, id: CommentId, c: &CommentUpdate) -> Result<Comment, Error> {
        c.validate()?;
        let resp = self
            .request(reqwest::Method::PUT, &format!("comments/{id}/"))
            .json(c)
            .send()
            .await?;
        read_json(resp).await
    }

    async fn delete_comment(&self, id: CommentId) -> Result<(), Error> {
        let resp = self
            .request(reqwest::Method::DELETE, &format!("comments/{id}/"))
            .send()
            .await?;
        check_status(resp).await?;
        Ok(())
    }

    async fn whoami(&self) -> Result<Profile, Error> {
        let resp = self
            .request(reqwest::Method::GET, "profile/me/")
            .send()
            .await?;
        read_json(resp).await
    }
}

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadedObject {
    name: String,

    /// Comma-separated when the object has several
    #[serde(default)]
    download_tokens: Option<String>,
}

/// Object store speaking the Firebase Storage REST protocol
#[derive(Clone, Debug)]
pub struct FirebaseStorage {
    client: reqwest::Client,
    config: StorageConfig,
}

impl FirebaseStorage {
    pub fn new(config: StorageConfig) -> FirebaseStorage {
        FirebaseStorage {
            client: reqwest::Client::new(),
            config,
        }
    }

    fn object_name(&self, file_name: &str) -> String {
        format!(
            "{}/{}_{}",
            self.config.folder.trim_matches('/'),
            Utc::now().timestamp_millis(),
            file_name
        )
    }

    fn public_url(&self, obj: &UploadedObject) -> Result<String, Error> {
        let mut url = self.config.objects_url()?;
        url.path_segments_mut()
            .map_err(|()| Error::Transport(String::from("storage url has no path")))?
            .push(&obj.name);
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("alt", "media");
            let token = obj
                .download_tokens
                .as_deref()
                .and_then(|t| t.split(',').next())
                .filter(|t| !t.is_empty());
            if let Some(token) = token {
                query.append_pair("token", token);
            }
        }
        Ok(url.into())
    }
}

#[async_trait(?Send)]
impl ImageStore for FirebaseStorage {
    async fn upload(&self, img: &OptimizedImage) -> Result<String, Error> {
        let mut url = self.config.objects_url()?;
        url.query_pairs_mut()
            .append_pair("uploadType", "media")
            .append_pair("name", &self.object_name(&img.file_name));
        tracing::debug!(%url, size = img.bytes.len(), "uploading image");
        let resp = self
            .client
            .post(url)
            .header(CONTENT_TYPE, img.mime)
            .body(img.bytes.clone())
            .send()
            .await?;
        let obj: UploadedObject = read_json(resp).await?;
        self.public_url(&obj)
    }
}
