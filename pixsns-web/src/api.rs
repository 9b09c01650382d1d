use pixsns_client::{
    api::{LoginRequest, PostId},
    optimize_image, send_submission, CancelToken, ClientConfig, CommentApi, Error,
    FirebaseStorage, HttpApi, ImageError, OptimizedImage, Sent, StorageConfig, Submission,
};
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;

use crate::LoginInfo;

pub fn config(host: &str, storage_bucket: Option<String>) -> ClientConfig {
    let mut config = ClientConfig::new(host.to_string());
    config.storage = storage_bucket.map(StorageConfig::new);
    config
}

pub async fn login(
    host: String,
    storage_bucket: Option<String>,
    req: LoginRequest,
) -> Result<LoginInfo, Error> {
    let resp = HttpApi::login(&config(&host, storage_bucket.clone()), &req).await?;
    Ok(LoginInfo {
        host,
        storage_bucket,
        session: resp.session(),
        display_name: resp.display_name,
    })
}

/// The clients a comment thread talks to on behalf of the logged-in user
#[derive(Clone)]
pub struct Remote {
    pub api: HttpApi,
    pub store: Option<FirebaseStorage>,
    pub cancel: CancelToken,
}

impl Remote {
    pub fn new(login: &LoginInfo) -> Remote {
        let api = HttpApi::new(
            config(&login.host, login.storage_bucket.clone()),
            &login.session,
        );
        let store = api.image_store();
        Remote {
            api,
            store,
            cancel: CancelToken::new(),
        }
    }

    pub async fn fetch(&self, post: PostId) -> Result<Vec<pixsns_client::api::Comment>, Error> {
        self.cancel.run(self.api.fetch_comments(post)).await?
    }

    /// Uploads the staged image if needed, then sends the comment
    pub async fn submit(&self, sub: Submission) -> Sent {
        send_submission(&self.api, &self.store, &self.cancel, &sub).await
    }

    pub async fn delete(&self, id: pixsns_client::api::CommentId) -> Result<(), Error> {
        self.cancel.run(self.api.delete_comment(id)).await?
    }
}

/// Reads and optimises an image picked by the user
pub async fn read_image(file: web_sys::File) -> Result<OptimizedImage, Error> {
    let unreadable = |e: wasm_bindgen::JsValue| ImageError::Decode {
        file_name: file.name(),
        message: format!("{e:?}"),
    };
    let buf = JsFuture::from(file.array_buffer())
        .await
        .map_err(unreadable)?
        .dyn_into::<js_sys::ArrayBuffer>()
        .map_err(unreadable)?;
    let bytes = js_sys::Uint8Array::new(&buf).to_vec();
    Ok(optimize_image(&file.name(), &bytes)?)
}
