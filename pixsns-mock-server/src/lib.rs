use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use pixsns_client::{
    api::{
        self, AuthToken, Comment, CommentId, CommentUpdate, LoginRequest, LoginResponse,
        NewComment, PostId, Profile, Session, UserId, Uuid,
    },
    CommentApi, Error, ImageStore, OptimizedImage,
};

/// A request as the mock server received it
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Request {
    Fetch(PostId),
    Create { post: PostId, comment: NewComment },
    Update { id: CommentId, update: CommentUpdate },
    Delete(CommentId),
    Whoami,
    Upload { file_name: String },
}

/// In-memory stand-in for the REST API and the object store, that records
/// every request it gets
pub struct MockServer(Mutex<State>);

#[derive(Debug, Default)]
struct State {
    users: BTreeMap<UserId, MockUser>,
    comments: BTreeMap<PostId, Vec<Comment>>,
    next_id: i64,
    requests: Vec<Request>,
    /// Requests to let through, and the error to fail the one after with
    fail: Option<(usize, api::Error)>,
    uploads: Vec<OptimizedImage>,
}

#[derive(Debug)]
struct MockUser {
    password: String,
    profile: Profile,
    sessions: HashSet<AuthToken>,
}

impl State {
    fn resolve(&self, tok: &AuthToken) -> Result<&MockUser, api::Error> {
        self.users
            .values()
            .find(|u| u.sessions.contains(tok))
            .ok_or_else(|| api::Error::Unauthorized(Some(String::from("Invalid token."))))
    }

    fn record(&mut self, r: Request) -> Result<(), api::Error> {
        self.requests.push(r);
        match self.fail.take() {
            None => Ok(()),
            Some((0, e)) => Err(e),
            Some((n, e)) => {
                self.fail = Some((n - 1, e));
                Ok(())
            }
        }
    }

    fn comment_mut(&mut self, id: CommentId) -> Result<&mut Comment, api::Error> {
        self.comments
            .values_mut()
            .flat_map(|cs| cs.iter_mut())
            .find(|c| c.id == id)
            .ok_or_else(|| api::Error::NotFound(Some(String::from("Comment not found."))))
    }

    fn check_owner(
        &mut self,
        tok: &AuthToken,
        id: CommentId,
        action: &str,
    ) -> Result<(), api::Error> {
        let user = self.resolve(tok)?.profile.clone();
        let c = self.comment_mut(id)?;
        if c.user_uid.as_ref() != Some(&user.user_id) && !user.is_admin {
            return Err(api::Error::PermissionDenied(Some(format!(
                "You can only {action} your own comments."
            ))));
        }
        Ok(())
    }
}

impl MockServer {
    pub fn new() -> MockServer {
        MockServer(Mutex::new(State {
            next_id: 1,
            ..State::default()
        }))
    }

    pub fn admin_create_user(
        &self,
        user_id: &str,
        password: &str,
        display_name: &str,
    ) -> Result<(), api::Error> {
        let mut s = self.0.lock();
        let id = UserId(user_id.to_string());
        if s.users.contains_key(&id) {
            return Err(api::Error::Invalid(format!("user {id} already exists")));
        }
        s.users.insert(
            id.clone(),
            MockUser {
                password: password.to_string(),
                profile: Profile {
                    user_id: id,
                    display_name: Some(display_name.to_string()),
                    email: None,
                    profile_image: Some(format!("https://img.example/{user_id}.png")),
                    is_admin: false,
                },
                sessions: HashSet::new(),
            },
        );
        Ok(())
    }

    pub fn login(&self, req: &LoginRequest) -> Result<LoginResponse, api::Error> {
        req.validate()?;
        let mut s = self.0.lock();
        let u = s
            .users
            .get_mut(&UserId(req.user_id.clone()))
            .filter(|u| u.password == req.password)
            .ok_or_else(|| {
                api::Error::Unauthorized(Some(String::from("Invalid user id or password.")))
            })?;
        let token = AuthToken(Uuid::new_v4().to_string());
        u.sessions.insert(token.clone());
        Ok(LoginResponse {
            token,
            user_id: u.profile.user_id.clone(),
            display_name: u.profile.display_name.clone(),
            profile_image: u.profile.profile_image.clone(),
        })
    }

    pub fn has_user(&self, user_id: &str) -> bool {
        self.0.lock().users.contains_key(&UserId(user_id.to_string()))
    }

    /// Creates the user if needed, and logs them in
    pub fn test_session(&self, user_id: &str) -> Session {
        if !self.has_user(user_id) {
            self.admin_create_user(user_id, "pass", &format!("User {user_id}"))
                .unwrap_or_else(|e| panic!("creating {user_id}: {e}"));
        }
        self.login(&LoginRequest::new(user_id.to_string(), String::from("pass")))
            .unwrap_or_else(|e| panic!("logging in {user_id}: {e}"))
            .session()
    }

    /// Stores comments as-is, bypassing every check
    pub fn test_insert_comments(&self, post: PostId, comments: Vec<Comment>) {
        let mut s = self.0.lock();
        if let Some(max) = comments.iter().map(|c| c.id.0).max() {
            s.next_id = s.next_id.max(max + 1);
        }
        s.comments.entry(post).or_default().extend(comments);
    }

    /// Makes the next request fail with `err`
    pub fn fail_next(&self, err: api::Error) {
        self.fail_after(0, err)
    }

    /// Lets `skip` requests through, then fails the next one with `err`
    pub fn fail_after(&self, skip: usize, err: api::Error) {
        self.0.lock().fail = Some((skip, err));
    }

    pub fn requests(&self) -> Vec<Request> {
        self.0.lock().requests.clone()
    }

    pub fn clear_requests(&self) {
        self.0.lock().requests.clear();
    }

    pub fn comments(&self, post: PostId) -> Vec<Comment> {
        self.0.lock().comments.get(&post).cloned().unwrap_or_default()
    }

    pub fn uploads(&self) -> Vec<OptimizedImage> {
        self.0.lock().uploads.clone()
    }

    /// A client acting on behalf of the holder of `token`
    pub fn client(&self, token: AuthToken) -> MockClient<'_> {
        MockClient { server: self, token }
    }

    fn fetch_comments(&self, tok: &AuthToken, post: PostId) -> Result<Vec<Comment>, api::Error> {
        let mut s = self.0.lock();
        s.record(Request::Fetch(post))?;
        s.resolve(tok)?;
        Ok(s.comments.get(&post).cloned().unwrap_or_default())
    }

    fn create_comment(
        &self,
        tok: &AuthToken,
        post: PostId,
        c: &NewComment,
    ) -> Result<Comment, api::Error> {
        let mut s = self.0.lock();
        s.record(Request::Create {
            post,
            comment: c.clone(),
        })?;
        c.validate()?;
        let author = s.resolve(tok)?.profile.clone();
        let siblings = s.comments.entry(post).or_default();
        if let Some(parent) = c.parent {
            if !siblings.iter().any(|p| p.id == parent) {
                return Err(api::Error::Invalid(format!(
                    "parent: Invalid pk \"{parent}\" - object does not exist."
                )));
            }
        }
        let id = CommentId(s.next_id);
        s.next_id += 1;
        let res = Comment {
            id,
            parent: c.parent,
            post: Some(post),
            content: c.content.clone(),
            image_url: c.image_url.clone(),
            user_name: author.display_name.clone(),
            user_uid: Some(author.user_id),
            display_name: author.display_name,
            profile_image: author.profile_image,
            created_at: Utc::now(),
        };
        s.comments.entry(post).or_default().push(res.clone());
        tracing::debug!(%id, %post, "mock server created comment");
        Ok(res)
    }

    fn update_comment(
        &self,
        tok: &AuthToken,
        id: CommentId,
        u: &CommentUpdate,
    ) -> Result<Comment, api::Error> {
        let mut s = self.0.lock();
        s.record(Request::Update {
            id,
            update: u.clone(),
        })?;
        u.validate()?;
        s.check_owner(tok, id, "edit")?;
        let c = s.comment_mut(id)?;
        c.content = u.content.clone();
        c.image_url = u.image_url.clone();
        Ok(c.clone())
    }

    fn delete_comment(&self, tok: &AuthToken, id: CommentId) -> Result<(), api::Error> {
        let mut s = self.0.lock();
        s.record(Request::Delete(id))?;
        s.check_owner(tok, id, "delete")?;
        // replies go away along with what they reply to
        for cs in s.comments.values_mut() {
            let mut doomed = HashSet::from([id]);
            loop {
                let before = doomed.len();
                for c in cs.iter() {
                    if c.parent.map(|p| doomed.contains(&p)).unwrap_or(false) {
                        doomed.insert(c.id);
                    }
                }
                if doomed.len() == before {
                    break;
                }
            }
            cs.retain(|c| !doomed.contains(&c.id));
        }
        Ok(())
    }

    fn whoami(&self, tok: &AuthToken) -> Result<Profile, api::Error> {
        let mut s = self.0.lock();
        s.record(Request::Whoami)?;
        Ok(s.resolve(tok)?.profile.clone())
    }

    fn upload(&self, tok: &AuthToken, img: &OptimizedImage) -> Result<String, api::Error> {
        let mut s = self.0.lock();
        s.record(Request::Upload {
            file_name: img.file_name.clone(),
        })?;
        s.resolve(tok)?;
        s.uploads.push(img.clone());
        Ok(format!(
            "https://storage.example/comments/{}_{}",
            s.uploads.len(),
            img.file_name
        ))
    }
}

impl Default for MockServer {
    fn default() -> MockServer {
        MockServer::new()
    }
}

#[derive(Clone)]
pub struct MockClient<'a> {
    server: &'a MockServer,
    token: AuthToken,
}

#[async_trait(?Send)]
impl<'a> CommentApi for MockClient<'a> {
    async fn fetch_comments(&self, post: PostId) -> Result<Vec<Comment>, Error> {
        Ok(self.server.fetch_comments(&self.token, post)?)
    }

    async fn create_comment(&self, post: PostId, c: &NewComment) -> Result<Comment, Error> {
        Ok(self.server.create_comment(&self.token, post, c)?)
    }

    async fn update_comment(&self, id: CommentId, u: &CommentUpdate) -> Result<Comment, Error> {
        Ok(self.server.update_comment(&self.token, id, u)?)
    }

    async fn delete_comment(&self, id: CommentId) -> Result<(), Error> {
        Ok(self.server.delete_comment(&self.token, id)?)
    }

    async fn whoami(&self) -> Result<Profile, Error> {
        Ok(self.server.whoami(&self.token)?)
    }
}

#[async_trait(?Send)]
impl<'a> ImageStore for MockClient<'a> {
    async fn upload(&self, img: &OptimizedImage) -> Result<String, Error> {
        Ok(self.server.upload(&self.token, img)?)
    }
}
