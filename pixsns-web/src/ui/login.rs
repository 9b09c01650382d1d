use pixsns_client::api::LoginRequest;
use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

use crate::{api, LoginInfo};

#[derive(Clone, PartialEq, Properties)]
pub struct LoginProps {
    pub info: Option<LoginInfo>,
    pub on_login: Callback<LoginInfo>,
}

pub struct Login {
    host: String,
    bucket: String,
    user: String,
    pass: String,
    in_flight: bool,
    error: Option<String>,
}

pub enum LoginMsg {
    HostChanged(String),
    BucketChanged(String),
    UserChanged(String),
    PassChanged(String),
    SubmitClicked,
    Failed(String),
}

impl Component for Login {
    type Message = LoginMsg;
    type Properties = LoginProps;

    fn create(ctx: &Context<Self>) -> Self {
        let (host, bucket, user) = match &ctx.props().info {
            Some(i) => (
                i.host.clone(),
                i.storage_bucket.clone().unwrap_or_default(),
                i.session.user_id.0.clone(),
            ),
            None => (String::new(), String::new(), String::new()),
        };
        Self {
            host,
            bucket,
            user,
            pass: String::new(),
            in_flight: false,
            error: None,
        }
    }

    fn update(&mut self, ctx: &Context<Self>, msg: Self::Message) -> bool {
        match msg {
            LoginMsg::HostChanged(h) => self.host = h,
            LoginMsg::BucketChanged(b) => self.bucket = b,
            LoginMsg::UserChanged(u) => self.user = u,
            LoginMsg::PassChanged(p) => self.pass = p,
            LoginMsg::SubmitClicked => {
                if self.in_flight {
                    return false;
                }
                self.in_flight = true;
                self.error = None;
                let host = self.host.trim().to_string();
                let bucket = Some(self.bucket.trim().to_string()).filter(|b| !b.is_empty());
                let req = LoginRequest::new(self.user.clone(), self.pass.clone());
                let on_login = ctx.props().on_login.clone();
                let on_failure = ctx.link().callback(LoginMsg::Failed);
                spawn_local(async move {
                    match api::login(host, bucket, req).await {
                        Ok(info) => on_login.emit(info),
                        Err(err) => {
                            tracing::error!(?err, "login failed");
                            on_failure.emit(err.server_or_user_message());
                        }
                    }
                });
            }
            LoginMsg::Failed(msg) => {
                self.in_flight = false;
                self.error = Some(msg);
            }
        }
        true
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        let link = ctx.link();
        html! {<>
            <h1 class="text-center my-4">{ "Sign in" }</h1>
            if let Some(error) = &self.error {
                <div class="alert alert-danger" role="alert">{ error.clone() }</div>
            }
            <form class="login-form" onsubmit={link.callback(|e: SubmitEvent| {
                e.prevent_default();
                LoginMsg::SubmitClicked
            })}>
                { field("host", "Server", "url", "https://example.org/api", &self.host,
                    link.callback(LoginMsg::HostChanged)) }
                { field("bucket", "Image bucket", "text", "example.appspot.com", &self.bucket,
                    link.callback(LoginMsg::BucketChanged)) }
                { field("user", "User id or email", "text", "user01", &self.user,
                    link.callback(LoginMsg::UserChanged)) }
                { field("pass", "Password", "password", "", &self.pass,
                    link.callback(LoginMsg::PassChanged)) }
                <button type="submit" class="btn btn-primary" disabled={self.in_flight}>
                    { "Sign in" }
                </button>
            </form>
        </>}
    }
}

fn field(
    id: &'static str,
    label: &'static str,
    kind: &'static str,
    placeholder: &'static str,
    value: &str,
    on_change: Callback<String>,
) -> Html {
    let onchange = on_change.reform(|e: Event| {
        let input: web_sys::HtmlInputElement = e.target_unchecked_into();
        input.value()
    });
    html! {
        <div class="mb-3">
            <label class="form-label" for={id}>{ label }</label>
            <input
                type={kind}
                class="form-control"
                {id}
                {placeholder}
                value={value.to_string()}
                {onchange}
            />
        </div>
    }
}
