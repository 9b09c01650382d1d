use gloo_storage::{LocalStorage, Storage};
use pixsns_client::api::Session;
use yew::prelude::*;

mod api;
mod ui;
mod util;

const KEY_LOGIN: &str = "login";

fn main() {
    tracing_wasm::set_as_global_default();
    yew::Renderer::<Root>::new().render();
}

/// Everything persisted about the logged-in user
#[derive(Clone, Debug, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct LoginInfo {
    /// Base URL of the API, eg. https://example.org/api
    pub host: String,
    pub storage_bucket: Option<String>,
    pub session: Session,
    pub display_name: Option<String>,
}

pub enum RootMsg {
    Login(LoginInfo),
    Logout,
}

/// The only component that touches the persisted login; everything below
/// gets it through props
pub struct Root {
    login: Option<LoginInfo>,
    logout: Option<LoginInfo>, // kept to prefill the login form
}

impl Component for Root {
    type Message = RootMsg;
    type Properties = ();

    fn create(_ctx: &Context<Self>) -> Self {
        Root {
            login: LocalStorage::get(KEY_LOGIN).ok(),
            logout: None,
        }
    }

    fn update(&mut self, _ctx: &Context<Self>, msg: RootMsg) -> bool {
        match msg {
            RootMsg::Login(login) => {
                if let Err(err) = LocalStorage::set(KEY_LOGIN, &login) {
                    tracing::error!(?err, "failed saving login info to local storage");
                }
                self.login = Some(login);
            }
            RootMsg::Logout => {
                LocalStorage::delete(KEY_LOGIN);
                self.logout = self.login.take();
            }
        }
        true
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        match &self.login {
            None => html! {
                <div class="container">
                    <ui::Login
                        info={self.logout.clone()}
                        on_login={ctx.link().callback(RootMsg::Login)}
                    />
                </div>
            },
            Some(login) => html! {
                <ui::App
                    login={login.clone()}
                    on_logout={ctx.link().callback(|()| RootMsg::Logout)}
                />
            },
        }
    }
}
