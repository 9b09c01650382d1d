use std::{io::Write, path::PathBuf};

use anyhow::{anyhow, Context};
use pixsns_client::{
    api::{AuthToken, Comment, CommentId, LoginRequest, PostId, Session, UserId},
    optimize_image, ClientConfig, CommentApi, CommentThread, CommentTreeView,
    FirebaseStorage, HttpApi, StorageConfig,
};

mod render;

#[derive(structopt::StructOpt)]
struct Opt {
    /// Base URL of the API, eg. https://example.org/api
    #[structopt(short, long, env = "PIXSNS_HOST")]
    host: String,

    /// Scheme of the Authorization header
    #[structopt(long, default_value = "Token")]
    auth_scheme: String,

    /// Bucket images get uploaded to
    #[structopt(long, env = "PIXSNS_STORAGE_BUCKET")]
    storage_bucket: Option<String>,

    #[structopt(subcommand)]
    cmd: Command,
}

#[derive(structopt::StructOpt)]
enum Command {
    /// Log in and print the session variables to export
    Login {
        /// User id or email address
        user_id: String,

        #[structopt(env = "PIXSNS_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Show the profile of the logged-in user
    Whoami,

    /// Show the comments of a post
    List {
        post: PostId,

        /// Show all replies instead of summaries
        #[structopt(short, long)]
        all: bool,
    },

    /// Comment on a post
    Post {
        post: PostId,
        text: String,

        #[structopt(long)]
        image: Option<PathBuf>,
    },

    /// Reply to a comment
    Reply {
        post: PostId,
        parent: CommentId,
        text: String,

        #[structopt(long)]
        image: Option<PathBuf>,
    },

    /// Replace the text of one of your comments
    Edit {
        post: PostId,
        id: CommentId,
        text: String,

        /// Replace the attached image
        #[structopt(long)]
        image: Option<PathBuf>,

        /// Drop the attached image
        #[structopt(long)]
        remove_image: bool,
    },

    /// Delete one of your comments, along with its replies
    Delete {
        post: PostId,
        id: CommentId,

        /// Do not ask for confirmation
        #[structopt(short, long)]
        yes: bool,
    },

    /// Show a comment listing saved as JSON, without contacting the server
    Render {
        file: PathBuf,

        /// Show the menu markers as this user would see them
        #[structopt(long)]
        user: Option<String>,

        #[structopt(short, long)]
        all: bool,
    },
}

fn session() -> anyhow::Result<Session> {
    let token =
        std::env::var("PIXSNS_TOKEN").context("retrieving PIXSNS_TOKEN environment variable")?;
    let user_id = std::env::var("PIXSNS_USER_ID")
        .context("retrieving PIXSNS_USER_ID environment variable")?;
    Ok(Session {
        token: AuthToken(token),
        user_id: UserId(user_id),
    })
}

fn confirm(question: &str) -> anyhow::Result<bool> {
    print!("{question} [y/N] ");
    std::io::stdout().flush().context("flushing stdout")?;
    let mut answer = String::new();
    std::io::stdin()
        .read_line(&mut answer)
        .context("reading confirmation")?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}

type Thread = CommentThread<HttpApi, Option<FirebaseStorage>>;

async fn open_thread(config: ClientConfig, post: PostId) -> anyhow::Result<Thread> {
    let session = session()?;
    let api = HttpApi::new(config, &session);
    let store = api.image_store();
    let mut thread = CommentThread::new(
        api,
        store,
        CommentTreeView::new(post, Some(session)),
    );
    thread.refresh().await;
    check_notice(&thread)?;
    Ok(thread)
}

/// Turns a failure the view has shown into an error
fn check_notice(thread: &Thread) -> anyhow::Result<()> {
    match thread.view().notice() {
        Some(pixsns_client::Notice::Error(msg)) => Err(anyhow!("{msg}")),
        _ => Ok(()),
    }
}

async fn compose(thread: &mut Thread, text: &str, image: Option<PathBuf>) -> anyhow::Result<Comment> {
    thread.view_mut().set_text(text)?;
    if let Some(path) = image {
        let bytes =
            std::fs::read(&path).with_context(|| format!("reading image {path:?}"))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| String::from("image"));
        thread.view_mut().stage_image(optimize_image(&name, &bytes)?)?;
    }
    Ok(thread.submit().await.context("submitting comment")?)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let opt = <Opt as structopt::StructOpt>::from_args();

    let mut config = ClientConfig::new(opt.host);
    config.auth_scheme = opt.auth_scheme;
    config.storage = opt.storage_bucket.map(StorageConfig::new);

    match opt.cmd {
        Command::Login { user_id, password } => {
            let resp = HttpApi::login(&config, &LoginRequest::new(user_id, password))
                .await
                .context("logging in")?;
            println!("export PIXSNS_TOKEN={}", resp.token.0);
            println!("export PIXSNS_USER_ID={}", resp.user_id);
        }
        Command::Whoami => {
            let api = HttpApi::new(config, &session()?);
            let me = api.whoami().await.context("fetching profile")?;
            println!("{}", serde_json::to_string_pretty(&me)?);
        }
        Command::List { post, all } => {
            let mut thread = open_thread(config, post).await?;
            if all {
                render::expand_all(thread.view_mut());
            }
            print!("{}", render::render(&thread.view().render()));
        }
        Command::Post { post, text, image } => {
            let mut thread = open_thread(config, post).await?;
            let c = compose(&mut thread, &text, image).await?;
            println!("posted comment {}", c.id);
        }
        Command::Reply {
            post,
            parent,
            text,
            image,
        } => {
            let mut thread = open_thread(config, post).await?;
            thread.view_mut().start_reply(parent)?;
            let c = compose(&mut thread, &text, image).await?;
            println!("posted reply {}", c.id);
        }
        Command::Edit {
            post,
            id,
            text,
            image,
            remove_image,
        } => {
            let mut thread = open_thread(config, post).await?;
            thread.view_mut().start_edit(id)?;
            if remove_image {
                thread.view_mut().remove_image()?;
            }
            let c = compose(&mut thread, &text, image).await?;
            println!("edited comment {}", c.id);
        }
        Command::Delete { post, id, yes } => {
            let mut thread = open_thread(config, post).await?;
            thread.view_mut().request_delete(id)?;
            let confirmed = yes || confirm(&format!("Delete comment {id} and its replies?"))?;
            match thread.delete(confirmed).await {
                Ok(Some(id)) => println!("deleted comment {id}"),
                Ok(None) => println!("nothing deleted"),
                Err(e) => {
                    let msg = e.server_or_user_message();
                    return Err(anyhow::Error::new(e).context(msg));
                }
            }
        }
        Command::Render { file, user, all } => {
            let data = std::fs::read(&file).with_context(|| format!("reading {file:?}"))?;
            let comments: Vec<Comment> = serde_json::from_slice(&data)
                .with_context(|| format!("parsing {file:?} as a comment listing"))?;
            let session = user.map(|u| Session {
                token: AuthToken(String::new()),
                user_id: UserId(u),
            });
            let mut view = CommentTreeView::new(PostId::stub(), session);
            let ticket = view.begin_fetch();
            if !view.finish_fetch(ticket, Ok(comments)) {
                if let Some(pixsns_client::Notice::Error(msg)) = view.notice() {
                    return Err(anyhow!("{msg}"));
                }
            }
            if all {
                render::expand_all(&mut view);
            }
            print!("{}", render::render(&view.render()));
        }
    }

    Ok(())
}
