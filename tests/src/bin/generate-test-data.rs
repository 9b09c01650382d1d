use anyhow::Context;
use chrono::{Duration, Utc};
use pixsns_client::api::{Comment, CommentId, PostId, UserId};
use rand::{seq::SliceRandom, Rng};
use structopt::StructOpt;

const NUM_USERS: usize = 6;
const COMMENT_WORD_COUNT: usize = 12;

/// Writes a random comment listing, as returned by the server, to stdout
#[derive(Debug, StructOpt)]
struct Opt {
    /// Number of comments to generate
    #[structopt(long, default_value = "60")]
    comments: usize,

    /// Probability that a comment answers an earlier one
    #[structopt(long, default_value = "0.6")]
    reply_ratio: f64,

    /// Deepest nesting generated, top-level comments being at depth 0
    #[structopt(long, default_value = "6")]
    max_depth: usize,
}

fn gen_content(rng: &mut impl Rng, users: &[UserId]) -> String {
    let text = lipsum::lipsum_words(rng.gen_range(3..COMMENT_WORD_COUNT));
    match rng.gen_bool(0.2) {
        true => {
            let who = users.choose(rng).map(|u| u.0.as_str()).unwrap_or("all");
            format!(
                r#"<p><span class="mention" data-id="{who}">@{who}</span> {text}</p>"#
            )
        }
        false => format!("<p>{text}</p>"),
    }
}

fn main() -> anyhow::Result<()> {
    let opt = Opt::from_args();
    let mut rng = rand::thread_rng();
    let users = (0..NUM_USERS)
        .map(|i| UserId(format!("user{i:02}")))
        .collect::<Vec<_>>();
    let post = PostId::stub();
    let start = Utc::now() - Duration::days(7);

    let mut comments: Vec<Comment> = Vec::with_capacity(opt.comments);
    let mut depths = Vec::with_capacity(opt.comments);
    for i in 0..opt.comments {
        // parents are always earlier comments, so the listing is acyclic
        let parent = match i > 0 && rng.gen_bool(opt.reply_ratio) {
            true => {
                let p = rng.gen_range(0..i);
                (depths[p] < opt.max_depth).then_some(p)
            }
            false => None,
        };
        depths.push(parent.map(|p| depths[p] + 1).unwrap_or(0));
        let author = users.choose(&mut rng).context("no users")?.clone();
        let parent_id = parent.map(|p| comments[p].id);
        let idx = author.0.trim_start_matches("user").to_string();
        comments.push(Comment {
            id: CommentId(i as i64 + 1),
            parent: parent_id,
            post: Some(post),
            content: gen_content(&mut rng, &users),
            image_url: rng
                .gen_bool(0.1)
                .then(|| format!("https://img.example/upload/{i}.jpg")),
            user_name: Some(author.0.clone()),
            display_name: Some(lipsum::lipsum_title()),
            profile_image: rng
                .gen_bool(0.8)
                .then(|| format!("https://img.example/avatar/{idx}.png")),
            user_uid: Some(author),
            created_at: start + Duration::minutes(i as i64 * 7),
        });
    }
    // the server lists newest first
    comments.reverse();

    let out = serde_json::to_string_pretty(&comments).context("serializing comments")?;
    println!("{out}");
    Ok(())
}
