use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use gator::cli::{format_duration, Cli, Commands};
use gator::config::{Config, Session};
use gator::domain::User;
use gator::errors::GatorResult;
use gator::feed::{FetchContext, HttpFeedFetcher};
use gator::services::{
    FeedService, FollowService, IngestService, PostService, Scheduler, UserService,
    DEFAULT_BROWSE_LIMIT,
};
use gator::storage::sqlite::{
    SqliteFeedRepository, SqliteFollowRepository, SqlitePostRepository, SqliteStorage,
    SqliteUserRepository,
};

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("gator=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run() -> GatorResult<()> {
    let cli = Cli::parse();
    init_tracing();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize storage
    let storage = SqliteStorage::new(&config.db_path)?;
    let mut session = Session::load(&config.session_path)?;
    let users = UserService::new(SqliteUserRepository::new(storage.clone()));

    match cli.command {
        Commands::Register { name } => cmd_register(&name, &users, &mut session),
        Commands::Login { name } => cmd_login(&name, &users, &mut session),
        Commands::Users => cmd_users(&users, &session),
        Commands::Feeds => cmd_feeds(&storage),
        Commands::Reset => {
            session.require_user(&users)?;
            cmd_reset(&users)
        }
        Commands::Addfeed { name, url } => {
            cmd_addfeed(&session.require_user(&users)?, &name, &url, &storage)
        }
        Commands::Follow { url } => cmd_follow(&session.require_user(&users)?, &url, &storage),
        Commands::Following => cmd_following(&session.require_user(&users)?, &storage),
        Commands::Unfollow { url } => {
            cmd_unfollow(&session.require_user(&users)?, &url, &storage)
        }
        Commands::Agg { interval } => {
            session.require_user(&users)?;
            cmd_agg(interval, &storage, &config)
        }
        Commands::Browse { limit } => cmd_browse(&session.require_user(&users)?, limit, &storage),
    }
}

fn cmd_register(
    name: &str,
    users: &UserService<SqliteUserRepository>,
    session: &mut Session,
) -> GatorResult<()> {
    let user = users.register(name)?;
    session.set_user(&user.name)?;

    println!("User created: {}", user.name);
    println!("  ID: {}", user.id);
    println!("  Created: {}", user.created_at);
    Ok(())
}

fn cmd_login(
    name: &str,
    users: &UserService<SqliteUserRepository>,
    session: &mut Session,
) -> GatorResult<()> {
    let user = users.get(name)?;
    session.set_user(&user.name)?;

    println!("Logged in as {}", user.name);
    Ok(())
}

fn cmd_users(users: &UserService<SqliteUserRepository>, session: &Session) -> GatorResult<()> {
    for user in users.list()? {
        if user.name == session.current_user_name {
            println!("* {} (current)", user.name);
        } else {
            println!("* {}", user.name);
        }
    }
    Ok(())
}

fn cmd_reset(users: &UserService<SqliteUserRepository>) -> GatorResult<()> {
    let removed = users.reset()?;
    println!("Database reset ({} users removed)", removed);
    Ok(())
}

fn cmd_addfeed(user: &User, name: &str, url: &str, storage: &SqliteStorage) -> GatorResult<()> {
    let service = FeedService::new(
        SqliteFeedRepository::new(storage.clone()),
        SqliteFollowRepository::new(storage.clone()),
    );
    let (feed, follow) = service.add(user, name, url)?;

    println!("Feed added successfully!");
    println!("  Name: {}", feed.name);
    println!("  URL: {}", feed.url);
    println!("  Followed by: {}", follow.user_name);
    Ok(())
}

fn cmd_feeds(storage: &SqliteStorage) -> GatorResult<()> {
    let service = FeedService::new(
        SqliteFeedRepository::new(storage.clone()),
        SqliteFollowRepository::new(storage.clone()),
    );
    let feeds = service.list()?;

    if feeds.is_empty() {
        println!("No feeds found.");
        return Ok(());
    }

    for entry in feeds {
        println!("Name: {}", entry.feed.name);
        println!("URL: {}", entry.feed.url);
        println!("User: {}", entry.owner_name);
        println!();
    }
    Ok(())
}

fn follow_service(
    storage: &SqliteStorage,
) -> FollowService<SqliteFeedRepository, SqliteFollowRepository> {
    FollowService::new(
        SqliteFeedRepository::new(storage.clone()),
        SqliteFollowRepository::new(storage.clone()),
    )
}

fn cmd_follow(user: &User, url: &str, storage: &SqliteStorage) -> GatorResult<()> {
    let follow = follow_service(storage).follow(user, url)?;
    println!("{} now follows {}", follow.user_name, follow.feed_name);
    Ok(())
}

fn cmd_following(user: &User, storage: &SqliteStorage) -> GatorResult<()> {
    let follows = follow_service(storage).following(user)?;

    if follows.is_empty() {
        println!("{} is not following any feeds.", user.name);
        return Ok(());
    }

    for follow in follows {
        println!("* {}", follow.feed_name);
    }
    Ok(())
}

fn cmd_unfollow(user: &User, url: &str, storage: &SqliteStorage) -> GatorResult<()> {
    let feed = follow_service(storage).unfollow(user, url)?;
    println!("{} unfollowed {}", user.name, feed.name);
    Ok(())
}

fn cmd_agg(interval: Duration, storage: &SqliteStorage, config: &Config) -> GatorResult<()> {
    let scheduler = Scheduler::new(interval)?;
    let service = IngestService::new(
        SqliteFeedRepository::new(storage.clone()),
        SqlitePostRepository::new(storage.clone()),
        HttpFeedFetcher::new(),
    );
    let ctx = FetchContext::new(config.fetch_timeout);

    println!("Collecting feeds every {}", format_duration(interval));
    scheduler.run_forever(&service, &ctx);
    Ok(())
}

fn cmd_browse(user: &User, limit: Option<usize>, storage: &SqliteStorage) -> GatorResult<()> {
    let service = PostService::new(SqlitePostRepository::new(storage.clone()));
    let posts = service.browse(user, limit.unwrap_or(DEFAULT_BROWSE_LIMIT))?;

    if posts.is_empty() {
        println!("No posts yet. Run `gator agg` to collect some.");
        return Ok(());
    }

    for entry in posts {
        println!("Title: {}", entry.post.title);
        println!("Url: {}", entry.post.url);
        println!("Published: {}", entry.post.published_at.format("%Y-%m-%d %H:%M:%S UTC"));
        println!("Feed: {}", entry.feed_name);
        if !entry.post.description.is_empty() {
            println!("{}", entry.post.description);
        }
        println!();
    }
    Ok(())
}
