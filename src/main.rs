use anyhow::{bail, Context};
use tokio::net::TcpListener;

use foodgram::cli::{self, NewUser};
use foodgram::config::Config;
use foodgram::{build_app, db};

const USAGE: &str = "usage: foodgram [serve]
       foodgram load-ingredients <file.json>
       foodgram create-tag <name> <color> <slug>
       foodgram create-user <email> <username> <first_name> <last_name> <password> [--staff]";

fn init_tracing() {
    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "foodgram=debug,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = Config::from_env()?;
    let args: Vec<String> = std::env::args().skip(1).collect();
    let args: Vec<&str> = args.iter().map(String::as_str).collect();

    let pool = db::init_pool(&config.database_url)
        .await
        .with_context(|| format!("failed to open database {}", config.database_url))?;

    match args.as_slice() {
        [] | ["serve"] => {
            let app = build_app(pool, &config).await?;
            let addr = config.addr()?;
            let listener = TcpListener::bind(addr).await?;

            tracing::info!("listening on {}", addr);
            axum::serve(listener, app).await?;
        }
        ["load-ingredients", file] => {
            let inserted = cli::load_ingredients(&pool, file).await?;
            println!("Loaded {inserted} ingredients");
        }
        ["create-tag", name, color, slug] => {
            let id = cli::create_tag(&pool, name, color, slug).await?;
            println!("Created tag {name} (id {id})");
        }
        ["create-user", email, username, first_name, last_name, password, rest @ ..] => {
            let is_staff = match rest {
                [] => false,
                ["--staff"] => true,
                _ => bail!("{USAGE}"),
            };
            let id = cli::create_user(
                &pool,
                NewUser {
                    email: *email,
                    username: *username,
                    first_name: *first_name,
                    last_name: *last_name,
                    password: *password,
                    is_staff,
                },
            )
            .await?;
            println!("Created user {username} (id {id})");
        }
        _ => bail!("{USAGE}"),
    }

    Ok(())
}
