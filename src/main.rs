use actix_cors::Cors;
use actix_web::{
    http::header,
    middleware::{DefaultHeaders, Logger},
    web, App, HttpServer,
};
use blog_renderer::{
    config::Config,
    helper::{page_helpers, site_helpers},
    models::post_store,
    routes, AppState, EscapePolicy, Formatter,
};
use clap::{Parser, Subcommand};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "blog_renderer", author, version, about = "Renders markdown blog posts to HTML.", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to a .env configuration file. Defaults to ./.env when present.
    #[arg(long, global = true, value_name = "FILE")]
    env_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Formats one markdown file (or stdin) and prints the HTML.
    Format {
        input: Option<PathBuf>,
        /// trusted, escape or sanitize. Overrides BLOG_ESCAPE_POLICY.
        #[arg(long)]
        escape: Option<EscapePolicy>,
    },
    /// Writes the listing and every post page as a static site.
    Build {
        #[arg(long, value_name = "DIR")]
        out: Option<PathBuf>,
    },
    /// Serves the rendered pages and the preview API.
    Serve,
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    let cli = Cli::parse();

    let config = match Config::load(cli.env_file.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("FATAL: Failed to load or parse configuration: {}", e);
            std::process::exit(1);
        }
    };

    env_logger::init_from_env(env_logger::Env::new().default_filter_or(&config.log_level));

    match cli.command {
        Commands::Format { input, escape } => run_format(&config, input.as_deref(), escape),
        Commands::Build { out } => run_build(config, out),
        Commands::Serve => run_server(config).await,
    }
}

fn run_format(config: &Config, input: Option<&Path>, escape: Option<EscapePolicy>) -> io::Result<()> {
    let content = match input {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    let formatter = Formatter::with_policy(escape.unwrap_or(config.escape_policy));
    let mut stdout = io::stdout().lock();
    stdout.write_all(formatter.format(&content).as_bytes())?;
    stdout.write_all(b"\n")
}

fn run_build(mut config: Config, out: Option<PathBuf>) -> io::Result<()> {
    if let Some(out) = out {
        config.output_path = out;
    }

    let posts = post_store::load_posts(&config.posts_path).map_err(io::Error::other)?;
    let report = site_helpers::build_site(&config, &posts).map_err(io::Error::other)?;

    println!(
        "✅ Wrote {} page(s) and {} asset(s) to '{}'",
        report.pages_written,
        report.assets_copied,
        config.output_path.display()
    );
    if !report.skipped.is_empty() {
        println!("⚠️  Skipped invalid post(s): {}", report.skipped.join(", "));
    }
    Ok(())
}

async fn run_server(config: Config) -> io::Result<()> {
    let posts = post_store::load_posts(&config.posts_path).unwrap_or_else(|e| {
        log::error!("Failed to load posts, starting with none: {}", e);
        Vec::new()
    });
    let tera = page_helpers::build_tera().map_err(io::Error::other)?;

    let app_state = web::Data::new(AppState::new(
        posts,
        Formatter::with_policy(config.escape_policy),
        tera,
    ));

    let static_dir = config.static_path.is_dir().then(|| config.static_path.clone());
    if static_dir.is_none() {
        log::warn!("Static directory '{}' not found, /static is disabled", config.static_path.display());
    }

    let server_address = format!("{}:{}", config.web.host, config.web.port);
    println!("🚀 Server starting at http://{}", server_address);

    let config_data = web::Data::new(config);

    HttpServer::new(move || {
        let static_dir = static_dir.clone();

        App::new()
            .wrap(build_cors(&config_data.allowed_origins))
            .wrap(Logger::default())
            .wrap(
                DefaultHeaders::new()
                    .add(("X-Content-Type-Options", "nosniff"))
                    .add(("X-Frame-Options", "DENY"))
                    .add(("X-XSS-Protection", "1; mode=block")),
            )
            .app_data(config_data.clone())
            .app_data(app_state.clone())
            .configure(routes::public::config_api)
            .configure(move |cfg| {
                if let Some(dir) = static_dir {
                    cfg.service(actix_files::Files::new("/static", dir));
                }
            })
    })
    .bind(server_address)?
    .run()
    .await
}

/// `*` allows any origin; otherwise a comma-separated list. Empty allows none.
fn build_cors(allowed_origins: &str) -> Cors {
    let cors = if allowed_origins.trim() == "*" {
        Cors::default().allow_any_origin()
    } else {
        allowed_origins
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
    };

    cors.allowed_methods(vec!["GET", "POST"])
        .allowed_headers(vec![header::ACCEPT, header::CONTENT_TYPE])
        .max_age(3600)
}
