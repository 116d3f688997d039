use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use dotenvy::dotenv;
use std::process::ExitCode;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use movie_explorer::app::{
    Alert, AppState, DetailsView, DETAILS_FALLBACK, EMPTY_RESULTS, LOGIN_FALLBACK,
    NO_FAVORITES, REGISTER_FALLBACK, SEARCH_FALLBACK,
};
use movie_explorer::backend::Registration;
use movie_explorer::config::Config;
use movie_explorer::error::ClientError;
use movie_explorer::models::{Movie, SearchCriteria, SearchType};
use movie_explorer::search::SearchOutcome;
use movie_explorer::session::FavoriteToggle;

const CHART_WIDTH: usize = 40;

#[derive(Parser)]
#[command(name = "movie-explorer")]
#[command(about = "Search movies, read details and keep a list of favorites")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in with email and password
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Create an account and log in
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        phone: String,
        #[arg(long)]
        password: String,
    },
    /// Forget the stored credentials
    Logout,
    /// Show the current session
    Whoami,
    /// Search the backend catalog
    Search {
        query: String,
        #[arg(long = "type", value_enum, default_value_t = TypeArg::Movie)]
        kind: TypeArg,
        #[arg(long)]
        start_year: Option<String>,
        #[arg(long)]
        end_year: Option<String>,
        /// Print each result as a serialized movie for `details --movie`
        #[arg(long)]
        json: bool,
    },
    /// Show details and the ratings chart for one movie
    Details {
        /// IMDb identifier, e.g. tt0113277
        #[arg(required_unless_present = "movie")]
        id: Option<String>,
        /// Serialized movie as produced by `search --json`
        #[arg(long, conflicts_with = "id")]
        movie: Option<String>,
        /// Ask the third-party catalog instead of the backend
        #[arg(long, conflicts_with = "movie")]
        omdb: bool,
    },
    /// Search the third-party catalog directly
    Omdb {
        query: String,
        #[arg(long = "type", value_enum, default_value_t = TypeArg::Any)]
        kind: TypeArg,
    },
    /// Manage favorites
    #[command(subcommand)]
    Favorites(FavoriteCommands),
}

#[derive(Subcommand)]
enum FavoriteCommands {
    /// List favorites
    List,
    /// Append a movie to the favorites
    Add(MovieArgs),
    /// Remove every favorite with this identifier
    Remove { id: String },
    /// Add the movie if absent, remove it otherwise
    Toggle(MovieArgs),
}

#[derive(clap::Args)]
struct MovieArgs {
    id: String,
    #[arg(long)]
    title: Option<String>,
    #[arg(long)]
    year: Option<String>,
    #[arg(long)]
    poster: Option<String>,
}

impl From<MovieArgs> for Movie {
    fn from(args: MovieArgs) -> Self {
        Movie {
            imdb_id: Some(args.id),
            title: args.title,
            year: args.year,
            poster: args.poster,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum TypeArg {
    Movie,
    Series,
    Any,
}

impl From<TypeArg> for Option<SearchType> {
    fn from(arg: TypeArg) -> Self {
        match arg {
            TypeArg::Movie => Some(SearchType::Movie),
            TypeArg::Series => Some(SearchType::Series),
            TypeArg::Any => None,
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing();
    match dotenv() {
        Ok(path) => info!("Loaded environment from {:?}", path),
        Err(e) => warn!("No .env file loaded ({}) - relying on environment", e),
    }
    let config = Config::from_env()?;
    let state = AppState::init(&config)
        .await
        .context("Failed to initialise application state")?;

    match run(&state, cli.command).await {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err((err, fallback)) => {
            let alert = Alert::from_error(&err, fallback);
            eprintln!("{}: {}", alert.title, alert.message);
            Ok(ExitCode::FAILURE)
        }
    }
}

type ScreenError = (ClientError, &'static str);
type ScreenResult = Result<(), ScreenError>;

fn on_screen<T>(result: Result<T, ClientError>, fallback: &'static str) -> Result<T, ScreenError> {
    result.map_err(|e| (e, fallback))
}

async fn run(state: &AppState, command: Commands) -> ScreenResult {
    match command {
        Commands::Login { email, password } => {
            let name = on_screen(state.login(&email, &password).await, LOGIN_FALLBACK)?;
            println!("Welcome back, {name}!");
        }
        Commands::Register {
            name,
            email,
            phone,
            password,
        } => {
            let registration = Registration {
                name,
                email,
                phone,
                password,
            };
            let name = on_screen(state.register(&registration).await, REGISTER_FALLBACK)?;
            println!("Welcome, {name}!");
        }
        Commands::Logout => {
            state.logout().await;
            println!("Logged out.");
        }
        Commands::Whoami => {
            let session = state.session.snapshot().await;
            match session.username() {
                Some(name) if session.is_logged_in() => println!(
                    "Logged in as {name} ({} favorite(s))",
                    session.favorites().len()
                ),
                _ => println!("Not logged in."),
            }
        }
        Commands::Search {
            query,
            kind,
            start_year,
            end_year,
            json,
        } => {
            let criteria = SearchCriteria::new(query, kind.into()).with_years(start_year, end_year);
            let view = on_screen(state.search(criteria).await, SEARCH_FALLBACK)?;
            match view.outcome {
                SearchOutcome::Skipped => println!("Type something to search for."),
                SearchOutcome::Applied { count: 0 } => println!("{EMPTY_RESULTS}"),
                _ if json => {
                    for movie in &view.movies {
                        match movie.to_route_param() {
                            Ok(param) => println!("{param}"),
                            Err(e) => warn!("Skipping unserializable movie: {}", e),
                        }
                    }
                }
                _ => {
                    println!("Featured:");
                    for movie in &view.featured {
                        println!("  * {}", movie.display_title());
                    }
                    println!();
                    print_movies(state, &view.movies).await;
                }
            }
        }
        Commands::Details { id, movie, omdb } => {
            let view = match (movie, id) {
                (Some(param), _) => state.movie_details(&param).await,
                (None, Some(id)) if omdb => state.catalog_details(&id).await,
                (None, Some(id)) => {
                    let movie = Movie {
                        imdb_id: Some(id),
                        ..Movie::default()
                    };
                    match movie.to_route_param() {
                        Ok(param) => state.movie_details(&param).await,
                        Err(e) => Err(ClientError::decode("navigation parameter", e)),
                    }
                }
                (None, None) => Err(ClientError::Provider(
                    "Movie details not found".to_string(),
                )),
            };
            print_details(&on_screen(view, DETAILS_FALLBACK)?);
        }
        Commands::Omdb { query, kind } => {
            let results = on_screen(
                state.catalog_search(&query, kind.into()).await,
                SEARCH_FALLBACK,
            )?;
            if let Some(total) = results.total_results {
                println!("{total} result(s) in catalog");
            }
            print_movies(state, &results.movies).await;
        }
        Commands::Favorites(cmd) => run_favorites(state, cmd).await?,
    }
    Ok(())
}

async fn run_favorites(state: &AppState, command: FavoriteCommands) -> ScreenResult {
    const FALLBACK: &str = "Failed to update favorites.";
    match command {
        FavoriteCommands::List => {
            let favorites = on_screen(state.favorites().await, FALLBACK)?;
            if favorites.is_empty() {
                println!("{NO_FAVORITES}");
            } else {
                print_movies(state, &favorites).await;
            }
        }
        FavoriteCommands::Add(args) => {
            on_screen(state.add_favorite(args.into()).await, FALLBACK)?;
            println!("Added.");
        }
        FavoriteCommands::Remove { id } => {
            on_screen(state.remove_favorite(&id).await, FALLBACK)?;
            println!("Removed {id}.");
        }
        FavoriteCommands::Toggle(args) => {
            match on_screen(state.toggle_favorite(args.into()).await, FALLBACK)? {
                FavoriteToggle::Added => println!("Added to favorites."),
                FavoriteToggle::Removed => println!("Removed from favorites."),
                FavoriteToggle::Ignored => println!("Movie has no id; nothing to do."),
            }
        }
    }
    Ok(())
}

async fn print_movies(state: &AppState, movies: &[Movie]) {
    for (i, movie) in movies.iter().enumerate() {
        let favorite = match movie.imdb_id.as_deref() {
            Some(id) => state.session.is_favorite(id).await,
            None => false,
        };
        let heart = if favorite { "♥" } else { " " };
        println!(
            "{:>3}. {} {} ({}) [{}]",
            i + 1,
            heart,
            movie.display_title(),
            movie.year.as_deref().unwrap_or("?"),
            movie.imdb_id.as_deref().unwrap_or("no id"),
        );
    }
}

fn print_details(view: &DetailsView) {
    let d = &view.detail;
    println!("{}", d.movie.display_title());
    let fields = [
        ("Year", &d.movie.year),
        ("Genre", &d.genre),
        ("Director", &d.director),
        ("Writer", &d.writer),
        ("Actors", &d.actors),
        ("Language", &d.language),
        ("Country", &d.country),
        ("Released", &d.released),
        ("Runtime", &d.runtime),
        ("Rated", &d.rated),
        ("Awards", &d.awards),
        ("Box Office", &d.box_office),
        ("Production", &d.production),
        ("Website", &d.website),
        ("Poster", &d.movie.poster),
    ];
    for (label, value) in fields {
        if let Some(value) = value {
            println!("{label}: {value}");
        }
    }
    if let Some(plot) = &d.plot {
        println!("\n{plot}");
    }
    if !view.chart.is_empty() {
        println!("\nRatings Chart:");
        print!("{}", view.chart.render(CHART_WIDTH));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn details_rejects_omdb_with_a_serialized_movie() {
        let parsed = Cli::try_parse_from([
            "movie-explorer",
            "details",
            "--movie",
            r#"{"imdbID":"tt1"}"#,
            "--omdb",
        ]);
        assert!(parsed.is_err());

        let parsed = Cli::try_parse_from(["movie-explorer", "details", "tt1", "--omdb"]).unwrap();
        assert!(matches!(
            parsed.command,
            Commands::Details { omdb: true, movie: None, .. }
        ));
    }
}
