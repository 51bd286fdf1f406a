//! Application state and screens for the MovieRank terminal front end.
//!
//! Each command corresponds to one screen of the app. Screens talk to the
//! service layer and report every outcome through the notifier. Session
//! changes (sign-out, expiry) are reported once, from the event channel.

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::{debug, warn};

use movierank_core::auth::SessionEvent;
use movierank_core::models::{GenreBucket, Movie, Review};
use movierank_core::utils::truncate_string;
use movierank_core::{Action, ActionError, Config, Feedback, MovieRank, Notifier, ProfileCache};

use crate::console::{self, ConsoleNotifier};

/// Review text shown in the profile summary is cut to this many characters
const REVIEW_PREVIEW_LENGTH: usize = 120;

const HELP: &str = "\
Commands:
  genres                      List movies by genre
  search <title>              Search movies by title
  movie <id>                  Show a movie with its reviews
  reviews <id>                Show reviews for a movie, latest first
  review <id> <1-10> <text>   Add a review (sign-in required)
  watch <id>                  Add a movie to your watchlist
  unwatch <id>                Remove a movie from your watchlist
  profile                     Show your profile, watchlist and reviews
  login [email-or-username]   Sign in
  register                    Create an account
  logout                      Sign out
  status                      Show session state
  help                        Show this help
  quit                        Exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Genres,
    Search(String),
    Movie(String),
    Reviews(String),
    Review {
        movie_id: String,
        rating: u8,
        text: String,
    },
    Watch(String),
    Unwatch(String),
    Profile,
    Login(Option<String>),
    Register,
    Logout,
    Status,
    Help,
    Quit,
}

impl Command {
    pub fn parse(args: &[String]) -> Result<Self, String> {
        let Some((name, rest)) = args.split_first() else {
            return Err("No command given. Type 'help' for a list of commands.".to_string());
        };

        let one_arg = |usage: &str| -> Result<String, String> {
            match rest {
                [value] => Ok(value.clone()),
                _ => Err(format!("Usage: {}", usage)),
            }
        };

        match name.to_lowercase().as_str() {
            "genres" | "home" => Ok(Command::Genres),
            "search" => Ok(Command::Search(rest.join(" "))),
            "movie" => one_arg("movie <id>").map(Command::Movie),
            "reviews" => one_arg("reviews <id>").map(Command::Reviews),
            "review" => match rest {
                [movie_id, rating, words @ ..] => {
                    let rating = rating
                        .parse::<u8>()
                        .map_err(|_| "Rating must be a number from 1 to 10.".to_string())?;
                    Ok(Command::Review {
                        movie_id: movie_id.clone(),
                        rating,
                        text: words.join(" "),
                    })
                }
                _ => Err("Usage: review <id> <1-10> <text>".to_string()),
            },
            "watch" => one_arg("watch <id>").map(Command::Watch),
            "unwatch" => one_arg("unwatch <id>").map(Command::Unwatch),
            "profile" => Ok(Command::Profile),
            "login" => match rest {
                [] => Ok(Command::Login(None)),
                [who] => Ok(Command::Login(Some(who.clone()))),
                _ => Err("Usage: login [email-or-username]".to_string()),
            },
            "register" => Ok(Command::Register),
            "logout" => Ok(Command::Logout),
            "status" => Ok(Command::Status),
            "help" | "?" => Ok(Command::Help),
            "quit" | "exit" => Ok(Command::Quit),
            other => Err(format!("Unknown command '{}'. Type 'help' for a list of commands.", other)),
        }
    }
}

pub struct App {
    config: Config,
    rank: MovieRank,
    notifier: Arc<dyn Notifier>,
    profile: ProfileCache,
    events: broadcast::Receiver<SessionEvent>,
}

impl App {
    pub fn new(config: Config) -> Result<Self> {
        Self::with_notifier(config, Arc::new(ConsoleNotifier))
    }

    pub fn with_notifier(config: Config, notifier: Arc<dyn Notifier>) -> Result<Self> {
        let store = config.token_store()?;
        let rank = MovieRank::connect(&config.api_url(), store)?;
        let events = rank.session().subscribe();
        debug!(authenticated = rank.is_authenticated(), "Session restored");

        Ok(Self {
            config,
            rank,
            notifier,
            profile: ProfileCache::new(),
            events,
        })
    }

    pub fn api_url(&self) -> String {
        self.rank.api().base_url().to_string()
    }

    /// Interactive loop; returns at end of input or on `quit`
    pub async fn run_shell(&mut self) -> Result<()> {
        println!("MovieRank. Type 'help' for a list of commands.");
        loop {
            let prompt = if self.rank.is_authenticated() {
                "movierank (signed in)> "
            } else {
                "movierank> "
            };
            let Some(line) = console::read_line(prompt)? else {
                break;
            };
            if line.is_empty() {
                continue;
            }
            let args: Vec<String> = line.split_whitespace().map(str::to_string).collect();
            if !self.run_command(&args).await {
                break;
            }
        }
        Ok(())
    }

    /// Run one command. Returns false when the user asked to quit.
    pub async fn run_command(&mut self, args: &[String]) -> bool {
        let keep_going = match Command::parse(args) {
            Ok(command) => self.execute(command).await,
            Err(usage) => {
                println!("{}", usage);
                true
            }
        };
        self.drain_session_events();
        keep_going
    }

    async fn execute(&mut self, command: Command) -> bool {
        match command {
            Command::Genres => self.show_genres().await,
            Command::Search(query) => self.search(&query).await,
            Command::Movie(id) => self.show_movie(&id).await,
            Command::Reviews(id) => self.show_reviews(&id).await,
            Command::Review {
                movie_id,
                rating,
                text,
            } => self.add_review(&movie_id, rating, &text).await,
            Command::Watch(id) => self.add_to_watchlist(&id).await,
            Command::Unwatch(id) => self.remove_from_watchlist(&id).await,
            Command::Profile => self.show_profile().await,
            Command::Login(who) => self.login(who).await,
            Command::Register => self.register().await,
            Command::Logout => self.logout(),
            Command::Status => self.show_status(),
            Command::Help => println!("{}", HELP),
            Command::Quit => return false,
        }
        true
    }

    fn report_failure(&self, action: Action, error: &ActionError) {
        warn!(?action, error = %error, "Action failed");
        // Expiry is announced by the session event
        if !matches!(error, ActionError::SessionExpired) {
            Feedback::failure(action, error).send(&*self.notifier);
        }
    }

    fn report_success(&self, action: Action, server_message: Option<&str>) {
        if let Some(feedback) = Feedback::success(action, server_message) {
            feedback.send(&*self.notifier);
        }
    }

    /// Report session changes made anywhere in the process
    fn drain_session_events(&mut self) {
        loop {
            match self.events.try_recv() {
                Ok(event) => {
                    debug!(?event, "Session event");
                    if let Some(feedback) = Feedback::session_event(event) {
                        feedback.send(&*self.notifier);
                    }
                }
                Err(TryRecvError::Lagged(skipped)) => debug!(skipped, "Session events skipped"),
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
            }
        }
    }

    // ===== Browsing screens =====

    async fn show_genres(&mut self) {
        match self.rank.genres().await {
            Ok(genres) => print_buckets(&genres),
            Err(e) => self.report_failure(Action::LoadMovies, &e),
        }
    }

    async fn search(&mut self, query: &str) {
        match self.rank.search(query).await {
            Ok(outcome) => match outcome.message {
                Some(message) => println!("{}", message),
                None => print_buckets(&outcome.buckets),
            },
            Err(e) => self.report_failure(Action::LoadMovies, &e),
        }
    }

    async fn show_movie(&mut self, movie_id: &str) {
        let details = match self.rank.movie_details(movie_id).await {
            Ok(details) => details,
            Err(e) => {
                self.report_failure(Action::LoadMovie, &e);
                return;
            }
        };

        let movie = &details.movie;
        println!("{}", movie.title);
        println!("  Rating: {}", movie.rating_display());
        if let Some(ref genre) = movie.genre {
            println!("  Genre: {}", genre);
        }
        let released = movie.release_display();
        if !released.is_empty() {
            println!("  Released: {}", released);
        }
        println!("  Poster: {}", movie.poster_url());
        println!();
        println!("About the Movie");
        println!("  {}", movie.description_display());
        println!();
        println!("User Reviews");
        if details.reviews.is_empty() {
            println!("  No reviews yet. Be the first to review!");
        } else {
            for review in &details.reviews {
                print_review(review);
            }
        }
    }

    async fn show_reviews(&mut self, movie_id: &str) {
        match self.rank.reviews(movie_id).await {
            Ok(reviews) if reviews.is_empty() => println!("No reviews yet."),
            Ok(reviews) => {
                // Latest first
                for review in reviews.iter().rev() {
                    print_review(review);
                }
            }
            Err(e) => self.report_failure(Action::LoadReviews, &e),
        }
    }

    // ===== Mutations =====

    async fn add_review(&mut self, movie_id: &str, rating: u8, text: &str) {
        match self.rank.submit_review(movie_id, text, rating).await {
            Ok(_) => self.report_success(Action::AddReview, None),
            Err(e) => self.report_failure(Action::AddReview, &e),
        }
    }

    async fn add_to_watchlist(&mut self, movie_id: &str) {
        match self.rank.add_to_watchlist(movie_id).await {
            Ok(message) => self.report_success(Action::AddToWatchlist, message.as_deref()),
            Err(e) => self.report_failure(Action::AddToWatchlist, &e),
        }
    }

    async fn remove_from_watchlist(&mut self, movie_id: &str) {
        match self.rank.remove_from_watchlist(movie_id).await {
            Ok(()) => self.report_success(Action::RemoveFromWatchlist, None),
            Err(e) => self.report_failure(Action::RemoveFromWatchlist, &e),
        }
    }

    // ===== Profile =====

    async fn show_profile(&mut self) {
        let data = match self.profile.load(&self.rank).await {
            Ok(data) => data,
            Err(e) => {
                self.report_failure(Action::Profile, &e);
                return;
            }
        };

        println!("Welcome, {}!", data.profile.username);
        println!("Email: {}", data.profile.email);
        println!();
        println!("Watchlist");
        if data.watchlist.is_empty() {
            println!("  (empty)");
        }
        for movie in &data.watchlist {
            print_movie(movie);
        }
        println!();
        println!("Your Reviews");
        if data.reviews.is_empty() {
            println!("  (none)");
        }
        for review in &data.reviews {
            println!(
                "  {}  {}",
                review.movie_title_display(),
                review.rating_display()
            );
            println!(
                "    {}",
                truncate_string(review.text_display(), REVIEW_PREVIEW_LENGTH)
            );
        }
    }

    // ===== Auth screens =====

    async fn login(&mut self, who: Option<String>) {
        let identifier = match who {
            Some(who) => who,
            None => match console::prompt("Email or Username", self.config.last_username.as_deref()) {
                Ok(answer) => answer,
                Err(e) => {
                    warn!(error = %e, "Failed to read input");
                    return;
                }
            },
        };
        let password = match console::prompt_password("Password") {
            Ok(password) => password,
            Err(e) => {
                warn!(error = %e, "Failed to read password");
                return;
            }
        };

        match self.rank.login(&identifier, &password).await {
            Ok(()) => {
                self.config.last_username = Some(identifier.trim().to_lowercase());
                if let Err(e) = self.config.save() {
                    warn!(error = %e, "Failed to save config");
                }
                self.report_success(Action::Login, None);
            }
            Err(e) => self.report_failure(Action::Login, &e),
        }
    }

    async fn register(&mut self) {
        let (email, username, password) = match read_registration() {
            Ok(answers) => answers,
            Err(e) => {
                warn!(error = %e, "Failed to read input");
                return;
            }
        };

        match self.rank.register(&email, &username, &password).await {
            Ok(_) => {
                self.report_success(Action::Register, None);
                println!("Sign in with: login {}", username);
            }
            Err(e) => self.report_failure(Action::Register, &e),
        }
    }

    /// Success is announced by the `LoggedOut` event
    fn logout(&mut self) {
        if let Err(e) = self.rank.logout() {
            self.report_failure(Action::Logout, &e);
        }
    }

    fn show_status(&self) {
        let state = if self.rank.is_authenticated() {
            "signed in"
        } else {
            "signed out"
        };
        println!("API: {}", self.api_url());
        println!("Session: {}", state);
    }
}

fn read_registration() -> Result<(String, String, String)> {
    let email = console::prompt("Email", None)?;
    let username = console::prompt("Username", None)?;
    let password = console::prompt_password("Password")?;
    Ok((email, username, password))
}

fn print_movie(movie: &Movie) {
    let released = movie.release_display();
    if released.is_empty() {
        println!("  [{}] {}  * {}", movie.id, movie.title, movie.rating_display());
    } else {
        println!(
            "  [{}] {}  * {}  ({})",
            movie.id,
            movie.title,
            movie.rating_display(),
            released
        );
    }
}

fn print_buckets(buckets: &[GenreBucket]) {
    for bucket in buckets {
        println!("== {} ==", bucket.genre);
        for movie in &bucket.movies {
            print_movie(movie);
        }
    }
}

fn print_review(review: &Review) {
    println!("  {}  {}", review.author_display(), review.rating_display());
    println!("    {}", review.text_display());
}
