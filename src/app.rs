//! Interactive text menu for Recipe Explorer
//!
//! The `App` reads commands from any `BufRead` and writes to any `Write`, so
//! the binary drives it with stdin/stdout and tests drive it with buffers.
//! Every remote lookup goes through the cache; the menu only ever sees data
//! or "nothing found".

use crossterm::style::{Color, Stylize};
use futures::future::try_join_all;
use std::collections::BTreeSet;
use std::io::{self, BufRead, Write};
use std::time::Duration;
use tracing::{info, warn};

use crate::cache::{get_cached_or_fetch, CacheStore, StorageError, TtlCache};
use crate::cli::StartupConfig;
use crate::data::{related_from, MealClient, NetworkError, Recipe};
use crate::favorites::FavoritesStore;
use crate::format::{format_recipe, format_recipe_list};
use crate::resilience::{race_redundant, retry, with_timeout, DEFAULT_RETRY_BACKOFF};

/// Most distinct letters accepted by the first-letter explorer
pub const MAX_EXPLORE_LETTERS: usize = 3;

/// Resilience settings applied to each kind of remote call
#[derive(Debug, Clone)]
pub struct FetchPolicy {
    /// Attempts for a single-recipe lookup
    pub lookup_attempts: u32,
    /// Pause between lookup attempts
    pub retry_backoff: Duration,
    /// Hard limit for ingredient filter calls
    pub filter_timeout: Duration,
    /// Identical calls raced for a random recipe
    pub random_copies: usize,
    /// Related recipes shown under a recipe
    pub related_limit: usize,
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self {
            lookup_attempts: 2,
            retry_backoff: DEFAULT_RETRY_BACKOFF,
            filter_timeout: Duration::from_secs(5),
            random_copies: 3,
            related_limit: 3,
        }
    }
}

/// Main menu entries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    SearchByName,
    ViewById,
    ExploreByLetter,
    SearchByIngredient,
    Random,
    Favorites,
    Exit,
}

impl MenuChoice {
    /// Parses a menu selection as typed by the user
    pub fn from_input(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "1" => Some(MenuChoice::SearchByName),
            "2" => Some(MenuChoice::ViewById),
            "3" => Some(MenuChoice::ExploreByLetter),
            "4" => Some(MenuChoice::SearchByIngredient),
            "5" => Some(MenuChoice::Random),
            "6" => Some(MenuChoice::Favorites),
            "0" | "q" | "quit" | "exit" => Some(MenuChoice::Exit),
            _ => None,
        }
    }
}

/// Cache key for a name search
pub fn search_key(query: &str) -> String {
    format!("search_{}", query.trim().to_lowercase())
}

/// Cache key for a single recipe
pub fn recipe_key(id: &str) -> String {
    format!("recipe_{}", id.trim())
}

/// Cache key for a first-letter exploration over already normalized letters
pub fn letters_key(letters: &[char]) -> String {
    format!("letters_{}", letters.iter().collect::<String>())
}

/// Cache key for an ingredient filter
pub fn ingredient_key(ingredient: &str) -> String {
    format!("ingredient_{}", ingredient.trim().to_lowercase())
}

/// Cache key for a category filter
pub fn category_key(category: &str) -> String {
    format!("category_{}", category.trim().to_lowercase())
}

/// Distinct lowercase letters of `input`, at most three, sorted
pub fn explore_letters(input: &str) -> Vec<char> {
    let mut seen = BTreeSet::new();
    let mut letters = Vec::new();
    for c in input.to_lowercase().chars().filter(|c| !c.is_whitespace()) {
        if letters.len() == MAX_EXPLORE_LETTERS {
            break;
        }
        if seen.insert(c) {
            letters.push(c);
        }
    }
    letters.sort_unstable();
    letters
}

/// Interactive application state
pub struct App<R, W> {
    input: R,
    output: W,
    client: MealClient,
    cache: TtlCache,
    favorites: FavoritesStore,
    policy: FetchPolicy,
    /// Bypass fresh cache entries on every lookup
    pub force_refresh: bool,
    /// Emit ANSI styling for headings
    pub styled: bool,
    /// Flag indicating the menu loop should stop
    pub should_quit: bool,
}

impl<R: BufRead, W: Write> App<R, W> {
    /// Creates an App wired from the startup configuration
    pub fn new(config: &StartupConfig, input: R, output: W) -> Self {
        let cache = TtlCache::with_ttl(CacheStore::new(config.cache_path()), config.ttl);
        let mut app = Self::with_parts(
            MealClient::with_base_url(config.base_url.clone()),
            cache,
            FavoritesStore::new(config.favorites_path()),
            input,
            output,
        );
        app.force_refresh = config.force_refresh;
        app
    }

    /// Creates an App from explicit components
    pub fn with_parts(
        client: MealClient,
        cache: TtlCache,
        favorites: FavoritesStore,
        input: R,
        output: W,
    ) -> Self {
        Self {
            input,
            output,
            client,
            cache,
            favorites,
            policy: FetchPolicy::default(),
            force_refresh: false,
            styled: false,
            should_quit: false,
        }
    }

    /// Replaces the resilience settings
    pub fn with_policy(mut self, policy: FetchPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Turns heading styling on or off; only useful when output is a terminal
    pub fn with_styling(mut self, styled: bool) -> Self {
        self.styled = styled;
        self
    }

    /// The output sink, for inspecting what was printed
    pub fn output(&self) -> &W {
        &self.output
    }

    /// Creates the data files and purges expired cache entries
    ///
    /// Failing to create either file is fatal. A cache that cannot be swept
    /// is only logged; reads will treat it as empty.
    pub fn initialize(&mut self) -> Result<usize, StorageError> {
        self.cache.store().ensure_exists()?;
        self.favorites.ensure_exists()?;

        match self.cache.sweep() {
            Ok(removed) => {
                info!(removed, "cleared expired cache entries");
                Ok(removed)
            }
            Err(e) => {
                warn!(error = %e, "could not sweep cache");
                Ok(0)
            }
        }
    }

    /// Runs the menu loop until the user exits or input ends
    pub async fn run(&mut self) -> io::Result<()> {
        let welcome = self.heading("Welcome to Recipe Explorer!", None);
        writeln!(self.output, "{}", welcome)?;

        while !self.should_quit {
            self.render_menu()?;
            let Some(line) = self.prompt("Choose an option: ")? else {
                break;
            };
            match MenuChoice::from_input(&line) {
                Some(choice) => self.dispatch(choice).await?,
                None => writeln!(self.output, "Invalid option, please try again.")?,
            }
        }

        writeln!(self.output, "Goodbye!")?;
        Ok(())
    }

    /// Executes a single menu action
    pub async fn dispatch(&mut self, choice: MenuChoice) -> io::Result<()> {
        match choice {
            MenuChoice::SearchByName => self.search_recipes().await,
            MenuChoice::ViewById => self.view_recipe_details(None).await,
            MenuChoice::ExploreByLetter => self.explore_by_first_letter().await,
            MenuChoice::SearchByIngredient => self.search_by_ingredient().await,
            MenuChoice::Random => self.discover_random().await,
            MenuChoice::Favorites => self.view_favorites(),
            MenuChoice::Exit => {
                self.should_quit = true;
                Ok(())
            }
        }
    }

    fn render_menu(&mut self) -> io::Result<()> {
        let title = self.heading("=== Recipe Explorer ===", Some(Color::Cyan));
        writeln!(self.output)?;
        writeln!(self.output, "{}", title)?;
        writeln!(self.output, "1. Search recipes by name")?;
        writeln!(self.output, "2. View recipe by ID")?;
        writeln!(self.output, "3. Explore recipes by first letter")?;
        writeln!(self.output, "4. Search recipes by ingredient")?;
        writeln!(self.output, "5. Discover a random recipe")?;
        writeln!(self.output, "6. View favorites")?;
        writeln!(self.output, "0. Exit")
    }

    async fn search_recipes(&mut self) -> io::Result<()> {
        let Some(query) = self.prompt_required("Enter search term: ", "Search term cannot be empty")?
        else {
            return Ok(());
        };

        let client = &self.client;
        let term = query.as_str();
        let recipes: Vec<Recipe> = get_cached_or_fetch(
            &self.cache,
            &search_key(term),
            move || client.search_by_name(term),
            self.force_refresh,
        )
        .await
        .unwrap_or_default();

        if recipes.is_empty() {
            return writeln!(self.output, "No recipes found.");
        }
        writeln!(self.output, "{}", format_recipe_list(&recipes))?;

        if !self.confirm("View details for a recipe?")? {
            return Ok(());
        }
        match self.prompt_index("Enter recipe number: ", recipes.len())? {
            Some(index) => {
                let id = recipes[index].id.clone();
                self.view_recipe_details(Some(id)).await
            }
            None => writeln!(self.output, "Invalid recipe number."),
        }
    }

    async fn view_recipe_details(&mut self, recipe_id: Option<String>) -> io::Result<()> {
        let id = match recipe_id {
            Some(id) => id,
            None => match self.prompt_required("Enter recipe ID: ", "Recipe ID cannot be empty")? {
                Some(id) => id,
                None => return Ok(()),
            },
        };

        let client = &self.client;
        let policy = &self.policy;
        let lookup_id = id.as_str();
        let recipe: Option<Recipe> = get_cached_or_fetch(
            &self.cache,
            &recipe_key(&id),
            move || {
                retry(policy.lookup_attempts, policy.retry_backoff, move || {
                    client.lookup_by_id(lookup_id)
                })
            },
            self.force_refresh,
        )
        .await
        .flatten();

        let Some(recipe) = recipe else {
            return writeln!(self.output, "Recipe not found.");
        };
        writeln!(self.output, "{}", format_recipe(&recipe))?;

        self.offer_favorite_toggle(&recipe)?;
        self.show_related(&recipe).await
    }

    fn offer_favorite_toggle(&mut self, recipe: &Recipe) -> io::Result<()> {
        let is_favorite = match self.favorites.contains(&recipe.id) {
            Ok(is_favorite) => is_favorite,
            Err(e) => {
                warn!(error = %e, "could not read favorites");
                return writeln!(self.output, "Could not read favorites: {}", e);
            }
        };

        let question = if is_favorite {
            "Remove from favorites?"
        } else {
            "Add to favorites?"
        };
        if !self.confirm(question)? {
            return Ok(());
        }

        let result = if is_favorite {
            self.favorites.remove(&recipe.id)
        } else {
            self.favorites.add(recipe)
        };
        match result {
            Ok(_) if is_favorite => writeln!(self.output, "Removed from favorites."),
            Ok(_) => writeln!(self.output, "Added to favorites."),
            Err(e) => {
                warn!(error = %e, id = %recipe.id, "could not update favorites");
                writeln!(self.output, "Could not update favorites: {}", e)
            }
        }
    }

    async fn show_related(&mut self, recipe: &Recipe) -> io::Result<()> {
        let Some(category) = recipe.category.as_deref() else {
            return Ok(());
        };

        let client = &self.client;
        let listing: Vec<Recipe> = get_cached_or_fetch(
            &self.cache,
            &category_key(category),
            move || client.filter_by_category(category),
            self.force_refresh,
        )
        .await
        .unwrap_or_default();

        let related = related_from(listing, &recipe.id, self.policy.related_limit);
        if related.is_empty() {
            return Ok(());
        }
        let title = self.heading("Related recipes:", None);
        writeln!(self.output, "\n{}", title)?;
        writeln!(self.output, "{}", format_recipe_list(&related))
    }

    async fn explore_by_first_letter(&mut self) -> io::Result<()> {
        let Some(input) =
            self.prompt_required("Enter up to 3 letters: ", "Please enter at least one letter")?
        else {
            return Ok(());
        };

        let letters = explore_letters(&input);
        let client = &self.client;
        let queries: Vec<String> = letters.iter().map(char::to_string).collect();
        let queries = &queries;
        let recipes: Vec<Recipe> = get_cached_or_fetch(
            &self.cache,
            &letters_key(&letters),
            move || async move {
                let pages =
                    try_join_all(queries.iter().map(|l| client.search_by_first_letter(l))).await?;
                Ok::<_, NetworkError>(pages.into_iter().flatten().collect::<Vec<_>>())
            },
            self.force_refresh,
        )
        .await
        .unwrap_or_default();

        writeln!(self.output, "{}", format_recipe_list(&recipes))
    }

    async fn search_by_ingredient(&mut self) -> io::Result<()> {
        let Some(ingredient) =
            self.prompt_required("Enter an ingredient: ", "Ingredient cannot be empty")?
        else {
            return Ok(());
        };

        let client = &self.client;
        let limit = self.policy.filter_timeout;
        let name = ingredient.as_str();
        let recipes: Option<Vec<Recipe>> = get_cached_or_fetch(
            &self.cache,
            &ingredient_key(name),
            move || with_timeout(limit, client.filter_by_ingredient(name)),
            self.force_refresh,
        )
        .await;

        match recipes {
            Some(recipes) => writeln!(self.output, "{}", format_recipe_list(&recipes)),
            None => writeln!(self.output, "Error fetching meals or request timed out"),
        }
    }

    async fn discover_random(&mut self) -> io::Result<()> {
        writeln!(self.output, "Fetching random recipes...")?;

        let client = &self.client;
        let recipe = match race_redundant(self.policy.random_copies, move || client.random()).await {
            Ok(recipe) => recipe,
            Err(e) => {
                warn!(error = %e, "random recipe lookup failed");
                None
            }
        };

        match recipe {
            Some(recipe) => writeln!(self.output, "{}", format_recipe(&recipe)),
            None => writeln!(self.output, "No random recipe found."),
        }
    }

    fn view_favorites(&mut self) -> io::Result<()> {
        let favorites = match self.favorites.list() {
            Ok(favorites) => favorites,
            Err(e) => {
                warn!(error = %e, "could not read favorites");
                return writeln!(self.output, "Could not read favorites: {}", e);
            }
        };

        if favorites.is_empty() {
            return writeln!(self.output, "You have no favorite recipes yet.");
        }
        let title = self.heading("Your favorites:", None);
        writeln!(self.output, "{}", title)?;
        writeln!(self.output, "{}", format_recipe_list(&favorites))?;

        let Some(line) = self.prompt("Enter recipe number to view (or press Enter to go back): ")?
        else {
            return Ok(());
        };
        if line.is_empty() {
            return Ok(());
        }
        match line.parse::<usize>() {
            Ok(n) if (1..=favorites.len()).contains(&n) => {
                let recipe = &favorites[n - 1];
                writeln!(self.output, "{}", format_recipe(recipe))?;
                self.offer_favorite_toggle(recipe)
            }
            _ => writeln!(self.output, "Invalid recipe number."),
        }
    }

    /// Bold, optionally colored `text` when styling is on, plain otherwise
    fn heading(&self, text: &str, color: Option<Color>) -> String {
        if !self.styled {
            return text.to_string();
        }
        match color {
            Some(color) => text.with(color).bold().to_string(),
            None => text.bold().to_string(),
        }
    }

    /// Prints `text` and reads one trimmed line; `None` at end of input
    fn prompt(&mut self, text: &str) -> io::Result<Option<String>> {
        write!(self.output, "{}", text)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            self.should_quit = true;
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    /// Like `prompt`, but prints `empty_message` and yields `None` for blank input
    fn prompt_required(&mut self, text: &str, empty_message: &str) -> io::Result<Option<String>> {
        match self.prompt(text)? {
            Some(line) if line.is_empty() => {
                writeln!(self.output, "{}", empty_message)?;
                Ok(None)
            }
            other => Ok(other),
        }
    }

    /// Asks a yes/no question; anything but y/yes is a no
    fn confirm(&mut self, question: &str) -> io::Result<bool> {
        let answer = self.prompt(&format!("{} (y/n): ", question))?;
        Ok(matches!(
            answer.map(|a| a.to_lowercase()).as_deref(),
            Some("y") | Some("yes")
        ))
    }

    /// Reads a 1-based list position and returns the 0-based index
    fn prompt_index(&mut self, text: &str, len: usize) -> io::Result<Option<usize>> {
        let index = self
            .prompt(text)?
            .and_then(|line| line.parse::<usize>().ok())
            .filter(|n| (1..=len).contains(n))
            .map(|n| n - 1);
        Ok(index)
    }
}
