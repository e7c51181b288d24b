//! Terminal Pokédex.
//!
//! A line-oriented consumer of the catalog pipeline: bulk-loads the
//! catalog, then takes search/filter/detail/favorite commands from stdin.
//!
//! ```bash
//! cargo run -p pokedex -- --limit 151
//! ```
//!
//! Environment:
//! - `POKEDEX_API_BASE` — API base URL override
//! - `POKEDEX_FAVORITES` — favorites file path (default `pokedex_favorites.json`)
//! - `POKEDEX_LIMIT` — catalog page size (default 151)

use pokeapi::{sprite_url, Dex};
use pokedex_core::{
    flatten, generation_range, DetailView, FavoritesLedger, Fetched, FileStore, FilterCriteria,
    Session,
};
use std::io::{self, BufRead, Write};

const DEFAULT_LIMIT: usize = 151;
const DEFAULT_FAVORITES_FILE: &str = "pokedex_favorites.json";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let args: Vec<String> = std::env::args().collect();
    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_help();
        return Ok(());
    }

    let limit = parse_limit(&args);
    let favorites_path = std::env::var("POKEDEX_FAVORITES")
        .unwrap_or_else(|_| DEFAULT_FAVORITES_FILE.to_string());

    let source = Dex::from_env();
    let favorites = FavoritesLedger::open(FileStore::new(&favorites_path));
    let mut session = Session::new(favorites);

    println!("Loading catalog ({limit} entries)...");
    match session.load_catalog(&source, limit).await {
        Ok(count) => println!("Loaded {count} entries. Type 'help' for commands."),
        Err(e) => {
            eprintln!("Failed to load catalog: {e}");
            std::process::exit(1);
        }
    }

    let stdin = io::stdin();
    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let mut parts = line.split_whitespace();
        let Some(command) = parts.next() else {
            continue;
        };
        let rest: Vec<&str> = parts.collect();

        match command {
            "help" => print_help(),
            "quit" | "exit" => break,
            "search" => {
                let mut criteria = session.criteria().clone();
                criteria.text = if rest.is_empty() {
                    None
                } else {
                    Some(rest.join(" "))
                };
                session.set_criteria(criteria);
                print_list(&session);
            }
            "type" => {
                let mut criteria = session.criteria().clone();
                criteria.category = rest.first().map(|s| s.to_string());
                session.set_criteria(criteria);
                print_list(&session);
            }
            "gen" => match rest.first().and_then(|s| s.parse().ok()) {
                Some(gen) => match generation_range(gen) {
                    Some((low, high)) => {
                        let mut criteria = session.criteria().clone();
                        criteria.id_range = Some((low, high));
                        session.set_criteria(criteria);
                        print_list(&session);
                    }
                    None => println!("Unknown generation: {gen}"),
                },
                None => println!("Usage: gen <1-9>"),
            },
            "range" => {
                let low = rest.first().and_then(|s| s.parse().ok());
                let high = rest.get(1).and_then(|s| s.parse().ok());
                match (low, high) {
                    (Some(low), Some(high)) => {
                        let mut criteria = session.criteria().clone();
                        criteria.id_range = Some((low, high));
                        session.set_criteria(criteria);
                        print_list(&session);
                    }
                    _ => println!("Usage: range <low> <high>"),
                }
            }
            "clear" => {
                session.set_criteria(FilterCriteria::new());
                print_list(&session);
            }
            "list" => print_list(&session),
            "show" => match rest.first().and_then(|s| s.parse().ok()) {
                Some(id) => match session.select(&source, id).await {
                    Ok(view) => print_detail(view),
                    Err(e) => println!("{e}"),
                },
                None => println!("Usage: show <id>"),
            },
            "fav" => match rest.first().and_then(|s| s.parse().ok()) {
                Some(id) => {
                    let starred = session.toggle_favorite(id);
                    println!(
                        "#{id} is {} a favorite.",
                        if starred { "now" } else { "no longer" }
                    );
                    if let Some(warning) = session.favorites().last_persist_error() {
                        eprintln!("Warning: favorites not persisted: {warning}");
                    }
                }
                None => println!("Usage: fav <id>"),
            },
            "favs" => {
                if session.favorites().is_empty() {
                    println!("No favorites yet.");
                }
                for entity in session.favorite_entities() {
                    println!("  * #{:<4} {}", entity.id, entity.name);
                }
            }
            "random" => {
                let pick = session.random_pick().map(|e| e.id);
                match pick {
                    Some(id) => match session.select(&source, id).await {
                        Ok(view) => print_detail(view),
                        Err(e) => println!("{e}"),
                    },
                    None => println!("Nothing matches the current filter."),
                }
            }
            other => println!("Unknown command '{other}'. Type 'help' for commands."),
        }
    }

    Ok(())
}

fn parse_limit(args: &[String]) -> usize {
    if let Some(pos) = args.iter().position(|a| a == "--limit") {
        if let Some(value) = args.get(pos + 1).and_then(|v| v.parse().ok()) {
            return value;
        }
    }
    std::env::var("POKEDEX_LIMIT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_LIMIT)
}

fn print_list(session: &Session) {
    let matches = session.filtered();
    for entity in &matches {
        let star = if session.is_favorite(entity.id) { "*" } else { " " };
        println!(
            " {star} #{:<4} {:<12} [{}]",
            entity.id,
            entity.name,
            entity.categories.join(", ")
        );
    }
    println!("{} match(es).", matches.len());
}

fn print_detail(view: &DetailView) {
    let entity = &view.entity;
    println!("#{} {}", entity.id, entity.name);
    println!("  types:     {}", entity.categories.join(", "));
    println!("  abilities: {}", entity.traits.join(", "));
    for metric in &entity.metrics {
        println!("  {:<10} {}", format!("{}:", metric.name), metric.value);
    }
    println!(
        "  height: {}  weight: {}",
        entity.height_units, entity.weight_units
    );
    println!("  sprite: {}", sprite_url(entity.id));

    match &view.descriptor {
        Fetched::Ready(descriptor) => {
            println!(
                "  {}",
                view.description.as_deref().unwrap_or("(no description)")
            );
            if let Some(habitat) = &descriptor.habitat {
                println!("  habitat: {habitat}");
            }
            println!("  generation: {}", descriptor.generation);
        }
        Fetched::Failed(e) => println!("  (descriptor unavailable: {e})"),
        Fetched::Skipped => {}
    }

    match &view.evolution {
        Fetched::Ready(root) => {
            let line: Vec<String> = flatten(root).into_iter().map(|s| s.name).collect();
            println!("  evolution: {}", line.join(" -> "));
        }
        Fetched::Failed(e) => println!("  (evolution chain unavailable: {e})"),
        Fetched::Skipped => {}
    }
}

fn print_help() {
    println!("Terminal Pokédex");
    println!();
    println!("Usage: pokedex [--limit N]");
    println!();
    println!("Commands:");
    println!("  search <text>     filter by name or id substring (empty to clear)");
    println!("  type <category>   filter by type tag");
    println!("  gen <1-9>         filter by generation id range");
    println!("  range <lo> <hi>   filter by inclusive id range");
    println!("  clear             drop all filters");
    println!("  list              print the current filtered view");
    println!("  show <id>         fetch and print an entity's detail view");
    println!("  fav <id>          toggle a favorite");
    println!("  favs              list favorites");
    println!("  random            show a random entity from the filtered view");
    println!("  quit              exit");
}
