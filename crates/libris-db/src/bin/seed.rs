//! # Seed Data Generator
//!
//! Populates the database with a demo catalog and members for development.
//!
//! ## Usage
//! ```bash
//! # Seed the database named by LIBRIS_DATABASE_PATH (default ./libris.db)
//! cargo run -p libris-db --bin seed
//!
//! # Specify database path
//! cargo run -p libris-db --bin seed -- --db ./data/libris.db
//!
//! # More members
//! cargo run -p libris-db --bin seed -- --members 50
//! ```
//!
//! Log verbosity follows `RUST_LOG` (default `info`).

use std::env;
use std::path::PathBuf;

use libris_core::{NewBook, NewMember};
use libris_db::{Database, LibraryConfig};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// (title, author, isbn, category, copies)
const CATALOG: &[(&str, &str, &str, &str, i64)] = &[
    ("Dune", "Frank Herbert", "9780441013593", "Science Fiction", 3),
    ("The Left Hand of Darkness", "Ursula K. Le Guin", "9780441478125", "Science Fiction", 2),
    ("Neuromancer", "William Gibson", "9780441569595", "Science Fiction", 1),
    ("Emma", "Jane Austen", "9780141439587", "Classics", 2),
    ("Persuasion", "Jane Austen", "9780141439686", "Classics", 1),
    ("Middlemarch", "George Eliot", "9780141439549", "Classics", 1),
    ("The Name of the Rose", "Umberto Eco", "9780156001311", "Mystery", 2),
    ("The Big Sleep", "Raymond Chandler", "9780394758282", "Mystery", 1),
    ("Gödel, Escher, Bach", "Douglas Hofstadter", "9780465026562", "Nonfiction", 1),
    ("The Structure of Scientific Revolutions", "Thomas S. Kuhn", "9780226458083", "Nonfiction", 2),
    ("A Wizard of Earthsea", "Ursula K. Le Guin", "9780547773742", "Fantasy", 2),
    ("The Hobbit", "J. R. R. Tolkien", "9780547928227", "Fantasy", 4),
];

const FIRST_NAMES: &[&str] = &[
    "Ada", "Grace", "Alan", "Edsger", "Barbara", "Donald", "Frances", "Niklaus", "Radia", "Ken",
];

const LAST_NAMES: &[&str] = &[
    "Lovelace", "Hopper", "Turing", "Dijkstra", "Liskov", "Knuth", "Allen", "Wirth", "Perlman",
    "Thompson",
];

const DEFAULT_MEMBERS: usize = 10;

/// Falls back to the default count, with a warning, on anything that is not
/// a non-negative integer.
fn parse_member_count(raw: &str) -> usize {
    match raw.parse() {
        Ok(n) => n,
        Err(e) => {
            warn!(value = raw, error = %e, "Invalid --members value, using {}", DEFAULT_MEMBERS);
            DEFAULT_MEMBERS
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    let mut config = LibraryConfig::from_env()?;
    let mut member_count = DEFAULT_MEMBERS;

    let args: Vec<String> = env::args().collect();
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    config.database_path = PathBuf::from(&args[i + 1]);
                    i += 1;
                }
            }
            "--members" | "-m" => {
                if i + 1 < args.len() {
                    member_count = parse_member_count(&args[i + 1]);
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Libris Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>       Database file path (default: $LIBRIS_DATABASE_PATH or ./libris.db)");
                println!("  -m, --members <N>     Number of members to register (default: 10)");
                println!("  -h, --help            Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    info!(path = %config.database_path.display(), "Seeding database");

    let db = Database::new(config.db_config()).await?;
    let engine = db.lending_with_policy(config.policy);

    let existing = db.books().count().await?;
    if existing > 0 {
        warn!(
            books = existing,
            "Database already has a catalog, skipping seed (delete the file to regenerate)"
        );
        return Ok(());
    }

    for (title, author, isbn, category, copies) in CATALOG {
        let new = NewBook {
            title: title.to_string(),
            author: author.to_string(),
            isbn: isbn.to_string(),
            category: category.to_string(),
            total_copies: *copies,
        };

        if let Err(e) = engine.create_book(new).await {
            warn!(isbn, error = %e, "Failed to insert book");
        }
    }

    for n in 0..member_count {
        let first = FIRST_NAMES[n % FIRST_NAMES.len()];
        let last = LAST_NAMES[(n / FIRST_NAMES.len() + n) % LAST_NAMES.len()];
        let new = NewMember {
            name: format!("{first} {last}"),
            email: format!("{}.{}.{n}@example.org", first.to_lowercase(), last.to_lowercase()),
            membership_number: format!("LIB-{:05}", n + 1),
        };

        if let Err(e) = engine.create_member(new).await {
            warn!(n, error = %e, "Failed to register member");
        }
    }

    let books = db.books().count().await?;
    let members = db.members().count().await?;
    let available = engine.list_available_books().await?.len();
    info!(books, members, available, "Seed complete");

    db.close().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_member_count() {
        assert_eq!(parse_member_count("25"), 25);
        assert_eq!(parse_member_count("0"), 0);
        assert_eq!(parse_member_count("abc"), DEFAULT_MEMBERS);
        assert_eq!(parse_member_count("-3"), DEFAULT_MEMBERS);
    }
}
