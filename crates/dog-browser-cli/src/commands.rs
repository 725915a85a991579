// SPDX-License-Identifier: AGPL-3.0
// Dog Browser CLI - Command parsing and handlers

use crate::state::AppState;
use dog_browser_core::{BrowseEvent, Dog, Notice};

type CommandResult<T> = Result<T, String>;

pub const USAGE: &str = "\
Usage: dog-browser [COMMAND]

Without a command, starts an interactive session.

Commands:
  breeds                          List all breeds
  browse [BREED] [--count N]      Show random dogs, optionally of one breed
  filter BREED                    Toggle the breed filter and browse again
  favorites                       List favorite dogs
  favorite <N|IMAGE_URL> [BREED]  Add a dog to the favorites
  unfavorite <N|IMAGE_URL>        Remove a dog from the favorites
  settings                        Show the current settings
  help                            Show this message
  quit                            Leave the interactive session";

/// A dog picked by position in the last browse result, or by image URL
#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    Index(usize),
    Image(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Breeds,
    Browse {
        breed: Option<String>,
        count: Option<u32>,
    },
    Filter {
        breed: String,
    },
    Favorites,
    Favorite {
        target: Target,
        breed: Option<String>,
    },
    Unfavorite {
        target: Target,
    },
    Settings,
    Help,
    Quit,
}

/// Parse one command line, already split into words
pub fn parse(words: &[&str]) -> CommandResult<Command> {
    let (name, args) = match words.split_first() {
        Some((name, args)) => (*name, args),
        None => return Ok(Command::Help),
    };

    match name {
        "breeds" => no_args(args, Command::Breeds),
        "browse" => parse_browse(args),
        "filter" => match args {
            [breed] => Ok(Command::Filter {
                breed: breed.to_string(),
            }),
            _ => Err("filter expects exactly one breed".to_string()),
        },
        "favorites" => no_args(args, Command::Favorites),
        "favorite" => match args {
            [target] => Ok(Command::Favorite {
                target: parse_target(target),
                breed: None,
            }),
            [target, breed] => Ok(Command::Favorite {
                target: parse_target(target),
                breed: Some(breed.to_string()),
            }),
            _ => Err("favorite expects a number or an image URL".to_string()),
        },
        "unfavorite" => match args {
            [target] => Ok(Command::Unfavorite {
                target: parse_target(target),
            }),
            _ => Err("unfavorite expects a number or an image URL".to_string()),
        },
        "settings" => no_args(args, Command::Settings),
        "help" | "--help" | "-h" => Ok(Command::Help),
        "quit" | "exit" => no_args(args, Command::Quit),
        other => Err(format!("Unknown command: {}", other)),
    }
}

fn no_args(args: &[&str], command: Command) -> CommandResult<Command> {
    if args.is_empty() {
        Ok(command)
    } else {
        Err(format!("Unexpected argument: {}", args[0]))
    }
}

fn parse_browse(args: &[&str]) -> CommandResult<Command> {
    let mut breed = None;
    let mut count = None;
    let mut args = args.iter();

    while let Some(arg) = args.next() {
        match *arg {
            "--count" | "-n" => {
                let value = args
                    .next()
                    .ok_or_else(|| "--count needs a number".to_string())?;
                let value: u32 = value
                    .parse()
                    .map_err(|_| format!("Invalid count: {}", value))?;
                count = Some(value);
            }
            flag if flag.starts_with('-') => return Err(format!("Unknown option: {}", flag)),
            name if breed.is_none() => breed = Some(name.to_string()),
            extra => return Err(format!("Unexpected argument: {}", extra)),
        }
    }

    Ok(Command::Browse { breed, count })
}

fn parse_target(word: &str) -> Target {
    match word.parse::<usize>() {
        Ok(index) => Target::Index(index),
        Err(_) => Target::Image(word.to_string()),
    }
}

/// Run a parsed command against the application state
pub async fn run(state: &mut AppState, command: Command) -> CommandResult<()> {
    match command {
        Command::Breeds => {
            let browse_state = state.browse.load_breeds().await;
            if let Some(notice) = first_notice(browse_state.notices(), |n| {
                matches!(n, Notice::BreedsFailed(_))
            }) {
                return Err(notice.to_string());
            }
            if let Ok(breeds) = &browse_state.breeds {
                for breed in breeds {
                    println!("{}", breed);
                }
            }
        }
        Command::Browse { breed, count } => {
            let count = Some(count.unwrap_or_else(|| state.default_count()));
            browse(state, breed, count).await?;
        }
        Command::Filter { breed } => {
            let selected = state.browse.toggle_breed(&breed).map(str::to_string);
            match &selected {
                Some(breed) => println!("Filter: {}", breed),
                None => println!("Filter cleared"),
            }
            let count = Some(state.default_count());
            browse(state, selected, count).await?;
        }
        Command::Favorites => {
            let dogs = state.favorites.list().map_err(|e| e.to_string())?;
            if dogs.is_empty() {
                println!("No favorites yet");
            }
            print_dogs(&dogs);
        }
        Command::Favorite { target, breed } => {
            let mut dog = resolve(state, &target)?;
            if breed.is_some() {
                dog.breed = breed;
            }
            state
                .browse
                .handle(BrowseEvent::AddFavorite(dog.clone()))
                .await
                .map_err(|e| e.to_string())?;
            println!("Added {}", dog.image);
        }
        Command::Unfavorite { target } => {
            let dog = resolve(state, &target)?;
            state
                .browse
                .handle(BrowseEvent::RemoveFavorite(dog.clone()))
                .await
                .map_err(|e| e.to_string())?;
            println!("Removed {}", dog.image);
        }
        Command::Settings => {
            let settings = state.settings.effective();
            println!("Settings file: {}", state.settings.path().display());
            println!("API:           {}", settings.api_base_url);
            println!("Images:        {}", settings.image_count);
            println!(
                "Cache:         {} ({} bytes, {}s)",
                if settings.cache_enabled { "on" } else { "off" },
                settings.cache_max_bytes,
                settings.cache_max_age_secs
            );
            println!("Timeout:       {}s", settings.request_timeout_secs);
            if let Some(dir) = &settings.cache_dir {
                println!("Cache dir:     {}", dir.display());
            }
        }
        Command::Help => println!("{}", USAGE),
        Command::Quit => {}
    }
    Ok(())
}

async fn browse(state: &mut AppState, breed: Option<String>, count: Option<u32>) -> CommandResult<()> {
    let browse_state = state
        .browse
        .handle(BrowseEvent::Browse { breed, count })
        .await
        .map_err(|e| e.to_string())?;

    // An earlier breeds failure is not this command's failure.
    if let Some(notice) = first_notice(browse_state.notices(), |n| {
        matches!(n, Notice::DogsFailed(_))
    }) {
        return Err(notice.to_string());
    }
    if let Ok(dogs) = &browse_state.dogs {
        print_dogs(dogs);
    }
    Ok(())
}

fn first_notice(notices: Vec<Notice>, wanted: impl Fn(&Notice) -> bool) -> Option<Notice> {
    notices.into_iter().find(|notice| wanted(notice))
}

/// Find the dog a target refers to
fn resolve(state: &AppState, target: &Target) -> CommandResult<Dog> {
    match target {
        Target::Image(image) => Ok(Dog::new(None, image.clone())),
        Target::Index(index) => {
            let dogs = state.browse.state().dogs.as_ref().map_err(Clone::clone)?;
            index
                .checked_sub(1)
                .and_then(|i| dogs.get(i))
                .cloned()
                .ok_or_else(|| format!("No dog #{} in the last browse", index))
        }
    }
}

fn print_dogs(dogs: &[Dog]) {
    for (i, dog) in dogs.iter().enumerate() {
        println!(
            "{:>3}. {} {:<24} {}",
            i + 1,
            if dog.favorite { "*" } else { " " },
            dog.breed.as_deref().unwrap_or("-"),
            dog.image
        );
    }
}
