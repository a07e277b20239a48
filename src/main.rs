use anyhow::{Context, Result};
use log::{error, info, warn};

use neighbor_finder::cli::{Cli, Command};
use neighbor_finder::index::{IndexedRecord, Neighbor};
use neighbor_finder::logging::init_logging_from_env;
use neighbor_finder::orchestrator::Session;
use neighbor_finder::util::envfile::{load_dotenv_if_present, write_env_template};

use clap::Parser;

fn main() {
    // .env first so RUST_LOG from it applies
    let dotenv = load_dotenv_if_present();
    init_logging_from_env();
    if let Err(e) = dotenv {
        warn!("ignoring .env: {:#}", e);
    }
    // Parse after .env so its variables feed clap's env fallbacks
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    if let Command::EnvTemplate { path } = &cli.command {
        write_env_template(path)?;
        println!("Wrote {}", path.display());
        return Ok(());
    }

    let cfg = cli.to_app_config().context("invalid configuration")?;
    let session = Session::open(&cfg)?;
    if session.roster_missing() {
        println!(
            "Roster file {} was not found. Put the member CSV there or pass --roster.",
            cfg.roster.path.display()
        );
        return Ok(());
    }

    match &cli.command {
        Command::Near { person, radius } => {
            let index = session.index();
            let Some(center) = index.get(person) else {
                println!(
                    "No usable address for {:?} (unknown id, or the address could not be parsed).",
                    person
                );
                return Ok(());
            };
            println!(
                "{} ({}) lives at {} {} [{}], radius {}",
                center.record.display_name(),
                center.record.id,
                center.address.street_raw,
                center.address.house_number,
                center.address.street_canonical,
                radius
            );
            let hits = index.find_near(&center.address, *radius, Some(person.as_str()));
            print_neighbors(&hits);
        }
        Command::Street {
            name,
            number,
            radius,
        } => {
            let street = session.canonical_street(name);
            let center = (*number > 0).then_some(*number);
            let hits = session.index().find_by_street(&street, center, *radius);
            println!("{} [{}]", name, street);
            print_neighbors(&hits);
        }
        Command::Streets => {
            for street in session.index().list_canonical_streets() {
                println!("{}", street);
            }
        }
        Command::Variants { name } => {
            let street = session.canonical_street(name);
            let variants = session.index().list_raw_variants_for(&street);
            if variants.is_empty() {
                println!("No spellings map to {}", street);
            }
            for v in variants {
                println!("{}", v);
            }
        }
        Command::Search { query } => {
            let found = session.index().search_people(query);
            if found.is_empty() {
                println!("No matches for {:?}", query);
            }
            for entry in found {
                print_person(entry);
            }
        }
        Command::Export { out } => {
            let n = session.export_roster(out)?;
            println!("Wrote {} rows to {}", n, out.display());
        }
        Command::Detect { .. } => {
            let pairs = session.detect();
            let out = &cfg.export.suggestions_path;
            session.export_suggestions(&pairs, out)?;
            for p in &pairs {
                println!("{:<40} -> {}", p.variant, p.canonical_suggestion);
            }
            info!("{} suggestions written to {}", pairs.len(), out.display());
            println!(
                "{} suggestions written to {}. Review them and merge into {}.",
                pairs.len(),
                out.display(),
                cfg.overrides.path.display()
            );
        }
        Command::EnvTemplate { .. } => {}
    }
    Ok(())
}

fn print_neighbors(hits: &[Neighbor<'_>]) {
    if hits.is_empty() {
        println!("No neighbors found.");
        return;
    }
    println!("{:>8}  {:<30}  {:<12}  ADDRESS", "DIST", "NAME", "ID");
    for n in hits {
        println!(
            "{:>8}  {:<30}  {:<12}  {} {}",
            n.distance,
            n.record.display_name(),
            n.record.id,
            n.address.street_raw,
            n.address.house_number
        );
    }
}

fn print_person(entry: &IndexedRecord) {
    println!(
        "{:<12}  {:<30}  {} {} [{}]",
        entry.record.id,
        entry.record.display_name(),
        entry.address.street_raw,
        entry.address.house_number,
        entry.address.street_canonical
    );
}
