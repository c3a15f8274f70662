use chrono::NaiveDate;
use clap::Subcommand;
use pawcare_core::{ClinicDb, Pet};

#[derive(Subcommand)]
pub enum PetAction {
    /// Register a pet
    Add {
        /// Pet name
        name: String,
        /// Species (dog, cat, ...)
        #[arg(long)]
        species: String,
        /// Owner display name
        #[arg(long)]
        owner: String,
        /// Breed
        #[arg(long)]
        breed: Option<String>,
        /// Birth date (YYYY-MM-DD)
        #[arg(long)]
        birth_date: Option<String>,
    },
    /// List registered pets
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one pet as JSON
    Show {
        /// Pet id
        id: String,
    },
    /// Remove a pet
    Remove {
        /// Pet id
        id: String,
    },
}

pub fn run(action: PetAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = ClinicDb::open()?;
    match action {
        PetAction::Add {
            name,
            species,
            owner,
            breed,
            birth_date,
        } => {
            let mut pet = Pet::new(&name, &species, &owner);
            pet.breed = breed;
            if let Some(date) = birth_date {
                pet.birth_date = Some(date.parse::<NaiveDate>()?);
            }
            db.insert_pet(&pet)?;
            println!("pet registered: {}", pet.id);
        }
        PetAction::List { json } => {
            let pets = db.list_pets()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&pets)?);
            } else if pets.is_empty() {
                println!("no pets registered");
            } else {
                for pet in pets {
                    println!("{}  {} ({}, owner {})", pet.id, pet.name, pet.species, pet.owner);
                }
            }
        }
        PetAction::Show { id } => match db.get_pet(&id)? {
            Some(pet) => println!("{}", serde_json::to_string_pretty(&pet)?),
            None => {
                eprintln!("no such pet: {id}");
                std::process::exit(1);
            }
        },
        PetAction::Remove { id } => {
            if db.delete_pet(&id)? {
                println!("removed");
            } else {
                eprintln!("no such pet: {id}");
                std::process::exit(1);
            }
        }
    }
    Ok(())
}
