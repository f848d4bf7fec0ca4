use crate::{
    helper,
    prelude::{
        AppError, Contact, PhonebookService, StorageConfig, StorageMediums,
        command::{Cli, Commands, ContactArgs},
    },
};
use clap::Parser;
use dotenv::dotenv;
use tracing::debug;

pub fn run_app() -> Result<(), AppError> {
    dotenv().ok();
    let cli = Cli::parse();

    let config = StorageConfig {
        medium: StorageMediums::from(&cli.storage_choice)?,
        data_dir: cli.data_dir,
        remote_url: cli.remote_url,
        api_key: cli.api_key,
        database_url: cli.database_url,
    };
    debug!(
        medium = config.medium.is_which(),
        data_dir = %config.data_dir.display(),
        "storage configured"
    );

    let service = PhonebookService::new(config.build()?);

    match cli.command {
        Commands::Add { location, contact } => {
            let location = location.unwrap_or_else(helper::generate_location);

            service.add_contact(&location, &into_contact(contact))?;

            println!("Contact added successfully at {}", location);
            Ok(())
        }

        Commands::Get { location, json } => {
            let contact = service.get_contact(&location)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&contact)?);
            } else {
                println!("{}", helper::display_contact(&contact));
            }
            Ok(())
        }

        Commands::Update { location, contact } => {
            service.update_contact(&location, &into_contact(contact))?;

            println!("Contact updated successfully");
            Ok(())
        }

        Commands::Delete { location } => {
            service.delete_contact(&location)?;

            println!("Contact deleted successfully");
            Ok(())
        }

        Commands::Demo { location } => {
            run_demo(&service, &location);
            Ok(())
        }
    }
}

fn into_contact(args: ContactArgs) -> Contact {
    Contact::new(
        args.name,
        args.phone,
        args.email.unwrap_or_default(),
        args.address.unwrap_or_default(),
    )
}

/// Each step reports its own outcome and the walkthrough carries on, so
/// every operation of the chosen backend gets exercised.
fn run_demo(service: &PhonebookService, location: &str) {
    println!("Using {} storage", service.medium());

    let contact = Contact::new(
        "John Doeson".to_string(),
        "123-456-7890".to_string(),
        "johndoe@example.com".to_string(),
        "Bukoto".to_string(),
    );

    match service.add_contact(location, &contact) {
        Ok(()) => println!("Contact added successfully"),
        Err(e) => eprintln!("Error adding contact: {}", e),
    }

    match service.get_contact(location) {
        Ok(contact) => println!("Retrieved contact:\n{}", helper::display_contact(&contact)),
        Err(e) => eprintln!("Error retrieving contact: {}", e),
    }

    let updated = Contact {
        name: "John Doe".to_string(),
        ..contact
    };
    match service.update_contact(location, &updated) {
        Ok(()) => println!("Contact updated successfully"),
        Err(e) => eprintln!("Error updating contact: {}", e),
    }

    match service.delete_contact(location) {
        Ok(()) => println!("Contact deleted successfully"),
        Err(e) => eprintln!("Error deleting contact: {}", e),
    }
}
