use crate::cli::commands::RecipeCommand;
use anyhow::{anyhow, Result};
use pipestat_common::recipe::{Recipe, RecipeCatalog};
use pipestat_common::{error_message, Colorize};
use std::process::ExitCode;

pub fn recipe(command: RecipeCommand) -> ExitCode {
    let result = RecipeCatalog::builtin().and_then(|catalog| match command {
        RecipeCommand::List => {
            list(&catalog);
            Ok(())
        }
        RecipeCommand::Show { name, json } => show(&catalog, &name, json),
    });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error_message!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn list(catalog: &RecipeCatalog) {
    for recipe in catalog.iter() {
        match &recipe.description {
            Some(description) => println!("{:<12} {}", recipe.name.bold(), description),
            None => println!("{}", recipe.name.bold()),
        }
    }
}

fn show(catalog: &RecipeCatalog, name: &str, json: bool) -> Result<()> {
    let recipe = catalog.get(name).ok_or_else(|| {
        anyhow!(
            "unknown recipe {:?}; available recipes: {}",
            name,
            catalog.names().collect::<Vec<_>>().join(", ")
        )
    })?;

    if json {
        println!("{}", serde_json::to_string_pretty(&recipe.to_json())?);
    } else {
        print_recipe(recipe);
    }
    Ok(())
}

fn print_recipe(recipe: &Recipe) {
    println!("{}", recipe.name.bold());
    if let Some(description) = &recipe.description {
        println!("{}", description);
    }
    println!();
    println!("{}", "Pipeline:".cyan().bold());
    println!("  {}", recipe.pipeline_string());

    if !recipe.directives.is_empty() {
        println!();
        println!("{}", "Directives:".cyan().bold());
        for directive in &recipe.directives {
            println!("  {}", directive.process);
            for (key, value) in &directive.params {
                println!("    {} = {}", key, value);
            }
        }
    }
}
