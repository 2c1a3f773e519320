//! Structured output: JSON constrained by a schema, and a single choice from
//! an enum.

use gemini::v1beta::{request::GenerationConfig, schema::Schema};
use serde::Deserialize;

#[path = "common/setup.rs"]
mod setup;

#[derive(Debug, Deserialize)]
struct Recipe {
    recipe_name: String,
    #[serde(default)]
    ingredients: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config = setup::init();
    let client = config.client();

    let recipe = Schema::object([
        ("recipe_name", Schema::string()),
        ("ingredients", Schema::array(Schema::string())),
    ])
    .with_required(["recipe_name"]);
    let request = config
        .request("List a few popular cookie recipes.")
        .with_generation_config(
            GenerationConfig::new()
                .with_response_mime_type("application/json")
                .with_response_schema(Schema::array(recipe)),
        )
        .build()?;
    let recipes: Vec<Recipe> = client.generate_content(request).await?.json()?;
    for recipe in recipes {
        println!("{}: {}", recipe.recipe_name, recipe.ingredients.join(", "));
    }

    let request = config
        .request("What kind of instrument is an organ?")
        .with_generation_config(
            GenerationConfig::new()
                .with_response_mime_type("text/x.enum")
                .with_response_schema(Schema::enumeration([
                    "Percussion",
                    "String",
                    "Woodwind",
                    "Brass",
                    "Keyboard",
                ])),
        )
        .build()?;
    println!("{}", client.generate_content(request).await?.text()?);

    Ok(())
}
