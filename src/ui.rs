// UI layer: provides a simple interactive menu using `dialoguer`.
// The functions are small and synchronous to make the flow easy to follow.

use crate::api::{ImageAsset, RenderedImage, SwapClient};
use crate::config::AppConfig;
use crate::metadata::FieldMapping;
use crate::pinata::PinataClient;
use crate::publish::{PublicationResult, Publisher};
use anyhow::{Context, Result};
use crossterm::style::Stylize;
use dialoguer::{Input, Select};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main interactive menu. Runs a select loop until the user chooses
/// "Exit". Failures inside a flow are reported and the loop continues.
pub fn main_menu(cfg: AppConfig) -> Result<()> {
    let swap = SwapClient::from_config(&cfg)?;
    let pinata = PinataClient::from_config(&cfg).context("Failed to build Pinata client")?;
    let publisher = Publisher::new(pinata.clone(), cfg.temp_dir.clone());

    loop {
        let items = vec![
            "Try a hairstyle (face + shape + color)",
            "Publish artwork to IPFS",
            "Test Pinata credentials",
            "List pinned files",
            "Exit",
        ];
        let selection = Select::new().items(&items).default(0).interact()?;
        match selection {
            0 => handle_swap(&swap, &cfg.output_dir)?,
            1 => handle_publish(&publisher)?,
            2 => handle_test_auth(&pinata)?,
            3 => handle_list_pins(&pinata)?,
            4 => break,
            _ => {}
        }
    }
    Ok(())
}

/// Collect the three images, call the hairstyle service and save the
/// composited result.
fn handle_swap(swap: &SwapClient, output_dir: &Path) -> Result<()> {
    let face = pick_image("Face photo", &["png", "jpg", "jpeg"])?;
    let shape = pick_image("Hair shape template", &["png"])?;
    let color = pick_image("Hair color template", &["png"])?;

    let assets = [&face, &shape, &color]
        .iter()
        .map(|p| ImageAsset::from_path(p))
        .collect::<Result<Vec<_>>>();
    let assets = match assets {
        Ok(a) => a,
        Err(e) => {
            println!("{}", format!("Could not read image: {:#}", e).red());
            return Ok(());
        }
    };

    let spinner = spinner("Processing...")?;
    let outcome = swap.swap(&assets[0], &assets[1], &assets[2]);
    spinner.finish_and_clear();

    match outcome {
        Ok(image) => match save_result(&image, output_dir) {
            Ok(path) => println!(
                "{} {} ({} bytes)",
                "Result saved to".green(),
                path.display(),
                image.bytes.len()
            ),
            Err(e) => println!("{}", format!("Could not save result: {:#}", e).red()),
        },
        Err(e) => {
            tracing::debug!("Swap failed: {:#}", e);
            println!("{}", "Processing error from server!".red());
        }
    }
    Ok(())
}

/// Ask for an artwork file and its descriptive fields, then publish.
fn handle_publish<G: crate::pinata::PinningGateway>(publisher: &Publisher<G>) -> Result<()> {
    let path = pick_image("Artwork image", &["png", "jpg", "jpeg", "gif", "webp"])?;

    let title = optional_input("Title")?;
    let description = optional_input("Description")?;
    let creator = optional_input("Creator")?;
    let today = chrono::Local::now().format("%Y-%m-%d").to_string();
    let date_created: String = Input::new()
        .with_prompt("Date created")
        .default(today)
        .interact_text()?;
    let materials = optional_input("Materials")?;

    let fields = FieldMapping {
        title,
        description,
        creator,
        date_created: Some(date_created).filter(|d| !d.is_empty()),
        materials,
    };

    let spinner = spinner("Uploading to IPFS...")?;
    let result = publisher.publish(&path, &fields);
    spinner.finish_and_clear();

    match &result {
        PublicationResult::Published(p) => {
            println!("{}", "Artwork published".green());
            println!("  image CID:    {}", p.image_cid);
            println!("  metadata CID: {}", p.metadata_cid);
            println!("  token URI:    {}", p.metadata_url);
            println!("  gateway:      {}", p.gateway_url);
        }
        PublicationResult::Failed { error, .. } => {
            println!("{} {}", "Publication failed:".red(), error);
        }
    }
    Ok(())
}

fn handle_test_auth(pinata: &PinataClient) -> Result<()> {
    let spinner = spinner("Contacting Pinata...")?;
    let outcome = pinata.test_authentication();
    spinner.finish_and_clear();
    match outcome {
        Ok(msg) => println!("{} {}", "Pinata credentials OK:".green(), msg),
        Err(e) => println!("{} {}", "Pinata check failed:".red(), e),
    }
    Ok(())
}

fn handle_list_pins(pinata: &PinataClient) -> Result<()> {
    let spinner = spinner("Fetching pin list...")?;
    let outcome = pinata.list_pins();
    spinner.finish_and_clear();
    match outcome {
        Ok(pins) if pins.is_empty() => println!("Nothing pinned yet."),
        Ok(pins) => {
            println!("{} pinned file(s):", pins.len());
            for pin in &pins {
                println!(
                    "  {}  {:>9} B  {}  {}",
                    pin.ipfs_pin_hash,
                    pin.size,
                    pin.date_pinned.as_deref().unwrap_or("-"),
                    pin.metadata.name.as_deref().unwrap_or("(unnamed)")
                );
            }
        }
        Err(e) => println!("{} {}", "Could not list pins:".red(), e),
    }
    Ok(())
}

/// Let the user type a path or browse with the native file dialog.
/// Falls back to typing when the dialog is cancelled or unavailable.
fn pick_image(prompt: &str, extensions: &[&str]) -> Result<PathBuf> {
    let how = Select::new()
        .with_prompt(prompt)
        .items(&["Type a path", "Browse..."])
        .default(0)
        .interact()?;
    if how == 1 {
        if let Some(path) = rfd::FileDialog::new()
            .set_title(prompt)
            .add_filter("Images", extensions)
            .pick_file()
        {
            println!("{}: {}", prompt, path.display());
            return Ok(path);
        }
        println!("No file chosen, please type the path instead.");
    }
    let path: String = Input::new()
        .with_prompt(format!("{} path", prompt))
        .interact_text()?;
    Ok(PathBuf::from(path.trim()))
}

fn optional_input(prompt: &str) -> Result<Option<String>> {
    let value: String = Input::new()
        .with_prompt(format!("{} (optional)", prompt))
        .allow_empty(true)
        .interact_text()?;
    let value = value.trim().to_string();
    Ok(if value.is_empty() { None } else { Some(value) })
}

fn spinner(message: &'static str) -> Result<ProgressBar> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner} {msg}")?);
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(100));
    Ok(spinner)
}

/// Write the rendered image into `output_dir` under a timestamped name.
pub fn save_result(image: &RenderedImage, output_dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Creating output directory {}", output_dir.display()))?;
    let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let path = output_dir.join(format!("hairstyle_{}.{}", stamp, image.format.extension()));
    std::fs::write(&path, &image.bytes)
        .with_context(|| format!("Writing {}", path.display()))?;
    Ok(path)
}
