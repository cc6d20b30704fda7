use std::{fmt, path::PathBuf};

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use inquire::{Confirm, Password, Select, Text};
use weather_core::DirectWeatherClient;

use crate::{
    actions::{self, dispatch},
    api::ApiClient,
    config::ClientConfig,
    view::{InputKind, Msg, ViewModel, placeholder, query_label, render, render_saved_queries},
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather", version, about = "Weather query client")]
pub struct Cli {
    /// Override the configured server API URL, e.g. http://localhost:5000/api.
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Set the server URL and the key used for no-save lookups.
    Configure,

    /// Look up weather for a location and date range and save it.
    Save {
        /// City, postal code, "lat,lon" or landmark.
        location: String,

        /// First day, YYYY-MM-DD.
        #[arg(long)]
        start: String,

        /// Last day, YYYY-MM-DD.
        #[arg(long)]
        end: String,
    },

    /// List saved queries, newest first.
    List,

    /// Show one saved query and its daily samples.
    Show { id: String },

    /// Re-run a saved query with new input. Omitted fields keep their saved value.
    Update {
        id: String,

        #[arg(long)]
        location: Option<String>,

        #[arg(long)]
        start: Option<String>,

        #[arg(long)]
        end: Option<String>,
    },

    /// Delete a saved query.
    Delete {
        id: String,

        /// Skip the confirmation prompt.
        #[arg(long, short)]
        yes: bool,
    },

    /// Export one saved query as CSV.
    Export {
        id: String,

        /// Destination file; defaults to weather_query_<id>.csv in the current directory.
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Current weather, straight from OpenWeather (not saved).
    Current { location: String },

    /// 5-day forecast, straight from OpenWeather (not saved).
    Forecast { location: String },

    /// Menu-driven session over the same actions.
    Interactive,
}

/// Clients shared by every command in one run.
struct Session {
    api: ApiClient,
    direct: Option<DirectWeatherClient>,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let config = ClientConfig::load()?;
        let api_url = self.api_url.unwrap_or_else(|| config.api_base_url.clone());
        let session = Session {
            api: ApiClient::new(&api_url),
            direct: config.direct_client(),
        };

        let mut vm = ViewModel::default();
        match self.command {
            Command::Configure => return configure(config),
            Command::Save { location, start, end } => {
                fill_form(&mut vm, location, start, end);
                actions::save(&mut vm, &session.api).await;
            }
            Command::List => {
                actions::refresh(&mut vm, &session.api).await;
                finish(&vm)?;
                print!("{}", render_saved_queries(&vm));
                return Ok(());
            }
            Command::Show { id } => {
                select(&mut vm, &session.api, id).await?;
                println!("{}", query_heading(&vm));
            }
            Command::Update { id, location, start, end } => {
                select(&mut vm, &session.api, id).await?;
                let location = location.unwrap_or_else(|| vm.location.clone());
                let start = start.unwrap_or_else(|| vm.start_date.clone());
                let end = end.unwrap_or_else(|| vm.end_date.clone());
                fill_form(&mut vm, location, start, end);
                actions::update_selected(&mut vm, &session.api).await;
            }
            Command::Delete { id, yes } => {
                dispatch(&mut vm, Msg::SelectQuery(Some(id)));
                if !yes && !confirm_delete()? {
                    return Ok(());
                }
                actions::delete_selected(&mut vm, &session.api).await;
            }
            Command::Export { id, output } => {
                dispatch(&mut vm, Msg::SelectQuery(Some(id)));
                let cwd = std::env::current_dir().context("Failed to read current directory")?;
                actions::export_selected(&mut vm, &session.api, &cwd, output).await;
            }
            Command::Current { location } => {
                dispatch(&mut vm, Msg::SetLocation(location));
                actions::current_weather(&mut vm, session.direct.as_ref()).await;
            }
            Command::Forecast { location } => {
                dispatch(&mut vm, Msg::SetLocation(location));
                actions::five_day_forecast(&mut vm, session.direct.as_ref()).await;
            }
            Command::Interactive => return interactive(vm, &session).await,
        }

        finish(&vm)?;
        print!("{}", render(&vm));
        Ok(())
    }
}

fn fill_form(vm: &mut ViewModel, location: String, start: String, end: String) {
    dispatch(vm, Msg::SetLocation(location));
    dispatch(vm, Msg::SetStartDate(start));
    dispatch(vm, Msg::SetEndDate(end));
}

/// Load the list and select `id`, failing if it is not there.
async fn select(vm: &mut ViewModel, api: &ApiClient, id: String) -> Result<()> {
    actions::refresh(vm, api).await;
    finish(vm)?;
    if !vm.saved_queries.iter().any(|q| q.id == id) {
        return Err(anyhow!("Query not found"));
    }
    dispatch(vm, Msg::SelectQuery(Some(id)));
    Ok(())
}

/// Turn the error banner into the process exit status.
fn finish(vm: &ViewModel) -> Result<()> {
    match &vm.error {
        Some(error) => Err(anyhow!(error.clone())),
        None => Ok(()),
    }
}

fn query_heading(vm: &ViewModel) -> String {
    let Some(query) = vm
        .selected_id
        .as_deref()
        .and_then(|id| vm.saved_queries.iter().find(|q| q.id == id))
    else {
        return String::new();
    };

    let place = &query.resolved_location;
    format!(
        "{}\nResolved: {}, {} ({:.4}, {:.4})\nSaved: {}",
        query_label(query),
        place.city_name,
        place.country_code,
        place.latitude,
        place.longitude,
        query.created_at.format("%Y-%m-%d %H:%M:%S UTC"),
    )
}

fn confirm_delete() -> Result<bool> {
    Confirm::new("Are you sure you want to delete this query?")
        .with_default(false)
        .prompt()
        .context("Failed to read confirmation")
}

fn configure(current: ClientConfig) -> Result<()> {
    let api_base_url = Text::new("Weather server API URL:")
        .with_default(&current.api_base_url)
        .prompt()
        .context("Failed to read API URL")?;

    let key = Password::new("OpenWeather API key for no-save lookups (empty to keep current):")
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;

    let config = ClientConfig {
        api_base_url: api_base_url.trim().to_string(),
        api_key: if key.trim().is_empty() {
            current.api_key
        } else {
            Some(key.trim().to_string())
        },
    };
    let path = config.save()?;

    println!("Saved configuration to {}", path.display());
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuItem {
    InputType,
    Location,
    Dates,
    SelectQuery,
    Save,
    Update,
    Delete,
    Export,
    Current,
    Forecast,
    Quit,
}

impl MenuItem {
    fn items(vm: &ViewModel) -> Vec<MenuItem> {
        let mut items = vec![MenuItem::InputType, MenuItem::Location, MenuItem::Dates];
        items.extend([MenuItem::SelectQuery, MenuItem::Save]);
        if vm.selected_id.is_some() {
            items.extend([MenuItem::Update, MenuItem::Delete, MenuItem::Export]);
        }
        items.extend([MenuItem::Current, MenuItem::Forecast, MenuItem::Quit]);
        items
    }
}

impl fmt::Display for MenuItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MenuItem::InputType => "Change input type",
            MenuItem::Location => "Enter location",
            MenuItem::Dates => "Enter date range",
            MenuItem::SelectQuery => "Select saved query",
            MenuItem::Save => "Get & Save Weather",
            MenuItem::Update => "Update Selected Query",
            MenuItem::Delete => "Delete Selected Query",
            MenuItem::Export => "Export CSV",
            MenuItem::Current => "Get Current Weather (No Save)",
            MenuItem::Forecast => "Get 5-Day Forecast (No Save)",
            MenuItem::Quit => "Quit",
        })
    }
}

/// Picker entry for a saved query; `None` clears the selection.
struct QueryChoice {
    id: Option<String>,
    label: String,
}

impl fmt::Display for QueryChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

async fn interactive(mut vm: ViewModel, session: &Session) -> Result<()> {
    actions::refresh(&mut vm, &session.api).await;

    loop {
        println!("\n{}", form_summary(&vm));
        print!("{}", render(&vm));

        let choice = Select::new("Action:", MenuItem::items(&vm)).prompt()?;
        match choice {
            MenuItem::InputType => {
                let kind =
                    Select::new("Select input type:", InputKind::all().to_vec()).prompt()?;
                dispatch(&mut vm, Msg::SetInputKind(kind));
            }
            MenuItem::Location => {
                let location = Text::new("Location:")
                    .with_placeholder(placeholder(vm.input_kind))
                    .with_initial_value(&vm.location)
                    .prompt()?;
                dispatch(&mut vm, Msg::SetLocation(location));
            }
            MenuItem::Dates => {
                let start = Text::new("Start date (YYYY-MM-DD):")
                    .with_initial_value(&vm.start_date)
                    .prompt()?;
                let end = Text::new("End date (YYYY-MM-DD):")
                    .with_initial_value(&vm.end_date)
                    .prompt()?;
                dispatch(&mut vm, Msg::SetStartDate(start));
                dispatch(&mut vm, Msg::SetEndDate(end));
            }
            MenuItem::SelectQuery => {
                let mut choices = vec![QueryChoice {
                    id: None,
                    label: "-- Select Query --".into(),
                }];
                choices.extend(vm.saved_queries.iter().map(|q| QueryChoice {
                    id: Some(q.id.clone()),
                    label: query_label(q),
                }));
                let picked = Select::new("Saved query:", choices).prompt()?;
                dispatch(&mut vm, Msg::SelectQuery(picked.id));
            }
            MenuItem::Save => actions::save(&mut vm, &session.api).await,
            MenuItem::Update => actions::update_selected(&mut vm, &session.api).await,
            MenuItem::Delete => {
                if confirm_delete()? {
                    actions::delete_selected(&mut vm, &session.api).await;
                }
            }
            MenuItem::Export => {
                let cwd = std::env::current_dir().context("Failed to read current directory")?;
                actions::export_selected(&mut vm, &session.api, &cwd, None).await;
            }
            MenuItem::Current => {
                actions::current_weather(&mut vm, session.direct.as_ref()).await
            }
            MenuItem::Forecast => {
                actions::five_day_forecast(&mut vm, session.direct.as_ref()).await
            }
            MenuItem::Quit => return Ok(()),
        }
    }
}

fn form_summary(vm: &ViewModel) -> String {
    let selected = vm
        .selected_id
        .as_deref()
        .and_then(|id| vm.saved_queries.iter().find(|q| q.id == id))
        .map(query_label)
        .unwrap_or_else(|| "none".to_string());

    format!(
        "Input type: {}\nLocation: {}\nDates: {} to {}\nSelected query: {}",
        vm.input_kind,
        if vm.location.is_empty() { "-" } else { vm.location.as_str() },
        if vm.start_date.is_empty() { "-" } else { vm.start_date.as_str() },
        if vm.end_date.is_empty() { "-" } else { vm.end_date.as_str() },
        selected,
    )
}
