//! Client state as a plain value.
//!
//! [`update`] and [`render`] are pure; the async flows in `actions` feed them
//! messages.

use serde::{Deserialize, Serialize};
use std::fmt;
use weather_core::{SavedQuery, WeatherSample};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// How the user intends the location text to be read. Only affects hints;
/// the backend treats every kind as free text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputKind {
    #[default]
    City,
    Zip,
    Gps,
    Landmark,
}

impl InputKind {
    pub const fn all() -> &'static [InputKind] {
        &[InputKind::City, InputKind::Zip, InputKind::Gps, InputKind::Landmark]
    }

    pub fn label(&self) -> &'static str {
        match self {
            InputKind::City => "City/Town",
            InputKind::Zip => "Zip Code/Postal Code",
            InputKind::Gps => "GPS Coordinates (lat, lon)",
            InputKind::Landmark => "Landmark",
        }
    }
}

impl fmt::Display for InputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

pub fn placeholder(kind: InputKind) -> &'static str {
    match kind {
        InputKind::City => "Enter city name (e.g., New York, London)",
        InputKind::Zip => "Enter zip/postal code (e.g., 10001, SW1A 1AA)",
        InputKind::Gps => "Enter coordinates (e.g., 40.7128,-74.0060)",
        InputKind::Landmark => "Enter landmark (e.g., Statue of Liberty)",
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewModel {
    pub input_kind: InputKind,
    pub location: String,
    pub start_date: String,
    pub end_date: String,
    /// Samples currently on screen, from the backend or a no-save lookup.
    pub samples: Vec<WeatherSample>,
    /// Single error banner.
    pub error: Option<String>,
    pub loading: bool,
    pub saved_queries: Vec<SavedQuery>,
    pub selected_id: Option<String>,
    /// Success line shown once after an action.
    pub notice: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    SetInputKind(InputKind),
    SetLocation(String),
    SetStartDate(String),
    SetEndDate(String),
    SelectQuery(Option<String>),
    RequestStarted,
    QueriesLoaded(Vec<SavedQuery>),
    Created(SavedQuery),
    Updated(SavedQuery),
    Deleted(String),
    Exported(String),
    SamplesLoaded(Vec<WeatherSample>),
    Failed(String),
    /// Always dispatched last, whatever the outcome.
    RequestFinished,
}

pub fn update(mut vm: ViewModel, msg: Msg) -> ViewModel {
    match msg {
        Msg::SetInputKind(kind) => {
            vm.input_kind = kind;
            vm.location.clear();
            vm.samples.clear();
            vm.error = None;
            vm.selected_id = None;
        }
        Msg::SetLocation(location) => vm.location = location,
        Msg::SetStartDate(date) => vm.start_date = date,
        Msg::SetEndDate(date) => vm.end_date = date,
        Msg::SelectQuery(Some(id)) => {
            if let Some(query) = vm.saved_queries.iter().find(|q| q.id == id).cloned() {
                vm.location = query.raw_location;
                vm.start_date = query.date_range.start().format(DATE_FORMAT).to_string();
                vm.end_date = query.date_range.end().format(DATE_FORMAT).to_string();
                vm.samples = query.samples;
                vm.error = None;
            }
            vm.selected_id = Some(id);
        }
        Msg::SelectQuery(None) => {
            vm.selected_id = None;
            clear_form(&mut vm);
        }
        Msg::RequestStarted => {
            vm.loading = true;
            vm.error = None;
            vm.notice = None;
        }
        Msg::QueriesLoaded(queries) => vm.saved_queries = queries,
        Msg::Created(saved) => {
            vm.samples = saved.samples.clone();
            vm.saved_queries.retain(|q| q.id != saved.id);
            vm.saved_queries.insert(0, saved);
        }
        Msg::Updated(updated) => {
            vm.samples = updated.samples.clone();
            if let Some(slot) = vm.saved_queries.iter_mut().find(|q| q.id == updated.id) {
                *slot = updated;
            }
            vm.notice = Some("Query updated successfully!".to_string());
        }
        Msg::Deleted(id) => {
            vm.saved_queries.retain(|q| q.id != id);
            vm.selected_id = None;
            clear_form(&mut vm);
            vm.notice = Some("Query deleted successfully!".to_string());
        }
        Msg::Exported(path) => vm.notice = Some(format!("Exported CSV to {path}")),
        Msg::SamplesLoaded(samples) => vm.samples = samples,
        Msg::Failed(message) => vm.error = Some(message),
        Msg::RequestFinished => vm.loading = false,
    }
    vm
}

fn clear_form(vm: &mut ViewModel) {
    vm.location.clear();
    vm.start_date.clear();
    vm.end_date.clear();
    vm.samples.clear();
}

pub fn validate_location(vm: &ViewModel) -> Result<(), String> {
    if vm.location.trim().is_empty() {
        return Err("Please enter a location.".to_string());
    }
    Ok(())
}

pub fn validate_date_range(vm: &ViewModel) -> Result<(), String> {
    let (Some(start), Some(end)) = (
        weather_core::model::parse_date(&vm.start_date),
        weather_core::model::parse_date(&vm.end_date),
    ) else {
        return Err("Please select a valid date range.".to_string());
    };
    if start > end {
        return Err("Start date must be before end date.".to_string());
    }
    Ok(())
}

/// `location (start to end)` line used in query pickers.
pub fn query_label(query: &SavedQuery) -> String {
    format!(
        "{} ({} to {})",
        query.raw_location,
        query.date_range.start().format(DATE_FORMAT),
        query.date_range.end().format(DATE_FORMAT),
    )
}

pub fn render(vm: &ViewModel) -> String {
    let mut out = String::new();

    if let Some(error) = &vm.error {
        out.push_str(&format!("[error] {error}\n"));
    }
    if vm.loading {
        out.push_str("Loading weather data...\n");
    }
    if let Some(notice) = &vm.notice {
        out.push_str(&format!("{notice}\n"));
    }
    if !vm.samples.is_empty() {
        out.push_str("Weather Data\n");
        for sample in &vm.samples {
            out.push_str(&format!(
                "  {}  {}°F  {}\n",
                sample.date.format(DATE_FORMAT),
                sample.temperature,
                sample.description
            ));
        }
    }

    out
}

pub fn render_saved_queries(vm: &ViewModel) -> String {
    if vm.saved_queries.is_empty() {
        return "No saved queries.\n".to_string();
    }

    let mut out = String::new();
    for query in &vm.saved_queries {
        let marker = if vm.selected_id.as_deref() == Some(query.id.as_str()) { '*' } else { ' ' };
        out.push_str(&format!("{marker} {}  {}\n", query.id, query_label(query)));
    }
    out
}
