//! Async flows behind each client action.
//!
//! Every flow validates first, then brackets its request with
//! `RequestStarted` / `RequestFinished` so loading is cleared on every path.

use std::path::{Path, PathBuf};

use weather_core::{DirectWeatherClient, export::export_one_filename};

use crate::{
    api::ApiClient,
    view::{Msg, ViewModel, update, validate_date_range, validate_location},
};

pub const MISSING_CLIENT_KEY: &str =
    "API key not configured. Please set OPENWEATHER_API_KEY or run `weather configure`.";

pub fn dispatch(vm: &mut ViewModel, msg: Msg) {
    *vm = update(std::mem::take(vm), msg);
}

fn reject(vm: &mut ViewModel, message: &str) {
    dispatch(vm, Msg::Failed(message.to_string()));
}

fn validate_form(vm: &mut ViewModel) -> bool {
    match validate_location(vm).and_then(|_| validate_date_range(vm)) {
        Ok(()) => true,
        Err(message) => {
            dispatch(vm, Msg::Failed(message));
            false
        }
    }
}

fn form_fields(vm: &ViewModel) -> (String, String, String) {
    (vm.location.trim().to_string(), vm.start_date.clone(), vm.end_date.clone())
}

/// Reload the saved-query list.
pub async fn refresh(vm: &mut ViewModel, api: &ApiClient) {
    match api.list().await {
        Ok(queries) => dispatch(vm, Msg::QueriesLoaded(queries)),
        Err(e) => dispatch(vm, Msg::Failed(format!("Failed to load saved queries: {e}"))),
    }
}

/// "Get & Save Weather".
pub async fn save(vm: &mut ViewModel, api: &ApiClient) {
    if !validate_form(vm) {
        return;
    }

    let (location, start, end) = form_fields(vm);
    dispatch(vm, Msg::RequestStarted);
    match api.create(&location, &start, &end).await {
        Ok(saved) => {
            dispatch(vm, Msg::Created(saved));
            refresh(vm, api).await;
        }
        Err(e) => {
            tracing::debug!("create failed: {e:#}");
            dispatch(vm, Msg::Failed(e.to_string()));
        }
    }
    dispatch(vm, Msg::RequestFinished);
}

pub async fn update_selected(vm: &mut ViewModel, api: &ApiClient) {
    let Some(id) = vm.selected_id.clone() else {
        return reject(vm, "Please select a query to update.");
    };
    if !validate_form(vm) {
        return;
    }

    let (location, start, end) = form_fields(vm);
    dispatch(vm, Msg::RequestStarted);
    match api.update(&id, &location, &start, &end).await {
        Ok(updated) => dispatch(vm, Msg::Updated(updated)),
        Err(e) => dispatch(vm, Msg::Failed(e.to_string())),
    }
    dispatch(vm, Msg::RequestFinished);
}

/// Caller is responsible for confirming with the user first.
pub async fn delete_selected(vm: &mut ViewModel, api: &ApiClient) {
    let Some(id) = vm.selected_id.clone() else {
        return reject(vm, "Please select a query to delete.");
    };

    dispatch(vm, Msg::RequestStarted);
    match api.delete(&id).await {
        Ok(_) => dispatch(vm, Msg::Deleted(id)),
        Err(e) => dispatch(vm, Msg::Failed(e.to_string())),
    }
    dispatch(vm, Msg::RequestFinished);
}

/// Write the selected query's CSV to `output`, or `weather_query_{id}.csv`
/// in `dir` when no output is given. Returns the written path.
pub async fn export_selected(
    vm: &mut ViewModel,
    api: &ApiClient,
    dir: &Path,
    output: Option<PathBuf>,
) -> Option<PathBuf> {
    let Some(id) = vm.selected_id.clone() else {
        reject(vm, "Please select a saved query before exporting.");
        return None;
    };

    dispatch(vm, Msg::RequestStarted);
    let path = output.unwrap_or_else(|| dir.join(export_one_filename(&id)));
    let written = match api.export_csv(&id).await {
        Ok(csv) => match std::fs::write(&path, csv) {
            Ok(()) => {
                dispatch(vm, Msg::Exported(path.display().to_string()));
                Some(path)
            }
            Err(e) => {
                dispatch(vm, Msg::Failed(format!("Failed to write {}: {e}", path.display())));
                None
            }
        },
        Err(e) => {
            dispatch(vm, Msg::Failed(e.to_string()));
            None
        }
    };
    dispatch(vm, Msg::RequestFinished);
    written
}

/// "Get Current Weather (No Save)". Never touches the backend.
pub async fn current_weather(vm: &mut ViewModel, direct: Option<&DirectWeatherClient>) {
    if let Err(message) = validate_location(vm) {
        return reject(vm, &message);
    }
    let Some(direct) = direct else {
        return reject(vm, MISSING_CLIENT_KEY);
    };

    let location = vm.location.trim().to_string();
    dispatch(vm, Msg::RequestStarted);
    match direct.current(&location).await {
        Ok(sample) => dispatch(vm, Msg::SamplesLoaded(vec![sample])),
        Err(e) => dispatch(vm, Msg::Failed(e.to_string())),
    }
    dispatch(vm, Msg::RequestFinished);
}

/// "Get 5-Day Forecast (No Save)". Never touches the backend.
pub async fn five_day_forecast(vm: &mut ViewModel, direct: Option<&DirectWeatherClient>) {
    if let Err(message) = validate_location(vm) {
        return reject(vm, &message);
    }
    let Some(direct) = direct else {
        return reject(vm, MISSING_CLIENT_KEY);
    };

    let location = vm.location.trim().to_string();
    dispatch(vm, Msg::RequestStarted);
    match direct.five_day(&location).await {
        Ok(samples) => dispatch(vm, Msg::SamplesLoaded(samples)),
        Err(e) => dispatch(vm, Msg::Failed(e.to_string())),
    }
    dispatch(vm, Msg::RequestFinished);
}
